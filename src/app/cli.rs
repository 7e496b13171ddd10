use clap::{Parser, Subcommand};

/// Two local models talking to each other, one turn at a time.
#[derive(Parser, Debug)]
#[command(
    name = "duet",
    version,
    arg_required_else_help = true,
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Log filter (trace, debug, info, warn, error). Overrides DUET_LOG.
    #[arg(long, global = true)]
    pub log_level: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create the database tables.
    #[command(name = "build-db")]
    BuildDb,
    /// Drop every table.
    #[command(name = "nuke-db")]
    NukeDb,
    /// Create two seeded chats and a conversation between them.
    #[command(name = "set-up-conversation")]
    SetUpConversation {
        #[arg(long)]
        agent_1_model: Option<String>,
        /// Initial system message for agent 1.
        #[arg(long)]
        agent_1_system: Option<String>,
        #[arg(long)]
        agent_2_model: Option<String>,
        /// Initial system message for agent 2.
        #[arg(long)]
        agent_2_system: Option<String>,
    },
    /// Run turns of an existing conversation.
    #[command(name = "run-conversation")]
    RunConversation {
        #[arg(long, alias = "conv_id")]
        conv_id: i64,
        /// Number of turns to run. Unlimited with --interactive when omitted.
        #[arg(long)]
        turns: Option<u32>,
        /// Pause after each turn to continue, add a system message, or stop.
        #[arg(long)]
        interactive: bool,
    },
    /// Print the merged history of a conversation.
    #[command(name = "show-conversation")]
    ShowConversation {
        #[arg(long, alias = "conv_id")]
        conv_id: i64,
    },
    #[command(name = "list-conversations")]
    ListConversations,
    /// Delete a conversation. Its chats are kept.
    #[command(name = "remove-conversation")]
    RemoveConversation {
        #[arg(long, alias = "conv_id")]
        conv_id: i64,
    },
    #[command(name = "list-chats")]
    ListChats,
    /// Delete a chat and its messages.
    #[command(name = "remove-chat")]
    RemoveChat {
        #[arg(long, alias = "chat_id")]
        chat_id: i64,
    },
    /// List a chat's message history.
    #[command(name = "list-chat-history")]
    ListChatHistory {
        #[arg(long, alias = "chat_id")]
        chat_id: i64,
    },
    /// Send a message to a chat and stream the reply.
    #[command(name = "chat")]
    Chat {
        #[arg(long, alias = "chat_id")]
        chat_id: i64,
        /// Message to send.
        #[arg(long)]
        content: String,
        /// Model that answers instead of the chat default.
        #[arg(long)]
        model: Option<String>,
    },
    /// Ask the chat's model to name the chat.
    #[command(name = "name-chat")]
    NameChat {
        #[arg(long, alias = "chat_id")]
        chat_id: i64,
    },
    /// Download a model (see https://ollama.com/library).
    #[command(name = "download-model")]
    DownloadModel {
        #[arg(long)]
        model: String,
    },
    #[command(name = "remove-model")]
    RemoveModel {
        #[arg(long)]
        model: String,
    },
    /// List downloaded models.
    #[command(name = "list-models")]
    ListModels,
    /// Print model metadata as JSON.
    #[command(name = "show-model")]
    ShowModel {
        #[arg(long)]
        model: String,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::BuildDb => "build-db",
            Self::NukeDb => "nuke-db",
            Self::SetUpConversation { .. } => "set-up-conversation",
            Self::RunConversation { .. } => "run-conversation",
            Self::ShowConversation { .. } => "show-conversation",
            Self::ListConversations => "list-conversations",
            Self::RemoveConversation { .. } => "remove-conversation",
            Self::ListChats => "list-chats",
            Self::RemoveChat { .. } => "remove-chat",
            Self::ListChatHistory { .. } => "list-chat-history",
            Self::Chat { .. } => "chat",
            Self::NameChat { .. } => "name-chat",
            Self::DownloadModel { .. } => "download-model",
            Self::RemoveModel { .. } => "remove-model",
            Self::ListModels => "list-models",
            Self::ShowModel { .. } => "show-model",
        }
    }
}

pub fn parse_cli<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let argv = std::iter::once(std::ffi::OsString::from("duet"))
        .chain(args.into_iter().map(|arg| arg.into()));
    Cli::try_parse_from(argv)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_kebab_case_flags_and_global_log_level() {
        let cli = parse_cli([
            "run-conversation",
            "--conv-id",
            "3",
            "--turns",
            "4",
            "--log-level",
            "debug",
        ])
        .expect("parse");
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(
            cli.command,
            Command::RunConversation {
                conv_id: 3,
                turns: Some(4),
                interactive: false,
            }
        );
    }

    #[test]
    fn accepts_underscore_aliases_for_ids() {
        let cli = parse_cli(["list-chat-history", "--chat_id", "7"]).expect("parse");
        assert_eq!(cli.command, Command::ListChatHistory { chat_id: 7 });
    }

    #[test]
    fn set_up_flags_are_optional() {
        let cli = parse_cli(["set-up-conversation", "--agent-1-model", "m1"]).expect("parse");
        match cli.command {
            Command::SetUpConversation {
                agent_1_model,
                agent_2_model,
                ..
            } => {
                assert_eq!(agent_1_model.as_deref(), Some("m1"));
                assert_eq!(agent_2_model, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn missing_required_flag_is_an_error() {
        assert!(parse_cli(["chat", "--chat-id", "1"]).is_err());
        assert!(parse_cli(["unknown-command"]).is_err());
    }
}
