use crate::app::cli::{parse_cli, Command};
use crate::app::command_support::CommandContext;
use crate::shared::logging::init_logging;
use clap::error::ErrorKind;
use tracing::debug;

pub mod chats;
pub mod conversations;
pub mod database;
pub mod models;

pub fn run_cli(args: Vec<String>) -> Result<String, String> {
    let cli = match parse_cli(args) {
        Ok(cli) => cli,
        Err(err) => {
            return match err.kind() {
                ErrorKind::DisplayHelp
                | ErrorKind::DisplayVersion
                | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                    Ok(err.to_string().trim_end().to_string())
                }
                _ => Err(err.to_string().trim_end().to_string()),
            };
        }
    };

    init_logging(cli.log_level.as_deref());
    debug!(command = cli.command.name(), "dispatching command");
    let context = CommandContext::load()?;
    dispatch(&context, cli.command)
}

fn dispatch(context: &CommandContext, command: Command) -> Result<String, String> {
    match command {
        Command::BuildDb => database::cmd_build_db(context),
        Command::NukeDb => database::cmd_nuke_db(context),
        Command::SetUpConversation {
            agent_1_model,
            agent_1_system,
            agent_2_model,
            agent_2_system,
        } => conversations::cmd_set_up_conversation(
            context,
            [
                conversations::AgentSeed::new(agent_1_model, agent_1_system),
                conversations::AgentSeed::new(agent_2_model, agent_2_system),
            ],
        ),
        Command::RunConversation {
            conv_id,
            turns,
            interactive,
        } => conversations::cmd_run_conversation(context, conv_id, turns, interactive),
        Command::ShowConversation { conv_id } => {
            conversations::cmd_show_conversation(context, conv_id)
        }
        Command::ListConversations => conversations::cmd_list_conversations(context),
        Command::RemoveConversation { conv_id } => {
            conversations::cmd_remove_conversation(context, conv_id)
        }
        Command::ListChats => chats::cmd_list_chats(context),
        Command::RemoveChat { chat_id } => chats::cmd_remove_chat(context, chat_id),
        Command::ListChatHistory { chat_id } => chats::cmd_list_chat_history(context, chat_id),
        Command::Chat {
            chat_id,
            content,
            model,
        } => chats::cmd_chat(context, chat_id, &content, model.as_deref()),
        Command::NameChat { chat_id } => chats::cmd_name_chat(context, chat_id),
        Command::DownloadModel { model } => models::cmd_download_model(context, &model),
        Command::RemoveModel { model } => models::cmd_remove_model(context, &model),
        Command::ListModels => models::cmd_list_models(context),
        Command::ShowModel { model } => models::cmd_show_model(context, &model),
    }
}
