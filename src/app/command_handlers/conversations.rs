use crate::app::command_support::{success, CommandContext};
use crate::conversation::{
    merged_history, run_conversation, OperatorChoice, RunOptions, TurnObserver, TurnOutcome,
};
use crate::persistence::{
    AgentSlot, Chat, ChatMessage, Conversation, Database, NewChat,
};
use crate::render::{ChatBubble, ChatView, MenuState};
use crate::shared::time::format_millis;
use tracing::info;

pub const NO_MODELS_MESSAGE: &str = "No models downloaded. Please download a model first.";

/// Values supplied on the command line for one side of a new conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentSeed {
    pub model: Option<String>,
    pub system: Option<String>,
}

impl AgentSeed {
    pub fn new(model: Option<String>, system: Option<String>) -> Self {
        let non_blank = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        Self {
            model: non_blank(model),
            system: non_blank(system),
        }
    }

    fn is_complete(&self) -> bool {
        self.model.is_some() && self.system.is_some()
    }
}

pub fn cmd_set_up_conversation(
    context: &CommandContext,
    seeds: [AgentSeed; 2],
) -> Result<String, String> {
    let mut db = context.open_database()?;
    let mut view = if seeds.iter().all(AgentSeed::is_complete) {
        None
    } else {
        Some(context.view()?)
    };
    let downloaded = if seeds.iter().any(|seed| seed.model.is_none()) {
        let models = context
            .model_client()
            .list_models()
            .map_err(|e| e.to_string())?
            .into_iter()
            .map(|model| model.identifier().to_string())
            .collect::<Vec<_>>();
        if models.is_empty() {
            return Err(NO_MODELS_MESSAGE.to_string());
        }
        models
    } else {
        Vec::new()
    };

    let mut resolved = Vec::with_capacity(2);
    for (seed, slot) in seeds.into_iter().zip([AgentSlot::One, AgentSlot::Two]) {
        let model = match seed.model {
            Some(model) => model,
            None => {
                let view = prompt_view(&mut view)?;
                view.show_text(&format!("Setting up LLM {slot}"))
                    .map_err(|e| e.to_string())?;
                let menu = MenuState::new(format!("Select a model for {slot}"), downloaded.clone());
                view.select(menu)
                    .map_err(|e| e.to_string())?
                    .and_then(|index| downloaded.get(index).cloned())
                    .ok_or_else(|| "conversation set-up cancelled".to_string())?
            }
        };
        let system = match seed.system {
            Some(system) => system,
            None => prompt_view(&mut view)?
                .prompt_text(&format!("Enter initial system message for {slot}"))
                .map_err(|e| e.to_string())?
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| format!("a system message is required for {slot}"))?,
        };
        resolved.push((model, system));
    }

    let conversation = create_conversation(&mut db, &resolved)?;
    info!(conversation = conversation.id, "conversation set up");
    Ok(success(format!(
        "Conversation with id {} was successfully set up!",
        conversation.id
    )))
}

fn prompt_view(view: &mut Option<ChatView>) -> Result<&mut ChatView, String> {
    view.as_mut()
        .ok_or_else(|| "interactive input is unavailable".to_string())
}

fn create_conversation(
    db: &mut Database,
    agents: &[(String, String)],
) -> Result<Conversation, String> {
    let [(model_1, system_1), (model_2, system_2)] = agents else {
        return Err("a conversation needs exactly two agents".to_string());
    };
    let chat_1 = NewChat::new(model_1.clone()).map_err(|e| e.to_string())?;
    let chat_2 = NewChat::new(model_2.clone()).map_err(|e| e.to_string())?;
    db.insert_seeded_conversation([
        (&chat_1, system_1.as_str()),
        (&chat_2, system_2.as_str()),
    ])
    .map_err(|e| e.to_string())
}

/// Draws turns into the chat view and asks the operator what to do between
/// turns.
struct ViewObserver<'a> {
    view: &'a mut ChatView,
    agent_1: &'a Chat,
    agent_2: &'a Chat,
}

impl ViewObserver<'_> {
    fn operator_menu(&self) -> MenuState {
        MenuState::new(
            "What next?",
            vec![
                "Continue".to_string(),
                format!("Add system message to agent 1 ({})", self.agent_1.default_model),
                format!("Add system message to agent 2 ({})", self.agent_2.default_model),
                "Abort".to_string(),
            ],
        )
    }
}

impl TurnObserver for ViewObserver<'_> {
    fn turn_started(&mut self, slot: AgentSlot, sender: &Chat) -> Result<(), String> {
        self.view
            .begin_stream(ChatBubble::for_sender(slot, sender))
            .map_err(|e| e.to_string())
    }

    fn fragment(&mut self, fragment: &str) -> Result<(), String> {
        self.view.push_fragment(fragment).map_err(|e| e.to_string())
    }

    fn turn_finished(&mut self, _slot: AgentSlot, _outcome: &TurnOutcome) -> Result<(), String> {
        self.view.finish_stream().map_err(|e| e.to_string())?;
        Ok(())
    }

    fn choose_next(&mut self) -> Result<OperatorChoice, String> {
        let menu = self.operator_menu();
        let choice = self
            .view
            .select(menu)
            .map_err(|e| e.to_string())?;
        let slot = match choice {
            Some(0) => return Ok(OperatorChoice::Continue),
            Some(1) => AgentSlot::One,
            Some(2) => AgentSlot::Two,
            _ => return Ok(OperatorChoice::Abort),
        };
        let content = self
            .view
            .prompt_text(&format!("System message for {slot}"))
            .map_err(|e| e.to_string())?
            .unwrap_or_default();
        Ok(OperatorChoice::InjectSystem { slot, content })
    }

    fn system_injected(&mut self, slot: AgentSlot, message: &ChatMessage) -> Result<(), String> {
        self.view
            .show_bubble(&ChatBubble::from_message(slot, message))
            .map_err(|e| e.to_string())
    }
}

pub fn cmd_run_conversation(
    context: &CommandContext,
    conv_id: i64,
    turns: Option<u32>,
    interactive: bool,
) -> Result<String, String> {
    let mut db = context.open_database()?;
    let conversation = db.get_conversation(conv_id).map_err(|e| e.to_string())?;
    let agent_1 = db
        .get_chat(conversation.agent_1_chat_id)
        .map_err(|e| e.to_string())?;
    let agent_2 = db
        .get_chat(conversation.agent_2_chat_id)
        .map_err(|e| e.to_string())?;
    let client = context.model_client();
    let options = RunOptions::from_flags(turns, interactive);

    let mut view = context.view()?;
    let result = {
        let mut observer = ViewObserver {
            view: &mut view,
            agent_1: &agent_1,
            agent_2: &agent_2,
        };
        run_conversation(&mut db, &client, &conversation, options, &mut observer)
    };
    let summary = match result {
        Ok(summary) => summary,
        Err(err) => {
            view.abandon_stream().map_err(|e| e.to_string())?;
            return Err(err.to_string());
        }
    };

    if summary.aborted {
        return Ok(success(format!(
            "Conversation {conv_id} stopped after {} turn(s).",
            summary.turns
        )));
    }
    Ok(success(format!(
        "Conversation {conv_id} ran {} turn(s); {} speaks next.",
        summary.turns, summary.next_sender
    )))
}

pub fn cmd_show_conversation(context: &CommandContext, conv_id: i64) -> Result<String, String> {
    let db = context.open_database()?;
    let conversation = db.get_conversation(conv_id).map_err(|e| e.to_string())?;
    let history = merged_history(&db, &conversation).map_err(|e| e.to_string())?;
    if history.is_empty() {
        return Ok(format!("Conversation {conv_id} has no messages yet."));
    }
    let mut view = context.view()?;
    for entry in &history {
        view.show_bubble(&ChatBubble::from_entry(entry))
            .map_err(|e| e.to_string())?;
    }
    Ok(format!(
        "Conversation {conv_id}: {} message(s).",
        history.len()
    ))
}

pub fn cmd_list_conversations(context: &CommandContext) -> Result<String, String> {
    let db = context.open_database()?;
    let conversations = db.list_conversations().map_err(|e| e.to_string())?;
    if conversations.is_empty() {
        return Ok("No conversations found.".to_string());
    }
    let mut lines = Vec::with_capacity(conversations.len());
    for conversation in conversations {
        let agent_1 = db
            .get_chat(conversation.agent_1_chat_id)
            .map_err(|e| e.to_string())?;
        let agent_2 = db
            .get_chat(conversation.agent_2_chat_id)
            .map_err(|e| e.to_string())?;
        lines.push(format!(
            "{}  agent 1: chat {} ({})  agent 2: chat {} ({})  created {}",
            conversation.id,
            agent_1.id,
            agent_1.default_model,
            agent_2.id,
            agent_2.default_model,
            format_millis(conversation.created_at)
        ));
    }
    Ok(lines.join("\n"))
}

pub fn cmd_remove_conversation(context: &CommandContext, conv_id: i64) -> Result<String, String> {
    let db = context.open_database()?;
    db.get_conversation(conv_id).map_err(|e| e.to_string())?;
    db.delete_conversation(conv_id).map_err(|e| e.to_string())?;
    info!(conversation = conv_id, "conversation removed");
    Ok(success(format!("Conversation {conv_id} was removed.")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_seed_values_count_as_missing() {
        let seed = AgentSeed::new(Some("  ".to_string()), Some("be terse".to_string()));
        assert_eq!(seed.model, None);
        assert!(!seed.is_complete());
        assert!(AgentSeed::new(Some("m1".to_string()), Some("hi".to_string())).is_complete());
    }

    #[test]
    fn create_conversation_seeds_both_chats() {
        let mut db = Database::open_in_memory().expect("db");
        db.build_schema().expect("schema");
        let conversation = create_conversation(
            &mut db,
            &[
                ("m1".to_string(), "be terse".to_string()),
                ("m2".to_string(), "be verbose".to_string()),
            ],
        )
        .expect("conversation");

        let agent_1 = db.chat_history(conversation.agent_1_chat_id).expect("history");
        let agent_2 = db.chat_history(conversation.agent_2_chat_id).expect("history");
        assert_eq!(agent_1.len(), 1);
        assert_eq!(agent_1[0].content, "be terse");
        assert_eq!(agent_2[0].content, "be verbose");
        assert_eq!(
            db.get_chat(conversation.agent_2_chat_id)
                .expect("chat")
                .default_model,
            "m2"
        );
    }

    fn chat(id: i64, model: &str) -> Chat {
        Chat {
            id,
            default_model: model.to_string(),
            name: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn choose_with_input(input: &str) -> Result<OperatorChoice, String> {
        let mut view = ChatView::plain(
            Box::new(std::io::sink()),
            Box::new(std::io::Cursor::new(input.as_bytes().to_vec())),
            &crate::config::Settings::default(),
        );
        let (agent_1, agent_2) = (chat(1, "m1"), chat(2, "m2"));
        let mut observer = ViewObserver {
            view: &mut view,
            agent_1: &agent_1,
            agent_2: &agent_2,
        };
        observer.choose_next()
    }

    #[test]
    fn operator_menu_entries_map_to_choices() {
        assert_eq!(choose_with_input("1\n"), Ok(OperatorChoice::Continue));
        assert_eq!(
            choose_with_input("2\nstay on topic\n"),
            Ok(OperatorChoice::InjectSystem {
                slot: AgentSlot::One,
                content: "stay on topic".to_string(),
            })
        );
        assert_eq!(
            choose_with_input("3\nbe brief\n"),
            Ok(OperatorChoice::InjectSystem {
                slot: AgentSlot::Two,
                content: "be brief".to_string(),
            })
        );
        assert_eq!(choose_with_input("4\n"), Ok(OperatorChoice::Abort));
        assert_eq!(choose_with_input(""), Ok(OperatorChoice::Abort));
    }
}
