use super::history::conversation_chats;
use super::turn::{next_sender, take_turn, TurnOutcome};
use super::ConversationError;
use crate::ollama::ChatCompletion;
use crate::persistence::{AgentSlot, Chat, ChatMessage, Conversation, Database, NewChatMessage};
use tracing::info;

/// Number of turns run when neither a limit nor interactive mode is requested.
pub const DEMO_TURNS: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorChoice {
    Continue,
    InjectSystem { slot: AgentSlot, content: String },
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnLimit {
    Fixed(u32),
    Unlimited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub limit: TurnLimit,
    pub interactive: bool,
}

impl RunOptions {
    pub fn from_flags(turns: Option<u32>, interactive: bool) -> Self {
        let limit = match (turns, interactive) {
            (Some(turns), _) => TurnLimit::Fixed(turns),
            (None, true) => TurnLimit::Unlimited,
            (None, false) => TurnLimit::Fixed(DEMO_TURNS),
        };
        Self { limit, interactive }
    }

    fn reached(&self, turns: u32) -> bool {
        matches!(self.limit, TurnLimit::Fixed(limit) if turns >= limit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub turns: u32,
    pub aborted: bool,
    pub next_sender: AgentSlot,
}

/// Presentation hooks for a running conversation. `choose_next` is only
/// consulted in interactive mode, between turns.
pub trait TurnObserver {
    fn turn_started(&mut self, slot: AgentSlot, sender: &Chat) -> Result<(), String>;
    fn fragment(&mut self, fragment: &str) -> Result<(), String>;
    fn turn_finished(&mut self, slot: AgentSlot, outcome: &TurnOutcome) -> Result<(), String>;
    fn choose_next(&mut self) -> Result<OperatorChoice, String>;
    fn system_injected(&mut self, slot: AgentSlot, message: &ChatMessage) -> Result<(), String>;
}

pub fn inject_system_message(
    db: &Database,
    conversation: &Conversation,
    slot: AgentSlot,
    content: &str,
) -> Result<ChatMessage, ConversationError> {
    let message = db.insert_message(&NewChatMessage::system(
        conversation.chat_id_for(slot),
        content,
    ))?;
    info!(conversation = conversation.id, chat = message.chat_id, "system message injected");
    Ok(message)
}

pub fn run_conversation<C: ChatCompletion + ?Sized>(
    db: &mut Database,
    backend: &C,
    conversation: &Conversation,
    options: RunOptions,
    observer: &mut dyn TurnObserver,
) -> Result<RunSummary, ConversationError> {
    let (agent_1, agent_2) = conversation_chats(db, conversation)?;
    let mut slot = next_sender(db, conversation)?;
    let mut turns = 0;

    while !options.reached(turns) {
        if options.interactive && turns > 0 && !operator_pause(db, conversation, observer)? {
            info!(conversation = conversation.id, turns, "conversation aborted by operator");
            return Ok(RunSummary {
                turns,
                aborted: true,
                next_sender: slot,
            });
        }

        let (sender, responder) = match slot {
            AgentSlot::One => (&agent_1, &agent_2),
            AgentSlot::Two => (&agent_2, &agent_1),
        };
        observer
            .turn_started(slot, sender)
            .map_err(ConversationError::Display)?;
        let outcome = take_turn(db, backend, sender, responder, &mut |fragment: &str| {
            observer.fragment(fragment)
        })?;
        observer
            .turn_finished(slot, &outcome)
            .map_err(ConversationError::Display)?;

        turns += 1;
        slot = slot.other();
    }

    Ok(RunSummary {
        turns,
        aborted: false,
        next_sender: slot,
    })
}

/// Returns `false` when the operator aborts.
fn operator_pause(
    db: &Database,
    conversation: &Conversation,
    observer: &mut dyn TurnObserver,
) -> Result<bool, ConversationError> {
    loop {
        match observer.choose_next().map_err(ConversationError::Display)? {
            OperatorChoice::Continue => return Ok(true),
            OperatorChoice::Abort => return Ok(false),
            OperatorChoice::InjectSystem { slot, content } => {
                if content.trim().is_empty() {
                    continue;
                }
                let message = inject_system_message(db, conversation, slot, &content)?;
                observer
                    .system_injected(slot, &message)
                    .map_err(ConversationError::Display)?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_run_is_the_two_turn_demo() {
        let options = RunOptions::from_flags(None, false);
        assert_eq!(options.limit, TurnLimit::Fixed(DEMO_TURNS));
        assert!(!options.reached(1));
        assert!(options.reached(2));
    }

    #[test]
    fn interactive_run_without_limit_is_unbounded() {
        let options = RunOptions::from_flags(None, true);
        assert_eq!(options.limit, TurnLimit::Unlimited);
        assert!(!options.reached(u32::MAX));
    }

    #[test]
    fn explicit_turns_win_over_mode_defaults() {
        assert_eq!(
            RunOptions::from_flags(Some(5), true).limit,
            TurnLimit::Fixed(5)
        );
        assert!(RunOptions::from_flags(Some(0), false).reached(0));
    }
}
