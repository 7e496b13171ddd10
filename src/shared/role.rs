use serde::{Deserialize, Serialize};

/// Author of a chat message, as understood by both the database and the
/// model server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    Assistant,
    User,
}

pub const ALL_CHAT_ROLES: [ChatRole; 3] = [ChatRole::System, ChatRole::Assistant, ChatRole::User];

impl ChatRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Assistant => "assistant",
            Self::User => "user",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "system" => Ok(Self::System),
            "assistant" => Ok(Self::Assistant),
            "user" => Ok(Self::User),
            _ => Err("role must be one of: system, assistant, user".to_string()),
        }
    }

    pub fn is_system(self) -> bool {
        self == Self::System
    }

    pub fn is_assistant(self) -> bool {
        self == Self::Assistant
    }

    pub fn is_user(self) -> bool {
        self == Self::User
    }
}

impl std::fmt::Display for ChatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_every_role_case_insensitively() {
        for role in ALL_CHAT_ROLES {
            assert_eq!(ChatRole::parse(role.as_str()), Ok(role));
            assert_eq!(
                ChatRole::parse(&role.as_str().to_ascii_uppercase()),
                Ok(role)
            );
        }
        assert!(ChatRole::parse("tool").is_err());
    }

    #[test]
    fn serde_uses_lowercase_wire_names() {
        let encoded = serde_json::to_string(&ChatRole::Assistant).expect("encode");
        assert_eq!(encoded, "\"assistant\"");

        let decoded: ChatRole = serde_json::from_str("\"system\"").expect("decode");
        assert_eq!(decoded, ChatRole::System);

        let err = serde_json::from_str::<ChatRole>("\"narrator\"").expect_err("reject");
        assert!(err.to_string().contains("unknown variant `narrator`"));
    }
}
