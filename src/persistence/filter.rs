use super::PersistenceError;
use crate::shared::ChatRole;
use rusqlite::types::Value;

/// Accumulates `WHERE` clauses with positional parameters and a readable
/// description of the criteria for error messages.
#[derive(Debug, Default)]
pub(crate) struct SqlFilter {
    clauses: Vec<String>,
    values: Vec<Value>,
    criteria: Vec<String>,
}

impl SqlFilter {
    pub(crate) fn eq(&mut self, column: &str, value: Value, shown: impl std::fmt::Display) {
        self.clauses.push(format!("{column} = ?"));
        self.values.push(value);
        self.criteria.push(format!("{column} = {shown}"));
    }

    pub(crate) fn any_of(&mut self, column: &str, values: Vec<(Value, String)>) {
        if values.len() == 1 {
            if let Some((value, shown)) = values.into_iter().next() {
                self.eq(column, value, shown);
            }
            return;
        }
        if values.is_empty() {
            self.clauses.push("0".to_string());
            self.criteria.push(format!("{column} in []"));
            return;
        }
        let placeholders = vec!["?"; values.len()].join(", ");
        self.clauses.push(format!("{column} IN ({placeholders})"));
        let mut shown = Vec::with_capacity(values.len());
        for (value, label) in values {
            self.values.push(value);
            shown.push(label);
        }
        self.criteria
            .push(format!("{column} in [{}]", shown.join(", ")));
    }

    pub(crate) fn either_eq(&mut self, columns: &[&str], value: i64) {
        let clause = columns
            .iter()
            .map(|column| format!("{column} = ?"))
            .collect::<Vec<_>>()
            .join(" OR ");
        self.clauses.push(format!("({clause})"));
        for _ in columns {
            self.values.push(Value::Integer(value));
        }
        self.criteria
            .push(format!("{} = {value}", columns.join(" | ")));
    }

    pub(crate) fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            return String::new();
        }
        format!(" WHERE {}", self.clauses.join(" AND "))
    }

    pub(crate) fn values(&self) -> &[Value] {
        &self.values
    }

    pub(crate) fn describe(&self) -> String {
        if self.criteria.is_empty() {
            return "no filter".to_string();
        }
        self.criteria.join(", ")
    }
}

pub(crate) fn expect_one<T>(
    entity: &'static str,
    mut rows: Vec<T>,
    criteria: String,
) -> Result<T, PersistenceError> {
    match rows.len() {
        0 => Err(PersistenceError::NotFound { entity, criteria }),
        1 => Ok(rows.remove(0)),
        count => Err(PersistenceError::MultipleResults {
            entity,
            count,
            criteria,
        }),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatFilter {
    pub id: Option<i64>,
    pub default_model: Option<String>,
    pub name: Option<String>,
}

impl ChatFilter {
    pub fn by_id(id: i64) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub(crate) fn to_sql(&self) -> SqlFilter {
        let mut filter = SqlFilter::default();
        if let Some(id) = self.id {
            filter.eq("id", Value::Integer(id), id);
        }
        if let Some(model) = &self.default_model {
            filter.eq("default_model", Value::Text(model.clone()), model);
        }
        if let Some(name) = &self.name {
            filter.eq("name", Value::Text(name.clone()), name);
        }
        filter
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageFilter {
    pub id: Option<i64>,
    pub chat_ids: Vec<i64>,
    pub roles: Vec<ChatRole>,
    pub model: Option<String>,
    pub content: Option<String>,
}

impl MessageFilter {
    pub fn by_id(id: i64) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn for_chat(chat_id: i64) -> Self {
        Self::default().chat(chat_id)
    }

    pub fn chat(mut self, chat_id: i64) -> Self {
        self.chat_ids.push(chat_id);
        self
    }

    pub fn chats(mut self, chat_ids: impl IntoIterator<Item = i64>) -> Self {
        self.chat_ids.extend(chat_ids);
        self
    }

    pub fn role(mut self, role: ChatRole) -> Self {
        self.roles.push(role);
        self
    }

    pub fn roles(mut self, roles: impl IntoIterator<Item = ChatRole>) -> Self {
        self.roles.extend(roles);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub(crate) fn to_sql(&self) -> SqlFilter {
        let mut filter = SqlFilter::default();
        if let Some(id) = self.id {
            filter.eq("id", Value::Integer(id), id);
        }
        if !self.chat_ids.is_empty() {
            filter.any_of(
                "chat_id",
                self.chat_ids
                    .iter()
                    .map(|id| (Value::Integer(*id), id.to_string()))
                    .collect(),
            );
        }
        if !self.roles.is_empty() {
            filter.any_of(
                "role",
                self.roles
                    .iter()
                    .map(|role| (Value::Text(role.as_str().to_string()), role.to_string()))
                    .collect(),
            );
        }
        if let Some(model) = &self.model {
            filter.eq("model", Value::Text(model.clone()), model);
        }
        if let Some(content) = &self.content {
            filter.eq("content", Value::Text(content.clone()), format!("{content:?}"));
        }
        filter
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationFilter {
    pub id: Option<i64>,
    pub agent_1_chat_id: Option<i64>,
    pub agent_2_chat_id: Option<i64>,
    /// Matches conversations where the chat sits on either side.
    pub involving_chat_id: Option<i64>,
}

impl ConversationFilter {
    pub fn by_id(id: i64) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn involving(chat_id: i64) -> Self {
        Self {
            involving_chat_id: Some(chat_id),
            ..Self::default()
        }
    }

    pub(crate) fn to_sql(&self) -> SqlFilter {
        let mut filter = SqlFilter::default();
        if let Some(id) = self.id {
            filter.eq("id", Value::Integer(id), id);
        }
        if let Some(chat_id) = self.agent_1_chat_id {
            filter.eq("agent_1_chat_id", Value::Integer(chat_id), chat_id);
        }
        if let Some(chat_id) = self.agent_2_chat_id {
            filter.eq("agent_2_chat_id", Value::Integer(chat_id), chat_id);
        }
        if let Some(chat_id) = self.involving_chat_id {
            filter.either_eq(&["agent_1_chat_id", "agent_2_chat_id"], chat_id);
        }
        filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_has_no_where_clause() {
        let filter = ChatFilter::default().to_sql();
        assert_eq!(filter.where_sql(), "");
        assert!(filter.values().is_empty());
        assert_eq!(filter.describe(), "no filter");
    }

    #[test]
    fn message_filter_builds_in_clauses_for_multiple_values() {
        let filter = MessageFilter::default()
            .chats([1, 2])
            .roles([ChatRole::Assistant, ChatRole::System])
            .to_sql();
        assert_eq!(
            filter.where_sql(),
            " WHERE chat_id IN (?, ?) AND role IN (?, ?)"
        );
        assert_eq!(filter.values().len(), 4);
        assert_eq!(
            filter.describe(),
            "chat_id in [1, 2], role in [assistant, system]"
        );
    }

    #[test]
    fn single_chat_uses_equality() {
        let filter = MessageFilter::for_chat(9).to_sql();
        assert_eq!(filter.where_sql(), " WHERE chat_id = ?");
        assert_eq!(filter.describe(), "chat_id = 9");
    }

    #[test]
    fn involving_filter_matches_either_side() {
        let filter = ConversationFilter::involving(4).to_sql();
        assert_eq!(
            filter.where_sql(),
            " WHERE (agent_1_chat_id = ? OR agent_2_chat_id = ?)"
        );
        assert_eq!(filter.values().len(), 2);
    }

    #[test]
    fn expect_one_reports_cardinality() {
        assert_eq!(expect_one("chat", vec![5], String::new()).expect("one"), 5);
        match expect_one::<i32>("chat", Vec::new(), "id = 1".to_string()) {
            Err(PersistenceError::NotFound { entity, criteria }) => {
                assert_eq!(entity, "chat");
                assert_eq!(criteria, "id = 1");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        match expect_one("chat", vec![1, 2, 3], String::new()) {
            Err(PersistenceError::MultipleResults { count, .. }) => assert_eq!(count, 3),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
