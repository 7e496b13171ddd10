use super::error::sql_error;
use super::filter::expect_one;
use super::{ChatMessage, Database, MessageFilter, NewChatMessage, PersistenceError};
use crate::shared::time::now_millis;
use crate::shared::ChatRole;
use rusqlite::{params, params_from_iter, Connection, Row};

const MESSAGE_COLUMNS: &str = "id, chat_id, role, content, model, created_at, updated_at";

struct MessageRow {
    id: i64,
    chat_id: i64,
    role: String,
    content: String,
    model: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl MessageRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            chat_id: row.get(1)?,
            role: row.get(2)?,
            content: row.get(3)?,
            model: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    fn into_message(self) -> Result<ChatMessage, PersistenceError> {
        let role = ChatRole::parse(&self.role)
            .map_err(|_| PersistenceError::InvalidRole { value: self.role })?;
        Ok(ChatMessage {
            id: self.id,
            chat_id: self.chat_id,
            role,
            content: self.content,
            model: self.model,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

pub(super) fn insert_message_with(
    connection: &Connection,
    message: &NewChatMessage,
) -> Result<ChatMessage, PersistenceError> {
    message.validate()?;
    let now = now_millis();
    connection
        .execute(
            "
            INSERT INTO chat_message (chat_id, role, content, model, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            ",
            params![
                message.chat_id,
                message.role.as_str(),
                message.content,
                message.model,
                now
            ],
        )
        .map_err(sql_error)?;
    Ok(ChatMessage {
        id: connection.last_insert_rowid(),
        chat_id: message.chat_id,
        role: message.role,
        content: message.content.clone(),
        model: message.model.clone(),
        created_at: now,
        updated_at: now,
    })
}

impl Database {
    pub fn insert_message(&self, message: &NewChatMessage) -> Result<ChatMessage, PersistenceError> {
        insert_message_with(&self.connection, message)
    }

    /// Inserts every message or none of them.
    pub fn insert_messages(
        &mut self,
        messages: &[NewChatMessage],
    ) -> Result<Vec<ChatMessage>, PersistenceError> {
        let tx = self.connection.transaction().map_err(sql_error)?;
        let mut inserted = Vec::with_capacity(messages.len());
        for message in messages {
            inserted.push(insert_message_with(&tx, message)?);
        }
        tx.commit().map_err(sql_error)?;
        Ok(inserted)
    }

    /// Inserts both messages in one transaction, in order.
    pub fn insert_message_pair(
        &mut self,
        first: &NewChatMessage,
        second: &NewChatMessage,
    ) -> Result<(ChatMessage, ChatMessage), PersistenceError> {
        let tx = self.connection.transaction().map_err(sql_error)?;
        let first = insert_message_with(&tx, first)?;
        let second = insert_message_with(&tx, second)?;
        tx.commit().map_err(sql_error)?;
        Ok((first, second))
    }

    pub fn find_messages(
        &self,
        filter: &MessageFilter,
    ) -> Result<Vec<ChatMessage>, PersistenceError> {
        self.query_messages(filter, "ORDER BY created_at ASC, id ASC")
    }

    pub fn find_one_message(&self, filter: &MessageFilter) -> Result<ChatMessage, PersistenceError> {
        let messages = self.find_messages(filter)?;
        expect_one("chat message", messages, filter.to_sql().describe())
    }

    pub fn get_message(&self, id: i64) -> Result<ChatMessage, PersistenceError> {
        self.find_one_message(&MessageFilter::by_id(id))
    }

    /// Most recently created message matching the filter.
    pub fn latest_message(
        &self,
        filter: &MessageFilter,
    ) -> Result<Option<ChatMessage>, PersistenceError> {
        let mut messages = self.query_messages(filter, "ORDER BY created_at DESC, id DESC LIMIT 1")?;
        Ok(messages.pop())
    }

    pub fn count_messages(&self, filter: &MessageFilter) -> Result<usize, PersistenceError> {
        let sql_filter = filter.to_sql();
        let sql = format!("SELECT COUNT(*) FROM chat_message{}", sql_filter.where_sql());
        let count: i64 = self
            .connection
            .query_row(&sql, params_from_iter(sql_filter.values()), |row| row.get(0))
            .map_err(sql_error)?;
        Ok(count as usize)
    }

    pub fn chat_history(&self, chat_id: i64) -> Result<Vec<ChatMessage>, PersistenceError> {
        self.find_messages(&MessageFilter::for_chat(chat_id))
    }

    pub fn save_message(&self, message: &mut ChatMessage) -> Result<(), PersistenceError> {
        message.validate()?;
        let now = now_millis();
        let updated = self
            .connection
            .execute(
                "
                UPDATE chat_message
                SET role = ?1, content = ?2, model = ?3, updated_at = ?4
                WHERE id = ?5
                ",
                params![
                    message.role.as_str(),
                    message.content,
                    message.model,
                    now,
                    message.id
                ],
            )
            .map_err(sql_error)?;
        if updated == 0 {
            return Err(PersistenceError::NotFound {
                entity: "chat message",
                criteria: format!("id = {}", message.id),
            });
        }
        message.updated_at = now;
        Ok(())
    }

    pub fn delete_message(&self, id: i64) -> Result<(), PersistenceError> {
        let deleted = self
            .connection
            .execute("DELETE FROM chat_message WHERE id = ?1", params![id])
            .map_err(sql_error)?;
        if deleted == 0 {
            return Err(PersistenceError::NotFound {
                entity: "chat message",
                criteria: format!("id = {id}"),
            });
        }
        Ok(())
    }

    fn query_messages(
        &self,
        filter: &MessageFilter,
        order: &str,
    ) -> Result<Vec<ChatMessage>, PersistenceError> {
        let sql_filter = filter.to_sql();
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM chat_message{} {order}",
            sql_filter.where_sql()
        );
        let mut statement = self.connection.prepare(&sql).map_err(sql_error)?;
        let rows = statement
            .query_map(params_from_iter(sql_filter.values()), MessageRow::from_row)
            .map_err(sql_error)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row.map_err(sql_error)?.into_message()?);
        }
        Ok(messages)
    }
}
