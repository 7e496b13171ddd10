use super::error::sql_error;
use super::filter::expect_one;
use super::records::validate_model_name;
use super::{Chat, ChatFilter, Database, NewChat, PersistenceError};
use crate::shared::time::now_millis;
use rusqlite::{params, params_from_iter, Connection, Row};

const CHAT_COLUMNS: &str = "id, default_model, name, created_at, updated_at";

fn chat_from_row(row: &Row<'_>) -> rusqlite::Result<Chat> {
    Ok(Chat {
        id: row.get(0)?,
        default_model: row.get(1)?,
        name: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

pub(super) fn insert_chat_with(
    connection: &Connection,
    chat: &NewChat,
) -> Result<Chat, PersistenceError> {
    chat.validate()?;
    let now = now_millis();
    connection
        .execute(
            "
            INSERT INTO chat (default_model, name, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?3)
            ",
            params![chat.default_model, chat.name, now],
        )
        .map_err(sql_error)?;
    Ok(Chat {
        id: connection.last_insert_rowid(),
        default_model: chat.default_model.clone(),
        name: chat.name.clone(),
        created_at: now,
        updated_at: now,
    })
}

impl Database {
    pub fn insert_chat(&self, chat: &NewChat) -> Result<Chat, PersistenceError> {
        insert_chat_with(&self.connection, chat)
    }

    pub fn find_chats(&self, filter: &ChatFilter) -> Result<Vec<Chat>, PersistenceError> {
        let sql_filter = filter.to_sql();
        let sql = format!(
            "SELECT {CHAT_COLUMNS} FROM chat{} ORDER BY created_at ASC, id ASC",
            sql_filter.where_sql()
        );
        let mut statement = self.connection.prepare(&sql).map_err(sql_error)?;
        let rows = statement
            .query_map(params_from_iter(sql_filter.values()), chat_from_row)
            .map_err(sql_error)?;

        let mut chats = Vec::new();
        for row in rows {
            chats.push(row.map_err(sql_error)?);
        }
        Ok(chats)
    }

    pub fn find_one_chat(&self, filter: &ChatFilter) -> Result<Chat, PersistenceError> {
        let chats = self.find_chats(filter)?;
        expect_one("chat", chats, filter.to_sql().describe())
    }

    pub fn get_chat(&self, id: i64) -> Result<Chat, PersistenceError> {
        self.find_one_chat(&ChatFilter::by_id(id))
    }

    pub fn list_chats(&self) -> Result<Vec<Chat>, PersistenceError> {
        self.find_chats(&ChatFilter::default())
    }

    /// Writes the mutable attributes back and bumps `updated_at`.
    pub fn save_chat(&self, chat: &mut Chat) -> Result<(), PersistenceError> {
        validate_model_name(&chat.default_model)?;
        let now = now_millis();
        let updated = self
            .connection
            .execute(
                "UPDATE chat SET default_model = ?1, name = ?2, updated_at = ?3 WHERE id = ?4",
                params![chat.default_model, chat.name, now, chat.id],
            )
            .map_err(sql_error)?;
        if updated == 0 {
            return Err(PersistenceError::NotFound {
                entity: "chat",
                criteria: format!("id = {}", chat.id),
            });
        }
        chat.updated_at = now;
        Ok(())
    }

    /// Deletes the chat and, through the foreign key, its messages.
    pub fn delete_chat(&self, id: i64) -> Result<(), PersistenceError> {
        let deleted = self
            .connection
            .execute("DELETE FROM chat WHERE id = ?1", params![id])
            .map_err(sql_error)?;
        if deleted == 0 {
            return Err(PersistenceError::NotFound {
                entity: "chat",
                criteria: format!("id = {id}"),
            });
        }
        Ok(())
    }
}
