use super::chats::insert_chat_with;
use super::error::sql_error;
use super::filter::expect_one;
use super::messages::insert_message_with;
use super::{
    Conversation, ConversationFilter, Database, NewChat, NewChatMessage, NewConversation,
    PersistenceError,
};
use crate::shared::time::now_millis;
use rusqlite::{params, params_from_iter, Connection, Row};

const CONVERSATION_COLUMNS: &str = "id, agent_1_chat_id, agent_2_chat_id, created_at, updated_at";

fn conversation_from_row(row: &Row<'_>) -> rusqlite::Result<Conversation> {
    Ok(Conversation {
        id: row.get(0)?,
        agent_1_chat_id: row.get(1)?,
        agent_2_chat_id: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn insert_conversation_with(
    connection: &Connection,
    conversation: &NewConversation,
) -> Result<Conversation, PersistenceError> {
    conversation.validate()?;
    let now = now_millis();
    connection
        .execute(
            "
            INSERT INTO conversation (agent_1_chat_id, agent_2_chat_id, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?3)
            ",
            params![
                conversation.agent_1_chat_id,
                conversation.agent_2_chat_id,
                now
            ],
        )
        .map_err(sql_error)?;
    Ok(Conversation {
        id: connection.last_insert_rowid(),
        agent_1_chat_id: conversation.agent_1_chat_id,
        agent_2_chat_id: conversation.agent_2_chat_id,
        created_at: now,
        updated_at: now,
    })
}

impl Database {
    pub fn insert_conversation(
        &self,
        conversation: &NewConversation,
    ) -> Result<Conversation, PersistenceError> {
        insert_conversation_with(&self.connection, conversation)
    }

    /// Creates both chats with their seed system messages and pairs them.
    /// Nothing is stored unless every insert succeeds.
    pub fn insert_seeded_conversation(
        &mut self,
        agents: [(&NewChat, &str); 2],
    ) -> Result<Conversation, PersistenceError> {
        let tx = self.connection.transaction().map_err(sql_error)?;
        let mut chat_ids = [0; 2];
        for (chat_id, (chat, system)) in chat_ids.iter_mut().zip(agents) {
            let chat = insert_chat_with(&tx, chat)?;
            insert_message_with(&tx, &NewChatMessage::system(chat.id, system))?;
            *chat_id = chat.id;
        }
        let conversation = insert_conversation_with(
            &tx,
            &NewConversation::new(chat_ids[0], chat_ids[1])?,
        )?;
        tx.commit().map_err(sql_error)?;
        Ok(conversation)
    }

    pub fn find_conversations(
        &self,
        filter: &ConversationFilter,
    ) -> Result<Vec<Conversation>, PersistenceError> {
        let sql_filter = filter.to_sql();
        let sql = format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversation{} ORDER BY created_at ASC, id ASC",
            sql_filter.where_sql()
        );
        let mut statement = self.connection.prepare(&sql).map_err(sql_error)?;
        let rows = statement
            .query_map(params_from_iter(sql_filter.values()), conversation_from_row)
            .map_err(sql_error)?;

        let mut conversations = Vec::new();
        for row in rows {
            conversations.push(row.map_err(sql_error)?);
        }
        Ok(conversations)
    }

    pub fn find_one_conversation(
        &self,
        filter: &ConversationFilter,
    ) -> Result<Conversation, PersistenceError> {
        let conversations = self.find_conversations(filter)?;
        expect_one("conversation", conversations, filter.to_sql().describe())
    }

    pub fn get_conversation(&self, id: i64) -> Result<Conversation, PersistenceError> {
        self.find_one_conversation(&ConversationFilter::by_id(id))
    }

    pub fn list_conversations(&self) -> Result<Vec<Conversation>, PersistenceError> {
        self.find_conversations(&ConversationFilter::default())
    }

    pub fn save_conversation(
        &self,
        conversation: &mut Conversation,
    ) -> Result<(), PersistenceError> {
        NewConversation::new(conversation.agent_1_chat_id, conversation.agent_2_chat_id)?;
        let now = now_millis();
        let updated = self
            .connection
            .execute(
                "
                UPDATE conversation
                SET agent_1_chat_id = ?1, agent_2_chat_id = ?2, updated_at = ?3
                WHERE id = ?4
                ",
                params![
                    conversation.agent_1_chat_id,
                    conversation.agent_2_chat_id,
                    now,
                    conversation.id
                ],
            )
            .map_err(sql_error)?;
        if updated == 0 {
            return Err(PersistenceError::NotFound {
                entity: "conversation",
                criteria: format!("id = {}", conversation.id),
            });
        }
        conversation.updated_at = now;
        Ok(())
    }

    /// Removes the pairing only; both chats keep their history.
    pub fn delete_conversation(&self, id: i64) -> Result<(), PersistenceError> {
        let deleted = self
            .connection
            .execute("DELETE FROM conversation WHERE id = ?1", params![id])
            .map_err(sql_error)?;
        if deleted == 0 {
            return Err(PersistenceError::NotFound {
                entity: "conversation",
                criteria: format!("id = {id}"),
            });
        }
        Ok(())
    }
}
