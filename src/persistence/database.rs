use super::error::sql_error;
use super::PersistenceError;
use rusqlite::Connection;
use std::fs;
use std::path::Path;
use tracing::debug;

const SCHEMA_SQL: &str = "
    CREATE TABLE IF NOT EXISTS chat (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        default_model TEXT NOT NULL,
        name TEXT,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS chat_message (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        chat_id INTEGER NOT NULL
            REFERENCES chat(id)
            ON DELETE CASCADE,
        role TEXT NOT NULL CHECK (role IN ('system', 'assistant', 'user')),
        content TEXT NOT NULL,
        model TEXT,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL,
        CHECK (role <> 'assistant' OR (model IS NOT NULL AND model <> ''))
    );

    CREATE TABLE IF NOT EXISTS conversation (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        agent_1_chat_id INTEGER NOT NULL REFERENCES chat(id),
        agent_2_chat_id INTEGER NOT NULL REFERENCES chat(id),
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL,
        CHECK (agent_1_chat_id <> agent_2_chat_id)
    );

    CREATE INDEX IF NOT EXISTS idx_chat_message_chat_created
        ON chat_message(chat_id, created_at, id);
    CREATE INDEX IF NOT EXISTS idx_chat_message_role_created
        ON chat_message(role, created_at, id);
";

const DROP_SQL: &str = "
    DROP TABLE IF EXISTS conversation;
    DROP TABLE IF EXISTS chat_message;
    DROP TABLE IF EXISTS chat;
";

/// Open SQLite connection. Every persistence call goes through a `Database`
/// handle; the connection is closed when the handle is dropped.
pub struct Database {
    pub(crate) connection: Connection,
    location: String,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self, PersistenceError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| PersistenceError::CreateParent {
                path: parent.display().to_string(),
                source,
            })?;
        }
        let connection = Connection::open(path).map_err(|source| PersistenceError::Open {
            path: path.display().to_string(),
            source,
        })?;
        connection
            .execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(sql_error)?;
        Self::configure(connection, path.display().to_string())
    }

    pub fn open_in_memory() -> Result<Self, PersistenceError> {
        let connection =
            Connection::open_in_memory().map_err(|source| PersistenceError::Open {
                path: ":memory:".to_string(),
                source,
            })?;
        Self::configure(connection, ":memory:".to_string())
    }

    fn configure(connection: Connection, location: String) -> Result<Self, PersistenceError> {
        connection
            .execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(sql_error)?;
        debug!(database = %location, "opened database");
        Ok(Self {
            connection,
            location,
        })
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn build_schema(&self) -> Result<(), PersistenceError> {
        self.connection
            .execute_batch(SCHEMA_SQL)
            .map_err(sql_error)
    }

    pub fn drop_schema(&self) -> Result<(), PersistenceError> {
        self.connection.execute_batch(DROP_SQL).map_err(sql_error)
    }

    pub fn table_names(&self) -> Result<Vec<String>, PersistenceError> {
        let mut statement = self
            .connection
            .prepare(
                "
                SELECT name FROM sqlite_master
                WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
                ORDER BY name ASC
                ",
            )
            .map_err(sql_error)?;

        let rows = statement
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(sql_error)?;

        let mut names = Vec::new();
        for row in rows {
            names.push(row.map_err(sql_error)?);
        }
        Ok(names)
    }
}
