use std::sync::Mutex;

use chrono::Utc;
use finch_models::ChatRole;
use rusqlite::Connection;

use crate::error::StoreError;

const STORE_DDL: &str = "
CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    conversation_id TEXT NOT NULL,
    role TEXT NOT NULL,
    text TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_messages_conversation
    ON messages (user_id, conversation_id, id);

CREATE TABLE IF NOT EXISTS user_modes (
    user_id TEXT PRIMARY KEY,
    mode TEXT,
    updated_at TEXT NOT NULL,
    last_activity TEXT
);
";

/// One persisted conversation message.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredMessage {
    pub role: ChatRole,
    pub text: String,
}

/// SQLite-backed conversation store.
///
/// Owns the transcript history and the per-user active mode. A single
/// connection behind a `Mutex` gives read-your-writes per user key;
/// no ordering guarantee is made across users.
pub struct ConversationStore {
    conn: Mutex<Connection>,
}

impl ConversationStore {
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(STORE_DDL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory database for tests and ephemeral sessions.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(STORE_DDL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("connection mutex poisoned: {e}")))
    }

    pub fn save_message(
        &self,
        user_id: &str,
        conversation_id: &str,
        role: ChatRole,
        text: &str,
    ) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO messages (user_id, conversation_id, role, text, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                user_id,
                conversation_id,
                role.as_str(),
                text,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    /// The most recent `limit` messages of a conversation, ordered
    /// oldest-first.
    pub fn get_history(
        &self,
        user_id: &str,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<StoredMessage>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(
            "SELECT role, text FROM (\
                 SELECT id, role, text FROM messages \
                 WHERE user_id = ?1 AND conversation_id = ?2 \
                 ORDER BY id DESC LIMIT ?3\
             ) ORDER BY id ASC",
        )?;

        let rows = stmt.query_map(
            rusqlite::params![user_id, conversation_id, limit as i64],
            |row| {
                let role: String = row.get(0)?;
                let text: String = row.get(1)?;
                Ok((role, text))
            },
        )?;

        let mut messages = Vec::new();
        for row in rows {
            let (role, text) = row?;
            let role = match role.as_str() {
                "user" => ChatRole::User,
                "system" => ChatRole::System,
                _ => ChatRole::Model,
            };
            messages.push(StoredMessage { role, text });
        }
        Ok(messages)
    }

    pub fn get_mode(&self, user_id: &str) -> Result<Option<String>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached("SELECT mode FROM user_modes WHERE user_id = ?1")?;
        let result = stmt.query_row(rusqlite::params![user_id], |row| {
            row.get::<_, Option<String>>(0)
        });
        match result {
            Ok(mode) => Ok(mode),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Sqlite(e)),
        }
    }

    pub fn set_mode(&self, user_id: &str, mode: Option<&str>) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO user_modes (user_id, mode, updated_at, last_activity) \
             VALUES (?1, ?2, ?3, ?3) \
             ON CONFLICT(user_id) DO UPDATE SET mode = ?2, updated_at = ?3, \
             last_activity = ?3",
            rusqlite::params![user_id, mode, now],
        )?;
        Ok(())
    }

    pub fn clear_mode(&self, user_id: &str) -> Result<(), StoreError> {
        self.set_mode(user_id, None)
    }

    /// Stamp the user's last-activity time without touching their mode.
    pub fn touch_activity(&self, user_id: &str) -> Result<(), StoreError> {
        self.touch_activity_at(user_id, Utc::now())
    }

    /// Backdatable variant of `touch_activity`, used to expire sessions in
    /// tests.
    pub fn touch_activity_at(
        &self,
        user_id: &str,
        at: chrono::DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO user_modes (user_id, mode, updated_at, last_activity) \
             VALUES (?1, NULL, ?2, ?2) \
             ON CONFLICT(user_id) DO UPDATE SET last_activity = ?2",
            rusqlite::params![user_id, at.to_rfc3339()],
        )?;
        Ok(())
    }

    /// When the user last interacted, if ever recorded. An unparseable
    /// stamp reads as never.
    pub fn last_activity(
        &self,
        user_id: &str,
    ) -> Result<Option<chrono::DateTime<Utc>>, StoreError> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare_cached("SELECT last_activity FROM user_modes WHERE user_id = ?1")?;
        let result = stmt.query_row(rusqlite::params![user_id], |row| {
            row.get::<_, Option<String>>(0)
        });
        match result {
            Ok(stamp) => Ok(stamp
                .and_then(|s| chrono::DateTime::parse_from_rfc3339(&s).ok())
                .map(|dt| dt.with_timezone(&Utc))),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Sqlite(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_and_get_history_ordered() {
        let store = ConversationStore::open_in_memory().unwrap();
        store
            .save_message("u1", "c1", ChatRole::User, "What is RELIANCE trading at?")
            .unwrap();
        store
            .save_message("u1", "c1", ChatRole::Model, "RELIANCE is at 2456.30.")
            .unwrap();
        store
            .save_message("u1", "c1", ChatRole::User, "And the 52-week high?")
            .unwrap();

        let history = store.get_history("u1", "c1", 10).unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].role, ChatRole::User);
        assert_eq!(history[1].role, ChatRole::Model);
        assert!(history[2].text.contains("52-week"));
    }

    #[test]
    fn history_limit_keeps_most_recent() {
        let store = ConversationStore::open_in_memory().unwrap();
        for i in 0..5 {
            store
                .save_message("u1", "c1", ChatRole::User, &format!("message {i}"))
                .unwrap();
        }

        let history = store.get_history("u1", "c1", 2).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].text, "message 3");
        assert_eq!(history[1].text, "message 4");
    }

    #[test]
    fn history_is_scoped_per_conversation() {
        let store = ConversationStore::open_in_memory().unwrap();
        store
            .save_message("u1", "c1", ChatRole::User, "first thread")
            .unwrap();
        store
            .save_message("u1", "c2", ChatRole::User, "second thread")
            .unwrap();

        let history = store.get_history("u1", "c1", 10).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].text, "first thread");
    }

    #[test]
    fn mode_read_your_writes() {
        let store = ConversationStore::open_in_memory().unwrap();
        assert_eq!(store.get_mode("u1").unwrap(), None);

        store.set_mode("u1", Some("stock_search")).unwrap();
        assert_eq!(store.get_mode("u1").unwrap().as_deref(), Some("stock_search"));

        store.set_mode("u1", Some("portfolio")).unwrap();
        assert_eq!(store.get_mode("u1").unwrap().as_deref(), Some("portfolio"));

        store.clear_mode("u1").unwrap();
        assert_eq!(store.get_mode("u1").unwrap(), None);
    }

    #[test]
    fn activity_stamp_survives_without_a_mode() {
        let store = ConversationStore::open_in_memory().unwrap();
        assert_eq!(store.last_activity("u1").unwrap(), None);

        store.touch_activity("u1").unwrap();
        let first = store.last_activity("u1").unwrap().unwrap();
        assert!(Utc::now() - first < chrono::Duration::seconds(5));
        // Touching activity must not invent a mode.
        assert_eq!(store.get_mode("u1").unwrap(), None);
    }

    #[test]
    fn set_mode_refreshes_activity() {
        let store = ConversationStore::open_in_memory().unwrap();
        let old = Utc::now() - chrono::Duration::minutes(30);
        store.touch_activity_at("u1", old).unwrap();
        assert_eq!(store.last_activity("u1").unwrap(), Some(old));

        store.set_mode("u1", Some("stock_search")).unwrap();
        let refreshed = store.last_activity("u1").unwrap().unwrap();
        assert!(refreshed > old);
        assert_eq!(store.get_mode("u1").unwrap().as_deref(), Some("stock_search"));
    }

    #[test]
    fn modes_are_per_user() {
        let store = ConversationStore::open_in_memory().unwrap();
        store.set_mode("u1", Some("news")).unwrap();
        assert_eq!(store.get_mode("u2").unwrap(), None);
    }

    #[test]
    fn file_backed_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("finch.db");
        let path_str = path.to_str().unwrap();

        {
            let store = ConversationStore::open(path_str).unwrap();
            store
                .save_message("u1", "c1", ChatRole::User, "persist me")
                .unwrap();
        }

        let reopened = ConversationStore::open(path_str).unwrap();
        let history = reopened.get_history("u1", "c1", 10).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].text, "persist me");
    }
}
