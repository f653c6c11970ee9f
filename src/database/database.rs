use chrono::Utc;
use log::info;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio_rusqlite::Connection;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] tokio_rusqlite::Error),
    #[error("Database connection error: {0}")]
    Connection(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationRecord {
    pub timestamp: String,
    pub name: String,
    pub dob: String,
    pub question: String,
    pub answer: String,
}

/// Log of every question answered, kept in SQLite.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Connection>,
}

impl Database {
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, DatabaseError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DatabaseError::Connection(format!("{}: {}", parent.display(), e)))?;
        }

        let conn = Connection::open(path)
            .await
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;

        let db = Self {
            conn: Arc::new(conn),
        };
        db.initialize().await?;
        Ok(db)
    }

    async fn initialize(&self) -> Result<(), DatabaseError> {
        self.conn.call(|conn| {
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS conversations (
                    id INTEGER PRIMARY KEY,
                    timestamp TEXT NOT NULL,
                    name TEXT NOT NULL,
                    dob TEXT NOT NULL,
                    question TEXT NOT NULL,
                    answer TEXT NOT NULL
                );"
            )
        })
        .await?;

        info!("Database initialized successfully");
        Ok(())
    }

    pub async fn save_conversation(
        &self,
        name: String,
        dob: String,
        question: String,
        answer: String,
    ) -> Result<(), DatabaseError> {
        let timestamp = Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO conversations (timestamp, name, dob, question, answer) VALUES (?1, ?2, ?3, ?4, ?5)",
                    [&timestamp, &name, &dob, &question, &answer],
                )
            })
            .await?;

        Ok(())
    }

    /// Most recent first.
    pub async fn get_recent_conversations(&self, limit: i64) -> Result<Vec<ConversationRecord>, DatabaseError> {
        let result = self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT timestamp, name, dob, question, answer
                     FROM conversations
                     ORDER BY id DESC
                     LIMIT ?"
                )?;

                let rows = stmt.query_map([limit], |row| {
                    Ok(ConversationRecord {
                        timestamp: row.get(0)?,
                        name: row.get(1)?,
                        dob: row.get(2)?,
                        question: row.get(3)?,
                        answer: row.get(4)?,
                    })
                })?;

                let mut conversations = Vec::new();
                for row in rows {
                    conversations.push(row?);
                }

                Ok(conversations)
            })
            .await?;

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_conversations_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("nested").join("log.db")).await.unwrap();

        for i in 0..3 {
            db.save_conversation(
                "Asha".to_string(),
                "1990-01-01".to_string(),
                format!("question {}", i),
                format!("answer {}", i),
            )
            .await
            .unwrap();
        }

        let recent = db.get_recent_conversations(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].question, "question 2");
        assert_eq!(recent[1].question, "question 1");
        assert_eq!(recent[0].name, "Asha");
    }

    #[tokio::test]
    async fn test_reopen_keeps_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.db");
        {
            let db = Database::new(&path).await.unwrap();
            db.save_conversation("a".into(), "b".into(), "q".into(), "r".into())
                .await
                .unwrap();
        }
        let db = Database::new(&path).await.unwrap();
        assert_eq!(db.get_recent_conversations(10).await.unwrap().len(), 1);
    }
}
