use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use teloxide::types::ChatId;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::database::Database;
use crate::models::{ConversationContext, State};

type UserLocks = Arc<Mutex<HashMap<ChatId, Arc<Mutex<()>>>>>;

#[derive(Clone)]
pub struct BotState {
    pub db: Database,
    locks: UserLocks,
}

// Простая ошибка без внешних зависимостей
#[derive(Debug)]
pub enum BotStateError {
    DatabaseError(String),
    SerializationError(String),
    DataTooLarge(usize),
}

impl std::fmt::Display for BotStateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BotStateError::DatabaseError(e) => write!(f, "Database error: {}", e),
            BotStateError::SerializationError(e) => write!(f, "Serialization error: {}", e),
            BotStateError::DataTooLarge(size) => write!(f, "Data too large: {} bytes", size),
        }
    }
}

impl std::error::Error for BotStateError {}

impl From<sqlx::Error> for BotStateError {
    fn from(err: sqlx::Error) -> Self {
        BotStateError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for BotStateError {
    fn from(err: serde_json::Error) -> Self {
        BotStateError::SerializationError(err.to_string())
    }
}

impl BotState {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Эксклюзивный замок на чат: обновление «прочитал контекст —
    /// обработал — сохранил» должно быть цельным, иначе параллельные
    /// нажатия затирают данные друг друга.
    pub async fn lock_chat(&self, chat_id: ChatId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(chat_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    pub async fn load_context(&self, chat_id: ChatId) -> ConversationContext {
        let start_time = Instant::now();

        match self.fetch_context_from_db(chat_id).await {
            Ok(ctx) => {
                let duration = start_time.elapsed();
                log::debug!("🎯 Context loaded for chat {} in {:?}", chat_id, duration);
                ctx
            }
            Err(e) => {
                log::error!("Error loading context for chat {}: {}", chat_id, e);
                ConversationContext::default()
            }
        }
    }

    async fn fetch_context_from_db(&self, chat_id: ChatId) -> Result<ConversationContext, BotStateError> {
        let row: Option<(String, serde_json::Value)> =
            sqlx::query_as("SELECT state, data FROM contexts WHERE chat_id = $1")
                .bind(chat_id.0)
                .fetch_optional(&self.db.pool)
                .await?;

        if let Some((state, data)) = row {
            Ok(ConversationContext {
                state: State::parse(&state),
                data: serde_json::from_value(data)?,
            })
        } else {
            Ok(ConversationContext::default())
        }
    }

    pub async fn save_context(&self, chat_id: ChatId, ctx: &ConversationContext) -> Result<(), BotStateError> {
        let start_time = Instant::now();

        let data_json = serde_json::to_value(&ctx.data)?;
        self.validate_data_size(&data_json, 16)?;

        sqlx::query(
            r#"
            INSERT INTO contexts (chat_id, state, data, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (chat_id)
            DO UPDATE SET
                state = EXCLUDED.state,
                data = EXCLUDED.data,
                updated_at = NOW()
            "#,
        )
        .bind(chat_id.0)
        .bind(ctx.state.as_str())
        .bind(data_json)
        .execute(&self.db.pool)
        .await?;

        let duration = start_time.elapsed();
        log::debug!("💾 Context saved for chat {} in {:?}", chat_id, duration);

        Ok(())
    }

    fn validate_data_size(&self, data: &serde_json::Value, max_kb: usize) -> Result<(), BotStateError> {
        let size = serde_json::to_vec(data)?.len();
        if size > max_kb * 1024 {
            Err(BotStateError::DataTooLarge(size))
        } else {
            Ok(())
        }
    }
}
