use chrono::{DateTime, Utc};
use sqlx::FromRow;
use teloxide::prelude::*;
use teloxide::types::MessageId;

use crate::database::Database;

/// Категория сообщения, помеченного под удаление.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EphemeralKind {
    InlineMenu,
    ReplyMenu,
    Flood,
    Notif,
    Feedback,
    Activity,
    Consultation,
    Transfer,
    Living,
    Schedule,
    General,
}

impl EphemeralKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EphemeralKind::InlineMenu => "imenu",
            EphemeralKind::ReplyMenu => "rmenu",
            EphemeralKind::Flood => "flood",
            EphemeralKind::Notif => "notif",
            EphemeralKind::Feedback => "feedback",
            EphemeralKind::Activity => "activity",
            EphemeralKind::Consultation => "consultation",
            EphemeralKind::Transfer => "transfer",
            EphemeralKind::Living => "living",
            EphemeralKind::Schedule => "schedule",
            EphemeralKind::General => "general",
        }
    }
}

#[derive(Debug, Clone, FromRow)]
struct PendingDelete {
    message_id: i64,
    chat_id: i64,
}

/// Запомнить отправленное сообщение для последующего удаления.
pub async fn track(
    db: &Database,
    chat_id: ChatId,
    message_id: MessageId,
    kind: EphemeralKind,
) -> sqlx::Result<()> {
    sqlx::query(
        "INSERT INTO pending_deletes (message_id, chat_id, kind)
         VALUES ($1, $2, $3)
         ON CONFLICT (message_id, chat_id) DO UPDATE SET kind = EXCLUDED.kind",
    )
    .bind(message_id.0 as i64)
    .bind(chat_id.0)
    .bind(kind.as_str())
    .execute(&db.pool)
    .await?;

    Ok(())
}

/// Удалить в одном чате все сообщения перечисленных категорий.
/// Ошибки транспорта («message not found» и т.п.) глотаются.
pub async fn delete_for_chat(
    db: &Database,
    bot: &Bot,
    chat_id: ChatId,
    kinds: &[EphemeralKind],
) -> sqlx::Result<()> {
    let kind_names: Vec<String> = kinds.iter().map(|k| k.as_str().to_string()).collect();

    let rows = sqlx::query_as::<_, PendingDelete>(
        "SELECT message_id, chat_id FROM pending_deletes
         WHERE chat_id = $1 AND kind = ANY($2)",
    )
    .bind(chat_id.0)
    .bind(&kind_names)
    .fetch_all(&db.pool)
    .await?;

    for row in &rows {
        let _ = bot
            .delete_message(ChatId(row.chat_id), MessageId(row.message_id as i32))
            .await;
    }

    sqlx::query("DELETE FROM pending_deletes WHERE chat_id = $1 AND kind = ANY($2)")
        .bind(chat_id.0)
        .bind(&kind_names)
        .execute(&db.pool)
        .await?;

    Ok(())
}

/// Плановая чистка: все сообщения категорий, при `aged_only` — только
/// созданные до начала текущих суток (по-местному).
pub async fn sweep(
    db: &Database,
    bot: &Bot,
    kinds: &[EphemeralKind],
    cutoff: Option<DateTime<Utc>>,
) -> sqlx::Result<u64> {
    let kind_names: Vec<String> = kinds.iter().map(|k| k.as_str().to_string()).collect();

    let rows = match cutoff {
        Some(cutoff) => {
            sqlx::query_as::<_, PendingDelete>(
                "SELECT message_id, chat_id FROM pending_deletes
                 WHERE kind = ANY($1) AND created_at < $2",
            )
            .bind(&kind_names)
            .bind(cutoff)
            .fetch_all(&db.pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, PendingDelete>(
                "SELECT message_id, chat_id FROM pending_deletes WHERE kind = ANY($1)",
            )
            .bind(&kind_names)
            .fetch_all(&db.pool)
            .await?
        }
    };

    let mut deleted = 0u64;
    for row in &rows {
        let _ = bot
            .delete_message(ChatId(row.chat_id), MessageId(row.message_id as i32))
            .await;
        deleted += 1;
        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
    }

    match cutoff {
        Some(cutoff) => {
            sqlx::query("DELETE FROM pending_deletes WHERE kind = ANY($1) AND created_at < $2")
                .bind(&kind_names)
                .bind(cutoff)
                .execute(&db.pool)
                .await?;
        }
        None => {
            sqlx::query("DELETE FROM pending_deletes WHERE kind = ANY($1)")
                .bind(&kind_names)
                .execute(&db.pool)
                .await?;
        }
    }

    Ok(deleted)
}
