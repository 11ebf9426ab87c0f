use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::database::Database;
use crate::models::context::FeedbackDraft;

#[derive(Debug, Clone, FromRow)]
pub struct Event {
    pub id: i64,
    pub name: String,
}

impl Event {
    pub async fn by_id(db: &Database, id: i64) -> sqlx::Result<Option<Event>> {
        sqlx::query_as::<_, Event>("SELECT id, name FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&db.pool)
            .await
    }

    /// Сегодняшние мероприятия, по которым оценка ещё не рассылалась.
    pub async fn pending_between(
        db: &Database,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> sqlx::Result<Vec<Event>> {
        sqlx::query_as::<_, Event>(
            "SELECT id, name FROM events
             WHERE notif_status = 'not_send' AND starts_at >= $1 AND starts_at < $2",
        )
        .bind(from)
        .bind(to)
        .fetch_all(&db.pool)
        .await
    }
}

/// Сохранить заполненную анкету. Черновик обязан содержать четыре
/// оценки — неполный черновик это дефект мастера, а не данных.
pub async fn store_feedback(
    db: &Database,
    tg_id: i64,
    event_id: i64,
    draft: &FeedbackDraft,
) -> sqlx::Result<bool> {
    if draft.grades.len() < 4 {
        return Ok(false);
    }

    let user_id: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE tg_id = $1")
        .bind(tg_id)
        .fetch_optional(&db.pool)
        .await?;

    let Some(user_id) = user_id else {
        return Ok(false);
    };

    sqlx::query(
        "INSERT INTO feedback (user_id, event_id, impression, liked, useful, relevant)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(user_id)
    .bind(event_id)
    .bind(draft.grades[0] as i16)
    .bind(draft.grades[1] as i16)
    .bind(draft.grades[2] as i16)
    .bind(draft.grades[3] as i16)
    .execute(&db.pool)
    .await?;

    Ok(true)
}
