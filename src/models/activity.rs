use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::database::Database;

#[derive(Debug, Clone, FromRow)]
pub struct Activity {
    pub id: i64,
    pub name: String,
    pub template: String,
}

impl Activity {
    pub async fn by_id(db: &Database, id: i64) -> sqlx::Result<Option<Activity>> {
        sqlx::query_as::<_, Activity>("SELECT id, name, template FROM activities WHERE id = $1")
            .bind(id)
            .fetch_optional(&db.pool)
            .await
    }

    /// Список для меню менеджера, без повторов по названию.
    pub async fn distinct_choices(db: &Database) -> sqlx::Result<Vec<Activity>> {
        sqlx::query_as::<_, Activity>(
            "SELECT DISTINCT ON (name) id, name, template
             FROM activities ORDER BY name, id",
        )
        .fetch_all(&db.pool)
        .await
    }

    pub async fn starting_between(
        db: &Database,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> sqlx::Result<Vec<Activity>> {
        sqlx::query_as::<_, Activity>(
            "SELECT id, name, template FROM activities
             WHERE starts_at >= $1 AND starts_at < $2",
        )
        .bind(from)
        .bind(to)
        .fetch_all(&db.pool)
        .await
    }
}
