use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

use crate::database::Database;

/// Трансфер участника с попутчиками по той же машине.
#[derive(Debug, Clone, FromRow)]
pub struct TransferInfo {
    pub id: i64,
    pub departs_at: DateTime<Utc>,
    pub place: String,
    pub car_num: String,
    pub driver_num: String,
}

impl TransferInfo {
    pub async fn for_user(
        db: &Database,
        tg_id: i64,
        direction: &str,
    ) -> sqlx::Result<Option<(TransferInfo, Vec<String>)>> {
        let info = sqlx::query_as::<_, TransferInfo>(
            "SELECT t.id, t.departs_at, t.place, t.car_num, t.driver_num
             FROM transfers t JOIN users u ON u.id = t.user_id
             WHERE u.tg_id = $1 AND t.direction = $2",
        )
        .bind(tg_id)
        .bind(direction)
        .fetch_optional(&db.pool)
        .await?;

        let Some(info) = info else {
            return Ok(None);
        };

        let companions: Vec<String> = sqlx::query_scalar(
            "SELECT u.last_name || ' ' || u.first_name || ' (@' || u.username || ')'
             FROM transfers t JOIN users u ON u.id = t.user_id
             WHERE t.departs_at = $1 AND t.place = $2 AND t.car_num = $3 AND t.id <> $4
             ORDER BY u.last_name, u.first_name",
        )
        .bind(info.departs_at)
        .bind(&info.place)
        .bind(&info.car_num)
        .bind(info.id)
        .fetch_all(&db.pool)
        .await?;

        Ok(Some((info, companions)))
    }
}

/// Строка трансфера для вечернего напоминания.
#[derive(Debug, Clone, FromRow)]
pub struct TransferReminder {
    pub id: i64,
    pub tg_id: Option<i64>,
    pub departs_at: DateTime<Utc>,
    pub place: String,
    pub car_num: String,
    pub driver_num: String,
}

impl TransferReminder {
    pub async fn departing_between(
        db: &Database,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> sqlx::Result<Vec<TransferReminder>> {
        sqlx::query_as::<_, TransferReminder>(
            "SELECT t.id, u.tg_id, t.departs_at, t.place, t.car_num, t.driver_num
             FROM transfers t JOIN users u ON u.id = t.user_id
             WHERE t.departs_at >= $1 AND t.departs_at < $2",
        )
        .bind(from)
        .bind(to)
        .fetch_all(&db.pool)
        .await
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct LivingInfo {
    pub room: String,
    pub build: String,
}

impl LivingInfo {
    pub async fn for_user(db: &Database, tg_id: i64) -> sqlx::Result<Option<LivingInfo>> {
        sqlx::query_as::<_, LivingInfo>(
            "SELECT l.room, l.build
             FROM livings l JOIN users u ON u.id = l.user_id
             WHERE u.tg_id = $1",
        )
        .bind(tg_id)
        .fetch_optional(&db.pool)
        .await
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct LivingReminder {
    pub id: i64,
    pub tg_id: Option<i64>,
    pub room: String,
    pub build: String,
}

impl LivingReminder {
    pub async fn for_date(db: &Database, date: NaiveDate) -> sqlx::Result<Vec<LivingReminder>> {
        sqlx::query_as::<_, LivingReminder>(
            "SELECT l.id, u.tg_id, l.room, l.build
             FROM livings l JOIN users u ON u.id = l.user_id
             WHERE l.date = $1",
        )
        .bind(date)
        .fetch_all(&db.pool)
        .await
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Schedule {
    pub id: i64,
    pub template: String,
}

impl Schedule {
    pub async fn for_date(db: &Database, date: NaiveDate) -> sqlx::Result<Vec<Schedule>> {
        sqlx::query_as::<_, Schedule>("SELECT id, template FROM schedules WHERE date = $1")
            .bind(date)
            .fetch_all(&db.pool)
            .await
    }
}
