use chrono::{NaiveDate, NaiveTime};
use sqlx::FromRow;

use crate::database::Database;

/// Крупный временной слот, группирующий консультации одного окна.
#[derive(Debug, Clone, FromRow)]
pub struct ConsultationInterval {
    pub id: i64,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl ConsultationInterval {
    pub fn label(&self) -> String {
        format!(
            "{} {}-{}",
            self.date.format("%d.%m"),
            self.start_time.format("%H:%M"),
            self.end_time.format("%H:%M")
        )
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ConsultationSlot {
    pub id: i64,
    pub interval_id: i64,
    pub expert_id: i64,
    pub start_time: NaiveTime,
    pub occupied: i32,
    pub capacity: i32,
    pub is_group: bool,
    pub is_active: bool,
}

impl ConsultationSlot {
    pub async fn by_id(db: &Database, id: i64) -> sqlx::Result<Option<ConsultationSlot>> {
        sqlx::query_as::<_, ConsultationSlot>(
            "SELECT id, interval_id, expert_id, start_time, occupied, capacity, is_group, is_active
             FROM consultation_slots WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&db.pool)
        .await
    }
}

/// Карточка слота для экранов подтверждения и списков менеджера.
#[derive(Debug, Clone, FromRow)]
pub struct SlotSummary {
    pub id: i64,
    pub expert_name: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_group: bool,
}

impl SlotSummary {
    pub async fn by_id(db: &Database, slot_id: i64) -> sqlx::Result<Option<SlotSummary>> {
        sqlx::query_as::<_, SlotSummary>(
            "SELECT s.id, u.last_name || ' ' || u.first_name AS expert_name,
                    i.date, s.start_time, i.end_time, s.is_group
             FROM consultation_slots s
             JOIN consultation_intervals i ON i.id = s.interval_id
             JOIN users u ON u.id = s.expert_id
             WHERE s.id = $1",
        )
        .bind(slot_id)
        .fetch_optional(&db.pool)
        .await
    }

    /// Все активные слоты — список выбора для рассылки менеджера.
    pub async fn all_active(db: &Database) -> sqlx::Result<Vec<SlotSummary>> {
        sqlx::query_as::<_, SlotSummary>(
            "SELECT s.id, u.last_name || ' ' || u.first_name AS expert_name,
                    i.date, s.start_time, i.end_time, s.is_group
             FROM consultation_slots s
             JOIN consultation_intervals i ON i.id = s.interval_id
             JOIN users u ON u.id = s.expert_id
             WHERE s.is_active
             ORDER BY i.date, s.start_time",
        )
        .fetch_all(&db.pool)
        .await
    }

    pub fn choice_label(&self) -> String {
        format!(
            "{} ({} {})",
            self.expert_name,
            self.date.format("%d.%m"),
            self.start_time.format("%H:%M")
        )
    }

    /// Подпись вида «Иванов Пётр с 10:00 до 11:30» для групповых и
    /// «Иванов Пётр с 10:20» для личных.
    pub fn confirm_label(&self) -> String {
        if self.is_group {
            format!(
                "{} с {} до {}",
                self.expert_name,
                self.start_time.format("%H:%M"),
                self.end_time.format("%H:%M")
            )
        } else {
            format!("{} с {}", self.expert_name, self.start_time.format("%H:%M"))
        }
    }
}
