pub mod activity;
pub mod consultation;
pub mod context;
pub mod ephemeral;
pub mod event;
pub mod logistics;
pub mod user;

pub use context::{ContextData, ConversationContext, NotifTarget, PayloadShape, Selection, State};
pub use ephemeral::EphemeralKind;
pub use user::{Role, User};

/// Статус рассылки сущности (событие, активность, слот, день).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    NotSent,
    Sent,
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::NotSent => "not_send",
            DeliveryStatus::Sent => "send",
            DeliveryStatus::Failed => "failed",
        }
    }
}

/// Таблицы, несущие колонку notif_status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTable {
    Activities,
    Events,
    Transfers,
    Livings,
    Schedules,
    ConsultationSlots,
}

impl StatusTable {
    fn table_name(&self) -> &'static str {
        match self {
            StatusTable::Activities => "activities",
            StatusTable::Events => "events",
            StatusTable::Transfers => "transfers",
            StatusTable::Livings => "livings",
            StatusTable::Schedules => "schedules",
            StatusTable::ConsultationSlots => "consultation_slots",
        }
    }
}

pub async fn set_notif_status(
    db: &crate::database::Database,
    table: StatusTable,
    id: i64,
    status: DeliveryStatus,
) -> sqlx::Result<()> {
    let sql = format!(
        "UPDATE {} SET notif_status = $1, updated_at = NOW() WHERE id = $2",
        table.table_name()
    );
    sqlx::query(&sql)
        .bind(status.as_str())
        .bind(id)
        .execute(&db.pool)
        .await?;

    Ok(())
}
