//! Рассылки: разрешение аудитории и веерная доставка с тротлингом.

pub mod audience;
pub mod dispatcher;

use crate::models::{Role, StatusTable};

/// Кому адресована кампания.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Roles(Vec<Role>),
    Activity(i64),
    Consultation(i64),
    /// Оценка мероприятия: получают все, кроме организаторов.
    Event(i64),
    Person(i64),
    AllNonManagers,
}

impl Selector {
    /// Сущность, на которую пишется агрегатный статус кампании.
    /// Для ad-hoc аудиторий статус не сохраняется.
    pub fn status_target(&self) -> Option<(StatusTable, i64)> {
        match self {
            Selector::Activity(id) => Some((StatusTable::Activities, *id)),
            Selector::Consultation(id) => Some((StatusTable::ConsultationSlots, *id)),
            Selector::Event(id) => Some((StatusTable::Events, *id)),
            Selector::Roles(_) | Selector::Person(_) | Selector::AllNonManagers => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recipient {
    pub chat_id: i64,
}
