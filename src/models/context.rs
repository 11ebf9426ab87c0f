use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::Role;

/// Состояния диалога. Дерево повторяет структуру меню: строковое
/// представление ("Menu.User.register_interval") хранится в БД и
/// обязано разбираться обратно без потерь.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Idle,
    RegistrationStart,
    RegistrationConfirm,
    Main,
    TransferChoose,
    TransferInfo,
    LivingInfo,
    ContactsInfo,
    SupportLinks,
    UserGeneral,
    Register,
    RegisterInterval,
    RegisterPersonalDate,
    RegisterConfirm,
    RegisterFinal,
    Deregister,
    DeregisterConfirm,
    DeregisterFinal,
    Diary,
    ListenerGeneral,
    ExpertGeneral,
    ExpertConsultations,
    ManagerGeneral,
    NotifRecipient,
    NotifPersonConfirm,
    NotifTypeCheck,
    NotifMessage,
    NotifSend,
}

const STATE_NAMES: &[(State, &str)] = &[
    (State::RegistrationStart, "Registration.start"),
    (State::RegistrationConfirm, "Registration.confirmation"),
    (State::Main, "Menu.main"),
    (State::TransferChoose, "Menu.transfer_choose"),
    (State::TransferInfo, "Menu.transfer_info"),
    (State::LivingInfo, "Menu.living_info"),
    (State::ContactsInfo, "Menu.contacts_info"),
    (State::SupportLinks, "Menu.support_links"),
    (State::UserGeneral, "Menu.User.general"),
    (State::Register, "Menu.User.register"),
    (State::RegisterInterval, "Menu.User.register_interval"),
    (State::RegisterPersonalDate, "Menu.User.register_personal_date"),
    (State::RegisterConfirm, "Menu.User.register_confirm"),
    (State::RegisterFinal, "Menu.User.register_final"),
    (State::Deregister, "Menu.User.deregister"),
    (State::DeregisterConfirm, "Menu.User.deregister_confirm"),
    (State::DeregisterFinal, "Menu.User.deregister_final"),
    (State::Diary, "Menu.User.diary"),
    (State::ListenerGeneral, "Menu.Listener.general"),
    (State::ExpertGeneral, "Menu.Expert.general"),
    (State::ExpertConsultations, "Menu.Expert.consultations"),
    (State::ManagerGeneral, "Menu.Manager.general"),
    (State::NotifRecipient, "Menu.Manager.notif_recipient"),
    (State::NotifPersonConfirm, "Menu.Manager.notif_person_confirm"),
    (State::NotifTypeCheck, "Menu.Manager.notif_type_check"),
    (State::NotifMessage, "Menu.Manager.notif_message"),
    (State::NotifSend, "Menu.Manager.notif_send"),
];

impl State {
    pub fn as_str(&self) -> &'static str {
        if let State::Idle = self {
            return "";
        }
        STATE_NAMES
            .iter()
            .find(|(s, _)| s == self)
            .map(|(_, name)| *name)
            .unwrap_or("")
    }

    pub fn parse(s: &str) -> State {
        STATE_NAMES
            .iter()
            .find(|(_, name)| *name == s)
            .map(|(state, _)| *state)
            .unwrap_or(State::Idle)
    }

    /// Состояния, где диалог внутри мастера записи.
    pub fn in_user_menu(&self) -> bool {
        matches!(
            self,
            State::UserGeneral
                | State::Register
                | State::RegisterInterval
                | State::RegisterPersonalDate
                | State::RegisterConfirm
                | State::RegisterFinal
                | State::Deregister
                | State::DeregisterConfirm
                | State::DeregisterFinal
                | State::Diary
        )
    }

    pub fn in_manager_menu(&self) -> bool {
        matches!(
            self,
            State::ManagerGeneral
                | State::NotifRecipient
                | State::NotifPersonConfirm
                | State::NotifTypeCheck
                | State::NotifMessage
                | State::NotifSend
        )
    }

    /// Корневое состояние любого из четырёх ролевых меню.
    pub fn in_general_menu(&self) -> bool {
        matches!(
            self,
            State::UserGeneral | State::ListenerGeneral | State::ExpertGeneral | State::ManagerGeneral
        )
    }
}

/// Метка выбора, от которой зависит разрешение «назад».
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    Group,
    Personal,
    Feedback,
    Activity,
    Consultation,
    Roles,
    Person,
}

impl Selection {
    pub fn parse(s: &str) -> Option<Selection> {
        match s {
            "group" => Some(Selection::Group),
            "personal" => Some(Selection::Personal),
            "feedback" => Some(Selection::Feedback),
            "activity" => Some(Selection::Activity),
            "consultation" => Some(Selection::Consultation),
            "roles" => Some(Selection::Roles),
            "person" => Some(Selection::Person),
            _ => None,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Selection::Group)
    }
}

/// Накопленная цель рассылки.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotifTarget {
    Roles { roles: Vec<Role> },
    Activity { id: i64 },
    Consultation { id: i64 },
    Event { id: i64 },
    Person { id: i64 },
}

/// Форма накопленных данных — третья компонента ключа «назад».
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    Empty,
    Roles,
    Activity,
    Consultation,
    Event,
    Person,
}

impl NotifTarget {
    pub fn shape(&self) -> PayloadShape {
        match self {
            NotifTarget::Roles { .. } => PayloadShape::Roles,
            NotifTarget::Activity { .. } => PayloadShape::Activity,
            NotifTarget::Consultation { .. } => PayloadShape::Consultation,
            NotifTarget::Event { .. } => PayloadShape::Event,
            NotifTarget::Person { .. } => PayloadShape::Person,
        }
    }
}

/// Черновик оценки мероприятия: четыре вопроса подряд.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackDraft {
    pub step: u8,
    pub grades: Vec<u8>,
}

/// Произвольные данные контекста. Поля мастеров чистятся при
/// завершении сценария, поля антифлуда живут постоянно.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<Selection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notif_target: Option<NotifTarget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notif_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager_msg_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expert_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_id: Option<i64>,
    /// Явное множество отмеченных ролей; клавиатура — его проекция.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selected_roles: Vec<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reg_msg_id: Option<i32>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub feedback: HashMap<i64, FeedbackDraft>,

    // Антифлуд
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_msg_at: Option<i64>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub burst: u32,
    #[serde(default, skip_serializing_if = "is_false")]
    pub muted: bool,
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl ContextData {
    pub fn toggle_role(&mut self, role: Role) {
        if let Some(pos) = self.selected_roles.iter().position(|r| *r == role) {
            self.selected_roles.remove(pos);
        } else {
            self.selected_roles.push(role);
        }
    }

    /// Сброс полей мастера рассылки. Поля антифлуда не трогаем.
    pub fn clear_notif(&mut self) {
        self.selection = None;
        self.notif_target = None;
        self.notif_text = None;
        self.manager_msg_id = None;
        self.selected_roles.clear();
    }

    /// Сброс полей мастера записи.
    pub fn clear_booking(&mut self) {
        self.selection = None;
        self.interval_id = None;
        self.expert_id = None;
        self.slot_id = None;
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationContext {
    pub state: State,
    pub data: ContextData,
}

impl Default for State {
    fn default() -> Self {
        State::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_names_round_trip() {
        for (state, name) in STATE_NAMES {
            assert_eq!(state.as_str(), *name);
            assert_eq!(State::parse(name), *state);
        }
        assert_eq!(State::parse("Menu.User.unknown"), State::Idle);
        assert_eq!(State::Idle.as_str(), "");
    }

    #[test]
    fn context_data_round_trips_nested_structures() {
        let mut data = ContextData::default();
        data.selection = Some(Selection::Roles);
        data.notif_target = Some(NotifTarget::Roles {
            roles: vec![Role::User, Role::Listener],
        });
        data.notif_text = Some("Завтра общий сбор в 9:00".to_string());
        data.selected_roles = vec![Role::User, Role::Listener];
        data.feedback.insert(
            7,
            FeedbackDraft {
                step: 3,
                grades: vec![5, 4],
            },
        );
        data.last_msg_at = Some(1_700_000_000);
        data.burst = 2;

        let json = serde_json::to_value(&data).unwrap();
        let back: ContextData = serde_json::from_value(json).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn empty_context_data_serializes_compactly() {
        let json = serde_json::to_value(ContextData::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    fn toggle_role_is_an_involution() {
        let mut data = ContextData::default();
        data.toggle_role(Role::Expert);
        assert_eq!(data.selected_roles, vec![Role::Expert]);
        data.toggle_role(Role::User);
        data.toggle_role(Role::Expert);
        assert_eq!(data.selected_roles, vec![Role::User]);
    }
}
