//! Реестр маршрутов колбэков. Порядок записей значим: выигрывает
//! первое совпадение пары (шаблон, состояние), поэтому частные
//! шаблоны стоят раньше общих ("notif_roles" раньше "notif_").

use crate::models::{PayloadShape, Selection, State};

/// Шаблон callback-данных.
#[derive(Debug, Clone, Copy)]
pub enum Pattern {
    Exact(&'static str),
    Prefix(&'static str),
    OneOf(&'static [&'static str]),
}

impl Pattern {
    pub fn matches(&self, data: &str) -> bool {
        match self {
            Pattern::Exact(s) => data == *s,
            Pattern::Prefix(p) => data.starts_with(p),
            Pattern::OneOf(options) => options.contains(&data),
        }
    }
}

/// Именованные операции диалога. Таблица маршрутов и таблица «назад»
/// ссылаются на операции, исполнение живёт в callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Back,
    RegStart,
    RegSend,
    TransferMenu,
    TransferInfo,
    LivingInfo,
    SupportLinks,
    Contacts,
    FeedbackStart,
    FeedbackStep,
    Register,
    RegisterTypes,
    ExpertChoose,
    DateChoose,
    RegisterConfirm,
    RegisterEnd,
    Deregister,
    DeregisterTypes,
    DeregisterConfirm,
    DeregisterEnd,
    Diary,
    ExpertConsultations,
    NotifStart,
    NotifRecipient,
    NotifRolesMark,
    NotifTypeCheck,
    NotifSend,
}

pub struct Route {
    pub pattern: Pattern,
    pub guard: fn(&State) -> bool,
    pub op: Op,
}

fn back_scope(s: &State) -> bool {
    matches!(s, State::TransferInfo) || s.in_user_menu() || s.in_manager_menu()
}

fn general_menu(s: &State) -> bool {
    s.in_general_menu()
}

fn not_manager_menu(s: &State) -> bool {
    !s.in_manager_menu()
}

fn is_transfer_choose(s: &State) -> bool {
    matches!(s, State::TransferChoose)
}

fn is_support_links(s: &State) -> bool {
    matches!(s, State::SupportLinks)
}

fn is_user_general(s: &State) -> bool {
    matches!(s, State::UserGeneral)
}

fn is_register(s: &State) -> bool {
    matches!(s, State::Register)
}

fn is_register_interval(s: &State) -> bool {
    matches!(s, State::RegisterInterval)
}

fn is_register_personal_date(s: &State) -> bool {
    matches!(s, State::RegisterPersonalDate)
}

fn is_register_confirm(s: &State) -> bool {
    matches!(s, State::RegisterConfirm)
}

fn is_register_final(s: &State) -> bool {
    matches!(s, State::RegisterFinal)
}

fn is_deregister(s: &State) -> bool {
    matches!(s, State::Deregister)
}

fn is_deregister_confirm(s: &State) -> bool {
    matches!(s, State::DeregisterConfirm)
}

fn is_deregister_final(s: &State) -> bool {
    matches!(s, State::DeregisterFinal)
}

fn is_expert_general(s: &State) -> bool {
    matches!(s, State::ExpertGeneral)
}

fn is_manager_general(s: &State) -> bool {
    matches!(s, State::ManagerGeneral)
}

fn is_notif_recipient(s: &State) -> bool {
    matches!(s, State::NotifRecipient)
}

fn is_notif_type_check(s: &State) -> bool {
    matches!(s, State::NotifTypeCheck)
}

fn is_notif_send(s: &State) -> bool {
    matches!(s, State::NotifSend)
}

fn is_registration_start(s: &State) -> bool {
    matches!(s, State::RegistrationStart)
}

fn is_registration_confirm(s: &State) -> bool {
    matches!(s, State::RegistrationConfirm)
}

pub const ROUTES: &[Route] = &[
    Route { pattern: Pattern::Exact("back"), guard: back_scope, op: Op::Back },
    // общее меню
    Route { pattern: Pattern::Exact("transfer"), guard: general_menu, op: Op::TransferMenu },
    Route { pattern: Pattern::Prefix("transfer_"), guard: is_transfer_choose, op: Op::TransferInfo },
    Route { pattern: Pattern::Exact("living"), guard: general_menu, op: Op::LivingInfo },
    Route { pattern: Pattern::Exact("support_links"), guard: general_menu, op: Op::SupportLinks },
    Route { pattern: Pattern::Exact("contacts"), guard: is_support_links, op: Op::Contacts },
    Route { pattern: Pattern::Prefix("feedbackstart_"), guard: not_manager_menu, op: Op::FeedbackStart },
    Route { pattern: Pattern::Prefix("feedbackbutton_"), guard: not_manager_menu, op: Op::FeedbackStep },
    // мастер записи
    Route { pattern: Pattern::Exact("register"), guard: is_user_general, op: Op::Register },
    Route { pattern: Pattern::OneOf(&["group", "personal"]), guard: is_register, op: Op::RegisterTypes },
    Route { pattern: Pattern::Prefix("interval_"), guard: is_register_interval, op: Op::ExpertChoose },
    Route { pattern: Pattern::Prefix("expert_"), guard: is_register_personal_date, op: Op::DateChoose },
    Route { pattern: Pattern::Prefix("consultation_"), guard: is_register_confirm, op: Op::RegisterConfirm },
    Route { pattern: Pattern::Exact("confirm"), guard: is_register_final, op: Op::RegisterEnd },
    // отмена записи
    Route { pattern: Pattern::Exact("deregister"), guard: is_user_general, op: Op::Deregister },
    Route { pattern: Pattern::OneOf(&["group", "personal"]), guard: is_deregister, op: Op::DeregisterTypes },
    Route { pattern: Pattern::Prefix("consultation_"), guard: is_deregister_confirm, op: Op::DeregisterConfirm },
    Route { pattern: Pattern::Exact("confirm"), guard: is_deregister_final, op: Op::DeregisterEnd },
    Route { pattern: Pattern::Exact("diary"), guard: is_user_general, op: Op::Diary },
    // эксперт
    Route { pattern: Pattern::Exact("consultations"), guard: is_expert_general, op: Op::ExpertConsultations },
    // менеджер
    Route { pattern: Pattern::Exact("send_notifs"), guard: is_manager_general, op: Op::NotifStart },
    Route { pattern: Pattern::Prefix("choose_"), guard: is_notif_recipient, op: Op::NotifRecipient },
    Route { pattern: Pattern::Prefix("notif_roles"), guard: is_notif_type_check, op: Op::NotifRolesMark },
    Route { pattern: Pattern::Prefix("notif_"), guard: is_notif_type_check, op: Op::NotifTypeCheck },
    Route { pattern: Pattern::Exact("confirm"), guard: is_notif_send, op: Op::NotifSend },
    // регистрация
    Route { pattern: Pattern::Exact("start_reg"), guard: is_registration_start, op: Op::RegStart },
    Route { pattern: Pattern::Exact("send"), guard: is_registration_confirm, op: Op::RegSend },
];

/// Первое совпадение по порядку регистрации.
pub fn dispatch(data: &str, state: &State) -> Option<Op> {
    ROUTES
        .iter()
        .find(|route| route.pattern.matches(data) && (route.guard)(state))
        .map(|route| route.op)
}

/// Куда ведёт «назад»: тотальная таблица по тройке (состояние, метка
/// выбора, форма накопленных данных). `None` — переход не определён,
/// вызывающий код обязан залогировать это и ответить пользователю.
pub fn resolve_back(
    state: &State,
    selection: Option<Selection>,
    shape: Option<PayloadShape>,
) -> Option<Op> {
    use PayloadShape as Sh;
    use Selection as Sel;
    use State as St;

    match (state, selection, shape) {
        (St::TransferInfo, _, _) => Some(Op::TransferMenu),

        (St::RegisterInterval, _, _) => Some(Op::Register),
        (St::RegisterPersonalDate, _, _) => Some(Op::RegisterTypes),
        (St::RegisterConfirm, Some(Sel::Group), _) => Some(Op::RegisterTypes),
        (St::RegisterConfirm, Some(Sel::Personal), _) => Some(Op::ExpertChoose),
        (St::RegisterFinal, Some(Sel::Group), _) => Some(Op::ExpertChoose),
        (St::RegisterFinal, Some(Sel::Personal), _) => Some(Op::DateChoose),

        (St::DeregisterConfirm, _, _) => Some(Op::Deregister),
        (St::DeregisterFinal, _, _) => Some(Op::DeregisterTypes),

        (St::NotifPersonConfirm, Some(Sel::Person), _) => Some(Op::NotifStart),
        (St::NotifTypeCheck, Some(Sel::Person), _) => Some(Op::NotifRecipient),
        (St::NotifTypeCheck, Some(_), _) => Some(Op::NotifStart),
        (St::NotifSend, Some(Sel::Person), _) => Some(Op::NotifRecipient),
        (St::NotifSend, Some(Sel::Feedback), Some(Sh::Event)) => Some(Op::NotifRecipient),
        (St::NotifSend, Some(_), _) => Some(Op::NotifTypeCheck),
        (St::NotifMessage, Some(_), _) => Some(Op::NotifTypeCheck),

        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_match_wins_for_overlapping_patterns() {
        // notif_roles раньше общего notif_
        assert_eq!(
            dispatch("notif_roles:user", &State::NotifTypeCheck),
            Some(Op::NotifRolesMark)
        );
        assert_eq!(
            dispatch("notif_activity:3", &State::NotifTypeCheck),
            Some(Op::NotifTypeCheck)
        );
        // confirm различается состоянием
        assert_eq!(dispatch("confirm", &State::RegisterFinal), Some(Op::RegisterEnd));
        assert_eq!(dispatch("confirm", &State::DeregisterFinal), Some(Op::DeregisterEnd));
        assert_eq!(dispatch("confirm", &State::NotifSend), Some(Op::NotifSend));
        assert_eq!(dispatch("confirm", &State::Main), None);
        // transfer и transfer_to не пересекаются
        assert_eq!(dispatch("transfer", &State::UserGeneral), Some(Op::TransferMenu));
        assert_eq!(dispatch("transfer_to", &State::TransferChoose), Some(Op::TransferInfo));
    }

    #[test]
    fn group_and_personal_route_by_wizard_state() {
        assert_eq!(dispatch("group", &State::Register), Some(Op::RegisterTypes));
        assert_eq!(dispatch("personal", &State::Deregister), Some(Op::DeregisterTypes));
        assert_eq!(dispatch("group", &State::UserGeneral), None);
    }

    #[test]
    fn consultation_prefix_routes_by_wizard_state() {
        assert_eq!(
            dispatch("consultation_9", &State::RegisterConfirm),
            Some(Op::RegisterConfirm)
        );
        assert_eq!(
            dispatch("consultation_9", &State::DeregisterConfirm),
            Some(Op::DeregisterConfirm)
        );
    }

    #[test]
    fn feedback_buttons_ignored_inside_manager_menu() {
        assert_eq!(dispatch("feedbackstart_2", &State::Main), Some(Op::FeedbackStart));
        assert_eq!(dispatch("feedbackstart_2", &State::Idle), Some(Op::FeedbackStart));
        assert_eq!(dispatch("feedbackstart_2", &State::NotifMessage), None);
    }

    #[test]
    fn back_resolution_covers_booking_chains() {
        use Selection as Sel;

        assert_eq!(resolve_back(&State::TransferInfo, None, None), Some(Op::TransferMenu));
        assert_eq!(resolve_back(&State::RegisterInterval, Some(Sel::Group), None), Some(Op::Register));
        assert_eq!(
            resolve_back(&State::RegisterConfirm, Some(Sel::Group), None),
            Some(Op::RegisterTypes)
        );
        assert_eq!(
            resolve_back(&State::RegisterConfirm, Some(Sel::Personal), None),
            Some(Op::ExpertChoose)
        );
        assert_eq!(
            resolve_back(&State::RegisterFinal, Some(Sel::Group), None),
            Some(Op::ExpertChoose)
        );
        assert_eq!(
            resolve_back(&State::RegisterFinal, Some(Sel::Personal), None),
            Some(Op::DateChoose)
        );
        assert_eq!(resolve_back(&State::DeregisterConfirm, None, None), Some(Op::Deregister));
        assert_eq!(
            resolve_back(&State::DeregisterFinal, Some(Sel::Group), None),
            Some(Op::DeregisterTypes)
        );
    }

    #[test]
    fn back_resolution_covers_notification_chains() {
        use PayloadShape as Sh;
        use Selection as Sel;

        assert_eq!(
            resolve_back(&State::NotifPersonConfirm, Some(Sel::Person), None),
            Some(Op::NotifStart)
        );
        assert_eq!(
            resolve_back(&State::NotifTypeCheck, Some(Sel::Roles), None),
            Some(Op::NotifStart)
        );
        assert_eq!(
            resolve_back(&State::NotifTypeCheck, Some(Sel::Person), None),
            Some(Op::NotifRecipient)
        );
        assert_eq!(
            resolve_back(&State::NotifSend, Some(Sel::Person), Some(Sh::Person)),
            Some(Op::NotifRecipient)
        );
        // оценка мероприятия: назад со сводки — к списку мероприятий
        assert_eq!(
            resolve_back(&State::NotifSend, Some(Sel::Feedback), Some(Sh::Event)),
            Some(Op::NotifRecipient)
        );
        assert_eq!(
            resolve_back(&State::NotifSend, Some(Sel::Activity), Some(Sh::Activity)),
            Some(Op::NotifTypeCheck)
        );
        assert_eq!(
            resolve_back(&State::NotifMessage, Some(Sel::Roles), Some(Sh::Roles)),
            Some(Op::NotifTypeCheck)
        );
    }

    #[test]
    fn unmapped_back_is_none_not_panic() {
        assert_eq!(resolve_back(&State::Main, None, None), None);
        assert_eq!(resolve_back(&State::UserGeneral, None, None), None);
        assert_eq!(resolve_back(&State::NotifSend, None, None), None);
    }
}
