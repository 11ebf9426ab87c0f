//! Сборка клавиатур. Ссылки внешних разделов берутся из окружения:
//! кнопка без настроенной ссылки просто не показывается.

use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup,
};

use crate::booking::{Choice, DiaryEntry};
use crate::models::{Role, User};

use super::texts;

fn back_button() -> InlineKeyboardButton {
    InlineKeyboardButton::callback("Назад ◀️", "back")
}

fn confirm_button() -> InlineKeyboardButton {
    InlineKeyboardButton::callback("Подтвердить ✅", "confirm")
}

fn url_button(label: &str, env_key: &str) -> Option<InlineKeyboardButton> {
    let url = std::env::var(env_key).ok()?;
    let url = url.parse().ok()?;
    Some(InlineKeyboardButton::url(label.to_string(), url))
}

pub fn reply_menu() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![KeyboardButton::new(texts::MENU_BUTTON)]]).resize_keyboard()
}

pub fn back() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![back_button()]])
}

pub fn start_reg() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "Перейти к регистрации ➡️",
        "start_reg",
    )]])
}

pub fn send_reg() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "Отправить ✉️",
        "send",
    )]])
}

pub fn try_again_reg() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "Попробовать еще раз 🔄",
        "send",
    )]])
}

/// Ролевое главное меню.
pub fn role_menu(role: Role) -> InlineKeyboardMarkup {
    let transfer = InlineKeyboardButton::callback("Трансфер 🚘", "transfer");
    let living = InlineKeyboardButton::callback("Проживание 🏘", "living");
    let support = InlineKeyboardButton::callback("Полезные ссылки 🔗", "support_links");

    let mut rows = vec![vec![transfer], vec![living]];

    match role {
        Role::User => {
            rows.push(vec![InlineKeyboardButton::callback("Записаться ✏️", "register")]);
            rows.push(vec![InlineKeyboardButton::callback("Перезаписаться ♻️", "deregister")]);
            rows.push(vec![InlineKeyboardButton::callback("Мои записи 📅", "diary")]);
        }
        Role::Listener => {}
        Role::Expert => {
            rows.push(vec![InlineKeyboardButton::callback("Консультации 📅", "consultations")]);
        }
        Role::Manager => {
            rows.push(vec![InlineKeyboardButton::callback("Отправить рассылку", "send_notifs")]);
            if let Some(b) = url_button("База данных ℹ️", "ADMIN_URL") {
                rows.push(vec![b]);
            }
        }
    }

    rows.push(vec![support]);
    if let Some(b) = url_button("Расписание 📌", "SCHEDULE_URL") {
        rows.push(vec![b]);
    }

    InlineKeyboardMarkup::new(rows)
}

pub fn transfer_choose() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("Туда ✈️", "transfer_to"),
        InlineKeyboardButton::callback("Обратно 🏘", "transfer_from"),
    ]])
}

pub fn support_links(user: &User) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = Vec::new();

    let participant = matches!(user.role(), Some(Role::User) | Some(Role::Listener));

    if user.role() == Some(Role::User) && !user.map_url.is_empty() {
        if let Ok(url) = user.map_url.parse() {
            rows.push(vec![InlineKeyboardButton::url("Карта 🗺".to_string(), url)]);
        }
    }

    if let Some(b) = url_button("Визитки экспертов и участников 📹", "BUSINESS_CARDS_URL") {
        rows.push(vec![b]);
    }
    if participant {
        if let Some(b) = url_button("Презентации экспертов 💻️", "EXPERT_PRESENTATIONS_URL") {
            rows.push(vec![b]);
        }
    }
    if let Some(b) = url_button("Фотографии 📷", "PHOTOS_URL") {
        rows.push(vec![b]);
    }

    // возврата отсюда нет: следующий экран открывается кнопкой меню
    rows.push(vec![InlineKeyboardButton::callback("Контакты ☎️", "contacts")]);

    InlineKeyboardMarkup::new(rows)
}

pub fn register_types() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("Групповая 👥", "group"),
        InlineKeyboardButton::callback("Индивидуальная 👤", "personal"),
    ]])
}

pub fn deregister_types() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("Групповые 👥", "group"),
        InlineKeyboardButton::callback("Индивидуальные 👤", "personal"),
    ]])
}

pub fn register_confirm() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![confirm_button()], vec![back_button()]])
}

/// Колонка вариантов с кнопкой «Назад» внизу.
pub fn choices(items: &[Choice], prefix: &str) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = items
        .iter()
        .map(|c| {
            vec![InlineKeyboardButton::callback(
                c.label.clone(),
                format!("{}{}", prefix, c.id),
            )]
        })
        .collect();
    rows.push(vec![back_button()]);
    InlineKeyboardMarkup::new(rows)
}

pub fn cancellable_records(entries: &[DiaryEntry]) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = entries
        .iter()
        .map(|e| {
            vec![InlineKeyboardButton::callback(
                format!(
                    "{} ({} {})",
                    e.expert_name,
                    e.date.format("%d.%m"),
                    e.start_time.format("%H:%M")
                ),
                format!("consultation_{}", e.slot_id),
            )]
        })
        .collect();
    rows.push(vec![back_button()]);
    InlineKeyboardMarkup::new(rows)
}

pub fn notif_types() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback("Отправить оценку мероприятия 💛", "choose_feedback")],
        vec![InlineKeyboardButton::callback("Участники активности 🧘", "choose_activity")],
        vec![InlineKeyboardButton::callback("Участники консультации 🗣", "choose_consultation")],
        vec![InlineKeyboardButton::callback("По ролям 🚻", "choose_roles")],
        vec![InlineKeyboardButton::callback("Конкретному пользователю 🖍", "choose_person")],
    ])
}

/// Клавиатура ролей — чистая проекция отмеченного множества.
pub fn roles_marks(selected: &[Role]) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = Role::ALL
        .iter()
        .map(|role| {
            let mark = if selected.contains(role) { "✅" } else { "❌" };
            vec![InlineKeyboardButton::callback(
                format!("{} {}", role.label(), mark),
                format!("notif_roles:{}", role.as_str()),
            )]
        })
        .collect();
    rows.push(vec![InlineKeyboardButton::callback("Продолжить ➡️", "notif_roles:continue")]);
    rows.push(vec![back_button()]);
    InlineKeyboardMarkup::new(rows)
}

pub fn person_confirm(person_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            "Подтвердить",
            format!("notif_person:{}", person_id),
        )],
        vec![back_button()],
    ])
}

pub fn send_confirm() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![confirm_button()], vec![back_button()]])
}

/// Ряд оценок 1️⃣–5️⃣ для шага анкеты.
pub fn feedback_grades(event_id: i64, step: u8) -> InlineKeyboardMarkup {
    const DIGITS: [&str; 5] = ["1️⃣", "2️⃣", "3️⃣", "4️⃣", "5️⃣"];

    let row: Vec<InlineKeyboardButton> = (1..=5u8)
        .map(|grade| {
            InlineKeyboardButton::callback(
                DIGITS[(grade - 1) as usize],
                format!("feedbackbutton_{}:{}:{}", event_id, step, grade),
            )
        })
        .collect();

    InlineKeyboardMarkup::new(vec![row])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_keyboard_reflects_selected_set() {
        let kb = roles_marks(&[Role::User, Role::Expert]);
        let labels: Vec<String> = kb
            .inline_keyboard
            .iter()
            .map(|row| row[0].text.clone())
            .collect();

        assert_eq!(labels[0], "Участник ✅");
        assert_eq!(labels[1], "Слушатель ❌");
        assert_eq!(labels[2], "Эксперт ✅");
        assert_eq!(labels[3], "Организатор ❌");
        assert_eq!(labels[4], "Продолжить ➡️");
    }

    #[test]
    fn support_links_has_no_dead_back_button() {
        let user = User {
            id: 1,
            tg_id: Some(100),
            username: "ivanov".to_string(),
            first_name: "Пётр".to_string(),
            last_name: "Иванов".to_string(),
            map_url: String::new(),
            role: "user".to_string(),
        };

        let kb = support_links(&user);
        for row in &kb.inline_keyboard {
            for button in row {
                if let teloxide::types::InlineKeyboardButtonKind::CallbackData(data) = &button.kind
                {
                    assert_ne!(data, "back");
                }
            }
        }
        let last = kb.inline_keyboard.last().unwrap();
        assert_eq!(last[0].text, "Контакты ☎️");
    }

    #[test]
    fn feedback_grades_encode_event_step_and_grade() {
        let kb = feedback_grades(7, 2);
        let row = &kb.inline_keyboard[0];
        assert_eq!(row.len(), 5);
        match &row[4].kind {
            teloxide::types::InlineKeyboardButtonKind::CallbackData(data) => {
                assert_eq!(data, "feedbackbutton_7:2:5");
            }
            other => panic!("unexpected button kind: {:?}", other),
        }
    }
}
