//! Все пользовательские тексты. Разметка — HTML.

use crate::booking::Diary;
use crate::models::Role;

pub const MENU_BUTTON: &str = "Меню 📋";

pub const START: &str = "Добро пожаловать! Нажмите кнопку <b>«Меню 📋»</b>, чтобы открыть меню.";

pub const NEW_USER: &str =
    "Похоже, вы здесь впервые. Для работы с ботом нужно привязать ваш аккаунт к списку участников.";

pub const AGREEMENT: &str = "Нажимая <b>«Отправить ✉️»</b>, вы подтверждаете, что ваш \
    Telegram-аккаунт будет привязан к вашей анкете участника.";

pub const SUCCESS_REG: &str = "Регистрация прошла успешно!";

pub const FAILED_REG: &str = "Не удалось найти ваш аккаунт в списке участников. \
    Проверьте, что в настройках Telegram указан никнейм, и попробуйте ещё раз.";

pub const STILL_FAILED_REG: &str =
    "Аккаунт всё ещё не найден. Обратитесь к организаторам.";

pub const USER_MENU: &str = "Главное меню участника";
pub const LISTENER_MENU: &str = "Главное меню слушателя";
pub const EXPERT_MENU: &str = "Главное меню эксперта";
pub const MANAGER_MENU: &str = "Главное меню организатора";

pub const TRANSFER_CHOOSE: &str = "Выберите направление трансфера";
pub const TRANSFER_NONE: &str = "Для вас не назначен трансфер в этом направлении";

pub fn transfer_info(time: &str, place: &str, car_num: &str, driver_num: &str) -> String {
    format!(
        "🚘 Ваш трансфер в <b>{time}</b>\n\n\
         <b>Место сбора:</b>\n{place}\n\
         <b>За вами подъедет:</b>\n{car_num}\n\
         <b>Номер водителя:</b>\n{driver_num}"
    )
}

pub fn transfer_companions(companions: &[String]) -> String {
    format!("\n\nВместе с вами едут:\n{}", companions.join("\n"))
}

pub const LIVING_NONE: &str = "Информация о вашем проживании пока не внесена";

pub fn living_info(room: &str, build: &str) -> String {
    format!(
        "🏘 Вы живете в номере <b>{room}</b>, корпус <b>{build}</b>. \
         Для заселения подойдите с паспортом в ваш корпус и обратитесь на ресепшн."
    )
}

pub const SUPPORT_LINKS: &str = "Полезные ссылки 🔗";
pub const SUPPORT_LINKS_NONE: &str = "Раздел недоступен";
pub const CONTACTS_INFO: &str = "По всем вопросам пишите организаторам: @event_support";

// Мастер записи

pub const REGISTER: &str =
    "Здесь вы можете записаться к эксперту на <b>групповую</b> или <b>личную</b> встречу";

pub const REGISTER_UNAVAILABLE: &str = "Пока запись недоступна. \n\
    Регистрация откроется за сутки до встречи с экспертом \
    и закроется за 5 минут до старта встреч с экспертами";

pub const DEREGISTER: &str =
    "Здесь вы можете отменить свои записи к экспертам на <b>групповые</b> или <b>личные</b> встречи";

pub fn deregister_unavailable(is_group: bool) -> String {
    let consultation_type = if is_group { "групповые" } else { "индивидуальные" };
    format!("У вас нет записей на предстоящие {consultation_type} встречи")
}

pub const INTERVALS: &str =
    "Выберите временной слот, в который вы хотите записаться. Вы можете выбрать <b>1 эксперта</b>.";

pub const INTERVALS_GROUP_SUFFIX: &str = " в <b>каждом</b> временном слоте";

pub fn experts(is_group: bool) -> &'static str {
    if is_group {
        "Ниже вы увидите всех экспертов, к которым можно записаться. \
         Встреча пройдет в <b>групповом</b> формате по 8 человек."
    } else {
        "Ниже вы увидите всех экспертов, к которым можно записаться. \
         Консультации проходят в индивидуальном формате."
    }
}

pub const EXPERTS_NONE: &str = "Нет доступных экспертов в данном временном промежутке";
pub const DATES_NONE: &str = "У данного эксперта отсутствует время записи";
pub const DATES_CHOOSE: &str = "Доступны следующие временные слоты. \
    После выбора времени, нажмите на кнопку <b>«Подтвердить»</b>";

pub const REGISTER_CONFIRM: &str = "Вы хотите записаться к";
pub const REGISTER_END: &str = "Вы успешно записаны";
pub const REGISTER_FULL: &str =
    "К сожалению, места в этом слоте уже заняты. Выберите другое время";
pub const REGISTER_ERROR: &str = "Во время регистрации произошла ошибка, попробуйте еще раз";

pub const DEREGISTER_CHOOSE: &str = "Выберите запись, которую хотите отменить:";
pub const DEREGISTER_CONFIRM: &str = "Вы хотите отменить запись к";
pub const DEREGISTER_END: &str = "Вы успешно отменили запись";
pub const DEREGISTER_WINDOW_CLOSED: &str =
    "Эту запись уже нельзя отменить самостоятельно, обратитесь к организаторам";
pub const DEREGISTER_ERROR: &str = "Во время отмены записи произошла ошибка, попробуйте еще раз";

pub const DIARY_NONE: &str = "Пока вы не записаны ни на одну встречу с экспертом. \
    Для записи вернитесь в основное меню и нажмите <b>«Записаться»</b>";

pub fn diary(diary: &Diary) -> String {
    let mut text = String::from("Групповые встречи:\n");
    if diary.group.is_empty() {
        text.push_str("Вы не записаны на встречи\n");
    } else {
        for entry in &diary.group {
            text.push_str(&format!(
                "{} {} вы записаны к {}\n",
                entry.date.format("%d.%m"),
                entry.start_time.format("%H:%M"),
                entry.expert_name
            ));
        }
    }

    text.push_str("\nИндивидуальная встреча:\n");
    if diary.personal.is_empty() {
        text.push_str("Вы не записаны на встречу\n");
    } else {
        for entry in &diary.personal {
            text.push_str(&format!(
                "{} {} вы записаны к {}\n",
                entry.date.format("%d.%m"),
                entry.start_time.format("%H:%M"),
                entry.expert_name
            ));
        }
    }

    text
}

// Эксперт

pub const CONSULTATIONS_NONE: &str = "Записи на ваши консультации отсутствуют.";

pub fn consultations(agenda: &[crate::booking::AgendaItem]) -> String {
    let mut text = String::from("К вам записаны:\n\n");
    for item in agenda {
        text.push_str(&format!("<b>{}</b>\n", item.date_label));
        for (name, map_url) in &item.attendees {
            if map_url.is_empty() {
                text.push_str(&format!("{}\n", name));
            } else {
                text.push_str(&format!("<a href=\"{}\">{}</a>\n", map_url, name));
            }
        }
        text.push_str(&format!("{}\n", "—".repeat(10)));
    }
    text
}

// Менеджер

pub const NOTIF_TYPE: &str = "Выберите критерий назначения рассылки";

pub fn notif_recipient(selection: crate::models::Selection) -> &'static str {
    use crate::models::Selection;
    match selection {
        Selection::Feedback => "Необходимо выбрать мероприятие, по которому хотите отправить оценку",
        Selection::Activity => "Выберите активность",
        Selection::Consultation => "Выберите консультацию",
        Selection::Roles => "Выберите роли",
        _ => NOTIF_TYPE,
    }
}

pub const CHOICES_NONE: &str = "Отсутствуют варианты выбора для данного критерия";
pub const ROLES_NONE: &str = "Отметьте хотя бы одну роль";

pub const CHOOSE_PERSON: &str = "Введи фамилию и имя или никнейм пользователя.\n\
    Например:\n\
    <b>Иванов Петр\n</b>\
    <b>@username</b>";

pub fn person_found(full_name: &str, username: &str) -> String {
    format!("Найден пользователь <b>{full_name}</b> (@{username}).\nПродолжить работу с ним?")
}

pub fn person_none(person: &str) -> String {
    format!("Пользователь {person} не найден!\nПопробуй еще раз")
}

pub const WRITE_MSG: &str = "Напишите сообщение, которое необходимо разослать участникам";

pub fn feedback_confirm(name: &str) -> String {
    format!("Вы уверены, что хотите отправить рассылку с оценкой <b>{name}</b>?")
}

pub const TOO_LONG_MSG: &str =
    "Слишком длинный текст, объём не должен превышать 4000 символов. Попробуй ещё раз";

pub fn roles_summary(roles: &[Role]) -> String {
    roles
        .iter()
        .map(|r| r.audience_label().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn send_confirm(name: &str, message: &str) -> String {
    format!("Ты хочешь отправить сообщение <b>{name}</b> следующего содержания:\n\n{message}")
}

pub const SENDING_IN_PROCESS: &str = "Идет процесс рассылки, ожидайте сообщение о его завершении";

pub fn sending_success(send_count: u32) -> String {
    format!("{send_count} человек успешно получили рассылку")
}

pub fn feedback_message(name: &str) -> String {
    format!("Вы только что посетили мероприятие <b>{name}</b>. Мы просим вас ответить на несколько вопросов.")
}

// Анкета оценки: четыре вопроса подряд

pub fn feedback_question(step: u8) -> &'static str {
    match step {
        1 => "Оцените ваше общее впечатление от мероприятия (от 1 до 5)",
        2 => "Насколько вам понравилась организация? (от 1 до 5)",
        3 => "Насколько полезным было содержание? (от 1 до 5)",
        _ => "Насколько актуальна для вас эта тема? (от 1 до 5)",
    }
}

pub const FEEDBACK_FINAL: &str = "Спасибо за ваши ответы! 💛";

// Плановые напоминания

pub fn consultation_notif(expert: &str, date: &str) -> String {
    format!(
        "📍 Напоминаем, что вы записаны к {expert} на {date}.\n\n\
         Ждем вас на <b>2 этаже комплекса</b>."
    )
}

pub fn transfer_notif(time: &str, place: &str, car_num: &str, driver_num: &str) -> String {
    format!(
        "🚘 Напоминаем, что завтра в {time} вас будет ожидать трансфер\n\n\
         <b>Место сбора</b>:\n{place}\n\
         <b>За вами подъедет:</b>\n{car_num}\n\
         <b>Номер водителя:</b>\n{driver_num}\n\n\
         P.s. Информация о трансфере доступна по кнопке <b>\"Трансфер\"</b> в меню!\n"
    )
}

pub fn living_notif(room: &str, build: &str) -> String {
    format!(
        "🏘 Напоминаем, что вы живете в номере <b>{room}</b>, \
         корпус <b>{build}</b>. Для заселения вам необходимо \
         подойти с паспортом в ваш корпус и обратиться на ресепшн.\n\n\
         P.s. Информация о проживании доступна по кнопке <b>\"Проживание\"</b> в меню!"
    )
}

pub const FLOOD_WARNING: &str = "Антифлуд система!\nПодождите 60 секунд.";

pub const BACK_UNAVAILABLE: &str = "Не получилось вернуться назад, откройте меню заново";
