use std::error::Error;

use chrono::Utc;
use teloxide::prelude::*;
use teloxide::types::{MessageId, ParseMode};

use crate::bot_state::BotState;
use crate::models::activity::Activity;
use crate::models::consultation::SlotSummary;
use crate::models::event::Event;
use crate::models::{ephemeral, EphemeralKind, NotifTarget, Role, State, User};

use super::keyboards as kb;
use super::texts;

type HandlerResult = Result<(), Box<dyn Error + Send + Sync>>;

/// Окно тишины, после которого счётчик всплеска сбрасывается.
const FLOOD_RESET_SECS: i64 = 60;
/// Сообщения чаще раза в 5 секунд копят всплеск.
const FLOOD_BURST_GAP_SECS: i64 = 5;
/// После восьми быстрых сообщений чат глушится.
const FLOOD_BURST_LIMIT: u32 = 8;

pub async fn message_handler(bot: Bot, msg: Message, state: BotState) -> HandlerResult {
    let chat_id = msg.chat.id;
    let Some(text) = msg.text().map(str::to_owned) else {
        let _ = bot.delete_message(chat_id, msg.id).await;
        return Ok(());
    };

    // Команды уже обработаны в command_handler
    if text.starts_with('/') {
        return Ok(());
    }

    let _guard = state.lock_chat(chat_id).await;
    let mut ctx = state.load_context(chat_id).await;

    if text == texts::MENU_BUTTON {
        if flood_guard(&bot, &state, &msg, &mut ctx).await? {
            open_menu(&bot, &state, &msg, &mut ctx).await?;
        }
    } else if ctx.state == State::NotifPersonConfirm {
        person_input(&bot, &state, &msg, &text, &mut ctx).await?;
    } else if ctx.state == State::NotifMessage {
        notif_message_input(&bot, &state, &msg, &text, &mut ctx).await?;
    } else {
        // посторонний текст не участвует в диалоге
        let _ = bot.delete_message(chat_id, msg.id).await;
    }

    state.save_context(chat_id, &ctx).await?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FloodVerdict {
    Pass,
    /// Минута тишины прошла: сброс счётчика и удаление предупреждения.
    PassAfterReset,
    Drop { warn: bool },
}

/// Чистое решение антифлуда над полями контекста.
fn flood_verdict(data: &mut crate::models::ContextData, now: i64) -> FloodVerdict {
    if let Some(last) = data.last_msg_at {
        if now - last >= FLOOD_RESET_SECS {
            data.burst = 0;
            data.muted = false;
            data.last_msg_at = Some(now);
            return FloodVerdict::PassAfterReset;
        }
    }

    if data.burst >= FLOOD_BURST_LIMIT {
        let warn = !data.muted;
        data.muted = true;
        data.last_msg_at = Some(now);
        return FloodVerdict::Drop { warn };
    }

    if let Some(last) = data.last_msg_at {
        if now - last <= FLOOD_BURST_GAP_SECS {
            data.burst += 1;
        }
    }
    data.last_msg_at = Some(now);
    FloodVerdict::Pass
}

/// Антифлуд. `true` — сообщение можно обрабатывать дальше.
/// Вызывается и для кнопки меню, и для /start.
pub(super) async fn flood_guard(
    bot: &Bot,
    state: &BotState,
    msg: &Message,
    ctx: &mut crate::models::ConversationContext,
) -> Result<bool, Box<dyn Error + Send + Sync>> {
    let now = Utc::now().timestamp();

    match flood_verdict(&mut ctx.data, now) {
        FloodVerdict::Pass => Ok(true),
        FloodVerdict::PassAfterReset => {
            ephemeral::delete_for_chat(&state.db, bot, msg.chat.id, &[EphemeralKind::Flood])
                .await?;
            Ok(true)
        }
        FloodVerdict::Drop { warn } => {
            let _ = bot.delete_message(msg.chat.id, msg.id).await;
            if warn {
                let flood_msg = bot.send_message(msg.chat.id, texts::FLOOD_WARNING).await?;
                ephemeral::track(&state.db, msg.chat.id, flood_msg.id, EphemeralKind::Flood)
                    .await?;
                log::warn!("🚧 chat {} muted for flooding", msg.chat.id);
            }
            Ok(false)
        }
    }
}

async fn open_menu(
    bot: &Bot,
    state: &BotState,
    msg: &Message,
    ctx: &mut crate::models::ConversationContext,
) -> HandlerResult {
    let _ = bot.delete_message(msg.chat.id, msg.id).await;
    ephemeral::delete_for_chat(&state.db, bot, msg.chat.id, &[EphemeralKind::InlineMenu]).await?;

    let Some(tg_user) = msg.from.as_ref() else {
        return Ok(());
    };
    let Some(role) = User::role_of(&state.db, tg_user.id.0 as i64).await? else {
        // незарегистрированный чат меню не получает
        return Ok(());
    };

    let (menu_state, text) = match role {
        Role::User => (State::UserGeneral, texts::USER_MENU),
        Role::Listener => (State::ListenerGeneral, texts::LISTENER_MENU),
        Role::Expert => (State::ExpertGeneral, texts::EXPERT_MENU),
        Role::Manager => (State::ManagerGeneral, texts::MANAGER_MENU),
    };

    let menu_msg = bot
        .send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .reply_markup(kb::role_menu(role))
        .await?;
    ephemeral::track(&state.db, msg.chat.id, menu_msg.id, EphemeralKind::InlineMenu).await?;

    ctx.state = menu_state;
    Ok(())
}

/// Поиск адресата по нику или по «Фамилия Имя».
async fn find_person(db: &crate::database::Database, input: &str) -> sqlx::Result<Option<User>> {
    let trimmed = input.trim();
    let Some(first) = trimmed.chars().next() else {
        return Ok(None);
    };

    if first == '@' || first.is_ascii_alphabetic() {
        return User::by_username(db, trimmed.trim_start_matches('@')).await;
    }

    let lowered = first.to_lowercase().next().unwrap_or(first);
    if ('а'..='я').contains(&lowered) || lowered == 'ё' {
        let words: Vec<&str> = trimmed.split_whitespace().collect();
        if let [last_name, first_name] = words[..] {
            return User::by_full_name(db, last_name, first_name).await;
        }
    }

    Ok(None)
}

async fn person_input(
    bot: &Bot,
    state: &BotState,
    msg: &Message,
    text: &str,
    ctx: &mut crate::models::ConversationContext,
) -> HandlerResult {
    let _ = bot.delete_message(msg.chat.id, msg.id).await;

    let Some(manager_msg_id) = ctx.data.manager_msg_id else {
        return Ok(());
    };

    match find_person(&state.db, text).await? {
        Some(person) => {
            bot.edit_message_text(
                msg.chat.id,
                MessageId(manager_msg_id),
                texts::person_found(&person.full_name(), &person.username),
            )
            .parse_mode(ParseMode::Html)
            .reply_markup(kb::person_confirm(person.id))
            .await?;
            ctx.state = State::NotifTypeCheck;
        }
        None => {
            bot.edit_message_text(
                msg.chat.id,
                MessageId(manager_msg_id),
                texts::person_none(text),
            )
            .parse_mode(ParseMode::Html)
            .reply_markup(kb::back())
            .await?;
        }
    }

    Ok(())
}

/// Сводка адресата для экрана подтверждения.
async fn target_summary(
    db: &crate::database::Database,
    target: &NotifTarget,
) -> sqlx::Result<String> {
    Ok(match target {
        NotifTarget::Roles { roles } => texts::roles_summary(roles),
        NotifTarget::Activity { id } => Activity::by_id(db, *id)
            .await?
            .map(|a| a.name)
            .unwrap_or_default(),
        NotifTarget::Consultation { id } => SlotSummary::by_id(db, *id)
            .await?
            .map(|s| s.choice_label())
            .unwrap_or_default(),
        NotifTarget::Event { id } => Event::by_id(db, *id)
            .await?
            .map(|e| e.name)
            .unwrap_or_default(),
        NotifTarget::Person { id } => match crate::models::User::by_id(db, *id).await? {
            Some(u) => format!("{} (@{})", u.full_name(), u.username),
            None => String::new(),
        },
    })
}

async fn notif_message_input(
    bot: &Bot,
    state: &BotState,
    msg: &Message,
    text: &str,
    ctx: &mut crate::models::ConversationContext,
) -> HandlerResult {
    let _ = bot.delete_message(msg.chat.id, msg.id).await;

    let Some(manager_msg_id) = ctx.data.manager_msg_id else {
        return Ok(());
    };

    if text.chars().count() > 4000 {
        bot.edit_message_text(msg.chat.id, MessageId(manager_msg_id), texts::TOO_LONG_MSG)
            .parse_mode(ParseMode::Html)
            .reply_markup(kb::back())
            .await?;
        return Ok(());
    }

    let Some(target) = ctx.data.notif_target.clone() else {
        return Ok(());
    };
    let name = target_summary(&state.db, &target).await?;

    bot.edit_message_text(
        msg.chat.id,
        MessageId(manager_msg_id),
        texts::send_confirm(&name, text),
    )
    .parse_mode(ParseMode::Html)
    .reply_markup(kb::send_confirm())
    .await?;

    ctx.data.notif_text = Some(text.to_string());
    ctx.state = State::NotifSend;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContextData;

    #[test]
    fn slow_messages_never_accumulate_a_burst() {
        let mut data = ContextData::default();
        let mut now = 1_000;

        for _ in 0..20 {
            assert_eq!(flood_verdict(&mut data, now), FloodVerdict::Pass);
            now += 10; // реже раза в 5 секунд
        }
        assert_eq!(data.burst, 0);
        assert!(!data.muted);
    }

    #[test]
    fn fast_burst_mutes_and_warns_exactly_once() {
        let mut data = ContextData::default();
        let mut now = 1_000;

        assert_eq!(flood_verdict(&mut data, now), FloodVerdict::Pass);
        for _ in 0..FLOOD_BURST_LIMIT {
            now += 1;
            assert_eq!(flood_verdict(&mut data, now), FloodVerdict::Pass);
        }

        now += 1;
        assert_eq!(flood_verdict(&mut data, now), FloodVerdict::Drop { warn: true });
        now += 1;
        assert_eq!(flood_verdict(&mut data, now), FloodVerdict::Drop { warn: false });
        assert!(data.muted);
    }

    #[test]
    fn command_and_menu_presses_share_one_burst_counter() {
        // /start и кнопка меню проходят через один и тот же учёт:
        // быстрая смесь того и другого копит общий всплеск
        let mut data = ContextData::default();
        let mut now = 1_000;

        assert_eq!(flood_verdict(&mut data, now), FloodVerdict::Pass);
        for _ in 0..FLOOD_BURST_LIMIT {
            now += 2;
            flood_verdict(&mut data, now);
        }
        now += 2;
        assert!(matches!(flood_verdict(&mut data, now), FloodVerdict::Drop { .. }));
    }

    #[test]
    fn a_minute_of_silence_unmutes() {
        let mut data = ContextData::default();
        data.burst = FLOOD_BURST_LIMIT;
        data.muted = true;
        data.last_msg_at = Some(1_000);

        assert_eq!(
            flood_verdict(&mut data, 1_000 + FLOOD_RESET_SECS),
            FloodVerdict::PassAfterReset
        );
        assert_eq!(data.burst, 0);
        assert!(!data.muted);
    }
}
