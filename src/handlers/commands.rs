use std::error::Error;

use teloxide::prelude::*;
use teloxide::types::ParseMode;

use crate::bot_state::BotState;
use crate::models::{ephemeral, EphemeralKind, State, User};
use crate::Command;

use super::keyboards as kb;
use super::texts;

pub async fn command_handler(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: BotState,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    match cmd {
        Command::Start => handle_start(bot, msg, state).await?,
        Command::Help => handle_help(bot, msg).await?,
    }
    Ok(())
}

async fn handle_start(
    bot: Bot,
    msg: Message,
    state: BotState,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let chat_id = msg.chat.id;
    let Some(tg_user) = msg.from.as_ref() else {
        return Ok(());
    };
    let tg_id = tg_user.id.0 as i64;

    let _guard = state.lock_chat(chat_id).await;
    let mut ctx = state.load_context(chat_id).await;

    if !super::messages::flood_guard(&bot, &state, &msg, &mut ctx).await? {
        state.save_context(chat_id, &ctx).await?;
        return Ok(());
    }

    if User::is_registered(&state.db, tg_id).await? {
        ephemeral::delete_for_chat(
            &state.db,
            &bot,
            chat_id,
            &[EphemeralKind::ReplyMenu, EphemeralKind::InlineMenu],
        )
        .await?;

        let menu_msg = bot
            .send_message(chat_id, texts::START)
            .parse_mode(ParseMode::Html)
            .reply_markup(kb::reply_menu())
            .await?;
        let _ = bot.delete_message(chat_id, msg.id).await;
        ephemeral::track(&state.db, chat_id, menu_msg.id, EphemeralKind::ReplyMenu).await?;

        ctx.state = State::Main;
    } else {
        // старое приглашение убирается, чтобы в чате жило одно
        if let Some(reg_msg_id) = ctx.data.reg_msg_id {
            let _ = bot
                .delete_message(chat_id, teloxide::types::MessageId(reg_msg_id))
                .await;
        }

        let reg_msg = bot
            .send_message(chat_id, texts::NEW_USER)
            .parse_mode(ParseMode::Html)
            .reply_markup(kb::start_reg())
            .await?;
        let _ = bot.delete_message(chat_id, msg.id).await;

        ctx.data.reg_msg_id = Some(reg_msg.id.0);
        ctx.state = State::RegistrationStart;
    }

    state.save_context(chat_id, &ctx).await?;
    Ok(())
}

async fn handle_help(bot: Bot, msg: Message) -> Result<(), Box<dyn Error + Send + Sync>> {
    bot.send_message(
        msg.chat.id,
        "Нажмите /start, затем используйте кнопку <b>«Меню 📋»</b> внизу экрана.",
    )
    .parse_mode(ParseMode::Html)
    .await?;
    Ok(())
}
