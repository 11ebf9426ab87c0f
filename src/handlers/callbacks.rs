use std::error::Error;

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardMarkup, MessageId, ParseMode};

use crate::booking::{self, BookOutcome, CancelOutcome, Choice};
use crate::bot_state::BotState;
use crate::clock::{local_day_bounds, now_local};
use crate::models::activity::Activity;
use crate::models::consultation::SlotSummary;
use crate::models::event::{self, Event};
use crate::models::context::FeedbackDraft;
use crate::models::logistics::{LivingInfo, TransferInfo};
use crate::models::{
    ConversationContext, EphemeralKind, NotifTarget, Role, Selection, State, User,
};
use crate::notify::dispatcher::{run_campaign, CampaignButton, TelegramTransport, MANAGER_PACE};
use crate::notify::Selector;

use super::keyboards as kb;
use super::router::{dispatch, resolve_back, Op};
use super::texts;

pub type HandlerResult = Result<(), Box<dyn Error + Send + Sync>>;

/// Окружение одного колбэка. Обработчики читают payload только когда
/// пришли из «своего» состояния; при повторном входе через «назад»
/// payload пуст и данные берутся из контекста.
struct Cx<'a> {
    bot: &'a Bot,
    state: &'a BotState,
    q: &'a CallbackQuery,
    chat_id: ChatId,
    message_id: MessageId,
    ctx: &'a mut ConversationContext,
    payload: Option<&'a str>,
    answered: bool,
}

impl Cx<'_> {
    fn tg_id(&self) -> i64 {
        self.q.from.id.0 as i64
    }

    async fn edit(&self, text: &str) -> Result<(), teloxide::RequestError> {
        self.bot
            .edit_message_text(self.chat_id, self.message_id, text)
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(())
    }

    async fn edit_kb(
        &self,
        text: &str,
        markup: InlineKeyboardMarkup,
    ) -> Result<(), teloxide::RequestError> {
        self.bot
            .edit_message_text(self.chat_id, self.message_id, text)
            .parse_mode(ParseMode::Html)
            .reply_markup(markup)
            .await?;
        Ok(())
    }

    async fn alert(&mut self, text: &str) -> HandlerResult {
        self.bot
            .answer_callback_query(self.q.id.clone())
            .text(text)
            .show_alert(true)
            .await?;
        self.answered = true;
        Ok(())
    }

    /// Числовой хвост payload'а: "interval_5" -> 5, "notif_event:7" -> 7.
    fn payload_id(&self) -> Option<i64> {
        let data = self.payload?;
        let tail = data.rsplit(['_', ':']).next()?;
        tail.parse().ok()
    }
}

pub async fn callback_handler(bot: Bot, q: CallbackQuery, state: BotState) -> HandlerResult {
    let Some(data) = q.data.clone() else {
        return Ok(());
    };
    let Some(message) = q.message.as_ref() else {
        return Ok(());
    };
    let chat_id = message.chat().id;
    let message_id = message.id();

    let _guard = state.lock_chat(chat_id).await;
    let mut ctx = state.load_context(chat_id).await;

    let Some(op) = dispatch(&data, &ctx.state) else {
        // устаревшая кнопка: гасим спиннер и выходим
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };

    let answered;
    {
        let mut cx = Cx {
            bot: &bot,
            state: &state,
            q: &q,
            chat_id,
            message_id,
            ctx: &mut ctx,
            payload: Some(data.as_str()),
            answered: false,
        };

        let op = if op == Op::Back {
            cx.payload = None;
            let shape = cx.ctx.data.notif_target.as_ref().map(|t| t.shape());
            match resolve_back(&cx.ctx.state, cx.ctx.data.selection, shape) {
                Some(target) => target,
                None => {
                    log::error!(
                        "back has no target from state {:?} (selection {:?})",
                        cx.ctx.state,
                        cx.ctx.data.selection
                    );
                    cx.alert(texts::BACK_UNAVAILABLE).await?;
                    return Ok(());
                }
            }
        } else {
            op
        };

        run_op(op, &mut cx).await?;
        answered = cx.answered;
    }

    state.save_context(chat_id, &ctx).await?;

    if !answered {
        bot.answer_callback_query(q.id.clone()).await?;
    }

    Ok(())
}

async fn run_op(op: Op, cx: &mut Cx<'_>) -> HandlerResult {
    match op {
        Op::Back => Ok(()), // разрешается до вызова
        Op::RegStart => reg_start(cx).await,
        Op::RegSend => reg_send(cx).await,
        Op::TransferMenu => transfer_menu(cx).await,
        Op::TransferInfo => transfer_info(cx).await,
        Op::LivingInfo => living_info(cx).await,
        Op::SupportLinks => support_links(cx).await,
        Op::Contacts => contacts(cx).await,
        Op::FeedbackStart => feedback_start(cx).await,
        Op::FeedbackStep => feedback_step(cx).await,
        Op::Register => register(cx).await,
        Op::RegisterTypes => register_types(cx).await,
        Op::ExpertChoose => expert_choose(cx).await,
        Op::DateChoose => date_choose(cx).await,
        Op::RegisterConfirm => register_confirm(cx).await,
        Op::RegisterEnd => register_end(cx).await,
        Op::Deregister => deregister(cx).await,
        Op::DeregisterTypes => deregister_types(cx).await,
        Op::DeregisterConfirm => deregister_confirm(cx).await,
        Op::DeregisterEnd => deregister_end(cx).await,
        Op::Diary => diary(cx).await,
        Op::ExpertConsultations => expert_consultations(cx).await,
        Op::NotifStart => notif_start(cx).await,
        Op::NotifRecipient => notif_recipient(cx).await,
        Op::NotifRolesMark => notif_roles_mark(cx).await,
        Op::NotifTypeCheck => notif_type_check(cx).await,
        Op::NotifSend => notif_send(cx).await,
    }
}

// Регистрация

async fn reg_start(cx: &mut Cx<'_>) -> HandlerResult {
    cx.edit_kb(texts::AGREEMENT, kb::send_reg()).await?;
    cx.ctx.state = State::RegistrationConfirm;
    Ok(())
}

async fn reg_send(cx: &mut Cx<'_>) -> HandlerResult {
    let Some(username) = cx.q.from.username.clone() else {
        return cx.alert(texts::FAILED_REG).await;
    };

    if User::register(&cx.state.db, cx.tg_id(), &username).await? {
        cx.alert(texts::SUCCESS_REG).await?;
        let _ = cx.bot.delete_message(cx.chat_id, cx.message_id).await;
        let menu_msg = cx
            .bot
            .send_message(cx.chat_id, texts::START)
            .parse_mode(ParseMode::Html)
            .reply_markup(kb::reply_menu())
            .await?;
        crate::models::ephemeral::track(
            &cx.state.db,
            cx.chat_id,
            menu_msg.id,
            EphemeralKind::ReplyMenu,
        )
        .await?;
        cx.ctx.state = State::Main;
    } else if cx.edit_kb(texts::FAILED_REG, kb::try_again_reg()).await.is_err() {
        // текст не изменился: повторный отказ
        cx.alert(texts::STILL_FAILED_REG).await?;
    }

    Ok(())
}

// Общее меню

async fn transfer_menu(cx: &mut Cx<'_>) -> HandlerResult {
    cx.edit_kb(texts::TRANSFER_CHOOSE, kb::transfer_choose()).await?;
    cx.ctx.state = State::TransferChoose;
    Ok(())
}

async fn transfer_info(cx: &mut Cx<'_>) -> HandlerResult {
    let Some(direction) = cx.payload.and_then(|d| d.strip_prefix("transfer_")) else {
        return Ok(());
    };

    let Some((info, companions)) = TransferInfo::for_user(&cx.state.db, cx.tg_id(), direction).await?
    else {
        return cx.alert(texts::TRANSFER_NONE).await;
    };

    let departs = info
        .departs_at
        .with_timezone(&crate::clock::event_offset())
        .format("%d.%m %H:%M")
        .to_string();
    let mut text = texts::transfer_info(&departs, &info.place, &info.car_num, &info.driver_num);
    if !companions.is_empty() {
        text.push_str(&texts::transfer_companions(&companions));
    }

    cx.edit_kb(&text, kb::back()).await?;
    cx.ctx.state = State::TransferInfo;
    Ok(())
}

async fn living_info(cx: &mut Cx<'_>) -> HandlerResult {
    let Some(info) = LivingInfo::for_user(&cx.state.db, cx.tg_id()).await? else {
        return cx.alert(texts::LIVING_NONE).await;
    };

    cx.edit(&texts::living_info(&info.room, &info.build)).await?;
    cx.ctx.state = State::LivingInfo;
    Ok(())
}

async fn support_links(cx: &mut Cx<'_>) -> HandlerResult {
    let Some(user) = User::by_tg_id(&cx.state.db, cx.tg_id()).await? else {
        return cx.alert(texts::SUPPORT_LINKS_NONE).await;
    };
    if user.role().is_none() {
        return cx.alert(texts::SUPPORT_LINKS_NONE).await;
    }

    cx.edit_kb(texts::SUPPORT_LINKS, kb::support_links(&user)).await?;
    cx.ctx.state = State::SupportLinks;
    Ok(())
}

async fn contacts(cx: &mut Cx<'_>) -> HandlerResult {
    cx.edit(texts::CONTACTS_INFO).await?;
    cx.ctx.state = State::ContactsInfo;
    Ok(())
}

// Анкета оценки мероприятия

async fn feedback_start(cx: &mut Cx<'_>) -> HandlerResult {
    let Some(event_id) = cx.payload_id() else {
        return Ok(());
    };

    cx.ctx
        .data
        .feedback
        .insert(event_id, FeedbackDraft { step: 1, grades: Vec::new() });

    cx.edit_kb(texts::feedback_question(1), kb::feedback_grades(event_id, 1))
        .await?;
    Ok(())
}

async fn feedback_step(cx: &mut Cx<'_>) -> HandlerResult {
    // feedbackbutton_{event}:{step}:{grade}
    let Some(parts) = cx.payload.and_then(|d| d.strip_prefix("feedbackbutton_")) else {
        return Ok(());
    };
    let mut split = parts.split(':');
    let (Some(event_id), Some(step), Some(grade)) = (
        split.next().and_then(|s| s.parse::<i64>().ok()),
        split.next().and_then(|s| s.parse::<u8>().ok()),
        split.next().and_then(|s| s.parse::<u8>().ok()),
    ) else {
        return Ok(());
    };

    let Some(draft) = cx.ctx.data.feedback.get_mut(&event_id) else {
        return Ok(());
    };
    if draft.step != step {
        // двойное нажатие по устаревшей клавиатуре
        return Ok(());
    }

    draft.grades.push(grade);
    draft.step += 1;

    if step < 4 {
        cx.edit_kb(
            texts::feedback_question(step + 1),
            kb::feedback_grades(event_id, step + 1),
        )
        .await?;
        return Ok(());
    }

    let draft = cx.ctx.data.feedback.remove(&event_id).unwrap_or_default();
    if !event::store_feedback(&cx.state.db, cx.tg_id(), event_id, &draft).await? {
        log::warn!("feedback for event {} from chat {} not stored", event_id, cx.chat_id);
    }
    cx.edit(texts::FEEDBACK_FINAL).await?;
    Ok(())
}

// Мастер записи

async fn register(cx: &mut Cx<'_>) -> HandlerResult {
    cx.ctx.data.clear_booking();
    cx.edit_kb(texts::REGISTER, kb::register_types()).await?;
    cx.ctx.state = State::Register;
    Ok(())
}

fn picked_selection(cx: &Cx<'_>, origin: State) -> Option<Selection> {
    if cx.ctx.state == origin {
        cx.payload.and_then(Selection::parse)
    } else {
        cx.ctx.data.selection
    }
}

async fn register_types(cx: &mut Cx<'_>) -> HandlerResult {
    let Some(selection) = picked_selection(cx, State::Register) else {
        return cx.alert(texts::REGISTER_ERROR).await;
    };
    let is_group = selection.is_group();

    let intervals =
        booking::eligible_intervals(&cx.state.db, cx.tg_id(), is_group, now_local()).await?;
    if intervals.is_empty() {
        return cx.alert(texts::REGISTER_UNAVAILABLE).await;
    }

    let mut text = texts::INTERVALS.to_string();
    if is_group {
        text.push_str(texts::INTERVALS_GROUP_SUFFIX);
    }

    cx.edit_kb(&text, kb::choices(&intervals, "interval_")).await?;
    cx.ctx.data.selection = Some(selection);
    cx.ctx.state = State::RegisterInterval;
    Ok(())
}

async fn expert_choose(cx: &mut Cx<'_>) -> HandlerResult {
    let interval_id = if cx.ctx.state == State::RegisterInterval {
        cx.payload_id()
    } else {
        cx.ctx.data.interval_id
    };
    let (Some(interval_id), Some(selection)) = (interval_id, cx.ctx.data.selection) else {
        return cx.alert(texts::REGISTER_ERROR).await;
    };
    let is_group = selection.is_group();

    let experts = booking::eligible_experts(&cx.state.db, cx.tg_id(), interval_id, is_group).await?;
    if experts.is_empty() {
        return cx.alert(texts::EXPERTS_NONE).await;
    }

    // для групповых вариант выбора — сам слот, для личных — эксперт
    let (next_state, prefix) = if is_group {
        (State::RegisterConfirm, "consultation_")
    } else {
        (State::RegisterPersonalDate, "expert_")
    };

    cx.edit_kb(texts::experts(is_group), kb::choices(&experts, prefix)).await?;
    cx.ctx.data.interval_id = Some(interval_id);
    cx.ctx.state = next_state;
    Ok(())
}

async fn date_choose(cx: &mut Cx<'_>) -> HandlerResult {
    let expert_id = if cx.ctx.state == State::RegisterPersonalDate {
        cx.payload_id()
    } else {
        cx.ctx.data.expert_id
    };
    let (Some(expert_id), Some(interval_id)) = (expert_id, cx.ctx.data.interval_id) else {
        return cx.alert(texts::REGISTER_ERROR).await;
    };

    let times = booking::eligible_times(&cx.state.db, cx.tg_id(), interval_id, expert_id).await?;
    if times.is_empty() {
        return cx.alert(texts::DATES_NONE).await;
    }

    cx.edit_kb(texts::DATES_CHOOSE, kb::choices(&times, "consultation_")).await?;
    cx.ctx.data.expert_id = Some(expert_id);
    cx.ctx.state = State::RegisterConfirm;
    Ok(())
}

async fn register_confirm(cx: &mut Cx<'_>) -> HandlerResult {
    let slot_id = if cx.ctx.state == State::RegisterConfirm {
        cx.payload_id()
    } else {
        cx.ctx.data.slot_id
    };
    let Some(slot_id) = slot_id else {
        return cx.alert(texts::REGISTER_ERROR).await;
    };
    let Some(summary) = SlotSummary::by_id(&cx.state.db, slot_id).await? else {
        return cx.alert(texts::REGISTER_ERROR).await;
    };

    let text = format!("{} <b>{}</b>?", texts::REGISTER_CONFIRM, summary.confirm_label());
    cx.edit_kb(&text, kb::register_confirm()).await?;
    cx.ctx.data.slot_id = Some(slot_id);
    cx.ctx.state = State::RegisterFinal;
    Ok(())
}

async fn register_end(cx: &mut Cx<'_>) -> HandlerResult {
    let Some(slot_id) = cx.ctx.data.slot_id else {
        return cx.alert(texts::REGISTER_ERROR).await;
    };

    let outcome = booking::book(&cx.state.db, cx.tg_id(), slot_id).await?;

    cx.ctx.data.clear_booking();
    cx.ctx.state = State::UserGeneral;
    cx.edit_kb(texts::USER_MENU, kb::role_menu(Role::User)).await?;

    match outcome {
        BookOutcome::Booked => cx.alert(texts::REGISTER_END).await,
        BookOutcome::Full => cx.alert(texts::REGISTER_FULL).await,
        BookOutcome::NotRegistered => cx.alert(texts::REGISTER_ERROR).await,
    }
}

async fn deregister(cx: &mut Cx<'_>) -> HandlerResult {
    cx.ctx.data.clear_booking();
    cx.edit_kb(texts::DEREGISTER, kb::deregister_types()).await?;
    cx.ctx.state = State::Deregister;
    Ok(())
}

async fn deregister_types(cx: &mut Cx<'_>) -> HandlerResult {
    let Some(selection) = picked_selection(cx, State::Deregister) else {
        return cx.alert(texts::DEREGISTER_ERROR).await;
    };
    let is_group = selection.is_group();

    let records = booking::cancellable(&cx.state.db, cx.tg_id(), is_group, now_local()).await?;
    if records.is_empty() {
        return cx.alert(&texts::deregister_unavailable(is_group)).await;
    }

    cx.edit_kb(texts::DEREGISTER_CHOOSE, kb::cancellable_records(&records)).await?;
    cx.ctx.data.selection = Some(selection);
    cx.ctx.state = State::DeregisterConfirm;
    Ok(())
}

async fn deregister_confirm(cx: &mut Cx<'_>) -> HandlerResult {
    let slot_id = if cx.ctx.state == State::DeregisterConfirm {
        cx.payload_id()
    } else {
        cx.ctx.data.slot_id
    };
    let Some(slot_id) = slot_id else {
        return cx.alert(texts::DEREGISTER_ERROR).await;
    };
    let Some(summary) = SlotSummary::by_id(&cx.state.db, slot_id).await? else {
        return cx.alert(texts::DEREGISTER_ERROR).await;
    };

    let text = format!("{} <b>{}</b>?", texts::DEREGISTER_CONFIRM, summary.confirm_label());
    cx.edit_kb(&text, kb::register_confirm()).await?;
    cx.ctx.data.slot_id = Some(slot_id);
    cx.ctx.state = State::DeregisterFinal;
    Ok(())
}

async fn deregister_end(cx: &mut Cx<'_>) -> HandlerResult {
    let Some(slot_id) = cx.ctx.data.slot_id else {
        return cx.alert(texts::DEREGISTER_ERROR).await;
    };

    let outcome = booking::cancel(&cx.state.db, cx.tg_id(), slot_id, now_local()).await?;

    cx.ctx.data.clear_booking();
    cx.ctx.state = State::UserGeneral;
    cx.edit_kb(texts::USER_MENU, kb::role_menu(Role::User)).await?;

    match outcome {
        CancelOutcome::Cancelled => cx.alert(texts::DEREGISTER_END).await,
        CancelOutcome::WindowClosed => cx.alert(texts::DEREGISTER_WINDOW_CLOSED).await,
        CancelOutcome::NotFound => cx.alert(texts::DEREGISTER_ERROR).await,
    }
}

async fn diary(cx: &mut Cx<'_>) -> HandlerResult {
    let diary = booking::diary(&cx.state.db, cx.tg_id(), now_local()).await?;
    if diary.group.is_empty() && diary.personal.is_empty() {
        return cx.alert(texts::DIARY_NONE).await;
    }

    cx.edit(&texts::diary(&diary)).await?;
    cx.ctx.state = State::Diary;
    Ok(())
}

// Эксперт

async fn expert_consultations(cx: &mut Cx<'_>) -> HandlerResult {
    let agenda = booking::expert_agenda(&cx.state.db, cx.tg_id()).await?;
    if agenda.is_empty() {
        return cx.alert(texts::CONSULTATIONS_NONE).await;
    }

    cx.edit(&texts::consultations(&agenda)).await?;
    cx.ctx.state = State::ExpertConsultations;
    Ok(())
}

// Менеджер: мастер рассылки

async fn notif_start(cx: &mut Cx<'_>) -> HandlerResult {
    cx.ctx.data.clear_notif();
    cx.edit_kb(texts::NOTIF_TYPE, kb::notif_types()).await?;
    cx.ctx.state = State::NotifRecipient;
    Ok(())
}

async fn notif_recipient(cx: &mut Cx<'_>) -> HandlerResult {
    let selection = if cx.ctx.state == State::NotifRecipient {
        cx.payload
            .and_then(|d| d.strip_prefix("choose_"))
            .and_then(Selection::parse)
    } else {
        cx.ctx.data.selection
    };
    let Some(selection) = selection else {
        return cx.alert(texts::CHOICES_NONE).await;
    };

    match selection {
        Selection::Person => {
            cx.edit_kb(texts::CHOOSE_PERSON, kb::back()).await?;
            cx.ctx.data.selection = Some(selection);
            cx.ctx.data.manager_msg_id = Some(cx.message_id.0);
            cx.ctx.state = State::NotifPersonConfirm;
            return Ok(());
        }
        Selection::Roles => {
            cx.edit_kb(
                texts::notif_recipient(selection),
                kb::roles_marks(&cx.ctx.data.selected_roles),
            )
            .await?;
            cx.ctx.data.selection = Some(selection);
            cx.ctx.state = State::NotifTypeCheck;
            return Ok(());
        }
        _ => {}
    }

    let choices: Vec<Choice> = match selection {
        Selection::Feedback => {
            let (from, to) = local_day_bounds(now_local().date_naive());
            Event::pending_between(&cx.state.db, from, to)
                .await?
                .into_iter()
                .map(|e| Choice { id: e.id, label: e.name })
                .collect()
        }
        Selection::Activity => Activity::distinct_choices(&cx.state.db)
            .await?
            .into_iter()
            .map(|a| Choice { id: a.id, label: a.name })
            .collect(),
        Selection::Consultation => SlotSummary::all_active(&cx.state.db)
            .await?
            .into_iter()
            .map(|s| Choice { id: s.id, label: s.choice_label() })
            .collect(),
        _ => Vec::new(),
    };

    if choices.is_empty() {
        return cx.alert(texts::CHOICES_NONE).await;
    }

    let prefix = match selection {
        Selection::Feedback => "notif_feedback:",
        Selection::Activity => "notif_activity:",
        _ => "notif_consultation:",
    };

    cx.edit_kb(texts::notif_recipient(selection), kb::choices(&choices, prefix))
        .await?;
    cx.ctx.data.selection = Some(selection);
    cx.ctx.state = State::NotifTypeCheck;
    Ok(())
}

async fn notif_roles_mark(cx: &mut Cx<'_>) -> HandlerResult {
    let Some(action) = cx.payload.and_then(|d| d.strip_prefix("notif_roles:")) else {
        return Ok(());
    };

    if action != "continue" {
        let Some(role) = Role::parse(action) else {
            return Ok(());
        };
        cx.ctx.data.toggle_role(role);
        cx.edit_kb(
            texts::notif_recipient(Selection::Roles),
            kb::roles_marks(&cx.ctx.data.selected_roles),
        )
        .await?;
        return Ok(());
    }

    if cx.ctx.data.selected_roles.is_empty() {
        return cx.alert(texts::ROLES_NONE).await;
    }

    cx.ctx.data.notif_target = Some(NotifTarget::Roles {
        roles: cx.ctx.data.selected_roles.clone(),
    });
    cx.edit(texts::WRITE_MSG).await?;
    cx.ctx.data.manager_msg_id = Some(cx.message_id.0);
    cx.ctx.state = State::NotifMessage;
    Ok(())
}

fn parse_target(data: &str) -> Option<NotifTarget> {
    let tail = data.strip_prefix("notif_")?;
    let (kind, id) = tail.split_once(':')?;
    let id: i64 = id.parse().ok()?;
    match kind {
        "person" => Some(NotifTarget::Person { id }),
        "feedback" => Some(NotifTarget::Event { id }),
        "activity" => Some(NotifTarget::Activity { id }),
        "consultation" => Some(NotifTarget::Consultation { id }),
        _ => None,
    }
}

async fn notif_type_check(cx: &mut Cx<'_>) -> HandlerResult {
    let target = if cx.ctx.state == State::NotifTypeCheck && cx.payload.is_some() {
        cx.payload.and_then(parse_target)
    } else {
        cx.ctx.data.notif_target.clone()
    };
    let Some(target) = target else {
        return cx.alert(texts::CHOICES_NONE).await;
    };

    if let NotifTarget::Event { id } = target {
        let Some(event) = Event::by_id(&cx.state.db, id).await? else {
            return cx.alert(texts::CHOICES_NONE).await;
        };
        cx.edit_kb(&texts::feedback_confirm(&event.name), kb::send_confirm()).await?;
        cx.ctx.data.notif_target = Some(target);
        cx.ctx.state = State::NotifSend;
        return Ok(());
    }

    cx.edit(texts::WRITE_MSG).await?;
    cx.ctx.data.notif_target = Some(target);
    cx.ctx.data.manager_msg_id = Some(cx.message_id.0);
    cx.ctx.state = State::NotifMessage;
    Ok(())
}

async fn notif_send(cx: &mut Cx<'_>) -> HandlerResult {
    let Some(target) = cx.ctx.data.notif_target.clone() else {
        return cx.alert(texts::CHOICES_NONE).await;
    };

    let (selector, text, button, kind) = match target {
        NotifTarget::Event { id } => {
            let Some(event) = Event::by_id(&cx.state.db, id).await? else {
                return cx.alert(texts::CHOICES_NONE).await;
            };
            (
                Selector::Event(id),
                texts::feedback_message(&event.name),
                Some(CampaignButton {
                    label: "Оценить".to_string(),
                    callback: format!("feedbackstart_{}", id),
                }),
                EphemeralKind::Feedback,
            )
        }
        other => {
            let Some(text) = cx.ctx.data.notif_text.clone() else {
                return cx.alert(texts::CHOICES_NONE).await;
            };
            let (selector, kind) = match other {
                NotifTarget::Roles { roles } => (Selector::Roles(roles), EphemeralKind::Notif),
                NotifTarget::Activity { id } => (Selector::Activity(id), EphemeralKind::Activity),
                NotifTarget::Consultation { id } => {
                    (Selector::Consultation(id), EphemeralKind::Consultation)
                }
                NotifTarget::Person { id } => (Selector::Person(id), EphemeralKind::Notif),
                NotifTarget::Event { .. } => unreachable!("handled above"),
            };
            (selector, text, None, kind)
        }
    };

    cx.edit(texts::SENDING_IN_PROCESS).await?;

    let transport = TelegramTransport { bot: cx.bot.clone() };
    let report = run_campaign(
        &cx.state.db,
        &transport,
        &selector,
        &text,
        button.as_ref(),
        kind,
        MANAGER_PACE,
    )
    .await?;

    cx.ctx.data.clear_notif();
    cx.ctx.state = State::ManagerGeneral;
    cx.edit_kb(texts::MANAGER_MENU, kb::role_menu(Role::Manager)).await?;
    cx.alert(&texts::sending_success(report.delivered)).await
}
