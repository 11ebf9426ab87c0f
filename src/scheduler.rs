//! Плановые задания: напоминания и чистка отправленных сообщений.
//! Тикаем дважды в минуту и сверяем местное время с расписанием;
//! сработавшая минута запоминается, чтобы не выстрелить дважды.

use chrono::{Duration as ChronoDuration, Timelike};
use teloxide::prelude::*;
use tokio::time;

use crate::bot_state::BotState;
use crate::clock::{event_offset, local_day_bounds, now_local};
use crate::handlers::texts;
use crate::models::activity::Activity;
use crate::models::consultation::SlotSummary;
use crate::models::logistics::{LivingReminder, Schedule, TransferReminder};
use crate::models::{
    ephemeral, set_notif_status, DeliveryStatus, EphemeralKind, StatusTable,
};
use crate::notify::dispatcher::{run_campaign, TelegramTransport, Transport, REMINDER_PACE};
use crate::notify::Selector;

pub async fn scheduler_task(bot: Bot, state: BotState) {
    let mut interval = time::interval(time::Duration::from_secs(30));
    let mut last_fired: Option<String> = None;

    loop {
        interval.tick().await;

        let now = now_local();
        let minute_key = now.format("%Y-%m-%d %H:%M").to_string();
        if last_fired.as_deref() == Some(&minute_key) {
            continue;
        }

        let job = match (now.hour(), now.minute()) {
            (8, 0) => Some(Job::ScheduleDigest),
            (16, 0) => Some(Job::ConsultationReminders),
            (17, 0) => Some(Job::SweepAgedActivity),
            (19, 0) => Some(Job::SweepConsultation),
            (20, 5) => Some(Job::TransferReminders),
            (20, 10) => Some(Job::LivingReminders),
            (21, 0) => Some(Job::ActivityReminders),
            (23, 55) => Some(Job::SweepAgedLogistics),
            (23, 59) => Some(Job::SweepDaily),
            _ => None,
        };

        let Some(job) = job else {
            continue;
        };
        last_fired = Some(minute_key);

        log::info!("⏰ scheduler job {:?} fired", job);
        if let Err(e) = run_job(job, &bot, &state).await {
            log::error!("scheduler job {:?} failed: {}", job, e);
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Job {
    TransferReminders,
    LivingReminders,
    ActivityReminders,
    ScheduleDigest,
    ConsultationReminders,
    SweepAgedLogistics,
    SweepAgedActivity,
    SweepConsultation,
    SweepDaily,
}

async fn run_job(job: Job, bot: &Bot, state: &BotState) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    match job {
        Job::TransferReminders => transfer_reminders(bot, state).await?,
        Job::LivingReminders => living_reminders(bot, state).await?,
        Job::ActivityReminders => activity_reminders(bot, state).await?,
        Job::ScheduleDigest => schedule_digest(bot, state).await?,
        Job::ConsultationReminders => consultation_reminders(bot, state).await?,
        Job::SweepAgedLogistics => {
            let cutoff = local_day_bounds(now_local().date_naive()).0;
            let n = ephemeral::sweep(
                &state.db,
                bot,
                &[EphemeralKind::Transfer, EphemeralKind::Living],
                Some(cutoff),
            )
            .await?;
            log::info!("🧹 swept {} aged logistics messages", n);
        }
        Job::SweepAgedActivity => {
            let cutoff = local_day_bounds(now_local().date_naive()).0;
            let n = ephemeral::sweep(&state.db, bot, &[EphemeralKind::Activity], Some(cutoff)).await?;
            log::info!("🧹 swept {} aged activity messages", n);
        }
        Job::SweepConsultation => {
            let n = ephemeral::sweep(&state.db, bot, &[EphemeralKind::Consultation], None).await?;
            log::info!("🧹 swept {} consultation messages", n);
        }
        Job::SweepDaily => {
            let n = ephemeral::sweep(
                &state.db,
                bot,
                &[
                    EphemeralKind::InlineMenu,
                    EphemeralKind::Notif,
                    EphemeralKind::Feedback,
                    EphemeralKind::General,
                    EphemeralKind::Schedule,
                ],
                None,
            )
            .await?;
            log::info!("🧹 swept {} daily messages", n);
        }
    }
    Ok(())
}

/// Вечером — о завтрашних трансферах. Статус пишется на каждую строку.
async fn transfer_reminders(bot: &Bot, state: &BotState) -> sqlx::Result<()> {
    let tomorrow = now_local().date_naive() + ChronoDuration::days(1);
    let (from, to) = local_day_bounds(tomorrow);
    let transfers = TransferReminder::departing_between(&state.db, from, to).await?;
    let transport = TelegramTransport { bot: bot.clone() };

    for transfer in transfers {
        let Some(tg_id) = transfer.tg_id else {
            set_notif_status(&state.db, StatusTable::Transfers, transfer.id, DeliveryStatus::Failed)
                .await?;
            continue;
        };

        let departs = transfer
            .departs_at
            .with_timezone(&event_offset())
            .format("%H:%M")
            .to_string();
        let text = texts::transfer_notif(&departs, &transfer.place, &transfer.car_num, &transfer.driver_num);

        match transport.deliver(tg_id, &text, None).await {
            Ok(message_id) => {
                ephemeral::track(
                    &state.db,
                    ChatId(tg_id),
                    teloxide::types::MessageId(message_id),
                    EphemeralKind::Transfer,
                )
                .await?;
                set_notif_status(&state.db, StatusTable::Transfers, transfer.id, DeliveryStatus::Sent)
                    .await?;
            }
            Err(e) => {
                log::warn!("transfer reminder {} failed: {}", transfer.id, e);
                set_notif_status(&state.db, StatusTable::Transfers, transfer.id, DeliveryStatus::Failed)
                    .await?;
            }
        }
        time::sleep(REMINDER_PACE).await;
    }

    Ok(())
}

async fn living_reminders(bot: &Bot, state: &BotState) -> sqlx::Result<()> {
    let tomorrow = now_local().date_naive() + ChronoDuration::days(1);
    let livings = LivingReminder::for_date(&state.db, tomorrow).await?;
    let transport = TelegramTransport { bot: bot.clone() };

    for living in livings {
        let Some(tg_id) = living.tg_id else {
            set_notif_status(&state.db, StatusTable::Livings, living.id, DeliveryStatus::Failed)
                .await?;
            continue;
        };

        let text = texts::living_notif(&living.room, &living.build);
        match transport.deliver(tg_id, &text, None).await {
            Ok(message_id) => {
                ephemeral::track(
                    &state.db,
                    ChatId(tg_id),
                    teloxide::types::MessageId(message_id),
                    EphemeralKind::Living,
                )
                .await?;
                set_notif_status(&state.db, StatusTable::Livings, living.id, DeliveryStatus::Sent)
                    .await?;
            }
            Err(e) => {
                log::warn!("living reminder {} failed: {}", living.id, e);
                set_notif_status(&state.db, StatusTable::Livings, living.id, DeliveryStatus::Failed)
                    .await?;
            }
        }
        time::sleep(REMINDER_PACE).await;
    }

    Ok(())
}

/// Накануне — участникам завтрашних активностей, статус агрегатный.
async fn activity_reminders(bot: &Bot, state: &BotState) -> sqlx::Result<()> {
    let tomorrow = now_local().date_naive() + ChronoDuration::days(1);
    let (from, to) = local_day_bounds(tomorrow);
    let activities = Activity::starting_between(&state.db, from, to).await?;
    let transport = TelegramTransport { bot: bot.clone() };

    for activity in activities {
        run_campaign(
            &state.db,
            &transport,
            &Selector::Activity(activity.id),
            &activity.template,
            None,
            EphemeralKind::Activity,
            REMINDER_PACE,
        )
        .await?;
    }

    Ok(())
}

/// Утренний дайджест расписания всем, кроме организаторов.
async fn schedule_digest(bot: &Bot, state: &BotState) -> sqlx::Result<()> {
    let today = now_local().date_naive();
    let schedules = Schedule::for_date(&state.db, today).await?;
    let transport = TelegramTransport { bot: bot.clone() };

    for schedule in schedules {
        let report = run_campaign(
            &state.db,
            &transport,
            &Selector::AllNonManagers,
            &schedule.template,
            None,
            EphemeralKind::Schedule,
            REMINDER_PACE,
        )
        .await?;

        let status = if report.all_delivered() {
            DeliveryStatus::Sent
        } else {
            DeliveryStatus::Failed
        };
        set_notif_status(&state.db, StatusTable::Schedules, schedule.id, status).await?;
    }

    Ok(())
}

/// Днём — о сегодняшних консультациях, по записавшимся на каждый слот.
async fn consultation_reminders(bot: &Bot, state: &BotState) -> sqlx::Result<()> {
    let today = now_local().date_naive();
    let transport = TelegramTransport { bot: bot.clone() };

    let slots = SlotSummary::all_active(&state.db).await?;
    for slot in slots.into_iter().filter(|s| s.date == today) {
        let date = format!(
            "{} в {}",
            slot.date.format("%d.%m"),
            slot.start_time.format("%H:%M")
        );
        let text = texts::consultation_notif(&slot.expert_name, &date);

        run_campaign(
            &state.db,
            &transport,
            &Selector::Consultation(slot.id),
            &text,
            None,
            EphemeralKind::Consultation,
            REMINDER_PACE,
        )
        .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};

    #[test]
    fn every_job_has_a_unique_minute() {
        let schedule = [
            (8, 0),
            (16, 0),
            (17, 0),
            (19, 0),
            (20, 5),
            (20, 10),
            (21, 0),
            (23, 55),
            (23, 59),
        ];
        let mut seen = std::collections::HashSet::new();
        for slot in schedule {
            assert!(seen.insert(slot), "duplicate slot {:?}", slot);
        }
    }

    #[test]
    fn day_is_not_ambiguous_near_midnight() {
        // 23:59 местного = 20:59 UTC того же дня: завтрашняя дата стабильна
        let late = event_offset()
            .with_ymd_and_hms(2024, 6, 10, 23, 59, 0)
            .single()
            .unwrap();
        let tomorrow = late.date_naive() + ChronoDuration::days(1);
        assert_eq!(tomorrow.day(), 11);
    }
}
