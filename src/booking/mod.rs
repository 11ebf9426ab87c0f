//! Запись на консультации: окна доступности, списки выбора и
//! изменение мест через атомарный леджер.

pub mod ledger;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime};
use sqlx::FromRow;

use crate::database::Database;

/// Запись открывается не позже чем за 5 минут до начала интервала.
pub const BOOKING_LEAD_MINUTES: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookOutcome {
    Booked,
    /// Проигрыш гонки за последнее место — отказ без побочных эффектов.
    Full,
    NotRegistered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    Cancelled,
    NotFound,
    WindowClosed,
}

/// Интервал предлагается, пока до его начала больше 5 минут (сегодня),
/// либо если он завтрашний и стартует раньше текущего времени суток —
/// скользящее окно предпросмотра в 24 часа.
pub fn booking_open(date: NaiveDate, start: NaiveTime, now: DateTime<FixedOffset>) -> bool {
    let today = now.date_naive();
    let deadline = now + Duration::minutes(BOOKING_LEAD_MINUTES);

    if date == today {
        deadline.date_naive() == today && start > deadline.time()
    } else if date == today + Duration::days(1) {
        start < now.time()
    } else {
        false
    }
}

/// Отмена разрешена для сегодняшних ещё не начавшихся слотов и для
/// любых завтрашних. Сравниваются полные даты: окно — ровно двое
/// скользящих суток, дальние записи отменяет организатор вручную.
pub fn cancel_open(date: NaiveDate, start: NaiveTime, now: DateTime<FixedOffset>) -> bool {
    let today = now.date_naive();

    if date == today {
        start > now.time()
    } else {
        date == today + Duration::days(1)
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Choice {
    pub id: i64,
    pub label: String,
}

#[derive(Debug, Clone, FromRow)]
struct IntervalRow {
    id: i64,
    date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
}

/// Интервалы, куда пользователь ещё может записаться. Учитывает
/// свободные места, окно записи и потолок в две записи на интервал.
pub async fn eligible_intervals(
    db: &Database,
    tg_id: i64,
    is_group: bool,
    now: DateTime<FixedOffset>,
) -> sqlx::Result<Vec<Choice>> {
    let today = now.date_naive();
    let tomorrow = today + Duration::days(1);

    let rows = sqlx::query_as::<_, IntervalRow>(
        "SELECT i.id, i.date, i.start_time, i.end_time
         FROM consultation_intervals i
         WHERE i.date IN ($1, $2)
           AND EXISTS (
               SELECT 1 FROM consultation_slots s
               WHERE s.interval_id = i.id AND s.is_active
                 AND s.is_group = $3 AND s.occupied < s.capacity)
           AND i.id NOT IN (
               SELECT s.interval_id FROM consultation_records r
               JOIN consultation_slots s ON s.id = r.slot_id
               JOIN users u ON u.id = r.user_id
               WHERE u.tg_id = $4 AND s.is_group = $3
               GROUP BY s.interval_id
               HAVING COUNT(*) >= 2)
         ORDER BY i.date, i.start_time",
    )
    .bind(today)
    .bind(tomorrow)
    .bind(is_group)
    .bind(tg_id)
    .fetch_all(&db.pool)
    .await?;

    Ok(rows
        .into_iter()
        .filter(|r| booking_open(r.date, r.start_time, now))
        .map(|r| Choice {
            id: r.id,
            label: format!(
                "{} {}-{}",
                r.date.format("%d.%m"),
                r.start_time.format("%H:%M"),
                r.end_time.format("%H:%M")
            ),
        })
        .collect())
}

/// Эксперты интервала. Для групповых слотов вариант — сам слот, для
/// личных — эксперт (время выбирается следующим шагом). Слоты с
/// временем начала, на которое пользователь уже записан в этом
/// интервале, исключаются.
pub async fn eligible_experts(
    db: &Database,
    tg_id: i64,
    interval_id: i64,
    is_group: bool,
) -> sqlx::Result<Vec<Choice>> {
    let sql = if is_group {
        "SELECT s.id AS id, u.last_name || ' ' || u.first_name AS label
         FROM consultation_slots s JOIN users u ON u.id = s.expert_id
         WHERE s.interval_id = $1 AND s.is_group = $2 AND s.is_active
           AND s.occupied < s.capacity
           AND s.start_time NOT IN (
               SELECT s2.start_time FROM consultation_records r
               JOIN consultation_slots s2 ON s2.id = r.slot_id
               JOIN users u2 ON u2.id = r.user_id
               WHERE u2.tg_id = $3 AND s2.interval_id = $1 AND s2.is_group = $2)
         ORDER BY u.last_name, u.first_name"
    } else {
        "SELECT DISTINCT ON (u.last_name, u.first_name, s.expert_id)
                s.expert_id AS id, u.last_name || ' ' || u.first_name AS label
         FROM consultation_slots s JOIN users u ON u.id = s.expert_id
         WHERE s.interval_id = $1 AND s.is_group = $2 AND s.is_active
           AND s.occupied < s.capacity
           AND s.start_time NOT IN (
               SELECT s2.start_time FROM consultation_records r
               JOIN consultation_slots s2 ON s2.id = r.slot_id
               JOIN users u2 ON u2.id = r.user_id
               WHERE u2.tg_id = $3 AND s2.interval_id = $1 AND s2.is_group = $2)
         ORDER BY u.last_name, u.first_name, s.expert_id"
    };

    sqlx::query_as::<_, Choice>(sql)
        .bind(interval_id)
        .bind(is_group)
        .bind(tg_id)
        .fetch_all(&db.pool)
        .await
}

/// Свободные времена личных слотов выбранного эксперта.
pub async fn eligible_times(
    db: &Database,
    tg_id: i64,
    interval_id: i64,
    expert_id: i64,
) -> sqlx::Result<Vec<Choice>> {
    sqlx::query_as::<_, Choice>(
        "SELECT s.id AS id, to_char(s.start_time, 'HH24:MI') AS label
         FROM consultation_slots s
         WHERE s.expert_id = $1 AND s.interval_id = $2 AND s.is_group = false
           AND s.is_active AND s.occupied < s.capacity
           AND s.start_time NOT IN (
               SELECT s2.start_time FROM consultation_records r
               JOIN consultation_slots s2 ON s2.id = r.slot_id
               JOIN users u2 ON u2.id = r.user_id
               WHERE u2.tg_id = $3 AND s2.interval_id = $2 AND s2.is_group = false)
         ORDER BY s.start_time",
    )
    .bind(expert_id)
    .bind(interval_id)
    .bind(tg_id)
    .fetch_all(&db.pool)
    .await
}

/// Записать пользователя. Место удерживается атомарно до вставки
/// записи; неудачная вставка компенсируется возвратом места.
pub async fn book(db: &Database, tg_id: i64, slot_id: i64) -> sqlx::Result<BookOutcome> {
    let user_id: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE tg_id = $1")
        .bind(tg_id)
        .fetch_optional(&db.pool)
        .await?;

    let Some(user_id) = user_id else {
        return Ok(BookOutcome::NotRegistered);
    };

    if !ledger::try_occupy(db, slot_id).await? {
        return Ok(BookOutcome::Full);
    }

    if let Err(e) = ledger::insert_record(db, user_id, slot_id).await {
        ledger::release(db, slot_id).await?;
        return Err(e);
    }

    Ok(BookOutcome::Booked)
}

#[derive(Debug, Clone, FromRow)]
struct SlotWindow {
    date: NaiveDate,
    start_time: NaiveTime,
}

/// Отменить запись: проверка окна, удаление записи, возврат места.
pub async fn cancel(
    db: &Database,
    tg_id: i64,
    slot_id: i64,
    now: DateTime<FixedOffset>,
) -> sqlx::Result<CancelOutcome> {
    let window = sqlx::query_as::<_, SlotWindow>(
        "SELECT i.date, s.start_time
         FROM consultation_slots s
         JOIN consultation_intervals i ON i.id = s.interval_id
         WHERE s.id = $1",
    )
    .bind(slot_id)
    .fetch_optional(&db.pool)
    .await?;

    let Some(window) = window else {
        return Ok(CancelOutcome::NotFound);
    };

    if !cancel_open(window.date, window.start_time, now) {
        return Ok(CancelOutcome::WindowClosed);
    }

    if !ledger::delete_record_and_release(db, tg_id, slot_id).await? {
        return Ok(CancelOutcome::NotFound);
    }

    Ok(CancelOutcome::Cancelled)
}

#[derive(Debug, Clone, FromRow)]
pub struct DiaryEntry {
    pub slot_id: i64,
    pub expert_name: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub is_group: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Diary {
    pub group: Vec<DiaryEntry>,
    pub personal: Vec<DiaryEntry>,
}

async fn user_entries(
    db: &Database,
    tg_id: i64,
    now: DateTime<FixedOffset>,
) -> sqlx::Result<Vec<DiaryEntry>> {
    let today = now.date_naive();
    let tomorrow = today + Duration::days(1);

    sqlx::query_as::<_, DiaryEntry>(
        "SELECT s.id AS slot_id, u.last_name || ' ' || u.first_name AS expert_name,
                i.date, s.start_time, s.is_group
         FROM consultation_records r
         JOIN consultation_slots s ON s.id = r.slot_id
         JOIN consultation_intervals i ON i.id = s.interval_id
         JOIN users u ON u.id = s.expert_id
         JOIN users me ON me.id = r.user_id
         WHERE me.tg_id = $1 AND s.is_active AND i.date IN ($2, $3)
         ORDER BY i.date, s.start_time",
    )
    .bind(tg_id)
    .bind(today)
    .bind(tomorrow)
    .fetch_all(&db.pool)
    .await
}

/// Дневник: актуальные записи, разделённые на групповые и личные.
pub async fn diary(db: &Database, tg_id: i64, now: DateTime<FixedOffset>) -> sqlx::Result<Diary> {
    let mut out = Diary::default();
    for entry in user_entries(db, tg_id, now).await? {
        if entry.is_group {
            out.group.push(entry);
        } else {
            out.personal.push(entry);
        }
    }
    Ok(out)
}

/// Записи, которые ещё можно отменить (окно отмены открыто).
pub async fn cancellable(
    db: &Database,
    tg_id: i64,
    is_group: bool,
    now: DateTime<FixedOffset>,
) -> sqlx::Result<Vec<DiaryEntry>> {
    Ok(user_entries(db, tg_id, now)
        .await?
        .into_iter()
        .filter(|e| e.is_group == is_group && cancel_open(e.date, e.start_time, now))
        .collect())
}

#[derive(Debug, Clone, FromRow)]
struct AgendaSlot {
    id: i64,
    date: NaiveDate,
    start_time: NaiveTime,
}

#[derive(Debug, Clone)]
pub struct AgendaItem {
    pub date_label: String,
    pub attendees: Vec<(String, String)>,
}

/// Слоты эксперта с записавшимися: фамилия плюс ссылка на карту
/// самоопределения.
pub async fn expert_agenda(db: &Database, tg_id: i64) -> sqlx::Result<Vec<AgendaItem>> {
    let slots = sqlx::query_as::<_, AgendaSlot>(
        "SELECT s.id, i.date, s.start_time
         FROM consultation_slots s
         JOIN consultation_intervals i ON i.id = s.interval_id
         JOIN users e ON e.id = s.expert_id
         WHERE e.tg_id = $1 AND s.is_active AND s.occupied > 0
         ORDER BY i.date, s.start_time",
    )
    .bind(tg_id)
    .fetch_all(&db.pool)
    .await?;

    let mut agenda = Vec::with_capacity(slots.len());
    for slot in slots {
        let attendees: Vec<(String, String)> = sqlx::query_as(
            "SELECT u.last_name || ' ' || u.first_name, u.map_url
             FROM consultation_records r JOIN users u ON u.id = r.user_id
             WHERE r.slot_id = $1
             ORDER BY u.last_name, u.first_name",
        )
        .bind(slot.id)
        .fetch_all(&db.pool)
        .await?;

        agenda.push(AgendaItem {
            date_label: format!("{} {}", slot.date.format("%d.%m"), slot.start_time.format("%H:%M")),
            attendees,
        });
    }

    Ok(agenda)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::clock::event_offset;

    fn local(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<FixedOffset> {
        event_offset()
            .with_ymd_and_hms(y, m, d, h, min, s)
            .single()
            .unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn booking_closes_exactly_at_lead_time() {
        let start = time(10, 0, 0);
        let day = date(2024, 6, 10);

        // за 5 минут 1 секунду — ещё открыто
        assert!(booking_open(day, start, local(2024, 6, 10, 9, 54, 59)));
        // ровно за 5 минут — уже закрыто
        assert!(!booking_open(day, start, local(2024, 6, 10, 9, 55, 0)));
        assert!(!booking_open(day, start, local(2024, 6, 10, 10, 30, 0)));
    }

    #[test]
    fn booking_preview_window_is_rolling_24_hours() {
        let day = date(2024, 6, 11);
        // завтра в 09:00 видно после 09:00 сегодня, но не раньше
        assert!(booking_open(day, time(9, 0, 0), local(2024, 6, 10, 10, 0, 0)));
        assert!(!booking_open(day, time(11, 0, 0), local(2024, 6, 10, 10, 0, 0)));
        // послезавтра не видно никогда
        assert!(!booking_open(date(2024, 6, 12), time(9, 0, 0), local(2024, 6, 10, 10, 0, 0)));
    }

    #[test]
    fn booking_window_respects_month_boundary() {
        // 30 июня «завтра» — это 1 июля, а не другой день с тем же числом
        assert!(booking_open(date(2024, 7, 1), time(9, 0, 0), local(2024, 6, 30, 10, 0, 0)));
        assert!(!booking_open(date(2024, 8, 1), time(9, 0, 0), local(2024, 6, 30, 10, 0, 0)));
    }

    #[test]
    fn booking_near_midnight_does_not_wrap() {
        // до полуночи меньше 5 минут: сегодняшних вариантов нет
        assert!(!booking_open(date(2024, 6, 10), time(23, 59, 0), local(2024, 6, 10, 23, 58, 0)));
    }

    #[test]
    fn cancel_window_is_today_future_or_tomorrow() {
        let now = local(2024, 6, 10, 12, 0, 0);
        assert!(cancel_open(date(2024, 6, 10), time(12, 30, 0), now));
        assert!(!cancel_open(date(2024, 6, 10), time(11, 0, 0), now));
        assert!(cancel_open(date(2024, 6, 11), time(8, 0, 0), now));
        // дальше двух суток — отказ, даже через месяц в тот же день
        assert!(!cancel_open(date(2024, 7, 10), time(12, 30, 0), now));
    }
}
