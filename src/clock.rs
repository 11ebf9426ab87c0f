use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};

/// Все окна записи и расписание джобов считаются в часовом поясе
/// площадки (UTC+3), а не в поясе отправителя.
pub fn event_offset() -> FixedOffset {
    FixedOffset::east_opt(3 * 3600).expect("valid fixed offset")
}

pub fn now_local() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&event_offset())
}

/// Границы местных суток в UTC — для выборок по TIMESTAMPTZ.
pub fn local_day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date
        .and_hms_opt(0, 0, 0)
        .expect("midnight exists")
        .and_local_timezone(event_offset())
        .unwrap();

    (
        start.with_timezone(&Utc),
        (start + Duration::days(1)).with_timezone(&Utc),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn day_bounds_cover_exactly_24_hours() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let (from, to) = local_day_bounds(date);
        assert_eq!(to - from, Duration::days(1));
        // местная полночь = 21:00 UTC предыдущего дня
        assert_eq!(from.to_rfc3339(), "2024-03-14T21:00:00+00:00");
    }
}
