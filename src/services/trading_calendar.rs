use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use chrono_tz::Asia::Shanghai;
use chrono_tz::Tz;

/// Current time on the exchange-local (Beijing) clock
pub fn beijing_now() -> DateTime<Tz> {
    Utc::now().with_timezone(&Shanghai)
}

/// Current exchange-local calendar day
pub fn beijing_today() -> NaiveDate {
    beijing_now().date_naive()
}

/// Exchange-local calendar day of a UTC timestamp
pub fn beijing_date(timestamp: DateTime<Utc>) -> NaiveDate {
    timestamp.with_timezone(&Shanghai).date_naive()
}

/// Whether the exchange trades on the given day
// TODO: skip mainland exchange holidays, not just weekends
pub fn is_trading_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}
