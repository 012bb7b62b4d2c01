use crate::db::StoreError;
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone};
use std::fmt;
use std::str::FromStr;

const KEY_FORMAT: &str = "%y%m%d";

/// Calendar date used as the key of day records and summaries, written as
/// `YYMMDD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayKey(NaiveDate);

impl DayKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn today() -> Self {
        Self::of(Local::now())
    }

    pub fn of(instant: DateTime<Local>) -> Self {
        Self(instant.date_naive())
    }

    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        if raw.len() != 6 || !raw.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(StoreError::InvalidDate(raw.to_string()));
        }

        NaiveDate::parse_from_str(raw, KEY_FORMAT)
            .map(Self)
            .map_err(|_| StoreError::InvalidDate(raw.to_string()))
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Start of this day in the local timezone. When midnight falls in a
    /// DST gap the first valid instant after it is used.
    pub fn midnight(&self) -> Result<DateTime<Local>, StoreError> {
        let naive = self.0.and_time(NaiveTime::MIN);

        Local
            .from_local_datetime(&naive)
            .earliest()
            .or_else(|| {
                Local
                    .from_local_datetime(&(naive + Duration::hours(1)))
                    .earliest()
            })
            .ok_or_else(|| StoreError::InvalidDate(self.to_string()))
    }

    /// True when this day's midnight is strictly after `now`. Today is
    /// never in the future.
    pub fn is_after(&self, now: DateTime<Local>) -> Result<bool, StoreError> {
        Ok(self.midnight()? > now)
    }

    pub fn pretty(&self) -> String {
        self.0.format("%b %-d, %Y").to_string()
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(KEY_FORMAT))
    }
}

impl FromStr for DayKey {
    type Err = StoreError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::DayKey;
    use crate::db::ErrorKind;
    use chrono::{Duration, Local, NaiveDate};

    #[test]
    fn parses_and_formats_six_digit_keys() {
        let key = DayKey::parse("240301").expect("valid key");
        assert_eq!(key.date(), NaiveDate::from_ymd_opt(2024, 3, 1).expect("date"));
        assert_eq!(key.to_string(), "240301");
        assert_eq!(key.pretty(), "Mar 1, 2024");
    }

    #[test]
    fn rejects_malformed_keys() {
        for raw in ["", "24031", "2403011", "24-3-1", "241301", "240230", "abcdef"] {
            let error = DayKey::parse(raw).expect_err("malformed key must fail");
            assert_eq!(error.kind(), ErrorKind::InvalidDate, "{raw}");
        }
    }

    #[test]
    fn today_is_not_in_the_future_but_tomorrow_is() {
        let now = Local::now();
        let today = DayKey::of(now);
        let tomorrow = DayKey::new(today.date() + Duration::days(1));

        assert!(!today.is_after(now).expect("today"));
        assert!(tomorrow.is_after(now).expect("tomorrow"));
    }

    #[test]
    fn keys_order_chronologically() {
        let earlier = DayKey::parse("231231").expect("key");
        let later = DayKey::parse("240101").expect("key");
        assert!(earlier < later);
    }
}
