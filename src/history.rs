use crate::day::DayKey;
use crate::habit::DailySummary;
use chrono::{Datelike, Duration, Months, NaiveDate};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct GridCell {
    pub day: DayKey,
    pub summary: Option<DailySummary>,
    pub in_future: bool,
}

/// One calendar week, Sunday first.
#[derive(Debug, Clone, PartialEq)]
pub struct GridRow {
    /// Set on the first full week of a month.
    pub month_label: Option<String>,
    pub cells: [GridCell; 7],
}

/// Weeks from `months` before `today` (rounded back to Sunday) through the
/// week containing `today`.
pub fn build_day_grid(
    summaries: &BTreeMap<DayKey, DailySummary>,
    today: NaiveDate,
    months: u32,
) -> Vec<GridRow> {
    let start = today
        .checked_sub_months(Months::new(months))
        .unwrap_or(today);
    let start = start - Duration::days(i64::from(start.weekday().num_days_from_sunday()));

    std::iter::successors(Some(start), |week| Some(*week + Duration::days(7)))
        .take_while(|week| *week <= today)
        .map(|week| GridRow {
            month_label: (week.day() <= 7).then(|| week.format("%b").to_string()),
            cells: std::array::from_fn(|offset| {
                let date = week + Duration::days(offset as i64);
                let day = DayKey::new(date);
                GridCell {
                    day,
                    summary: summaries.get(&day).copied(),
                    in_future: date > today,
                }
            }),
        })
        .collect()
}
