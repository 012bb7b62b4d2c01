use crate::habit::Habit;
use chrono::{DateTime, Local};

/// Derives the record of a day that has never been opened.
///
/// A template habit applies when it was created strictly before the day's
/// midnight and is either still active or was deleted strictly after it.
/// Copies start uncompleted and carry `now` as their creation time, the
/// moment this day's instance came into existence.
pub fn materialize(
    template: &[Habit],
    day_start: DateTime<Local>,
    now: DateTime<Local>,
) -> Vec<Habit> {
    template
        .iter()
        .filter(|habit| {
            habit.created_at < day_start
                && habit.deleted_at.is_none_or(|deleted| deleted > day_start)
        })
        .map(|habit| Habit {
            id: habit.id,
            created_at: now,
            completed_at: None,
            deleted_at: None,
            content: habit.content.clone(),
        })
        .collect()
}
