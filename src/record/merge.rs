use crate::habit::Habit;

/// Merges an edited template into today's already materialized record.
///
/// Habits that still exist keep today's instance, completion included. New
/// habits get an uncompleted copy and deleted template habits are dropped
/// even if today had them. The result follows template order and replaces
/// today's record as a whole.
pub fn resolve(edited_template: &[Habit], todays_record: &[Habit]) -> Vec<Habit> {
    edited_template
        .iter()
        .filter(|habit| !habit.is_deleted())
        .map(|template_habit| {
            todays_record
                .iter()
                .find(|current| current.id == template_habit.id)
                .cloned()
                .unwrap_or_else(|| Habit {
                    completed_at: None,
                    ..template_habit.clone()
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::resolve;
    use crate::habit::Habit;
    use chrono::{DateTime, Duration, Local, TimeZone};

    fn morning() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2024, 7, 2, 8, 0, 0)
            .single()
            .expect("valid local time")
    }

    #[test]
    fn keeps_completion_and_adds_new_habits() {
        let now = morning();
        let mut walked = Habit::new(1, "Walk", now);
        walked.completed_at = Some(now + Duration::hours(1));
        let today = vec![walked.clone()];
        let template = vec![
            Habit::new(1, "Walk", now - Duration::days(10)),
            Habit::new(2, "Read", now),
        ];

        let resolved = resolve(&template, &today);

        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0], walked);
        assert!(resolved[0].is_done());
        assert_eq!(resolved[1].id, 2);
        assert!(!resolved[1].is_done());
    }

    #[test]
    fn drops_deleted_habits_even_when_present_today() {
        let now = morning();
        let today = vec![Habit::new(1, "Walk", now), Habit::new(2, "Read", now)];
        let mut deleted = Habit::new(1, "Walk", now - Duration::days(3));
        deleted.deleted_at = Some(now);
        let template = vec![deleted, Habit::new(2, "Read", now - Duration::days(3))];

        let ids = resolve(&template, &today)
            .iter()
            .map(|habit| habit.id)
            .collect::<Vec<_>>();

        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn follows_template_order() {
        let now = morning();
        let today = vec![Habit::new(1, "Walk", now), Habit::new(2, "Read", now)];
        let template = vec![
            Habit::new(2, "Read", now - Duration::days(1)),
            Habit::new(1, "Walk", now - Duration::days(1)),
        ];

        let ids = resolve(&template, &today)
            .iter()
            .map(|habit| habit.id)
            .collect::<Vec<_>>();

        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn habits_missing_from_template_are_removed_from_today() {
        let now = morning();
        let today = vec![Habit::new(9, "Old", now)];

        assert!(resolve(&[], &today).is_empty());
    }
}
