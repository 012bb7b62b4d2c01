use crate::habit::{DailySummary, Habit};

/// Rollup of one day record. Always recomputed from the full list.
pub fn aggregate(record: &[Habit]) -> DailySummary {
    let num_complete = record.iter().filter(|habit| habit.is_done()).count();

    DailySummary {
        num_complete: num_complete as u32,
        // 0/0 is NaN on purpose: a day without habits has no ratio.
        percent_complete: num_complete as f32 / record.len() as f32,
    }
}

#[cfg(test)]
mod tests {
    use super::aggregate;
    use crate::habit::Habit;
    use chrono::{Local, TimeZone};

    fn record(done: &[bool]) -> Vec<Habit> {
        let created = Local
            .with_ymd_and_hms(2024, 5, 1, 8, 0, 0)
            .single()
            .expect("valid local time");

        done.iter()
            .enumerate()
            .map(|(index, done)| {
                let mut habit = Habit::new(index as i64 + 1, format!("habit {index}"), created);
                habit.completed_at = done.then_some(created);
                habit
            })
            .collect()
    }

    #[test]
    fn counts_completed_habits() {
        let summary = aggregate(&record(&[true, false, true, false]));
        assert_eq!(summary.num_complete, 2);
        assert_eq!(summary.percent_complete, 0.5);
    }

    #[test]
    fn all_done_is_one() {
        let summary = aggregate(&record(&[true, true, true]));
        assert_eq!(summary.num_complete, 3);
        assert_eq!(summary.percent_complete, 1.0);
    }

    #[test]
    fn empty_record_ratio_is_nan() {
        let summary = aggregate(&[]);
        assert_eq!(summary.num_complete, 0);
        assert!(summary.percent_complete.is_nan());
    }
}
