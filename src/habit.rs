use chrono::{DateTime, Local};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single trackable habit.
///
/// The same type is used for the template list and for the per-day copies.
/// On a day copy, `created_at` is the instant that day's copy was
/// instantiated and `completed_at`/`deleted_at` describe that day only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    pub id: i64,
    #[serde(rename = "created")]
    pub created_at: DateTime<Local>,
    #[serde(rename = "compl", default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Local>>,
    #[serde(rename = "del", default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Local>>,
    #[serde(rename = "cont", default, skip_serializing_if = "String::is_empty")]
    pub content: String,
}

impl Habit {
    pub fn new(id: i64, content: impl Into<String>, created_at: DateTime<Local>) -> Self {
        Self {
            id,
            created_at,
            completed_at: None,
            deleted_at: None,
            content: content.into(),
        }
    }

    pub fn is_done(&self) -> bool {
        self.completed_at.is_some()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Completion rollup for one day record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    #[serde(rename = "n")]
    pub num_complete: u32,
    /// Ratio in `0.0..=1.0`, NaN when the day had no habits.
    #[serde(
        rename = "p",
        serialize_with = "serialize_ratio",
        deserialize_with = "deserialize_ratio"
    )]
    pub percent_complete: f32,
}

// JSON has no NaN, so an empty day's ratio is stored as null.
fn serialize_ratio<S>(value: &f32, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if value.is_nan() {
        serializer.serialize_none()
    } else {
        serializer.serialize_some(value)
    }
}

fn deserialize_ratio<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f32>::deserialize(deserializer)?.unwrap_or(f32::NAN))
}

/// Id for a habit appended to `template`. Template habits are soft-deleted,
/// so the maximum never goes down and ids are not reused.
pub fn next_habit_id(template: &[Habit]) -> i64 {
    template.iter().map(|habit| habit.id).max().unwrap_or(0) + 1
}

pub fn add_habit(template: &[Habit], content: &str, now: DateTime<Local>) -> Vec<Habit> {
    let id = next_habit_id(template);
    template
        .iter()
        .cloned()
        .chain(std::iter::once(Habit::new(id, content.trim(), now)))
        .collect()
}

/// Returns `None` when no active habit has the given id.
pub fn edit_habit(template: &[Habit], id: i64, content: &str) -> Option<Vec<Habit>> {
    template
        .iter()
        .any(|habit| habit.id == id && !habit.is_deleted())
        .then(|| {
            template
                .iter()
                .cloned()
                .map(|mut habit| {
                    if habit.id == id {
                        habit.content = content.trim().to_string();
                    }
                    habit
                })
                .collect()
        })
}

/// Marks the habit deleted as of `now`. The habit stays in the list so
/// days before the deletion still materialize it.
pub fn remove_habit(template: &[Habit], id: i64, now: DateTime<Local>) -> Option<Vec<Habit>> {
    template
        .iter()
        .any(|habit| habit.id == id && !habit.is_deleted())
        .then(|| {
            template
                .iter()
                .cloned()
                .map(|mut habit| {
                    if habit.id == id {
                        habit.deleted_at = Some(now);
                    }
                    habit
                })
                .collect()
        })
}

#[cfg(test)]
mod tests {
    use super::{DailySummary, Habit, add_habit, edit_habit, next_habit_id, remove_habit};
    use chrono::{Local, TimeZone};
    use serde_json::json;

    fn at(day: u32) -> chrono::DateTime<Local> {
        Local
            .with_ymd_and_hms(2024, 3, day, 9, 0, 0)
            .single()
            .expect("valid local time")
    }

    #[test]
    fn habit_json_uses_short_keys_and_omits_absent_fields() {
        let habit = Habit::new(1, "Read", at(1));
        let value = serde_json::to_value(&habit).expect("serialize habit");

        assert_eq!(value["id"], json!(1));
        assert_eq!(value["cont"], json!("Read"));
        assert!(value.get("created").is_some());
        assert!(value.get("compl").is_none());
        assert!(value.get("del").is_none());

        let decoded: Habit = serde_json::from_value(value).expect("deserialize habit");
        assert_eq!(decoded, habit);
    }

    #[test]
    fn nan_ratio_is_stored_as_null() {
        let summary = DailySummary {
            num_complete: 0,
            percent_complete: f32::NAN,
        };
        let encoded = serde_json::to_string(&summary).expect("serialize summary");
        assert_eq!(encoded, r#"{"n":0,"p":null}"#);

        let decoded: DailySummary = serde_json::from_str(&encoded).expect("deserialize summary");
        assert_eq!(decoded.num_complete, 0);
        assert!(decoded.percent_complete.is_nan());
    }

    #[test]
    fn ids_are_not_reused_after_removal() {
        let template = add_habit(&[], "Walk", at(1));
        let template = add_habit(&template, "Stretch", at(2));
        let template = remove_habit(&template, 2, at(3)).expect("habit 2 exists");

        assert_eq!(template.len(), 2);
        assert!(template[1].is_deleted());
        assert_eq!(next_habit_id(&template), 3);
    }

    #[test]
    fn editing_unknown_or_deleted_habit_is_rejected() {
        let template = add_habit(&[], "Walk", at(1));
        let template = remove_habit(&template, 1, at(2)).expect("habit 1 exists");

        assert!(edit_habit(&template, 1, "Run").is_none());
        assert!(edit_habit(&template, 7, "Run").is_none());
        assert!(remove_habit(&template, 1, at(3)).is_none());
    }

    #[test]
    fn edit_changes_only_the_target_content() {
        let template = add_habit(&add_habit(&[], "Walk", at(1)), "Read", at(1));
        let edited = edit_habit(&template, 2, "  Read 20 pages ").expect("habit 2 exists");

        assert_eq!(edited[0].content, "Walk");
        assert_eq!(edited[1].content, "Read 20 pages");
        assert_eq!(edited[1].created_at, template[1].created_at);
    }
}
