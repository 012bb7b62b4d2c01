pub const CREATE_META: &str = r#"
CREATE TABLE IF NOT EXISTS meta (
  key   TEXT PRIMARY KEY NOT NULL,
  value TEXT NOT NULL
);
"#;

pub const CREATE_DAILY_RECORDS: &str = r#"
CREATE TABLE IF NOT EXISTS daily_records (
  date   TEXT PRIMARY KEY NOT NULL,
  habits TEXT NOT NULL
);
"#;

pub const CREATE_DAILY_SUMMARIES: &str = r#"
CREATE TABLE IF NOT EXISTS daily_summaries (
  date    TEXT PRIMARY KEY NOT NULL,
  summary TEXT NOT NULL
);
"#;

pub const TEMPLATE_KEY: &str = "habits";

pub const SELECT_META: &str = "SELECT value FROM meta WHERE key = ?1";

pub const UPSERT_META: &str = "INSERT INTO meta (key, value) VALUES (?1, ?2)
     ON CONFLICT(key) DO UPDATE SET value = excluded.value";

pub const SELECT_DAILY_RECORD: &str = "SELECT habits FROM daily_records WHERE date = ?1";

pub const UPSERT_DAILY_RECORD: &str = "INSERT INTO daily_records (date, habits) VALUES (?1, ?2)
     ON CONFLICT(date) DO UPDATE SET habits = excluded.habits";

pub const SELECT_DAILY_SUMMARIES: &str =
    "SELECT date, summary FROM daily_summaries ORDER BY date ASC";

pub const UPSERT_DAILY_SUMMARY: &str = "INSERT INTO daily_summaries (date, summary) VALUES (?1, ?2)
     ON CONFLICT(date) DO UPDATE SET summary = excluded.summary";

pub const COUNT_DAILY_RECORDS: &str = "SELECT COUNT(*) FROM daily_records";

pub fn schema_statements() -> Vec<&'static str> {
    vec![CREATE_META, CREATE_DAILY_RECORDS, CREATE_DAILY_SUMMARIES]
}
