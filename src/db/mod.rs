//! Durable habit storage on SQLite.
//!
//! Three namespaces, one table each:
//!
//! ```text
//! meta             habits   -> [Habit]        (the template)
//! daily_records    YYMMDD   -> [Habit]        (one day's instances)
//! daily_summaries  YYMMDD   -> DailySummary   (rollup of that day)
//! ```
//!
//! Values are JSON. Every public operation runs in a single transaction, and
//! a day's summary is always written in the same transaction as its record.

mod error;
pub mod queries;

pub use error::{ErrorKind, StoreError};

use crate::config;
use crate::day::DayKey;
use crate::habit::{DailySummary, Habit};
use crate::record::{aggregate, materialize};
use chrono::{DateTime, Local};
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const DB_FILE: &str = "db.todaily";
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Database {
    conn: Connection,
    path: PathBuf,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                context: format!("creating data directory {}", parent.display()),
                source,
            })?;
        }

        let open_error = |source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        };
        let conn = Connection::open(path).map_err(open_error)?;
        conn.busy_timeout(BUSY_TIMEOUT).map_err(open_error)?;
        conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get::<_, String>(0))
            .map_err(open_error)?;

        let database = Self {
            conn,
            path: path.to_path_buf(),
        };
        database.init_schema()?;

        info!(path = %path.display(), "habit store opened");
        Ok(database)
    }

    /// Opens `~/.todaily/db.todaily`.
    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(&default_db_path()?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        queries::schema_statements()
            .iter()
            .try_for_each(|statement| {
                self.conn
                    .execute(statement, [])
                    .map(|_| ())
                    .map_err(|source| StoreError::Open {
                        path: self.path.clone(),
                        source,
                    })
            })
    }

    /// The habit template; empty if it was never written.
    pub fn get_template(&mut self) -> Result<Vec<Habit>, StoreError> {
        let tx = self
            .conn
            .transaction()
            .map_err(StoreError::read("starting read transaction"))?;
        let habits = read_json::<Vec<Habit>>(
            &tx,
            queries::SELECT_META,
            queries::TEMPLATE_KEY,
            "habit template list",
        )?
        .unwrap_or_default();
        tx.commit()
            .map_err(StoreError::read("finishing read transaction"))?;

        Ok(habits)
    }

    pub fn put_template(&mut self, habits: &[Habit]) -> Result<(), StoreError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(StoreError::write("starting write transaction"))?;
        write_json(
            &tx,
            queries::UPSERT_META,
            queries::TEMPLATE_KEY,
            habits,
            "putting habit template list into meta",
        )?;
        tx.commit()
            .map_err(StoreError::write("committing habit template list"))?;

        debug!(habits = habits.len(), "habit template saved");
        Ok(())
    }

    /// Habits for `date`, materializing and persisting them on first access.
    ///
    /// Not a pure read: the first call for a date writes both the new day
    /// record and its summary, so it can fail with a write error.
    pub fn get_day_record(&mut self, date: DayKey) -> Result<Vec<Habit>, StoreError> {
        self.get_day_record_at(date, Local::now())
    }

    pub fn get_day_record_at(
        &mut self,
        date: DayKey,
        now: DateTime<Local>,
    ) -> Result<Vec<Habit>, StoreError> {
        if date.is_after(now)? {
            return Err(StoreError::FutureDate(date.to_string()));
        }
        let day_start = date.midnight()?;

        let key = date.to_string();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(StoreError::write("starting write transaction"))?;

        if let Some(habits) = read_json::<Vec<Habit>>(
            &tx,
            queries::SELECT_DAILY_RECORD,
            &key,
            &format!("habits for {key:?}"),
        )? {
            tx.commit()
                .map_err(StoreError::read(format!("reading habits for {key:?}")))?;
            return Ok(habits);
        }

        let template = read_json::<Vec<Habit>>(
            &tx,
            queries::SELECT_META,
            queries::TEMPLATE_KEY,
            "habit template list",
        )?
        .unwrap_or_default();
        let habits = materialize(&template, day_start, now);

        write_day(&tx, &key, &habits)?;
        tx.commit()
            .map_err(StoreError::write(format!("inserting habit data for new day {key:?}")))?;

        debug!(date = %key, habits = habits.len(), "day record backfilled");
        Ok(habits)
    }

    /// Replaces the record for `date` and recomputes its summary atomically.
    pub fn put_day_record(&mut self, date: DayKey, habits: &[Habit]) -> Result<(), StoreError> {
        let key = date.to_string();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(StoreError::write("starting write transaction"))?;
        write_day(&tx, &key, habits)?;
        tx.commit()
            .map_err(StoreError::write(format!("saving habits for {key:?}")))?;

        debug!(date = %key, habits = habits.len(), "day record saved");
        Ok(())
    }

    /// Every stored summary. A single undecodable entry fails the whole scan.
    pub fn get_all_summaries(&mut self) -> Result<BTreeMap<DayKey, DailySummary>, StoreError> {
        let tx = self
            .conn
            .transaction()
            .map_err(StoreError::read("starting read transaction"))?;

        let rows = {
            let mut statement = tx
                .prepare(queries::SELECT_DAILY_SUMMARIES)
                .map_err(StoreError::read("preparing summary scan"))?;
            statement
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
                .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
                .map_err(StoreError::read("scanning daily summaries"))?
        };
        tx.commit()
            .map_err(StoreError::read("finishing read transaction"))?;

        rows.into_iter()
            .map(|(date, raw)| -> Result<_, StoreError> {
                let summary = serde_json::from_str::<DailySummary>(&raw)
                    .map_err(StoreError::decode(format!("summary for {date:?}")))?;
                Ok((DayKey::parse(&date)?, summary))
            })
            .collect()
    }

    pub fn count_day_records(&self) -> Result<u64, StoreError> {
        self.conn
            .query_row(queries::COUNT_DAILY_RECORDS, [], |row| row.get(0))
            .map_err(StoreError::read("counting day records"))
    }

    pub fn close(self) -> Result<(), StoreError> {
        let path = self.path;
        self.conn
            .close()
            .map_err(|(_, source)| StoreError::Write {
                context: format!("closing database {}", path.display()),
                source,
            })?;

        info!(path = %path.display(), "habit store closed");
        Ok(())
    }
}

pub fn default_db_path() -> Result<PathBuf, StoreError> {
    config::default_root_dir()
        .map(|root| root.join(DB_FILE))
        .ok_or(StoreError::NoHomeDir)
}

fn write_day(conn: &Connection, key: &str, habits: &[Habit]) -> Result<(), StoreError> {
    write_json(
        conn,
        queries::UPSERT_DAILY_RECORD,
        key,
        habits,
        &format!("habits for {key:?}"),
    )?;
    write_json(
        conn,
        queries::UPSERT_DAILY_SUMMARY,
        key,
        &aggregate(habits),
        &format!("setting completion status for {key:?}"),
    )
}

fn read_json<T: DeserializeOwned>(
    conn: &Connection,
    sql: &str,
    key: &str,
    context: &str,
) -> Result<Option<T>, StoreError> {
    let raw = conn
        .query_row(sql, params![key], |row| row.get::<_, String>(0))
        .optional()
        .map_err(StoreError::read(format!("reading {context}")))?;

    raw.map(|raw| serde_json::from_str(&raw).map_err(StoreError::decode(context)))
        .transpose()
}

fn write_json<T: Serialize + ?Sized>(
    conn: &Connection,
    sql: &str,
    key: &str,
    value: &T,
    context: &str,
) -> Result<(), StoreError> {
    let encoded = serde_json::to_string(value).map_err(StoreError::encode(context))?;
    conn.execute(sql, params![key, encoded])
        .map_err(StoreError::write(format!("writing {context}")))?;

    Ok(())
}
