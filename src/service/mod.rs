//! Async access to the habit store.
//!
//! [`Store`] is a cloneable handle that runs every operation on the blocking
//! pool. [`Dispatcher`] turns [`Request`]s into background tasks whose
//! results come back as [`Update`] messages, and [`App`] consumes those
//! messages to keep the state a front end renders.

mod app;
mod dispatch;

pub use app::{App, DayView, ErrorEntry, Phase};
pub use dispatch::{Dispatcher, Request, Update};

use crate::day::DayKey;
use crate::db::{Database, StoreError};
use crate::habit::{DailySummary, Habit};
use crate::record::resolve;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task;

/// Shared handle to one open [`Database`]. Operations are serialized on the
/// connection and each runs in its own transaction.
#[derive(Clone)]
pub struct Store {
    db: Arc<Mutex<Option<Database>>>,
}

impl Store {
    /// Opens the store at `path`, or at the default location when `None`.
    pub async fn open(path: Option<PathBuf>) -> Result<Self, StoreError> {
        let database = task::spawn_blocking(move || match path {
            Some(path) => Database::open(&path),
            None => Database::open_default(),
        })
        .await??;

        Ok(Self::from_database(database))
    }

    pub fn from_database(database: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(Some(database))),
        }
    }

    async fn run<F, R>(&self, operation: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut Database) -> Result<R, StoreError> + Send + 'static,
        R: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let mut guard = db.lock().unwrap_or_else(PoisonError::into_inner);
            let database = guard.as_mut().ok_or(StoreError::Closed)?;
            operation(database)
        })
        .await?
    }

    pub async fn path(&self) -> Result<PathBuf, StoreError> {
        self.run(|db| Ok(db.path().to_path_buf())).await
    }

    pub async fn get_template(&self) -> Result<Vec<Habit>, StoreError> {
        self.run(|db| db.get_template()).await
    }

    pub async fn put_template(&self, habits: Vec<Habit>) -> Result<(), StoreError> {
        self.run(move |db| db.put_template(&habits)).await
    }

    /// See [`Database::get_day_record`]: the first call for a date writes.
    pub async fn get_day_record(&self, date: DayKey) -> Result<Vec<Habit>, StoreError> {
        self.run(move |db| db.get_day_record(date)).await
    }

    pub async fn put_day_record(&self, date: DayKey, habits: Vec<Habit>) -> Result<(), StoreError> {
        self.run(move |db| db.put_day_record(date, &habits)).await
    }

    pub async fn get_all_summaries(&self) -> Result<BTreeMap<DayKey, DailySummary>, StoreError> {
        self.run(|db| db.get_all_summaries()).await
    }

    pub async fn count_day_records(&self) -> Result<u64, StoreError> {
        self.run(|db| db.count_day_records()).await
    }

    /// Merges `template` into the record for `today` and writes the result.
    ///
    /// This is a plain read followed by a plain write, not one transaction:
    /// a direct edit of today's record that lands between the two is lost.
    pub async fn apply_template(
        &self,
        template: Vec<Habit>,
        today: DayKey,
    ) -> Result<Vec<Habit>, StoreError> {
        let todays_record = self.get_day_record(today).await?;
        let resolved = resolve(&template, &todays_record);
        self.put_day_record(today, resolved.clone()).await?;

        Ok(resolved)
    }

    /// Closes the database. Later operations on any clone fail with
    /// [`StoreError::Closed`]; closing twice is a no-op.
    pub async fn close(&self) -> Result<(), StoreError> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let database = db.lock().unwrap_or_else(PoisonError::into_inner).take();
            database.map_or(Ok(()), Database::close)
        })
        .await?
    }
}

#[cfg(test)]
mod tests {
    use super::Store;
    use crate::day::DayKey;
    use crate::db::ErrorKind;
    use crate::habit::Habit;
    use chrono::{Duration, Local};

    async fn open_temp() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = Store::open(Some(dir.path().join("db.todaily")))
            .await
            .expect("open store");
        (dir, store)
    }

    #[tokio::test]
    async fn concurrent_backfills_of_one_day_agree() {
        let (_dir, store) = open_temp().await;
        let created = Local::now() - Duration::days(30);
        store
            .put_template(vec![Habit::new(1, "Walk", created), Habit::new(2, "Read", created)])
            .await
            .expect("put template");
        let date = DayKey::of(Local::now() - Duration::days(1));

        let tasks = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.get_day_record(date).await })
            })
            .collect::<Vec<_>>();

        let mut records = Vec::new();
        for task in tasks {
            records.push(task.await.expect("join").expect("day record"));
        }

        assert_eq!(records[0].len(), 2);
        assert!(records.iter().all(|record| *record == records[0]));
        assert_eq!(store.count_day_records().await.expect("count"), 1);
    }

    #[tokio::test]
    async fn apply_template_keeps_todays_completions() {
        let (_dir, store) = open_temp().await;
        let now = Local::now();
        let today = DayKey::of(now);
        let mut walked = Habit::new(1, "Walk", now);
        walked.completed_at = Some(now);
        store
            .put_day_record(today, vec![walked.clone()])
            .await
            .expect("put today");

        let template = vec![
            Habit::new(1, "Walk", now - Duration::days(3)),
            Habit::new(2, "Read", now),
        ];
        let resolved = store.apply_template(template, today).await.expect("apply");

        assert_eq!(resolved[0], walked);
        assert!(!resolved[1].is_done());
        assert_eq!(store.get_day_record(today).await.expect("today"), resolved);

        let summary = store.get_all_summaries().await.expect("summaries")[&today];
        assert_eq!(summary.num_complete, 1);
        assert_eq!(summary.percent_complete, 0.5);
    }

    #[tokio::test]
    async fn closed_store_rejects_operations() {
        let (_dir, store) = open_temp().await;
        let clone = store.clone();

        store.close().await.expect("close");
        store.close().await.expect("second close is a no-op");

        let error = clone.get_template().await.expect_err("closed");
        assert_eq!(error.kind(), ErrorKind::Closed);
    }
}
