use super::Store;
use crate::day::DayKey;
use crate::db::StoreError;
use crate::habit::{DailySummary, Habit};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinSet;
use tracing::{error, warn};

#[derive(Debug, Clone)]
pub enum Request {
    /// Open the store (default location when `None`), then load every
    /// summary and today's record.
    Open(Option<PathBuf>),
    GetTemplate,
    PutTemplate(Vec<Habit>),
    GetDayRecord(DayKey),
    PutDayRecord { date: DayKey, habits: Vec<Habit> },
    GetAllSummaries,
    /// Merge an edited template into today's record.
    ApplyToToday(Vec<Habit>),
}

impl Request {
    pub fn action(&self) -> &'static str {
        match self {
            Self::Open(_) => "opening habit store",
            Self::GetTemplate => "reading habits",
            Self::PutTemplate(_) => "saving habits",
            Self::GetDayRecord(_) => "selecting day",
            Self::PutDayRecord { .. } => "saving this day's habits",
            Self::GetAllSummaries => "reading daily summaries",
            Self::ApplyToToday(_) => "applying habits to today",
        }
    }
}

/// Everything the front end needs once the store is open.
pub struct HandOff {
    pub store: Store,
    pub summaries: BTreeMap<DayKey, DailySummary>,
    pub today: DayKey,
    pub habits: Vec<Habit>,
}

pub enum Update {
    Ready(Box<HandOff>),
    /// Opening failed; the session cannot continue.
    SplashFailed(StoreError),
    Template(Vec<Habit>),
    TemplateSaved(Vec<Habit>),
    DayRecord { date: DayKey, habits: Vec<Habit> },
    /// The write was accepted; the receiver recomputes its cached summary.
    DayRecordSaved { date: DayKey, habits: Vec<Habit> },
    Summaries(BTreeMap<DayKey, DailySummary>),
    AppliedToToday { date: DayKey, habits: Vec<Habit> },
    Failed { action: &'static str, error: StoreError },
}

/// Runs requests as background tasks and reports each result as one
/// [`Update`] on the channel.
pub struct Dispatcher {
    store: Option<Store>,
    updates: UnboundedSender<Update>,
    in_flight: JoinSet<()>,
}

impl Dispatcher {
    pub fn new(updates: UnboundedSender<Update>) -> Self {
        Self {
            store: None,
            updates,
            in_flight: JoinSet::new(),
        }
    }

    pub fn attach(&mut self, store: Store) {
        self.store = Some(store);
    }

    pub fn store(&self) -> Option<&Store> {
        self.store.as_ref()
    }

    pub fn dispatch(&mut self, request: Request) {
        let store = self.store.clone();
        let updates = self.updates.clone();

        self.in_flight.spawn(async move {
            let action = request.action();
            let opening = matches!(request, Request::Open(_));

            let update = match execute(store, request).await {
                Ok(update) => update,
                Err(error) if opening => {
                    error!(error = %error, "failed to open habit store");
                    Update::SplashFailed(error)
                }
                Err(error) => {
                    error!(error = %error, action, "store request failed");
                    Update::Failed { action, error }
                }
            };

            if updates.send(update).is_err() {
                warn!(action, "update dropped, receiver is gone");
            }
        });
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight.is_empty()
    }

    /// Waits for every dispatched request to finish.
    pub async fn drain(&mut self) {
        while let Some(joined) = self.in_flight.join_next().await {
            if let Err(error) = joined {
                error!(error = %error, "store request task failed");
            }
        }
    }

    /// Drains in-flight requests, then closes the store.
    pub async fn shutdown(mut self) -> Result<(), StoreError> {
        self.drain().await;

        match self.store.take() {
            Some(store) => store.close().await,
            None => Ok(()),
        }
    }
}

async fn execute(store: Option<Store>, request: Request) -> Result<Update, StoreError> {
    let attached = || store.clone().ok_or(StoreError::Closed);

    match request {
        Request::Open(path) => open_and_load(path).await,
        Request::GetTemplate => Ok(Update::Template(attached()?.get_template().await?)),
        Request::PutTemplate(habits) => {
            attached()?.put_template(habits.clone()).await?;
            Ok(Update::TemplateSaved(habits))
        }
        Request::GetDayRecord(date) => {
            let habits = attached()?.get_day_record(date).await?;
            Ok(Update::DayRecord { date, habits })
        }
        Request::PutDayRecord { date, habits } => {
            attached()?.put_day_record(date, habits.clone()).await?;
            Ok(Update::DayRecordSaved { date, habits })
        }
        Request::GetAllSummaries => Ok(Update::Summaries(attached()?.get_all_summaries().await?)),
        Request::ApplyToToday(template) => {
            let date = DayKey::today();
            let habits = attached()?.apply_template(template, date).await?;
            Ok(Update::AppliedToToday { date, habits })
        }
    }
}

async fn open_and_load(path: Option<PathBuf>) -> Result<Update, StoreError> {
    let store = Store::open(path).await?;

    let loaded = async {
        // Today first: its backfill writes a summary the scan must include.
        let today = DayKey::today();
        let habits = store.get_day_record(today).await?;
        let summaries = store.get_all_summaries().await?;
        Ok::<_, StoreError>((summaries, today, habits))
    }
    .await;

    match loaded {
        Ok((summaries, today, habits)) => Ok(Update::Ready(Box::new(HandOff {
            store,
            summaries,
            today,
            habits,
        }))),
        Err(error) => {
            if let Err(close_error) = store.close().await {
                warn!(error = %close_error, "failed to close store after load error");
            }
            Err(error)
        }
    }
}
