use super::{Dispatcher, Request, Store, Update};
use crate::day::DayKey;
use crate::db::StoreError;
use crate::habit::{self, DailySummary, Habit};
use crate::record::aggregate;
use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::sync::mpsc::{self, UnboundedReceiver};

#[derive(Debug)]
pub enum Phase {
    Loading,
    /// The store could not be opened. Terminal.
    Failed(StoreError),
    Ready,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayView {
    pub date: DayKey,
    pub habits: Vec<Habit>,
}

#[derive(Debug)]
pub struct ErrorEntry {
    pub action: String,
    pub error: StoreError,
}

/// Errors shown to the user until dismissed.
#[derive(Debug, Default)]
pub struct ErrorList {
    entries: Vec<ErrorEntry>,
}

impl ErrorList {
    pub fn add(&mut self, action: &str, error: StoreError) {
        self.entries.push(ErrorEntry {
            action: action.to_string(),
            error,
        });
    }

    pub fn dismiss(&mut self, index: usize) -> Option<ErrorEntry> {
        (index < self.entries.len()).then(|| self.entries.remove(index))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// State a front end renders, driven by [`Update`] messages.
///
/// User actions dispatch requests and return immediately. Displayed state
/// only changes when the matching update arrives, so a failed action leaves
/// what was on screen untouched and adds an entry to [`App::errors`].
pub struct App {
    dispatcher: Dispatcher,
    updates: UnboundedReceiver<Update>,
    phase: Phase,
    summaries: BTreeMap<DayKey, DailySummary>,
    record: Option<DayView>,
    habit_screen: Option<Vec<Habit>>,
    errors: ErrorList,
}

impl App {
    pub fn new() -> Self {
        let (sender, updates) = mpsc::unbounded_channel();

        Self {
            dispatcher: Dispatcher::new(sender),
            updates,
            phase: Phase::Loading,
            summaries: BTreeMap::new(),
            record: None,
            habit_screen: None,
            errors: ErrorList::default(),
        }
    }

    pub fn start(&mut self, path: Option<PathBuf>) {
        self.phase = Phase::Loading;
        self.dispatcher.dispatch(Request::Open(path));
    }

    pub fn handle(&mut self, update: Update) {
        match update {
            Update::Ready(hand_off) => {
                let hand_off = *hand_off;
                self.dispatcher.attach(hand_off.store);
                self.summaries = hand_off.summaries;
                self.record = Some(DayView {
                    date: hand_off.today,
                    habits: hand_off.habits,
                });
                self.phase = Phase::Ready;
            }
            Update::SplashFailed(error) => {
                self.phase = Phase::Failed(error);
            }
            Update::Template(habits) => {
                self.habit_screen = Some(habits);
            }
            Update::TemplateSaved(habits) => {
                if let Some(screen) = self.habit_screen.as_mut() {
                    *screen = habits;
                }
            }
            Update::DayRecord { date, habits } => {
                self.summaries.insert(date, aggregate(&habits));
                self.record = Some(DayView { date, habits });
            }
            Update::DayRecordSaved { date, habits }
            | Update::AppliedToToday { date, habits } => {
                self.accept_day(date, habits);
            }
            Update::Summaries(summaries) => {
                self.summaries = summaries;
            }
            Update::Failed { action, error } => {
                self.errors.add(action, error);
            }
        }
    }

    fn accept_day(&mut self, date: DayKey, habits: Vec<Habit>) {
        self.summaries.insert(date, aggregate(&habits));
        if let Some(record) = self.record.as_mut().filter(|record| record.date == date) {
            record.habits = habits;
        }
    }

    /// Handles updates until no request is in flight, including requests
    /// issued while handling.
    pub async fn settle(&mut self) {
        loop {
            self.dispatcher.drain().await;
            while let Ok(update) = self.updates.try_recv() {
                self.handle(update);
            }
            if self.dispatcher.is_idle() {
                break;
            }
        }
    }

    pub fn select_day(&mut self, date: DayKey) {
        self.dispatcher.dispatch(Request::GetDayRecord(date));
    }

    /// Marks a habit of the displayed day done or not done. Returns `false`
    /// when the displayed day has no habit with that id.
    pub fn set_done(&mut self, id: i64, done: bool, now: DateTime<Local>) -> bool {
        let Some(record) = self.record.as_ref() else {
            return false;
        };
        if !record.habits.iter().any(|habit| habit.id == id) {
            return false;
        }

        let habits = record
            .habits
            .iter()
            .cloned()
            .map(|mut habit| {
                if habit.id == id {
                    habit.completed_at = if done {
                        habit.completed_at.or(Some(now))
                    } else {
                        None
                    };
                }
                habit
            })
            .collect();
        let date = record.date;

        self.dispatcher
            .dispatch(Request::PutDayRecord { date, habits });
        true
    }

    pub fn open_habit_screen(&mut self) {
        self.dispatcher.dispatch(Request::GetTemplate);
    }

    pub fn close_habit_screen(&mut self) {
        self.habit_screen = None;
    }

    pub fn add_habit(&mut self, content: &str, now: DateTime<Local>) -> bool {
        self.edit_template(|template| Some(habit::add_habit(template, content, now)))
    }

    pub fn edit_habit(&mut self, id: i64, content: &str) -> bool {
        self.edit_template(|template| habit::edit_habit(template, id, content))
    }

    pub fn remove_habit(&mut self, id: i64, now: DateTime<Local>) -> bool {
        self.edit_template(|template| habit::remove_habit(template, id, now))
    }

    fn edit_template<F>(&mut self, edit: F) -> bool
    where
        F: FnOnce(&[Habit]) -> Option<Vec<Habit>>,
    {
        match self.habit_screen.as_deref().and_then(edit) {
            Some(template) => {
                self.dispatcher.dispatch(Request::PutTemplate(template));
                true
            }
            None => false,
        }
    }

    /// Merges the template shown on the habit screen into today's record.
    pub fn apply_to_today(&mut self) -> bool {
        match self.habit_screen.clone() {
            Some(template) => {
                self.dispatcher.dispatch(Request::ApplyToToday(template));
                true
            }
            None => false,
        }
    }

    pub fn refresh_summaries(&mut self) {
        self.dispatcher.dispatch(Request::GetAllSummaries);
    }

    pub fn dismiss_error(&mut self, index: usize) -> Option<ErrorEntry> {
        self.errors.dismiss(index)
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn record(&self) -> Option<&DayView> {
        self.record.as_ref()
    }

    pub fn summaries(&self) -> &BTreeMap<DayKey, DailySummary> {
        &self.summaries
    }

    pub fn habit_screen(&self) -> Option<&[Habit]> {
        self.habit_screen.as_deref()
    }

    pub fn errors(&self) -> &ErrorList {
        &self.errors
    }

    pub fn store(&self) -> Option<&Store> {
        self.dispatcher.store()
    }

    /// Waits for in-flight requests, then closes the store.
    pub async fn shutdown(self) -> Result<(), StoreError> {
        self.dispatcher.shutdown().await
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}
