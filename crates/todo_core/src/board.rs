//! Presentation state container for the task list screen.
//!
//! # Responsibility
//! - Hold the list screen's state as one explicit value.
//! - Apply events through a pure reducer.
//! - Keep the visible list in step with tasks and view parameters.
//!
//! # Invariants
//! - `visible` always equals the query engine applied to `tasks` and `query`,
//!   whatever order the parameters were changed in.
//! - Reducing never touches storage; intents that write go through
//!   `TaskService` and come back as `TasksLoaded`.

use crate::model::task::Task;
use crate::query::engine::apply_filters_and_sort_at;
use crate::query::params::{TaskFilter, TaskQuery, TaskSort};
use crate::repo::live::TaskSubscription;
use chrono::{DateTime, Local, TimeZone};

/// Snapshot of the list screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardState {
    /// Latest full list from the live query.
    pub tasks: Vec<Task>,
    /// `tasks` after search, filter and sort.
    pub visible: Vec<Task>,
    pub query: TaskQuery,
    pub is_loading: bool,
    pub error: Option<String>,
    /// Transient confirmation or error text (snackbar).
    pub message: Option<String>,
    pub is_grid_view: bool,
}

impl Default for BoardState {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            visible: Vec::new(),
            query: TaskQuery::default(),
            is_loading: true,
            error: None,
            message: None,
            is_grid_view: true,
        }
    }
}

impl BoardState {
    /// Completed and total counts over the full list.
    pub fn progress(&self) -> (usize, usize) {
        let completed = self.tasks.iter().filter(|task| task.is_completed).count();
        (completed, self.tasks.len())
    }
}

/// Events accepted by [`reduce`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardEvent {
    TasksLoaded(Vec<Task>),
    LoadFailed(String),
    SearchChanged(String),
    FilterChanged(TaskFilter),
    SortChanged(TaskSort),
    ClearFilters,
    ToggleViewMode,
    ShowMessage(String),
    ShowError(String),
    ClearMessage,
}

/// Pure reducer evaluated against `now`.
pub fn reduce<Tz: TimeZone>(
    mut state: BoardState,
    event: BoardEvent,
    now: &DateTime<Tz>,
) -> BoardState {
    let mut recompute = false;
    match event {
        BoardEvent::TasksLoaded(tasks) => {
            state.tasks = tasks;
            state.is_loading = false;
            state.error = None;
            recompute = true;
        }
        BoardEvent::LoadFailed(message) => {
            state.is_loading = false;
            state.error = Some(message);
        }
        BoardEvent::SearchChanged(search) => {
            state.query.search = search;
            recompute = true;
        }
        BoardEvent::FilterChanged(filter) => {
            state.query.filter = filter;
            recompute = true;
        }
        BoardEvent::SortChanged(sort) => {
            state.query.sort = sort;
            recompute = true;
        }
        BoardEvent::ClearFilters => {
            state.query.search.clear();
            state.query.filter = TaskFilter::All;
            recompute = true;
        }
        BoardEvent::ToggleViewMode => state.is_grid_view = !state.is_grid_view,
        BoardEvent::ShowMessage(message) => state.message = Some(message),
        BoardEvent::ShowError(message) => {
            state.error = Some(message.clone());
            state.message = Some(message);
        }
        BoardEvent::ClearMessage => state.message = None,
    }

    if recompute {
        state.visible = apply_filters_and_sort_at(&state.tasks, &state.query, now);
    }
    state
}

/// Owned state container driven by events.
#[derive(Debug, Default)]
pub struct TaskBoard {
    state: BoardState,
}

impl TaskBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    /// Applies `event` using the local wall clock.
    pub fn dispatch(&mut self, event: BoardEvent) {
        self.dispatch_at(event, &Local::now());
    }

    pub fn dispatch_at<Tz: TimeZone>(&mut self, event: BoardEvent, now: &DateTime<Tz>) {
        let current = std::mem::take(&mut self.state);
        self.state = reduce(current, event, now);
    }

    /// Applies the newest pending snapshot from `subscription`, if any.
    ///
    /// Older queued snapshots are skipped. Returns whether state changed.
    pub fn pump(&mut self, subscription: &TaskSubscription) -> bool {
        match subscription.latest() {
            Some(tasks) => {
                self.dispatch(BoardEvent::TasksLoaded(tasks));
                true
            }
            None => false,
        }
    }
}
