//! Submission and listing state shared by every screen
//!
//! A [`SubmitGate`] tracks one form's lifecycle
//! (`Idle -> Submitting -> Succeeded | Failed`) and admits a single request
//! at a time. A [`Listing`] tracks one fetched collection
//! (`NotLoaded -> Loading -> Loaded | Failed`).
//!
//! Both keep their state behind a short, synchronous lock so a screen can be
//! shared by reference between concurrently polled futures.

use crate::error::{ScreenError, ScreenResult};
use ag_core::ValidationErrors;
use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Info,
    Destructive,
}

/// A transient message for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub tone: Tone,
}

impl Notice {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            tone: Tone::Info,
        }
    }

    pub fn destructive(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            tone: Tone::Destructive,
        }
    }

    pub fn is_destructive(&self) -> bool {
        self.tone == Tone::Destructive
    }
}

#[derive(Debug)]
struct GateState {
    phase: Phase,
    errors: ValidationErrors,
    notice: Option<Notice>,
}

/// Single-flight lifecycle of one form
#[derive(Debug)]
pub struct SubmitGate {
    name: &'static str,
    state: Mutex<GateState>,
}

impl SubmitGate {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: Mutex::new(GateState {
                phase: Phase::Idle,
                errors: ValidationErrors::new(),
                notice: None,
            }),
        }
    }

    pub fn phase(&self) -> Phase {
        lock(&self.state).phase
    }

    pub fn is_submitting(&self) -> bool {
        self.phase() == Phase::Submitting
    }

    /// Field errors from the last rejected submission
    pub fn errors(&self) -> ValidationErrors {
        lock(&self.state).errors.clone()
    }

    pub fn notice(&self) -> Option<Notice> {
        lock(&self.state).notice.clone()
    }

    /// Enter `Submitting`, or fail with `Busy` if a request is in flight
    pub fn try_begin(&self) -> ScreenResult<Flight<'_>> {
        let mut state = lock(&self.state);
        if state.phase == Phase::Submitting {
            return Err(ScreenError::Busy);
        }
        state.phase = Phase::Submitting;
        state.errors = ValidationErrors::new();
        info!("{}: submitting", self.name);
        Ok(Flight {
            gate: self,
            settled: false,
        })
    }

    /// Record a local validation failure and return the matching error.
    ///
    /// While a request is in flight nothing is recorded and `Busy` is
    /// returned instead.
    pub fn reject(&self, errors: ValidationErrors, notice: Option<Notice>) -> ScreenError {
        let mut state = lock(&self.state);
        if state.phase == Phase::Submitting {
            return ScreenError::Busy;
        }
        state.phase = Phase::Idle;
        state.errors = errors.clone();
        if notice.is_some() {
            state.notice = notice;
        }
        ScreenError::Invalid(errors)
    }

    /// A user edit returns a settled form to `Idle`
    pub fn edited(&self) {
        let mut state = lock(&self.state);
        if matches!(state.phase, Phase::Succeeded | Phase::Failed) {
            state.phase = Phase::Idle;
        }
    }

    /// Show a notice without changing the phase
    pub fn inform(&self, notice: Notice) {
        lock(&self.state).notice = Some(notice);
    }

    pub fn dismiss(&self) {
        lock(&self.state).notice = None;
    }

    fn settle(&self, phase: Phase, notice: Option<Notice>, errors: ValidationErrors) {
        let mut state = lock(&self.state);
        state.phase = phase;
        state.errors = errors;
        if notice.is_some() {
            state.notice = notice;
        }
        info!("{}: {:?}", self.name, phase);
    }
}

/// An admitted submission; dropping it unsettled returns the gate to `Idle`
#[must_use = "a flight resets the gate when dropped"]
pub struct Flight<'a> {
    gate: &'a SubmitGate,
    settled: bool,
}

impl Flight<'_> {
    pub fn succeed(mut self, notice: Notice) {
        self.settled = true;
        self.gate
            .settle(Phase::Succeeded, Some(notice), ValidationErrors::new());
    }

    pub fn fail(mut self, notice: Notice) {
        self.settled = true;
        self.gate
            .settle(Phase::Failed, Some(notice), ValidationErrors::new());
    }

    /// Fail and attach field errors reported by the backend
    pub fn fail_with(mut self, notice: Notice, errors: ValidationErrors) {
        self.settled = true;
        self.gate.settle(Phase::Failed, Some(notice), errors);
    }
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            let mut state = lock(&self.gate.state);
            if state.phase == Phase::Submitting {
                state.phase = Phase::Idle;
                info!("{}: submission dropped", self.gate.name);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "lowercase")]
pub enum ListingState<T> {
    #[serde(rename = "not_loaded")]
    NotLoaded,
    Loading,
    Loaded(Vec<T>),
    Failed(Notice),
}

/// A fetched collection with single-flight reloads
#[derive(Debug)]
pub struct Listing<T> {
    name: &'static str,
    state: Mutex<ListingState<T>>,
}

impl<T: Clone> Listing<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: Mutex::new(ListingState::NotLoaded),
        }
    }

    pub fn state(&self) -> ListingState<T> {
        lock(&self.state).clone()
    }

    pub fn is_loading(&self) -> bool {
        matches!(*lock(&self.state), ListingState::Loading)
    }

    /// Items when loaded
    pub fn items(&self) -> Option<Vec<T>> {
        match &*lock(&self.state) {
            ListingState::Loaded(items) => Some(items.clone()),
            _ => None,
        }
    }

    /// True exactly when loaded with zero items
    pub fn is_empty_loaded(&self) -> bool {
        matches!(&*lock(&self.state), ListingState::Loaded(items) if items.is_empty())
    }

    /// Enter `Loading`, or fail with `Busy` if a load is in flight
    pub fn begin(&self) -> ScreenResult<Load<'_, T>> {
        let mut state = lock(&self.state);
        if matches!(*state, ListingState::Loading) {
            return Err(ScreenError::Busy);
        }
        let previous = std::mem::replace(&mut *state, ListingState::Loading);
        info!("{}: loading", self.name);
        Ok(Load {
            listing: self,
            previous: Some(previous),
        })
    }

    /// Append to a loaded collection; other states are left alone
    pub fn push(&self, item: T) {
        if let ListingState::Loaded(items) = &mut *lock(&self.state) {
            items.push(item);
        }
    }

    fn set(&self, next: ListingState<T>) {
        *lock(&self.state) = next;
    }
}

/// An admitted load; dropping it unsettled restores the previous state
#[must_use = "a load restores the previous state when dropped"]
pub struct Load<'a, T: Clone> {
    listing: &'a Listing<T>,
    previous: Option<ListingState<T>>,
}

impl<T: Clone> Load<'_, T> {
    pub fn finish(mut self, items: Vec<T>) {
        self.previous = None;
        info!("{}: loaded {} item(s)", self.listing.name, items.len());
        self.listing.set(ListingState::Loaded(items));
    }

    pub fn fail(mut self, notice: Notice) {
        self.previous = None;
        info!("{}: load failed", self.listing.name);
        self.listing.set(ListingState::Failed(notice));
    }
}

impl<T: Clone> Drop for Load<'_, T> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            self.listing.set(previous);
        }
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
