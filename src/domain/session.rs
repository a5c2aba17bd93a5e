// Load session state machine for one chart card
use crate::domain::backend::{BackendAdapter, ExtractedPage};
use crate::domain::observation::{merge, Observation};
use crate::error::{FetchError, SessionError};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    NotStarted,
    Loading,
    Idle,
    Error,
}

/// Which control the card offers the user in its current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Affordance {
    InitialLoad,
    Fetching,
    LoadMore,
    EndOfData,
}

impl Affordance {
    pub fn label(&self, adapter: &BackendAdapter) -> &'static str {
        match self {
            Affordance::InitialLoad => "Initial Load",
            Affordance::Fetching => "Fetching...",
            Affordance::LoadMore => adapter.load_more_label,
            Affordance::EndOfData => adapter.end_label,
        }
    }

    pub fn enabled(&self) -> bool {
        matches!(self, Affordance::InitialLoad | Affordance::LoadMore)
    }
}

/// Issued when a fetch starts; the result is only applied if the ticket is
/// still current when it comes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    pub generation: u64,
    pub page: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// The session was reset (or moved on) while the request was in flight.
    Stale,
}

#[derive(Debug, Clone)]
pub struct LoadSession {
    adapter: &'static BackendAdapter,
    state: LoadState,
    page: u32,
    has_more: bool,
    accumulated: Vec<Observation>,
    error: Option<String>,
    generation: u64,
}

impl LoadSession {
    pub fn new(adapter: &'static BackendAdapter) -> Self {
        Self {
            adapter,
            state: LoadState::NotStarted,
            page: 1,
            has_more: true,
            accumulated: Vec::new(),
            error: None,
            generation: 0,
        }
    }

    pub fn adapter(&self) -> &'static BackendAdapter {
        self.adapter
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn has_started(&self) -> bool {
        self.state != LoadState::NotStarted
    }

    pub fn observations(&self) -> &[Observation] {
        &self.accumulated
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// First fetch of a card, or a retry after the first page failed.
    pub fn start_initial_load(&mut self) -> Result<LoadTicket, SessionError> {
        match self.state {
            LoadState::NotStarted => Ok(self.begin(1)),
            LoadState::Error => Ok(self.begin(self.page)),
            LoadState::Loading => Err(SessionError::Busy),
            LoadState::Idle => Err(SessionError::AlreadyStarted),
        }
    }

    /// Next page, or a retry of the page that failed.
    pub fn load_more(&mut self) -> Result<LoadTicket, SessionError> {
        match self.state {
            LoadState::NotStarted => Err(SessionError::NotStarted),
            LoadState::Loading => Err(SessionError::Busy),
            LoadState::Error => Ok(self.begin(self.page)),
            LoadState::Idle if !self.has_more => Err(SessionError::Exhausted),
            LoadState::Idle => Ok(self.begin(self.page + 1)),
        }
    }

    fn begin(&mut self, page: u32) -> LoadTicket {
        self.page = page;
        self.state = LoadState::Loading;
        LoadTicket {
            generation: self.generation,
            page,
        }
    }

    fn is_current(&self, ticket: LoadTicket) -> bool {
        self.state == LoadState::Loading
            && ticket.generation == self.generation
            && ticket.page == self.page
    }

    pub fn complete(&mut self, ticket: LoadTicket, page: ExtractedPage) -> Outcome {
        if !self.is_current(ticket) {
            return Outcome::Stale;
        }
        self.has_more = self.adapter.has_more(page.page_len);
        self.accumulated = merge(std::mem::take(&mut self.accumulated), page.records);
        self.state = LoadState::Idle;
        self.error = None;
        Outcome::Applied
    }

    /// Keeps the accumulated data and `has_more` untouched.
    pub fn fail(&mut self, ticket: LoadTicket, err: &FetchError) -> Outcome {
        if !self.is_current(ticket) {
            return Outcome::Stale;
        }
        self.state = LoadState::Error;
        self.error = Some(format!("Failed to load {} data: {}", self.adapter.kind, err));
        Outcome::Applied
    }

    pub fn reset(&mut self) {
        self.state = LoadState::NotStarted;
        self.page = 1;
        self.has_more = true;
        self.accumulated.clear();
        self.error = None;
        self.generation += 1;
    }

    pub fn affordance(&self) -> Affordance {
        match self.state {
            LoadState::NotStarted => Affordance::InitialLoad,
            LoadState::Loading => Affordance::Fetching,
            LoadState::Idle if self.has_more => Affordance::LoadMore,
            LoadState::Idle => Affordance::EndOfData,
            LoadState::Error if self.page == 1 => Affordance::InitialLoad,
            LoadState::Error => Affordance::LoadMore,
        }
    }
}
