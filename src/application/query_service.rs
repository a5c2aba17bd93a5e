// Query console service - free-form queries against a selected backend
use crate::application::data_source::DataSource;
use crate::domain::backend::BackendKind;
use crate::domain::query::{QueryConsole, QueryTicket, Table};
use crate::error::{ServiceError, SessionError};
use crate::infrastructure::config::ConsoleSettings;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Serialize)]
pub struct ConsoleView {
    pub backend: BackendKind,
    pub backends: Vec<BackendKind>,
    pub query: String,
    pub page: u32,
    pub loading: bool,
    pub can_previous: bool,
    pub can_next: bool,
    pub error: Option<String>,
    pub table: Table,
}

#[derive(Clone)]
pub struct QueryConsoleService {
    source: Arc<dyn DataSource>,
    settings: ConsoleSettings,
    console: Arc<Mutex<QueryConsole>>,
}

impl QueryConsoleService {
    pub fn new(source: Arc<dyn DataSource>, settings: ConsoleSettings) -> Self {
        let backend = settings.initial_backend();
        if backend != settings.default_backend {
            tracing::warn!(
                default = %settings.default_backend,
                using = %backend,
                "default console backend is not configured"
            );
        }
        let console = QueryConsole::new(backend, settings.template(backend), settings.page_size);
        Self {
            source,
            settings,
            console: Arc::new(Mutex::new(console)),
        }
    }

    pub async fn view(&self) -> ConsoleView {
        let console = self.console.lock().await;
        self.render(&console)
    }

    /// Switches backend and loads its default query text; does not run it.
    pub async fn select_backend(&self, backend: BackendKind) -> Result<ConsoleView, ServiceError> {
        if self.settings.base_url(backend).is_none() {
            return Err(ServiceError::BackendNotConfigured(backend.to_string()));
        }
        let mut console = self.console.lock().await;
        console.select_backend(backend, self.settings.template(backend));
        tracing::debug!(%backend, "console backend selected");
        Ok(self.render(&console))
    }

    /// Runs `query` (or the current text when `None`) at `page`, default 1.
    pub async fn execute(&self, query: Option<String>, page: Option<u32>) -> Result<ConsoleView, ServiceError> {
        self.run(|console| {
            if let Some(query) = query {
                console.set_query(query);
            }
            console.execute(page.unwrap_or(1))
        })
        .await
    }

    pub async fn next(&self) -> Result<ConsoleView, ServiceError> {
        self.run(QueryConsole::next).await
    }

    pub async fn previous(&self) -> Result<ConsoleView, ServiceError> {
        self.run(QueryConsole::previous).await
    }

    async fn run<F>(&self, begin: F) -> Result<ConsoleView, ServiceError>
    where
        F: FnOnce(&mut QueryConsole) -> Result<QueryTicket, SessionError>,
    {
        let (ticket, base_url, query) = {
            let mut console = self.console.lock().await;
            let backend = console.backend();
            let base_url = self
                .settings
                .base_url(backend)
                .ok_or_else(|| ServiceError::BackendNotConfigured(backend.to_string()))?
                .to_string();
            let ticket = begin(&mut *console)?;
            (ticket, base_url, console.query().to_string())
        };

        tracing::info!(backend = %ticket.backend, page = ticket.page, "running console query");
        let result = self.source.run_query(&base_url, &query, ticket.page).await;
        if let Err(err) = &result {
            tracing::warn!(backend = %ticket.backend, page = ticket.page, error = %err, "console query failed");
        }

        let mut console = self.console.lock().await;
        if !console.finish(ticket, result) {
            tracing::debug!(backend = %ticket.backend, "discarding stale query response");
        }
        Ok(self.render(&console))
    }

    fn render(&self, console: &QueryConsole) -> ConsoleView {
        ConsoleView {
            backend: console.backend(),
            backends: self.settings.backends.iter().map(|b| b.kind).collect(),
            query: console.query().to_string(),
            page: console.page(),
            loading: console.loading(),
            can_previous: console.can_previous(),
            can_next: console.can_next(),
            error: console.error().map(str::to_string),
            table: console.results().table(),
        }
    }
}
