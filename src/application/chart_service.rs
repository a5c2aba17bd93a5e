// Chart service - owns the chart cards and runs the fetch, merge, transition cycle
use crate::application::data_source::DataSource;
use crate::domain::backend::BackendKind;
use crate::domain::chart::{format_tooltip_value, ChartPresenter, ChartSpec};
use crate::domain::session::{Affordance, LoadSession, LoadState, LoadTicket, Outcome};
use crate::error::{ServiceError, SessionError};
use crate::infrastructure::config::ChartConfig;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// One chart on the dashboard together with its exclusively owned session.
#[derive(Debug)]
struct ChartCard {
    config: ChartConfig,
    session: LoadSession,
}

/// Everything the page needs to draw one card.
#[derive(Debug, Clone, Serialize)]
pub struct ChartView {
    pub id: String,
    pub title: String,
    pub kind: BackendKind,
    pub state: LoadState,
    pub has_started: bool,
    pub page: u32,
    pub has_more: bool,
    pub observations: usize,
    pub count_label: &'static str,
    /// Most recent reading, formatted like the tooltip.
    pub latest: Option<String>,
    pub affordance: Affordance,
    pub action_label: &'static str,
    pub action_enabled: bool,
    pub error: Option<String>,
    pub spec: ChartSpec,
}

#[derive(Debug)]
struct ChartHandle {
    id: String,
    card: Mutex<ChartCard>,
}

#[derive(Clone)]
pub struct ChartService {
    source: Arc<dyn DataSource>,
    presenter: ChartPresenter,
    cards: Arc<Vec<ChartHandle>>,
}

impl ChartService {
    /// Builds one card per configured chart. Nothing is fetched until the user
    /// asks for it.
    pub fn new(source: Arc<dyn DataSource>, presenter: ChartPresenter, charts: Vec<ChartConfig>) -> Self {
        let cards = charts
            .into_iter()
            .map(|config| {
                let session = LoadSession::new(config.kind.adapter());
                ChartHandle {
                    id: config.id.clone(),
                    card: Mutex::new(ChartCard { config, session }),
                }
            })
            .collect();

        Self {
            source,
            presenter,
            cards: Arc::new(cards),
        }
    }

    pub async fn list(&self) -> Vec<ChartView> {
        let mut views = Vec::with_capacity(self.cards.len());
        for handle in self.cards.iter() {
            views.push(self.render(&*handle.card.lock().await));
        }
        views
    }

    pub async fn view(&self, id: &str) -> Result<ChartView, ServiceError> {
        let card = self.find(id)?.card.lock().await;
        Ok(self.render(&card))
    }

    pub async fn start_initial_load(&self, id: &str) -> Result<ChartView, ServiceError> {
        self.load(id, LoadSession::start_initial_load).await
    }

    pub async fn load_more(&self, id: &str) -> Result<ChartView, ServiceError> {
        self.load(id, LoadSession::load_more).await
    }

    pub async fn reset(&self, id: &str) -> Result<ChartView, ServiceError> {
        let mut card = self.find(id)?.card.lock().await;
        card.session.reset();
        tracing::info!(chart = %id, "chart reset");
        Ok(self.render(&card))
    }

    async fn load(
        &self,
        id: &str,
        transition: fn(&mut LoadSession) -> Result<LoadTicket, SessionError>,
    ) -> Result<ChartView, ServiceError> {
        let card = &self.find(id)?.card;

        // The lock is released while the request is in flight; the session's
        // Loading state keeps a second fetch from starting meanwhile.
        let (ticket, url, adapter) = {
            let mut guard = card.lock().await;
            let ticket = transition(&mut guard.session)?;
            (ticket, guard.config.url.clone(), guard.session.adapter())
        };

        tracing::debug!(chart = %id, page = ticket.page, limit = adapter.limit, "fetching page");
        let result = self
            .source
            .fetch_page(&url, ticket.page, adapter.limit)
            .await
            .and_then(|body| adapter.extract(&body));

        let mut guard = card.lock().await;
        let outcome = match result {
            Ok(page) => {
                let (page_len, records) = (page.page_len, page.records.len());
                let outcome = guard.session.complete(ticket, page);
                tracing::info!(
                    chart = %id,
                    page = ticket.page,
                    page_len,
                    records,
                    has_more = guard.session.has_more(),
                    total = guard.session.observations().len(),
                    "page loaded"
                );
                outcome
            }
            Err(err) => {
                tracing::warn!(chart = %id, page = ticket.page, error = %err, "page fetch failed");
                guard.session.fail(ticket, &err)
            }
        };
        if outcome == Outcome::Stale {
            tracing::debug!(chart = %id, page = ticket.page, "discarding stale response");
        }

        Ok(self.render(&guard))
    }

    fn find(&self, id: &str) -> Result<&ChartHandle, ServiceError> {
        self.cards
            .iter()
            .find(|handle| handle.id == id)
            .ok_or_else(|| ServiceError::UnknownChart(id.to_string()))
    }

    fn render(&self, card: &ChartCard) -> ChartView {
        let session = &card.session;
        let adapter = session.adapter();
        let affordance = session.affordance();
        ChartView {
            id: card.config.id.clone(),
            title: card.config.title.clone(),
            kind: card.config.kind,
            state: session.state(),
            has_started: session.has_started(),
            page: session.page(),
            has_more: session.has_more(),
            observations: session.observations().len(),
            count_label: adapter.label,
            latest: session
                .observations()
                .last()
                .and_then(|obs| obs.value)
                .map(|value| format_tooltip_value(value, adapter.precision)),
            affordance,
            action_label: affordance.label(adapter),
            action_enabled: affordance.enabled(),
            error: session.error().map(str::to_string),
            spec: self
                .presenter
                .build_spec(session.observations(), &card.config.title, card.config.kind),
        }
    }
}
