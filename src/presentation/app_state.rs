// Application state for HTTP handlers
use crate::application::chart_service::ChartService;
use crate::application::query_service::QueryConsoleService;

#[derive(Clone)]
pub struct AppState {
    pub chart_service: ChartService,
    pub console_service: QueryConsoleService,
}
