// Presentation layer - HTTP routes over the application services
pub mod app_state;
pub mod dashboard;
pub mod handlers;

use crate::presentation::app_state::AppState;
use crate::presentation::dashboard::dashboard;
use crate::presentation::handlers::{
    execute_query, get_chart, get_console, health_check, list_charts, load_chart,
    load_more_chart, next_page, previous_page, reset_chart, select_backend,
};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/healthz", get(health_check))
        .route("/api/charts", get(list_charts))
        .route("/api/charts/:id", get(get_chart))
        .route("/api/charts/:id/load", post(load_chart))
        .route("/api/charts/:id/more", post(load_more_chart))
        .route("/api/charts/:id/reset", post(reset_chart))
        .route("/api/console", get(get_console))
        .route("/api/console/backend", post(select_backend))
        .route("/api/console/execute", post(execute_query))
        .route("/api/console/next", post(next_page))
        .route("/api/console/previous", post(previous_page))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::chart_service::tests::{observations, FakeSource};
    use crate::application::chart_service::ChartService;
    use crate::application::query_service::QueryConsoleService;
    use crate::domain::backend::BackendKind;
    use crate::domain::chart::ChartPresenter;
    use crate::infrastructure::config::{ChartConfig, ConsoleSettings};
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app(source: Arc<FakeSource>) -> Router {
        let charts = vec![ChartConfig {
            id: "stage".to_string(),
            title: "River Stage".to_string(),
            url: "http://backend/ldes".to_string(),
            kind: BackendKind::Ldes,
        }];
        let state = Arc::new(AppState {
            chart_service: ChartService::new(source.clone(), ChartPresenter::default(), charts),
            console_service: QueryConsoleService::new(source, ConsoleSettings::default()),
        });
        router(state)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(body) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(body.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_chart_lifecycle_over_http() {
        let source = FakeSource::with(vec![
            Ok(observations(100, 1_700_000_000)),
            Ok(observations(12, 1_600_000_000)),
        ]);
        let app = app(source.clone());

        let (status, views) = send(&app, Method::GET, "/api/charts", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(views[0]["state"], "not_started");
        assert_eq!(views[0]["affordance"], "initial_load");
        assert!(source.requests().is_empty());

        let (status, view) = send(&app, Method::POST, "/api/charts/stage/more", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(view["error"], "loading has not started yet");

        let (_, view) = send(&app, Method::POST, "/api/charts/stage/load", None).await;
        assert_eq!(view["observations"], 100);
        assert_eq!(view["has_more"], true);
        assert_eq!(view["spec"]["title"]["text"], "River Stage");

        let (_, view) = send(&app, Method::POST, "/api/charts/stage/more", None).await;
        assert_eq!(view["observations"], 112);
        assert_eq!(view["affordance"], "end_of_data");
        assert_eq!(view["action_label"], "End of Records");

        let (_, view) = send(&app, Method::POST, "/api/charts/stage/reset", None).await;
        assert_eq!(view["state"], "not_started");
        assert_eq!(view["observations"], 0);
    }

    #[tokio::test]
    async fn test_unknown_chart_is_404() {
        let app = app(FakeSource::with(vec![]));
        let (status, body) = send(&app, Method::POST, "/api/charts/nope/load", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "unknown chart: nope");
    }

    #[tokio::test]
    async fn test_console_over_http() {
        let source = FakeSource::with(vec![Ok(json!([{ "subject": "s", "time": "t" }]))]);
        let app = app(source.clone());

        let pick = |name: &str| Some(json!({ "backend": name }));
        let (status, _) = send(&app, Method::POST, "/api/console/backend", pick("mongo")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, view) = send(&app, Method::POST, "/api/console/backend", pick("TTL")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["backend"], "TTL");
        assert_eq!(view["table"]["placeholder"], "No results found.");
        assert!(source.requests().is_empty());

        let (_, view) = send(
            &app,
            Method::POST,
            "/api/console/execute",
            Some(json!({ "query": "SELECT ?s WHERE { ?s ?p ?o }" })),
        )
        .await;
        assert_eq!(view["table"]["columns"], json!(["subject", "time"]));
        assert_eq!(view["table"]["rows"], json!([["s", "t"]]));
        assert_eq!(
            source.requests(),
            vec!["http://localhost:3000/virtuoso/ttl/query?query=SELECT ?s WHERE { ?s ?p ?o }&page=1"]
        );
    }

    #[tokio::test]
    async fn test_dashboard_page_and_health() {
        let app = app(FakeSource::with(vec![]));
        let response = app
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"ok");
    }
}
