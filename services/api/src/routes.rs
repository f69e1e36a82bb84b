use crate::error::AppError;
use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use funnel_engine::census::RateReferenceRow;
use funnel_engine::AnalyticsSnapshot;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Deserialize)]
pub(crate) struct FunnelReportRequest {
    /// Raw applications export, CSV text.
    pub(crate) applications_csv: String,
    /// Raw census snapshot, CSV text. Optional: without it the report
    /// carries funnel metrics only.
    #[serde(default)]
    pub(crate) census_csv: String,
    /// Bypass the snapshot cache and recompute unconditionally.
    #[serde(default)]
    pub(crate) force_refresh: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct FunnelReportResponse {
    pub(crate) cache_hit: bool,
    pub(crate) snapshot: AnalyticsSnapshot,
}

pub(crate) fn api_router() -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/funnel/report", post(funnel_report_endpoint))
        .route("/api/v1/rates", get(rates_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn funnel_report_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<FunnelReportRequest>,
) -> Result<Json<FunnelReportResponse>, AppError> {
    let FunnelReportRequest {
        applications_csv,
        census_csv,
        force_refresh,
    } = payload;

    let outcome = state.engine.snapshot(
        applications_csv.as_bytes(),
        census_csv.as_bytes(),
        force_refresh,
    )?;

    Ok(Json(FunnelReportResponse {
        cache_hit: outcome.cache_hit,
        snapshot: (*outcome.snapshot).clone(),
    }))
}

pub(crate) async fn rates_endpoint(
    Extension(state): Extension<AppState>,
) -> Json<Vec<RateReferenceRow>> {
    Json(state.engine.rates().reference_rows())
}

#[cfg(test)]
mod tests {
    use super::*;
    use funnel_engine::config::EngineConfig;
    use funnel_engine::AnalyticsEngine;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    fn state() -> AppState {
        let handle = PrometheusBuilder::new()
            .build_recorder()
            .handle();
        AppState {
            readiness: Arc::new(AtomicBool::new(true)),
            metrics: Arc::new(handle),
            engine: Arc::new(AnalyticsEngine::new(EngineConfig::default())),
        }
    }

    const APPS_CSV: &str = "\
Round,Program,School Applied For,Degree Of Interest,Bin,Decision,App Tags,Date of Enrollment
2026 Spring Graduate,Data Science,SOB,MS,Admit,Admit/Matric,Corporate,2026-01-10
";

    #[tokio::test]
    async fn funnel_report_endpoint_returns_snapshot() {
        let request = FunnelReportRequest {
            applications_csv: APPS_CSV.to_string(),
            census_csv: String::new(),
            force_refresh: false,
        };

        let Json(body) = funnel_report_endpoint(Extension(state()), Json(request))
            .await
            .expect("report builds");

        assert!(!body.cache_hit);
        let current = body
            .snapshot
            .funnels
            .get(&2026)
            .expect("current year present");
        assert_eq!(current.applications, 1);
        assert_eq!(current.enrollments, 1);
    }

    #[tokio::test]
    async fn repeated_requests_are_served_from_cache() {
        let state = state();
        let request = || FunnelReportRequest {
            applications_csv: APPS_CSV.to_string(),
            census_csv: String::new(),
            force_refresh: false,
        };

        let Json(first) = funnel_report_endpoint(Extension(state.clone()), Json(request()))
            .await
            .expect("first report");
        assert!(!first.cache_hit);

        let Json(second) = funnel_report_endpoint(Extension(state.clone()), Json(request()))
            .await
            .expect("second report");
        assert!(second.cache_hit);

        let Json(forced) = funnel_report_endpoint(
            Extension(state),
            Json(FunnelReportRequest {
                force_refresh: true,
                ..request()
            }),
        )
        .await
        .expect("forced report");
        assert!(!forced.cache_hit);
    }

    #[tokio::test]
    async fn rates_endpoint_lists_the_published_rate_card() {
        let Json(rows) = rates_endpoint(Extension(state())).await;
        assert!(rows
            .iter()
            .any(|row| row.category == "Retail" && row.degree_type == "Masters"));
    }

    mod routing {
        use super::*;
        use axum::body::Body;
        use axum::http::Request;
        use tower::ServiceExt;

        fn app() -> Router {
            api_router().layer(Extension(state()))
        }

        #[tokio::test]
        async fn health_route_responds_ok() {
            let response = app()
                .oneshot(Request::get("/health").body(Body::empty()).unwrap())
                .await
                .expect("router responds");
            assert_eq!(response.status(), StatusCode::OK);
        }

        #[tokio::test]
        async fn report_route_accepts_csv_payloads() {
            let payload = json!({ "applications_csv": APPS_CSV });
            let response = app()
                .oneshot(
                    Request::post("/api/v1/funnel/report")
                        .header(header::CONTENT_TYPE, "application/json")
                        .body(Body::from(serde_json::to_vec(&payload).unwrap()))
                        .unwrap(),
                )
                .await
                .expect("router responds");
            assert_eq!(response.status(), StatusCode::OK);
        }

        #[tokio::test]
        async fn report_route_rejects_missing_body_fields() {
            let response = app()
                .oneshot(
                    Request::post("/api/v1/funnel/report")
                        .header(header::CONTENT_TYPE, "application/json")
                        .body(Body::from("{}"))
                        .unwrap(),
                )
                .await
                .expect("router responds");
            assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        }
    }
}
