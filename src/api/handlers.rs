//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::info;

use super::AppState;
use super::types::{ErrorResponse, ForecastRequest, ForecastResponse};
use crate::forecast::{ForecastConfig, Sample};
use crate::io::import::{check_output, parse_timestamp};
use crate::metrics::ForecastReport;

/// Returns the configuration the engine was built from.
///
/// `GET /config` → 200 + `ForecastConfig` JSON
pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<ForecastConfig> {
    Json(state.config.clone())
}

fn bad_request(error: String) -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error }))
}

/// Forecasts every `(label, timestamp)` pair in the request body.
///
/// `POST /forecast` → 200 + `ForecastResponse` JSON
/// mismatched array lengths, an unparseable timestamp or a negative label
/// → 400 + `ErrorResponse`
pub async fn post_forecast(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ForecastRequest>,
) -> impl IntoResponse {
    if request.labels.len() != request.timestamps.len() {
        return Err(bad_request(format!(
            "labels ({}) and timestamps ({}) must have the same length",
            request.labels.len(),
            request.timestamps.len()
        )));
    }

    let reference = state.config.civil_reference_longitude();
    let mut samples = Vec::with_capacity(request.labels.len());
    for (i, (raw, &label)) in request.timestamps.iter().zip(&request.labels).enumerate() {
        let Some(ts) = parse_timestamp(raw, reference) else {
            return Err(bad_request(format!(
                "timestamps[{i}]: unrecognised timestamp \"{raw}\""
            )));
        };
        let label = match check_output(label) {
            Ok(label) => label,
            Err(e) => return Err(bad_request(format!("labels[{i}]: {e}"))),
        };
        samples.push(Sample::new(ts, label));
    }

    let forecasts = state.engine.run(&samples);
    let report = ForecastReport::evaluate(&forecasts, state.engine.horizon());
    info!(
        samples = forecasts.len(),
        failed = report.failed,
        "served forecast request"
    );
    Ok(Json(ForecastResponse::new(&forecasts, report)))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, header};
    use tower::util::ServiceExt;

    use super::*;
    use crate::api::router;

    fn make_test_state() -> Arc<AppState> {
        Arc::new(AppState::new(ForecastConfig::default()).unwrap())
    }

    fn post(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/forecast")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    async fn json_body(resp: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn config_returns_200() {
        let app = router(make_test_state());

        let req = Request::builder()
            .uri("/config")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = json_body(resp).await;
        assert_eq!(json["time_delta_minutes"], 15);
        assert_eq!(json["resolver"], "spa");
        assert_eq!(json["location"]["latitude"], 37.42808);
    }

    #[tokio::test]
    async fn forecast_returns_one_entry_per_sample() {
        let app = router(make_test_state());
        let body = r#"{
            "labels": [500.0, 0.0],
            "timestamps": ["2024-06-21T12:00:00-07:00", "2024-06-21 12:15:00"]
        }"#;
        let resp = app.oneshot(post(body)).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = json_body(resp).await;
        let predictions = json["predictions"].as_array().unwrap();
        assert_eq!(predictions.len(), 2);
        assert!(predictions[0].as_f64().unwrap() > 0.0);
        assert!(json["errors"][0].is_null());
        assert_eq!(json["report"]["evaluated"], 1);
    }

    #[tokio::test]
    async fn forecast_length_mismatch_returns_400() {
        let app = router(make_test_state());
        let body = r#"{"labels": [1.0, 2.0], "timestamps": ["2024-06-21T12:00:00Z"]}"#;
        let resp = app.oneshot(post(body)).await.unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = json_body(resp).await;
        assert!(json["error"].as_str().unwrap().contains("same length"));
    }

    #[tokio::test]
    async fn forecast_negative_label_returns_400() {
        let app = router(make_test_state());
        let body = r#"{
            "labels": [500.0, -1.0],
            "timestamps": ["2024-06-21 12:00:00", "2024-06-21 12:15:00"]
        }"#;
        let resp = app.oneshot(post(body)).await.unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = json_body(resp).await;
        let error = json["error"].as_str().unwrap();
        assert!(error.contains("labels[1]"), "{error}");
        assert!(error.contains("non-negative"), "{error}");
    }

    #[tokio::test]
    async fn forecast_bad_timestamp_returns_400() {
        let app = router(make_test_state());
        let body = r#"{"labels": [1.0], "timestamps": ["tomorrow"]}"#;
        let resp = app.oneshot(post(body)).await.unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = json_body(resp).await;
        assert!(json["error"].as_str().unwrap().contains("timestamps[0]"));
    }
}
