use axum::{
    body::Bytes,
    extract::State,
    routing::post,
    Router,
    Json,
    http::Method,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use crate::{
    AppState,
    error::AppError,
    models::{ChartKind, ChartPoint, ChartRequest, Dataset, RawDataset, StatisticsArtifact},
    services::workbook,
};
use tower_http::cors::{CorsLayer, Any};

pub fn routes() -> Router<Arc<AppState>> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/datasets/analyze", post(analyze_dataset))
        .route("/datasets/charts", post(project_chart))
        .route("/datasets/charts/recommend", post(recommend_chart))
        .route("/sheets/analyze", post(analyze_workbook))
        .layer(cors)
}

#[derive(Debug, Deserialize)]
pub struct ChartPayload {
    pub dataset: RawDataset,
    pub chart: ChartRequest,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendPayload {
    pub dataset: RawDataset,
    pub x_column: String,
    pub y_column: String,
}

#[derive(Debug, Serialize)]
pub struct ChartResponse {
    pub kind: ChartKind,
    pub points: Vec<ChartPoint>,
}

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub kind: ChartKind,
}

#[derive(Debug, Serialize)]
pub struct SheetReport {
    pub name: String,
    pub headers: Vec<String>,
    pub statistics: StatisticsArtifact,
}

pub async fn analyze_dataset(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RawDataset>,
) -> Result<Json<StatisticsArtifact>, AppError> {
    let dataset = Dataset::try_from(payload)?;
    Ok(Json(state.analyzer.analyze(&dataset)))
}

pub async fn project_chart(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChartPayload>,
) -> Result<Json<ChartResponse>, AppError> {
    let dataset = Dataset::try_from(payload.dataset)?;
    let (kind, points) = state.projector.project(&dataset, &payload.chart)?;
    tracing::info!("Projected {:?} chart with {} points", kind, points.len());
    Ok(Json(ChartResponse { kind, points }))
}

pub async fn recommend_chart(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RecommendPayload>,
) -> Result<Json<RecommendResponse>, AppError> {
    let dataset = Dataset::try_from(payload.dataset)?;
    let kind = state
        .projector
        .choose_type(&dataset, &payload.x_column, &payload.y_column)?;
    Ok(Json(RecommendResponse { kind }))
}

pub async fn analyze_workbook(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Vec<SheetReport>>, AppError> {
    if body.is_empty() {
        return Err(AppError::InvalidInput("No file provided".to_string()));
    }

    let start = std::time::Instant::now();
    tracing::info!("Analyzing uploaded workbook, size: {}KB", body.len() / 1024);

    let reports = tokio::task::spawn_blocking(move || {
        workbook::read_workbook(body).map(|sheets| {
            sheets
                .into_iter()
                .map(|sheet| SheetReport {
                    statistics: state.analyzer.analyze(&sheet.dataset),
                    headers: sheet.dataset.headers().to_vec(),
                    name: sheet.name,
                })
                .collect::<Vec<_>>()
        })
    })
    .await
    .map_err(|e| AppError::Internal(format!("Workbook analysis task failed: {}", e)))??;

    if reports.is_empty() {
        tracing::error!("No valid data found in uploaded workbook");
        return Err(AppError::FileProcessingError("No valid data found in Excel file".to_string()));
    }

    tracing::info!("Analyzed {} sheets in {:?}", reports.len(), start.elapsed());
    Ok(Json(reports))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::services::charts::ChartConfig;
    use serde_json::json;

    fn state() -> Arc<AppState> {
        Arc::new(AppState::new(Config {
            bind_addr: ([127, 0, 0, 1], 0).into(),
            max_upload_bytes: 1024,
            charts: ChartConfig::default(),
        }))
    }

    fn payload<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Json<T> {
        Json(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn analyze_dataset_returns_profiles_and_summary() {
        let body = payload(json!({
            "headers": ["Region", "Sales"],
            "rows": [
                {"Region": "East", "Sales": "100"},
                {"Region": "East", "Sales": "200"},
                {"Region": "West", "Sales": null}
            ]
        }));
        let Json(artifact) = tokio_test::block_on(analyze_dataset(State(state()), body)).unwrap();
        assert_eq!(artifact.summary.missing_values, 1);
        assert_eq!(artifact.columns["Sales"].standard_deviation, Some(50.0));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let body = payload(json!({"headers": ["a", "b"], "rows": [{"a": 1}]}));
        let err = tokio_test::block_on(analyze_dataset(State(state()), body)).unwrap_err();
        assert!(matches!(err, AppError::Analysis(_)));
    }

    #[test]
    fn chart_request_for_unknown_column_fails() {
        let body = payload(json!({
            "dataset": {"headers": ["a"], "rows": [{"a": "x"}]},
            "chart": {"kind": "pie", "xColumn": "missing"}
        }));
        let err = tokio_test::block_on(project_chart(State(state()), body)).unwrap_err();
        assert_eq!(err.to_string(), "unknown column: missing");
    }

    #[test]
    fn pie_chart_over_categories() {
        let body = payload(json!({
            "dataset": {"headers": ["c"], "rows": [{"c": "A"}, {"c": "A"}, {"c": "B"}]},
            "chart": {"kind": "pie", "xColumn": "c", "limit": 8}
        }));
        let Json(response) = tokio_test::block_on(project_chart(State(state()), body)).unwrap();
        assert_eq!(response.kind, ChartKind::Pie);
        assert_eq!(
            serde_json::to_value(&response.points).unwrap(),
            json!([{"name": "A", "value": 2.0}, {"name": "B", "value": 1.0}])
        );
    }

    #[test]
    fn recommend_returns_a_kind() {
        let body = payload(json!({
            "dataset": {"headers": ["x", "y"], "rows": []},
            "xColumn": "x",
            "yColumn": "y"
        }));
        let Json(response) = tokio_test::block_on(recommend_chart(State(state()), body)).unwrap();
        assert_eq!(response.kind, ChartKind::Bar);
    }

    #[test]
    fn empty_upload_is_invalid() {
        let err = tokio_test::block_on(analyze_workbook(State(state()), Bytes::new())).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
