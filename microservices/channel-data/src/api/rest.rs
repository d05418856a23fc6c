//! Channel Data REST API

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use bytes::Bytes;
use metering_core::{DependencyStatus, HealthStatus, MeteringError, ReadinessStatus};
use metering_telemetry::HistogramSummary;
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, error};
use uuid::Uuid;

use crate::data::DataService;
use crate::interpreter::{Interpreter, InterpreterKind};
use crate::storage::DataStore;
use crate::types::{AggregatedTuple, ChannelType, DataQuery, RowCount};

pub const SERVICE_ID: &str = "channel-data";

#[derive(Clone)]
pub struct AppState {
    pub data: DataService,
    pub start_time: Instant,
}

pub fn create_router(data: DataService, start_time: Instant) -> Router {
    let state = AppState { data, start_time };

    Router::new()
        // Health
        .route("/health", get(health))
        .route("/ready", get(ready))
        // Data
        .route(
            "/v1/data/{uuids}",
            get(get_data).post(add_data).delete(delete_data),
        )
        // Stats
        .route("/v1/stats", get(get_stats))
        .with_state(state)
}

/// `MeteringError` rendered as `{"error": {"code", "message"}}`
pub struct ApiError(MeteringError);

impl From<MeteringError> for ApiError {
    fn from(err: MeteringError) -> Self {
        Self(err)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        } else {
            debug!(error = %self.0, "Request rejected");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: self.0.error_code(),
                message: self.0.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

/// `uuid` or `uuid,uuid,...`
fn parse_uuids(raw: &str) -> Result<Vec<Uuid>, MeteringError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| Uuid::parse_str(s).map_err(|_| MeteringError::validation(format!("Invalid UUID '{}'", s))))
        .collect::<Result<Vec<_>, _>>()
        .and_then(|uuids| {
            if uuids.is_empty() {
                Err(MeteringError::validation("Missing channel UUID"))
            } else {
                Ok(uuids)
            }
        })
}

pub fn health_status(start_time: Instant) -> HealthStatus {
    HealthStatus {
        healthy: true,
        service_id: SERVICE_ID.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: start_time.elapsed().as_secs(),
    }
}

/// Ready once the data store answers
pub async fn readiness_status(store: &dyn DataStore) -> ReadinessStatus {
    let started = Instant::now();
    let available = store.is_healthy().await;
    ReadinessStatus {
        ready: available,
        dependencies: vec![DependencyStatus {
            name: "database".to_string(),
            available,
            latency_ms: Some(started.elapsed().as_millis() as u64),
        }],
    }
}

async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(health_status(state.start_time))
}

async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadinessStatus>) {
    let status = readiness_status(state.data.store()).await;
    let code = if status.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status))
}

// Data endpoints

#[derive(Serialize)]
struct DataResponse {
    data: Vec<ChannelData>,
}

#[derive(Serialize)]
struct ChannelData {
    uuid: Uuid,
    #[serde(rename = "type")]
    channel_type: ChannelType,
    interpreter: InterpreterKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    from: Option<i64>,
    to: Option<i64>,
    /// Raw tuples covered by the output
    rows: usize,
    tuples: Vec<AggregatedTuple>,
}

impl ChannelData {
    fn new(interpreter: &dyn Interpreter, tuples: Vec<AggregatedTuple>) -> Self {
        let params = interpreter.params();
        Self {
            uuid: params.channel.uuid,
            channel_type: params.channel.channel_type,
            interpreter: interpreter.kind(),
            title: params.channel.title.clone(),
            from: params.from,
            to: params.to,
            rows: tuples.iter().map(|t| t.count).sum(),
            tuples,
        }
    }
}

async fn get_data(
    State(state): State<AppState>,
    Path(uuids): Path<String>,
    Query(query): Query<DataQuery>,
) -> Result<Json<DataResponse>, ApiError> {
    let uuids = parse_uuids(&uuids)?;
    let interpreters = state.data.get(&uuids, &query).await?;

    let mut data = Vec::with_capacity(interpreters.len());
    for interpreter in &interpreters {
        let tuples = interpreter.load(state.data.store()).await?;
        data.push(ChannelData::new(interpreter.as_ref(), tuples));
    }

    Ok(Json(DataResponse { data }))
}

async fn add_data(
    State(state): State<AppState>,
    Path(uuids): Path<String>,
    Query(query): Query<DataQuery>,
    body: Bytes,
) -> Result<Json<RowCount>, ApiError> {
    let uuid = match parse_uuids(&uuids)?.as_slice() {
        [uuid] => *uuid,
        _ => {
            return Err(MeteringError::validation("Can only add data for a single channel at a time").into())
        }
    };

    let rows = state.data.add(uuid, &body, &query).await?;
    Ok(Json(rows))
}

async fn delete_data(
    State(state): State<AppState>,
    Path(uuids): Path<String>,
    Query(query): Query<DataQuery>,
) -> Result<Json<RowCount>, ApiError> {
    let uuids = parse_uuids(&uuids)?;
    let rows = state.data.delete(&uuids, &query).await?;
    Ok(Json(rows))
}

// Stats

#[derive(Serialize)]
struct StatsResponse {
    rows_inserted: u64,
    rows_deleted: u64,
    legacy_submissions: u64,
    insert_latency_ms: HistogramSummary,
}

async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let metrics = state.data.metrics();
    Json(StatsResponse {
        rows_inserted: metrics.rows_inserted.get(),
        rows_deleted: metrics.rows_deleted.get(),
        legacy_submissions: metrics.legacy_submissions.get(),
        insert_latency_ms: metrics.insert_latency_ms.summary(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::sync::Arc;

    use crate::interpreter::InterpreterRegistry;
    use crate::testing::{InMemoryEntities, InMemoryStore, Statement};
    use crate::types::Tuple;

    const A: &str = "11111111-1111-1111-1111-111111111111";
    const B: &str = "22222222-2222-2222-2222-222222222222";

    fn state(channels: &[(i32, ChannelType)]) -> (AppState, Arc<InMemoryStore>, Vec<Uuid>) {
        let mut entities = InMemoryEntities::default();
        let mut uuids = Vec::new();
        for &(id, channel_type) in channels {
            let (next, uuid) = entities.with_channel(id, channel_type);
            entities = next;
            uuids.push(uuid);
        }

        let store = Arc::new(InMemoryStore::default());
        let data = DataService::new(
            Arc::new(entities),
            store.clone(),
            Arc::new(InterpreterRegistry::default()),
        );
        let state = AppState {
            data,
            start_time: Instant::now(),
        };
        (state, store, uuids)
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_parse_single_uuid() {
        assert_eq!(parse_uuids(A).unwrap(), vec![Uuid::parse_str(A).unwrap()]);
    }

    #[test]
    fn test_parse_uuid_list_keeps_order() {
        let uuids = parse_uuids(&format!("{B}, {A}")).unwrap();
        assert_eq!(uuids, vec![Uuid::parse_str(B).unwrap(), Uuid::parse_str(A).unwrap()]);
    }

    #[test]
    fn test_parse_invalid_uuid() {
        assert!(matches!(parse_uuids("not-a-uuid"), Err(MeteringError::Validation(_))));
        assert!(matches!(parse_uuids(","), Err(MeteringError::Validation(_))));
    }

    #[test]
    fn test_error_response_status() {
        let response = ApiError::from(MeteringError::NotFound("x".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = ApiError::from(MeteringError::validation("bad")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = ApiError::from(MeteringError::Database("down".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_add_rejects_several_channels() {
        let (state, store, uuids) = state(&[(1, ChannelType::Power), (2, ChannelType::Power)]);

        let response = add_data(
            State(state),
            Path(format!("{},{}", uuids[0], uuids[1])),
            Query(DataQuery::default()),
            Bytes::from_static(b"[[1000, 1]]"),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(body["error"]["message"].as_str().unwrap().contains("single channel"));
        assert!(!store
            .statements()
            .iter()
            .any(|s| matches!(s, Statement::Insert { .. })));
    }

    #[tokio::test]
    async fn test_add_returns_row_count() {
        let (state, store, uuids) = state(&[(1, ChannelType::Power)]);

        let response = add_data(
            State(state),
            Path(uuids[0].to_string()),
            Query(DataQuery::default()),
            Bytes::from_static(b"[[1000, 5.0], [2000, 6.0]]"),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"rows": 2}));
        assert_eq!(store.tuples(1).len(), 2);
    }

    #[tokio::test]
    async fn test_get_response_shape() {
        let (state, store, uuids) = state(&[(1, ChannelType::Temperature)]);
        store.seed(1, &[Tuple::new(1000, 2.0), Tuple::new(2000, 4.0)]);

        let response = get_data(State(state), Path(uuids[0].to_string()), Query(DataQuery::default()))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 1);

        let channel = &data[0];
        assert_eq!(channel["uuid"], uuids[0].to_string());
        assert_eq!(channel["type"], "temperature");
        assert_eq!(channel["from"], Value::Null);
        assert_eq!(channel["to"], Value::Null);
        assert_eq!(channel["rows"], 2);
        assert_eq!(channel["tuples"], json!([[1000, 2.0, 1], [2000, 4.0, 1]]));
    }

    #[tokio::test]
    async fn test_get_unknown_channel_is_not_found() {
        let (state, _store, _uuids) = state(&[]);

        let response = get_data(State(state), Path(A.to_string()), Query(DataQuery::default()))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_readiness_follows_store() {
        let store = InMemoryStore::default();
        let status = readiness_status(&store).await;
        assert!(status.ready);
        assert_eq!(status.dependencies[0].name, "database");
    }
}
