//! Request and response data transfer objects for the REST API.
//!
//! All types derive `Serialize` and/or `Deserialize` for JSON marshalling
//! via Axum. Successful responses share one envelope shape:
//! `{"result": ..., "status": "ok", "time": <seconds>}`.

use pointsdb_core::point::{PointId, WithVector};
use pointsdb_core::schema::VectorsConfig;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Success envelope wrapping every handler result.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub result: T,
    pub status: &'static str,
    /// Request processing time in seconds.
    pub time: f64,
}

impl<T: Serialize> ApiResponse<T> {
    /// Wrap a result, stamping elapsed time since the handler started.
    pub fn ok(result: T, started: Instant) -> axum::Json<Self> {
        axum::Json(Self {
            result,
            status: "ok",
            time: started.elapsed().as_secs_f64(),
        })
    }
}

/// `wait` query parameter shared by all mutation routes. Defaults to false:
/// the response is sent once the write is applied in memory and queued for
/// the next group commit.
#[derive(Debug, Default, Deserialize)]
pub struct WaitParam {
    #[serde(default)]
    pub wait: bool,
}

/// Request body for `POST /collections`.
#[derive(Debug, Deserialize)]
pub struct CreateCollectionRequest {
    pub name: String,
    /// Single unnamed config (`{"size": 4}`) or a name → params map.
    pub vectors: VectorsConfig,
}

/// One collection in the `GET /collections` listing.
#[derive(Debug, Serialize)]
pub struct CollectionInfo {
    pub name: String,
    pub points_count: usize,
}

/// Request body for `POST /collections/{name}/points` (retrieve).
#[derive(Debug, Deserialize)]
pub struct PointsRetrieveRequest {
    pub ids: Vec<PointId>,
    /// Bool or list of names. Accepted under both spellings.
    #[serde(default, alias = "with_vectors")]
    pub with_vector: WithVector,
    #[serde(default = "default_true")]
    pub with_payload: bool,
}

fn default_true() -> bool {
    true
}

/// Response body for `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub collections: usize,
    pub points: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_retrieve_request_defaults() {
        let req: PointsRetrieveRequest = serde_json::from_value(json!({"ids": [1, 2]})).unwrap();
        assert_eq!(req.with_vector, WithVector::Bool(false));
        assert!(req.with_payload);
    }

    #[test]
    fn test_retrieve_request_with_vectors_alias() {
        let req: PointsRetrieveRequest =
            serde_json::from_value(json!({"ids": [1], "with_vectors": true})).unwrap();
        assert_eq!(req.with_vector, WithVector::Bool(true));
        let req: PointsRetrieveRequest =
            serde_json::from_value(json!({"ids": [1], "with_vector": ["text"]})).unwrap();
        assert_eq!(req.with_vector, WithVector::Names(vec!["text".into()]));
    }

    #[test]
    fn test_envelope_shape() {
        let resp = ApiResponse {
            result: json!({"x": 1}),
            status: "ok",
            time: 0.5,
        };
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["status"], "ok");
        assert_eq!(value["result"]["x"], 1);
    }
}
