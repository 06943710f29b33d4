//! REST client for the scheduling service.
//!
//! This module provides [`ApiClient`], a thin wrapper over `reqwest` with one
//! method per remote operation the timeline consumes. Transport failures map
//! to [`Error::Fetch`], non-success statuses to [`Error::Status`], and every
//! failure of a leveling endpoint to [`Error::LevelingRequest`].

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::model::leveling::{AlgorithmComparison, LevelingOptions, LevelingResult};
use crate::model::resource::{AssignmentRecord, Resource};
use crate::model::utilization::{Granularity, UtilizationPoint};

/// Histogram computed by the service for one resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceHistogram {
    #[serde(default)]
    pub data_points: Vec<UtilizationPoint>,
    #[serde(default)]
    pub peak_utilization: f64,
    #[serde(default)]
    pub peak_date: Option<NaiveDate>,
    #[serde(default)]
    pub average_utilization: f64,
    #[serde(default)]
    pub overallocated_days: u32,
    #[serde(default)]
    pub total_available_hours: f64,
    #[serde(default)]
    pub total_assigned_hours: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApplyLevelingBody<'a> {
    shift_ids: &'a [Uuid],
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(alias = "detail", alias = "error")]
    message: String,
}

/// Client for the scheduling service's REST API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// Creates a client for `base_url` (e.g. `https://host/api/v1`).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| Error::Fetch {
                operation: "client_setup",
                source,
            })?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    #[instrument(skip(self))]
    pub async fn list_resources(&self, program_id: Uuid) -> Result<Vec<Resource>> {
        let url = self.url(&format!("programs/{program_id}/resources"));
        self.send_json("list_resources", self.http.get(url)).await
    }

    #[instrument(skip(self))]
    pub async fn list_assignments(&self, resource_id: Uuid) -> Result<Vec<AssignmentRecord>> {
        let url = self.url(&format!("resources/{resource_id}/assignments"));
        self.send_json("list_assignments", self.http.get(url)).await
    }

    #[instrument(skip(self))]
    pub async fn get_resource_histogram(
        &self,
        resource_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        granularity: Granularity,
    ) -> Result<ResourceHistogram> {
        let url = self.url(&format!("resources/{resource_id}/histogram"));
        let request = self.http.get(url).query(&[
            ("startDate", start.to_string()),
            ("endDate", end.to_string()),
            ("granularity", granularity.as_query().to_string()),
        ]);
        self.send_json("get_resource_histogram", request).await
    }

    #[instrument(skip(self, options))]
    pub async fn preview_leveling(
        &self,
        program_id: Uuid,
        options: &LevelingOptions,
    ) -> Result<LevelingResult> {
        self.leveling("preview_leveling", program_id, "preview", options)
            .await
    }

    #[instrument(skip(self, options))]
    pub async fn run_leveling(
        &self,
        program_id: Uuid,
        options: &LevelingOptions,
    ) -> Result<LevelingResult> {
        self.leveling("run_leveling", program_id, "run", options).await
    }

    #[instrument(skip(self, options))]
    pub async fn run_parallel_leveling(
        &self,
        program_id: Uuid,
        options: &LevelingOptions,
    ) -> Result<LevelingResult> {
        self.leveling("run_parallel_leveling", program_id, "parallel", options)
            .await
    }

    #[instrument(skip(self, options))]
    pub async fn compare_leveling_algorithms(
        &self,
        program_id: Uuid,
        options: &LevelingOptions,
    ) -> Result<AlgorithmComparison> {
        self.leveling("compare_leveling_algorithms", program_id, "compare", options)
            .await
    }

    /// Apply the given shifts. Callers must refetch resources and assignments afterwards.
    #[instrument(skip(self, shift_ids), fields(shifts = shift_ids.len()))]
    pub async fn apply_leveling(&self, program_id: Uuid, shift_ids: &[Uuid]) -> Result<()> {
        let url = self.url(&format!("programs/{program_id}/leveling/apply"));
        let request = self.http.post(url).json(&ApplyLevelingBody { shift_ids });
        self.send_empty("apply_leveling", request)
            .await
            .map_err(Error::into_leveling)
    }

    #[instrument(skip(self))]
    pub async fn delete_assignment(&self, assignment_id: Uuid) -> Result<()> {
        let url = self.url(&format!("assignments/{assignment_id}"));
        self.send_empty("delete_assignment", self.http.delete(url)).await
    }

    async fn leveling<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        program_id: Uuid,
        endpoint: &str,
        options: &LevelingOptions,
    ) -> Result<T> {
        let url = self.url(&format!("programs/{program_id}/leveling/{endpoint}"));
        self.send_json(operation, self.http.post(url).json(options))
            .await
            .map_err(Error::into_leveling)
    }

    async fn send(&self, operation: &'static str, request: RequestBuilder) -> Result<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|source| Error::Fetch { operation, source })?;
        let status = response.status();
        if status.is_success() {
            debug!(operation, status = status.as_u16(), "request succeeded");
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body, status.canonical_reason().unwrap_or("error"));
        warn!(operation, status = status.as_u16(), %message, "request failed");
        Err(Error::Status {
            operation,
            status: status.as_u16(),
            message,
        })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T> {
        let response = self.send(operation, request).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|source| Error::Fetch { operation, source })?;
        decode(operation, &bytes)
    }

    async fn send_empty(&self, operation: &'static str, request: RequestBuilder) -> Result<()> {
        self.send(operation, request).await.map(|_| ())
    }
}

/// Decode a JSON body, accepting both bare values and `{ "data": ... }` envelopes.
pub fn decode<T: DeserializeOwned>(operation: &'static str, bytes: &[u8]) -> Result<T> {
    #[derive(Deserialize)]
    struct Envelope<T> {
        data: T,
    }

    match serde_json::from_slice::<T>(bytes) {
        Ok(value) => Ok(value),
        Err(bare_err) => serde_json::from_slice::<Envelope<T>>(bytes)
            .map(|e| e.data)
            .map_err(|_| Error::Decode {
                operation,
                reason: bare_err.to_string(),
            }),
    }
}

/// Pull a human-readable message out of an error body.
pub fn error_message(body: &str, fallback: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.message)
        .ok()
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty() && trimmed.len() <= 200).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| fallback.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        ApiClient::new("https://pm.example.com/api/v1/", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn urls_join_without_double_slashes() {
        let c = client();
        assert_eq!(c.base_url(), "https://pm.example.com/api/v1");
        assert_eq!(
            c.url("/resources/abc/assignments"),
            "https://pm.example.com/api/v1/resources/abc/assignments"
        );
    }

    #[test]
    fn decode_accepts_data_envelopes() {
        let body = br#"{"data": [{"id":"6a1c3a52-6a5e-4a55-9a3c-6f0b0f1f2a11","code":"R1","name":"Rigger","resourceType":"LABOR"}]}"#;
        let resources: Vec<Resource> = decode("list_resources", body).unwrap();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].capacity_per_day, 8.0);
    }

    #[test]
    fn decode_reports_operation_on_bad_shape() {
        let err = decode::<Vec<Resource>>("list_resources", b"{\"oops\": 1}").unwrap_err();
        match err {
            Error::Decode { operation, .. } => assert_eq!(operation, "list_resources"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn histogram_decodes_service_shape() {
        let body = br#"{
            "dataPoints": [{"date":"2026-02-03","availableHours":8,"assignedHours":10,"utilizationPercent":125,"isOverallocated":true}],
            "peakUtilization": 125, "peakDate": "2026-02-03", "averageUtilization": 125,
            "overallocatedDays": 1, "totalAvailableHours": 8, "totalAssignedHours": 10
        }"#;
        let h: ResourceHistogram = decode("get_resource_histogram", body).unwrap();
        assert_eq!(h.overallocated_days, 1);
        assert!(h.data_points[0].is_overallocated);
    }

    #[test]
    fn error_message_prefers_envelope() {
        assert_eq!(error_message(r#"{"detail":"Program not found"}"#, "Not Found"), "Program not found");
        assert_eq!(error_message("", "Not Found"), "Not Found");
        assert_eq!(error_message("upstream timeout", "Bad Gateway"), "upstream timeout");
    }
}
