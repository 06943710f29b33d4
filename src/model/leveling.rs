//! Leveling results requested from the scheduling service.
//!
//! Nothing here ranks strategies: the service's recommendation is shown
//! as received.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Options sent with every leveling request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelingOptions {
    pub preserve_critical_path: bool,
    pub level_within_float: bool,
    pub max_iterations: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_resources: Option<Vec<Uuid>>,
}

impl Default for LevelingOptions {
    fn default() -> Self {
        Self {
            preserve_critical_path: true,
            level_within_float: true,
            max_iterations: 100,
            target_resources: None,
        }
    }
}

/// One activity moved by the leveling algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityShift {
    pub activity_id: Uuid,
    #[serde(default)]
    pub activity_code: String,
    #[serde(default)]
    pub activity_name: String,
    pub original_start: NaiveDate,
    pub original_finish: NaiveDate,
    pub new_start: NaiveDate,
    pub new_finish: NaiveDate,
    pub delay_days: i64,
    #[serde(default)]
    pub reason: String,
}

/// Figures compared between strategies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LevelingMetrics {
    pub execution_time_ms: f64,
    pub activities_shifted: u32,
    pub schedule_extension_days: i64,
    pub remaining_overallocations: u32,
}

/// Response of preview, run and parallel run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelingResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub shifts: Vec<ActivityShift>,
    #[serde(default)]
    pub iterations_used: u32,
    #[serde(default)]
    pub remaining_overallocations: u32,
    #[serde(default)]
    pub new_project_finish: Option<NaiveDate>,
    #[serde(default)]
    pub project_extension_days: i64,
    #[serde(default)]
    pub execution_time_ms: f64,
    #[serde(default)]
    pub warnings: Vec<String>,
    /// Only set by the parallel endpoint.
    #[serde(default)]
    pub threads_used: Option<u32>,
    #[serde(default)]
    pub metrics: Option<LevelingMetrics>,
}

impl LevelingResult {
    pub fn metrics(&self) -> LevelingMetrics {
        self.metrics.clone().unwrap_or(LevelingMetrics {
            execution_time_ms: self.execution_time_ms,
            activities_shifted: self.shifts.len() as u32,
            schedule_extension_days: self.project_extension_days,
            remaining_overallocations: self.remaining_overallocations,
        })
    }
}

/// Response of `compareLevelingAlgorithms`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlgorithmComparison {
    pub serial: LevelingMetrics,
    pub parallel: LevelingMetrics,
    pub recommendation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Serial,
    Parallel,
}

impl Strategy {
    pub fn label(self) -> &'static str {
        match self {
            Strategy::Serial => "Serial",
            Strategy::Parallel => "Parallel",
        }
    }
}

/// Kind of leveling request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LevelingRequest {
    Preview,
    RunSerial,
    RunParallel,
    Compare,
    Apply,
}

impl LevelingRequest {
    pub fn label(self) -> &'static str {
        match self {
            LevelingRequest::Preview => "Preview",
            LevelingRequest::RunSerial => "Serial run",
            LevelingRequest::RunParallel => "Parallel run",
            LevelingRequest::Compare => "Comparison",
            LevelingRequest::Apply => "Apply",
        }
    }
}

/// Which status a request writes to. Preview and serial runs share one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Slot {
    Serial,
    Parallel,
    Comparison,
    Apply,
}

impl LevelingRequest {
    fn slot(self) -> Slot {
        match self {
            LevelingRequest::Preview | LevelingRequest::RunSerial => Slot::Serial,
            LevelingRequest::RunParallel => Slot::Parallel,
            LevelingRequest::Compare => Slot::Comparison,
            LevelingRequest::Apply => Slot::Apply,
        }
    }
}

/// One issued leveling request. The response is matched back on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LevelingTicket {
    pub request: LevelingRequest,
    pub seq: u64,
}

/// Status of the most recent request of one kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestStatus<T> {
    #[default]
    Idle,
    Loading,
    Loaded(T),
    Failed(String),
}

impl<T> RequestStatus<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, RequestStatus::Loading)
    }

    pub fn loaded(&self) -> Option<&T> {
        match self {
            RequestStatus::Loaded(value) => Some(value),
            _ => None,
        }
    }
}

/// State behind the leveling comparison window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelingState {
    pub open: bool,
    pub options: LevelingOptions,
    pub serial: RequestStatus<LevelingResult>,
    pub parallel: RequestStatus<LevelingResult>,
    pub comparison: RequestStatus<AlgorithmComparison>,
    pub apply: RequestStatus<usize>,
    /// Activity ids of shifts ticked for application.
    pub selected_shifts: BTreeSet<Uuid>,
    /// Strategy whose shifts the selection was taken from.
    pub shift_source: Option<Strategy>,
    issued: u64,
    /// Newest outstanding ticket per slot; older answers are dropped.
    wanted: BTreeMap<Slot, u64>,
}

impl LevelingState {
    pub fn result(&self, strategy: Strategy) -> &RequestStatus<LevelingResult> {
        match strategy {
            Strategy::Serial => &self.serial,
            Strategy::Parallel => &self.parallel,
        }
    }

    /// Mark a request as in flight. Any earlier request for the same slot
    /// is superseded.
    pub fn begin(&mut self, request: LevelingRequest) -> LevelingTicket {
        self.issued += 1;
        self.wanted.insert(request.slot(), self.issued);
        match request.slot() {
            Slot::Serial => self.serial = RequestStatus::Loading,
            Slot::Parallel => self.parallel = RequestStatus::Loading,
            Slot::Comparison => self.comparison = RequestStatus::Loading,
            Slot::Apply => self.apply = RequestStatus::Loading,
        }
        LevelingTicket {
            request,
            seq: self.issued,
        }
    }

    /// Whether `ticket` is still the answer its slot waits for. Consumes it.
    fn settle(&mut self, ticket: LevelingTicket) -> bool {
        let slot = ticket.request.slot();
        if self.wanted.get(&slot) != Some(&ticket.seq) {
            return false;
        }
        self.wanted.remove(&slot);
        true
    }

    /// Store a strategy result and pre-select all of its shifts.
    ///
    /// Returns `false` and changes nothing when the ticket was superseded.
    pub fn finish_result(&mut self, ticket: LevelingTicket, outcome: Result<LevelingResult, String>) -> bool {
        if !self.settle(ticket) {
            return false;
        }
        let strategy = match ticket.request.slot() {
            Slot::Parallel => Strategy::Parallel,
            _ => Strategy::Serial,
        };
        let status = match outcome {
            Ok(result) => {
                self.selected_shifts = result.shifts.iter().map(|s| s.activity_id).collect();
                self.shift_source = Some(strategy);
                RequestStatus::Loaded(result)
            }
            Err(message) => RequestStatus::Failed(message),
        };
        match strategy {
            Strategy::Serial => self.serial = status,
            Strategy::Parallel => self.parallel = status,
        }
        true
    }

    pub fn finish_comparison(
        &mut self,
        ticket: LevelingTicket,
        outcome: Result<AlgorithmComparison, String>,
    ) -> bool {
        if !self.settle(ticket) {
            return false;
        }
        self.comparison = match outcome {
            Ok(c) => RequestStatus::Loaded(c),
            Err(message) => RequestStatus::Failed(message),
        };
        true
    }

    pub fn finish_apply(&mut self, ticket: LevelingTicket, outcome: Result<usize, String>) -> bool {
        if !self.settle(ticket) {
            return false;
        }
        self.apply = match outcome {
            Ok(count) => {
                self.selected_shifts.clear();
                RequestStatus::Loaded(count)
            }
            Err(message) => RequestStatus::Failed(message),
        };
        true
    }

    /// The loaded result the shift list is taken from.
    pub fn shift_result(&self) -> Option<&LevelingResult> {
        self.shift_source.and_then(|s| self.result(s).loaded())
    }

    pub fn toggle_shift(&mut self, activity_id: Uuid) {
        if !self.selected_shifts.remove(&activity_id) {
            self.selected_shifts.insert(activity_id);
        }
    }

    /// Selected shift ids in a stable order, for `applyLeveling`.
    pub fn shift_ids(&self) -> Vec<Uuid> {
        self.selected_shifts.iter().copied().collect()
    }
}

/// A row of the side-by-side metrics table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricRow {
    pub label: &'static str,
    pub serial: String,
    pub parallel: String,
}

pub fn metric_rows(serial: &LevelingMetrics, parallel: &LevelingMetrics) -> Vec<MetricRow> {
    vec![
        MetricRow {
            label: "Execution time",
            serial: format!("{:.0} ms", serial.execution_time_ms),
            parallel: format!("{:.0} ms", parallel.execution_time_ms),
        },
        MetricRow {
            label: "Activities shifted",
            serial: serial.activities_shifted.to_string(),
            parallel: parallel.activities_shifted.to_string(),
        },
        MetricRow {
            label: "Schedule extension",
            serial: format!("{} d", serial.schedule_extension_days),
            parallel: format!("{} d", parallel.schedule_extension_days),
        },
        MetricRow {
            label: "Remaining overallocations",
            serial: serial.remaining_overallocations.to_string(),
            parallel: parallel.remaining_overallocations.to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(ms: f64, shifted: u32, ext: i64, remaining: u32) -> LevelingMetrics {
        LevelingMetrics {
            execution_time_ms: ms,
            activities_shifted: shifted,
            schedule_extension_days: ext,
            remaining_overallocations: remaining,
        }
    }

    #[test]
    fn comparison_decodes_and_keeps_recommendation_verbatim() {
        let json = r#"{
            "serial": {"executionTimeMs": 120, "activitiesShifted": 4, "scheduleExtensionDays": 3, "remainingOverallocations": 0},
            "parallel": {"executionTimeMs": 45, "activitiesShifted": 6, "scheduleExtensionDays": 5, "remainingOverallocations": 1},
            "recommendation": "serial"
        }"#;
        let c: AlgorithmComparison = serde_json::from_str(json).unwrap();
        assert_eq!(c.recommendation, "serial");
        let rows = metric_rows(&c.serial, &c.parallel);
        assert_eq!(rows[0].serial, "120 ms");
        assert_eq!(rows[0].parallel, "45 ms");
        assert_eq!(rows[2].parallel, "5 d");
    }

    #[test]
    fn result_metrics_fall_back_to_top_level_fields() {
        let result = LevelingResult {
            success: true,
            shifts: vec![],
            iterations_used: 3,
            remaining_overallocations: 2,
            new_project_finish: None,
            project_extension_days: 4,
            execution_time_ms: 12.0,
            warnings: vec![],
            threads_used: None,
            metrics: None,
        };
        assert_eq!(result.metrics(), metrics(12.0, 0, 4, 2));
    }

    #[test]
    fn parallel_result_decodes_threads_and_metrics() {
        let json = r#"{
            "success": true,
            "shifts": [{
                "activityId": "6a1c3a52-6a5e-4a55-9a3c-6f0b0f1f2a11",
                "activityCode": "A10",
                "originalStart": "2026-02-02", "originalFinish": "2026-02-04",
                "newStart": "2026-02-05", "newFinish": "2026-02-09",
                "delayDays": 3
            }],
            "threadsUsed": 4,
            "metrics": {"executionTimeMs": 8, "activitiesShifted": 1}
        }"#;
        let r: LevelingResult = serde_json::from_str(json).unwrap();
        assert_eq!(r.threads_used, Some(4));
        assert_eq!(r.metrics().activities_shifted, 1);
        assert_eq!(r.shifts[0].delay_days, 3);
    }

    fn result_with(activity_ids: &[Uuid], d: NaiveDate) -> LevelingResult {
        LevelingResult {
            success: true,
            shifts: activity_ids
                .iter()
                .map(|&activity_id| ActivityShift {
                    activity_id,
                    activity_code: "A".into(),
                    activity_name: "A".into(),
                    original_start: d,
                    original_finish: d,
                    new_start: d,
                    new_finish: d,
                    delay_days: 0,
                    reason: String::new(),
                })
                .collect(),
            iterations_used: 1,
            remaining_overallocations: 0,
            new_project_finish: None,
            project_extension_days: 0,
            execution_time_ms: 1.0,
            warnings: vec![],
            threads_used: None,
            metrics: None,
        }
    }

    #[test]
    fn late_preview_does_not_replace_a_newer_serial_run() {
        let d = NaiveDate::from_ymd_opt(2026, 2, 2).unwrap();
        let run_ids = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        let mut state = LevelingState::default();
        let preview = state.begin(LevelingRequest::Preview);
        let run = state.begin(LevelingRequest::RunSerial);

        assert!(state.finish_result(run, Ok(result_with(&run_ids, d))));
        assert!(!state.finish_result(preview, Ok(result_with(&[Uuid::new_v4()], d))));

        assert_eq!(state.serial.loaded().map(|r| r.shifts.len()), Some(3));
        assert_eq!(state.selected_shifts.len(), 3);
        assert_eq!(state.shift_source, Some(Strategy::Serial));
    }

    #[test]
    fn stale_answers_leave_the_newer_request_loading() {
        let mut state = LevelingState::default();
        let first = state.begin(LevelingRequest::Compare);
        let _second = state.begin(LevelingRequest::Compare);
        assert!(!state.finish_comparison(first, Err("timeout".into())));
        assert!(state.comparison.is_loading());

        // A ticket is answered once.
        let apply = state.begin(LevelingRequest::Apply);
        assert!(state.finish_apply(apply, Ok(2)));
        assert!(!state.finish_apply(apply, Err("again".into())));
        assert_eq!(state.apply, RequestStatus::Loaded(2));
    }

    #[test]
    fn slots_do_not_supersede_each_other() {
        let d = NaiveDate::from_ymd_opt(2026, 2, 2).unwrap();
        let mut state = LevelingState::default();
        let serial = state.begin(LevelingRequest::RunSerial);
        let parallel = state.begin(LevelingRequest::RunParallel);
        assert!(state.finish_result(serial, Ok(result_with(&[Uuid::new_v4()], d))));
        assert!(state.finish_result(parallel, Ok(result_with(&[], d))));
        assert!(state.serial.loaded().is_some());
        assert!(state.parallel.loaded().is_some());
    }

    #[test]
    fn finished_result_preselects_its_shifts() {
        let id = Uuid::new_v4();
        let d = NaiveDate::from_ymd_opt(2026, 2, 2).unwrap();
        let mut state = LevelingState::default();
        let ticket = state.begin(LevelingRequest::RunSerial);
        assert!(state.serial.is_loading());
        assert!(state.finish_result(ticket, Ok(result_with(&[id], d))));
        assert_eq!(state.shift_ids(), vec![id]);
        state.toggle_shift(id);
        assert!(state.shift_ids().is_empty());
    }

    #[test]
    fn failures_are_kept_as_messages() {
        let mut state = LevelingState::default();
        let ticket = state.begin(LevelingRequest::RunParallel);
        state.finish_result(ticket, Err("solver timeout".into()));
        assert_eq!(
            state.result(Strategy::Parallel),
            &RequestStatus::Failed("solver timeout".into())
        );
        assert_eq!(state.result(Strategy::Serial), &RequestStatus::Idle);
    }
}
