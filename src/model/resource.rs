use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Primary resource category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResourceType {
    #[serde(alias = "labor")]
    Labor,
    #[serde(alias = "equipment")]
    Equipment,
    #[serde(alias = "material")]
    Material,
}

impl ResourceType {
    pub fn all() -> &'static [ResourceType] {
        &[ResourceType::Labor, ResourceType::Equipment, ResourceType::Material]
    }

    pub fn label(self) -> &'static str {
        match self {
            ResourceType::Labor => "Labor",
            ResourceType::Equipment => "Equipment",
            ResourceType::Material => "Material",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            ResourceType::Labor => egui_phosphor::regular::USER,
            ResourceType::Equipment => egui_phosphor::regular::WRENCH,
            ResourceType::Material => egui_phosphor::regular::PACKAGE,
        }
    }
}

/// Working days and holidays of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkCalendar {
    /// ISO weekday numbers (1 = Monday .. 7 = Sunday) the resource works.
    #[serde(default = "default_working_days")]
    pub working_days: BTreeSet<u32>,
    #[serde(default)]
    pub holidays: BTreeSet<NaiveDate>,
}

fn default_working_days() -> BTreeSet<u32> {
    (1..=5).collect()
}

impl Default for WorkCalendar {
    fn default() -> Self {
        Self {
            working_days: default_working_days(),
            holidays: BTreeSet::new(),
        }
    }
}

impl WorkCalendar {
    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        self.working_days.contains(&date.weekday().number_from_monday())
            && !self.holidays.contains(&date)
    }

    /// A calendar where every day but Saturday and Sunday is worked.
    pub fn weekdays() -> Self {
        Self::default()
    }

    pub fn with_holiday(mut self, date: NaiveDate) -> Self {
        self.holidays.insert(date);
        self
    }
}

/// A resource as returned by `listResources`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub resource_type: ResourceType,
    #[serde(default = "default_capacity")]
    pub capacity_per_day: f64,
    #[serde(default)]
    pub pool_ids: BTreeSet<Uuid>,
    /// Absent means the resource is available every calendar day.
    #[serde(default)]
    pub calendar: Option<WorkCalendar>,
}

fn default_capacity() -> f64 {
    8.0
}

impl Resource {
    pub fn new(code: impl Into<String>, name: impl Into<String>, resource_type: ResourceType) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: code.into(),
            name: name.into(),
            resource_type,
            capacity_per_day: default_capacity(),
            pool_ids: BTreeSet::new(),
            calendar: None,
        }
    }

    pub fn with_capacity(mut self, hours_per_day: f64) -> Self {
        self.capacity_per_day = hours_per_day;
        self
    }

    pub fn with_pool(mut self, pool_id: Uuid) -> Self {
        self.pool_ids.insert(pool_id);
        self
    }

    pub fn with_calendar(mut self, calendar: WorkCalendar) -> Self {
        self.calendar = Some(calendar);
        self
    }

    /// Hours available on `date`: full capacity, or 0 on a calendar non-working day.
    pub fn available_hours(&self, date: NaiveDate) -> f64 {
        match &self.calendar {
            Some(cal) if !cal.is_working_day(date) => 0.0,
            _ => self.capacity_per_day.max(0.0),
        }
    }
}

/// Activity fields embedded in an assignment response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivitySummary {
    pub code: String,
    pub name: String,
    pub is_critical: bool,
    pub early_start: Option<NaiveDate>,
    pub late_finish: Option<NaiveDate>,
    pub total_float: Option<f64>,
}

/// An assignment as returned by `listAssignments`. Dates may be missing
/// for activities the service has not scheduled yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRecord {
    pub id: Uuid,
    pub activity_id: Uuid,
    pub resource_id: Uuid,
    #[serde(default = "default_units")]
    pub units: f64,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub finish_date: Option<NaiveDate>,
    #[serde(default)]
    pub activity: Option<ActivitySummary>,
}

fn default_units() -> f64 {
    1.0
}

/// A placed assignment: one bar on a resource lane.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub assignment_id: Uuid,
    pub activity_id: Uuid,
    pub activity_code: String,
    pub activity_name: String,
    pub start_date: NaiveDate,
    pub finish_date: NaiveDate,
    pub units: f64,
    pub is_critical: bool,
    pub early_start: Option<NaiveDate>,
    pub late_finish: Option<NaiveDate>,
    pub total_float: Option<f64>,
}

impl Assignment {
    pub fn new(
        activity_code: impl Into<String>,
        start_date: NaiveDate,
        finish_date: NaiveDate,
        units: f64,
    ) -> Self {
        let code = activity_code.into();
        Self {
            assignment_id: Uuid::new_v4(),
            activity_id: Uuid::new_v4(),
            activity_name: code.clone(),
            activity_code: code,
            start_date,
            finish_date: finish_date.max(start_date),
            units,
            is_critical: false,
            early_start: None,
            late_finish: None,
            total_float: None,
        }
    }

    /// Convert a service record into a placement; `None` when it has no dates.
    pub fn from_record(record: &AssignmentRecord) -> Option<Self> {
        let start = record.start_date?;
        let finish = record.finish_date.unwrap_or(start).max(start);
        let activity = record.activity.clone().unwrap_or_default();
        Some(Self {
            assignment_id: record.id,
            activity_id: record.activity_id,
            activity_code: activity.code,
            activity_name: activity.name,
            start_date: start,
            finish_date: finish,
            units: record.units,
            is_critical: activity.is_critical,
            early_start: activity.early_start,
            late_finish: activity.late_finish,
            total_float: activity.total_float,
        })
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.finish_date
    }
}

/// Text used wherever an optional schedule value is absent.
pub const PLACEHOLDER: &str = "—";

pub fn format_optional_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

pub fn format_optional_float(days: Option<f64>) -> String {
    days.map(|f| format!("{f:.1}d"))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}
