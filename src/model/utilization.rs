//! Assigned-versus-available capacity per resource and period.
//!
//! Daily figures are the unit of truth; weekly (ISO week) and monthly
//! buckets sum their in-range days before the percentage is taken.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::resource::{Assignment, Resource};
use super::timeline::{month_start, week_start, DateRange, TimelineScale};

/// Width of one aggregation bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Daily,
    Weekly,
    Monthly,
}

impl Granularity {
    pub fn as_query(self) -> &'static str {
        match self {
            Granularity::Daily => "daily",
            Granularity::Weekly => "weekly",
            Granularity::Monthly => "monthly",
        }
    }
}

impl From<TimelineScale> for Granularity {
    fn from(scale: TimelineScale) -> Self {
        match scale {
            TimelineScale::Days => Granularity::Daily,
            TimelineScale::Weeks => Granularity::Weekly,
            TimelineScale::Months => Granularity::Monthly,
        }
    }
}

/// Utilization of one resource over one bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtilizationPoint {
    /// First in-range day of the bucket.
    pub date: NaiveDate,
    pub available_hours: f64,
    pub assigned_hours: f64,
    pub utilization_percent: f64,
    pub is_overallocated: bool,
}

impl UtilizationPoint {
    pub fn new(date: NaiveDate, available_hours: f64, assigned_hours: f64) -> Self {
        let utilization_percent = if available_hours > 0.0 {
            assigned_hours / available_hours * 100.0
        } else {
            0.0
        };
        Self {
            date,
            available_hours,
            assigned_hours,
            utilization_percent,
            is_overallocated: assigned_hours > available_hours,
        }
    }
}

/// Series plus derived figures for one resource and range.
#[derive(Debug, Clone, PartialEq)]
pub struct UtilizationSummary {
    pub points: Vec<UtilizationPoint>,
    pub peak_utilization: f64,
    pub peak_date: Option<NaiveDate>,
    pub average_utilization: f64,
    pub total_available_hours: f64,
    pub total_assigned_hours: f64,
    pub overallocated_days: usize,
}

/// Hours the given assignments put on `resource` on one day.
pub fn assigned_hours_on(resource: &Resource, assignments: &[Assignment], date: NaiveDate) -> f64 {
    assignments
        .iter()
        .filter(|a| a.covers(date))
        .map(|a| a.units * resource.capacity_per_day)
        .sum()
}

/// One point per day of `range`.
pub fn daily_series(
    resource: &Resource,
    assignments: &[Assignment],
    range: &DateRange,
) -> BTreeMap<NaiveDate, UtilizationPoint> {
    range
        .days()
        .map(|date| {
            let point = UtilizationPoint::new(
                date,
                resource.available_hours(date),
                assigned_hours_on(resource, assignments, date),
            );
            (date, point)
        })
        .collect()
}

fn bucket_key(date: NaiveDate, granularity: Granularity) -> NaiveDate {
    match granularity {
        Granularity::Daily => date,
        Granularity::Weekly => week_start(date),
        Granularity::Monthly => month_start(date),
    }
}

/// Aggregate a resource's assignments over `range` at the given granularity.
pub fn aggregate(
    resource: &Resource,
    assignments: &[Assignment],
    range: &DateRange,
    granularity: Granularity,
) -> UtilizationSummary {
    let daily = daily_series(resource, assignments, range);
    summarize(bucketize(daily.values(), granularity))
}

/// Fold daily points into buckets. Bucket dates are the first in-range day.
pub fn bucketize<'a>(
    daily: impl IntoIterator<Item = &'a UtilizationPoint>,
    granularity: Granularity,
) -> Vec<UtilizationPoint> {
    let mut buckets: Vec<(NaiveDate, NaiveDate, f64, f64)> = Vec::new();
    for point in daily {
        let key = bucket_key(point.date, granularity);
        match buckets.last_mut() {
            Some((k, _, available, assigned)) if *k == key => {
                *available += point.available_hours;
                *assigned += point.assigned_hours;
            }
            _ => buckets.push((key, point.date, point.available_hours, point.assigned_hours)),
        }
    }
    buckets
        .into_iter()
        .map(|(_, first_day, available, assigned)| UtilizationPoint::new(first_day, available, assigned))
        .collect()
}

/// Derive peak, average and totals from a bucket series.
pub fn summarize(points: Vec<UtilizationPoint>) -> UtilizationSummary {
    let mut peak: Option<&UtilizationPoint> = None;
    let mut total_available_hours = 0.0;
    let mut total_assigned_hours = 0.0;
    let mut percent_sum = 0.0;
    let mut counted = 0usize;
    let mut overallocated_days = 0usize;

    for point in &points {
        // Strict comparison keeps the earliest date on ties.
        if peak.map_or(true, |p| point.utilization_percent > p.utilization_percent) {
            peak = Some(point);
        }
        total_available_hours += point.available_hours;
        total_assigned_hours += point.assigned_hours;
        if point.available_hours > 0.0 {
            percent_sum += point.utilization_percent;
            counted += 1;
        }
        if point.is_overallocated {
            overallocated_days += 1;
        }
    }

    let peak_utilization = peak.map_or(0.0, |p| p.utilization_percent);
    let peak_date = peak.map(|p| p.date);
    let average_utilization = if counted > 0 {
        percent_sum / counted as f64
    } else {
        0.0
    };

    UtilizationSummary {
        points,
        peak_utilization,
        peak_date,
        average_utilization,
        total_available_hours,
        total_assigned_hours,
        overallocated_days,
    }
}
