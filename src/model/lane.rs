use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use uuid::Uuid;

use super::resource::{Assignment, AssignmentRecord, Resource, ResourceType};
use super::timeline::{DateRange, TimelineColumn};
use super::utilization::{daily_series, UtilizationPoint};

/// The per-resource row of the timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceLane {
    pub resource_id: Uuid,
    pub resource_code: String,
    pub resource_name: String,
    pub resource_type: ResourceType,
    pub capacity_per_day: f64,
    pub pool_ids: BTreeSet<Uuid>,
    pub assignments: Vec<Assignment>,
    pub daily_utilization: BTreeMap<NaiveDate, UtilizationPoint>,
}

impl ResourceLane {
    pub fn has_overallocation(&self) -> bool {
        self.daily_utilization.values().any(|p| p.is_overallocated)
    }

    pub fn has_assignments(&self) -> bool {
        !self.assignments.is_empty()
    }

    pub fn peak_utilization(&self) -> f64 {
        self.daily_utilization
            .values()
            .map(|p| p.utilization_percent)
            .fold(0.0, f64::max)
    }

    /// Sum the in-range days each column covers. Columns with no in-range
    /// day yield `None`.
    pub fn column_utilization(&self, columns: &[TimelineColumn]) -> Vec<Option<UtilizationPoint>> {
        columns
            .iter()
            .map(|col| {
                let mut days = self.daily_utilization.range(col.date..=col.end).map(|(_, p)| p);
                let first = days.next()?;
                let (available, assigned) = days.fold(
                    (first.available_hours, first.assigned_hours),
                    |(av, asg), p| (av + p.available_hours, asg + p.assigned_hours),
                );
                Some(UtilizationPoint::new(first.date, available, assigned))
            })
            .collect()
    }
}

/// Build one lane for `resource` from its placed assignments.
pub fn build_lane(resource: &Resource, assignments: Vec<Assignment>, range: &DateRange) -> ResourceLane {
    let daily_utilization = daily_series(resource, &assignments, range);
    ResourceLane {
        resource_id: resource.id,
        resource_code: resource.code.clone(),
        resource_name: resource.name.clone(),
        resource_type: resource.resource_type,
        capacity_per_day: resource.capacity_per_day,
        pool_ids: resource.pool_ids.clone(),
        assignments,
        daily_utilization,
    }
}

/// Build every lane from scratch, in resource order.
///
/// Records without dates cannot be placed and are left out of the lane.
/// Resources whose assignments have not arrived yet get an empty lane.
pub fn build_lanes(
    resources: &[Resource],
    assignments: &HashMap<Uuid, Vec<AssignmentRecord>>,
    range: &DateRange,
) -> Vec<ResourceLane> {
    resources
        .iter()
        .map(|resource| {
            let placed: Vec<Assignment> = assignments
                .get(&resource.id)
                .map(|records| {
                    records
                        .iter()
                        .filter_map(|record| {
                            let placed = Assignment::from_record(record);
                            if placed.is_none() {
                                tracing::debug!(
                                    assignment = %record.id,
                                    resource = %resource.code,
                                    "assignment has no start date; not placed"
                                );
                            }
                            placed
                        })
                        .collect()
                })
                .unwrap_or_default();
            build_lane(resource, placed, range)
        })
        .collect()
}
