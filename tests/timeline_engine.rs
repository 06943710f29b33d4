//! End-to-end checks of the pure engine: from resources and assignment
//! records to the lanes and columns the grid draws.

use std::collections::HashMap;

use chrono::NaiveDate;
use resource_gantt::model::filter::{self, FilterState};
use resource_gantt::model::lane::build_lanes;
use resource_gantt::model::layout::bar_geometry;
use resource_gantt::model::resource::{AssignmentRecord, Resource, ResourceType};
use resource_gantt::model::timeline::{build_columns, month_groups, DateRange, TimelineScale};
use resource_gantt::Error;
use uuid::Uuid;

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 2, day).unwrap()
}

fn record(resource: &Resource, start: u32, finish: u32, units: f64) -> AssignmentRecord {
    AssignmentRecord {
        id: Uuid::new_v4(),
        activity_id: Uuid::new_v4(),
        resource_id: resource.id,
        units,
        start_date: Some(d(start)),
        finish_date: Some(d(finish)),
        activity: None,
    }
}

#[test]
fn two_weeks_of_days_form_one_month_group() {
    let columns = build_columns(d(2), d(15), TimelineScale::Days).unwrap();
    assert_eq!(columns.len(), 14);
    // Feb 7 and 8 2026 are Saturday and Sunday.
    assert!(!columns[4].is_weekend);
    assert!(columns[5].is_weekend);
    assert!(columns[6].is_weekend);

    let groups = month_groups(&columns);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].label, "Feb 2026");
    assert_eq!(groups[0].span, 14);
}

#[test]
fn narrowing_the_range_relabels_columns() {
    let columns = build_columns(d(10), d(12), TimelineScale::Days).unwrap();
    let labels: Vec<&str> = columns.iter().map(|c| c.label.as_str()).collect();
    assert_eq!(labels, ["10", "11", "12"]);
}

#[test]
fn reversed_range_is_rejected() {
    let err = build_columns(d(15), d(2), TimelineScale::Days).unwrap_err();
    assert!(matches!(err, Error::InvalidRange { .. }));
}

#[test]
fn overlapping_assignments_overallocate_and_filter() {
    let range = DateRange::new(d(2), d(15)).unwrap();
    let crane = Resource::new("CR-1", "Crane", ResourceType::Equipment);
    let crew = Resource::new("LB-1", "Concrete crew", ResourceType::Labor);
    let idle = Resource::new("MT-1", "Rebar", ResourceType::Material);

    let assignments = HashMap::from([
        (
            crane.id,
            vec![record(&crane, 3, 5, 0.75), record(&crane, 4, 4, 0.5)],
        ),
        (crew.id, vec![record(&crew, 9, 12, 1.0)]),
    ]);
    let lanes = build_lanes(&[crane.clone(), crew.clone(), idle.clone()], &assignments, &range);
    assert_eq!(lanes.len(), 3);

    let crane_lane = &lanes[0];
    let peak = &crane_lane.daily_utilization[&d(4)];
    assert_eq!(peak.assigned_hours, 10.0);
    assert_eq!(peak.utilization_percent, 125.0);
    assert!(peak.is_overallocated);
    assert!(!crane_lane.daily_utilization[&d(3)].is_overallocated);
    assert!(!lanes[1].has_overallocation());

    let over = filter::apply(&lanes, &FilterState::default().with_only_overallocated(true));
    assert_eq!(over.len(), 1);
    assert_eq!(over[0].resource_code, "CR-1");

    let assigned = filter::apply(&lanes, &FilterState::default().with_only_assigned(true));
    assert_eq!(assigned.len(), 2);

    let searched = filter::apply(&lanes, &FilterState::default().with_search("crew"));
    assert_eq!(searched.len(), 1);
    assert_eq!(searched[0].resource_id, crew.id);

    let none = filter::apply(&lanes, &FilterState::default().with_types(Vec::<ResourceType>::new()));
    assert!(none.is_empty());

    let stats = filter::stats(&lanes);
    assert_eq!(stats.total, 3);
    assert_eq!(stats.overallocated, 1);
    assert_eq!(stats.with_assignments, 2);
}

#[test]
fn bars_clip_to_the_visible_columns() {
    let range = DateRange::new(d(2), d(8)).unwrap();
    let crew = Resource::new("LB-1", "Concrete crew", ResourceType::Labor);
    let records = vec![
        AssignmentRecord {
            start_date: Some(NaiveDate::from_ymd_opt(2026, 1, 28).unwrap()),
            ..record(&crew, 3, 3, 1.0)
        },
        record(&crew, 6, 20, 1.0),
    ];
    let lanes = build_lanes(&[crew.clone()], &HashMap::from([(crew.id, records)]), &range);
    let columns = build_columns(range.start(), range.end(), TimelineScale::Days).unwrap();

    let early = bar_geometry(&columns, &lanes[0].assignments[0], 40.0).unwrap();
    assert!(early.clipped_start);
    assert!(!early.clipped_end);
    assert_eq!(early.left, 0.0);
    assert_eq!(early.width, 80.0);

    let late = bar_geometry(&columns, &lanes[0].assignments[1], 40.0).unwrap();
    assert!(late.clipped_end);
    assert_eq!(late.left, 160.0);
    assert_eq!(late.width, 120.0);
}
