use chrono::NaiveDate;
use uuid::Uuid;

use super::resource::Assignment;
use super::timeline::TimelineColumn;

/// Horizontal placement of one assignment bar, in column-width units times pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarGeometry {
    pub left: f32,
    pub width: f32,
    /// The assignment starts before the first visible column.
    pub clipped_start: bool,
    /// The assignment finishes after the last visible column.
    pub clipped_end: bool,
}

/// Place an assignment over `columns`, clipping to the visible boundary.
///
/// Returns `None` only when the span does not touch any column.
pub fn bar_geometry(
    columns: &[TimelineColumn],
    assignment: &Assignment,
    column_width: f32,
) -> Option<BarGeometry> {
    let first = columns.first()?;
    let last = columns.last()?;
    let finish = assignment.finish_date.max(assignment.start_date);
    if finish < first.date || assignment.start_date > last.end {
        return None;
    }

    let clipped_start = assignment.start_date < first.date;
    let clipped_end = finish > last.end;
    let start_idx = if clipped_start {
        0
    } else {
        column_index(columns, assignment.start_date)?
    };
    let end_idx = if clipped_end {
        columns.len() - 1
    } else {
        column_index(columns, finish)?
    };

    Some(BarGeometry {
        left: start_idx as f32 * column_width,
        width: (end_idx - start_idx + 1) as f32 * column_width,
        clipped_start,
        clipped_end,
    })
}

/// Index of the column whose span contains `date`.
pub fn column_index(columns: &[TimelineColumn], date: NaiveDate) -> Option<usize> {
    let idx = columns.partition_point(|c| c.end < date);
    columns.get(idx).filter(|c| c.covers(date)).map(|_| idx)
}

/// An assignment and the sub-row it is drawn in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackedAssignment {
    pub assignment_id: Uuid,
    pub sub_row: usize,
}

/// Stack overlapping assignments into sub-rows.
///
/// Assignments are taken in start-date order, ties broken by assignment id,
/// and each goes to the first sub-row whose last bar finished before it starts.
pub fn stack_rows(assignments: &[Assignment]) -> Vec<StackedAssignment> {
    let mut ordered: Vec<&Assignment> = assignments.iter().collect();
    ordered.sort_by(|a, b| {
        a.start_date
            .cmp(&b.start_date)
            .then_with(|| a.assignment_id.cmp(&b.assignment_id))
    });

    let mut row_ends: Vec<NaiveDate> = Vec::new();
    let mut stacked = Vec::with_capacity(ordered.len());
    for a in ordered {
        let finish = a.finish_date.max(a.start_date);
        let sub_row = match row_ends.iter().position(|end| *end < a.start_date) {
            Some(row) => {
                row_ends[row] = finish;
                row
            }
            None => {
                row_ends.push(finish);
                row_ends.len() - 1
            }
        };
        stacked.push(StackedAssignment {
            assignment_id: a.assignment_id,
            sub_row,
        });
    }
    stacked
}

/// Number of sub-rows a lane needs (at least one).
pub fn sub_row_count(stacked: &[StackedAssignment]) -> usize {
    stacked.iter().map(|s| s.sub_row + 1).max().unwrap_or(1)
}

/// What a user can do to an assignment bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarCommand {
    Select(Uuid),
    Delete(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Delete,
}

/// A change intent handed to the data layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignmentChange {
    pub assignment_id: Uuid,
    pub kind: ChangeKind,
}

impl BarCommand {
    pub fn assignment_id(self) -> Uuid {
        match self {
            BarCommand::Select(id) | BarCommand::Delete(id) => id,
        }
    }

    /// The data change this command requests, if any.
    pub fn change(self) -> Option<AssignmentChange> {
        match self {
            BarCommand::Select(_) => None,
            BarCommand::Delete(assignment_id) => Some(AssignmentChange {
                assignment_id,
                kind: ChangeKind::Delete,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::timeline::{build_columns, TimelineScale};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, day).unwrap()
    }

    fn day_columns() -> Vec<TimelineColumn> {
        build_columns(d(10), d(20), TimelineScale::Days).unwrap()
    }

    #[test]
    fn bar_spans_inclusive_columns() {
        let a = Assignment::new("A", d(12), d(14), 1.0);
        let g = bar_geometry(&day_columns(), &a, 32.0).unwrap();
        assert_eq!(g.left, 64.0);
        assert_eq!(g.width, 96.0);
        assert!(!g.clipped_start && !g.clipped_end);
    }

    #[test]
    fn bars_are_clipped_not_dropped() {
        let a = Assignment::new("A", d(5), d(25), 1.0);
        let g = bar_geometry(&day_columns(), &a, 10.0).unwrap();
        assert_eq!(g.left, 0.0);
        assert_eq!(g.width, 110.0);
        assert!(g.clipped_start && g.clipped_end);
    }

    #[test]
    fn bars_outside_the_range_are_not_placed() {
        let a = Assignment::new("A", d(1), d(9), 1.0);
        assert!(bar_geometry(&day_columns(), &a, 10.0).is_none());
        let b = Assignment::new("B", d(21), d(22), 1.0);
        assert!(bar_geometry(&day_columns(), &b, 10.0).is_none());
    }

    #[test]
    fn week_bars_snap_to_containing_columns() {
        let cols = build_columns(d(2), d(22), TimelineScale::Weeks).unwrap();
        // Wed of week 2 to Tue of week 3.
        let a = Assignment::new("A", d(11), d(17), 1.0);
        let g = bar_geometry(&cols, &a, 84.0).unwrap();
        assert_eq!(g.left, 84.0);
        assert_eq!(g.width, 168.0);
    }

    #[test]
    fn column_index_finds_containing_unit() {
        let cols = build_columns(d(2), d(22), TimelineScale::Weeks).unwrap();
        assert_eq!(column_index(&cols, d(2)), Some(0));
        assert_eq!(column_index(&cols, d(15)), Some(1));
        assert_eq!(column_index(&cols, d(28)), None);
    }

    #[test]
    fn overlapping_assignments_stack_by_start_then_id() {
        let mut a = Assignment::new("A", d(10), d(14), 1.0);
        let mut b = Assignment::new("B", d(10), d(12), 1.0);
        let c = Assignment::new("C", d(13), d(16), 1.0);
        let e = Assignment::new("E", d(15), d(15), 1.0);
        a.assignment_id = Uuid::from_u128(2);
        b.assignment_id = Uuid::from_u128(1);

        let stacked = stack_rows(&[a.clone(), b.clone(), c.clone(), e.clone()]);
        let row_of = |id| stacked.iter().find(|s| s.assignment_id == id).unwrap().sub_row;
        assert_eq!(row_of(b.assignment_id), 0);
        assert_eq!(row_of(a.assignment_id), 1);
        assert_eq!(row_of(c.assignment_id), 0);
        assert_eq!(row_of(e.assignment_id), 1);
        assert_eq!(sub_row_count(&stacked), 2);
    }

    #[test]
    fn empty_lane_needs_one_row() {
        assert_eq!(sub_row_count(&stack_rows(&[])), 1);
    }

    #[test]
    fn delete_command_yields_change_intent() {
        let id = Uuid::new_v4();
        assert_eq!(BarCommand::Select(id).change(), None);
        assert_eq!(
            BarCommand::Delete(id).change(),
            Some(AssignmentChange {
                assignment_id: id,
                kind: ChangeKind::Delete
            })
        );
    }
}
