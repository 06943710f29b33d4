use std::path::Path;

use crate::error::{Error, Result};
use crate::model::lane::ResourceLane;
use crate::model::timeline::TimelineColumn;

const HEADER: [&str; 8] = [
    "Resource Code",
    "Resource Name",
    "Type",
    "Period Start",
    "Available Hours",
    "Assigned Hours",
    "Utilization %",
    "Overallocated",
];

/// Export per-column utilization of `lanes` to a semicolon-delimited CSV file.
///
/// One row per lane and visible column; columns without an in-range day are
/// skipped. Dates are formatted as DD/MM/YYYY.
/// Returns the number of data rows written.
pub fn export_csv(lanes: &[ResourceLane], columns: &[TimelineColumn], path: &Path) -> Result<usize> {
    let fail = |source: csv::Error| Error::Export {
        path: path.to_path_buf(),
        source,
    };
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .from_path(path)
        .map_err(fail)?;

    wtr.write_record(HEADER).map_err(fail)?;

    let mut rows = 0;
    for lane in lanes {
        for point in lane.column_utilization(columns).into_iter().flatten() {
            let period = point.date.format("%d/%m/%Y").to_string();
            let available = format!("{:.1}", point.available_hours);
            let assigned = format!("{:.1}", point.assigned_hours);
            let percent = format!("{:.0}", point.utilization_percent);
            wtr.write_record([
                lane.resource_code.as_str(),
                lane.resource_name.as_str(),
                lane.resource_type.label(),
                period.as_str(),
                available.as_str(),
                assigned.as_str(),
                percent.as_str(),
                if point.is_overallocated { "yes" } else { "no" },
            ])
            .map_err(fail)?;
            rows += 1;
        }
    }

    wtr.flush().map_err(|e| fail(e.into()))?;
    tracing::info!(rows, path = %path.display(), "exported utilization");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::lane::build_lane;
    use crate::model::resource::{Assignment, Resource, ResourceType};
    use crate::model::timeline::{build_columns, DateRange, TimelineScale};
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, day).unwrap()
    }

    #[test]
    fn writes_one_row_per_lane_and_column() {
        let range = DateRange::new(d(2), d(4)).unwrap();
        let crane = Resource::new("CR-1", "Crane", ResourceType::Equipment);
        let lane = build_lane(&crane, vec![Assignment::new("A", d(3), d(3), 1.25)], &range);
        let columns = build_columns(d(2), d(4), TimelineScale::Days).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("utilization.csv");
        let rows = export_csv(&[lane], &columns, &path).unwrap();
        assert_eq!(rows, 3);

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Resource Code;Resource Name;Type"));
        assert_eq!(lines[2], "CR-1;Crane;Equipment;03/02/2026;8.0;10.0;125;yes");
    }

    #[test]
    fn unwritable_path_reports_export_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.csv");
        let err = export_csv(&[], &[], &path).unwrap_err();
        assert!(matches!(err, Error::Export { .. }));
    }
}
