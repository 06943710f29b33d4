use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Column width in pixels for each scale.
pub const DAY_COLUMN_WIDTH: f32 = 32.0;
pub const WEEK_COLUMN_WIDTH: f32 = 84.0;
pub const MONTH_COLUMN_WIDTH: f32 = 140.0;

/// Controls what calendar unit one timeline column represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelineScale {
    #[serde(alias = "day")]
    Days,
    #[serde(alias = "week")]
    Weeks,
    #[serde(alias = "month")]
    Months,
}

impl TimelineScale {
    pub fn all() -> &'static [TimelineScale] {
        &[TimelineScale::Days, TimelineScale::Weeks, TimelineScale::Months]
    }

    pub fn label(self) -> &'static str {
        match self {
            TimelineScale::Days => "Day",
            TimelineScale::Weeks => "Week",
            TimelineScale::Months => "Month",
        }
    }

    pub fn column_width(self) -> f32 {
        match self {
            TimelineScale::Days => DAY_COLUMN_WIDTH,
            TimelineScale::Weeks => WEEK_COLUMN_WIDTH,
            TimelineScale::Months => MONTH_COLUMN_WIDTH,
        }
    }

    /// One step towards more detail (Ctrl+Scroll up).
    pub fn finer(self) -> Self {
        match self {
            TimelineScale::Months => TimelineScale::Weeks,
            _ => TimelineScale::Days,
        }
    }

    /// One step towards less detail (Ctrl+Scroll down).
    pub fn coarser(self) -> Self {
        match self {
            TimelineScale::Days => TimelineScale::Weeks,
            _ => TimelineScale::Months,
        }
    }
}

/// An inclusive, validated span of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Fails with [`Error::InvalidRange`] when `end` is before `start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(Error::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of calendar days in the range (always at least 1).
    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Iterate every day of the range in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

/// One calendar column of the resource grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineColumn {
    /// First calendar day of the unit (the Monday for weeks, the 1st for months).
    pub date: NaiveDate,
    /// Last calendar day of the unit.
    pub end: NaiveDate,
    pub label: String,
    pub is_weekend: bool,
    /// `YYYY-MM` of the first day of this column that lies inside the range.
    pub month_key: String,
}

impl TimelineColumn {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.date <= date && date <= self.end
    }
}

/// A second-level header cell spanning consecutive columns of one month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGroup {
    pub key: String,
    pub label: String,
    pub first_column: usize,
    pub span: usize,
}

/// Build the ordered grid columns between `start` and `end` (inclusive).
pub fn build_columns(
    start: NaiveDate,
    end: NaiveDate,
    scale: TimelineScale,
) -> Result<Vec<TimelineColumn>> {
    let range = DateRange::new(start, end)?;
    Ok(columns_for(&range, scale))
}

/// Same as [`build_columns`] for an already validated range.
pub fn columns_for(range: &DateRange, scale: TimelineScale) -> Vec<TimelineColumn> {
    let mut columns = Vec::new();
    match scale {
        TimelineScale::Days => {
            for date in range.days() {
                columns.push(TimelineColumn {
                    date,
                    end: date,
                    label: date.day().to_string(),
                    is_weekend: is_weekend(date),
                    month_key: month_key(date),
                });
            }
        }
        TimelineScale::Weeks => {
            let mut date = week_start(range.start());
            while date <= range.end() {
                let end = date + chrono::Duration::days(6);
                columns.push(TimelineColumn {
                    date,
                    end,
                    label: date.format("W%V").to_string(),
                    is_weekend: false,
                    month_key: month_key(date.max(range.start())),
                });
                date += chrono::Duration::days(7);
            }
        }
        TimelineScale::Months => {
            let mut date = month_start(range.start());
            while date <= range.end() {
                let next = next_month_start(date);
                columns.push(TimelineColumn {
                    date,
                    end: next - chrono::Duration::days(1),
                    label: date.format("%b %Y").to_string(),
                    is_weekend: false,
                    month_key: month_key(date.max(range.start())),
                });
                date = next;
            }
        }
    }
    columns
}

/// Group columns under month headers by scanning for `month_key` transitions.
pub fn month_groups(columns: &[TimelineColumn]) -> Vec<MonthGroup> {
    let mut groups: Vec<MonthGroup> = Vec::new();
    for (idx, column) in columns.iter().enumerate() {
        match groups.last_mut() {
            Some(group) if group.key == column.month_key => group.span += 1,
            _ => groups.push(MonthGroup {
                key: column.month_key.clone(),
                label: month_label(&column.month_key),
                first_column: idx,
                span: 1,
            }),
        }
    }
    groups
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - chrono::Duration::days(date.weekday().num_days_from_monday() as i64)
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn next_month_start(date: NaiveDate) -> NaiveDate {
    let (y, m) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(y, m, 1).unwrap_or(date + chrono::Duration::days(31))
}

fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

fn month_label(key: &str) -> String {
    NaiveDate::parse_from_str(&format!("{key}-01"), "%Y-%m-%d")
        .map(|d| d.format("%b %Y").to_string())
        .unwrap_or_else(|_| key.to_string())
}

/// View configuration of the resource grid. Owned by the application root.
#[derive(Debug, Clone, PartialEq)]
pub struct GanttViewConfig {
    start_date: NaiveDate,
    end_date: NaiveDate,
    pub scale: TimelineScale,
    pub row_height: f32,
    pub header_height: f32,
    pub sidebar_width: f32,
    pub show_utilization: bool,
    pub highlight_overallocations: bool,
}

impl GanttViewConfig {
    pub fn new(range: DateRange, scale: TimelineScale) -> Self {
        Self {
            start_date: range.start(),
            end_date: range.end(),
            scale,
            row_height: 30.0,
            header_height: 44.0,
            sidebar_width: 320.0,
            show_utilization: true,
            highlight_overallocations: true,
        }
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn range(&self) -> DateRange {
        DateRange {
            start: self.start_date,
            end: self.end_date,
        }
    }

    /// Replace the visible range; rejects an end before the start.
    pub fn set_range(&mut self, start: NaiveDate, end: NaiveDate) -> Result<()> {
        let range = DateRange::new(start, end)?;
        self.start_date = range.start();
        self.end_date = range.end();
        Ok(())
    }

    pub fn set_scale(&mut self, scale: TimelineScale) {
        self.scale = scale;
    }

    pub fn toggle_utilization(&mut self) {
        self.show_utilization = !self.show_utilization;
    }

    pub fn toggle_overallocation_highlight(&mut self) {
        self.highlight_overallocations = !self.highlight_overallocations;
    }

    /// Scroll the range by a number of days.
    pub fn shift_days(&mut self, days: i64) {
        self.start_date += chrono::Duration::days(days);
        self.end_date += chrono::Duration::days(days);
    }

    pub fn column_width(&self) -> f32 {
        self.scale.column_width()
    }

    pub fn columns(&self) -> Vec<TimelineColumn> {
        columns_for(&self.range(), self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn day_scale_flags_weekends() {
        let cols = build_columns(d(2026, 2, 2), d(2026, 2, 15), TimelineScale::Days).unwrap();
        assert_eq!(cols.len(), 14);
        let by_date = |date| cols.iter().find(|c| c.date == date).unwrap();
        assert!(by_date(d(2026, 2, 7)).is_weekend);
        assert!(by_date(d(2026, 2, 8)).is_weekend);
        assert!(!by_date(d(2026, 2, 6)).is_weekend);
    }

    #[test]
    fn day_labels_are_day_of_month() {
        let cols = build_columns(d(2026, 2, 10), d(2026, 2, 12), TimelineScale::Days).unwrap();
        let labels: Vec<_> = cols.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, ["10", "11", "12"]);
    }

    #[test]
    fn single_day_range_yields_one_column() {
        for scale in TimelineScale::all() {
            let cols = build_columns(d(2026, 3, 4), d(2026, 3, 4), *scale).unwrap();
            assert_eq!(cols.len(), 1, "{scale:?}");
        }
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = build_columns(d(2026, 2, 15), d(2026, 2, 2), TimelineScale::Days).unwrap_err();
        assert!(matches!(err, Error::InvalidRange { .. }));
    }

    #[test]
    fn week_columns_start_on_monday_and_use_iso_numbers() {
        // 2026-02-04 is a Wednesday in ISO week 6.
        let cols = build_columns(d(2026, 2, 4), d(2026, 2, 16), TimelineScale::Weeks).unwrap();
        assert_eq!(cols.len(), 3);
        assert_eq!(cols[0].date, d(2026, 2, 2));
        assert_eq!(cols[0].end, d(2026, 2, 8));
        assert_eq!(cols[0].label, "W06");
        assert_eq!(cols[2].label, "W08");
    }

    #[test]
    fn month_columns_cover_partial_months() {
        let cols = build_columns(d(2025, 12, 20), d(2026, 2, 3), TimelineScale::Months).unwrap();
        let labels: Vec<_> = cols.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, ["Dec 2025", "Jan 2026", "Feb 2026"]);
        assert_eq!(cols[1].end, d(2026, 1, 31));
    }

    #[test]
    fn february_range_has_single_month_group() {
        let cols = build_columns(d(2026, 2, 2), d(2026, 2, 15), TimelineScale::Days).unwrap();
        let groups = month_groups(&cols);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].label, "Feb 2026");
        assert_eq!(groups[0].span, 14);
    }

    #[test]
    fn month_groups_split_at_transitions() {
        let cols = build_columns(d(2026, 1, 30), d(2026, 2, 2), TimelineScale::Days).unwrap();
        let groups = month_groups(&cols);
        assert_eq!(groups.len(), 2);
        assert_eq!((groups[0].first_column, groups[0].span), (0, 2));
        assert_eq!((groups[1].first_column, groups[1].span), (2, 2));
    }

    #[test]
    fn first_week_column_is_grouped_with_range_start_month() {
        // Monday of this week is 2026-01-26, but the range begins in February.
        let cols = build_columns(d(2026, 2, 1), d(2026, 2, 20), TimelineScale::Weeks).unwrap();
        assert_eq!(cols[0].month_key, "2026-02");
        assert_eq!(month_groups(&cols).len(), 1);
    }

    #[test]
    fn config_rejects_inverted_range_and_keeps_previous() {
        let range = DateRange::new(d(2026, 2, 2), d(2026, 2, 15)).unwrap();
        let mut config = GanttViewConfig::new(range, TimelineScale::Days);
        assert!(config.set_range(d(2026, 3, 1), d(2026, 2, 1)).is_err());
        assert_eq!(config.range(), range);
    }

    #[test]
    fn scale_steps_saturate() {
        assert_eq!(TimelineScale::Days.finer(), TimelineScale::Days);
        assert_eq!(TimelineScale::Months.coarser(), TimelineScale::Months);
        assert_eq!(TimelineScale::Weeks.coarser(), TimelineScale::Months);
    }

    fn arb_date() -> impl Strategy<Value = NaiveDate> {
        (0i64..3000).prop_map(|offset| d(2024, 1, 1) + chrono::Duration::days(offset))
    }

    proptest! {
        #[test]
        fn day_column_count_matches_span(start in arb_date(), len in 0i64..400) {
            let end = start + chrono::Duration::days(len);
            let cols = build_columns(start, end, TimelineScale::Days).unwrap();
            prop_assert_eq!(cols.len() as i64, len + 1);
        }

        #[test]
        fn week_column_count_matches_span(start in arb_date(), len in 0i64..400) {
            let end = start + chrono::Duration::days(len);
            let cols = build_columns(start, end, TimelineScale::Weeks).unwrap();
            let weeks = (week_start(end) - week_start(start)).num_days() / 7;
            prop_assert_eq!(cols.len() as i64, weeks + 1);
        }

        #[test]
        fn month_column_count_matches_span(start in arb_date(), len in 0i64..800) {
            let end = start + chrono::Duration::days(len);
            let cols = build_columns(start, end, TimelineScale::Months).unwrap();
            let months = (end.year() * 12 + end.month() as i32)
                - (start.year() * 12 + start.month() as i32);
            prop_assert_eq!(cols.len() as i32, months + 1);
        }

        #[test]
        fn building_twice_is_identical(start in arb_date(), len in 0i64..120) {
            let end = start + chrono::Duration::days(len);
            for scale in TimelineScale::all() {
                prop_assert_eq!(
                    build_columns(start, end, *scale).unwrap(),
                    build_columns(start, end, *scale).unwrap()
                );
            }
        }
    }
}
