pub mod filter;
pub mod lane;
pub mod layout;
pub mod leveling;
pub mod resource;
pub mod timeline;
pub mod utilization;

pub use filter::{FilterState, FilterStats};
pub use lane::ResourceLane;
pub use layout::{BarCommand, BarGeometry};
pub use resource::{Assignment, AssignmentRecord, Resource, ResourceType};
pub use timeline::{DateRange, GanttViewConfig, TimelineColumn, TimelineScale};
pub use utilization::{Granularity, UtilizationPoint, UtilizationSummary};
