pub mod utilization_export;
