pub mod dialogs;
pub mod filter_bar;
pub mod gantt_chart;
pub mod histogram;
pub mod leveling_panel;
pub mod resource_table;
pub mod theme;
pub mod toasts;
pub mod toolbar;
