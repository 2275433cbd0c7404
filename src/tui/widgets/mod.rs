//! TUI widgets

pub mod help;
pub mod revenue_chart;
pub mod spinner;
pub mod user_list;
