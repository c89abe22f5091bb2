// Presentation layer - HTTP surface of the chart panel
pub mod app_state;
pub mod handlers;
