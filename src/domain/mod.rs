// Domain layer - Pure types and derivations, no I/O
pub mod chart;
pub mod error;
pub mod metric;
pub mod telemetry;
