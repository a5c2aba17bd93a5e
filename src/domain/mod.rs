// Domain layer - pure types and logic, no I/O
pub mod backend;
pub mod chart;
pub mod observation;
pub mod query;
pub mod session;
