//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Cache maintenance: expiry cleanup and adaptive TTL extension per pool

mod maintenance;

pub use maintenance::{run_maintenance, spawn_maintenance_task, MaintenanceSummary};
