// File: src/tasks/mod.rs

pub mod scheduler;

pub use scheduler::{ScheduledTask, TaskScheduler, TokioScheduler};
