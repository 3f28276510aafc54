// File: src/platforms/mod.rs

pub mod notifier;
pub mod roblox;

pub use notifier::LoggingNotifier;
