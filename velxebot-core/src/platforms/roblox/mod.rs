// File: src/platforms/roblox/mod.rs

pub mod client;

pub use client::RobloxClient;
