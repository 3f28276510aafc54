// File: velxebot-core/src/repositories/sqlite/mod.rs

pub mod licenses;
pub mod linked_identities;
