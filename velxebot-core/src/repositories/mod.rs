// src/repositories/mod.rs

pub mod sqlite;

pub use sqlite::licenses::SqliteLicenseRepository;
pub use sqlite::linked_identities::SqliteLinkedIdentityRepository;
