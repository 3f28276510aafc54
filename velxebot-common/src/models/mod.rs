// File: velxebot-common/src/models/mod.rs
pub mod giveaway;
pub mod identity;
pub mod license;
pub mod product;

pub use giveaway::{EntryOutcome, Giveaway, GiveawayOutcome};
pub use identity::LinkedIdentity;
pub use license::{License, NewLicense};
pub use product::{Catalog, DownloadRef, Product, ProductStatus};
