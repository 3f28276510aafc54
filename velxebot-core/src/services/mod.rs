// File: src/services/mod.rs

pub mod event_handler;
pub mod giveaway_service;
pub mod license_service;
pub mod link_service;
pub mod purchase_service;

pub use event_handler::{CommandEvent, EventHandler, Reply};
pub use giveaway_service::GiveawayService;
pub use license_service::LicenseService;
pub use link_service::LinkService;
pub use purchase_service::PurchaseService;
