use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A running giveaway. Lives only in process memory; an open giveaway does
/// not survive a restart.
#[derive(Debug, Clone)]
pub struct Giveaway {
    pub giveaway_id: Uuid,
    /// Channel the announcement message was posted to.
    pub channel_ref: String,
    /// The announcement message users react to.
    pub message_ref: String,
    pub product_name: String,
    pub winner_count: u32,
    pub host_id: String,
    pub end_time: DateTime<Utc>,
}

impl Giveaway {
    pub fn new(
        channel_ref: &str,
        message_ref: &str,
        product_name: &str,
        winner_count: u32,
        host_id: &str,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            giveaway_id: Uuid::new_v4(),
            channel_ref: channel_ref.to_string(),
            message_ref: message_ref.to_string(),
            product_name: product_name.to_string(),
            winner_count,
            host_id: host_id.to_string(),
            end_time,
        }
    }
}

/// Result of drawing a giveaway, handed back for the closing announcement.
#[derive(Debug, Clone)]
pub struct GiveawayOutcome {
    pub giveaway_id: Uuid,
    pub channel_ref: String,
    pub product_name: String,
    pub winners: Vec<String>,
    pub entrant_count: usize,
}

/// How a single reaction event was applied to a giveaway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOutcome {
    /// The user is in the entrant list.
    Entered,
    /// Gating failed; the caller should retract the reaction.
    Rejected,
    /// Not a giveaway reaction (wrong emoji, unknown message, or a bot).
    Ignored,
}
