// velxebot-core/src/auth/mod.rs

use std::collections::HashSet;

use velxebot_common::traits::platform_traits::Authorizer;

/// Authorizer backed by a fixed allow-list of Discord ids. The embedding
/// process expands roles into ids before constructing this.
pub struct StaticAuthorizer {
    allowed: HashSet<String>,
}

impl StaticAuthorizer {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: ids.into_iter().map(Into::into).collect(),
        }
    }
}

impl Authorizer for StaticAuthorizer {
    fn is_authorized(&self, discord_id: &str) -> bool {
        self.allowed.contains(discord_id)
    }
}
