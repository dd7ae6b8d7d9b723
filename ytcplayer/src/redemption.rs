//! Routing of channel-point redemptions to a playback destination.
//!
//! A redemption plays a clip for the streamer in the primary destination
//! when the reward name contains the configured pattern (case-insensitive).

use crate::{DestinationId, RequesterId};
use tracing::debug;

/// Where a matching redemption should play
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedemptionRoute {
    pub destination: DestinationId,
    pub requester: RequesterId,
    pub clip_secs: u64,
}

#[derive(Debug, Clone)]
pub struct RedemptionMatcher {
    pattern: String,
    route: RedemptionRoute,
}

impl RedemptionMatcher {
    /// Returns `None` when `pattern` is blank, since it would match every reward.
    pub fn new(pattern: &str, route: RedemptionRoute) -> Option<Self> {
        let pattern = pattern.trim().to_lowercase();
        if pattern.is_empty() {
            return None;
        }
        Some(Self { pattern, route })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn route(&self) -> &RedemptionRoute {
        &self.route
    }

    pub fn matches(&self, reward_name: &str) -> bool {
        reward_name.to_lowercase().contains(&self.pattern)
    }

    pub fn route_for(&self, reward_name: &str) -> Option<&RedemptionRoute> {
        if self.matches(reward_name) {
            Some(&self.route)
        } else {
            debug!(reward = %reward_name, pattern = %self.pattern, "Redemption ignored");
            None
        }
    }
}
