//! Access control for pipeline entry points.
//!
//! The allow-list is checked explicitly at the top of each handler; a
//! denied requester gets a localized refusal and the pipeline never runs.

use std::collections::HashSet;
use voxbot_types::RequesterId;

/// Verdict of an access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allowed,
    Denied,
}

/// Allow-list of requesters permitted to use the bot.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    allowed: HashSet<RequesterId>,
}

impl AccessPolicy {
    pub fn new(ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            allowed: ids.into_iter().map(RequesterId).collect(),
        }
    }

    /// Checks a requester against the allow-list.
    ///
    /// An empty allow-list means the bot is open to everyone.
    pub fn check(&self, requester: RequesterId) -> Access {
        if self.allowed.is_empty() || self.allowed.contains(&requester) {
            Access::Allowed
        } else {
            Access::Denied
        }
    }
}
