//! Share-related domain events.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events related to forward shares.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ShareEvent {
    /// A share was created.
    Created {
        /// The share ID.
        share_id: Uuid,
        /// Number of files in the share.
        file_count: usize,
    },
    /// A share was resolved by an anonymous caller.
    Resolved {
        /// The share ID.
        share_id: Uuid,
        /// View count after the increment.
        views: i32,
    },
    /// The owner asked for the share link to be sent to every recipient.
    /// Delivery is left to subscribers.
    RecipientsNotified {
        /// The share ID.
        share_id: Uuid,
        /// Share name, for the message subject.
        share_name: Option<String>,
        /// Link the recipients should open.
        link: String,
        /// Addresses to notify.
        recipients: Vec<String>,
    },
    /// A share was deleted by its owner.
    Deleted {
        /// The share ID.
        share_id: Uuid,
    },
}
