//! Reverse-share and adoption events.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events related to reverse shares.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ReverseShareEvent {
    /// An anonymous upload was registered.
    FileRegistered {
        /// The reverse share ID.
        reverse_share_id: Uuid,
        /// The registered file ID.
        file_id: Uuid,
        /// Object name in the store.
        object_name: String,
        /// Stored size in bytes.
        size: i64,
    },
    /// An uploaded file was deleted by the owner.
    FileDeleted {
        /// The reverse share ID.
        reverse_share_id: Uuid,
        /// The deleted file ID.
        file_id: Uuid,
    },
}

/// Outcome of an adoption attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AdoptionEvent {
    /// The file now lives in the owner's library.
    Adopted {
        /// The reverse share file ID.
        reverse_share_file_id: Uuid,
        /// The new library file ID.
        library_file_id: Uuid,
    },
    /// The attempt failed; the source object is untouched.
    Failed {
        /// The reverse share file ID.
        reverse_share_file_id: Uuid,
        /// Error code of the failure.
        reason: String,
    },
}
