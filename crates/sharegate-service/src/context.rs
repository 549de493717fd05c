//! Request context carrying the authenticated owner.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use sharegate_core::types::UserId;

/// Context for an owner-scoped request.
///
/// Built by the HTTP layer from a verified access token and passed into
/// every owner operation, so each service knows *who* is acting.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// The authenticated owner.
    pub user_id: UserId,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            request_time: Utc::now(),
        }
    }

    /// The owner id as stored on entities.
    pub fn owner_id(&self) -> Uuid {
        self.user_id.into_uuid()
    }

    /// Whether the caller owns an entity with `owner_id`.
    pub fn owns(&self, owner_id: Uuid) -> bool {
        self.owner_id() == owner_id
    }
}
