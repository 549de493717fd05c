//! Request DTOs with validation.

use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use sharegate_service::access::UploadRequest;

/// Body of `POST /api/s/{alias}`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResolveShareBody {
    #[validate(length(max = 256))]
    pub password: Option<String>,
    /// Restrict the handles to these files.
    pub file_ids: Option<Vec<Uuid>>,
}

/// Body of `POST /api/r/{alias}`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OpenReverseShareBody {
    #[validate(length(max = 256))]
    pub password: Option<String>,
}

/// Body of `POST /api/r/{alias}/uploads`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeUploadBody {
    #[validate(length(max = 256))]
    pub password: Option<String>,
    #[validate(length(min = 1, max = 255, message = "File name is required"))]
    pub file_name: String,
    #[validate(range(min = 0, message = "Size must not be negative"))]
    pub size: i64,
}

impl AuthorizeUploadBody {
    /// Split into the password and the upload the resolver checks.
    pub fn into_parts(self) -> (Option<String>, UploadRequest) {
        (
            self.password,
            UploadRequest {
                file_name: self.file_name,
                size: self.size,
            },
        )
    }
}

/// Set or clear a password. `null` removes protection.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PasswordBody {
    #[validate(length(min = 1, max = 256, message = "Password must not be empty"))]
    pub password: Option<String>,
}

/// Body of the set-alias routes.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AliasBody {
    #[validate(length(min = 1, message = "Alias is required"))]
    pub alias: String,
}

/// Files to add to or remove from a share.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FileIdsBody {
    #[validate(length(min = 1, message = "At least one file is required"))]
    pub file_ids: Vec<Uuid>,
}

/// Recipients to add to or remove from a share.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RecipientsBody {
    #[validate(length(min = 1, message = "At least one recipient is required"))]
    pub recipients: Vec<String>,
}

/// Link to send to a share's recipients.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NotifyBody {
    #[validate(url(message = "Share link must be a URL"))]
    pub share_link: String,
}

/// Rename of an uploaded reverse share file.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RenameFileBody {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
}

/// Query of the download redemption route.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadQuery {
    /// Client-chosen queue id, so another request can poll or cancel.
    pub download_id: Option<Uuid>,
}
