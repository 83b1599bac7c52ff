use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::client::ApiClient;
use crate::error::{ApiError, ValidationError};
use crate::events::{AppEvent, EventBus};
use crate::user_cache::PROFILE_ENDPOINT;
use crate::users::CurrentUser;

pub const PASSWORD_ENDPOINT: &str = "/users/profile/change-password/";
pub const IMAGE_ENDPOINT: &str = "/users/profile/upload-image/";

/// Fields a user may change on their own profile. Role is not one of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDraft {
    pub username: String,
    pub full_name: String,
}

impl From<&CurrentUser> for ProfileDraft {
    fn from(user: &CurrentUser) -> Self {
        Self {
            username: user.username.clone(),
            full_name: user.full_name.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PasswordChange {
    pub old_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ImageResponse {
    image_url: String,
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("failed to load profile: {}", .0.message())]
    Fetch(#[source] ApiError),

    #[error("failed to update profile: {}", .0.message())]
    Update(#[source] ApiError),

    #[error("wrong current password or the change was rejected: {}", .0.message())]
    Password(#[source] ApiError),

    #[error("failed to upload picture: {}", .0.message())]
    Upload(#[source] ApiError),

    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Profile screen operations. Successful profile and picture changes are
/// announced on the event bus so the shared user record refreshes.
#[derive(Debug, Clone)]
pub struct ProfileService {
    client: ApiClient,
    events: Arc<EventBus>,
}

impl ProfileService {
    pub fn new(client: ApiClient, events: Arc<EventBus>) -> Self {
        Self { client, events }
    }

    pub async fn fetch(&self) -> Result<CurrentUser, ProfileError> {
        self.client
            .get(PROFILE_ENDPOINT)
            .await
            .map_err(ProfileError::Fetch)
    }

    pub async fn update(&self, draft: &ProfileDraft) -> Result<CurrentUser, ProfileError> {
        if draft.username.trim().is_empty() {
            return Err(ValidationError::required("username").into());
        }

        let user: CurrentUser = self
            .client
            .put(PROFILE_ENDPOINT, draft)
            .await
            .map_err(|e| {
                tracing::error!("Profile update failed: {}", e);
                ProfileError::Update(e)
            })?;

        tracing::info!("Profile updated for {}", user.username);
        self.events.publish(AppEvent::ProfileUpdated).await;
        Ok(user)
    }

    /// The confirmation must match before anything is sent.
    pub async fn change_password(&self, change: &PasswordChange) -> Result<(), ProfileError> {
        if change.old_password.is_empty() || change.new_password.is_empty() {
            return Err(ValidationError::new("new_password", "old and new password are required").into());
        }
        if change.new_password != change.confirm_password {
            return Err(ValidationError::new("confirm_password", "password confirmation does not match").into());
        }

        self.client
            .put::<_, serde_json::Value>(PASSWORD_ENDPOINT, change)
            .await
            .map_err(|e| {
                tracing::error!("Password change failed: {}", e);
                ProfileError::Password(e)
            })?;
        tracing::info!("Password changed");
        Ok(())
    }

    /// Upload a new picture and return the URL the server stored it under.
    pub async fn upload_image(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, ProfileError> {
        if bytes.is_empty() {
            return Err(ValidationError::new("image", "no picture selected").into());
        }

        let response: ImageResponse = self
            .client
            .put_file(IMAGE_ENDPOINT, "image", file_name, bytes)
            .await
            .map_err(|e| {
                tracing::error!("Picture upload failed: {}", e);
                ProfileError::Upload(e)
            })?;

        tracing::info!("Profile picture replaced");
        self.events.publish(AppEvent::ProfileUpdated).await;
        Ok(response.image_url)
    }

    pub async fn upload_image_file(&self, path: &Path) -> Result<String, ProfileError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| ProfileError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        self.upload_image(&file_name, bytes).await
    }
}
