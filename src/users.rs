use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;

use crate::error::ValidationError;
use crate::resource::{DraftContext, FormMode, Resource};
use crate::session::Role;

/// The signed-in user as `/users/profile/` returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl CurrentUser {
    /// Full name when set, otherwise the username.
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.username)
    }
}

/// Account row on the admin user-management screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedUser {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedUserDraft {
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    pub role: Role,
    /// Required on create; blank on edit keeps the current password
    #[serde(default)]
    pub password: String,
}

impl Default for ManagedUserDraft {
    fn default() -> Self {
        Self {
            username: String::new(),
            email: String::new(),
            full_name: String::new(),
            role: Role::User,
            password: String::new(),
        }
    }
}

impl Resource for ManagedUser {
    type Draft = ManagedUserDraft;
    type Reference = ();

    const ENDPOINT: &'static str = "/users/manage/";
    const NOUN: &'static str = "user";

    fn id(&self) -> i64 {
        self.id
    }

    fn search_text(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Borrowed(self.username.as_str()),
            Cow::Borrowed(self.full_name.as_deref().unwrap_or("")),
        ]
    }

    fn label(&self) -> String {
        self.username.clone()
    }

    fn to_draft(&self) -> ManagedUserDraft {
        ManagedUserDraft {
            username: self.username.clone(),
            email: self.email.clone().unwrap_or_default(),
            full_name: self.full_name.clone().unwrap_or_default(),
            role: self.role,
            password: String::new(),
        }
    }

    fn validate(draft: &ManagedUserDraft, ctx: &DraftContext<'_, Self>) -> Result<(), ValidationError> {
        if draft.username.trim().is_empty() {
            return Err(ValidationError::new("username", "username is required"));
        }
        if ctx.mode == FormMode::Create && draft.password.is_empty() {
            return Err(ValidationError::new("password", "password is required for a new user"));
        }
        Ok(())
    }

    fn summary(draft: &ManagedUserDraft, ctx: &DraftContext<'_, Self>) -> String {
        match ctx.mode {
            FormMode::Create => format!("Add {} '{}'?", draft.role, draft.username.trim()),
            FormMode::Edit(_) if draft.password.is_empty() => {
                format!("Update user '{}' as {}?", draft.username.trim(), draft.role)
            }
            FormMode::Edit(_) => format!(
                "Update user '{}' as {} and set a new password?",
                draft.username.trim(),
                draft.role
            ),
        }
    }

    fn payload(draft: &ManagedUserDraft, _mode: FormMode) -> Result<Value, serde_json::Error> {
        let mut body = Map::new();
        body.insert("username".into(), Value::from(draft.username.trim()));
        body.insert("email".into(), Value::from(draft.email.trim()));
        body.insert("full_name".into(), Value::from(draft.full_name.trim()));
        body.insert("role".into(), serde_json::to_value(draft.role)?);
        if !draft.password.is_empty() {
            body.insert("password".into(), Value::from(draft.password.as_str()));
        }
        Ok(Value::Object(body))
    }
}
