use clap::Subcommand;
use serde_json::json;
use std::path::PathBuf;

use crate::app::App;
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::gate::Screen;
use crate::profile::{PasswordChange, ProfileDraft};

#[derive(Subcommand)]
pub enum ProfileCommands {
    #[command(about = "Show your profile")]
    Show,

    #[command(about = "Change username or full name")]
    Update {
        #[arg(long, help = "New username")]
        username: Option<String>,
        #[arg(long, help = "New full name")]
        full_name: Option<String>,
    },

    #[command(about = "Change your password (prompts for missing values)")]
    Password {
        #[arg(long, help = "Current password")]
        old: Option<String>,
        #[arg(long, help = "New password")]
        new: Option<String>,
        #[arg(long, help = "New password again")]
        confirm: Option<String>,
    },

    #[command(about = "Replace your profile picture")]
    UploadImage {
        #[arg(help = "Image file")]
        path: PathBuf,
    },
}

fn secret(value: Option<String>, label: &str) -> anyhow::Result<String> {
    match value {
        Some(value) => Ok(value),
        None => prompt_secret(label),
    }
}

pub async fn handle(cmd: ProfileCommands, app: &App, output_format: OutputFormat) -> anyhow::Result<()> {
    require(app, Screen::Profile)?;
    let profile = app.profile();

    match cmd {
        ProfileCommands::Show => {
            let user = profile.fetch().await?;
            output_value(&output_format, &user, || {
                format!(
                    "{} ({})\nUsername: {}\nEmail:    {}\nPicture:  {}",
                    user.display_name(),
                    user.role.map(|r| r.to_string()).unwrap_or_else(|| "-".to_string()),
                    user.username,
                    user.email.as_deref().unwrap_or("-"),
                    user.image_url.as_deref().unwrap_or("-"),
                )
            })
        }
        ProfileCommands::Update { username, full_name } => {
            if username.is_none() && full_name.is_none() {
                return Err(anyhow::anyhow!("Nothing to change: pass --username and/or --full-name"));
            }

            let current = profile.fetch().await?;
            let mut draft = ProfileDraft::from(&current);
            if let Some(username) = username {
                draft.username = username;
            }
            if let Some(full_name) = full_name {
                draft.full_name = full_name;
            }

            let user = profile.update(&draft).await?;
            output_success(
                &output_format,
                "Profile updated",
                Some(json!({ "username": user.username, "full_name": user.full_name })),
            )
        }
        ProfileCommands::Password { old, new, confirm } => {
            let change = PasswordChange {
                old_password: secret(old, "Current password")?,
                new_password: secret(new, "New password")?,
                confirm_password: secret(confirm, "Repeat new password")?,
            };
            profile.change_password(&change).await?;
            output_success(&output_format, "Password changed", None)
        }
        ProfileCommands::UploadImage { path } => {
            let image_url = profile.upload_image_file(&path).await?;
            output_success(
                &output_format,
                &format!("Picture updated: {}", image_url),
                Some(json!({ "image_url": image_url })),
            )
        }
    }
}
