use clap::Subcommand;
use serde_json::json;

use crate::app::App;
use crate::auth::Registration;
use crate::cli::utils::*;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Sign in and store the session")]
    Login {
        #[arg(help = "Username")]
        username: String,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Create an account")]
    Register {
        #[arg(help = "Username")]
        username: String,
        #[arg(long, help = "Full name")]
        full_name: String,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Forget the stored session")]
    Logout,

    #[command(about = "Show current authentication status")]
    Status,

    #[command(about = "Show current user information")]
    Whoami,
}

pub async fn handle(cmd: AuthCommands, app: &App, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Login { username, password } => {
            let password = match password {
                Some(password) => password,
                None => prompt_secret("Password")?,
            };

            let response = app.auth().login(&username, &password).await?;
            output_success(
                &output_format,
                &format!("Signed in as {} ({})", response.username, response.role),
                Some(json!({ "username": response.username, "role": response.role })),
            )
        }
        AuthCommands::Register { username, full_name, password } => {
            let password = match password {
                Some(password) => password,
                None => prompt_secret("Password")?,
            };

            let registration = Registration {
                username: username.trim().to_string(),
                password,
                full_name,
            };
            app.auth().register(&registration).await?;
            output_success(
                &output_format,
                &format!("Account '{}' created. Sign in with `simig auth login {}`", registration.username, registration.username),
                Some(json!({ "username": registration.username })),
            )
        }
        AuthCommands::Logout => {
            app.logout().await?;
            output_success(&output_format, "Signed out", None)
        }
        AuthCommands::Status => {
            let session = app.session().get();
            let status = json!({
                "authenticated": session.is_authenticated(),
                "username": session.username,
                "role": session.role,
                "server": app.client().base_url(),
            });
            output_value(&output_format, &status, || match (&session.username, session.role) {
                (Some(username), Some(role)) if session.is_authenticated() => {
                    format!("Signed in as {} ({}) on {}", username, role, app.client().base_url())
                }
                _ if session.is_authenticated() => {
                    format!("Signed in on {}", app.client().base_url())
                }
                _ => "Not signed in".to_string(),
            })
        }
        AuthCommands::Whoami => {
            if !app.session().get().is_authenticated() {
                return Err(anyhow::anyhow!("Not signed in. Run `simig auth login <username>` first"));
            }

            let user = app.current_user().refetch().await?;
            output_value(&output_format, &user, || {
                let mut lines = vec![
                    format!("ID:        {}", user.id),
                    format!("Username:  {}", user.username),
                    format!("Full name: {}", user.display_name()),
                ];
                if let Some(email) = user.email.as_deref().filter(|e| !e.is_empty()) {
                    lines.push(format!("Email:     {}", email));
                }
                if let Some(role) = user.role {
                    lines.push(format!("Role:      {}", role));
                }
                if let Some(url) = &user.image_url {
                    lines.push(format!("Picture:   {}", url));
                }
                lines.join("\n")
            })
        }
    }
}
