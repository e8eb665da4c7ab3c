//! Administrator account commands.

use clap::{Args, Subcommand};

use visitdesk_core::config::AppConfig;
use visitdesk_core::error::AppError;
use visitdesk_entity::user::UserRole;
use visitdesk_service::RequestContext;
use visitdesk_service::user::admin::CreateUserRequest;

use crate::output::{self, OutputFormat};

/// Arguments for admin commands
#[derive(Debug, Args)]
pub struct AdminArgs {
    /// Admin subcommand
    #[command(subcommand)]
    pub command: AdminCommand,
}

/// Admin subcommands
#[derive(Debug, Subcommand)]
pub enum AdminCommand {
    /// Create an administrator account
    Create {
        /// Username
        #[arg(short, long)]
        username: Option<String>,
        /// Email
        #[arg(short, long)]
        email: Option<String>,
        /// Password (will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Reset any account's password
    ResetPassword {
        /// Username
        #[arg(short, long)]
        username: String,
        /// New password (will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,
    },
}

/// Execute admin commands
pub async fn execute(
    args: &AdminArgs,
    config: AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let state = super::open_state(config).await?;

    match &args.command {
        AdminCommand::Create {
            username,
            email,
            password,
        } => {
            let username = match username {
                Some(u) => u.clone(),
                None => dialoguer::Input::new()
                    .with_prompt("Admin username")
                    .interact_text()
                    .map_err(super::input_error)?,
            };

            let email = match email {
                Some(e) => Some(e.clone()),
                None => {
                    let e: String = dialoguer::Input::new()
                        .with_prompt("Admin email (optional, press Enter to skip)")
                        .allow_empty(true)
                        .interact_text()
                        .map_err(super::input_error)?;
                    if e.is_empty() { None } else { Some(e) }
                }
            };

            let password = match password {
                Some(p) => p.clone(),
                None => prompt_password("Admin password")?,
            };

            let user = state
                .admin_user_service
                .bootstrap_admin(CreateUserRequest {
                    username: username.clone(),
                    email,
                    password,
                    display_name: Some(username.clone()),
                    job_title: None,
                    role: UserRole::Admin,
                })
                .await?;

            output::print_success(&format!(
                "Admin user '{}' created (id: {})",
                user.username, user.id
            ));
            if format == OutputFormat::Json {
                output::print_item(&user, format);
            }
        }
        AdminCommand::ResetPassword { username, password } => {
            let user = state
                .stores
                .users
                .find_by_username(username)
                .await?
                .ok_or_else(|| AppError::not_found(format!("User '{}' not found", username)))?;

            let password = match password {
                Some(p) => p.clone(),
                None => prompt_password("New password")?,
            };

            state
                .admin_user_service
                .reset_password(&RequestContext::system(), user.id, &password)
                .await?;
            output::print_success(&format!("Password reset for '{}'", user.username));
        }
    }

    Ok(())
}

fn prompt_password(prompt: &str) -> Result<String, AppError> {
    dialoguer::Password::new()
        .with_prompt(prompt)
        .with_confirmation("Confirm password", "Passwords do not match")
        .interact()
        .map_err(super::input_error)
}
