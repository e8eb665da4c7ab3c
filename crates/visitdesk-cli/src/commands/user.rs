//! Staff account commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use visitdesk_core::config::AppConfig;
use visitdesk_core::error::AppError;
use visitdesk_entity::user::{User, UserRole, UserStatus};
use visitdesk_service::RequestContext;

use crate::output::{self, OutputFormat};

/// Arguments for user commands
#[derive(Debug, Args)]
pub struct UserArgs {
    /// User subcommand
    #[command(subcommand)]
    pub command: UserCommand,
}

/// User subcommands
#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// List all accounts
    List {
        /// Filter by role (admin, manager, staff, security)
        #[arg(short, long)]
        role: Option<String>,
    },
    /// Re-enable an account
    Enable {
        /// Username
        username: String,
    },
    /// Disable an account
    Disable {
        /// Username
        username: String,
    },
}

#[derive(Debug, Serialize, Tabled)]
struct UserRow {
    id: String,
    username: String,
    name: String,
    role: String,
    status: String,
    last_login: String,
}

impl From<&User> for UserRow {
    fn from(u: &User) -> Self {
        Self {
            id: u.id.to_string(),
            username: u.username.clone(),
            name: output::or_dash(u.display_name.as_deref()),
            role: u.role.to_string(),
            status: u.status.as_str().to_string(),
            last_login: u
                .last_login_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "never".to_string()),
        }
    }
}

/// Execute user commands
pub async fn execute(
    args: &UserArgs,
    config: AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let state = super::open_state(config).await?;

    match &args.command {
        UserCommand::List { role } => {
            let role = role.as_deref().map(str::parse::<UserRole>).transpose()?;
            let users = state.stores.users.find_all().await?;
            let rows: Vec<UserRow> = users
                .iter()
                .filter(|u| role.is_none_or(|r| u.role == r))
                .map(UserRow::from)
                .collect();
            output::print_list(&rows, format);
        }
        UserCommand::Enable { username } => {
            set_status(&state, username, UserStatus::Active).await?;
            output::print_success(&format!("User '{}' enabled", username));
        }
        UserCommand::Disable { username } => {
            set_status(&state, username, UserStatus::Inactive).await?;
            output::print_success(&format!("User '{}' disabled", username));
        }
    }

    Ok(())
}

async fn set_status(
    state: &visitdesk_api::AppState,
    username: &str,
    status: UserStatus,
) -> Result<(), AppError> {
    let user = state
        .stores
        .users
        .find_by_username(username)
        .await?
        .ok_or_else(|| AppError::not_found(format!("User '{}' not found", username)))?;
    state
        .admin_user_service
        .change_status(&RequestContext::system(), user.id, status)
        .await?;
    Ok(())
}
