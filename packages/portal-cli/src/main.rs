//! Terminal front end for the course-enrollment portals.
//!
//! Runs one command and exits, or opens an interactive menu when no command is
//! given. Session-scoped portals (student by default) only keep their session
//! for the lifetime of the menu.

mod console;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Input, Password, Select};
use portal_session::{ChangePasswordForm, Credentials, Portal, PortalConfig, Role, SessionError};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::console::ConsoleNotifier;

#[derive(Parser)]
#[command(name = "portal")]
#[command(about = "Sign in to the course-enrollment portals from a terminal")]
struct Cli {
    /// Portal to act as (falls back to PORTAL_ROLE)
    #[arg(long, global = true)]
    role: Option<Role>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and open the landing page
    Login {
        #[arg(long, short)]
        username: Option<String>,
        #[arg(long, short)]
        password: Option<String>,
    },

    /// Navigate to a route, running the guard
    Navigate { path: String },

    /// Show the current session
    Whoami,

    /// Reload the secondary identity (student number, avatar)
    Refresh,

    /// Sign out and return to the login page
    Logout,

    /// Change the signed-in user's password
    ChangePassword,

    /// List this portal's routes
    Routes,
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,portal_session=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.role).context("Failed to load configuration")?;
    let portal = build_portal(config)?;

    match cli.command {
        Some(command) => run(&portal, command).await,
        None => interactive(&portal).await,
    }
}

fn load_config(role: Option<Role>) -> Result<PortalConfig> {
    match role {
        Some(role) => {
            let _ = dotenvy::dotenv();
            PortalConfig::for_role(role).apply_env()
        }
        None => PortalConfig::from_env(),
    }
}

fn build_portal(config: PortalConfig) -> Result<Portal> {
    tracing::debug!(api = %config.api_base_url, role = %config.required_role, "Portal configured");

    let storage_path = config.storage_path.clone();
    Portal::from_config(config, Arc::new(ConsoleNotifier))
        .with_context(|| format!("Failed to open {}", storage_path.display()))
}

// ============================================================================
// Commands
// ============================================================================

async fn run(portal: &Portal, command: Commands) -> Result<()> {
    match command {
        Commands::Login { username, password } => login(portal, username, password).await,
        Commands::Navigate { path } => navigate(portal, &path),
        Commands::Whoami => {
            console::print_session(&portal.session());
            Ok(())
        }
        Commands::Refresh => refresh(portal).await,
        Commands::Logout => {
            portal.logout().await;
            console::success("Signed out");
            Ok(())
        }
        Commands::ChangePassword => change_password(portal).await,
        Commands::Routes => {
            print_routes(portal);
            Ok(())
        }
    }
}

async fn login(portal: &Portal, username: Option<String>, password: Option<String>) -> Result<()> {
    let username = match username {
        Some(username) => username,
        None => Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt("Username")
            .interact_text()?,
    };
    let password = match password {
        Some(password) => password,
        None => Password::with_theme(&ColorfulTheme::default())
            .with_prompt("Password")
            .interact()?,
    };

    // Transport failures were already shown by the notifier
    match portal.login(&Credentials::new(username, password)).await {
        Ok(true) => {
            console::success("Signed in");
            console::print_session(&portal.session());
            navigate(portal, &portal.config().landing_route)
        }
        Ok(false) => {
            console::failure("Wrong username or password");
            Ok(())
        }
        Err(SessionError::Gateway(_)) => Ok(()),
        Err(e) => Err(e).context("Login failed"),
    }
}

fn navigate(portal: &Portal, path: &str) -> Result<()> {
    let nav = portal.navigate(path)?;
    match nav.redirected_from {
        Some(from) => println!(
            "{} {} {}",
            from.dimmed(),
            "→".dimmed(),
            nav.location.bright_white().bold()
        ),
        None => println!("{}", nav.location.bright_white().bold()),
    }
    Ok(())
}

async fn refresh(portal: &Portal) -> Result<()> {
    if !portal.session().is_authenticated() {
        console::failure("Not signed in");
        return Ok(());
    }
    if portal.store().refresh_identity().await {
        console::success("Identity reloaded");
    } else {
        console::failure("No domain record available");
    }
    console::print_session(&portal.session());
    Ok(())
}

async fn change_password(portal: &Portal) -> Result<()> {
    let theme = ColorfulTheme::default();
    let old_password = Password::with_theme(&theme)
        .with_prompt("Current password")
        .interact()?;
    let new_password = Password::with_theme(&theme)
        .with_prompt("New password")
        .interact()?;
    let confirm_password = Password::with_theme(&theme)
        .with_prompt("Confirm new password")
        .interact()?;

    let form = ChangePasswordForm {
        old_password,
        new_password,
        confirm_password,
    };

    match portal.account().change_password(&form).await {
        Ok(true) => console::success("Password changed"),
        Ok(false) => console::failure("Password change refused"),
        Err(SessionError::Gateway(_)) => {}
        Err(e) => console::failure(&e.to_string()),
    }
    Ok(())
}

fn print_routes(portal: &Portal) {
    for route in portal.router().table().routes() {
        let access = if route.meta.requires_auth {
            format!("{}", portal.config().required_role).yellow()
        } else {
            "public".green()
        };
        let target = route
            .redirect
            .as_deref()
            .map(|to| format!("→ {}", to))
            .unwrap_or_default();
        println!(
            "{:<24} {:<22} {:<8} {}",
            route.path.bright_white(),
            route.name.unwrap_or("-"),
            access,
            target.dimmed()
        );
    }
}

// ============================================================================
// Interactive menu
// ============================================================================

async fn interactive(portal: &Portal) -> Result<()> {
    console::print_banner(portal.config().required_role.portal_name());

    loop {
        println!();
        let signed_in = portal.session().is_authenticated();
        let options = [
            if signed_in { "🔑 Sign in again" } else { "🔑 Sign in" },
            "🧭 Navigate",
            "👤 Who am I",
            "🔄 Refresh identity",
            "🔒 Change password",
            "📋 Routes",
            "🚪 Sign out",
            "🛑 Exit",
        ];

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("What would you like to do?")
            .items(&options)
            .default(if signed_in { 1 } else { 0 })
            .interact()?;

        let command = match selection {
            0 => Commands::Login {
                username: None,
                password: None,
            },
            1 => {
                let path = Input::<String>::with_theme(&ColorfulTheme::default())
                    .with_prompt("Path")
                    .default("/".to_string())
                    .interact_text()?;
                Commands::Navigate { path }
            }
            2 => Commands::Whoami,
            3 => Commands::Refresh,
            4 => Commands::ChangePassword,
            5 => Commands::Routes,
            6 => Commands::Logout,
            _ => {
                println!("{}", "👋 Goodbye!".bright_blue());
                break;
            }
        };

        // Keep the menu alive through recoverable errors
        if let Err(e) = run(portal, command).await {
            console::failure(&format!("{:#}", e));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_login_with_role() {
        let cli = Cli::parse_from(["portal", "--role", "student", "login", "-u", "alice"]);
        assert_eq!(cli.role, Some(Role::Student));
        match cli.command {
            Some(Commands::Login { username, password }) => {
                assert_eq!(username.as_deref(), Some("alice"));
                assert_eq!(password, None);
            }
            _ => panic!("expected login"),
        }
    }

    #[test]
    fn test_no_subcommand_opens_menu() {
        let cli = Cli::parse_from(["portal"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.role, None);
    }
}
