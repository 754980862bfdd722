//! issuedeck - a terminal-based user interface for self-hosted issue trackers.

mod api;
mod app;
mod config;
mod error;
mod events;
mod logging;
mod model;
mod session;
mod tasks;
mod ui;

use std::io;

use anyhow::Context;
use clap::{Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::app::App;
use crate::config::{Config, Profile};
use crate::events::EventHandler;
use crate::tasks::create_task_channel;

/// A terminal-based user interface for self-hosted issue trackers.
#[derive(Debug, Parser)]
#[command(name = "issuedeck", version, about)]
struct Cli {
    /// Profile to connect with (defaults to the configured default).
    #[arg(short, long)]
    profile: Option<String>,

    /// Connect to this tracker URL directly, ignoring profiles.
    #[arg(long)]
    url: Option<String>,

    /// Open an issue by id immediately after loading.
    #[arg(short, long)]
    issue: Option<String>,

    /// Enable debug logging (equivalent to RUST_LOG=issuedeck=debug).
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// User administration, without entering the TUI.
    Users {
        #[command(subcommand)]
        command: UsersCommand,
    },
}

#[derive(Debug, Subcommand)]
enum UsersCommand {
    /// List users.
    List,
    /// List the known user roles.
    Roles,
    /// Create a user.
    Add {
        /// The user name.
        name: String,
        /// The user's role.
        #[arg(long, default_value = "developer")]
        role: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.verbose && std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "issuedeck=debug");
    }
    logging::init()?;

    let config = Config::load().context("failed to load configuration")?;
    let profile = resolve_profile(&config, &cli)?;
    let tick_rate = config.settings.tick_rate_ms;

    if let Some(command) = cli.command {
        return run_command(&profile, command).await;
    }

    let mut terminal = setup_terminal().context("failed to set up terminal")?;

    let (rx, tasks) = create_task_channel();
    let mut app = App::new(config, profile, tasks);
    if let Some(id) = cli.issue {
        app.set_initial_lookup(id);
    }

    let result = app
        .run(&mut terminal, rx, EventHandler::with_tick_rate(tick_rate))
        .await;

    restore_terminal(&mut terminal).context("failed to restore terminal")?;
    logging::shutdown();

    result.map_err(Into::into)
}

/// Run a non-TUI admin command and exit.
async fn run_command(profile: &Profile, command: Command) -> anyhow::Result<()> {
    let client = api::TrackerClient::new(profile).await?;
    match command {
        Command::Users { command } => match command {
            UsersCommand::List => {
                println!("Users at {}:", client.base_url());
                for user in client.list_users().await? {
                    println!(
                        "  {} ({})",
                        user.name.as_deref().unwrap_or("<unnamed>"),
                        user.role.as_deref().unwrap_or("no role")
                    );
                }
            }
            UsersCommand::Roles => {
                for role in client.list_roles().await? {
                    println!("{}", role);
                }
            }
            UsersCommand::Add { name, role } => {
                let created = client
                    .create_user(&api::types::UserCreateDto { name, role })
                    .await?;
                println!(
                    "Created user {}",
                    created.name.as_deref().unwrap_or("<unnamed>")
                );
            }
        },
    }
    Ok(())
}

/// Pick the profile to connect with: `--url` wins, then `--profile`,
/// then the configured default.
fn resolve_profile(config: &Config, cli: &Cli) -> anyhow::Result<Profile> {
    if let Some(url) = &cli.url {
        let profile = Profile::new("adhoc".to_string(), url.clone());
        profile.validate()?;
        return Ok(profile);
    }

    if let Some(name) = &cli.profile {
        return Ok(config.get_profile(name)?.clone());
    }

    config.get_default_profile().cloned().ok_or_else(|| {
        anyhow::anyhow!(
            "no profiles configured; pass --url or add a profile to {}",
            Config::config_file()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| "the config file".to_string())
        )
    })
}

fn setup_terminal() -> anyhow::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> anyhow::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
