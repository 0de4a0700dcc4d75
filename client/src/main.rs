//! `roster` entry-point: loads directory settings, drives the roles or user
//! details controller and prints the rendered screen to stdout.
//!
//! Logs are emitted as JSON on stderr and filtered through `RUST_LOG`.

use std::ffi::OsString;
use std::io::{self, Write};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context, Result, eyre};
use ortho_config::OrthoConfig;
use tokio::runtime::Builder;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use roster_client::config::ApiSettings;
use roster_client::domain::{
    Phase, TriggerOutcome, mount_roles_controller, user_profile_controller,
};
use roster_client::inbound::terminal::{render_roles_screen, render_user_screen};
use roster_client::outbound::directory::HttpUserDirectory;

/// `roster` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "roster",
    about = "Browse roles and user profiles served by the directory API",
    version
)]
struct CliArgs {
    /// Directory API base URL. Overrides `ROSTER_API_BASE_URL`.
    #[arg(long = "base-url", value_name = "url", global = true)]
    base_url: Option<String>,
    /// Per-request timeout in seconds. Overrides `ROSTER_API_TIMEOUT_SECS`.
    #[arg(long = "timeout-secs", value_name = "seconds", global = true)]
    timeout_secs: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Load and print the roles list.
    Roles,
    /// Load and print one user's details.
    User {
        /// User identifier. Surrounding whitespace is ignored.
        id: String,
        /// Retries attempted while the fetch keeps failing.
        #[arg(long, value_name = "count", default_value_t = 0)]
        retries: u32,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let args = CliArgs::parse();
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("failed to build roster runtime")?;
    let screen = runtime.block_on(run(args))?;

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{screen}").wrap_err("failed to write screen")?;
    Ok(())
}

fn init_tracing() {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .with_writer(io::stderr)
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }
}

fn load_settings(args: &CliArgs) -> Result<ApiSettings> {
    let mut settings = ApiSettings::load_from_iter([OsString::from("roster")])
        .map_err(|error| eyre!("failed to load directory settings: {error}"))?;
    if let Some(base_url) = &args.base_url {
        settings.base_url = Some(base_url.clone());
    }
    if let Some(timeout_secs) = args.timeout_secs {
        settings.timeout_secs = Some(timeout_secs);
    }
    Ok(settings)
}

async fn run(args: CliArgs) -> Result<String> {
    let settings = load_settings(&args)?;
    let base_url = settings.base_url()?;
    info!(%base_url, "using directory API");
    let source = Arc::new(
        HttpUserDirectory::new(base_url, settings.request_timeout())
            .wrap_err("failed to build directory client")?,
    );

    match args.command {
        Command::Roles => show_roles(source).await,
        Command::User { id, retries } => show_user(source, &id, retries).await,
    }
}

async fn show_roles(source: Arc<HttpUserDirectory>) -> Result<String> {
    let (controller, handle) = mount_roles_controller(source);
    controller.subscribe(|state| info!(screen = "roles", phase = %state.phase(), "state changed"));

    let outcome = handle.await.wrap_err("roles fetch task failed")??;
    debug!(?outcome, "roles fetch finished");

    let screen = render_roles_screen(&controller.snapshot());
    controller.teardown();
    Ok(screen)
}

async fn show_user(source: Arc<HttpUserDirectory>, raw_id: &str, retries: u32) -> Result<String> {
    let controller = user_profile_controller(source);
    controller.subscribe(|state| info!(screen = "user", phase = %state.phase(), "state changed"));

    let mut outcome = controller.trigger(raw_id).await?;
    if let TriggerOutcome::Rejected(notice) = outcome {
        controller.teardown();
        return Ok(notice.message.to_owned());
    }

    let mut remaining = retries;
    while remaining > 0 && controller.phase() == Phase::Failure {
        remaining -= 1;
        if let Some(error) = controller.last_error() {
            warn!(kind = %error.kind(), error = %error, remaining, "retrying user fetch");
        }
        outcome = controller.retry().await?;
    }
    debug!(?outcome, "user fetch finished");

    let screen = render_user_screen(&controller.snapshot(), controller.last_payload().as_ref());
    controller.teardown();
    Ok(screen)
}
