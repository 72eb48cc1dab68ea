// Terminal dashboard: signs in through the auth gateway, then streams rover status.

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::{info, warn};

use rover_command_server::client::{HttpGateway, TelemetryFeed};
use rover_command_server::utils::now_epoch_ms;
use rover_telemetry_core::session::{OfflineMode, SessionStore};
use rover_telemetry_core::{CommandKind, RoverCommand, TelemetrySink};

#[derive(Debug, Parser)]
#[command(name = "rover-console", version, about = "Rover command center console")]
struct Cli {
    /// Command center address (host:port or http url)
    #[arg(long, default_value = "127.0.0.1:5000")]
    server: String,

    /// Fall back to a labeled demo session when the server is unreachable
    #[arg(long)]
    demo: bool,

    /// Send one command (AUTONAV, CALIBRATE or ESTOP) once connected
    #[arg(long, value_parser = parse_command)]
    command: Option<CommandKind>,

    /// Print admin stats after signing in
    #[arg(long)]
    stats: bool,

    /// Stop after this many telemetry updates; 0 streams until interrupted
    #[arg(long, default_value_t = 0)]
    updates: u64,

    #[command(subcommand)]
    action: Action,
}

#[derive(Debug, Subcommand)]
enum Action {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
}

fn parse_command(value: &str) -> Result<CommandKind, String> {
    CommandKind::parse(value).ok_or_else(|| format!("unknown command {value:?}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let offline = if cli.demo {
        OfflineMode::Demo
    } else {
        OfflineMode::Disabled
    };

    let gateway = HttpGateway::new(&cli.server)?;
    let mut sessions = SessionStore::new(gateway.clone(), offline);
    let session = match &cli.action {
        Action::Login { email, password } => {
            sessions.login(email, password, now_epoch_ms()).await
        }
        Action::Register {
            username,
            email,
            password,
        } => {
            sessions
                .register(username, email, password, now_epoch_ms())
                .await
        }
    }
    .context("sign-in failed")?
    .clone();
    println!("Signed in as {}", session.label());

    if cli.stats {
        if !session.is_authoritative() {
            println!("Admin stats unavailable in demo mode");
        } else if session.can_view_admin() {
            match gateway.admin_stats(&session.token).await {
                Ok(stats) => println!(
                    "Users: {} | Store: {} | Uptime: {}s | Live links: {}",
                    stats.users, stats.store, stats.uptime_secs, stats.active_connections
                ),
                Err(err) => warn!(%err, "admin stats request failed"),
            }
        }
    }

    let mut feed = TelemetryFeed::new(&cli.server)?;
    let (tx, rx) = mpsc::channel(4);
    if let Some(kind) = cli.command {
        tx.send(RoverCommand::new(kind))
            .await
            .context("command queue closed")?;
    }

    let mut tx = Some(tx);
    let mut printed = 0u64;
    let limit = cli.updates;
    let run = feed.run(rx, |sink| {
        if sink.received() > printed {
            printed = sink.received();
            println!("{}", status_line(sink));
            if limit > 0 && printed >= limit {
                tx.take();
            }
        } else if !sink.is_connected() && tx.is_some() {
            println!("Link lost, reconnecting");
        }
    });

    tokio::select! {
        result = run => result.context("telemetry feed stopped")?,
        _ = tokio::signal::ctrl_c() => info!("interrupted"),
    }

    for line in feed.sink().dashboard().recent_lines(5) {
        println!("  {line}");
    }
    if let Some(session) = sessions.logout() {
        println!("Signed out {}", session.username);
    }
    Ok(())
}

fn status_line(sink: &TelemetrySink) -> String {
    let status = sink.status();
    let position = status
        .coordinates
        .map(|c| format!("({:.5}, {:.5})", c.lat, c.lng))
        .unwrap_or_else(|| "(no fix)".to_string());
    format!(
        "[{}] {} | Bat: {:.0}% | Spd: {:.1} m/s | {} | {}",
        status.status.as_str(),
        status.mode.as_str(),
        status.battery,
        status.speed,
        sink.pose().activity.label(),
        position
    )
}
