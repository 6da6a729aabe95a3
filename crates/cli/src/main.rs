//! Command-line front for the transfer core.
//!
//! Stands in for the negotiation/UI layer: it builds the group-formation
//! parameters a platform callback would deliver, dispatches the
//! role-appropriate session, and surfaces the outcome. Ctrl-C triggers the
//! session's cancellation token.

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use directdrop_transfer::{
    GroupInfo, SessionConfig, SessionOutcome, TRANSFER_PORT, start_session,
};

#[derive(Parser)]
#[command(name = "directdrop", version, about = "One-shot file transfer between peers")]
struct Cli {
    /// Print the outcome as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Receive one file (group-owner role).
    Receive {
        /// Directory where the received file is materialized.
        #[arg(long, default_value = "received")]
        dir: PathBuf,

        /// Port to listen on.
        #[arg(long, default_value_t = TRANSFER_PORT)]
        port: u16,

        /// Give up if no peer connects within this many seconds.
        #[arg(long)]
        accept_timeout: Option<u64>,
    },

    /// Send a file to the group owner (peer role).
    Send {
        /// File to send.
        file: PathBuf,

        /// Group owner address.
        #[arg(long)]
        to: IpAddr,

        /// Port the owner listens on.
        #[arg(long, default_value_t = TRANSFER_PORT)]
        port: u16,

        /// Connection timeout in milliseconds.
        #[arg(long, default_value_t = 5000)]
        connect_timeout: u64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let (group, config, source) = match cli.command {
        Command::Receive {
            dir,
            port,
            accept_timeout,
        } => {
            let group = GroupInfo {
                is_group_owner: true,
                // The owner never dials; its own address is irrelevant.
                group_owner_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            };
            let mut config = SessionConfig::new(dir);
            config.port = port;
            config.accept_timeout = accept_timeout.map(Duration::from_secs);
            (group, config, None)
        }
        Command::Send {
            file,
            to,
            port,
            connect_timeout,
        } => {
            let group = GroupInfo {
                is_group_owner: false,
                group_owner_address: to,
            };
            let mut config = SessionConfig::new(PathBuf::new());
            config.port = port;
            config.connect_timeout = Duration::from_millis(connect_timeout);
            (group, config, Some(file))
        }
    };

    info!(role = %group.role(), "starting session");

    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::channel(64);
    tokio::spawn(async move {
        while let Some(bytes) = progress_rx.recv().await {
            debug!(bytes, "transferred");
        }
    });

    let handle = match start_session(&group, config, source, Some(progress_tx)) {
        Ok(handle) => handle,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let cancel = handle.cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, cancelling session");
            cancel.cancel();
        }
    });

    match handle.outcome.await {
        Ok(Ok(outcome)) => {
            report(&outcome, cli.json);
            ExitCode::SUCCESS
        }
        Ok(Err(e)) => {
            error!("transfer failed: {e}");
            ExitCode::FAILURE
        }
        Err(_) => {
            error!("session task dropped without reporting an outcome");
            ExitCode::FAILURE
        }
    }
}

fn report(outcome: &SessionOutcome, json: bool) {
    if json {
        // Serialization of this plain enum cannot fail.
        println!("{}", serde_json::to_string_pretty(outcome).unwrap());
        return;
    }
    match outcome {
        SessionOutcome::Received { path } => println!("received: {}", path.display()),
        SessionOutcome::Sent { bytes } => println!("sent: {bytes} bytes"),
    }
}
