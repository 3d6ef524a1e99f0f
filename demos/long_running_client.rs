// ABOUTME: Long-running SMPP client example demonstrating the pool's built-in keep-alive and rebind
// ABOUTME: Shows how to lean on Manager/Session for connection health instead of hand-rolled polling

//! # Long-Running SMPP Client
//!
//! This example demonstrates a long-running SMPP client that:
//!
//! * Relies on [`Session`]'s own enquire-link ticker for keep-alive
//! * Auto-rebinds on connection loss via `ManagerConfig::auto_rebind`
//! * Optionally sends periodic SMS messages
//! * Shuts down cleanly after a configured run duration
//!
//! ## Usage
//!
//! ```bash
//! cargo run --example long_running_client -- --system-id test --password secret
//!
//! cargo run --example long_running_client -- \
//!   --system-id test --password secret \
//!   --to 123456789 --from 987654321 \
//!   --sms-interval 120
//! ```

use argh::FromArgs;
use smpp::manager::{Manager, ManagerConfig, Message};
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, sleep};
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Long-running SMPP client relying on Session's built-in keep-alive
#[derive(FromArgs)]
struct CliArgs {
    /// whether or not to enable debugging
    #[argh(switch, short = 'd')]
    debugging: bool,

    /// the system id
    #[argh(option)]
    system_id: Option<String>,

    /// the password
    #[argh(option)]
    password: Option<String>,

    /// the hostname of IP address of the SMSC (default: localhost)
    #[argh(option)]
    host: Option<String>,

    /// the port to use when connecting to the SMSC (default: 2775)
    #[argh(option, short = 'p')]
    port: Option<u32>,

    /// enquire_link interval in seconds (default: 30)
    #[argh(option)]
    keep_alive_interval: Option<u64>,

    /// how long to run the client in seconds (default: 300, i.e., 5 minutes)
    #[argh(option)]
    run_duration: Option<u64>,

    /// interval between SMS sends in seconds (default: 60)
    #[argh(option)]
    sms_interval: Option<u64>,

    /// the recipient telephone number (optional - no SMS sent if not provided)
    #[argh(option, short = 't')]
    to: Option<String>,

    /// the telephone number that the message will be from (optional)
    #[argh(option, short = 'f')]
    from: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli_args: CliArgs = argh::from_env();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli_args.debugging {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let host = cli_args.host.unwrap_or_else(|| "localhost".to_owned());
    let port = cli_args.port.unwrap_or(2775);
    let run_duration = Duration::from_secs(cli_args.run_duration.unwrap_or(300));
    let sms_interval = Duration::from_secs(cli_args.sms_interval.unwrap_or(60));

    info!("Starting long-running SMPP client");
    info!("Connecting to {host}:{port}");
    info!("Will run for {} seconds", run_duration.as_secs());

    let config = ManagerConfig {
        url: format!("{host}:{port}"),
        system_id: cli_args.system_id.unwrap_or_default(),
        password: cli_args.password.unwrap_or_default(),
        max_connection: 1,
        enquiry_interval: Duration::from_secs(cli_args.keep_alive_interval.unwrap_or(30)),
        auto_rebind: true,
        rebinding_interval: Duration::from_secs(5),
        on_pdu: Some(Arc::new(|frame, auto_responded| {
            if !auto_responded {
                tracing::debug!("received unsolicited frame: {:?}", frame.command_id());
            }
        })),
        ..ManagerConfig::default()
    };

    let manager = Manager::new(config);
    manager.start().await.map_err(|e| {
        error!("Connection failed: {e}");
        Box::<dyn Error>::from(e.to_string())
    })?;

    info!("Connected and bound successfully, enquire_link keep-alive running in the background");

    let send_messages = cli_args.to.is_some() && cli_args.from.is_some();
    let mut sms_timer = if send_messages {
        Some(interval(sms_interval))
    } else {
        None
    };

    let start_time = std::time::Instant::now();
    let mut message_count = 0;

    info!("Entering main loop");

    loop {
        tokio::select! {
            _ = sleep(run_duration.saturating_sub(start_time.elapsed())) => {
                info!("Run duration elapsed, shutting down");
                break;
            }

            _ = async {
                if let Some(ref mut timer) = sms_timer {
                    timer.tick().await;
                } else {
                    std::future::pending::<()>().await
                }
            } => {
                if let (Some(to), Some(from)) = (&cli_args.to, &cli_args.from) {
                    message_count += 1;
                    let text = format!("Test message #{message_count} from long-running client");
                    let message = Message { from: from.clone(), to: to.clone(), text };

                    match manager.send(message, &[]).await {
                        Ok(outcomes) => {
                            info!("Message {} sent in {} segment(s)", message_count, outcomes.len());
                        }
                        Err(e) => {
                            warn!("Failed to send message {}: {}", message_count, e);
                        }
                    }
                }
            }
        }
    }

    info!("Shutting down client");
    if let Err(e) = manager.close(&[]).await {
        warn!("Close failed: {}", e);
    }

    let uptime = start_time.elapsed();
    info!("Client ran for {:.1} seconds, sent {} messages", uptime.as_secs_f64(), message_count);

    Ok(())
}
