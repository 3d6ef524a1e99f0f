// ABOUTME: Example application demonstrating SMS sending through a pooled Manager
// ABOUTME: Shows the simplest connect-bind-send-close flow against one SMSC

pub(crate) use argh::FromArgs;
use smpp::manager::{Manager, ManagerConfig, Message};
use std::error::Error;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Example application to show then simplest case of sending an SMS message
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

    /// the message to send
    #[argh(option, short = 'm')]
    message: String,

    /// the recipient telephone number
    #[argh(option, short = 't')]
    to: String,

    /// the telephone number that the message will be from
    #[argh(option, short = 'f')]
    from: String,
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

    let config = ManagerConfig {
        url: format!("{host}:{port}"),
        system_id: cli_args.system_id.unwrap_or_default(),
        password: cli_args.password.unwrap_or_default(),
        max_connection: 1,
        enquiry_interval: Duration::from_secs(20),
        ..ManagerConfig::default()
    };

    let manager = Manager::new(config);
    manager.start().await.map_err(|e| {
        eprintln!("Connection/bind failed: {e}");
        Box::<dyn Error>::from(e.to_string())
    })?;

    println!("Connected and bound successfully");

    let message = Message {
        from: cli_args.from,
        to: cli_args.to,
        text: cli_args.message,
    };

    match manager.send(message, &[]).await {
        Ok(outcomes) => {
            for outcome in &outcomes {
                println!(
                    "Message segment submitted via {}! Message ID: {:?}",
                    outcome.session_id, outcome.response.message_id
                );
            }
            manager.close(&[]).await?;
            Ok(())
        }
        Err(e) => {
            eprintln!("Failed to send message: {e}");
            let _ = manager.close(&[]).await;
            Err(Box::<dyn Error>::from(e.to_string()))
        }
    }
}
