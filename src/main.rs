//! CLI for the campus relay
//!
//! Subcommands:
//! - `server`: run the WebSocket server
//! - `watch`: join as a client and print every frame (useful for smoke tests)

use campus_relay::config::load_config;
use campus_relay::relay::Relay;
use campus_relay::transport::websocket::run_until;
use campus_relay::utils::logging;
use clap::Parser;
use tracing::error;

#[derive(Parser)]
#[command(name = "campus-relay")]
enum Command {
    /// Start the WebSocket server
    Server,
    /// Connect, join with the given attributes and print incoming frames
    Watch {
        /// WebSocket server URL to connect to
        #[arg(long, default_value = "ws://127.0.0.1:8080")]
        url: String,
        #[arg(long)]
        role: Option<String>,
        #[arg(long)]
        driver_id: Option<String>,
        #[arg(long)]
        class_teacher_id: Option<String>,
        /// Also join the global topic
        #[arg(long)]
        global: bool,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cmd = Command::parse();

    match cmd {
        Command::Server => {
            if let Err(e) = run_server().await {
                error!("Server failed: {}", e);
                std::process::exit(1);
            }
        }
        Command::Watch {
            url,
            role,
            driver_id,
            class_teacher_id,
            global,
        } => {
            logging::init("info");
            let join = serde_json::json!({
                "type": "join",
                "role": role,
                "driverId": driver_id,
                "classTeacherId": class_teacher_id,
                "global": global,
            });
            if let Err(e) = run_watch(&url, join).await {
                error!("Client failed: {}", e);
                std::process::exit(1);
            }
        }
    }
}

async fn run_server() -> Result<(), Box<dyn std::error::Error>> {
    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            // No subscriber yet; the configured level is unknown
            logging::init("info");
            return Err(format!("failed to load configuration: {e}").into());
        }
    };
    logging::init(&config.logging.level);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let relay = Relay::from_settings(&config)?;

    run_until(&addr, relay, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    })
    .await?;
    Ok(())
}

async fn run_watch(url: &str, join: serde_json::Value) -> Result<(), Box<dyn std::error::Error>> {
    use futures_util::{SinkExt, StreamExt};
    use tokio_tungstenite::connect_async;
    use tokio_tungstenite::tungstenite::Message as WsMessage;

    let (mut ws_stream, _response) = connect_async(url).await?;
    ws_stream.send(WsMessage::text(join.to_string())).await?;

    while let Some(frame) = ws_stream.next().await {
        match frame? {
            WsMessage::Text(text) => println!("{}", text.as_str()),
            WsMessage::Close(_) => break,
            _ => {}
        }
    }

    Ok(())
}
