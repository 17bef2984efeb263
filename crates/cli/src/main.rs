mod config;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ipc::{Client, ReadResult};
use tracing::info;

#[derive(Parser)]
#[command(name = "sockpipe")]
#[command(about = "Exchange raw bytes with a process listening on a Unix socket")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send each word and print the next chunk received after it
    #[command(display_order = 1)]
    Send {
        /// Words to send, one write each
        #[arg(required = true)]
        words: Vec<String>,

        /// Socket path (overrides config)
        #[arg(short, long)]
        socket: Option<PathBuf>,

        /// Close and send the words again over a fresh connection
        #[arg(long)]
        reconnect: bool,
    },
    /// Send messages, then print everything received until the connection ends
    #[command(display_order = 2)]
    Listen {
        /// Messages to send before listening
        messages: Vec<String>,

        /// Socket path (overrides config)
        #[arg(short, long)]
        socket: Option<PathBuf>,
    },
    /// Configuration management
    #[command(display_order = 3)]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// Show configuration file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Default to WARN level for quiet CLI output
    // Use RUST_LOG=info or RUST_LOG=debug for verbose output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Send { words, socket, reconnect } => {
            let cfg = config::load_config()?;
            let socket_path = config::get_socket_path(&cfg, socket.as_deref())?;
            handle_send(&socket_path, &words, reconnect, cfg.client.response_timeout()).await
        }
        Commands::Listen { messages, socket } => {
            let cfg = config::load_config()?;
            let socket_path = config::get_socket_path(&cfg, socket.as_deref())?;
            handle_listen(&socket_path, &messages).await
        }
        Commands::Config { action } => handle_config(action),
    }
}

async fn handle_send(
    socket_path: &Path,
    words: &[String],
    reconnect: bool,
    timeout: Option<Duration>,
) -> Result<()> {
    let mut client = Client::new(socket_path);
    let rounds = if reconnect { 2 } else { 1 };

    for round in 1..=rounds {
        if round > 1 {
            println!("=== Reconnecting");
        }

        client
            .connect()
            .await
            .context("Unable to communicate with socket")?;

        for word in words {
            info!("client data sent: {}", word);
            send_one(&mut client, word.as_bytes(), timeout).await?;
        }

        client.close();
    }

    Ok(())
}

async fn send_one(client: &mut Client, data: &[u8], timeout: Option<Duration>) -> Result<()> {
    match timeout {
        None => {
            client
                .write_with(data, print_response)
                .await
                .context("Unable to write to socket")?;
        }
        Some(timeout) => {
            client.write(data).await.context("Unable to write to socket")?;
            let response = client
                .next_result_timeout(timeout)
                .await
                .context("No response from socket")?;
            print_response(response);
        }
    }
    Ok(())
}

fn print_response(response: ReadResult) {
    match response.into_result() {
        Ok(data) => println!("{}", String::from_utf8_lossy(&data)),
        Err(e) => println!("(connection ended: {})", e),
    }
}

async fn handle_listen(socket_path: &Path, messages: &[String]) -> Result<()> {
    let mut client = Client::connect_to(socket_path)
        .await
        .context("Unable to communicate with socket")?;

    for message in messages {
        client
            .write(message.as_bytes())
            .await
            .context("Unable to write to socket")?;
    }

    if let Some(closer) = client.closer() {
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received shutdown signal");
                closer.close();
            }
        });
    }

    client
        .listen(|response| match response.into_result() {
            Ok(data) => print!("{}", String::from_utf8_lossy(&data)),
            Err(e) => eprintln!("\n(connection ended: {})", e),
        })
        .await?;

    Ok(())
}

fn handle_config(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let cfg = config::load_config()?;
            let toml_str = toml::to_string_pretty(&cfg)?;
            println!("{}", toml_str);
            Ok(())
        }
        ConfigAction::Get { key } => {
            let cfg = config::load_config()?;
            match config::get_config_value(&cfg, &key) {
                Some(value) => println!("{}", value),
                None => {
                    if config::VALID_KEYS.contains(&key.as_str()) {
                        println!("(not set)");
                    } else {
                        anyhow::bail!("Unknown config key: {}", key);
                    }
                }
            }
            Ok(())
        }
        ConfigAction::Set { key, value } => {
            let mut cfg = config::load_config()?;
            config::set_config_value(&mut cfg, &key, &value)?;
            config::save_config(&cfg)?;
            println!("Set {} = {}", key, value);
            Ok(())
        }
        ConfigAction::Path => {
            let path = config::get_config_file()?;
            println!("{}", path.display());
            Ok(())
        }
    }
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
    fn test_send_requires_words() {
        assert!(Cli::try_parse_from(["sockpipe", "send"]).is_err());

        let cli = Cli::try_parse_from([
            "sockpipe",
            "send",
            "-s",
            "/tmp/mysocket",
            "--reconnect",
            "a",
            "b",
        ])
        .unwrap();
        match cli.command {
            Commands::Send { words, socket, reconnect } => {
                assert_eq!(words, vec!["a", "b"]);
                assert_eq!(socket, Some(PathBuf::from("/tmp/mysocket")));
                assert!(reconnect);
            }
            _ => panic!("expected send command"),
        }
    }
}
