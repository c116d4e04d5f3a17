//! nowlink — talk to a ServiceNow A2A agent from the terminal
//!
//! Usage:
//!   nowlink token
//!   nowlink card
//!   nowlink send "Categorize ITSM Incident INC0019104"
//!   nowlink chat
//!
//! Settings come from `A2A_CLIENT_*` environment variables (a `.env` file in
//! the working directory is loaded first) and optionally a TOML config file.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::{debug, warn};

use nowlink_a2a::{A2aClient, A2aError, AccessToken, Conversation, NowlinkConfig, RequestBuilder};

#[derive(Parser, Debug)]
#[command(name = "nowlink", version, about = "Client for ServiceNow A2A agents")]
struct Cli {
    /// TOML config file (default: ~/.nowlink/config.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Dotenv file to load before reading the environment
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Refresh the OAuth access token and show a prefix of it
    Token,
    /// Fetch and print the agent card
    Card,
    /// Send a single message
    Send {
        text: String,
        /// Accepted output mode; repeat for several (overrides config)
        #[arg(long = "output-mode")]
        output_modes: Vec<String>,
        /// Push notification callback URL (overrides config)
        #[arg(long)]
        push_url: Option<String>,
        /// Continue an existing conversation
        #[arg(long)]
        context_id: Option<String>,
        /// Print the request envelope before sending
        #[arg(long)]
        json: bool,
    },
    /// Interactive conversation; type `quit` or `exit` to leave
    Chat,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.env_file {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("Failed to load env file {}", path.display()))?;
        }
        None => {
            if let Err(e) = dotenvy::dotenv() {
                debug!("No .env loaded: {}", e);
            }
        }
    }

    let config = NowlinkConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let client = A2aClient::from_config(&config)?;

    match cli.command {
        Command::Token => cmd_token(&client, &config).await,
        Command::Card => cmd_card(&client, &config).await,
        Command::Send {
            text,
            output_modes,
            push_url,
            context_id,
            json,
        } => {
            let modes = if output_modes.is_empty() {
                config.accepted_output_modes.clone()
            } else {
                output_modes
            };
            let push_url = push_url.or_else(|| config.push_notification_url.clone());
            cmd_send(&client, &config, &text, modes, push_url, context_id, json).await
        }
        Command::Chat => cmd_chat(&client, &config).await,
    }
}

async fn refresh(client: &A2aClient, config: &NowlinkConfig) -> Result<AccessToken> {
    client
        .tokens()
        .refresh(&config.credentials)
        .await
        .context("Error refreshing token")
}

async fn cmd_token(client: &A2aClient, config: &NowlinkConfig) -> Result<()> {
    let token = refresh(client, config).await?;
    println!("Token refreshed: {}...", token.preview(20));
    println!(
        "Expires in {}s (at {})",
        token.expires_in,
        token.expires_at().format("%Y-%m-%d %H:%M:%S UTC")
    );
    Ok(())
}

async fn cmd_card(client: &A2aClient, config: &NowlinkConfig) -> Result<()> {
    let token = refresh(client, config).await?;
    let card = client
        .fetch_agent_card(&config.agent_card_url, &token.value)
        .await
        .context("Error connecting to agent")?;

    println!("Agent: {}", card.name);
    println!("Description: {}", card.description);
    if let Some(version) = &card.version {
        println!("Version: {}", version);
    }
    println!("Input modes: {}", card.default_input_modes.join(", "));
    println!("Output modes: {}", card.default_output_modes.join(", "));
    println!(
        "Capabilities: streaming={} pushNotifications={}",
        card.capabilities.streaming, card.capabilities.push_notifications
    );
    for skill in &card.skills {
        println!("  - {} ({})", skill.name, skill.id);
    }

    let unsupported = card.unsupported_output_modes(&config.accepted_output_modes);
    if !unsupported.is_empty() {
        warn!(
            "Configured output modes not advertised by the agent: {}",
            unsupported.join(", ")
        );
    }
    Ok(())
}

async fn cmd_send(
    client: &A2aClient,
    config: &NowlinkConfig,
    text: &str,
    output_modes: Vec<String>,
    push_url: Option<String>,
    context_id: Option<String>,
    print_json: bool,
) -> Result<()> {
    let token = refresh(client, config).await?;

    let request = RequestBuilder::message_send(text, nowlink_a2a::new_message_id(), output_modes)
        .push_notification_url(push_url)
        .context_id(context_id)
        .build();

    if print_json {
        println!("{}", serde_json::to_string_pretty(&request)?);
    }

    match client.send(&config.endpoint_url, &token.value, &request).await {
        Ok(result) => {
            println!("{}", result.text());
            if let Some(state) = result.state() {
                eprintln!("[task state: {}]", state);
            }
            if let Some(ctx) = result.context_id() {
                eprintln!("[context: {}]", ctx);
            }
            Ok(())
        }
        Err(e) => Err(describe_send_error(e)),
    }
}

async fn cmd_chat(client: &A2aClient, config: &NowlinkConfig) -> Result<()> {
    println!("Refreshing OAuth token...");
    let token = refresh(client, config).await?;
    println!("Token refreshed successfully!");

    let card = client
        .fetch_agent_card(&config.agent_card_url, &token.value)
        .await
        .context("Error connecting to agent")?;
    println!("Connected to agent: {}", card.name);
    println!("Description: {}\n", card.description);

    let mut conversation = Conversation::new(
        config.accepted_output_modes.clone(),
        config.push_notification_url.clone(),
    );

    println!("Type 'quit' or 'exit' to end the session\n");

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("You: ");
        std::io::stdout().flush()?;

        let input = match lines.next() {
            Some(line) => line?,
            None => {
                println!("\nGoodbye!");
                break;
            }
        };

        match parse_input(&input) {
            ChatInput::Quit => {
                println!("Goodbye!");
                break;
            }
            ChatInput::Empty => continue,
            ChatInput::Message(text) => {
                let request = conversation.next_request(text);
                match client.send(&config.endpoint_url, &token.value, &request).await {
                    Ok(result) => {
                        conversation.record(&result);
                        println!("\nAgent: {}\n", result.text());
                    }
                    Err(e) => println!("\nError communicating with agent: {:#}\n", describe_send_error(e)),
                }
            }
        }
    }
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum ChatInput<'a> {
    Quit,
    Empty,
    Message(&'a str),
}

fn parse_input(line: &str) -> ChatInput<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        ChatInput::Empty
    } else if trimmed.eq_ignore_ascii_case("quit") || trimmed.eq_ignore_ascii_case("exit") {
        ChatInput::Quit
    } else {
        ChatInput::Message(trimmed)
    }
}

/// Attach the protocol's name for a known remote code, leaving the server's
/// own message intact.
fn describe_send_error(err: A2aError) -> anyhow::Error {
    match err.remote_kind() {
        Some(kind) => {
            anyhow::Error::new(err).context(format!("Agent rejected the request ({})", kind))
        }
        None => anyhow::Error::new(err).context("Error sending message"),
    }
}
