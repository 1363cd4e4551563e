use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use serde_json::{json, Value};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Command-line client for the deployment dashboard API", long_about = None)]
struct Cli {
    /// Gateway (or backend) base URL.
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered servers
    Servers,
    /// List deployment log files
    Logs,
    /// Print a finished deployment log
    Log { file: String },
    /// Run ping and DNS checks against a domain
    Health {
        #[arg(default_value = "google.co.id")]
        target: String,
    },
    /// Trigger a deployment
    Deploy {
        server_id: String,
        #[arg(short, long, env = "DEPLOY_TOKEN")]
        token: String,
        /// Private key file to send instead of the server's stored key
        #[arg(long)]
        private_key: Option<PathBuf>,
    },
    /// Follow a deployment log as it is written
    Tail { file: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Servers => {
            let res = client.get(format!("{}/api/servers", base)).send().await?;
            print_json(res).await?;
        }
        Commands::Logs => {
            let res = client.get(format!("{}/api/logs", base)).send().await?;
            print_json(res).await?;
        }
        Commands::Log { file } => {
            let res = client.get(format!("{}/api/logs/{}", base, file)).send().await?;
            print_text(res).await?;
        }
        Commands::Health { target } => {
            let res = client
                .get(format!("{}/api/health", base))
                .query(&[("target", target.as_str())])
                .send()
                .await?;
            print_json(res).await?;
        }
        Commands::Deploy {
            server_id,
            token,
            private_key,
        } => {
            let private_key = match private_key {
                Some(path) => Some(tokio::fs::read_to_string(path).await?),
                None => None,
            };
            let res = client
                .post(format!("{}/api/deploy", base))
                .json(&deploy_payload(&server_id, &token, private_key))
                .send()
                .await?;
            print_json(res).await?;
        }
        Commands::Tail { file } => {
            let res = client
                .get(format!("{}/api/stream-log", base))
                .query(&[("file", file.as_str())])
                .send()
                .await?;
            tail(res).await?;
        }
    }

    Ok(())
}

fn deploy_payload(server_id: &str, token: &str, private_key: Option<String>) -> Value {
    let mut payload = json!({ "token": token, "serverId": server_id });
    if let Some(key) = private_key {
        payload["privateKey"] = Value::String(key);
    }
    payload
}

async fn print_json(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let json: Value = res.json().await?;
    if !status.is_success() {
        eprintln!("Error: API returned status {}", status);
    }
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

async fn print_text(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: API returned status {}", status);
    }
    println!("{}", text);
    Ok(())
}

/// Print each `data:` line of an event stream until the server closes it.
async fn tail(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: API returned status {}", status);
        return print_text(res).await;
    }

    let mut stream = res.bytes_stream();
    let mut buffer = String::new();
    while let Some(chunk) = stream.next().await {
        buffer.push_str(&String::from_utf8_lossy(&chunk?));
        for line in drain_events(&mut buffer) {
            println!("{}", line);
        }
    }
    Ok(())
}

/// Remove complete events from `buffer`, returning their `data:` payloads.
fn drain_events(buffer: &mut String) -> Vec<String> {
    let mut lines = Vec::new();
    while let Some(end) = buffer.find("\n\n") {
        let event: String = buffer.drain(..end + 2).collect();
        for line in event.lines() {
            if let Some(data) = line.strip_prefix("data:") {
                lines.push(data.strip_prefix(' ').unwrap_or(data).to_string());
            }
        }
    }
    lines
}
