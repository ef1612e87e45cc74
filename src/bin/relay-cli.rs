use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "Management CLI for the escrow relay", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:10000", env = "RELAY_URL")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check relay configuration health
    Health,
    /// Show one transaction
    Status {
        /// Transaction id
        id: String,
    },
    /// List transactions, optionally for one sender
    List {
        #[arg(short, long)]
        sender: Option<String>,
    },
    /// Run one lifecycle step for a transaction now
    Verify {
        /// Transaction id
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Health => client.get(format!("{}/api/health", base)).send().await?,
        Commands::Status { id } => client.get(format!("{}/api/transaction/{}", base, id)).send().await?,
        Commands::List { sender } => {
            let mut req = client.get(format!("{}/api/transactions", base));
            if let Some(sender) = sender {
                req = req.query(&[("sender", sender)]);
            }
            req.send().await?
        }
        Commands::Verify { id } => {
            client
                .post(format!("{}/api/verify", base))
                .json(&json!({ "txId": id }))
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: relay returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
