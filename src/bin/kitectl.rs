use clap::{Parser, Subcommand};
use serde_json::Value;

use kite_gateway::auth::signature::disconnect_token;

#[derive(Parser)]
#[command(name = "kitectl")]
#[command(about = "Register and deregister kites with a kite gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a kite under a name
    Connect {
        #[arg(long)]
        name: String,
        #[arg(long)]
        uri: String,
    },
    /// Deregister a kite, signing the request with the shared secret
    Disconnect {
        #[arg(long)]
        name: String,
        #[arg(long)]
        uri: String,
        #[arg(long, env = "KITE_GATEWAY_DISCONNECT_SECRET")]
        secret: String,
    },
    /// Print the disconnect token for a kite URI
    Sign {
        #[arg(long)]
        uri: String,
        #[arg(long, env = "KITE_GATEWAY_DISCONNECT_SECRET")]
        secret: String,
    },
    /// Check gateway health
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Connect { name, uri } => {
            let data = serde_json::json!({ "kiteName": name, "uri": uri }).to_string();
            let res = client
                .post(format!("{}/kite/connect", cli.url))
                .form(&[("data", data)])
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Disconnect { name, uri, secret } => {
            let token = disconnect_token(&uri, &secret);
            let res = client
                .post(format!("{}/kite/disconnect", cli.url))
                .form(&[("token", token), ("uri", uri), ("kiteName", name)])
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Sign { uri, secret } => {
            println!("{}", disconnect_token(&uri, &secret));
        }
        Commands::Health => {
            let res = client.get(format!("{}/health", cli.url)).send().await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
