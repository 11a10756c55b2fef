use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

use admission_gate::admin::denylist_entry_url;

#[derive(Parser)]
#[command(name = "gate-cli")]
#[command(about = "Management CLI for the admission gate", long_about = None)]
struct Cli {
    /// Admin API base URL
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    /// Admin API key
    #[arg(short, long, default_value = "")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show gate configuration and state sizes
    Status,
    /// List denylisted identities
    Denylist,
    /// Lift the denylist entry for an identity
    Clear { identity: String },
    /// Denylist an identity by hand
    Block {
        identity: String,
        #[arg(short, long, default_value = "manual")]
        reason: String,
    },
    /// Forget all rate windows and denylist entries
    Reset,
    /// Show recent security events
    Events,
    /// Ask the decision service about a request
    Check {
        identity: String,
        url: String,
        #[arg(long)]
        body: Option<String>,
        #[arg(long)]
        class: Option<String>,
        #[arg(long)]
        user_agent: Option<String>,
        /// Decision service base URL
        #[arg(long, default_value = "http://localhost:8080")]
        service: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let res = match cli.command {
        Commands::Status => {
            client.get(format!("{}/admin/status", cli.url))
                .headers(headers)
                .send()
                .await?
        }
        Commands::Denylist => {
            client.get(format!("{}/admin/denylist", cli.url))
                .headers(headers)
                .send()
                .await?
        }
        Commands::Clear { identity } => {
            client.delete(denylist_entry_url(&cli.url, &identity)?)
                .headers(headers)
                .send()
                .await?
        }
        Commands::Block { identity, reason } => {
            client.post(format!("{}/admin/denylist", cli.url))
                .headers(headers)
                .json(&json!({ "identity": identity, "reason": reason }))
                .send()
                .await?
        }
        Commands::Reset => {
            client.post(format!("{}/admin/reset", cli.url))
                .headers(headers)
                .send()
                .await?
        }
        Commands::Events => {
            client.get(format!("{}/admin/events", cli.url))
                .headers(headers)
                .send()
                .await?
        }
        Commands::Check { identity, url, body, class, user_agent, service } => {
            let mut request = json!({ "identity": identity, "url": url });
            if let Some(body) = body {
                request["body"] = json!({ "type": "text", "value": body });
            }
            if let Some(class) = class {
                request["limiter_class"] = json!(class);
            }
            if let Some(user_agent) = user_agent {
                request["headers"] = json!([["user-agent", user_agent]]);
            }
            client.post(format!("{}/v1/admission", service))
                .json(&request)
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let text = res.text().await?;
    if text.is_empty() {
        println!("{}", status);
        return Ok(());
    }

    let json: Value = serde_json::from_str(&text)?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
