use anyhow::Context;
use clap::{Parser, Subcommand};

use hmac_sample::HmacApiClient;
use hmac_sample::client::SUM_PATH;
use hmac_sample::models::SumRequest;
use hmac_sample::signing::reconstruct_query;

#[derive(Parser)]
#[command(name = "hmac-client")]
#[command(about = "Signed client for the HMAC demo API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    base_url: String,

    #[arg(short, long, env = "HMAC_SECRET", default_value = "YourSecretKeyHere123!", hide_env_values = true)]
    secret: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Call the sum endpoint with a signed request
    Sum {
        a: i32,
        b: i32,
        /// Send the operands as query parameters instead of a JSON body
        #[arg(long)]
        get: bool,
    },
    /// Print a signed curl command without sending anything
    Sign {
        method: String,
        path: String,
        #[arg(long, default_value = "")]
        query: String,
        #[arg(long)]
        body: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client =
        HmacApiClient::new(&cli.base_url, &cli.secret).context("Failed to create client")?;

    match cli.command {
        Commands::Sum { a, b, get } => {
            let preview = if get {
                let query = reconstruct_query([("a", a.to_string()), ("b", b.to_string())]);
                client.curl_command("GET", SUM_PATH, &query, None)
            } else {
                let body = serde_json::to_string(&SumRequest::new(a, b))?;
                client.curl_command("POST", SUM_PATH, "", Some(&body))
            };
            println!("{preview}\n");

            let result = if get {
                client.sum_query(a, b).await
            } else {
                client.sum(a, b).await
            }
            .with_context(|| format!("Signed request to {}{SUM_PATH} failed", cli.base_url))?;
            println!("{a} + {b} = {result}");
        }
        Commands::Sign {
            method,
            path,
            query,
            body,
        } => {
            let method = method.to_uppercase();
            println!(
                "{}",
                client.curl_command(&method, &path, &query, body.as_deref())
            );
        }
    }

    Ok(())
}
