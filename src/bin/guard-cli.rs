use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "guard-cli")]
#[command(about = "Drive and inspect an upstream-guard instance", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Call the upstream directly, without protection
    Direct {
        /// Run a sequential batch of this many calls
        #[arg(short, long)]
        count: Option<usize>,
    },
    /// Call the upstream through the circuit breaker
    Breaker {
        #[arg(short, long)]
        count: Option<usize>,
    },
    /// Call the upstream with retries and backoff
    Retry {
        #[arg(short, long)]
        count: Option<usize>,
    },
    /// Show circuit breaker state
    Status,
}

impl Commands {
    fn path(&self) -> String {
        let (mode, count) = match self {
            Self::Direct { count } => ("direct", count),
            Self::Breaker { count } => ("breaker", count),
            Self::Retry { count } => ("retry", count),
            Self::Status => return "/breaker/status".to_string(),
        };
        match count {
            Some(n) => format!("/{mode}/loop?count={n}"),
            None => format!("/{mode}"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let url = format!("{}{}", cli.url.trim_end_matches('/'), cli.command.path());
    let res = client.get(url).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{text}"),
    }

    if !status.is_success() {
        eprintln!("Error: server returned status {status}");
        std::process::exit(1);
    }
    Ok(())
}
