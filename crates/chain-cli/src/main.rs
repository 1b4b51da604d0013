use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "chain-cli")]
#[command(about = "CLI client for the proof-of-work ledger node")]
struct Cli {
    /// Node base URL (e.g. http://127.0.0.1:8080)
    #[arg(long, global = true, default_value = "http://127.0.0.1:8080")]
    node: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a transaction to the pending pool
    Submit {
        /// Sender; omit for a system-minted transaction
        #[arg(long)]
        from: Option<String>,
        /// Recipient
        #[arg(long)]
        to: String,
        /// Amount
        #[arg(long)]
        amount: u64,
    },
    /// Mine the pending pool into a new block
    Mine {
        /// Address credited with the mining reward
        #[arg(long)]
        reward_address: String,
    },
    /// Show the balance of an address
    Balance {
        #[arg(long)]
        address: String,
    },
    /// Check the integrity of the whole chain
    Validate,
    /// Show the chain tip
    Head,
    /// Dump all finalized blocks
    Blocks,
}

#[derive(Serialize)]
struct TxIn {
    from: Option<String>,
    to: String,
    amount: u64,
}

#[derive(Serialize)]
struct MineIn {
    reward_address: String,
}

async fn print_response(res: reqwest::Response) -> Result<()> {
    let status = res.status();
    let body = res.text().await?;
    println!("status: {}", status);
    println!("{body}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .pretty()
        .init();

    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let node = cli.node;

    let res = match cli.cmd {
        Command::Submit { from, to, amount } => {
            let tx = TxIn { from, to, amount };
            client.post(format!("{node}/tx")).json(&tx).send().await?
        }
        Command::Mine { reward_address } => {
            let req = MineIn { reward_address };
            client.post(format!("{node}/mine")).json(&req).send().await?
        }
        Command::Balance { address } => {
            client.get(format!("{node}/balance/{address}")).send().await?
        }
        Command::Validate => client.get(format!("{node}/chain/valid")).send().await?,
        Command::Head => client.get(format!("{node}/chain/head")).send().await?,
        Command::Blocks => client.get(format!("{node}/chain/blocks")).send().await?,
    };
    print_response(res).await
}
