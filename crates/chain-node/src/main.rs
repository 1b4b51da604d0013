mod worker;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chain_core::chain::Blockchain;
use chain_core::{Block, Transaction};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use worker::{ChainError, ChainHandle};

#[derive(Parser, Debug)]
struct Args {
    /// Address to listen on, e.g. 127.0.0.1:8080
    #[arg(long, default_value = "127.0.0.1:8080")]
    listen: String,
}

#[derive(Debug, thiserror::Error)]
enum ApiError {
    #[error(transparent)]
    Chain(#[from] ChainError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (StatusCode::SERVICE_UNAVAILABLE, self.to_string()).into_response()
    }
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

#[derive(Serialize)]
struct Head {
    height: u64,
    hash: String,
}

#[derive(Serialize)]
struct Validity {
    valid: bool,
}

#[derive(Serialize)]
struct Balance {
    address: String,
    balance: i64,
}

#[derive(Deserialize)]
struct TxIn {
    from: Option<String>,
    to: String,
    amount: u64,
}

#[derive(Deserialize)]
struct MineIn {
    reward_address: String,
}

#[derive(Serialize)]
struct Mined {
    height: u64,
    hash: String,
    nonce: u64,
    transactions: usize,
}

async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn chain_head(State(handle): State<ChainHandle>) -> Json<Head> {
    let chain = handle.snapshot();
    Json(Head {
        height: (chain.blocks.len() - 1) as u64,
        hash: hex::encode(chain.latest_block().hash),
    })
}

async fn chain_blocks(State(handle): State<ChainHandle>) -> Json<Vec<Block>> {
    Json(handle.snapshot().blocks.clone())
}

async fn chain_valid(State(handle): State<ChainHandle>) -> Json<Validity> {
    Json(Validity {
        valid: handle.snapshot().is_valid(),
    })
}

async fn balance(
    State(handle): State<ChainHandle>,
    Path(address): Path<String>,
) -> Json<Balance> {
    let balance = handle.snapshot().balance_of(&address);
    Json(Balance { address, balance })
}

async fn submit_tx(
    State(handle): State<ChainHandle>,
    Json(tx): Json<TxIn>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let tx = Transaction {
        sender: tx.from,
        recipient: tx.to,
        amount: tx.amount,
    };
    handle.submit(tx.clone()).await?;
    Ok(Json(serde_json::json!({ "accepted": true, "tx": tx })))
}

async fn mine(
    State(handle): State<ChainHandle>,
    Json(req): Json<MineIn>,
) -> Result<Json<Mined>, ApiError> {
    let (block, height) = handle.mine(req.reward_address).await?;
    Ok(Json(Mined {
        height,
        hash: hex::encode(block.hash),
        nonce: block.nonce,
        transactions: block.transactions.len(),
    }))
}

fn router(handle: ChainHandle) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/chain/head", get(chain_head))
        .route("/chain/blocks", get(chain_blocks))
        .route("/chain/valid", get(chain_valid))
        .route("/balance/{address}", get(balance))
        .route("/tx", post(submit_tx))
        .route("/mine", post(mine))
        .with_state(handle)
        .layer(TraceLayer::new_for_http())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let handle = worker::spawn(Blockchain::new());
    let app = router(handle);

    let addr: SocketAddr = args.listen.parse()?;
    info!("chain-node listening on http://{addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}
