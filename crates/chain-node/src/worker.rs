use chain_core::chain::Blockchain;
use chain_core::{Block, Transaction};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("chain worker is not running")]
    WorkerGone,
}

enum Command {
    Submit {
        tx: Transaction,
    },
    Mine {
        reward_address: String,
        reply: oneshot::Sender<(Block, u64)>,
    },
}

/// Cheap-to-clone handle to the writer task. Mutations go over the command
/// channel; reads use the last published snapshot and never wait on an
/// in-progress mine.
#[derive(Clone)]
pub struct ChainHandle {
    commands: mpsc::Sender<Command>,
    snapshot: watch::Receiver<Arc<Blockchain>>,
}

impl ChainHandle {
    pub async fn submit(&self, tx: Transaction) -> Result<(), ChainError> {
        self.commands
            .send(Command::Submit { tx })
            .await
            .map_err(|_| ChainError::WorkerGone)
    }

    /// Mines the pending pool and returns the new block together with its
    /// height, as reported by the writer that appended it.
    pub async fn mine(&self, reward_address: String) -> Result<(Block, u64), ChainError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Mine {
                reward_address,
                reply,
            })
            .await
            .map_err(|_| ChainError::WorkerGone)?;
        rx.await.map_err(|_| ChainError::WorkerGone)
    }

    /// The latest published view of the chain.
    pub fn snapshot(&self) -> Arc<Blockchain> {
        self.snapshot.borrow().clone()
    }
}

/// Spawns the single task that owns the chain. Every mutation publishes a
/// fresh snapshot to the watch channel; the task exits when the last handle
/// is dropped.
pub fn spawn(chain: Blockchain) -> ChainHandle {
    let (commands, mut rx) = mpsc::channel(64);
    let (publish, snapshot) = watch::channel(Arc::new(chain.clone()));

    tokio::spawn(async move {
        let mut chain = chain;
        while let Some(cmd) = rx.recv().await {
            match cmd {
                Command::Submit { tx } => {
                    chain.add_transaction(tx);
                    let _ = publish.send(Arc::new(chain.clone()));
                }
                Command::Mine {
                    reward_address,
                    reply,
                } => {
                    // The proof-of-work search is CPU-bound and unbounded;
                    // let the runtime move other work off this thread.
                    let block = tokio::task::block_in_place(|| {
                        chain.mine_pending_transactions(&reward_address)
                    });
                    let height = (chain.blocks.len() - 1) as u64;
                    // Publish before replying so a requester reading a
                    // snapshot after the reply always sees the mined block.
                    let _ = publish.send(Arc::new(chain.clone()));
                    if reply.send((block, height)).is_err() {
                        warn!("mine requester went away before the block was delivered");
                    }
                }
            }
        }
        info!("chain worker stopped");
    });

    ChainHandle { commands, snapshot }
}
