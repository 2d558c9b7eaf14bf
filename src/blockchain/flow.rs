//! Flow contract submission.
//!
//! # Responsibilities
//! - Price a submission through the flow's market contract
//! - Send `submit` with the storage fee attached
//! - Wait for the receipt and recover the flow sequence number from `Submit`

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol;
use async_trait::async_trait;

use crate::blockchain::client::ChainClient;
use crate::blockchain::types::{BlockchainError, BlockchainResult};
use crate::storage::types::{FlowSubmission, SubmitReceipt};
use crate::storage::uploader::{LogSubmitter, UploadError};

sol! {
    #[sol(rpc)]
    interface IFlow {
        struct SubmissionNode {
            bytes32 root;
            uint256 height;
        }

        struct Submission {
            uint256 length;
            bytes tags;
            SubmissionNode[] nodes;
        }

        /// Emitted when a log entry is appended to the flow.
        event Submit(
            address indexed sender,
            bytes32 indexed identity,
            uint256 submissionIndex,
            uint256 startPos,
            uint256 length,
            Submission submission
        );

        function market() external view returns (address);

        function submit(Submission memory submission)
            external
            payable
            returns (uint256, bytes32, uint256, uint256);
    }

    #[sol(rpc)]
    interface IMarket {
        function pricePerSector() external view returns (uint256);
    }
}

impl From<&FlowSubmission> for IFlow::Submission {
    fn from(submission: &FlowSubmission) -> Self {
        Self {
            length: U256::from(submission.length),
            tags: Bytes::from(submission.tags.clone()),
            nodes: submission
                .nodes
                .iter()
                .map(|node| IFlow::SubmissionNode {
                    root: node.root,
                    height: U256::from(node.height),
                })
                .collect(),
        }
    }
}

/// Submits flow log entries on chain using the configured wallet.
#[derive(Debug, Clone)]
pub struct FlowSubmitter {
    chain: ChainClient,
    flow_address: Address,
}

impl FlowSubmitter {
    pub fn new(chain: ChainClient, flow_address: Address) -> Self {
        Self {
            chain,
            flow_address,
        }
    }

    /// Current storage price per 256-byte sector, in wei.
    pub async fn price_per_sector(&self) -> BlockchainResult<U256> {
        let flow = IFlow::new(self.flow_address, self.chain.provider().clone());
        let market = flow
            .market()
            .call()
            .await
            .map_err(|e| BlockchainError::Contract(format!("flow.market() failed: {}", e)))?;

        IMarket::new(market, self.chain.provider().clone())
            .pricePerSector()
            .call()
            .await
            .map_err(|e| {
                BlockchainError::Contract(format!("market.pricePerSector() failed: {}", e))
            })
    }

    /// Send the submission and wait for it to be mined.
    pub async fn submit_entry(
        &self,
        submission: &FlowSubmission,
    ) -> BlockchainResult<SubmitReceipt> {
        let price = self.price_per_sector().await?;
        let fee = submission.fee(price);

        tracing::info!(
            flow = %self.flow_address,
            nodes = submission.nodes.len(),
            length = submission.length,
            fee = %fee,
            "Submitting log entry"
        );

        let flow = IFlow::new(self.flow_address, self.chain.provider().clone());
        let pending = flow
            .submit(IFlow::Submission::from(submission))
            .value(fee)
            .send()
            .await
            .map_err(|e| BlockchainError::Rpc(format!("submit transaction failed: {}", e)))?;

        let tx_hash = *pending.tx_hash();
        tracing::debug!(tx_hash = %tx_hash, "Submission sent, waiting for receipt");

        let receipt = pending
            .with_timeout(Some(self.chain.timeout_duration()))
            .get_receipt()
            .await
            .map_err(|e| {
                BlockchainError::Rpc(format!("receipt for {} unavailable: {}", tx_hash, e))
            })?;

        if !receipt.status() {
            return Err(BlockchainError::Reverted(format!("submission {}", tx_hash)));
        }

        let tx_seq = receipt
            .inner
            .logs()
            .iter()
            .find_map(|log| log.log_decode::<IFlow::Submit>().ok())
            .map(|decoded| decoded.inner.data.submissionIndex.saturating_to::<u64>());

        Ok(SubmitReceipt { tx_hash, tx_seq })
    }
}

#[async_trait]
impl LogSubmitter for FlowSubmitter {
    async fn submit(&self, submission: &FlowSubmission) -> Result<SubmitReceipt, UploadError> {
        self.submit_entry(submission)
            .await
            .map_err(|e| UploadError::Submission(e.to_string()))
    }
}
