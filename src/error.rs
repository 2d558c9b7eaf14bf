//! Top-level error taxonomy and process exit codes.

use std::path::PathBuf;

use thiserror::Error;

use crate::blockchain::BlockchainError;
use crate::config::ConfigError;
use crate::storage::merkle::MerkleError;
use crate::storage::UploadError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("client initialization failed: {0}")]
    ClientInit(String),

    #[error("upload failed: {0}")]
    Upload(UploadError),

    #[error("payload file {}: {source}", .path.display())]
    Payload {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("hash computation failed: {0}")]
    HashComputation(#[from] MerkleError),

    #[error("upload did not finish within {0} seconds")]
    Timeout(u64),

    #[error("interrupted")]
    Interrupted,

    #[error("failed to write output: {0}")]
    Output(#[source] std::io::Error),
}

impl AppError {
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Configuration(_) => 2,
            AppError::ClientInit(_) => 3,
            AppError::Upload(_) | AppError::Payload { .. } => 4,
            AppError::Timeout(_) | AppError::Interrupted => 5,
            AppError::HashComputation(_) => 6,
            AppError::Output(_) => 1,
        }
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Hash(e) => AppError::HashComputation(e),
            other => AppError::Upload(other),
        }
    }
}

impl From<BlockchainError> for AppError {
    fn from(err: BlockchainError) -> Self {
        AppError::ClientInit(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(AppError::from(ConfigError::MissingPrivateKey).exit_code(), 2);
        assert_eq!(AppError::ClientInit("bad key".into()).exit_code(), 3);
        assert_eq!(AppError::from(UploadError::NoTargets).exit_code(), 4);
        assert_eq!(AppError::Timeout(60).exit_code(), 5);
        assert_eq!(AppError::Interrupted.exit_code(), 5);
        assert_eq!(AppError::from(MerkleError::EmptyData).exit_code(), 6);
    }

    #[test]
    fn test_hash_failures_inside_upload_keep_their_code() {
        let err = AppError::from(UploadError::Hash(MerkleError::EmptyData));
        assert!(matches!(err, AppError::HashComputation(_)));
    }

    #[test]
    fn test_wallet_errors_are_init_errors() {
        let err = AppError::from(BlockchainError::Wallet("Invalid private key format".into()));
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("Invalid private key"));
    }
}
