use alloy_primitives::{Address, SignatureError};
use ghostvote_types::{Category, CiphertextHandle, InvalidProposal, ProposalId};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure of a contract read or write.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ContractError {
    #[error("contract call failed: {0}")]
    Call(#[source] BoxError),

    #[error("transaction {0} reverted")]
    Reverted(alloy_primitives::TxHash),

    #[error("malformed contract response: {0}")]
    Malformed(String),

    #[error("unknown proposal {0}")]
    UnknownProposal(ProposalId),
}

impl ContractError {
    pub fn call<E: std::error::Error + Send + Sync + 'static>(e: E) -> Self {
        Self::Call(Box::new(e))
    }
}

/// Failure to obtain a decryption authorization.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AuthorizationError {
    #[error("no contract to authorize")]
    NoContracts,

    #[error("wallet declined to sign: {0}")]
    Rejected(#[source] alloy_signer::Error),

    #[error("malformed signature: {0}")]
    InvalidSignature(#[from] SignatureError),

    #[error("signature recovers to {recovered} instead of {expected}")]
    SignerMismatch {
        expected: Address,
        recovered: Address,
    },
}

/// Failure reported by an encryption or decryption capability.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CapabilityError {
    #[error("request not authorized: {0}")]
    Unauthorized(String),

    #[error("sentinel handle submitted for decryption")]
    SentinelHandle,

    #[error("unknown ciphertext handle {0}")]
    UnknownHandle(CiphertextHandle),

    #[error("capability failure: {0}")]
    Other(#[source] BoxError),
}

impl CapabilityError {
    pub fn other<E: std::error::Error + Send + Sync + 'static>(e: E) -> Self {
        Self::Other(Box::new(e))
    }
}

/// Failure of a batch resolution.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DecryptError {
    #[error(transparent)]
    Capability(#[from] CapabilityError),

    #[error("no plaintext returned for handle {0}")]
    Incomplete(CiphertextHandle),
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("contract: {0}")]
    Contract(#[from] ContractError),

    #[error("authorization: {0}")]
    Authorization(#[from] AuthorizationError),

    #[error("decryption: {0}")]
    Decrypt(#[from] DecryptError),

    #[error("encryption: {0}")]
    Encrypt(#[source] CapabilityError),

    #[error("invalid proposal: {0}")]
    InvalidProposal(#[from] InvalidProposal),

    #[error("already voted for proposal {0}")]
    AlreadyVoted(ProposalId),

    #[error("already liked proposal {0}")]
    AlreadyLiked(ProposalId),

    #[error("proposal {0} does not compete in {1}")]
    NotInCategory(ProposalId, Category),
}

/// Broad classes of failure, as presented to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The wallet refused or mishandled a request.
    Wallet,
    /// A contract round trip failed.
    Network,
    /// The signed authorization is unusable.
    Authorization,
    /// Encryption or decryption failed.
    Decryption,
    /// The request itself is not acceptable.
    Rejected,
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Contract(_) => ErrorKind::Network,
            Self::Authorization(AuthorizationError::Rejected(_)) => ErrorKind::Wallet,
            Self::Authorization(_) => ErrorKind::Authorization,
            Self::Decrypt(DecryptError::Capability(CapabilityError::Unauthorized(_))) => {
                ErrorKind::Authorization
            }
            Self::Decrypt(_) | Self::Encrypt(_) => ErrorKind::Decryption,
            Self::InvalidProposal(_)
            | Self::AlreadyVoted(_)
            | Self::AlreadyLiked(_)
            | Self::NotInCategory(..) => ErrorKind::Rejected,
        }
    }
}
