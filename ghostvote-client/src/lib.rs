//! Client side of GhostVote's encrypted tallies.
//!
//! Ballot counters live in a contract as homomorphically encrypted values,
//! referenced by opaque [`CiphertextHandle`]s. Reading them takes three steps:
//!
//! 1. [`HandleCollector`] gathers the handles of a category's ballots.
//! 2. [`SignatureIssuer`] obtains (or reuses) a wallet-signed, time-bounded
//!    [`DecryptionAuthorization`] for the contract.
//! 3. [`BatchResolver`] decrypts all non-sentinel handles in one request.
//!
//! [`Session`] drives these steps, owns the state shown to a user and makes
//! sure late answers of superseded attempts are dropped.
//!
//! [`CiphertextHandle`]: ghostvote_types::CiphertextHandle
//! [`DecryptionAuthorization`]: ghostvote_types::DecryptionAuthorization

mod collector;
mod config;
mod error;
mod issuer;
mod resolver;
mod session;
mod standings;

pub mod eip712;
pub mod mock;
pub mod traits;

pub use collector::HandleCollector;
pub use config::{SessionConfig, SessionConfigBuilder};
pub use error::{
    AuthorizationError, CapabilityError, ContractError, DecryptError, ErrorKind, SessionError,
};
pub use issuer::SignatureIssuer;
pub use resolver::{BatchResolver, ResolutionRequest, ResolutionResult};
pub use session::{Notice, Outcome, Phase, Session};
pub use standings::{Standing, Standings};
pub use traits::{BallotContract, DecryptionCapability, EncryptionCapability, HandleContractPair};
