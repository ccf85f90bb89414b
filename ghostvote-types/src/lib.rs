mod authorization;
mod category;
mod handle;
mod proposal;
mod time;

pub use alloy_primitives::{Address, B256, Bytes, TxHash, U256};
pub use authorization::{DecryptionAuthorization, EphemeralKeypair, PrivateKey};
pub use category::{Category, Descriptor, UnknownCategory};
pub use handle::{CiphertextHandle, EncryptedInput, HANDLE_WIDTH, InvalidHandle};
pub use proposal::{BallotEntry, InvalidProposal, NewProposal, ProposalId, ProposalRecord};
pub use time::{SECONDS_PER_DAY, Timestamp};
