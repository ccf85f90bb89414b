use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use alloy_primitives::{TxHash, U256};
use alloy_signer::Signer;
use ghostvote_types::{BallotEntry, Category, NewProposal, ProposalId, Timestamp};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::resolver::{ResolutionRequest, ResolutionResult};
use crate::standings::{Standing, Standings};
use crate::traits::{BallotContract, DecryptionCapability, EncryptionCapability};
use crate::{
    BatchResolver, ErrorKind, HandleCollector, SessionConfig, SessionError, SignatureIssuer,
};

/// Progress of the current attempt.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    #[default]
    Idle,
    CollectingHandles,
    AwaitingAuthorization,
    Resolving,
    Resolved,
    Failed,
}

impl Phase {
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            Self::CollectingHandles | Self::AwaitingAuthorization | Self::Resolving
        )
    }
}

/// What an operation left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Rows were published.
    Published(Standings),
    /// There was nothing to show or decrypt.
    Empty,
    /// A newer attempt or a cancellation took over; nothing was published.
    Superseded,
}

/// Message for the user about the last operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    NoProposals(Category),
    NothingToDecrypt,
    Decrypted { category: Category, count: usize },
    LikesDecrypted { id: ProposalId, likes: U256 },
    ProposalSubmitted(TxHash),
    VoteCast(ProposalId),
    Liked(ProposalId),
    Failed { kind: ErrorKind, message: String },
}

impl Notice {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoProposals(c) => write!(f, "No proposals in {} yet", c.name()),
            Self::NothingToDecrypt => f.write_str("Nothing to decrypt"),
            Self::Decrypted { category, count } => {
                write!(f, "Decrypted {count} ballots in {}", category.name())
            }
            Self::LikesDecrypted { id, likes } => write!(f, "Proposal {id} has {likes} likes"),
            Self::ProposalSubmitted(tx) => write!(f, "Proposal submitted in {tx}"),
            Self::VoteCast(id) => write!(f, "Vote for proposal {id} cast"),
            Self::Liked(id) => write!(f, "Proposal {id} liked"),
            Self::Failed { kind, message } => {
                let what = match kind {
                    ErrorKind::Wallet => "Wallet error",
                    ErrorKind::Network => "Network error",
                    ErrorKind::Authorization => "Authorization error",
                    ErrorKind::Decryption => "Decryption error",
                    ErrorKind::Rejected => "Request rejected",
                };
                write!(f, "{what}: {message}")
            }
        }
    }
}

#[derive(Debug, Default)]
struct State {
    generation: u64,
    phase: Phase,
    category: Category,
    standings: Option<Standings>,
    notice: Option<Notice>,
    likes: HashMap<ProposalId, U256>,
    voted: HashSet<ProposalId>,
    liked: HashSet<ProposalId>,
}

/// Session-scoped state of one connected wallet.
///
/// Every attempt to show or decrypt standings takes a fresh generation.
/// Results of an attempt whose generation is no longer current are dropped
/// without touching the state, so late answers never overwrite newer ones.
pub struct Session {
    label: String,
    contract: Arc<dyn BallotContract>,
    decrypter: Arc<dyn DecryptionCapability>,
    encrypter: Arc<dyn EncryptionCapability>,
    wallet: Arc<dyn Signer + Send + Sync>,
    collector: HandleCollector,
    issuer: SignatureIssuer,
    resolver: BatchResolver,
    state: Mutex<State>,
}

impl Session {
    pub fn new(
        cfg: SessionConfig,
        contract: Arc<dyn BallotContract>,
        decrypter: Arc<dyn DecryptionCapability>,
        encrypter: Arc<dyn EncryptionCapability>,
        wallet: Arc<dyn Signer + Send + Sync>,
    ) -> Self {
        Self {
            label: cfg.label,
            collector: HandleCollector::new(contract.clone()),
            issuer: SignatureIssuer::new(cfg.validity_days),
            resolver: BatchResolver::new(decrypter.clone()),
            contract,
            decrypter,
            encrypter,
            wallet,
            state: Mutex::new(State::default()),
        }
    }

    pub fn phase(&self) -> Phase {
        self.state.lock().phase
    }

    pub fn category(&self) -> Category {
        self.state.lock().category
    }

    pub fn standings(&self) -> Option<Standings> {
        self.state.lock().standings.clone()
    }

    pub fn notice(&self) -> Option<Notice> {
        self.state.lock().notice.clone()
    }

    pub fn likes_of(&self, id: ProposalId) -> Option<U256> {
        self.state.lock().likes.get(&id).copied()
    }

    pub fn has_voted(&self, id: ProposalId) -> bool {
        self.state.lock().voted.contains(&id)
    }

    pub fn has_liked(&self, id: ProposalId) -> bool {
        self.state.lock().liked.contains(&id)
    }

    pub fn issuer(&self) -> &SignatureIssuer {
        &self.issuer
    }

    /// Switch to another category. Attempts in flight are abandoned.
    pub fn select_category(&self, c: Category) {
        let mut state = self.state.lock();
        state.generation += 1;
        if state.category != c {
            state.standings = None;
        }
        state.category = c;
        state.phase = Phase::Idle;
        state.notice = None;
        debug!(label = %self.label, category = %c, generation = state.generation, "category selected");
    }

    /// Abandon attempts in flight.
    pub fn cancel(&self) {
        let mut state = self.state.lock();
        state.generation += 1;
        if state.phase.is_busy() {
            state.phase = Phase::Idle;
        }
        debug!(label = %self.label, generation = state.generation, "cancelled");
    }

    /// Collect the handles of the current category and show them.
    ///
    /// Values already resolved for an unchanged handle are kept.
    pub async fn refresh(&self) -> Result<Outcome, SessionError> {
        let (generation, category) = self.begin(Phase::CollectingHandles);

        let entries = match self.collector.ballots(category).await {
            Ok(entries) => entries,
            Err(err) => return self.fail(generation, err.into()),
        };

        let mut state = self.state.lock();
        if state.generation != generation {
            return Ok(Outcome::Superseded);
        }
        state.phase = Phase::Idle;

        if entries.is_empty() {
            state.standings = Some(Standings::new(category, Vec::new()));
            state.notice = Some(Notice::NoProposals(category));
            return Ok(Outcome::Empty);
        }

        let previous = state.standings.take();
        let rows = entries
            .into_iter()
            .map(|entry| {
                let votes = previous
                    .as_ref()
                    .filter(|s| s.category() == category)
                    .and_then(|s| s.get(entry.id))
                    .filter(|s| s.entry.handle == entry.handle)
                    .and_then(|s| s.votes);
                Standing { entry, votes }
            })
            .collect();
        let standings = Standings::new(category, rows);
        state.standings = Some(standings.clone());
        state.notice = None;
        Ok(Outcome::Published(standings))
    }

    /// Decrypt the rows currently shown.
    pub async fn decrypt(&self) -> Result<Outcome, SessionError> {
        self.decrypt_at(Timestamp::now()).await
    }

    pub async fn decrypt_at(&self, now: Timestamp) -> Result<Outcome, SessionError> {
        let shown = self.state.lock().standings.clone();
        let Some(shown) = shown.filter(|s| !s.is_empty()) else {
            self.state.lock().notice = Some(Notice::NothingToDecrypt);
            return Ok(Outcome::Empty);
        };

        let (generation, category) = self.begin(Phase::AwaitingAuthorization);
        if category != shown.category() {
            return Ok(Outcome::Superseded);
        }
        let entries = shown.entries().cloned().collect::<Vec<_>>();

        match self
            .authorize_and_resolve(generation, &entries, now, Track::Phases)
            .await
        {
            Ok(Some(values)) => Ok(self.publish(generation, category, entries, values)),
            Ok(None) => Ok(Outcome::Superseded),
            Err(err) => self.fail(generation, err),
        }
    }

    /// Collect, authorize and decrypt the current category in one attempt.
    ///
    /// Rows are only published on success. A failure leaves whatever was
    /// shown before untouched.
    pub async fn resolve(&self) -> Result<Outcome, SessionError> {
        self.resolve_at(Timestamp::now()).await
    }

    pub async fn resolve_at(&self, now: Timestamp) -> Result<Outcome, SessionError> {
        let (generation, category) = self.begin(Phase::CollectingHandles);

        let entries = match self.collector.ballots(category).await {
            Ok(entries) => entries,
            Err(err) => return self.fail(generation, err.into()),
        };

        if entries.is_empty() {
            let mut state = self.state.lock();
            if state.generation != generation {
                return Ok(Outcome::Superseded);
            }
            state.phase = Phase::Resolved;
            state.standings = Some(Standings::new(category, Vec::new()));
            state.notice = Some(Notice::NoProposals(category));
            info!(label = %self.label, %category, "no proposals to resolve");
            return Ok(Outcome::Empty);
        }

        match self
            .authorize_and_resolve(generation, &entries, now, Track::Phases)
            .await
        {
            Ok(Some(values)) => Ok(self.publish(generation, category, entries, values)),
            Ok(None) => Ok(Outcome::Superseded),
            Err(err) => self.fail(generation, err),
        }
    }

    /// Decrypt the like counter of a proposal.
    ///
    /// The phase of the session is left as it is. The result is dropped if
    /// the session moved on in the meantime.
    pub async fn decrypt_likes(&self, id: ProposalId) -> Result<Option<U256>, SessionError> {
        self.decrypt_likes_at(id, Timestamp::now()).await
    }

    pub async fn decrypt_likes_at(
        &self,
        id: ProposalId,
        now: Timestamp,
    ) -> Result<Option<U256>, SessionError> {
        let generation = self.state.lock().generation;
        match self.likes_inner(generation, id, now).await {
            Ok(Some(likes)) => {
                let mut state = self.state.lock();
                if state.generation != generation {
                    return Ok(None);
                }
                state.likes.insert(id, likes);
                state.notice = Some(Notice::LikesDecrypted { id, likes });
                Ok(Some(likes))
            }
            Ok(None) => Ok(None),
            Err(err) if self.state.lock().generation != generation => {
                debug!(label = %self.label, %id, %err, "superseded likes lookup failed");
                Err(err)
            }
            Err(err) => self.report(err),
        }
    }

    async fn likes_inner(
        &self,
        generation: u64,
        id: ProposalId,
        now: Timestamp,
    ) -> Result<Option<U256>, SessionError> {
        let entry = self.collector.likes(id).await?;
        let entries = [entry];
        let values = self
            .authorize_and_resolve(generation, &entries, now, Track::Quiet)
            .await?;
        Ok(values.and_then(|v| v.first().copied()))
    }

    /// Cast an encrypted vote of one for a proposal in a category.
    pub async fn cast_vote(
        &self,
        id: ProposalId,
        category: Category,
    ) -> Result<TxHash, SessionError> {
        if !self.state.lock().voted.insert(id) {
            return self.report(SessionError::AlreadyVoted(id));
        }
        match self.vote_inner(id, category).await {
            Ok(tx) => {
                info!(label = %self.label, %id, %category, %tx, "vote cast");
                self.state.lock().notice = Some(Notice::VoteCast(id));
                Ok(tx)
            }
            Err(err) => {
                self.state.lock().voted.remove(&id);
                self.report(err)
            }
        }
    }

    async fn vote_inner(&self, id: ProposalId, category: Category) -> Result<TxHash, SessionError> {
        let record = self.contract.fetch_proposal(id).await?;
        if !record.is_member(category) {
            return Err(SessionError::NotInCategory(id, category));
        }
        let one = self
            .encrypter
            .encrypt_u32(self.contract.address(), self.wallet.address(), 1)
            .await
            .map_err(SessionError::Encrypt)?;
        Ok(self.contract.vote(id, category, &one).await?)
    }

    /// Like a proposal with an encrypted one.
    pub async fn like(&self, id: ProposalId) -> Result<TxHash, SessionError> {
        if !self.state.lock().liked.insert(id) {
            return self.report(SessionError::AlreadyLiked(id));
        }
        match self.like_inner(id).await {
            Ok(tx) => {
                info!(label = %self.label, %id, %tx, "proposal liked");
                self.state.lock().notice = Some(Notice::Liked(id));
                Ok(tx)
            }
            Err(err) => {
                self.state.lock().liked.remove(&id);
                self.report(err)
            }
        }
    }

    async fn like_inner(&self, id: ProposalId) -> Result<TxHash, SessionError> {
        let one = self
            .encrypter
            .encrypt_u32(self.contract.address(), self.wallet.address(), 1)
            .await
            .map_err(SessionError::Encrypt)?;
        Ok(self.contract.like(id, &one).await?)
    }

    /// Register a new proposal after checking it locally.
    pub async fn submit_proposal(&self, p: &NewProposal) -> Result<TxHash, SessionError> {
        if let Err(err) = p.validate() {
            return self.report(err.into());
        }
        let p = NewProposal {
            categories: p.distinct_categories(),
            ..p.clone()
        };
        match self.contract.register_proposal(&p).await {
            Ok(tx) => {
                info!(label = %self.label, title = %p.title, %tx, "proposal submitted");
                self.state.lock().notice = Some(Notice::ProposalSubmitted(tx));
                Ok(tx)
            }
            Err(err) => self.report(err.into()),
        }
    }

    /// Start a new attempt.
    fn begin(&self, phase: Phase) -> (u64, Category) {
        let mut state = self.state.lock();
        state.generation += 1;
        state.phase = phase;
        debug!(
            label = %self.label,
            category = %state.category,
            generation = state.generation,
            ?phase,
            "attempt started"
        );
        (state.generation, state.category)
    }

    /// Move the attempt to `phase` unless it was superseded.
    ///
    /// Lookups with [`Track::Quiet`] only check the generation.
    fn advance(&self, generation: u64, phase: Phase, track: Track) -> bool {
        let mut state = self.state.lock();
        if state.generation != generation {
            debug!(label = %self.label, generation, current = state.generation, "attempt superseded");
            return false;
        }
        if track == Track::Phases {
            state.phase = phase;
        }
        true
    }

    /// Authorize and resolve `entries`. `None` if superseded on the way.
    async fn authorize_and_resolve(
        &self,
        generation: u64,
        entries: &[BallotEntry],
        now: Timestamp,
        track: Track,
    ) -> Result<Option<Vec<U256>>, SessionError> {
        let address = self.contract.address();
        let req = ResolutionRequest::from_entries(address, entries);

        let result = if req.is_empty() {
            debug!(label = %self.label, entries = entries.len(), "only sentinel handles");
            ResolutionResult::empty()
        } else {
            let contracts = [address];
            let signer = self.wallet.address();
            let auth = match self.issuer.cached(signer, &contracts, now).await {
                Some(auth) => auth,
                None => {
                    if !self.advance(generation, Phase::AwaitingAuthorization, track) {
                        return Ok(None);
                    }
                    self.issuer
                        .obtain(&*self.decrypter, &*self.wallet, &contracts, now)
                        .await?
                }
            };
            if !self.advance(generation, Phase::Resolving, track) {
                return Ok(None);
            }
            self.resolver.resolve(&req, &auth).await?
        };

        if self.state.lock().generation != generation {
            return Ok(None);
        }
        Ok(Some(result.distribute(entries)?))
    }

    fn publish(
        &self,
        generation: u64,
        category: Category,
        entries: Vec<BallotEntry>,
        values: Vec<U256>,
    ) -> Outcome {
        let rows = entries
            .into_iter()
            .zip(values)
            .map(|(entry, v)| Standing {
                entry,
                votes: Some(v),
            })
            .collect::<Vec<_>>();
        let count = rows.len();
        let standings = Standings::new(category, rows);

        let mut state = self.state.lock();
        if state.generation != generation {
            return Outcome::Superseded;
        }
        state.phase = Phase::Resolved;
        state.standings = Some(standings.clone());
        state.notice = Some(Notice::Decrypted { category, count });
        info!(label = %self.label, %category, count, "standings resolved");
        Outcome::Published(standings)
    }

    /// End the attempt with an error. Stale attempts leave the state alone.
    fn fail<T>(&self, generation: u64, err: SessionError) -> Result<T, SessionError> {
        let mut state = self.state.lock();
        if state.generation == generation {
            warn!(label = %self.label, %err, kind = ?err.kind(), "attempt failed");
            state.phase = Phase::Failed;
            state.notice = Some(failed(&err));
        } else {
            debug!(label = %self.label, %err, "superseded attempt failed");
        }
        Err(err)
    }

    fn report<T>(&self, err: SessionError) -> Result<T, SessionError> {
        warn!(label = %self.label, %err, kind = ?err.kind(), "request failed");
        self.state.lock().notice = Some(failed(&err));
        Err(err)
    }
}

/// Whether a lookup drives the phase of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Track {
    /// Standings attempts.
    Phases,
    /// Side lookups such as like counters.
    Quiet,
}

fn failed(err: &SessionError) -> Notice {
    Notice::Failed {
        kind: err.kind(),
        message: err.to_string(),
    }
}
