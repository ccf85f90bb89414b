mod common;

use alloy_primitives::U256;
use common::{Harness, handle};
use ghostvote_client::{
    AuthorizationError, ErrorKind, Notice, Outcome, Phase, SessionConfig, SessionError,
};
use ghostvote_types::{Category, CiphertextHandle, SECONDS_PER_DAY, Timestamp};
use ghostvote_utils::logging::init_logging;

fn votes(o: &Outcome) -> Vec<Option<U256>> {
    let Outcome::Published(s) = o else {
        panic!("expected published rows, got {o:?}")
    };
    s.rows().iter().map(|r| r.votes).collect()
}

/// Three proposals, one of them without votes: the batch carries the two
/// real handles only and the sentinel row resolves to zero.
#[tokio::test]
async fn sentinel_is_excluded_and_zero() {
    init_logging();

    let h = Harness::new(SessionConfig::default());
    let c = Category::Photography;
    let _p1 = h.propose("first", &[c]).await;
    let p2 = h.propose("second", &[c, Category::Digital]).await;
    let p3 = h.propose("third", &[c]).await;
    h.set_votes(p2, c, 0xaa, 7);
    h.set_votes(p3, c, 0xbb, 11);

    let entries = h.session.refresh().await.unwrap();
    let Outcome::Published(s) = &entries else {
        panic!("expected rows")
    };
    assert_eq!(s.rows().len(), 3);
    assert_eq!(s.rows()[0].entry.handle, CiphertextHandle::SENTINEL);

    let out = h.session.decrypt().await.unwrap();
    assert_eq!(
        votes(&out),
        [Some(U256::ZERO), Some(U256::from(7)), Some(U256::from(11))]
    );
    assert_eq!(h.batches(), [vec![handle(0xaa), handle(0xbb)]]);
    assert_eq!(h.session.phase(), Phase::Resolved);
    assert_eq!(
        h.session.notice(),
        Some(Notice::Decrypted {
            category: c,
            count: 3
        })
    );
}

#[tokio::test]
async fn shared_handle_is_requested_once() {
    init_logging();

    let h = Harness::new(SessionConfig::default());
    let c = Category::Abstract;
    h.session.select_category(c);
    let a = h.propose("a", &[c]).await;
    let b = h.propose("b", &[c]).await;
    let shared = h.set_votes(a, c, 0x11, 5);
    h.ballot.set_ballot(b, c, shared);

    let out = h.session.resolve().await.unwrap();
    assert_eq!(votes(&out), [Some(U256::from(5)), Some(U256::from(5))]);
    assert_eq!(h.batches(), [vec![shared]]);
}

#[tokio::test]
async fn resolution_is_idempotent() {
    init_logging();

    let h = Harness::new(SessionConfig::default());
    let c = Category::Contemporary;
    h.session.select_category(c);
    for (i, t) in ["x", "y", "z"].into_iter().enumerate() {
        let id = h.propose(t, &[c]).await;
        h.set_votes(id, c, 0x20 + i as u8, 3 * i as u64 + 1);
    }

    let first = h.session.resolve().await.unwrap();
    let second = h.session.resolve().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(h.wallet.prompts(), 1);
    assert_eq!(h.batches().len(), 2);
    assert_eq!(h.batches()[0], h.batches()[1]);
}

/// A refused signature ends the attempt before any decryption request and
/// leaves earlier values on display.
#[tokio::test]
async fn refused_signature_keeps_previous_values() {
    init_logging();

    let h = Harness::new(SessionConfig::builder().validity_days(1).build());
    let c = Category::Photography;
    let id = h.propose("solar", &[c]).await;
    h.set_votes(id, c, 0x31, 2);

    let t0 = Timestamp::from(1_700_000_000);
    h.fhe.set_time(t0);
    let before = h.session.resolve_at(t0).await.unwrap();
    assert_eq!(votes(&before), [Some(U256::from(2))]);

    // The authorization has expired and the wallet says no.
    let t1 = Timestamp::from(*t0 + 2 * SECONDS_PER_DAY);
    h.fhe.set_time(t1);
    h.wallet.refuse(true);
    h.set_votes(id, c, 0x32, 3);

    let err = h.session.resolve_at(t1).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Authorization(AuthorizationError::Rejected(_))
    ));
    assert_eq!(err.kind(), ErrorKind::Wallet);
    assert_eq!(h.wallet.prompts(), 2);
    assert_eq!(h.batches().len(), 1);
    assert_eq!(h.session.phase(), Phase::Failed);
    assert!(h.session.notice().is_some_and(|n| n.is_error()));

    let shown = h.session.standings().unwrap();
    assert_eq!(shown.rows()[0].votes, Some(U256::from(2)));
    assert_eq!(shown.rows()[0].entry.handle, handle(0x31));

    // Retrying is up to the user.
    h.wallet.refuse(false);
    let after = h.session.resolve_at(t1).await.unwrap();
    assert_eq!(votes(&after), [Some(U256::from(3))]);
}

#[tokio::test]
async fn empty_category_needs_no_decryption() {
    init_logging();

    let h = Harness::new(SessionConfig::default());
    h.propose("elsewhere", &[Category::Digital]).await;
    h.session.select_category(Category::Abstract);

    assert_eq!(h.session.resolve().await.unwrap(), Outcome::Empty);
    assert_eq!(
        h.session.notice(),
        Some(Notice::NoProposals(Category::Abstract))
    );
    assert!(h.batches().is_empty());
    assert_eq!(h.wallet.prompts(), 0);
    assert!(h.session.standings().is_some_and(|s| s.is_empty()));
}

#[tokio::test]
async fn late_answer_of_superseded_attempt_is_dropped() {
    init_logging();

    let h = Harness::new(SessionConfig::default());
    let c = Category::Photography;
    let id = h.propose("p", &[c]).await;
    h.set_votes(id, c, 0x41, 1);

    h.gate.arm();
    let first = h.session.resolve();
    let second = async {
        h.gate.entered.notified().await;
        h.set_votes(id, c, 0x42, 9);
        let out = h.session.resolve().await;
        h.gate.release.notify_one();
        out
    };
    let (first, second) = tokio::join!(first, second);

    assert_eq!(first.unwrap(), Outcome::Superseded);
    assert_eq!(votes(&second.unwrap()), [Some(U256::from(9))]);
    let shown = h.session.standings().unwrap();
    assert_eq!(shown.rows()[0].votes, Some(U256::from(9)));
    assert_eq!(h.session.phase(), Phase::Resolved);
}

#[tokio::test]
async fn cancelled_attempt_does_not_publish() {
    init_logging();

    let h = Harness::new(SessionConfig::default());
    let c = Category::Digital;
    h.session.select_category(c);
    let id = h.propose("p", &[c]).await;
    h.set_votes(id, c, 0x51, 4);

    h.gate.arm();
    let attempt = h.session.resolve();
    let cancel = async {
        h.gate.entered.notified().await;
        assert_eq!(h.session.phase(), Phase::Resolving);
        h.session.cancel();
        h.gate.release.notify_one();
    };
    let (out, ()) = tokio::join!(attempt, cancel);

    assert_eq!(out.unwrap(), Outcome::Superseded);
    assert!(h.session.standings().is_none());
    assert_eq!(h.session.phase(), Phase::Idle);
}

#[tokio::test]
async fn switching_category_abandons_attempt() {
    init_logging();

    let h = Harness::new(SessionConfig::default());
    let id = h.propose("p", &[Category::Photography]).await;
    h.set_votes(id, Category::Photography, 0x61, 4);

    h.gate.arm();
    let attempt = h.session.resolve();
    let switch = async {
        h.gate.entered.notified().await;
        h.session.select_category(Category::Abstract);
        h.gate.release.notify_one();
    };
    let (out, ()) = tokio::join!(attempt, switch);

    assert_eq!(out.unwrap(), Outcome::Superseded);
    assert_eq!(h.session.category(), Category::Abstract);
    assert!(h.session.standings().is_none());
}

#[tokio::test]
async fn decryption_failure_is_reported() {
    init_logging();

    let h = Harness::new(SessionConfig::default());
    let c = Category::Photography;
    let id = h.propose("p", &[c]).await;
    h.set_votes(id, c, 0x71, 4);
    h.session.refresh().await.unwrap();

    h.fhe.fail_next("relayer unavailable");
    let err = h.session.decrypt().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decryption);
    assert_eq!(h.session.phase(), Phase::Failed);
    let shown = h.session.standings().unwrap();
    assert_eq!(shown.rows()[0].votes, None);
}

#[tokio::test]
async fn failure_of_superseded_attempt_leaves_state_alone() {
    init_logging();

    let h = Harness::new(SessionConfig::default());
    let c = Category::Photography;
    let id = h.propose("p", &[c]).await;
    h.set_votes(id, c, 0x81, 3);

    h.gate.arm();
    let first = h.session.resolve();
    let second = async {
        h.gate.entered.notified().await;
        let out = h.session.resolve().await;
        h.fhe.fail_next("relayer unavailable");
        h.gate.release.notify_one();
        out
    };
    let (first, second) = tokio::join!(first, second);

    assert_eq!(first.unwrap_err().kind(), ErrorKind::Decryption);
    assert_eq!(votes(&second.unwrap()), [Some(U256::from(3))]);
    assert_eq!(h.session.phase(), Phase::Resolved);
    assert_eq!(h.session.notice(), Some(Notice::Decrypted { category: c, count: 1 }));
}

#[tokio::test]
async fn decrypt_moves_phases_forward() {
    init_logging();

    let h = Harness::new(SessionConfig::default());
    let c = Category::Photography;
    let id = h.propose("p", &[c]).await;
    h.set_votes(id, c, 0x91, 5);
    h.session.refresh().await.unwrap();
    assert_eq!(h.session.phase(), Phase::Idle);

    h.wallet.refuse(true);
    assert!(h.session.decrypt().await.is_err());
    assert_eq!(h.wallet.prompts(), 1);
    assert_eq!(h.session.phase(), Phase::Failed);
    h.wallet.refuse(false);

    h.gate.arm();
    let attempt = h.session.decrypt();
    let watch = async {
        h.gate.entered.notified().await;
        let phase = h.session.phase();
        h.gate.release.notify_one();
        phase
    };
    let (out, seen) = tokio::join!(attempt, watch);

    assert_eq!(seen, Phase::Resolving);
    assert_eq!(votes(&out.unwrap()), [Some(U256::from(5))]);
    assert_eq!(h.session.phase(), Phase::Resolved);
}
