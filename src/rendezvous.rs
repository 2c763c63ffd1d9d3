//! C1: Handshake Rendezvous.
//!
//! Correlates the main gateway's `VoiceStateUpdate` and `VoiceServerUpdate`
//! events into a single [`HandshakePair`], keyed by server id.

use crate::{
    constants::HANDSHAKE_TIMEOUT,
    gateway::{RestUserClient, VoiceServerSnapshot, VoiceStateSnapshot},
    id::ServerId,
};
use parking_lot::Mutex;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// A correlated, complete pair of gateway snapshots for one connection
/// attempt.
#[derive(Clone, Debug)]
pub struct HandshakePair {
    pub state: VoiceStateSnapshot,
    pub server: VoiceServerSnapshot,
}

impl HandshakePair {
    /// Whether `other` (a later pair for the same server id, received while
    /// a session was already established) describes an endpoint, token, or
    /// session id different from this one. Lets a live session decide
    /// whether a voice-server migration requires re-identifying.
    pub fn changed_since(&self, other: &HandshakePair) -> bool {
        self.state.session_id != other.state.session_id
            || self.server.endpoint != other.server.endpoint
            || self.server.token != other.server.token
    }
}

/// Outcome of a [`Rendezvous::wait_for`] call.
#[derive(Debug)]
pub enum WaitOutcome {
    Pair(HandshakePair),
    Timeout,
    AlreadyPending,
    Cancelled,
}

#[derive(Default)]
struct Partial {
    state: Option<VoiceStateSnapshot>,
    server: Option<VoiceServerSnapshot>,
}

/// C1's state: one rendezvous instance is shared between the session and
/// whatever forwards gateway events into it.
pub struct Rendezvous<R> {
    rest: Arc<R>,
    self_id: Mutex<Option<crate::id::UserId>>,
    pending: Mutex<HashMap<ServerId, oneshot::Sender<HandshakePair>>>,
    partials: Mutex<HashMap<ServerId, Partial>>,
}

impl<R: RestUserClient> Rendezvous<R> {
    pub fn new(rest: Arc<R>) -> Self {
        Self {
            rest,
            self_id: Mutex::new(None),
            pending: Mutex::new(HashMap::new()),
            partials: Mutex::new(HashMap::new()),
        }
    }

    /// Waits up to `timeout` (capped by [`HANDSHAKE_TIMEOUT`] callers are
    /// expected to pass) for both halves of the handshake for `server_id`.
    #[instrument(skip(self, cancel))]
    pub async fn wait_for(&self, server_id: ServerId, cancel: &CancellationToken) -> WaitOutcome {
        let rx = {
            let mut pending = self.pending.lock();
            if pending.contains_key(&server_id) {
                return WaitOutcome::AlreadyPending;
            }

            let (tx, rx) = oneshot::channel();
            pending.insert(server_id, tx);
            rx
        };

        let outcome = tokio::select! {
            res = rx => match res {
                Ok(pair) => WaitOutcome::Pair(pair),
                Err(_) => WaitOutcome::Cancelled,
            },
            _ = tokio::time::sleep(HANDSHAKE_TIMEOUT) => WaitOutcome::Timeout,
            _ = cancel.cancelled() => WaitOutcome::Cancelled,
        };

        if matches!(outcome, WaitOutcome::Timeout | WaitOutcome::Cancelled) {
            self.pending.lock().remove(&server_id);
            self.partials.lock().remove(&server_id);
        }

        outcome
    }

    /// Forwards a `VoiceStateUpdate`. A no-op unless `server_id` has a
    /// pending waiter; silently discards foreign users.
    #[instrument(skip(self, snapshot))]
    pub async fn submit_state(&self, snapshot: VoiceStateSnapshot) {
        let self_id = self.self_id().await;
        if snapshot.user_id != self_id {
            return;
        }

        self.complete_half(snapshot.server_id, |p| p.state = Some(snapshot.clone()));
    }

    /// The bot's own user id, as cached from the REST collaborator.
    ///
    /// Exposed so the session can stamp `Identify` payloads without a
    /// second round trip through the REST client.
    pub async fn current_user(&self) -> crate::id::UserId {
        self.self_id().await
    }

    /// Forwards a `VoiceServerUpdate`. A no-op unless `server_id` has a
    /// pending waiter.
    #[instrument(skip(self, snapshot))]
    pub fn submit_server(&self, snapshot: VoiceServerSnapshot) {
        self.complete_half(snapshot.server_id, |p| p.server = Some(snapshot.clone()));
    }

    fn complete_half(&self, server_id: ServerId, apply: impl FnOnce(&mut Partial)) {
        let mut pending = self.pending.lock();
        if !pending.contains_key(&server_id) {
            return;
        }

        let mut partials = self.partials.lock();
        let partial = partials.entry(server_id).or_default();
        apply(partial);

        if let (Some(state), Some(server)) = (partial.state.clone(), partial.server.clone()) {
            partials.remove(&server_id);
            if let Some(tx) = pending.remove(&server_id) {
                let _ = tx.send(HandshakePair { state, server });
            }
        }
    }

    async fn self_id(&self) -> crate::id::UserId {
        if let Some(id) = *self.self_id.lock() {
            return id;
        }

        let id = self.rest.get_current_user().await;
        *self.self_id.lock() = Some(id);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;

    struct FakeRest(crate::id::UserId);

    #[async_trait]
    impl RestUserClient for FakeRest {
        async fn get_current_user(&self) -> crate::id::UserId {
            self.0
        }
    }

    fn state(server: u64, user: u64) -> VoiceStateSnapshot {
        VoiceStateSnapshot {
            server_id: ServerId(server),
            user_id: crate::id::UserId(user),
            session_id: "abc".into(),
        }
    }

    fn server(server_id: u64) -> VoiceServerSnapshot {
        VoiceServerSnapshot {
            server_id: ServerId(server_id),
            endpoint: Some("v.example".into()),
            token: "tkn".into(),
        }
    }

    #[tokio::test]
    async fn pairs_matching_state_and_server() {
        let rv = Arc::new(Rendezvous::new(Arc::new(FakeRest(crate::id::UserId(1)))));
        let cancel = CancellationToken::new();

        let waiter = tokio::spawn({
            let rv = rv.clone();
            let cancel = cancel.clone();
            async move { rv.wait_for(ServerId(100), &cancel).await }
        });

        tokio::time::sleep(Duration::from_millis(10)).await;

        rv.submit_server(server(100));
        rv.submit_state(state(100, 1)).await;

        let outcome = waiter.await.unwrap();
        assert!(matches!(outcome, WaitOutcome::Pair(_)));
    }

    #[tokio::test]
    async fn foreign_user_is_discarded_then_timeout_or_cancel() {
        let rv = Arc::new(Rendezvous::new(Arc::new(FakeRest(crate::id::UserId(1)))));
        let cancel = CancellationToken::new();

        let waiter = tokio::spawn({
            let rv = rv.clone();
            let cancel = cancel.clone();
            async move { rv.wait_for(ServerId(100), &cancel).await }
        });

        tokio::time::sleep(Duration::from_millis(10)).await;

        rv.submit_server(server(100));
        rv.submit_state(state(100, 999)).await;

        cancel.cancel();
        let outcome = waiter.await.unwrap();
        assert!(matches!(outcome, WaitOutcome::Cancelled));
    }

    #[tokio::test]
    async fn second_wait_for_same_id_is_already_pending() {
        let rv = Arc::new(Rendezvous::new(Arc::new(FakeRest(crate::id::UserId(1)))));
        let cancel = CancellationToken::new();

        let _first = tokio::spawn({
            let rv = rv.clone();
            let cancel = cancel.clone();
            async move { rv.wait_for(ServerId(7), &cancel).await }
        });

        tokio::time::sleep(Duration::from_millis(10)).await;

        let outcome = rv.wait_for(ServerId(7), &cancel).await;
        assert!(matches!(outcome, WaitOutcome::AlreadyPending));

        cancel.cancel();
    }
}
