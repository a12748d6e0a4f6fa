use serde_json::Value;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

use crate::identity::Session;
use crate::models::{Role, USERS_COLLECTION};
use crate::store::{StoreError, StoreState};

/// Verdict
///
/// The resolved authorization state driving every routing decision. Exactly
/// one verdict is active at a time; it changes only in response to a
/// session-change event or the completion of the profile read that followed
/// one.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// Before the first session-change event has been processed.
    Unresolved,
    /// No session.
    Unauthenticated,
    /// A live session. `role: None` means the role could not be determined
    /// and the bearer is treated as unauthenticated for routing purposes.
    Authenticated { uid: Uuid, role: Option<Role> },
}

impl Verdict {
    pub fn role(&self) -> Option<Role> {
        match self {
            Verdict::Authenticated { role, .. } => *role,
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Verdict::Authenticated { .. })
    }
}

/// SessionResolver
///
/// The single process-wide resolver turning session-change events into
/// authorization verdicts. All route guards consume this one instance, so the
/// profile read happens once per event rather than once per mounted guard.
///
/// Events are tagged with a monotonically increasing sequence number; a
/// resolution that finishes after a later event has already published is
/// discarded, so a stale read can never overwrite a newer verdict even when
/// the session flips rapidly. A resolution future that is dropped mid-read
/// publishes nothing at all.
pub struct SessionResolver {
    store: StoreState,
    next_seq: AtomicU64,
    published_seq: Mutex<u64>,
    verdict_tx: watch::Sender<Verdict>,
}

impl SessionResolver {
    pub fn new(store: StoreState) -> Self {
        let (verdict_tx, _) = watch::channel(Verdict::Unresolved);
        Self {
            store,
            next_seq: AtomicU64::new(0),
            published_seq: Mutex::new(0),
            verdict_tx,
        }
    }

    /// Observe verdict transitions. The receiver starts at the currently
    /// active verdict (`Unresolved` before the first event).
    pub fn subscribe(&self) -> watch::Receiver<Verdict> {
        self.verdict_tx.subscribe()
    }

    /// The currently active verdict.
    pub fn current(&self) -> Verdict {
        self.verdict_tx.borrow().clone()
    }

    /// Resolves the authorization role for one session key.
    ///
    /// Idempotent: re-running against an unchanged store yields the same role
    /// every time. The permission-denied branch deliberately grants the
    /// low-privilege default instead of failing, so a misconfigured store
    /// access rule cannot strand a legitimate user on the loading screen.
    pub async fn resolve_role(&self, uid: Uuid) -> Option<Role> {
        match self
            .store
            .get_document(USERS_COLLECTION, &uid.to_string())
            .await
        {
            Ok(Some(doc)) => doc
                .fields
                .get("role")
                .and_then(Value::as_str)
                .filter(|r| !r.is_empty())
                .and_then(|r| r.parse().ok()),
            Ok(None) => None,
            Err(StoreError::PermissionDenied) => {
                tracing::warn!(
                    %uid,
                    "permission denied reading profile; granting default role — check store access rules"
                );
                Some(Role::User)
            }
            Err(e) => {
                tracing::error!(%uid, error = %e, "profile read failed during role resolution");
                None
            }
        }
    }

    /// Processes one session-change event and returns the verdict it
    /// computed. The verdict is published to subscribers unless a later
    /// event already published by the time the profile read finished.
    pub async fn handle_session_change(&self, session: Option<Session>) -> Verdict {
        // Sequence numbers are taken at event arrival, before any store IO,
        // so they reflect provider emission order.
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;

        let verdict = match session {
            // No session: no store read, publish immediately.
            None => Verdict::Unauthenticated,
            Some(session) => {
                let role = self.resolve_role(session.uid).await;
                Verdict::Authenticated {
                    uid: session.uid,
                    role,
                }
            }
        };

        self.publish(seq, verdict.clone());
        verdict
    }

    fn publish(&self, seq: u64, verdict: Verdict) {
        let mut published = self
            .published_seq
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if seq < *published {
            tracing::debug!(seq, latest = *published, "discarding superseded verdict");
            return;
        }
        *published = seq;
        self.verdict_tx.send_replace(verdict);
    }
}

/// The concrete type used to share the resolver across the application state.
pub type ResolverState = Arc<SessionResolver>;
