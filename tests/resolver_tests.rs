use heritage_portal::identity::Session;
use heritage_portal::models::{Role, USERS_COLLECTION};
use heritage_portal::resolver::{SessionResolver, Verdict};
use heritage_portal::store::{DocumentStore, MemoryStore, StoreError, StoreState};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

fn setup() -> (Arc<MemoryStore>, SessionResolver) {
    let store = Arc::new(MemoryStore::new());
    let resolver = SessionResolver::new(store.clone() as StoreState);
    (store, resolver)
}

fn session(uid: Uuid) -> Session {
    Session {
        uid,
        email: "someone@example.com".to_owned(),
    }
}

#[cfg(test)]
mod role_resolution_tests {
    use super::*;

    #[tokio::test]
    async fn role_comes_from_the_profile_document() {
        let (store, resolver) = setup();
        let uid = Uuid::new_v4();
        store
            .set_document(USERS_COLLECTION, &uid.to_string(), json!({"role": "admin"}))
            .await
            .unwrap();

        assert_eq!(resolver.resolve_role(uid).await, Some(Role::Admin));
    }

    #[tokio::test]
    async fn missing_profile_means_no_role() {
        let (_store, resolver) = setup();
        assert_eq!(resolver.resolve_role(Uuid::new_v4()).await, None);
    }

    #[tokio::test]
    async fn empty_or_unknown_role_strings_mean_no_role() {
        let (store, resolver) = setup();
        let uid = Uuid::new_v4();

        store
            .set_document(USERS_COLLECTION, &uid.to_string(), json!({"role": ""}))
            .await
            .unwrap();
        assert_eq!(resolver.resolve_role(uid).await, None);

        store
            .set_document(
                USERS_COLLECTION,
                &uid.to_string(),
                json!({"role": "superuser"}),
            )
            .await
            .unwrap();
        assert_eq!(resolver.resolve_role(uid).await, None);
    }

    #[tokio::test]
    async fn permission_denied_grants_exactly_the_default_role() {
        let (store, resolver) = setup();
        let uid = Uuid::new_v4();
        // Even a stored admin profile must not leak through a denied read.
        store
            .set_document(USERS_COLLECTION, &uid.to_string(), json!({"role": "admin"}))
            .await
            .unwrap();
        store.fail_reads_with(StoreError::PermissionDenied);

        assert_eq!(resolver.resolve_role(uid).await, Some(Role::User));
        // Re-running against the unchanged store yields the same answer.
        assert_eq!(resolver.resolve_role(uid).await, Some(Role::User));
    }

    #[tokio::test]
    async fn other_read_failures_mean_no_role() {
        let (store, resolver) = setup();
        let uid = Uuid::new_v4();
        store.fail_reads_with(StoreError::Backend("connection reset".to_owned()));

        assert_eq!(resolver.resolve_role(uid).await, None);
    }
}

#[cfg(test)]
mod session_change_tests {
    use super::*;

    #[tokio::test]
    async fn signed_out_event_publishes_without_any_store_read() {
        let (store, resolver) = setup();
        // A sign-out must not touch the store at all.
        store.fail_reads_with(StoreError::Backend("store must not be read".to_owned()));

        let verdict = resolver.handle_session_change(None).await;
        assert_eq!(verdict, Verdict::Unauthenticated);
        assert_eq!(resolver.current(), Verdict::Unauthenticated);
    }

    #[tokio::test]
    async fn signed_in_event_carries_the_resolved_role() {
        let (store, resolver) = setup();
        let uid = Uuid::new_v4();
        store
            .set_document(USERS_COLLECTION, &uid.to_string(), json!({"role": "user"}))
            .await
            .unwrap();

        let verdict = resolver.handle_session_change(Some(session(uid))).await;
        assert_eq!(
            verdict,
            Verdict::Authenticated {
                uid,
                role: Some(Role::User)
            }
        );
        assert_eq!(resolver.current(), verdict);
    }

    #[tokio::test]
    async fn verdict_starts_unresolved_until_the_first_event() {
        let (_store, resolver) = setup();
        assert_eq!(resolver.current(), Verdict::Unresolved);
    }

    #[tokio::test]
    async fn subscribers_observe_each_published_transition() {
        let (store, resolver) = setup();
        let uid = Uuid::new_v4();
        store
            .set_document(USERS_COLLECTION, &uid.to_string(), json!({"role": "admin"}))
            .await
            .unwrap();

        let mut rx = resolver.subscribe();
        assert_eq!(*rx.borrow_and_update(), Verdict::Unresolved);

        resolver.handle_session_change(Some(session(uid))).await;
        rx.changed().await.unwrap();
        assert_eq!(
            *rx.borrow_and_update(),
            Verdict::Authenticated {
                uid,
                role: Some(Role::Admin)
            }
        );

        resolver.handle_session_change(None).await;
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), Verdict::Unauthenticated);
    }
}

#[cfg(test)]
mod race_tests {
    use super::*;

    /// A sign-in whose profile read is still in flight when a sign-out
    /// publishes must not win: the later event's verdict stays.
    #[tokio::test]
    async fn slow_resolution_never_overwrites_a_later_event() {
        let (store, resolver) = setup();
        let resolver = Arc::new(resolver);
        let uid = Uuid::new_v4();
        store
            .set_document(USERS_COLLECTION, &uid.to_string(), json!({"role": "admin"}))
            .await
            .unwrap();

        // First event: sign-in, profile read held back.
        store.delay_reads(Duration::from_millis(100));
        let slow = {
            let resolver = resolver.clone();
            let session = session(uid);
            tokio::spawn(async move { resolver.handle_session_change(Some(session)).await })
        };
        // Give the spawned resolution time to claim its sequence number.
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Second event: sign-out, publishes immediately.
        resolver.handle_session_change(None).await;
        assert_eq!(resolver.current(), Verdict::Unauthenticated);

        // The slow resolution completes but its verdict is discarded.
        slow.await.unwrap();
        assert_eq!(resolver.current(), Verdict::Unauthenticated);
    }

    /// A resolution future dropped mid-read (client disconnect) must publish
    /// nothing: the active verdict stays exactly as it was.
    #[tokio::test]
    async fn dropped_resolution_publishes_no_verdict() {
        let (store, resolver) = setup();
        let resolver = Arc::new(resolver);
        let uid = Uuid::new_v4();
        store
            .set_document(USERS_COLLECTION, &uid.to_string(), json!({"role": "user"}))
            .await
            .unwrap();
        store.delay_reads(Duration::from_millis(200));

        let in_flight = {
            let resolver = resolver.clone();
            let session = session(uid);
            tokio::spawn(async move { resolver.handle_session_change(Some(session)).await })
        };
        // Let the resolution reach its profile read, then drop it there.
        tokio::time::sleep(Duration::from_millis(20)).await;
        in_flight.abort();
        assert!(in_flight.await.is_err());

        // Well past the point the read would have completed.
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(resolver.current(), Verdict::Unresolved);

        // The abandoned sequence number does not wedge later events.
        resolver.handle_session_change(None).await;
        assert_eq!(resolver.current(), Verdict::Unauthenticated);
    }

    #[tokio::test]
    async fn rapid_sign_out_then_sign_in_settles_on_the_sign_in() {
        let (store, resolver) = setup();
        let uid = Uuid::new_v4();
        store
            .set_document(USERS_COLLECTION, &uid.to_string(), json!({"role": "user"}))
            .await
            .unwrap();
        store.delay_reads(Duration::from_millis(10));

        resolver.handle_session_change(None).await;
        resolver.handle_session_change(Some(session(uid))).await;

        assert_eq!(
            resolver.current(),
            Verdict::Authenticated {
                uid,
                role: Some(Role::User)
            }
        );
    }
}
