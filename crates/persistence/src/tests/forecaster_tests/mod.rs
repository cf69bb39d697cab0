// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Forecaster account and session persistence.

use crate::{ForecasterData, PersistenceError, SessionData, SqlitePersistence, verify_password};

fn with_alice() -> (SqlitePersistence, i64) {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();
    let id: i64 = persistence
        .create_forecaster("Alice", "Alice Forecaster", "secret", "AT-07", "forecaster")
        .unwrap();
    (persistence, id)
}

#[test]
fn test_create_forecaster_normalizes_username() {
    let (mut persistence, id) = with_alice();

    let forecaster: ForecasterData = persistence
        .get_forecaster_by_username("ALICE")
        .unwrap()
        .unwrap();

    assert_eq!(forecaster.forecaster_id, id);
    assert_eq!(forecaster.username, "alice");
    assert_eq!(forecaster.region, "AT-07");
    assert_eq!(forecaster.role, "forecaster");
    assert!(!forecaster.is_disabled);
}

#[test]
fn test_password_is_hashed() {
    let (mut persistence, id) = with_alice();

    let forecaster: ForecasterData = persistence.get_forecaster_by_id(id).unwrap().unwrap();

    assert_ne!(forecaster.password_hash, "secret");
    assert!(verify_password("secret", &forecaster.password_hash).unwrap());
    assert!(!verify_password("wrong", &forecaster.password_hash).unwrap());
}

#[test]
fn test_duplicate_username_is_rejected() {
    let (mut persistence, _) = with_alice();

    let result: Result<i64, PersistenceError> =
        persistence.create_forecaster("alice", "Other", "pw", "IT-32-BZ", "forecaster");

    assert!(matches!(result, Err(PersistenceError::ConstraintViolation(_))));
}

#[test]
fn test_unknown_role_is_rejected() {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();

    let result: Result<i64, PersistenceError> =
        persistence.create_forecaster("bob", "Bob", "pw", "AT-07", "superuser");

    assert!(matches!(result, Err(PersistenceError::ConstraintViolation(_))));
}

#[test]
fn test_session_lifecycle() {
    let (mut persistence, id) = with_alice();

    persistence
        .create_session("session_1", id, "2026-02-01T00:00:00Z")
        .unwrap();

    let session: SessionData = persistence.get_session_by_token("session_1").unwrap().unwrap();
    assert_eq!(session.forecaster_id, id);
    persistence.update_session_activity(session.session_id).unwrap();

    persistence.delete_session("session_1").unwrap();
    assert!(persistence.get_session_by_token("session_1").unwrap().is_none());
}

#[test]
fn test_expired_sessions_are_deleted() {
    let (mut persistence, id) = with_alice();
    persistence
        .create_session("old", id, "2026-01-01T00:00:00Z")
        .unwrap();
    persistence
        .create_session("fresh", id, "2026-03-01T00:00:00Z")
        .unwrap();

    let deleted: usize = persistence
        .delete_expired_sessions("2026-02-01T00:00:00Z")
        .unwrap();

    assert_eq!(deleted, 1);
    assert!(persistence.get_session_by_token("old").unwrap().is_none());
    assert!(persistence.get_session_by_token("fresh").unwrap().is_some());
}

#[test]
fn test_disable_forecaster_drops_sessions() {
    let (mut persistence, id) = with_alice();
    persistence
        .create_session("session_1", id, "2026-02-01T00:00:00Z")
        .unwrap();

    persistence.disable_forecaster(id).unwrap();

    assert!(persistence.get_forecaster_by_id(id).unwrap().unwrap().is_disabled);
    assert!(persistence.get_session_by_token("session_1").unwrap().is_none());
    assert!(matches!(
        persistence.disable_forecaster(999),
        Err(PersistenceError::ForecasterNotFound(_))
    ));
}

#[test]
fn test_list_forecasters_is_ordered() {
    let (mut persistence, _) = with_alice();
    persistence
        .create_forecaster("bob", "Bob", "pw", "IT-32-BZ", "foreman")
        .unwrap();

    let usernames: Vec<String> = persistence
        .list_forecasters()
        .unwrap()
        .into_iter()
        .map(|f| f.username)
        .collect();

    assert_eq!(usernames, vec!["alice", "bob"]);
    assert_eq!(persistence.count_forecasters().unwrap(), 2);
}
