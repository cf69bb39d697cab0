// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Backend initialization tests.
//!
//! Every other test module initializes an in-memory database too, so these
//! only cover what is not implied by them.

use crate::error::PersistenceError;
use crate::SqlitePersistence;

#[test]
fn test_persistence_initialization() {
    let result: Result<SqlitePersistence, PersistenceError> = SqlitePersistence::new_in_memory();
    assert!(result.is_ok());
}

#[test]
fn test_foreign_keys_are_enforced() {
    let mut persistence: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();
    assert!(persistence.verify_foreign_key_enforcement().is_ok());

    // A session for a forecaster that does not exist violates the foreign key.
    let result: Result<i64, PersistenceError> =
        persistence.create_session("token", 42, "2026-02-01T00:00:00Z");
    assert!(matches!(result, Err(PersistenceError::ConstraintViolation(_))));
}

#[test]
fn test_multiple_in_memory_instances_are_isolated() {
    let mut db1: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();
    let mut db2: SqlitePersistence = SqlitePersistence::new_in_memory().unwrap();

    db1.create_forecaster("alice", "Alice", "password", "AT-07", "forecaster")
        .unwrap();

    assert_eq!(db1.count_forecasters().unwrap(), 1, "db1 should have 1 forecaster");
    assert_eq!(db2.count_forecasters().unwrap(), 0, "db2 should be isolated");
}

#[test]
fn test_file_database_survives_reopen() {
    let path: std::path::PathBuf = std::env::temp_dir().join(format!(
        "albina_persistence_test_{}.db",
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);

    {
        let mut persistence: SqlitePersistence = SqlitePersistence::new_with_file(&path).unwrap();
        persistence
            .create_forecaster("alice", "Alice", "password", "AT-07", "forecaster")
            .unwrap();
    }

    let mut reopened: SqlitePersistence = SqlitePersistence::new_with_file(&path).unwrap();
    assert_eq!(reopened.count_forecasters().unwrap(), 1);

    drop(reopened);
    let _ = std::fs::remove_file(&path);
}
