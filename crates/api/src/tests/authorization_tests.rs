// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Role and region authorization.

use albina_persistence::SqlitePersistence;

use crate::{
    ApiError, AuthError, AuthorizationService, PublishAllQuery, publish_all, save_bulletins,
};

use super::helpers::{
    before_5pm, code, create_test_admin, create_test_bulletin, create_test_cause,
    create_test_forecaster, create_test_foreman, create_test_observer, day, schedule,
    setup_test_persistence, test_date,
};

#[test]
fn test_forecaster_may_write_own_region_and_sub_regions() {
    let alice = create_test_forecaster();

    assert!(AuthorizationService::authorize_region_write(&alice, &code("AT-07"), "save").is_ok());
    assert!(
        AuthorizationService::authorize_region_write(&alice, &code("AT-07-A"), "save").is_ok()
    );
}

#[test]
fn test_forecaster_may_not_write_foreign_region() {
    let alice = create_test_forecaster();

    let result = AuthorizationService::authorize_region_write(&alice, &code("IT-32-BZ"), "save");

    assert_eq!(
        result,
        Err(AuthError::RegionNotPermitted {
            username: String::from("alice"),
            region: code("IT-32-BZ"),
        })
    );
}

#[test]
fn test_admin_may_write_any_region() {
    let admin = create_test_admin();

    assert!(
        AuthorizationService::authorize_region_write(&admin, &code("IT-32-BZ"), "save").is_ok()
    );
}

#[test]
fn test_observer_save_is_rejected() {
    let mut persistence: SqlitePersistence = setup_test_persistence();

    let result = save_bulletins(
        &mut persistence,
        &schedule(),
        &create_test_observer(),
        &day("AT-07"),
        vec![create_test_bulletin("AT-07", &["AT-07-01"])],
        before_5pm(),
        create_test_cause(),
    );

    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));
    assert!(persistence.get_bulletins(test_date()).unwrap().is_empty());
}

#[test]
fn test_foreign_region_save_is_rejected() {
    let mut persistence: SqlitePersistence = setup_test_persistence();

    let result = save_bulletins(
        &mut persistence,
        &schedule(),
        &create_test_foreman(),
        &day("AT-07"),
        vec![create_test_bulletin("AT-07", &["AT-07-01"])],
        before_5pm(),
        create_test_cause(),
    );

    assert!(matches!(result, Err(ApiError::RegionNotPermitted { .. })));
}

#[test]
fn test_publish_all_requires_admin() {
    let mut persistence: SqlitePersistence = setup_test_persistence();

    let result = publish_all(
        &mut persistence,
        &schedule(),
        &create_test_foreman(),
        &PublishAllQuery { date: test_date() },
        before_5pm(),
        &create_test_cause(),
    );

    assert_eq!(
        result,
        Err(ApiError::Unauthorized {
            action: String::from("publish_all"),
            required_role: String::from("admin"),
        })
    );
}
