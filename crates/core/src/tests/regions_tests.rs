// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::tests::helpers::{code, create_test_bulletin};
use crate::{CoreError, reconcile_selection};
use albina_domain::{Bulletin, RegionCode};

fn codes(values: &[&str]) -> Vec<RegionCode> {
    values.iter().map(|v| code(v)).collect()
}

#[test]
fn test_claimed_region_is_released_from_sibling() {
    let bulletins: Vec<Bulletin> = vec![
        create_test_bulletin("b1", "AT-07", &["AT-07-01"]),
        create_test_bulletin("b2", "AT-07", &["AT-07-02", "AT-07-03"]),
    ];

    let result: Vec<Bulletin> =
        reconcile_selection(&bulletins, 0, &code("AT-07"), &codes(&["AT-07-01", "AT-07-02"]))
            .unwrap();

    assert_eq!(result[0].regions.saved, codes(&["AT-07-01", "AT-07-02"]));
    assert_eq!(result[1].regions.saved, codes(&["AT-07-03"]));
}

#[test]
fn test_own_bulletin_needs_own_region() {
    let bulletins: Vec<Bulletin> = vec![create_test_bulletin("b1", "AT-07", &["AT-07-01"])];

    let result = reconcile_selection(&bulletins, 0, &code("AT-07"), &codes(&["IT-32-BZ-01"]));

    assert!(matches!(result, Err(CoreError::NoRegionSelected { .. })));
}

#[test]
fn test_foreign_regions_become_suggestions() {
    let bulletins: Vec<Bulletin> = vec![create_test_bulletin("b1", "AT-07", &["AT-07-01"])];

    let result: Vec<Bulletin> = reconcile_selection(
        &bulletins,
        0,
        &code("AT-07"),
        &codes(&["AT-07-01", "IT-32-BZ-01", "AT-07-02"]),
    )
    .unwrap();

    assert_eq!(result[0].regions.saved, codes(&["AT-07-01", "AT-07-02"]));
    assert_eq!(result[0].regions.suggested, codes(&["IT-32-BZ-01"]));
}

#[test]
fn test_foreign_bulletin_accepts_selection_without_own_region() {
    let bulletins: Vec<Bulletin> = vec![
        create_test_bulletin("bz", "IT-32-BZ", &["IT-32-BZ-01"]),
        create_test_bulletin("b1", "AT-07", &["AT-07-01"]),
    ];

    let result: Vec<Bulletin> =
        reconcile_selection(&bulletins, 0, &code("AT-07"), &codes(&["IT-32-TN-01"])).unwrap();

    assert_eq!(result[0].regions.saved, codes(&["IT-32-BZ-01"]));
    assert_eq!(result[0].regions.suggested, codes(&["IT-32-TN-01"]));
    assert_eq!(result[1], bulletins[1]);
}

#[test]
fn test_unknown_index_is_rejected() {
    let bulletins: Vec<Bulletin> = vec![create_test_bulletin("b1", "AT-07", &["AT-07-01"])];

    let result = reconcile_selection(&bulletins, 3, &code("AT-07"), &codes(&["AT-07-01"]));

    assert!(matches!(
        result,
        Err(CoreError::UnknownBulletinIndex { index: 3 })
    ));
}
