// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::tests::helpers::{bulletin_id, code, create_test_bulletin, test_date};
use crate::{ActiveBulletin, WorkingSet};
use albina_domain::{Bulletin, DangerRating};

fn owners(bulletins: &[&Bulletin]) -> Vec<String> {
    bulletins
        .iter()
        .map(|b| b.owner_region.as_str().to_string())
        .collect()
}

#[test]
fn test_refresh_replaces_internal_bulletins() {
    let mut set: WorkingSet = WorkingSet::new(test_date());
    set.merge_internal(
        vec![create_test_bulletin("b-1", "AT-07", &["AT-07-01"])],
        None,
    );

    set.merge_internal(
        vec![create_test_bulletin("b-2", "AT-07", &["AT-07-02"])],
        None,
    );

    assert_eq!(set.internal().len(), 1);
    assert!(set.find(&bulletin_id("b-1")).is_none());
    assert!(set.find(&bulletin_id("b-2")).is_some());
}

#[test]
fn test_active_bulletin_survives_refresh() {
    let mut set: WorkingSet = WorkingSet::new(test_date());
    let mut local: Bulletin = create_test_bulletin("b-1", "AT-07", &["AT-07-01"]);
    local.forenoon.above.danger_rating = DangerRating::High;
    let server_copy: Bulletin = create_test_bulletin("b-1", "AT-07", &["AT-07-01"]);

    set.merge_internal(
        vec![server_copy],
        Some(ActiveBulletin {
            bulletin: &local,
            disabled: false,
        }),
    );

    let merged: &Bulletin = set.find(&bulletin_id("b-1")).unwrap();
    assert_eq!(merged.forenoon.above.danger_rating, DangerRating::High);
    assert_eq!(set.internal().len(), 1);
}

#[test]
fn test_unsaved_active_bulletin_is_kept_next_to_refresh() {
    let mut set: WorkingSet = WorkingSet::new(test_date());
    let local: Bulletin = create_test_bulletin("b-new", "AT-07", &["AT-07-03"]);

    set.merge_internal(
        vec![create_test_bulletin("b-1", "AT-07", &["AT-07-01"])],
        Some(ActiveBulletin {
            bulletin: &local,
            disabled: false,
        }),
    );

    assert_eq!(set.internal().len(), 2);
    assert!(set.find(&bulletin_id("b-new")).is_some());
}

#[test]
fn test_disabled_active_bulletin_loses_to_server() {
    let mut set: WorkingSet = WorkingSet::new(test_date());
    let mut local: Bulletin = create_test_bulletin("b-1", "AT-07", &["AT-07-01"]);
    local.forenoon.above.danger_rating = DangerRating::High;

    set.merge_internal(
        vec![create_test_bulletin("b-1", "AT-07", &["AT-07-01"])],
        Some(ActiveBulletin {
            bulletin: &local,
            disabled: true,
        }),
    );

    let merged: &Bulletin = set.find(&bulletin_id("b-1")).unwrap();
    assert_eq!(merged.forenoon.above.danger_rating, DangerRating::Considerable);
}

#[test]
fn test_bulletins_are_sorted_by_owner_region() {
    let mut set: WorkingSet = WorkingSet::new(test_date());
    set.merge_internal(
        vec![
            create_test_bulletin("b-tn", "IT-32-TN", &["IT-32-TN-01"]),
            create_test_bulletin("b-at", "AT-07", &["AT-07-01"]),
            create_test_bulletin("b-bz", "IT-32-BZ", &["IT-32-BZ-01"]),
        ],
        None,
    );
    set.merge_external(
        "aran",
        vec![create_test_bulletin("b-aran", "ES-CT-L", &["ES-CT-L-04"])],
    );

    let internal: Vec<&Bulletin> = set.internal().iter().collect();
    assert_eq!(owners(&internal), vec!["AT-07", "IT-32-BZ", "IT-32-TN"]);
    assert_eq!(
        owners(&set.all()),
        vec!["AT-07", "ES-CT-L", "IT-32-BZ", "IT-32-TN"]
    );
}

#[test]
fn test_external_servers_are_kept_apart() {
    let mut set: WorkingSet = WorkingSet::new(test_date());
    set.merge_external(
        "aran",
        vec![create_test_bulletin("b-aran", "ES-CT-L", &["ES-CT-L-04"])],
    );
    set.merge_external(
        "slovenia",
        vec![create_test_bulletin("b-si", "SI", &["SI1"])],
    );

    set.merge_external("aran", Vec::new());

    assert!(set.external("aran").is_empty());
    assert_eq!(set.external("slovenia").len(), 1);
    assert_eq!(
        set.external_servers().collect::<Vec<&str>>(),
        vec!["aran", "slovenia"]
    );

    set.remove_external("slovenia");
    assert!(set.external("slovenia").is_empty());
}

#[test]
fn test_daytime_flag_follows_every_source() {
    let mut set: WorkingSet = WorkingSet::new(test_date());
    let mut split: Bulletin = create_test_bulletin("b-si", "SI", &["SI1"]);
    split.has_daytime_dependency = true;

    set.merge_external("slovenia", vec![split]);
    assert!(set.is_daytime_dependent());

    set.remove_external("slovenia");
    assert!(!set.is_daytime_dependent());
}

#[test]
fn test_own_and_foreign_bulletins() {
    let mut set: WorkingSet = WorkingSet::new(test_date());
    let mut shared: Bulletin = create_test_bulletin("b-bz", "IT-32-BZ", &["IT-32-BZ-01"]);
    shared.regions.saved.push(code("AT-07-09"));
    set.merge_internal(
        vec![
            create_test_bulletin("b-at", "AT-07", &["AT-07-01"]),
            shared,
            create_test_bulletin("b-tn", "IT-32-TN", &["IT-32-TN-01"]),
        ],
        None,
    );

    let own: Vec<&Bulletin> = set.own_bulletins(&code("AT-07"));
    let foreign: Vec<&Bulletin> = set.foreign_bulletins(&code("AT-07"));

    assert_eq!(owners(&own), vec!["AT-07", "IT-32-BZ"]);
    assert_eq!(owners(&foreign), vec!["IT-32-TN"]);
}

#[test]
fn test_bulletins_to_save_are_stamped_with_validity() {
    let mut set: WorkingSet = WorkingSet::new(test_date());
    set.merge_internal(
        vec![
            create_test_bulletin("b-at", "AT-07", &["AT-07-01"]),
            create_test_bulletin("b-tn", "IT-32-TN", &["IT-32-TN-01"]),
        ],
        None,
    );

    let to_save: Vec<Bulletin> = set.bulletins_to_save(&code("AT-07")).unwrap();

    assert_eq!(to_save.len(), 1);
    assert_eq!(to_save[0].validity.unwrap().date(), test_date());
}

#[test]
fn test_upsert_and_remove_local_bulletins() {
    let mut set: WorkingSet = WorkingSet::new(test_date());
    set.upsert(create_test_bulletin("b-1", "AT-07", &["AT-07-01"]));

    let mut changed: Bulletin = create_test_bulletin("b-1", "AT-07", &["AT-07-01"]);
    changed.forenoon.above.danger_rating = DangerRating::Low;
    set.upsert(changed);

    assert_eq!(set.internal().len(), 1);
    assert_eq!(
        set.internal()[0].forenoon.above.danger_rating,
        DangerRating::Low
    );

    assert!(set.remove(&bulletin_id("b-1")).is_some());
    assert!(set.remove(&bulletin_id("b-1")).is_none());
}
