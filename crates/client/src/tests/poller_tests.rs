// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::tests::helpers::{
    Harness, MockApi, MockState, bulletin_id, code, create_test_bulletin, loaded_harness,
};
use crate::{ClientConfig, FederatedServer, FederationPoller, PollSchedule, PollerHandle};
use albina_domain::BulletinStatus;
use std::sync::Arc;
use std::time::Duration;

fn fast_schedule() -> PollSchedule {
    PollSchedule {
        internal: Duration::from_millis(20),
        external: Duration::from_millis(20),
        external_initial_delay: Duration::from_millis(10),
    }
}

fn peer(state: MockState) -> Arc<MockApi> {
    Arc::new(MockApi::new("euregio-trentino", state))
}

#[tokio::test]
async fn test_poller_merges_peer_bulletins_read_only() {
    let harness: Harness = loaded_harness(BulletinStatus::Draft).await;
    let api: Arc<MockApi> = peer(MockState {
        bulletins: vec![create_test_bulletin("tn-1", "IT-32-TN", &["IT-32-TN-01"])],
        ..MockState::default()
    });
    let servers: Vec<FederatedServer> = vec![FederatedServer {
        api: api.clone(),
        regions: vec![code("IT-32-TN")],
    }];

    let handle: PollerHandle = FederationPoller::spawn(&harness.editor, servers, fast_schedule());
    assert_eq!(handle.task_count(), 2);
    tokio::time::sleep(Duration::from_millis(150)).await;
    handle.shutdown();

    let session = harness.editor.session();
    let session = session.lock().await;
    assert_eq!(session.working_set().external("euregio-trentino").len(), 1);
    assert!(session.working_set().find(&bulletin_id("tn-1")).is_none());
    assert!(!session.external_load_error("euregio-trentino"));
    assert!(api.state().edit_calls >= 1);
}

#[tokio::test]
async fn test_poller_refreshes_own_server_repeatedly() {
    let harness: Harness = loaded_harness(BulletinStatus::Draft).await;
    let loads: usize = harness.api.state().edit_calls;

    let handle: PollerHandle = FederationPoller::spawn(&harness.editor, Vec::new(), fast_schedule());
    tokio::time::sleep(Duration::from_millis(150)).await;
    drop(handle);

    assert!(harness.api.state().edit_calls > loads + 1);
}

#[tokio::test]
async fn test_failing_peer_is_marked_and_does_not_stop_polling() {
    let harness: Harness = loaded_harness(BulletinStatus::Draft).await;
    let api: Arc<MockApi> = peer(MockState {
        fail_loads: true,
        ..MockState::default()
    });
    let servers: Vec<FederatedServer> = vec![FederatedServer {
        api: api.clone(),
        regions: vec![code("IT-32-TN")],
    }];

    let handle: PollerHandle = FederationPoller::spawn(&harness.editor, servers, fast_schedule());
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert!(
        harness
            .editor
            .session()
            .lock()
            .await
            .external_load_error("euregio-trentino")
    );
    assert!(api.state().edit_calls > 1);
    assert!(!harness.editor.session().lock().await.load_error());
    handle.shutdown();
}

#[tokio::test]
async fn test_schedule_follows_configuration() {
    let mut config: ClientConfig = ClientConfig::new("http://localhost:3000", "alice", "secret");
    config.internal_poll_secs = 7;

    let schedule: PollSchedule = PollSchedule::from(&config);

    assert_eq!(schedule.internal, Duration::from_secs(7));
    assert_eq!(schedule.external, Duration::from_secs(30));
    assert_eq!(schedule.external_initial_delay, Duration::from_secs(2));
}
