// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{BulletinApi, ClientError, Editor, EditorSession, LockChannels, LockManager};
use albina_domain::{
    Aspect, Author, AvalancheProblem, AvalancheProblemType, AvalancheSize, Bulletin, BulletinId,
    BulletinStatus, CheckCode, DEFAULT_TIMEZONE, DangerRating, Frequency, MatrixInformation,
    PublicationSchedule, RegionCode, RegionDayStatus, SnowpackStability,
};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use time::Date;
use time::macros::date;

pub fn code(value: &str) -> RegionCode {
    RegionCode::new(value).unwrap()
}

pub fn bulletin_id(value: &str) -> BulletinId {
    BulletinId::new(value).unwrap()
}

pub const fn test_date() -> Date {
    date!(2026 - 01 - 16)
}

pub fn complete_problem() -> AvalancheProblem {
    let mut problem: AvalancheProblem = AvalancheProblem::new(AvalancheProblemType::WindSlab);
    problem.aspects.insert(Aspect::N);
    problem.danger_rating = DangerRating::Considerable;
    problem.matrix = MatrixInformation {
        snowpack_stability: Some(SnowpackStability::Poor),
        frequency: Some(Frequency::Some),
        avalanche_size: Some(AvalancheSize::Medium),
    };
    problem
}

/// A saved bulletin of `owner` holding `regions`, with one complete problem.
pub fn create_test_bulletin(id: &str, owner: &str, regions: &[&str]) -> Bulletin {
    let mut bulletin: Bulletin = Bulletin::new(code(owner), Author::new("Alice"));
    bulletin.id = Some(bulletin_id(id));
    bulletin.regions.saved = regions.iter().map(|r| code(r)).collect();
    bulletin.forenoon.above.danger_rating = DangerRating::Considerable;
    bulletin.forenoon.above.avalanche_problems[0] = Some(complete_problem());
    bulletin
}

pub fn day_status(status: BulletinStatus) -> RegionDayStatus {
    RegionDayStatus {
        date: test_date(),
        status,
    }
}

// ============================================================================
// In-memory server
// ============================================================================

#[derive(Debug, Default)]
pub struct MockState {
    pub bulletins: Vec<Bulletin>,
    pub statuses: Vec<RegionDayStatus>,
    pub check_codes: Vec<CheckCode>,
    pub locked_dates: Vec<Date>,
    pub fail_loads: bool,
    pub next_id: usize,
    pub edit_calls: usize,
    pub saves: Vec<(Date, Vec<Bulletin>)>,
    pub deleted: Vec<BulletinId>,
    pub check_calls: usize,
    pub submit_calls: usize,
    pub publish_calls: usize,
}

pub struct MockApi {
    name: String,
    pub state: Mutex<MockState>,
}

impl MockApi {
    pub fn new(name: &str, state: MockState) -> Self {
        Self {
            name: name.to_string(),
            state: Mutex::new(state),
        }
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }
}

#[async_trait]
impl BulletinApi for MockApi {
    fn name(&self) -> &str {
        &self.name
    }

    async fn edit_bulletins(
        &self,
        _date: Date,
        _regions: &[RegionCode],
    ) -> Result<Vec<Bulletin>, ClientError> {
        let mut state = self.state();
        state.edit_calls += 1;
        if state.fail_loads {
            return Err(ClientError::Transport(String::from("connection refused")));
        }
        Ok(state.bulletins.clone())
    }

    async fn save_bulletins(
        &self,
        date: Date,
        region: &RegionCode,
        bulletins: &[Bulletin],
    ) -> Result<Vec<Bulletin>, ClientError> {
        let mut state = self.state();
        let mut saved: Vec<Bulletin> = Vec::new();
        for bulletin in bulletins {
            let mut stored: Bulletin = bulletin.clone();
            if stored.id.is_none() {
                state.next_id += 1;
                stored.id = Some(bulletin_id(&format!("new-{}", state.next_id)));
            }
            saved.push(stored);
        }
        state.saves.push((date, saved.clone()));
        if date != test_date() {
            return Ok(saved);
        }

        // Like the server: replace the region's contributions, answer with
        // every bulletin of the day touching the region.
        state.bulletins.retain(|b| {
            !b.is_created_by(region) && !saved.iter().any(|s| s.id.is_some() && s.id == b.id)
        });
        state.bulletins.extend(saved);
        Ok(state
            .bulletins
            .iter()
            .filter(|b| {
                b.is_created_by(region)
                    || b.regions.holds_within(region)
                    || b.regions.suggests_within(region)
            })
            .cloned()
            .collect())
    }

    async fn delete_bulletin(
        &self,
        _date: Date,
        _region: &RegionCode,
        id: &BulletinId,
    ) -> Result<BulletinStatus, ClientError> {
        let mut state = self.state();
        state.bulletins.retain(|b| b.id.as_ref() != Some(id));
        state.deleted.push(id.clone());
        Ok(BulletinStatus::Draft)
    }

    async fn start_update(
        &self,
        _date: Date,
        _region: &RegionCode,
    ) -> Result<BulletinStatus, ClientError> {
        Ok(BulletinStatus::Updated)
    }

    async fn submit(
        &self,
        _date: Date,
        _region: &RegionCode,
    ) -> Result<BulletinStatus, ClientError> {
        self.state().submit_calls += 1;
        Ok(BulletinStatus::Submitted)
    }

    async fn publish(
        &self,
        _date: Date,
        _region: &RegionCode,
        _change: bool,
    ) -> Result<BulletinStatus, ClientError> {
        self.state().publish_calls += 1;
        Ok(BulletinStatus::Published)
    }

    async fn check(&self, _date: Date, _region: &RegionCode) -> Result<Vec<CheckCode>, ClientError> {
        let mut state = self.state();
        state.check_calls += 1;
        Ok(state.check_codes.clone())
    }

    async fn internal_status(
        &self,
        _start: Date,
        _end: Date,
        _region: &RegionCode,
    ) -> Result<Vec<RegionDayStatus>, ClientError> {
        Ok(self.state().statuses.clone())
    }

    async fn locked_regions(&self, _region: &RegionCode) -> Result<Vec<Date>, ClientError> {
        Ok(self.state().locked_dates.clone())
    }
}

// ============================================================================
// Editor fixture
// ============================================================================

pub struct Harness {
    pub editor: Editor,
    pub api: Arc<MockApi>,
    /// Kept alive so lock messages can be sent; tests may drain it.
    pub channels: LockChannels,
}

/// An editor of alice acting for AT-07 on the test day, not yet loaded.
pub fn harness(state: MockState) -> Harness {
    let api: Arc<MockApi> = Arc::new(MockApi::new("internal", state));
    let (locks, channels) = LockManager::with_channels("alice");
    let session: EditorSession = EditorSession::new(
        Author::new("Alice"),
        code("AT-07"),
        Vec::new(),
        PublicationSchedule::new(DEFAULT_TIMEZONE).unwrap(),
        test_date(),
    );
    let editor: Editor = Editor::new(session, api.clone(), Arc::new(locks));
    Harness {
        editor,
        api,
        channels,
    }
}

/// A loaded editor with one own and one foreign bulletin.
pub async fn loaded_harness(status: BulletinStatus) -> Harness {
    let state: MockState = MockState {
        bulletins: vec![
            create_test_bulletin("b-1", "AT-07", &["AT-07-01"]),
            create_test_bulletin("b-2", "IT-32-BZ", &["IT-32-BZ-01"]),
        ],
        statuses: vec![day_status(status)],
        ..MockState::default()
    };
    let harness: Harness = harness(state);
    harness.editor.load(test_date()).await.unwrap();
    harness
}
