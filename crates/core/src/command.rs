// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use albina_domain::{
    AvalancheProblem, Bulletin, BulletinId, DangerRating, Daytime, ElevationBand, LanguageCode,
    Text,
};
use time::OffsetDateTime;

/// A command represents forecaster intent for a region's day as data only.
///
/// Commands are the only way to request workflow state changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Replace the acting region's contributions for the day.
    SaveBulletins {
        /// Every bulletin that holds one of the acting region's micro-regions,
        /// plus foreign bulletins the acting region accepted suggestions on.
        bulletins: Vec<Bulletin>,
        /// When the save happens, for the missing-day cutoff.
        now: OffsetDateTime,
    },
    /// Delete one bulletin created by the acting region.
    DeleteBulletin {
        /// The bulletin to delete.
        bulletin: BulletinId,
    },
    /// Reopen a submitted or published day for editing.
    StartUpdate {
        /// When the update starts, for the missing-day cutoff.
        now: OffsetDateTime,
    },
    /// Submit the day for publication.
    Submit,
    /// Publish the submitted day.
    Publish {
        /// The publication is a correction of an already published day.
        change: bool,
        /// When the publish is requested, checked against the gate.
        now: OffsetDateTime,
    },
}

impl Command {
    /// Returns the audit name of the command.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SaveBulletins { .. } => "SaveBulletins",
            Self::DeleteBulletin { .. } => "DeleteBulletin",
            Self::StartUpdate { .. } => "StartUpdate",
            Self::Submit => "Submit",
            Self::Publish { .. } => "Publish",
        }
    }
}

/// Bulletin-level text fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextField {
    AvActivityHighlights,
    AvActivityComment,
    SnowpackStructureHighlights,
    SnowpackStructureComment,
    TendencyComment,
}

/// An edit of a single bulletin's content.
///
/// Edits are applied by [`crate::apply_edit`], which returns a new bulletin
/// instead of mutating the one being edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulletinEdit {
    /// Split or join the above/below halves.
    SetElevationDependency(bool),
    /// Split or join the forenoon/afternoon halves.
    SetDaytimeDependency(bool),
    /// Set the threshold altitude, rounded to 100 m.
    SetElevation(Option<i64>),
    /// Use the treeline instead of a numeric threshold.
    SetTreeline(bool),
    /// Set the danger rating of one description.
    SetDangerRating {
        daytime: Daytime,
        band: ElevationBand,
        rating: DangerRating,
    },
    /// Fill or clear one avalanche problem slot.
    SetAvalancheProblem {
        daytime: Daytime,
        band: ElevationBand,
        slot: usize,
        problem: Option<AvalancheProblem>,
    },
    /// Set one language of a bulletin text; a blank value removes it.
    SetText {
        field: TextField,
        language: LanguageCode,
        value: String,
    },
    /// Merge a translated text into a bulletin text.
    MergeText { field: TextField, text: Text },
}
