// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The bulletin entity graph.
//!
//! A bulletin is split along two axes:
//! - elevation: `above` / `below` a threshold altitude or the treeline
//! - daytime: `forenoon` / `afternoon`
//!
//! When a dependency flag is off, the dependent half mirrors its source and
//! carries no independent content. The propagation rules that keep the
//! halves consistent live in the core crate; this module only provides the
//! value types and pure accessors.

use crate::danger::{Aspect, AvalancheProblemType, DangerRating, MatrixInformation};
use crate::error::DomainError;
use crate::region::{RegionCode, RegionSets};
use crate::status::BulletinStatus;
use crate::text::Text;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use time::{Date, Duration, OffsetDateTime};

/// Number of avalanche problem slots per elevation description.
pub const MAX_AVALANCHE_PROBLEMS: usize = 5;

/// Highest elevation accepted for a problem bound, in metres.
pub const MAX_ELEVATION: u32 = 9000;

/// Opaque, server-assigned bulletin identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BulletinId(String);

impl BulletinId {
    /// Wraps an identifier.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidBulletinId` if the identifier is blank.
    pub fn new(id: &str) -> Result<Self, DomainError> {
        if id.trim().is_empty() {
            return Err(DomainError::InvalidBulletinId(id.to_string()));
        }
        Ok(Self(id.trim().to_string()))
    }

    /// Returns the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BulletinId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Time-of-day half of a bulletin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Daytime {
    Forenoon,
    Afternoon,
}

/// Elevation half of a bulletin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElevationBand {
    Above,
    Below,
}

/// Rounds an elevation to the nearest 100 m and clamps it to `0..=9000`.
#[must_use]
pub fn normalize_elevation(meters: i64) -> u32 {
    let rounded: i64 = ((meters.clamp(0, i64::from(MAX_ELEVATION)) + 50) / 100) * 100;
    u32::try_from(rounded.min(i64::from(MAX_ELEVATION))).unwrap_or(MAX_ELEVATION)
}

/// One avalanche problem of an elevation description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvalancheProblem {
    /// The typical avalanche problem.
    #[serde(default)]
    pub problem_type: Option<AvalancheProblemType>,
    /// Affected aspects.
    #[serde(default)]
    pub aspects: BTreeSet<Aspect>,
    /// Upper elevation bound in metres.
    #[serde(default)]
    pub elevation_high: Option<u32>,
    /// Upper bound is the treeline.
    #[serde(default)]
    pub treeline_high: bool,
    /// Lower elevation bound in metres.
    #[serde(default)]
    pub elevation_low: Option<u32>,
    /// Lower bound is the treeline.
    #[serde(default)]
    pub treeline_low: bool,
    /// Danger rating derived from the matrix.
    #[serde(default)]
    pub danger_rating: DangerRating,
    /// Danger rating matrix inputs.
    #[serde(default)]
    pub matrix: MatrixInformation,
    /// Free-text terrain description.
    #[serde(default)]
    pub terrain_feature: Text,
}

impl AvalancheProblem {
    /// Creates a problem of the given type with nothing else filled in.
    #[must_use]
    pub fn new(problem_type: AvalancheProblemType) -> Self {
        Self {
            problem_type: Some(problem_type),
            ..Self::default()
        }
    }

    /// Sets the upper elevation bound, normalized to 100 m steps.
    pub fn set_elevation_high(&mut self, meters: i64) {
        self.elevation_high = Some(normalize_elevation(meters));
        self.treeline_high = false;
    }

    /// Sets the lower elevation bound, normalized to 100 m steps.
    pub fn set_elevation_low(&mut self, meters: i64) {
        self.elevation_low = Some(normalize_elevation(meters));
        self.treeline_low = false;
    }

    /// Returns true if the forecaster has entered anything in this slot.
    #[must_use]
    pub fn is_populated(&self) -> bool {
        self.problem_type.is_some()
            || !self.aspects.is_empty()
            || !self.danger_rating.is_missing()
            || self.matrix != MatrixInformation::default()
    }

    /// Returns true if aspects, type, rating and matrix are all set.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.aspects.is_empty()
            && self.problem_type.is_some()
            && !self.danger_rating.is_missing()
            && self.matrix.is_complete()
    }
}

/// Content of one elevation band for one half of the day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElevationDescription {
    /// Danger rating of the band.
    #[serde(default)]
    pub danger_rating: DangerRating,
    /// Avalanche problem slots 1 to 5.
    #[serde(default)]
    pub avalanche_problems: [Option<AvalancheProblem>; MAX_AVALANCHE_PROBLEMS],
    /// Highlight text.
    #[serde(default)]
    pub highlights: Text,
    /// Comment text.
    #[serde(default)]
    pub comment: Text,
}

impl ElevationDescription {
    /// Returns true if nothing has been entered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Places `problem` into `slot` (0-based), or clears it with `None`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidProblemSlot` if `slot` is out of range.
    pub fn set_problem(
        &mut self,
        slot: usize,
        problem: Option<AvalancheProblem>,
    ) -> Result<(), DomainError> {
        let target: &mut Option<AvalancheProblem> = self
            .avalanche_problems
            .get_mut(slot)
            .ok_or(DomainError::InvalidProblemSlot { slot })?;
        *target = problem;
        Ok(())
    }

    /// Iterates over populated problem slots with their index.
    pub fn populated_problems(&self) -> impl Iterator<Item = (usize, &AvalancheProblem)> {
        self.avalanche_problems
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.as_ref().filter(|p| p.is_populated()).map(|p| (i, p)))
    }

    /// Takes over the danger rating and avalanche problems of `source`.
    ///
    /// Texts are left alone.
    pub fn adopt_ratings_from(&mut self, source: &Self) {
        self.danger_rating = source.danger_rating;
        self.avalanche_problems = source.avalanche_problems.clone();
    }

    /// Raises the band's rating to the highest rated problem, if any.
    pub fn update_danger_rating(&mut self) {
        if let Some(max) = self
            .populated_problems()
            .map(|(_, p)| p.danger_rating)
            .filter(DangerRating::is_level)
            .max()
        {
            self.danger_rating = max;
        }
    }
}

/// Above and below descriptions for one half of the day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaytimeDescription {
    /// Above the elevation threshold, or the whole bulletin if there is no split.
    #[serde(default)]
    pub above: ElevationDescription,
    /// Below the elevation threshold.
    #[serde(default)]
    pub below: ElevationDescription,
}

impl DaytimeDescription {
    /// Returns the description for `band`.
    #[must_use]
    pub const fn band(&self, band: ElevationBand) -> &ElevationDescription {
        match band {
            ElevationBand::Above => &self.above,
            ElevationBand::Below => &self.below,
        }
    }

    /// Returns true if neither band carries content.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.above.is_empty() && self.below.is_empty()
    }
}

/// Validity window of a bulletin: midnight to midnight of the forecast day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validity {
    /// Start of the forecast day (UTC midnight).
    #[serde(with = "time::serde::rfc3339")]
    pub from: OffsetDateTime,
    /// End of the forecast day (next UTC midnight).
    #[serde(with = "time::serde::rfc3339")]
    pub until: OffsetDateTime,
}

impl Validity {
    /// Builds the 24 hour window of `date`.
    ///
    /// # Errors
    ///
    /// Returns an error if the window end overflows the supported range.
    pub fn for_date(date: Date) -> Result<Self, DomainError> {
        let from: OffsetDateTime = date.midnight().assume_utc();
        let until: OffsetDateTime =
            from.checked_add(Duration::DAY)
                .ok_or_else(|| DomainError::DateArithmeticOverflow {
                    operation: format!("computing validity end of {date}"),
                })?;
        Ok(Self { from, until })
    }

    /// Returns the forecast day.
    #[must_use]
    pub const fn date(&self) -> Date {
        self.from.date()
    }
}

/// Author of a bulletin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Display name.
    pub name: String,
    /// Contact address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Author {
    /// Creates an author without contact address.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            email: None,
        }
    }
}

/// The unit of forecast content for one aggregated region on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bulletin {
    /// Server-assigned identifier, absent until the first save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<BulletinId>,
    /// Region code of the authoring authority.
    pub owner_region: RegionCode,
    /// Forecast day window, set on save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validity: Option<Validity>,
    /// Threshold altitude between above and below.
    #[serde(default)]
    pub elevation: Option<u32>,
    /// The treeline is the threshold instead of `elevation`.
    #[serde(default)]
    pub treeline: bool,
    /// Below carries independent content.
    #[serde(default)]
    pub has_elevation_dependency: bool,
    /// Afternoon carries independent content.
    #[serde(default)]
    pub has_daytime_dependency: bool,
    /// Forenoon content, or the whole day without daytime dependency.
    #[serde(default)]
    pub forenoon: DaytimeDescription,
    /// Afternoon content.
    #[serde(default)]
    pub afternoon: DaytimeDescription,
    /// Saved, suggested and published regions.
    #[serde(flatten)]
    pub regions: RegionSets,
    /// Original author.
    #[serde(default)]
    pub author: Option<Author>,
    /// Co-authors and copy provenance.
    #[serde(default)]
    pub additional_authors: Vec<String>,
    /// Workflow status.
    #[serde(default)]
    pub status: BulletinStatus,
    /// Avalanche activity highlights.
    #[serde(default)]
    pub av_activity_highlights: Text,
    /// Avalanche activity comment.
    #[serde(default)]
    pub av_activity_comment: Text,
    /// Snowpack structure highlights.
    #[serde(default)]
    pub snowpack_structure_highlights: Text,
    /// Snowpack structure comment.
    #[serde(default)]
    pub snowpack_structure_comment: Text,
    /// Tendency comment.
    #[serde(default)]
    pub tendency_comment: Text,
}

impl Bulletin {
    /// Starts a new, unsaved draft owned by `owner_region`.
    #[must_use]
    pub fn new(owner_region: RegionCode, author: Author) -> Self {
        Self {
            id: None,
            owner_region,
            validity: None,
            elevation: None,
            treeline: false,
            has_elevation_dependency: false,
            has_daytime_dependency: false,
            forenoon: DaytimeDescription::default(),
            afternoon: DaytimeDescription::default(),
            regions: RegionSets::default(),
            additional_authors: vec![author.name.clone()],
            author: Some(author),
            status: BulletinStatus::Draft,
            av_activity_highlights: Text::default(),
            av_activity_comment: Text::default(),
            snowpack_structure_highlights: Text::default(),
            snowpack_structure_comment: Text::default(),
            tendency_comment: Text::default(),
        }
    }

    /// Returns a content copy for a new author in `owner_region`.
    ///
    /// Identity, validity, every region list and all authorship fields are
    /// reset; forecast content is kept.
    #[must_use]
    pub fn copy_for_new_author(&self, author: Author, owner_region: RegionCode) -> Self {
        Self {
            id: None,
            owner_region,
            validity: None,
            regions: RegionSets::default(),
            additional_authors: vec![author.name.clone()],
            author: Some(author),
            status: BulletinStatus::Draft,
            ..self.clone()
        }
    }

    /// Returns an editable working copy that can later be diffed against `self`.
    #[must_use]
    pub fn clone_shallow(&self) -> Self {
        self.clone()
    }

    /// Returns true if the working copy differs from `original`.
    #[must_use]
    pub fn differs_from(&self, original: &Self) -> bool {
        self != original
    }

    /// Carries this bulletin over to another day for `acting`.
    ///
    /// Only saved or published regions inside the acting region survive,
    /// and they become plain saved regions. Returns `None` if no such region
    /// remains.
    ///
    /// # Errors
    ///
    /// Returns an error if the validity window of `date` cannot be computed.
    pub fn copy_to_day(
        &self,
        author: Author,
        acting: &RegionCode,
        date: Date,
    ) -> Result<Option<Self>, DomainError> {
        let kept: Vec<RegionCode> = self.regions.held_within(acting);
        if kept.is_empty() {
            return Ok(None);
        }

        let mut copy: Self = self.copy_for_new_author(author, acting.clone());
        copy.regions.saved = kept;
        copy.validity = Some(Validity::for_date(date)?);
        Ok(Some(copy))
    }

    /// Returns true if `acting` created this bulletin (owner lies in its prefix).
    #[must_use]
    pub fn is_created_by(&self, acting: &RegionCode) -> bool {
        self.owner_region.is_within(acting)
    }

    /// Returns true if someone suggested a region of `acting` on this bulletin.
    #[must_use]
    pub fn has_suggestions_for(&self, acting: &RegionCode) -> bool {
        self.regions.suggests_within(acting)
    }

    /// Returns the description of one half of the day.
    #[must_use]
    pub const fn daytime(&self, daytime: Daytime) -> &DaytimeDescription {
        match daytime {
            Daytime::Forenoon => &self.forenoon,
            Daytime::Afternoon => &self.afternoon,
        }
    }

    /// Returns the afternoon as it should be displayed.
    ///
    /// Without daytime dependency the afternoon mirrors the forenoon.
    #[must_use]
    pub const fn effective_afternoon(&self) -> &DaytimeDescription {
        if self.has_daytime_dependency {
            &self.afternoon
        } else {
            &self.forenoon
        }
    }

    /// Returns the below band of `daytime` as it should be displayed.
    ///
    /// Without elevation dependency below mirrors above.
    #[must_use]
    pub const fn effective_below(&self, daytime: Daytime) -> &ElevationDescription {
        let half: &DaytimeDescription = match daytime {
            Daytime::Forenoon => &self.forenoon,
            Daytime::Afternoon => self.effective_afternoon(),
        };
        if self.has_elevation_dependency {
            &half.below
        } else {
            &half.above
        }
    }

    /// Iterates over the independently edited descriptions.
    ///
    /// Forenoon above is always included; below and afternoon only when
    /// the matching dependency flag is set.
    pub fn edited_descriptions(
        &self,
    ) -> impl Iterator<Item = (Daytime, ElevationBand, &ElevationDescription)> {
        let mut out: Vec<(Daytime, ElevationBand, &ElevationDescription)> =
            vec![(Daytime::Forenoon, ElevationBand::Above, &self.forenoon.above)];
        if self.has_elevation_dependency {
            out.push((Daytime::Forenoon, ElevationBand::Below, &self.forenoon.below));
        }
        if self.has_daytime_dependency {
            out.push((Daytime::Afternoon, ElevationBand::Above, &self.afternoon.above));
            if self.has_elevation_dependency {
                out.push((Daytime::Afternoon, ElevationBand::Below, &self.afternoon.below));
            }
        }
        out.into_iter()
    }

    /// Highest danger rating across all independently edited descriptions.
    #[must_use]
    pub fn highest_danger_rating(&self) -> DangerRating {
        self.edited_descriptions()
            .map(|(_, _, d)| d.danger_rating)
            .max()
            .unwrap_or_default()
    }

    /// Bulletin texts that are subject to translation checks.
    #[must_use]
    pub fn texts(&self) -> [&Text; 5] {
        [
            &self.av_activity_highlights,
            &self.av_activity_comment,
            &self.snowpack_structure_highlights,
            &self.snowpack_structure_comment,
            &self.tendency_comment,
        ]
    }
}
