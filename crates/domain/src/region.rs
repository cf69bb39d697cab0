// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Region codes and per-bulletin region membership.
//!
//! Regions form a hierarchy purely through their codes: region `AT-07`
//! owns `AT-07-14` because the latter starts with the former. There is no
//! explicit tree anywhere in the system.
//!
//! ## Invariants
//!
//! - A bulletin's saved, suggested and published lists never share a code
//! - A region is only ever suggested on a bulletin whose owner does not
//!   already own that region

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A hierarchical region code such as `AT-07` or `IT-32-BZ-01`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RegionCode(String);

impl RegionCode {
    /// Creates a region code after validating its characters.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidRegionCode` if the code is empty or
    /// contains characters other than ASCII alphanumerics, `-` and `_`.
    pub fn new(code: &str) -> Result<Self, DomainError> {
        let trimmed: &str = code.trim();
        if trimmed.is_empty()
            || !trimmed
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(DomainError::InvalidRegionCode(code.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the raw code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if `other` lies inside this region's prefix.
    ///
    /// A region owns itself.
    #[must_use]
    pub fn owns(&self, other: &Self) -> bool {
        other.0.starts_with(&self.0)
    }

    /// Returns true if this region lies inside `owner`'s prefix.
    #[must_use]
    pub fn is_within(&self, owner: &Self) -> bool {
        owner.owns(self)
    }
}

impl std::fmt::Display for RegionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RegionCode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for RegionCode {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<RegionCode> for String {
    fn from(value: RegionCode) -> Self {
        value.0
    }
}

/// The three region membership lists carried by every bulletin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSets {
    /// Regions committed by the owning authority.
    #[serde(rename = "savedRegions", default)]
    pub saved: Vec<RegionCode>,
    /// Regions proposed by a neighbouring authority, not yet accepted.
    #[serde(rename = "suggestedRegions", default)]
    pub suggested: Vec<RegionCode>,
    /// Regions that went through a publication cycle.
    #[serde(rename = "publishedRegions", default)]
    pub published: Vec<RegionCode>,
}

impl RegionSets {
    /// Returns true if no list contains any region.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.saved.is_empty() && self.suggested.is_empty() && self.published.is_empty()
    }

    /// Iterates over saved and published regions.
    pub fn saved_or_published(&self) -> impl Iterator<Item = &RegionCode> {
        self.saved.iter().chain(self.published.iter())
    }

    /// Returns true if `region` is saved or published.
    #[must_use]
    pub fn holds(&self, region: &RegionCode) -> bool {
        self.saved.contains(region) || self.published.contains(region)
    }

    /// Returns true if `region` appears in any of the three lists.
    #[must_use]
    pub fn mentions(&self, region: &RegionCode) -> bool {
        self.holds(region) || self.suggested.contains(region)
    }

    /// Returns true if any saved or published region lies in `area`.
    #[must_use]
    pub fn holds_within(&self, area: &RegionCode) -> bool {
        self.saved_or_published().any(|r| r.is_within(area))
    }

    /// Returns true if any suggestion targets `area`.
    #[must_use]
    pub fn suggests_within(&self, area: &RegionCode) -> bool {
        self.suggested.iter().any(|r| r.is_within(area))
    }

    /// Saved and published regions that lie in `area`.
    #[must_use]
    pub fn held_within(&self, area: &RegionCode) -> Vec<RegionCode> {
        self.saved_or_published()
            .filter(|r| r.is_within(area))
            .cloned()
            .collect()
    }

    /// Rebuilds the lists from a fresh map selection.
    ///
    /// The acting region's previous saved and published regions are dropped
    /// and rebuilt from `selected`. Previous suggestions outside the acting
    /// region are dropped and rebuilt the same way. Suggestions made to the
    /// acting region by others survive untouched.
    ///
    /// # Arguments
    ///
    /// * `acting` - The region of the forecaster performing the save
    /// * `owner` - The owner region of the bulletin being saved
    /// * `selected` - The regions currently selected for the bulletin
    #[must_use]
    pub fn reconcile(
        &self,
        acting: &RegionCode,
        owner: &RegionCode,
        selected: &[RegionCode],
    ) -> Self {
        let mut next: Self = Self {
            saved: self
                .saved
                .iter()
                .filter(|r| !r.is_within(acting))
                .cloned()
                .collect(),
            suggested: self
                .suggested
                .iter()
                .filter(|r| r.is_within(acting))
                .cloned()
                .collect(),
            published: self
                .published
                .iter()
                .filter(|r| !r.is_within(acting))
                .cloned()
                .collect(),
        };

        for region in selected {
            if region.is_within(acting) {
                if !next.saved.contains(region) {
                    next.saved.push(region.clone());
                }
                // An accepted suggestion stops being a suggestion.
                next.suggested.retain(|r| r != region);
            } else if !region.is_within(owner) && !next.mentions(region) {
                next.suggested.push(region.clone());
            }
        }

        next
    }

    /// Removes `regions` from the saved and published lists.
    pub fn release(&mut self, regions: &[RegionCode]) {
        self.saved.retain(|r| !regions.contains(r));
        self.published.retain(|r| !regions.contains(r));
    }

    /// Moves every saved region into the published list.
    pub fn mark_published(&mut self) {
        for region in std::mem::take(&mut self.saved) {
            if !self.published.contains(&region) {
                self.published.push(region);
            }
        }
    }

    /// Moves the saved regions inside `area` into the published list.
    ///
    /// Returns true if anything moved.
    pub fn mark_published_within(&mut self, area: &RegionCode) -> bool {
        let (moving, staying): (Vec<RegionCode>, Vec<RegionCode>) =
            std::mem::take(&mut self.saved)
                .into_iter()
                .partition(|r| r.is_within(area));
        self.saved = staying;
        let moved: bool = !moving.is_empty();
        for region in moving {
            if !self.published.contains(&region) {
                self.published.push(region);
            }
        }
        moved
    }
}
