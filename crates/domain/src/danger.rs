// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Danger ratings and the inputs of the danger rating matrix.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Avalanche danger rating of an elevation band or avalanche problem.
///
/// Ordering follows severity; `Missing`, `NoSnow` and `NoRating` sort
/// below every real rating.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DangerRating {
    /// Not yet rated.
    #[default]
    Missing,
    /// No snow on the ground.
    NoSnow,
    /// Explicitly not rated.
    NoRating,
    /// Level 1.
    Low,
    /// Level 2.
    Moderate,
    /// Level 3.
    Considerable,
    /// Level 4.
    High,
    /// Level 5.
    VeryHigh,
}

impl DangerRating {
    /// Returns the string representation of the rating.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::NoSnow => "no_snow",
            Self::NoRating => "no_rating",
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::Considerable => "considerable",
            Self::High => "high",
            Self::VeryHigh => "very_high",
        }
    }

    fn parse_str(s: &str) -> Result<Self, DomainError> {
        match s {
            "missing" => Ok(Self::Missing),
            "no_snow" => Ok(Self::NoSnow),
            "no_rating" => Ok(Self::NoRating),
            "low" => Ok(Self::Low),
            "moderate" => Ok(Self::Moderate),
            "considerable" => Ok(Self::Considerable),
            "high" => Ok(Self::High),
            "very_high" => Ok(Self::VeryHigh),
            _ => Err(DomainError::UnknownValue {
                kind: "danger rating",
                value: s.to_string(),
            }),
        }
    }

    /// Returns true if the rating has not been set.
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Returns true for the five numbered levels.
    #[must_use]
    pub const fn is_level(&self) -> bool {
        matches!(
            self,
            Self::Low | Self::Moderate | Self::Considerable | Self::High | Self::VeryHigh
        )
    }
}

impl FromStr for DangerRating {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

/// Slope aspect.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Aspect {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl Aspect {
    /// All aspects clockwise from north.
    pub const ALL: [Self; 8] = [
        Self::N,
        Self::NE,
        Self::E,
        Self::SE,
        Self::S,
        Self::SW,
        Self::W,
        Self::NW,
    ];

    /// Returns the compass abbreviation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::N => "N",
            Self::NE => "NE",
            Self::E => "E",
            Self::SE => "SE",
            Self::S => "S",
            Self::SW => "SW",
            Self::W => "W",
            Self::NW => "NW",
        }
    }
}

impl FromStr for Aspect {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::UnknownValue {
                kind: "aspect",
                value: s.to_string(),
            })
    }
}

/// Typical avalanche problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvalancheProblemType {
    NewSnow,
    WindSlab,
    PersistentWeakLayers,
    WetSnow,
    GlidingSnow,
    Cornices,
    NoDistinctAvalancheProblem,
    FavourableSituation,
}

impl AvalancheProblemType {
    /// Returns the string representation of the problem type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NewSnow => "new_snow",
            Self::WindSlab => "wind_slab",
            Self::PersistentWeakLayers => "persistent_weak_layers",
            Self::WetSnow => "wet_snow",
            Self::GlidingSnow => "gliding_snow",
            Self::Cornices => "cornices",
            Self::NoDistinctAvalancheProblem => "no_distinct_avalanche_problem",
            Self::FavourableSituation => "favourable_situation",
        }
    }
}

impl FromStr for AvalancheProblemType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new_snow" => Ok(Self::NewSnow),
            "wind_slab" => Ok(Self::WindSlab),
            "persistent_weak_layers" => Ok(Self::PersistentWeakLayers),
            "wet_snow" => Ok(Self::WetSnow),
            "gliding_snow" => Ok(Self::GlidingSnow),
            "cornices" => Ok(Self::Cornices),
            "no_distinct_avalanche_problem" => Ok(Self::NoDistinctAvalancheProblem),
            "favourable_situation" => Ok(Self::FavourableSituation),
            _ => Err(DomainError::UnknownValue {
                kind: "avalanche problem type",
                value: s.to_string(),
            }),
        }
    }
}

/// Snowpack stability class of the danger rating matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnowpackStability {
    Good,
    Fair,
    Poor,
    VeryPoor,
}

/// Frequency class of the danger rating matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    None,
    Few,
    Some,
    Many,
}

/// Avalanche size class of the danger rating matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvalancheSize {
    Small,
    Medium,
    Large,
    VeryLarge,
    Extreme,
}

/// Structured inputs that determine the displayed danger rating of a problem.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixInformation {
    /// Snowpack stability.
    #[serde(default)]
    pub snowpack_stability: Option<SnowpackStability>,
    /// Frequency of the stability class.
    #[serde(default)]
    pub frequency: Option<Frequency>,
    /// Expected avalanche size.
    #[serde(default)]
    pub avalanche_size: Option<AvalancheSize>,
}

impl MatrixInformation {
    /// Returns true if stability, frequency and size are all set.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.snowpack_stability.is_some() && self.frequency.is_some() && self.avalanche_size.is_some()
    }
}
