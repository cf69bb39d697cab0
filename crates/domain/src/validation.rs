// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Bulletin and day validation.
//!
//! Two layers exist: the avalanche-problem completeness check that guards
//! every submit, and the day check that lists everything a forecaster
//! should look at before publishing.

use crate::bulletin::{Bulletin, Daytime};
use crate::error::DomainError;
use crate::region::RegionCode;
use crate::text::LanguageCode;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Counts populated avalanche problems that are not complete.
///
/// Every independently edited description is inspected, so below and
/// afternoon only count when the matching dependency is on.
#[must_use]
pub fn count_incomplete_avalanche_problems(bulletin: &Bulletin) -> usize {
    bulletin
        .edited_descriptions()
        .flat_map(|(_, _, description)| description.populated_problems())
        .filter(|(_, problem)| !problem.is_complete())
        .count()
}

/// Checks avalanche problem completeness across a set of bulletins.
///
/// A populated problem needs at least one aspect, a problem type, a danger
/// rating and complete matrix information.
///
/// # Errors
///
/// Returns `DomainError::IncompleteAvalancheProblems` with the total number
/// of incomplete problems if any were found.
pub fn check_avalanche_problems<'a, I>(bulletins: I) -> Result<(), DomainError>
where
    I: IntoIterator<Item = &'a Bulletin>,
{
    let count: usize = bulletins
        .into_iter()
        .map(count_incomplete_avalanche_problems)
        .sum();
    if count > 0 {
        return Err(DomainError::IncompleteAvalancheProblems { count });
    }
    Ok(())
}

/// Finds micro-regions held by more than one bulletin of `acting`.
///
/// Only bulletins created by the acting region are considered. A region
/// counts as held when it is saved or published.
///
/// # Returns
///
/// The duplicated regions, sorted and without repetition.
#[must_use]
pub fn find_duplicate_regions(bulletins: &[Bulletin], acting: &RegionCode) -> Vec<RegionCode> {
    let mut seen: BTreeMap<&RegionCode, usize> = BTreeMap::new();
    for bulletin in bulletins.iter().filter(|b| b.is_created_by(acting)) {
        let held: BTreeSet<&RegionCode> = bulletin.regions.saved_or_published().collect();
        for region in held {
            *seen.entry(region).or_insert(0) += 1;
        }
    }

    seen.into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(region, _)| region.clone())
        .collect()
}

/// Findings of the day check, in their wire form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CheckCode {
    /// Some edited description has no danger rating.
    MissingDangerRating,
    /// Some bulletin of the region holds no region of its own area.
    MissingRegion,
    /// A micro-region is held by more than one bulletin.
    DuplicateRegion,
    /// Avalanche activity highlights are empty.
    MissingAvActivityHighlights,
    /// Avalanche activity comment is empty.
    MissingAvActivityComment,
    /// Snowpack structure highlights are empty.
    MissingSnowpackStructureHighlights,
    /// Snowpack structure comment is empty.
    MissingSnowpackStructureComment,
    /// Someone suggested a region of the acting region that nobody accepted yet.
    PendingSuggestions,
    /// A text is present in some but not all configured languages.
    IncompleteTranslation,
}

impl CheckCode {
    /// Returns the wire name of the code.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MissingDangerRating => "missingDangerRating",
            Self::MissingRegion => "missingRegion",
            Self::DuplicateRegion => "duplicateRegion",
            Self::MissingAvActivityHighlights => "missingAvActivityHighlights",
            Self::MissingAvActivityComment => "missingAvActivityComment",
            Self::MissingSnowpackStructureHighlights => "missingSnowpackStructureHighlights",
            Self::MissingSnowpackStructureComment => "missingSnowpackStructureComment",
            Self::PendingSuggestions => "pendingSuggestions",
            Self::IncompleteTranslation => "incompleteTranslation",
        }
    }

    /// Returns true if the finding blocks submission.
    #[must_use]
    pub const fn blocks_submission(&self) -> bool {
        matches!(self, Self::DuplicateRegion)
    }
}

/// Runs the day check for `region` over all bulletins of the day.
///
/// # Arguments
///
/// * `bulletins` - Every bulletin of the day, own and foreign
/// * `region` - The region whose contribution is checked
/// * `languages` - The languages every text must be translated into
///
/// # Returns
///
/// The findings, sorted and without repetition. An empty list means the
/// day is ready to be published.
#[must_use]
pub fn check_day(
    bulletins: &[Bulletin],
    region: &RegionCode,
    languages: &[LanguageCode],
) -> Vec<CheckCode> {
    let mut codes: BTreeSet<CheckCode> = BTreeSet::new();

    let own: Vec<&Bulletin> = bulletins
        .iter()
        .filter(|b| b.is_created_by(region) || b.regions.holds_within(region))
        .collect();

    for bulletin in &own {
        let rating_missing: bool = bulletin.forenoon.above.danger_rating.is_missing()
            || bulletin.effective_below(Daytime::Forenoon).danger_rating.is_missing()
            || bulletin.effective_afternoon().above.danger_rating.is_missing()
            || bulletin.effective_below(Daytime::Afternoon).danger_rating.is_missing();
        if rating_missing {
            codes.insert(CheckCode::MissingDangerRating);
        }

        if !bulletin.regions.holds_within(region) {
            codes.insert(CheckCode::MissingRegion);
        }

        let required = [
            (&bulletin.av_activity_highlights, CheckCode::MissingAvActivityHighlights),
            (&bulletin.av_activity_comment, CheckCode::MissingAvActivityComment),
            (
                &bulletin.snowpack_structure_highlights,
                CheckCode::MissingSnowpackStructureHighlights,
            ),
            (
                &bulletin.snowpack_structure_comment,
                CheckCode::MissingSnowpackStructureComment,
            ),
        ];
        for (text, code) in required {
            if text.is_empty() {
                codes.insert(code);
            }
        }

        if bulletin
            .texts()
            .iter()
            .any(|t| t.is_partially_translated(languages))
        {
            codes.insert(CheckCode::IncompleteTranslation);
        }
    }

    if !find_duplicate_regions(bulletins, region).is_empty() {
        codes.insert(CheckCode::DuplicateRegion);
    }

    if bulletins.iter().any(|b| b.has_suggestions_for(region)) {
        codes.insert(CheckCode::PendingSuggestions);
    }

    codes.into_iter().collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::bulletin::{Author, AvalancheProblem};
    use crate::danger::{AvalancheProblemType, DangerRating};
    use crate::text::Text;

    fn code(value: &str) -> RegionCode {
        RegionCode::new(value).unwrap()
    }

    fn finished_bulletin(owner: &str, regions: &[&str]) -> Bulletin {
        let mut bulletin: Bulletin = Bulletin::new(code(owner), Author::new("Alice"));
        bulletin.regions.saved = regions.iter().map(|r| code(r)).collect();
        bulletin.forenoon.above.danger_rating = DangerRating::Moderate;
        let text: Text = Text::new().with(LanguageCode::De, "Text");
        bulletin.av_activity_highlights = text.clone();
        bulletin.av_activity_comment = text.clone();
        bulletin.snowpack_structure_highlights = text.clone();
        bulletin.snowpack_structure_comment = text;
        bulletin
    }

    #[test]
    fn test_incomplete_problem_in_hidden_half_is_ignored() {
        let mut bulletin: Bulletin = finished_bulletin("AT-07", &["AT-07-01"]);
        bulletin.forenoon.below.avalanche_problems[0] =
            Some(AvalancheProblem::new(AvalancheProblemType::WetSnow));

        assert_eq!(count_incomplete_avalanche_problems(&bulletin), 0);

        bulletin.has_elevation_dependency = true;
        assert_eq!(count_incomplete_avalanche_problems(&bulletin), 1);
        assert_eq!(
            check_avalanche_problems([&bulletin]),
            Err(DomainError::IncompleteAvalancheProblems { count: 1 })
        );
    }

    #[test]
    fn test_duplicate_regions_only_counts_own_bulletins() {
        let first: Bulletin = finished_bulletin("AT-07", &["AT-07-01", "AT-07-02"]);
        let second: Bulletin = finished_bulletin("AT-07", &["AT-07-02"]);
        let foreign: Bulletin = finished_bulletin("IT-32-BZ", &["AT-07-01"]);

        let duplicates: Vec<RegionCode> =
            find_duplicate_regions(&[first, second, foreign], &code("AT-07"));

        assert_eq!(duplicates, vec![code("AT-07-02")]);
    }

    #[test]
    fn test_region_saved_and_published_in_same_bulletin_is_not_a_duplicate() {
        let mut bulletin: Bulletin = finished_bulletin("AT-07", &["AT-07-01"]);
        bulletin.regions.published.push(code("AT-07-01"));
        assert!(find_duplicate_regions(&[bulletin], &code("AT-07")).is_empty());
    }

    #[test]
    fn test_check_day_reports_duplicate_region_only() {
        let first: Bulletin = finished_bulletin("AT-07", &["AT-07-A"]);
        let second: Bulletin = finished_bulletin("AT-07", &["AT-07-A", "AT-07-B"]);

        let codes: Vec<CheckCode> =
            check_day(&[first, second], &code("AT-07"), &[LanguageCode::De]);

        assert_eq!(codes, vec![CheckCode::DuplicateRegion]);
        assert!(codes.iter().any(CheckCode::blocks_submission));
    }

    #[test]
    fn test_check_day_lists_missing_content() {
        let mut bulletin: Bulletin = Bulletin::new(code("AT-07"), Author::new("Alice"));
        bulletin
            .tendency_comment
            .set(LanguageCode::De, "Leichter Rückgang");

        let codes: Vec<CheckCode> = check_day(
            &[bulletin],
            &code("AT-07"),
            &[LanguageCode::De, LanguageCode::En],
        );

        assert_eq!(
            codes,
            vec![
                CheckCode::MissingDangerRating,
                CheckCode::MissingRegion,
                CheckCode::MissingAvActivityHighlights,
                CheckCode::MissingAvActivityComment,
                CheckCode::MissingSnowpackStructureHighlights,
                CheckCode::MissingSnowpackStructureComment,
                CheckCode::IncompleteTranslation,
            ]
        );
    }

    #[test]
    fn test_check_day_reports_pending_suggestions_from_neighbours() {
        let own: Bulletin = finished_bulletin("AT-07", &["AT-07-01"]);
        let mut neighbour: Bulletin = finished_bulletin("IT-32-BZ", &["IT-32-BZ-01"]);
        neighbour.regions.suggested.push(code("AT-07-02"));

        let codes: Vec<CheckCode> = check_day(&[own, neighbour], &code("AT-07"), &[LanguageCode::De]);

        assert_eq!(codes, vec![CheckCode::PendingSuggestions]);
    }

    #[test]
    fn test_check_code_wire_names() {
        let json: String = serde_json::to_string(&CheckCode::DuplicateRegion).unwrap();
        assert_eq!(json, format!("\"{}\"", CheckCode::DuplicateRegion.as_str()));
    }
}
