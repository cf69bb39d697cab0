// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Elevation and daytime propagation.
//!
//! The dependency flags drive one-way duplication of content from a source
//! half into its dependent half:
//!
//! - elevation: `above` -> `below`, for the forenoon and, when the day is
//!   split, for the afternoon
//! - daytime: `forenoon` -> `afternoon`
//!
//! Enabling a flag re-derives the dependent half from its source. Disabling
//! a flag clears the dependent half; its previous content is never restored.
//! Elevation is always resolved before daytime.

use crate::command::{BulletinEdit, TextField};
use crate::error::CoreError;
use albina_domain::{
    Bulletin, DaytimeDescription, Daytime, ElevationBand, ElevationDescription, Text,
    normalize_elevation,
};

/// What the caller should do with the afternoon view after an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfternoonView {
    /// The day was not split before; show the afternoon view.
    Show,
    /// No bulletin of the day needs the afternoon view anymore.
    Hide,
    /// Leave the view as it is.
    Unchanged,
}

/// Result of applying a [`BulletinEdit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    /// The edited bulletin.
    pub bulletin: Bulletin,
    /// Hint for the afternoon view of the day.
    pub afternoon_view: AfternoonView,
}

/// Applies an edit to a bulletin, producing a new bulletin.
///
/// # Arguments
///
/// * `bulletin` - The bulletin being edited (left untouched)
/// * `edit` - The edit to apply
/// * `others` - The other bulletins of the day, used to decide the afternoon view
///
/// # Errors
///
/// Returns an error if:
/// - A mirrored half is edited while its dependency flag is off
/// - The avalanche problem slot is out of range
pub fn apply_edit(
    bulletin: &Bulletin,
    edit: BulletinEdit,
    others: &[Bulletin],
) -> Result<EditOutcome, CoreError> {
    let mut next: Bulletin = bulletin.clone();
    let mut afternoon_view: AfternoonView = AfternoonView::Unchanged;

    match edit {
        BulletinEdit::SetElevationDependency(enabled) => {
            set_elevation_dependency(&mut next, enabled);
        }
        BulletinEdit::SetDaytimeDependency(enabled) => {
            let day_already_split: bool = others
                .iter()
                .filter(|b| b.id.is_none() || b.id != bulletin.id)
                .any(|b| b.has_daytime_dependency);
            set_daytime_dependency(&mut next, enabled);
            if !day_already_split {
                afternoon_view = if enabled {
                    AfternoonView::Show
                } else {
                    AfternoonView::Hide
                };
            }
        }
        BulletinEdit::SetElevation(meters) => {
            next.elevation = meters.map(normalize_elevation);
            if next.elevation.is_some() {
                next.treeline = false;
            }
        }
        BulletinEdit::SetTreeline(treeline) => {
            next.treeline = treeline;
            if treeline {
                next.elevation = None;
            }
        }
        BulletinEdit::SetDangerRating {
            daytime,
            band,
            rating,
        } => {
            description_mut(&mut next, daytime, band)?.danger_rating = rating;
        }
        BulletinEdit::SetAvalancheProblem {
            daytime,
            band,
            slot,
            problem,
        } => {
            let description: &mut ElevationDescription = description_mut(&mut next, daytime, band)?;
            description.set_problem(slot, problem)?;
            description.update_danger_rating();
        }
        BulletinEdit::SetText {
            field,
            language,
            value,
        } => {
            text_mut(&mut next, field).set(language, &value);
        }
        BulletinEdit::MergeText { field, text } => {
            let target: &mut Text = text_mut(&mut next, field);
            *target = target.merge(&text);
        }
    }

    Ok(EditOutcome {
        bulletin: next,
        afternoon_view,
    })
}

/// Applies the default fill-in of both dependency flags, elevation first.
///
/// Used on every save. A dependent half whose flag is on and that is still
/// empty is filled from its source; a dependent half whose flag is off is
/// cleared.
#[must_use]
pub fn resolve_dependencies(bulletin: &Bulletin) -> Bulletin {
    let mut next: Bulletin = bulletin.clone();

    if next.has_elevation_dependency {
        if next.forenoon.below.is_empty() {
            let source: ElevationDescription = next.forenoon.above.clone();
            next.forenoon.below.adopt_ratings_from(&source);
        }
        if next.has_daytime_dependency && next.afternoon.below.is_empty() {
            let source: ElevationDescription = next.afternoon.above.clone();
            next.afternoon.below.adopt_ratings_from(&source);
        }
    } else {
        next.forenoon.below = ElevationDescription::default();
        next.afternoon.below = ElevationDescription::default();
    }

    if next.has_daytime_dependency {
        if next.afternoon.is_empty() {
            next.afternoon = next.forenoon.clone();
        }
    } else {
        next.afternoon = DaytimeDescription::default();
    }

    next
}

fn set_elevation_dependency(bulletin: &mut Bulletin, enabled: bool) {
    bulletin.has_elevation_dependency = enabled;
    if enabled {
        let forenoon_above: ElevationDescription = bulletin.forenoon.above.clone();
        bulletin.forenoon.below = ElevationDescription::default();
        bulletin.forenoon.below.adopt_ratings_from(&forenoon_above);
        if bulletin.has_daytime_dependency {
            let afternoon_above: ElevationDescription = bulletin.afternoon.above.clone();
            bulletin.afternoon.below = ElevationDescription::default();
            bulletin.afternoon.below.adopt_ratings_from(&afternoon_above);
        }
    } else {
        bulletin.forenoon.below = ElevationDescription::default();
        bulletin.afternoon.below = ElevationDescription::default();
    }
}

fn set_daytime_dependency(bulletin: &mut Bulletin, enabled: bool) {
    bulletin.has_daytime_dependency = enabled;
    if enabled {
        bulletin.afternoon.above = bulletin.forenoon.above.clone();
        bulletin.afternoon.below = if bulletin.has_elevation_dependency {
            bulletin.forenoon.below.clone()
        } else {
            ElevationDescription::default()
        };
    } else {
        bulletin.afternoon = DaytimeDescription::default();
    }
}

fn description_mut(
    bulletin: &mut Bulletin,
    daytime: Daytime,
    band: ElevationBand,
) -> Result<&mut ElevationDescription, CoreError> {
    let half: &'static str = match (daytime, band) {
        (Daytime::Forenoon, ElevationBand::Above) => "forenoon above",
        (Daytime::Forenoon, ElevationBand::Below) => "forenoon below",
        (Daytime::Afternoon, ElevationBand::Above) => "afternoon above",
        (Daytime::Afternoon, ElevationBand::Below) => "afternoon below",
    };
    if (band == ElevationBand::Below && !bulletin.has_elevation_dependency)
        || (daytime == Daytime::Afternoon && !bulletin.has_daytime_dependency)
    {
        return Err(CoreError::DependentHalfNotEditable { half });
    }

    let description: &mut DaytimeDescription = match daytime {
        Daytime::Forenoon => &mut bulletin.forenoon,
        Daytime::Afternoon => &mut bulletin.afternoon,
    };
    Ok(match band {
        ElevationBand::Above => &mut description.above,
        ElevationBand::Below => &mut description.below,
    })
}

const fn text_mut(bulletin: &mut Bulletin, field: TextField) -> &mut Text {
    match field {
        TextField::AvActivityHighlights => &mut bulletin.av_activity_highlights,
        TextField::AvActivityComment => &mut bulletin.av_activity_comment,
        TextField::SnowpackStructureHighlights => &mut bulletin.snowpack_structure_highlights,
        TextField::SnowpackStructureComment => &mut bulletin.snowpack_structure_comment,
        TextField::TendencyComment => &mut bulletin.tendency_comment,
    }
}
