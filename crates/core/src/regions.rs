// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Save-time region reconciliation across the bulletins of a day.

use crate::error::CoreError;
use albina_domain::{Bulletin, RegionCode, RegionSets};

/// Applies a map selection to one bulletin of the day.
///
/// The bulletin's region lists are rebuilt from `selected` for the acting
/// region. Every micro-region that becomes saved on the bulletin is
/// released from the other bulletins created by the acting region, so a
/// micro-region is never held twice after the pass.
///
/// # Arguments
///
/// * `bulletins` - All bulletins of the day
/// * `target` - Index of the bulletin the selection belongs to
/// * `acting` - The region of the forecaster performing the save
/// * `selected` - The regions currently selected on the map
///
/// # Returns
///
/// The updated bulletins, in the same order.
///
/// # Errors
///
/// Returns `CoreError::NoRegionSelected` if the acting region created the
/// bulletin and the selection contains none of its own regions. Returns
/// `CoreError::UnknownBulletinIndex` if `target` is out of range.
pub fn reconcile_selection(
    bulletins: &[Bulletin],
    target: usize,
    acting: &RegionCode,
    selected: &[RegionCode],
) -> Result<Vec<Bulletin>, CoreError> {
    let current: &Bulletin = bulletins
        .get(target)
        .ok_or(CoreError::UnknownBulletinIndex { index: target })?;

    let owns_selection: bool = selected.iter().any(|r| r.is_within(acting));
    if current.is_created_by(acting) && !owns_selection {
        return Err(CoreError::NoRegionSelected {
            bulletin: current.id.clone(),
        });
    }

    let reconciled: RegionSets = current
        .regions
        .reconcile(acting, &current.owner_region, selected);
    let claimed: Vec<RegionCode> = reconciled.held_within(acting);

    Ok(bulletins
        .iter()
        .enumerate()
        .map(|(index, bulletin)| {
            let mut next: Bulletin = bulletin.clone();
            if index == target {
                next.regions = reconciled.clone();
            } else if next.is_created_by(acting) {
                next.regions.release(&claimed);
            }
            next
        })
        .collect())
}
