// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod apply;
mod command;
mod error;
mod locks;
mod merge;
mod propagation;
mod regions;
mod state;

#[cfg(test)]
mod tests;

// Re-export public types and functions
pub use apply::{apply, apply_publish_all};
pub use command::{BulletinEdit, Command, TextField};
pub use error::CoreError;
pub use locks::{BulletinHolder, LockRegistry};
pub use merge::{ActiveBulletin, WorkingSet};
pub use propagation::{AfternoonView, EditOutcome, apply_edit, resolve_dependencies};
pub use regions::reconcile_selection;
pub use state::{DayState, TransitionResult};
