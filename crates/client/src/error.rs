// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Client errors.

use albina::CoreError;
use albina_domain::{BulletinStatus, DomainError, RegionCode};
use thiserror::Error;
use time::Date;

/// Errors of the forecaster-side runtime.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server could not be reached or the connection broke.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with an error status.
    #[error("server returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message of the server's error body.
        message: String,
    },

    /// Another operation of the same kind is still in flight.
    #[error("{0} already in progress")]
    Busy(&'static str),

    /// Local validation rejected the request before it was sent.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The bulletins of the day conflict with each other.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The day can no longer be changed.
    #[error("bulletins of {region} for {date} are {status} and cannot be changed")]
    WriteDisabled {
        /// The acting region.
        region: RegionCode,
        /// The forecast day.
        date: Date,
        /// The day's status.
        status: BulletinStatus,
    },

    /// A workflow rule rejected the operation.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A domain value was invalid.
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
