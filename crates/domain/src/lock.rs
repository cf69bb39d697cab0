// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Advisory lock events.
//!
//! Locks are facts broadcast between forecasters while they edit. They are
//! never persisted and never enforced by the server.

use crate::bulletin::BulletinId;
use crate::dates::iso_date;
use crate::error::DomainError;
use crate::region::RegionCode;
use serde::{Deserialize, Serialize};
use time::Date;

/// A region is being drawn for a day, or no longer is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionLock {
    pub region: RegionCode,
    #[serde(with = "iso_date")]
    pub date: Date,
    pub username: String,
    /// `true` to lock, `false` to unlock.
    pub lock: bool,
}

/// A bulletin is being edited, or no longer is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulletinLock {
    pub bulletin: BulletinId,
    #[serde(with = "iso_date")]
    pub date: Date,
    pub username: String,
    /// `true` to lock, `false` to unlock.
    pub lock: bool,
}

macro_rules! lock_codec {
    ($ty:ty) => {
        impl $ty {
            /// Encodes the event as a JSON message.
            ///
            /// # Errors
            ///
            /// Returns `DomainError::LockEncoding` if serialization fails.
            pub fn to_json(&self) -> Result<String, DomainError> {
                serde_json::to_string(self).map_err(|e| DomainError::LockEncoding(e.to_string()))
            }

            /// Decodes an event from a JSON message.
            ///
            /// # Errors
            ///
            /// Returns `DomainError::LockEncoding` if the message is malformed.
            pub fn from_json(message: &str) -> Result<Self, DomainError> {
                serde_json::from_str(message).map_err(|e| DomainError::LockEncoding(e.to_string()))
            }

            /// Returns the same event with the lock flag inverted to an unlock.
            #[must_use]
            pub fn released(&self) -> Self {
                Self {
                    lock: false,
                    ..self.clone()
                }
            }
        }
    };
}

lock_codec!(RegionLock);
lock_codec!(BulletinLock);
