//! Optional inclusive time windows on periods.
//!
//! A period carries three independent windows: visibility (reads),
//! signup (slot-level register/unregister), and modify (per-occurrence
//! drop/pick-up). An unconfigured window places no restriction on its
//! operation class.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

/// An optional `[opens, closes]` window, inclusive on both ends.
///
/// A `None` endpoint is unbounded on that side.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Window {
    pub opens: Option<Timestamp>,
    pub closes: Option<Timestamp>,
}

impl Window {
    pub fn new(opens: Option<Timestamp>, closes: Option<Timestamp>) -> Self {
        Self { opens, closes }
    }

    /// Whether `now` lies within the window.
    pub fn contains(&self, now: Timestamp) -> bool {
        if let Some(opens) = self.opens {
            if now < opens {
                return false;
            }
        }
        if let Some(closes) = self.closes {
            if now > closes {
                return false;
            }
        }
        true
    }

    /// Validate that a fully-configured pair is not inverted.
    ///
    /// `label` names the window in the error message (e.g. `"signup"`).
    pub fn validate(&self, label: &str) -> Result<(), CoreError> {
        if let (Some(opens), Some(closes)) = (self.opens, self.closes) {
            if opens >= closes {
                return Err(CoreError::Validation(format!(
                    "{label} window start must precede its end"
                )));
            }
        }
        Ok(())
    }
}
