//! Pure rules engines: calendar points, redemption classification, award budgets.

pub mod calendar;
pub mod currency;
pub mod ledger;
pub mod redemption;

use serde::{Deserialize, Serialize};

/// Human-readable verdict shown to staff or students after an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
}

impl ActionResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}
