use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::debug;

use super::state::SchoolState;
use crate::rewards::redemption::{classify_code, FulfillmentStatus, RedemptionOutcome};
use crate::rewards::ActionResult;

/// What the staff scanner shows after a code is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    #[serde(flatten)]
    pub result: ActionResult,
    pub redemption: RedemptionOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub returned_pass: Option<String>,
}

impl SchoolState {
    /// Classifies `code` against the roster and applies whatever mutation the
    /// verdict carries, including the expiry flip on a failed scan.
    pub fn redeem_code(&mut self, code: &str, now: NaiveDateTime) -> RedemptionOutcome {
        let outcome = classify_code(code, self.students.as_slice(), now);

        if let (Some(target), Some(mutation)) = (&outcome.target, outcome.mutation) {
            let record = self
                .students
                .iter_mut()
                .find(|student| student.id == target.holder_id)
                .and_then(|student| student.purchase_mut(&target.purchase_id));
            if let Some(record) = record {
                mutation.apply(record);
                debug!(
                    holder_id = %target.holder_id,
                    regime = record.regime.label(),
                    fulfillment = record.fulfillment.map(FulfillmentStatus::label),
                    ?mutation,
                    "scan mutation applied"
                );
            }
        }

        outcome
    }

    /// Staff scanner: a failed redemption falls back to returning the active
    /// hall pass with that id.
    pub fn scan_code(&mut self, code: &str, now: NaiveDateTime) -> ScanReport {
        let redemption = self.redeem_code(code, now);
        if !redemption.success() {
            let active_pass = self
                .hall_passes
                .iter()
                .any(|pass| pass.id == code && pass.is_active());
            if active_pass {
                if let Ok(pass) = self.return_hall_pass(code, now) {
                    let message =
                        format!("Returned {} from {}.", pass.student_name, pass.kind.label());
                    let returned_pass = Some(pass.id.clone());
                    return ScanReport {
                        result: ActionResult::ok(message),
                        redemption,
                        returned_pass,
                    };
                }
            }
        }

        ScanReport {
            result: redemption.result(),
            redemption,
            returned_pass: None,
        }
    }
}
