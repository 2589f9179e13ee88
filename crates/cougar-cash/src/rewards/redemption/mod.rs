//! Scan-time classification of vouchers, passes, and physical orders.
//!
//! A scanned code is matched against every student's purchase history and the
//! first match is run through exactly one validity branch. The classifier is
//! pure: it reports the mutation to apply and leaves persistence to the caller.

mod classifier;
pub mod domain;

#[cfg(test)]
mod tests;

pub use classifier::{
    classify_code, classify_record, PurchaseHolder, RedemptionMutation, RedemptionOutcome,
    RedemptionTarget, RedemptionVerdict,
};
pub use domain::{
    FulfillmentStatus, PurchaseId, PurchaseRecord, ValidityRegime, ATHLETIC_PASS_CATEGORY,
};
