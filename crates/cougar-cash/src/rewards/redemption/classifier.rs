use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::domain::{FulfillmentStatus, PurchaseId, PurchaseRecord, ValidityRegime};
use crate::rewards::ActionResult;

/// Anything that owns purchase records a scanned code can match, in roster order.
pub trait PurchaseHolder {
    fn holder_id(&self) -> &str;
    fn purchases(&self) -> &[PurchaseRecord];
}

/// Field change a scan applies to the matched record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RedemptionMutation {
    MarkRedeemed,
    Activate { at: NaiveDateTime },
    CompleteFulfillment,
}

impl RedemptionMutation {
    pub fn apply(&self, record: &mut PurchaseRecord) {
        match self {
            RedemptionMutation::MarkRedeemed => record.redeemed = true,
            RedemptionMutation::Activate { at } => {
                if let ValidityRegime::DurationWindow {
                    activation_date, ..
                } = &mut record.regime
                {
                    *activation_date = Some(*at);
                }
            }
            RedemptionMutation::CompleteFulfillment => {
                record.redeemed = true;
                record.fulfillment = Some(FulfillmentStatus::Fulfilled);
            }
        }
    }
}

/// Terminal branch reached for a scanned code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum RedemptionVerdict {
    AthleticPassValid,
    OrderFulfilled,
    OrderPickedUp,
    PassActivated { duration_days: u32 },
    PassActive { expires_at: NaiveDateTime },
    PassExpired,
    DurationPassExpired,
    NotValidYet { starts_on: NaiveDate },
    WindowValid { ends_on: NaiveDate },
    VoucherExpired,
    AlreadyUsed,
    Redeemed { item_name: String },
    NotFound,
}

impl RedemptionVerdict {
    pub fn success(&self) -> bool {
        matches!(
            self,
            RedemptionVerdict::AthleticPassValid
                | RedemptionVerdict::OrderFulfilled
                | RedemptionVerdict::OrderPickedUp
                | RedemptionVerdict::PassActivated { .. }
                | RedemptionVerdict::PassActive { .. }
                | RedemptionVerdict::WindowValid { .. }
                | RedemptionVerdict::Redeemed { .. }
        )
    }

    pub fn message(&self) -> String {
        match self {
            RedemptionVerdict::AthleticPassValid => "Valid Athletic Pass".to_string(),
            RedemptionVerdict::OrderFulfilled => "Order fulfilled and picked up!".to_string(),
            RedemptionVerdict::OrderPickedUp => "Order picked up successfully!".to_string(),
            RedemptionVerdict::PassActivated { duration_days } => {
                format!("Activated! Valid for {duration_days} days.")
            }
            RedemptionVerdict::PassActive { expires_at } => {
                format!("Active! Expires on {}.", expires_at.format("%m/%d/%Y"))
            }
            RedemptionVerdict::PassExpired => "Pass has expired.".to_string(),
            RedemptionVerdict::DurationPassExpired => "This pass has expired.".to_string(),
            RedemptionVerdict::NotValidYet { starts_on } => {
                format!("Not valid yet. Starts {}.", starts_on.format("%Y-%m-%d"))
            }
            RedemptionVerdict::WindowValid { ends_on } => {
                format!("Valid Pass! (Expires {})", ends_on.format("%Y-%m-%d"))
            }
            RedemptionVerdict::VoucherExpired => "Voucher expired.".to_string(),
            RedemptionVerdict::AlreadyUsed => "Already used.".to_string(),
            RedemptionVerdict::Redeemed { item_name } => {
                format!("Verified! Redeemed {item_name}.")
            }
            RedemptionVerdict::NotFound => "Code not found.".to_string(),
        }
    }
}

/// Location of the matched record inside the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionTarget {
    pub holder_id: String,
    pub purchase_id: PurchaseId,
}

/// Result of classifying a scanned code against the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionOutcome {
    pub verdict: RedemptionVerdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<RedemptionTarget>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mutation: Option<RedemptionMutation>,
}

impl RedemptionOutcome {
    pub fn success(&self) -> bool {
        self.verdict.success()
    }

    pub fn message(&self) -> String {
        self.verdict.message()
    }

    pub fn result(&self) -> ActionResult {
        ActionResult {
            success: self.success(),
            message: self.message(),
        }
    }

    fn not_found() -> Self {
        Self {
            verdict: RedemptionVerdict::NotFound,
            target: None,
            mutation: None,
        }
    }
}

/// Finds the first record matching `code` across all holders and classifies it.
pub fn classify_code<H: PurchaseHolder>(
    code: &str,
    holders: &[H],
    now: NaiveDateTime,
) -> RedemptionOutcome {
    let matched = holders.iter().find_map(|holder| {
        holder
            .purchases()
            .iter()
            .find(|record| record.matches_code(code))
            .map(|record| (holder.holder_id(), record))
    });

    let Some((holder_id, record)) = matched else {
        return RedemptionOutcome::not_found();
    };

    let (verdict, mutation) = classify_record(record, now);
    RedemptionOutcome {
        verdict,
        target: Some(RedemptionTarget {
            holder_id: holder_id.to_string(),
            purchase_id: record.id.clone(),
        }),
        mutation,
    }
}

/// Applies the validity rules of a single record at `now`.
pub fn classify_record(
    record: &PurchaseRecord,
    now: NaiveDateTime,
) -> (RedemptionVerdict, Option<RedemptionMutation>) {
    if let ValidityRegime::AthleticPass = record.regime {
        return (RedemptionVerdict::AthleticPassValid, None);
    }

    if !record.redeemed {
        match record.fulfillment {
            Some(FulfillmentStatus::Pending) => {
                return (
                    RedemptionVerdict::OrderFulfilled,
                    Some(RedemptionMutation::CompleteFulfillment),
                );
            }
            Some(FulfillmentStatus::Ready) => {
                return (
                    RedemptionVerdict::OrderPickedUp,
                    Some(RedemptionMutation::CompleteFulfillment),
                );
            }
            Some(FulfillmentStatus::Fulfilled) | None => {}
        }
    }

    match &record.regime {
        ValidityRegime::AthleticPass => (RedemptionVerdict::AthleticPassValid, None),
        ValidityRegime::DurationWindow {
            duration_days,
            activation_date,
        } => classify_duration(record.redeemed, *duration_days, *activation_date, now),
        ValidityRegime::FixedWindow {
            start_date,
            end_date,
        } => classify_fixed_window(record.redeemed, *start_date, *end_date, now),
        ValidityRegime::OneShot { expiration_date } => {
            classify_one_shot(record, *expiration_date, now)
        }
    }
}

fn classify_duration(
    redeemed: bool,
    duration_days: u32,
    activation_date: Option<NaiveDateTime>,
    now: NaiveDateTime,
) -> (RedemptionVerdict, Option<RedemptionMutation>) {
    if redeemed {
        return (RedemptionVerdict::DurationPassExpired, None);
    }

    let Some(activated_at) = activation_date else {
        return (
            RedemptionVerdict::PassActivated { duration_days },
            Some(RedemptionMutation::Activate { at: now }),
        );
    };

    let expires_at = activated_at + Duration::days(i64::from(duration_days));
    if now < expires_at {
        (RedemptionVerdict::PassActive { expires_at }, None)
    } else {
        (
            RedemptionVerdict::PassExpired,
            Some(RedemptionMutation::MarkRedeemed),
        )
    }
}

fn classify_fixed_window(
    redeemed: bool,
    start_date: NaiveDate,
    end_date: NaiveDate,
    now: NaiveDateTime,
) -> (RedemptionVerdict, Option<RedemptionMutation>) {
    if now < start_date.and_time(NaiveTime::MIN) {
        return (
            RedemptionVerdict::NotValidYet {
                starts_on: start_date,
            },
            None,
        );
    }

    if now > end_of_day(end_date) {
        let mutation = (!redeemed).then_some(RedemptionMutation::MarkRedeemed);
        return (RedemptionVerdict::PassExpired, mutation);
    }

    (RedemptionVerdict::WindowValid { ends_on: end_date }, None)
}

fn classify_one_shot(
    record: &PurchaseRecord,
    expiration_date: Option<NaiveDate>,
    now: NaiveDateTime,
) -> (RedemptionVerdict, Option<RedemptionMutation>) {
    if let Some(expiration_date) = expiration_date {
        if expiration_date.and_time(NaiveTime::MIN) < now {
            return (RedemptionVerdict::VoucherExpired, None);
        }
    }

    if record.redeemed {
        return (RedemptionVerdict::AlreadyUsed, None);
    }

    (
        RedemptionVerdict::Redeemed {
            item_name: record.item_name.clone(),
        },
        Some(RedemptionMutation::MarkRedeemed),
    )
}

fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN) + Duration::days(1) - Duration::milliseconds(1)
}
