use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Category that marks the free, never-consumed athletic event pass.
pub const ATHLETIC_PASS_CATEGORY: &str = "Athletic Pass";

/// Redemption code printed on a student's voucher or pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PurchaseId(pub String);

impl PurchaseId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PurchaseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Staff handoff progress for physical items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentStatus {
    Pending,
    Ready,
    Fulfilled,
}

impl FulfillmentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            FulfillmentStatus::Pending => "pending",
            FulfillmentStatus::Ready => "ready",
            FulfillmentStatus::Fulfilled => "fulfilled",
        }
    }
}

/// Temporal validity rules of a purchased record, fixed at purchase time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "regime", rename_all = "snake_case")]
pub enum ValidityRegime {
    /// Single-use voucher with an optional hard expiration date.
    OneShot {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expiration_date: Option<NaiveDate>,
    },
    /// Window of `duration_days` that starts at the first successful scan.
    DurationWindow {
        duration_days: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        activation_date: Option<NaiveDateTime>,
    },
    /// Calendar window; `end_date` is valid through the end of that day.
    FixedWindow {
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
    AthleticPass,
}

impl ValidityRegime {
    /// Chooses the regime for a newly purchased item.
    ///
    /// Precedence mirrors the scan-time checks: athletic pass, positive
    /// duration, complete start/end window, then one-shot.
    pub fn for_item(
        category: &str,
        duration_days: Option<u32>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        expiration_date: Option<NaiveDate>,
    ) -> Self {
        if category == ATHLETIC_PASS_CATEGORY {
            return ValidityRegime::AthleticPass;
        }

        if let Some(duration_days) = duration_days.filter(|days| *days > 0) {
            return ValidityRegime::DurationWindow {
                duration_days,
                activation_date: None,
            };
        }

        if let (Some(start_date), Some(end_date)) = (start_date, end_date) {
            return ValidityRegime::FixedWindow {
                start_date,
                end_date,
            };
        }

        ValidityRegime::OneShot { expiration_date }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            ValidityRegime::OneShot { .. } => "one_shot",
            ValidityRegime::DurationWindow { .. } => "duration_window",
            ValidityRegime::FixedWindow { .. } => "fixed_window",
            ValidityRegime::AthleticPass => "athletic_pass",
        }
    }
}

/// A purchased voucher, pass, or physical order held by a student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    pub id: PurchaseId,
    pub date: NaiveDateTime,
    pub item_name: String,
    pub cost: i64,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub redeemed: bool,
    #[serde(flatten)]
    pub regime: ValidityRegime,
    /// Present only when the item needs a physical handoff.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fulfillment: Option<FulfillmentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_barcode: Option<String>,
}

impl PurchaseRecord {
    /// Free athletic pass issued to every new student.
    pub fn athletic_pass(id: PurchaseId, issued_at: NaiveDateTime) -> Self {
        Self {
            id,
            date: issued_at,
            item_name: "LCC Athletic Pass".to_string(),
            cost: 0,
            category: ATHLETIC_PASS_CATEGORY.to_string(),
            image: None,
            redeemed: false,
            regime: ValidityRegime::AthleticPass,
            fulfillment: None,
            external_barcode: None,
        }
    }

    /// True when the scanned code is this record's id or its merchant barcode.
    pub fn matches_code(&self, code: &str) -> bool {
        self.id.0 == code || self.external_barcode.as_deref() == Some(code)
    }

    pub fn awaiting_handoff(&self) -> bool {
        matches!(
            self.fulfillment,
            Some(FulfillmentStatus::Pending | FulfillmentStatus::Ready)
        )
    }
}
