use chrono::{NaiveDate, NaiveDateTime};

use crate::rewards::redemption::classifier::PurchaseHolder;
use crate::rewards::redemption::domain::{
    FulfillmentStatus, PurchaseId, PurchaseRecord, ValidityRegime,
};

pub(super) struct Holder {
    pub(super) id: String,
    pub(super) purchases: Vec<PurchaseRecord>,
}

impl PurchaseHolder for Holder {
    fn holder_id(&self) -> &str {
        &self.id
    }

    fn purchases(&self) -> &[PurchaseRecord] {
        &self.purchases
    }
}

pub(super) fn holder(id: &str, purchases: Vec<PurchaseRecord>) -> Holder {
    Holder {
        id: id.to_string(),
        purchases,
    }
}

pub(super) fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("valid date")
}

pub(super) fn at(raw: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").expect("valid timestamp")
}

pub(super) fn record(id: &str, item_name: &str, regime: ValidityRegime) -> PurchaseRecord {
    PurchaseRecord {
        id: PurchaseId(id.to_string()),
        date: at("2025-10-01 09:00:00"),
        item_name: item_name.to_string(),
        cost: 150,
        category: "Voucher".to_string(),
        image: None,
        redeemed: false,
        regime,
        fulfillment: None,
        external_barcode: None,
    }
}

pub(super) fn one_shot(id: &str) -> PurchaseRecord {
    record(
        id,
        "Joe's Pizza Slice",
        ValidityRegime::OneShot {
            expiration_date: None,
        },
    )
}

pub(super) fn duration_pass(id: &str, duration_days: u32) -> PurchaseRecord {
    record(
        id,
        "Front of Lunch Line",
        ValidityRegime::DurationWindow {
            duration_days,
            activation_date: None,
        },
    )
}

pub(super) fn window_pass(id: &str, start: &str, end: &str) -> PurchaseRecord {
    record(
        id,
        "Homecoming Week Pass",
        ValidityRegime::FixedWindow {
            start_date: date(start),
            end_date: date(end),
        },
    )
}

pub(super) fn physical_order(id: &str, status: FulfillmentStatus) -> PurchaseRecord {
    let mut order = one_shot(id);
    order.item_name = "School Hoodie".to_string();
    order.category = "Apparel".to_string();
    order.fulfillment = Some(status);
    order
}
