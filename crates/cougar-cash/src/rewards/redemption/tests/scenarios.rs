use super::common::*;
use crate::rewards::redemption::classifier::{classify_code, RedemptionMutation, RedemptionVerdict};
use crate::rewards::redemption::domain::PurchaseId;

fn apply_outcome(holders: &mut [Holder], code: &str, now: chrono::NaiveDateTime) -> String {
    let outcome = classify_code(code, holders, now);
    if let (Some(target), Some(mutation)) = (&outcome.target, outcome.mutation) {
        let holder = holders
            .iter_mut()
            .find(|holder| holder.id == target.holder_id)
            .expect("matched holder");
        let record = holder
            .purchases
            .iter_mut()
            .find(|record| record.id == target.purchase_id)
            .expect("matched record");
        mutation.apply(record);
    }
    outcome.message()
}

#[test]
fn unknown_code_is_not_found() {
    let roster = vec![holder("s1", vec![one_shot("TX-PIZZA1")])];
    let outcome = classify_code("TX-ABC123", &roster, at("2025-10-02 12:00:00"));

    assert_eq!(outcome.verdict, RedemptionVerdict::NotFound);
    assert_eq!(outcome.message(), "Code not found.");
    assert!(outcome.target.is_none());
    assert!(outcome.mutation.is_none());
    assert!(!outcome.result().success);
}

#[test]
fn empty_roster_reports_not_found() {
    let roster: Vec<Holder> = Vec::new();
    let outcome = classify_code("TX-PIZZA1", &roster, at("2025-10-02 12:00:00"));
    assert_eq!(outcome.verdict, RedemptionVerdict::NotFound);
}

#[test]
fn external_barcode_matches_the_record() {
    let mut voucher = one_shot("TX-PIZZA2");
    voucher.external_barcode = Some("0123456789".to_string());
    let roster = vec![holder("s1", vec![voucher])];

    let outcome = classify_code("0123456789", &roster, at("2025-10-02 12:00:00"));
    assert!(outcome.success());
    let target = outcome.target.expect("target");
    assert_eq!(target.holder_id, "s1");
    assert_eq!(target.purchase_id, PurchaseId("TX-PIZZA2".to_string()));
    assert_eq!(outcome.mutation, Some(RedemptionMutation::MarkRedeemed));
}

#[test]
fn only_the_first_match_in_roster_order_is_evaluated() {
    let mut used = one_shot("TX-DUPE01");
    used.redeemed = true;
    let roster = vec![
        holder("s1", vec![one_shot("TX-OTHER1"), used]),
        holder("s2", vec![one_shot("TX-DUPE01")]),
    ];

    let outcome = classify_code("TX-DUPE01", &roster, at("2025-10-02 12:00:00"));
    assert_eq!(outcome.verdict, RedemptionVerdict::AlreadyUsed);
    assert_eq!(outcome.target.expect("target").holder_id, "s1");
}

#[test]
fn week_long_pass_lifecycle() {
    let mut roster = vec![holder("s1", vec![duration_pass("TX-LUNCH1", 7)])];

    assert_eq!(
        apply_outcome(&mut roster, "TX-LUNCH1", at("2025-10-06 08:00:00")),
        "Activated! Valid for 7 days."
    );
    assert_eq!(
        apply_outcome(&mut roster, "TX-LUNCH1", at("2025-10-12 08:00:00")),
        "Active! Expires on 10/13/2025."
    );
    assert!(!roster[0].purchases[0].redeemed);

    assert_eq!(
        apply_outcome(&mut roster, "TX-LUNCH1", at("2025-10-14 08:00:00")),
        "Pass has expired."
    );
    assert!(roster[0].purchases[0].redeemed);

    assert_eq!(
        apply_outcome(&mut roster, "TX-LUNCH1", at("2025-10-15 08:00:00")),
        "This pass has expired."
    );
}

#[test]
fn fixed_window_scans_are_idempotent_inside_the_window() {
    let mut roster = vec![holder(
        "s1",
        vec![window_pass("TX-HOCO1", "2025-10-20", "2025-10-24")],
    )];

    let first = classify_code("TX-HOCO1", &roster, at("2025-10-21 08:00:00"));
    let second = classify_code("TX-HOCO1", &roster, at("2025-10-22 08:00:00"));
    assert!(first.success() && second.success());
    assert!(first.mutation.is_none() && second.mutation.is_none());

    assert_eq!(
        apply_outcome(&mut roster, "TX-HOCO1", at("2025-10-25 08:00:00")),
        "Pass has expired."
    );
    assert!(roster[0].purchases[0].redeemed);
}

#[test]
fn voucher_is_redeemed_then_rejected() {
    let mut roster = vec![holder("s1", vec![one_shot("TX-PIZZA3")])];

    assert_eq!(
        apply_outcome(&mut roster, "TX-PIZZA3", at("2025-10-02 12:00:00")),
        "Verified! Redeemed Joe's Pizza Slice."
    );
    assert_eq!(
        apply_outcome(&mut roster, "TX-PIZZA3", at("2025-10-02 12:05:00")),
        "Already used."
    );
}

#[test]
fn outcome_serializes_for_the_wire() {
    let roster = vec![holder("s1", vec![one_shot("TX-PIZZA4")])];
    let outcome = classify_code("TX-PIZZA4", &roster, at("2025-10-02 12:00:00"));

    let encoded = serde_json::to_value(&outcome).expect("encode outcome");
    assert_eq!(encoded["verdict"]["verdict"], "redeemed");
    assert_eq!(encoded["target"]["purchase_id"], "TX-PIZZA4");
    assert_eq!(encoded["mutation"]["kind"], "mark_redeemed");
}
