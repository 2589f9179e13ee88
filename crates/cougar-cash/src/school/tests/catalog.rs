use super::common::*;

use crate::rewards::currency::Amount;
use crate::rewards::redemption::{RedemptionVerdict, ValidityRegime};
use crate::school::{PassWindow, SchoolError, StoreItemDraft};

fn dance_pass(window: PassWindow) -> StoreItemDraft {
    StoreItemDraft {
        name: "Homecoming Dance".to_string(),
        description: "Entry to the fall dance.".to_string(),
        price: Amount::Dollars(4.0),
        category: "Privilege".to_string(),
        image: None,
        quantity: 2,
        window,
        requires_fulfillment: false,
        external_barcode: None,
        hall_pass_increase: 0,
    }
}

fn dance_weekend() -> PassWindow {
    PassWindow::FixedDates {
        start_date: date("2025-10-24"),
        end_date: date("2025-10-25"),
    }
}

#[test]
fn date_range_item_can_be_sold_and_scanned() {
    let mut state = seeded_state();
    let id = enroll(&mut state, "Ava Cougar");
    fund(&mut state, &id, 100);

    let item_id = state
        .create_store_item(ADMIN, dance_pass(dance_weekend()))
        .expect("item created")
        .id
        .clone();
    let receipt = state.buy_now(&id, &item_id, monday()).expect("purchase");
    assert_eq!(receipt.total_cost, 40);

    let record = state
        .student(&id)
        .expect("student")
        .purchase_history
        .last()
        .expect("record")
        .clone();
    assert_eq!(
        record.regime,
        ValidityRegime::FixedWindow {
            start_date: date("2025-10-24"),
            end_date: date("2025-10-25"),
        }
    );

    let early = state.scan_code(record.id.as_str(), monday());
    assert_eq!(
        early.redemption.verdict,
        RedemptionVerdict::NotValidYet {
            starts_on: date("2025-10-24")
        }
    );
    assert!(!early.result.success);

    let on_the_night = state.scan_code(record.id.as_str(), at("2025-10-24 19:30:00"));
    assert_eq!(
        on_the_night.redemption.verdict,
        RedemptionVerdict::WindowValid {
            ends_on: date("2025-10-25")
        }
    );
    assert!(on_the_night.result.success);
}

#[test]
fn editing_keeps_the_id_and_sold_vouchers() {
    let mut state = seeded_state();
    let id = enroll(&mut state, "Ava Cougar");
    fund(&mut state, &id, 100);
    let item_id = state
        .create_store_item(ADMIN, dance_pass(dance_weekend()))
        .expect("item created")
        .id
        .clone();
    state.buy_now(&id, &item_id, monday()).expect("purchase");

    let mut draft = dance_pass(PassWindow::Duration { duration_days: 2 });
    draft.price = Amount::Points(55);
    let updated = state
        .update_store_item(ADMIN, &item_id, draft)
        .expect("item updated");
    assert_eq!(updated.id, item_id);
    assert_eq!(updated.cost, 55);
    assert_eq!(updated.start_date, None);
    assert_eq!(updated.duration_days, Some(2));

    let sold = state
        .student(&id)
        .expect("student")
        .purchase_history
        .last()
        .expect("record");
    assert!(matches!(sold.regime, ValidityRegime::FixedWindow { .. }));
}

#[test]
fn invalid_drafts_leave_the_catalog_alone() {
    let mut state = seeded_state();
    let before = state.store_items.clone();

    let reversed = PassWindow::FixedDates {
        start_date: date("2025-10-25"),
        end_date: date("2025-10-24"),
    };
    match state.create_store_item(ADMIN, dance_pass(reversed)) {
        Err(SchoolError::InvalidPassWindow) => {}
        other => panic!("expected invalid window, got {other:?}"),
    }
    match state.update_store_item(ADMIN, "2", dance_pass(PassWindow::Duration { duration_days: 0 }))
    {
        Err(SchoolError::InvalidPassDuration) => {}
        other => panic!("expected invalid duration, got {other:?}"),
    }
    let mut unnamed = dance_pass(PassWindow::default());
    unnamed.name = "   ".to_string();
    match state.create_store_item(ADMIN, unnamed) {
        Err(SchoolError::InvalidStoreItem) => {}
        other => panic!("expected invalid item, got {other:?}"),
    }

    assert_eq!(state.store_items, before);
}

#[test]
fn deleting_an_item_clears_carts_and_favorites() {
    let mut state = seeded_state();
    let id = enroll(&mut state, "Ava Cougar");
    fund(&mut state, &id, 100);
    state.add_to_cart(&id, "3").expect("cart accepts pizza");
    state.add_to_cart(&id, "4").expect("cart accepts cinema");
    state.toggle_favorite(&id, "3").expect("favorite");

    state.delete_store_item(ADMIN, "3").expect("item deleted");

    assert!(matches!(state.store_item("3"), Err(SchoolError::ItemNotFound)));
    let student = state.student(&id).expect("student");
    assert_eq!(student.cart, vec!["4".to_string()]);
    assert!(student.favorites.is_empty());

    match state.delete_store_item(ADMIN, "3") {
        Err(SchoolError::ItemNotFound) => {}
        other => panic!("expected missing item, got {other:?}"),
    }
}

#[test]
fn catalog_edits_need_the_store_permission() {
    let mut state = seeded_state();
    let desk = restricted_admin(&mut state);

    match state.create_store_item(&desk, dance_pass(dance_weekend())) {
        Err(SchoolError::PermissionDenied(_)) => {}
        other => panic!("expected permission denied, got {other:?}"),
    }
    match state.delete_store_item(&desk, "1") {
        Err(SchoolError::PermissionDenied(_)) => {}
        other => panic!("expected permission denied, got {other:?}"),
    }
    assert_eq!(state.store_items.len(), 5);
}
