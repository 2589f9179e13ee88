use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::Serialize;

use super::domain::StoreItem;
use super::state::{purchase_code, SchoolError, SchoolState};
use crate::rewards::redemption::PurchaseId;

/// Codes issued by a completed checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseReceipt {
    pub codes: Vec<PurchaseId>,
    pub total_cost: i64,
    pub hall_pass_increase: u32,
}

impl PurchaseReceipt {
    pub fn message(&self) -> String {
        let mut message = "Purchase successful! Check your Wallet.".to_string();
        if self.hall_pass_increase > 0 {
            message.push_str(&format!(
                "\n\nYour weekly Hall Pass limit has been increased by {}!",
                self.hall_pass_increase
            ));
        }
        message
    }
}

fn total_cost<'a>(items: impl Iterator<Item = &'a StoreItem>) -> i64 {
    items.fold(0, |sum, item| sum.saturating_add(item.cost))
}

impl SchoolState {
    /// Flips the favorite flag and returns whether the item is now a favorite.
    pub fn toggle_favorite(
        &mut self,
        student_id: &str,
        item_id: &str,
    ) -> Result<bool, SchoolError> {
        self.store_item(item_id)?;
        let student = self.student_mut(student_id)?;
        if let Some(index) = student.favorites.iter().position(|id| id == item_id) {
            student.favorites.remove(index);
            Ok(false)
        } else {
            student.favorites.push(item_id.to_string());
            Ok(true)
        }
    }

    /// The cart total including the new item must stay within the balance.
    pub fn add_to_cart(&mut self, student_id: &str, item_id: &str) -> Result<(), SchoolError> {
        let item_cost = self.store_item(item_id)?.cost;
        let cart_cost = self.cart_total(student_id)?;
        let student = self.student_mut(student_id)?;
        if student.total_points < cart_cost.saturating_add(item_cost) {
            return Err(SchoolError::CartOverBalance);
        }
        student.cart.push(item_id.to_string());
        Ok(())
    }

    pub fn remove_from_cart(&mut self, student_id: &str, item_id: &str) -> Result<(), SchoolError> {
        let student = self.student_mut(student_id)?;
        student.cart.retain(|id| id != item_id);
        Ok(())
    }

    pub fn cart_items(&self, student_id: &str) -> Result<Vec<&StoreItem>, SchoolError> {
        let student = self.student(student_id)?;
        student
            .cart
            .iter()
            .map(|item_id| self.store_item(item_id))
            .collect()
    }

    pub fn cart_total(&self, student_id: &str) -> Result<i64, SchoolError> {
        Ok(total_cost(self.cart_items(student_id)?.into_iter()))
    }

    /// Single-item purchase that leaves the cart untouched.
    pub fn buy_now(
        &mut self,
        student_id: &str,
        item_id: &str,
        now: NaiveDateTime,
    ) -> Result<PurchaseReceipt, SchoolError> {
        let item = self.store_item(item_id)?;
        let student = self.student(student_id)?;
        if student.total_points < item.cost {
            return Err(SchoolError::InsufficientPoints);
        }
        if item.quantity == 0 {
            return Err(SchoolError::OutOfStock);
        }

        let items = vec![item.clone()];
        self.complete_purchase(student_id, items, false, now)
    }

    pub fn checkout_cart(
        &mut self,
        student_id: &str,
        now: NaiveDateTime,
    ) -> Result<PurchaseReceipt, SchoolError> {
        let items: Vec<StoreItem> = self
            .cart_items(student_id)?
            .into_iter()
            .cloned()
            .collect();
        if items.is_empty() {
            return Err(SchoolError::EmptyCart);
        }

        let total = total_cost(items.iter());
        if self.student(student_id)?.total_points < total {
            return Err(SchoolError::InsufficientPoints);
        }

        let mut wanted: BTreeMap<&str, u32> = BTreeMap::new();
        for item in &items {
            *wanted.entry(item.id.as_str()).or_default() += 1;
        }
        let short: Vec<String> = wanted
            .iter()
            .filter_map(|(id, count)| {
                let item = items.iter().find(|item| item.id == *id)?;
                (item.quantity < *count).then(|| item.name.clone())
            })
            .collect();
        if !short.is_empty() {
            return Err(SchoolError::CartOutOfStock(short));
        }

        self.complete_purchase(student_id, items, true, now)
    }

    /// Charges the student, decrements inventory and issues one record per item.
    fn complete_purchase(
        &mut self,
        student_id: &str,
        items: Vec<StoreItem>,
        clear_cart: bool,
        now: NaiveDateTime,
    ) -> Result<PurchaseReceipt, SchoolError> {
        self.student(student_id)?;
        let codes = self.unused_purchase_codes(items.len());
        let total_cost = total_cost(items.iter());
        let hall_pass_increase = items
            .iter()
            .fold(0u32, |sum, item| sum.saturating_add(item.hall_pass_increase));
        let records: Vec<_> = items
            .iter()
            .zip(codes.iter().cloned())
            .map(|(item, code)| item.issue(code, now))
            .collect();

        for item in &items {
            if let Some(stock) = self.store_items.iter_mut().find(|s| s.id == item.id) {
                stock.quantity = stock.quantity.saturating_sub(1);
            }
        }

        let student = self.student_mut(student_id)?;
        student.total_points = student.total_points.saturating_sub(total_cost);
        student.hall_pass_limit = student.hall_pass_limit.saturating_add(hall_pass_increase);
        student.purchase_history.extend(records);
        if clear_cart {
            student.cart.clear();
        }

        Ok(PurchaseReceipt {
            codes,
            total_cost,
            hall_pass_increase,
        })
    }

    fn unused_purchase_codes(&self, count: usize) -> Vec<PurchaseId> {
        let mut codes: Vec<PurchaseId> = Vec::with_capacity(count);
        while codes.len() < count {
            let code = PurchaseId(purchase_code());
            let taken = codes.contains(&code)
                || self
                    .students
                    .iter()
                    .flat_map(|student| student.purchase_history.iter())
                    .any(|record| record.id == code);
            if !taken {
                codes.push(code);
            }
        }
        codes
    }
}
