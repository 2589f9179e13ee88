use chrono::NaiveDateTime;
use serde::Serialize;

use super::domain::{AdminPermission, Notification, NotificationKind};
use super::state::{record_id, SchoolError, SchoolState};
use crate::rewards::redemption::{FulfillmentStatus, PurchaseId, PurchaseRecord};

/// Physical order still waiting for handoff at the school store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingOrder {
    pub student_id: String,
    pub student_name: String,
    pub order: PurchaseRecord,
}

impl SchoolState {
    /// Pending and ready orders across the roster, oldest first.
    pub fn pending_orders(&self) -> Vec<PendingOrder> {
        let mut orders: Vec<PendingOrder> = self
            .students
            .iter()
            .flat_map(|student| {
                student
                    .purchase_history
                    .iter()
                    .filter(|record| record.awaiting_handoff())
                    .map(|record| PendingOrder {
                        student_id: student.id.clone(),
                        student_name: student.name.clone(),
                        order: record.clone(),
                    })
            })
            .collect();
        orders.sort_by_key(|pending| pending.order.date);
        orders
    }

    pub fn mark_order_ready(
        &mut self,
        admin_id: &str,
        student_id: &str,
        order_id: &PurchaseId,
        now: NaiveDateTime,
    ) -> Result<String, SchoolError> {
        self.authorized(admin_id, AdminPermission::Orders)?;

        let student = self.student_mut(student_id)?;
        let order = student
            .purchase_mut(order_id)
            .ok_or(SchoolError::OrderNotFound)?;
        if order.fulfillment != Some(FulfillmentStatus::Pending) {
            return Err(SchoolError::NotAwaitingPickup);
        }
        order.fulfillment = Some(FulfillmentStatus::Ready);
        let item_name = order.item_name.clone();

        student.notify(Notification {
            id: record_id("notif"),
            title: "Order Ready!".to_string(),
            message: format!(
                "Your order for \"{item_name}\" is ready for pickup at the school store."
            ),
            date: now,
            read: false,
            kind: NotificationKind::OrderReady,
        });

        Ok(format!("\"{item_name}\" marked ready for pickup."))
    }
}
