use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{AdminPermission, StoreItem};
use super::state::{record_id, SchoolError, SchoolState};
use crate::rewards::currency::Amount;

/// How long a purchased item stays valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "pass_type", rename_all = "snake_case")]
pub enum PassWindow {
    /// Single use, optionally expiring after the given day.
    Standard {
        #[serde(default)]
        expiration_date: Option<NaiveDate>,
    },
    /// Valid between two dates, both inclusive.
    FixedDates {
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
    /// Valid for a number of days from the first scan.
    Duration { duration_days: u32 },
}

impl Default for PassWindow {
    fn default() -> Self {
        PassWindow::Standard {
            expiration_date: None,
        }
    }
}

/// Store item as entered on the editor form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreItemDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub price: Amount,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub image: Option<String>,
    pub quantity: u32,
    #[serde(default)]
    pub window: PassWindow,
    #[serde(default)]
    pub requires_fulfillment: bool,
    #[serde(default)]
    pub external_barcode: Option<String>,
    #[serde(default)]
    pub hall_pass_increase: u32,
}

fn default_category() -> String {
    "Voucher".to_string()
}

impl StoreItemDraft {
    fn into_item(self, id: String) -> Result<StoreItem, SchoolError> {
        let name = self.name.trim();
        let cost = self.price.points();
        if name.is_empty() || cost <= 0 {
            return Err(SchoolError::InvalidStoreItem);
        }

        let (expiration_date, start_date, end_date, duration_days) = match self.window {
            PassWindow::Standard { expiration_date } => (expiration_date, None, None, None),
            PassWindow::FixedDates {
                start_date,
                end_date,
            } => {
                if start_date > end_date {
                    return Err(SchoolError::InvalidPassWindow);
                }
                (None, Some(start_date), Some(end_date), None)
            }
            PassWindow::Duration { duration_days: 0 } => {
                return Err(SchoolError::InvalidPassDuration)
            }
            PassWindow::Duration { duration_days } => (None, None, None, Some(duration_days)),
        };

        Ok(StoreItem {
            id,
            name: name.to_string(),
            description: self.description.trim().to_string(),
            cost,
            category: self.category.trim().to_string(),
            image: self.image.filter(|image| !image.is_empty()),
            quantity: self.quantity,
            expiration_date,
            start_date,
            end_date,
            duration_days,
            requires_fulfillment: self.requires_fulfillment,
            external_barcode: self
                .external_barcode
                .map(|code| code.trim().to_string())
                .filter(|code| !code.is_empty()),
            hall_pass_increase: self.hall_pass_increase,
        })
    }
}

impl SchoolState {
    pub fn create_store_item(
        &mut self,
        admin_id: &str,
        draft: StoreItemDraft,
    ) -> Result<&StoreItem, SchoolError> {
        self.authorized(admin_id, AdminPermission::Store)?;
        let item = draft.into_item(record_id("item"))?;
        self.store_items.push(item);
        self.store_items.last().ok_or(SchoolError::ItemNotFound)
    }

    /// Replaces every field but the id. Vouchers already sold keep the
    /// validity they were issued with.
    pub fn update_store_item(
        &mut self,
        admin_id: &str,
        item_id: &str,
        draft: StoreItemDraft,
    ) -> Result<&StoreItem, SchoolError> {
        self.authorized(admin_id, AdminPermission::Store)?;
        let index = self
            .store_items
            .iter()
            .position(|item| item.id == item_id)
            .ok_or(SchoolError::ItemNotFound)?;

        self.store_items[index] = draft.into_item(item_id.to_string())?;
        Ok(&self.store_items[index])
    }

    /// Also drops the item from every cart and favorites list.
    pub fn delete_store_item(&mut self, admin_id: &str, item_id: &str) -> Result<(), SchoolError> {
        self.authorized(admin_id, AdminPermission::Store)?;
        self.store_item(item_id)?;

        self.store_items.retain(|item| item.id != item_id);
        for student in &mut self.students {
            student.cart.retain(|id| id != item_id);
            student.favorites.retain(|id| id != item_id);
        }
        Ok(())
    }
}
