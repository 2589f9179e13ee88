//! School application state and the operations that run on it.
//!
//! [`SchoolState`] is the whole persisted world: roster, groups, admins, store
//! catalog, calendar overrides, hall passes, polls and announcements. The
//! operation modules add `impl SchoolState` blocks that validate first and
//! mutate second, so a rejected operation leaves the state untouched.
//! [`SchoolService`] serializes access, saves a snapshot after every
//! successful mutation and is what the HTTP router talks to.

mod admins;
mod awards;
mod catalog;
pub mod domain;
mod engagement;
mod groups;
mod hall_pass;
mod orders;
mod roster;
pub mod router;
mod scanner;
pub mod service;
pub mod snapshot;
mod state;
mod store;

#[cfg(test)]
mod tests;

pub use admins::AdminDraft;
pub use awards::{AdjustmentMode, AttendanceSummary};
pub use catalog::{PassWindow, StoreItemDraft};
pub use domain::{
    Admin, AdminPermission, Announcement, AttendanceRecord, BuddyConflict, EventSession,
    GroupKind, HallPassKind, HallPassRecord, HallPassStatus, Notification, NotificationKind,
    Poll, PollOption, StoreItem, Student, StudentGroup, TimeLockout,
};
pub use engagement::DEFAULT_POST_LIFETIME_DAYS;
pub use groups::GroupDraft;
pub use orders::PendingOrder;
pub use roster::RosterImport;
pub use router::school_router;
pub use scanner::ScanReport;
pub use service::{
    BudgetView, CalendarDay, SchoolService, SchoolServiceError, MAX_CALENDAR_RANGE_DAYS,
};
pub use snapshot::{JsonFileStore, SnapshotError, SnapshotStore};
pub use state::{SchoolError, SchoolState};
pub use store::PurchaseReceipt;
