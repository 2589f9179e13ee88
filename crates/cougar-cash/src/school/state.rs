use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::domain::{
    Admin, AdminPermission, Announcement, BuddyConflict, EventSession, HallPassRecord, Poll,
    StoreItem, Student, StudentGroup, TimeLockout,
};
use crate::config::RewardsConfig;
use crate::rewards::calendar::{CalendarOverride, CalendarOverrides, EventType};
use crate::rewards::currency::format_dollars;
use crate::rewards::ledger::{AdminBudget, YearMonth};

/// Everything the school persists between runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchoolState {
    #[serde(default)]
    pub students: Vec<Student>,
    #[serde(default)]
    pub admins: Vec<Admin>,
    #[serde(default)]
    pub store_items: Vec<StoreItem>,
    #[serde(default)]
    pub calendar: CalendarOverrides,
    #[serde(default)]
    pub hall_passes: Vec<HallPassRecord>,
    #[serde(default)]
    pub hall_pass_lockouts: Vec<TimeLockout>,
    #[serde(default)]
    pub hall_pass_conflicts: Vec<BuddyConflict>,
    #[serde(default)]
    pub polls: Vec<Poll>,
    #[serde(default)]
    pub announcements: Vec<Announcement>,
    #[serde(default)]
    pub events: Vec<EventSession>,
    #[serde(default)]
    pub groups: Vec<StudentGroup>,
    /// Removed students, newest first, until restored.
    #[serde(default)]
    pub deleted_students: Vec<Student>,
}

impl SchoolState {
    /// Fresh install: one main admin, the starter store catalog and Halloween.
    pub fn seeded(rewards: &RewardsConfig, now: NaiveDateTime) -> Self {
        let today = now.date();
        let mut calendar = CalendarOverrides::new();
        if let Some(halloween) = NaiveDate::from_ymd_opt(today.year(), 10, 31) {
            let mut entry =
                CalendarOverride::new(halloween, "Halloween Costume Day", EventType::Special);
            entry.bonus_points = Some(10);
            calendar.upsert(entry);
        }

        Self {
            admins: vec![Admin {
                id: "adm-main".to_string(),
                name: "Main Admin".to_string(),
                email: "main.admin@school.example".to_string(),
                login_code: "admin".to_string(),
                permissions: AdminPermission::ALL.to_vec(),
                budget: AdminBudget::new(rewards.monthly_award_limit, YearMonth::of(today)),
            }],
            store_items: starter_catalog(),
            calendar,
            ..Self::default()
        }
    }

    pub fn student(&self, id: &str) -> Result<&Student, SchoolError> {
        self.students
            .iter()
            .find(|student| student.id == id)
            .ok_or(SchoolError::StudentNotFound)
    }

    pub(crate) fn student_mut(&mut self, id: &str) -> Result<&mut Student, SchoolError> {
        self.students
            .iter_mut()
            .find(|student| student.id == id)
            .ok_or(SchoolError::StudentNotFound)
    }

    pub fn admin(&self, id: &str) -> Result<&Admin, SchoolError> {
        self.admins
            .iter()
            .find(|admin| admin.id == id)
            .ok_or(SchoolError::AdminNotFound)
    }

    pub(crate) fn admin_mut(&mut self, id: &str) -> Result<&mut Admin, SchoolError> {
        self.admins
            .iter_mut()
            .find(|admin| admin.id == id)
            .ok_or(SchoolError::AdminNotFound)
    }

    /// Looks up the admin and checks it holds `permission`.
    pub(crate) fn authorized(
        &self,
        admin_id: &str,
        permission: AdminPermission,
    ) -> Result<&Admin, SchoolError> {
        let admin = self.admin(admin_id)?;
        if admin.can(permission) {
            Ok(admin)
        } else {
            Err(SchoolError::PermissionDenied(permission))
        }
    }

    pub fn group(&self, id: &str) -> Result<&StudentGroup, SchoolError> {
        self.groups
            .iter()
            .find(|group| group.id == id)
            .ok_or(SchoolError::GroupNotFound)
    }

    /// True when a student or an admin other than `except_admin` uses `code`.
    pub(crate) fn login_code_taken(&self, code: &str, except_admin: Option<&str>) -> bool {
        self.students.iter().any(|s| s.login_code == code)
            || self
                .admins
                .iter()
                .any(|a| a.login_code == code && Some(a.id.as_str()) != except_admin)
    }

    pub fn store_item(&self, id: &str) -> Result<&StoreItem, SchoolError> {
        self.store_items
            .iter()
            .find(|item| item.id == id)
            .ok_or(SchoolError::ItemNotFound)
    }
}

/// Advisory failure of a school operation; `Display` is the message shown to the user.
#[derive(Debug, thiserror::Error)]
pub enum SchoolError {
    #[error("Student not found.")]
    StudentNotFound,
    #[error("Student card not recognized.")]
    CardNotRecognized,
    #[error("Admin not found.")]
    AdminNotFound,
    #[error("You do not have the {} permission.", .0.label())]
    PermissionDenied(AdminPermission),
    #[error("Invalid Access Code")]
    InvalidAccessCode,
    #[error("Invalid Admin Code")]
    InvalidAdminCode,
    #[error("A student with this email already exists.")]
    DuplicateEmail,
    #[error("Name and email are required.")]
    MissingStudentDetails,
    #[error("Item not found.")]
    ItemNotFound,
    #[error("Order not found.")]
    OrderNotFound,
    #[error("Order is not awaiting pickup.")]
    NotAwaitingPickup,
    #[error("You don't have enough points to add this to your cart.")]
    CartOverBalance,
    #[error("Your cart is empty.")]
    EmptyCart,
    #[error("Insufficient points.")]
    InsufficientPoints,
    #[error("Item is out of stock.")]
    OutOfStock,
    #[error("Some items are out of stock: {}", .0.join(", "))]
    CartOutOfStock(Vec<String>),
    #[error("Insufficient Funds. Student has {}", dollars(.balance))]
    InsufficientFunds { balance: i64 },
    #[error("Amount must be greater than zero.")]
    InvalidAmount,
    #[error("Monthly budget exceeded. You have {} remaining.", dollars(.remaining_points))]
    BudgetExceeded { remaining_points: i64 },
    #[error("Event session not found.")]
    EventNotFound,
    #[error("{name} is already checked in.")]
    AlreadyCheckedIn { name: String },
    #[error("Hall passes are currently restricted: {label}. They will be available after {until}.")]
    HallPassLockout { label: String, until: String },
    #[error("Conflict: You cannot leave class while certain restricted students are already out on a pass. Please wait for their return.")]
    BuddyConflict,
    #[error("You have reached your hall pass limit for the week.")]
    HallPassLimitReached,
    #[error("Hall pass not found.")]
    PassNotFound,
    #[error("This pass has already been returned.")]
    PassAlreadyReturned,
    #[error("A buddy conflict needs two different students.")]
    InvalidConflict,
    #[error("A lockout needs a label.")]
    InvalidLockout,
    #[error("A poll needs a question and at least two options.")]
    InvalidPoll,
    #[error("An announcement needs a title and content.")]
    InvalidAnnouncement,
    #[error("An item needs a name and a price above zero.")]
    InvalidStoreItem,
    #[error("Duration passes must last at least one day.")]
    InvalidPassDuration,
    #[error("A date-range pass needs a start date on or before its end date.")]
    InvalidPassWindow,
    #[error("Name, email and login code are required.")]
    MissingAdminDetails,
    #[error("Monthly award limit cannot be negative.")]
    InvalidAwardLimit,
    #[error("That login code is already in use.")]
    DuplicateLoginCode,
    #[error("You cannot delete your own admin account.")]
    CannotDeleteSelf,
    #[error("At least one admin must keep the manage-admins permission.")]
    LastAdminManager,
    #[error("A group needs a name.")]
    InvalidGroup,
    #[error("Group not found.")]
    GroupNotFound,
    #[error("Select at least one student.")]
    NoStudentsSelected,
    #[error("Calendar ranges are limited to {max_days} days.")]
    CalendarRangeTooLong { max_days: i64 },
    #[error("Poll not found.")]
    PollNotFound,
    #[error("Poll option not found.")]
    PollOptionNotFound,
    #[error("This poll is closed.")]
    PollClosed,
    #[error("You have already voted in this poll.")]
    AlreadyVoted,
    #[error("Announcement not found.")]
    AnnouncementNotFound,
    #[error("Could not read roster CSV: {0}")]
    RosterImport(#[from] csv::Error),
}

impl SchoolError {
    /// True when the subject of the request does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            SchoolError::StudentNotFound
                | SchoolError::CardNotRecognized
                | SchoolError::AdminNotFound
                | SchoolError::ItemNotFound
                | SchoolError::OrderNotFound
                | SchoolError::EventNotFound
                | SchoolError::PassNotFound
                | SchoolError::PollNotFound
                | SchoolError::PollOptionNotFound
                | SchoolError::AnnouncementNotFound
                | SchoolError::GroupNotFound
        )
    }
}

fn dollars(points: &i64) -> String {
    format_dollars(*points)
}

/// `{prefix}-{uuid}` identifier for records nobody types by hand.
pub(crate) fn record_id(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

/// `TX-` plus six uppercase characters, printed on vouchers.
pub(crate) fn purchase_code() -> String {
    let token = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("TX-{}", &token[..6])
}

/// Six-digit student login code.
pub(crate) fn login_code() -> String {
    let value = 100_000 + Uuid::new_v4().as_u128() % 900_000;
    value.to_string()
}

fn starter_catalog() -> Vec<StoreItem> {
    let item = |id: &str, name: &str, description: &str, cost: i64, category: &str, quantity| {
        StoreItem {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            cost,
            category: category.to_string(),
            image: None,
            quantity,
            expiration_date: None,
            start_date: None,
            end_date: None,
            duration_days: None,
            requires_fulfillment: false,
            external_barcode: None,
            hall_pass_increase: 0,
        }
    };

    let mut hoodie = item(
        "1",
        "School Hoodie",
        "Comfortable fleece hoodie with logo.",
        50,
        "Apparel",
        15,
    );
    hoodie.requires_fulfillment = true;

    let mut lunch = item(
        "2",
        "Front of Lunch Line",
        "Skip the line pass for one week.",
        25,
        "Privilege",
        5,
    );
    lunch.duration_days = Some(7);

    let mut pizza = item(
        "3",
        "Joe's Pizza Slice",
        "Voucher for one free slice at Joe's.",
        15,
        "Voucher",
        50,
    );
    pizza.external_barcode = Some("012345678905".to_string());

    let mut cinema = item(
        "4",
        "City Cinema Ticket",
        "One movie ticket voucher.",
        40,
        "Voucher",
        20,
    );
    cinema.external_barcode = Some("987654321098".to_string());

    let mut extra_pass = item(
        "5",
        "Extra Hall Pass",
        "Permanently increases your weekly hall pass limit by 1.",
        100,
        "Privilege",
        99,
    );
    extra_pass.hall_pass_increase = 1;

    vec![hoodie, lunch, pizza, cinema, extra_pass]
}
