use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::config::RewardsConfig;
use crate::school::{SchoolService, SchoolState, SnapshotError, SnapshotStore};

pub(super) const ADMIN: &str = "adm-main";

pub(super) fn at(raw: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").expect("valid timestamp")
}

pub(super) fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("valid date")
}

/// Monday 2025-10-06, first period.
pub(super) fn monday() -> NaiveDateTime {
    at("2025-10-06 09:00:00")
}

pub(super) fn seeded_state() -> SchoolState {
    SchoolState::seeded(&RewardsConfig::default(), monday())
}

/// Enrolls a student and returns its id.
pub(super) fn enroll(state: &mut SchoolState, name: &str) -> String {
    let email = format!("{}@school.example", name.to_lowercase().replace(' ', "."));
    state
        .add_student(name, &email, RewardsConfig::default().hall_pass_limit, monday())
        .expect("student enrolled")
        .id
        .clone()
}

pub(super) fn fund(state: &mut SchoolState, student_id: &str, points: i64) {
    state
        .students
        .iter_mut()
        .find(|student| student.id == student_id)
        .expect("student present")
        .total_points = points;
}

pub(super) fn restricted_admin(state: &mut SchoolState) -> String {
    let mut admin = state.admin(ADMIN).expect("seeded admin").clone();
    admin.id = "adm-front-desk".to_string();
    admin.login_code = "desk".to_string();
    admin.permissions.clear();
    state.admins.push(admin);
    "adm-front-desk".to_string()
}

#[derive(Default)]
pub(super) struct MemoryStore {
    saved: Mutex<Option<SchoolState>>,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub(super) fn with_state(state: SchoolState) -> Self {
        Self {
            saved: Mutex::new(Some(state)),
            saves: AtomicUsize::new(0),
        }
    }

    pub(super) fn saved(&self) -> Option<SchoolState> {
        self.saved.lock().expect("store mutex poisoned").clone()
    }

    pub(super) fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Result<Option<SchoolState>, SnapshotError> {
        Ok(self.saved())
    }

    fn save(&self, state: &SchoolState) -> Result<(), SnapshotError> {
        *self.saved.lock().expect("store mutex poisoned") = Some(state.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Loads fine but refuses every save.
pub(super) struct ReadOnlyStore {
    state: SchoolState,
}

impl ReadOnlyStore {
    pub(super) fn new(state: SchoolState) -> Self {
        Self { state }
    }
}

impl SnapshotStore for ReadOnlyStore {
    fn load(&self) -> Result<Option<SchoolState>, SnapshotError> {
        Ok(Some(self.state.clone()))
    }

    fn save(&self, _state: &SchoolState) -> Result<(), SnapshotError> {
        Err(SnapshotError::Io {
            path: PathBuf::from("/read-only/school.json"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only volume"),
        })
    }
}

pub(super) fn build_service(state: SchoolState) -> (SchoolService<MemoryStore>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    let service = SchoolService::with_state(store.clone(), state, RewardsConfig::default());
    (service, store)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
