use chrono::NaiveDate;
use cougar_cash::school::{SchoolState, SnapshotError, SnapshotStore};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Snapshot store that never touches disk; backs the scripted demo.
#[derive(Default)]
pub(crate) struct InMemorySnapshotStore {
    state: Mutex<Option<SchoolState>>,
}

impl SnapshotStore for InMemorySnapshotStore {
    fn load(&self) -> Result<Option<SchoolState>, SnapshotError> {
        Ok(self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, state: &SchoolState) -> Result<(), SnapshotError> {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = Some(state.clone());
        Ok(())
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_trims_and_reports_bad_input() {
        assert_eq!(
            parse_date(" 2025-10-31 ").expect("valid date"),
            NaiveDate::from_ymd_opt(2025, 10, 31).expect("date")
        );
        let err = parse_date("10/31/2025").expect_err("wrong format");
        assert!(err.contains("YYYY-MM-DD"));
    }

    #[test]
    fn in_memory_store_returns_the_last_save() {
        let store = InMemorySnapshotStore::default();
        assert!(store.load().expect("load").is_none());

        let state = SchoolState::default();
        store.save(&state).expect("save");
        assert_eq!(store.load().expect("load"), Some(state));
    }
}
