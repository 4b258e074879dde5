use crate::errors::AppResult;
use crate::models::{Assignment, Person, StandardLocation};
use crate::schedule::days_inclusive;
use chrono::NaiveDate;
use std::path::Path;
use std::sync::Arc;

mod json;
mod sqlite;

pub use json::JsonStore;
pub use sqlite::SqliteStore;

pub const DEFAULT_STANDARD_LOCATIONS: [&str; 6] = [
    "Stockholm Office",
    "Gothenburg Event",
    "Malmö Venue",
    "Remote",
    "Uppsala Concert Hall",
    "Linköping Arena",
];

pub trait Store: Send + Sync {
    fn list_persons(&self) -> AppResult<Vec<Person>>;
    fn create_person(&self, name: &str, email: &str) -> AppResult<Person>;
    fn update_person(&self, id: i64, name: &str, email: &str) -> AppResult<Option<Person>>;
    fn delete_person(&self, id: i64) -> AppResult<Option<Person>>;

    fn list_assignments(&self) -> AppResult<Vec<Assignment>>;
    fn assignments_in_range(&self, start: NaiveDate, end: NaiveDate) -> AppResult<Vec<Assignment>>;
    fn find_assignment(&self, person_id: i64, date: NaiveDate) -> AppResult<Option<Assignment>>;
    fn upsert_assignment(&self, person_id: i64, date: NaiveDate, location: &str) -> AppResult<Assignment>;

    // Day-by-day and non-atomic; backends with transactions override this.
    fn upsert_assignment_range(
        &self,
        person_id: i64,
        start: NaiveDate,
        end: NaiveDate,
        location: &str,
    ) -> AppResult<Vec<Assignment>> {
        let mut results = Vec::new();
        for date in days_inclusive(start, end) {
            results.push(self.upsert_assignment(person_id, date, location)?);
        }
        Ok(results)
    }

    fn list_standard_locations(&self) -> AppResult<Vec<StandardLocation>>;
    fn create_standard_location(&self, name: &str) -> AppResult<StandardLocation>;
    fn update_standard_location(&self, id: i64, name: &str) -> AppResult<Option<StandardLocation>>;
    fn delete_standard_location(&self, id: i64) -> AppResult<Option<StandardLocation>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Json,
    Sqlite,
}

impl StoreKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }
}

pub fn open_store(kind: StoreKind, data_dir: &Path) -> AppResult<Arc<dyn Store>> {
    Ok(match kind {
        StoreKind::Json => Arc::new(JsonStore::new(data_dir)?),
        StoreKind::Sqlite => Arc::new(SqliteStore::new(&data_dir.join("calendar.sqlite"))?),
    })
}

pub fn seed_standard_locations(store: &dyn Store) -> AppResult<usize> {
    if !store.list_standard_locations()?.is_empty() {
        return Ok(0);
    }
    for name in DEFAULT_STANDARD_LOCATIONS {
        store.create_standard_location(name)?;
    }
    Ok(DEFAULT_STANDARD_LOCATIONS.len())
}
