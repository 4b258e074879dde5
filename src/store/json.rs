use super::Store;
use crate::errors::{AppError, AppResult};
use crate::models::{Assignment, Person, StandardLocation};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

const PERSONS_FILE: &str = "persons.json";
const ASSIGNMENTS_FILE: &str = "locations.json";
const STANDARD_LOCATIONS_FILE: &str = "standardLocations.json";

#[derive(Debug)]
pub struct JsonStore {
    data_dir: PathBuf,
}

impl JsonStore {
    pub fn new(data_dir: &Path) -> AppResult<Self> {
        fs::create_dir_all(data_dir).map_err(|err| AppError::Io(err.to_string()))?;
        Ok(Self {
            data_dir: data_dir.to_path_buf(),
        })
    }

    // Unreadable or unparseable collections degrade to empty; writes still fail loudly.
    fn read_collection<T: DeserializeOwned>(&self, file: &str) -> AppResult<Vec<T>> {
        let path = self.data_dir.join(file);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(error) => {
                tracing::error!(collection = file, error = %error, "collection read failed, treating as empty");
                return Ok(Vec::new());
            }
        };
        match serde_json::from_str(&raw) {
            Ok(items) => Ok(items),
            Err(error) => {
                tracing::error!(collection = file, error = %error, "collection parse failed, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    fn write_collection<T: Serialize>(&self, file: &str, items: &[T]) -> AppResult<()> {
        fs::create_dir_all(&self.data_dir).map_err(|err| AppError::Io(err.to_string()))?;
        let raw = serde_json::to_string_pretty(items)?;
        fs::write(self.data_dir.join(file), raw).map_err(|err| AppError::Io(err.to_string()))?;
        Ok(())
    }
}

fn next_id(ids: impl Iterator<Item = i64>) -> i64 {
    ids.max().map_or(1, |max| max + 1)
}

impl Store for JsonStore {
    fn list_persons(&self) -> AppResult<Vec<Person>> {
        self.read_collection(PERSONS_FILE)
    }

    fn create_person(&self, name: &str, email: &str) -> AppResult<Person> {
        let mut persons: Vec<Person> = self.read_collection(PERSONS_FILE)?;
        let person = Person {
            id: next_id(persons.iter().map(|p| p.id)),
            name: name.trim().to_string(),
            email: email.trim().to_string(),
        };
        persons.push(person.clone());
        self.write_collection(PERSONS_FILE, &persons)?;
        Ok(person)
    }

    fn update_person(&self, id: i64, name: &str, email: &str) -> AppResult<Option<Person>> {
        let mut persons: Vec<Person> = self.read_collection(PERSONS_FILE)?;
        let Some(person) = persons.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        person.name = name.trim().to_string();
        person.email = email.trim().to_string();
        let updated = person.clone();
        self.write_collection(PERSONS_FILE, &persons)?;
        Ok(Some(updated))
    }

    fn delete_person(&self, id: i64) -> AppResult<Option<Person>> {
        let mut persons: Vec<Person> = self.read_collection(PERSONS_FILE)?;
        let Some(index) = persons.iter().position(|p| p.id == id) else {
            return Ok(None);
        };
        let deleted = persons.remove(index);
        self.write_collection(PERSONS_FILE, &persons)?;
        Ok(Some(deleted))
    }

    fn list_assignments(&self) -> AppResult<Vec<Assignment>> {
        self.read_collection(ASSIGNMENTS_FILE)
    }

    fn assignments_in_range(&self, start: NaiveDate, end: NaiveDate) -> AppResult<Vec<Assignment>> {
        let assignments: Vec<Assignment> = self.read_collection(ASSIGNMENTS_FILE)?;
        Ok(assignments
            .into_iter()
            .filter(|entry| entry.date >= start && entry.date <= end)
            .collect())
    }

    fn find_assignment(&self, person_id: i64, date: NaiveDate) -> AppResult<Option<Assignment>> {
        let assignments: Vec<Assignment> = self.read_collection(ASSIGNMENTS_FILE)?;
        Ok(assignments
            .into_iter()
            .find(|entry| entry.person_id == person_id && entry.date == date))
    }

    fn upsert_assignment(&self, person_id: i64, date: NaiveDate, location: &str) -> AppResult<Assignment> {
        let mut assignments: Vec<Assignment> = self.read_collection(ASSIGNMENTS_FILE)?;
        if let Some(existing) = assignments
            .iter_mut()
            .find(|entry| entry.person_id == person_id && entry.date == date)
        {
            existing.location = location.trim().to_string();
            let updated = existing.clone();
            self.write_collection(ASSIGNMENTS_FILE, &assignments)?;
            return Ok(updated);
        }
        let assignment = Assignment {
            id: next_id(assignments.iter().map(|entry| entry.id)),
            person_id,
            date,
            location: location.trim().to_string(),
        };
        assignments.push(assignment.clone());
        self.write_collection(ASSIGNMENTS_FILE, &assignments)?;
        Ok(assignment)
    }

    fn list_standard_locations(&self) -> AppResult<Vec<StandardLocation>> {
        self.read_collection(STANDARD_LOCATIONS_FILE)
    }

    fn create_standard_location(&self, name: &str) -> AppResult<StandardLocation> {
        let mut locations: Vec<StandardLocation> = self.read_collection(STANDARD_LOCATIONS_FILE)?;
        let location = StandardLocation {
            id: next_id(locations.iter().map(|entry| entry.id)),
            name: name.trim().to_string(),
        };
        locations.push(location.clone());
        self.write_collection(STANDARD_LOCATIONS_FILE, &locations)?;
        Ok(location)
    }

    fn update_standard_location(&self, id: i64, name: &str) -> AppResult<Option<StandardLocation>> {
        let mut locations: Vec<StandardLocation> = self.read_collection(STANDARD_LOCATIONS_FILE)?;
        let Some(location) = locations.iter_mut().find(|entry| entry.id == id) else {
            return Ok(None);
        };
        location.name = name.trim().to_string();
        let updated = location.clone();
        self.write_collection(STANDARD_LOCATIONS_FILE, &locations)?;
        Ok(Some(updated))
    }

    fn delete_standard_location(&self, id: i64) -> AppResult<Option<StandardLocation>> {
        let mut locations: Vec<StandardLocation> = self.read_collection(STANDARD_LOCATIONS_FILE)?;
        let Some(index) = locations.iter().position(|entry| entry.id == id) else {
            return Ok(None);
        };
        let deleted = locations.remove(index);
        self.write_collection(STANDARD_LOCATIONS_FILE, &locations)?;
        Ok(Some(deleted))
    }
}

#[cfg(test)]
mod tests {
    use super::super::{seed_standard_locations, Store, DEFAULT_STANDARD_LOCATIONS};
    use super::JsonStore;
    use chrono::NaiveDate;
    use std::fs;

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("test date")
    }

    #[test]
    fn person_ids_grow_from_one_and_survive_deletes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonStore::new(dir.path()).expect("store");

        let ada = store.create_person("Ada", "a@x.com").expect("create ada");
        assert_eq!(ada.id, 1);
        let grace = store.create_person("Grace", "g@x.com").expect("create grace");
        assert_eq!(grace.id, 2);

        let deleted = store.delete_person(1).expect("delete").expect("found");
        assert_eq!(deleted.name, "Ada");

        let remaining = store.list_persons().expect("list");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, 2);
    }

    #[test]
    fn delete_of_unknown_person_leaves_collection_unmodified() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonStore::new(dir.path()).expect("store");
        store.create_person("Ada", "a@x.com").expect("create");

        assert!(store.delete_person(42).expect("delete").is_none());
        assert_eq!(store.list_persons().expect("list").len(), 1);
    }

    #[test]
    fn upsert_inserts_then_overwrites_in_place() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonStore::new(dir.path()).expect("store");
        let day = date("2025-11-10");

        let created = store.upsert_assignment(1, day, "Stockholm Office").expect("insert");
        assert_eq!(created.id, 1);

        let updated = store.upsert_assignment(1, day, "Remote").expect("overwrite");
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.date, day);
        assert_eq!(updated.location, "Remote");
        assert_eq!(store.list_assignments().expect("list").len(), 1);

        let other_day = store
            .upsert_assignment(1, date("2025-11-11"), "Gothenburg Event")
            .expect("second insert");
        assert_eq!(other_day.id, 2);
        assert_eq!(store.list_assignments().expect("list").len(), 2);
    }

    #[test]
    fn range_upsert_covers_every_day_in_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonStore::new(dir.path()).expect("store");

        let results = store
            .upsert_assignment_range(3, date("2025-01-30"), date("2025-02-02"), "Tour")
            .expect("range upsert");
        let dates: Vec<_> = results.iter().map(|entry| entry.date).collect();
        assert_eq!(
            dates,
            vec![
                date("2025-01-30"),
                date("2025-01-31"),
                date("2025-02-01"),
                date("2025-02-02"),
            ]
        );
        assert_eq!(store.list_assignments().expect("list").len(), 4);

        // Re-running the range keeps ids and count stable.
        let again = store
            .upsert_assignment_range(3, date("2025-01-30"), date("2025-02-02"), "Venue B")
            .expect("second range upsert");
        assert_eq!(
            again.iter().map(|entry| entry.id).collect::<Vec<_>>(),
            results.iter().map(|entry| entry.id).collect::<Vec<_>>()
        );
        assert_eq!(store.list_assignments().expect("list").len(), 4);
        assert!(again.iter().all(|entry| entry.location == "Venue B"));
    }

    #[test]
    fn range_query_is_inclusive_on_both_ends() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonStore::new(dir.path()).expect("store");
        for (person_id, day) in [(1, "2025-11-09"), (1, "2025-11-10"), (2, "2025-11-11")] {
            store.upsert_assignment(person_id, date(day), "Somewhere").expect("seed");
        }

        let hits = store
            .assignments_in_range(date("2025-11-10"), date("2025-11-11"))
            .expect("query");
        let mut dates: Vec<_> = hits.iter().map(|entry| entry.date).collect();
        dates.sort();
        assert_eq!(dates, vec![date("2025-11-10"), date("2025-11-11")]);
    }

    #[test]
    fn corrupt_collection_file_reads_as_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonStore::new(dir.path()).expect("store");
        store.create_person("Ada", "a@x.com").expect("create");

        fs::write(dir.path().join("persons.json"), "{ not json").expect("corrupt");
        assert!(store.list_persons().expect("list").is_empty());
    }

    #[test]
    fn collections_are_persisted_as_separate_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonStore::new(dir.path()).expect("store");
        store.create_person("Ada", "a@x.com").expect("person");
        store.upsert_assignment(1, date("2025-11-10"), "Remote").expect("assignment");
        store.create_standard_location("Remote").expect("standard location");

        assert!(dir.path().join("persons.json").exists());
        assert!(dir.path().join("locations.json").exists());
        assert!(dir.path().join("standardLocations.json").exists());
    }

    #[test]
    fn names_are_trimmed_before_storage() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonStore::new(dir.path()).expect("store");

        let person = store.create_person("  Ada ", " a@x.com ").expect("person");
        assert_eq!(person.name, "Ada");
        assert_eq!(person.email, "a@x.com");

        let location = store.create_standard_location("  Remote ").expect("standard location");
        assert_eq!(location.name, "Remote");
    }

    #[test]
    fn seeding_runs_once_on_empty_collections() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonStore::new(dir.path()).expect("store");

        assert_eq!(
            seed_standard_locations(&store).expect("seed"),
            DEFAULT_STANDARD_LOCATIONS.len()
        );
        assert_eq!(seed_standard_locations(&store).expect("second seed"), 0);
        let names: Vec<_> = store
            .list_standard_locations()
            .expect("list")
            .into_iter()
            .map(|entry| entry.name)
            .collect();
        assert_eq!(names, DEFAULT_STANDARD_LOCATIONS);
    }
}
