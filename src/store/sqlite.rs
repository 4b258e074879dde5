use super::Store;
use crate::errors::{AppError, AppResult};
use crate::models::{Assignment, Person, StandardLocation};
use crate::schedule::days_inclusive;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::fs;
use std::path::Path;
use std::sync::Mutex;

const SCHEMA_SQL: &str = include_str!("schema.sql");

const UPSERT_ASSIGNMENT_SQL: &str = "INSERT INTO assignments (person_id, date, location) VALUES (?1, ?2, ?3)
     ON CONFLICT (person_id, date) DO UPDATE SET location = excluded.location
     RETURNING id, person_id, date, location";

#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| AppError::Io(err.to_string()))?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn parse_person_row(row: &Row<'_>) -> rusqlite::Result<Person> {
    Ok(Person {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
    })
}

fn parse_assignment_row(row: &Row<'_>) -> rusqlite::Result<Assignment> {
    Ok(Assignment {
        id: row.get(0)?,
        person_id: row.get(1)?,
        date: row.get(2)?,
        location: row.get(3)?,
    })
}

fn parse_standard_location_row(row: &Row<'_>) -> rusqlite::Result<StandardLocation> {
    Ok(StandardLocation {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

impl Store for SqliteStore {
    fn list_persons(&self) -> AppResult<Vec<Person>> {
        let conn = self.conn.lock().map_err(|_| AppError::Internal("store mutex poisoned".to_string()))?;
        let mut statement = conn.prepare("SELECT id, name, email FROM persons ORDER BY id ASC")?;
        let persons = statement
            .query_map([], parse_person_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(persons)
    }

    fn create_person(&self, name: &str, email: &str) -> AppResult<Person> {
        let conn = self.conn.lock().map_err(|_| AppError::Internal("store mutex poisoned".to_string()))?;
        conn.execute(
            "INSERT INTO persons (name, email) VALUES (?1, ?2)",
            params![name.trim(), email.trim()],
        )?;
        Ok(Person {
            id: conn.last_insert_rowid(),
            name: name.trim().to_string(),
            email: email.trim().to_string(),
        })
    }

    fn update_person(&self, id: i64, name: &str, email: &str) -> AppResult<Option<Person>> {
        let conn = self.conn.lock().map_err(|_| AppError::Internal("store mutex poisoned".to_string()))?;
        let changed = conn.execute(
            "UPDATE persons SET name = ?1, email = ?2 WHERE id = ?3",
            params![name.trim(), email.trim(), id],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        Ok(Some(Person {
            id,
            name: name.trim().to_string(),
            email: email.trim().to_string(),
        }))
    }

    fn delete_person(&self, id: i64) -> AppResult<Option<Person>> {
        let conn = self.conn.lock().map_err(|_| AppError::Internal("store mutex poisoned".to_string()))?;
        let person = conn
            .query_row(
                "SELECT id, name, email FROM persons WHERE id = ?1",
                [id],
                parse_person_row,
            )
            .optional()?;
        let Some(person) = person else {
            return Ok(None);
        };
        conn.execute("DELETE FROM persons WHERE id = ?1", [id])?;
        Ok(Some(person))
    }

    fn list_assignments(&self) -> AppResult<Vec<Assignment>> {
        let conn = self.conn.lock().map_err(|_| AppError::Internal("store mutex poisoned".to_string()))?;
        let mut statement =
            conn.prepare("SELECT id, person_id, date, location FROM assignments ORDER BY id ASC")?;
        let assignments = statement
            .query_map([], parse_assignment_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(assignments)
    }

    fn assignments_in_range(&self, start: NaiveDate, end: NaiveDate) -> AppResult<Vec<Assignment>> {
        let conn = self.conn.lock().map_err(|_| AppError::Internal("store mutex poisoned".to_string()))?;
        let mut statement = conn.prepare(
            "SELECT id, person_id, date, location FROM assignments
             WHERE date >= ?1 AND date <= ?2 ORDER BY id ASC",
        )?;
        let assignments = statement
            .query_map(params![start, end], parse_assignment_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(assignments)
    }

    fn find_assignment(&self, person_id: i64, date: NaiveDate) -> AppResult<Option<Assignment>> {
        let conn = self.conn.lock().map_err(|_| AppError::Internal("store mutex poisoned".to_string()))?;
        conn.query_row(
            "SELECT id, person_id, date, location FROM assignments
             WHERE person_id = ?1 AND date = ?2",
            params![person_id, date],
            parse_assignment_row,
        )
        .optional()
        .map_err(AppError::from)
    }

    fn upsert_assignment(&self, person_id: i64, date: NaiveDate, location: &str) -> AppResult<Assignment> {
        let conn = self.conn.lock().map_err(|_| AppError::Internal("store mutex poisoned".to_string()))?;
        let assignment = conn.query_row(
            UPSERT_ASSIGNMENT_SQL,
            params![person_id, date, location.trim()],
            parse_assignment_row,
        )?;
        Ok(assignment)
    }

    // The whole range commits or none of it does.
    fn upsert_assignment_range(
        &self,
        person_id: i64,
        start: NaiveDate,
        end: NaiveDate,
        location: &str,
    ) -> AppResult<Vec<Assignment>> {
        let mut conn = self.conn.lock().map_err(|_| AppError::Internal("store mutex poisoned".to_string()))?;
        let tx = conn.transaction()?;
        let mut results = Vec::new();
        for date in days_inclusive(start, end) {
            let assignment = tx.query_row(
                UPSERT_ASSIGNMENT_SQL,
                params![person_id, date, location.trim()],
                parse_assignment_row,
            )?;
            results.push(assignment);
        }
        tx.commit()?;
        Ok(results)
    }

    fn list_standard_locations(&self) -> AppResult<Vec<StandardLocation>> {
        let conn = self.conn.lock().map_err(|_| AppError::Internal("store mutex poisoned".to_string()))?;
        let mut statement = conn.prepare("SELECT id, name FROM standard_locations ORDER BY id ASC")?;
        let locations = statement
            .query_map([], parse_standard_location_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(locations)
    }

    fn create_standard_location(&self, name: &str) -> AppResult<StandardLocation> {
        let conn = self.conn.lock().map_err(|_| AppError::Internal("store mutex poisoned".to_string()))?;
        conn.execute(
            "INSERT INTO standard_locations (name) VALUES (?1)",
            [name.trim()],
        )?;
        Ok(StandardLocation {
            id: conn.last_insert_rowid(),
            name: name.trim().to_string(),
        })
    }

    fn update_standard_location(&self, id: i64, name: &str) -> AppResult<Option<StandardLocation>> {
        let conn = self.conn.lock().map_err(|_| AppError::Internal("store mutex poisoned".to_string()))?;
        let changed = conn.execute(
            "UPDATE standard_locations SET name = ?1 WHERE id = ?2",
            params![name.trim(), id],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        Ok(Some(StandardLocation {
            id,
            name: name.trim().to_string(),
        }))
    }

    fn delete_standard_location(&self, id: i64) -> AppResult<Option<StandardLocation>> {
        let conn = self.conn.lock().map_err(|_| AppError::Internal("store mutex poisoned".to_string()))?;
        let location = conn
            .query_row(
                "SELECT id, name FROM standard_locations WHERE id = ?1",
                [id],
                parse_standard_location_row,
            )
            .optional()?;
        let Some(location) = location else {
            return Ok(None);
        };
        conn.execute("DELETE FROM standard_locations WHERE id = ?1", [id])?;
        Ok(Some(location))
    }
}
