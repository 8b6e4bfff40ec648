use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;

/// Increment the counter for `date` and return the new value.
///
/// Single statement: creates the row at 1 or bumps it, so two callers can
/// never observe the same value.
pub fn increment_date_counter(conn: &Connection, date: NaiveDate) -> Result<i64, DatabaseError> {
    let value = conn.query_row(
        "INSERT INTO date_counters (counter_date, counter) VALUES (?1, 1)
         ON CONFLICT(counter_date) DO UPDATE SET counter = counter + 1
         RETURNING counter",
        params![date.to_string()],
        |row| row.get(0),
    )?;
    Ok(value)
}

/// Current counter for `date`, if any number was issued that day.
pub fn get_date_counter(conn: &Connection, date: NaiveDate) -> Result<Option<i64>, DatabaseError> {
    let value = conn
        .query_row(
            "SELECT counter FROM date_counters WHERE counter_date = ?1",
            params![date.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn counter_starts_at_one_and_increments() {
        let conn = open_memory_database().unwrap();
        let day = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert_eq!(get_date_counter(&conn, day).unwrap(), None);
        assert_eq!(increment_date_counter(&conn, day).unwrap(), 1);
        assert_eq!(increment_date_counter(&conn, day).unwrap(), 2);
        assert_eq!(get_date_counter(&conn, day).unwrap(), Some(2));
    }

    #[test]
    fn counters_are_per_date() {
        let conn = open_memory_database().unwrap();
        let d1 = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        increment_date_counter(&conn, d1).unwrap();
        increment_date_counter(&conn, d1).unwrap();
        assert_eq!(increment_date_counter(&conn, d2).unwrap(), 1);
    }
}
