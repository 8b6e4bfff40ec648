//! Reference-data lookups used when resolving visit line items.
//! Soft-deleted catalog rows never resolve.

use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::{DiagnosisEntry, Medicine};

pub fn get_medicine(conn: &Connection, id: i64) -> Result<Option<Medicine>, DatabaseError> {
    let medicine = conn
        .query_row(
            "SELECT id, name, unit, stock FROM medicines WHERE id = ?1 AND is_deleted = 0",
            params![id],
            row_to_medicine,
        )
        .optional()?;
    Ok(medicine)
}

/// Resolve a medicine by display name. Lowest id wins on duplicates.
pub fn find_medicine_by_name(
    conn: &Connection,
    name: &str,
) -> Result<Option<Medicine>, DatabaseError> {
    let medicine = conn
        .query_row(
            "SELECT id, name, unit, stock FROM medicines
             WHERE name = ?1 AND is_deleted = 0
             ORDER BY id ASC LIMIT 1",
            params![name],
            row_to_medicine,
        )
        .optional()?;
    Ok(medicine)
}

pub fn service_exists(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    let found = conn
        .query_row(
            "SELECT 1 FROM services WHERE id = ?1 AND is_deleted = 0",
            params![id],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

pub fn find_service_id_by_name(conn: &Connection, name: &str) -> Result<Option<i64>, DatabaseError> {
    let id = conn
        .query_row(
            "SELECT id FROM services WHERE name = ?1 AND is_deleted = 0 ORDER BY id ASC LIMIT 1",
            params![name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

pub fn get_diagnosis(conn: &Connection, id: i64) -> Result<Option<DiagnosisEntry>, DatabaseError> {
    let entry = conn
        .query_row(
            "SELECT id, code, name FROM diagnoses WHERE id = ?1 AND is_deleted = 0",
            params![id],
            row_to_diagnosis,
        )
        .optional()?;
    Ok(entry)
}

/// Resolve a diagnosis by its picker label `"<code> - <name>"`.
pub fn find_diagnosis_by_label(
    conn: &Connection,
    label: &str,
) -> Result<Option<DiagnosisEntry>, DatabaseError> {
    let entry = conn
        .query_row(
            "SELECT id, code, name FROM diagnoses
             WHERE code || ' - ' || name = ?1 AND is_deleted = 0
             ORDER BY id ASC LIMIT 1",
            params![label],
            row_to_diagnosis,
        )
        .optional()?;
    Ok(entry)
}

pub fn doctor_exists(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    let found = conn
        .query_row(
            "SELECT 1 FROM doctors WHERE id = ?1 AND is_deleted = 0",
            params![id],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

pub fn insert_doctor(conn: &Connection, name: &str) -> Result<i64, DatabaseError> {
    conn.execute("INSERT INTO doctors (name) VALUES (?1)", params![name])?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_medicine(conn: &Connection, name: &str, stock: i64) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO medicines (name, stock) VALUES (?1, ?2)",
        params![name, stock],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_service(conn: &Connection, name: &str) -> Result<i64, DatabaseError> {
    conn.execute("INSERT INTO services (name) VALUES (?1)", params![name])?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_diagnosis(conn: &Connection, code: &str, name: &str) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO diagnoses (code, name) VALUES (?1, ?2)",
        params![code, name],
    )?;
    Ok(conn.last_insert_rowid())
}

fn row_to_medicine(row: &rusqlite::Row) -> Result<Medicine, rusqlite::Error> {
    Ok(Medicine {
        id: row.get(0)?,
        name: row.get(1)?,
        unit: row.get(2)?,
        stock: row.get(3)?,
    })
}

fn row_to_diagnosis(row: &rusqlite::Row) -> Result<DiagnosisEntry, rusqlite::Error> {
    Ok(DiagnosisEntry {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
    })
}
