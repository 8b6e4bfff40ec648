use chrono::{NaiveDate, NaiveTime};
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::{NewVisit, Visit, Vitals};

/// Insert a visit and return its id.
pub fn insert_visit(conn: &Connection, visit: &NewVisit) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO visits (appointment_code, patient_record_number, doctor_id, visit_date,
         visit_time, complaint, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            visit.appointment_code,
            visit.patient_record_number,
            visit.doctor_id,
            visit.visit_date.to_string(),
            visit.visit_time.format("%H:%M:%S").to_string(),
            visit.complaint,
            visit.notes,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_visit(conn: &Connection, visit_id: i64) -> Result<Option<Visit>, DatabaseError> {
    let visit = conn
        .query_row(
            "SELECT id, appointment_code, patient_record_number, doctor_id, visit_date, visit_time,
                    complaint, notes, height, weight, heart_rate, blood_sugar, temperature
             FROM visits WHERE id = ?1",
            params![visit_id],
            row_to_visit,
        )
        .optional()?;
    Ok(visit)
}

pub fn visit_exists(conn: &Connection, visit_id: i64) -> Result<bool, DatabaseError> {
    let found = conn
        .query_row("SELECT 1 FROM visits WHERE id = ?1", params![visit_id], |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}

/// Overwrite the vitals of a visit.
pub fn update_visit_vitals(
    conn: &Connection,
    visit_id: i64,
    vitals: &Vitals,
) -> Result<(), DatabaseError> {
    let affected = conn.execute(
        "UPDATE visits
         SET height = ?1, weight = ?2, heart_rate = ?3, blood_sugar = ?4, temperature = ?5
         WHERE id = ?6",
        params![
            vitals.height,
            vitals.weight,
            vitals.heart_rate,
            vitals.blood_sugar,
            vitals.temperature,
            visit_id,
        ],
    )?;
    if affected == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "visit".into(),
            id: visit_id.to_string(),
        });
    }
    Ok(())
}

fn row_to_visit(row: &rusqlite::Row) -> Result<Visit, rusqlite::Error> {
    let date_str: String = row.get(4)?;
    let time_str: String = row.get(5)?;
    Ok(Visit {
        id: row.get(0)?,
        appointment_code: row.get(1)?,
        patient_record_number: row.get(2)?,
        doctor_id: row.get(3)?,
        visit_date: NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").unwrap_or_default(),
        visit_time: NaiveTime::parse_from_str(&time_str, "%H:%M:%S").unwrap_or_default(),
        complaint: row.get(6)?,
        notes: row.get(7)?,
        vitals: Vitals {
            height: row.get(8)?,
            weight: row.get(9)?,
            heart_rate: row.get(10)?,
            blood_sugar: row.get(11)?,
            temperature: row.get(12)?,
        },
    })
}
