use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::{Patient, Sex};

pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients (record_number, national_id, full_name, birth_date, sex, address, phone, email)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            patient.record_number,
            patient.national_id,
            patient.full_name,
            patient.birth_date.to_string(),
            patient.sex.as_str(),
            patient.address,
            patient.phone,
            patient.email,
        ],
    )?;
    Ok(())
}

/// Get a patient by record number. Soft-deleted patients are not returned.
pub fn get_patient(
    conn: &Connection,
    record_number: &str,
) -> Result<Option<Patient>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT record_number, national_id, full_name, birth_date, sex, address, phone, email
             FROM patients
             WHERE record_number = ?1 AND is_deleted = 0",
            params![record_number],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, Option<String>>(6)?,
                    row.get::<_, Option<String>>(7)?,
                ))
            },
        )
        .optional()?;

    let Some((record_number, national_id, full_name, birth, sex, address, phone, email)) = row
    else {
        return Ok(None);
    };

    Ok(Some(Patient {
        record_number,
        national_id,
        full_name,
        birth_date: NaiveDate::parse_from_str(&birth, "%Y-%m-%d").unwrap_or_default(),
        sex: Sex::from_str(&sex)?,
        address,
        phone,
        email,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn make_patient(record_number: &str) -> Patient {
        Patient {
            record_number: record_number.into(),
            national_id: Some("3201010101010001".into()),
            full_name: "Budi Santoso".into(),
            birth_date: NaiveDate::from_ymd_opt(1990, 5, 17).unwrap(),
            sex: Sex::Male,
            address: Some("Jl. Merdeka 1".into()),
            phone: None,
            email: None,
        }
    }

    #[test]
    fn insert_and_retrieve() {
        let conn = open_memory_database().unwrap();
        let patient = make_patient("RM202501010001");
        insert_patient(&conn, &patient).unwrap();
        let found = get_patient(&conn, "RM202501010001").unwrap().unwrap();
        assert_eq!(found, patient);
    }

    #[test]
    fn duplicate_record_number_rejected() {
        let conn = open_memory_database().unwrap();
        insert_patient(&conn, &make_patient("RM202501010001")).unwrap();
        assert!(insert_patient(&conn, &make_patient("RM202501010001")).is_err());
    }

    #[test]
    fn soft_deleted_patient_hidden() {
        let conn = open_memory_database().unwrap();
        insert_patient(&conn, &make_patient("RM202501010001")).unwrap();
        conn.execute("UPDATE patients SET is_deleted = 1", []).unwrap();
        assert!(get_patient(&conn, "RM202501010001").unwrap().is_none());
    }
}
