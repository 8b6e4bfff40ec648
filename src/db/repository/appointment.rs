use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::{Appointment, AppointmentStatus};

pub fn insert_appointment(conn: &Connection, appt: &Appointment) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO appointments (code, patient_record_number, doctor_id, appointment_date,
         appointment_time, appointment_type, status, poli, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            appt.code,
            appt.patient_record_number,
            appt.doctor_id,
            appt.date.to_string(),
            appt.time.format("%H:%M").to_string(),
            appt.appointment_type,
            appt.status.as_str(),
            appt.poli,
            appt.notes,
        ],
    )?;
    Ok(())
}

pub fn get_appointment(conn: &Connection, code: &str) -> Result<Option<Appointment>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT code, patient_record_number, doctor_id, appointment_date, appointment_time,
                    appointment_type, status, poli, notes
             FROM appointments WHERE code = ?1",
            params![code],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, String>(7)?,
                    row.get::<_, Option<String>>(8)?,
                ))
            },
        )
        .optional()?;

    let Some((code, patient, doctor_id, date, time, appointment_type, status, poli, notes)) = row
    else {
        return Ok(None);
    };

    Ok(Some(Appointment {
        code,
        patient_record_number: patient,
        doctor_id,
        date: NaiveDate::parse_from_str(&date, "%Y-%m-%d").unwrap_or_default(),
        time: NaiveTime::parse_from_str(&time, "%H:%M").unwrap_or_default(),
        appointment_type,
        status: AppointmentStatus::from_str(&status)?,
        poli,
        notes,
    }))
}

/// Move an appointment from `from` to `to`. Returns rows affected: 0 when
/// the appointment is missing or not in `from`.
pub fn transition_appointment_status(
    conn: &Connection,
    code: &str,
    from: AppointmentStatus,
    to: AppointmentStatus,
) -> Result<usize, DatabaseError> {
    let affected = conn.execute(
        "UPDATE appointments SET status = ?1 WHERE code = ?2 AND status = ?3",
        params![to.as_str(), code, from.as_str()],
    )?;
    Ok(affected)
}

/// Highest existing code starting with `prefix`.
pub fn get_max_code_with_prefix(
    conn: &Connection,
    prefix: &str,
) -> Result<Option<String>, DatabaseError> {
    let pattern = format!("{prefix}%");
    let code = conn.query_row(
        "SELECT MAX(code) FROM appointments WHERE code LIKE ?1",
        params![pattern],
        |row| row.get::<_, Option<String>>(0),
    )?;
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{insert_doctor, insert_patient};
    use crate::db::sqlite::open_memory_database;
    use crate::models::{Patient, Sex};

    fn seed(conn: &Connection) -> i64 {
        insert_patient(
            conn,
            &Patient {
                record_number: "RM202501010001".into(),
                national_id: None,
                full_name: "Siti".into(),
                birth_date: NaiveDate::from_ymd_opt(1985, 2, 3).unwrap(),
                sex: Sex::Female,
                address: None,
                phone: None,
                email: None,
            },
        )
        .unwrap();
        insert_doctor(conn, "dr. Andi").unwrap()
    }

    fn make_appointment(code: &str, doctor_id: i64) -> Appointment {
        Appointment {
            code: code.into(),
            patient_record_number: "RM202501010001".into(),
            doctor_id,
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            appointment_type: "umum".into(),
            status: AppointmentStatus::Scheduled,
            poli: "UMUM".into(),
            notes: None,
        }
    }

    #[test]
    fn insert_and_retrieve() {
        let conn = open_memory_database().unwrap();
        let doctor = seed(&conn);
        let appt = make_appointment("A202501010001", doctor);
        insert_appointment(&conn, &appt).unwrap();
        assert_eq!(get_appointment(&conn, "A202501010001").unwrap().unwrap(), appt);
    }

    #[test]
    fn transition_only_from_expected_status() {
        let conn = open_memory_database().unwrap();
        let doctor = seed(&conn);
        insert_appointment(&conn, &make_appointment("A202501010001", doctor)).unwrap();

        let moved = transition_appointment_status(
            &conn,
            "A202501010001",
            AppointmentStatus::Examined,
            AppointmentStatus::Scheduled,
        )
        .unwrap();
        assert_eq!(moved, 0);

        let moved = transition_appointment_status(
            &conn,
            "A202501010001",
            AppointmentStatus::Scheduled,
            AppointmentStatus::Examined,
        )
        .unwrap();
        assert_eq!(moved, 1);
    }

    #[test]
    fn max_code_respects_prefix() {
        let conn = open_memory_database().unwrap();
        let doctor = seed(&conn);
        assert_eq!(get_max_code_with_prefix(&conn, "A20250101").unwrap(), None);
        insert_appointment(&conn, &make_appointment("A202501010001", doctor)).unwrap();
        insert_appointment(&conn, &make_appointment("A202501010002", doctor)).unwrap();
        insert_appointment(&conn, &make_appointment("A202501020001", doctor)).unwrap();
        assert_eq!(
            get_max_code_with_prefix(&conn, "A20250101").unwrap().as_deref(),
            Some("A202501010002")
        );
    }
}
