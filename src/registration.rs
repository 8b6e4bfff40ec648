//! Patient registration and appointment booking.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::{Connection, TransactionBehavior};
use serde::Serialize;

use crate::db;
use crate::error::ClinicError;
use crate::models::{
    Appointment, AppointmentCodeScheme, AppointmentStatus, NewAppointment, NewPatient, NewVisit,
    Patient, Sex,
};
use crate::numbering;

/// Result of booking: the appointment and the visit opened with it.
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentBooking {
    pub appointment: Appointment,
    pub visit_id: i64,
}

fn required<'a>(value: &'a str, field: &str) -> Result<&'a str, ClinicError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ClinicError::Validation(format!("{field} is required")));
    }
    Ok(value)
}

fn optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn parse_date(value: &str, field: &str) -> Result<NaiveDate, ClinicError> {
    NaiveDate::parse_from_str(required(value, field)?, "%Y-%m-%d")
        .map_err(|_| ClinicError::Validation(format!("{field} must be a date in YYYY-MM-DD format")))
}

fn parse_time(value: &str, field: &str) -> Result<NaiveTime, ClinicError> {
    let value = required(value, field)?;
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| ClinicError::Validation(format!("{field} must be a time in HH:MM format")))
}

// ---------------------------------------------------------------------------
// Patients
// ---------------------------------------------------------------------------

/// Register a patient. The record number is drawn from the counter of
/// `today` inside the same transaction as the insert.
pub fn register_patient(
    conn: &Connection,
    form: &NewPatient,
    today: NaiveDate,
) -> Result<Patient, ClinicError> {
    let full_name = required(&form.full_name, "full_name")?.to_string();
    let birth_date = parse_date(&form.birth_date, "birth_date")?;
    if birth_date > today {
        return Err(ClinicError::Validation(
            "birth_date cannot be in the future".into(),
        ));
    }
    let sex = Sex::from_str(form.sex.trim())
        .map_err(|_| ClinicError::Validation("sex must be L or P".into()))?;

    let patient = db::with_transaction(conn, TransactionBehavior::Immediate, "register_patient", |tx| {
        let patient = Patient {
            record_number: numbering::next_record_number(tx, today)?,
            national_id: optional(&form.national_id),
            full_name,
            birth_date,
            sex,
            address: optional(&form.address),
            phone: optional(&form.phone),
            email: optional(&form.email),
        };
        db::insert_patient(tx, &patient)?;
        Ok::<_, ClinicError>(patient)
    })?;

    tracing::info!(record_number = %patient.record_number, "Patient registered");
    Ok(patient)
}

// ---------------------------------------------------------------------------
// Appointments
// ---------------------------------------------------------------------------

/// Book an appointment and open its visit together.
pub fn create_appointment(
    conn: &Connection,
    form: &NewAppointment,
    scheme: AppointmentCodeScheme,
    now: NaiveDateTime,
) -> Result<AppointmentBooking, ClinicError> {
    let record_number = required(&form.patient_record_number, "patient_record_number")?;
    let doctor_id = form
        .doctor_id
        .ok_or_else(|| ClinicError::Validation("doctor_id is required".into()))?;
    let date = parse_date(&form.date, "date")?;
    let time = parse_time(&form.time, "time")?;
    let appointment_type = required(&form.appointment_type, "type")?;
    let poli = required(&form.poli, "poli")?;

    if db::get_patient(conn, record_number)?.is_none() {
        return Err(ClinicError::not_found("Patient", record_number));
    }
    if !db::doctor_exists(conn, doctor_id)? {
        return Err(ClinicError::not_found("Doctor", doctor_id));
    }

    let booking = db::with_transaction(conn, TransactionBehavior::Immediate, "create_appointment", |tx| {
        let appointment = Appointment {
            code: scheme.next_code(tx, poli, date, now)?,
            patient_record_number: record_number.to_string(),
            doctor_id,
            date,
            time,
            appointment_type: appointment_type.to_string(),
            status: AppointmentStatus::Scheduled,
            poli: poli.to_string(),
            notes: optional(&form.notes),
        };
        db::insert_appointment(tx, &appointment)?;

        let visit_id = db::insert_visit(
            tx,
            &NewVisit {
                appointment_code: Some(appointment.code.clone()),
                patient_record_number: appointment.patient_record_number.clone(),
                doctor_id: Some(doctor_id),
                visit_date: date,
                visit_time: time,
                complaint: optional(&form.complaint),
                notes: appointment.notes.clone(),
            },
        )?;
        Ok::<_, ClinicError>(AppointmentBooking {
            appointment,
            visit_id,
        })
    })?;

    tracing::info!(
        code = %booking.appointment.code,
        visit_id = booking.visit_id,
        scheme = %scheme,
        "Appointment booked"
    );
    Ok(booking)
}

/// `scheduled → examined`.
pub fn check_in(conn: &Connection, code: &str) -> Result<Appointment, ClinicError> {
    transition(conn, code, AppointmentStatus::Scheduled, AppointmentStatus::Examined)
}

/// `examined → scheduled`.
pub fn reactivate(conn: &Connection, code: &str) -> Result<Appointment, ClinicError> {
    transition(conn, code, AppointmentStatus::Examined, AppointmentStatus::Scheduled)
}

fn transition(
    conn: &Connection,
    code: &str,
    from: AppointmentStatus,
    to: AppointmentStatus,
) -> Result<Appointment, ClinicError> {
    let current = db::get_appointment(conn, code)?
        .ok_or_else(|| ClinicError::not_found("Appointment", code))?;

    if db::transition_appointment_status(conn, code, from, to)? == 0 {
        return Err(ClinicError::Conflict(format!(
            "Appointment {code} is {}, expected {from}",
            current.status
        )));
    }

    tracing::info!(code, %from, %to, "Appointment status changed");
    db::get_appointment(conn, code)?.ok_or_else(|| ClinicError::not_found("Appointment", code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    fn now() -> NaiveDateTime {
        today().and_hms_opt(8, 30, 0).unwrap()
    }

    fn patient_form() -> NewPatient {
        NewPatient {
            national_id: Some("3171000000000001".into()),
            full_name: "  Siti Aminah ".into(),
            birth_date: "1985-02-03".into(),
            sex: "P".into(),
            address: Some("".into()),
            phone: Some("0812".into()),
            email: None,
        }
    }

    fn appointment_form(record_number: &str, doctor_id: i64) -> NewAppointment {
        NewAppointment {
            patient_record_number: record_number.into(),
            doctor_id: Some(doctor_id),
            date: "2025-01-02".into(),
            time: "09:30".into(),
            appointment_type: "umum".into(),
            poli: "umum".into(),
            notes: None,
            complaint: Some("Batuk".into()),
        }
    }

    #[test]
    fn registers_with_generated_record_number() {
        let conn = open_memory_database().unwrap();
        let first = register_patient(&conn, &patient_form(), today()).unwrap();
        let second = register_patient(&conn, &patient_form(), today()).unwrap();

        assert_eq!(first.record_number, "RM202501010001");
        assert_eq!(second.record_number, "RM202501010002");
        assert_eq!(first.full_name, "Siti Aminah");
        assert_eq!(first.address, None);
        assert_eq!(db::get_patient(&conn, "RM202501010001").unwrap().unwrap(), first);
    }

    #[test]
    fn registration_validation() {
        let conn = open_memory_database().unwrap();
        let cases = [
            NewPatient { full_name: " ".into(), ..patient_form() },
            NewPatient { birth_date: "03/02/1985".into(), ..patient_form() },
            NewPatient { birth_date: "2030-01-01".into(), ..patient_form() },
            NewPatient { sex: "X".into(), ..patient_form() },
        ];
        for form in cases {
            assert!(matches!(
                register_patient(&conn, &form, today()),
                Err(ClinicError::Validation(_))
            ));
        }
        assert_eq!(db::get_date_counter(&conn, today()).unwrap(), None);
    }

    #[test]
    fn booking_creates_appointment_and_visit() {
        let conn = open_memory_database().unwrap();
        let patient = register_patient(&conn, &patient_form(), today()).unwrap();
        let doctor = db::insert_doctor(&conn, "dr. Andi").unwrap();

        let booking = create_appointment(
            &conn,
            &appointment_form(&patient.record_number, doctor),
            AppointmentCodeScheme::Daily,
            now(),
        )
        .unwrap();

        assert_eq!(booking.appointment.code, "A202501020001");
        assert_eq!(booking.appointment.status, AppointmentStatus::Scheduled);
        let visit = db::get_visit(&conn, booking.visit_id).unwrap().unwrap();
        assert_eq!(visit.appointment_code.as_deref(), Some("A202501020001"));
        assert_eq!(visit.complaint.as_deref(), Some("Batuk"));

        let second = create_appointment(
            &conn,
            &appointment_form(&patient.record_number, doctor),
            AppointmentCodeScheme::Daily,
            now(),
        )
        .unwrap();
        assert_eq!(second.appointment.code, "A202501020002");
    }

    #[test]
    fn booking_with_poli_codes() {
        let conn = open_memory_database().unwrap();
        let patient = register_patient(&conn, &patient_form(), today()).unwrap();
        let doctor = db::insert_doctor(&conn, "dr. Andi").unwrap();
        let booking = create_appointment(
            &conn,
            &appointment_form(&patient.record_number, doctor),
            AppointmentCodeScheme::Poli,
            now(),
        )
        .unwrap();
        assert!(booking.appointment.code.starts_with("APP-UMUM-20250102"));
    }

    #[test]
    fn booking_requires_known_patient_and_doctor() {
        let conn = open_memory_database().unwrap();
        let patient = register_patient(&conn, &patient_form(), today()).unwrap();
        let doctor = db::insert_doctor(&conn, "dr. Andi").unwrap();

        let result = create_appointment(
            &conn,
            &appointment_form("RM209901010001", doctor),
            AppointmentCodeScheme::Daily,
            now(),
        );
        assert!(matches!(result, Err(ClinicError::NotFound { entity: "Patient", .. })));

        let result = create_appointment(
            &conn,
            &appointment_form(&patient.record_number, doctor + 1),
            AppointmentCodeScheme::Daily,
            now(),
        );
        assert!(matches!(result, Err(ClinicError::NotFound { entity: "Doctor", .. })));

        let mut form = appointment_form(&patient.record_number, doctor);
        form.time = "9.30".into();
        assert!(matches!(
            create_appointment(&conn, &form, AppointmentCodeScheme::Daily, now()),
            Err(ClinicError::Validation(_))
        ));
    }

    #[test]
    fn status_transitions() {
        let conn = open_memory_database().unwrap();
        let patient = register_patient(&conn, &patient_form(), today()).unwrap();
        let doctor = db::insert_doctor(&conn, "dr. Andi").unwrap();
        let code = create_appointment(
            &conn,
            &appointment_form(&patient.record_number, doctor),
            AppointmentCodeScheme::Daily,
            now(),
        )
        .unwrap()
        .appointment
        .code;

        assert!(matches!(reactivate(&conn, &code), Err(ClinicError::Conflict(_))));
        assert_eq!(check_in(&conn, &code).unwrap().status, AppointmentStatus::Examined);
        assert!(matches!(check_in(&conn, &code), Err(ClinicError::Conflict(_))));
        assert_eq!(reactivate(&conn, &code).unwrap().status, AppointmentStatus::Scheduled);
        assert!(matches!(
            check_in(&conn, "A209901010001"),
            Err(ClinicError::NotFound { .. })
        ));
    }
}
