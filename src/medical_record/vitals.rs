//! Vitals capture for a visit.
//!
//! Forms arrive with numbers or numeric strings. Validation stops at the
//! first failing field, checked in a fixed order.

use chrono::NaiveDateTime;
use rusqlite::{Connection, TransactionBehavior};
use serde::Deserialize;

use crate::db;
use crate::error::ClinicError;
use crate::models::{NewVisit, Visit, Vitals};

/// A form field sent either as a JSON number or as text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FormValue {
    Number(f64),
    Text(String),
}

impl FormValue {
    /// Finite numeric value, if the field holds one.
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            FormValue::Number(n) => *n,
            FormValue::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }

    /// Text that is empty after trimming; HTML forms send unset fields this way.
    pub fn is_blank(&self) -> bool {
        matches!(self, FormValue::Text(s) if s.trim().is_empty())
    }

    /// Whole-number value, used for ids.
    pub fn as_id(&self) -> Option<i64> {
        match self {
            FormValue::Number(n) if n.fract() == 0.0 => Some(*n as i64),
            FormValue::Text(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VitalsForm {
    pub visit_id: Option<FormValue>,
    pub patient_record_number: Option<String>,
    pub height: Option<FormValue>,
    pub weight: Option<FormValue>,
    pub heart_rate: Option<FormValue>,
    pub blood_sugar: Option<FormValue>,
    pub temperature: Option<FormValue>,
}

struct VitalRule {
    label: &'static str,
    min: f64,
    max: f64,
}

const HEIGHT: VitalRule = VitalRule { label: "Tinggi badan (cm)", min: 50.0, max: 250.0 };
const WEIGHT: VitalRule = VitalRule { label: "Berat badan (kg)", min: 1.0, max: 300.0 };
const HEART_RATE: VitalRule = VitalRule { label: "Detak jantung (bpm)", min: 30.0, max: 200.0 };
const BLOOD_SUGAR: VitalRule = VitalRule { label: "Gula darah (mg/dL)", min: 20.0, max: 600.0 };
const TEMPERATURE: VitalRule = VitalRule { label: "Suhu tubuh (°C)", min: 32.0, max: 43.0 };

impl VitalRule {
    fn check(&self, field: Option<&FormValue>) -> Result<f64, ClinicError> {
        let value = field
            .and_then(FormValue::as_number)
            .ok_or_else(|| ClinicError::Validation(format!("{} is required", self.label)))?;
        if value <= 0.0 {
            return Err(ClinicError::Validation(format!(
                "{} must be greater than 0",
                self.label
            )));
        }
        if value < self.min || value > self.max {
            return Err(ClinicError::Validation(format!(
                "{} must be between {} and {}",
                self.label, self.min, self.max
            )));
        }
        Ok(value)
    }
}

/// Validate all five vitals. Every field is required; the first failure is
/// reported.
pub fn validate_vitals(form: &VitalsForm) -> Result<Vitals, ClinicError> {
    Ok(Vitals {
        height: Some(HEIGHT.check(form.height.as_ref())?),
        weight: Some(WEIGHT.check(form.weight.as_ref())?),
        heart_rate: Some(HEART_RATE.check(form.heart_rate.as_ref())?),
        blood_sugar: Some(BLOOD_SUGAR.check(form.blood_sugar.as_ref())?),
        temperature: Some(TEMPERATURE.check(form.temperature.as_ref())?),
    })
}

/// Validate and store vitals.
///
/// With a `visit_id` the visit's vitals are overwritten. Without one, a
/// patient record number opens a new visit dated `now` and the vitals are
/// attached to it in the same transaction.
pub fn edit_vitals(
    conn: &Connection,
    form: &VitalsForm,
    now: NaiveDateTime,
) -> Result<Visit, ClinicError> {
    let vitals = validate_vitals(form)?;

    let visit_id = match form.visit_id.as_ref().filter(|raw| !raw.is_blank()) {
        Some(raw) => Some(
            raw.as_id()
                .ok_or_else(|| ClinicError::Validation("visit_id must be a number".into()))?,
        ),
        None => None,
    };
    let record_number = form
        .patient_record_number
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let visit_id = match (visit_id, record_number) {
        (Some(visit_id), _) => {
            if !db::visit_exists(conn, visit_id)? {
                return Err(ClinicError::not_found("Visit", visit_id));
            }
            db::update_visit_vitals(conn, visit_id, &vitals)?;
            visit_id
        }
        (None, Some(record_number)) => {
            if db::get_patient(conn, record_number)?.is_none() {
                return Err(ClinicError::not_found("Patient", record_number));
            }
            db::with_transaction(conn, TransactionBehavior::Immediate, "edit_vitals", |tx| {
                let visit_id = db::insert_visit(
                    tx,
                    &NewVisit {
                        appointment_code: None,
                        patient_record_number: record_number.to_string(),
                        doctor_id: None,
                        visit_date: now.date(),
                        visit_time: now.time(),
                        complaint: None,
                        notes: None,
                    },
                )?;
                db::update_visit_vitals(tx, visit_id, &vitals)?;
                tracing::info!(visit_id, "Visit opened for vitals capture");
                Ok::<_, ClinicError>(visit_id)
            })?
        }
        (None, None) => {
            return Err(ClinicError::Validation(
                "visit_id or patient_record_number is required".into(),
            ))
        }
    };

    db::get_visit(conn, visit_id)?.ok_or_else(|| ClinicError::not_found("Visit", visit_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::models::{Patient, Sex};
    use chrono::{NaiveDate, NaiveTime};

    fn text(s: &str) -> Option<FormValue> {
        Some(FormValue::Text(s.into()))
    }

    fn valid_form() -> VitalsForm {
        VitalsForm {
            height: text("170"),
            weight: text("65"),
            heart_rate: text("80"),
            blood_sugar: text("100"),
            temperature: text("36.5"),
            ..Default::default()
        }
    }

    fn message(err: ClinicError) -> String {
        match err {
            ClinicError::Validation(msg) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    fn seeded() -> Connection {
        let conn = open_memory_database().unwrap();
        db::insert_patient(
            &conn,
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
        conn
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(10, 15, 30).unwrap())
    }

    #[test]
    fn accepts_strings_and_numbers() {
        let mut form = valid_form();
        form.height = Some(FormValue::Number(170.0));
        let vitals = validate_vitals(&form).unwrap();
        assert_eq!(vitals.height, Some(170.0));
        assert_eq!(vitals.temperature, Some(36.5));
    }

    #[test]
    fn overweight_names_weight_field() {
        let form = VitalsForm {
            visit_id: Some(FormValue::Number(5.0)),
            height: text("60"),
            weight: text("3000"),
            heart_rate: text("70"),
            blood_sugar: text("90"),
            temperature: text("37"),
            ..Default::default()
        };
        let msg = message(validate_vitals(&form).unwrap_err());
        assert!(msg.contains("Berat"), "{msg}");
        assert_eq!(msg, "Berat badan (kg) must be between 1 and 300");
    }

    #[test]
    fn boundaries_inclusive_and_one_unit_outside_rejected() {
        type Setter = fn(&mut VitalsForm, Option<FormValue>);
        let cases: [(Setter, f64, f64); 5] = [
            (|f, v| f.height = v, 50.0, 250.0),
            (|f, v| f.weight = v, 1.0, 300.0),
            (|f, v| f.heart_rate = v, 30.0, 200.0),
            (|f, v| f.blood_sugar = v, 20.0, 600.0),
            (|f, v| f.temperature = v, 32.0, 43.0),
        ];

        for (set, min, max) in cases {
            for (value, ok) in [(min, true), (max, true), (min - 1.0, false), (max + 1.0, false)] {
                let mut form = valid_form();
                set(&mut form, Some(FormValue::Number(value)));
                assert_eq!(validate_vitals(&form).is_ok(), ok, "value {value}");
            }
        }
    }

    #[test]
    fn missing_blank_and_non_numeric_are_required() {
        for bad in [None, text(""), text("abc"), text("NaN")] {
            let mut form = valid_form();
            form.heart_rate = bad;
            assert_eq!(
                message(validate_vitals(&form).unwrap_err()),
                "Detak jantung (bpm) is required"
            );
        }
    }

    #[test]
    fn non_positive_fails_before_range() {
        let mut form = valid_form();
        form.weight = text("-5");
        assert_eq!(
            message(validate_vitals(&form).unwrap_err()),
            "Berat badan (kg) must be greater than 0"
        );
    }

    #[test]
    fn stops_at_first_failing_field() {
        let mut form = valid_form();
        form.height = text("10");
        form.temperature = text("99");
        assert!(message(validate_vitals(&form).unwrap_err()).starts_with("Tinggi badan"));
    }

    #[test]
    fn updates_existing_visit() {
        let conn = seeded();
        let visit_id = db::insert_visit(
            &conn,
            &NewVisit {
                appointment_code: None,
                patient_record_number: "RM202501010001".into(),
                doctor_id: None,
                visit_date: now().date(),
                visit_time: now().time(),
                complaint: None,
                notes: None,
            },
        )
        .unwrap();

        let mut form = valid_form();
        form.visit_id = text(&visit_id.to_string());
        let visit = edit_vitals(&conn, &form, now()).unwrap();
        assert_eq!(visit.id, visit_id);
        assert_eq!(visit.vitals.weight, Some(65.0));
    }

    #[test]
    fn opens_visit_for_patient_without_visit_id() {
        let conn = seeded();
        let mut form = valid_form();
        form.patient_record_number = Some("RM202501010001".into());
        let visit = edit_vitals(&conn, &form, now()).unwrap();
        assert_eq!(visit.visit_date, now().date());
        assert_eq!(visit.visit_time, now().time());
        assert_eq!(visit.vitals.height, Some(170.0));
    }

    #[test]
    fn blank_visit_id_falls_back_to_patient() {
        let conn = seeded();
        let mut form = valid_form();
        form.visit_id = text("  ");
        form.patient_record_number = Some("RM202501010001".into());
        let visit = edit_vitals(&conn, &form, now()).unwrap();
        assert_eq!(visit.patient_record_number, "RM202501010001");
        assert_eq!(visit.vitals.weight, Some(65.0));

        form.visit_id = text("abc");
        assert_eq!(
            message(edit_vitals(&conn, &form, now()).unwrap_err()),
            "visit_id must be a number"
        );
    }

    #[test]
    fn invalid_vitals_never_open_a_visit() {
        let conn = seeded();
        let mut form = valid_form();
        form.patient_record_number = Some("RM202501010001".into());
        form.temperature = text("50");
        assert!(edit_vitals(&conn, &form, now()).is_err());
        let visits: i64 = conn
            .query_row("SELECT COUNT(*) FROM visits", [], |row| row.get(0))
            .unwrap();
        assert_eq!(visits, 0);
    }

    #[test]
    fn unknown_targets() {
        let conn = seeded();

        let mut form = valid_form();
        form.visit_id = Some(FormValue::Number(404.0));
        assert!(matches!(
            edit_vitals(&conn, &form, now()),
            Err(ClinicError::NotFound { entity: "Visit", .. })
        ));

        let mut form = valid_form();
        form.patient_record_number = Some("RM209901010001".into());
        assert!(matches!(
            edit_vitals(&conn, &form, now()),
            Err(ClinicError::NotFound { entity: "Patient", .. })
        ));

        assert!(matches!(
            edit_vitals(&conn, &valid_form(), now()),
            Err(ClinicError::Validation(_))
        ));
    }
}
