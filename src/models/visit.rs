use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::line_item::{VisitDiagnosis, VisitMedication, VisitProcedure};

/// Physiological measurements recorded during a visit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub heart_rate: Option<f64>,
    pub blood_sugar: Option<f64>,
    pub temperature: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Visit {
    pub id: i64,
    pub appointment_code: Option<String>,
    pub patient_record_number: String,
    pub doctor_id: Option<i64>,
    pub visit_date: NaiveDate,
    pub visit_time: NaiveTime,
    pub complaint: Option<String>,
    pub notes: Option<String>,
    pub vitals: Vitals,
}

/// Fields needed to open a visit.
#[derive(Debug, Clone)]
pub struct NewVisit {
    pub appointment_code: Option<String>,
    pub patient_record_number: String,
    pub doctor_id: Option<i64>,
    pub visit_date: NaiveDate,
    pub visit_time: NaiveTime,
    pub complaint: Option<String>,
    pub notes: Option<String>,
}

/// A visit with every line-item list attached.
#[derive(Debug, Clone, Serialize)]
pub struct VisitDetail {
    #[serde(flatten)]
    pub visit: Visit,
    pub medications: Vec<VisitMedication>,
    pub procedures: Vec<VisitProcedure>,
    pub diagnoses: Vec<VisitDiagnosis>,
}
