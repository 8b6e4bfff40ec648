use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::enums::AppointmentStatus;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Appointment {
    pub code: String,
    pub patient_record_number: String,
    pub doctor_id: i64,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub appointment_type: String,
    pub status: AppointmentStatus,
    pub poli: String,
    pub notes: Option<String>,
}

/// Appointment booking form. Creates the appointment and its visit together.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAppointment {
    #[serde(default)]
    pub patient_record_number: String,
    pub doctor_id: Option<i64>,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(rename = "type", alias = "appointment_type", default)]
    pub appointment_type: String,
    #[serde(default)]
    pub poli: String,
    pub notes: Option<String>,
    pub complaint: Option<String>,
}
