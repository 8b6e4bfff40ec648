use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::Sex;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Patient {
    pub record_number: String,
    pub national_id: Option<String>,
    pub full_name: String,
    pub birth_date: NaiveDate,
    pub sex: Sex,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Registration form as submitted. Validated into a `Patient`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewPatient {
    pub national_id: Option<String>,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub birth_date: String,
    #[serde(default)]
    pub sex: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}
