use serde::{Deserialize, Serialize};

use super::enums::MedicationItemStatus;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisitMedication {
    pub id: i64,
    pub visit_id: i64,
    pub medicine_id: i64,
    pub medicine_name: String,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub duration: Option<String>,
    pub quantity: i64,
    pub status: MedicationItemStatus,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisitProcedure {
    pub id: i64,
    pub visit_id: i64,
    pub service_id: i64,
    pub service_name: String,
    pub notes: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisitDiagnosis {
    pub id: i64,
    pub visit_id: i64,
    pub diagnosis_id: i64,
    pub code: String,
    pub name: String,
    pub notes: Option<String>,
    pub created_at: String,
}

/// Persisted line items of one category, as returned after a sync.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LineItems {
    Medications(Vec<VisitMedication>),
    Procedures(Vec<VisitProcedure>),
    Diagnoses(Vec<VisitDiagnosis>),
}

impl LineItems {
    pub fn len(&self) -> usize {
        match self {
            LineItems::Medications(items) => items.len(),
            LineItems::Procedures(items) => items.len(),
            LineItems::Diagnoses(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One submitted line item.
///
/// `catalog_id` is the canonical reference. `name` is accepted for older
/// clients that send display names; diagnoses are then matched on
/// `"<code> - <name>"`. `id` is the persisted line-item id, present when the
/// client is editing an existing row.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LineItemInput {
    pub id: Option<i64>,
    #[serde(alias = "medicine_id", alias = "service_id", alias = "diagnosis_id")]
    pub catalog_id: Option<i64>,
    pub name: Option<String>,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub duration: Option<String>,
    pub quantity: Option<i64>,
    pub status: Option<MedicationItemStatus>,
    pub notes: Option<String>,
}

impl LineItemInput {
    /// Label used to name this item in error messages.
    pub fn display_name(&self) -> String {
        match (&self.name, self.catalog_id) {
            (Some(name), _) if !name.trim().is_empty() => name.trim().to_string(),
            (_, Some(id)) => format!("#{id}"),
            _ => "(unnamed)".to_string(),
        }
    }
}

/// A medication line after catalog resolution, ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct MedicationLine {
    pub medicine_id: i64,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub duration: Option<String>,
    pub quantity: i64,
    /// `None` inserts as pending and leaves a stored row's status alone.
    pub status: Option<MedicationItemStatus>,
}
