//! Line-item synchronisation for one visit and one category.
//!
//! A save replaces the visit's list for that category with the submitted
//! list. Two strategies:
//! - `FullReplace`: delete everything, resolve and insert every item.
//! - `Diff` (medications whose items carry persisted ids): delete rows the
//!   client dropped, update rows it kept, insert rows it added. Kept rows
//!   retain their id and `created_at`.
//!
//! The whole call runs in one transaction. The first unresolvable item
//! rolls back every change of the call.

use std::collections::HashSet;

use rusqlite::{Connection, TransactionBehavior};

use crate::db;
use crate::error::ClinicError;
use crate::models::{
    LineItemCategory, LineItemInput, LineItems, MedicationLine, Medicine, VisitDetail,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    FullReplace,
    Diff,
}

impl SyncStrategy {
    /// Diff applies to medications once any submitted item references a
    /// persisted row. Everything else is replaced wholesale.
    pub fn for_items(category: LineItemCategory, items: &[LineItemInput]) -> Self {
        match category {
            LineItemCategory::Medication if items.iter().any(|i| i.id.is_some()) => {
                SyncStrategy::Diff
            }
            _ => SyncStrategy::FullReplace,
        }
    }
}

// ---------------------------------------------------------------------------
// Sync
// ---------------------------------------------------------------------------

/// Replace the `category` line items of a visit with `items` and return the
/// persisted list.
pub fn sync_line_items(
    conn: &Connection,
    visit_id: i64,
    category: LineItemCategory,
    items: &[LineItemInput],
) -> Result<LineItems, ClinicError> {
    if !db::visit_exists(conn, visit_id)? {
        return Err(ClinicError::not_found("Visit", visit_id));
    }

    let strategy = SyncStrategy::for_items(category, items);

    db::with_transaction(conn, TransactionBehavior::Immediate, "sync_line_items", |tx| {
        match (category, strategy) {
            (LineItemCategory::Medication, SyncStrategy::Diff) => {
                diff_medications(tx, visit_id, items)?;
            }
            (LineItemCategory::Medication, SyncStrategy::FullReplace) => {
                db::delete_visit_line_items(tx, category, visit_id)?;
                for item in items {
                    let line = resolve_medication(tx, item)?;
                    db::insert_visit_medication(tx, visit_id, &line)?;
                }
            }
            (LineItemCategory::Procedure, _) => {
                db::delete_visit_line_items(tx, category, visit_id)?;
                for item in items {
                    let service_id = resolve_service(tx, item)?;
                    db::insert_visit_procedure(tx, visit_id, service_id, item.notes.as_deref())?;
                }
            }
            (LineItemCategory::Diagnosis, _) => {
                db::delete_visit_line_items(tx, category, visit_id)?;
                for item in items {
                    let diagnosis_id = resolve_diagnosis(tx, item)?;
                    db::insert_visit_diagnosis(tx, visit_id, diagnosis_id, item.notes.as_deref())?;
                }
            }
        }

        tracing::info!(
            visit_id,
            category = category.as_str(),
            strategy = ?strategy,
            submitted = items.len(),
            "Line items synchronised"
        );
        list_items(tx, visit_id, category)
    })
}

fn diff_medications(
    conn: &Connection,
    visit_id: i64,
    items: &[LineItemInput],
) -> Result<(), ClinicError> {
    let existing: HashSet<i64> = db::list_visit_medication_ids(conn, visit_id)?
        .into_iter()
        .collect();

    let mut kept = HashSet::new();
    for id in items.iter().filter_map(|i| i.id) {
        if !existing.contains(&id) {
            return Err(ClinicError::Validation(format!(
                "Medication item {id} does not belong to visit {visit_id}"
            )));
        }
        kept.insert(id);
    }

    let mut dropped: Vec<i64> = existing.difference(&kept).copied().collect();
    dropped.sort_unstable();
    db::delete_visit_medications_by_ids(conn, visit_id, &dropped)?;

    for item in items {
        let line = resolve_medication(conn, item)?;
        match item.id {
            Some(id) => db::update_visit_medication(conn, visit_id, id, &line)?,
            None => {
                db::insert_visit_medication(conn, visit_id, &line)?;
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Catalog resolution
// ---------------------------------------------------------------------------

/// Id when present, otherwise the trimmed name. Neither is a validation error.
enum CatalogRef<'a> {
    Id(i64),
    Name(&'a str),
}

fn catalog_ref(item: &LineItemInput, category: LineItemCategory) -> Result<CatalogRef<'_>, ClinicError> {
    if let Some(id) = item.catalog_id {
        return Ok(CatalogRef::Id(id));
    }
    match item.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => Ok(CatalogRef::Name(name)),
        _ => Err(ClinicError::Validation(format!(
            "{} item requires an id or a name",
            category.catalog_label()
        ))),
    }
}

fn unresolved(category: LineItemCategory, item: &LineItemInput) -> ClinicError {
    ClinicError::Integrity(format!(
        "{} not found: {}",
        category.catalog_label(),
        item.display_name()
    ))
}

fn resolve_medication(conn: &Connection, item: &LineItemInput) -> Result<MedicationLine, ClinicError> {
    let category = LineItemCategory::Medication;
    let medicine: Option<Medicine> = match catalog_ref(item, category)? {
        CatalogRef::Id(id) => db::get_medicine(conn, id)?,
        CatalogRef::Name(name) => db::find_medicine_by_name(conn, name)?,
    };
    let medicine = medicine.ok_or_else(|| unresolved(category, item))?;

    if medicine.stock <= 0 {
        return Err(ClinicError::Integrity(format!(
            "Medicine out of stock: {}",
            medicine.name
        )));
    }

    let quantity = item.quantity.unwrap_or(1);
    if quantity <= 0 {
        return Err(ClinicError::Validation(format!(
            "Quantity for {} must be greater than 0",
            medicine.name
        )));
    }

    Ok(MedicationLine {
        medicine_id: medicine.id,
        dosage: item.dosage.clone(),
        frequency: item.frequency.clone(),
        duration: item.duration.clone(),
        quantity,
        status: item.status,
    })
}

fn resolve_service(conn: &Connection, item: &LineItemInput) -> Result<i64, ClinicError> {
    let category = LineItemCategory::Procedure;
    let id = match catalog_ref(item, category)? {
        CatalogRef::Id(id) => db::service_exists(conn, id)?.then_some(id),
        CatalogRef::Name(name) => db::find_service_id_by_name(conn, name)?,
    };
    id.ok_or_else(|| unresolved(category, item))
}

/// Names resolve against the picker label `"<code> - <name>"`.
fn resolve_diagnosis(conn: &Connection, item: &LineItemInput) -> Result<i64, ClinicError> {
    let category = LineItemCategory::Diagnosis;
    let entry = match catalog_ref(item, category)? {
        CatalogRef::Id(id) => db::get_diagnosis(conn, id)?,
        CatalogRef::Name(label) => db::find_diagnosis_by_label(conn, label)?,
    };
    entry.map(|e| e.id).ok_or_else(|| unresolved(category, item))
}

// ---------------------------------------------------------------------------
// Read model
// ---------------------------------------------------------------------------

fn list_items(
    conn: &Connection,
    visit_id: i64,
    category: LineItemCategory,
) -> Result<LineItems, ClinicError> {
    Ok(match category {
        LineItemCategory::Medication => LineItems::Medications(db::list_visit_medications(conn, visit_id)?),
        LineItemCategory::Procedure => LineItems::Procedures(db::list_visit_procedures(conn, visit_id)?),
        LineItemCategory::Diagnosis => LineItems::Diagnoses(db::list_visit_diagnoses(conn, visit_id)?),
    })
}

/// Persisted line items of one category. An unknown visit is not found; a
/// visit without items yields an empty list.
pub fn list_line_items(
    conn: &Connection,
    visit_id: i64,
    category: LineItemCategory,
) -> Result<LineItems, ClinicError> {
    if !db::visit_exists(conn, visit_id)? {
        return Err(ClinicError::not_found("Visit", visit_id));
    }
    list_items(conn, visit_id, category)
}

pub fn load_visit_detail(conn: &Connection, visit_id: i64) -> Result<VisitDetail, ClinicError> {
    let visit = db::get_visit(conn, visit_id)?.ok_or_else(|| ClinicError::not_found("Visit", visit_id))?;
    Ok(VisitDetail {
        visit,
        medications: db::list_visit_medications(conn, visit_id)?,
        procedures: db::list_visit_procedures(conn, visit_id)?,
        diagnoses: db::list_visit_diagnoses(conn, visit_id)?,
    })
}
