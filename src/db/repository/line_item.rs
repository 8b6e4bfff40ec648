use std::str::FromStr;

use rusqlite::{params, params_from_iter, Connection};

use crate::db::DatabaseError;
use crate::models::{
    LineItemCategory, MedicationItemStatus, MedicationLine, VisitDiagnosis, VisitMedication,
    VisitProcedure,
};

/// Delete every line item of `category` for a visit. Returns rows removed.
pub fn delete_visit_line_items(
    conn: &Connection,
    category: LineItemCategory,
    visit_id: i64,
) -> Result<usize, DatabaseError> {
    // Table name comes from a closed enum, never from input.
    let sql = format!("DELETE FROM {} WHERE visit_id = ?1", category.table());
    let removed = conn.execute(&sql, params![visit_id])?;
    Ok(removed)
}

// ── Medications ─────────────────────────────────────────

pub fn list_visit_medications(
    conn: &Connection,
    visit_id: i64,
) -> Result<Vec<VisitMedication>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT vm.id, vm.visit_id, vm.medicine_id, m.name, vm.dosage, vm.frequency,
                vm.duration, vm.quantity, vm.status, vm.created_at
         FROM visit_medications vm
         INNER JOIN medicines m ON m.id = vm.medicine_id
         WHERE vm.visit_id = ?1
         ORDER BY vm.id ASC",
    )?;
    let rows = stmt.query_map(params![visit_id], |row| {
        Ok((
            VisitMedication {
                id: row.get(0)?,
                visit_id: row.get(1)?,
                medicine_id: row.get(2)?,
                medicine_name: row.get(3)?,
                dosage: row.get(4)?,
                frequency: row.get(5)?,
                duration: row.get(6)?,
                quantity: row.get(7)?,
                status: MedicationItemStatus::Pending,
                created_at: row.get(9)?,
            },
            row.get::<_, String>(8)?,
        ))
    })?;

    let mut items = Vec::new();
    for row in rows {
        let (mut item, status) = row?;
        item.status = MedicationItemStatus::from_str(&status)?;
        items.push(item);
    }
    Ok(items)
}

pub fn list_visit_medication_ids(conn: &Connection, visit_id: i64) -> Result<Vec<i64>, DatabaseError> {
    let mut stmt =
        conn.prepare("SELECT id FROM visit_medications WHERE visit_id = ?1 ORDER BY id ASC")?;
    let rows = stmt.query_map(params![visit_id], |row| row.get(0))?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

pub fn insert_visit_medication(
    conn: &Connection,
    visit_id: i64,
    line: &MedicationLine,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO visit_medications (visit_id, medicine_id, dosage, frequency, duration, quantity, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            visit_id,
            line.medicine_id,
            line.dosage,
            line.frequency,
            line.duration,
            line.quantity,
            line.status.unwrap_or(MedicationItemStatus::Pending).as_str(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Update a medication row in place, keeping its id and `created_at`.
pub fn update_visit_medication(
    conn: &Connection,
    visit_id: i64,
    item_id: i64,
    line: &MedicationLine,
) -> Result<(), DatabaseError> {
    let affected = conn.execute(
        "UPDATE visit_medications
         SET medicine_id = ?1, dosage = ?2, frequency = ?3, duration = ?4, quantity = ?5, status = COALESCE(?6, status)
         WHERE id = ?7 AND visit_id = ?8",
        params![
            line.medicine_id,
            line.dosage,
            line.frequency,
            line.duration,
            line.quantity,
            line.status.map(|s| s.as_str()),
            item_id,
            visit_id,
        ],
    )?;
    if affected == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "visit_medication".into(),
            id: item_id.to_string(),
        });
    }
    Ok(())
}

/// Delete the given medication rows of a visit. Rows of other visits are
/// never touched.
pub fn delete_visit_medications_by_ids(
    conn: &Connection,
    visit_id: i64,
    ids: &[i64],
) -> Result<usize, DatabaseError> {
    if ids.is_empty() {
        return Ok(0);
    }
    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!(
        "DELETE FROM visit_medications WHERE visit_id = ? AND id IN ({placeholders})"
    );
    let values = std::iter::once(visit_id).chain(ids.iter().copied());
    let removed = conn.execute(&sql, params_from_iter(values))?;
    Ok(removed)
}

// ── Procedures ──────────────────────────────────────────

pub fn list_visit_procedures(
    conn: &Connection,
    visit_id: i64,
) -> Result<Vec<VisitProcedure>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT vp.id, vp.visit_id, vp.service_id, s.name, vp.notes, vp.created_at
         FROM visit_procedures vp
         INNER JOIN services s ON s.id = vp.service_id
         WHERE vp.visit_id = ?1
         ORDER BY vp.id ASC",
    )?;
    let rows = stmt.query_map(params![visit_id], |row| {
        Ok(VisitProcedure {
            id: row.get(0)?,
            visit_id: row.get(1)?,
            service_id: row.get(2)?,
            service_name: row.get(3)?,
            notes: row.get(4)?,
            created_at: row.get(5)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

pub fn insert_visit_procedure(
    conn: &Connection,
    visit_id: i64,
    service_id: i64,
    notes: Option<&str>,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO visit_procedures (visit_id, service_id, notes) VALUES (?1, ?2, ?3)",
        params![visit_id, service_id, notes],
    )?;
    Ok(conn.last_insert_rowid())
}

// ── Diagnoses ───────────────────────────────────────────

pub fn list_visit_diagnoses(
    conn: &Connection,
    visit_id: i64,
) -> Result<Vec<VisitDiagnosis>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT vd.id, vd.visit_id, vd.diagnosis_id, d.code, d.name, vd.notes, vd.created_at
         FROM visit_diagnoses vd
         INNER JOIN diagnoses d ON d.id = vd.diagnosis_id
         WHERE vd.visit_id = ?1
         ORDER BY vd.id ASC",
    )?;
    let rows = stmt.query_map(params![visit_id], |row| {
        Ok(VisitDiagnosis {
            id: row.get(0)?,
            visit_id: row.get(1)?,
            diagnosis_id: row.get(2)?,
            code: row.get(3)?,
            name: row.get(4)?,
            notes: row.get(5)?,
            created_at: row.get(6)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

pub fn insert_visit_diagnosis(
    conn: &Connection,
    visit_id: i64,
    diagnosis_id: i64,
    notes: Option<&str>,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO visit_diagnoses (visit_id, diagnosis_id, notes) VALUES (?1, ?2, ?3)",
        params![visit_id, diagnosis_id, notes],
    )?;
    Ok(conn.last_insert_rowid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{insert_medicine, insert_patient, insert_visit};
    use crate::db::sqlite::open_memory_database;
    use crate::models::{NewVisit, Patient, Sex};
    use chrono::{NaiveDate, NaiveTime};

    fn seeded() -> (Connection, i64, i64) {
        let conn = open_memory_database().unwrap();
        insert_patient(
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
        let new_visit = NewVisit {
            appointment_code: None,
            patient_record_number: "RM202501010001".into(),
            doctor_id: None,
            visit_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            visit_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            complaint: None,
            notes: None,
        };
        let v1 = insert_visit(&conn, &new_visit).unwrap();
        let v2 = insert_visit(&conn, &new_visit).unwrap();
        (conn, v1, v2)
    }

    fn line(medicine_id: i64) -> MedicationLine {
        MedicationLine {
            medicine_id,
            dosage: Some("500 mg".into()),
            frequency: Some("3x1".into()),
            duration: Some("5 hari".into()),
            quantity: 15,
            status: None,
        }
    }

    #[test]
    fn delete_by_ids_is_scoped_to_visit() {
        let (conn, v1, v2) = seeded();
        let med = insert_medicine(&conn, "Paracetamol", 100).unwrap();
        let a = insert_visit_medication(&conn, v1, &line(med)).unwrap();
        let b = insert_visit_medication(&conn, v2, &line(med)).unwrap();

        let removed = delete_visit_medications_by_ids(&conn, v1, &[a, b]).unwrap();
        assert_eq!(removed, 1);
        assert!(list_visit_medication_ids(&conn, v1).unwrap().is_empty());
        assert_eq!(list_visit_medication_ids(&conn, v2).unwrap(), vec![b]);
    }

    #[test]
    fn update_keeps_identity() {
        let (conn, v1, _) = seeded();
        let med = insert_medicine(&conn, "Paracetamol", 100).unwrap();
        let id = insert_visit_medication(&conn, v1, &line(med)).unwrap();
        let before = list_visit_medications(&conn, v1).unwrap();

        let mut changed = line(med);
        changed.quantity = 10;
        changed.status = Some(MedicationItemStatus::Processed);
        update_visit_medication(&conn, v1, id, &changed).unwrap();

        let after = list_visit_medications(&conn, v1).unwrap();
        assert_eq!(after[0].id, id);
        assert_eq!(after[0].created_at, before[0].created_at);
        assert_eq!(after[0].quantity, 10);
        assert_eq!(after[0].status, MedicationItemStatus::Processed);
    }

    #[test]
    fn update_without_status_keeps_stored_status() {
        let (conn, v1, _) = seeded();
        let med = insert_medicine(&conn, "Paracetamol", 100).unwrap();
        let id = insert_visit_medication(&conn, v1, &line(med)).unwrap();
        assert_eq!(
            list_visit_medications(&conn, v1).unwrap()[0].status,
            MedicationItemStatus::Pending
        );

        let mut processed = line(med);
        processed.status = Some(MedicationItemStatus::Processed);
        update_visit_medication(&conn, v1, id, &processed).unwrap();
        update_visit_medication(&conn, v1, id, &line(med)).unwrap();

        let after = list_visit_medications(&conn, v1).unwrap();
        assert_eq!(after[0].status, MedicationItemStatus::Processed);
    }

    #[test]
    fn update_of_foreign_row_is_not_found() {
        let (conn, v1, v2) = seeded();
        let med = insert_medicine(&conn, "Paracetamol", 100).unwrap();
        let id = insert_visit_medication(&conn, v1, &line(med)).unwrap();
        let result = update_visit_medication(&conn, v2, id, &line(med));
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[test]
    fn delete_category_only_touches_that_table() {
        let (conn, v1, _) = seeded();
        let med = insert_medicine(&conn, "Paracetamol", 100).unwrap();
        insert_visit_medication(&conn, v1, &line(med)).unwrap();
        assert_eq!(
            delete_visit_line_items(&conn, LineItemCategory::Procedure, v1).unwrap(),
            0
        );
        assert_eq!(
            delete_visit_line_items(&conn, LineItemCategory::Medication, v1).unwrap(),
            1
        );
    }
}
