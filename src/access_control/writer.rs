use rusqlite::{Connection, TransactionBehavior};

use crate::db;
use crate::error::ClinicError;
use crate::models::{PrivilegeInput, RolePrivilege};

/// Replace a role's entire privilege set.
///
/// Delete-then-insert inside one transaction. Either the stored set becomes
/// exactly `privileges` or nothing changes. When a menu id repeats, the last
/// entry wins.
pub fn replace_privileges(
    conn: &Connection,
    role_id: i64,
    privileges: &[PrivilegeInput],
) -> Result<Vec<RolePrivilege>, ClinicError> {
    if db::get_active_role(conn, role_id)?.is_none() {
        return Err(ClinicError::not_found("Role", role_id));
    }

    db::with_transaction(conn, TransactionBehavior::Immediate, "replace_privileges", |tx| {
        let removed = db::delete_role_privileges(tx, role_id)?;
        for entry in privileges {
            if !db::menu_exists(tx, entry.menu_id)? {
                return Err(ClinicError::not_found("Menu", entry.menu_id));
            }
            db::upsert_role_privilege(tx, role_id, entry)?;
        }
        tracing::info!(role_id, removed, written = privileges.len(), "Role privileges replaced");
        Ok(())
    })?;

    Ok(db::get_role_privileges(conn, role_id)?)
}
