use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::{MenuRow, PrivilegeFlags, PrivilegeInput, Role, RolePrivilege};

/// Get a role by id, soft-deleted roles included.
pub fn get_role(conn: &Connection, role_id: i64) -> Result<Option<Role>, DatabaseError> {
    let role = conn
        .query_row(
            "SELECT id, name, description, is_system_defined, is_deleted
             FROM roles WHERE id = ?1",
            params![role_id],
            |row| {
                Ok(Role {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    is_system_defined: row.get(3)?,
                    is_deleted: row.get(4)?,
                })
            },
        )
        .optional()?;
    Ok(role)
}

/// Get an active (not soft-deleted) role.
pub fn get_active_role(conn: &Connection, role_id: i64) -> Result<Option<Role>, DatabaseError> {
    Ok(get_role(conn, role_id)?.filter(|role| !role.is_deleted))
}

/// Whether a non-deleted menu with this id exists.
pub fn menu_exists(conn: &Connection, menu_id: i64) -> Result<bool, DatabaseError> {
    let found = conn
        .query_row(
            "SELECT 1 FROM menus WHERE id = ?1 AND is_deleted = 0",
            params![menu_id],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Menus the role may view according to the per-menu privilege table.
pub fn get_menus_with_menu_privileges(
    conn: &Connection,
    role_id: i64,
) -> Result<Vec<MenuRow>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT m.id, m.name, m.path, m.icon, m.parent_id, m.order_number,
                p.can_view, p.can_create, p.can_edit, p.can_delete, p.can_access
         FROM menus m
         INNER JOIN role_menu_privileges p ON p.menu_id = m.id AND p.role_id = ?1
         WHERE m.is_deleted = 0 AND p.can_view = 1
         ORDER BY m.order_number ASC, m.id ASC",
    )?;
    let rows = stmt.query_map(params![role_id], row_to_menu_with_flags)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Menus the role may view according to the legacy role-wide flags.
///
/// The legacy table has no menu granularity, so a role that can view gets
/// every active menu, each carrying the same flags.
pub fn get_menus_with_role_privileges(
    conn: &Connection,
    role_id: i64,
) -> Result<Vec<MenuRow>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT m.id, m.name, m.path, m.icon, m.parent_id, m.order_number,
                p.can_view, p.can_create, p.can_edit, p.can_delete, p.can_access
         FROM menus m
         CROSS JOIN role_privileges p
         WHERE p.role_id = ?1 AND p.can_view = 1 AND m.is_deleted = 0
         ORDER BY m.order_number ASC, m.id ASC",
    )?;
    let rows = stmt.query_map(params![role_id], row_to_menu_with_flags)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Every active menu, left-joined with the role's privileges.
/// Menus without a privilege row carry all-false flags.
pub fn get_privilege_matrix_rows(
    conn: &Connection,
    role_id: i64,
) -> Result<Vec<MenuRow>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT m.id, m.name, m.path, m.icon, m.parent_id, m.order_number,
                COALESCE(p.can_view, 0), COALESCE(p.can_create, 0), COALESCE(p.can_edit, 0),
                COALESCE(p.can_delete, 0), COALESCE(p.can_access, 0)
         FROM menus m
         LEFT JOIN role_menu_privileges p ON p.menu_id = m.id AND p.role_id = ?1
         WHERE m.is_deleted = 0
         ORDER BY m.order_number ASC, m.id ASC",
    )?;
    let rows = stmt.query_map(params![role_id], row_to_menu_with_flags)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Persisted privilege rows for a role, ordered by menu id.
pub fn get_role_privileges(
    conn: &Connection,
    role_id: i64,
) -> Result<Vec<RolePrivilege>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT role_id, menu_id, can_view, can_create, can_edit, can_delete, can_access
         FROM role_menu_privileges
         WHERE role_id = ?1
         ORDER BY menu_id ASC",
    )?;
    let rows = stmt.query_map(params![role_id], |row| {
        Ok(RolePrivilege {
            role_id: row.get(0)?,
            menu_id: row.get(1)?,
            flags: flags_at(row, 2)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Delete every privilege row of a role. Returns the number removed.
pub fn delete_role_privileges(conn: &Connection, role_id: i64) -> Result<usize, DatabaseError> {
    let removed = conn.execute(
        "DELETE FROM role_menu_privileges WHERE role_id = ?1",
        params![role_id],
    )?;
    Ok(removed)
}

/// Write one privilege row. A repeated `(role_id, menu_id)` overwrites the
/// earlier row, so the last entry for a menu wins.
pub fn upsert_role_privilege(
    conn: &Connection,
    role_id: i64,
    input: &PrivilegeInput,
) -> Result<(), DatabaseError> {
    let f = &input.flags;
    conn.execute(
        "INSERT INTO role_menu_privileges
             (role_id, menu_id, can_view, can_create, can_edit, can_delete, can_access)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(role_id, menu_id) DO UPDATE SET
             can_view = excluded.can_view,
             can_create = excluded.can_create,
             can_edit = excluded.can_edit,
             can_delete = excluded.can_delete,
             can_access = excluded.can_access",
        params![
            role_id,
            input.menu_id,
            f.can_view,
            f.can_create,
            f.can_edit,
            f.can_delete,
            f.can_access,
        ],
    )?;
    Ok(())
}

/// Set the legacy role-wide flags for a role.
pub fn set_legacy_role_privileges(
    conn: &Connection,
    role_id: i64,
    flags: &PrivilegeFlags,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO role_privileges (role_id, can_view, can_create, can_edit, can_delete, can_access)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(role_id) DO UPDATE SET
             can_view = excluded.can_view,
             can_create = excluded.can_create,
             can_edit = excluded.can_edit,
             can_delete = excluded.can_delete,
             can_access = excluded.can_access",
        params![
            role_id,
            flags.can_view,
            flags.can_create,
            flags.can_edit,
            flags.can_delete,
            flags.can_access,
        ],
    )?;
    Ok(())
}

/// Insert a role and return its id.
pub fn insert_role(
    conn: &Connection,
    name: &str,
    description: Option<&str>,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO roles (name, description) VALUES (?1, ?2)",
        params![name, description],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Insert a menu and return its id.
pub fn insert_menu(
    conn: &Connection,
    name: &str,
    path: Option<&str>,
    parent_id: Option<i64>,
    order_number: i64,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO menus (name, path, parent_id, order_number) VALUES (?1, ?2, ?3, ?4)",
        params![name, path, parent_id, order_number],
    )?;
    Ok(conn.last_insert_rowid())
}

fn flags_at(row: &rusqlite::Row, start: usize) -> Result<PrivilegeFlags, rusqlite::Error> {
    Ok(PrivilegeFlags {
        can_view: row.get(start)?,
        can_create: row.get(start + 1)?,
        can_edit: row.get(start + 2)?,
        can_delete: row.get(start + 3)?,
        can_access: row.get(start + 4)?,
    })
}

fn row_to_menu_with_flags(row: &rusqlite::Row) -> Result<MenuRow, rusqlite::Error> {
    Ok(MenuRow {
        id: row.get(0)?,
        name: row.get(1)?,
        path: row.get(2)?,
        icon: row.get(3)?,
        parent_id: row.get(4)?,
        order_number: row.get(5)?,
        privileges: Some(flags_at(row, 6)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn test_db() -> Connection {
        open_memory_database().unwrap()
    }

    #[test]
    fn seeded_administrator_sees_every_menu() {
        let conn = test_db();
        let rows = get_menus_with_menu_privileges(&conn, 1).unwrap();
        assert_eq!(rows.len(), 14);
        assert!(rows.iter().all(|r| r.privileges == Some(PrivilegeFlags::all())));
    }

    #[test]
    fn menu_privileges_exclude_soft_deleted_menus() {
        let conn = test_db();
        conn.execute("UPDATE menus SET is_deleted = 1 WHERE id = 14", [])
            .unwrap();
        let rows = get_menus_with_menu_privileges(&conn, 1).unwrap();
        assert!(rows.iter().all(|r| r.id != 14));
        assert!(!menu_exists(&conn, 14).unwrap());
    }

    #[test]
    fn legacy_flags_apply_to_all_menus() {
        let conn = test_db();
        let role_id = insert_role(&conn, "Kasir", None).unwrap();
        assert!(get_menus_with_role_privileges(&conn, role_id).unwrap().is_empty());

        let flags = PrivilegeFlags {
            can_view: true,
            can_access: true,
            ..Default::default()
        };
        set_legacy_role_privileges(&conn, role_id, &flags).unwrap();
        let rows = get_menus_with_role_privileges(&conn, role_id).unwrap();
        assert_eq!(rows.len(), 14);
        assert_eq!(rows[0].privileges, Some(flags));
    }

    #[test]
    fn matrix_rows_default_to_false() {
        let conn = test_db();
        let role_id = insert_role(&conn, "Kasir", None).unwrap();
        let rows = get_privilege_matrix_rows(&conn, role_id).unwrap();
        assert_eq!(rows.len(), 14);
        assert!(rows
            .iter()
            .all(|r| r.privileges == Some(PrivilegeFlags::default())));
    }

    #[test]
    fn upsert_overwrites_same_menu() {
        let conn = test_db();
        let role_id = insert_role(&conn, "Kasir", None).unwrap();
        let first = PrivilegeInput {
            menu_id: 1,
            flags: PrivilegeFlags::all(),
        };
        let second = PrivilegeInput {
            menu_id: 1,
            flags: PrivilegeFlags {
                can_view: true,
                ..Default::default()
            },
        };
        upsert_role_privilege(&conn, role_id, &first).unwrap();
        upsert_role_privilege(&conn, role_id, &second).unwrap();

        let stored = get_role_privileges(&conn, role_id).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].flags, second.flags);
    }

    #[test]
    fn get_role_reports_soft_delete() {
        let conn = test_db();
        conn.execute("UPDATE roles SET is_deleted = 1 WHERE id = 2", [])
            .unwrap();
        assert!(get_role(&conn, 2).unwrap().unwrap().is_deleted);
        assert!(get_active_role(&conn, 2).unwrap().is_none());
        assert!(get_role(&conn, 99).unwrap().is_none());
    }
}
