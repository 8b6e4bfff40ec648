//! Privilege-source cascade.
//!
//! Sources are tried in order:
//! 1. Menu-scoped privileges (`role_menu_privileges`) → per-menu flags
//! 2. Legacy role-wide privileges (`role_privileges`) → same flags on every menu
//! 3. Default → empty tree
//!
//! The first source that produces a non-empty tree wins. A source whose
//! table is missing counts as empty. Any other storage failure is returned
//! to the caller.

use rusqlite::Connection;
use serde::Serialize;

use super::tree::{build_menu_tree, find_by_path};
use crate::db::{self, DatabaseError};
use crate::error::ClinicError;
use crate::models::{Capability, MenuNode, MenuRow, Role, RolePrivilege};

/// One place privileges can be read from.
pub trait PrivilegeSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Menus the role may view, each carrying its flags.
    fn visible_menus(&self, conn: &Connection, role_id: i64) -> Result<Vec<MenuRow>, DatabaseError>;
}

/// Per-menu privileges.
pub struct MenuScopedPrivileges;

impl PrivilegeSource for MenuScopedPrivileges {
    fn name(&self) -> &'static str {
        "menu_scoped"
    }

    fn visible_menus(&self, conn: &Connection, role_id: i64) -> Result<Vec<MenuRow>, DatabaseError> {
        db::get_menus_with_menu_privileges(conn, role_id)
    }
}

/// Role-wide privileges without menu granularity.
pub struct LegacyRolePrivileges;

impl PrivilegeSource for LegacyRolePrivileges {
    fn name(&self) -> &'static str {
        "legacy_role"
    }

    fn visible_menus(&self, conn: &Connection, role_id: i64) -> Result<Vec<MenuRow>, DatabaseError> {
        db::get_menus_with_role_privileges(conn, role_id)
    }
}

/// Ordered list of privilege sources.
pub struct MenuResolver {
    sources: Vec<Box<dyn PrivilegeSource>>,
}

impl MenuResolver {
    /// Menu-scoped first, legacy second.
    pub fn standard() -> Self {
        Self::with_sources(vec![
            Box::new(MenuScopedPrivileges),
            Box::new(LegacyRolePrivileges),
        ])
    }

    pub fn with_sources(sources: Vec<Box<dyn PrivilegeSource>>) -> Self {
        Self { sources }
    }

    /// Resolve the menu tree a role may see.
    pub fn resolve_menu_tree(
        &self,
        conn: &Connection,
        role_id: i64,
    ) -> Result<Vec<MenuNode>, DatabaseError> {
        for source in &self.sources {
            let rows = match source.visible_menus(conn, role_id) {
                Ok(rows) => rows,
                Err(e) if e.is_missing_table() => {
                    tracing::warn!(source = source.name(), role_id, "Privilege source unavailable");
                    continue;
                }
                Err(e) => return Err(e),
            };

            let tree = build_menu_tree(rows);
            if !tree.is_empty() {
                tracing::debug!(source = source.name(), role_id, "Menu tree resolved");
                return Ok(tree);
            }
        }

        Ok(Vec::new())
    }

    /// Whether the role holds `capability` on the menu serving `path`.
    /// Unknown paths and menus outside the role's tree are denied.
    pub fn has_capability(
        &self,
        conn: &Connection,
        role_id: i64,
        path: &str,
        capability: Capability,
    ) -> Result<bool, DatabaseError> {
        let tree = self.resolve_menu_tree(conn, role_id)?;
        Ok(find_by_path(&tree, path)
            .and_then(|node| node.privileges)
            .map(|flags| flags.allows(capability))
            .unwrap_or(false))
    }

    /// Menu tree of the user's role. A missing user is a not-found error.
    pub fn resolve_for_user(
        &self,
        conn: &Connection,
        user_id: i64,
    ) -> Result<Vec<MenuNode>, ClinicError> {
        let user =
            db::get_user(conn, user_id)?.ok_or_else(|| ClinicError::not_found("User", user_id))?;
        Ok(self.resolve_menu_tree(conn, user.role_id)?)
    }
}

impl Default for MenuResolver {
    fn default() -> Self {
        Self::standard()
    }
}

/// Capability check with the standard cascade.
pub fn has_capability(
    conn: &Connection,
    role_id: i64,
    path: &str,
    capability: Capability,
) -> Result<bool, DatabaseError> {
    MenuResolver::standard().has_capability(conn, role_id, path, capability)
}

pub fn resolve_user_menu_tree(
    conn: &Connection,
    user_id: i64,
) -> Result<Vec<MenuNode>, ClinicError> {
    MenuResolver::standard().resolve_for_user(conn, user_id)
}

/// Editable privilege matrix for one role.
#[derive(Debug, Clone, Serialize)]
pub struct PrivilegeMatrix {
    pub role: Role,
    /// Persisted privilege rows, exactly as stored.
    pub privileges: Vec<RolePrivilege>,
    /// Every active menu with the role's flags (false where no row exists).
    pub menus: Vec<MenuNode>,
}

pub fn privilege_matrix(conn: &Connection, role_id: i64) -> Result<PrivilegeMatrix, ClinicError> {
    let role = db::get_active_role(conn, role_id)?
        .ok_or_else(|| ClinicError::not_found("Role", role_id))?;
    let privileges = db::get_role_privileges(conn, role_id)?;
    let menus = build_menu_tree(db::get_privilege_matrix_rows(conn, role_id)?);
    Ok(PrivilegeMatrix {
        role,
        privileges,
        menus,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::models::PrivilegeFlags;

    fn test_db() -> Connection {
        open_memory_database().unwrap()
    }

    struct FailingSource;

    impl PrivilegeSource for FailingSource {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn visible_menus(&self, _: &Connection, _: i64) -> Result<Vec<MenuRow>, DatabaseError> {
            Err(DatabaseError::ConstraintViolation("connection lost".into()))
        }
    }

    #[test]
    fn administrator_gets_ordered_tree() {
        let conn = test_db();
        let tree = MenuResolver::standard().resolve_menu_tree(&conn, 1).unwrap();
        let roots: Vec<_> = tree.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(roots, vec!["Dashboard", "Master Data", "Rekam Medis", "Pengaturan"]);
        assert_eq!(tree[1].children.len(), 6);
        assert_eq!(tree[1].children[0].name, "Pasien");
    }

    #[test]
    fn doctor_sees_only_granted_menus() {
        let conn = test_db();
        let tree = MenuResolver::standard().resolve_menu_tree(&conn, 2).unwrap();
        let roots: Vec<_> = tree.iter().map(|n| n.id).collect();
        assert_eq!(roots, vec![1, 9]);
        let children: Vec<_> = tree[1].children.iter().map(|n| n.id).collect();
        assert_eq!(children, vec![10, 11]);
    }

    #[test]
    fn falls_back_to_legacy_flags() {
        let conn = test_db();
        let role_id = db::insert_role(&conn, "Kasir", None).unwrap();
        db::set_legacy_role_privileges(
            &conn,
            role_id,
            &PrivilegeFlags {
                can_view: true,
                ..Default::default()
            },
        )
        .unwrap();

        let tree = MenuResolver::standard().resolve_menu_tree(&conn, role_id).unwrap();
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn missing_table_falls_through() {
        let conn = test_db();
        conn.execute_batch("DROP TABLE role_menu_privileges;").unwrap();
        db::set_legacy_role_privileges(&conn, 1, &PrivilegeFlags::all()).unwrap();

        let tree = MenuResolver::standard().resolve_menu_tree(&conn, 1).unwrap();
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn no_source_yields_empty_tree() {
        let conn = test_db();
        let role_id = db::insert_role(&conn, "Tamu", None).unwrap();
        let tree = MenuResolver::standard().resolve_menu_tree(&conn, role_id).unwrap();
        assert!(tree.is_empty());
    }

    #[test]
    fn storage_failure_is_reported() {
        let conn = test_db();
        let resolver = MenuResolver::with_sources(vec![
            Box::new(FailingSource),
            Box::new(LegacyRolePrivileges),
        ]);
        assert!(resolver.resolve_menu_tree(&conn, 1).is_err());
    }

    #[test]
    fn capability_check_uses_flags() {
        let conn = test_db();
        assert!(has_capability(&conn, 2, "/medical/visits", Capability::Edit).unwrap());
        assert!(!has_capability(&conn, 2, "/medical/visits", Capability::Delete).unwrap());
        assert!(!has_capability(&conn, 2, "/settings/roles", Capability::View).unwrap());
        assert!(!has_capability(&conn, 1, "/no/such/menu", Capability::View).unwrap());
    }

    #[test]
    fn user_tree_requires_existing_user() {
        let conn = test_db();
        let result = resolve_user_menu_tree(&conn, 77);
        assert!(matches!(result, Err(ClinicError::NotFound { .. })));
    }

    #[test]
    fn matrix_lists_every_menu_for_role_without_rows() {
        let conn = test_db();
        let role_id = db::insert_role(&conn, "Kasir", None).unwrap();
        let matrix = privilege_matrix(&conn, role_id).unwrap();
        assert!(matrix.privileges.is_empty());
        assert_eq!(matrix.menus.len(), 4);
        assert_eq!(matrix.menus[0].privileges, Some(PrivilegeFlags::default()));
    }

    #[test]
    fn matrix_for_missing_role_is_not_found() {
        let conn = test_db();
        assert!(matches!(
            privilege_matrix(&conn, 404),
            Err(ClinicError::NotFound { .. })
        ));
    }
}
