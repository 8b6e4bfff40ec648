use serde::{Deserialize, Serialize};

use super::enums::Capability;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub is_system_defined: bool,
    pub is_deleted: bool,
}

/// The five independent capability flags a role can hold on a menu.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivilegeFlags {
    pub can_view: bool,
    pub can_create: bool,
    pub can_edit: bool,
    pub can_delete: bool,
    pub can_access: bool,
}

impl PrivilegeFlags {
    pub fn all() -> Self {
        Self {
            can_view: true,
            can_create: true,
            can_edit: true,
            can_delete: true,
            can_access: true,
        }
    }

    pub fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::View => self.can_view,
            Capability::Create => self.can_create,
            Capability::Edit => self.can_edit,
            Capability::Delete => self.can_delete,
            Capability::Access => self.can_access,
        }
    }
}

/// One menu row as read from storage, before tree assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuRow {
    pub id: i64,
    pub name: String,
    pub path: Option<String>,
    pub icon: Option<String>,
    pub parent_id: Option<i64>,
    pub order_number: i64,
    pub privileges: Option<PrivilegeFlags>,
}

/// A menu node with its resolved children.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuNode {
    pub id: i64,
    pub name: String,
    pub path: Option<String>,
    pub icon: Option<String>,
    pub parent_id: Option<i64>,
    pub order_number: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub privileges: Option<PrivilegeFlags>,
    pub children: Vec<MenuNode>,
}

impl MenuNode {
    pub fn leaf(row: MenuRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            path: row.path,
            icon: row.icon,
            parent_id: row.parent_id,
            order_number: row.order_number,
            privileges: row.privileges,
            children: Vec::new(),
        }
    }
}

/// Persisted privilege record, keyed by `(role_id, menu_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RolePrivilege {
    pub role_id: i64,
    pub menu_id: i64,
    #[serde(flatten)]
    pub flags: PrivilegeFlags,
}

/// One entry of a privilege replacement request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PrivilegeInput {
    pub menu_id: i64,
    #[serde(flatten)]
    pub flags: PrivilegeFlags,
}
