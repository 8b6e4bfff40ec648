//! Role-based menu access control.
//!
//! - `tree` assembles flat menu rows into a parent/child hierarchy.
//! - `strategy` resolves which menus a role may see, trying each privilege
//!   source in order until one yields a usable tree.
//! - `writer` replaces a role's privilege matrix atomically.

pub mod strategy;
pub mod tree;
pub mod writer;

pub use strategy::{
    has_capability, privilege_matrix, resolve_user_menu_tree, LegacyRolePrivileges,
    MenuResolver, MenuScopedPrivileges, PrivilegeMatrix, PrivilegeSource,
};
pub use tree::{build_menu_tree, find_by_path};
pub use writer::replace_privileges;
