use std::collections::HashMap;

use crate::models::{MenuNode, MenuRow};

/// Assemble flat rows into a menu tree.
///
/// Roots are rows without a parent. Children hang under the row whose id
/// equals their `parent_id`, to any depth. Siblings are ordered by
/// `order_number`, then id. A row whose parent is not among `rows` is
/// dropped along with its descendants, and every kept row appears once.
pub fn build_menu_tree(mut rows: Vec<MenuRow>) -> Vec<MenuNode> {
    rows.sort_by_key(|row| (row.order_number, row.id));

    let mut by_parent: HashMap<Option<i64>, Vec<MenuRow>> = HashMap::new();
    for row in rows {
        by_parent.entry(row.parent_id).or_default().push(row);
    }

    let roots = by_parent.remove(&None).unwrap_or_default();
    roots
        .into_iter()
        .map(|row| attach_children(row, &mut by_parent))
        .collect()
}

fn attach_children(row: MenuRow, by_parent: &mut HashMap<Option<i64>, Vec<MenuRow>>) -> MenuNode {
    let children = by_parent.remove(&Some(row.id)).unwrap_or_default();
    let mut node = MenuNode::leaf(row);
    node.children = children
        .into_iter()
        .map(|child| attach_children(child, by_parent))
        .collect();
    node
}

/// Depth-first search for the node serving `path`.
pub fn find_by_path<'a>(nodes: &'a [MenuNode], path: &str) -> Option<&'a MenuNode> {
    for node in nodes {
        if node.path.as_deref() == Some(path) {
            return Some(node);
        }
        if let Some(found) = find_by_path(&node.children, path) {
            return Some(found);
        }
    }
    None
}
