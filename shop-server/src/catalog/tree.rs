//! Category forest helpers
//!
//! Pure functions over a flat category list as loaded from the database.
//! The list is the whole table, so lookups never hit the store again.

use std::collections::{HashMap, HashSet};

use shared::models::{Breadcrumb, Category, CategoryNode};

fn sort_siblings(categories: &mut [&Category]) {
    categories.sort_by(|a, b| {
        a.sort_order
            .cmp(&b.sort_order)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Nested forest, siblings ordered by `sort_order` then name.
///
/// Categories whose parent is not in the list become roots.
pub fn build_tree(categories: &[Category]) -> Vec<CategoryNode> {
    let ids: HashSet<i64> = categories.iter().map(|c| c.id).collect();
    let mut children: HashMap<i64, Vec<&Category>> = HashMap::new();
    let mut roots: Vec<&Category> = Vec::new();

    for category in categories {
        match category.parent_id {
            Some(parent_id) if parent_id != category.id && ids.contains(&parent_id) => {
                children.entry(parent_id).or_default().push(category)
            }
            _ => roots.push(category),
        }
    }

    sort_siblings(&mut roots);
    let mut visited = HashSet::new();
    roots
        .into_iter()
        .filter_map(|root| build_node(root, &mut children, &mut visited))
        .collect()
}

fn build_node(
    category: &Category,
    children: &mut HashMap<i64, Vec<&Category>>,
    visited: &mut HashSet<i64>,
) -> Option<CategoryNode> {
    // Corrupt parent links must not loop forever
    if !visited.insert(category.id) {
        return None;
    }

    let mut kids = children.remove(&category.id).unwrap_or_default();
    sort_siblings(&mut kids);

    Some(CategoryNode {
        category: category.clone(),
        children: kids
            .into_iter()
            .filter_map(|kid| build_node(kid, children, visited))
            .collect(),
    })
}

/// Drop inactive nodes together with everything below them
pub fn prune_inactive(nodes: Vec<CategoryNode>) -> Vec<CategoryNode> {
    nodes
        .into_iter()
        .filter(|n| n.category.is_active)
        .map(|mut n| {
            n.children = prune_inactive(std::mem::take(&mut n.children));
            n
        })
        .collect()
}

/// `id` followed by every descendant id (breadth first)
pub fn descendant_ids(categories: &[Category], id: i64) -> Vec<i64> {
    let mut children: HashMap<i64, Vec<i64>> = HashMap::new();
    for category in categories {
        if let Some(parent_id) = category.parent_id {
            children.entry(parent_id).or_default().push(category.id);
        }
    }

    let mut result = vec![id];
    let mut seen: HashSet<i64> = HashSet::from([id]);
    let mut cursor = 0;
    while cursor < result.len() {
        if let Some(kids) = children.get(&result[cursor]) {
            for kid in kids {
                if seen.insert(*kid) {
                    result.push(*kid);
                }
            }
        }
        cursor += 1;
    }
    result
}

/// Path from the root down to `id` (inclusive). Empty when `id` is unknown.
pub fn breadcrumbs(categories: &[Category], id: i64) -> Vec<Breadcrumb> {
    let by_id: HashMap<i64, &Category> = categories.iter().map(|c| (c.id, c)).collect();

    let mut path = Vec::new();
    let mut seen = HashSet::new();
    let mut current = by_id.get(&id).copied();
    while let Some(category) = current {
        if !seen.insert(category.id) {
            break;
        }
        path.push(Breadcrumb {
            id: category.id,
            name: category.name.clone(),
            slug: category.slug.clone(),
        });
        current = category.parent_id.and_then(|p| by_id.get(&p).copied());
    }
    path.reverse();
    path
}

/// Whether making `new_parent` the parent of `id` would close a cycle
pub fn would_create_cycle(categories: &[Category], id: i64, new_parent: i64) -> bool {
    new_parent == id || descendant_ids(categories, id).contains(&new_parent)
}

/// Levels below `id` in its subtree: 0 for a leaf, 1 with children only, ...
pub fn subtree_height(categories: &[Category], id: i64) -> i32 {
    let mut children: HashMap<i64, Vec<i64>> = HashMap::new();
    for category in categories {
        if let Some(parent_id) = category.parent_id {
            children.entry(parent_id).or_default().push(category.id);
        }
    }

    let mut height = 0;
    let mut frontier = vec![id];
    let mut seen: HashSet<i64> = HashSet::from([id]);
    loop {
        let next: Vec<i64> = frontier
            .iter()
            .filter_map(|p| children.get(p))
            .flatten()
            .copied()
            .filter(|c| seen.insert(*c))
            .collect();
        if next.is_empty() {
            return height;
        }
        height += 1;
        frontier = next;
    }
}
