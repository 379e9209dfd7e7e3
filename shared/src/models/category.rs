//! Category Model

use serde::{Deserialize, Deserializer, Serialize};

/// Category entity
///
/// `level` is materialized: roots are level 0 and every child sits one level
/// below its parent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub parent_id: Option<i64>,
    pub level: i32,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Category with its nested children, as returned by the tree endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryNode {
    #[serde(flatten)]
    pub category: Category,
    pub children: Vec<CategoryNode>,
}

/// Create category payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryCreate {
    pub name: String,
    /// Derived from `name` when absent
    pub slug: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub parent_id: Option<i64>,
    pub sort_order: Option<i32>,
}

/// Update category payload
///
/// `parent_id` distinguishes "absent" (keep) from `null` (move to root).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub parent_id: Option<Option<i64>>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

/// One entry of a batch sort-order update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortOrderUpdate {
    pub id: i64,
    pub sort_order: i32,
}

/// Category page payload: the category plus its root-to-node path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryDetail {
    #[serde(flatten)]
    pub category: Category,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub children: Vec<Category>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Breadcrumb {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

pub(crate) fn double_option<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}
