//! Category operations
//!
//! Every category carries a materialized `level` (roots are 0). Moves
//! re-level the whole subtree in one transaction, and no level may exceed
//! `max_depth - 1`.

use shared::models::{
    Category, CategoryCreate, CategoryDetail, CategoryNode, CategoryUpdate, SortOrderUpdate,
};
use sqlx::SqlitePool;

use super::tree;
use crate::db::repository::{RepoError, category};
use crate::utils::slug::{ensure_unique_slug, slug_source};
use crate::utils::validation::{
    MAX_CONTENT_LEN, MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, MAX_URL_LEN, validate_optional_text,
    validate_required_text,
};
use crate::{AppError, AppResult, ErrorCode};

fn not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::CategoryNotFound, format!("Category {id} not found"))
}

fn check_depth(level: i32, max_depth: i32) -> AppResult<()> {
    if level > max_depth - 1 {
        return Err(AppError::with_message(
            ErrorCode::CategoryTooDeep,
            format!("Categories can be at most {max_depth} levels deep"),
        )
        .with_detail("max_depth", max_depth));
    }
    Ok(())
}

async fn unique_slug(pool: &SqlitePool, base: &str, exclude_id: Option<i64>) -> AppResult<String> {
    let slug = ensure_unique_slug(base, |candidate| async move {
        category::slug_exists(pool, &candidate, exclude_id).await
    })
    .await?;
    Ok(slug)
}

/// Whole table, flat, ordered by level, sort order, name
pub async fn list(pool: &SqlitePool, active_only: bool) -> AppResult<Vec<Category>> {
    let categories = if active_only {
        category::find_active(pool).await?
    } else {
        category::find_all(pool).await?
    };
    Ok(categories)
}

/// Nested forest. The storefront variant hides inactive subtrees.
pub async fn tree(pool: &SqlitePool, active_only: bool) -> AppResult<Vec<CategoryNode>> {
    let all = category::find_all(pool).await?;
    let forest = tree::build_tree(&all);
    Ok(if active_only {
        tree::prune_inactive(forest)
    } else {
        forest
    })
}

pub async fn get(pool: &SqlitePool, id: i64) -> AppResult<Category> {
    category::find_by_id(pool, id)
        .await?
        .ok_or_else(|| not_found(id))
}

/// Active category by slug with its breadcrumb trail and active children
pub async fn detail_by_slug(pool: &SqlitePool, slug: &str) -> AppResult<CategoryDetail> {
    let found = category::find_by_slug(pool, slug)
        .await?
        .filter(|c| c.is_active)
        .ok_or_else(|| {
            AppError::with_message(ErrorCode::CategoryNotFound, format!("Category '{slug}' not found"))
        })?;

    let all = category::find_all(pool).await?;
    let breadcrumbs = tree::breadcrumbs(&all, found.id);
    let mut children: Vec<Category> = all
        .into_iter()
        .filter(|c| c.parent_id == Some(found.id) && c.is_active)
        .collect();
    children.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.name.cmp(&b.name)));

    Ok(CategoryDetail {
        category: found,
        breadcrumbs,
        children,
    })
}

pub async fn create(pool: &SqlitePool, max_depth: i32, data: CategoryCreate) -> AppResult<Category> {
    validate_required_text(&data.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&data.slug, "slug", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&data.description, "description", MAX_CONTENT_LEN)?;
    validate_optional_text(&data.image, "image", MAX_URL_LEN)?;

    let base = slug_source(data.slug.as_deref(), &data.name);
    let slug = unique_slug(pool, &base, None).await?;
    let now = shared::util::now_millis();

    let mut tx = pool.begin().await.map_err(RepoError::from)?;
    // The parent's level is read under the write lock so a concurrent move
    // cannot push the new child past the depth limit
    let level = match data.parent_id {
        Some(parent_id) => {
            let parent = category::lock_row(&mut *tx, parent_id)
                .await?
                .ok_or_else(|| not_found(parent_id))?;
            parent.level + 1
        }
        None => 0,
    };
    check_depth(level, max_depth)?;

    let new = Category {
        id: shared::util::snowflake_id(),
        name: data.name.trim().to_string(),
        slug,
        description: data.description,
        image: data.image,
        parent_id: data.parent_id,
        level,
        sort_order: data.sort_order.unwrap_or(0),
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    category::insert(&mut *tx, &new).await?;
    tx.commit().await.map_err(RepoError::from)?;

    tracing::info!(category_id = new.id, slug = %new.slug, level, "Category created");
    get(pool, new.id).await
}

/// Apply a partial update. A parent change re-levels the subtree.
///
/// The tree checks run inside the write transaction, after the row has
/// been locked, so concurrent moves cannot both pass on a stale view.
pub async fn update(
    pool: &SqlitePool,
    max_depth: i32,
    id: i64,
    data: CategoryUpdate,
) -> AppResult<Category> {
    let mut updated = get(pool, id).await?;

    if let Some(name) = data.name {
        validate_required_text(&name, "name", MAX_NAME_LEN)?;
        updated.name = name.trim().to_string();
    }
    if let Some(slug) = data.slug.as_deref().filter(|s| !s.trim().is_empty()) {
        validate_required_text(slug, "slug", MAX_SHORT_TEXT_LEN)?;
        let base = slug_source(Some(slug), &updated.name);
        updated.slug = unique_slug(pool, &base, Some(id)).await?;
    }
    if let Some(description) = data.description {
        validate_optional_text(&Some(description.clone()), "description", MAX_CONTENT_LEN)?;
        updated.description = Some(description);
    }
    if let Some(image) = data.image {
        validate_optional_text(&Some(image.clone()), "image", MAX_URL_LEN)?;
        updated.image = Some(image);
    }
    if let Some(sort_order) = data.sort_order {
        updated.sort_order = sort_order;
    }
    if let Some(is_active) = data.is_active {
        updated.is_active = is_active;
    }

    let now = shared::util::now_millis();
    let mut tx = pool.begin().await.map_err(RepoError::from)?;
    let existing = category::lock_row(&mut *tx, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    updated.parent_id = existing.parent_id;
    updated.level = existing.level;

    if let Some(new_parent) = data.parent_id
        && new_parent != existing.parent_id
    {
        let all = category::load_all(&mut *tx).await?;
        let new_level = match new_parent {
            Some(parent_id) => {
                if tree::would_create_cycle(&all, id, parent_id) {
                    return Err(AppError::with_message(
                        ErrorCode::CategoryCycle,
                        "A category cannot be moved under itself or its descendants",
                    ));
                }
                let parent = all
                    .iter()
                    .find(|c| c.id == parent_id)
                    .ok_or_else(|| not_found(parent_id))?;
                parent.level + 1
            }
            None => 0,
        };
        // The deepest descendant moves along
        check_depth(new_level + tree::subtree_height(&all, id), max_depth)?;

        updated.parent_id = new_parent;
        updated.level = new_level;
    }

    updated.updated_at = now;
    let delta = updated.level - existing.level;
    category::update_row(&mut *tx, &updated).await?;
    if delta != 0 {
        let shifted = category::shift_descendant_levels(&mut *tx, id, delta, now).await?;
        tracing::info!(category_id = id, delta, descendants = shifted, "Category subtree re-leveled");
    }
    tx.commit().await.map_err(RepoError::from)?;

    get(pool, id).await
}

/// Refused while the category still has children or products
pub async fn delete(pool: &SqlitePool, id: i64) -> AppResult<()> {
    get(pool, id).await?;

    if category::count_children(pool, id).await? > 0 {
        return Err(AppError::new(ErrorCode::CategoryHasChildren));
    }
    if category::count_products(pool, id).await? > 0 {
        return Err(AppError::new(ErrorCode::CategoryHasProducts));
    }

    category::delete(pool, id).await?;
    tracing::info!(category_id = id, "Category deleted");
    Ok(())
}

/// Reorder siblings in one go; an unknown id rolls the whole batch back
pub async fn sort_orders(pool: &SqlitePool, updates: &[SortOrderUpdate]) -> AppResult<()> {
    if updates.is_empty() {
        return Ok(());
    }
    category::update_sort_orders(pool, updates)
        .await
        .map_err(|e| match e {
            RepoError::NotFound(msg) => AppError::with_message(ErrorCode::CategoryNotFound, msg),
            other => other.into(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;

    async fn pool() -> SqlitePool {
        DbService::in_memory().await.unwrap().pool
    }

    fn named(name: &str, parent_id: Option<i64>) -> CategoryCreate {
        CategoryCreate {
            name: name.into(),
            parent_id,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_duplicate_names_get_suffixed_slugs() {
        let pool = pool().await;
        let a = create(&pool, 5, named("Áo thun", None)).await.unwrap();
        let b = create(&pool, 5, named("Áo thun", None)).await.unwrap();
        let c = create(&pool, 5, named("Áo  Thun!", None)).await.unwrap();
        assert_eq!(a.slug, "ao-thun");
        assert_eq!(b.slug, "ao-thun-1");
        assert_eq!(c.slug, "ao-thun-2");
    }

    #[tokio::test]
    async fn test_levels_follow_parents() {
        let pool = pool().await;
        let root = create(&pool, 5, named("Thời trang", None)).await.unwrap();
        let child = create(&pool, 5, named("Nam", Some(root.id))).await.unwrap();
        let grandchild = create(&pool, 5, named("Áo", Some(child.id))).await.unwrap();
        assert_eq!((root.level, child.level, grandchild.level), (0, 1, 2));

        let err = create(&pool, 5, named("X", Some(12345))).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::CategoryNotFound);
    }

    #[tokio::test]
    async fn test_create_respects_max_depth() {
        let pool = pool().await;
        let a = create(&pool, 2, named("A", None)).await.unwrap();
        let b = create(&pool, 2, named("B", Some(a.id))).await.unwrap();
        let err = create(&pool, 2, named("C", Some(b.id))).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::CategoryTooDeep);
    }

    #[tokio::test]
    async fn test_reslug_to_own_slug_keeps_it() {
        let pool = pool().await;
        let a = create(&pool, 5, named("Giày", None)).await.unwrap();
        let updated = update(
            &pool,
            5,
            a.id,
            CategoryUpdate {
                slug: Some("giay".into()),
                name: Some("Giày dép".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.slug, "giay");
        assert_eq!(updated.name, "Giày dép");
    }

    #[tokio::test]
    async fn test_move_cascades_levels() {
        let pool = pool().await;
        let a = create(&pool, 5, named("A", None)).await.unwrap();
        let b = create(&pool, 5, named("B", None)).await.unwrap();
        let b1 = create(&pool, 5, named("B1", Some(b.id))).await.unwrap();
        let b2 = create(&pool, 5, named("B2", Some(b1.id))).await.unwrap();

        let moved = update(
            &pool,
            5,
            b.id,
            CategoryUpdate {
                parent_id: Some(Some(a.id)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(moved.level, 1);
        assert_eq!(get(&pool, b1.id).await.unwrap().level, 2);
        assert_eq!(get(&pool, b2.id).await.unwrap().level, 3);

        // Back to root
        update(
            &pool,
            5,
            b.id,
            CategoryUpdate {
                parent_id: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(get(&pool, b.id).await.unwrap().level, 0);
        assert_eq!(get(&pool, b2.id).await.unwrap().level, 2);
    }

    #[tokio::test]
    async fn test_move_rejects_cycles() {
        let pool = pool().await;
        let a = create(&pool, 5, named("A", None)).await.unwrap();
        let b = create(&pool, 5, named("B", Some(a.id))).await.unwrap();

        for target in [a.id, b.id] {
            let err = update(
                &pool,
                5,
                a.id,
                CategoryUpdate {
                    parent_id: Some(Some(target)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
            assert_eq!(err.code, ErrorCode::CategoryCycle);
        }
    }

    #[tokio::test]
    async fn test_move_checks_subtree_depth() {
        let pool = pool().await;
        // Chain of 4 levels: l0 > l1 > l2 > l3
        let l0 = create(&pool, 5, named("L0", None)).await.unwrap();
        let l1 = create(&pool, 5, named("L1", Some(l0.id))).await.unwrap();
        let l2 = create(&pool, 5, named("L2", Some(l1.id))).await.unwrap();
        let l3 = create(&pool, 5, named("L3", Some(l2.id))).await.unwrap();
        // Subtree of depth 3: s0 > s1 > s2
        let s0 = create(&pool, 5, named("S0", None)).await.unwrap();
        let s1 = create(&pool, 5, named("S1", Some(s0.id))).await.unwrap();
        create(&pool, 5, named("S2", Some(s1.id))).await.unwrap();

        let err = update(
            &pool,
            5,
            s0.id,
            CategoryUpdate {
                parent_id: Some(Some(l3.id)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::CategoryTooDeep);
        // Nothing moved
        assert_eq!(get(&pool, s0.id).await.unwrap().level, 0);
    }

    #[tokio::test]
    async fn test_delete_guards() {
        let pool = pool().await;
        let a = create(&pool, 5, named("A", None)).await.unwrap();
        let b = create(&pool, 5, named("B", Some(a.id))).await.unwrap();

        let err = delete(&pool, a.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::CategoryHasChildren);

        sqlx::query(
            "INSERT INTO product (id, name, slug, price, category_id, created_at, updated_at) VALUES (1, 'P', 'p', 10, ?, 0, 0)",
        )
        .bind(b.id)
        .execute(&pool)
        .await
        .unwrap();
        let err = delete(&pool, b.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::CategoryHasProducts);

        sqlx::query("DELETE FROM product").execute(&pool).await.unwrap();
        delete(&pool, b.id).await.unwrap();
        delete(&pool, a.id).await.unwrap();
        assert!(list(&pool, false).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_detail_and_sort_order() {
        let pool = pool().await;
        let root = create(&pool, 5, named("Điện tử", None)).await.unwrap();
        let phones = create(&pool, 5, named("Điện thoại", Some(root.id))).await.unwrap();
        let laptops = create(&pool, 5, named("Laptop", Some(root.id))).await.unwrap();

        sort_orders(
            &pool,
            &[
                SortOrderUpdate { id: laptops.id, sort_order: 0 },
                SortOrderUpdate { id: phones.id, sort_order: 1 },
            ],
        )
        .await
        .unwrap();

        let detail = detail_by_slug(&pool, "dien-tu").await.unwrap();
        let names: Vec<_> = detail.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Laptop", "Điện thoại"]);

        let crumbs = detail_by_slug(&pool, "dien-thoai").await.unwrap().breadcrumbs;
        assert_eq!(crumbs.len(), 2);
        assert_eq!(crumbs[0].slug, "dien-tu");
    }

    #[tokio::test]
    async fn test_crossing_moves_cannot_both_commit() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("shop.db").display());
        let pool = DbService::new(&url).await.unwrap().pool;

        let a = create(&pool, 5, named("A", None)).await.unwrap();
        let b = create(&pool, 5, named("B", None)).await.unwrap();
        let under = |parent: i64| CategoryUpdate {
            parent_id: Some(Some(parent)),
            ..Default::default()
        };

        let (first, second) = tokio::join!(
            update(&pool, 5, a.id, under(b.id)),
            update(&pool, 5, b.id, under(a.id)),
        );
        let failures: Vec<_> = [first, second].into_iter().filter_map(Result::err).collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].code, ErrorCode::CategoryCycle);

        // Exactly one root left, and levels match the parents
        let all = list(&pool, false).await.unwrap();
        let roots: Vec<_> = all.iter().filter(|c| c.parent_id.is_none()).collect();
        assert_eq!(roots.len(), 1);
        for c in &all {
            let expected = match c.parent_id {
                Some(pid) => all.iter().find(|p| p.id == pid).unwrap().level + 1,
                None => 0,
            };
            assert_eq!(c.level, expected, "{}", c.name);
        }
    }
}
