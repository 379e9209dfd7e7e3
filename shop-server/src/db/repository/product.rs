//! Product Repository

use super::{RepoError, RepoResult, contains_pattern};
use crate::utils::slug::fold_search;
use shared::models::{Product, ProductSort};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

const COLUMNS: &str = "id, name, slug, sku, description, price, sale_price, stock, category_id, images, is_active, is_featured, created_at, updated_at";

/// SQL twin of `Product::effective_price`
const EFFECTIVE_PRICE: &str =
    "(CASE WHEN sale_price IS NOT NULL AND sale_price > 0 AND sale_price < price THEN sale_price ELSE price END)";

/// Listing filter, already resolved (category slug -> id set)
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub active_only: bool,
    pub q: Option<String>,
    /// `None` means no category filter; `Some(empty)` matches nothing
    pub category_ids: Option<Vec<i64>>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub featured: Option<bool>,
    pub sort: ProductSort,
    pub limit: u32,
    pub offset: u32,
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &ProductFilter) {
    qb.push(" WHERE 1 = 1");
    if filter.active_only {
        qb.push(" AND is_active = 1");
    }
    if let Some(pattern) = filter.q.as_deref().and_then(contains_pattern) {
        qb.push(" AND search_text LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\'");
    }
    if let Some(ids) = &filter.category_ids {
        if ids.is_empty() {
            qb.push(" AND 1 = 0");
        } else {
            qb.push(" AND category_id IN (");
            let mut separated = qb.separated(", ");
            for id in ids {
                separated.push_bind(*id);
            }
            separated.push_unseparated(")");
        }
    }
    if let Some(min) = filter.min_price {
        qb.push(format!(" AND {EFFECTIVE_PRICE} >= ")).push_bind(min);
    }
    if let Some(max) = filter.max_price {
        qb.push(format!(" AND {EFFECTIVE_PRICE} <= ")).push_bind(max);
    }
    if let Some(featured) = filter.featured {
        qb.push(" AND is_featured = ").push_bind(featured);
    }
}

fn order_by(sort: ProductSort) -> String {
    match sort {
        ProductSort::Newest => " ORDER BY created_at DESC, id DESC".to_string(),
        ProductSort::PriceAsc => format!(" ORDER BY {EFFECTIVE_PRICE} ASC, id DESC"),
        ProductSort::PriceDesc => format!(" ORDER BY {EFFECTIVE_PRICE} DESC, id DESC"),
        ProductSort::Name => " ORDER BY name COLLATE NOCASE ASC, id DESC".to_string(),
    }
}

/// Folded name and SKU, matched by `q`
fn search_text(product: &Product) -> String {
    fold_search(&format!("{} {}", product.name, product.sku.as_deref().unwrap_or_default()))
}

/// One page of products plus the total match count
pub async fn search(pool: &SqlitePool, filter: &ProductFilter) -> RepoResult<(Vec<Product>, u64)> {
    let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM product");
    push_filters(&mut count_qb, filter);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {COLUMNS} FROM product"));
    push_filters(&mut qb, filter);
    qb.push(order_by(filter.sort));
    qb.push(" LIMIT ")
        .push_bind(filter.limit as i64)
        .push(" OFFSET ")
        .push_bind(filter.offset as i64);

    let products = qb.build_query_as::<Product>().fetch_all(pool).await?;
    Ok((products, total.max(0) as u64))
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Product>> {
    let sql = format!("SELECT {COLUMNS} FROM product WHERE id = ?");
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(product)
}

pub async fn find_by_slug(pool: &SqlitePool, slug: &str) -> RepoResult<Option<Product>> {
    let sql = format!("SELECT {COLUMNS} FROM product WHERE slug = ? LIMIT 1");
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(slug)
        .fetch_optional(pool)
        .await?;
    Ok(product)
}

pub async fn slug_exists(pool: &SqlitePool, slug: &str, exclude_id: Option<i64>) -> RepoResult<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM product WHERE slug = ? AND id IS NOT ?")
            .bind(slug)
            .bind(exclude_id)
            .fetch_one(pool)
            .await?;
    Ok(count > 0)
}

pub async fn sku_exists(pool: &SqlitePool, sku: &str, exclude_id: Option<i64>) -> RepoResult<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM product WHERE sku = ? AND id IS NOT ?")
            .bind(sku)
            .bind(exclude_id)
            .fetch_one(pool)
            .await?;
    Ok(count > 0)
}

pub async fn insert(pool: &SqlitePool, product: &Product) -> RepoResult<Product> {
    let images = serde_json::to_string(&product.images)?;
    sqlx::query(
        "INSERT INTO product (id, name, slug, sku, description, price, sale_price, stock, category_id, images, is_active, is_featured, search_text, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(product.id)
    .bind(&product.name)
    .bind(&product.slug)
    .bind(&product.sku)
    .bind(&product.description)
    .bind(product.price)
    .bind(product.sale_price)
    .bind(product.stock)
    .bind(product.category_id)
    .bind(images)
    .bind(product.is_active)
    .bind(product.is_featured)
    .bind(search_text(product))
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(pool)
    .await?;

    find_by_id(pool, product.id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create product".into()))
}

/// Write every column of an existing row
pub async fn update_row(pool: &SqlitePool, product: &Product) -> RepoResult<Product> {
    let images = serde_json::to_string(&product.images)?;
    let rows = sqlx::query(
        "UPDATE product SET name = ?, slug = ?, sku = ?, description = ?, price = ?, sale_price = ?, stock = ?, \
         category_id = ?, images = ?, is_active = ?, is_featured = ?, search_text = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&product.name)
    .bind(&product.slug)
    .bind(&product.sku)
    .bind(&product.description)
    .bind(product.price)
    .bind(product.sale_price)
    .bind(product.stock)
    .bind(product.category_id)
    .bind(images)
    .bind(product.is_active)
    .bind(product.is_featured)
    .bind(search_text(product))
    .bind(product.updated_at)
    .bind(product.id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Product {} not found", product.id)));
    }
    find_by_id(pool, product.id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Product {} not found", product.id)))
}

/// Soft delete
pub async fn deactivate(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("UPDATE product SET is_active = 0, updated_at = ? WHERE id = ?")
        .bind(shared::util::now_millis())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

/// Take `quantity` units if enough are left. Returns `false` when short.
pub async fn decrement_stock(conn: &mut SqliteConnection, id: i64, quantity: i64) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE product SET stock = stock - ?, updated_at = ? WHERE id = ? AND stock >= ?",
    )
    .bind(quantity)
    .bind(shared::util::now_millis())
    .bind(id)
    .bind(quantity)
    .execute(&mut *conn)
    .await?;
    Ok(rows.rows_affected() == 1)
}

pub async fn restore_stock(conn: &mut SqliteConnection, id: i64, quantity: i64) -> RepoResult<()> {
    sqlx::query("UPDATE product SET stock = stock + ?, updated_at = ? WHERE id = ?")
        .bind(quantity)
        .bind(shared::util::now_millis())
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}
