//! Product operations

use shared::models::{Product, ProductCreate, ProductQuery, ProductUpdate};
use shared::{PageParams, PaginatedResponse};
use sqlx::SqlitePool;

use super::tree;
use crate::db::repository::{category, product, product::ProductFilter};
use crate::utils::slug::{ensure_unique_slug, slug_source};
use crate::utils::validation::{
    MAX_CONTENT_LEN, MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, validate_amount, validate_optional_text,
    validate_required_text, validate_urls,
};
use crate::{AppError, AppResult, ErrorCode};

fn not_found() -> AppError {
    AppError::new(ErrorCode::ProductNotFound)
}

fn check_price(value: f64, field: &str) -> AppResult<()> {
    validate_amount(value, field)
        .map_err(|e| AppError::with_message(ErrorCode::ProductInvalidPrice, e.message))
}

fn check_stock(stock: i64) -> AppResult<()> {
    if stock < 0 {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("stock must be non-negative, got {stock}"),
        ));
    }
    Ok(())
}

async fn check_category(pool: &SqlitePool, category_id: Option<i64>) -> AppResult<()> {
    if let Some(id) = category_id
        && category::find_by_id(pool, id).await?.is_none()
    {
        return Err(AppError::with_message(
            ErrorCode::CategoryNotFound,
            format!("Category {id} not found"),
        ));
    }
    Ok(())
}

/// Empty SKUs are stored as NULL
fn normalize_sku(sku: Option<String>) -> Option<String> {
    sku.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

async fn check_sku(pool: &SqlitePool, sku: Option<&str>, exclude_id: Option<i64>) -> AppResult<()> {
    if let Some(sku) = sku {
        validate_required_text(sku, "sku", MAX_SHORT_TEXT_LEN)?;
        if product::sku_exists(pool, sku, exclude_id).await? {
            return Err(AppError::with_message(
                ErrorCode::ProductSkuExists,
                format!("SKU '{sku}' is already used"),
            ));
        }
    }
    Ok(())
}

async fn unique_slug(pool: &SqlitePool, base: &str, exclude_id: Option<i64>) -> AppResult<String> {
    let slug = ensure_unique_slug(base, |candidate| async move {
        product::slug_exists(pool, &candidate, exclude_id).await
    })
    .await?;
    Ok(slug)
}

/// Turn the category slug of a query into the id set it covers.
///
/// For storefront lookups an inactive category hides its whole subtree.
async fn category_scope(
    pool: &SqlitePool,
    slug: Option<&str>,
    active_only: bool,
) -> AppResult<Option<Vec<i64>>> {
    let Some(slug) = slug.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let mut categories = category::find_all(pool).await?;
    let Some(root_id) = categories.iter().find(|c| c.slug == slug).map(|c| c.id) else {
        return Ok(Some(Vec::new()));
    };

    if active_only {
        let path = tree::breadcrumbs(&categories, root_id);
        let hidden = path.iter().any(|crumb| {
            categories
                .iter()
                .any(|c| c.id == crumb.id && !c.is_active)
        });
        if hidden {
            return Ok(Some(Vec::new()));
        }
        categories.retain(|c| c.is_active);
    }
    Ok(Some(tree::descendant_ids(&categories, root_id)))
}

/// Paginated listing. Storefront callers pass `active_only = true`.
pub async fn list(
    pool: &SqlitePool,
    query: ProductQuery,
    active_only: bool,
) -> AppResult<PaginatedResponse<Product>> {
    let page = PageParams {
        page: query.page,
        limit: query.limit,
    };
    let filter = ProductFilter {
        active_only,
        category_ids: category_scope(pool, query.category.as_deref(), active_only).await?,
        q: query.q,
        min_price: query.min_price,
        max_price: query.max_price,
        featured: query.featured,
        sort: query.sort,
        limit: page.limit(),
        offset: page.offset() as u32,
    };
    let (products, total) = product::search(pool, &filter).await?;
    Ok(PaginatedResponse::new(products, total, page.page(), page.limit()))
}

/// Storefront product page
pub async fn get_by_slug(pool: &SqlitePool, slug: &str) -> AppResult<Product> {
    product::find_by_slug(pool, slug)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(not_found)
}

pub async fn get(pool: &SqlitePool, id: i64) -> AppResult<Product> {
    product::find_by_id(pool, id).await?.ok_or_else(not_found)
}

pub async fn create(pool: &SqlitePool, data: ProductCreate) -> AppResult<Product> {
    validate_required_text(&data.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&data.slug, "slug", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&data.description, "description", MAX_CONTENT_LEN)?;
    validate_urls(&data.images, "images")?;
    check_price(data.price, "price")?;
    if let Some(sale) = data.sale_price {
        check_price(sale, "sale_price")?;
    }
    let stock = data.stock.unwrap_or(0);
    check_stock(stock)?;
    check_category(pool, data.category_id).await?;

    let sku = normalize_sku(data.sku);
    check_sku(pool, sku.as_deref(), None).await?;

    let base = slug_source(data.slug.as_deref(), &data.name);
    let slug = unique_slug(pool, &base, None).await?;

    let now = shared::util::now_millis();
    let new = Product {
        id: shared::util::snowflake_id(),
        name: data.name.trim().to_string(),
        slug,
        sku,
        description: data.description,
        price: data.price,
        sale_price: data.sale_price,
        stock,
        category_id: data.category_id,
        images: data.images,
        is_active: true,
        is_featured: data.is_featured.unwrap_or(false),
        created_at: now,
        updated_at: now,
    };
    let created = product::insert(pool, &new).await?;
    tracing::info!(product_id = created.id, slug = %created.slug, "Product created");
    Ok(created)
}

pub async fn update(pool: &SqlitePool, id: i64, data: ProductUpdate) -> AppResult<Product> {
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
    if data.sku.is_some() {
        let sku = normalize_sku(data.sku);
        check_sku(pool, sku.as_deref(), Some(id)).await?;
        updated.sku = sku;
    }
    if let Some(description) = data.description {
        validate_optional_text(&Some(description.clone()), "description", MAX_CONTENT_LEN)?;
        updated.description = Some(description);
    }
    if let Some(price) = data.price {
        check_price(price, "price")?;
        updated.price = price;
    }
    if let Some(sale_price) = data.sale_price {
        if let Some(sale) = sale_price {
            check_price(sale, "sale_price")?;
        }
        updated.sale_price = sale_price;
    }
    if let Some(stock) = data.stock {
        check_stock(stock)?;
        updated.stock = stock;
    }
    if let Some(category_id) = data.category_id {
        check_category(pool, category_id).await?;
        updated.category_id = category_id;
    }
    if let Some(images) = data.images {
        validate_urls(&images, "images")?;
        updated.images = images;
    }
    if let Some(is_active) = data.is_active {
        updated.is_active = is_active;
    }
    if let Some(is_featured) = data.is_featured {
        updated.is_featured = is_featured;
    }

    updated.updated_at = shared::util::now_millis();
    let saved = product::update_row(pool, &updated).await?;
    tracing::info!(product_id = id, "Product updated");
    Ok(saved)
}

/// Soft delete: the row stays for order history
pub async fn delete(pool: &SqlitePool, id: i64) -> AppResult<()> {
    if !product::deactivate(pool, id).await? {
        return Err(not_found());
    }
    tracing::info!(product_id = id, "Product deactivated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::categories;
    use crate::db::DbService;
    use shared::models::{CategoryCreate, CategoryUpdate, ProductSort};

    async fn pool() -> SqlitePool {
        DbService::in_memory().await.unwrap().pool
    }

    fn item(name: &str, price: f64) -> ProductCreate {
        ProductCreate {
            name: name.into(),
            price,
            stock: Some(10),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_validates() {
        let pool = pool().await;

        let err = create(&pool, item("Bad", -1.0)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ProductInvalidPrice);

        let err = create(
            &pool,
            ProductCreate {
                category_id: Some(999),
                ..item("Orphan", 10.0)
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::CategoryNotFound);

        create(
            &pool,
            ProductCreate {
                sku: Some("TEE-1".into()),
                ..item("Tee", 10.0)
            },
        )
        .await
        .unwrap();
        let err = create(
            &pool,
            ProductCreate {
                sku: Some("TEE-1".into()),
                ..item("Tee 2", 10.0)
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ProductSkuExists);
    }

    #[tokio::test]
    async fn test_slug_namespace_is_separate_from_categories() {
        let pool = pool().await;
        categories::create(
            &pool,
            5,
            CategoryCreate {
                name: "Áo thun".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let a = create(&pool, item("Áo thun", 100.0)).await.unwrap();
        let b = create(&pool, item("Áo thun", 120.0)).await.unwrap();
        assert_eq!(a.slug, "ao-thun");
        assert_eq!(b.slug, "ao-thun-1");
    }

    #[tokio::test]
    async fn test_update_clears_sale_price_and_keeps_sku() {
        let pool = pool().await;
        let p = create(
            &pool,
            ProductCreate {
                sku: Some("SKU-9".into()),
                sale_price: Some(80.0),
                ..item("Hat", 100.0)
            },
        )
        .await
        .unwrap();
        assert_eq!(p.effective_price(), 80.0);

        let updated = update(
            &pool,
            p.id,
            ProductUpdate {
                sale_price: Some(None),
                sku: Some("SKU-9".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.sale_price, None);
        assert_eq!(updated.sku.as_deref(), Some("SKU-9"));
    }

    #[tokio::test]
    async fn test_storefront_listing() {
        let pool = pool().await;
        let fashion = categories::create(
            &pool,
            5,
            CategoryCreate {
                name: "Fashion".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let shirts = categories::create(
            &pool,
            5,
            CategoryCreate {
                name: "Shirts".into(),
                parent_id: Some(fashion.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        create(
            &pool,
            ProductCreate {
                category_id: Some(shirts.id),
                sale_price: Some(50.0),
                ..item("Linen Shirt", 200.0)
            },
        )
        .await
        .unwrap();
        create(
            &pool,
            ProductCreate {
                category_id: Some(fashion.id),
                ..item("Scarf", 100.0)
            },
        )
        .await
        .unwrap();
        let hidden = create(&pool, item("Old Phone", 10.0)).await.unwrap();
        delete(&pool, hidden.id).await.unwrap();

        // Parent category includes descendants
        let page = list(
            &pool,
            ProductQuery {
                category: Some("fashion".into()),
                sort: ProductSort::PriceAsc,
                ..Default::default()
            },
            true,
        )
        .await
        .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.data[0].name, "Linen Shirt");

        // Price filters use the sale price
        let page = list(
            &pool,
            ProductQuery {
                max_price: Some(60.0),
                ..Default::default()
            },
            true,
        )
        .await
        .unwrap();
        assert_eq!(page.total, 1);

        // Case-insensitive search
        let page = list(
            &pool,
            ProductQuery {
                q: Some("SCARF".into()),
                ..Default::default()
            },
            true,
        )
        .await
        .unwrap();
        assert_eq!(page.total, 1);

        // Soft-deleted products only show up for admins
        assert_eq!(list(&pool, ProductQuery::default(), true).await.unwrap().total, 2);
        assert_eq!(list(&pool, ProductQuery::default(), false).await.unwrap().total, 3);
        assert_eq!(
            get_by_slug(&pool, &hidden.slug).await.unwrap_err().code,
            ErrorCode::ProductNotFound
        );

        // An inactive category hides its subtree and unknown slugs match nothing
        categories::update(
            &pool,
            5,
            fashion.id,
            CategoryUpdate {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        for slug in ["shirts", "nope"] {
            let page = list(
                &pool,
                ProductQuery {
                    category: Some(slug.into()),
                    ..Default::default()
                },
                true,
            )
            .await
            .unwrap();
            assert_eq!(page.total, 0, "slug {slug}");
        }
    }
}
