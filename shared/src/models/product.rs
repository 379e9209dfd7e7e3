//! Product Model

use serde::{Deserialize, Serialize};

/// Product entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub sku: Option<String>,
    pub description: Option<String>,
    /// List price
    pub price: f64,
    /// Discounted price, only honored when below `price`
    pub sale_price: Option<f64>,
    pub stock: i64,
    pub category_id: Option<i64>,
    /// Image URLs, first one is the cover
    #[cfg_attr(feature = "db", sqlx(json))]
    pub images: Vec<String>,
    pub is_active: bool,
    pub is_featured: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Product {
    /// Price the customer pays for one unit
    pub fn effective_price(&self) -> f64 {
        match self.sale_price {
            Some(sale) if sale > 0.0 && sale < self.price => sale,
            _ => self.price,
        }
    }
}

/// Create product payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    pub slug: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub price: f64,
    pub sale_price: Option<f64>,
    pub stock: Option<i64>,
    pub category_id: Option<i64>,
    #[serde(default)]
    pub images: Vec<String>,
    pub is_featured: Option<bool>,
}

/// Update product payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "super::category::double_option")]
    pub sale_price: Option<Option<f64>>,
    pub stock: Option<i64>,
    #[serde(default, deserialize_with = "super::category::double_option")]
    pub category_id: Option<Option<i64>>,
    pub images: Option<Vec<String>>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
}

/// Product list ordering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Name,
}

/// Product list filters (query string)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductQuery {
    /// Free text on name and SKU
    pub q: Option<String>,
    /// Category slug, includes every descendant category
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub featured: Option<bool>,
    #[serde(default)]
    pub sort: ProductSort,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(price: f64, sale_price: Option<f64>) -> Product {
        Product {
            id: 1,
            name: "Tee".into(),
            slug: "tee".into(),
            sku: None,
            description: None,
            price,
            sale_price,
            stock: 10,
            category_id: None,
            images: vec![],
            is_active: true,
            is_featured: false,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_effective_price() {
        assert_eq!(product(100.0, None).effective_price(), 100.0);
        assert_eq!(product(100.0, Some(80.0)).effective_price(), 80.0);
        // A "sale" at or above list price is ignored
        assert_eq!(product(100.0, Some(100.0)).effective_price(), 100.0);
        assert_eq!(product(100.0, Some(120.0)).effective_price(), 100.0);
        assert_eq!(product(100.0, Some(0.0)).effective_price(), 100.0);
    }

    #[test]
    fn test_sort_parses_snake_case() {
        let q: ProductQuery = serde_json::from_str(r#"{"sort":"price_desc"}"#).unwrap();
        assert_eq!(q.sort, ProductSort::PriceDesc);
        let q: ProductQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.sort, ProductSort::Newest);
    }
}
