//! Catalog: category forest and products

pub mod categories;
pub mod products;
pub mod tree;
