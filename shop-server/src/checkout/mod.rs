//! Checkout: cart pricing, order placement and order lifecycle

pub mod pricing;
pub mod service;

pub use service::{
    cancel_by_customer, get, get_for_user, list, place_order, quote, update_status,
};
