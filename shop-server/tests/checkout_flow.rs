mod common;

use common::{TestApp, code, id};
use http::StatusCode;
use serde_json::{Value, json};
use shared::ErrorCode;

struct Shop {
    app: TestApp,
    admin: String,
    tee: i64,
    mug: i64,
}

async fn shop() -> Shop {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    app.configure_payments(&admin, 30_000.0).await;
    let tee = app
        .create_product(&admin, json!({ "name": "Áo thun", "price": 200000.0, "stock": 5 }))
        .await;
    let mug = app
        .create_product(&admin, json!({ "name": "Cốc sứ", "price": 100000.0, "stock": 2 }))
        .await;
    Shop {
        tee: id(&tee),
        mug: id(&mug),
        app,
        admin,
    }
}

fn shipping() -> Value {
    json!({ "full_name": "Trần Thị B", "phone": "0912345678", "address": "12 Lê Lợi, Q1, TP.HCM" })
}

impl Shop {
    async fn stock(&self, product_id: i64) -> i64 {
        let (_, product) = self
            .app
            .get(&format!("/api/admin/products/{product_id}"), Some(&self.admin))
            .await;
        product["stock"].as_i64().unwrap()
    }

    async fn place(&self, token: &str, method: &str, voucher: Option<&str>) -> (StatusCode, Value) {
        self.app
            .post(
                "/api/checkout",
                Some(token),
                json!({
                    "items": [
                        { "product_id": self.tee, "quantity": 2 },
                        { "product_id": self.mug, "quantity": 1 }
                    ],
                    "voucher_code": voucher,
                    "payment_method": method,
                    "shipping": shipping()
                }),
            )
            .await
    }
}

#[tokio::test]
async fn test_checkout_with_voucher_and_cancel() {
    let shop = shop().await;
    let app = &shop.app;

    let (status, voucher) = app
        .post(
            "/api/admin/vouchers",
            Some(&shop.admin),
            json!({
                "code": "sale10",
                "name": "Giảm 10%",
                "discount_type": "PERCENTAGE",
                "discount_value": 10.0,
                "max_discount": 40000.0,
                "usage_limit": 1
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{voucher}");
    assert_eq!(voucher["code"], "SALE10");

    let alice = app.customer_token("alice@shop.vn").await;
    let bob = app.customer_token("bob@shop.vn").await;

    // 2 x 200k + 100k = 500k, 10% capped at 40k, flat 30k shipping
    let (status, quote) = app
        .post(
            "/api/checkout/quote",
            Some(&alice),
            json!({
                "items": [
                    { "product_id": shop.tee, "quantity": 1 },
                    { "product_id": shop.mug, "quantity": 1 },
                    { "product_id": shop.tee, "quantity": 1 }
                ],
                "voucher_code": "sale10"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{quote}");
    assert_eq!(quote["lines"].as_array().unwrap().len(), 2);
    assert_eq!(quote["subtotal"], 500000.0);
    assert_eq!(quote["discount"], 40000.0);
    assert_eq!(quote["shipping_fee"], 30000.0);
    assert_eq!(quote["total"], 490000.0);
    assert_eq!(quote["voucher"]["code"], "SALE10");

    let (status, check) = app
        .post(
            "/api/vouchers/check",
            Some(&alice),
            json!({ "code": "SALE10", "items": [{ "product_id": shop.mug, "quantity": 1 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(check["discount"], 10000.0);

    let (status, placed) = shop.place(&alice, "BANK_TRANSFER", Some("SALE10")).await;
    assert_eq!(status, StatusCode::OK, "{placed}");
    let order = &placed["order"];
    let order_id = id(order);
    assert!(order["order_code"].as_str().unwrap().starts_with("DH"));
    assert_eq!(order["status"], "PENDING");
    assert_eq!(order["payment_status"], "UNPAID");
    assert_eq!(order["total"], 490000.0);
    assert_eq!(order["items"].as_array().unwrap().len(), 2);
    assert_eq!(placed["payment"]["method"], "BANK_TRANSFER");
    assert_eq!(placed["payment"]["content"], order["order_code"]);
    assert!(
        placed["payment"]["qr_url"]
            .as_str()
            .unwrap()
            .contains("970436-0123456789")
    );

    assert_eq!(shop.stock(shop.tee).await, 3);
    assert_eq!(shop.stock(shop.mug).await, 1);

    // The single use is taken
    let (status, body) = shop.place(&bob, "COD", Some("SALE10")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(code(&body), ErrorCode::VoucherUsageExhausted.code() as u64);

    // Orders are private
    let (status, _) = app.get(&format!("/api/orders/{order_id}"), Some(&bob)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, mine) = app.get("/api/orders", Some(&alice)).await;
    assert_eq!(mine["total"], 1);
    let (_, theirs) = app.get("/api/orders", Some(&bob)).await;
    assert_eq!(theirs["total"], 0);

    let (status, cancelled) = app
        .post(&format!("/api/orders/{order_id}/cancel"), Some(&alice), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK, "{cancelled}");
    assert_eq!(cancelled["status"], "CANCELLED");
    assert_eq!(shop.stock(shop.tee).await, 5);
    assert_eq!(shop.stock(shop.mug).await, 2);

    let (status, body) = app
        .post(&format!("/api/orders/{order_id}/cancel"), Some(&alice), json!({}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(code(&body), ErrorCode::OrderNotCancellable.code() as u64);

    // Released use is available again
    let (status, body) = shop.place(&bob, "COD", Some("SALE10")).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["order"]["voucher_code"], "SALE10");
    assert!(body["payment"].is_null());
}

#[tokio::test]
async fn test_admin_order_lifecycle() {
    let shop = shop().await;
    let app = &shop.app;
    let customer = app.customer_token("khach@shop.vn").await;

    let (status, placed) = shop.place(&customer, "COD", None).await;
    assert_eq!(status, StatusCode::OK);
    let order_id = id(&placed["order"]);
    let status_uri = format!("/api/admin/orders/{order_id}/status");

    let (status, body) = app
        .put(&status_uri, Some(&shop.admin), json!({ "status": "SHIPPING" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(code(&body), ErrorCode::InvalidOrderTransition.code() as u64);

    let (_, confirmed) = app
        .put(&status_uri, Some(&shop.admin), json!({ "status": "CONFIRMED" }))
        .await;
    assert_eq!(confirmed["status"], "CONFIRMED");

    // Confirmed orders are out of the customer's hands
    let (_, body) = app
        .post(&format!("/api/orders/{order_id}/cancel"), Some(&customer), json!({}))
        .await;
    assert_eq!(code(&body), ErrorCode::OrderNotCancellable.code() as u64);

    let (status, paid) = app
        .post(
            &format!("/api/admin/orders/{order_id}/mark-paid"),
            Some(&shop.admin),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{paid}");
    assert_eq!(paid["payment_status"], "PAID");
    assert!(paid["paid_at"].is_i64());

    let (status, body) = app
        .post(
            &format!("/api/admin/orders/{order_id}/mark-paid"),
            Some(&shop.admin),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(code(&body), ErrorCode::OrderAlreadyPaid.code() as u64);

    let (_, history) = app
        .get(&format!("/api/admin/orders/{order_id}/payments"), Some(&shop.admin))
        .await;
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["method"], "COD");
    assert_eq!(history[0]["status"], "COMPLETED");

    for next in ["SHIPPING", "DELIVERED"] {
        let (status, body) = app
            .put(&status_uri, Some(&shop.admin), json!({ "status": next }))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["status"], next);
    }

    let (_, body) = app
        .put(&status_uri, Some(&shop.admin), json!({ "status": "CANCELLED" }))
        .await;
    assert_eq!(code(&body), ErrorCode::InvalidOrderTransition.code() as u64);

    let (_, listed) = app
        .get("/api/admin/orders?status=DELIVERED", Some(&shop.admin))
        .await;
    assert_eq!(listed["total"], 1);
    let (_, listed) = app
        .get("/api/admin/orders?status=PENDING", Some(&shop.admin))
        .await;
    assert_eq!(listed["total"], 0);

    // Name search ignores case and accents
    for q in ["tr%E1%BA%A7n%20th%E1%BB%8B", "TRAN", "thi%20b"] {
        let (_, listed) = app
            .get(&format!("/api/admin/orders?q={q}"), Some(&shop.admin))
            .await;
        assert_eq!(listed["total"], 1, "q={q}");
    }
    let (_, listed) = app.get("/api/admin/orders?q=nguyen", Some(&shop.admin)).await;
    assert_eq!(listed["total"], 0);
}

#[tokio::test]
async fn test_checkout_rejections() {
    let shop = shop().await;
    let app = &shop.app;
    let customer = app.customer_token("khach@shop.vn").await;

    // Anonymous checkout is not allowed
    let (status, _) = app
        .post("/api/checkout/quote", None, json!({ "items": [] }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, body) = app
        .post("/api/checkout/quote", Some(&customer), json!({ "items": [] }))
        .await;
    assert_eq!(code(&body), ErrorCode::OrderEmpty.code() as u64);

    let (_, body) = app
        .post(
            "/api/checkout/quote",
            Some(&customer),
            json!({ "items": [{ "product_id": shop.tee, "quantity": 0 }] }),
        )
        .await;
    assert_eq!(code(&body), ErrorCode::InvalidQuantity.code() as u64);

    let (status, body) = app
        .post(
            "/api/checkout",
            Some(&customer),
            json!({
                "items": [{ "product_id": shop.mug, "quantity": 3 }],
                "payment_method": "COD",
                "shipping": shipping()
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(code(&body), ErrorCode::ProductOutOfStock.code() as u64);
    assert_eq!(shop.stock(shop.mug).await, 2);

    let (_, body) = app
        .post(
            "/api/checkout",
            Some(&customer),
            json!({
                "items": [{ "product_id": 999, "quantity": 1 }],
                "payment_method": "COD",
                "shipping": shipping()
            }),
        )
        .await;
    assert_eq!(code(&body), ErrorCode::ProductNotFound.code() as u64);

    // Only COD left enabled
    let (status, _) = app
        .put(
            "/api/admin/settings",
            Some(&shop.admin),
            json!({ "site_name": "Shop", "currency": "VND", "shipping_fee": 0.0, "payment_methods": ["COD"] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = shop.place(&customer, "PAYPAL", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(code(&body), ErrorCode::PaymentMethodDisabled.code() as u64);
}

#[tokio::test]
async fn test_free_shipping_threshold() {
    let shop = shop().await;
    let app = &shop.app;
    let (status, _) = app
        .put(
            "/api/admin/settings",
            Some(&shop.admin),
            json!({
                "site_name": "Shop",
                "currency": "VND",
                "shipping_fee": 30000.0,
                "free_shipping_threshold": 300000.0,
                "payment_methods": ["COD"]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let customer = app.customer_token("khach@shop.vn").await;

    let (_, small) = app
        .post(
            "/api/checkout/quote",
            Some(&customer),
            json!({ "items": [{ "product_id": shop.tee, "quantity": 1 }] }),
        )
        .await;
    assert_eq!(small["shipping_fee"], 30000.0);
    assert_eq!(small["total"], 230000.0);

    let (_, large) = app
        .post(
            "/api/checkout/quote",
            Some(&customer),
            json!({ "items": [{ "product_id": shop.tee, "quantity": 2 }] }),
        )
        .await;
    assert_eq!(large["shipping_fee"], 0.0);
    assert_eq!(large["total"], 400000.0);
}
