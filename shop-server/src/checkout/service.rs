//! Order placement and lifecycle

use shared::models::{
    AppliedVoucher, CheckoutRequest, CheckoutResponse, Order, OrderItem, OrderQuery, OrderStatus,
    PaymentStatus, Quote, QuoteRequest, ShippingInfo, Voucher,
};
use shared::{PageParams, PaginatedResponse};
use sqlx::{SqliteConnection, SqlitePool};

use super::pricing::{self, PricedLine, Totals};
use crate::db::repository::{RepoError, order, product, setting, voucher};
use crate::payments::service::instructions_for;
use crate::utils::money::to_f64;
use crate::utils::validation::{
    MAX_ADDRESS_LEN, MAX_NAME_LEN, MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, validate_optional_text,
    validate_required_text,
};
use crate::vouchers::{self, Discount};
use crate::{AppError, AppResult, ErrorCode};

/// Priced cart with its optional voucher, shared by quote and checkout
struct PricedCart {
    lines: Vec<PricedLine>,
    voucher: Option<(Voucher, Discount)>,
    totals: Totals,
}

async fn price_cart(
    pool: &SqlitePool,
    user_id: i64,
    req: &QuoteRequest,
    settings: &shared::models::SiteSettings,
) -> AppResult<PricedCart> {
    let lines = pricing::price_items(pool, &req.items).await?;

    let voucher = match req
        .voucher_code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
    {
        Some(code) => {
            let cart = pricing::cart_lines(&lines);
            Some(vouchers::evaluate(pool, code, user_id, &cart, req.payment_method).await?)
        }
        None => None,
    };

    let discount = voucher
        .as_ref()
        .map(|(_, d)| d.discount)
        .unwrap_or_default();
    let totals = pricing::totals(&lines, discount, settings);
    Ok(PricedCart {
        lines,
        voucher,
        totals,
    })
}

fn to_quote(cart: &PricedCart) -> Quote {
    Quote {
        lines: cart.lines.iter().map(PricedLine::to_quote_line).collect(),
        subtotal: to_f64(cart.totals.subtotal),
        discount: to_f64(cart.totals.discount),
        shipping_fee: to_f64(cart.totals.shipping_fee),
        total: to_f64(cart.totals.total),
        voucher: cart.voucher.as_ref().map(|(v, d)| AppliedVoucher {
            id: v.id,
            code: v.code.clone(),
            discount: to_f64(d.discount),
            eligible_subtotal: to_f64(d.eligible_subtotal),
        }),
    }
}

/// Cart preview without side effects
pub async fn quote(pool: &SqlitePool, user_id: i64, req: QuoteRequest) -> AppResult<Quote> {
    let settings = setting::get_site(pool).await?;
    let cart = price_cart(pool, user_id, &req, &settings).await?;
    Ok(to_quote(&cart))
}

fn validate_shipping(shipping: &ShippingInfo) -> AppResult<()> {
    validate_required_text(&shipping.full_name, "full_name", MAX_NAME_LEN)?;
    validate_required_text(&shipping.phone, "phone", MAX_SHORT_TEXT_LEN)?;
    validate_required_text(&shipping.address, "address", MAX_ADDRESS_LEN)?;
    validate_optional_text(&shipping.note, "note", MAX_NOTE_LEN)?;
    Ok(())
}

/// Place an order.
///
/// Order rows, stock and the voucher redemption are written in one
/// transaction: a missing unit or an exhausted voucher leaves nothing behind.
pub async fn place_order(
    pool: &SqlitePool,
    user_id: i64,
    req: CheckoutRequest,
) -> AppResult<CheckoutResponse> {
    let settings = setting::get_site(pool).await?;
    if !settings.is_enabled(req.payment_method) {
        return Err(AppError::new(ErrorCode::PaymentMethodDisabled)
            .with_detail("payment_method", req.payment_method.as_str()));
    }
    validate_shipping(&req.shipping)?;

    let quote_req = QuoteRequest {
        items: req.items,
        voucher_code: req.voucher_code,
        payment_method: Some(req.payment_method),
    };
    let cart = price_cart(pool, user_id, &quote_req, &settings).await?;

    let now = shared::util::now_millis();
    let order_id = shared::util::snowflake_id();
    let shipping = req.shipping;
    let new_order = Order {
        id: order_id,
        order_code: shared::util::order_code(),
        user_id,
        status: OrderStatus::Pending,
        payment_method: req.payment_method,
        payment_status: PaymentStatus::Unpaid,
        subtotal: to_f64(cart.totals.subtotal),
        discount: to_f64(cart.totals.discount),
        shipping_fee: to_f64(cart.totals.shipping_fee),
        total: to_f64(cart.totals.total),
        voucher_id: cart.voucher.as_ref().map(|(v, _)| v.id),
        voucher_code: cart.voucher.as_ref().map(|(v, _)| v.code.clone()),
        shipping_name: shipping.full_name.trim().to_string(),
        shipping_phone: shipping.phone.trim().to_string(),
        shipping_address: shipping.address.trim().to_string(),
        note: shipping.note,
        paid_at: None,
        created_at: now,
        updated_at: now,
        items: cart
            .lines
            .iter()
            .map(|line| OrderItem {
                id: shared::util::snowflake_id(),
                order_id,
                product_id: line.product.id,
                product_name: line.product.name.clone(),
                unit_price: line.unit_price,
                quantity: line.quantity,
                line_total: to_f64(line.line_total),
            })
            .collect(),
    };

    let mut tx = pool.begin().await.map_err(RepoError::from)?;
    order::insert(&mut *tx, &new_order).await?;
    for line in &cart.lines {
        if !product::decrement_stock(&mut *tx, line.product.id, line.quantity).await? {
            return Err(pricing::out_of_stock(&line.product));
        }
    }
    if let Some((v, _)) = &cart.voucher {
        voucher::redeem(&mut *tx, v.id, user_id, order_id, now).await?;
    }
    let placed = order::find_by_id(&mut *tx, order_id)
        .await?
        .ok_or_else(|| AppError::internal("Order vanished after insert"))?;
    tx.commit().await.map_err(RepoError::from)?;

    tracing::info!(
        order_id,
        order_code = %placed.order_code,
        user_id,
        total = placed.total,
        payment_method = placed.payment_method.as_str(),
        voucher = ?placed.voucher_code,
        "Order placed"
    );

    let payment = instructions_for(&settings, &placed);
    Ok(CheckoutResponse {
        order: placed,
        payment,
    })
}

fn order_not_found() -> AppError {
    AppError::new(ErrorCode::OrderNotFound)
}

pub async fn get(pool: &SqlitePool, id: i64) -> AppResult<Order> {
    order::get(pool, id).await?.ok_or_else(order_not_found)
}

/// Customers only ever see their own orders
pub async fn get_for_user(pool: &SqlitePool, user_id: i64, id: i64) -> AppResult<Order> {
    let found = get(pool, id).await?;
    if found.user_id != user_id {
        return Err(order_not_found());
    }
    Ok(found)
}

/// Paginated search; restricted to `user_id` when given
pub async fn list(
    pool: &SqlitePool,
    user_id: Option<i64>,
    query: OrderQuery,
) -> AppResult<PaginatedResponse<Order>> {
    let page = PageParams {
        page: query.page,
        limit: query.limit,
    };
    let (orders, total) =
        order::search(pool, user_id, &query, page.limit(), page.offset() as u32).await?;
    Ok(PaginatedResponse::new(orders, total, page.page(), page.limit()))
}

/// Give back the stock and voucher use held by a cancelled order
async fn release_holds(conn: &mut SqliteConnection, cancelled: &Order) -> AppResult<()> {
    for item in &cancelled.items {
        product::restore_stock(conn, item.product_id, item.quantity).await?;
    }
    if voucher::release(conn, cancelled.id).await? {
        tracing::info!(order_id = cancelled.id, "Voucher use released");
    }
    Ok(())
}

/// Apply a lifecycle step. The write re-checks the status it was planned
/// from and, when `require_unpaid`, that no payment has landed since.
async fn transition(
    pool: &SqlitePool,
    current: &Order,
    next: OrderStatus,
    require_unpaid: bool,
) -> AppResult<Order> {
    if !current.status.can_transition_to(next) {
        return Err(AppError::with_message(
            ErrorCode::InvalidOrderTransition,
            format!("Cannot move order from {:?} to {:?}", current.status, next),
        )
        .with_detail("from", serde_json::to_value(current.status).unwrap_or_default())
        .with_detail("to", serde_json::to_value(next).unwrap_or_default()));
    }

    let now = shared::util::now_millis();
    let mut tx = pool.begin().await.map_err(RepoError::from)?;
    order::update_status(&mut *tx, current.id, current.status, next, require_unpaid, now)
        .await
        .map_err(|e| match e {
            RepoError::Validation(_) if require_unpaid => {
                AppError::new(ErrorCode::OrderNotCancellable)
            }
            RepoError::Validation(msg) => {
                AppError::with_message(ErrorCode::InvalidOrderTransition, msg)
            }
            other => other.into(),
        })?;
    if next == OrderStatus::Cancelled {
        release_holds(&mut *tx, current).await?;
    }
    let updated = order::find_by_id(&mut *tx, current.id)
        .await?
        .ok_or_else(order_not_found)?;
    tx.commit().await.map_err(RepoError::from)?;

    tracing::info!(
        order_id = current.id,
        from = ?current.status,
        to = ?next,
        payment_status = ?updated.payment_status,
        "Order status changed"
    );
    Ok(updated)
}

/// Customers may cancel while the order is pending and nothing was paid
pub async fn cancel_by_customer(pool: &SqlitePool, user_id: i64, id: i64) -> AppResult<Order> {
    let current = get_for_user(pool, user_id, id).await?;
    let unpaid = matches!(current.payment_status, PaymentStatus::Unpaid | PaymentStatus::Failed);
    if current.status != OrderStatus::Pending || !unpaid {
        return Err(AppError::new(ErrorCode::OrderNotCancellable));
    }
    transition(pool, &current, OrderStatus::Cancelled, true).await
}

/// Admin status change following the order lifecycle
pub async fn update_status(pool: &SqlitePool, id: i64, next: OrderStatus) -> AppResult<Order> {
    let current = get(pool, id).await?;
    transition(pool, &current, next, false).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::products;
    use crate::db::DbService;
    use crate::db::repository::user;
    use crate::vouchers::tests::create_payload;
    use shared::models::{
        CheckoutItem, DiscountType, PaymentMethod, PaymentInstructions, ProductCreate, BankSettings,
    };

    struct Fixture {
        pool: SqlitePool,
        user_id: i64,
        tee: i64,
        mug: i64,
    }

    async fn fixture() -> Fixture {
        let pool = DbService::in_memory().await.unwrap().pool;
        let customer = user::create(
            &pool,
            user::NewUser {
                email: "buyer@shop.vn",
                password_hash: "x",
                full_name: "Buyer",
                phone: None,
                role_id: None,
            },
        )
        .await
        .unwrap();
        let tee = products::create(
            &pool,
            ProductCreate {
                name: "Tee".into(),
                price: 200_000.0,
                sale_price: Some(150_000.0),
                stock: Some(5),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let mug = products::create(
            &pool,
            ProductCreate {
                name: "Mug".into(),
                price: 50_000.0,
                stock: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        Fixture {
            pool,
            user_id: customer.id,
            tee: tee.id,
            mug: mug.id,
        }
    }

    fn shipping() -> ShippingInfo {
        ShippingInfo {
            full_name: "Nguyễn Văn A".into(),
            phone: "0900000000".into(),
            address: "1 Lê Lợi, Quận 1".into(),
            note: None,
        }
    }

    fn request(items: Vec<CheckoutItem>, voucher_code: Option<&str>) -> CheckoutRequest {
        CheckoutRequest {
            items,
            voucher_code: voucher_code.map(String::from),
            payment_method: PaymentMethod::Cod,
            shipping: shipping(),
        }
    }

    fn item(product_id: i64, quantity: i64) -> CheckoutItem {
        CheckoutItem {
            product_id,
            quantity,
        }
    }

    async fn stock(pool: &SqlitePool, id: i64) -> i64 {
        product::find_by_id(pool, id).await.unwrap().unwrap().stock
    }

    #[tokio::test]
    async fn test_quote_merges_lines_and_applies_voucher() {
        let f = fixture().await;
        vouchers::create(&f.pool, create_payload("GIAM10", DiscountType::Percentage, 10.0))
            .await
            .unwrap();

        let q = quote(
            &f.pool,
            f.user_id,
            QuoteRequest {
                items: vec![item(f.tee, 1), item(f.mug, 1), item(f.tee, 1)],
                voucher_code: Some("giam10".into()),
                payment_method: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(q.lines.len(), 2);
        assert_eq!(q.lines[0].quantity, 2);
        assert_eq!(q.lines[0].unit_price, 150_000.0);
        assert_eq!(q.subtotal, 350_000.0);
        assert_eq!(q.discount, 35_000.0);
        assert_eq!(q.shipping_fee, 30_000.0);
        assert_eq!(q.total, 345_000.0);
        assert_eq!(q.voucher.unwrap().code, "GIAM10");
    }

    #[tokio::test]
    async fn test_place_order_takes_stock_and_voucher() {
        let f = fixture().await;
        let mut payload = create_payload("ONCE", DiscountType::FixedAmount, 20_000.0);
        payload.usage_limit = Some(1);
        let v = vouchers::create(&f.pool, payload).await.unwrap();

        let placed = place_order(&f.pool, f.user_id, request(vec![item(f.tee, 2)], Some("once")))
            .await
            .unwrap();
        let order = placed.order;
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Unpaid);
        assert_eq!(order.total, 300_000.0 - 20_000.0 + 30_000.0);
        assert_eq!(order.items.len(), 1);
        assert!(order.order_code.starts_with("DH"));
        assert!(placed.payment.is_none());
        assert_eq!(stock(&f.pool, f.tee).await, 3);
        assert_eq!(vouchers::get(&f.pool, v.id).await.unwrap().used_count, 1);

        // Quota is now used up
        let err = place_order(&f.pool, f.user_id, request(vec![item(f.tee, 1)], Some("ONCE")))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::VoucherUsageExhausted);
        assert_eq!(stock(&f.pool, f.tee).await, 3);
    }

    #[tokio::test]
    async fn test_out_of_stock_and_disabled_method() {
        let f = fixture().await;
        let err = place_order(&f.pool, f.user_id, request(vec![item(f.mug, 3)], None))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ProductOutOfStock);

        let mut req = request(vec![item(f.mug, 1)], None);
        req.payment_method = PaymentMethod::Paypal;
        let err = place_order(&f.pool, f.user_id, req).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentMethodDisabled);

        let err = place_order(&f.pool, f.user_id, request(vec![item(424242, 1)], None))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ProductNotFound);
    }

    #[tokio::test]
    async fn test_bank_transfer_returns_instructions() {
        let f = fixture().await;
        let settings = shared::models::SiteSettings {
            bank: Some(BankSettings {
                bank_bin: "970436".into(),
                bank_name: "Vietcombank".into(),
                account_no: "0011".into(),
                account_name: "SHOP".into(),
                template: "compact2".into(),
            }),
            ..Default::default()
        };
        setting::save_site(&f.pool, &settings).await.unwrap();

        let mut req = request(vec![item(f.mug, 1)], None);
        req.payment_method = PaymentMethod::BankTransfer;
        let placed = place_order(&f.pool, f.user_id, req).await.unwrap();
        match placed.payment {
            Some(PaymentInstructions::BankTransfer(bank)) => {
                assert_eq!(bank.content, placed.order.order_code);
                assert_eq!(bank.amount, 80_000.0);
            }
            other => panic!("unexpected instructions: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_customer_cancel_restores_everything() {
        let f = fixture().await;
        let v = vouchers::create(&f.pool, create_payload("BACK", DiscountType::FixedAmount, 1_000.0))
            .await
            .unwrap();
        let placed = place_order(
            &f.pool,
            f.user_id,
            request(vec![item(f.tee, 2), item(f.mug, 1)], Some("BACK")),
        )
        .await
        .unwrap();
        let id = placed.order.id;

        // Someone else's order is invisible
        let err = cancel_by_customer(&f.pool, f.user_id + 1, id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderNotFound);

        let cancelled = cancel_by_customer(&f.pool, f.user_id, id).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(stock(&f.pool, f.tee).await, 5);
        assert_eq!(stock(&f.pool, f.mug).await, 2);
        assert_eq!(vouchers::get(&f.pool, v.id).await.unwrap().used_count, 0);

        let err = cancel_by_customer(&f.pool, f.user_id, id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderNotCancellable);
    }

    #[tokio::test]
    async fn test_admin_transitions() {
        let f = fixture().await;
        let placed = place_order(&f.pool, f.user_id, request(vec![item(f.mug, 1)], None))
            .await
            .unwrap();
        let id = placed.order.id;

        let err = update_status(&f.pool, id, OrderStatus::Delivered).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidOrderTransition);

        update_status(&f.pool, id, OrderStatus::Confirmed).await.unwrap();
        // Customers can no longer cancel a confirmed order
        let err = cancel_by_customer(&f.pool, f.user_id, id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderNotCancellable);

        update_status(&f.pool, id, OrderStatus::Shipping).await.unwrap();
        let err = update_status(&f.pool, id, OrderStatus::Cancelled).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidOrderTransition);
        let done = update_status(&f.pool, id, OrderStatus::Delivered).await.unwrap();
        assert_eq!(done.status, OrderStatus::Delivered);
        assert_eq!(stock(&f.pool, f.mug).await, 1);

        let page = list(&f.pool, Some(f.user_id), OrderQuery::default()).await.unwrap();
        assert_eq!(page.total, 1);
        let page = list(
            &f.pool,
            None,
            OrderQuery {
                status: Some(OrderStatus::Pending),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_cancel_planned_before_payment_is_refused() {
        let f = fixture().await;
        let placed = place_order(&f.pool, f.user_id, request(vec![item(f.tee, 2)], None))
            .await
            .unwrap();
        let id = placed.order.id;

        // The cancel was planned from an UNPAID snapshot, then the money arrived
        let stale = get_for_user(&f.pool, f.user_id, id).await.unwrap();
        crate::payments::service::mark_paid(&f.pool, id).await.unwrap();

        let err = transition(&f.pool, &stale, OrderStatus::Cancelled, true)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderNotCancellable);

        let now = get(&f.pool, id).await.unwrap();
        assert_eq!(now.status, OrderStatus::Pending);
        assert_eq!(now.payment_status, PaymentStatus::Paid);
        assert_eq!(stock(&f.pool, f.tee).await, 3);
    }

    #[tokio::test]
    async fn test_admin_cancel_of_paid_order_refunds() {
        let f = fixture().await;
        let placed = place_order(&f.pool, f.user_id, request(vec![item(f.mug, 1)], None))
            .await
            .unwrap();
        let id = placed.order.id;
        update_status(&f.pool, id, OrderStatus::Confirmed).await.unwrap();
        crate::payments::service::mark_paid(&f.pool, id).await.unwrap();

        let cancelled = update_status(&f.pool, id, OrderStatus::Cancelled).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(cancelled.payment_status, PaymentStatus::Refunded);
        assert_eq!(stock(&f.pool, f.mug).await, 2);

        // An unpaid cancel keeps its payment status
        let placed = place_order(&f.pool, f.user_id, request(vec![item(f.mug, 1)], None))
            .await
            .unwrap();
        let cancelled = update_status(&f.pool, placed.order.id, OrderStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(cancelled.payment_status, PaymentStatus::Unpaid);
    }

    #[tokio::test]
    async fn test_redeem_holds_per_user_limit_inside_the_write() {
        let f = fixture().await;
        let mut payload = create_payload("MOTLAN", DiscountType::FixedAmount, 5_000.0);
        payload.per_user_limit = Some(1);
        let v = vouchers::create(&f.pool, payload).await.unwrap();

        // Two checkouts that both passed the pre-check before either committed
        let first = place_order(&f.pool, f.user_id, request(vec![item(f.mug, 1)], None))
            .await
            .unwrap();
        let second = place_order(&f.pool, f.user_id, request(vec![item(f.mug, 1)], None))
            .await
            .unwrap();

        let mut conn = f.pool.acquire().await.unwrap();
        voucher::redeem(&mut *conn, v.id, f.user_id, first.order.id, 1).await.unwrap();
        let err: AppError = voucher::redeem(&mut *conn, v.id, f.user_id, second.order.id, 2)
            .await
            .unwrap_err()
            .into();
        assert_eq!(err.code, ErrorCode::VoucherUserLimitReached);
        drop(conn);
        assert_eq!(vouchers::get(&f.pool, v.id).await.unwrap().used_count, 1);
    }
}
