//! End-to-end checkout over the RPC surface.

use tiendita_grpc::proto;
use tiendita_grpc::proto::shop_service_server::ShopService;
use tiendita_integration_tests::{Harness, request_as};
use tiendita_store::ShopBackend;
use tiendita_store::models::BillingSnapshot;

fn snapshot() -> BillingSnapshot {
    BillingSnapshot {
        line1: "Calle Mayor 1".to_string(),
        line2: None,
        city: "Madrid".to_string(),
        state: "Madrid".to_string(),
        postal_code: "28001".to_string(),
        country: "ES".to_string(),
    }
}

async fn add_default_shipping(harness: &Harness) {
    harness
        .shop
        .add_address(request_as(
            "shopper",
            proto::AddAddressRequest {
                kind: proto::AddressKind::Shipping as i32,
                name: "Home".to_string(),
                line1: "Calle Mayor 1".to_string(),
                line2: String::new(),
                city: "Madrid".to_string(),
                state: "Madrid".to_string(),
                postal_code: "28001".to_string(),
                country: "ES".to_string(),
                is_default: true,
            },
        ))
        .await
        .expect("add shipping address");
}

async fn shopper_id(harness: &Harness) -> tiendita_core::UserId {
    harness
        .backend
        .resolve_token("shopper")
        .await
        .expect("lookup")
        .expect("user")
        .id
}

#[tokio::test]
async fn checkout_walks_through_both_suspensions() {
    let harness = Harness::new();
    let product = harness.backend.add_product("Olive oil 1L", 1250, 10);

    harness
        .shop
        .add_to_cart(request_as(
            "shopper",
            proto::AddToCartRequest {
                product_id: product.to_string(),
                quantity: 2,
            },
        ))
        .await
        .expect("add to cart");

    // No shipping address yet.
    let first = harness
        .shop
        .checkout(request_as("shopper", proto::CheckoutRequest {}))
        .await
        .expect("checkout")
        .into_inner();
    assert_eq!(
        first.status,
        proto::CheckoutStatus::NeedsShippingAddress as i32
    );

    add_default_shipping(&harness).await;

    // Shipping present, billing snapshot still missing.
    let second = harness
        .shop
        .checkout(request_as("shopper", proto::CheckoutRequest {}))
        .await
        .expect("checkout")
        .into_inner();
    assert_eq!(
        second.status,
        proto::CheckoutStatus::NeedsBillingAddress as i32
    );

    // Fill the snapshot through the profile RPC.
    harness
        .shop
        .update_profile(request_as(
            "shopper",
            proto::UpdateProfileRequest {
                billing_address: Some(proto::BillingAddressPatch {
                    line1: Some("Calle Mayor 1".to_string()),
                    city: Some("Madrid".to_string()),
                    state: Some("Madrid".to_string()),
                    postal_code: Some("28001".to_string()),
                    country: Some("ES".to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            },
        ))
        .await
        .expect("update profile");

    let third = harness
        .shop
        .checkout(request_as("shopper", proto::CheckoutRequest {}))
        .await
        .expect("checkout")
        .into_inner();
    assert_eq!(third.status, proto::CheckoutStatus::Completed as i32);
    assert_eq!(third.total, 2500);

    // Suspended attempts created nothing; the completed one created one order.
    let orders = harness
        .shop
        .list_my_orders(request_as("shopper", proto::ListMyOrdersRequest {}))
        .await
        .expect("orders")
        .into_inner()
        .orders;
    assert_eq!(orders.len(), 1);
}

#[tokio::test]
async fn order_items_match_cart_snapshot() {
    let harness = Harness::new();
    let user_id = shopper_id(&harness).await;
    let oil = harness.backend.add_product("Olive oil 1L", 1250, 10);
    let rice = harness.backend.add_product("Arborio rice 1kg", 480, 10);
    add_default_shipping(&harness).await;
    harness.backend.set_billing_snapshot(user_id, snapshot());

    for (product, quantity) in [(oil, 2), (rice, 3)] {
        harness
            .shop
            .add_to_cart(request_as(
                "shopper",
                proto::AddToCartRequest {
                    product_id: product.to_string(),
                    quantity,
                },
            ))
            .await
            .expect("add to cart");
    }

    let response = harness
        .shop
        .checkout(request_as("shopper", proto::CheckoutRequest {}))
        .await
        .expect("checkout")
        .into_inner();
    assert_eq!(response.status, proto::CheckoutStatus::Completed as i32);
    assert_eq!(response.total, 2 * 1250 + 3 * 480);

    let orders = harness
        .shop
        .list_my_orders(request_as("shopper", proto::ListMyOrdersRequest {}))
        .await
        .expect("orders")
        .into_inner()
        .orders;
    assert_eq!(orders.len(), 1);
    let items = &orders[0].items;
    assert_eq!(items.len(), 2);

    let oil_item = items
        .iter()
        .find(|i| i.product_id == oil.to_string())
        .expect("oil line");
    assert_eq!(oil_item.quantity, 2);
    assert_eq!(oil_item.price_at_time, 1250);
    assert_eq!(oil_item.product_name, "Olive oil 1L");

    let rice_item = items
        .iter()
        .find(|i| i.product_id == rice.to_string())
        .expect("rice line");
    assert_eq!(rice_item.quantity, 3);
    assert_eq!(rice_item.price_at_time, 480);

    // Cart emptied.
    let count = harness
        .shop
        .get_cart_count(request_as("shopper", proto::GetCartCountRequest {}))
        .await
        .expect("count")
        .into_inner()
        .count;
    assert_eq!(count, 0);
}

#[tokio::test]
async fn price_at_time_survives_catalog_edits() {
    let harness = Harness::new();
    let user_id = shopper_id(&harness).await;
    let product = harness.backend.add_product("Olive oil 1L", 1250, 10);
    add_default_shipping(&harness).await;
    harness.backend.set_billing_snapshot(user_id, snapshot());

    harness
        .shop
        .add_to_cart(request_as(
            "shopper",
            proto::AddToCartRequest {
                product_id: product.to_string(),
                quantity: 1,
            },
        ))
        .await
        .expect("add to cart");
    harness
        .shop
        .checkout(request_as("shopper", proto::CheckoutRequest {}))
        .await
        .expect("checkout");

    // Raise the catalog price after the purchase.
    use tiendita_grpc::proto::shop_admin_service_server::ShopAdminService;
    harness
        .admin
        .update_product(request_as(
            "root",
            proto::UpdateProductRequest {
                id: product.to_string(),
                price: Some(9999),
                ..Default::default()
            },
        ))
        .await
        .expect("reprice");

    let orders = harness
        .shop
        .list_my_orders(request_as("shopper", proto::ListMyOrdersRequest {}))
        .await
        .expect("orders")
        .into_inner()
        .orders;
    assert_eq!(orders[0].items[0].price_at_time, 1250);
    assert_eq!(orders[0].total_amount, 1250);
}

#[tokio::test]
async fn billing_rows_accumulate_per_checkout() {
    let harness = Harness::new();
    let user_id = shopper_id(&harness).await;
    let product = harness.backend.add_product("Olive oil 1L", 1250, 10);
    add_default_shipping(&harness).await;
    harness.backend.set_billing_snapshot(user_id, snapshot());

    for _ in 0..3 {
        harness
            .shop
            .add_to_cart(request_as(
                "shopper",
                proto::AddToCartRequest {
                    product_id: product.to_string(),
                    quantity: 1,
                },
            ))
            .await
            .expect("add to cart");
        harness
            .shop
            .checkout(request_as("shopper", proto::CheckoutRequest {}))
            .await
            .expect("checkout");
    }

    let billing = harness
        .shop
        .list_addresses(request_as(
            "shopper",
            proto::ListAddressesRequest {
                kind: proto::AddressKind::Billing as i32,
            },
        ))
        .await
        .expect("billing addresses")
        .into_inner()
        .addresses;
    assert_eq!(billing.len(), 3);
    assert_eq!(billing.iter().filter(|a| a.is_default).count(), 1);
    // The default-first ordering puts the latest row up front.
    assert!(billing[0].is_default);
}

#[tokio::test]
async fn overdraft_fails_checkout_and_keeps_cart() {
    let harness = Harness::new();
    let user_id = shopper_id(&harness).await;
    let product = harness.backend.add_product("Olive oil 1L", 1250, 2);
    add_default_shipping(&harness).await;
    harness.backend.set_billing_snapshot(user_id, snapshot());

    // Write the overdrafted row directly; the RPC's advisory check would
    // catch it, the order transaction must too.
    harness
        .backend
        .upsert_cart_item(user_id, product, 5)
        .await
        .expect("seed cart");

    let err = harness
        .shop
        .checkout(request_as("shopper", proto::CheckoutRequest {}))
        .await
        .unwrap_err();
    assert_eq!(err.code(), tonic::Code::FailedPrecondition);

    let count = harness
        .shop
        .get_cart_count(request_as("shopper", proto::GetCartCountRequest {}))
        .await
        .expect("count")
        .into_inner()
        .count;
    assert_eq!(count, 1);
}
