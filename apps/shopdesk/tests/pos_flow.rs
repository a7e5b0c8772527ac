//! End-to-end checkout against an in-memory database.

use chrono::Utc;
use uuid::Uuid;

use shopdesk::config::ShopConfig;
use shopdesk::error::ErrorCode;
use shopdesk::App;
use shopdesk_core::customer::{CustomerFilter, CustomerInput, CustomerSort, LoyaltyLevel};
use shopdesk_core::order::{DeliveryDetails, SalesPeriod};
use shopdesk_core::product::{Product, ProductVariant};
use shopdesk_core::{CheckoutPhase, CustomerRef, DeliveryMethod, LineKey, Money, OrderStatus, PaymentMethod};
use shopdesk_db::repository::product::generate_product_id;

async fn app() -> App {
    App::in_memory(ShopConfig::default()).await.unwrap()
}

async fn stock_phone(app: &App, price: i64, stock: i64) -> ProductVariant {
    let product = Product {
        id: generate_product_id(),
        name: "Tecno Spark 20".into(),
        brand_id: None,
        category_id: None,
        description: None,
        is_active: true,
        created_at: Utc::now(),
    };
    let variant = ProductVariant {
        id: Uuid::new_v4().to_string(),
        product_id: product.id.clone(),
        name: "128GB".into(),
        sku: None,
        selling_price: Money::from_minor(price),
        wholesale_price: Some(Money::from_minor(price - 100_000)),
        cost_price: Some(Money::from_minor(price / 2)),
        stock_quantity: stock,
        is_active: true,
    };
    app.db
        .products()
        .insert(&product, std::slice::from_ref(&variant))
        .await
        .unwrap();
    variant
}

async fn walk_in(app: &App, name: &str, phone: &str) -> CustomerRef {
    let customer = app
        .customers
        .create(CustomerInput {
            name: name.into(),
            phone: phone.into(),
            ..Default::default()
        })
        .await
        .unwrap();
    CustomerRef {
        id: customer.id,
        name: customer.name,
        phone: Some(customer.phone),
    }
}

#[tokio::test]
async fn test_pickup_sale_end_to_end() {
    let app = app().await;
    let phone = stock_phone(&app, 1_500_000, 3).await;
    let amina = walk_in(&app, "Amina", "0712345678").await;

    let found = app.pos.search_products("spark").await.unwrap();
    assert_eq!(found.len(), 1);

    app.pos
        .add_to_cart(&phone.product_id, Some(&phone.id), 1)
        .await
        .unwrap();
    app.pos.select_customer(Some(amina.clone())).unwrap();
    app.pos.set_amount_paid(Money::from_minor(1_740_000)).unwrap();

    let totals = app.pos.totals().unwrap();
    assert_eq!(totals.tax.minor(), 240_000);
    assert_eq!(totals.total.minor(), 1_740_000);

    let receipt = app.pos.submit_sale().await.unwrap();
    assert_eq!(receipt.status, OrderStatus::Completed);
    assert!(receipt.order_number.starts_with("SO-"));
    assert_eq!(receipt.totals.total.minor(), 1_740_000);
    assert_eq!(app.pos.cart().unwrap().phase, CheckoutPhase::Completed);

    let variant = app.db.products().get_variant(&phone.id).await.unwrap().unwrap();
    assert_eq!(variant.stock_quantity, 2);

    let customer = app.customers.get(&amina.id).await.unwrap();
    assert_eq!(customer.spent().minor(), 1_740_000);

    let stats = app.pos.sales_stats(SalesPeriod::Today).await.unwrap();
    assert_eq!(stats.total_sales, 1);
    assert_eq!(stats.total_revenue.minor(), 1_740_000);
    assert_eq!(stats.total_items, 1);
}

#[tokio::test]
async fn test_delivery_on_credit_stays_open() {
    let app = app().await;
    let phone = stock_phone(&app, 300_000, 5).await;
    let baraka = walk_in(&app, "Baraka", "0754000222").await;

    app.pos
        .add_to_cart(&phone.product_id, Some(&phone.id), 2)
        .await
        .unwrap();
    app.pos.select_customer(Some(baraka)).unwrap();
    app.pos.set_payment_method(PaymentMethod::PaymentOnDelivery).unwrap();
    app.pos
        .set_delivery(
            DeliveryDetails {
                method: DeliveryMethod::BusCargo,
                city: Some("Arusha".into()),
                ..Default::default()
            },
            None,
        )
        .unwrap();

    // 600,000 + 96,000 tax + 500 delivery
    assert_eq!(app.pos.totals().unwrap().total.minor(), 696_500);

    let receipt = app.pos.submit_sale().await.unwrap();
    assert_eq!(receipt.status, OrderStatus::PaymentOnDelivery);
    assert_eq!(receipt.change_due, Money::zero());
}

#[tokio::test]
async fn test_deactivated_product_leaves_cart() {
    let app = app().await;
    let phone = stock_phone(&app, 200_000, 5).await;
    let charger = stock_phone(&app, 150_000, 5).await;

    app.pos.add_to_cart(&phone.product_id, Some(&phone.id), 1).await.unwrap();
    app.pos.add_to_cart(&charger.product_id, Some(&charger.id), 1).await.unwrap();

    app.db.products().set_active(&charger.product_id, false).await.unwrap();
    let report = app.pos.validate_cart_items().await.unwrap();
    assert_eq!(report.removed.len(), 1);
    assert!(report.warning.is_some());

    let view = app.pos.cart().unwrap();
    assert_eq!(view.items.len(), 1);
    assert_eq!(
        view.items[0].key,
        LineKey::catalog(phone.product_id.clone(), Some(phone.id.clone()))
    );

    let err = app
        .pos
        .add_to_cart(&charger.product_id, Some(&charger.id), 1)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn test_loyal_customers_by_points() {
    let app = app().await;
    let amina = walk_in(&app, "Amina", "0712000001").await;
    let baraka = walk_in(&app, "Baraka", "0712000002").await;
    walk_in(&app, "Chausiku", "0712000003").await;

    app.db.customers().check_in(&amina.id, 2_100).await.unwrap();
    app.db.customers().check_in(&baraka.id, 2_600).await.unwrap();
    let visited = app.customers.check_in(&amina.id).await.unwrap();
    assert_eq!(visited.points, 2_105);

    let gold = app
        .customers
        .list(
            &CustomerFilter {
                loyalty_levels: vec![LoyaltyLevel::Gold],
                ..Default::default()
            },
            Some(CustomerSort::Points),
        )
        .await
        .unwrap();
    let names: Vec<&str> = gold.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Baraka", "Amina"]);
}
