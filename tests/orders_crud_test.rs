//! Order creation and line-item handling: totals, the pricing child row,
//! and immutability after printing.

mod common;

use common::{meta, seed_branch, seed_customer, seed_user, seller_ctx, TestApp};
use rust_decimal_macros::dec;

use alumpro_api::entities::user::UserRole;
use alumpro_api::errors::ServiceError;
use alumpro_api::services::orders::{
    CreateOrderRequest, GlassLine, ProfileLine, ReplaceLinesRequest,
};

fn sample_order(customer_id: i64) -> CreateOrderRequest {
    CreateOrderRequest {
        customer_id,
        branch_id: None,
        order_number: None,
        advance_payment: dec!(100.00),
        assembly_fee: dec!(50.00),
        notes: Some("balcony enclosure".to_string()),
        drawing_image: None,
        profiles: vec![ProfileLine {
            profile_type: "sliding-frame".to_string(),
            color: Some("anthracite".to_string()),
            quantity: 4,
            unit_price: dec!(75.00),
        }],
        glass: vec![GlassLine {
            glass_type: "tempered-4mm".to_string(),
            width: dec!(120.5),
            height: dec!(80.0),
            quantity: 4,
            unit_price: dec!(25.00),
        }],
    }
}

#[tokio::test]
async fn creating_an_order_computes_totals_and_children() {
    let app = TestApp::new().await;
    let branch = seed_branch(&app.db, "Main").await;
    let seller =
        seed_user(&app.db, "seller@alumpro.example", UserRole::Seller, Some(branch.id)).await;
    let customer = seed_customer(&app.db, "Order Customer", None).await;
    let ctx = seller_ctx(seller.id, branch.id);

    let created = app
        .services
        .orders
        .create_order(sample_order(customer.id), &ctx, &meta())
        .await
        .expect("create");

    // 4 * 75 profiles + 4 * 25 glass + 50 assembly
    assert_eq!(created.total_amount, dec!(450.00));
    assert_eq!(created.remaining_amount, dec!(350.00));
    assert_eq!(created.branch_id, branch.id);
    assert_eq!(created.seller_id, seller.id);
    assert!(created.order_number.starts_with("ALP-"));
    assert!(!created.barcode.is_empty());

    let details = app
        .services
        .orders
        .get_order(created.id)
        .await
        .expect("details");
    assert_eq!(details.profiles.len(), 1);
    assert_eq!(details.glass.len(), 1);
    assert_eq!(details.profiles[0].total_price, dec!(300.00));
    let pricing = details.pricing.expect("pricing row");
    assert_eq!(pricing.profiles_total, dec!(300.00));
    assert_eq!(pricing.glass_total, dec!(100.00));
    assert_eq!(pricing.grand_total, dec!(450.00));
    assert_eq!(details.customer.fullname, "Order Customer");

    let by_number = app
        .services
        .orders
        .get_order_by_number(&created.order_number)
        .await
        .expect("by number");
    assert_eq!(by_number.order.id, created.id);
}

#[tokio::test]
async fn unknown_customers_are_rejected() {
    let app = TestApp::new().await;
    let branch = seed_branch(&app.db, "Main").await;
    let seller =
        seed_user(&app.db, "seller@alumpro.example", UserRole::Seller, Some(branch.id)).await;

    let err = app
        .services
        .orders
        .create_order(sample_order(99_999), &seller_ctx(seller.id, branch.id), &meta())
        .await
        .expect_err("missing customer");
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn replacing_lines_recomputes_totals_until_printed() {
    let app = TestApp::new().await;
    let branch = seed_branch(&app.db, "Main").await;
    let seller =
        seed_user(&app.db, "seller@alumpro.example", UserRole::Seller, Some(branch.id)).await;
    let customer = seed_customer(&app.db, "Revisions", None).await;
    let ctx = seller_ctx(seller.id, branch.id);

    let created = app
        .services
        .orders
        .create_order(sample_order(customer.id), &ctx, &meta())
        .await
        .expect("create");

    let replacement = ReplaceLinesRequest {
        assembly_fee: Some(dec!(0.00)),
        profiles: vec![ProfileLine {
            profile_type: "fixed-frame".to_string(),
            color: None,
            quantity: 2,
            unit_price: dec!(60.00),
        }],
        glass: vec![],
    };
    let updated = app
        .services
        .orders
        .replace_lines(created.id, replacement, &ctx, &meta())
        .await
        .expect("replace");
    assert_eq!(updated.total_amount, dec!(120.00));
    // Advance payment is untouched by a line rewrite
    assert_eq!(updated.remaining_amount, dec!(20.00));

    let details = app.services.orders.get_order(created.id).await.expect("details");
    assert_eq!(details.profiles.len(), 1);
    assert!(details.glass.is_empty());
    assert_eq!(details.pricing.expect("pricing").grand_total, dec!(120.00));

    // Print, then further edits must conflict.
    app.services
        .orders
        .mark_printed(created.id)
        .await
        .expect("print");
    let err = app
        .services
        .orders
        .replace_lines(
            created.id,
            ReplaceLinesRequest {
                assembly_fee: None,
                profiles: vec![],
                glass: vec![],
            },
            &ctx,
            &meta(),
        )
        .await
        .expect_err("printed orders are immutable");
    assert!(matches!(err, ServiceError::Conflict(_)));
}
