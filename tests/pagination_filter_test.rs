//! List filtering and pagination against a real (in-memory) database:
//! page arithmetic, the 30-day default window, search semantics and
//! branch scoping.

mod common;

use chrono::{TimeZone, Utc};
use common::{admin_ctx, seed_branch, seed_customer, seed_order, seed_user, seller_ctx, SeedOrder, TestApp};

use alumpro_api::db::paginate::PageRequest;
use alumpro_api::entities::order::OrderStatus;
use alumpro_api::entities::user::UserRole;
use alumpro_api::services::orders::OrderListFilter;

#[tokio::test]
async fn twenty_five_orders_paginate_into_two_pages() {
    let app = TestApp::new().await;
    let branch = seed_branch(&app.db, "Main").await;
    let seller = seed_user(&app.db, "seller@alumpro.example", UserRole::Seller, Some(branch.id)).await;
    let customer = seed_customer(&app.db, "Pagination Customer", None).await;

    for i in 0..25 {
        seed_order(
            &app.db,
            SeedOrder::new(&format!("PG-{:03}", i), customer.id, seller.id, branch.id),
        )
        .await;
    }

    let admin = admin_ctx(seller.id);
    let page1 = app
        .services
        .orders
        .list_orders(
            OrderListFilter::default(),
            PageRequest::new(1, 20, 100),
            &admin,
        )
        .await
        .expect("page 1");
    assert_eq!(page1.items.len(), 20);
    assert_eq!(page1.total, 25);
    assert_eq!(page1.total_pages, 2);
    assert_eq!(page1.page, 1);

    let page2 = app
        .services
        .orders
        .list_orders(
            OrderListFilter::default(),
            PageRequest::new(2, 20, 100),
            &admin,
        )
        .await
        .expect("page 2");
    assert_eq!(page2.items.len(), 5);
    assert_eq!(page2.total, 25);
    assert_eq!(page2.total_pages, 2);
}

#[tokio::test]
async fn count_matches_rows_when_everything_fits_one_page() {
    let app = TestApp::new().await;
    let branch = seed_branch(&app.db, "Main").await;
    let seller = seed_user(&app.db, "seller@alumpro.example", UserRole::Seller, Some(branch.id)).await;
    let customer = seed_customer(&app.db, "Small Set", None).await;

    for i in 0..7 {
        seed_order(
            &app.db,
            SeedOrder::new(&format!("SM-{:03}", i), customer.id, seller.id, branch.id),
        )
        .await;
    }

    let page = app
        .services
        .orders
        .list_orders(
            OrderListFilter::default(),
            PageRequest::new(1, 20, 100),
            &admin_ctx(seller.id),
        )
        .await
        .expect("list");
    assert_eq!(page.total as usize, page.items.len());
    assert_eq!(page.total_pages, 1);
}

#[tokio::test]
async fn empty_result_has_zero_pages_and_no_rows() {
    let app = TestApp::new().await;
    let branch = seed_branch(&app.db, "Main").await;
    let seller = seed_user(&app.db, "seller@alumpro.example", UserRole::Seller, Some(branch.id)).await;
    let customer = seed_customer(&app.db, "Nobody", None).await;
    seed_order(
        &app.db,
        SeedOrder::new("EMPTY-1", customer.id, seller.id, branch.id),
    )
    .await;

    let filter = OrderListFilter {
        status: Some(OrderStatus::Cancelled),
        ..Default::default()
    };
    let page = app
        .services
        .orders
        .list_orders(filter, PageRequest::new(1, 20, 100), &admin_ctx(seller.id))
        .await
        .expect("list");
    assert_eq!(page.total, 0);
    assert_eq!(page.total_pages, 0);
    assert!(page.items.is_empty());
}

#[tokio::test]
async fn date_range_and_search_select_only_matching_rows() {
    let app = TestApp::new().await;
    let branch = seed_branch(&app.db, "Main").await;
    let seller = seed_user(&app.db, "seller@alumpro.example", UserRole::Seller, Some(branch.id)).await;
    let jane = seed_customer(&app.db, "Jane Doe", Some("+90 555 111 1111")).await;
    let other = seed_customer(&app.db, "Bob Smith", None).await;

    let in_january = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
    let in_march = Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap();

    // 3 matching: Jane, inside January
    for i in 0..3 {
        seed_order(
            &app.db,
            SeedOrder::new(&format!("JAN-J-{}", i), jane.id, seller.id, branch.id)
                .order_date(in_january),
        )
        .await;
    }
    // Non-matching: Jane outside the window, and Bob inside it
    for i in 0..4 {
        seed_order(
            &app.db,
            SeedOrder::new(&format!("MAR-J-{}", i), jane.id, seller.id, branch.id)
                .order_date(in_march),
        )
        .await;
    }
    for i in 0..3 {
        seed_order(
            &app.db,
            SeedOrder::new(&format!("JAN-B-{}", i), other.id, seller.id, branch.id)
                .order_date(in_january),
        )
        .await;
    }

    let filter = OrderListFilter {
        date_start: Some(chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
        date_end: Some(chrono::NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()),
        search: Some("Jane".to_string()),
        ..Default::default()
    };
    let page = app
        .services
        .orders
        .list_orders(filter.clone(), PageRequest::new(1, 20, 100), &admin_ctx(seller.id))
        .await
        .expect("list");
    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), 3);
    assert!(page.items.iter().all(|row| row.customer_name == "Jane Doe"));

    // Page size does not change the match set
    let tiny_pages = app
        .services
        .orders
        .list_orders(filter, PageRequest::new(1, 2, 100), &admin_ctx(seller.id))
        .await
        .expect("list");
    assert_eq!(tiny_pages.total, 3);
    assert_eq!(tiny_pages.total_pages, 2);
}

#[tokio::test]
async fn search_is_case_insensitive_substring_match() {
    let app = TestApp::new().await;
    let branch = seed_branch(&app.db, "Main").await;
    let seller = seed_user(&app.db, "seller@alumpro.example", UserRole::Seller, Some(branch.id)).await;
    let customer = seed_customer(&app.db, "Yilmaz Glass Works", None).await;
    seed_order(
        &app.db,
        SeedOrder::new("CASE-1", customer.id, seller.id, branch.id),
    )
    .await;

    for term in ["yilmaz", "YILMAZ", "maz gl"] {
        let filter = OrderListFilter {
            search: Some(term.to_string()),
            ..Default::default()
        };
        let page = app
            .services
            .orders
            .list_orders(filter, PageRequest::new(1, 20, 100), &admin_ctx(seller.id))
            .await
            .expect("list");
        assert_eq!(page.total, 1, "term {term:?} should match");
    }

    let filter = OrderListFilter {
        search: Some("no-such-customer".to_string()),
        ..Default::default()
    };
    let page = app
        .services
        .orders
        .list_orders(filter, PageRequest::new(1, 20, 100), &admin_ctx(seller.id))
        .await
        .expect("list");
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn nonpositive_foreign_key_filters_are_ignored() {
    let app = TestApp::new().await;
    let branch = seed_branch(&app.db, "Main").await;
    let seller = seed_user(&app.db, "seller@alumpro.example", UserRole::Seller, Some(branch.id)).await;
    let customer = seed_customer(&app.db, "Zero Filter", None).await;
    seed_order(
        &app.db,
        SeedOrder::new("ZF-1", customer.id, seller.id, branch.id),
    )
    .await;

    let filter = OrderListFilter {
        branch_id: Some(0),
        seller_id: Some(-1),
        ..Default::default()
    };
    let page = app
        .services
        .orders
        .list_orders(filter, PageRequest::new(1, 20, 100), &admin_ctx(seller.id))
        .await
        .expect("list");
    assert_eq!(page.total, 1);
}

#[tokio::test]
async fn sellers_only_see_their_own_branch() {
    let app = TestApp::new().await;
    let branch_a = seed_branch(&app.db, "Branch A").await;
    let branch_b = seed_branch(&app.db, "Branch B").await;
    let seller_a =
        seed_user(&app.db, "a@alumpro.example", UserRole::Seller, Some(branch_a.id)).await;
    let seller_b =
        seed_user(&app.db, "b@alumpro.example", UserRole::Seller, Some(branch_b.id)).await;
    let customer = seed_customer(&app.db, "Scoped", None).await;

    seed_order(
        &app.db,
        SeedOrder::new("A-1", customer.id, seller_a.id, branch_a.id),
    )
    .await;
    seed_order(
        &app.db,
        SeedOrder::new("B-1", customer.id, seller_b.id, branch_b.id),
    )
    .await;

    // A seller from branch A sees only branch A orders, even when asking
    // for another branch explicitly.
    let filter = OrderListFilter {
        branch_id: Some(branch_b.id),
        ..Default::default()
    };
    let page = app
        .services
        .orders
        .list_orders(
            filter,
            PageRequest::new(1, 20, 100),
            &seller_ctx(seller_a.id, branch_a.id),
        )
        .await
        .expect("list");
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].order_number, "A-1");

    // An admin sees both.
    let page = app
        .services
        .orders
        .list_orders(
            OrderListFilter::default(),
            PageRequest::new(1, 20, 100),
            &admin_ctx(seller_a.id),
        )
        .await
        .expect("list");
    assert_eq!(page.total, 2);
}
