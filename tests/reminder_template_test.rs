//! Notification templates and the debt reminder workflow: upsert semantics,
//! the mirrored file cache, and reminder-timestamp-on-success behavior.

mod common;

use std::collections::HashMap;

use common::{
    admin_ctx, meta, seed_branch, seed_customer, seed_order, seed_user, test_config, SeedOrder,
    StubDispatcher, TestApp,
};
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

use alumpro_api::entities::notification_template::{TemplateChannel, TemplateStatus};
use alumpro_api::entities::order::OrderStatus;
use alumpro_api::entities::user::UserRole;
use alumpro_api::entities::{activity_log, customer, notification_template};
use alumpro_api::errors::ServiceError;
use alumpro_api::notifications::SaveTemplateRequest;

fn reminder_template(content: &str) -> SaveTemplateRequest {
    SaveTemplateRequest {
        template_code: "debt_reminder".to_string(),
        template_name: "Debt reminder".to_string(),
        template_subject: None,
        template_content: content.to_string(),
        channel: TemplateChannel::Whatsapp,
        status: TemplateStatus::Active,
    }
}

#[tokio::test]
async fn saving_twice_updates_the_same_row() {
    let app = TestApp::new().await;
    let admin_user = seed_user(&app.db, "admin@alumpro.example", UserRole::Admin, None).await;
    let ctx = admin_ctx(admin_user.id);

    let first = app
        .services
        .templates
        .save_template(reminder_template("v1"), &ctx, &meta())
        .await
        .expect("insert");
    let second = app
        .services
        .templates
        .save_template(reminder_template("v2"), &ctx, &meta())
        .await
        .expect("update");

    assert_eq!(first.id, second.id);
    assert_eq!(second.template_content, "v2");
    assert!(second.updated_at.is_some());

    let total = notification_template::Entity::find()
        .count(&*app.db)
        .await
        .expect("count");
    assert_eq!(total, 1);
}

#[tokio::test]
async fn mirror_file_follows_save_and_delete() {
    let mirror_dir = tempfile::tempdir().expect("tempdir");
    let mut config = test_config();
    config.template_mirror_dir = Some(mirror_dir.path().to_string_lossy().into_owned());

    let app = TestApp::with_parts(config, StubDispatcher::succeeding()).await;
    let admin_user = seed_user(&app.db, "admin@alumpro.example", UserRole::Admin, None).await;
    let ctx = admin_ctx(admin_user.id);

    let saved = app
        .services
        .templates
        .save_template(reminder_template("mirror me"), &ctx, &meta())
        .await
        .expect("save");

    let path = mirror_dir.path().join("whatsapp_debt_reminder.txt");
    let mirrored = tokio::fs::read_to_string(&path).await.expect("mirror file");
    assert_eq!(mirrored, "mirror me");

    app.services
        .templates
        .delete_template(saved.id, &ctx, &meta())
        .await
        .expect("delete");
    assert!(!path.exists());

    let total = notification_template::Entity::find()
        .count(&*app.db)
        .await
        .expect("count");
    assert_eq!(total, 0);
}

async fn seed_debt_scenario(app: &TestApp) -> (i64, i64) {
    let branch = seed_branch(&app.db, "Main").await;
    let admin_user = seed_user(&app.db, "admin@alumpro.example", UserRole::Admin, None).await;
    let debtor = seed_customer(&app.db, "Jane Debtor", Some("+90 555 222 2222")).await;

    seed_order(
        &app.db,
        SeedOrder::new("DEBT-1", debtor.id, admin_user.id, branch.id)
            .status(OrderStatus::Delivered)
            .amounts(dec!(500.50), dec!(200.50)),
    )
    .await;
    seed_order(
        &app.db,
        SeedOrder::new("DEBT-2", debtor.id, admin_user.id, branch.id)
            .amounts(dec!(100.00), dec!(0.00)),
    )
    .await;
    // Fully paid order stays out of the reminder
    seed_order(
        &app.db,
        SeedOrder::new("PAID-1", debtor.id, admin_user.id, branch.id)
            .amounts(dec!(80.00), dec!(80.00)),
    )
    .await;

    app.services
        .templates
        .save_template(
            reminder_template(
                "Dear {{customer_name}}, {{order_count}} orders ({{order_numbers}}) total {{total_due}}. {{company_name}}",
            ),
            &admin_ctx(admin_user.id),
            &meta(),
        )
        .await
        .expect("template");

    (debtor.id, admin_user.id)
}

#[tokio::test]
async fn successful_reminder_updates_the_timestamp() {
    let dispatcher = StubDispatcher::succeeding();
    let app = TestApp::with_dispatcher(dispatcher.clone()).await;
    let (debtor_id, admin_id) = seed_debt_scenario(&app).await;

    let report = app
        .services
        .reminders
        .send_debt_reminder(debtor_id, &admin_ctx(admin_id), &meta())
        .await
        .expect("reminder");

    assert!(report.success);
    assert!(report.preview.contains("Jane Debtor"));
    assert!(report.preview.contains("DEBT-1, DEBT-2"));
    assert!(report.preview.contains("400.00 TL"));
    assert!(report.preview.contains("AlumPro"));

    let sent = dispatcher.sent.lock().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].2, "+90 555 222 2222");
    drop(sent);

    let refreshed = customer::Entity::find_by_id(debtor_id)
        .one(&*app.db)
        .await
        .expect("query")
        .expect("customer");
    assert!(refreshed.last_debt_reminder.is_some());

    let logs = activity_log::Entity::find()
        .filter(activity_log::Column::ActionType.eq("debt_reminder_sent"))
        .all(&*app.db)
        .await
        .expect("logs");
    assert_eq!(logs.len(), 1);
    assert!(logs[0].action_details.contains("sent"));
}

#[tokio::test]
async fn failed_dispatch_keeps_the_timestamp_but_is_audited() {
    let dispatcher = StubDispatcher::failing();
    let app = TestApp::with_dispatcher(dispatcher.clone()).await;
    let (debtor_id, admin_id) = seed_debt_scenario(&app).await;

    let report = app
        .services
        .reminders
        .send_debt_reminder(debtor_id, &admin_ctx(admin_id), &meta())
        .await
        .expect("reminder call itself succeeds");

    assert!(!report.success);

    let refreshed = customer::Entity::find_by_id(debtor_id)
        .one(&*app.db)
        .await
        .expect("query")
        .expect("customer");
    assert!(refreshed.last_debt_reminder.is_none());

    let logs = activity_log::Entity::find()
        .filter(activity_log::Column::ActionType.eq("debt_reminder_sent"))
        .all(&*app.db)
        .await
        .expect("logs");
    assert_eq!(logs.len(), 1);
    assert!(logs[0].action_details.contains("failed"));
}

#[tokio::test]
async fn customers_without_debt_or_phone_are_rejected() {
    let app = TestApp::new().await;
    let (_debtor_id, admin_id) = seed_debt_scenario(&app).await;
    let ctx = admin_ctx(admin_id);

    let paid_up = seed_customer(&app.db, "Paid Up", Some("+90 555 333 3333")).await;
    let err = app
        .services
        .reminders
        .send_debt_reminder(paid_up.id, &ctx, &meta())
        .await
        .expect_err("no outstanding balance");
    assert!(matches!(err, ServiceError::ValidationError(_)));

    let no_phone = seed_customer(&app.db, "No Phone", None).await;
    let branch = seed_branch(&app.db, "Other").await;
    seed_order(
        &app.db,
        SeedOrder::new("NP-1", no_phone.id, admin_id, branch.id).amounts(dec!(50), dec!(0)),
    )
    .await;
    let err = app
        .services
        .reminders
        .send_debt_reminder(no_phone.id, &ctx, &meta())
        .await
        .expect_err("no phone on record");
    assert!(matches!(err, ServiceError::ValidationError(_)));

    let missing = app
        .services
        .reminders
        .send_debt_reminder(99_999, &ctx, &meta())
        .await
        .expect_err("unknown customer");
    assert!(matches!(missing, ServiceError::NotFound(_)));
}
