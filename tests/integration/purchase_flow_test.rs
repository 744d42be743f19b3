/// End-to-end purchase processing against a real database, with the store
/// gateway replaced by the scripted one.
use crate::support::{setup_test_db, test_state, ScriptedReceiptGateway};
use backcoach::error::ApiError;
use backcoach::models::{common::PurchaseKind, purchases::VerifyPurchaseRequest};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use std::sync::Arc;
use uuid::Uuid;

fn verify_request(receipt: &str) -> VerifyPurchaseRequest {
    VerifyPurchaseRequest {
        platform: "android".to_string(),
        receipt: receipt.to_string(),
        app_version: None,
    }
}

#[tokio::test]
#[ignore] // Run only when database is available
async fn test_subscription_purchase_activates_premium() {
    let db = setup_test_db().await;
    let state = test_state(db.clone(), Arc::new(ScriptedReceiptGateway));

    let user_id = format!("test-user-{}", Uuid::new_v4());

    // Prior balance: freshly provisioned account
    let before = state.account_service.get_or_create(&user_id).await.unwrap();
    assert_eq!(before.paid_credits, 0);
    assert!(!before.is_premium);

    let txn_id = format!("txn-{}", Uuid::new_v4());
    let data = state
        .account_service
        .process_purchase(
            &user_id,
            &VerifyPurchaseRequest {
                platform: "android".to_string(),
                receipt: format!("sub:{}", txn_id),
                app_version: Some("1.4.0".to_string()),
            },
        )
        .await
        .unwrap();

    assert!(data.verified);
    assert_eq!(data.purchase_type, PurchaseKind::Subscription);
    assert!(data.is_premium);
    assert_eq!(data.credits_granted, 100);
    // Paid counter moved by exactly the subscription grant
    assert_eq!(data.balance.paid_credits, before.paid_credits + 100);
    assert_eq!(data.balance.free_credits, before.free_credits);

    // All flat subscription fields are mirrored
    let subscription = data.subscription.expect("subscription fields present");
    assert_eq!(subscription.status, "active");
    assert_eq!(subscription.tier.as_deref(), Some("premium"));
    assert_eq!(subscription.platform.as_deref(), Some("android"));
    assert!(subscription.expires_at.is_some());
    assert!(subscription.started_at.is_some());

    // The purchase event carries the platform and reported app version
    let event = entity::purchase_events::Entity::find()
        .filter(entity::purchase_events::Column::TransactionId.eq(txn_id.as_str()))
        .one(&db)
        .await
        .unwrap()
        .expect("purchase event recorded");
    assert_eq!(event.platform, "android");
    assert_eq!(event.app_version.as_deref(), Some("1.4.0"));
    assert_eq!(event.event_type, "subscription");
    assert_eq!(event.credits_granted, 100);
}

#[tokio::test]
#[ignore] // Run only when database is available
async fn test_unsupported_platform_rejected_before_verification() {
    let db = setup_test_db().await;
    let state = test_state(db, Arc::new(ScriptedReceiptGateway));

    let user_id = format!("test-user-{}", Uuid::new_v4());
    let result = state
        .account_service
        .process_purchase(
            &user_id,
            &VerifyPurchaseRequest {
                platform: "windows".to_string(),
                // A receipt the scripted gateway would accept; the platform
                // check must reject first
                receipt: format!("sub:txn-{}", Uuid::new_v4()),
                app_version: None,
            },
        )
        .await;

    assert!(matches!(result, Err(ApiError::InvalidArgument(_))));

    // No account was provisioned on the rejected path
    let balance = state.ledger_service.balance(&user_id).await.unwrap();
    assert_eq!(balance.total_credits, 0);
}

#[tokio::test]
#[ignore] // Run only when database is available
async fn test_consumable_purchase_adds_credits_only() {
    let db = setup_test_db().await;
    let state = test_state(db, Arc::new(ScriptedReceiptGateway));

    let user_id = format!("test-user-{}", Uuid::new_v4());
    let before = state.account_service.get_or_create(&user_id).await.unwrap();

    let txn_id = format!("txn-{}", Uuid::new_v4());
    let data = state
        .account_service
        .process_purchase(&user_id, &verify_request(&format!("pack:150:{}", txn_id)))
        .await
        .unwrap();

    assert_eq!(data.purchase_type, PurchaseKind::Consumable);
    assert_eq!(data.credits_granted, 150);
    assert_eq!(data.balance.paid_credits, before.paid_credits + 150);
    assert!(data.subscription.is_none());
    assert!(!data.is_premium);

    // Subscription status untouched
    let after = state.account_service.get_or_create(&user_id).await.unwrap();
    assert_eq!(after.subscription_status, "free");
    assert!(after.subscription_started_at.is_none());
}

#[tokio::test]
#[ignore] // Run only when database is available
async fn test_invalid_receipt_rejected_without_mutation() {
    let db = setup_test_db().await;
    let state = test_state(db, Arc::new(ScriptedReceiptGateway));

    let user_id = format!("test-user-{}", Uuid::new_v4());
    let before = state.account_service.get_or_create(&user_id).await.unwrap();

    let result = state
        .account_service
        .process_purchase(&user_id, &verify_request("garbage-receipt"))
        .await;

    assert!(result.is_err());

    let after = state.account_service.get_or_create(&user_id).await.unwrap();
    assert_eq!(after.paid_credits, before.paid_credits);
    assert_eq!(after.free_credits, before.free_credits);
    assert_eq!(after.subscription_status, before.subscription_status);
}

#[tokio::test]
#[ignore] // Run only when database is available
async fn test_sequential_duplicate_transactions() {
    let db = setup_test_db().await;
    let state = test_state(db, Arc::new(ScriptedReceiptGateway));

    let user_id = format!("test-user-{}", Uuid::new_v4());
    let txn_id = format!("txn-{}", Uuid::new_v4());
    let request = verify_request(&format!("pack:50:{}", txn_id));

    // First request - should succeed
    let first = state
        .account_service
        .process_purchase(&user_id, &request)
        .await;
    assert!(first.is_ok(), "First request should succeed");
    let first_balance = first.unwrap().balance;

    // Second request with same transaction_id - should get Conflict
    let second = state
        .account_service
        .process_purchase(&user_id, &request)
        .await;
    assert!(second.is_err(), "Second request should fail");

    let error_msg = second.unwrap_err().to_string();
    assert!(
        error_msg.contains("already processed") || error_msg.to_lowercase().contains("conflict"),
        "Expected Conflict error, got: {}",
        error_msg
    );

    // The replay granted nothing
    let balance = state.ledger_service.balance(&user_id).await.unwrap();
    assert_eq!(balance.paid_credits, first_balance.paid_credits);
}
