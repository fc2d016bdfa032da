mod common;

use common::*;
use recipe_service::ServiceError;

#[tokio::test]
async fn subscribing_to_yourself_is_rejected() {
    let env = TestEnv::new();
    let services = env.services();

    let err = services
        .subscriptions
        .subscribe("alice", ALICE_ID)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::YourselfSubscribe));

    let err = services
        .subscriptions
        .unsubscribe("alice", ALICE_ID)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::YourselfUnsubscribe));
}

#[tokio::test]
async fn subscribing_twice_is_already_subscribed() {
    let env = TestEnv::new();
    let services = env.services();

    services.subscriptions.subscribe("alice", BOB_ID).await.unwrap();
    let err = services
        .subscriptions
        .subscribe("alice", BOB_ID)
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::AlreadySubscribed));
    assert_eq!(
        services.subscriptions.subscribers(ALICE_ID).await.unwrap(),
        vec![BOB_ID]
    );
}

#[tokio::test]
async fn unsubscribe_mirrors_subscribe() {
    let env = TestEnv::new();
    let services = env.services();

    let err = services
        .subscriptions
        .unsubscribe("alice", BOB_ID)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::AlreadyUnsubscribed));

    services.subscriptions.subscribe("alice", BOB_ID).await.unwrap();
    services.subscriptions.unsubscribe("alice", BOB_ID).await.unwrap();
    assert!(services
        .subscriptions
        .subscribers(ALICE_ID)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn unknown_creator_is_user_not_found() {
    let env = TestEnv::new();
    let services = env.services();

    let err = services
        .subscriptions
        .subscribe("ghost", BOB_ID)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::UserNotFound));
}

#[tokio::test]
async fn new_recipe_is_announced_once_per_creation() {
    let env = TestEnv::new();
    let services = env.services();
    services.subscriptions.subscribe("alice", BOB_ID).await.unwrap();

    let first = create_as_alice(&services, "Soup").await;
    let second = create_as_alice(&services, "Bread").await;

    let announced: Vec<_> = env
        .publisher
        .events()
        .into_iter()
        .map(|e| (e.creator_id, e.recipe_id))
        .collect();
    assert_eq!(announced, vec![(ALICE_ID, first), (ALICE_ID, second)]);
}
