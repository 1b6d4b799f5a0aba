//! Tests for the individual gateway operations.

use std::time::Duration;

use futures::{stream::BoxStream, StreamExt};
use wallet_db::{
    gateway::id::random_id, ChangeOperation, GatewayConfig, Wallet, WalletGateway,
};

// ============================================================================
// Helpers
// ============================================================================

fn gateway() -> WalletGateway {
    WalletGateway::new(GatewayConfig::in_memory(format!("ops_{}", random_id())))
}

async fn first<T>(mut stream: BoxStream<'static, T>) -> T {
    stream.next().await.expect("stream yielded no item")
}

// ============================================================================
// One-shot operations
// ============================================================================

#[tokio::test]
async fn fresh_gateway_is_empty() {
    let gw = gateway();
    assert_eq!(first(gw.count()).await.unwrap(), 0);
    assert!(first(gw.list()).await.unwrap().is_empty());
}

#[tokio::test]
async fn one_shot_streams_end_after_one_item() {
    let gw = gateway();
    assert_eq!(gw.count().collect::<Vec<_>>().await.len(), 1);
    assert_eq!(gw.list().collect::<Vec<_>>().await.len(), 1);
    assert_eq!(gw.get_by_id("zzzzz").collect::<Vec<_>>().await.len(), 1);
    assert_eq!(gw.create().collect::<Vec<_>>().await.len(), 1);
}

#[tokio::test]
async fn create_numbers_from_current_count() {
    let gw = gateway();
    let created = first(gw.create()).await.unwrap();
    assert_eq!(created.name, "Wallet 1");
    assert_eq!(created.public_key, "Public 1");
    assert_eq!(created.secret, "Secret 1");
    assert_eq!(created.id.len(), 5);
    assert!(created.id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));

    let next = first(gw.create()).await.unwrap();
    assert_eq!(next.name, "Wallet 2");
}

#[tokio::test]
async fn create_after_explicit_insert_continues_numbering() {
    let gw = gateway();
    first(gw.insert(Wallet::new("00000", "Alice", "pk", "sk"))).await.unwrap();
    let created = first(gw.create()).await.unwrap();
    assert_eq!(created.name, "Wallet 2");
}

#[tokio::test]
async fn get_by_id_missing_is_none() {
    let gw = gateway();
    first(gw.create()).await.unwrap();
    assert_eq!(first(gw.get_by_id("zzzzz")).await.unwrap(), None);
}

#[tokio::test]
async fn clones_share_one_instance() {
    let gw = gateway();
    let other = gw.clone();
    first(gw.create()).await.unwrap();
    assert_eq!(first(other.count()).await.unwrap(), 1);
}

#[tokio::test]
async fn created_wallet_can_convert() {
    let gw = gateway();
    let wallet = first(gw.create()).await.unwrap();
    assert_eq!(wallet.convert("hi there"), "Wallet 1 screams: HI THERE");
}

// ============================================================================
// Change feed
// ============================================================================

#[tokio::test]
async fn changes_reports_created_wallets_in_order() {
    let gw = gateway();
    let mut changes = gw.changes();

    let a = first(gw.create()).await.unwrap();
    let b = first(gw.create()).await.unwrap();

    let first_event = changes.next().await.unwrap().unwrap();
    let second_event = changes.next().await.unwrap().unwrap();
    assert_eq!(first_event.id(), a.id);
    assert_eq!(second_event.id(), b.id);
    assert_eq!(second_event.operation(), ChangeOperation::Insert);
    assert_eq!(
        Wallet::from_document(second_event.document().clone()).unwrap(),
        b
    );
}

#[tokio::test]
async fn changes_does_not_replay_earlier_writes() {
    let gw = gateway();
    first(gw.create()).await.unwrap();

    let mut changes = gw.changes();
    let polled = tokio::time::timeout(Duration::from_millis(50), changes.next()).await;
    assert!(polled.is_err(), "earlier writes must not be replayed");
}

#[tokio::test]
async fn failed_insert_emits_no_change() {
    let gw = gateway();
    let wallet = Wallet::numbered("a1b2c", 1);
    first(gw.insert(wallet.clone())).await.unwrap();

    let mut changes = gw.changes();
    assert!(first(gw.insert(wallet)).await.is_err());
    let polled = tokio::time::timeout(Duration::from_millis(50), changes.next()).await;
    assert!(polled.is_err());
}

#[tokio::test]
async fn every_subscriber_sees_every_event() {
    let gw = gateway();
    let mut one = gw.changes();
    let mut two = gw.changes();

    let created = first(gw.create()).await.unwrap();

    assert_eq!(one.next().await.unwrap().unwrap().id(), created.id);
    assert_eq!(two.next().await.unwrap().unwrap().id(), created.id);
}
