//! Integration tests for the Redis adapter.
//!
//! Tests use testcontainers to spin up a real Redis instance. Each test
//! runs under its own key prefix so they can share one container.

use std::time::Duration;

use oidc_store::{Adapter, RecordKind, RecordPayload, StoreError};
use oidc_store_redis::{RedisAdapter, RedisStoreConfig};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::redis::Redis;
use tokio::sync::OnceCell;

// Shared Redis container for all tests
static SHARED_REDIS: OnceCell<(ContainerAsync<Redis>, String)> = OnceCell::const_new();

/// Get or create the shared Redis container
async fn get_redis_url() -> String {
    let (_, url) = SHARED_REDIS
        .get_or_init(|| async {
            let container = Redis::default()
                .start()
                .await
                .expect("start redis container");

            let host_port = container.get_host_port_ipv4(6379).await.expect("get port");
            let url = format!("redis://127.0.0.1:{}", host_port);

            (container, url)
        })
        .await;

    url.clone()
}

async fn adapter_with_prefix(prefix: &str) -> RedisAdapter {
    let config = RedisStoreConfig {
        url: get_redis_url().await,
        key_prefix: format!("{prefix}:"),
        ..Default::default()
    };
    RedisAdapter::connect(&config).expect("connect adapter")
}

/// Raw connection for asserting on the key space directly.
async fn raw_connection() -> redis::aio::MultiplexedConnection {
    let client = redis::Client::open(get_redis_url().await).expect("open client");
    client
        .get_multiplexed_async_connection()
        .await
        .expect("raw connection")
}

fn payload(value: serde_json::Value) -> RecordPayload {
    RecordPayload::from_value(value).unwrap()
}

const TTL: Duration = Duration::from_secs(60);

#[tokio::test]
async fn test_round_trip_opaque() {
    let adapter = adapter_with_prefix("rt-opaque").await;
    let input = payload(serde_json::json!({ "accountId": "acc-1", "scope": "openid" }));

    adapter
        .upsert(RecordKind::AccessToken, "at-1", &input, TTL)
        .await
        .unwrap();

    let found = adapter.find(RecordKind::AccessToken, "at-1").await.unwrap();
    assert_eq!(found, Some(input));
}

#[tokio::test]
async fn test_round_trip_consumable() {
    let adapter = adapter_with_prefix("rt-consumable").await;
    let input = payload(serde_json::json!({ "code": "xyz", "grantId": "g-1" }));

    adapter
        .upsert(RecordKind::AuthorizationCode, "ac-1", &input, TTL)
        .await
        .unwrap();

    let found = adapter
        .find(RecordKind::AuthorizationCode, "ac-1")
        .await
        .unwrap()
        .unwrap();
    // No consumed field until consume is called.
    assert_eq!(found.consumed(), None);
    assert_eq!(found, input);
}

#[tokio::test]
async fn test_find_missing() {
    let adapter = adapter_with_prefix("missing").await;
    assert!(adapter.find(RecordKind::Session, "nope").await.unwrap().is_none());
    assert!(adapter
        .find(RecordKind::RefreshToken, "nope")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_consume_sets_marker_and_is_idempotent() {
    let adapter = adapter_with_prefix("consume").await;
    adapter
        .upsert(
            RecordKind::RefreshToken,
            "rt-1",
            &payload(serde_json::json!({ "t": 1 })),
            TTL,
        )
        .await
        .unwrap();

    assert!(adapter.consume(RecordKind::RefreshToken, "rt-1").await.unwrap());
    let first = adapter
        .find(RecordKind::RefreshToken, "rt-1")
        .await
        .unwrap()
        .unwrap();
    assert!(first.consumed().is_some());

    // Second consume succeeds and the marker stays set.
    assert!(adapter.consume(RecordKind::RefreshToken, "rt-1").await.unwrap());
    let second = adapter
        .find(RecordKind::RefreshToken, "rt-1")
        .await
        .unwrap()
        .unwrap();
    assert!(second.consumed().is_some());
}

#[tokio::test]
async fn test_reupsert_keeps_consumed_marker() {
    let adapter = adapter_with_prefix("reupsert-consumed").await;
    adapter
        .upsert(
            RecordKind::RefreshToken,
            "rt-1",
            &payload(serde_json::json!({ "v": 1 })),
            TTL,
        )
        .await
        .unwrap();
    assert!(adapter.consume(RecordKind::RefreshToken, "rt-1").await.unwrap());

    // HSET of the payload field leaves the consumed field alone.
    adapter
        .upsert(
            RecordKind::RefreshToken,
            "rt-1",
            &payload(serde_json::json!({ "v": 2 })),
            TTL,
        )
        .await
        .unwrap();

    let found = adapter
        .find(RecordKind::RefreshToken, "rt-1")
        .await
        .unwrap()
        .unwrap();
    assert!(found.consumed().is_some());
    assert_eq!(found.get("v"), Some(&serde_json::json!(2)));
}

#[tokio::test]
async fn test_consume_missing_record_leaves_no_key() {
    let adapter = adapter_with_prefix("consume-missing").await;

    assert!(!adapter.consume(RecordKind::DeviceCode, "ghost").await.unwrap());

    // The undo path must not leave a stray unexpiring hash behind.
    let mut conn = raw_connection().await;
    let exists: bool = redis::AsyncCommands::exists(&mut conn, "consume-missing:DeviceCode:ghost")
        .await
        .unwrap();
    assert!(!exists);
}

#[tokio::test]
async fn test_consume_non_consumable_is_noop() {
    let adapter = adapter_with_prefix("consume-noop").await;
    let input = payload(serde_json::json!({ "sub": "user-1" }));
    adapter
        .upsert(RecordKind::Session, "s-1", &input, TTL)
        .await
        .unwrap();

    assert!(!adapter.consume(RecordKind::Session, "s-1").await.unwrap());

    let found = adapter.find(RecordKind::Session, "s-1").await.unwrap().unwrap();
    assert_eq!(found, input);
}

#[tokio::test]
async fn test_cascading_revocation() {
    let adapter = adapter_with_prefix("revoke").await;
    let grant = payload(serde_json::json!({ "grantId": "g-1" }));

    adapter
        .upsert(RecordKind::AccessToken, "at-1", &grant, TTL)
        .await
        .unwrap();
    adapter
        .upsert(RecordKind::RefreshToken, "rt-1", &grant, TTL)
        .await
        .unwrap();
    adapter
        .upsert(RecordKind::AuthorizationCode, "ac-1", &grant, TTL)
        .await
        .unwrap();

    adapter.revoke_by_grant_id("g-1").await.unwrap();

    assert!(adapter.find(RecordKind::AccessToken, "at-1").await.unwrap().is_none());
    assert!(adapter.find(RecordKind::RefreshToken, "rt-1").await.unwrap().is_none());
    assert!(adapter
        .find(RecordKind::AuthorizationCode, "ac-1")
        .await
        .unwrap()
        .is_none());

    // Second revocation of the same grant is a no-op success.
    adapter.revoke_by_grant_id("g-1").await.unwrap();
}

#[tokio::test]
async fn test_secondary_lookup_equivalence() {
    let adapter = adapter_with_prefix("secondary").await;

    let device = payload(serde_json::json!({ "userCode": "WDJB-MJHT" }));
    adapter
        .upsert(RecordKind::DeviceCode, "dc-1", &device, TTL)
        .await
        .unwrap();
    assert_eq!(
        adapter
            .find_by_user_code(RecordKind::DeviceCode, "WDJB-MJHT")
            .await
            .unwrap(),
        adapter.find(RecordKind::DeviceCode, "dc-1").await.unwrap()
    );

    let session = payload(serde_json::json!({ "uid": "sess-uid" }));
    adapter
        .upsert(RecordKind::Session, "s-1", &session, TTL)
        .await
        .unwrap();
    assert_eq!(
        adapter.find_by_uid(RecordKind::Session, "sess-uid").await.unwrap(),
        adapter.find(RecordKind::Session, "s-1").await.unwrap()
    );
}

#[tokio::test]
async fn test_expiry() {
    let adapter = adapter_with_prefix("expiry").await;
    adapter
        .upsert(
            RecordKind::AccessToken,
            "at-exp",
            &payload(serde_json::json!({ "x": 1 })),
            Duration::from_secs(1),
        )
        .await
        .unwrap();

    assert!(adapter.find(RecordKind::AccessToken, "at-exp").await.unwrap().is_some());

    tokio::time::sleep(Duration::from_millis(1500)).await;

    assert!(adapter.find(RecordKind::AccessToken, "at-exp").await.unwrap().is_none());
}

#[tokio::test]
async fn test_zero_expiry_rejected() {
    let adapter = adapter_with_prefix("zero-ttl").await;
    let err = adapter
        .upsert(
            RecordKind::Session,
            "s-1",
            &payload(serde_json::json!({})),
            Duration::ZERO,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidExpiry { .. }));
}

#[tokio::test]
async fn test_grant_index_ttl_monotonicity() {
    let adapter = adapter_with_prefix("grant-ttl").await;
    let grant = payload(serde_json::json!({ "grantId": "g-ttl" }));

    adapter
        .upsert(RecordKind::AccessToken, "long", &grant, Duration::from_secs(600))
        .await
        .unwrap();

    let mut conn = raw_connection().await;
    let after_long: i64 = redis::AsyncCommands::ttl(&mut conn, "grant-ttl:grant:g-ttl")
        .await
        .unwrap();
    assert!(after_long > 590);

    // A shorter-lived member never shortens the grant index.
    adapter
        .upsert(RecordKind::AccessToken, "short", &grant, Duration::from_secs(5))
        .await
        .unwrap();
    let after_short: i64 = redis::AsyncCommands::ttl(&mut conn, "grant-ttl:grant:g-ttl")
        .await
        .unwrap();
    assert!(after_short > 590);

    // A longer-lived member extends it.
    adapter
        .upsert(RecordKind::AccessToken, "longer", &grant, Duration::from_secs(1200))
        .await
        .unwrap();
    let after_longer: i64 = redis::AsyncCommands::ttl(&mut conn, "grant-ttl:grant:g-ttl")
        .await
        .unwrap();
    assert!(after_longer > 1190);
}

#[tokio::test]
async fn test_stale_index_tolerance() {
    let adapter = adapter_with_prefix("stale").await;
    let p = payload(serde_json::json!({
        "grantId": "g-stale",
        "userCode": "CODE",
        "uid": "uid-stale",
    }));
    adapter
        .upsert(RecordKind::DeviceCode, "dc-1", &p, TTL)
        .await
        .unwrap();

    // destroy removes only the primary key; every index now dangles.
    adapter.destroy(RecordKind::DeviceCode, "dc-1").await.unwrap();

    assert!(adapter
        .find_by_user_code(RecordKind::DeviceCode, "CODE")
        .await
        .unwrap()
        .is_none());
    assert!(adapter
        .find_by_uid(RecordKind::DeviceCode, "uid-stale")
        .await
        .unwrap()
        .is_none());
    adapter.revoke_by_grant_id("g-stale").await.unwrap();
}

#[tokio::test]
async fn test_destroy_missing_is_noop() {
    let adapter = adapter_with_prefix("destroy-noop").await;
    adapter.destroy(RecordKind::Client, "ghost").await.unwrap();
}

#[tokio::test]
async fn test_grant_list_appends_and_trims() {
    let unbounded = adapter_with_prefix("grant-grow").await;
    let p = payload(serde_json::json!({ "grantId": "g-grow" }));
    unbounded
        .upsert(RecordKind::AccessToken, "at-1", &p, TTL)
        .await
        .unwrap();
    unbounded
        .upsert(RecordKind::AccessToken, "at-1", &p, TTL)
        .await
        .unwrap();

    // Re-upserting the same id appends another pointer.
    let mut conn = raw_connection().await;
    let len: i64 = redis::AsyncCommands::llen(&mut conn, "grant-grow:grant:g-grow")
        .await
        .unwrap();
    assert_eq!(len, 2);

    // With a bound configured, the list is trimmed to its newest entries.
    let config = RedisStoreConfig {
        url: get_redis_url().await,
        key_prefix: "grant-trim:".to_string(),
        max_grant_members: Some(2),
        ..Default::default()
    };
    let bounded = RedisAdapter::connect(&config).unwrap();
    for id in ["a", "b", "c", "d"] {
        bounded
            .upsert(RecordKind::AccessToken, id, &p, TTL)
            .await
            .unwrap();
    }
    let len: i64 = redis::AsyncCommands::llen(&mut conn, "grant-trim:grant:g-grow")
        .await
        .unwrap();
    assert_eq!(len, 2);
}

#[tokio::test]
async fn test_reupsert_replaces_payload() {
    let adapter = adapter_with_prefix("reupsert").await;
    adapter
        .upsert(
            RecordKind::Interaction,
            "i-1",
            &payload(serde_json::json!({ "step": 1 })),
            TTL,
        )
        .await
        .unwrap();
    adapter
        .upsert(
            RecordKind::Interaction,
            "i-1",
            &payload(serde_json::json!({ "step": 2 })),
            TTL,
        )
        .await
        .unwrap();

    let found = adapter.find(RecordKind::Interaction, "i-1").await.unwrap().unwrap();
    assert_eq!(found.get("step"), Some(&serde_json::json!(2)));
}
