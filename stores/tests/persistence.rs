//! Integration tests for hydration and debounced write-through
//!
//! Runs on a paused tokio clock, so debounce windows elapse instantly and
//! deterministically.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use rust_decimal_macros::dec;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use storefront_catalog::ProductId;
use storefront_runtime::{FileStorage, HydrationPhase};
use storefront_stores::{CART_STORAGE_KEY, CartStore, FAVORITES_STORAGE_KEY, FavoritesStore};
use storefront_testing::{InMemoryStorage, fixtures, test_clock, test_epoch};

const DEBOUNCE: Duration = Duration::from_secs(3);

fn cart_on(storage: &InMemoryStorage) -> CartStore {
    CartStore::new(Arc::new(storage.clone()), Arc::new(test_clock()))
}

fn stored(storage: &InMemoryStorage, key: &str) -> Value {
    serde_json::from_str(&storage.raw(key).expect("snapshot written")).unwrap()
}

fn persisted_cart(product_id: u64, quantity: u32) -> String {
    json!({
        "version": 1,
        "state": {
            "items": [{
                "product": {"id": product_id, "title": "Desk Lamp", "price": 12.5},
                "quantity": quantity,
                "addedAt": "2024-06-01T12:00:00Z"
            }]
        }
    })
    .to_string()
}

// ============================================================================
// Debounce
// ============================================================================

#[tokio::test(start_paused = true)]
async fn writes_once_after_the_quiet_period() {
    let storage = InMemoryStorage::new();
    let cart = cart_on(&storage);
    cart.hydrate().await;

    cart.add_item(fixtures::product(1, dec!(10)), 1).await;
    tokio::time::sleep(Duration::from_secs(1)).await;
    cart.add_item(fixtures::product(2, dec!(10)), 1).await;
    tokio::time::sleep(Duration::from_secs(1)).await;
    cart.update_quantity(ProductId::new(1), 4).await;

    tokio::time::sleep(DEBOUNCE - Duration::from_millis(100)).await;
    assert_eq!(storage.write_count(), 0, "no write inside the debounce window");

    assert!(storage.wait_for_writes(1, Duration::from_secs(1)).await);
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(storage.write_count(), 1, "mutations coalesce into one write");

    let snapshot = stored(&storage, CART_STORAGE_KEY);
    assert_eq!(snapshot["version"], 1);
    assert_eq!(snapshot["state"]["items"][0]["quantity"], 4);
    assert_eq!(snapshot["state"]["items"][1]["product"]["id"], 2);
}

#[tokio::test(start_paused = true)]
async fn each_quiet_period_produces_a_write() {
    let storage = InMemoryStorage::new();
    let favorites = FavoritesStore::new(Arc::new(storage.clone()), Arc::new(test_clock()));
    favorites.hydrate().await;

    favorites.add_to_favorites(fixtures::product(1, dec!(5))).await;
    assert!(storage.wait_for_writes(1, Duration::from_secs(5)).await);

    favorites.toggle_favorite(fixtures::product(2, dec!(5))).await;
    assert!(storage.wait_for_writes(2, Duration::from_secs(5)).await);

    let snapshot = stored(&storage, FAVORITES_STORAGE_KEY);
    let ids: Vec<u64> = snapshot["state"]["favorites"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["product"]["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, vec![2, 1]);
}

// ============================================================================
// Hydration
// ============================================================================

#[tokio::test(start_paused = true)]
async fn nothing_is_written_before_hydration() {
    let storage = InMemoryStorage::new();
    let cart = cart_on(&storage);

    cart.add_item(fixtures::product(1, dec!(10)), 1).await;
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert_eq!(cart.phase(), HydrationPhase::NotHydrated);
    assert_eq!(storage.write_attempts(), 0);
    assert!(cart.flush().await.is_ok());
    assert_eq!(storage.write_attempts(), 0);

    cart.hydrate().await;
    assert!(storage.wait_for_writes(1, Duration::from_secs(5)).await);
    assert_eq!(stored(&storage, CART_STORAGE_KEY)["state"]["items"][0]["product"]["id"], 1);
}

#[tokio::test(start_paused = true)]
async fn persisted_data_replaces_provisional_state() {
    let storage = InMemoryStorage::with_entry(CART_STORAGE_KEY, persisted_cart(5, 2));
    let cart = cart_on(&storage);

    cart.add_item(fixtures::product(1, dec!(10)), 1).await;
    cart.hydrate().await;

    assert!(cart.is_hydrated());
    let items = cart.items().await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].product.id, ProductId::new(5));
    assert_eq!(items[0].quantity, 2);
    assert_eq!(cart.get_total_price().await, dec!(25));
}

#[tokio::test(start_paused = true)]
async fn hydrating_a_current_snapshot_does_not_rewrite_it() {
    let storage = InMemoryStorage::with_entry(CART_STORAGE_KEY, persisted_cart(5, 2));
    let cart = cart_on(&storage);

    cart.hydrate().await;
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert_eq!(storage.write_attempts(), 0);
}

#[tokio::test(start_paused = true)]
async fn legacy_snapshot_is_migrated_and_written_back() {
    let legacy = json!({
        "version": 0,
        "state": {"items": [{"productId": 5, "quantity": 2}]}
    });
    let storage = InMemoryStorage::with_entry(CART_STORAGE_KEY, legacy.to_string());
    let cart = cart_on(&storage);

    cart.hydrate().await;

    let line = cart.line(ProductId::new(5)).await.expect("migrated line");
    assert_eq!(line.quantity, 2);
    assert_eq!(line.added_at, test_epoch());

    assert!(storage.wait_for_writes(1, Duration::from_secs(5)).await);
    let snapshot = stored(&storage, CART_STORAGE_KEY);
    assert_eq!(snapshot["version"], 1);
    assert_eq!(snapshot["state"]["items"][0]["product"]["id"], 5);
    assert_eq!(snapshot["state"]["items"][0]["addedAt"], "2025-01-01T00:00:00Z");
}

#[tokio::test(start_paused = true)]
async fn unreadable_snapshots_fall_back_to_an_empty_cart() {
    let cases = [
        InMemoryStorage::with_entry(CART_STORAGE_KEY, "{not json"),
        InMemoryStorage::with_entry(CART_STORAGE_KEY, r#"{"version":9,"state":{"items":[]}}"#),
        InMemoryStorage::with_entry(CART_STORAGE_KEY, r#"{"version":1,"state":{"items":"lamp"}}"#),
        {
            let storage = InMemoryStorage::with_entry(CART_STORAGE_KEY, persisted_cart(5, 2));
            storage.fail_reads(true);
            storage
        },
    ];

    for storage in cases {
        let cart = cart_on(&storage);
        cart.hydrate().await;

        assert!(cart.is_hydrated());
        assert!(cart.items().await.is_empty());

        cart.add_item(fixtures::product(1, dec!(10)), 1).await;
        assert_eq!(cart.get_total_items().await, 1);
    }
}

#[tokio::test(start_paused = true)]
async fn hydration_runs_once() {
    let storage = InMemoryStorage::with_entry(CART_STORAGE_KEY, persisted_cart(5, 2));
    let cart = cart_on(&storage);

    cart.hydrate().await;
    cart.add_item(fixtures::product(1, dec!(10)), 1).await;
    storage.put_raw(CART_STORAGE_KEY, persisted_cart(9, 9));
    cart.hydrate().await;

    assert_eq!(cart.get_total_items().await, 3);
    assert!(!cart.contains(ProductId::new(9)).await);
}

#[tokio::test(start_paused = true)]
async fn waiters_resume_after_hydration() {
    let storage = InMemoryStorage::new();
    let cart = Arc::new(cart_on(&storage));

    let waiter = {
        let cart = Arc::clone(&cart);
        tokio::spawn(async move {
            cart.wait_until_hydrated().await;
            cart.is_hydrated()
        })
    };

    tokio::task::yield_now().await;
    assert!(!waiter.is_finished());

    cart.hydrate().await;
    assert!(waiter.await.unwrap());
}

// ============================================================================
// Failures, flush and shutdown
// ============================================================================

#[tokio::test(start_paused = true)]
async fn failed_write_is_retried_on_next_change() {
    let storage = InMemoryStorage::new();
    let cart = cart_on(&storage);
    cart.hydrate().await;

    storage.fail_writes(true);
    cart.add_item(fixtures::product(1, dec!(10)), 1).await;
    tokio::time::sleep(DEBOUNCE * 2).await;

    assert_eq!(storage.write_attempts(), 1);
    assert_eq!(storage.write_count(), 0);
    assert_eq!(cart.get_total_items().await, 1, "memory is unaffected by the failed write");

    storage.fail_writes(false);
    cart.add_item(fixtures::product(2, dec!(10)), 1).await;
    assert!(storage.wait_for_writes(1, Duration::from_secs(5)).await);

    let items = &stored(&storage, CART_STORAGE_KEY)["state"]["items"];
    assert_eq!(items.as_array().map(Vec::len), Some(2));
}

#[tokio::test(start_paused = true)]
async fn flush_skips_the_debounce() {
    let storage = InMemoryStorage::new();
    let cart = cart_on(&storage);
    cart.hydrate().await;

    cart.add_item(fixtures::product(1, dec!(10)), 3).await;
    cart.flush().await.unwrap();
    assert_eq!(storage.write_count(), 1);

    cart.flush().await.unwrap();
    tokio::time::sleep(DEBOUNCE * 2).await;
    assert_eq!(storage.write_count(), 1, "clean state is not rewritten");
}

#[tokio::test(start_paused = true)]
async fn flush_during_a_slow_write_keeps_the_newest_cart() {
    let storage = InMemoryStorage::new();
    storage.delay_next_write(Duration::from_secs(1));
    let cart = cart_on(&storage);
    cart.hydrate().await;

    cart.add_item(fixtures::product(1, dec!(10)), 1).await;
    tokio::time::sleep(DEBOUNCE + Duration::from_millis(100)).await;
    cart.add_item(fixtures::product(2, dec!(10)), 1).await;
    cart.flush().await.unwrap();
    tokio::time::sleep(Duration::from_secs(10)).await;

    let ids: Vec<u64> = stored(&storage, CART_STORAGE_KEY)["state"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["product"]["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2]);

    let restarted = cart_on(&storage);
    restarted.hydrate().await;
    assert!(restarted.contains(ProductId::new(2)).await);
}

#[tokio::test(start_paused = true)]
async fn flush_reports_storage_errors() {
    let storage = InMemoryStorage::new();
    let favorites = FavoritesStore::new(Arc::new(storage.clone()), Arc::new(test_clock()));
    favorites.hydrate().await;
    favorites.add_to_favorites(fixtures::product(1, dec!(10))).await;

    storage.fail_writes(true);
    assert!(favorites.flush().await.is_err());

    storage.fail_writes(false);
    assert!(favorites.flush().await.is_ok());
    assert_eq!(storage.write_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn shutdown_writes_pending_changes() {
    let storage = InMemoryStorage::new();
    let cart = cart_on(&storage);
    cart.hydrate().await;

    cart.add_item(fixtures::product(1, dec!(10)), 2).await;
    cart.shutdown(Duration::from_secs(1)).await.unwrap();

    assert_eq!(storage.write_count(), 1);
    assert_eq!(stored(&storage, CART_STORAGE_KEY)["state"]["items"][0]["quantity"], 2);
}

// ============================================================================
// File storage
// ============================================================================

#[tokio::test]
async fn cart_survives_a_restart_on_disk() {
    let dir = tempfile::tempdir().unwrap();

    {
        let cart = CartStore::new(Arc::new(FileStorage::new(dir.path())), Arc::new(test_clock()));
        cart.hydrate().await;
        cart.add_item(fixtures::discounted(1, dec!(100), dec!(20)), 3).await;
        cart.add_item(fixtures::product(2, dec!(4.5)), 2).await;
        cart.shutdown(Duration::from_secs(1)).await.unwrap();
    }

    assert!(dir.path().join("cart-storage.json").exists());

    let restarted = CartStore::new(Arc::new(FileStorage::new(dir.path())), Arc::new(test_clock()));
    restarted.hydrate().await;

    assert_eq!(restarted.get_total_items().await, 5);
    assert_eq!(restarted.get_total_price().await, dec!(249.00));
    let ids: Vec<u64> = restarted
        .items()
        .await
        .iter()
        .map(|line| line.product.id.get())
        .collect();
    assert_eq!(ids, vec![1, 2]);
}
