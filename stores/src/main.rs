//! Storefront demo binary
//!
//! Loads the persisted cart and favorites, adds a few catalog products and
//! prints the checkout summary. Run it twice to see hydration pick up the
//! previous run's state.

use anyhow::Context;
use clap::Parser;
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use storefront_catalog::{CatalogClient, Product, ProductsQuery};
use storefront_core::environment::{Clock, SystemClock};
use storefront_core::storage::KeyValueStorage;
use storefront_runtime::FileStorage;
use storefront_stores::{
    CART_STORAGE_KEY, CartStore, FAVORITES_STORAGE_KEY, FavoritesStore, StorefrontConfig,
    format_currency,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Exercise the persisted storefront stores
#[derive(Debug, Parser)]
#[command(name = "storefront", version, about)]
struct Args {
    /// Use built-in sample products instead of the catalog API
    #[arg(long)]
    offline: bool,

    /// Empty the cart and favorites before adding anything
    #[arg(long)]
    reset: bool,

    /// Catalog search term
    #[arg(long, default_value = "phone")]
    search: String,

    /// Read settings from this file instead of `./.env`
    #[arg(long)]
    env_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load .env file
    if args.env_file.is_none() {
        let _ = dotenvy::dotenv();
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "storefront=info,storefront_stores=info,storefront_runtime=info,storefront_catalog=info"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match &args.env_file {
        Some(path) => StorefrontConfig::from_env_file(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => StorefrontConfig::from_env(),
    };

    tracing::info!(data_dir = %config.data_dir.display(), "Starting storefront");

    let storage: Arc<dyn KeyValueStorage> = Arc::new(FileStorage::new(&config.data_dir));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let cart = CartStore::with_config(
        Arc::clone(&storage),
        Arc::clone(&clock),
        config.persist_config(CART_STORAGE_KEY),
        config.checkout.clone(),
    );
    let favorites = FavoritesStore::with_config(
        storage,
        clock,
        config.persist_config(FAVORITES_STORAGE_KEY),
    );

    tokio::join!(cart.hydrate(), favorites.hydrate());
    println!(
        "Hydrated: {} items in cart, {} favorites",
        cart.get_total_items().await,
        favorites.get_favorites_count().await
    );

    if args.reset {
        cart.clear_cart().await;
        favorites.clear_favorites().await;
    }

    let products = if args.offline {
        sample_products()
    } else {
        let client = CatalogClient::new(config.catalog.clone()).context("building catalog client")?;
        let query = ProductsQuery::new().with_search(args.search.as_str()).with_limit(3);
        match client.get_products(&query).await {
            Ok(response) => response.products,
            Err(error) => {
                tracing::warn!(%error, "Catalog unavailable, using sample products");
                sample_products()
            },
        }
    };

    for (product, quantity) in products.iter().zip([2_u32, 1, 3]) {
        let outcome = cart.add_item(product.clone(), quantity).await;
        println!("add_item({}, {quantity}) -> {outcome:?}", product.title);
    }
    if let Some(first) = products.first() {
        let outcome = favorites.toggle_favorite(first.clone()).await;
        println!("toggle_favorite({}) -> {outcome:?}", first.title);
    }

    let currency = config.currency;
    println!("\nCart:");
    for line in cart.items().await {
        println!(
            "  {:>3} x {:<32} {}",
            line.quantity,
            line.product.title,
            format_currency(line.line_total(), currency)
        );
    }

    let summary = cart.summary().await;
    println!("\n  Items:    {}", summary.total_items);
    println!("  Subtotal: {}", format_currency(summary.subtotal, currency));
    println!("  Shipping: {}", format_currency(summary.shipping, currency));
    println!("  Tax:      {}", format_currency(summary.tax, currency));
    println!("  Total:    {}", format_currency(summary.total, currency));

    println!("\nFavorites (newest first):");
    for entry in favorites.get_recently_added(None).await {
        println!("  {} ({})", entry.product.title, entry.added_at.to_rfc3339());
    }

    let grace = Duration::from_secs(5);
    cart.shutdown(grace).await.context("saving cart")?;
    favorites.shutdown(grace).await.context("saving favorites")?;

    tracing::info!("Storefront state saved");
    Ok(())
}

fn sample_products() -> Vec<Product> {
    vec![
        Product::new(1, "Essence Mascara Lash Princess", Decimal::new(999, 2))
            .with_brand("Essence")
            .with_category("beauty")
            .with_discount(Decimal::new(704, 2))
            .with_stock(99),
        Product::new(2, "Eyeshadow Palette with Mirror", Decimal::new(1999, 2))
            .with_brand("Glamour Beauty")
            .with_category("beauty")
            .with_stock(34),
        Product::new(6, "Calvin Klein CK One", Decimal::new(4999, 2))
            .with_brand("Calvin Klein")
            .with_category("fragrances")
            .with_discount(Decimal::new(5, 1))
            .with_stock(29),
    ]
}
