//! End-to-end checkout walkthrough against in-memory collaborators.
//!
//! Seeds a catalog, signs in a demo shopper, fills the cart, places an order
//! and reads it back. With `--fail-first-checkout` the document store is
//! taken offline for the first attempt to show that a failed write leaves
//! the cart untouched.

use std::path::Path;
use std::sync::Arc;

use shopfront::catalog::{CatalogSource, CategoryFilter, DocumentCatalog};
use shopfront::config::ShopConfig;
use shopfront::documents::MemoryDocumentStore;
use shopfront::identity::{CurrentUser, LocalIdentity};
use shopfront::session::ShopSession;
use shopfront_core::{Email, UserId};
use tracing::{info, warn};

use super::CommandError;
use super::seed::{BUNDLED_CATALOG, SeedFile};

/// Options for the demo run.
#[derive(Debug, Default)]
pub struct DemoOptions<'a> {
    /// Seed file to load instead of the bundled catalog.
    pub seed_path: Option<&'a str>,
    /// Take the store offline for the first checkout attempt.
    pub fail_first_checkout: bool,
}

fn demo_user() -> Result<CurrentUser, CommandError> {
    Ok(CurrentUser {
        id: UserId::new("demo-shopper"),
        email: Email::parse("demo@shopfront.test").map_err(shopfront::StoreError::from)?,
    })
}

fn log_cart(session: &ShopSession) {
    let cart = session.cart().snapshot();
    info!(items = cart.item_count(), "Cart");
    for line in cart.items() {
        info!(
            "  {} x{} @ {} = {}",
            line.title,
            line.quantity,
            line.unit_price,
            line.line_total()
        );
    }
    info!("  Subtotal: {}", cart.subtotal());
    info!("  Tax ({}): {}", cart.tax_rate(), cart.tax());
    info!("  Total: {}", cart.total());
}

/// Run the walkthrough.
///
/// # Errors
///
/// Returns an error if the seed file is unusable or a storefront operation
/// fails unexpectedly.
pub async fn run(config: &ShopConfig, options: DemoOptions<'_>) -> Result<(), CommandError> {
    let seed = match options.seed_path {
        Some(path) => SeedFile::read(Path::new(path)).await?,
        None => SeedFile::parse(BUNDLED_CATALOG)?,
    };
    let problems = seed.problems();
    if !problems.is_empty() {
        return Err(CommandError::Validation(problems.len()));
    }

    let store = MemoryDocumentStore::new();
    let catalog = DocumentCatalog::new(Arc::new(store.clone()), &config.catalog);
    let (categories, products) = seed.load(&catalog).await?;
    info!(categories, products, "Catalog seeded");

    let identity = LocalIdentity::new();
    let session = ShopSession::start(config, Arc::new(identity.clone()), Arc::new(store.clone()));

    identity.sign_in(demo_user()?);
    let profile = session.account().create_profile("Demo Shopper").await?;
    info!(name = %profile.name, email = %profile.email, "Signed in");

    let listing = catalog.list_products(&CategoryFilter::All).await?;
    let mut picks = listing.iter().take(2);
    if let Some(first) = picks.next() {
        session.add_to_cart(&catalog, &first.id).await?;
        session.add_to_cart(&catalog, &first.id).await?;
    }
    if let Some(second) = picks.next() {
        session.add_to_cart(&catalog, &second.id).await?;
    }
    log_cart(&session);

    if options.fail_first_checkout {
        store.set_offline(true);
        match session.place_order().await {
            Err(err) => warn!(error = %err, "Checkout failed; cart kept"),
            Ok(order) => warn!(order_number = %order.order_number, "Checkout unexpectedly succeeded"),
        }
        store.set_offline(false);
        log_cart(&session);
    }

    let order = session.place_order().await?;
    info!(
        order_number = %order.order_number,
        status = order.status.label(),
        total = %order.total,
        "Order confirmed"
    );

    let history = session.checkout().order_history().await?;
    info!(orders = history.len(), "Order history");
    for record in &history {
        info!(
            "  {} placed {} - {} item(s), {}",
            record.order_number,
            record.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
            record.item_count(),
            record.total
        );
    }

    session.sign_out().await?;
    info!(
        cart_items = session.cart().snapshot().item_count(),
        "Signed out"
    );
    Ok(())
}
