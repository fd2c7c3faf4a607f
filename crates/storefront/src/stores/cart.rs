//! In-memory shopping cart with stock-aware merge semantics.
//!
//! The cart owns the list of line items a shopper intends to purchase.
//! Requested quantities are reconciled against a per-item stock ceiling
//! (a snapshot taken when the item was last touched, not a live value).
//! The cart lives only for the session: it clears on logout and does not
//! survive a reload.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::instrument;

use lockerbay_core::{Price, ProductId};

use crate::events::{AppEvent, EventBus};
use crate::services::notify::{Notifier, Severity};

/// One product entry in the cart, uniquely keyed by product ID.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub image: String,
    /// Tax-exclusive unit price.
    pub unit_price: Price,
    /// Invariant: `1 <= quantity <= stock_limit` after any successful
    /// mutation through [`CartStore::add_to_cart`].
    pub quantity: u32,
    /// Maximum purchasable quantity known when the line was last touched.
    pub stock_limit: u32,
}

/// A request to add a product to the cart.
#[derive(Debug, Clone)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    pub name: String,
    pub image: String,
    pub unit_price: Price,
    pub quantity: u32,
    pub stock_limit: u32,
}

/// Outcome of an add operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// The full requested quantity was added.
    Added {
        /// Quantity actually added.
        added: u32,
    },
    /// The request exceeded the stock limit; the stored quantity was
    /// clamped and `added` is the delta actually applied.
    AdjustedToStock {
        /// Quantity actually added.
        added: u32,
    },
    /// The product has no stock; nothing was inserted.
    OutOfStock,
    /// The line already holds the stock limit; the cart is unchanged.
    MaximumReached,
    /// Another cart mutation was in flight; this call was a no-op.
    Ignored,
}

/// Outcome of a quantity update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The quantity was set.
    Updated,
    /// A non-positive quantity removed the line.
    Removed,
    /// No line exists for the product; nothing happened.
    NotFound,
    /// Another cart mutation was in flight; this call was a no-op.
    Ignored,
}

/// Error from the cart-persistence backend.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct BackendError(pub String);

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Add requests must carry a quantity of at least one.
    #[error("quantity must be at least 1")]
    ZeroQuantity,

    /// The backend rejected the mutation; the cart was left unchanged.
    #[error("cart backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Async boundary standing in for the cart-persistence backend.
///
/// Mutations persist a prospective snapshot before the in-memory state
/// is updated, so a backend error leaves the cart untouched. A real
/// implementation substituting network calls must keep the re-entrancy
/// lock around this boundary so the merge invariant holds under latency.
#[async_trait]
pub trait CartBackend: Send + Sync {
    /// Persist the prospective cart contents.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] to abort the mutation.
    async fn persist(&self, lines: &[CartLine]) -> Result<(), BackendError>;
}

/// Backend that accepts every snapshot immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstantBackend;

#[async_trait]
impl CartBackend for InstantBackend {
    async fn persist(&self, _lines: &[CartLine]) -> Result<(), BackendError> {
        Ok(())
    }
}

/// What an add operation decided to do, before touching state.
enum Plan {
    Reject(AddOutcome),
    Store { new_quantity: u32, outcome: AddOutcome },
}

/// The in-memory cart store.
///
/// Owns its line list exclusively; all mutation goes through these
/// methods. `add_to_cart` and `update_quantity` are serialized by an
/// in-flight flag: a second call arriving while one is mid round-trip
/// is ignored rather than queued.
pub struct CartStore {
    lines: Mutex<Vec<CartLine>>,
    in_flight: AtomicBool,
    backend: Arc<dyn CartBackend>,
    notifier: Arc<dyn Notifier>,
}

impl CartStore {
    /// Create a cart with the instant (no-op) backend.
    #[must_use]
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self::with_backend(Arc::new(InstantBackend), notifier)
    }

    /// Create a cart with an explicit persistence backend.
    #[must_use]
    pub fn with_backend(backend: Arc<dyn CartBackend>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            lines: Mutex::new(Vec::new()),
            in_flight: AtomicBool::new(false),
            backend,
            notifier,
        }
    }

    /// Subscribe this cart to the bus: it clears itself on logout.
    pub fn attach(self: &Arc<Self>, bus: &EventBus) {
        let store = Arc::downgrade(self);
        bus.subscribe(move |event| {
            if *event == AppEvent::LoggedOut {
                if let Some(store) = store.upgrade() {
                    store.clear();
                }
            }
        });
    }

    /// Add a product to the cart, merging with any existing line.
    ///
    /// Quantities are clamped to the request's stock limit; a zero-stock
    /// first-time add inserts nothing (zero-quantity lines are
    /// forbidden); a merge with no room leaves the cart unchanged. Each
    /// case notifies the shopper accordingly.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ZeroQuantity`] if the request carries a zero
    /// quantity, or [`CartError::Backend`] if persisting fails (the cart
    /// is rolled back and a failure is notified before re-raising).
    #[instrument(skip(self, request), fields(product_id = %request.product_id))]
    pub async fn add_to_cart(&self, request: AddToCartRequest) -> Result<AddOutcome, CartError> {
        if request.quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }

        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            tracing::debug!("cart mutation in flight; add ignored");
            return Ok(AddOutcome::Ignored);
        };

        let plan = {
            let lines = self.lock_lines();
            plan_add(&lines, &request)
        };

        match plan {
            Plan::Reject(outcome) => {
                self.notify_rejected(&request.name, outcome);
                Ok(outcome)
            }
            Plan::Store {
                new_quantity,
                outcome,
            } => {
                let prospective = self.prospective_set(&request, new_quantity);
                if let Err(e) = self.backend.persist(&prospective).await {
                    tracing::error!(error = %e, "cart add failed");
                    self.notifier.notify(
                        Severity::Error,
                        "Something went wrong updating your cart. Please try again.",
                    );
                    return Err(e.into());
                }

                self.apply_set(&request, new_quantity);
                self.notify_stored(&request, outcome);
                Ok(outcome)
            }
        }
    }

    /// Set a line's quantity directly, or remove it.
    ///
    /// A non-positive `quantity` removes the line and notifies removal.
    /// Otherwise the quantity is set as given, with no re-clamping: the
    /// quantity selector driving this call enforces the maximum itself.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Backend`] if persisting fails (the cart is
    /// rolled back and a failure is notified before re-raising).
    #[instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<UpdateOutcome, CartError> {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            tracing::debug!("cart mutation in flight; update ignored");
            return Ok(UpdateOutcome::Ignored);
        };

        let Some(line) = self.find_line(product_id) else {
            tracing::debug!("no cart line for product; update skipped");
            return Ok(UpdateOutcome::NotFound);
        };

        if quantity <= 0 {
            let prospective = self.prospective_remove(product_id);
            if let Err(e) = self.backend.persist(&prospective).await {
                tracing::error!(error = %e, "cart removal failed");
                self.notifier.notify(
                    Severity::Error,
                    "Something went wrong updating your cart. Please try again.",
                );
                return Err(e.into());
            }

            self.apply_remove(product_id);
            self.notifier
                .notify(Severity::Success, &format!("Removed {} from your cart", line.name));
            return Ok(UpdateOutcome::Removed);
        }

        let new_quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        let prospective = self.prospective_quantity(product_id, new_quantity);
        if let Err(e) = self.backend.persist(&prospective).await {
            tracing::error!(error = %e, "cart update failed");
            self.notifier.notify(
                Severity::Error,
                "Something went wrong updating your cart. Please try again.",
            );
            return Err(e.into());
        }

        self.apply_quantity(product_id, new_quantity);
        Ok(UpdateOutcome::Updated)
    }

    /// Remove a line unconditionally. Fire-and-forget: not serialized
    /// against in-flight mutations, and removal is always notified.
    pub fn remove_from_cart(&self, product_id: ProductId) {
        let removed = {
            let mut lines = self.lock_lines();
            lines
                .iter()
                .position(|line| line.product_id == product_id)
                .map(|index| lines.remove(index))
        };

        let name = removed.map_or_else(|| "Item".to_owned(), |line| line.name);
        self.notifier
            .notify(Severity::Success, &format!("Removed {name} from your cart"));
    }

    /// Empty the cart. No notification.
    pub fn clear(&self) {
        self.lock_lines().clear();
        tracing::debug!("cart cleared");
    }

    /// Total number of items across all lines, for the badge.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.lock_lines().iter().map(|line| line.quantity).sum()
    }

    /// Tax-exclusive subtotal across all lines.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.lock_lines()
            .iter()
            .map(|line| line.unit_price.times(line.quantity))
            .sum()
    }

    /// Snapshot of the current lines, for display.
    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        self.lock_lines().clone()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock_lines().is_empty()
    }

    fn lock_lines(&self) -> std::sync::MutexGuard<'_, Vec<CartLine>> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn find_line(&self, product_id: ProductId) -> Option<CartLine> {
        self.lock_lines()
            .iter()
            .find(|line| line.product_id == product_id)
            .cloned()
    }

    /// Prospective contents with the request's line set to `quantity`.
    fn prospective_set(&self, request: &AddToCartRequest, quantity: u32) -> Vec<CartLine> {
        let mut lines = self.lines();
        set_line(&mut lines, request, quantity);
        lines
    }

    fn prospective_quantity(&self, product_id: ProductId, quantity: u32) -> Vec<CartLine> {
        let mut lines = self.lines();
        if let Some(line) = lines.iter_mut().find(|line| line.product_id == product_id) {
            line.quantity = quantity;
        }
        lines
    }

    fn prospective_remove(&self, product_id: ProductId) -> Vec<CartLine> {
        let mut lines = self.lines();
        lines.retain(|line| line.product_id != product_id);
        lines
    }

    fn apply_set(&self, request: &AddToCartRequest, quantity: u32) {
        let mut lines = self.lock_lines();
        set_line(&mut lines, request, quantity);
    }

    fn apply_quantity(&self, product_id: ProductId, quantity: u32) {
        let mut lines = self.lock_lines();
        if let Some(line) = lines.iter_mut().find(|line| line.product_id == product_id) {
            line.quantity = quantity;
        }
    }

    fn apply_remove(&self, product_id: ProductId) {
        self.lock_lines()
            .retain(|line| line.product_id != product_id);
    }

    fn notify_rejected(&self, name: &str, outcome: AddOutcome) {
        match outcome {
            AddOutcome::OutOfStock => {
                self.notifier
                    .notify(Severity::Warning, &format!("{name} is out of stock"));
            }
            AddOutcome::MaximumReached => {
                self.notifier.notify(
                    Severity::Warning,
                    &format!("{name}: maximum available quantity already reached"),
                );
            }
            _ => {}
        }
    }

    fn notify_stored(&self, request: &AddToCartRequest, outcome: AddOutcome) {
        match outcome {
            AddOutcome::Added { added } => {
                self.notifier.notify(
                    Severity::Success,
                    &format!("Added {added} x {} to your cart", request.name),
                );
            }
            AddOutcome::AdjustedToStock { added } => {
                self.notifier.notify(
                    Severity::Warning,
                    &format!(
                        "Only {} of {} available; quantity adjusted",
                        request.stock_limit, request.name
                    ),
                );
                self.notifier.notify(
                    Severity::Success,
                    &format!("Added {added} x {} to your cart", request.name),
                );
            }
            _ => {}
        }
    }
}

/// Insert or overwrite the request's line with the given quantity,
/// refreshing the stock snapshot.
fn set_line(lines: &mut Vec<CartLine>, request: &AddToCartRequest, quantity: u32) {
    if let Some(line) = lines
        .iter_mut()
        .find(|line| line.product_id == request.product_id)
    {
        line.quantity = quantity;
        line.stock_limit = request.stock_limit;
    } else {
        lines.push(CartLine {
            product_id: request.product_id,
            name: request.name.clone(),
            image: request.image.clone(),
            unit_price: request.unit_price,
            quantity,
            stock_limit: request.stock_limit,
        });
    }
}

/// Decide what an add should do against the current lines.
fn plan_add(lines: &[CartLine], request: &AddToCartRequest) -> Plan {
    let existing = lines
        .iter()
        .find(|line| line.product_id == request.product_id);

    let Some(existing) = existing else {
        if request.stock_limit == 0 {
            return Plan::Reject(AddOutcome::OutOfStock);
        }
        if request.quantity > request.stock_limit {
            return Plan::Store {
                new_quantity: request.stock_limit,
                outcome: AddOutcome::AdjustedToStock {
                    added: request.stock_limit,
                },
            };
        }
        return Plan::Store {
            new_quantity: request.quantity,
            outcome: AddOutcome::Added {
                added: request.quantity,
            },
        };
    };

    let wanted = existing.quantity.saturating_add(request.quantity);
    if wanted > request.stock_limit {
        if existing.quantity >= request.stock_limit {
            return Plan::Reject(AddOutcome::MaximumReached);
        }
        return Plan::Store {
            new_quantity: request.stock_limit,
            outcome: AddOutcome::AdjustedToStock {
                added: request.stock_limit - existing.quantity,
            },
        };
    }

    Plan::Store {
        new_quantity: wanted,
        outcome: AddOutcome::Added {
            added: request.quantity,
        },
    }
}

/// Clears the in-flight flag when the mutation finishes, error paths
/// included.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Acquire)
            .is_ok()
            .then_some(Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use rust_decimal::Decimal;

    use lockerbay_core::CurrencyCode;

    use super::*;
    use crate::services::notify::BufferNotifier;

    struct SlowBackend;

    #[async_trait]
    impl CartBackend for SlowBackend {
        async fn persist(&self, _lines: &[CartLine]) -> Result<(), BackendError> {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(())
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl CartBackend for FailingBackend {
        async fn persist(&self, _lines: &[CartLine]) -> Result<(), BackendError> {
            Err(BackendError("connection reset".to_owned()))
        }
    }

    fn request(id: i64, quantity: u32, stock_limit: u32) -> AddToCartRequest {
        AddToCartRequest {
            product_id: ProductId::new(id),
            name: format!("Product {id}"),
            image: format!("/img/{id}.webp"),
            unit_price: Price::new(Decimal::new(1000, 2), CurrencyCode::ARS).unwrap(),
            quantity,
            stock_limit,
        }
    }

    fn store() -> (CartStore, Arc<BufferNotifier>) {
        let notifier = Arc::new(BufferNotifier::new());
        let cart = CartStore::new(Arc::clone(&notifier) as Arc<dyn Notifier>);
        (cart, notifier)
    }

    #[tokio::test]
    async fn test_add_inserts_line() {
        let (cart, notifier) = store();

        let outcome = cart.add_to_cart(request(1, 2, 5)).await.unwrap();
        assert_eq!(outcome, AddOutcome::Added { added: 2 });
        assert_eq!(cart.count(), 2);
        assert!(notifier.contains("Added 2 x Product 1"));
    }

    #[tokio::test]
    async fn test_add_clamps_new_line_to_stock() {
        let (cart, notifier) = store();

        let outcome = cart.add_to_cart(request(1, 7, 5)).await.unwrap();
        assert_eq!(outcome, AddOutcome::AdjustedToStock { added: 5 });
        assert_eq!(cart.count(), 5);
        assert!(notifier.contains("quantity adjusted"));
    }

    #[tokio::test]
    async fn test_add_zero_stock_inserts_nothing() {
        let (cart, notifier) = store();

        let outcome = cart.add_to_cart(request(1, 1, 0)).await.unwrap();
        assert_eq!(outcome, AddOutcome::OutOfStock);
        assert!(cart.is_empty());
        assert!(notifier.contains("out of stock"));
    }

    #[tokio::test]
    async fn test_merge_sums_within_stock() {
        let (cart, _) = store();

        cart.add_to_cart(request(1, 2, 10)).await.unwrap();
        let outcome = cart.add_to_cart(request(1, 3, 10)).await.unwrap();
        assert_eq!(outcome, AddOutcome::Added { added: 3 });
        assert_eq!(cart.count(), 5);
        assert_eq!(cart.lines().len(), 1);
    }

    #[tokio::test]
    async fn test_merge_clamps_to_stock() {
        let (cart, _) = store();

        cart.add_to_cart(request(1, 3, 5)).await.unwrap();
        let outcome = cart.add_to_cart(request(1, 4, 5)).await.unwrap();
        assert_eq!(outcome, AddOutcome::AdjustedToStock { added: 2 });
        assert_eq!(cart.count(), 5);
    }

    #[tokio::test]
    async fn test_merge_with_no_room_is_rejected() {
        let (cart, notifier) = store();

        cart.add_to_cart(request(1, 2, 2)).await.unwrap();
        let outcome = cart.add_to_cart(request(1, 1, 2)).await.unwrap();
        assert_eq!(outcome, AddOutcome::MaximumReached);
        assert_eq!(cart.count(), 2);
        assert!(notifier.contains("maximum available quantity"));
    }

    #[tokio::test]
    async fn test_add_zero_quantity_is_an_error() {
        let (cart, _) = store();
        assert!(matches!(
            cart.add_to_cart(request(1, 0, 5)).await,
            Err(CartError::ZeroQuantity)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_add_while_in_flight_is_ignored() {
        let notifier = Arc::new(BufferNotifier::new());
        let cart = CartStore::with_backend(
            Arc::new(SlowBackend),
            Arc::clone(&notifier) as Arc<dyn Notifier>,
        );

        let (first, second) =
            tokio::join!(cart.add_to_cart(request(1, 1, 10)), cart.add_to_cart(request(1, 1, 10)));

        assert_eq!(first.unwrap(), AddOutcome::Added { added: 1 });
        assert_eq!(second.unwrap(), AddOutcome::Ignored);
        assert_eq!(cart.count(), 1);
    }

    #[tokio::test]
    async fn test_backend_failure_rolls_back_and_reraises() {
        let notifier = Arc::new(BufferNotifier::new());
        let cart = CartStore::with_backend(
            Arc::new(FailingBackend),
            Arc::clone(&notifier) as Arc<dyn Notifier>,
        );

        let result = cart.add_to_cart(request(1, 2, 5)).await;
        assert!(matches!(result, Err(CartError::Backend(_))));
        assert!(cart.is_empty());
        assert!(notifier.contains("Something went wrong"));
    }

    #[tokio::test]
    async fn test_update_sets_quantity_directly() {
        let (cart, _) = store();

        cart.add_to_cart(request(1, 1, 10)).await.unwrap();
        let outcome = cart.update_quantity(ProductId::new(1), 7).await.unwrap();
        assert_eq!(outcome, UpdateOutcome::Updated);
        assert_eq!(cart.count(), 7);
    }

    #[tokio::test]
    async fn test_update_nonpositive_removes() {
        let (cart, notifier) = store();

        cart.add_to_cart(request(1, 2, 10)).await.unwrap();
        let outcome = cart.update_quantity(ProductId::new(1), 0).await.unwrap();
        assert_eq!(outcome, UpdateOutcome::Removed);
        assert!(cart.is_empty());
        assert!(notifier.contains("Removed Product 1"));
    }

    #[tokio::test]
    async fn test_update_unknown_product_is_not_found() {
        let (cart, _) = store();
        let outcome = cart.update_quantity(ProductId::new(9), 3).await.unwrap();
        assert_eq!(outcome, UpdateOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_remove_always_notifies() {
        let (cart, notifier) = store();

        cart.remove_from_cart(ProductId::new(1));
        assert!(notifier.contains("Removed Item"));

        cart.add_to_cart(request(2, 1, 5)).await.unwrap();
        cart.remove_from_cart(ProductId::new(2));
        assert!(notifier.contains("Removed Product 2"));
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_count_and_subtotal_derive_from_lines() {
        let (cart, _) = store();

        cart.add_to_cart(request(1, 2, 10)).await.unwrap();
        cart.add_to_cart(request(2, 3, 10)).await.unwrap();

        assert_eq!(cart.count(), 5);
        // Five units at $10.00 each, tax-exclusive.
        assert_eq!(cart.subtotal(), Decimal::new(5000, 2));
    }

    #[tokio::test]
    async fn test_clear_is_silent() {
        let (cart, notifier) = store();

        cart.add_to_cart(request(1, 2, 10)).await.unwrap();
        notifier.clear();
        cart.clear();

        assert!(cart.is_empty());
        assert!(notifier.messages().is_empty());
    }
}
