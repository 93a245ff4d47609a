//! # Checkout Engine
//!
//! Turns a requested cart into a persisted sale, or into a typed error
//! with nothing written.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          run_checkout                                   │
//! │                                                                         │
//! │  items ──► normalize_items ──► validate + merge duplicate product ids  │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │  ┌──────────── store scope (one write transaction) ───────────────┐    │
//! │  │  1. Resolution   products_by_ids(ids)   → ProductNotFound       │    │
//! │  │  2. Validation   qty <= stock           → InsufficientStock     │    │
//! │  │  3. Pricing      subtotal = price × qty → AmountOverflow        │    │
//! │  │  4. Commit       decrement_stock(..)    → InsufficientStock     │    │
//! │  │                  create_transaction(..)                         │    │
//! │  │                  commit()                                       │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │  5. Transaction { id, created_at, total_amount, items }                │
//! │                                                                         │
//! │  Any early return drops the store without commit → rollback.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Phases 1-3 are pure (`plan_checkout`) and run against the snapshot the
//! store returned. The conditional decrement in phase 4 re-checks stock at
//! write time, so a store that cannot hold a lock across the read still
//! never oversells.

use std::collections::HashMap;
use std::future::Future;

use crate::error::{CheckoutError, CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{CheckoutItem, Product, Transaction};
use crate::validation::{validate_cart_size, validate_id, validate_quantity};

// =============================================================================
// Store Trait
// =============================================================================

/// A transactional scope over the catalog and the ledger.
///
/// One value of this type is one unit of work. Writes become visible only
/// when [`CheckoutStore::commit`] succeeds; dropping the value without
/// committing must discard them.
pub trait CheckoutStore: Send + Sized {
    /// Infrastructure failure inside the store.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Current state of the given products. Missing ids are absent from
    /// the map.
    fn products_by_ids(
        &mut self,
        ids: &[i64],
    ) -> impl Future<Output = Result<HashMap<i64, Product>, Self::Error>> + Send;

    /// Takes `quantity` units from stock if at least that many remain.
    /// Returns false when the stock was insufficient and nothing changed.
    fn decrement_stock(
        &mut self,
        product_id: i64,
        quantity: i64,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// Persists the transaction header and its lines, assigning ids and the
    /// creation timestamp.
    fn create_transaction(
        &mut self,
        total: Money,
        lines: &[PlannedLine],
    ) -> impl Future<Output = Result<Transaction, Self::Error>> + Send;

    /// Makes every write of this scope durable.
    fn commit(self) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

// =============================================================================
// Request Normalization
// =============================================================================

/// A validated cart line with duplicates merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestedLine {
    pub product_id: i64,
    pub quantity: i64,
}

/// Validates the cart and merges repeated product ids.
///
/// Lines keep the order in which each product id first appears. At most
/// [`MAX_CART_ITEMS`](crate::MAX_CART_ITEMS) distinct products are accepted.
///
/// ## Example
/// ```rust
/// use kasir_core::checkout::normalize_items;
/// use kasir_core::CheckoutItem;
///
/// let lines = normalize_items(&[
///     CheckoutItem { product_id: 2, quantity: 1 },
///     CheckoutItem { product_id: 1, quantity: 2 },
///     CheckoutItem { product_id: 2, quantity: 3 },
/// ])
/// .unwrap();
///
/// assert_eq!(lines.len(), 2);
/// assert_eq!((lines[0].product_id, lines[0].quantity), (2, 4));
/// assert_eq!((lines[1].product_id, lines[1].quantity), (1, 2));
/// ```
pub fn normalize_items(items: &[CheckoutItem]) -> CoreResult<Vec<RequestedLine>> {
    if items.is_empty() {
        return Err(ValidationError::Empty {
            field: "items".to_string(),
        }
        .into());
    }

    let mut lines: Vec<RequestedLine> = Vec::with_capacity(items.len());
    let mut index: HashMap<i64, usize> = HashMap::with_capacity(items.len());

    for item in items {
        validate_id("product_id", item.product_id)?;
        validate_quantity(item.quantity)?;

        match index.get(&item.product_id) {
            Some(&pos) => {
                let line = &mut lines[pos];
                line.quantity = line.quantity.checked_add(item.quantity).ok_or_else(|| {
                    ValidationError::OutOfRange {
                        field: "quantity".to_string(),
                        min: 1,
                        max: i64::MAX,
                    }
                })?;
            }
            None => {
                validate_cart_size(lines.len() + 1)?;
                index.insert(item.product_id, lines.len());
                lines.push(RequestedLine {
                    product_id: item.product_id,
                    quantity: item.quantity,
                });
            }
        }
    }

    Ok(lines)
}

// =============================================================================
// Planning
// =============================================================================

/// A priced line ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedLine {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub subtotal: Money,
}

/// The full outcome of phases 1-3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutPlan {
    pub lines: Vec<PlannedLine>,
    pub total: Money,
}

/// Resolves, validates and prices the cart against one snapshot.
///
/// Every id is resolved before any stock is compared, so an unknown
/// product is reported even when an earlier line is short on stock.
pub fn plan_checkout(
    lines: &[RequestedLine],
    snapshot: &HashMap<i64, Product>,
) -> CoreResult<CheckoutPlan> {
    // 1. Resolution
    let mut resolved = Vec::with_capacity(lines.len());
    for line in lines {
        let product = snapshot
            .get(&line.product_id)
            .ok_or(CoreError::ProductNotFound(line.product_id))?;
        resolved.push((line, product));
    }

    // 2. Validation
    for (line, product) in &resolved {
        if !product.can_sell(line.quantity) {
            return Err(CoreError::InsufficientStock {
                product_id: line.product_id,
                requested: line.quantity,
                available: product.stock,
            });
        }
    }

    // 3. Pricing
    let mut total = Money::zero();
    let mut planned = Vec::with_capacity(resolved.len());
    for (line, product) in resolved {
        let overflow = CoreError::AmountOverflow {
            product_id: line.product_id,
        };
        let subtotal = product
            .price
            .checked_mul_quantity(line.quantity)
            .ok_or_else(|| overflow.clone())?;
        total = total.checked_add(subtotal).ok_or(overflow)?;

        planned.push(PlannedLine {
            product_id: line.product_id,
            product_name: product.name.clone(),
            quantity: line.quantity,
            unit_price: product.price,
            subtotal,
        });
    }

    Ok(CheckoutPlan {
        lines: planned,
        total,
    })
}

// =============================================================================
// Engine
// =============================================================================

/// Runs one checkout inside `store`'s scope.
///
/// The store is consumed. On any error it is dropped uncommitted.
pub async fn run_checkout<S: CheckoutStore>(
    mut store: S,
    items: &[CheckoutItem],
) -> Result<Transaction, CheckoutError<S::Error>> {
    let lines = normalize_items(items)?;
    let ids: Vec<i64> = lines.iter().map(|line| line.product_id).collect();

    let snapshot = store
        .products_by_ids(&ids)
        .await
        .map_err(CheckoutError::Store)?;

    let plan = plan_checkout(&lines, &snapshot)?;

    // 4. Commit
    for line in &plan.lines {
        let applied = store
            .decrement_stock(line.product_id, line.quantity)
            .await
            .map_err(CheckoutError::Store)?;

        if !applied {
            let available = snapshot
                .get(&line.product_id)
                .map(|product| product.stock)
                .unwrap_or_default();
            return Err(CoreError::InsufficientStock {
                product_id: line.product_id,
                requested: line.quantity,
                available,
            }
            .into());
        }
    }

    let transaction = store
        .create_transaction(plan.total, &plan.lines)
        .await
        .map_err(CheckoutError::Store)?;

    store.commit().await.map_err(CheckoutError::Store)?;

    Ok(transaction)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransactionLineItem;
    use chrono::Utc;
    use std::sync::Arc;
    use tokio::sync::{Mutex, OwnedMutexGuard};

    // -------------------------------------------------------------------------
    // In-memory store
    // -------------------------------------------------------------------------

    #[derive(Default)]
    struct MemoryState {
        products: HashMap<i64, Product>,
        transactions: Vec<Transaction>,
        next_transaction_id: i64,
        next_item_id: i64,
    }

    /// Shared catalog + ledger. `begin` takes the lock for the whole scope.
    #[derive(Clone, Default)]
    struct MemoryDb {
        state: Arc<Mutex<MemoryState>>,
    }

    impl MemoryDb {
        async fn with_products(products: &[(i64, &str, i64, i64)]) -> Self {
            let db = MemoryDb::default();
            {
                let mut state = db.state.lock().await;
                let now = Utc::now();
                for &(id, name, price, stock) in products {
                    state.products.insert(
                        id,
                        Product {
                            id,
                            name: name.to_string(),
                            price: Money::from_minor(price),
                            stock,
                            category_id: None,
                            category: None,
                            created_at: now,
                            updated_at: now,
                        },
                    );
                }
            }
            db
        }

        async fn begin(&self) -> MemoryStore {
            MemoryStore {
                guard: self.state.clone().lock_owned().await,
                staged_stock: HashMap::new(),
                staged_transactions: Vec::new(),
                fail_on_create: false,
            }
        }

        async fn stock(&self, id: i64) -> i64 {
            self.state.lock().await.products[&id].stock
        }

        async fn transaction_count(&self) -> usize {
            self.state.lock().await.transactions.len()
        }

        async fn checkout(
            &self,
            items: &[CheckoutItem],
        ) -> Result<Transaction, CheckoutError<std::io::Error>> {
            run_checkout(self.begin().await, items).await
        }
    }

    struct MemoryStore {
        guard: OwnedMutexGuard<MemoryState>,
        staged_stock: HashMap<i64, i64>,
        staged_transactions: Vec<Transaction>,
        fail_on_create: bool,
    }

    impl MemoryStore {
        fn current_stock(&self, id: i64) -> Option<i64> {
            self.staged_stock
                .get(&id)
                .copied()
                .or_else(|| self.guard.products.get(&id).map(|p| p.stock))
        }
    }

    impl CheckoutStore for MemoryStore {
        type Error = std::io::Error;

        async fn products_by_ids(
            &mut self,
            ids: &[i64],
        ) -> Result<HashMap<i64, Product>, Self::Error> {
            Ok(ids
                .iter()
                .filter_map(|id| self.guard.products.get(id).cloned())
                .map(|mut p| {
                    p.stock = self.current_stock(p.id).unwrap_or(p.stock);
                    (p.id, p)
                })
                .collect())
        }

        async fn decrement_stock(
            &mut self,
            product_id: i64,
            quantity: i64,
        ) -> Result<bool, Self::Error> {
            match self.current_stock(product_id) {
                Some(stock) if stock >= quantity => {
                    self.staged_stock.insert(product_id, stock - quantity);
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        async fn create_transaction(
            &mut self,
            total: Money,
            lines: &[PlannedLine],
        ) -> Result<Transaction, Self::Error> {
            if self.fail_on_create {
                return Err(std::io::Error::other("ledger unavailable"));
            }
            let id = self.guard.next_transaction_id + 1 + self.staged_transactions.len() as i64;
            let first_item_id = self.guard.next_item_id + 1;
            let items = lines
                .iter()
                .enumerate()
                .map(|(i, line)| TransactionLineItem {
                    id: first_item_id + i as i64,
                    transaction_id: id,
                    product_id: line.product_id,
                    product_name: line.product_name.clone(),
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    subtotal: line.subtotal,
                })
                .collect();
            let tx = Transaction {
                id,
                total_amount: total,
                created_at: Utc::now(),
                items,
            };
            self.staged_transactions.push(tx.clone());
            Ok(tx)
        }

        async fn commit(mut self) -> Result<(), Self::Error> {
            for (id, stock) in self.staged_stock.drain() {
                if let Some(product) = self.guard.products.get_mut(&id) {
                    product.stock = stock;
                }
            }
            for tx in self.staged_transactions.drain(..) {
                self.guard.next_transaction_id = tx.id;
                self.guard.next_item_id += tx.items.len() as i64;
                self.guard.transactions.push(tx);
            }
            Ok(())
        }
    }

    fn item(product_id: i64, quantity: i64) -> CheckoutItem {
        CheckoutItem {
            product_id,
            quantity,
        }
    }

    // -------------------------------------------------------------------------
    // normalize_items
    // -------------------------------------------------------------------------

    #[test]
    fn test_normalize_rejects_empty_cart() {
        assert_eq!(
            normalize_items(&[]),
            Err(CoreError::Validation(ValidationError::Empty {
                field: "items".to_string()
            }))
        );
    }

    #[test]
    fn test_normalize_rejects_non_positive_quantity() {
        let err = normalize_items(&[item(1, 2), item(2, 0)]).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::MustBePositive { .. })
        ));
    }

    #[test]
    fn test_normalize_merges_duplicates_in_first_seen_order() {
        let lines = normalize_items(&[item(3, 1), item(1, 2), item(3, 5)]).unwrap();
        assert_eq!(
            lines,
            vec![
                RequestedLine {
                    product_id: 3,
                    quantity: 6
                },
                RequestedLine {
                    product_id: 1,
                    quantity: 2
                },
            ]
        );
    }

    #[test]
    fn test_normalize_rejects_quantity_overflow() {
        let err = normalize_items(&[item(1, i64::MAX), item(1, 1)]).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_normalize_bounds_distinct_products() {
        let at_limit: Vec<_> = (1..=crate::MAX_CART_ITEMS as i64).map(|id| item(id, 1)).collect();
        assert_eq!(normalize_items(&at_limit).unwrap().len(), crate::MAX_CART_ITEMS);

        let mut over = at_limit.clone();
        over.push(item(crate::MAX_CART_ITEMS as i64 + 1, 1));
        let err = normalize_items(&over).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { ref field, .. }) if field == "items"
        ));

        // repeats of a known id do not count against the bound
        let mut repeated = at_limit;
        repeated.push(item(1, 2));
        assert_eq!(normalize_items(&repeated).unwrap()[0].quantity, 3);
    }

    // -------------------------------------------------------------------------
    // plan_checkout
    // -------------------------------------------------------------------------

    fn snapshot(products: &[(i64, &str, i64, i64)]) -> HashMap<i64, Product> {
        let now = Utc::now();
        products
            .iter()
            .map(|&(id, name, price, stock)| {
                (
                    id,
                    Product {
                        id,
                        name: name.to_string(),
                        price: Money::from_minor(price),
                        stock,
                        category_id: None,
                        category: None,
                        created_at: now,
                        updated_at: now,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_plan_prices_lines() {
        let snap = snapshot(&[(1, "Indomie Goreng", 3000, 10), (2, "Teh Botol", 5000, 3)]);
        let lines = normalize_items(&[item(1, 4), item(2, 1)]).unwrap();
        let plan = plan_checkout(&lines, &snap).unwrap();

        assert_eq!(plan.total, Money::from_minor(17000));
        assert_eq!(plan.lines[0].subtotal, Money::from_minor(12000));
        assert_eq!(plan.lines[0].product_name, "Indomie Goreng");
        assert_eq!(plan.lines[1].subtotal, Money::from_minor(5000));
    }

    #[test]
    fn test_plan_reports_missing_before_stock() {
        let snap = snapshot(&[(1, "Indomie Goreng", 3000, 1)]);
        let lines = normalize_items(&[item(1, 5), item(99, 1)]).unwrap();
        assert_eq!(
            plan_checkout(&lines, &snap),
            Err(CoreError::ProductNotFound(99))
        );
    }

    #[test]
    fn test_plan_rejects_price_overflow() {
        let snap = snapshot(&[(1, "Gold Bar", i64::MAX, 10)]);
        let lines = normalize_items(&[item(1, 2)]).unwrap();
        assert_eq!(
            plan_checkout(&lines, &snap),
            Err(CoreError::AmountOverflow { product_id: 1 })
        );
    }

    // -------------------------------------------------------------------------
    // run_checkout
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_checkout_then_oversell() {
        let db = MemoryDb::with_products(&[(1, "Indomie Goreng", 3000, 10)]).await;

        let tx = db.checkout(&[item(1, 4)]).await.unwrap();
        assert_eq!(tx.total_amount, Money::from_minor(12000));
        assert_eq!(tx.items.len(), 1);
        assert_eq!(tx.items[0].unit_price, Money::from_minor(3000));
        assert!(tx.totals_are_consistent());
        assert_eq!(db.stock(1).await, 6);

        let err = db.checkout(&[item(1, 20)]).await.unwrap_err();
        assert!(err.is_client_error());
        assert_eq!(
            err.as_domain(),
            Some(&CoreError::InsufficientStock {
                product_id: 1,
                requested: 20,
                available: 6
            })
        );
        assert_eq!(db.stock(1).await, 6);
        assert_eq!(db.transaction_count().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_product_changes_nothing() {
        let db = MemoryDb::with_products(&[(1, "Indomie Goreng", 3000, 10)]).await;

        let err = db.checkout(&[item(1, 2), item(99, 1)]).await.unwrap_err();
        assert_eq!(err.as_domain(), Some(&CoreError::ProductNotFound(99)));
        assert_eq!(db.stock(1).await, 10);
        assert_eq!(db.transaction_count().await, 0);
    }

    #[tokio::test]
    async fn test_partial_shortage_rolls_back_every_line() {
        let db =
            MemoryDb::with_products(&[(1, "Indomie Goreng", 3000, 10), (2, "Teh Botol", 5000, 1)])
                .await;

        let err = db.checkout(&[item(1, 3), item(2, 2)]).await.unwrap_err();
        assert!(err.is_client_error());
        assert_eq!(db.stock(1).await, 10);
        assert_eq!(db.stock(2).await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_lines_checked_as_one() {
        let db = MemoryDb::with_products(&[(1, "Indomie Goreng", 3000, 5)]).await;

        // 3 + 3 exceeds 5 even though each line alone fits
        let err = db.checkout(&[item(1, 3), item(1, 3)]).await.unwrap_err();
        assert_eq!(
            err.as_domain(),
            Some(&CoreError::InsufficientStock {
                product_id: 1,
                requested: 6,
                available: 5
            })
        );

        let tx = db.checkout(&[item(1, 2), item(1, 3)]).await.unwrap();
        assert_eq!(tx.items.len(), 1);
        assert_eq!(tx.items[0].quantity, 5);
        assert_eq!(db.stock(1).await, 0);
    }

    #[tokio::test]
    async fn test_store_failure_rolls_back() {
        let db = MemoryDb::with_products(&[(1, "Indomie Goreng", 3000, 10)]).await;

        let mut store = db.begin().await;
        store.fail_on_create = true;
        let err = run_checkout(store, &[item(1, 4)]).await.unwrap_err();

        assert!(matches!(err, CheckoutError::Store(_)));
        assert!(!err.is_client_error());
        assert_eq!(db.stock(1).await, 10);
        assert_eq!(db.transaction_count().await, 0);
    }

    #[tokio::test]
    async fn test_identical_checkouts_are_not_deduplicated() {
        let db = MemoryDb::with_products(&[(1, "Indomie Goreng", 3000, 10)]).await;

        let first = db.checkout(&[item(1, 2)]).await.unwrap();
        let second = db.checkout(&[item(1, 2)]).await.unwrap();

        assert_ne!(first.id, second.id);
        assert!(second.id > first.id);
        assert_eq!(db.stock(1).await, 6);
        assert_eq!(db.transaction_count().await, 2);
    }

    #[tokio::test]
    async fn test_concurrent_checkouts_never_oversell() {
        let db = MemoryDb::with_products(&[(1, "Indomie Goreng", 3000, 5)]).await;

        let a = tokio::spawn({
            let db = db.clone();
            async move { db.checkout(&[item(1, 5)]).await }
        });
        let b = tokio::spawn({
            let db = db.clone();
            async move { db.checkout(&[item(1, 5)]).await }
        });

        let results = [a.await.unwrap(), b.await.unwrap()];
        let ok = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| {
                matches!(
                    r,
                    Err(e) if matches!(e.as_domain(), Some(CoreError::InsufficientStock { .. }))
                )
            })
            .count();

        assert_eq!(ok, 1);
        assert_eq!(conflicts, 1);
        assert_eq!(db.stock(1).await, 0);
    }
}
