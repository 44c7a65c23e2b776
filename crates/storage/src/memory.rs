//! In-memory store for tests and local development.
//!
//! One `Mutex` guards the whole state, so the two multi-entity writes
//! (wholesale approval, order placement) are atomic for free. Throughput is
//! irrelevant here; fidelity to the Postgres backend's semantics is what
//! matters, down to the uniqueness conflicts and ordering of list results.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use mercora_accounts::{Account, ApplicationId, ApprovalStatus, WholesaleApplication};
use mercora_cart::{Cart, CartLine, CartLineId};
use mercora_core::{AccountId, DomainError, DomainResult};
use mercora_orders::{Order, OrderId, OrderStatus};
use mercora_products::{Product, ProductFilter, ProductId};

use crate::traits::{AccountStore, ApplicationStore, CartStore, OrderStore, ProductStore};

#[derive(Default)]
struct MemoryState {
    products: HashMap<ProductId, Product>,
    accounts: HashMap<AccountId, Account>,
    applications: HashMap<ApplicationId, WholesaleApplication>,
    cart_lines: HashMap<AccountId, Vec<CartLine>>,
    orders: HashMap<OrderId, Order>,
}

/// Non-durable store backed by hash maps.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> DomainResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| DomainError::consistency("memory store lock poisoned"))
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn insert_product(&self, product: &Product) -> DomainResult<()> {
        let mut state = self.lock()?;
        if state.products.contains_key(&product.id()) {
            return Err(DomainError::conflict(format!(
                "product {} already exists",
                product.id()
            )));
        }
        if state.products.values().any(|p| p.sku() == product.sku()) {
            return Err(DomainError::conflict(format!(
                "product sku '{}' already exists",
                product.sku()
            )));
        }
        state.products.insert(product.id(), product.clone());
        Ok(())
    }

    async fn update_product(&self, product: &Product) -> DomainResult<()> {
        let mut state = self.lock()?;
        if !state.products.contains_key(&product.id()) {
            return Err(DomainError::not_found());
        }
        let sku_taken = state
            .products
            .values()
            .any(|p| p.id() != product.id() && p.sku() == product.sku());
        if sku_taken {
            return Err(DomainError::conflict(format!(
                "product sku '{}' already exists",
                product.sku()
            )));
        }
        state.products.insert(product.id(), product.clone());
        Ok(())
    }

    async fn delete_product(&self, id: ProductId) -> DomainResult<()> {
        let mut state = self.lock()?;
        state
            .products
            .remove(&id)
            .map(|_| ())
            .ok_or_else(DomainError::not_found)
    }

    async fn get_product(&self, id: ProductId) -> DomainResult<Option<Product>> {
        let state = self.lock()?;
        Ok(state.products.get(&id).cloned())
    }

    async fn get_products(&self, ids: &[ProductId]) -> DomainResult<Vec<Product>> {
        let state = self.lock()?;
        Ok(ids
            .iter()
            .filter_map(|id| state.products.get(id).cloned())
            .collect())
    }

    async fn list_products(&self, filter: &ProductFilter) -> DomainResult<Vec<Product>> {
        let state = self.lock()?;
        let mut products: Vec<Product> = state
            .products
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        products.sort_by_key(|p| (p.created_at(), *p.id().0.as_uuid()));
        Ok(products)
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn insert_account(&self, account: &Account) -> DomainResult<()> {
        let mut state = self.lock()?;
        if state.accounts.contains_key(&account.id()) {
            return Err(DomainError::conflict(format!(
                "account {} already exists",
                account.id()
            )));
        }
        if state.accounts.values().any(|a| a.email() == account.email()) {
            return Err(DomainError::conflict(format!(
                "account email '{}' already exists",
                account.email()
            )));
        }
        state.accounts.insert(account.id(), account.clone());
        Ok(())
    }

    async fn update_account(&self, account: &Account) -> DomainResult<()> {
        let mut state = self.lock()?;
        let stored = state
            .accounts
            .get_mut(&account.id())
            .ok_or_else(DomainError::not_found)?;
        let mut next = account.state();
        next.total_units_ordered = stored.total_units_ordered();
        *stored = Account::from_state(next);
        Ok(())
    }

    async fn get_account(&self, id: AccountId) -> DomainResult<Option<Account>> {
        let state = self.lock()?;
        Ok(state.accounts.get(&id).cloned())
    }

    async fn find_account_by_email(&self, email: &str) -> DomainResult<Option<Account>> {
        let state = self.lock()?;
        Ok(state
            .accounts
            .values()
            .find(|a| a.email() == email)
            .cloned())
    }

    async fn list_accounts(&self) -> DomainResult<Vec<Account>> {
        let state = self.lock()?;
        let mut accounts: Vec<Account> = state.accounts.values().cloned().collect();
        accounts.sort_by_key(|a| (a.created_at(), *a.id().as_uuid()));
        Ok(accounts)
    }
}

#[async_trait]
impl ApplicationStore for MemoryStore {
    async fn insert_application(&self, application: &WholesaleApplication) -> DomainResult<()> {
        let mut state = self.lock()?;
        let already_applied = state
            .applications
            .values()
            .any(|a| a.account_id() == application.account_id());
        if already_applied {
            return Err(DomainError::conflict(
                "account already has a wholesale application",
            ));
        }
        state
            .applications
            .insert(application.id(), application.clone());
        Ok(())
    }

    async fn update_application(&self, application: &WholesaleApplication) -> DomainResult<()> {
        let mut state = self.lock()?;
        if !state.applications.contains_key(&application.id()) {
            return Err(DomainError::not_found());
        }
        state
            .applications
            .insert(application.id(), application.clone());
        Ok(())
    }

    async fn get_application(
        &self,
        id: ApplicationId,
    ) -> DomainResult<Option<WholesaleApplication>> {
        let state = self.lock()?;
        Ok(state.applications.get(&id).cloned())
    }

    async fn find_application_by_account(
        &self,
        account_id: AccountId,
    ) -> DomainResult<Option<WholesaleApplication>> {
        let state = self.lock()?;
        Ok(state
            .applications
            .values()
            .find(|a| a.account_id() == account_id)
            .cloned())
    }

    async fn list_applications(
        &self,
        status: Option<ApprovalStatus>,
    ) -> DomainResult<Vec<WholesaleApplication>> {
        let state = self.lock()?;
        let mut applications: Vec<WholesaleApplication> = state
            .applications
            .values()
            .filter(|a| status.is_none_or(|s| a.status() == s))
            .cloned()
            .collect();
        applications.sort_by_key(|a| (a.submitted_at(), *a.id().0.as_uuid()));
        Ok(applications)
    }

    async fn approve_application(
        &self,
        application: &WholesaleApplication,
        account: &Account,
    ) -> DomainResult<()> {
        let mut state = self.lock()?;
        if !state.applications.contains_key(&application.id()) {
            return Err(DomainError::not_found());
        }
        // Only the decision fields touch the account row; a checkout racing
        // this approval keeps its counter increment.
        {
            let stored = state.accounts.get_mut(&account.id()).ok_or_else(|| {
                DomainError::consistency(format!(
                    "account {} missing during approval",
                    account.id()
                ))
            })?;
            let mut next = stored.state();
            next.classification = account.classification();
            next.approved = account.approved();
            *stored = Account::from_state(next);
        }
        state
            .applications
            .insert(application.id(), application.clone());
        Ok(())
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn load_cart(&self, account_id: AccountId) -> DomainResult<Cart> {
        let state = self.lock()?;
        let mut lines = state.cart_lines.get(&account_id).cloned().unwrap_or_default();
        lines.sort_by_key(|l| (l.added_at, *l.id.0.as_uuid()));
        Ok(Cart::from_lines(account_id, lines))
    }

    async fn save_line(&self, line: &CartLine) -> DomainResult<()> {
        let mut state = self.lock()?;
        let lines = state.cart_lines.entry(line.account_id).or_default();
        let duplicate_product = lines
            .iter()
            .any(|l| l.id != line.id && l.product_id == line.product_id);
        if duplicate_product {
            return Err(DomainError::conflict(
                "cart already has a line for this product",
            ));
        }
        match lines.iter_mut().find(|l| l.id == line.id) {
            Some(existing) => *existing = line.clone(),
            None => lines.push(line.clone()),
        }
        Ok(())
    }

    async fn delete_line(&self, account_id: AccountId, line_id: CartLineId) -> DomainResult<()> {
        let mut state = self.lock()?;
        let lines = state
            .cart_lines
            .get_mut(&account_id)
            .ok_or_else(DomainError::not_found)?;
        let before = lines.len();
        lines.retain(|l| l.id != line_id);
        if lines.len() == before {
            return Err(DomainError::not_found());
        }
        Ok(())
    }

    async fn clear_cart(&self, account_id: AccountId) -> DomainResult<()> {
        let mut state = self.lock()?;
        state.cart_lines.remove(&account_id);
        Ok(())
    }

    async fn delete_product_lines(&self, product_id: ProductId) -> DomainResult<()> {
        let mut state = self.lock()?;
        for lines in state.cart_lines.values_mut() {
            lines.retain(|l| l.product_id != product_id);
        }
        state.cart_lines.retain(|_, lines| !lines.is_empty());
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn place_order(&self, order: &Order) -> DomainResult<()> {
        let mut state = self.lock()?;
        if state.orders.contains_key(&order.id()) {
            return Err(DomainError::conflict(format!(
                "order {} already exists",
                order.id()
            )));
        }
        // Mutate a copy of the account first so a failed increment leaves
        // nothing half-written.
        let mut account = state
            .accounts
            .get(&order.account_id())
            .cloned()
            .ok_or_else(|| {
                DomainError::consistency(format!(
                    "account {} missing during order placement",
                    order.account_id()
                ))
            })?;
        account.record_units(order.total_units())?;

        state.orders.insert(order.id(), order.clone());
        state.accounts.insert(account.id(), account);
        state.cart_lines.remove(&order.account_id());
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> DomainResult<Option<Order>> {
        let state = self.lock()?;
        Ok(state.orders.get(&id).cloned())
    }

    async fn list_orders_for_account(&self, account_id: AccountId) -> DomainResult<Vec<Order>> {
        let state = self.lock()?;
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| o.account_id() == account_id)
            .cloned()
            .collect();
        orders.sort_by_key(|o| (o.placed_at(), *o.id().0.as_uuid()));
        orders.reverse();
        Ok(orders)
    }

    async fn list_orders(&self, status: Option<OrderStatus>) -> DomainResult<Vec<Order>> {
        let state = self.lock()?;
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| status.is_none_or(|s| o.status() == s))
            .cloned()
            .collect();
        orders.sort_by_key(|o| (o.placed_at(), *o.id().0.as_uuid()));
        orders.reverse();
        Ok(orders)
    }

    async fn update_order_status(&self, order: &Order) -> DomainResult<()> {
        let mut state = self.lock()?;
        if !state.orders.contains_key(&order.id()) {
            return Err(DomainError::not_found());
        }
        state.orders.insert(order.id(), order.clone());
        Ok(())
    }
}
