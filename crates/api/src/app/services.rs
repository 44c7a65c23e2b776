//! Orchestration over the domain crates.
//!
//! Each method loads aggregates from the store, drives the domain logic, and
//! persists the result. Notifications go out only after the store write has
//! succeeded; a failed delivery never unwinds anything.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use mercora_accounts::{
    Account, ApplicationId, ApprovalStatus, BusinessDetails, RegisterAccount, SubmitApplication,
    WholesaleApplication,
};
use mercora_cart::{Cart, CartLineId};
use mercora_core::{DomainError, DomainResult, Money};
use mercora_events::{Notification, Notifier};
use mercora_orders::{CreateOrder, Order, OrderId, OrderStatus, ShippingAddress};
use mercora_pricing::{PricingEngine, ShippingMethod};
use mercora_products::{CreateProduct, Product, ProductFilter, ProductId, UpdateProduct};
use mercora_storage::Store;

use crate::context::ActorContext;

/// A cart line joined with its live product, priced for the caller's tier.
#[derive(Debug, Clone)]
pub struct PricedCartLine {
    pub line_id: CartLineId,
    pub product_id: ProductId,
    pub sku: String,
    pub name: String,
    pub moq: i64,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_total: Money,
}

/// A cart priced against the live catalog.
#[derive(Debug, Clone)]
pub struct PricedCart {
    pub lines: Vec<PricedCartLine>,
    pub total_units: i64,
    pub total: Money,
}

/// Counters for the admin dashboard.
#[derive(Debug, Clone)]
pub struct DashboardStats {
    pub products: usize,
    pub accounts: usize,
    pub orders: usize,
    pub pending_applications: usize,
    /// Sum of order totals, cancelled orders excluded.
    pub revenue: Money,
}

/// Shared application state handed to every handler.
pub struct AppState {
    store: Arc<dyn Store>,
    pricing: PricingEngine,
    notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, pricing: PricingEngine, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            pricing,
            notifier,
        }
    }

    // ---- catalog ----

    pub async fn list_products(&self, filter: &ProductFilter) -> DomainResult<Vec<Product>> {
        self.store.list_products(filter).await
    }

    pub async fn get_product(&self, id: ProductId) -> DomainResult<Product> {
        self.store
            .get_product(id)
            .await?
            .ok_or_else(DomainError::not_found)
    }

    pub async fn create_product(&self, cmd: CreateProduct) -> DomainResult<Product> {
        let product = Product::create(cmd)?;
        self.store.insert_product(&product).await?;
        Ok(product)
    }

    pub async fn update_product(&self, id: ProductId, cmd: UpdateProduct) -> DomainResult<Product> {
        let mut product = self.get_product(id).await?;
        product.apply_update(cmd)?;
        self.store.update_product(&product).await?;
        Ok(product)
    }

    /// Remove a product from the catalog.
    ///
    /// Cart lines referencing it are cleared first; order lines are
    /// snapshots and keep the product's sku and name regardless.
    pub async fn delete_product(&self, id: ProductId) -> DomainResult<()> {
        if self.store.get_product(id).await?.is_none() {
            return Err(DomainError::not_found());
        }
        self.store.delete_product_lines(id).await?;
        self.store.delete_product(id).await
    }

    // ---- accounts ----

    /// Load the caller's account, provisioning it on first touch.
    ///
    /// Accounts are keyed by the token subject; there is no separate signup
    /// step and every provisioned account starts retail.
    pub async fn ensure_account(
        &self,
        actor: &ActorContext,
        now: DateTime<Utc>,
    ) -> DomainResult<Account> {
        if let Some(account) = self.store.get_account(actor.account_id()).await? {
            return Ok(account);
        }

        let account = Account::register(RegisterAccount {
            account_id: actor.account_id(),
            email: actor.email().to_string(),
            display_name: display_name_from_email(actor.email()),
            occurred_at: now,
        })?;

        match self.store.insert_account(&account).await {
            Ok(()) => Ok(account),
            // Two first requests can race; the loser reads the winner's row.
            Err(DomainError::Conflict(_)) => self
                .store
                .get_account(actor.account_id())
                .await?
                .ok_or_else(|| {
                    DomainError::consistency("account insert conflicted but the row is missing")
                }),
            Err(error) => Err(error),
        }
    }

    // ---- cart ----

    pub async fn view_cart(
        &self,
        actor: &ActorContext,
        now: DateTime<Utc>,
    ) -> DomainResult<PricedCart> {
        let account = self.ensure_account(actor, now).await?;
        let cart = self.store.load_cart(account.id()).await?;
        self.price_cart(&cart, &account).await
    }

    /// Add units of a product, merging into an existing line. The minimum
    /// order quantity is checked against the merged line, so topping up an
    /// already-valid line is always allowed.
    pub async fn add_cart_item(
        &self,
        actor: &ActorContext,
        product_id: ProductId,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> DomainResult<PricedCart> {
        let account = self.ensure_account(actor, now).await?;
        let product = self
            .store
            .get_product(product_id)
            .await?
            .ok_or_else(DomainError::not_found)?;

        let mut cart = self.store.load_cart(account.id()).await?;
        let line_id = cart.add_line(product_id, quantity, now)?;
        let line = cart
            .line(line_id)
            .ok_or_else(|| DomainError::consistency("cart line missing right after add"))?;
        product.ensure_min_quantity(line.quantity)?;

        self.store.save_line(line).await?;
        self.price_cart(&cart, &account).await
    }

    /// Set a line's quantity; zero or less removes the line.
    pub async fn update_cart_item(
        &self,
        actor: &ActorContext,
        line_id: CartLineId,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> DomainResult<PricedCart> {
        let account = self.ensure_account(actor, now).await?;
        let mut cart = self.store.load_cart(account.id()).await?;
        let product_id = cart
            .line(line_id)
            .ok_or_else(DomainError::not_found)?
            .product_id;

        if quantity > 0 {
            let product = self.store.get_product(product_id).await?.ok_or_else(|| {
                DomainError::consistency(format!("cart references missing product {product_id}"))
            })?;
            product.ensure_min_quantity(quantity)?;
        }

        cart.update_quantity(line_id, quantity)?;
        match cart.line(line_id) {
            Some(line) => self.store.save_line(line).await?,
            None => self.store.delete_line(account.id(), line_id).await?,
        }
        self.price_cart(&cart, &account).await
    }

    pub async fn remove_cart_item(
        &self,
        actor: &ActorContext,
        line_id: CartLineId,
        now: DateTime<Utc>,
    ) -> DomainResult<PricedCart> {
        let account = self.ensure_account(actor, now).await?;
        let mut cart = self.store.load_cart(account.id()).await?;
        cart.remove_line(line_id)?;
        self.store.delete_line(account.id(), line_id).await?;
        self.price_cart(&cart, &account).await
    }

    async fn price_cart(&self, cart: &Cart, account: &Account) -> DomainResult<PricedCart> {
        let ids: Vec<ProductId> = cart.lines().iter().map(|line| line.product_id).collect();
        let products = self.store.get_products(&ids).await?;
        let by_id: HashMap<ProductId, Product> = products
            .into_iter()
            .map(|product| (product.id(), product))
            .collect();

        let mut lines = Vec::with_capacity(cart.lines().len());
        let mut total = Money::ZERO;
        for line in cart.lines() {
            let product = by_id.get(&line.product_id).ok_or_else(|| {
                DomainError::consistency(format!(
                    "cart references missing product {}",
                    line.product_id
                ))
            })?;
            let unit_price = self.pricing.unit_price(product, Some(account));
            let line_total = unit_price.times(line.quantity);
            total += line_total;
            lines.push(PricedCartLine {
                line_id: line.id,
                product_id: line.product_id,
                sku: product.sku().to_string(),
                name: product.name().to_string(),
                moq: product.moq(),
                quantity: line.quantity,
                unit_price,
                line_total: line_total.rounded(),
            });
        }

        Ok(PricedCart {
            lines,
            total_units: cart.total_units(),
            total: total.rounded(),
        })
    }

    // ---- checkout and orders ----

    /// Turn the caller's cart into an order.
    ///
    /// Quantities are re-checked against each product's minimum at checkout
    /// time, the quote captures tier prices as of this instant, and the
    /// store commits the order, the lifetime unit counter, and the cart
    /// clear in one transaction.
    pub async fn checkout(
        &self,
        actor: &ActorContext,
        shipping_method: ShippingMethod,
        shipping_address: ShippingAddress,
        now: DateTime<Utc>,
    ) -> DomainResult<Order> {
        let account = self.ensure_account(actor, now).await?;
        let cart = self.store.load_cart(account.id()).await?;
        if cart.is_empty() {
            return Err(DomainError::validation("cart is empty"));
        }

        let ids: Vec<ProductId> = cart.lines().iter().map(|line| line.product_id).collect();
        let products = self.store.get_products(&ids).await?;
        let by_id: HashMap<ProductId, Product> = products
            .into_iter()
            .map(|product| (product.id(), product))
            .collect();

        let mut items = Vec::with_capacity(cart.lines().len());
        for line in cart.lines() {
            let product = by_id.get(&line.product_id).ok_or_else(|| {
                DomainError::consistency(format!(
                    "cart references missing product {}",
                    line.product_id
                ))
            })?;
            product.ensure_min_quantity(line.quantity)?;
            items.push((product, line.quantity));
        }

        let quote = self.pricing.quote(items, Some(&account), shipping_method);
        let order = Order::create(CreateOrder {
            account_id: account.id(),
            quote,
            shipping_method,
            shipping_address,
            occurred_at: now,
        })?;

        self.store.place_order(&order).await?;
        self.notifier.notify(Notification::OrderPlaced {
            order_id: order.id().0,
            account_id: order.account_id(),
            total_amount: order.total_amount(),
            occurred_at: now,
        });
        Ok(order)
    }

    pub async fn list_my_orders(
        &self,
        actor: &ActorContext,
        now: DateTime<Utc>,
    ) -> DomainResult<Vec<Order>> {
        let account = self.ensure_account(actor, now).await?;
        self.store.list_orders_for_account(account.id()).await
    }

    /// Fetch one order. Cross-account probes read as missing rather than
    /// forbidden, so order ids cannot be confirmed by outsiders.
    pub async fn get_order_for(&self, actor: &ActorContext, id: OrderId) -> DomainResult<Order> {
        let order = self
            .store
            .get_order(id)
            .await?
            .ok_or_else(DomainError::not_found)?;
        if order.account_id() != actor.account_id() && !actor.is_admin() {
            return Err(DomainError::not_found());
        }
        Ok(order)
    }

    // ---- wholesale ----

    pub async fn submit_application(
        &self,
        actor: &ActorContext,
        details: BusinessDetails,
        now: DateTime<Utc>,
    ) -> DomainResult<WholesaleApplication> {
        let account = self.ensure_account(actor, now).await?;
        let application = WholesaleApplication::submit(SubmitApplication {
            account_id: account.id(),
            details,
            occurred_at: now,
        })?;
        self.store.insert_application(&application).await?;
        Ok(application)
    }

    pub async fn application_status(
        &self,
        actor: &ActorContext,
        now: DateTime<Utc>,
    ) -> DomainResult<WholesaleApplication> {
        let account = self.ensure_account(actor, now).await?;
        self.store
            .find_application_by_account(account.id())
            .await?
            .ok_or_else(DomainError::not_found)
    }

    // ---- admin ----

    /// Approve an application and upgrade its account in one transaction.
    ///
    /// Re-approving an approved application is a no-op that returns the
    /// current state; approving a rejected one is a conflict.
    pub async fn approve_application(
        &self,
        id: ApplicationId,
        now: DateTime<Utc>,
    ) -> DomainResult<WholesaleApplication> {
        let mut application = self
            .store
            .get_application(id)
            .await?
            .ok_or_else(DomainError::not_found)?;
        if !application.approve(now)? {
            return Ok(application);
        }

        let mut account = self
            .store
            .get_account(application.account_id())
            .await?
            .ok_or_else(|| {
                DomainError::consistency(format!(
                    "application {} references missing account",
                    application.id()
                ))
            })?;
        account.grant_wholesale();

        self.store
            .approve_application(&application, &account)
            .await?;
        self.notifier.notify(Notification::ApplicationApproved {
            application_id: application.id().0,
            account_id: application.account_id(),
            occurred_at: now,
        });
        Ok(application)
    }

    pub async fn reject_application(
        &self,
        id: ApplicationId,
        now: DateTime<Utc>,
    ) -> DomainResult<WholesaleApplication> {
        let mut application = self
            .store
            .get_application(id)
            .await?
            .ok_or_else(DomainError::not_found)?;
        if !application.reject(now)? {
            return Ok(application);
        }

        self.store.update_application(&application).await?;
        self.notifier.notify(Notification::ApplicationRejected {
            application_id: application.id().0,
            account_id: application.account_id(),
            occurred_at: now,
        });
        Ok(application)
    }

    pub async fn list_applications(
        &self,
        status: Option<ApprovalStatus>,
    ) -> DomainResult<Vec<WholesaleApplication>> {
        self.store.list_applications(status).await
    }

    pub async fn list_orders(&self, status: Option<OrderStatus>) -> DomainResult<Vec<Order>> {
        self.store.list_orders(status).await
    }

    /// Move an order along the fulfilment path. Same-status updates are
    /// no-ops; only real transitions hit the store and notify.
    pub async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
        now: DateTime<Utc>,
    ) -> DomainResult<Order> {
        let mut order = self
            .store
            .get_order(id)
            .await?
            .ok_or_else(DomainError::not_found)?;

        if let Some(change) = order.set_status(status, now)? {
            self.store.update_order_status(&order).await?;
            self.notifier.notify(Notification::OrderStatusChanged {
                order_id: order.id().0,
                account_id: order.account_id(),
                from: change.from.as_str().to_string(),
                to: change.to.as_str().to_string(),
                occurred_at: now,
            });
        }
        Ok(order)
    }

    pub async fn list_accounts(&self) -> DomainResult<Vec<Account>> {
        self.store.list_accounts().await
    }

    pub async fn dashboard_stats(&self) -> DomainResult<DashboardStats> {
        let products = self.store.list_products(&ProductFilter::default()).await?;
        let accounts = self.store.list_accounts().await?;
        let orders = self.store.list_orders(None).await?;
        let pending = self
            .store
            .list_applications(Some(ApprovalStatus::Pending))
            .await?;

        let revenue = orders
            .iter()
            .filter(|order| order.status() != OrderStatus::Cancelled)
            .map(Order::total_amount)
            .sum::<Money>()
            .rounded();

        Ok(DashboardStats {
            products: products.len(),
            accounts: accounts.len(),
            orders: orders.len(),
            pending_applications: pending.len(),
            revenue,
        })
    }
}

fn display_name_from_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, _)) if !local.is_empty() => local.to_string(),
        _ => email.to_string(),
    }
}
