//! Store traits the API layer programs against.
//!
//! One trait per aggregate family, plus [`Store`] to bundle them behind a
//! single trait object. Aggregates cross the boundary whole: writes take the
//! aggregate and persist its current state, reads hydrate aggregates via
//! their `from_state` constructors. Uniqueness rules (sku, email, one
//! application per account, one cart line per product) are enforced here,
//! not in the domain crates.

use async_trait::async_trait;

use mercora_accounts::{Account, ApplicationId, ApprovalStatus, WholesaleApplication};
use mercora_cart::{Cart, CartLine, CartLineId};
use mercora_core::{AccountId, DomainResult};
use mercora_orders::{Order, OrderId, OrderStatus};
use mercora_products::{Product, ProductFilter, ProductId};

/// Catalog persistence.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Insert a new product. Fails with `Conflict` if the sku is taken.
    async fn insert_product(&self, product: &Product) -> DomainResult<()>;

    /// Persist the current state of an existing product.
    ///
    /// Fails with `NotFound` if the product no longer exists and `Conflict`
    /// if the update would collide with another product's sku.
    async fn update_product(&self, product: &Product) -> DomainResult<()>;

    /// Delete a product. Cart lines referencing it must be removed first
    /// (see [`CartStore::delete_product_lines`]); order lines are snapshots
    /// and keep their copy.
    async fn delete_product(&self, id: ProductId) -> DomainResult<()>;

    async fn get_product(&self, id: ProductId) -> DomainResult<Option<Product>>;

    /// Fetch a batch of products by id. Missing ids are absent from the
    /// result, not an error, and no ordering is guaranteed; callers index
    /// the result by id.
    async fn get_products(&self, ids: &[ProductId]) -> DomainResult<Vec<Product>>;

    /// List catalog products matching the filter, oldest first.
    async fn list_products(&self, filter: &ProductFilter) -> DomainResult<Vec<Product>>;
}

/// Buyer account persistence.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert a new account. Fails with `Conflict` if the email is taken.
    async fn insert_account(&self, account: &Account) -> DomainResult<()>;

    /// Persist identity and classification changes.
    ///
    /// The lifetime unit counter is written only by
    /// [`OrderStore::place_order`]; a stale aggregate passed here cannot
    /// roll it back.
    async fn update_account(&self, account: &Account) -> DomainResult<()>;

    async fn get_account(&self, id: AccountId) -> DomainResult<Option<Account>>;

    async fn find_account_by_email(&self, email: &str) -> DomainResult<Option<Account>>;

    /// List all accounts, oldest first.
    async fn list_accounts(&self) -> DomainResult<Vec<Account>>;
}

/// Wholesale application persistence.
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    /// Insert a new application. Fails with `Conflict` if the account has
    /// ever submitted one, whatever its status.
    async fn insert_application(&self, application: &WholesaleApplication) -> DomainResult<()>;

    /// Persist the current state of an existing application.
    async fn update_application(&self, application: &WholesaleApplication) -> DomainResult<()>;

    async fn get_application(
        &self,
        id: ApplicationId,
    ) -> DomainResult<Option<WholesaleApplication>>;

    async fn find_application_by_account(
        &self,
        account_id: AccountId,
    ) -> DomainResult<Option<WholesaleApplication>>;

    /// List applications, oldest first, optionally filtered by status.
    async fn list_applications(
        &self,
        status: Option<ApprovalStatus>,
    ) -> DomainResult<Vec<WholesaleApplication>>;

    /// Persist an approval decision and the upgraded account in one
    /// transaction. Either both rows change or neither does.
    async fn approve_application(
        &self,
        application: &WholesaleApplication,
        account: &Account,
    ) -> DomainResult<()>;
}

/// Cart persistence. The cart aggregate is rebuilt from its lines on every
/// read; writes go line by line so concurrent carts never clobber each other.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Load the buyer's cart. A buyer with no lines gets an empty cart.
    async fn load_cart(&self, account_id: AccountId) -> DomainResult<Cart>;

    /// Insert or update a single cart line (keyed by line id).
    async fn save_line(&self, line: &CartLine) -> DomainResult<()>;

    /// Remove a single cart line.
    async fn delete_line(&self, account_id: AccountId, line_id: CartLineId) -> DomainResult<()>;

    /// Remove every line in the buyer's cart.
    async fn clear_cart(&self, account_id: AccountId) -> DomainResult<()>;

    /// Remove the product's lines from every cart. Called before a product
    /// is deleted from the catalog.
    async fn delete_product_lines(&self, product_id: ProductId) -> DomainResult<()>;
}

/// Order persistence.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Place an order: insert it, add its units to the buyer's lifetime
    /// counter, and clear the buyer's cart, all in one transaction. A failure
    /// anywhere leaves the cart and the counter untouched.
    async fn place_order(&self, order: &Order) -> DomainResult<()>;

    async fn get_order(&self, id: OrderId) -> DomainResult<Option<Order>>;

    /// List one buyer's orders, newest first.
    async fn list_orders_for_account(&self, account_id: AccountId) -> DomainResult<Vec<Order>>;

    /// List all orders, newest first, optionally filtered by status.
    async fn list_orders(&self, status: Option<OrderStatus>) -> DomainResult<Vec<Order>>;

    /// Persist a status change already applied to the aggregate.
    async fn update_order_status(&self, order: &Order) -> DomainResult<()>;
}

/// The full persistence surface, as one trait object.
pub trait Store: ProductStore + AccountStore + ApplicationStore + CartStore + OrderStore {}

impl<S> Store for S where
    S: ProductStore + AccountStore + ApplicationStore + CartStore + OrderStore
{
}
