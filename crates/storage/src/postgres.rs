//! Postgres-backed store.
//!
//! Aggregate state is flattened into columns, with JSONB for the parts that
//! are read and written whole (product images, order lines, shipping
//! addresses). Queries are runtime-checked over a shared [`PgPool`];
//! migrations are embedded at compile time with `sqlx::migrate!` and applied
//! at startup.
//!
//! The two multi-entity writes (wholesale approval, order placement) run in
//! explicit transactions. The order-placement counter bump is a relative
//! `UPDATE ... SET total_units_ordered = total_units_ordered + n`, so
//! concurrent checkouts serialize on the row lock instead of clobbering
//! each other.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use mercora_accounts::{
    Account, AccountState, ApplicationId, ApplicationState, ApprovalStatus, BusinessDetails,
    Classification, WholesaleApplication,
};
use mercora_cart::{Cart, CartLine, CartLineId};
use mercora_core::{AccountId, AggregateId, DomainError, DomainResult, Money};
use mercora_orders::{Order, OrderId, OrderLine, OrderState, OrderStatus, ShippingAddress};
use mercora_pricing::ShippingMethod;
use mercora_products::{Product, ProductFilter, ProductId, ProductImage, ProductState};

use crate::error::map_sqlx_error;
use crate::traits::{AccountStore, ApplicationStore, CartStore, OrderStore, ProductStore};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Store backed by a PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect with pool settings sized for a single service instance.
    pub async fn connect(database_url: &str) -> DomainResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Apply embedded migrations. Safe to run on every startup; already
    /// applied migrations are skipped.
    pub async fn migrate(&self) -> DomainResult<()> {
        MIGRATOR
            .run(&*self.pool)
            .await
            .map_err(|e| DomainError::consistency(format!("migration failed: {e}")))?;
        tracing::info!("database migrations applied");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    sku: String,
    name: String,
    description: String,
    category: String,
    retail_price: Decimal,
    wholesale_price: Decimal,
    moq: i64,
    stock_quantity: i64,
    images: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProductRow {
    fn into_product(self) -> DomainResult<Product> {
        let images: Vec<ProductImage> = serde_json::from_value(self.images).map_err(|e| {
            DomainError::consistency(format!("failed to decode product images: {e}"))
        })?;
        Ok(Product::from_state(ProductState {
            id: ProductId::new(AggregateId::from_uuid(self.id)),
            sku: self.sku,
            name: self.name,
            description: self.description,
            category: self.category,
            retail_price: Money::new(self.retail_price),
            wholesale_price: Money::new(self.wholesale_price),
            moq: self.moq,
            stock_quantity: self.stock_quantity,
            images,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    email: String,
    display_name: String,
    classification: String,
    approved: bool,
    total_units_ordered: i64,
    created_at: DateTime<Utc>,
}

impl AccountRow {
    fn into_account(self) -> DomainResult<Account> {
        let classification = Classification::from_str(&self.classification).map_err(|_| {
            DomainError::consistency(format!(
                "unknown classification '{}' in accounts row",
                self.classification
            ))
        })?;
        Ok(Account::from_state(AccountState {
            id: AccountId::from_uuid(self.id),
            email: self.email,
            display_name: self.display_name,
            classification,
            approved: self.approved,
            total_units_ordered: self.total_units_ordered,
            created_at: self.created_at,
        }))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ApplicationRow {
    id: Uuid,
    account_id: Uuid,
    business_name: String,
    tax_id: String,
    business_type: String,
    street: String,
    city: String,
    state: String,
    zip: String,
    phone: String,
    status: String,
    submitted_at: DateTime<Utc>,
    decided_at: Option<DateTime<Utc>>,
}

impl ApplicationRow {
    fn into_application(self) -> DomainResult<WholesaleApplication> {
        let status = ApprovalStatus::from_str(&self.status).map_err(|_| {
            DomainError::consistency(format!(
                "unknown approval status '{}' in wholesale_applications row",
                self.status
            ))
        })?;
        Ok(WholesaleApplication::from_state(ApplicationState {
            id: ApplicationId::new(AggregateId::from_uuid(self.id)),
            account_id: AccountId::from_uuid(self.account_id),
            details: BusinessDetails {
                business_name: self.business_name,
                tax_id: self.tax_id,
                business_type: self.business_type,
                street: self.street,
                city: self.city,
                state: self.state,
                zip: self.zip,
                phone: self.phone,
            },
            status,
            submitted_at: self.submitted_at,
            decided_at: self.decided_at,
        }))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    id: Uuid,
    account_id: Uuid,
    product_id: Uuid,
    quantity: i64,
    added_at: DateTime<Utc>,
}

impl CartLineRow {
    fn into_line(self) -> CartLine {
        CartLine {
            id: CartLineId::new(AggregateId::from_uuid(self.id)),
            account_id: AccountId::from_uuid(self.account_id),
            product_id: ProductId::new(AggregateId::from_uuid(self.product_id)),
            quantity: self.quantity,
            added_at: self.added_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    account_id: Uuid,
    status: String,
    lines: serde_json::Value,
    subtotal: Decimal,
    shipping_cost: Decimal,
    tax_amount: Decimal,
    total_amount: Decimal,
    shipping_method: String,
    shipping_address: serde_json::Value,
    placed_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self) -> DomainResult<Order> {
        let status = OrderStatus::from_str(&self.status).map_err(|_| {
            DomainError::consistency(format!(
                "unknown order status '{}' in orders row",
                self.status
            ))
        })?;
        let shipping_method = ShippingMethod::from_str(&self.shipping_method).map_err(|_| {
            DomainError::consistency(format!(
                "unknown shipping method '{}' in orders row",
                self.shipping_method
            ))
        })?;
        let lines: Vec<OrderLine> = serde_json::from_value(self.lines)
            .map_err(|e| DomainError::consistency(format!("failed to decode order lines: {e}")))?;
        let shipping_address: ShippingAddress = serde_json::from_value(self.shipping_address)
            .map_err(|e| {
                DomainError::consistency(format!("failed to decode shipping address: {e}"))
            })?;
        Ok(Order::from_state(OrderState {
            id: OrderId::new(AggregateId::from_uuid(self.id)),
            account_id: AccountId::from_uuid(self.account_id),
            status,
            lines,
            subtotal: Money::new(self.subtotal),
            shipping_cost: Money::new(self.shipping_cost),
            tax_amount: Money::new(self.tax_amount),
            total_amount: Money::new(self.total_amount),
            shipping_method,
            shipping_address,
            placed_at: self.placed_at,
            updated_at: self.updated_at,
        }))
    }
}

// ---------------------------------------------------------------------------
// ProductStore
// ---------------------------------------------------------------------------

#[async_trait]
impl ProductStore for PostgresStore {
    #[instrument(skip(self, product), fields(product_id = %product.id()), err)]
    async fn insert_product(&self, product: &Product) -> DomainResult<()> {
        let state = product.state();
        let images = serde_json::to_value(&state.images)
            .map_err(|e| DomainError::consistency(format!("failed to encode images: {e}")))?;
        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, name, description, category,
                retail_price, wholesale_price, moq, stock_quantity,
                images, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(*state.id.0.as_uuid())
        .bind(&state.sku)
        .bind(&state.name)
        .bind(&state.description)
        .bind(&state.category)
        .bind(state.retail_price.amount())
        .bind(state.wholesale_price.amount())
        .bind(state.moq)
        .bind(state.stock_quantity)
        .bind(images)
        .bind(state.created_at)
        .bind(state.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_product", e))?;
        Ok(())
    }

    #[instrument(skip(self, product), fields(product_id = %product.id()), err)]
    async fn update_product(&self, product: &Product) -> DomainResult<()> {
        let state = product.state();
        let images = serde_json::to_value(&state.images)
            .map_err(|e| DomainError::consistency(format!("failed to encode images: {e}")))?;
        let result = sqlx::query(
            r#"
            UPDATE products SET
                sku = $2, name = $3, description = $4, category = $5,
                retail_price = $6, wholesale_price = $7, moq = $8,
                stock_quantity = $9, images = $10, updated_at = $11
            WHERE id = $1
            "#,
        )
        .bind(*state.id.0.as_uuid())
        .bind(&state.sku)
        .bind(&state.name)
        .bind(&state.description)
        .bind(&state.category)
        .bind(state.retail_price.amount())
        .bind(state.wholesale_price.amount())
        .bind(state.moq)
        .bind(state.stock_quantity)
        .bind(images)
        .bind(state.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_product", e))?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found());
        }
        Ok(())
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn delete_product(&self, id: ProductId) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(*id.0.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found());
        }
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> DomainResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, sku, name, description, category,
                   retail_price, wholesale_price, moq, stock_quantity,
                   images, created_at, updated_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(*id.0.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_product", e))?;
        row.map(ProductRow::into_product).transpose()
    }

    async fn get_products(&self, ids: &[ProductId]) -> DomainResult<Vec<Product>> {
        let uuids: Vec<Uuid> = ids.iter().map(|id| *id.0.as_uuid()).collect();
        let rows = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, sku, name, description, category,
                   retail_price, wholesale_price, moq, stock_quantity,
                   images, created_at, updated_at
            FROM products
            WHERE id = ANY($1)
            ORDER BY created_at, id
            "#,
        )
        .bind(&uuids)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_products", e))?;
        rows.into_iter().map(ProductRow::into_product).collect()
    }

    async fn list_products(&self, filter: &ProductFilter) -> DomainResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, sku, name, description, category,
                   retail_price, wholesale_price, moq, stock_quantity,
                   images, created_at, updated_at
            FROM products
            WHERE ($1::text IS NULL OR LOWER(category) = LOWER($1))
              AND ($2::text IS NULL
                   OR name ILIKE '%' || $2 || '%'
                   OR description ILIKE '%' || $2 || '%')
            ORDER BY created_at, id
            "#,
        )
        .bind(filter.category.as_deref())
        .bind(filter.search.as_deref())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_products", e))?;
        rows.into_iter().map(ProductRow::into_product).collect()
    }
}

// ---------------------------------------------------------------------------
// AccountStore
// ---------------------------------------------------------------------------

#[async_trait]
impl AccountStore for PostgresStore {
    #[instrument(skip(self, account), fields(account_id = %account.id()), err)]
    async fn insert_account(&self, account: &Account) -> DomainResult<()> {
        let state = account.state();
        sqlx::query(
            r#"
            INSERT INTO accounts (
                id, email, display_name, classification, approved,
                total_units_ordered, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(*state.id.as_uuid())
        .bind(&state.email)
        .bind(&state.display_name)
        .bind(state.classification.as_str())
        .bind(state.approved)
        .bind(state.total_units_ordered)
        .bind(state.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_account", e))?;
        Ok(())
    }

    async fn update_account(&self, account: &Account) -> DomainResult<()> {
        // total_units_ordered is deliberately absent; see the trait contract.
        let state = account.state();
        let result = sqlx::query(
            r#"
            UPDATE accounts SET
                email = $2, display_name = $3, classification = $4, approved = $5
            WHERE id = $1
            "#,
        )
        .bind(*state.id.as_uuid())
        .bind(&state.email)
        .bind(&state.display_name)
        .bind(state.classification.as_str())
        .bind(state.approved)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_account", e))?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found());
        }
        Ok(())
    }

    async fn get_account(&self, id: AccountId) -> DomainResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, email, display_name, classification, approved,
                   total_units_ordered, created_at
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(*id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_account", e))?;
        row.map(AccountRow::into_account).transpose()
    }

    async fn find_account_by_email(&self, email: &str) -> DomainResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, email, display_name, classification, approved,
                   total_units_ordered, created_at
            FROM accounts
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_account_by_email", e))?;
        row.map(AccountRow::into_account).transpose()
    }

    async fn list_accounts(&self) -> DomainResult<Vec<Account>> {
        let rows = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, email, display_name, classification, approved,
                   total_units_ordered, created_at
            FROM accounts
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_accounts", e))?;
        rows.into_iter().map(AccountRow::into_account).collect()
    }
}

// ---------------------------------------------------------------------------
// ApplicationStore
// ---------------------------------------------------------------------------

#[async_trait]
impl ApplicationStore for PostgresStore {
    #[instrument(
        skip(self, application),
        fields(application_id = %application.id(), account_id = %application.account_id()),
        err
    )]
    async fn insert_application(&self, application: &WholesaleApplication) -> DomainResult<()> {
        let state = application.state();
        sqlx::query(
            r#"
            INSERT INTO wholesale_applications (
                id, account_id, business_name, tax_id, business_type,
                street, city, state, zip, phone,
                status, submitted_at, decided_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(*state.id.0.as_uuid())
        .bind(*state.account_id.as_uuid())
        .bind(&state.details.business_name)
        .bind(&state.details.tax_id)
        .bind(&state.details.business_type)
        .bind(&state.details.street)
        .bind(&state.details.city)
        .bind(&state.details.state)
        .bind(&state.details.zip)
        .bind(&state.details.phone)
        .bind(state.status.as_str())
        .bind(state.submitted_at)
        .bind(state.decided_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_application", e))?;
        Ok(())
    }

    async fn update_application(&self, application: &WholesaleApplication) -> DomainResult<()> {
        // Business details are immutable after submission; only the decision
        // fields move.
        let state = application.state();
        let result = sqlx::query(
            r#"
            UPDATE wholesale_applications SET status = $2, decided_at = $3
            WHERE id = $1
            "#,
        )
        .bind(*state.id.0.as_uuid())
        .bind(state.status.as_str())
        .bind(state.decided_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_application", e))?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found());
        }
        Ok(())
    }

    async fn get_application(
        &self,
        id: ApplicationId,
    ) -> DomainResult<Option<WholesaleApplication>> {
        let row = sqlx::query_as::<_, ApplicationRow>(
            r#"
            SELECT id, account_id, business_name, tax_id, business_type,
                   street, city, state, zip, phone,
                   status, submitted_at, decided_at
            FROM wholesale_applications
            WHERE id = $1
            "#,
        )
        .bind(*id.0.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_application", e))?;
        row.map(ApplicationRow::into_application).transpose()
    }

    async fn find_application_by_account(
        &self,
        account_id: AccountId,
    ) -> DomainResult<Option<WholesaleApplication>> {
        let row = sqlx::query_as::<_, ApplicationRow>(
            r#"
            SELECT id, account_id, business_name, tax_id, business_type,
                   street, city, state, zip, phone,
                   status, submitted_at, decided_at
            FROM wholesale_applications
            WHERE account_id = $1
            "#,
        )
        .bind(*account_id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_application_by_account", e))?;
        row.map(ApplicationRow::into_application).transpose()
    }

    async fn list_applications(
        &self,
        status: Option<ApprovalStatus>,
    ) -> DomainResult<Vec<WholesaleApplication>> {
        let rows = sqlx::query_as::<_, ApplicationRow>(
            r#"
            SELECT id, account_id, business_name, tax_id, business_type,
                   street, city, state, zip, phone,
                   status, submitted_at, decided_at
            FROM wholesale_applications
            WHERE ($1::text IS NULL OR status = $1)
            ORDER BY submitted_at, id
            "#,
        )
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_applications", e))?;
        rows.into_iter()
            .map(ApplicationRow::into_application)
            .collect()
    }

    #[instrument(
        skip(self, application, account),
        fields(application_id = %application.id(), account_id = %account.id()),
        err
    )]
    async fn approve_application(
        &self,
        application: &WholesaleApplication,
        account: &Account,
    ) -> DomainResult<()> {
        let app_state = application.state();
        let account_state = account.state();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("approve_application.begin", e))?;

        let updated = sqlx::query(
            r#"
            UPDATE wholesale_applications SET status = $2, decided_at = $3
            WHERE id = $1
            "#,
        )
        .bind(*app_state.id.0.as_uuid())
        .bind(app_state.status.as_str())
        .bind(app_state.decided_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("approve_application.application", e))?;
        if updated.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(DomainError::not_found());
        }

        // The counter column is left alone; a checkout racing this approval
        // keeps its increment.
        let updated = sqlx::query(
            r#"
            UPDATE accounts SET classification = $2, approved = $3
            WHERE id = $1
            "#,
        )
        .bind(*account_state.id.as_uuid())
        .bind(account_state.classification.as_str())
        .bind(account_state.approved)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("approve_application.account", e))?;
        if updated.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(DomainError::consistency(format!(
                "account {} missing during approval",
                account.id()
            )));
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("approve_application.commit", e))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CartStore
// ---------------------------------------------------------------------------

#[async_trait]
impl CartStore for PostgresStore {
    async fn load_cart(&self, account_id: AccountId) -> DomainResult<Cart> {
        let rows = sqlx::query_as::<_, CartLineRow>(
            r#"
            SELECT id, account_id, product_id, quantity, added_at
            FROM cart_lines
            WHERE account_id = $1
            ORDER BY added_at, id
            "#,
        )
        .bind(*account_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_cart", e))?;
        let lines = rows.into_iter().map(CartLineRow::into_line).collect();
        Ok(Cart::from_lines(account_id, lines))
    }

    async fn save_line(&self, line: &CartLine) -> DomainResult<()> {
        sqlx::query(
            r#"
            INSERT INTO cart_lines (id, account_id, product_id, quantity, added_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET quantity = EXCLUDED.quantity
            "#,
        )
        .bind(*line.id.0.as_uuid())
        .bind(*line.account_id.as_uuid())
        .bind(*line.product_id.0.as_uuid())
        .bind(line.quantity)
        .bind(line.added_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("save_line", e))?;
        Ok(())
    }

    async fn delete_line(&self, account_id: AccountId, line_id: CartLineId) -> DomainResult<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM cart_lines
            WHERE account_id = $1 AND id = $2
            "#,
        )
        .bind(*account_id.as_uuid())
        .bind(*line_id.0.as_uuid())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("delete_line", e))?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found());
        }
        Ok(())
    }

    async fn clear_cart(&self, account_id: AccountId) -> DomainResult<()> {
        sqlx::query("DELETE FROM cart_lines WHERE account_id = $1")
            .bind(*account_id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("clear_cart", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(product_id = %product_id), err)]
    async fn delete_product_lines(&self, product_id: ProductId) -> DomainResult<()> {
        sqlx::query("DELETE FROM cart_lines WHERE product_id = $1")
            .bind(*product_id.0.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_product_lines", e))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// OrderStore
// ---------------------------------------------------------------------------

#[async_trait]
impl OrderStore for PostgresStore {
    #[instrument(
        skip(self, order),
        fields(order_id = %order.id(), account_id = %order.account_id()),
        err
    )]
    async fn place_order(&self, order: &Order) -> DomainResult<()> {
        let state = order.state();
        let lines = serde_json::to_value(&state.lines)
            .map_err(|e| DomainError::consistency(format!("failed to encode order lines: {e}")))?;
        let shipping_address = serde_json::to_value(&state.shipping_address).map_err(|e| {
            DomainError::consistency(format!("failed to encode shipping address: {e}"))
        })?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("place_order.begin", e))?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, account_id, status, lines,
                subtotal, shipping_cost, tax_amount, total_amount,
                shipping_method, shipping_address, placed_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(*state.id.0.as_uuid())
        .bind(*state.account_id.as_uuid())
        .bind(state.status.as_str())
        .bind(lines)
        .bind(state.subtotal.amount())
        .bind(state.shipping_cost.amount())
        .bind(state.tax_amount.amount())
        .bind(state.total_amount.amount())
        .bind(state.shipping_method.as_str())
        .bind(shipping_address)
        .bind(state.placed_at)
        .bind(state.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("place_order.insert", e))?;

        let updated = sqlx::query(
            r#"
            UPDATE accounts
            SET total_units_ordered = total_units_ordered + $2
            WHERE id = $1
            "#,
        )
        .bind(*state.account_id.as_uuid())
        .bind(order.total_units())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("place_order.counter", e))?;
        if updated.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(DomainError::consistency(format!(
                "account {} missing during order placement",
                order.account_id()
            )));
        }

        sqlx::query("DELETE FROM cart_lines WHERE account_id = $1")
            .bind(*state.account_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("place_order.clear_cart", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("place_order.commit", e))?;
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> DomainResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, account_id, status, lines,
                   subtotal, shipping_cost, tax_amount, total_amount,
                   shipping_method, shipping_address, placed_at, updated_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(*id.0.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_order", e))?;
        row.map(OrderRow::into_order).transpose()
    }

    async fn list_orders_for_account(&self, account_id: AccountId) -> DomainResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, account_id, status, lines,
                   subtotal, shipping_cost, tax_amount, total_amount,
                   shipping_method, shipping_address, placed_at, updated_at
            FROM orders
            WHERE account_id = $1
            ORDER BY placed_at DESC, id DESC
            "#,
        )
        .bind(*account_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_orders_for_account", e))?;
        rows.into_iter().map(OrderRow::into_order).collect()
    }

    async fn list_orders(&self, status: Option<OrderStatus>) -> DomainResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, account_id, status, lines,
                   subtotal, shipping_cost, tax_amount, total_amount,
                   shipping_method, shipping_address, placed_at, updated_at
            FROM orders
            WHERE ($1::text IS NULL OR status = $1)
            ORDER BY placed_at DESC, id DESC
            "#,
        )
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_orders", e))?;
        rows.into_iter().map(OrderRow::into_order).collect()
    }

    #[instrument(
        skip(self, order),
        fields(order_id = %order.id(), status = order.status().as_str()),
        err
    )]
    async fn update_order_status(&self, order: &Order) -> DomainResult<()> {
        let state = order.state();
        let result = sqlx::query(
            r#"
            UPDATE orders SET status = $2, updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(*state.id.0.as_uuid())
        .bind(state.status.as_str())
        .bind(state.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_order_status", e))?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found());
        }
        Ok(())
    }
}
