use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mercora_core::{AggregateId, DomainError, DomainResult, Money};

/// Product identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub AggregateId);

impl ProductId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Catalog image reference.
///
/// `storage_id` points at the upload in the media store when the image was
/// uploaded through the admin surface; plain external URLs leave it empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    pub url: String,
    pub storage_id: Option<String>,
}

/// Aggregate root: Product.
///
/// Both price tiers live on every product; which tier a buyer sees is decided
/// by the pricing engine, never stored here.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    id: ProductId,
    sku: String,
    name: String,
    description: String,
    category: String,
    retail_price: Money,
    wholesale_price: Money,
    moq: i64,
    stock_quantity: i64,
    images: Vec<ProductImage>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Command: CreateProduct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateProduct {
    pub sku: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub retail_price: Money,
    pub wholesale_price: Money,
    pub moq: i64,
    pub stock_quantity: i64,
    pub images: Vec<ProductImage>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateProduct. `None` fields are left unchanged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UpdateProduct {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub retail_price: Option<Money>,
    pub wholesale_price: Option<Money>,
    pub moq: Option<i64>,
    pub stock_quantity: Option<i64>,
    pub images: Option<Vec<ProductImage>>,
    #[serde(default = "Utc::now")]
    pub occurred_at: DateTime<Utc>,
}

/// Persisted shape of a product, used to rehydrate the aggregate from a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductState {
    pub id: ProductId,
    pub sku: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub retail_price: Money,
    pub wholesale_price: Money,
    pub moq: i64,
    pub stock_quantity: i64,
    pub images: Vec<ProductImage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn create(cmd: CreateProduct) -> DomainResult<Self> {
        ensure_text("name", &cmd.name)?;
        ensure_text("sku", &cmd.sku)?;
        ensure_price("retail_price", cmd.retail_price)?;
        ensure_price("wholesale_price", cmd.wholesale_price)?;
        ensure_moq(cmd.moq)?;
        ensure_stock(cmd.stock_quantity)?;
        ensure_images(&cmd.images)?;

        Ok(Self {
            id: ProductId::new(AggregateId::new()),
            sku: cmd.sku.trim().to_string(),
            name: cmd.name.trim().to_string(),
            description: cmd.description,
            category: cmd.category,
            retail_price: cmd.retail_price,
            wholesale_price: cmd.wholesale_price,
            moq: cmd.moq,
            stock_quantity: cmd.stock_quantity,
            images: cmd.images,
            created_at: cmd.occurred_at,
            updated_at: cmd.occurred_at,
        })
    }

    /// Apply a partial update. All provided fields are validated before any
    /// of them is written, so a rejected command leaves the product untouched.
    pub fn apply_update(&mut self, cmd: UpdateProduct) -> DomainResult<()> {
        if let Some(name) = &cmd.name {
            ensure_text("name", name)?;
        }
        if let Some(sku) = &cmd.sku {
            ensure_text("sku", sku)?;
        }
        if let Some(retail_price) = cmd.retail_price {
            ensure_price("retail_price", retail_price)?;
        }
        if let Some(wholesale_price) = cmd.wholesale_price {
            ensure_price("wholesale_price", wholesale_price)?;
        }
        if let Some(moq) = cmd.moq {
            ensure_moq(moq)?;
        }
        if let Some(stock_quantity) = cmd.stock_quantity {
            ensure_stock(stock_quantity)?;
        }
        if let Some(images) = &cmd.images {
            ensure_images(images)?;
        }

        if let Some(sku) = cmd.sku {
            self.sku = sku.trim().to_string();
        }
        if let Some(name) = cmd.name {
            self.name = name.trim().to_string();
        }
        if let Some(description) = cmd.description {
            self.description = description;
        }
        if let Some(category) = cmd.category {
            self.category = category;
        }
        if let Some(retail_price) = cmd.retail_price {
            self.retail_price = retail_price;
        }
        if let Some(wholesale_price) = cmd.wholesale_price {
            self.wholesale_price = wholesale_price;
        }
        if let Some(moq) = cmd.moq {
            self.moq = moq;
        }
        if let Some(stock_quantity) = cmd.stock_quantity {
            self.stock_quantity = stock_quantity;
        }
        if let Some(images) = cmd.images {
            self.images = images;
        }
        self.updated_at = cmd.occurred_at;

        Ok(())
    }

    /// Reject quantities below this product's minimum order quantity.
    pub fn ensure_min_quantity(&self, quantity: i64) -> DomainResult<()> {
        if quantity < self.moq {
            return Err(DomainError::validation(format!(
                "quantity {} is below the minimum order quantity of {} for '{}'",
                quantity, self.moq, self.sku
            )));
        }
        Ok(())
    }

    /// Rehydrate from persisted state. Invariants were enforced when the
    /// state was first written and are not re-checked here.
    pub fn from_state(state: ProductState) -> Self {
        Self {
            id: state.id,
            sku: state.sku,
            name: state.name,
            description: state.description,
            category: state.category,
            retail_price: state.retail_price,
            wholesale_price: state.wholesale_price,
            moq: state.moq,
            stock_quantity: state.stock_quantity,
            images: state.images,
            created_at: state.created_at,
            updated_at: state.updated_at,
        }
    }

    pub fn state(&self) -> ProductState {
        ProductState {
            id: self.id,
            sku: self.sku.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            retail_price: self.retail_price,
            wholesale_price: self.wholesale_price,
            moq: self.moq,
            stock_quantity: self.stock_quantity,
            images: self.images.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn id(&self) -> ProductId {
        self.id
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn retail_price(&self) -> Money {
        self.retail_price
    }

    pub fn wholesale_price(&self) -> Money {
        self.wholesale_price
    }

    pub fn moq(&self) -> i64 {
        self.moq
    }

    pub fn stock_quantity(&self) -> i64 {
        self.stock_quantity
    }

    pub fn images(&self) -> &[ProductImage] {
        &self.images
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

fn ensure_text(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

fn ensure_price(field: &str, value: Money) -> DomainResult<()> {
    if value.is_negative() {
        return Err(DomainError::validation(format!(
            "{field} cannot be negative"
        )));
    }
    Ok(())
}

fn ensure_moq(moq: i64) -> DomainResult<()> {
    if moq < 1 {
        return Err(DomainError::validation(
            "minimum order quantity must be at least 1",
        ));
    }
    Ok(())
}

fn ensure_stock(stock_quantity: i64) -> DomainResult<()> {
    if stock_quantity < 0 {
        return Err(DomainError::validation("stock quantity cannot be negative"));
    }
    Ok(())
}

fn ensure_images(images: &[ProductImage]) -> DomainResult<()> {
    if !(3..=5).contains(&images.len()) {
        return Err(DomainError::validation(
            "a product requires between 3 and 5 images",
        ));
    }
    if images.iter().any(|image| image.url.trim().is_empty()) {
        return Err(DomainError::validation("image url cannot be empty"));
    }
    Ok(())
}

/// Catalog listing filter. `search` matches name or description,
/// case-insensitive; `category` matches exactly (ignoring case).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub search: Option<String>,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(category) = &self.category
            && !product.category.eq_ignore_ascii_case(category)
        {
            return false;
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let in_name = product.name.to_lowercase().contains(&needle);
            let in_description = product.description.to_lowercase().contains(&needle);
            if !in_name && !in_description {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn money(s: &str) -> Money {
        s.parse().unwrap()
    }

    fn test_images(count: usize) -> Vec<ProductImage> {
        (0..count)
            .map(|i| ProductImage {
                url: format!("https://cdn.example.com/p/{i}.jpg"),
                storage_id: None,
            })
            .collect()
    }

    fn create_cmd() -> CreateProduct {
        CreateProduct {
            sku: "WID-0001".to_string(),
            name: "Forged Widget".to_string(),
            description: "A widget forged from billet stock.".to_string(),
            category: "widgets".to_string(),
            retail_price: money("18.99"),
            wholesale_price: money("12.50"),
            moq: 24,
            stock_quantity: 500,
            images: test_images(3),
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn create_product_builds_catalog_entry() {
        let cmd = create_cmd();
        let product = Product::create(cmd.clone()).unwrap();

        assert_eq!(product.sku(), "WID-0001");
        assert_eq!(product.name(), "Forged Widget");
        assert_eq!(product.category(), "widgets");
        assert_eq!(product.retail_price(), money("18.99"));
        assert_eq!(product.wholesale_price(), money("12.50"));
        assert_eq!(product.moq(), 24);
        assert_eq!(product.stock_quantity(), 500);
        assert_eq!(product.images().len(), 3);
        assert_eq!(product.created_at(), cmd.occurred_at);
        assert_eq!(product.updated_at(), cmd.occurred_at);
    }

    #[test]
    fn create_product_rejects_empty_name() {
        let cmd = CreateProduct {
            name: "   ".to_string(),
            ..create_cmd()
        };

        let err = Product::create(cmd).unwrap_err();
        match err {
            DomainError::Validation(msg) => assert!(msg.contains("name")),
            other => panic!("expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn create_product_rejects_empty_sku() {
        let cmd = CreateProduct {
            sku: String::new(),
            ..create_cmd()
        };

        let err = Product::create(cmd).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn create_product_rejects_negative_prices() {
        let cmd = CreateProduct {
            retail_price: money("-0.01"),
            ..create_cmd()
        };
        assert!(matches!(
            Product::create(cmd),
            Err(DomainError::Validation(_))
        ));

        let cmd = CreateProduct {
            wholesale_price: money("-5.00"),
            ..create_cmd()
        };
        assert!(matches!(
            Product::create(cmd),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn create_product_rejects_moq_below_one() {
        let cmd = CreateProduct {
            moq: 0,
            ..create_cmd()
        };

        let err = Product::create(cmd).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn create_product_rejects_negative_stock() {
        let cmd = CreateProduct {
            stock_quantity: -1,
            ..create_cmd()
        };

        let err = Product::create(cmd).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn create_product_enforces_image_count() {
        for count in [0, 1, 2, 6, 7] {
            let cmd = CreateProduct {
                images: test_images(count),
                ..create_cmd()
            };
            assert!(
                matches!(Product::create(cmd), Err(DomainError::Validation(_))),
                "{count} images should be rejected"
            );
        }
        for count in [3, 4, 5] {
            let cmd = CreateProduct {
                images: test_images(count),
                ..create_cmd()
            };
            assert!(Product::create(cmd).is_ok(), "{count} images should pass");
        }
    }

    #[test]
    fn create_product_allows_wholesale_above_retail() {
        let cmd = CreateProduct {
            retail_price: money("10.00"),
            wholesale_price: money("15.00"),
            ..create_cmd()
        };

        assert!(Product::create(cmd).is_ok());
    }

    #[test]
    fn create_product_trims_name_and_sku() {
        let cmd = CreateProduct {
            sku: "  WID-0001  ".to_string(),
            name: "  Forged Widget ".to_string(),
            ..create_cmd()
        };

        let product = Product::create(cmd).unwrap();
        assert_eq!(product.sku(), "WID-0001");
        assert_eq!(product.name(), "Forged Widget");
    }

    #[test]
    fn update_changes_only_provided_fields() {
        let mut product = Product::create(create_cmd()).unwrap();
        let later = Utc::now();

        product
            .apply_update(UpdateProduct {
                name: Some("Forged Widget Mk2".to_string()),
                retail_price: Some(money("21.99")),
                occurred_at: later,
                ..UpdateProduct::default()
            })
            .unwrap();

        assert_eq!(product.name(), "Forged Widget Mk2");
        assert_eq!(product.retail_price(), money("21.99"));
        assert_eq!(product.sku(), "WID-0001");
        assert_eq!(product.wholesale_price(), money("12.50"));
        assert_eq!(product.updated_at(), later);
    }

    #[test]
    fn update_rejects_invalid_values_without_mutating() {
        let mut product = Product::create(create_cmd()).unwrap();
        let before = product.clone();

        let err = product
            .apply_update(UpdateProduct {
                name: Some("Renamed".to_string()),
                moq: Some(0),
                occurred_at: Utc::now(),
                ..UpdateProduct::default()
            })
            .unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(product, before);
    }

    #[test]
    fn ensure_min_quantity_gates_below_moq() {
        let product = Product::create(create_cmd()).unwrap();

        let err = product.ensure_min_quantity(23).unwrap_err();
        match err {
            DomainError::Validation(msg) => {
                assert!(msg.contains("23"));
                assert!(msg.contains("24"));
            }
            other => panic!("expected Validation error, got {other:?}"),
        }

        assert!(product.ensure_min_quantity(24).is_ok());
        assert!(product.ensure_min_quantity(25).is_ok());
    }

    #[test]
    fn filter_matches_category_ignoring_case() {
        let product = Product::create(create_cmd()).unwrap();

        let filter = ProductFilter {
            category: Some("Widgets".to_string()),
            search: None,
        };
        assert!(filter.matches(&product));

        let filter = ProductFilter {
            category: Some("gaskets".to_string()),
            search: None,
        };
        assert!(!filter.matches(&product));
    }

    #[test]
    fn filter_searches_name_and_description() {
        let product = Product::create(create_cmd()).unwrap();

        let by_name = ProductFilter {
            category: None,
            search: Some("forged".to_string()),
        };
        assert!(by_name.matches(&product));

        let by_description = ProductFilter {
            category: None,
            search: Some("BILLET".to_string()),
        };
        assert!(by_description.matches(&product));

        let miss = ProductFilter {
            category: None,
            search: Some("gasket".to_string()),
        };
        assert!(!miss.matches(&product));
    }

    #[test]
    fn empty_filter_matches_everything() {
        let product = Product::create(create_cmd()).unwrap();
        assert!(ProductFilter::default().matches(&product));
    }

    #[cfg(test)]
    mod proptest_tests {
        use proptest::prelude::*;
        use rust_decimal::Decimal;

        use super::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 1000,
                ..ProptestConfig::default()
            })]

            /// Property: any input passing validation round-trips through the
            /// accessors unchanged.
            #[test]
            fn create_accepts_any_valid_input(
                sku in "[A-Z0-9-]{1,20}",
                name in "[A-Za-z][A-Za-z0-9 ]{0,99}",
                retail_cents in 0i64..1_000_000,
                wholesale_cents in 0i64..1_000_000,
                moq in 1i64..500,
                stock in 0i64..10_000,
                image_count in 3usize..=5,
            ) {
                let cmd = CreateProduct {
                    sku: sku.clone(),
                    name: name.clone(),
                    description: "generated".to_string(),
                    category: "generated".to_string(),
                    retail_price: Money::new(Decimal::new(retail_cents, 2)),
                    wholesale_price: Money::new(Decimal::new(wholesale_cents, 2)),
                    moq,
                    stock_quantity: stock,
                    images: test_images(image_count),
                    occurred_at: Utc::now(),
                };

                let product = Product::create(cmd).unwrap();
                prop_assert_eq!(product.sku(), sku.trim());
                prop_assert_eq!(product.name(), name.trim());
                prop_assert_eq!(product.moq(), moq);
                prop_assert_eq!(product.stock_quantity(), stock);
                prop_assert_eq!(product.images().len(), image_count);
            }

            /// Property: quantity clears the MOQ gate exactly when it reaches it.
            #[test]
            fn min_quantity_gate_is_exact(
                moq in 1i64..500,
                quantity in 0i64..1000,
            ) {
                let cmd = CreateProduct { moq, ..base_cmd() };
                let product = Product::create(cmd).unwrap();

                let outcome = product.ensure_min_quantity(quantity);
                if quantity >= moq {
                    prop_assert!(outcome.is_ok());
                } else {
                    prop_assert!(matches!(outcome, Err(DomainError::Validation(_))));
                }
            }

            /// Property: persisted state rehydrates to an identical aggregate.
            #[test]
            fn state_round_trips(
                sku in "[A-Z0-9-]{1,20}",
                name in "[A-Za-z][A-Za-z0-9 ]{0,99}",
                moq in 1i64..500,
            ) {
                let cmd = CreateProduct { sku, name, moq, ..base_cmd() };
                let product = Product::create(cmd).unwrap();

                let rehydrated = Product::from_state(product.state());
                prop_assert_eq!(rehydrated, product);
            }

            /// Property: applying the same update twice converges to the same
            /// state as applying it once.
            #[test]
            fn update_is_idempotent(
                name in "[A-Za-z][A-Za-z0-9 ]{0,99}",
                moq in 1i64..500,
            ) {
                let update = UpdateProduct {
                    name: Some(name),
                    moq: Some(moq),
                    occurred_at: Utc::now(),
                    ..UpdateProduct::default()
                };

                let mut once = Product::create(base_cmd()).unwrap();
                once.apply_update(update.clone()).unwrap();

                let mut twice = Product::create(base_cmd()).unwrap();
                twice.apply_update(update.clone()).unwrap();
                twice.apply_update(update).unwrap();

                prop_assert_eq!(once.name(), twice.name());
                prop_assert_eq!(once.moq(), twice.moq());
                prop_assert_eq!(once.updated_at(), twice.updated_at());
            }
        }

        fn base_cmd() -> CreateProduct {
            CreateProduct {
                sku: "GEN-0001".to_string(),
                name: "Generated".to_string(),
                description: "generated".to_string(),
                category: "generated".to_string(),
                retail_price: Money::ZERO,
                wholesale_price: Money::ZERO,
                moq: 1,
                stock_quantity: 0,
                images: test_images(3),
                occurred_at: Utc::now(),
            }
        }
    }
}
