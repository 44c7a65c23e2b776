//! Seed the database with a demo catalog and two demo buyers.
//!
//! Idempotent: rows that already exist (matched by sku or email) are left
//! alone, so the binary can run on every deploy.

use anyhow::{Context, Result};
use chrono::Utc;
use rust_decimal::Decimal;

use mercora_accounts::{
    Account, BusinessDetails, RegisterAccount, SubmitApplication, WholesaleApplication,
};
use mercora_core::{AccountId, Money};
use mercora_products::{CreateProduct, Product, ProductImage};
use mercora_storage::{AccountStore, ApplicationStore, PostgresStore, ProductStore};

struct SeedProduct {
    sku: &'static str,
    name: &'static str,
    description: &'static str,
    category: &'static str,
    retail_cents: i64,
    wholesale_cents: i64,
    moq: i64,
    stock: i64,
}

const CATALOG: &[SeedProduct] = &[
    SeedProduct {
        sku: "GLV-NTR-100",
        name: "Nitrile Gloves, 100-count",
        description: "Powder-free nitrile gloves, size L, food-safe.",
        category: "safety",
        retail_cents: 1899,
        wholesale_cents: 1299,
        moq: 10,
        stock: 4200,
    },
    SeedProduct {
        sku: "TPE-PCK-48",
        name: "Packing Tape, 48mm x 60m",
        description: "Clear acrylic packing tape, 36 rolls per case.",
        category: "packaging",
        retail_cents: 2499,
        wholesale_cents: 1750,
        moq: 6,
        stock: 1800,
    },
    SeedProduct {
        sku: "BOX-CRG-18",
        name: "Corrugated Boxes, 18x14x12",
        description: "Double-wall corrugated shipping boxes, bundle of 25.",
        category: "packaging",
        retail_cents: 4250,
        wholesale_cents: 3100,
        moq: 4,
        stock: 960,
    },
    SeedProduct {
        sku: "LBL-THM-4X6",
        name: "Thermal Labels, 4x6",
        description: "Direct thermal shipping labels, 500 per roll.",
        category: "shipping",
        retail_cents: 1575,
        wholesale_cents: 1125,
        moq: 12,
        stock: 5400,
    },
    SeedProduct {
        sku: "CLN-DGR-1G",
        name: "Industrial Degreaser, 1 gal",
        description: "Concentrated citrus degreaser for shop floors.",
        category: "janitorial",
        retail_cents: 3299,
        wholesale_cents: 2450,
        moq: 4,
        stock: 720,
    },
    SeedProduct {
        sku: "TWL-SHP-200",
        name: "Shop Towels, 200-count",
        description: "Blue lint-free shop towels, center-pull box.",
        category: "janitorial",
        retail_cents: 2199,
        wholesale_cents: 1575,
        moq: 8,
        stock: 2600,
    },
    SeedProduct {
        sku: "PAL-WRP-18",
        name: "Stretch Wrap, 18in x 1500ft",
        description: "80-gauge hand stretch wrap, 4 rolls per case.",
        category: "packaging",
        retail_cents: 5899,
        wholesale_cents: 4300,
        moq: 2,
        stock: 430,
    },
    SeedProduct {
        sku: "MSK-N95-20",
        name: "N95 Respirators, 20-count",
        description: "NIOSH-approved N95 particulate respirators.",
        category: "safety",
        retail_cents: 2750,
        wholesale_cents: 1950,
        moq: 10,
        stock: 3100,
    },
];

fn images_for(sku: &str) -> Vec<ProductImage> {
    (1..=3)
        .map(|n| ProductImage {
            url: format!("https://cdn.mercora.dev/catalog/{}/{n}.jpg", sku.to_lowercase()),
            storage_id: None,
        })
        .collect()
}

async fn seed_catalog(store: &PostgresStore) -> Result<usize> {
    let existing = store
        .list_products(&Default::default())
        .await
        .context("listing products")?;
    let existing_skus: std::collections::HashSet<&str> =
        existing.iter().map(|p| p.sku()).collect();

    let mut inserted = 0;
    for item in CATALOG {
        if existing_skus.contains(item.sku) {
            continue;
        }
        let product = Product::create(CreateProduct {
            sku: item.sku.to_string(),
            name: item.name.to_string(),
            description: item.description.to_string(),
            category: item.category.to_string(),
            retail_price: Money::new(Decimal::new(item.retail_cents, 2)),
            wholesale_price: Money::new(Decimal::new(item.wholesale_cents, 2)),
            moq: item.moq,
            stock_quantity: item.stock,
            images: images_for(item.sku),
            occurred_at: Utc::now(),
        })
        .with_context(|| format!("building product {}", item.sku))?;
        store
            .insert_product(&product)
            .await
            .with_context(|| format!("inserting product {}", item.sku))?;
        inserted += 1;
    }
    Ok(inserted)
}

async fn seed_accounts(store: &PostgresStore) -> Result<()> {
    let retail_email = "retail@demo.mercora.dev";
    if store
        .find_account_by_email(retail_email)
        .await
        .context("looking up retail demo account")?
        .is_none()
    {
        let account = Account::register(RegisterAccount {
            account_id: AccountId::new(),
            email: retail_email.to_string(),
            display_name: "Retail Demo".to_string(),
            occurred_at: Utc::now(),
        })?;
        store.insert_account(&account).await?;
        tracing::info!(email = retail_email, "seeded retail demo account");
    }

    let wholesale_email = "wholesale@demo.mercora.dev";
    if store
        .find_account_by_email(wholesale_email)
        .await
        .context("looking up wholesale demo account")?
        .is_none()
    {
        let mut account = Account::register(RegisterAccount {
            account_id: AccountId::new(),
            email: wholesale_email.to_string(),
            display_name: "Wholesale Demo".to_string(),
            occurred_at: Utc::now(),
        })?;
        let mut application = WholesaleApplication::submit(SubmitApplication {
            account_id: account.id(),
            details: BusinessDetails {
                business_name: "Demo Distribution LLC".to_string(),
                tax_id: "98-7654321".to_string(),
                business_type: "distributor".to_string(),
                street: "200 Warehouse Pkwy".to_string(),
                city: "Reno".to_string(),
                state: "NV".to_string(),
                zip: "89502".to_string(),
                phone: "555-0142".to_string(),
            },
            occurred_at: Utc::now(),
        })?;
        application.approve(Utc::now())?;
        account.grant_wholesale();

        store.insert_account(&account).await?;
        store.insert_application(&application).await?;
        tracing::info!(email = wholesale_email, "seeded approved wholesale demo account");
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    mercora_observability::init();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let store = PostgresStore::connect(&database_url)
        .await
        .context("connecting to Postgres")?;
    store.migrate().await.context("applying migrations")?;

    let inserted = seed_catalog(&store).await?;
    seed_accounts(&store).await?;

    tracing::info!(inserted, "seed complete");
    Ok(())
}
