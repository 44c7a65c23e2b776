//! Catalog domain.
//!
//! Business rules for products, implemented purely as deterministic domain
//! logic (no IO, no HTTP, no storage).

pub mod product;

pub use product::{
    CreateProduct, Product, ProductFilter, ProductId, ProductImage, ProductState, UpdateProduct,
};
