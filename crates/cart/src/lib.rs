//! Shopping cart domain.
//!
//! Carts hold product references and quantities, nothing priced: prices are
//! computed from the live catalog every time a cart is read, so a price
//! change lands in every open cart at once.

pub mod cart;

pub use cart::{Cart, CartLine, CartLineId};
