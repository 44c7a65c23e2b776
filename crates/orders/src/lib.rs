//! Order domain.
//!
//! An order is a snapshot: lines carry the unit price captured at checkout
//! and the totals are computed once, at creation. After that only the status
//! moves, and only forward.

pub mod order;

pub use order::{
    CreateOrder, Order, OrderId, OrderLine, OrderState, OrderStatus, ShippingAddress, StatusChange,
};
