//! Floating Cart Core - Shared cart types.
//!
//! This crate provides the types shared by every Floating Cart component:
//! - `store` - Cart state container with key-value persistence
//! - `cli` - Command-line front end for the cart
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no storage
//! access, no async runtime. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for product IDs and prices, plus cart line items

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
