//! Manipi Core - Shared types library.
//!
//! This crate provides common types used across all Manipi cart components:
//! - `cart` - The cart state manager library
//! - `cli` - Command-line tool for driving cart sessions
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps
//! it lightweight and allows it to be used anywhere, including hosts that
//! never touch the network.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe product and variant IDs

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
