//! Shared types for the Alpaca market data and trading APIs
//!
//! This crate provides the core type definitions used across the SDK.
//! It has minimal dependencies and can be used independently.
//!
//! # Key Types
//!
//! - [`ChannelKind`], [`Feed`] - Subscription enums
//! - [`Record`] - Decoded domain record with typed accessors
//! - [`codec`] - Wire field-code to long-name remapping
//! - [`StreamFrame`] - Parsed stream frame
//! - [`AlpacaError`] - Error types
//! - [`StreamErrorCode`] - Numeric stream error-code table
//! - [`Credentials`] - API credentials with zeroized secrets

pub mod codec;
pub mod credentials;
pub mod enums;
pub mod error;
pub mod error_codes;
pub mod messages;
pub mod record;

// Re-export commonly used types
pub use codec::*;
pub use credentials::*;
pub use enums::*;
pub use error::*;
pub use error_codes::*;
pub use messages::*;
pub use record::*;

// Re-export rust_decimal for users
pub use rust_decimal::Decimal;
