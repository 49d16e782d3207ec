//! Types library for the margin authorization layer
//!
//! Data model for the two signed instruments of the margin protocol and
//! the error taxonomy shared by every crate in the workspace.
//!
//! # Modules
//! - `ids`: Wildcard taker sentinel and short position identifiers
//! - `loan`: Loan offerings and their rate terms
//! - `order`: Exchange orders
//! - `signature`: Recoverable `{v, r, s}` signatures
//! - `errors`: Error taxonomy

pub mod errors;
pub mod ids;
pub mod loan;
pub mod order;
pub mod signature;

pub use alloy_primitives::{Address, B256, U256};

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::errors::*;
    pub use crate::ids::*;
    pub use crate::loan::*;
    pub use crate::order::*;
    pub use crate::signature::*;
    pub use alloy_primitives::{Address, B256, U256};
}
