//! Error types for edit planning

use casemap_model::{Address, AddressError};

/// Raw widget payload could not become a typed operation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OperationError {
    /// Payload is not valid JSON or has an unknown shape
    #[error("invalid operation payload: {0}")]
    InvalidPayload(String),

    /// Operation name is not handled by the mind-map
    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    /// Edited or target node carries no id
    #[error("operation {operation} has no target node")]
    MissingTarget {
        /// Operation name
        operation: &'static str,
    },

    /// Node id is not a valid address
    #[error("malformed address {address}: {source}")]
    MalformedAddress {
        /// Raw id
        address: String,
        /// Decode failure
        #[source]
        source: AddressError,
    },
}

/// A reparent operation whose target module cannot be derived
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no target module can be resolved from {target}")]
pub struct UnresolvedTarget {
    /// Target node of the drop
    pub target: Address,
}
