//! Read-only blockchain access consumed by contract-account validation.

use crate::address::Address;
use crate::error::ChainError;

/// Read-only view of an EVM chain.
///
/// Both calls run against the latest block unless the implementation is
/// configured otherwise. The library never retries or times out these
/// calls; implementations that need bounded latency apply their own limits.
///
/// Implementations must be safe for concurrent read-only use, since a single
/// reader is shared by every validation running on an `EthAuth` instance.
///
/// # Example
///
/// ```
/// use ethauth::{Address, ChainError, ChainReader};
///
/// struct NoCode;
///
/// impl ChainReader for NoCode {
///     fn code_at(&self, _address: &Address) -> Result<Vec<u8>, ChainError> {
///         Ok(Vec::new())
///     }
///
///     fn call(&self, _to: &Address, _calldata: &[u8]) -> Result<Vec<u8>, ChainError> {
///         Err(ChainError::new("no contracts here"))
///     }
/// }
/// ```
pub trait ChainReader: Send + Sync {
    /// Returns the bytecode deployed at `address` (empty if none).
    ///
    /// # Errors
    ///
    /// Returns `ChainError` if the node cannot be queried.
    fn code_at(&self, address: &Address) -> Result<Vec<u8>, ChainError>;

    /// Executes a read-only call of `calldata` against `to` and returns the
    /// raw return data.
    ///
    /// # Errors
    ///
    /// Returns `ChainError` if the node cannot be queried or the call reverts.
    fn call(&self, to: &Address, calldata: &[u8]) -> Result<Vec<u8>, ChainError>;
}
