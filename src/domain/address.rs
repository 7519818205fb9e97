use crate::application::{AppError, AppResult};

/// Ledger addresses are 20 bytes, hex encoded.
pub const ADDRESS_BYTES: usize = 20;

/// Checks that `address` is a 40 character hex string.
pub fn validate_address(address: &str) -> AppResult<()> {
    match hex::decode(address) {
        Ok(bytes) if bytes.len() == ADDRESS_BYTES => Ok(()),
        _ => Err(AppError::InvalidAddress(address.to_string())),
    }
}
