//! Parameters and secret keys of RLWE-based schemes.

mod parameters;
mod secret_key;

pub use parameters::{RlweParameters, RlweParametersBuilder};
pub use secret_key::SecretKey;
