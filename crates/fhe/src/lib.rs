#![crate_name = "fhe"]
#![crate_type = "lib"]
#![warn(missing_docs, unused_imports)]

//! Threshold secret sharing of RLWE secrets for the fhe.rs library.
//!
//! The [`threshold`] module implements `t`-out-of-`N` Shamir secret sharing of
//! ring elements, as used to build threshold variants of RLWE-based
//! encryption schemes: a [`threshold::Thresholdizer`] deals shares of a secret
//! key, and a [`threshold::Combiner`] turns the share of an active party into
//! an additive share of that key. The [`rlwe`] module holds the parameters and
//! secret keys the shares are derived from.

mod errors;

pub mod rlwe;
pub mod threshold;

pub use errors::{Error, ParametersError, Result};
