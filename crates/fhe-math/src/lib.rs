#![crate_name = "fhe_math"]
#![crate_type = "lib"]
#![warn(missing_docs, unused_imports)]

//! Mathematical utilities for the fhe.rs library.
//!
//! This crate is the ring arithmetic layer of the library: arithmetic modulo
//! word-sized primes (with Montgomery multiplication) in [`zq`], and
//! polynomials in residue number system over chains of such primes in [`rq`].

mod errors;

pub mod rq;
pub mod zq;

pub use errors::{Error, Result};
