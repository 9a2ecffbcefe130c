//! Threshold secret sharing of ring elements, as used in the multiparty
//! homomorphic encryption schemes of Christian Mouchet, Elliott Bertrand and
//! Jean-Pierre Hubaux in [An Efficient Threshold Access-Structure for
//! RLWE-Based Multiparty Homomorphic Encryption](https://eprint.iacr.org/2022/780).
//!
//! A dealer samples a [`ShamirPolynomial`] whose constant coefficient is its
//! secret, and sends to every party the evaluation of the polynomial at the
//! [`ShamirPublicPoint`] of that party. When every party deals a share of its
//! own secret, the sum of the shares a party receives is a share of the sum
//! of the secrets, so no trusted dealer is needed. Any `threshold` parties can
//! then run a [`Combiner`] to turn their shares into additive shares of that
//! sum.
//!
//! All the arithmetic is done limb by limb over a
//! [`ModulusChain`](fhe_math::rq::ModulusChain): either the ciphertext moduli
//! `Q` or the moduli `QP` used by key-switching keys.

mod combiner;
mod shares;
mod thresholdizer;

pub use combiner::{Combiner, CombinerQ, CombinerQP};
pub use shares::{
    ShamirPolynomial, ShamirPolynomialQ, ShamirPolynomialQP, ShamirPublicPoint,
    ShamirSecretShare, ShamirSecretShareQ, ShamirSecretShareQP,
};
pub use thresholdizer::{Thresholdizer, ThresholdizerQ, ThresholdizerQP};
