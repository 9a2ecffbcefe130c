//! Public points, Shamir polynomials and secret shares.

use crate::{Error, Result};
use fhe_math::rq::{ModulusChain, RingQ, RingQP};
use fhe_traits::Serialize;
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};
use std::fmt::{self, Debug, Display};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Public identity of a party, used as the evaluation point of Shamir
/// polynomials. Never zero.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, SerdeSerialize, SerdeDeserialize,
)]
#[serde(try_from = "u64", into = "u64")]
pub struct ShamirPublicPoint(u64);

impl ShamirPublicPoint {
    /// Creates a public point. Returns an error if `point` is zero.
    pub fn new(point: u64) -> Result<Self> {
        if point == 0 {
            return Err(Error::InvalidPublicPoint(point));
        }
        Ok(Self(point))
    }

    /// Returns the value of the point.
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for ShamirPublicPoint {
    type Error = Error;

    fn try_from(point: u64) -> Result<Self> {
        Self::new(point)
    }
}

impl From<ShamirPublicPoint> for u64 {
    fn from(point: ShamirPublicPoint) -> Self {
        point.0
    }
}

impl Display for ShamirPublicPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A polynomial of degree `threshold - 1` with ring element coefficients,
/// whose constant coefficient is the shared secret.
///
/// The coefficients are zeroized on drop and never printed.
pub struct ShamirPolynomial<C: ModulusChain> {
    pub(crate) coefficients: Vec<C::Element>,
}

/// A Shamir polynomial over the ciphertext moduli.
pub type ShamirPolynomialQ = ShamirPolynomial<RingQ>;

/// A Shamir polynomial over the ciphertext and auxiliary moduli.
pub type ShamirPolynomialQP = ShamirPolynomial<RingQP>;

impl<C: ModulusChain> ShamirPolynomial<C> {
    /// Number of shares needed to reconstruct the secret.
    pub fn threshold(&self) -> usize {
        self.coefficients.len()
    }
}

impl<C: ModulusChain> Debug for ShamirPolynomial<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShamirPolynomial")
            .field("threshold", &self.threshold())
            .finish_non_exhaustive()
    }
}

impl<C: ModulusChain> Zeroize for ShamirPolynomial<C> {
    fn zeroize(&mut self) {
        self.coefficients.iter_mut().for_each(|c| c.zeroize())
    }
}

impl<C: ModulusChain> Drop for ShamirPolynomial<C> {
    fn drop(&mut self) {
        self.zeroize()
    }
}

impl<C: ModulusChain> ZeroizeOnDrop for ShamirPolynomial<C> {}

/// The evaluation of a Shamir polynomial at a public point, or the sum of such
/// evaluations for polynomials of several dealers.
#[derive(Clone, PartialEq, Eq)]
pub struct ShamirSecretShare<C: ModulusChain> {
    pub(crate) value: C::Element,
}

/// A secret share over the ciphertext moduli.
pub type ShamirSecretShareQ = ShamirSecretShare<RingQ>;

/// A secret share over the ciphertext and auxiliary moduli.
pub type ShamirSecretShareQP = ShamirSecretShare<RingQP>;

impl<C: ModulusChain> ShamirSecretShare<C> {
    /// Wraps a ring element as a share.
    pub fn new(value: C::Element) -> Self {
        Self { value }
    }

    /// Returns the underlying ring element.
    pub fn value(&self) -> &C::Element {
        &self.value
    }

    /// Level of the share in `chain`.
    pub fn level(&self, chain: &C) -> Result<C::Level> {
        Ok(chain.level_of(&self.value)?)
    }

    /// Decodes a share at a given level of `chain`. Returns an error if the
    /// length of `bytes` does not match the encoding of an element at that
    /// level.
    pub fn from_bytes(bytes: &[u8], chain: &C, level: C::Level) -> Result<Self> {
        Ok(Self {
            value: chain.element_from_bytes(bytes, level)?,
        })
    }
}

impl<C: ModulusChain> Debug for ShamirSecretShare<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShamirSecretShare").finish_non_exhaustive()
    }
}

impl<C: ModulusChain> Serialize for ShamirSecretShare<C> {
    /// The encoding of the underlying ring element, without any header.
    fn to_bytes(&self) -> Vec<u8> {
        self.value.to_bytes()
    }
}

impl<C: ModulusChain> Zeroize for ShamirSecretShare<C> {
    fn zeroize(&mut self) {
        self.value.zeroize()
    }
}
