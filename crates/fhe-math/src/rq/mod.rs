#![warn(missing_docs, unused_imports)]

//! Polynomials in R_q\[x\] = (ZZ_q1 x ... x ZZ_qn)\[x\] where the qi's are
//! prime moduli in zq.
//!
//! Polynomials are kept in residue number system: one row of coefficients per
//! modulus. Every operation in this module works limb by limb and never lifts
//! to a big integer.

mod chain;
mod context;
mod ringqp;
mod scalar;
pub mod traits;

pub use chain::{ModulusChain, RingQ};
pub use context::Context;
pub use ringqp::{PolyQP, RingQP};
pub use scalar::RnsScalar;

use self::traits::TryConvertFrom;
use crate::{Error, Result};
use fhe_traits::{DeserializeWithContext, Serialize};
use itertools::izip;
use ndarray::{Array2, ArrayView2};
use rand::{CryptoRng, RngCore};
use std::{ops::AddAssign, sync::Arc};
use zeroize::Zeroize;

/// Struct that holds a polynomial for a specific context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Poly {
    ctx: Arc<Context>,
    coefficients: Array2<u64>,
}

impl Zeroize for Poly {
    fn zeroize(&mut self) {
        self.coefficients.iter_mut().for_each(|c| c.zeroize());
    }
}

impl AsRef<Poly> for Poly {
    fn as_ref(&self) -> &Poly {
        self
    }
}

impl AsMut<Poly> for Poly {
    fn as_mut(&mut self) -> &mut Poly {
        self
    }
}

impl Poly {
    /// Creates a polynomial holding the constant 0.
    pub fn zero(ctx: &Arc<Context>) -> Self {
        Self {
            ctx: ctx.clone(),
            coefficients: Array2::zeros((ctx.q.len(), ctx.degree)),
        }
    }

    /// Generate a random polynomial, uniform in every limb.
    pub fn random<R: RngCore + CryptoRng>(ctx: &Arc<Context>, rng: &mut R) -> Self {
        let mut p = Poly::zero(ctx);
        izip!(p.coefficients.outer_iter_mut(), ctx.q.iter()).for_each(|(mut v, qi)| {
            let r = qi.random_vec(ctx.degree, rng);
            izip!(v.iter_mut(), r.iter()).for_each(|(vi, ri)| *vi = *ri);
        });
        p
    }

    /// Access the polynomial coefficients, one row per modulus.
    pub fn coefficients(&self) -> ArrayView2<'_, u64> {
        self.coefficients.view()
    }

    /// Returns the context of the underlying polynomial.
    pub fn ctx(&self) -> &Arc<Context> {
        &self.ctx
    }

    /// Returns the level of the polynomial, i.e. the index of the last modulus
    /// of its context.
    pub fn level(&self) -> usize {
        self.ctx.level()
    }

    /// Multiplies the polynomial in place by a scalar given in residue number
    /// system and in Montgomery form: limb `i` is multiplied by `scalar[i]`.
    ///
    /// The scalar may hold more limbs than the polynomial; the extra limbs are
    /// ignored. Returns an error if it holds fewer.
    pub fn mul_rns_scalar_montgomery(&mut self, scalar: &[u64]) -> Result<()> {
        if scalar.len() < self.ctx.q.len() {
            return Err(Error::LevelMismatch(format!(
                "scalar with {} limbs cannot multiply a polynomial with {} limbs",
                scalar.len(),
                self.ctx.q.len()
            )));
        }
        izip!(
            self.coefficients.outer_iter_mut(),
            self.ctx.q.iter(),
            scalar.iter()
        )
        .for_each(|(mut v, qi, si)| {
            v.iter_mut()
                .for_each(|vi| *vi = qi.mul_montgomery(*vi, *si))
        });
        Ok(())
    }

    /// Computes `out = a + b`. All three polynomials must share the same context.
    pub fn add_to(a: &Poly, b: &Poly, out: &mut Poly) -> Result<()> {
        if a.ctx != b.ctx || a.ctx != out.ctx {
            return Err(Error::LevelMismatch(format!(
                "cannot add polynomials at levels {} and {} into level {}",
                a.level(),
                b.level(),
                out.level()
            )));
        }
        out.coefficients.assign(&a.coefficients);
        *out += b;
        Ok(())
    }
}

impl AddAssign<&Poly> for Poly {
    fn add_assign(&mut self, p: &Poly) {
        assert_eq!(self.ctx, p.ctx, "Incompatible contexts");
        izip!(
            self.coefficients.outer_iter_mut(),
            p.coefficients.outer_iter(),
            self.ctx.q.iter()
        )
        .for_each(|(mut v1, v2, qi)| {
            izip!(v1.iter_mut(), v2.iter()).for_each(|(a, b)| *a = qi.add(*a, *b))
        });
    }
}

impl Serialize for Poly {
    /// The coefficients of every limb, in order, as little-endian `u64`.
    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(8 * self.coefficients.len());
        self.coefficients
            .iter()
            .for_each(|c| bytes.extend_from_slice(&c.to_le_bytes()));
        bytes
    }
}

impl DeserializeWithContext for Poly {
    type Error = Error;
    type Context = Context;

    fn from_bytes(bytes: &[u8], ctx: &Arc<Context>) -> Result<Self> {
        let expected = 8 * ctx.degree * ctx.q.len();
        if bytes.len() != expected {
            return Err(Error::Serialization(format!(
                "Invalid polynomial serialization: expected {expected} bytes, found {}",
                bytes.len()
            )));
        }

        let mut coefficients = Vec::with_capacity(ctx.degree * ctx.q.len());
        for chunk in bytes.chunks_exact(8) {
            let c = <[u8; 8]>::try_from(chunk)
                .map_err(|_| Error::Serialization("Invalid coefficient".to_string()))?;
            coefficients.push(u64::from_le_bytes(c));
        }
        let coefficients = Array2::from_shape_vec((ctx.q.len(), ctx.degree), coefficients)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        Poly::try_convert_from(coefficients, ctx)
            .map_err(|e| Error::Serialization(format!("Invalid polynomial serialization: {e}")))
    }
}
