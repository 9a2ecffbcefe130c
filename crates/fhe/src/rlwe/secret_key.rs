//! Secret keys for RLWE-based schemes

use crate::rlwe::RlweParameters;
use crate::{Error, Result};
use fhe_math::rq::{traits::TryConvertFrom, Poly, PolyQP};
use fhe_traits::FheParametrized;
use fhe_util::sample_vec_cbd;
use rand::{CryptoRng, RngCore};
use std::sync::Arc;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Secret key of an RLWE-based scheme.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SecretKey {
    /// The RLWE parameters
    pub(crate) par: Arc<RlweParameters>,
    /// The secret key coefficients
    pub coeffs: Box<[i64]>,
}

impl Zeroize for SecretKey {
    fn zeroize(&mut self) {
        self.coeffs.zeroize();
    }
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.zeroize()
    }
}

impl ZeroizeOnDrop for SecretKey {}

impl FheParametrized for SecretKey {
    type Parameters = RlweParameters;
}

impl SecretKey {
    /// The variance used for secret key sampling
    pub const SK_VARIANCE: f32 = 0.5;

    /// Generate a random [`SecretKey`] with ternary coefficients.
    pub fn random<R: RngCore + CryptoRng>(par: &Arc<RlweParameters>, rng: &mut R) -> Result<Self> {
        let s_coefficients = sample_vec_cbd(par.degree(), Self::SK_VARIANCE, rng)
            .map_err(|e| Error::DefaultError(e.to_string()))?;
        Self::new(s_coefficients, par)
    }

    /// Generate a [`SecretKey`] from its coefficients.
    pub fn new(coeffs: Vec<i64>, par: &Arc<RlweParameters>) -> Result<Self> {
        if coeffs.len() != par.degree() {
            let found = coeffs.len();
            drop(Zeroizing::new(coeffs));
            return Err(Error::DefaultError(format!(
                "Expected {} coefficients, found {found}",
                par.degree(),
            )));
        }
        Ok(Self {
            par: par.clone(),
            coeffs: coeffs.into_boxed_slice(),
        })
    }

    /// Returns the secret as a polynomial over the ciphertext moduli up to
    /// `level`.
    pub fn to_poly_q(&self, level: usize) -> Result<Zeroizing<Poly>> {
        let ctx = self.par.ctx_at_level(level)?;
        Ok(Zeroizing::new(Poly::try_convert_from(
            self.coeffs.as_ref(),
            &ctx,
        )?))
    }

    /// Returns the secret as a polynomial over all the ciphertext moduli
    /// followed by all the auxiliary moduli.
    pub fn to_poly_qp(&self) -> Result<Zeroizing<PolyQP>> {
        let ring_qp = self.par.ring_qp();
        let q = Poly::try_convert_from(self.coeffs.as_ref(), ring_qp.ring_q())?;
        let p = match ring_qp.ring_p() {
            Some(ctx_p) => Some(Poly::try_convert_from(self.coeffs.as_ref(), ctx_p)?),
            None => None,
        };
        Ok(Zeroizing::new(PolyQP { q, p }))
    }
}
