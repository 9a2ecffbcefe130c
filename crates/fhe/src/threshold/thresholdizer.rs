//! Dealing of Shamir secret shares of ring elements.

use super::{ShamirPolynomial, ShamirPublicPoint, ShamirSecretShare};
use crate::{rlwe::RlweParameters, Error, Result};
use fhe_math::rq::{ModulusChain, RingQ, RingQP, RnsScalar};
use rand::{CryptoRng, RngCore};
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, trace};
use zeroize::Zeroize;

/// Generates Shamir polynomials of ring elements and evaluates them at the
/// public points of the recipients.
#[derive(Debug, Clone)]
pub struct Thresholdizer<C: ModulusChain> {
    chain: C,
}

/// A thresholdizer over the ciphertext moduli.
pub type ThresholdizerQ = Thresholdizer<RingQ>;

/// A thresholdizer over the ciphertext and auxiliary moduli, for secrets used
/// in key-switching keys.
pub type ThresholdizerQP = Thresholdizer<RingQP>;

impl Thresholdizer<RingQ> {
    /// Creates a thresholdizer over the ciphertext moduli of `par`.
    pub fn from_parameters(par: &Arc<RlweParameters>) -> Self {
        Self::new(par.ring_q().clone())
    }
}

impl Thresholdizer<RingQP> {
    /// Creates a thresholdizer over the ciphertext and auxiliary moduli of
    /// `par`.
    pub fn from_parameters(par: &Arc<RlweParameters>) -> Self {
        Self::new(par.ring_qp().clone())
    }
}

impl<C: ModulusChain> Thresholdizer<C> {
    /// Creates a thresholdizer over `chain`.
    pub fn new(chain: C) -> Self {
        Self { chain }
    }

    /// Returns the modulus chain of the thresholdizer.
    pub fn chain(&self) -> &C {
        &self.chain
    }

    /// Generates a Shamir polynomial with `threshold` coefficients: `secret`
    /// followed by `threshold - 1` uniformly random elements at the level of
    /// `secret`.
    pub fn gen_shamir_polynomial<R: RngCore + CryptoRng>(
        &self,
        threshold: usize,
        secret: &C::Element,
        rng: &mut R,
    ) -> Result<ShamirPolynomial<C>> {
        if threshold < 1 {
            return Err(Error::InvalidThreshold(threshold));
        }
        let level = self.chain.level_of(secret)?;

        let mut poly = ShamirPolynomial {
            coefficients: Vec::with_capacity(threshold),
        };
        poly.coefficients.push(secret.clone());
        for _ in 1..threshold {
            poly.coefficients.push(self.chain.random_at(level, rng)?);
        }

        debug!(threshold, ?level, "generated Shamir polynomial");
        Ok(poly)
    }

    /// Allocates a zero share at a given level, to be filled by
    /// [`Thresholdizer::gen_shamir_secret_share`] or
    /// [`Thresholdizer::aggregate_shares`].
    pub fn allocate_share(&self, level: C::Level) -> Result<ShamirSecretShare<C>> {
        Ok(ShamirSecretShare::new(self.chain.zero_at(level)?))
    }

    /// Evaluates `poly` at the public point of `recipient` into `share_out`.
    ///
    /// `share_out` must be at the level of the polynomial; it is left
    /// untouched on error.
    pub fn gen_shamir_secret_share(
        &self,
        recipient: ShamirPublicPoint,
        poly: &ShamirPolynomial<C>,
        share_out: &mut ShamirSecretShare<C>,
    ) -> Result<()> {
        let level = self.polynomial_level(poly)?;
        let out_level = self.chain.level_of(&share_out.value)?;
        if level != out_level {
            return Err(Error::LevelMismatch(format!(
                "share at level {out_level:?} for a polynomial at level {level:?}"
            )));
        }
        let value = self.evaluate(recipient, poly)?;
        share_out.value.zeroize();
        share_out.value = value;
        Ok(())
    }

    /// Evaluates `poly` at the public point of `recipient`.
    pub fn evaluate_share(
        &self,
        recipient: ShamirPublicPoint,
        poly: &ShamirPolynomial<C>,
    ) -> Result<ShamirSecretShare<C>> {
        self.polynomial_level(poly)?;
        Ok(ShamirSecretShare::new(self.evaluate(recipient, poly)?))
    }

    /// Evaluates `poly` at the public points of all the `recipients`, in
    /// parallel. The shares are returned in the order of `recipients`.
    pub fn gen_shamir_secret_shares(
        &self,
        recipients: &[ShamirPublicPoint],
        poly: &ShamirPolynomial<C>,
    ) -> Result<Vec<ShamirSecretShare<C>>> {
        self.polynomial_level(poly)?;
        let shares = recipients
            .par_iter()
            .map(|recipient| {
                self.evaluate(*recipient, poly)
                    .map(ShamirSecretShare::new)
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(
            recipients = recipients.len(),
            threshold = poly.threshold(),
            "generated Shamir secret shares"
        );
        Ok(shares)
    }

    /// Computes `share_out = share1 + share2`. All three shares must be at the
    /// same level; `share_out` is left untouched on error.
    ///
    /// Shares are not tracked by dealer: aggregating the same dealer's share
    /// twice counts its secret twice, so callers must deduplicate.
    pub fn aggregate_shares(
        &self,
        share1: &ShamirSecretShare<C>,
        share2: &ShamirSecretShare<C>,
        share_out: &mut ShamirSecretShare<C>,
    ) -> Result<()> {
        let level1 = self.chain.level_of(&share1.value)?;
        let level2 = self.chain.level_of(&share2.value)?;
        let out_level = self.chain.level_of(&share_out.value)?;
        if level1 != level2 || level1 != out_level {
            return Err(Error::LevelMismatch(format!(
                "shares at levels {level1:?} and {level2:?} aggregated into a share at level {out_level:?}"
            )));
        }
        self.chain
            .add(&share1.value, &share2.value, &mut share_out.value)?;
        trace!(level = ?level1, "aggregated shares");
        Ok(())
    }

    /// Computes `acc += share`. Both shares must be at the same level; `acc`
    /// is left untouched on error.
    pub fn aggregate_shares_assign(
        &self,
        acc: &mut ShamirSecretShare<C>,
        share: &ShamirSecretShare<C>,
    ) -> Result<()> {
        let level = self.chain.level_of(&acc.value)?;
        let other_level = self.chain.level_of(&share.value)?;
        if level != other_level {
            return Err(Error::LevelMismatch(format!(
                "share at level {other_level:?} aggregated into a share at level {level:?}"
            )));
        }
        self.chain.add_assign(&mut acc.value, &share.value)?;
        trace!(?level, "aggregated shares");
        Ok(())
    }

    /// Level of the coefficients of `poly`, which must all agree.
    fn polynomial_level(&self, poly: &ShamirPolynomial<C>) -> Result<C::Level> {
        let (first, rest) = poly
            .coefficients
            .split_first()
            .ok_or(Error::InvalidThreshold(0))?;
        let level = self.chain.level_of(first)?;
        for c in rest {
            let l = self.chain.level_of(c)?;
            if l != level {
                return Err(Error::LevelMismatch(format!(
                    "Shamir polynomial with coefficients at levels {level:?} and {l:?}"
                )));
            }
        }
        Ok(level)
    }

    /// Maps a public point to a scalar in Montgomery form. Points that vanish
    /// modulo some limb of the chain would reveal the secret in that limb.
    fn public_point_scalar(&self, point: ShamirPublicPoint) -> Result<RnsScalar> {
        let x = self.chain.rns_scalar_from_u64(point.value());
        if x.limbs().iter().any(|xi| *xi == 0) {
            return Err(Error::InvalidPublicPoint(point.value()));
        }
        Ok(self.chain.mform_rns_scalar(&x))
    }

    /// Horner evaluation of `poly` at `point`, limb by limb.
    fn evaluate(
        &self,
        point: ShamirPublicPoint,
        poly: &ShamirPolynomial<C>,
    ) -> Result<C::Element> {
        let x = self.public_point_scalar(point)?;
        let (last, rest) = poly
            .coefficients
            .split_last()
            .ok_or(Error::InvalidThreshold(0))?;

        let mut acc = last.clone();
        let evaluated = rest.iter().rev().try_for_each(|c| {
            self.chain.mul_rns_scalar_montgomery_assign(&mut acc, &x)?;
            self.chain.add_assign(&mut acc, c)
        });
        if let Err(e) = evaluated {
            acc.zeroize();
            return Err(e.into());
        }
        trace!(recipient = point.value(), "evaluated Shamir polynomial");
        Ok(acc)
    }
}
