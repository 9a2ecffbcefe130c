//! Reconstruction of additive shares from Shamir secret shares.

use super::{ShamirPublicPoint, ShamirSecretShare};
use crate::{rlwe::RlweParameters, Error, Result};
use fhe_math::rq::{ModulusChain, RingQ, RingQP, RnsScalar};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;
use zeroize::Zeroize;

/// Turns the Shamir secret share of a party into an additive share of the
/// secret among the parties of a quorum.
///
/// For every other party `j`, the combiner precomputes the Lagrange factor
/// `x_j / (x_j - x_own)` in Montgomery form. The additive share of the party
/// is its Shamir share multiplied by the product of the factors of the other
/// members of the quorum, so that the additive shares of the quorum sum to
/// the secret.
#[derive(Debug, Clone)]
pub struct Combiner<C: ModulusChain> {
    chain: C,
    own: ShamirPublicPoint,
    threshold: usize,
    one: RnsScalar,
    tmp: RnsScalar,
    lagrange_coeffs: BTreeMap<ShamirPublicPoint, RnsScalar>,
}

/// A combiner over the ciphertext moduli.
pub type CombinerQ = Combiner<RingQ>;

/// A combiner over the ciphertext and auxiliary moduli.
pub type CombinerQP = Combiner<RingQP>;

impl Combiner<RingQ> {
    /// Creates a combiner over the ciphertext moduli of `par`.
    pub fn from_parameters(
        par: &Arc<RlweParameters>,
        own: ShamirPublicPoint,
        others: &[ShamirPublicPoint],
        threshold: usize,
    ) -> Result<Self> {
        Self::new(par.ring_q().clone(), own, others, threshold)
    }
}

impl Combiner<RingQP> {
    /// Creates a combiner over the ciphertext and auxiliary moduli of `par`.
    pub fn from_parameters(
        par: &Arc<RlweParameters>,
        own: ShamirPublicPoint,
        others: &[ShamirPublicPoint],
        threshold: usize,
    ) -> Result<Self> {
        Self::new(par.ring_qp().clone(), own, others, threshold)
    }
}

impl<C: ModulusChain> Combiner<C> {
    /// Creates a combiner for the party at `own`, precomputing the Lagrange
    /// factors of all the `others` (`own` is skipped if present).
    ///
    /// Returns an error if `threshold` is zero, or if some other point is
    /// equal to `own` modulo a limb of the chain.
    pub fn new(
        chain: C,
        own: ShamirPublicPoint,
        others: &[ShamirPublicPoint],
        threshold: usize,
    ) -> Result<Self> {
        if threshold < 1 {
            return Err(Error::InvalidThreshold(threshold));
        }

        let this = chain.mform_rns_scalar(&chain.rns_scalar_from_u64(own.value()));
        let mut lagrange_coeffs = BTreeMap::new();
        for other in others.iter().filter(|other| **other != own) {
            let that = chain.mform_rns_scalar(&chain.rns_scalar_from_u64(other.value()));
            let diff = chain.sub_rns_scalar(&that, &this);
            let inv = chain
                .inverse_rns_scalar_montgomery(&diff)
                .ok_or(Error::InvalidPublicPoint(other.value()))?;
            lagrange_coeffs.insert(*other, chain.mul_rns_scalar_montgomery(&inv, &that));
        }

        debug!(
            own = own.value(),
            others = lagrange_coeffs.len(),
            threshold,
            "built Shamir combiner"
        );
        Ok(Self {
            one: chain.one_montgomery(),
            tmp: chain.new_rns_scalar(),
            chain,
            own,
            threshold,
            lagrange_coeffs,
        })
    }

    /// Returns the modulus chain of the combiner.
    pub fn chain(&self) -> &C {
        &self.chain
    }

    /// Returns the number of parties needed to reconstruct a secret.
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Returns the precomputed Lagrange factor of `point`, in Montgomery form.
    pub fn lagrange_coefficient(&self, point: ShamirPublicPoint) -> Option<&RnsScalar> {
        self.lagrange_coeffs.get(&point)
    }

    /// Computes into `out` the additive share of the party at `own` for the
    /// quorum made of the first `threshold` points of `actives`.
    ///
    /// Every member of the quorum must use the same order of `actives` so
    /// that all of them combine over the same quorum. Returns an error,
    /// leaving `out` untouched, if `own` is not the point the combiner was
    /// built for, if the quorum is too small, contains a duplicate or an
    /// unknown point, or does not contain `own`, or if the levels of
    /// `own_share` and `out` differ.
    pub fn gen_additive_share(
        &mut self,
        actives: &[ShamirPublicPoint],
        own: ShamirPublicPoint,
        own_share: &ShamirSecretShare<C>,
        out: &mut C::Element,
    ) -> Result<()> {
        let quorum = self.quorum(actives, own)?;

        let share_level = self.chain.level_of(&own_share.value)?;
        let out_level = self.chain.level_of(out)?;
        if share_level != out_level {
            return Err(Error::LevelMismatch(format!(
                "additive share at level {out_level:?} for a Shamir share at level {share_level:?}"
            )));
        }

        self.tmp.copy_from(&self.one);
        for point in quorum.iter().filter(|point| **point != own) {
            let coeff = self
                .lagrange_coeffs
                .get(point)
                .ok_or(Error::UnknownPublicPoint(point.value()))?;
            self.chain
                .mul_rns_scalar_montgomery_in_place(&mut self.tmp, coeff);
        }

        let mut value = own_share.value.clone();
        if let Err(e) = self
            .chain
            .mul_rns_scalar_montgomery_assign(&mut value, &self.tmp)
        {
            value.zeroize();
            return Err(e.into());
        }
        out.zeroize();
        *out = value;

        debug!(
            own = own.value(),
            quorum = quorum.len(),
            level = ?share_level,
            "combined additive share"
        );
        Ok(())
    }

    /// Returns the additive share of the party at `own` for the quorum made of
    /// the first `threshold` points of `actives`. See
    /// [`Combiner::gen_additive_share`].
    pub fn additive_share(
        &mut self,
        actives: &[ShamirPublicPoint],
        own: ShamirPublicPoint,
        own_share: &ShamirSecretShare<C>,
    ) -> Result<C::Element> {
        self.quorum(actives, own)?;
        let mut out = self.chain.zero_at(self.chain.level_of(&own_share.value)?)?;
        self.gen_additive_share(actives, own, own_share, &mut out)?;
        Ok(out)
    }

    /// Validates the quorum and returns it.
    fn quorum<'a>(
        &self,
        actives: &'a [ShamirPublicPoint],
        own: ShamirPublicPoint,
    ) -> Result<&'a [ShamirPublicPoint]> {
        if actives.len() < self.threshold {
            return Err(Error::InsufficientParties(actives.len(), self.threshold));
        }
        if own != self.own {
            return Err(Error::UnknownPublicPoint(own.value()));
        }
        let quorum = &actives[..self.threshold];

        let mut seen = BTreeSet::new();
        for point in quorum {
            if !seen.insert(*point) {
                return Err(Error::DuplicatePublicPoint(point.value()));
            }
            if *point != own && !self.lagrange_coeffs.contains_key(point) {
                return Err(Error::UnknownPublicPoint(point.value()));
            }
        }
        if !seen.contains(&own) {
            return Err(Error::PublicPointNotInQuorum(own.value()));
        }
        Ok(quorum)
    }
}
