use super::{Context, Poly, RnsScalar};
use crate::{zq::Modulus, Error, Result};
use fhe_traits::{DeserializeWithContext, Serialize};
use itertools::izip;
use rand::{CryptoRng, RngCore};
use std::{fmt::Debug, sync::Arc};
use zeroize::Zeroize;

/// A chain of word-sized prime moduli over which ring elements are represented
/// limb by limb.
///
/// Code written against this trait does not depend on how limbs are stored or
/// how Montgomery reduction is implemented. Elements carry a level, i.e. how
/// much of the chain they use, and every element operation checks that its
/// operands are at the same level before touching any output.
///
/// Scalars produced by the provided methods hold one residue per modulus of
/// [`ModulusChain::moduli`].
pub trait ModulusChain: Debug + Clone + Send + Sync {
    /// Ring elements represented over this chain.
    type Element: Debug + Clone + PartialEq + Eq + Serialize + Zeroize + Send + Sync;

    /// Extent of the chain used by an element.
    type Level: Debug + Copy + PartialEq + Eq + Send + Sync;

    /// Modulus operators of the whole chain, limb by limb.
    fn moduli(&self) -> &[Modulus];

    /// Level of an element using the whole chain.
    fn max_level(&self) -> Self::Level;

    /// Level of an element. Returns an error if the element does not live on
    /// this chain.
    fn level_of(&self, element: &Self::Element) -> Result<Self::Level>;

    /// Allocates the zero element at a given level.
    fn zero_at(&self, level: Self::Level) -> Result<Self::Element>;

    /// Samples an element uniformly at random at a given level.
    fn random_at<R: RngCore + CryptoRng>(
        &self,
        level: Self::Level,
        rng: &mut R,
    ) -> Result<Self::Element>;

    /// Computes `out = a + b`. `out` is left untouched on error.
    fn add(&self, a: &Self::Element, b: &Self::Element, out: &mut Self::Element) -> Result<()>;

    /// Computes `a += b`. `a` is left untouched on error.
    fn add_assign(&self, a: &mut Self::Element, b: &Self::Element) -> Result<()>;

    /// Multiplies `a` in place by a scalar in Montgomery form produced by this
    /// chain.
    fn mul_rns_scalar_montgomery_assign(&self, a: &mut Self::Element, s: &RnsScalar)
        -> Result<()>;

    /// Decodes an element at a given level, as encoded by its
    /// [`Serialize`] implementation. Returns an error if the length
    /// does not match the encoding of an element at that level.
    fn element_from_bytes(&self, bytes: &[u8], level: Self::Level) -> Result<Self::Element>;

    /// Returns the zero scalar.
    fn new_rns_scalar(&self) -> RnsScalar {
        RnsScalar::new(vec![0; self.moduli().len()])
    }

    /// Reduces an unsigned integer modulo every modulus of the chain.
    fn rns_scalar_from_u64(&self, v: u64) -> RnsScalar {
        RnsScalar::new(self.moduli().iter().map(|qi| qi.reduce(v)).collect())
    }

    /// Converts a scalar into Montgomery form.
    fn mform_rns_scalar(&self, a: &RnsScalar) -> RnsScalar {
        debug_assert_eq!(a.len(), self.moduli().len());
        RnsScalar::new(
            izip!(self.moduli().iter(), a.limbs().iter())
                .map(|(qi, ai)| qi.to_montgomery(*ai))
                .collect(),
        )
    }

    /// Returns `a - b`, limb by limb.
    fn sub_rns_scalar(&self, a: &RnsScalar, b: &RnsScalar) -> RnsScalar {
        debug_assert_eq!(a.len(), self.moduli().len());
        debug_assert_eq!(b.len(), self.moduli().len());
        RnsScalar::new(
            izip!(self.moduli().iter(), a.limbs().iter(), b.limbs().iter())
                .map(|(qi, ai, bi)| qi.sub(*ai, *bi))
                .collect(),
        )
    }

    /// Returns the Montgomery product of `a` and `b`, limb by limb. When both
    /// are in Montgomery form, so is the result.
    fn mul_rns_scalar_montgomery(&self, a: &RnsScalar, b: &RnsScalar) -> RnsScalar {
        let mut out = a.clone();
        self.mul_rns_scalar_montgomery_in_place(&mut out, b);
        out
    }

    /// Computes `a = a * b` with Montgomery multiplication, limb by limb.
    fn mul_rns_scalar_montgomery_in_place(&self, a: &mut RnsScalar, b: &RnsScalar) {
        debug_assert_eq!(a.len(), self.moduli().len());
        debug_assert_eq!(b.len(), self.moduli().len());
        izip!(self.moduli().iter(), a.limbs_mut().iter_mut(), b.limbs().iter())
            .for_each(|(qi, ai, bi)| *ai = qi.mul_montgomery(*ai, *bi));
    }

    /// Inverts a scalar in Montgomery form, limb by limb. Returns None if some
    /// residue is zero.
    fn inverse_rns_scalar_montgomery(&self, a: &RnsScalar) -> Option<RnsScalar> {
        debug_assert_eq!(a.len(), self.moduli().len());
        izip!(self.moduli().iter(), a.limbs().iter())
            .map(|(qi, ai)| qi.inv_montgomery(*ai))
            .collect::<Option<Vec<_>>>()
            .map(RnsScalar::new)
    }

    /// Returns the scalar 1 in Montgomery form.
    fn one_montgomery(&self) -> RnsScalar {
        self.mform_rns_scalar(&self.rns_scalar_from_u64(1))
    }
}

/// The chain of ciphertext moduli `Q`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingQ {
    ctx: Arc<Context>,
}

impl RingQ {
    /// Creates the chain from the context holding all its moduli.
    pub fn new(ctx: &Arc<Context>) -> Self {
        Self { ctx: ctx.clone() }
    }

    /// Returns the context holding all the moduli of the chain.
    pub fn ctx(&self) -> &Arc<Context> {
        &self.ctx
    }

    /// Returns the context at a given level.
    pub fn ctx_at_level(&self, level: usize) -> Result<Arc<Context>> {
        self.ctx.context_at_level(level)
    }

    fn check_same_level(&self, a: &Poly, b: &Poly) -> Result<()> {
        let (la, lb) = (self.level_of(a)?, self.level_of(b)?);
        if la != lb {
            return Err(Error::LevelMismatch(format!("{la} != {lb}")));
        }
        Ok(())
    }
}

impl ModulusChain for RingQ {
    type Element = Poly;
    type Level = usize;

    fn moduli(&self) -> &[Modulus] {
        self.ctx.moduli_operators()
    }

    fn max_level(&self) -> usize {
        self.ctx.level()
    }

    fn level_of(&self, element: &Poly) -> Result<usize> {
        if element.ctx().is_prefix_of(&self.ctx) {
            Ok(element.level())
        } else {
            Err(Error::InvalidContext)
        }
    }

    fn zero_at(&self, level: usize) -> Result<Poly> {
        Ok(Poly::zero(&self.ctx_at_level(level)?))
    }

    fn random_at<R: RngCore + CryptoRng>(&self, level: usize, rng: &mut R) -> Result<Poly> {
        Ok(Poly::random(&self.ctx_at_level(level)?, rng))
    }

    fn add(&self, a: &Poly, b: &Poly, out: &mut Poly) -> Result<()> {
        self.check_same_level(a, b)?;
        self.check_same_level(a, out)?;
        Poly::add_to(a, b, out)
    }

    fn add_assign(&self, a: &mut Poly, b: &Poly) -> Result<()> {
        self.check_same_level(a, b)?;
        *a += b;
        Ok(())
    }

    fn mul_rns_scalar_montgomery_assign(&self, a: &mut Poly, s: &RnsScalar) -> Result<()> {
        self.level_of(a)?;
        a.mul_rns_scalar_montgomery(s.limbs())
    }

    fn element_from_bytes(&self, bytes: &[u8], level: usize) -> Result<Poly> {
        Poly::from_bytes(bytes, &self.ctx_at_level(level)?)
    }
}
