use super::{chain::ModulusChain, Context, Poly, RnsScalar};
use crate::{zq::Modulus, Error, Result};
use fhe_traits::{DeserializeWithContext, Serialize};
use itertools::Itertools;
use rand::{CryptoRng, RngCore};
use std::sync::Arc;
use zeroize::Zeroize;

/// A ring element over the chain `Q` extended by the auxiliary chain `P`, as
/// used for key-switching keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolyQP {
    /// Part over the moduli `Q`
    pub q: Poly,
    /// Part over the moduli `P`, absent when the parameters have no `P`
    pub p: Option<Poly>,
}

impl PolyQP {
    /// Returns the levels of the `Q` and `P` parts.
    pub fn level(&self) -> (usize, Option<usize>) {
        (self.q.level(), self.p.as_ref().map(|p| p.level()))
    }
}

impl Zeroize for PolyQP {
    fn zeroize(&mut self) {
        self.q.zeroize();
        if let Some(p) = self.p.as_mut() {
            p.zeroize()
        }
    }
}

impl Serialize for PolyQP {
    /// The encoding of the `Q` part immediately followed by the encoding of the
    /// `P` part.
    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.q.to_bytes();
        if let Some(p) = self.p.as_ref() {
            bytes.extend(p.to_bytes())
        }
        bytes
    }
}

/// The chain of moduli `Q` followed by the moduli `P`.
///
/// Scalars of this chain hold the residues modulo every modulus of `Q` and
/// then every modulus of `P`; the residue at index `|Q| + j` always applies to
/// limb `j` of the `P` part, whatever the level of the `Q` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingQP {
    ring_q: Arc<Context>,
    ring_p: Option<Arc<Context>>,
    moduli: Box<[Modulus]>,
}

impl RingQP {
    /// Creates the chain from the contexts holding all the moduli of `Q` and
    /// of `P`.
    pub fn new(ring_q: &Arc<Context>, ring_p: Option<&Arc<Context>>) -> Result<Self> {
        if let Some(ring_p) = ring_p {
            if ring_p.degree != ring_q.degree {
                return Err(Error::Default(
                    "The Q and P contexts have different degrees".to_string(),
                ));
            }
            if !ring_q
                .moduli()
                .iter()
                .chain(ring_p.moduli().iter())
                .all_unique()
            {
                return Err(Error::Default(
                    "The Q and P moduli are not distinct".to_string(),
                ));
            }
        }
        let moduli = ring_q
            .moduli_operators()
            .iter()
            .chain(ring_p.into_iter().flat_map(|p| p.moduli_operators().iter()))
            .cloned()
            .collect_vec();
        Ok(Self {
            ring_q: ring_q.clone(),
            ring_p: ring_p.cloned(),
            moduli: moduli.into_boxed_slice(),
        })
    }

    /// Returns the context holding all the moduli of `Q`.
    pub fn ring_q(&self) -> &Arc<Context> {
        &self.ring_q
    }

    /// Returns the context holding all the moduli of `P`, if any.
    pub fn ring_p(&self) -> Option<&Arc<Context>> {
        self.ring_p.as_ref()
    }

    fn contexts_at(
        &self,
        level: (usize, Option<usize>),
    ) -> Result<(Arc<Context>, Option<Arc<Context>>)> {
        let ctx_q = self.ring_q.context_at_level(level.0)?;
        let ctx_p = match (self.ring_p.as_ref(), level.1) {
            (Some(ring_p), Some(level_p)) => Some(ring_p.context_at_level(level_p)?),
            (None, None) => None,
            _ => {
                return Err(Error::LevelMismatch(format!(
                    "level {level:?} does not match the P chain"
                )))
            }
        };
        Ok((ctx_q, ctx_p))
    }

    fn check_same_level(&self, a: &PolyQP, b: &PolyQP) -> Result<()> {
        let (la, lb) = (self.level_of(a)?, self.level_of(b)?);
        if la != lb {
            return Err(Error::LevelMismatch(format!("{la:?} != {lb:?}")));
        }
        Ok(())
    }
}

impl ModulusChain for RingQP {
    type Element = PolyQP;
    type Level = (usize, Option<usize>);

    fn moduli(&self) -> &[Modulus] {
        &self.moduli
    }

    fn max_level(&self) -> (usize, Option<usize>) {
        (self.ring_q.level(), self.ring_p.as_ref().map(|p| p.level()))
    }

    fn level_of(&self, element: &PolyQP) -> Result<(usize, Option<usize>)> {
        if !element.q.ctx().is_prefix_of(&self.ring_q) {
            return Err(Error::InvalidContext);
        }
        match (self.ring_p.as_ref(), element.p.as_ref()) {
            (Some(ring_p), Some(p)) if p.ctx().is_prefix_of(ring_p) => Ok(element.level()),
            (None, None) => Ok(element.level()),
            _ => Err(Error::InvalidContext),
        }
    }

    fn zero_at(&self, level: (usize, Option<usize>)) -> Result<PolyQP> {
        let (ctx_q, ctx_p) = self.contexts_at(level)?;
        Ok(PolyQP {
            q: Poly::zero(&ctx_q),
            p: ctx_p.map(|ctx_p| Poly::zero(&ctx_p)),
        })
    }

    fn random_at<R: RngCore + CryptoRng>(
        &self,
        level: (usize, Option<usize>),
        rng: &mut R,
    ) -> Result<PolyQP> {
        let (ctx_q, ctx_p) = self.contexts_at(level)?;
        Ok(PolyQP {
            q: Poly::random(&ctx_q, rng),
            p: ctx_p.map(|ctx_p| Poly::random(&ctx_p, rng)),
        })
    }

    fn add(&self, a: &PolyQP, b: &PolyQP, out: &mut PolyQP) -> Result<()> {
        self.check_same_level(a, b)?;
        self.check_same_level(a, out)?;
        Poly::add_to(&a.q, &b.q, &mut out.q)?;
        if let (Some(ap), Some(bp), Some(op)) = (a.p.as_ref(), b.p.as_ref(), out.p.as_mut()) {
            Poly::add_to(ap, bp, op)?;
        }
        Ok(())
    }

    fn add_assign(&self, a: &mut PolyQP, b: &PolyQP) -> Result<()> {
        self.check_same_level(a, b)?;
        a.q += &b.q;
        if let (Some(ap), Some(bp)) = (a.p.as_mut(), b.p.as_ref()) {
            *ap += bp;
        }
        Ok(())
    }

    fn mul_rns_scalar_montgomery_assign(&self, a: &mut PolyQP, s: &RnsScalar) -> Result<()> {
        self.level_of(a)?;
        if s.len() != self.moduli.len() {
            return Err(Error::LevelMismatch(format!(
                "scalar with {} limbs does not belong to a chain of {} moduli",
                s.len(),
                self.moduli.len()
            )));
        }
        let (s_q, s_p) = s.limbs().split_at(self.ring_q.moduli().len());
        a.q.mul_rns_scalar_montgomery(s_q)?;
        if let Some(p) = a.p.as_mut() {
            p.mul_rns_scalar_montgomery(s_p)?;
        }
        Ok(())
    }

    fn element_from_bytes(&self, bytes: &[u8], level: (usize, Option<usize>)) -> Result<PolyQP> {
        let (ctx_q, ctx_p) = self.contexts_at(level)?;
        let q_len = 8 * ctx_q.degree * ctx_q.moduli().len();
        if bytes.len() < q_len {
            return Err(Error::Serialization(format!(
                "Invalid polynomial serialization: expected at least {q_len} bytes, found {}",
                bytes.len()
            )));
        }
        let (bytes_q, bytes_p) = bytes.split_at(q_len);
        let q = Poly::from_bytes(bytes_q, &ctx_q)?;
        let p = match ctx_p {
            Some(ctx_p) => Some(Poly::from_bytes(bytes_p, &ctx_p)?),
            None if bytes_p.is_empty() => None,
            None => {
                return Err(Error::Serialization(format!(
                    "Invalid polynomial serialization: {} trailing bytes",
                    bytes_p.len()
                )))
            }
        };
        Ok(PolyQP { q, p })
    }
}
