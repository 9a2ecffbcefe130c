use itertools::Itertools;
use num_bigint::BigUint;
use std::{fmt::Debug, sync::Arc};

use crate::{zq::Modulus, Error, Result};
use fhe_util::is_prime;

/// Struct that holds the context associated with elements in rq.
#[derive(Default, Clone, PartialEq, Eq)]
pub struct Context {
    /// List of prime moduli
    pub moduli: Box<[u64]>,
    /// Modulus operators for each prime
    pub q: Box<[Modulus]>,
    /// Polynomial degree (must be power of 2)
    pub degree: usize,
    /// Product of the moduli
    modulus: BigUint,
    /// Link to context with one less modulus (for level management)
    pub next_context: Option<Arc<Context>>,
}

impl Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("moduli", &self.moduli)
            .field("degree", &self.degree)
            .finish()
    }
}

impl Context {
    /// Creates a context from a list of moduli and a polynomial degree.
    ///
    /// Returns an error if the moduli are not distinct odd primes less than 62
    /// bits, or if the degree is not a power of two larger or equal to 8.
    pub fn new(moduli: &[u64], degree: usize) -> Result<Self> {
        if !degree.is_power_of_two() || degree < 8 {
            return Err(Error::Default(
                "The degree is not a power of two larger or equal to 8".to_string(),
            ));
        }
        if moduli.is_empty() {
            return Err(Error::Default("The list of moduli is empty".to_string()));
        }
        if !moduli.iter().all_unique() {
            return Err(Error::Default("The moduli are not distinct".to_string()));
        }

        let mut q = Vec::with_capacity(moduli.len());
        for modulus in moduli {
            let qi = Modulus::new(*modulus)?;
            if !qi.supports_montgomery() || !is_prime(*modulus) {
                return Err(Error::Default(format!(
                    "The modulus {modulus} is not an odd prime"
                )));
            }
            q.push(qi);
        }

        let next_context = if moduli.len() >= 2 {
            Some(Arc::new(Context::new(&moduli[..moduli.len() - 1], degree)?))
        } else {
            None
        };

        Ok(Self {
            moduli: moduli.to_owned().into_boxed_slice(),
            q: q.into_boxed_slice(),
            degree,
            modulus: moduli.iter().map(|m| BigUint::from(*m)).product(),
            next_context,
        })
    }

    /// Creates a context in an `Arc`.
    pub fn new_arc(moduli: &[u64], degree: usize) -> Result<Arc<Self>> {
        Self::new(moduli, degree).map(Arc::new)
    }

    /// Returns the modulus as a BigUint.
    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    /// Returns a reference to the moduli in this context.
    pub fn moduli(&self) -> &[u64] {
        &self.moduli
    }

    /// Returns a reference to the moduli as Modulus in this context.
    pub fn moduli_operators(&self) -> &[Modulus] {
        &self.q
    }

    /// Returns the level of this context, i.e. the index of its last modulus.
    pub fn level(&self) -> usize {
        self.moduli.len() - 1
    }

    /// Returns whether the moduli of this context are the first moduli of
    /// `other`, i.e. whether this context is reachable from `other` by
    /// dropping moduli.
    pub fn is_prefix_of(&self, other: &Context) -> bool {
        self.degree == other.degree
            && self.moduli.len() <= other.moduli.len()
            && self.moduli[..] == other.moduli[..self.moduli.len()]
    }

    /// Returns the context of this chain at the given level, i.e. the context
    /// keeping the first `level + 1` moduli.
    pub fn context_at_level(self: &Arc<Self>, level: usize) -> Result<Arc<Self>> {
        if level > self.level() {
            return Err(Error::LevelMismatch(format!(
                "no context at level {level}, the maximum level is {}",
                self.level()
            )));
        }
        let mut current_ctx = self.clone();
        while current_ctx.level() > level {
            current_ctx = current_ctx
                .next_context
                .clone()
                .ok_or(Error::NoMoreContext)?;
        }
        Ok(current_ctx)
    }
}
