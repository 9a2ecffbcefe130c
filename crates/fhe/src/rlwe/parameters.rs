//! Create parameters for RLWE-based schemes

use crate::{Error, ParametersError, Result};
use fhe_math::{
    rq::{Context, RingQ, RingQP},
    zq::primes::generate_prime,
};
use fhe_traits::FheParameters;
use fhe_util::is_prime;
use itertools::Itertools;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::debug;

/// Parameters of an RLWE-based scheme: the ring degree, the ciphertext moduli
/// `Q` and the optional auxiliary moduli `P` used by key-switching keys.
#[derive(PartialEq, Eq)]
pub struct RlweParameters {
    /// Number of coefficients in a polynomial.
    polynomial_degree: usize,

    /// Vector of coprime moduli q_i for the ciphertext.
    pub(crate) moduli: Box<[u64]>,

    /// Vector of the sizes of the coprime moduli q_i for the ciphertext.
    moduli_sizes: Box<[usize]>,

    /// Vector of coprime moduli p_j, possibly empty.
    pub(crate) moduli_p: Box<[u64]>,

    /// Chain of ciphertext moduli
    ring_q: RingQ,

    /// Chain of ciphertext moduli extended by the auxiliary moduli
    ring_qp: RingQP,
}

impl Debug for RlweParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RlweParameters")
            .field("polynomial_degree", &self.polynomial_degree)
            .field("moduli", &self.moduli)
            .field("moduli_p", &self.moduli_p)
            .finish()
    }
}

impl FheParameters for RlweParameters {}

impl RlweParameters {
    /// Returns the underlying polynomial degree
    pub const fn degree(&self) -> usize {
        self.polynomial_degree
    }

    /// Returns a reference to the ciphertext moduli
    pub fn moduli(&self) -> &[u64] {
        &self.moduli
    }

    /// Returns a reference to the sizes of the ciphertext moduli
    pub fn moduli_sizes(&self) -> &[usize] {
        &self.moduli_sizes
    }

    /// Returns a reference to the auxiliary moduli, empty if there are none
    pub fn moduli_p(&self) -> &[u64] {
        &self.moduli_p
    }

    /// Returns the maximum level allowed by these parameters, i.e. the index
    /// of the last ciphertext modulus.
    pub fn max_level(&self) -> usize {
        self.moduli.len() - 1
    }

    /// Returns the context of the ciphertext moduli up to a given level.
    pub fn ctx_at_level(&self, level: usize) -> Result<Arc<Context>> {
        Ok(self.ring_q.ctx_at_level(level)?)
    }

    /// Returns the chain of ciphertext moduli.
    pub fn ring_q(&self) -> &RingQ {
        &self.ring_q
    }

    /// Returns the chain of ciphertext moduli extended by the auxiliary
    /// moduli.
    pub fn ring_qp(&self) -> &RingQP {
        &self.ring_qp
    }

    #[cfg(test)]
    #[allow(missing_docs)]
    pub fn default_arc(num_moduli: usize, num_moduli_p: usize, degree: usize) -> Arc<Self> {
        if !degree.is_power_of_two() || degree < 8 {
            panic!("Invalid degree");
        }
        RlweParametersBuilder::new()
            .set_degree(degree)
            .set_moduli_sizes(&vec![62usize; num_moduli])
            .set_p_moduli_sizes(&vec![61usize; num_moduli_p])
            .build_arc()
            .unwrap()
    }
}

/// Builder for parameters of RLWE-based schemes.
#[derive(Debug)]
pub struct RlweParametersBuilder {
    degree: usize,
    ciphertext_moduli: Vec<u64>,
    ciphertext_moduli_sizes: Vec<usize>,
    p_moduli: Vec<u64>,
    p_moduli_sizes: Vec<usize>,
}

impl RlweParametersBuilder {
    /// Creates a new instance of the builder
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            degree: Default::default(),
            ciphertext_moduli: Default::default(),
            ciphertext_moduli_sizes: Default::default(),
            p_moduli: Default::default(),
            p_moduli_sizes: Default::default(),
        }
    }

    /// Sets the polynomial degree. Building fails if the degree is not a power
    /// of two larger or equal to 8.
    pub fn set_degree(&mut self, degree: usize) -> &mut Self {
        self.degree = degree;
        self
    }

    /// Sets the sizes of the ciphertext moduli.
    /// Only one of `set_moduli_sizes` and `set_moduli`
    /// can be specified.
    pub fn set_moduli_sizes(&mut self, sizes: &[usize]) -> &mut Self {
        self.ciphertext_moduli_sizes = sizes.to_owned();
        self
    }

    /// Sets the ciphertext moduli to use.
    /// Only one of `set_moduli_sizes` and `set_moduli`
    /// can be specified.
    pub fn set_moduli(&mut self, moduli: &[u64]) -> &mut Self {
        self.ciphertext_moduli = moduli.to_owned();
        self
    }

    /// Sets the sizes of the auxiliary moduli.
    /// At most one of `set_p_moduli_sizes` and `set_p_moduli`
    /// can be specified.
    pub fn set_p_moduli_sizes(&mut self, sizes: &[usize]) -> &mut Self {
        self.p_moduli_sizes = sizes.to_owned();
        self
    }

    /// Sets the auxiliary moduli to use.
    /// At most one of `set_p_moduli_sizes` and `set_p_moduli`
    /// can be specified.
    pub fn set_p_moduli(&mut self, moduli: &[u64]) -> &mut Self {
        self.p_moduli = moduli.to_owned();
        self
    }

    /// Generate moduli with the specified sizes, distinct from the moduli in
    /// `taken`.
    fn generate_moduli(moduli_sizes: &[usize], degree: usize, taken: &[u64]) -> Result<Vec<u64>> {
        let mut moduli = vec![];
        for size in moduli_sizes {
            if *size > 62 || *size < 10 {
                return Err(Error::ParametersError(ParametersError::InvalidModulusSize(
                    *size, 10, 62,
                )));
            }

            let mut upper_bound = 1 << size;
            loop {
                if let Some(prime) = generate_prime(*size, 2 * degree as u64, upper_bound) {
                    if !moduli.contains(&prime) && !taken.contains(&prime) {
                        moduli.push(prime);
                        break;
                    } else {
                        upper_bound = prime;
                    }
                } else {
                    return Err(Error::ParametersError(ParametersError::NotEnoughPrimes(
                        *size, degree,
                    )));
                }
            }
        }

        Ok(moduli)
    }

    fn check_moduli(moduli: &[u64]) -> Result<()> {
        if let Some(m) = moduli
            .iter()
            .find(|m| **m >= 1 << 62 || **m % 2 == 0 || !is_prime(**m))
        {
            return Err(Error::ParametersError(ParametersError::InvalidModuli(
                format!("{m} is not an odd prime smaller than 2^62"),
            )));
        }
        if !moduli.iter().all_unique() {
            return Err(Error::ParametersError(ParametersError::InvalidModuli(
                "the moduli are not distinct".to_string(),
            )));
        }
        Ok(())
    }

    /// Build a new `RlweParameters` inside an `Arc`.
    pub fn build_arc(&self) -> Result<Arc<RlweParameters>> {
        self.build().map(Arc::new)
    }

    /// Build a new `RlweParameters`.
    pub fn build(&self) -> Result<RlweParameters> {
        // Check that the degree is a power of 2 (and large enough).
        if self.degree < 8 || !self.degree.is_power_of_two() {
            return Err(Error::ParametersError(ParametersError::InvalidDegree(
                self.degree,
            )));
        }

        // Check that one of `ciphertext_moduli` and `ciphertext_moduli_sizes` is
        // specified.
        if !self.ciphertext_moduli.is_empty() && !self.ciphertext_moduli_sizes.is_empty() {
            return Err(Error::ParametersError(ParametersError::TooManySpecified(
                "Only one of `ciphertext_moduli` and `ciphertext_moduli_sizes` can be specified"
                    .to_string(),
            )));
        } else if self.ciphertext_moduli.is_empty() && self.ciphertext_moduli_sizes.is_empty() {
            return Err(Error::ParametersError(ParametersError::TooFewSpecified(
                "One of `ciphertext_moduli` and `ciphertext_moduli_sizes` must be specified"
                    .to_string(),
            )));
        }
        if !self.p_moduli.is_empty() && !self.p_moduli_sizes.is_empty() {
            return Err(Error::ParametersError(ParametersError::TooManySpecified(
                "Only one of `p_moduli` and `p_moduli_sizes` can be specified".to_string(),
            )));
        }

        // Get or generate the moduli
        let moduli = if self.ciphertext_moduli_sizes.is_empty() {
            self.ciphertext_moduli.clone()
        } else {
            Self::generate_moduli(&self.ciphertext_moduli_sizes, self.degree, &[])?
        };
        let moduli_p = if self.p_moduli_sizes.is_empty() {
            self.p_moduli.clone()
        } else {
            Self::generate_moduli(&self.p_moduli_sizes, self.degree, &moduli)?
        };
        Self::check_moduli(&[moduli.as_slice(), moduli_p.as_slice()].concat())?;

        // Recomputes the moduli sizes
        let moduli_sizes = moduli
            .iter()
            .map(|m| 64 - m.leading_zeros() as usize)
            .collect_vec();

        let ctx_q = Context::new_arc(&moduli, self.degree)?;
        let ctx_p = if moduli_p.is_empty() {
            None
        } else {
            Some(Context::new_arc(&moduli_p, self.degree)?)
        };
        let ring_q = RingQ::new(&ctx_q);
        let ring_qp = RingQP::new(&ctx_q, ctx_p.as_ref())?;

        debug!(
            degree = self.degree,
            log_q = ctx_q.modulus().bits(),
            num_moduli = moduli.len(),
            num_moduli_p = moduli_p.len(),
            "built RLWE parameters"
        );

        Ok(RlweParameters {
            polynomial_degree: self.degree,
            moduli: moduli.into_boxed_slice(),
            moduli_sizes: moduli_sizes.into_boxed_slice(),
            moduli_p: moduli_p.into_boxed_slice(),
            ring_q,
            ring_qp,
        })
    }
}
