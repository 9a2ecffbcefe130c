use fhe_traits::Serialize;
use zeroize::Zeroize;

/// A scalar in residue number system: one residue per modulus of a chain.
///
/// Whether the residues are in Montgomery form is up to the caller; the
/// [`ModulusChain`](super::ModulusChain) methods document which form they
/// expect and return.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RnsScalar(Box<[u64]>);

impl RnsScalar {
    /// Creates a scalar from its residues.
    pub fn new(limbs: Vec<u64>) -> Self {
        Self(limbs.into_boxed_slice())
    }

    /// Returns the residues of the scalar.
    pub fn limbs(&self) -> &[u64] {
        &self.0
    }

    /// Returns a mutable reference to the residues of the scalar.
    pub fn limbs_mut(&mut self) -> &mut [u64] {
        &mut self.0
    }

    /// Number of residues.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the scalar holds no residue.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Overwrites the residues with those of `other`.
    ///
    /// Aborts if the two scalars do not have the same number of residues.
    pub fn copy_from(&mut self, other: &RnsScalar) {
        self.0.copy_from_slice(&other.0)
    }
}

impl Zeroize for RnsScalar {
    fn zeroize(&mut self) {
        self.0[..].zeroize()
    }
}

impl Serialize for RnsScalar {
    fn to_bytes(&self) -> Vec<u8> {
        self.0.iter().flat_map(|r| r.to_le_bytes()).collect()
    }
}
