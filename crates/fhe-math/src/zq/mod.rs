//! Ring operations for moduli up to 62 bits.

pub mod primes;

use crate::{Error, Result};
use fhe_util::is_prime;
use rand::{CryptoRng, Rng, RngCore};

/// Structure encapsulating an integer modulus up to 62 bits.
///
/// Odd moduli also carry the constants needed for Montgomery multiplication
/// with `R = 2^64`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modulus {
    pub(crate) p: u64,
    is_prime: bool,
    /// `-p^{-1} mod 2^64`, zero for even moduli.
    minus_p_inv: u64,
    /// `R^2 mod p`, used to enter the Montgomery domain.
    r2: u64,
}

impl Modulus {
    /// Create a modulus from an integer of at most 62 bits.
    pub fn new(p: u64) -> Result<Self> {
        if p < 2 || (p >> 62) != 0 {
            return Err(Error::InvalidModulus(p));
        }
        let (minus_p_inv, r2) = if p & 1 == 1 {
            // Newton iteration doubles the number of correct low bits; p * p = 1 mod 8.
            let mut inv = p;
            for _ in 0..5 {
                inv = inv.wrapping_mul(2u64.wrapping_sub(p.wrapping_mul(inv)));
            }
            let r = ((1u128 << 64) % (p as u128)) as u64;
            let r2 = (((r as u128) * (r as u128)) % (p as u128)) as u64;
            (inv.wrapping_neg(), r2)
        } else {
            (0, 0)
        };
        Ok(Self {
            p,
            is_prime: is_prime(p),
            minus_p_inv,
            r2,
        })
    }

    /// Returns the value of the modulus.
    pub const fn modulus(&self) -> u64 {
        self.p
    }

    /// Returns whether Montgomery arithmetic is available for this modulus.
    pub const fn supports_montgomery(&self) -> bool {
        self.p & 1 == 1
    }

    /// Modular addition of a and b in constant time.
    ///
    /// Aborts if a >= p or b >= p in debug mode.
    pub const fn add(&self, a: u64, b: u64) -> u64 {
        debug_assert!(a < self.p && b < self.p);
        Self::reduce1(a + b, self.p)
    }

    /// Modular subtraction of a and b in constant time.
    ///
    /// Aborts if a >= p or b >= p in debug mode.
    pub const fn sub(&self, a: u64, b: u64) -> u64 {
        debug_assert!(a < self.p && b < self.p);
        Self::reduce1(a + self.p - b, self.p)
    }

    /// Modular multiplication of a and b.
    ///
    /// Aborts if a >= p or b >= p in debug mode.
    pub const fn mul(&self, a: u64, b: u64) -> u64 {
        debug_assert!(a < self.p && b < self.p);
        self.reduce_u128((a as u128) * (b as u128))
    }

    /// Modular exponentiation in variable time.
    ///
    /// Aborts if a >= p or n >= p in debug mode.
    pub fn pow(&self, a: u64, n: u64) -> u64 {
        debug_assert!(a < self.p && n < self.p);

        if n == 0 {
            1
        } else if n == 1 {
            a
        } else {
            let mut r = a;
            let mut i = (62 - n.leading_zeros()) as isize;
            while i >= 0 {
                r = self.mul(r, r);
                if (n >> i) & 1 == 1 {
                    r = self.mul(r, a);
                }
                i -= 1;
            }
            r
        }
    }

    /// Modular inversion in variable time.
    ///
    /// Returns None if p is not prime or a = 0.
    /// Aborts if a >= p in debug mode.
    pub fn inv(&self, a: u64) -> Option<u64> {
        if !self.is_prime || a == 0 {
            None
        } else {
            let r = self.pow(a, self.p - 2);
            debug_assert_eq!(self.mul(a, r), 1);
            Some(r)
        }
    }

    /// Modular reduction of a u64.
    pub const fn reduce(&self, a: u64) -> u64 {
        a % self.p
    }

    /// Modular reduction of a u128.
    pub const fn reduce_u128(&self, a: u128) -> u64 {
        (a % (self.p as u128)) as u64
    }

    /// Modular reduction of a i64 in variable time.
    pub const fn reduce_i64(&self, a: i64) -> u64 {
        let r = (a as i128).rem_euclid(self.p as i128);
        r as u64
    }

    /// Montgomery reduction of `t < p * 2^64`: returns `t * 2^-64 mod p`.
    const fn mred(&self, t: u128) -> u64 {
        let m = (t as u64).wrapping_mul(self.minus_p_inv);
        let r = ((t + (m as u128) * (self.p as u128)) >> 64) as u64;
        Self::reduce1(r, self.p)
    }

    /// Convert a into the Montgomery domain: returns `a * 2^64 mod p`.
    ///
    /// Aborts if a >= p or if the modulus is even in debug mode.
    pub const fn to_montgomery(&self, a: u64) -> u64 {
        debug_assert!(self.supports_montgomery() && a < self.p);
        self.mred((a as u128) * (self.r2 as u128))
    }

    /// Convert a out of the Montgomery domain: returns `a * 2^-64 mod p`.
    ///
    /// Aborts if a >= p or if the modulus is even in debug mode.
    pub const fn from_montgomery(&self, a: u64) -> u64 {
        debug_assert!(self.supports_montgomery() && a < self.p);
        self.mred(a as u128)
    }

    /// Montgomery multiplication: returns `a * b * 2^-64 mod p`.
    ///
    /// When b is in Montgomery form, the result has the same form as a.
    /// Aborts if a >= p, b >= p or if the modulus is even in debug mode.
    pub const fn mul_montgomery(&self, a: u64, b: u64) -> u64 {
        debug_assert!(self.supports_montgomery() && a < self.p && b < self.p);
        self.mred((a as u128) * (b as u128))
    }

    /// Modular inversion in the Montgomery domain: maps `a * 2^64` to
    /// `a^-1 * 2^64`.
    ///
    /// Returns None if p is not prime or a = 0.
    pub fn inv_montgomery(&self, a: u64) -> Option<u64> {
        let r = self.inv(self.from_montgomery(a))?;
        Some(self.to_montgomery(r))
    }

    /// Returns a vector of `size` elements sampled uniformly in `[0, p)`.
    pub fn random_vec<R: RngCore + CryptoRng>(&self, size: usize, rng: &mut R) -> Vec<u64> {
        (0..size).map(|_| rng.gen_range(0..self.p)).collect()
    }

    /// Return x mod p in constant time.
    /// Aborts if x >= 2 * p in debug mode.
    const fn reduce1(x: u64, p: u64) -> u64 {
        debug_assert!(p >> 63 == 0);
        debug_assert!(x < 2 * p);

        let (y, _) = x.overflowing_sub(p);
        let xp = x ^ p;
        let yp = y ^ p;
        let xy = xp ^ yp;
        let xxy = x ^ xy;
        let xxy = xxy >> 63;
        let (c, _) = xxy.overflowing_sub(1);
        let r = (c & y) | ((!c) & x);

        debug_assert!(r == x % p);

        r
    }
}

#[cfg(test)]
mod tests {
    use super::Modulus;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    // Utility functions for the proptests.

    fn valid_moduli() -> impl Strategy<Value = Modulus> {
        (2u64..(1 << 62)).prop_map(|p| Modulus::new(p | 1).unwrap())
    }

    proptest! {
        #[test]
        fn constructor(p: u64) {
            // 63 and 64-bit integers do not work.
            prop_assert!(Modulus::new(p | (1u64 << 62)).is_err());
            prop_assert!(Modulus::new(p | (1u64 << 63)).is_err());

            // p = 0 & 1 do not work.
            prop_assert!(Modulus::new(0u64).is_err());
            prop_assert!(Modulus::new(1u64).is_err());

            // Otherwise, all moduli should work
            prop_assume!(p >> 2 >= 2);
            let q = Modulus::new(p >> 2);
            prop_assert!(q.is_ok());
            prop_assert_eq!(q.unwrap().modulus(), p >> 2);
        }

        #[test]
        fn add_sub(p in valid_moduli(), mut a: u64, mut b: u64) {
            a = p.reduce(a);
            b = p.reduce(b);
            prop_assert_eq!(p.add(a, b) as u128, ((a as u128) + (b as u128)) % (p.p as u128));
            prop_assert_eq!(p.sub(p.add(a, b), b), a);
            prop_assert_eq!(p.add(a, p.sub(0, a)), 0);
        }

        #[test]
        fn mul(p in valid_moduli(), mut a: u64, mut b: u64) {
            a = p.reduce(a);
            b = p.reduce(b);
            prop_assert_eq!(p.mul(a, b) as u128, ((a as u128) * (b as u128)) % (p.p as u128));
        }

        #[test]
        fn montgomery_round_trip(p in valid_moduli(), mut a: u64) {
            a = p.reduce(a);
            prop_assert_eq!(p.from_montgomery(p.to_montgomery(a)), a);
        }

        #[test]
        fn montgomery_mul(p in valid_moduli(), mut a: u64, mut b: u64) {
            a = p.reduce(a);
            b = p.reduce(b);
            // Multiplying by a scalar in Montgomery form yields a normal product.
            prop_assert_eq!(p.mul_montgomery(a, p.to_montgomery(b)), p.mul(a, b));
            // Two Montgomery operands yield a Montgomery product.
            let ab = p.mul_montgomery(p.to_montgomery(a), p.to_montgomery(b));
            prop_assert_eq!(p.from_montgomery(ab), p.mul(a, b));
        }
    }

    #[test]
    fn even_moduli_have_no_montgomery_form() {
        let q = Modulus::new(1 << 20).unwrap();
        assert!(!q.supports_montgomery());
        let q = Modulus::new(1153).unwrap();
        assert!(q.supports_montgomery());
    }

    #[test]
    fn inv() {
        let ntests = 100;
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        for p in [2u64, 3, 17, 1987, 4611686018326724609] {
            let q = Modulus::new(p).unwrap();

            assert!(q.inv(0).is_none());
            assert_eq!(q.inv(1).unwrap(), 1);
            assert_eq!(q.inv(p - 1).unwrap(), p - 1);

            for a in q.random_vec(ntests, &mut rng) {
                let b = q.inv(a);
                if a == 0 {
                    assert!(b.is_none())
                } else {
                    assert!(b.is_some());
                    assert_eq!(q.mul(a, b.unwrap()), 1)
                }
            }
        }

        // Non-prime moduli have no inverse.
        let q = Modulus::new(1 << 60 | 1).unwrap();
        assert!(q.inv(3).is_none());
    }

    #[test]
    fn inv_montgomery() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for p in [3u64, 17, 1153, 4611686018326724609] {
            let q = Modulus::new(p).unwrap();
            assert!(q.inv_montgomery(0).is_none());
            for a in q.random_vec(100, &mut rng) {
                if a == 0 {
                    continue;
                }
                let a_m = q.to_montgomery(a);
                let a_inv_m = q.inv_montgomery(a_m).unwrap();
                assert_eq!(q.from_montgomery(a_inv_m), q.inv(a).unwrap());
                // a * a^-1 = 1 in the Montgomery domain.
                assert_eq!(q.from_montgomery(q.mul_montgomery(a_m, a_inv_m)), 1);
            }
        }
    }

    #[test]
    fn random_vec() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        for p in [2u64, 3, 17, 1987, 4611686018326724609] {
            let q = Modulus::new(p).unwrap();
            let v = q.random_vec(1000, &mut rng);
            assert_eq!(v.len(), 1000);
            assert!(v.iter().all(|vi| *vi < p));
        }
    }
}
