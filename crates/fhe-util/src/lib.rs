#![crate_name = "fhe_util"]
#![crate_type = "lib"]
#![warn(missing_docs, unused_imports)]

//! Utilities for the fhe.rs library.

use itertools::Itertools;
use num_bigint_dig::{prime::probably_prime, BigUint};
use rand::{CryptoRng, RngCore};

/// Returns whether the modulus p is prime; this function is 100% accurate.
pub fn is_prime(p: u64) -> bool {
    probably_prime(&BigUint::from(p), 0)
}

/// Sample a vector of independent centered binomial distributions of a given
/// variance. The variance must be a positive multiple of 1/2 and at most 16.
pub fn sample_vec_cbd<R: RngCore + CryptoRng>(
    vector_size: usize,
    variance: f32,
    rng: &mut R,
) -> Result<Vec<i64>, &'static str> {
    let k = 2.0 * variance;
    if !(1.0..=32.0).contains(&k) || k.fract() != 0.0 {
        return Err("The variance should be a multiple of 1/2 between 1/2 and 16");
    }
    let k = k as usize;

    // Each sample consumes 2k bits.
    let number_bits = 2 * k;
    let mut bytes = vec![0u8; (vector_size * number_bits).div_ceil(8)];
    rng.fill_bytes(&mut bytes);

    let bits = bytes
        .iter()
        .flat_map(|b| (0..8).map(move |i| ((b >> i) & 1) as i64))
        .take(vector_size * number_bits)
        .collect_vec();

    Ok(bits
        .chunks_exact(2 * k)
        .map(|c| c[..k].iter().sum::<i64>() - c[k..].iter().sum::<i64>())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::{is_prime, sample_vec_cbd};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn prime() {
        assert!(is_prime(2));
        assert!(is_prime(3));
        assert!(is_prime(5));
        assert!(is_prime(7));
        assert!(is_prime(4611686018326724609));

        assert!(!is_prime(0));
        assert!(!is_prime(1));
        assert!(!is_prime(4));
        assert!(!is_prime(6));
        assert!(!is_prime(8));
        assert!(!is_prime(9));
        assert!(!is_prime(4611686018326724607));
    }

    #[test]
    fn cbd() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(sample_vec_cbd(10, 0.0, &mut rng).is_err());
        assert!(sample_vec_cbd(10, 0.3, &mut rng).is_err());
        assert!(sample_vec_cbd(10, 17.0, &mut rng).is_err());

        for variance in [0.5f32, 1.0, 3.5, 10.0, 16.0] {
            let v = sample_vec_cbd(1000, variance, &mut rng).unwrap();
            assert_eq!(v.len(), 1000);
            let bound = (2.0 * variance) as i64;
            assert!(v.iter().all(|c| c.abs() <= bound));
        }

        // A variance of 1/2 yields ternary coefficients.
        let v = sample_vec_cbd(1000, 0.5, &mut rng).unwrap();
        assert!(v.iter().all(|c| (-1..=1).contains(c)));
        assert!(v.iter().any(|c| *c == 0));
        assert!(v.iter().any(|c| *c != 0));
    }

    #[test]
    fn cbd_randomness() {
        // 2k bits per sample: 1024 samples of variance 1/2 use 256 bytes,
        // and of variance 4 use 2048 bytes.
        for (variance, bytes) in [(0.5f32, 256u128), (4.0, 2048)] {
            let mut rng = ChaCha8Rng::seed_from_u64(0);
            sample_vec_cbd(1024, variance, &mut rng).unwrap();
            assert_eq!(rng.get_word_pos(), bytes / 4);
        }
    }
}
