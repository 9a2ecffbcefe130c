//! Generation of NTT-friendly primes.

use fhe_util::is_prime;

/// Returns the largest prime `p` strictly smaller than `upper_bound` such that
/// `p` has exactly `num_bits` bits and `p = 1 mod modulo`, or None if there is
/// no such prime.
///
/// Aborts if `num_bits` is not between 10 and 62, or if `modulo` is not a
/// power of two, in debug mode.
pub fn generate_prime(num_bits: usize, modulo: u64, upper_bound: u64) -> Option<u64> {
    debug_assert!((10..=62).contains(&num_bits));
    debug_assert!(modulo.is_power_of_two());
    debug_assert!(upper_bound <= 1u64 << num_bits);

    if upper_bound < 2 || modulo >= upper_bound {
        return None;
    }

    let lower_bound = 1u64 << (num_bits - 1);
    let mut candidate = upper_bound - 1;
    candidate -= (candidate - 1) % modulo;
    if candidate == upper_bound {
        candidate -= modulo;
    }

    while candidate >= lower_bound {
        if is_prime(candidate) {
            return Some(candidate);
        }
        candidate = candidate.checked_sub(modulo)?;
    }

    None
}
