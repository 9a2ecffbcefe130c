use fhe::{
    rlwe::{RlweParameters, RlweParametersBuilder, SecretKey},
    threshold::{
        Combiner, ShamirPublicPoint, ShamirSecretShare, Thresholdizer, ThresholdizerQ,
        ThresholdizerQP,
    },
    Error,
};
use fhe_math::rq::{ModulusChain, RingQ, RingQP};
use fhe_traits::Serialize;
use rand::{seq::SliceRandom, CryptoRng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::{error::Error as StdError, sync::Arc};

type TestResult = Result<(), Box<dyn StdError>>;

fn params() -> Result<Arc<RlweParameters>, Box<dyn StdError>> {
    Ok(RlweParametersBuilder::new()
        .set_degree(32)
        .set_moduli_sizes(&[62, 50, 40])
        .set_p_moduli_sizes(&[61, 30])
        .build_arc()?)
}

fn points(values: impl IntoIterator<Item = u64>) -> Result<Vec<ShamirPublicPoint>, Error> {
    values.into_iter().map(ShamirPublicPoint::new).collect()
}

/// Runs the combiner of every member of the quorum made of the first
/// `threshold` points of `actives`, and sums the additive shares.
fn reconstruct<C: ModulusChain>(
    chain: &C,
    all: &[ShamirPublicPoint],
    shares: &[ShamirSecretShare<C>],
    actives: &[ShamirPublicPoint],
    threshold: usize,
) -> Result<C::Element, Box<dyn StdError>> {
    let level = shares[0].level(chain)?;
    let mut sum = chain.zero_at(level)?;
    for own in &actives[..threshold] {
        let index = all.iter().position(|p| p == own).ok_or("unknown party")?;
        let mut combiner = Combiner::new(chain.clone(), *own, actives, threshold)?;
        let additive = combiner.additive_share(actives, *own, &shares[index])?;
        chain.add_assign(&mut sum, &additive)?;
    }
    Ok(sum)
}

fn check_reconstruction<C: ModulusChain, R: RngCore + CryptoRng>(
    thresholdizer: &Thresholdizer<C>,
    level: C::Level,
    rng: &mut R,
) -> TestResult {
    let chain = thresholdizer.chain();
    for threshold in 1..=4 {
        for n in threshold..=6 {
            let secret = chain.random_at(level, rng)?;
            let all = points((1..=n as u64).map(|i| 3 * i + 1))?;
            let poly = thresholdizer.gen_shamir_polynomial(threshold, &secret, rng)?;
            let shares = thresholdizer.gen_shamir_secret_shares(&all, &poly)?;

            for _ in 0..3 {
                let mut actives = all.clone();
                actives.shuffle(rng);
                actives.truncate(threshold);
                assert_eq!(
                    reconstruct(chain, &all, &shares, &actives, threshold)?,
                    secret
                );
            }
        }
    }
    Ok(())
}

#[test]
fn reconstruction_q() -> TestResult {
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let params = params()?;
    let thresholdizer = ThresholdizerQ::from_parameters(&params);
    for level in 0..=params.max_level() {
        check_reconstruction(&thresholdizer, level, &mut rng)?;
    }
    Ok(())
}

#[test]
fn reconstruction_qp() -> TestResult {
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let params = params()?;
    let thresholdizer = ThresholdizerQP::from_parameters(&params);
    check_reconstruction(&thresholdizer, (2, Some(1)), &mut rng)?;
    check_reconstruction(&thresholdizer, (0, Some(1)), &mut rng)?;
    check_reconstruction(&thresholdizer, (1, Some(0)), &mut rng)?;
    Ok(())
}

#[test]
fn combiner_over_all_parties() -> TestResult {
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let params = params()?;
    let thresholdizer = ThresholdizerQP::from_parameters(&params);
    let chain = thresholdizer.chain();
    let level = chain.max_level();
    let secret = chain.random_at(level, &mut rng)?;

    let all = points([5, 9, 13, 17, 21])?;
    let threshold = 3;
    let poly = thresholdizer.gen_shamir_polynomial(threshold, &secret, &mut rng)?;
    let shares = thresholdizer.gen_shamir_secret_shares(&all, &poly)?;

    // The combiners know every party, and the agreed quorum is a prefix of
    // the active parties.
    let actives = points([21, 5, 13, 9])?;
    let mut sum = chain.zero_at(level)?;
    for own in &actives[..threshold] {
        let index = all.iter().position(|p| p == own).ok_or("unknown party")?;
        let mut combiner = Combiner::<RingQP>::from_parameters(&params, *own, &all, threshold)?;
        let additive = combiner.additive_share(&actives, *own, &shares[index])?;
        chain.add_assign(&mut sum, &additive)?;
    }
    assert_eq!(sum, secret);
    Ok(())
}

#[test]
fn insufficient_parties() -> TestResult {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let params = params()?;
    let thresholdizer = ThresholdizerQ::from_parameters(&params);
    let chain = thresholdizer.chain();
    let secret = chain.random_at(2, &mut rng)?;

    let all = points(1..=5)?;
    let poly = thresholdizer.gen_shamir_polynomial(4, &secret, &mut rng)?;
    let shares = thresholdizer.gen_shamir_secret_shares(&all, &poly)?;

    for size in 0..4 {
        let actives = &all[..size];
        let mut combiner = Combiner::<RingQ>::from_parameters(&params, all[0], &all, 4)?;
        let mut out = chain.random_at(2, &mut rng)?;
        let before = out.clone();
        assert_eq!(
            combiner
                .gen_additive_share(actives, all[0], &shares[0], &mut out)
                .unwrap_err(),
            Error::InsufficientParties(size, 4)
        );
        assert_eq!(out, before);
        assert!(combiner
            .additive_share(actives, all[0], &shares[0])
            .is_err());
    }
    Ok(())
}

fn check_linearity<C: ModulusChain, R: RngCore + CryptoRng>(
    thresholdizer: &Thresholdizer<C>,
    rng: &mut R,
) -> TestResult {
    let chain = thresholdizer.chain();
    let level = chain.max_level();
    let threshold = 3;
    let all = points([2, 4, 6, 8])?;

    let s1 = chain.random_at(level, rng)?;
    let s2 = chain.random_at(level, rng)?;
    let poly1 = thresholdizer.gen_shamir_polynomial(threshold, &s1, rng)?;
    let poly2 = thresholdizer.gen_shamir_polynomial(threshold, &s2, rng)?;
    let shares1 = thresholdizer.gen_shamir_secret_shares(&all, &poly1)?;
    let shares2 = thresholdizer.gen_shamir_secret_shares(&all, &poly2)?;

    let mut aggregated = Vec::with_capacity(all.len());
    for (a, b) in shares1.iter().zip(&shares2) {
        let mut out = thresholdizer.allocate_share(level)?;
        thresholdizer.aggregate_shares(a, b, &mut out)?;
        aggregated.push(out);
    }

    let mut expected = chain.zero_at(level)?;
    chain.add(&s1, &s2, &mut expected)?;
    let actives = points([8, 2, 6])?;
    assert_eq!(
        reconstruct(chain, &all, &aggregated, &actives, threshold)?,
        expected
    );
    Ok(())
}

#[test]
fn aggregation_linearity() -> TestResult {
    let mut rng = ChaCha8Rng::seed_from_u64(4);
    let params = params()?;
    check_linearity(&ThresholdizerQ::from_parameters(&params), &mut rng)?;
    check_linearity(&ThresholdizerQP::from_parameters(&params), &mut rng)?;
    Ok(())
}

#[test]
fn level_mismatch() -> TestResult {
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let params = params()?;
    let thresholdizer = ThresholdizerQP::from_parameters(&params);
    let chain = thresholdizer.chain();

    let high = ShamirSecretShare::new(chain.random_at((2, Some(1)), &mut rng)?);
    let low = ShamirSecretShare::new(chain.random_at((1, Some(1)), &mut rng)?);

    let mut out = ShamirSecretShare::new(chain.random_at((2, Some(1)), &mut rng)?);
    let before = out.clone();
    assert!(matches!(
        thresholdizer.aggregate_shares(&high, &low, &mut out),
        Err(Error::LevelMismatch(_))
    ));
    assert_eq!(out, before);

    let mut acc = low.clone();
    assert!(matches!(
        thresholdizer.aggregate_shares_assign(&mut acc, &high),
        Err(Error::LevelMismatch(_))
    ));
    assert_eq!(acc, low);

    let all = points([1, 2])?;
    let mut combiner = Combiner::<RingQP>::from_parameters(&params, all[0], &all, 2)?;
    let mut out = chain.random_at((1, Some(1)), &mut rng)?;
    let before = out.clone();
    assert!(matches!(
        combiner.gen_additive_share(&all, all[0], &high, &mut out),
        Err(Error::LevelMismatch(_))
    ));
    assert_eq!(out, before);
    Ok(())
}

#[test]
fn deterministic_lagrange_coefficients() -> TestResult {
    let params = params()?;
    let all = points([3, 1, 4, 15, 9])?;
    for own in &all {
        let a = Combiner::<RingQP>::from_parameters(&params, *own, &all, 3)?;
        let b = Combiner::<RingQP>::from_parameters(&params, *own, &all, 3)?;
        for other in all.iter().filter(|other| *other != own) {
            let ca = a.lagrange_coefficient(*other).ok_or("missing coefficient")?;
            let cb = b.lagrange_coefficient(*other).ok_or("missing coefficient")?;
            assert_eq!(ca.to_bytes(), cb.to_bytes());
        }
        assert!(a.lagrange_coefficient(*own).is_none());
    }
    Ok(())
}

#[test]
fn threshold_one() -> TestResult {
    let mut rng = ChaCha8Rng::seed_from_u64(6);
    let params = params()?;
    let thresholdizer = ThresholdizerQ::from_parameters(&params);
    let chain = thresholdizer.chain();
    let secret = chain.random_at(1, &mut rng)?;

    let all = points(1..=4)?;
    let poly = thresholdizer.gen_shamir_polynomial(1, &secret, &mut rng)?;
    let shares = thresholdizer.gen_shamir_secret_shares(&all, &poly)?;
    for (own, share) in all.iter().zip(&shares) {
        assert_eq!(share.value(), &secret);
        let mut combiner = Combiner::<RingQ>::from_parameters(&params, *own, &all, 1)?;
        assert_eq!(combiner.additive_share(&[*own], *own, share)?, secret);
    }
    Ok(())
}

/// Every party deals shares of a fresh secret key; the aggregated shares of
/// any quorum reconstruct the sum of the secret keys, i.e. the key an
/// independent key generator would have produced for the sum.
#[test]
fn distributed_key_generation() -> TestResult {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let params = params()?;
    let thresholdizer = ThresholdizerQP::from_parameters(&params);
    let chain = thresholdizer.chain();
    let level = chain.max_level();

    let n = 5;
    let threshold = 3;
    let all = points(1..=n as u64)?;

    let sks = (0..n)
        .map(|_| SecretKey::random(&params, &mut rng))
        .collect::<Result<Vec<_>, _>>()?;
    let mut ideal = chain.zero_at(level)?;
    for sk in &sks {
        chain.add_assign(&mut ideal, &*sk.to_poly_qp()?)?;
    }

    // shares[j][i] is the share dealt by party i to party j, shipped as bytes.
    let mut received = vec![Vec::with_capacity(n); n];
    for sk in &sks {
        let poly = thresholdizer.gen_shamir_polynomial(threshold, &*sk.to_poly_qp()?, &mut rng)?;
        for (j, recipient) in all.iter().enumerate() {
            let mut share = thresholdizer.allocate_share(level)?;
            thresholdizer.gen_shamir_secret_share(*recipient, &poly, &mut share)?;
            received[j].push(share.to_bytes());
        }
    }

    let mut aggregated = Vec::with_capacity(n);
    for bytes in &received {
        let mut acc = thresholdizer.allocate_share(level)?;
        for b in bytes {
            let share = ShamirSecretShare::from_bytes(b, chain, level)?;
            thresholdizer.aggregate_shares_assign(&mut acc, &share)?;
        }
        aggregated.push(acc);
    }

    for actives in [points([1, 2, 3])?, points([5, 3, 1, 2])?, points([4, 2, 5])?] {
        assert_eq!(
            reconstruct(chain, &all, &aggregated, &actives, threshold)?,
            ideal
        );
    }

    // The same holds over the ciphertext moduli only, at a lower level.
    let thresholdizer = ThresholdizerQ::from_parameters(&params);
    let chain = thresholdizer.chain();
    let mut ideal = chain.zero_at(1)?;
    let mut aggregated = (0..n)
        .map(|_| thresholdizer.allocate_share(1))
        .collect::<Result<Vec<_>, _>>()?;
    for sk in &sks {
        let secret = sk.to_poly_q(1)?;
        chain.add_assign(&mut ideal, &*secret)?;
        let poly = thresholdizer.gen_shamir_polynomial(threshold, &*secret, &mut rng)?;
        let shares = thresholdizer.gen_shamir_secret_shares(&all, &poly)?;
        for (acc, share) in aggregated.iter_mut().zip(&shares) {
            thresholdizer.aggregate_shares_assign(acc, share)?;
        }
    }
    assert_eq!(
        reconstruct(chain, &all, &aggregated, &points([2, 4, 5])?, threshold)?,
        ideal
    );
    Ok(())
}
