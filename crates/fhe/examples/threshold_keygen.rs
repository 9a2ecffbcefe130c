// Dealer-less generation of a t-out-of-N shared RLWE secret key, followed by
// the reconstruction of additive shares by a quorum of t parties.

use std::{env, error::Error, process::exit};

use fhe::{
    rlwe::{RlweParametersBuilder, SecretKey},
    threshold::{CombinerQP, ShamirPublicPoint, ShamirSecretShareQP, ThresholdizerQP},
};
use fhe_math::rq::ModulusChain;
use fhe_traits::Serialize;
use rand::{rngs::OsRng, seq::SliceRandom};
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

fn print_notice_and_exit(error: Option<String>) {
    println!("  overview: Dealer-less threshold key generation");
    println!("     usage: threshold_keygen [-h] [--help] [--num_parties=<value>] [--threshold=<value>]");
    println!("constraints: 1 <= threshold <= num_parties");
    if let Some(error) = error {
        println!("     error: {error}");
    }
    exit(0);
}

fn parse_flag(arg: &str, name: &str) -> Option<usize> {
    let value = arg.strip_prefix(name)?.strip_prefix('=')?;
    match value.parse::<usize>() {
        Ok(v) => Some(v),
        Err(_) => {
            print_notice_and_exit(Some(format!("Invalid `{name}` value: {value}")));
            None
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.contains(&"-h".to_string()) || args.contains(&"--help".to_string()) {
        print_notice_and_exit(None)
    }

    let mut num_parties = 10;
    let mut threshold = 6;
    for arg in &args {
        if let Some(v) = parse_flag(arg, "--num_parties") {
            num_parties = v
        } else if let Some(v) = parse_flag(arg, "--threshold") {
            threshold = v
        } else {
            print_notice_and_exit(Some(format!("Unrecognized argument: {arg}")))
        }
    }
    if threshold == 0 || threshold > num_parties {
        print_notice_and_exit(Some(
            "The threshold must be between 1 and the number of parties".to_string(),
        ))
    }

    let par = RlweParametersBuilder::new()
        .set_degree(4096)
        .set_moduli_sizes(&[60, 60, 60])
        .set_p_moduli_sizes(&[61])
        .build_arc()?;
    let thresholdizer = ThresholdizerQP::from_parameters(&par);
    let ring = thresholdizer.chain();
    let level = ring.max_level();
    info!(num_parties, threshold, degree = par.degree(), "parameters ready");

    let points = (1..=num_parties as u64)
        .map(ShamirPublicPoint::new)
        .collect::<Result<Vec<_>, _>>()?;

    // Every party samples a secret key and deals shares of it; `inbox[j]`
    // collects the serialized shares addressed to party j.
    let mut rng = OsRng;
    let mut sks = Vec::with_capacity(num_parties);
    let mut inbox = vec![vec![]; num_parties];
    for _ in 0..num_parties {
        let sk = SecretKey::random(&par, &mut rng)?;
        let poly = thresholdizer.gen_shamir_polynomial(threshold, &*sk.to_poly_qp()?, &mut rng)?;
        for (j, share) in thresholdizer
            .gen_shamir_secret_shares(&points, &poly)?
            .iter()
            .enumerate()
        {
            inbox[j].push(share.to_bytes());
        }
        sks.push(sk);
    }
    info!(
        share_size = inbox[0][0].len(),
        "all parties dealt their shares"
    );

    // Every party aggregates what it received into a share of the sum of
    // the secret keys.
    let mut aggregated = Vec::with_capacity(num_parties);
    for received in &inbox {
        let mut acc = thresholdizer.allocate_share(level)?;
        for bytes in received {
            let share = ShamirSecretShareQP::from_bytes(bytes, ring, level)?;
            thresholdizer.aggregate_shares_assign(&mut acc, &share)?;
        }
        aggregated.push(acc);
    }

    // A random quorum reconstructs additive shares of the collective key.
    let mut actives = points.clone();
    actives.shuffle(&mut rng);
    actives.truncate(threshold);
    actives.sort();

    let mut collective = ring.zero_at(level)?;
    for own in &actives {
        let index = points.iter().position(|p| p == own).ok_or("unknown party")?;
        let mut combiner = CombinerQP::from_parameters(&par, *own, &actives, threshold)?;
        let additive = combiner.additive_share(&actives, *own, &aggregated[index])?;
        ring.add_assign(&mut collective, &additive)?;
    }

    let mut ideal = ring.zero_at(level)?;
    for sk in &sks {
        ring.add_assign(&mut ideal, &*sk.to_poly_qp()?)?;
    }
    if collective != ideal {
        return Err("the quorum did not reconstruct the collective secret key".into());
    }
    info!(
        quorum = ?actives.iter().map(|p| p.value()).collect::<Vec<_>>(),
        "the quorum reconstructed the collective secret key"
    );
    Ok(())
}
