use crate::{
    KType,
    config::constants::consensus::NETWORK_DELAY_BOUND,
    errors::config::{ConfigError, ConfigResult},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Calculates the k parameter of the GHOSTDAG protocol such that anticones larger than k will be created
/// with probability less than `delta` (follows eq. 1 from section 4.2 of the PHANTOM paper)
/// `x` is expected to be 2Dλ where D is the maximal network delay and λ is the block mining rate.
/// `delta` is an upper bound for the probability of anticones larger than k.
/// Returns the minimal k such that the above conditions hold, or `KOutOfRange` if it exceeds `KType::MAX`.
pub fn calculate_ghostdag_k(x: f64, delta: f64) -> ConfigResult<u64> {
    if x.is_nan() || x <= 0.0 {
        return Err(ConfigError::NonPositiveValue("x", x));
    }
    if delta.is_nan() || delta <= 0.0 || delta >= 1.0 {
        return Err(ConfigError::InvalidDelta(delta));
    }
    // Poisson terms e^-x * x^k / k! are accumulated in log space, since e^-x underflows for large x
    let (mut k_hat, mut sigma, mut log_term, log_x) = (0u64, 0.0, -x, x.ln());
    loop {
        sigma += log_term.exp();
        if 1.0 - sigma < delta {
            return Ok(k_hat);
        }
        if k_hat >= KType::MAX as u64 || !sigma.is_finite() {
            return Err(ConfigError::KOutOfRange(k_hat + 1));
        }
        k_hat += 1;
        log_term += log_x - (k_hat as f64).ln();
    }
}

/// Returns the k matching a network producing `bps` blocks per second with delays bounded by `max_delay` seconds
pub fn k_from_network(bps: f64, max_delay: f64, delta: f64) -> ConfigResult<u64> {
    if bps.is_nan() || bps <= 0.0 {
        return Err(ConfigError::NonPositiveValue("bps", bps));
    }
    if max_delay.is_nan() || max_delay <= 0.0 {
        return Err(ConfigError::NonPositiveValue("max_delay", max_delay));
    }
    calculate_ghostdag_k(2.0 * max_delay * bps, delta)
}

/// The range of block rates which all map to the same k
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct KThreshold {
    pub k: KType,
    pub min_bps: f64,
    pub max_bps: f64,
    pub min_seconds: u64,
    pub max_seconds: u64,
}

/// Scans block rates of 1, 1/2, ..., 1/`max_seconds_per_block` blocks per second and groups
/// them by the k each one requires. The result is sorted by ascending k.
pub fn k_thresholds(max_delay: f64, delta: f64, max_seconds_per_block: u64) -> ConfigResult<Vec<KThreshold>> {
    let mut rates: BTreeMap<u64, Vec<f64>> = BTreeMap::new();
    for seconds_per_block in 1..=max_seconds_per_block {
        let bps = 1.0 / seconds_per_block as f64;
        let k = k_from_network(bps, max_delay, delta)?;
        rates.entry(k).or_default().push(bps);
    }

    rates
        .into_iter()
        .map(|(k, rates)| {
            let k = KType::try_from(k).map_err(|_| ConfigError::KOutOfRange(k))?;
            let min_bps = rates.iter().copied().fold(f64::INFINITY, f64::min);
            let max_bps = rates.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            Ok(KThreshold {
                k,
                min_bps,
                max_bps,
                // Rates are exact reciprocals of whole seconds, so rounding recovers the integer
                min_seconds: (1.0 / max_bps).round() as u64,
                max_seconds: (1.0 / min_bps).round() as u64,
            })
        })
        .collect()
}

/// Which network quantity to hold fixed when solving for parameters yielding a target k
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NetworkConstraint {
    FixedDelay(f64),
    FixedBps(f64),
    /// Use [`NETWORK_DELAY_BOUND`] and the slowest block rate mapping to the target k
    Unconstrained,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkParams {
    pub k: KType,
    pub delay: f64,
    pub bps: f64,
    /// The product 2Dλ
    pub x: f64,
}

/// Solves for network conditions resulting in `target_k`, holding either the delay or the block rate fixed
pub fn network_params_for_k(
    target_k: KType,
    constraint: NetworkConstraint,
    max_delay: f64,
    delta: f64,
    max_seconds_per_block: u64,
) -> ConfigResult<NetworkParams> {
    let threshold = k_thresholds(max_delay, delta, max_seconds_per_block)?
        .into_iter()
        .find(|t| t.k == target_k)
        .ok_or(ConfigError::UnknownKThreshold(target_k))?;
    let x = 2.0 * max_delay * threshold.min_bps;

    let params = match constraint {
        NetworkConstraint::FixedDelay(delay) => {
            if delay.is_nan() || delay <= 0.0 {
                return Err(ConfigError::NonPositiveValue("delay", delay));
            }
            NetworkParams { k: target_k, delay, bps: x / (2.0 * delay), x }
        }
        NetworkConstraint::FixedBps(bps) => {
            if bps.is_nan() || bps <= 0.0 {
                return Err(ConfigError::NonPositiveValue("bps", bps));
            }
            NetworkParams { k: target_k, delay: x / (2.0 * bps), bps, x }
        }
        NetworkConstraint::Unconstrained => NetworkParams { k: target_k, delay: NETWORK_DELAY_BOUND, bps: threshold.min_bps, x },
    };
    Ok(params)
}
