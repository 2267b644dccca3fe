//! Control loop performance metrics.
//!
//! Computed from an exported run's time series, one loop at a time.

use serde::{Deserialize, Serialize};

use crate::error::AppResult;

/// Standard loop performance metrics.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LoopMetrics {
    /// Mean of |setpoint - measurement| over all samples.
    pub mean_abs_error: Option<f64>,
    /// Final measurement minus final setpoint.
    pub steady_state_error: Option<f64>,
    /// Largest excursion of the measurement above its setpoint, in level
    /// percentage points.
    pub max_overshoot: Option<f64>,
    /// Time after which the measurement stays within ±2% of the final setpoint.
    pub settling_time_2pct_s: Option<f64>,
    pub max_command: Option<f64>,
    /// Percentage of time the command sat at its upper limit.
    pub saturation_pct_upper: Option<f64>,
}

/// Compute metrics for one loop from `(time, value)` series.
///
/// `measured` and `setpoint` must be sampled at the same instants.
pub fn compute_loop_metrics(
    measured: &[(f64, f64)],
    setpoint: &[(f64, f64)],
    command: Option<&[(f64, f64)]>,
    upper_limit: f64,
) -> AppResult<LoopMetrics> {
    if measured.is_empty() || setpoint.is_empty() {
        return Ok(LoopMetrics::default());
    }

    let mut metrics = LoopMetrics::default();

    let pairs = measured.iter().zip(setpoint);
    let n = measured.len().min(setpoint.len());
    let abs_sum: f64 = pairs.clone().map(|((_, m), (_, s))| (s - m).abs()).sum();
    metrics.mean_abs_error = Some(abs_sum / n as f64);

    let final_measured = measured.last().map(|(_, v)| *v).unwrap_or(0.0);
    let final_setpoint = setpoint.last().map(|(_, v)| *v).unwrap_or(0.0);
    metrics.steady_state_error = Some(final_measured - final_setpoint);

    let overshoot = pairs
        .map(|((_, m), (_, s))| m - s)
        .fold(f64::NEG_INFINITY, f64::max);
    if overshoot > 0.0 {
        metrics.max_overshoot = Some(overshoot);
    }

    metrics.settling_time_2pct_s = compute_settling_time(measured, final_setpoint, 0.02);

    if let Some(series) = command {
        metrics.max_command = series
            .iter()
            .map(|(_, v)| *v)
            .max_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        metrics.saturation_pct_upper = Some(compute_saturation_pct(series, upper_limit - 1e-9));
    }

    Ok(metrics)
}

/// Time at which the series enters the band `target·(1 ± tolerance)` for good.
fn compute_settling_time(series: &[(f64, f64)], target: f64, tolerance: f64) -> Option<f64> {
    if target.abs() < 1e-9 {
        return None;
    }

    let lower = target * (1.0 - tolerance);
    let upper = target * (1.0 + tolerance);

    let mut entered = false;
    let mut entry_idx = 0;

    for (i, (_, val)) in series.iter().enumerate() {
        let in_band = *val > lower && *val < upper;

        if !entered && in_band {
            entered = true;
            entry_idx = i;
        } else if entered && !in_band {
            entered = false;
        }
    }

    if entered {
        Some(series[entry_idx].0)
    } else {
        None
    }
}

/// Percentage of time the signal was at or above `threshold`.
fn compute_saturation_pct(series: &[(f64, f64)], threshold: f64) -> f64 {
    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        return 0.0;
    };
    let total_time = last.0 - first.0;
    if series.len() < 2 || total_time <= 0.0 {
        return 0.0;
    }

    let mut saturated_time = 0.0;

    for window in series.windows(2) {
        let (t1, v1) = window[0];
        let (t2, v2) = window[1];
        let dt = t2 - t1;

        if v1 >= threshold && v2 >= threshold {
            saturated_time += dt;
        } else if (v1 >= threshold) != (v2 >= threshold) {
            // Crossing: count the part of the interval above the threshold.
            let frac = (threshold - v1) / (v2 - v1);
            if (0.0..=1.0).contains(&frac) {
                saturated_time += if v1 >= threshold {
                    dt * frac
                } else {
                    dt * (1.0 - frac)
                };
            }
        }
    }

    100.0 * saturated_time / total_time
}
