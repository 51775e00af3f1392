//! Return and dispersion statistics over close-price windows.
//!
//! pct_change[i] = (C[i+1] - C[i]) / C[i]
//! Sample stddev divides by n - 1, population stddev by n.

use crate::domain::price_series::PricePoint;

/// Day-over-day percentage returns. A non-positive previous close yields 0.
pub fn pct_changes(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .map(|w| {
            let prev = w[0];
            if prev > 0.0 { (w[1] - prev) / prev } else { 0.0 }
        })
        .collect()
}

pub fn window_returns(window: &[PricePoint]) -> Vec<f64> {
    let closes: Vec<f64> = window.iter().map(|p| p.close).collect();
    pct_changes(&closes)
}

/// (last / first) - 1 over the window; 0 for fewer than two points.
pub fn momentum(window: &[PricePoint]) -> f64 {
    match (window.first(), window.last()) {
        (Some(first), Some(last)) if window.len() >= 2 && first.close > 0.0 => {
            last.close / first.close - 1.0
        }
        _ => 0.0,
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn sample_stddev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

pub fn population_stddev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / values.len() as f64).sqrt())
}

/// Pearson correlation of two equally long series. `None` when the lengths
/// differ, fewer than two pairs exist, or either side has zero variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let mx = mean(xs)?;
    let my = mean(ys)?;

    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mx;
        let dy = y - my;
        cov += dx * dy;
        vx += dx * dx;
        vy += dy * dy;
    }

    if vx <= 0.0 || vy <= 0.0 {
        return None;
    }
    let r = cov / (vx.sqrt() * vy.sqrt());
    Some(r.clamp(-1.0, 1.0))
}
