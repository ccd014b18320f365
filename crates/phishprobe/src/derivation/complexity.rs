//! Complexity, entropy, compression and fractal measures.

use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::collections::{HashMap, HashSet};
use std::io::Write;

/// Largest Higuchi scale considered.
pub const HIGUCHI_KMAX: usize = 10;

/// Distinct characters divided by length (length floored to 1).
pub fn url_complexity(url: &str) -> f64 {
    let len = url.chars().count().max(1);
    let distinct: HashSet<char> = url.chars().collect();
    distinct.len() as f64 / len as f64
}

/// Mean absolute difference between consecutive code points; 0 for
/// strings of length 0 or 1.
pub fn character_complexity(url: &str) -> f64 {
    let points: Vec<i64> = url.chars().map(|c| c as i64).collect();
    if points.len() < 2 {
        return 0.0;
    }
    let total: i64 = points.windows(2).map(|w| (w[1] - w[0]).abs()).sum();
    total as f64 / (points.len() - 1) as f64
}

/// Shannon entropy in bits over the character distribution.
pub fn shannon_entropy(url: &str) -> f64 {
    let mut freq: HashMap<char, usize> = HashMap::new();
    let mut len = 0usize;
    for c in url.chars() {
        *freq.entry(c).or_default() += 1;
        len += 1;
    }
    if len == 0 {
        return 0.0;
    }
    let entropy: f64 = freq
        .values()
        .map(|&count| {
            let p = count as f64 / len as f64;
            -p * p.log2()
        })
        .sum();
    // a single repeated symbol gives -0.0
    entropy.max(0.0)
}

/// Compressed size over original size using zlib at the default level.
///
/// Lower means more compressible and therefore less random. Returns 0 for
/// the empty string.
pub fn kolmogorov_complexity(url: &str) -> f64 {
    let bytes = url.as_bytes();
    if bytes.is_empty() {
        return 0.0;
    }
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    let compressed = match encoder.write_all(bytes).and_then(|_| encoder.finish()) {
        Ok(out) => out,
        // writing into a Vec cannot fail
        Err(_) => return 0.0,
    };
    compressed.len() as f64 / bytes.len() as f64
}

/// Higuchi fractal dimension of the URL's code-point sequence.
///
/// For each scale `k` in `1..=min(kmax, N/2)` the mean normalized curve
/// length over all `k` offsets is computed, and the slope of `ln L(k)`
/// against `-ln k` is returned. Yields 0 when the string is shorter than two
/// characters, fewer than two scales exist, or any curve length is zero.
pub fn higuchi_fractal_dimension(url: &str, kmax: usize) -> f64 {
    let x: Vec<f64> = url.chars().map(|c| c as u32 as f64).collect();
    let n = x.len();
    if n < 2 {
        return 0.0;
    }
    let kmax = kmax.min(n / 2).max(1);

    let mut lengths = Vec::with_capacity(kmax);
    for k in 1..=kmax {
        let mut per_offset = Vec::with_capacity(k);
        for m in 0..k {
            let n_max = (n - m - 1) / k;
            if n_max == 0 {
                continue;
            }
            let sum: f64 = (1..=n_max)
                .map(|i| (x[m + i * k] - x[m + (i - 1) * k]).abs())
                .sum();
            per_offset.push(sum * (n - 1) as f64 / (n_max * k) as f64);
        }
        if !per_offset.is_empty() {
            lengths.push(per_offset.iter().sum::<f64>() / per_offset.len() as f64);
        }
    }

    if lengths.len() < 2 || lengths.iter().any(|&l| l <= 0.0) {
        return 0.0;
    }

    let xs: Vec<f64> = (1..=lengths.len()).map(|k| -(k as f64).ln()).collect();
    let ys: Vec<f64> = lengths.iter().map(|l| l.ln()).collect();
    linear_slope(&xs, &ys).unwrap_or(0.0)
}

/// Least-squares slope of `ys` on `xs`; `None` when `xs` has no spread.
fn linear_slope(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;
    let mut num = 0.0;
    let mut den = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        num += (x - mean_x) * (y - mean_y);
        den += (x - mean_x) * (x - mean_x);
    }
    if den.abs() < f64::EPSILON {
        return None;
    }
    let slope = num / den;
    slope.is_finite().then_some(slope)
}
