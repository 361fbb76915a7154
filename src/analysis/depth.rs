//! Depth heuristic, ridge detection and smoothing
//!
//! Depth is approximated by local contrast: busy, high-contrast regions read
//! as near, flat regions as far. Ridges are local gradients with a bonus for
//! strict peaks.

/// Bonus added to the ridge strength of a strict local maximum
pub const PEAK_BONUS: f64 = 0.3;

/// Default contrast window for [`depth_profile`]
pub const DEFAULT_DEPTH_WINDOW: usize = 5;

/// Bounds of a centred window of `window` elements around `i`, clipped to `len`
fn centered_window(i: usize, window: usize, len: usize) -> (usize, usize) {
    let half = window / 2;
    (i.saturating_sub(half), (i + half + 1).min(len))
}

/// Local-contrast depth estimate, 0-1.
///
/// Each position takes `max - min` over a centred window, then the array is
/// normalized by its own maximum. A profile with no contrast anywhere maps to
/// 0.5 everywhere rather than to zero.
pub fn depth_profile(brightness: &[f64], window: usize) -> Vec<f64> {
    if brightness.is_empty() {
        return Vec::new();
    }

    let contrast: Vec<f64> = (0..brightness.len())
        .map(|i| {
            let (start, end) = centered_window(i, window.max(1), brightness.len());
            let slice = &brightness[start..end];
            let min = slice.iter().copied().fold(f64::INFINITY, f64::min);
            let max = slice.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            max - min
        })
        .collect();

    let max = contrast.iter().copied().fold(0.0, f64::max);
    if max <= 0.0 {
        log::debug!("depth profile has no contrast, using neutral 0.5");
        return vec![0.5; contrast.len()];
    }
    contrast.iter().map(|c| c / max).collect()
}

/// Gradient estimate used by ridge detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RidgeMethod {
    /// `|next - prev| / 2`
    #[default]
    CentralDifference,
    /// Sobel-style 1-D kernel: the central difference weighted twice against
    /// the difference two samples out
    SobelWeighted,
}

impl RidgeMethod {
    pub fn from_weighted(weighted: bool) -> Self {
        if weighted {
            RidgeMethod::SobelWeighted
        } else {
            RidgeMethod::CentralDifference
        }
    }

    /// Label recorded as the edge detection method in analysis metadata
    pub fn label(self) -> &'static str {
        match self {
            RidgeMethod::CentralDifference => "central-difference",
            RidgeMethod::SobelWeighted => "sobel-weighted",
        }
    }
}

/// Ridge/edge strength, 0-1.
///
/// Central difference `|next - prev| / 2` (an element stands in for a missing
/// neighbour at the ends) plus [`PEAK_BONUS`] for strict local maxima,
/// clamped to 1 and normalized by the maximum. No edges at all yields zeros.
pub fn ridge_strength(profile: &[f64]) -> Vec<f64> {
    detect_ridges(profile, RidgeMethod::CentralDifference)
}

/// Ridge strength from the weighted gradient
/// `|2 * (next - prev) / 2 + (next2 - prev2) / 4| / 3`.
///
/// Missing outer samples fall back to the inner neighbour. Peak bonus, clamp
/// and normalization match [`ridge_strength`].
pub fn ridge_strength_weighted(profile: &[f64]) -> Vec<f64> {
    detect_ridges(profile, RidgeMethod::SobelWeighted)
}

/// Ridge strength with the given gradient estimate
pub fn detect_ridges(profile: &[f64], method: RidgeMethod) -> Vec<f64> {
    let ridges: Vec<f64> = (0..profile.len())
        .map(|i| {
            let current = profile[i];
            let prev = if i > 0 { profile[i - 1] } else { current };
            let next = profile.get(i + 1).copied().unwrap_or(current);

            let gradient = match method {
                RidgeMethod::CentralDifference => (next - prev).abs() / 2.0,
                RidgeMethod::SobelWeighted => {
                    let prev2 = if i > 1 { profile[i - 2] } else { prev };
                    let next2 = profile.get(i + 2).copied().unwrap_or(next);
                    let center = (next - prev) / 2.0;
                    let outer = (next2 - prev2) / 4.0;
                    (center * 2.0 + outer).abs() / 3.0
                }
            };
            let bonus = if current > prev && current > next { PEAK_BONUS } else { 0.0 };
            (gradient + bonus).min(1.0)
        })
        .collect();

    let max = ridges.iter().copied().fold(0.0, f64::max);
    if max <= 0.0 {
        return vec![0.0; ridges.len()];
    }
    ridges.iter().map(|r| r / max).collect()
}

/// Centred moving average; windows are clipped at the ends
pub fn smooth_profile(profile: &[f64], window: usize) -> Vec<f64> {
    (0..profile.len())
        .map(|i| {
            let (start, end) = centered_window(i, window.max(1), profile.len());
            let slice = &profile[start..end];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}
