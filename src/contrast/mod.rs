//! Luminance-based contrast evaluation and bounded auto-correction.
//!
//! The luminance formula here is the simplified perceptual weighting
//! `0.299*R + 0.587*G + 0.114*B` over [0,1]-normalized channels. It is an
//! approximation of WCAG relative luminance (no sRGB linearization) and is
//! kept as-is: changing it would change which colors get flagged and fixed.

use crate::color::Rgb;

/// Upper bound on lightness-adjustment steps inside [`fix_color`].
pub const MAX_FIX_ITERATIONS: u8 = 20;

/// Fraction of the remaining distance toward the target extreme covered
/// per adjustment step.
const LIGHTNESS_STEP: f64 = 0.1;

/// Backgrounds at or above this luminance are treated as light.
const LUMINANCE_MIDPOINT: f64 = 0.5;

/// Weighted luminance of a color, in `[0.0, 1.0]`.
pub fn luminance(color: Rgb) -> f64 {
    let (r, g, b) = color.rgb();
    (0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b)) / 255.0
}

/// Contrast ratio between two colors, in `[1.0, 21.0]`. Symmetric in its
/// arguments.
pub fn contrast_ratio(a: Rgb, b: Rgb) -> f64 {
    let la = luminance(a);
    let lb = luminance(b);
    let (lighter, darker) = if la >= lb { (la, lb) } else { (lb, la) };
    (lighter + 0.05) / (darker + 0.05)
}

/// Result of an auto-fix search. `converged` is false when the iteration
/// bound was hit before `min_ratio` was reached; the color is still the
/// best one found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixOutcome {
    pub color: Rgb,
    pub converged: bool,
    pub iterations: u8,
}

/// Adjust `color` until it meets `min_ratio` contrast against
/// `background`, or the iteration bound is reached.
///
/// A compliant input is returned unchanged. Otherwise the color is stepped
/// away from the background's side of the luminance midpoint — lightened
/// over a dark background, darkened over a light one — which moves it
/// monotonically toward an extreme and strictly increases contrast.
pub fn fix_color(color: Rgb, background: Rgb, min_ratio: f64) -> FixOutcome {
    if contrast_ratio(color, background) >= min_ratio {
        return FixOutcome {
            color,
            converged: true,
            iterations: 0,
        };
    }

    let lighten = luminance(background) < LUMINANCE_MIDPOINT;
    let mut current = color;
    for step in 1..=MAX_FIX_ITERATIONS {
        current = if lighten {
            lighten_step(current)
        } else {
            darken_step(current)
        };
        if contrast_ratio(current, background) >= min_ratio {
            return FixOutcome {
                color: current,
                converged: true,
                iterations: step,
            };
        }
    }

    tracing::warn!(
        color = %color,
        background = %background,
        min_ratio,
        reached = contrast_ratio(current, background),
        "contrast fix hit iteration bound; returning best effort"
    );
    FixOutcome {
        color: current,
        converged: false,
        iterations: MAX_FIX_ITERATIONS,
    }
}

fn lighten_step(color: Rgb) -> Rgb {
    Rgb::new(
        lighten_channel(color.r),
        lighten_channel(color.g),
        lighten_channel(color.b),
    )
}

fn darken_step(color: Rgb) -> Rgb {
    Rgb::new(
        darken_channel(color.r),
        darken_channel(color.g),
        darken_channel(color.b),
    )
}

// Ceil keeps every step making progress, so the extremes stay reachable.
fn lighten_channel(channel: u8) -> u8 {
    let headroom = f64::from(u8::MAX - channel);
    channel.saturating_add((headroom * LIGHTNESS_STEP).ceil() as u8)
}

fn darken_channel(channel: u8) -> u8 {
    channel.saturating_sub((f64::from(channel) * LIGHTNESS_STEP).ceil() as u8)
}
