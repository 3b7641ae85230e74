//! Per-glyph draw color resolution.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// How glyphs are colored within one render call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColorMode {
    /// One RGB color for every glyph, channels in 0-255.
    Fixed([f32; 3]),
    /// A fresh high-saturation color per glyph.
    Vivid,
}

impl ColorMode {
    /// Any negative channel selects `Vivid` — the `(-1, -1, -1)` sentinel
    /// the demo passes for its rainbow line.
    pub fn from_rgb(r: f32, g: f32, b: f32) -> Self {
        if r < 0.0 || g < 0.0 || b < 0.0 {
            Self::Vivid
        } else {
            Self::Fixed([r, g, b])
        }
    }
}

/// Per-render-call color source.
///
/// `Vivid` seeds from wall-clock seconds at construction, so render calls
/// within the same second produce identical color sequences.
pub struct ColorPolicy {
    mode: ColorMode,
    rng: StdRng,
}

impl ColorPolicy {
    pub fn new(mode: ColorMode) -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());
        Self::with_seed(mode, secs)
    }

    /// Explicitly seeded constructor for deterministic tests.
    pub fn with_seed(mode: ColorMode, seed: u64) -> Self {
        Self {
            mode,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Resolve the next glyph's color as shader-ready RGB in [0, 1].
    pub fn next_color(&mut self) -> [f32; 3] {
        match self.mode {
            ColorMode::Fixed([r, g, b]) => [r / 255.0, g / 255.0, b / 255.0],
            ColorMode::Vivid => vivid(&mut self.rng),
        }
    }
}

/// One uniformly chosen primary channel lands in [0.8, 1.0), the other two
/// independently in [0.0, 0.6), so every glyph reads bright against the
/// background while staying distinguishable from its neighbors.
fn vivid(rng: &mut StdRng) -> [f32; 3] {
    let primary = rng.random_range(0..3u8);
    let hi = rng.random_range(0.8..1.0f32);
    let lo_a = rng.random_range(0.0..0.6f32);
    let lo_b = rng.random_range(0.0..0.6f32);
    match primary {
        0 => [hi, lo_a, lo_b],
        1 => [lo_a, hi, lo_b],
        _ => [lo_a, lo_b, hi],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_channel_selects_vivid() {
        assert_eq!(ColorMode::from_rgb(-1.0, -1.0, -1.0), ColorMode::Vivid);
        assert_eq!(ColorMode::from_rgb(10.0, -0.5, 20.0), ColorMode::Vivid);
        assert_eq!(
            ColorMode::from_rgb(255.0, 215.0, 0.0),
            ColorMode::Fixed([255.0, 215.0, 0.0])
        );
    }

    #[test]
    fn fixed_color_normalization() {
        let mut policy = ColorPolicy::with_seed(ColorMode::from_rgb(255.0, 215.0, 0.0), 0);
        let [r, g, b] = policy.next_color();
        assert!((r - 1.0).abs() < 1e-6);
        assert!((g - 0.843137).abs() < 1e-6);
        assert!(b.abs() < 1e-6);
    }

    #[test]
    fn vivid_bounds() {
        let mut policy = ColorPolicy::with_seed(ColorMode::Vivid, 42);
        for _ in 0..500 {
            let c = policy.next_color();
            let high: Vec<f32> = c.iter().copied().filter(|&v| v >= 0.8).collect();
            let low: Vec<f32> = c.iter().copied().filter(|&v| v < 0.8).collect();
            assert_eq!(high.len(), 1, "exactly one primary channel: {c:?}");
            assert!(high[0] < 1.0, "primary below 1.0: {c:?}");
            assert_eq!(low.len(), 2);
            for v in low {
                assert!((0.0..0.6).contains(&v), "secondary in [0, 0.6): {c:?}");
            }
        }
    }

    #[test]
    fn same_seed_repeats_sequence() {
        // Two render calls inside the same wall-clock second see the same
        // seed and must produce identical colors.
        let mut a = ColorPolicy::with_seed(ColorMode::Vivid, 1_700_000_000);
        let mut b = ColorPolicy::with_seed(ColorMode::Vivid, 1_700_000_000);
        for _ in 0..16 {
            assert_eq!(a.next_color(), b.next_color());
        }
    }

    #[test]
    fn different_seed_diverges() {
        let mut a = ColorPolicy::with_seed(ColorMode::Vivid, 1);
        let mut b = ColorPolicy::with_seed(ColorMode::Vivid, 2);
        let sa: Vec<[f32; 3]> = (0..8).map(|_| a.next_color()).collect();
        let sb: Vec<[f32; 3]> = (0..8).map(|_| b.next_color()).collect();
        assert_ne!(sa, sb);
    }
}
