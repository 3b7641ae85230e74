//! Pen-based left-to-right layout: width pre-pass, centering, and
//! per-glyph quad geometry.

use crate::glyph::{Glyph, GlyphCache};
use crate::utf8::Codepoints;

/// Whole-pixel advance of one glyph at the given scale. The 26.6
/// fixed-point advance is truncated to whole pixels before scaling,
/// matching how the pen moves during drawing.
pub fn advance_px<T>(glyph: &Glyph<T>, scale: f32) -> f32 {
    ((glyph.advance >> 6) as f32) * scale
}

/// Sum of advances over the string without drawing anything.
///
/// Codepoints with no cache entry contribute zero — the same skip rule
/// the draw pass applies, so the pre-pass and the drawn width always
/// agree.
pub fn text_width<T>(cache: &GlyphCache<T>, text: &str, scale: f32) -> f32 {
    Codepoints::new(text)
        .filter_map(|cp| cache.get(cp))
        .map(|g| advance_px(g, scale))
        .sum()
}

/// Left edge that centers a run of `run_width` px in a viewport.
pub fn centered_origin(viewport_width: f32, run_width: f32) -> f32 {
    (viewport_width - run_width) / 2.0
}

/// Six vertices (two counter-clockwise triangles) of `[x, y, u, v]` for
/// one glyph quad.
///
/// Screen coordinates with y increasing downward; `(pen_x, pen_y)` is the
/// baseline position. The bitmap's top row maps to V = 0 so coverage
/// samples upright.
pub fn quad_vertices<T>(glyph: &Glyph<T>, pen_x: f32, pen_y: f32, scale: f32) -> [[f32; 4]; 6] {
    let x0 = pen_x + glyph.bearing_left as f32 * scale;
    let y0 = pen_y - glyph.bearing_top as f32 * scale;
    let w = glyph.width as f32 * scale;
    let h = glyph.height as f32 * scale;

    [
        [x0, y0, 0.0, 0.0],
        [x0, y0 + h, 0.0, 1.0],
        [x0 + w, y0 + h, 1.0, 1.0],
        [x0, y0, 0.0, 0.0],
        [x0 + w, y0 + h, 1.0, 1.0],
        [x0 + w, y0, 1.0, 0.0],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::RasterGlyph;

    fn insert(cache: &mut GlyphCache<u32>, ch: char, advance: i32) {
        let _ = cache.ensure_loaded(
            ch as u32,
            || {
                Some(RasterGlyph {
                    width: 8,
                    height: 12,
                    advance,
                    bearing_left: 1,
                    bearing_top: 11,
                    bitmap: vec![0xFF; 96],
                })
            },
            |_| Some(0),
        );
    }

    #[test]
    fn hi_centering_scenario() {
        // H advances 960 sub-pixel units (15 px), i advances 384 (6 px).
        let mut cache: GlyphCache<u32> = GlyphCache::new();
        insert(&mut cache, 'H', 960);
        insert(&mut cache, 'i', 384);

        let width = text_width(&cache, "Hi", 1.0);
        assert!((width - 21.0).abs() < f32::EPSILON);
        assert!((centered_origin(800.0, width) - 389.5).abs() < f32::EPSILON);
    }

    #[test]
    fn scale_multiplies_whole_pixel_advance() {
        let mut cache: GlyphCache<u32> = GlyphCache::new();
        insert(&mut cache, 'H', 960);
        assert!((text_width(&cache, "HH", 1.5) - 45.0).abs() < f32::EPSILON);
    }

    #[test]
    fn unloaded_codepoint_contributes_zero_width() {
        let mut cache: GlyphCache<u32> = GlyphCache::new();
        insert(&mut cache, 'H', 960);
        // 'i' was never rasterized.
        assert!((text_width(&cache, "Hi", 1.0) - 15.0).abs() < f32::EPSILON);
    }

    #[test]
    fn prepass_matches_draw_pass_advances() {
        let mut cache: GlyphCache<u32> = GlyphCache::new();
        insert(&mut cache, 'H', 960);
        insert(&mut cache, 'i', 384);

        let text = "HiHi";
        let scale = 1.5;
        // Mirror the draw loop: advance only for cached codepoints.
        let mut drawn = 0.0f32;
        for cp in Codepoints::new(text) {
            if let Some(g) = cache.get(cp) {
                drawn += advance_px(g, scale);
            }
        }
        assert!((drawn - text_width(&cache, text, scale)).abs() < f32::EPSILON);
    }

    #[test]
    fn quad_corners_and_uvs() {
        let glyph: Glyph<u32> = Glyph {
            texture: Some(0),
            width: 10,
            height: 12,
            advance: 960,
            bearing_left: 2,
            bearing_top: 9,
        };
        let q = quad_vertices(&glyph, 100.0, 200.0, 1.0);

        // Top-left corner: pen + bearing_left, baseline - bearing_top,
        // sampling the bitmap's top row (V = 0).
        assert_eq!(q[0], [102.0, 191.0, 0.0, 0.0]);
        // Bottom-left: 3 px below the baseline (12-row glyph, bearing 9).
        assert_eq!(q[1], [102.0, 203.0, 0.0, 1.0]);
        // Bottom-right.
        assert_eq!(q[2], [112.0, 203.0, 1.0, 1.0]);
        // Second triangle shares the diagonal and adds the top-right.
        assert_eq!(q[3], q[0]);
        assert_eq!(q[4], q[2]);
        assert_eq!(q[5], [112.0, 191.0, 1.0, 0.0]);
    }

    #[test]
    fn quad_scales_about_the_pen() {
        let glyph: Glyph<u32> = Glyph {
            texture: Some(0),
            width: 10,
            height: 12,
            advance: 960,
            bearing_left: 2,
            bearing_top: 9,
        };
        let q = quad_vertices(&glyph, 0.0, 0.0, 2.0);
        assert_eq!(q[0][0], 4.0);
        assert_eq!(q[0][1], -18.0);
        assert_eq!(q[2][0], 24.0);
        assert_eq!(q[2][1], 6.0);
    }
}
