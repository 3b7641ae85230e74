//! Font loading and glyph rasterization via fontdue.

use log::{info, warn};

/// Candidate font files, tried in order; the first that parses wins.
/// CJK-capable faces come first so the demo string renders on stock
/// Linux, Windows, and macOS installs. A relative path at the end lets a
/// bundled font take over when nothing system-wide matches.
const FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/droid/DroidSansFallbackFull.ttf",
    "/usr/share/fonts/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/wenquanyi/wqy-microhei/wqy-microhei.ttc",
    "C:/Windows/Fonts/msyh.ttc",
    "C:/Windows/Fonts/simsun.ttc",
    "/System/Library/Fonts/PingFang.ttc",
    "fonts/NotoSansSC-Regular.otf",
];

/// No candidate font could be opened. Fatal: there is no procedural
/// fallback glyph, so the demo has nothing to draw.
#[derive(Debug)]
pub struct FontError(pub String);

impl std::fmt::Display for FontError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for FontError {}

/// A rasterized glyph bitmap plus its FreeType-shaped metrics.
pub struct RasterGlyph {
    pub width: u32,
    pub height: u32,
    /// Horizontal advance in 26.6 fixed point (1/64 px).
    pub advance: i32,
    /// Pen position to bitmap left edge.
    pub bearing_left: i32,
    /// Baseline up to the bitmap's top row.
    pub bearing_top: i32,
    /// Row-major coverage, one byte per pixel, top row first.
    pub bitmap: Vec<u8>,
}

/// The loaded face. Alive only for the preload pass over the demo string;
/// dropped as soon as the glyph cache is populated.
pub struct FontFace {
    font: fontdue::Font,
    px: f32,
}

impl FontFace {
    /// Try each candidate path in order.
    pub fn load(px: f32) -> Result<Self, FontError> {
        for path in FONT_PATHS {
            let Ok(data) = std::fs::read(path) else {
                continue;
            };
            match fontdue::Font::from_bytes(data, fontdue::FontSettings::default()) {
                Ok(font) => {
                    info!("font: loaded {path}");
                    return Ok(Self { font, px });
                }
                Err(e) => warn!("font: {path} unparseable: {e}"),
            }
        }
        Err(FontError(
            "no candidate font file could be loaded".to_string(),
        ))
    }

    /// Rasterize one codepoint at the face's pixel size.
    ///
    /// Returns `None` when the face has no glyph for the codepoint; the
    /// caller logs and skips, it never aborts the batch.
    pub fn rasterize(&self, codepoint: u32) -> Option<RasterGlyph> {
        let ch = char::from_u32(codepoint)?;
        if !self.font.has_glyph(ch) {
            return None;
        }
        let (metrics, bitmap) = self.font.rasterize(ch, self.px);
        Some(convert(&metrics, bitmap))
    }
}

/// Map fontdue metrics onto the 26.6/bearing representation the glyph
/// cache stores. fontdue's `ymin` is baseline-to-bottom, so the
/// baseline-to-top bearing is `height + ymin`.
fn convert(m: &fontdue::Metrics, bitmap: Vec<u8>) -> RasterGlyph {
    RasterGlyph {
        width: m.width as u32,
        height: m.height as u32,
        advance: (m.advance_width * 64.0).round() as i32,
        bearing_left: m.xmin,
        bearing_top: m.height as i32 + m.ymin,
        bitmap,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(width: usize, height: usize, xmin: i32, ymin: i32, advance: f32) -> fontdue::Metrics {
        fontdue::Metrics {
            xmin,
            ymin,
            width,
            height,
            advance_width: advance,
            advance_height: 0.0,
            bounds: fontdue::OutlineBounds {
                xmin: 0.0,
                ymin: 0.0,
                width: 0.0,
                height: 0.0,
            },
        }
    }

    #[test]
    fn advance_converts_to_26_6() {
        // 15 px advance → 960 sub-pixel units; (960 >> 6) recovers 15.
        let g = convert(&metrics(10, 12, 1, 0, 15.0), vec![0; 120]);
        assert_eq!(g.advance, 960);
        assert_eq!(g.advance >> 6, 15);
    }

    #[test]
    fn fractional_advance_rounds() {
        let g = convert(&metrics(4, 4, 0, 0, 6.004), Vec::new());
        assert_eq!(g.advance, 384);
    }

    #[test]
    fn bearing_top_accounts_for_descender() {
        // A 12-row glyph dipping 3 px below the baseline rises 9 above it.
        let g = convert(&metrics(10, 12, 2, -3, 11.0), vec![0; 120]);
        assert_eq!(g.bearing_top, 9);
        assert_eq!(g.bearing_left, 2);
    }
}
