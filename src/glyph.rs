//! Codepoint-keyed glyph cache.
//!
//! Entries are created once, on first need, and never evicted; the whole
//! cache is dropped at shutdown. That makes it unsuitable for open-ended
//! or streaming text — fine here, where the input is one fixed string.

use std::collections::HashMap;

use log::warn;

use crate::font::RasterGlyph;

/// One cached glyph. `T` is the GPU texture bundle in production; tests
/// substitute a plain value so cache logic runs without a device.
pub struct Glyph<T> {
    /// `None` for glyphs with an empty bitmap (space): they advance the
    /// pen but must never be drawn.
    pub texture: Option<T>,
    pub width: u32,
    pub height: u32,
    /// Horizontal advance in 26.6 fixed point (1/64 px).
    pub advance: i32,
    pub bearing_left: i32,
    pub bearing_top: i32,
}

pub struct GlyphCache<T> {
    entries: HashMap<u32, Glyph<T>>,
}

impl<T> GlyphCache<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn get(&self, codepoint: u32) -> Option<&Glyph<T>> {
        self.entries.get(&codepoint)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a codepoint, rasterizing and uploading on first need.
    ///
    /// A hit returns the cached entry with no side effects. On a miss the
    /// rasterizer runs exactly once; if it fails, the codepoint stays
    /// uncached (layout and draw both skip it) rather than aborting the
    /// batch. `upload` turns the raster output into the texture bundle
    /// and may return `None` for empty bitmaps.
    pub fn ensure_loaded(
        &mut self,
        codepoint: u32,
        rasterize: impl FnOnce() -> Option<RasterGlyph>,
        upload: impl FnOnce(&RasterGlyph) -> Option<T>,
    ) -> Option<&Glyph<T>> {
        // contains_key rather than the entry API: the upload closure needs
        // the raster output before anything is inserted.
        if !self.entries.contains_key(&codepoint) {
            let Some(raster) = rasterize() else {
                warn!("glyph: failed to rasterize U+{codepoint:04X}, skipping");
                return None;
            };
            let texture = upload(&raster);
            self.entries.insert(
                codepoint,
                Glyph {
                    texture,
                    width: raster.width,
                    height: raster.height,
                    advance: raster.advance,
                    bearing_left: raster.bearing_left,
                    bearing_top: raster.bearing_top,
                },
            );
        }
        self.entries.get(&codepoint)
    }
}

impl<T> Default for GlyphCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raster(advance: i32) -> RasterGlyph {
        RasterGlyph {
            width: 8,
            height: 10,
            advance,
            bearing_left: 1,
            bearing_top: 9,
            bitmap: vec![0xFF; 80],
        }
    }

    #[test]
    fn second_call_is_a_no_op() {
        let mut cache: GlyphCache<u32> = GlyphCache::new();
        let mut raster_calls = 0;
        let mut upload_calls = 0;

        for _ in 0..2 {
            let entry = cache
                .ensure_loaded(
                    0x4F60,
                    || {
                        raster_calls += 1;
                        Some(raster(960))
                    },
                    |_| {
                        upload_calls += 1;
                        Some(7)
                    },
                )
                .unwrap();
            assert_eq!(entry.advance, 960);
            assert_eq!(entry.texture, Some(7));
        }

        assert_eq!(raster_calls, 1, "rasterized exactly once");
        assert_eq!(upload_calls, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn failed_rasterization_inserts_nothing() {
        let mut cache: GlyphCache<u32> = GlyphCache::new();
        let entry = cache.ensure_loaded(0xFFFF, || None, |_| Some(1));
        assert!(entry.is_none());
        assert!(cache.is_empty());
        assert!(cache.get(0xFFFF).is_none());
    }

    #[test]
    fn empty_bitmap_caches_without_texture() {
        let mut cache: GlyphCache<u32> = GlyphCache::new();
        let entry = cache
            .ensure_loaded(
                ' ' as u32,
                || {
                    Some(RasterGlyph {
                        width: 0,
                        height: 0,
                        advance: 384,
                        bearing_left: 0,
                        bearing_top: 0,
                        bitmap: Vec::new(),
                    })
                },
                |_| None,
            )
            .unwrap();
        // Cached (and so it advances the pen) but untextured (never drawn).
        assert!(entry.texture.is_none());
        assert_eq!(entry.advance, 384);
    }
}
