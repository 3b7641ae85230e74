//! Windowed glyph-cache demo: rasterize a short CJK/Latin string with a
//! system font, cache one texture and metrics per codepoint, and draw it
//! centered as textured quads in three color modes.

pub mod app;
pub mod color;
pub mod demo;
pub mod font;
pub mod glyph;
pub mod gpu;
pub mod layout;
pub mod utf8;
