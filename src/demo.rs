//! Compile-time demo parameters — the program takes no flags, config
//! files, or environment variables.

/// Initial window size in pixels.
pub const WIDTH: u32 = 800;
pub const HEIGHT: u32 = 600;

/// The fixed string the demo renders; also the preload set and the
/// window title.
pub const TEXT: &str = "你好，世界！";

/// Uniform scale applied to glyph metrics at draw time.
pub const SCALE: f32 = 1.5;

/// Rasterization size in pixels (pre-scale).
pub const FONT_PIXEL_SIZE: f32 = 48.0;

/// Vertical distance between the three baselines.
pub const LINE_OFFSET: f32 = 100.0;

/// Per-line color inputs in 0-255, top to bottom: black, the all-negative
/// vivid sentinel, gold.
pub const LINE_COLORS: [(f32, f32, f32); 3] = [
    (0.0, 0.0, 0.0),
    (-1.0, -1.0, -1.0),
    (255.0, 215.0, 0.0),
];

/// Frame clear color.
pub const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.2,
    g: 0.3,
    b: 0.3,
    a: 1.0,
};
