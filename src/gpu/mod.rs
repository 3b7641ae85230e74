//! wgpu device state, render pipeline, and the per-frame text renderer.

mod pipeline;
mod renderer;

pub use renderer::{Gpu, GpuError, GlyphTexture, Renderer};
