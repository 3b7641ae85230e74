//! GPU initialization and the per-frame glyph draw loop.

use std::sync::Arc;

use log::{info, warn};
use winit::window::Window;

use crate::color::{ColorMode, ColorPolicy};
use crate::demo;
use crate::font::{FontFace, RasterGlyph};
use crate::glyph::GlyphCache;
use crate::layout;
use crate::utf8::Codepoints;

use super::pipeline::{self, COLOR_STRIDE, QUAD_BYTES};

/// Initial capacity of the per-glyph color uniform buffer, in slots.
const INITIAL_COLOR_SLOTS: u64 = 32;

/// Fatal windowing/GPU initialization failure.
#[derive(Debug)]
pub struct GpuError(pub String);

impl std::fmt::Display for GpuError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for GpuError {}

/// Device, queue, and the window's configured surface.
pub struct Gpu {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub surface: wgpu::Surface<'static>,
    pub config: wgpu::SurfaceConfiguration,
}

impl Gpu {
    /// Create instance, surface, adapter, device, queue and configure the
    /// surface for the window's current size.
    pub fn new(window: &Arc<Window>) -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

        let surface = instance
            .create_surface(window.clone())
            .map_err(|e| GpuError(format!("create surface: {e}")))?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .map_err(|e| GpuError(format!("no suitable GPU adapter: {e}")))?;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("hello-glyphs"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            ..Default::default()
        }))
        .map_err(|e| GpuError(format!("request device: {e}")))?;

        let caps = surface.get_capabilities(&adapter);
        // Non-sRGB format so color values pass through without double
        // gamma correction.
        let format = caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .copied()
            .unwrap_or(caps.formats[0]);

        let size = window.inner_size();
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        info!(
            "gpu: adapter={}, format={format:?}",
            adapter.get_info().name
        );

        Ok(Self {
            device,
            queue,
            surface,
            config,
        })
    }

    /// Follow a framebuffer resize; the projection follows `config` on
    /// the next frame.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(&self.device, &self.config);
    }
}

/// GPU bundle for one cached glyph: the texture keeps the coverage bitmap
/// alive on the device, the bind group is what draws reference.
pub struct GlyphTexture {
    _texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

/// One recorded glyph draw within a frame.
struct DrawCmd {
    codepoint: u32,
    vertex_offset: u64,
    color_offset: u32,
}

/// Owns the pipeline, shared buffers, sampler, and the glyph cache —
/// constructed once at startup, dropped once at shutdown.
pub struct Renderer {
    pipeline: wgpu::RenderPipeline,
    projection_buffer: wgpu::Buffer,
    color_buffer: wgpu::Buffer,
    color_capacity: u64,
    uniform_layout: wgpu::BindGroupLayout,
    uniform_bind_group: wgpu::BindGroup,
    glyph_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    vertex_buffer: Option<wgpu::Buffer>,
    cache: GlyphCache<GlyphTexture>,
}

impl Renderer {
    pub fn new(gpu: &Gpu) -> Self {
        let device = &gpu.device;

        let uniform_layout = pipeline::create_uniform_bind_group_layout(device);
        let glyph_layout = pipeline::create_glyph_bind_group_layout(device);
        let text_pipeline =
            pipeline::create_text_pipeline(device, gpu.config.format, &uniform_layout, &glyph_layout);

        let projection_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("projection_buffer"),
            size: 64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let color_capacity = INITIAL_COLOR_SLOTS * COLOR_STRIDE;
        let color_buffer = create_color_buffer(device, color_capacity);
        let uniform_bind_group =
            create_uniform_bind_group(device, &uniform_layout, &projection_buffer, &color_buffer);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("glyph_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            pipeline: text_pipeline,
            projection_buffer,
            color_buffer,
            color_capacity,
            uniform_layout,
            uniform_bind_group,
            glyph_layout,
            sampler,
            vertex_buffer: None,
            cache: GlyphCache::new(),
        }
    }

    pub fn cache(&self) -> &GlyphCache<GlyphTexture> {
        &self.cache
    }

    /// Populate the cache for every codepoint of `text`. Runs once at
    /// startup while the font face is alive; codepoints that fail to
    /// rasterize are logged inside the cache and skipped at draw time.
    pub fn preload(&mut self, gpu: &Gpu, face: &FontFace, text: &str) {
        let Self {
            cache,
            glyph_layout,
            sampler,
            ..
        } = self;
        for cp in Codepoints::new(text) {
            let _ = cache.ensure_loaded(
                cp,
                || face.rasterize(cp),
                |raster| upload_glyph(&gpu.device, &gpu.queue, glyph_layout, sampler, raster),
            );
        }
        info!("glyphs: {} cached", cache.len());
    }

    /// Draw a full frame: three centered lines of the demo string, one
    /// color mode per line, one draw call per glyph.
    pub fn draw_frame(&mut self, gpu: &Gpu) {
        let width = gpu.config.width as f32;
        let height = gpu.config.height as f32;

        gpu.queue
            .write_buffer(&self.projection_buffer, 0, &ortho_projection(width, height));

        // Layout pass: collect vertex bytes, color slots, and draw order.
        let mut vertices: Vec<u8> = Vec::new();
        let mut colors: Vec<u8> = Vec::new();
        let mut draws: Vec<DrawCmd> = Vec::new();

        let center_y = height / 2.0;
        for (i, &(r, g, b)) in demo::LINE_COLORS.iter().enumerate() {
            let baseline = center_y + (i as f32 - 1.0) * demo::LINE_OFFSET;
            self.layout_line(
                demo::TEXT,
                baseline,
                width,
                ColorMode::from_rgb(r, g, b),
                &mut vertices,
                &mut colors,
                &mut draws,
            );
        }

        // Upload the shared vertex buffer; each draw binds its own slice.
        let vertex_buffer = reuse_or_create_buffer(
            &gpu.device,
            &gpu.queue,
            self.vertex_buffer.take(),
            &vertices,
            "glyph_vertices",
        );

        // Grow the color buffer if needed; the bind group follows it.
        let color_needed = (colors.len() as u64).max(COLOR_STRIDE);
        if color_needed > self.color_capacity {
            self.color_buffer = create_color_buffer(&gpu.device, color_needed);
            self.color_capacity = color_needed;
            self.uniform_bind_group = create_uniform_bind_group(
                &gpu.device,
                &self.uniform_layout,
                &self.projection_buffer,
                &self.color_buffer,
            );
        }
        if !colors.is_empty() {
            gpu.queue.write_buffer(&self.color_buffer, 0, &colors);
        }

        let frame = match gpu.surface.get_current_texture() {
            Ok(f) => f,
            Err(wgpu::SurfaceError::Lost) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                self.vertex_buffer = Some(vertex_buffer);
                return;
            }
            Err(e) => {
                warn!("surface error: {e}");
                self.vertex_buffer = Some(vertex_buffer);
                return;
            }
        };

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("text_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(demo::CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            rpass.set_pipeline(&self.pipeline);

            for cmd in &draws {
                // Draws are only recorded for textured glyphs, so the
                // lookup cannot miss; skip defensively rather than panic.
                let Some(tex) = self
                    .cache
                    .get(cmd.codepoint)
                    .and_then(|g| g.texture.as_ref())
                else {
                    continue;
                };

                rpass.set_bind_group(0, &self.uniform_bind_group, &[cmd.color_offset]);
                rpass.set_bind_group(1, &tex.bind_group, &[]);
                rpass.set_vertex_buffer(
                    0,
                    vertex_buffer.slice(cmd.vertex_offset..cmd.vertex_offset + QUAD_BYTES),
                );
                rpass.draw(0..6, 0..1);
            }
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        frame.present();

        self.vertex_buffer = Some(vertex_buffer);
    }

    /// One render call: width pre-pass over the cache, centering, then a
    /// quad + color slot per drawable glyph. Codepoints without a cache
    /// entry are skipped entirely and contribute no advance — the same
    /// rule `layout::text_width` applies, keeping both passes in sync.
    fn layout_line(
        &self,
        text: &str,
        baseline_y: f32,
        viewport_width: f32,
        mode: ColorMode,
        vertices: &mut Vec<u8>,
        colors: &mut Vec<u8>,
        draws: &mut Vec<DrawCmd>,
    ) {
        let run_width = layout::text_width(&self.cache, text, demo::SCALE);
        let mut pen_x = layout::centered_origin(viewport_width, run_width);
        let mut policy = ColorPolicy::new(mode);

        for cp in Codepoints::new(text) {
            let Some(glyph) = self.cache.get(cp) else {
                continue;
            };

            let [r, g, b] = policy.next_color();
            if glyph.texture.is_some() {
                let quad = layout::quad_vertices(glyph, pen_x, baseline_y, demo::SCALE);

                let vertex_offset = vertices.len() as u64;
                for vertex in &quad {
                    for component in vertex {
                        vertices.extend_from_slice(&component.to_ne_bytes());
                    }
                }

                let color_offset = colors.len() as u32;
                for component in [r, g, b, 1.0f32] {
                    colors.extend_from_slice(&component.to_ne_bytes());
                }
                colors.resize(colors.len() + (COLOR_STRIDE as usize - 16), 0);

                draws.push(DrawCmd {
                    codepoint: cp,
                    vertex_offset,
                    color_offset,
                });
            }

            pen_x += layout::advance_px(glyph, demo::SCALE);
        }
    }
}

/// Create the R8 coverage texture and bind group for one raster glyph.
/// Empty bitmaps (space) yield `None`: the glyph advances the pen but is
/// never drawn.
fn upload_glyph(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    glyph_layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    raster: &RasterGlyph,
) -> Option<GlyphTexture> {
    if raster.width == 0 || raster.height == 0 {
        return None;
    }

    let size = wgpu::Extent3d {
        width: raster.width,
        height: raster.height,
        depth_or_array_layers: 1,
    };

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("glyph"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::R8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    // Byte-tight rows: one byte per pixel, no padding.
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &raster.bitmap,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(raster.width),
            rows_per_image: Some(raster.height),
        },
        size,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("glyph_bind_group"),
        layout: glyph_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    });

    Some(GlyphTexture {
        _texture: texture,
        bind_group,
    })
}

fn create_color_buffer(device: &wgpu::Device, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("color_buffer"),
        size,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_uniform_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    projection_buffer: &wgpu::Buffer,
    color_buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("uniform_bind_group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: projection_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: color_buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(16),
                }),
            },
        ],
    })
}

/// Reuse an existing GPU buffer if it has enough capacity, otherwise
/// create a new one, then write the data.
fn reuse_or_create_buffer(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    existing: Option<wgpu::Buffer>,
    data: &[u8],
    label: &str,
) -> wgpu::Buffer {
    let needed = (data.len() as u64).max(QUAD_BYTES);
    if let Some(buf) = existing {
        if buf.size() >= needed {
            if !data.is_empty() {
                queue.write_buffer(&buf, 0, data);
            }
            return buf;
        }
    }
    let buf = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: needed,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    if !data.is_empty() {
        queue.write_buffer(&buf, 0, data);
    }
    buf
}

/// Orthographic pixels-to-NDC projection, y down from the top-left,
/// serialized column-major for the WGSL `mat4x4<f32>` uniform.
fn ortho_projection(w: f32, h: f32) -> [u8; 64] {
    let proj: [f32; 16] = [
        2.0 / w,
        0.0,
        0.0,
        0.0,
        0.0,
        -2.0 / h,
        0.0,
        0.0,
        0.0,
        0.0,
        1.0,
        0.0,
        -1.0,
        1.0,
        0.0,
        1.0,
    ];

    let mut bytes = [0u8; 64];
    for (i, &v) in proj.iter().enumerate() {
        bytes[i * 4..i * 4 + 4].copy_from_slice(&v.to_ne_bytes());
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_maps_corners_to_ndc() {
        let bytes = ortho_projection(800.0, 600.0);
        let mut m = [0.0f32; 16];
        for (i, chunk) in bytes.chunks_exact(4).enumerate() {
            m[i] = f32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        let apply = |x: f32, y: f32| {
            (
                m[0] * x + m[4] * y + m[12],
                m[1] * x + m[5] * y + m[13],
            )
        };
        // Top-left pixel → (-1, 1); bottom-right → (1, -1).
        assert_eq!(apply(0.0, 0.0), (-1.0, 1.0));
        assert_eq!(apply(800.0, 600.0), (1.0, -1.0));
        // Center → origin.
        assert_eq!(apply(400.0, 300.0), (0.0, 0.0));
    }

    #[test]
    fn color_slots_respect_uniform_alignment() {
        assert_eq!(COLOR_STRIDE % 256, 0);
        assert!(COLOR_STRIDE >= 16);
    }
}
