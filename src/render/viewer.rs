//! Fullscreen wgpu/winit render loop.
//!
//! Single-threaded and cooperative: each tick drains the remote event
//! queue, polls the auto-advance deadline, and redraws. Decoding and tile
//! upload happen synchronously inside the loop, trading a brief stall on
//! slide changes for a loop with no shared mutable state.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use crossbeam_channel::Receiver;
use tracing::{info, warn};
use wgpu::util::DeviceExt;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Fullscreen, Window, WindowAttributes, WindowId},
};

use crate::config::Configuration;
use crate::controller::{Phase, SlideLoader, Slideshow};
use crate::error::Error;
use crate::events::{RemoteEvent, ShutdownFlag};
use crate::layout::{self, OVERLAY_MARGIN, OverlayCorner};
use crate::render::text::{OverlayFont, TextRaster};
use crate::slides::Slide;
use crate::tiles;

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    pos: [f32; 2],
    uv: [f32; 2],
}

const QUAD: [Vertex; 4] = [
    //   NDC pos         UV
    Vertex {
        pos: [-1.0, -1.0],
        uv: [0.0, 1.0],
    }, // bottom-left
    Vertex {
        pos: [1.0, -1.0],
        uv: [1.0, 1.0],
    }, // bottom-right
    Vertex {
        pos: [-1.0, 1.0],
        uv: [0.0, 0.0],
    }, // top-left
    Vertex {
        pos: [1.0, 1.0],
        uv: [1.0, 0.0],
    }, // top-right
];

/// Corner pixels used for the placeholder/status text position.
const STATUS_MARGIN: f32 = 20.0;

/// Run the slideshow until an exit is requested.
///
/// # Errors
/// Returns an error if the window or rendering backend fails to initialize.
pub fn run(
    slides: Vec<Slide>,
    cfg: &Configuration,
    remote_rx: Receiver<RemoteEvent>,
    shutdown: ShutdownFlag,
) -> Result<()> {
    let now = Instant::now();
    let show = Slideshow::new(slides, cfg.interval, now)?;
    info!(slides = show.len(), interval = ?cfg.interval, "starting slideshow");

    let font = match OverlayFont::from_system() {
        Ok(font) => Some(font),
        Err(err) => {
            warn!(error = %err, "no overlay font; text overlays disabled");
            None
        }
    };

    let event_loop = EventLoop::new().context("creating event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);
    let mut app = App {
        show,
        remote_rx,
        shutdown,
        date_overlay: cfg.date_overlay,
        overlay_font_px: cfg.overlay_font_px,
        max_tile: cfg.max_tile_size,
        font,
        window: None,
        gpu: None,
        status: StatusOverlays::default(),
    };
    event_loop.run_app(&mut app).context("event loop failed")?;
    Ok(())
}

struct Gpu {
    _instance: wgpu::Instance,
    surface: wgpu::Surface<'static>,
    _adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    pipeline: wgpu::RenderPipeline,
    bind_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    vbuf: wgpu::Buffer,
}

/// One textured quad: a texture, its 32-byte params uniform, and the bind
/// group tying them together. Dropping it releases the texture.
struct QuadTex {
    width: u32,
    height: u32,
    params: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    _texture: wgpu::Texture,
}

/// One tile of a resident photo, with its origin in the corrected buffer.
struct GpuTile {
    origin_x: u32,
    origin_y: u32,
    quad: QuadTex,
}

/// A photo resident on the GPU for the current slide.
pub struct ResidentPhoto {
    /// Corrected (display) dimensions of the whole photo.
    width: u32,
    height: u32,
    tiles: Vec<GpuTile>,
    date: Option<QuadTex>,
}

#[derive(Default)]
struct StatusOverlays {
    loading: Option<QuadTex>,
    paused: Option<QuadTex>,
    /// Error text plus the message it was rasterized from.
    error: Option<(String, QuadTex)>,
}

/// Synchronous GPU uploader for the controller's loader seam.
struct GpuLoader<'a> {
    gpu: &'a Gpu,
    font: Option<&'a OverlayFont>,
    date_overlay: bool,
    overlay_font_px: f32,
    max_tile: u32,
}

impl SlideLoader for GpuLoader<'_> {
    type Image = ResidentPhoto;

    fn load(&mut self, slide: &Slide) -> Result<Vec<ResidentPhoto>, Error> {
        let mut resident = Vec::with_capacity(slide.photos().len());
        for photo in slide.photos() {
            let grid = tiles::load_tiled(photo, self.max_tile)?;
            let tiles = grid
                .tiles
                .iter()
                .map(|tile| GpuTile {
                    origin_x: tile.x,
                    origin_y: tile.y,
                    quad: upload_quad(self.gpu, tile.width, tile.height, &tile.pixels),
                })
                .collect();
            let date = if self.date_overlay {
                self.font.map(|font| {
                    let label = photo.taken_at.format("%Y-%m-%d").to_string();
                    upload_text(self.gpu, font, &label, self.overlay_font_px)
                })
            } else {
                None
            };
            resident.push(ResidentPhoto {
                width: grid.width,
                height: grid.height,
                tiles,
                date,
            });
        }
        let (dw, dh) = (self.gpu.config.width, self.gpu.config.height);
        layout_resident(&self.gpu.queue, &resident, dw, dh);
        Ok(resident)
    }
}

struct App {
    show: Slideshow<ResidentPhoto>,
    remote_rx: Receiver<RemoteEvent>,
    shutdown: ShutdownFlag,
    date_overlay: bool,
    overlay_font_px: f32,
    max_tile: u32,
    font: Option<OverlayFont>,
    window: Option<Arc<Window>>,
    gpu: Option<Gpu>,
    status: StatusOverlays,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }

        let attrs = WindowAttributes::default().with_title("frameshow");
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                warn!(error = %err, "cannot create window; exiting");
                self.shutdown.set();
                event_loop.exit();
                return;
            }
        };
        let monitor = window.current_monitor();
        window.set_fullscreen(Some(Fullscreen::Borderless(monitor)));
        window.set_cursor_visible(false);
        self.window = Some(window.clone());

        match pollster::block_on(init_gpu(window)) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(err) => {
                warn!(error = %err, "GPU init failed; exiting");
                self.shutdown.set();
                event_loop.exit();
                return;
            }
        }

        // Startup: load slide 0 -> READY on success, ERROR on failure.
        let Some(gpu) = self.gpu.as_ref() else { return };
        let mut loader = GpuLoader {
            gpu,
            font: self.font.as_ref(),
            date_overlay: self.date_overlay,
            overlay_font_px: self.overlay_font_px,
            max_tile: self.max_tile,
        };
        self.show.load_current(&mut loader);
        self.sync_status_overlays();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(win) = &self.window else { return };
        if win.id() != window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                self.shutdown.set();
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Released {
                    return;
                }
                match event.physical_key {
                    PhysicalKey::Code(KeyCode::Escape | KeyCode::KeyQ) => {
                        self.shutdown.set();
                        event_loop.exit();
                    }
                    // Keyboard fallback mirroring the remote's three keys.
                    PhysicalKey::Code(KeyCode::ArrowLeft) => self.apply_event(RemoteEvent::Left),
                    PhysicalKey::Code(KeyCode::ArrowRight) => self.apply_event(RemoteEvent::Right),
                    PhysicalKey::Code(KeyCode::Space | KeyCode::Enter) => {
                        self.apply_event(RemoteEvent::Select);
                    }
                    _ => {}
                }
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                if let Some(gpu) = &mut self.gpu
                    && width > 0
                    && height > 0
                {
                    gpu.config.width = width;
                    gpu.config.height = height;
                    gpu.surface.configure(&gpu.device, &gpu.config);
                    layout_resident(&gpu.queue, self.show.resident(), width, height);
                    place_status(gpu, &self.status);
                }
            }
            WindowEvent::RedrawRequested => self.draw(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        // (1) exit request
        if self.shutdown.is_set() {
            event_loop.exit();
            return;
        }
        let Some(gpu) = self.gpu.as_ref() else { return };

        // (2) drain every queued remote event, non-blocking
        let now = Instant::now();
        let mut loader = GpuLoader {
            gpu,
            font: self.font.as_ref(),
            date_overlay: self.date_overlay,
            overlay_font_px: self.overlay_font_px,
            max_tile: self.max_tile,
        };
        while let Ok(event) = self.remote_rx.try_recv() {
            self.show.handle_event(event, &mut loader, now);
        }

        // (3) wall-clock auto-advance
        self.show.poll_deadline(&mut loader, Instant::now());

        // (4) render
        self.sync_status_overlays();
        if let Some(win) = &self.window {
            win.request_redraw();
        }
    }
}

impl App {
    /// Keyboard path into the same controller transitions the remote uses.
    fn apply_event(&mut self, event: RemoteEvent) {
        let Some(gpu) = self.gpu.as_ref() else { return };
        let mut loader = GpuLoader {
            gpu,
            font: self.font.as_ref(),
            date_overlay: self.date_overlay,
            overlay_font_px: self.overlay_font_px,
            max_tile: self.max_tile,
        };
        self.show.handle_event(event, &mut loader, Instant::now());
        self.sync_status_overlays();
    }

    /// Keep the status text quads in step with the controller phase.
    fn sync_status_overlays(&mut self) {
        let Some(gpu) = self.gpu.as_ref() else { return };
        let Some(font) = self.font.as_ref() else { return };

        if self.status.loading.is_none() {
            self.status.loading = Some(upload_text(gpu, font, "Loading slide...", self.overlay_font_px));
        }
        if self.status.paused.is_none() {
            self.status.paused = Some(upload_text(gpu, font, "Slideshow paused", self.overlay_font_px));
        }

        match self.show.last_error() {
            Some(err) => {
                let message = format!("Error loading slide: {err}");
                let stale = self
                    .status
                    .error
                    .as_ref()
                    .is_none_or(|(cached, _)| *cached != message);
                if stale {
                    let quad = upload_text(gpu, font, &message, self.overlay_font_px);
                    self.status.error = Some((message, quad));
                }
            }
            None => self.status.error = None,
        }

        place_status(gpu, &self.status);
    }

    fn draw(&self) {
        let Some(gpu) = &self.gpu else { return };
        let Ok(frame) = gpu.surface.get_current_texture() else {
            return;
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("encoder"),
            });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("rpass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            rpass.set_pipeline(&gpu.pipeline);
            rpass.set_vertex_buffer(0, gpu.vbuf.slice(..));

            match self.show.phase() {
                Phase::Ready | Phase::Paused => {
                    for photo in self.show.resident() {
                        for tile in &photo.tiles {
                            draw_quad(&mut rpass, &tile.quad);
                        }
                        if let Some(date) = &photo.date {
                            draw_quad(&mut rpass, date);
                        }
                    }
                    if self.show.phase() == Phase::Paused
                        && let Some(paused) = &self.status.paused
                    {
                        draw_quad(&mut rpass, paused);
                    }
                }
                Phase::Loading => {
                    if let Some(loading) = &self.status.loading {
                        draw_quad(&mut rpass, loading);
                    }
                }
                Phase::Error => {
                    if let Some((_, error)) = &self.status.error {
                        draw_quad(&mut rpass, error);
                    }
                }
            }
        }
        gpu.queue.submit([encoder.finish()]);
        frame.present();
    }
}

fn draw_quad<'a>(rpass: &mut wgpu::RenderPass<'a>, quad: &'a QuadTex) {
    rpass.set_bind_group(0, &quad.bind_group, &[]);
    rpass.draw(0..4, 0..1);
}

async fn init_gpu(window: Arc<Window>) -> Result<Gpu> {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
    let surface = instance
        .create_surface(window.clone())
        .context("creating surface")?;

    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        })
        .await
        .context("no compatible GPU adapter found")?;

    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
            },
            None,
        )
        .await
        .context("requesting device")?;

    let caps = surface.get_capabilities(&adapter);
    let format = caps
        .formats
        .iter()
        .copied()
        .find(wgpu::TextureFormat::is_srgb)
        .unwrap_or(caps.formats[0]);
    let PhysicalSize { width, height } = window.inner_size();
    let config = wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: width.max(1),
        height: height.max(1),
        present_mode: wgpu::PresentMode::AutoVsync,
        alpha_mode: caps.alpha_modes[0],
        view_formats: vec![],
        desired_maximum_frame_latency: 1,
    };
    surface.configure(&device, &config);

    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    });

    let vbuf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("quad"),
        contents: bytemuck::cast_slice(&QUAD),
        usage: wgpu::BufferUsages::VERTEX,
    });

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("shaders/photo.wgsl").into()),
    });

    let bind_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("bind_layout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ],
    });

    let vlayout = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2],
    };

    let pip_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("pipe_layout"),
        bind_group_layouts: &[&bind_layout],
        push_constant_ranges: &[],
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("pipeline"),
        layout: Some(&pip_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: "vs_main",
            buffers: &[vlayout],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleStrip,
            strip_index_format: None,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    });

    Ok(Gpu {
        _instance: instance,
        surface,
        _adapter: adapter,
        device,
        queue,
        config,
        pipeline,
        bind_layout,
        sampler,
        vbuf,
    })
}

/// Upload an RGBA8 buffer as a quad texture with a zeroed params uniform;
/// the transform is written by the layout pass.
fn upload_quad(gpu: &Gpu, w: u32, h: u32, pixels: &[u8]) -> QuadTex {
    let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("photo"),
        size: wgpu::Extent3d {
            width: w,
            height: h,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    gpu.queue.write_texture(
        texture.as_image_copy(),
        pixels,
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(4 * w),
            rows_per_image: Some(h),
        },
        wgpu::Extent3d {
            width: w,
            height: h,
            depth_or_array_layers: 1,
        },
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    let params = gpu.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("params"),
        size: 32,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("bind_group"),
        layout: &gpu.bind_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&gpu.sampler),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: params.as_entire_binding(),
            },
        ],
    });

    QuadTex {
        width: w,
        height: h,
        params,
        bind_group,
        _texture: texture,
    }
}

fn upload_text(gpu: &Gpu, font: &OverlayFont, text: &str, px: f32) -> QuadTex {
    let TextRaster {
        width,
        height,
        pixels,
    } = font.rasterize(text, px, [255, 255, 255, 255]);
    upload_quad(gpu, width, height, &pixels)
}

/// Write a quad's 32-byte params block: NDC transform plus tint.
fn write_params(queue: &wgpu::Queue, quad: &QuadTex, rect: (f32, f32, f32, f32), dw: u32, dh: u32) {
    let transform = layout::ndc_transform(rect, dw, dh);
    let mut block = [0f32; 8];
    block[0..4].copy_from_slice(&transform);
    block[4..8].copy_from_slice(&[1.0, 1.0, 1.0, 1.0]);
    queue.write_buffer(&quad.params, 0, bytemuck::bytes_of(&block));
}

/// Recompute every resident tile's transform for the current display size,
/// plus the date overlay anchors.
fn layout_resident(queue: &wgpu::Queue, resident: &[ResidentPhoto], dw: u32, dh: u32) {
    let placements = match resident {
        [single] => vec![layout::place_single(single.width, single.height, dw, dh)],
        [left, right] => {
            let (l, r) =
                layout::place_pair((left.width, left.height), (right.width, right.height), dw, dh);
            vec![l, r]
        }
        _ => return,
    };
    let paired = resident.len() == 2;

    for (idx, (photo, placement)) in resident.iter().zip(placements.iter()).enumerate() {
        for tile in &photo.tiles {
            let rect = layout::tile_rect(
                placement,
                tile.origin_x,
                tile.origin_y,
                tile.quad.width,
                tile.quad.height,
            );
            write_params(queue, &tile.quad, rect, dw, dh);
        }
        if let Some(date) = &photo.date {
            let (tw, th) = (date.width as f32, date.height as f32);
            let (x, y) = if paired {
                let corner = if idx == 0 {
                    OverlayCorner::BottomLeft
                } else {
                    OverlayCorner::BottomRight
                };
                layout::placement_overlay_anchor(placement, corner, tw, th, OVERLAY_MARGIN)
            } else {
                layout::display_overlay_anchor(dh, th, OVERLAY_MARGIN)
            };
            write_params(queue, date, (x, y, tw, th), dw, dh);
        }
    }
}

/// Status text sits at the top-left corner, drawn 1:1.
fn place_status(gpu: &Gpu, status: &StatusOverlays) {
    let (dw, dh) = (gpu.config.width, gpu.config.height);
    for quad in [
        status.loading.as_ref(),
        status.paused.as_ref(),
        status.error.as_ref().map(|(_, quad)| quad),
    ]
    .into_iter()
    .flatten()
    {
        let rect = (
            STATUS_MARGIN,
            STATUS_MARGIN,
            quad.width as f32,
            quad.height as f32,
        );
        write_params(&gpu.queue, quad, rect, dw, dh);
    }
}
