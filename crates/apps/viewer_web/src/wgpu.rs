use foundation::math::Mat4;
use gpu::{RenderCommand, RenderFrame};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Globals {
    pub view_proj: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
}

impl Globals {
    pub fn new(view_proj: &Mat4, view: &Mat4) -> Self {
        Self {
            view_proj: view_proj.to_cols_f32(),
            view: view.to_cols_f32(),
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub tint: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SphereVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BarInstance {
    pub model: [[f32; 4]; 4],
    /// RGB plus opacity.
    pub color: [f32; 4],
}

/// Unit UV sphere; seam and pole layout match the equirectangular globe texture.
pub fn sphere_mesh(width_segments: u32, height_segments: u32) -> (Vec<SphereVertex>, Vec<u32>) {
    let w = width_segments.max(3);
    let h = height_segments.max(2);

    let mut vertices = Vec::with_capacity(((w + 1) * (h + 1)) as usize);
    for iy in 0..=h {
        let v = iy as f32 / h as f32;
        let theta = v * std::f32::consts::PI;
        for ix in 0..=w {
            let u = ix as f32 / w as f32;
            let phi = u * std::f32::consts::TAU;
            let p = [
                -phi.cos() * theta.sin(),
                theta.cos(),
                phi.sin() * theta.sin(),
            ];
            vertices.push(SphereVertex {
                position: p,
                normal: p,
                uv: [u, v],
            });
        }
    }

    let stride = w + 1;
    let mut indices = Vec::with_capacity((w * h * 6) as usize);
    for iy in 0..h {
        for ix in 0..w {
            let a = iy * stride + ix + 1;
            let b = iy * stride + ix;
            let c = (iy + 1) * stride + ix;
            let d = (iy + 1) * stride + ix + 1;
            // Pole rows collapse to a single triangle per quad.
            if iy != 0 {
                indices.extend_from_slice(&[a, b, d]);
            }
            if iy != h - 1 {
                indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    (vertices, indices)
}

/// Unit cube centered at the origin, counter-clockwise from outside.
pub fn cube_mesh() -> Vec<[f32; 3]> {
    const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]),
    ];

    let corner = |n: [f32; 3], u: [f32; 3], v: [f32; 3], su: f32, sv: f32| {
        [0, 1, 2].map(|i| 0.5 * n[i] + su * u[i] + sv * v[i])
    };

    let mut out = Vec::with_capacity(36);
    for (n, u, v) in FACES {
        let p00 = corner(n, u, v, -0.5, -0.5);
        let p10 = corner(n, u, v, 0.5, -0.5);
        let p11 = corner(n, u, v, 0.5, 0.5);
        let p01 = corner(n, u, v, -0.5, 0.5);
        out.extend_from_slice(&[p00, p10, p11, p00, p11, p01]);
    }
    out
}

pub fn bar_instances(frame: &RenderFrame) -> Vec<BarInstance> {
    frame
        .bars()
        .filter_map(|c| match c {
            RenderCommand::Bar {
                model,
                color,
                opacity,
                ..
            } => Some(BarInstance {
                model: model.to_cols_f32(),
                color: [color[0], color[1], color[2], *opacity],
            }),
            _ => None,
        })
        .collect()
}

/// Sample count used when antialiasing is on and both targets allow it.
pub const MSAA_SAMPLES: u32 = 4;

pub fn msaa_sample_count(
    antialias: bool,
    color: ::wgpu::TextureFormatFeatureFlags,
    depth: ::wgpu::TextureFormatFeatureFlags,
) -> u32 {
    if antialias
        && color.sample_count_supported(MSAA_SAMPLES)
        && depth.sample_count_supported(MSAA_SAMPLES)
    {
        MSAA_SAMPLES
    } else {
        1
    }
}

/// Backing-store size for a canvas laid out at `css_width` x `css_height`
/// CSS pixels, scaled by the device pixel ratio and shrunk uniformly so
/// neither side exceeds `max_dim`.
pub fn surface_size(css_width: u32, css_height: u32, pixel_ratio: f64, max_dim: u32) -> (u32, u32) {
    let ratio = if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
        pixel_ratio
    } else {
        1.0
    };
    let max_dim = max_dim.max(1);
    let w = css_width.max(1) as f64 * ratio;
    let h = css_height.max(1) as f64 * ratio;
    let fit = (max_dim as f64 / w.max(h)).min(1.0);
    let px = |v: f64| ((v * fit).round() as u32).clamp(1, max_dim);
    (px(w), px(h))
}

#[cfg(target_arch = "wasm32")]
mod imp {
    use ::wgpu::util::DeviceExt;
    use gpu::{RenderCommand, RenderFrame};
    use scene::components::Surface;
    use std::borrow::Cow;

    use super::{
        BarInstance, Globals, ObjectUniform, SphereVertex, bar_instances, cube_mesh,
        msaa_sample_count, sphere_mesh,
    };
    use crate::error::ViewerError;

    /// Shown until the globe texture has loaded, and if it fails to.
    const FALLBACK_TEXEL: [u8; 4] = [18, 52, 96, 255];

    #[derive(Debug)]
    pub struct WgpuContext {
        pub _instance: &'static ::wgpu::Instance,
        pub surface: ::wgpu::Surface<'static>,
        pub device: ::wgpu::Device,
        pub queue: ::wgpu::Queue,
        pub config: ::wgpu::SurfaceConfiguration,
        pub _canvas: web_sys::HtmlCanvasElement,
        pub sample_count: u32,
        /// Multisampled color target, resolved into the surface each frame.
        pub msaa_view: Option<::wgpu::TextureView>,
        pub depth_view: ::wgpu::TextureView,
        pub globals_buffer: ::wgpu::Buffer,
        pub globals_bind_group: ::wgpu::BindGroup,
        pub stars_pipeline: ::wgpu::RenderPipeline,
        pub stars_buffer: ::wgpu::Buffer,
        pub stars_count: u32,
        pub globe_pipeline: ::wgpu::RenderPipeline,
        pub globe_layout: ::wgpu::BindGroupLayout,
        pub globe_sampler: ::wgpu::Sampler,
        pub globe_object_buffer: ::wgpu::Buffer,
        pub globe_bind_group: ::wgpu::BindGroup,
        pub atmosphere_pipeline: ::wgpu::RenderPipeline,
        pub atmosphere_object_buffer: ::wgpu::Buffer,
        pub atmosphere_bind_group: ::wgpu::BindGroup,
        pub sphere_vertex_buffer: ::wgpu::Buffer,
        pub sphere_index_buffer: ::wgpu::Buffer,
        pub sphere_index_count: u32,
        pub bars_pipeline: ::wgpu::RenderPipeline,
        pub cube_vertex_buffer: ::wgpu::Buffer,
        pub cube_vertex_count: u32,
        pub bar_instance_buffer: ::wgpu::Buffer,
        pub bar_capacity: usize,
    }

    const STARS_SHADER: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    view: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> globals: Globals;

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return globals.view_proj * vec4<f32>(position, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0, 1.0, 1.0, 1.0);
}
"#;

    const GLOBE_SHADER: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    view: mat4x4<f32>,
};

struct Object {
    model: mat4x4<f32>,
    tint: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> globals: Globals;

@group(1) @binding(0)
var<uniform> object: Object;

@group(1) @binding(1)
var globe_texture: texture_2d<f32>;

@group(1) @binding(2)
var globe_sampler: sampler;

struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) view_normal: vec3<f32>,
    @location(1) uv: vec2<f32>,
};

@vertex
fn vs_main(
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
) -> VsOut {
    let world = object.model * vec4<f32>(position, 1.0);
    let world_normal = (object.model * vec4<f32>(normal, 0.0)).xyz;
    var out: VsOut;
    out.pos = globals.view_proj * world;
    out.view_normal = (globals.view * vec4<f32>(world_normal, 0.0)).xyz;
    out.uv = uv;
    return out;
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    let n = normalize(in.view_normal);
    // Blue rim where the surface turns away from the viewer.
    let intensity = max(1.05 - dot(n, vec3<f32>(0.0, 0.0, 1.0)), 0.0);
    let rim = vec3<f32>(0.3, 0.6, 1.0) * pow(intensity, 1.5);
    let base = textureSample(globe_texture, globe_sampler, in.uv).rgb;
    return vec4<f32>(base * object.tint.rgb + rim, object.tint.a);
}
"#;

    const ATMOSPHERE_SHADER: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    view: mat4x4<f32>,
};

struct Object {
    model: mat4x4<f32>,
    tint: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> globals: Globals;

@group(1) @binding(0)
var<uniform> object: Object;

struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) view_normal: vec3<f32>,
};

@vertex
fn vs_main(@location(0) position: vec3<f32>, @location(1) normal: vec3<f32>) -> VsOut {
    let world = object.model * vec4<f32>(position, 1.0);
    let world_normal = (object.model * vec4<f32>(normal, 0.0)).xyz;
    var out: VsOut;
    out.pos = globals.view_proj * world;
    out.view_normal = (globals.view * vec4<f32>(world_normal, 0.0)).xyz;
    return out;
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    let n = normalize(in.view_normal);
    let intensity = pow(max(0.8 - dot(n, vec3<f32>(0.0, 0.0, 1.0)), 0.0), 2.0);
    return vec4<f32>(0.3, 0.6, 1.0, 1.0) * intensity * object.tint.a;
}
"#;

    const BARS_SHADER: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    view: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> globals: Globals;

struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_main(
    @location(0) position: vec3<f32>,
    @location(1) m0: vec4<f32>,
    @location(2) m1: vec4<f32>,
    @location(3) m2: vec4<f32>,
    @location(4) m3: vec4<f32>,
    @location(5) color: vec4<f32>,
) -> VsOut {
    let model = mat4x4<f32>(m0, m1, m2, m3);
    var out: VsOut;
    out.pos = globals.view_proj * model * vec4<f32>(position, 1.0);
    out.color = color;
    return out;
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    return in.color;
}
"#;

    const ADDITIVE_BLENDING: ::wgpu::BlendState = ::wgpu::BlendState {
        color: ::wgpu::BlendComponent {
            src_factor: ::wgpu::BlendFactor::One,
            dst_factor: ::wgpu::BlendFactor::One,
            operation: ::wgpu::BlendOperation::Add,
        },
        alpha: ::wgpu::BlendComponent {
            src_factor: ::wgpu::BlendFactor::One,
            dst_factor: ::wgpu::BlendFactor::One,
            operation: ::wgpu::BlendOperation::Add,
        },
    };

    fn gpu_err(context: &str, e: impl std::fmt::Display) -> ViewerError {
        ViewerError::Gpu(format!("{context}: {e}"))
    }

    fn attachment_view(
        device: &::wgpu::Device,
        config: &::wgpu::SurfaceConfiguration,
        label: &str,
        format: ::wgpu::TextureFormat,
        sample_count: u32,
    ) -> ::wgpu::TextureView {
        let tex = device.create_texture(&::wgpu::TextureDescriptor {
            label: Some(label),
            size: ::wgpu::Extent3d {
                width: config.width.max(1),
                height: config.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
            dimension: ::wgpu::TextureDimension::D2,
            format,
            usage: ::wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        tex.create_view(&::wgpu::TextureViewDescriptor::default())
    }

    fn create_depth_view(
        device: &::wgpu::Device,
        config: &::wgpu::SurfaceConfiguration,
        sample_count: u32,
    ) -> ::wgpu::TextureView {
        attachment_view(
            device,
            config,
            "globe-depth",
            ::wgpu::TextureFormat::Depth24Plus,
            sample_count,
        )
    }

    fn create_msaa_view(
        device: &::wgpu::Device,
        config: &::wgpu::SurfaceConfiguration,
        sample_count: u32,
    ) -> Option<::wgpu::TextureView> {
        (sample_count > 1)
            .then(|| attachment_view(device, config, "globe-msaa", config.format, sample_count))
    }

    fn uniform_entry(binding: u32) -> ::wgpu::BindGroupLayoutEntry {
        ::wgpu::BindGroupLayoutEntry {
            binding,
            visibility: ::wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: ::wgpu::BindingType::Buffer {
                ty: ::wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }
    }

    fn depth_state(write: bool) -> Option<::wgpu::DepthStencilState> {
        Some(::wgpu::DepthStencilState {
            format: ::wgpu::TextureFormat::Depth24Plus,
            depth_write_enabled: write,
            depth_compare: ::wgpu::CompareFunction::Less,
            stencil: ::wgpu::StencilState::default(),
            bias: ::wgpu::DepthBiasState::default(),
        })
    }

    fn primitive(
        topology: ::wgpu::PrimitiveTopology,
        cull_mode: Option<::wgpu::Face>,
    ) -> ::wgpu::PrimitiveState {
        ::wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: ::wgpu::FrontFace::Ccw,
            cull_mode,
            polygon_mode: ::wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        }
    }

    const SPHERE_ATTRIBUTES: [::wgpu::VertexAttribute; 3] =
        ::wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];
    const POSITION_ATTRIBUTES: [::wgpu::VertexAttribute; 1] =
        ::wgpu::vertex_attr_array![0 => Float32x3];
    const INSTANCE_ATTRIBUTES: [::wgpu::VertexAttribute; 5] = ::wgpu::vertex_attr_array![
        1 => Float32x4, 2 => Float32x4, 3 => Float32x4, 4 => Float32x4, 5 => Float32x4
    ];

    fn sphere_layout() -> ::wgpu::VertexBufferLayout<'static> {
        ::wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SphereVertex>() as ::wgpu::BufferAddress,
            step_mode: ::wgpu::VertexStepMode::Vertex,
            attributes: &SPHERE_ATTRIBUTES,
        }
    }

    fn position_layout() -> ::wgpu::VertexBufferLayout<'static> {
        ::wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<[f32; 3]>() as ::wgpu::BufferAddress,
            step_mode: ::wgpu::VertexStepMode::Vertex,
            attributes: &POSITION_ATTRIBUTES,
        }
    }

    struct PipelineSpec<'a> {
        label: &'a str,
        shader: &'a str,
        layouts: &'a [&'a ::wgpu::BindGroupLayout],
        buffers: &'a [::wgpu::VertexBufferLayout<'a>],
        blend: ::wgpu::BlendState,
        primitive: ::wgpu::PrimitiveState,
        depth_write: bool,
    }

    fn create_pipeline(
        device: &::wgpu::Device,
        format: ::wgpu::TextureFormat,
        sample_count: u32,
        spec: PipelineSpec<'_>,
    ) -> ::wgpu::RenderPipeline {
        let module = device.create_shader_module(::wgpu::ShaderModuleDescriptor {
            label: Some(spec.label),
            source: ::wgpu::ShaderSource::Wgsl(Cow::Borrowed(spec.shader)),
        });
        let layout = device.create_pipeline_layout(&::wgpu::PipelineLayoutDescriptor {
            label: Some(spec.label),
            bind_group_layouts: spec.layouts,
            immediate_size: 0,
        });
        device.create_render_pipeline(&::wgpu::RenderPipelineDescriptor {
            label: Some(spec.label),
            layout: Some(&layout),
            vertex: ::wgpu::VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: spec.buffers,
            },
            fragment: Some(::wgpu::FragmentState {
                module: &module,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(::wgpu::ColorTargetState {
                    format,
                    blend: Some(spec.blend),
                    write_mask: ::wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: spec.primitive,
            depth_stencil: depth_state(spec.depth_write),
            multisample: ::wgpu::MultisampleState {
                count: sample_count,
                ..Default::default()
            },
            multiview_mask: None,
            cache: None,
        })
    }

    fn object_buffer(device: &::wgpu::Device, label: &str) -> ::wgpu::Buffer {
        device.create_buffer_init(&::wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::bytes_of(&ObjectUniform {
                model: [[0.0; 4]; 4],
                tint: [1.0; 4],
            }),
            usage: ::wgpu::BufferUsages::UNIFORM | ::wgpu::BufferUsages::COPY_DST,
        })
    }

    fn create_globe_bind_group(
        device: &::wgpu::Device,
        layout: &::wgpu::BindGroupLayout,
        object: &::wgpu::Buffer,
        texture_view: &::wgpu::TextureView,
        sampler: &::wgpu::Sampler,
    ) -> ::wgpu::BindGroup {
        device.create_bind_group(&::wgpu::BindGroupDescriptor {
            label: Some("globe-object-bg"),
            layout,
            entries: &[
                ::wgpu::BindGroupEntry {
                    binding: 0,
                    resource: object.as_entire_binding(),
                },
                ::wgpu::BindGroupEntry {
                    binding: 1,
                    resource: ::wgpu::BindingResource::TextureView(texture_view),
                },
                ::wgpu::BindGroupEntry {
                    binding: 2,
                    resource: ::wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }

    fn upload_texture(
        device: &::wgpu::Device,
        queue: &::wgpu::Queue,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> ::wgpu::TextureView {
        let size = ::wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&::wgpu::TextureDescriptor {
            label: Some("globe-texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: ::wgpu::TextureDimension::D2,
            format: ::wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: ::wgpu::TextureUsages::TEXTURE_BINDING | ::wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            ::wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: ::wgpu::Origin3d::ZERO,
                aspect: ::wgpu::TextureAspect::All,
            },
            rgba,
            ::wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );
        texture.create_view(&::wgpu::TextureViewDescriptor::default())
    }

    fn instance_buffer(device: &::wgpu::Device, capacity: usize) -> ::wgpu::Buffer {
        device.create_buffer(&::wgpu::BufferDescriptor {
            label: Some("globe-bar-instances"),
            size: (capacity.max(1) * std::mem::size_of::<BarInstance>()) as u64,
            usage: ::wgpu::BufferUsages::VERTEX | ::wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    pub async fn init_wgpu_from_canvas(
        canvas: web_sys::HtmlCanvasElement,
        stars: &[[f32; 3]],
        sphere_segments: u32,
        bar_capacity: usize,
        antialias: bool,
    ) -> Result<WgpuContext, ViewerError> {
        let width = canvas.width().max(1);
        let height = canvas.height().max(1);

        // `wgpu::Surface` must not outlive its `wgpu::Instance`; the instance
        // lives for the rest of the page.
        let instance: &'static ::wgpu::Instance = Box::leak(Box::new(::wgpu::Instance::new(
            &::wgpu::InstanceDescriptor {
                backends: ::wgpu::Backends::BROWSER_WEBGPU | ::wgpu::Backends::GL,
                ..Default::default()
            },
        )));

        let surface = instance
            .create_surface(::wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .map_err(|e| gpu_err("surface", e))?;

        let adapter = instance
            .request_adapter(&::wgpu::RequestAdapterOptions {
                power_preference: ::wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| gpu_err("adapter", e))?;

        let (device, queue) = adapter
            .request_device(&::wgpu::DeviceDescriptor {
                label: Some("globe-device"),
                required_features: ::wgpu::Features::empty(),
                required_limits: ::wgpu::Limits::downlevel_webgl2_defaults(),
                ..Default::default()
            })
            .await
            .map_err(|e| gpu_err("device", e))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| ViewerError::Gpu("surface reports no formats".to_string()))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(::wgpu::CompositeAlphaMode::Auto);

        let config = ::wgpu::SurfaceConfiguration {
            usage: ::wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            desired_maximum_frame_latency: 2,
            present_mode: ::wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let sample_count = msaa_sample_count(
            antialias,
            adapter.get_texture_format_features(format).flags,
            adapter
                .get_texture_format_features(::wgpu::TextureFormat::Depth24Plus)
                .flags,
        );
        let msaa_view = create_msaa_view(&device, &config, sample_count);
        let depth_view = create_depth_view(&device, &config, sample_count);

        let globals_buffer = device.create_buffer(&::wgpu::BufferDescriptor {
            label: Some("globe-globals"),
            size: std::mem::size_of::<Globals>() as u64,
            usage: ::wgpu::BufferUsages::UNIFORM | ::wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let globals_layout = device.create_bind_group_layout(&::wgpu::BindGroupLayoutDescriptor {
            label: Some("globe-globals-bgl"),
            entries: &[uniform_entry(0)],
        });
        let globals_bind_group = device.create_bind_group(&::wgpu::BindGroupDescriptor {
            label: Some("globe-globals-bg"),
            layout: &globals_layout,
            entries: &[::wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        let object_layout = device.create_bind_group_layout(&::wgpu::BindGroupLayoutDescriptor {
            label: Some("globe-object-bgl"),
            entries: &[uniform_entry(0)],
        });
        let globe_layout = device.create_bind_group_layout(&::wgpu::BindGroupLayoutDescriptor {
            label: Some("globe-textured-bgl"),
            entries: &[
                uniform_entry(0),
                ::wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: ::wgpu::ShaderStages::FRAGMENT,
                    ty: ::wgpu::BindingType::Texture {
                        sample_type: ::wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: ::wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                ::wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: ::wgpu::ShaderStages::FRAGMENT,
                    ty: ::wgpu::BindingType::Sampler(::wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let stars_pipeline = create_pipeline(
            &device,
            format,
            sample_count,
            PipelineSpec {
                label: "globe-stars",
                shader: STARS_SHADER,
                layouts: &[&globals_layout],
                buffers: &[position_layout()],
                blend: ::wgpu::BlendState::REPLACE,
                primitive: primitive(::wgpu::PrimitiveTopology::PointList, None),
                depth_write: true,
            },
        );
        let atmosphere_pipeline = create_pipeline(
            &device,
            format,
            sample_count,
            PipelineSpec {
                label: "globe-atmosphere",
                shader: ATMOSPHERE_SHADER,
                layouts: &[&globals_layout, &object_layout],
                buffers: &[sphere_layout()],
                blend: ADDITIVE_BLENDING,
                primitive: primitive(
                    ::wgpu::PrimitiveTopology::TriangleList,
                    Some(::wgpu::Face::Front),
                ),
                depth_write: false,
            },
        );
        let globe_pipeline = create_pipeline(
            &device,
            format,
            sample_count,
            PipelineSpec {
                label: "globe-surface",
                shader: GLOBE_SHADER,
                layouts: &[&globals_layout, &globe_layout],
                buffers: &[sphere_layout()],
                blend: ::wgpu::BlendState::REPLACE,
                primitive: primitive(
                    ::wgpu::PrimitiveTopology::TriangleList,
                    Some(::wgpu::Face::Back),
                ),
                depth_write: true,
            },
        );
        let bars_pipeline = create_pipeline(
            &device,
            format,
            sample_count,
            PipelineSpec {
                label: "globe-bars",
                shader: BARS_SHADER,
                layouts: &[&globals_layout],
                buffers: &[
                    position_layout(),
                    ::wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<BarInstance>() as ::wgpu::BufferAddress,
                        step_mode: ::wgpu::VertexStepMode::Instance,
                        attributes: &INSTANCE_ATTRIBUTES,
                    },
                ],
                blend: ::wgpu::BlendState::ALPHA_BLENDING,
                primitive: primitive(
                    ::wgpu::PrimitiveTopology::TriangleList,
                    Some(::wgpu::Face::Back),
                ),
                depth_write: false,
            },
        );

        let stars_buffer = device.create_buffer_init(&::wgpu::util::BufferInitDescriptor {
            label: Some("globe-stars"),
            contents: bytemuck::cast_slice(if stars.is_empty() { &[[0.0f32; 3]] } else { stars }),
            usage: ::wgpu::BufferUsages::VERTEX,
        });

        let (sphere_vertices, sphere_indices) = sphere_mesh(sphere_segments, sphere_segments);
        let sphere_vertex_buffer = device.create_buffer_init(&::wgpu::util::BufferInitDescriptor {
            label: Some("globe-sphere-vertices"),
            contents: bytemuck::cast_slice(&sphere_vertices),
            usage: ::wgpu::BufferUsages::VERTEX,
        });
        let sphere_index_buffer = device.create_buffer_init(&::wgpu::util::BufferInitDescriptor {
            label: Some("globe-sphere-indices"),
            contents: bytemuck::cast_slice(&sphere_indices),
            usage: ::wgpu::BufferUsages::INDEX,
        });

        let cube = cube_mesh();
        let cube_vertex_buffer = device.create_buffer_init(&::wgpu::util::BufferInitDescriptor {
            label: Some("globe-bar-cube"),
            contents: bytemuck::cast_slice(&cube),
            usage: ::wgpu::BufferUsages::VERTEX,
        });

        let globe_sampler = device.create_sampler(&::wgpu::SamplerDescriptor {
            label: Some("globe-sampler"),
            address_mode_u: ::wgpu::AddressMode::Repeat,
            address_mode_v: ::wgpu::AddressMode::ClampToEdge,
            mag_filter: ::wgpu::FilterMode::Linear,
            min_filter: ::wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let fallback_view = upload_texture(&device, &queue, 1, 1, &FALLBACK_TEXEL);
        let globe_object_buffer = object_buffer(&device, "globe-object");
        let globe_bind_group = create_globe_bind_group(
            &device,
            &globe_layout,
            &globe_object_buffer,
            &fallback_view,
            &globe_sampler,
        );

        let atmosphere_object_buffer = object_buffer(&device, "atmosphere-object");
        let atmosphere_bind_group = device.create_bind_group(&::wgpu::BindGroupDescriptor {
            label: Some("atmosphere-object-bg"),
            layout: &object_layout,
            entries: &[::wgpu::BindGroupEntry {
                binding: 0,
                resource: atmosphere_object_buffer.as_entire_binding(),
            }],
        });

        tracing::info!(
            width,
            height,
            ?format,
            sample_count,
            stars = stars.len(),
            "wgpu surface ready"
        );

        Ok(WgpuContext {
            _instance: instance,
            surface,
            device,
            config,
            _canvas: canvas,
            sample_count,
            msaa_view,
            depth_view,
            globals_buffer,
            globals_bind_group,
            stars_pipeline,
            stars_buffer,
            stars_count: stars.len() as u32,
            globe_pipeline,
            globe_layout,
            globe_sampler,
            globe_object_buffer,
            globe_bind_group,
            atmosphere_pipeline,
            atmosphere_object_buffer,
            atmosphere_bind_group,
            sphere_vertex_buffer,
            sphere_index_buffer,
            sphere_index_count: sphere_indices.len() as u32,
            bars_pipeline,
            cube_vertex_buffer,
            cube_vertex_count: cube.len() as u32,
            bar_instance_buffer: instance_buffer(&device, bar_capacity),
            bar_capacity: bar_capacity.max(1),
            queue,
        })
    }

    pub fn set_globe_texture(ctx: &mut WgpuContext, width: u32, height: u32, rgba: &[u8]) {
        let view = upload_texture(&ctx.device, &ctx.queue, width, height, rgba);
        ctx.globe_bind_group = create_globe_bind_group(
            &ctx.device,
            &ctx.globe_layout,
            &ctx.globe_object_buffer,
            &view,
            &ctx.globe_sampler,
        );
    }

    pub fn resize_wgpu(ctx: &mut WgpuContext, width: u32, height: u32) {
        ctx.config.width = width.max(1);
        ctx.config.height = height.max(1);
        ctx.surface.configure(&ctx.device, &ctx.config);
        ctx.msaa_view = create_msaa_view(&ctx.device, &ctx.config, ctx.sample_count);
        ctx.depth_view = create_depth_view(&ctx.device, &ctx.config, ctx.sample_count);
    }

    pub fn render_frame(
        ctx: &mut WgpuContext,
        globals: Globals,
        frame: &RenderFrame,
    ) -> Result<(), ViewerError> {
        let bars = bar_instances(frame);
        if bars.len() > ctx.bar_capacity {
            ctx.bar_instance_buffer = instance_buffer(&ctx.device, bars.len());
            ctx.bar_capacity = bars.len();
        }
        if !bars.is_empty() {
            ctx.queue
                .write_buffer(&ctx.bar_instance_buffer, 0, bytemuck::cast_slice(&bars));
        }
        ctx.queue
            .write_buffer(&ctx.globals_buffer, 0, bytemuck::bytes_of(&globals));

        for command in &frame.commands {
            if let RenderCommand::Sphere {
                model, material, ..
            } = command
            {
                let uniform = ObjectUniform {
                    model: model.to_cols_f32(),
                    tint: [1.0, 1.0, 1.0, material.opacity],
                };
                let buffer = match material.surface {
                    Surface::Atmosphere => &ctx.atmosphere_object_buffer,
                    _ => &ctx.globe_object_buffer,
                };
                ctx.queue.write_buffer(buffer, 0, bytemuck::bytes_of(&uniform));
            }
        }

        let surface_texture = ctx
            .surface
            .get_current_texture()
            .map_err(|e| gpu_err("surface acquire failed", e))?;
        let view = surface_texture
            .texture
            .create_view(&::wgpu::TextureViewDescriptor::default());

        let (target, resolve_target) = match &ctx.msaa_view {
            Some(msaa) => (msaa, Some(&view)),
            None => (&view, None),
        };

        let mut encoder = ctx
            .device
            .create_command_encoder(&::wgpu::CommandEncoderDescriptor {
                label: Some("globe-frame-encoder"),
            });

        {
            let mut rpass = encoder.begin_render_pass(&::wgpu::RenderPassDescriptor {
                label: Some("globe-pass"),
                color_attachments: &[Some(::wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target,
                    depth_slice: None,
                    ops: ::wgpu::Operations {
                        load: ::wgpu::LoadOp::Clear(::wgpu::Color::BLACK),
                        store: ::wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(::wgpu::RenderPassDepthStencilAttachment {
                    view: &ctx.depth_view,
                    depth_ops: Some(::wgpu::Operations {
                        load: ::wgpu::LoadOp::Clear(1.0),
                        store: ::wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });

            rpass.set_bind_group(0, &ctx.globals_bind_group, &[]);
            for command in &frame.commands {
                match command {
                    RenderCommand::Stars { .. } if ctx.stars_count > 0 => {
                        rpass.set_pipeline(&ctx.stars_pipeline);
                        rpass.set_vertex_buffer(0, ctx.stars_buffer.slice(..));
                        rpass.draw(0..ctx.stars_count, 0..1);
                    }
                    RenderCommand::Sphere { material, .. } => {
                        if material.surface == Surface::Atmosphere {
                            rpass.set_pipeline(&ctx.atmosphere_pipeline);
                            rpass.set_bind_group(1, &ctx.atmosphere_bind_group, &[]);
                        } else {
                            rpass.set_pipeline(&ctx.globe_pipeline);
                            rpass.set_bind_group(1, &ctx.globe_bind_group, &[]);
                        }
                        rpass.set_vertex_buffer(0, ctx.sphere_vertex_buffer.slice(..));
                        rpass.set_index_buffer(
                            ctx.sphere_index_buffer.slice(..),
                            ::wgpu::IndexFormat::Uint32,
                        );
                        rpass.draw_indexed(0..ctx.sphere_index_count, 0, 0..1);
                    }
                    _ => {}
                }
            }

            if !bars.is_empty() {
                rpass.set_pipeline(&ctx.bars_pipeline);
                rpass.set_vertex_buffer(0, ctx.cube_vertex_buffer.slice(..));
                rpass.set_vertex_buffer(1, ctx.bar_instance_buffer.slice(..));
                rpass.draw(0..ctx.cube_vertex_count, 0..bars.len() as u32);
            }
        }

        ctx.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod imp {
    use gpu::RenderFrame;

    use super::Globals;
    use crate::error::ViewerError;

    #[derive(Debug, Default)]
    pub struct WgpuContext;

    pub async fn init_wgpu_from_canvas(
        _canvas: web_sys::HtmlCanvasElement,
        _stars: &[[f32; 3]],
        _sphere_segments: u32,
        _bar_capacity: usize,
        _antialias: bool,
    ) -> Result<WgpuContext, ViewerError> {
        Err(ViewerError::Gpu(
            "wgpu initialization is only available on wasm32 targets".to_string(),
        ))
    }

    pub fn set_globe_texture(_ctx: &mut WgpuContext, _width: u32, _height: u32, _rgba: &[u8]) {}

    pub fn resize_wgpu(_ctx: &mut WgpuContext, _width: u32, _height: u32) {}

    pub fn render_frame(
        _ctx: &mut WgpuContext,
        _globals: Globals,
        _frame: &RenderFrame,
    ) -> Result<(), ViewerError> {
        Err(ViewerError::Gpu(
            "wgpu rendering is only available on wasm32 targets".to_string(),
        ))
    }
}

pub use imp::{WgpuContext, init_wgpu_from_canvas, render_frame, resize_wgpu, set_globe_texture};
