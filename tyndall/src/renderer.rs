//! wgpu renderer for tessellated canvas frames
//!
//! One vertex buffer holds every batch of the frame; batches are drawn in order, switching
//! between the alpha-blended and the additive pipeline.

use crate::canvas::{BlendMode, Color};
use crate::tessellate::Tessellator;
use common::{
    create_uniform_buffer, create_vertex_buffer, Camera2D, CameraUniform, GraphicsContext, Vertex,
};
use std::ops::Range;

/// Initial vertex buffer size; the buffer doubles when a frame needs more
const INITIAL_VERTICES: usize = 200_000;

pub struct CanvasRenderer {
    normal_pipeline: wgpu::RenderPipeline,
    additive_pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    capacity: usize,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    draws: Vec<(BlendMode, Range<u32>)>,
    clear: wgpu::Color,
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    label: &str,
    blend: wgpu::BlendState,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: "vs_main",
            buffers: &[Vertex::LAYOUT],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    })
}

/// sRGB canvas color as a linear clear color
fn linear_clear(color: Color) -> wgpu::Color {
    let linear = |c: f32| (c as f64).powf(2.2);
    wgpu::Color {
        r: linear(color.r),
        g: linear(color.g),
        b: linear(color.b),
        a: 1.0,
    }
}

impl CanvasRenderer {
    pub fn new(ctx: &GraphicsContext, camera: &Camera2D) -> Self {
        let device = &ctx.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Canvas Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/canvas.wgsl").into()),
        });

        let camera_buffer = create_uniform_buffer(device, &CameraUniform::from_camera_2d(camera));

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Camera Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Canvas Pipeline Layout"),
            bind_group_layouts: &[&camera_bind_group_layout],
            push_constant_ranges: &[],
        });

        let format = ctx.config.format;
        let normal_pipeline = create_pipeline(
            device,
            &pipeline_layout,
            &shader,
            format,
            "Canvas Pipeline",
            wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::SrcAlpha,
                    dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent::OVER,
            },
        );
        // "lighter" compositing for light
        let additive_pipeline = create_pipeline(
            device,
            &pipeline_layout,
            &shader,
            format,
            "Additive Canvas Pipeline",
            wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::SrcAlpha,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent::OVER,
            },
        );

        Self {
            normal_pipeline,
            additive_pipeline,
            vertex_buffer: create_vertex_buffer(device, INITIAL_VERTICES),
            capacity: INITIAL_VERTICES,
            camera_buffer,
            camera_bind_group,
            draws: Vec::new(),
            clear: wgpu::Color::BLACK,
        }
    }

    pub fn update_camera(&self, queue: &wgpu::Queue, camera: &Camera2D) {
        let uniform = CameraUniform::from_camera_2d(camera);
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[uniform]));
    }

    /// Upload the tessellated frame, growing the vertex buffer if needed
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, frame: &Tessellator) {
        let needed = frame.vertex_count();
        if needed > self.capacity {
            self.capacity = needed.next_power_of_two();
            self.vertex_buffer = create_vertex_buffer(device, self.capacity);
            log::debug!("Grew canvas vertex buffer to {} vertices", self.capacity);
        }

        let mut vertices: Vec<Vertex> = Vec::with_capacity(needed);
        self.draws.clear();
        for batch in frame.batches() {
            let start = vertices.len() as u32;
            vertices.extend_from_slice(&batch.vertices);
            self.draws.push((batch.blend, start..vertices.len() as u32));
        }
        if !vertices.is_empty() {
            queue.write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&vertices));
        }
        self.clear = linear_clear(frame.clear_color());
    }

    pub fn render(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Canvas Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        for (blend, range) in &self.draws {
            if range.is_empty() {
                continue;
            }
            let pipeline = match blend {
                BlendMode::Normal => &self.normal_pipeline,
                BlendMode::Additive => &self.additive_pipeline,
            };
            render_pass.set_pipeline(pipeline);
            render_pass.draw(range.clone(), 0..1);
        }
    }
}
