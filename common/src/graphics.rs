//! Graphics initialization and rendering utilities

use std::fmt;
use std::sync::Arc;
use wgpu::util::DeviceExt;
use winit::{
    dpi::PhysicalSize,
    event_loop::EventLoop,
    window::{Window, WindowBuilder},
};

/// Errors raised while acquiring a window and GPU device
#[derive(Debug)]
pub enum GraphicsError {
    /// The platform event loop could not be created
    EventLoop(winit::error::EventLoopError),
    /// The window could not be opened
    Window(winit::error::OsError),
    /// Failed to create a surface for the window
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No adapter is compatible with the surface
    NoAdapter,
    /// The adapter refused to hand out a device
    DeviceCreation(wgpu::RequestDeviceError),
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphicsError::EventLoop(e) => write!(f, "Failed to create event loop: {}", e),
            GraphicsError::Window(e) => write!(f, "Failed to create window: {}", e),
            GraphicsError::SurfaceCreation(e) => write!(f, "Failed to create surface: {}", e),
            GraphicsError::NoAdapter => write!(f, "No suitable GPU adapter found"),
            GraphicsError::DeviceCreation(e) => write!(f, "Failed to create device: {}", e),
        }
    }
}

impl std::error::Error for GraphicsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GraphicsError::EventLoop(e) => Some(e),
            GraphicsError::Window(e) => Some(e),
            GraphicsError::SurfaceCreation(e) => Some(e),
            GraphicsError::DeviceCreation(e) => Some(e),
            GraphicsError::NoAdapter => None,
        }
    }
}

impl From<winit::error::EventLoopError> for GraphicsError {
    fn from(e: winit::error::EventLoopError) -> Self {
        GraphicsError::EventLoop(e)
    }
}

impl From<winit::error::OsError> for GraphicsError {
    fn from(e: winit::error::OsError) -> Self {
        GraphicsError::Window(e)
    }
}

impl From<wgpu::CreateSurfaceError> for GraphicsError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        GraphicsError::SurfaceCreation(e)
    }
}

impl From<wgpu::RequestDeviceError> for GraphicsError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GraphicsError::DeviceCreation(e)
    }
}

/// Install the `env_logger` backend once; later calls are no-ops.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

/// Holds all GPU resources needed for rendering
pub struct GraphicsContext {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: PhysicalSize<u32>,
    pub window: Arc<Window>,
}

impl GraphicsContext {
    /// Create a new graphics context with an associated window
    pub async fn new(
        title: &str,
        width: u32,
        height: u32,
    ) -> Result<(Self, EventLoop<()>), GraphicsError> {
        init_logging();

        let event_loop = EventLoop::new()?;
        let window = Arc::new(
            WindowBuilder::new()
                .with_title(title)
                .with_inner_size(PhysicalSize::new(width, height))
                .build(&event_loop)?,
        );

        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GraphicsError::NoAdapter)?;

        log::info!("Using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    label: None,
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok((
            Self {
                surface,
                device,
                queue,
                config,
                size,
                window,
            },
            event_loop,
        ))
    }

    /// Resize the rendering surface
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Get the aspect ratio of the window
    pub fn aspect_ratio(&self) -> f32 {
        self.size.width as f32 / self.size.height.max(1) as f32
    }
}

/// Vertex with position and color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl Vertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x4,
            },
        ],
    };

    pub fn new(position: [f32; 3], color: [f32; 4]) -> Self {
        Self { position, color }
    }
}

/// Create an empty vertex buffer able to hold `capacity` vertices
pub fn create_vertex_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Vertex Buffer"),
        size: (std::mem::size_of::<Vertex>() * capacity.max(1)) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Create a uniform buffer
pub fn create_uniform_buffer<T: bytemuck::Pod>(device: &wgpu::Device, data: &T) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Uniform Buffer"),
        contents: bytemuck::cast_slice(&[*data]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}
