use crate::config::Settings;
use anyhow::{Context, Result, anyhow};
use glutin::config::ConfigTemplateBuilder;
use glutin::context::{ContextAttributesBuilder, PossiblyCurrentContext, Version};
use glutin::display::GetGlDisplay;
use glutin::prelude::*;
use glutin::surface::{Surface, WindowSurface};
use glutin_winit::DisplayBuilder;
use raw_window_handle::HasWindowHandle;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Theme, Window, WindowAttributes};

#[cfg(debug_assertions)]
use gl::types::*;
#[cfg(debug_assertions)]
use std::ffi::CStr;

pub trait App {
    fn initialize(&mut self) -> Result<()> {
        Ok(())
    }
    fn update(&mut self, _delta_time: f32) -> Result<()> {
        Ok(())
    }
    fn render(&mut self, _time: f32) -> Result<()> {
        Ok(())
    }
    fn render_ui(&mut self, _ctx: &egui::Context) -> Result<()> {
        Ok(())
    }
    fn cleanup(&mut self) -> Result<()> {
        Ok(())
    }
    fn on_resize(&mut self, _width: u32, _height: u32) -> Result<()> {
        Ok(())
    }
}

struct Graphics {
    window: Arc<Window>,
    gl_context: PossiblyCurrentContext,
    gl_surface: Surface<WindowSurface>,
    egui_glow: egui_glow::Painter,
    egui_state: egui_winit::State,
    egui_ctx: egui::Context,
}

struct AppRunner {
    settings: Settings,
    graphics: Option<Graphics>,
    app: Box<dyn App>,
    frame_interval: Duration,
    next_frame: Instant,
    start_time: Instant,
    last_frame_time: Instant,
}

impl AppRunner {
    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Err(error) = self.app.cleanup() {
            log::error!("Cleanup error: {}", error);
        }
        if let Some(graphics) = self.graphics.as_mut() {
            graphics.egui_glow.destroy();
        }
        event_loop.exit();
    }

    fn redraw(&mut self) {
        let Some(graphics) = self.graphics.as_mut() else {
            return;
        };

        let now = Instant::now();
        let delta_time = (now - self.last_frame_time).as_secs_f32();
        let time = (now - self.start_time).as_secs_f32();
        self.last_frame_time = now;

        if let Err(error) = self.app.update(delta_time) {
            log::error!("Update error: {}", error);
        }

        if let Err(error) = self.app.render(time) {
            log::error!("Render error: {}", error);
        }

        let raw_input = graphics.egui_state.take_egui_input(&graphics.window);
        graphics.egui_ctx.begin_pass(raw_input);

        if let Err(error) = self.app.render_ui(&graphics.egui_ctx) {
            log::error!("UI render error: {}", error);
        }

        let egui::FullOutput {
            platform_output,
            textures_delta,
            shapes,
            pixels_per_point,
            ..
        } = graphics.egui_ctx.end_pass();

        graphics
            .egui_state
            .handle_platform_output(&graphics.window, platform_output);

        let clipped_primitives = graphics.egui_ctx.tessellate(shapes, pixels_per_point);
        let size = graphics.window.inner_size();

        for (id, image_delta) in textures_delta.set {
            graphics.egui_glow.set_texture(id, &image_delta);
        }

        unsafe {
            gl::Disable(gl::SCISSOR_TEST);
        }

        graphics.egui_glow.paint_primitives(
            [size.width, size.height],
            pixels_per_point,
            &clipped_primitives,
        );

        for id in textures_delta.free {
            graphics.egui_glow.free_texture(id);
        }

        if let Err(error) = graphics.gl_surface.swap_buffers(&graphics.gl_context) {
            log::error!("Swap buffers error: {}", error);
        }
    }
}

impl ApplicationHandler for AppRunner {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.graphics.is_some() {
            return;
        }

        let graphics = match create_graphics(event_loop, &self.settings) {
            Ok(graphics) => graphics,
            Err(error) => {
                log::error!("Failed to create window: {:#}", error);
                event_loop.exit();
                return;
            }
        };

        let size = graphics.window.inner_size();
        self.graphics = Some(graphics);

        if let Err(error) = self.app.initialize() {
            log::error!("Initialization error: {:#}", error);
            self.shutdown(event_loop);
            return;
        }

        if let Err(error) = self.app.on_resize(size.width, size.height) {
            log::error!("Resize error: {}", error);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(graphics) = self.graphics.as_mut() else {
            return;
        };

        let event_response = graphics
            .egui_state
            .on_window_event(&graphics.window, &event);

        if event_response.consumed {
            return;
        }

        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),
            WindowEvent::KeyboardInput {
                event:
                    winit::event::KeyEvent {
                        physical_key: winit::keyboard::PhysicalKey::Code(key_code),
                        ..
                    },
                ..
            } => {
                if matches!(key_code, winit::keyboard::KeyCode::Escape) {
                    self.shutdown(event_loop);
                }
            }
            WindowEvent::Resized(size) => {
                let (Some(width), Some(height)) =
                    (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
                else {
                    return;
                };

                graphics
                    .gl_surface
                    .resize(&graphics.gl_context, width, height);

                unsafe {
                    gl::Viewport(0, 0, size.width as _, size.height as _);
                }

                if let Err(error) = self.app.on_resize(size.width, size.height) {
                    log::error!("Resize error: {}", error);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => (),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        if now >= self.next_frame {
            self.next_frame = now + self.frame_interval;
            if let Some(graphics) = self.graphics.as_ref() {
                graphics.window.request_redraw();
            }
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame));
    }
}

fn create_graphics(event_loop: &ActiveEventLoop, settings: &Settings) -> Result<Graphics> {
    let window_attributes = WindowAttributes::default()
        .with_title(settings.window.title.as_str())
        .with_inner_size(LogicalSize::new(settings.window.width, settings.window.height))
        .with_resizable(false);

    let template = ConfigTemplateBuilder::new().with_alpha_size(8);

    let display_builder = DisplayBuilder::new().with_window_attributes(Some(window_attributes));

    let (window, gl_config) = display_builder
        .build(event_loop, template, |configs| {
            configs
                .reduce(|accum, config| {
                    if config.num_samples() > accum.num_samples() {
                        config
                    } else {
                        accum
                    }
                })
                .expect("display offered no GL configs")
        })
        .map_err(|error| anyhow!("Failed to build display: {}", error))?;

    let window = Arc::new(window.context("Display builder returned no window")?);
    let window_handle = window.window_handle()?.as_raw();

    let gl_display = gl_config.display();

    let context_attributes = ContextAttributesBuilder::new()
        .with_context_api(glutin::context::ContextApi::OpenGl(Some(Version::new(3, 3))))
        .with_profile(glutin::context::GlProfile::Core)
        .build(Some(window_handle));

    let gl_context = unsafe { gl_display.create_context(&gl_config, &context_attributes)? };

    let size = window.inner_size();
    let attrs = glutin::surface::SurfaceAttributesBuilder::<WindowSurface>::new().build(
        window_handle,
        NonZeroU32::new(size.width).context("Window has zero width")?,
        NonZeroU32::new(size.height).context("Window has zero height")?,
    );

    let gl_surface = unsafe { gl_display.create_window_surface(&gl_config, &attrs)? };
    let gl_context = gl_context.make_current(&gl_surface)?;

    gl::load_with(|symbol| match std::ffi::CString::new(symbol) {
        Ok(symbol) => gl_display.get_proc_address(symbol.as_c_str()).cast(),
        Err(_) => std::ptr::null(),
    });

    enable_gl_debug();

    let glow_context = unsafe {
        glow::Context::from_loader_function(|symbol| match std::ffi::CString::new(symbol) {
            Ok(symbol) => gl_display.get_proc_address(symbol.as_c_str()).cast(),
            Err(_) => std::ptr::null(),
        })
    };

    let egui_glow = egui_glow::Painter::new(Arc::new(glow_context), "", None, false)
        .map_err(|error| anyhow!("Failed to create egui painter: {}", error))?;

    let egui_ctx = egui::Context::default();
    let viewport_id = egui_ctx.viewport_id();

    let egui_state = egui_winit::State::new(
        egui_ctx.clone(),
        viewport_id,
        &window,
        Some(window.scale_factor() as _),
        Some(Theme::Dark),
        None,
    );

    log::info!(
        "Created {}x{} window at {:.1}x scale",
        size.width,
        size.height,
        window.scale_factor()
    );

    Ok(Graphics {
        window,
        gl_context,
        gl_surface,
        egui_glow,
        egui_state,
        egui_ctx,
    })
}

pub fn run_application(settings: Settings, app: impl App + 'static) -> Result<()> {
    let event_loop = EventLoop::builder().build()?;

    let frames_per_second = settings.timing.frames_per_second.max(1);
    let now = Instant::now();

    let mut app_runner = AppRunner {
        settings,
        graphics: None,
        app: Box::new(app),
        frame_interval: Duration::from_secs(1) / frames_per_second,
        next_frame: now,
        start_time: now,
        last_frame_time: now,
    };

    event_loop.run_app(&mut app_runner)?;

    Ok(())
}

#[cfg(debug_assertions)]
fn enable_gl_debug() {
    unsafe {
        if gl::DebugMessageCallback::is_loaded() {
            gl::Enable(gl::DEBUG_OUTPUT);
            gl::Enable(gl::DEBUG_OUTPUT_SYNCHRONOUS);
            gl::DebugMessageCallback(Some(gl_debug_callback), std::ptr::null());
            gl::DebugMessageControl(
                gl::DONT_CARE,
                gl::DONT_CARE,
                gl::DONT_CARE,
                0,
                std::ptr::null(),
                gl::TRUE,
            );
            log::info!("OpenGL debug layer enabled");
        } else {
            log::warn!("OpenGL debug callbacks not supported");
        }
    }
}

#[cfg(not(debug_assertions))]
fn enable_gl_debug() {}

#[cfg(debug_assertions)]
extern "system" fn gl_debug_callback(
    _source: GLenum,
    error_type: GLenum,
    id: GLuint,
    severity: GLenum,
    _length: GLsizei,
    message: *const GLchar,
    _user_param: *mut std::ffi::c_void,
) {
    let message = unsafe {
        if message.is_null() {
            return;
        }
        CStr::from_ptr(message).to_string_lossy()
    };

    let type_str = match error_type {
        gl::DEBUG_TYPE_ERROR => "Error",
        gl::DEBUG_TYPE_DEPRECATED_BEHAVIOR => "Deprecated",
        gl::DEBUG_TYPE_UNDEFINED_BEHAVIOR => "Undefined Behavior",
        gl::DEBUG_TYPE_PERFORMANCE => "Performance",
        _ => "Other",
    };

    match severity {
        gl::DEBUG_SEVERITY_HIGH => log::error!("[GL] {} ({}): {}", type_str, id, message),
        gl::DEBUG_SEVERITY_MEDIUM => log::warn!("[GL] {} ({}): {}", type_str, id, message),
        gl::DEBUG_SEVERITY_LOW => log::info!("[GL] {} ({}): {}", type_str, id, message),
        _ => log::trace!("[GL] {} ({}): {}", type_str, id, message),
    }
}
