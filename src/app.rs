//! Window, GL context and the frame loop around the active demo.

use std::num::NonZeroU32;
use std::rc::Rc;
use std::time::Instant;
use anyhow::{ anyhow, Context as _ };
use glutin::config::ConfigTemplateBuilder;
use glutin::context::{ ContextApi, ContextAttributesBuilder, GlProfile, PossiblyCurrentContext, Version };
use glutin::display::GetGlDisplay;
use glutin::prelude::*;
use glutin::surface::{ Surface, SurfaceAttributesBuilder, SwapInterval, WindowSurface };
use glutin_winit::DisplayBuilder;
use raw_window_handle::HasWindowHandle;
use winit::application::ApplicationHandler;
use winit::dpi::{ PhysicalPosition, PhysicalSize };
use winit::event::{ DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent };
use winit::event_loop::{ ActiveEventLoop, EventLoop };
use winit::keyboard::{ KeyCode, PhysicalKey };
use winit::window::{ CursorGrabMode, Window, WindowId };

use crate::demos::{ create_demo, Demo };
use crate::engine::config::AppConfig;
use crate::engine::rendering::Gl;
use crate::engine::systems::InputSystem;

// Field order is drop order: GPU wrappers go before the context.
struct Running {
    demo: Box<dyn Demo>,
    gl_surface: Surface<WindowSurface>,
    gl_context: PossiblyCurrentContext,
    window: Window,
    focused: bool,
    start_time: Instant,
    last_frame_time: Instant,
}

pub struct App {
    config: AppConfig,
    input: InputSystem,
    running: Option<Running>,
    error: Option<anyhow::Error>,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            input: InputSystem::new(),
            running: None,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{:#}", error);
        self.error = Some(error);
        event_loop.exit();
    }

    fn start(&self, event_loop: &ActiveEventLoop) -> anyhow::Result<Running> {
        let settings = &self.config.window;
        let window_attributes = Window::default_attributes()
            .with_title(settings.title.clone())
            .with_inner_size(PhysicalSize::new(settings.width, settings.height));

        let template = ConfigTemplateBuilder::new().with_depth_size(24).with_stencil_size(8);
        let (window, gl_config) = DisplayBuilder::new()
            .with_window_attributes(Some(window_attributes))
            .build(event_loop, template, |mut configs| {
                // find_configs errors out rather than yielding an empty list
                configs.next().expect("display offered no GL configs")
            })
            .map_err(|e| anyhow!("cannot create GL display: {}", e))?;
        let window = window.ok_or_else(|| anyhow!("window was not created"))?;
        let raw_window = window.window_handle()?.as_raw();

        let display = gl_config.display();
        let context_attributes = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .with_profile(GlProfile::Core)
            .build(Some(raw_window));
        let not_current = unsafe { display.create_context(&gl_config, &context_attributes) }
            .context("cannot create OpenGL 3.3 core context")?;

        let size = window.inner_size();
        let surface_attributes = SurfaceAttributesBuilder::<WindowSurface>::new().build(
            raw_window,
            non_zero(size.width),
            non_zero(size.height)
        );
        let gl_surface = unsafe { display.create_window_surface(&gl_config, &surface_attributes) }?;
        let gl_context = not_current.make_current(&gl_surface)?;

        let interval = if settings.vsync {
            SwapInterval::Wait(NonZeroU32::MIN)
        } else {
            SwapInterval::DontWait
        };
        if let Err(e) = gl_surface.set_swap_interval(&gl_context, interval) {
            log::warn!("Cannot set swap interval: {}", e);
        }

        let context = unsafe {
            glow::Context::from_loader_function_cstr(|symbol| display.get_proc_address(symbol))
        };
        let gl: Gl = Rc::new(context);
        log::info!("OpenGL {}", gl.version());

        let demo = create_demo(self.config.demo, &gl, &self.config)?;
        if demo.captures_cursor() {
            grab_cursor(&window);
        }

        let now = Instant::now();
        window.request_redraw();
        Ok(Running {
            demo,
            gl_surface,
            gl_context,
            window,
            focused: true,
            start_time: now,
            last_frame_time: now,
        })
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }
        match self.start(event_loop) {
            Ok(running) => self.running = Some(running),
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(running) = &mut self.running else {
            return;
        };
        self.input.handle_window_event(&event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::KeyboardInput {
                event: KeyEvent { physical_key: PhysicalKey::Code(KeyCode::Escape), state: ElementState::Pressed, .. },
                ..
            } => event_loop.exit(),

            WindowEvent::Focused(focused) => {
                running.focused = focused;
                if !focused {
                    self.input.release_all();
                } else if running.demo.captures_cursor() {
                    grab_cursor(&running.window);
                }
                running.demo.on_focus(focused);
            }

            WindowEvent::Resized(size) => {
                running.gl_surface.resize(&running.gl_context, non_zero(size.width), non_zero(size.height));
                running.window.request_redraw();
            }

            // a captured cursor is driven by raw motion in device_event
            WindowEvent::CursorMoved { position, .. } if !running.demo.captures_cursor() => {
                let size = running.window.inner_size();
                running.demo.on_cursor_moved(position.x, position.y, (size.width, size.height));
            }

            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let delta_time = (now - running.last_frame_time).as_secs_f32();
                let elapsed = (now - running.start_time).as_secs_f32();
                running.last_frame_time = now;

                let size = running.window.inner_size();
                let scroll = self.input.take_scroll();
                if scroll != 0.0 {
                    running.demo.on_scroll(scroll, self.input.cursor(), (size.width, size.height));
                }
                running.demo.update(&self.input, delta_time);

                if let Err(e) = running.demo.render(size.width, size.height, elapsed) {
                    let error = anyhow::Error::new(e).context(format!("demo '{}' failed to render", running.demo.name()));
                    self.fail(event_loop, error);
                    return;
                }
                if let Err(e) = running.gl_surface.swap_buffers(&running.gl_context) {
                    log::error!("Swap buffers failed: {}", e);
                }
                running.window.request_redraw();
            }

            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _id: DeviceId, event: DeviceEvent) {
        let Some(running) = &mut self.running else {
            return;
        };
        if !running.focused || !running.demo.captures_cursor() {
            return;
        }
        if self.input.handle_device_event(&event) {
            let (x, y) = self.input.pointer();
            let size = running.window.inner_size();
            running.demo.on_cursor_moved(x, y, (size.width, size.height));
        }
    }
}

fn grab_cursor(window: &Window) {
    window.set_cursor_visible(false);
    let grab = window
        .set_cursor_grab(CursorGrabMode::Confined)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Locked));
    if let Err(e) = grab {
        log::warn!("Cursor grab not supported on this platform: {}", e);
    }

    let size = window.inner_size();
    let center = PhysicalPosition::new((size.width as f64) / 2.0, (size.height as f64) / 2.0);
    if let Err(e) = window.set_cursor_position(center) {
        log::warn!("Could not center cursor: {}", e);
    }
}

fn non_zero(value: u32) -> NonZeroU32 {
    NonZeroU32::new(value).unwrap_or(NonZeroU32::MIN)
}

/// Opens the window and runs the configured demo until it is closed.
pub fn run(config: AppConfig) -> anyhow::Result<()> {
    let event_loop = EventLoop::new()?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    // GPU objects must go while the context is still alive
    app.running = None;
    match app.error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
