//! Core Engine struct and main loop

use std::error::Error;
use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::PhysicalKey,
    window::{Window, WindowId},
};

use super::config::EngineConfig;
use super::debug::FrameStats;
use super::time::Time;
use crate::input::Input;
use crate::renderer::{RenderBackend, RenderError, Renderer};

/// Game trait that users implement
pub trait Game: 'static {
    /// Called once the renderer exists; build GPU resources here.
    ///
    /// # Errors
    ///
    /// Any error aborts `Engine::run`
    fn init(&mut self, engine: &mut EngineContext) -> Result<(), Box<dyn Error>>;

    /// Called every frame for game logic updates
    fn update(&mut self, engine: &mut EngineContext);

    /// Called every frame after `update` to draw.
    ///
    /// # Errors
    ///
    /// Any error aborts `Engine::run`
    fn render(&mut self, engine: &mut EngineContext) -> Result<(), RenderError>;

    /// Called when the window is resized
    fn on_resize(&mut self, _engine: &mut EngineContext, _width: u32, _height: u32) {}

    /// Called when the game is shutting down
    fn shutdown(&mut self, _engine: &mut EngineContext) {}
}

/// Context passed to game callbacks
pub struct EngineContext {
    /// Time tracking
    pub time: Time,
    /// Input state
    pub input: Input,
    /// Frame statistics
    pub stats: FrameStats,
    /// Configuration the engine was started with
    pub config: EngineConfig,
    /// Renderer (available after initialization)
    renderer: Option<Renderer>,
    /// Window size
    window_size: PhysicalSize<u32>,
    /// Should the engine quit
    should_quit: bool,
}

impl EngineContext {
    fn new(config: EngineConfig) -> Self {
        Self {
            time: Time::new(),
            input: Input::new(),
            stats: FrameStats::new(),
            window_size: PhysicalSize::new(config.width, config.height),
            config,
            renderer: None,
            should_quit: false,
        }
    }

    /// Get the renderer, if it has been created
    pub fn renderer(&self) -> Option<&Renderer> {
        self.renderer.as_ref()
    }

    /// Get the renderer mutably, if it has been created
    pub fn renderer_mut(&mut self) -> Option<&mut Renderer> {
        self.renderer.as_mut()
    }

    /// Get window width
    pub fn width(&self) -> u32 {
        self.window_size.width
    }

    /// Get window height
    pub fn height(&self) -> u32 {
        self.window_size.height
    }

    /// Get aspect ratio
    pub fn aspect_ratio(&self) -> f32 {
        self.window_size.width as f32 / self.window_size.height.max(1) as f32
    }

    /// Request engine shutdown
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Check if engine should quit
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }
}

/// Main engine struct
pub struct Engine<G: Game> {
    game: G,
    context: EngineContext,
    window: Option<Arc<Window>>,
    initialized: bool,
    /// Set once `Game::shutdown` has run; no frames follow
    stopped: bool,
    /// First fatal error, returned from `run`
    error: Option<Box<dyn Error>>,
}

impl<G: Game> Engine<G> {
    /// Create a new engine with the given game
    pub fn new(config: EngineConfig, game: G) -> Self {
        Self {
            game,
            context: EngineContext::new(config),
            window: None,
            initialized: false,
            stopped: false,
            error: None,
        }
    }

    /// Run the engine until the window closes or the game quits.
    ///
    /// # Errors
    ///
    /// Returns an error if the event loop, window or renderer cannot be
    /// created, or if the game fails to initialize or render
    pub fn run(mut self) -> Result<(), Box<dyn Error>> {
        // A host application may already have installed a logger
        let _ = env_logger::try_init();
        log::info!("Starting engine: {}", self.context.config.title);

        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop.run_app(&mut self)?;

        match self.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: Box<dyn Error>) {
        log::error!("{error}");
        if self.error.is_none() {
            self.error = Some(error);
        }
        self.stop();
        event_loop.exit();
    }

    /// Shut the game down exactly once
    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.game.shutdown(&mut self.context);
        }
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Result<(), Box<dyn Error>> {
        let config = &self.context.config;
        let window_attrs = Window::default_attributes()
            .with_title(&config.title)
            .with_inner_size(PhysicalSize::new(config.width, config.height));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let renderer = pollster::block_on(Renderer::new(Arc::clone(&window), config))?;

        self.context.window_size = window.inner_size();
        self.context.renderer = Some(renderer);
        self.window = Some(window);

        if !self.initialized {
            self.game.init(&mut self.context)?;
            self.initialized = true;
            log::info!("Engine initialized successfully");
        }
        Ok(())
    }

    /// Update and render one frame. Returns `false` once the engine has
    /// stopped.
    fn step(&mut self) -> Result<bool, RenderError> {
        if self.stopped {
            return Ok(false);
        }

        self.context.time.update();
        self.context.stats.record_frame(self.context.time.delta());

        self.game.update(&mut self.context);

        if self.context.should_quit() {
            log::info!("Quit requested, shutting down");
            self.stop();
            return Ok(false);
        }

        self.game.render(&mut self.context)?;

        if self.context.stats.report_due() {
            log::debug!("{}", self.context.stats.format_stats());
        }

        self.context.input.end_frame();
        Ok(true)
    }

    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        match self.step() {
            Ok(true) => {
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            Ok(false) => event_loop.exit(),
            Err(e) => self.fail(event_loop, Box::new(e)),
        }
    }
}

impl<G: Game> ApplicationHandler for Engine<G> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(e) = self.create_window(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, shutting down");
                self.stop();
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => {
                if new_size.width > 0 && new_size.height > 0 {
                    self.context.window_size = new_size;
                    if let Some(renderer) = &mut self.context.renderer {
                        renderer.resize(new_size.width, new_size.height);
                    }
                    self.game
                        .on_resize(&mut self.context, new_size.width, new_size.height);
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    self.context.input.process_keyboard(key_code, event.state);
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                self.context.input.process_mouse_button(button, state);
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.context
                    .input
                    .process_cursor(glam::Vec2::new(position.x as f32, position.y as f32));
            }

            WindowEvent::CursorLeft { .. } => {
                self.context.input.cursor_left();
            }

            WindowEvent::RedrawRequested => {
                if self.initialized {
                    self.frame(event_loop);
                }
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if self.stopped {
            return;
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}
