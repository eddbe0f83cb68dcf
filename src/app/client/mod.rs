pub mod renderer;
pub mod tessellation;
pub mod window;

use std::{
    path::PathBuf,
    sync::{
        atomic::AtomicBool,
        Arc
    },
    time::Duration
};

use winit::event_loop::EventLoop;

use crate::{
    session::{
        SessionError,
        SessionSettings,
        SimulationSession,
        SimulatorClient
    },
    view::{
        frame_loop::{
            FrameLoopController,
            LoopExit
        },
        map::MapData,
        overlay::{
            build_start_spot_overlay,
            OverlayBox,
            PositionFilter
        },
        projection::Projector,
        scale::{
            ImageScale,
            WindowConfig
        },
        shapes::ShapeBuilder,
        ConfigurationError
    }
};

use window::{
    ViewerWindow,
    WindowError
};

#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("Configuration error, reason='{0}'")]
    Configuration(#[from] ConfigurationError),

    #[error("Session error, reason='{0}'")]
    Session(#[from] SessionError),

    #[error("Window error, reason='{0}'")]
    Window(#[from] WindowError),
}

impl ViewerError {
    /// Lost or unreachable simulator is retried. Rejections, bad config and window failures end the program.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ViewerError::Session(SessionError::Connectivity(_) | SessionError::Timeout(_) | SessionError::Disconnected)
        )
    }
}

#[derive(Debug, Clone)]
pub struct ViewerOptions {
    pub host: String,
    pub port: u16,
    pub timeout: Duration,
    pub maps_dir: PathBuf,
    pub settings: SessionSettings,
    pub player_start_index: usize,
    pub positions: PositionFilter,
    pub show_labels: bool,
    pub window: WindowConfig,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            host: crate::DEFAULT_HOST.to_string(),
            port: crate::DEFAULT_PORT,
            timeout: crate::DEFAULT_TIMEOUT,
            maps_dir: PathBuf::from(crate::DEFAULT_MAPS_DIR),
            settings: SessionSettings::default(),
            player_start_index: 0,
            positions: PositionFilter::All,
            show_labels: true,
            window: WindowConfig::default(),
        }
    }
}

/// Everything a session needs before the window opens.
#[derive(Debug)]
pub struct PreparedSession {
    pub map: MapData,
    pub projector: Projector,
    pub overlay: Vec<OverlayBox>,
}

/// Configure the simulator, load the map and start the episode. A fatal scale error
/// is raised here, before the episode starts and before any window exists.
pub fn prepare_session<S: SimulationSession>(
    session: &mut S,
    options: &ViewerOptions,
) -> Result<PreparedSession, ViewerError> {
    let mut settings = options.settings.clone();
    settings.randomize_seeds();
    let scene = session.configure(&settings)?;
    log::info!("Simulator loaded map '{}' with {} start spots", scene.map_name, scene.player_start_spots.len());

    let map = MapData::load(&options.maps_dir, &scene.map_name)?;
    let scale = ImageScale::from_dimensions(map.image_size(), options.window)?;
    let projector = Projector::new(map.transform, scale);

    session.start_episode(options.player_start_index)?;
    log::info!("Episode started at position {}", options.player_start_index);

    let overlay = build_start_spot_overlay(
        &scene.player_start_spots,
        &options.positions,
        &projector,
        options.show_labels
    );

    Ok(PreparedSession {
        map,
        projector,
        overlay,
    })
}

/// One viewer session: connect, prepare and draw frames until the window closes
/// or `interrupt` is raised.
pub fn run_session(
    event_loop: &mut EventLoop<()>,
    options: &ViewerOptions,
    interrupt: Arc<AtomicBool>,
) -> Result<LoopExit, ViewerError> {
    let mut client = SimulatorClient::connect(&options.host, options.port, options.timeout)?;
    let PreparedSession { map, projector, overlay } = prepare_session(&mut client, options)?;

    let title = format!("Agent map view - {}", map.name);
    let mut window = ViewerWindow::open(event_loop, &title, options.window, &map.image)?;

    let mut controller = FrameLoopController::new(
        &mut window,
        &mut client,
        ShapeBuilder::new(projector),
        overlay,
        interrupt
    );
    let exit = controller.run()?;
    log::info!("Session finished after {} frames, reason={exit:?}", controller.frames());
    Ok(exit)
}
