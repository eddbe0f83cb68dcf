use std::{
    path::PathBuf,
    process::ExitCode,
    sync::{
        atomic::{
            AtomicBool,
            Ordering
        },
        Arc
    },
    time::Duration
};

use clap::Parser;
use agent_map_view::{
    app::client::{
        run_session,
        ViewerOptions
    },
    session::{
        QualityLevel,
        SessionSettings
    },
    view::{
        frame_loop::LoopExit,
        overlay::PositionFilter,
        scale::WindowConfig
    },
    DEFAULT_HOST,
    DEFAULT_MAPS_DIR,
    DEFAULT_PORT,
    RECONNECT_BACKOFF
};

/// Live top-down view of the agents of a running simulation
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Print debug information
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// IP of the host server
    #[arg(long = "host", value_name = "H", default_value_t = String::from(DEFAULT_HOST))]
    host: String,

    /// TCP port to listen to
    #[arg(short = 'p', long = "port", value_name = "P", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Start positions to mark on the map, 'all' or comma separated indices
    #[arg(long = "positions", alias = "pos", value_name = "INDICES", default_value = "all")]
    positions: PositionFilter,

    /// Do not draw start position labels
    #[arg(long = "no-labels")]
    no_labels: bool,

    /// Player start position of the episode
    #[arg(long = "start", value_name = "INDEX", default_value_t = 0)]
    start: usize,

    /// Directory with map descriptors and images
    #[arg(long = "maps-dir", value_name = "DIR", default_value = DEFAULT_MAPS_DIR)]
    maps_dir: PathBuf,

    /// Number of non-player vehicles
    #[arg(long = "vehicles", default_value_t = 3)]
    vehicles: u32,

    /// Number of non-player pedestrians
    #[arg(long = "pedestrians", default_value_t = 40)]
    pedestrians: u32,

    /// Weather preset id
    #[arg(long = "weather", default_value_t = 1)]
    weather: u32,

    /// Graphics quality level, Low or Epic
    #[arg(long = "quality", default_value = "Low")]
    quality: QualityLevel,

    /// Run the simulator in synchronous mode
    #[arg(long = "synchronous")]
    synchronous: bool,

    /// Network timeout of every simulator request
    #[arg(long = "timeout-ms", value_name = "MS", default_value_t = 10_000)]
    timeout_ms: u64,
}

impl Cli {
    fn viewer_options(&self) -> ViewerOptions {
        ViewerOptions {
            host: self.host.clone(),
            port: self.port,
            timeout: Duration::from_millis(self.timeout_ms),
            maps_dir: self.maps_dir.clone(),
            settings: SessionSettings {
                synchronous_mode: self.synchronous,
                send_non_player_agents_info: true,
                number_of_vehicles: self.vehicles,
                number_of_pedestrians: self.pedestrians,
                weather_id: self.weather,
                quality_level: self.quality,
                seed_vehicles: None,
                seed_pedestrians: None,
            },
            player_start_index: self.start,
            positions: self.positions.clone(),
            show_labels: !self.no_labels,
            window: WindowConfig::default(),
        }
    }
}

fn cancelled() -> ExitCode {
    println!("\nCancelled by user. Bye!");
    ExitCode::SUCCESS
}

fn main() -> ExitCode {
    let cli_args = Cli::parse();

    let default_filter = if cli_args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .format_file(false)
        .format_line_number(true)
        .init();
    log::debug!("Got args: '{:?}'.", cli_args);

    let interrupt = Arc::new(AtomicBool::new(false));
    let interrupt_shared = interrupt.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        interrupt_shared.store(true, Ordering::SeqCst);
    }) {
        log::error!("Error setting Ctrl-C handler: {e}");
        return ExitCode::FAILURE;
    }

    let mut event_loop = match winit::event_loop::EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            log::error!("Could not create event loop: {e}");
            return ExitCode::FAILURE;
        }
    };

    let options = cli_args.viewer_options();
    log::info!("Listening to server {}:{}", options.host, options.port);

    loop {
        if interrupt.load(Ordering::SeqCst) {
            return cancelled();
        }

        match run_session(&mut event_loop, &options, interrupt.clone()) {
            Ok(LoopExit::WindowClosed) => break,
            Ok(LoopExit::Interrupted) => return cancelled(),
            Err(e) if e.is_transient() => {
                log::error!("{e}");
                std::thread::sleep(RECONNECT_BACKOFF);
            },
            Err(e) => {
                log::error!("{e}");
                return ExitCode::FAILURE;
            }
        }
    }

    println!("Done.");
    ExitCode::SUCCESS
}
