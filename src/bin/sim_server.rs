use agent_map_view::{
    app::server::SimulationServer,
    game::scene::SceneLayout,
    DEFAULT_SERVER_ADDRESS
};
use clap::Parser;

/// Demo simulator streaming scripted agents to map viewers
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Server address
    #[arg(short = 'a', long = "address", value_name = "SERVER_ADDRESS", default_value_t = String::from(DEFAULT_SERVER_ADDRESS))]
    address: String,

    /// Map name reported to clients
    #[arg(long = "map", default_value = "Town01")]
    map: String,

    /// Number of player start spots
    #[arg(long = "start-spots", default_value_t = 16)]
    start_spots: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .format_file(false)
        .format_line_number(true)
        .init();

    let cli_args = Cli::parse();
    log::debug!("Got args: '{:?}'.", cli_args);

    let layout = SceneLayout {
        map_name: cli_args.map,
        start_spot_count: cli_args.start_spots,
        ..Default::default()
    };

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let server = SimulationServer::bind(&cli_args.address).await?.with_layout(layout);
        log::info!("Simulation server, address:{:?}", server.get_local_address()?);

        let server_handler = server.run().await?;

        let (ctrlc_sender, ctrlc_receiver) = tokio::sync::oneshot::channel();
        let mut ctrlc_sender = Some(ctrlc_sender);

        ctrlc::set_handler(move || {
            log::info!("Captured ctrl-C, shutting down the server...");
            if let Some(sender) = ctrlc_sender.take() {
                let _ = sender.send(());
            }
        })?;

        let _ = ctrlc_receiver.await;
        server_handler.shutdown().await?;
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
