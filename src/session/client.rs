use std::time::Duration;

use tokio::{
    io::{
        AsyncBufReadExt,
        AsyncWriteExt,
        BufReader
    },
    net::tcp::{
        OwnedReadHalf,
        OwnedWriteHalf
    }
};

use crate::{
    game::snapshot::FrameSnapshot,
    requests::{
        SessionRequest,
        SessionResponse
    }
};

use super::{
    SceneDescription,
    SessionError,
    SessionSettings,
    SimulationSession,
    SnapshotSource
};

/// Blocking simulator client. Owns a current-thread runtime and drives every
/// request to completion before returning.
pub struct SimulatorClient {
    runtime: tokio::runtime::Runtime,
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    timeout: Duration,
}

async fn client_do_request_await_response(
    request: &SessionRequest,
    reader: &mut BufReader<OwnedReadHalf>,
    writer: &mut OwnedWriteHalf,
) -> Result<SessionResponse, SessionError> {
    let mut line = serde_json::to_string(request)
        .map_err(|e| SessionError::Protocol(e.to_string()))?;
    line.push('\n');

    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;

    let mut buf_string = String::new();
    if reader.read_line(&mut buf_string).await? == 0 {
        return Err(SessionError::Disconnected);
    }
    log::trace!("Simulator responded '{}'", buf_string.trim());

    serde_json::from_str(buf_string.trim())
        .map_err(|e| SessionError::Protocol(format!("response='{}', reason={e}", buf_string.trim())))
}

impl SimulatorClient {
    pub fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self, SessionError> {
        log::info!("Connecting to simulator {host}:{port}...");
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        // timers need the runtime context, build them inside `block_on`
        let socket = runtime
            .block_on(async { tokio::time::timeout(timeout, tokio::net::TcpStream::connect((host, port))).await })
            .map_err(|_| SessionError::Timeout(timeout))??;
        socket.set_nodelay(true)?;
        log::info!("Connected to simulator {}", socket.peer_addr()?);

        let (read_half, write_half) = socket.into_split();
        Ok(Self {
            runtime,
            reader: BufReader::new(read_half),
            writer: write_half,
            timeout,
        })
    }

    fn request(&mut self, request: SessionRequest) -> Result<SessionResponse, SessionError> {
        let timeout = self.timeout;
        let (reader, writer) = (&mut self.reader, &mut self.writer);
        let response = self.runtime
            .block_on(async {
                tokio::time::timeout(timeout, client_do_request_await_response(&request, reader, writer)).await
            })
            .map_err(|_| SessionError::Timeout(timeout))??;

        match response {
            SessionResponse::BadRequest { err } => Err(SessionError::Protocol(err)),
            SessionResponse::BadState => Err(SessionError::Protocol(format!("request {request:?} rejected in current session state"))),
            other => Ok(other),
        }
    }
}

fn unexpected(response: SessionResponse) -> SessionError {
    SessionError::Protocol(format!("unexpected response {response:?}"))
}

impl SnapshotSource for SimulatorClient {
    fn read_snapshot(&mut self) -> Result<FrameSnapshot, SessionError> {
        match self.request(SessionRequest::ReadSnapshot)? {
            SessionResponse::Snapshot { snapshot } => Ok(snapshot),
            other => Err(unexpected(other)),
        }
    }
}

impl SimulationSession for SimulatorClient {
    fn ping(&mut self) -> Result<(), SessionError> {
        match self.request(SessionRequest::Ping { payload: None })? {
            SessionResponse::Ping { payload: _ } => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    fn configure(&mut self, settings: &SessionSettings) -> Result<SceneDescription, SessionError> {
        log::debug!("Configuring episode: {settings:?}");
        match self.request(SessionRequest::Configure { settings: settings.clone() })? {
            SessionResponse::SceneDescription { scene } => Ok(scene),
            other => Err(unexpected(other)),
        }
    }

    fn start_episode(&mut self, player_start_index: usize) -> Result<(), SessionError> {
        match self.request(SessionRequest::StartEpisode { player_start_index })? {
            SessionResponse::EpisodeReady { ready: true } => Ok(()),
            SessionResponse::EpisodeReady { ready: false } => Err(SessionError::Protocol(
                format!("simulator could not start episode at position {player_start_index}")
            )),
            other => Err(unexpected(other)),
        }
    }
}
