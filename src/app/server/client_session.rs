use std::sync::{
    Arc,
    Mutex
};

use serde::{
    Deserialize,
    Serialize
};
use tokio::io::{
    AsyncBufReadExt,
    AsyncWriteExt
};

use super::simulation::SimulationState;

#[derive(Debug, thiserror::Error)]
pub enum ClientSessionError {
    #[error("Could not read peer address, reason='{0}'")]
    PeerAddress(#[from] std::io::Error),
}

/// Per-connection protocol state. Requests out of this order are answered with `BadState`.
#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub enum ClientSessionState {
    #[default]
    JustConnected,
    Configured,
    EpisodeRunning {
        player_start_index: usize
    },
}

#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
pub struct ClientSessionData {
    pub state: ClientSessionState,
    pub snapshots_sent: u64,
    pub last_frame_sent: Option<u64>,
}

#[derive(Debug)]
pub struct ClientSession {
    id: ClientSessionId,
    socket: tokio::net::TcpStream,
    address: std::net::SocketAddr,
}

pub type ClientSessionId = u32;

#[derive(Debug)]
pub struct ClientSessionHandler {
    pub id: ClientSessionId,
    pub data: Arc<Mutex<ClientSessionData>>,
    pub task_handler: tokio::task::JoinHandle<()>
}

#[derive(Debug)]
pub struct ClientSessionDisconnectEvent {
    pub id: ClientSessionId
}

impl ClientSession {
    pub fn new(connection: (tokio::net::TcpStream, std::net::SocketAddr), new_id: ClientSessionId) -> Self {
        let (socket, address) = connection;
        Self {
            id: new_id,
            socket,
            address
        }
    }

    async fn process_client_connection(
        &mut self,
        session_data: Arc<Mutex<ClientSessionData>>,
        simulation: Arc<Mutex<SimulationState>>,
        mut frames: tokio::sync::watch::Receiver<u64>,
        session_disconnect_tx: tokio::sync::mpsc::Sender<ClientSessionDisconnectEvent>
    ) {
        log::info!("Client {} connected with address: {}", self.id, self.address);

        let (reader, mut writer) = self.socket.split();
        let mut buf_reader = tokio::io::BufReader::new(reader);
        let mut line_buff = String::new();

        loop {
            match buf_reader.read_line(&mut line_buff).await {
                Ok(0) => {
                    log::debug!("Client {} finished connection", self.id);
                    break;
                },
                Ok(_) => {
                    // 'request' line is trimmed already
                    let line = line_buff.trim();
                    log::trace!("Client {} sent line: '{}'", self.id, line);

                    let routed = loop {
                        let routed = super::routes::route_client_request(
                            self.id,
                            session_data.clone(),
                            line,
                            simulation.clone()
                        );
                        if routed.is_some() {
                            break routed;
                        }
                        // already has the latest frame, wait for the next tick
                        if frames.changed().await.is_err() {
                            break None;
                        }
                    };
                    let Some(mut response) = routed else {
                        log::warn!("Simulation stopped ticking, closing client {}", self.id);
                        break;
                    };
                    log::trace!("Response with: '{}'", response);

                    response.push('\n');

                    if let Err(e) = writer.write_all(response.as_bytes()).await {
                        log::error!("Client {} could not receive response, reason: {e}", self.id);
                        break;
                    }

                    if let Err(e) = writer.flush().await {
                        log::error!("Client {} could not flush, reason: {e}", self.id);
                        break;
                    }
                },
                Err(e) => {
                    log::error!("Client {} failed, reason={e}, finished connection", self.id);
                    break;
                }
            }
            line_buff.clear();
        }

        let summary = session_data
            .lock()
            .map(|data| format!(", start position={:?}, snapshots sent={}", data.player_start_index(), data.snapshots_sent))
            .unwrap_or_default();
        log::info!("Client {} disconnected{summary}", self.id);

        if let Err(e) = session_disconnect_tx.send(ClientSessionDisconnectEvent { id: self.id }).await {
            log::warn!("Failed to send disconnect event for client {}: {}", self.id, e);
        }
    }

    pub fn run(
        mut self,
        simulation: Arc<Mutex<SimulationState>>,
        frames: tokio::sync::watch::Receiver<u64>,
        session_disconnect_tx: tokio::sync::mpsc::Sender<ClientSessionDisconnectEvent>
    ) -> Result<ClientSessionHandler, ClientSessionError> {
        let client_session_id = self.id;
        self.socket.set_nodelay(true)?;

        let session_data = Arc::new(Mutex::new(ClientSessionData::default()));

        let session_data_shared = session_data.clone();
        let client_session_handler = tokio::spawn(async move {
            self.process_client_connection(
                session_data_shared,
                simulation,
                frames,
                session_disconnect_tx
            ).await
        });

        Ok(ClientSessionHandler {
            id: client_session_id,
            data: session_data,
            task_handler: client_session_handler
        })
    }
}

impl ClientSessionData {
    pub fn player_start_index(&self) -> Option<usize> {
        match self.state {
            ClientSessionState::EpisodeRunning { player_start_index } => Some(player_start_index),
            ClientSessionState::JustConnected | ClientSessionState::Configured => None,
        }
    }
}
