pub mod client_session;
pub mod routes;
pub mod simulation;

use std::{
    collections::HashMap,
    sync::{
        Arc,
        Mutex
    }
};

use client_session::{
    ClientSession,
    ClientSessionDisconnectEvent,
    ClientSessionId
};
use simulation::{
    SimulationState,
    SIMULATION_STEP
};

use crate::game::scene::SceneLayout;

#[derive(Debug, thiserror::Error)]
pub enum SimulationServerError {
    #[error("IoError, reason='{0}'")]
    IoError(#[from] tokio::io::Error),

    #[error("Failed to shutdown server")]
    ShutdownError,

    #[error("Could not join task, reason='{0}'")]
    TaskJoinError(#[from] tokio::task::JoinError),
}

type ClientSessionsHandlers = Arc<Mutex<HashMap<ClientSessionId, client_session::ClientSessionHandler>>>;

pub struct SimulationServerHandler {
    pub simulation: Arc<Mutex<SimulationState>>,
    connection_task_handler: tokio::task::JoinHandle<()>,
    client_sessions_handlers: ClientSessionsHandlers,
    main_task_handler: tokio::task::JoinHandle<()>,
    shutdown_sender: tokio::sync::oneshot::Sender<()>,
    notify_no_connection: Arc<tokio::sync::Notify>,
    notify_any_connection: Arc<tokio::sync::Notify>,
}

/// Demo simulator: serves a scripted scene over the JSON-lines session protocol.
pub struct SimulationServer {
    listener: tokio::net::TcpListener,
    layout: SceneLayout,
}

impl SimulationServer {
    pub async fn bind_any_local() -> Result<Self, SimulationServerError> {
        Self::bind("127.0.0.1:0").await
    }

    pub async fn bind<A: tokio::net::ToSocketAddrs>(addr: A) -> Result<Self, SimulationServerError> {
        Ok(Self {
            listener: tokio::net::TcpListener::bind(addr).await?,
            layout: SceneLayout::default(),
        })
    }

    pub fn with_layout(mut self, layout: SceneLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn get_local_address(&self) -> Result<std::net::SocketAddr, std::io::Error> {
        self.listener.local_addr()
    }

    pub async fn run(self) -> Result<SimulationServerHandler, SimulationServerError> {
        log::info!("Serving map '{}' on {}", self.layout.map_name, self.get_local_address()?);

        let simulation_state = SimulationState::new(self.layout);
        let frames = simulation_state.subscribe_frames();
        let simulation = Arc::new(Mutex::new(simulation_state));
        let simulation_shared_clients = simulation.clone();
        let simulation_shared = simulation.clone();
        let listener = self.listener;

        let (shutdown_sender, mut shutdown_receiver) = tokio::sync::oneshot::channel();
        let (shutdown_server_sender, mut shutdown_server_receiver) = tokio::sync::oneshot::channel::<()>();

        let client_sessions_handlers: ClientSessionsHandlers = Arc::new(Mutex::new(HashMap::new()));
        let (client_disconnect_tx, mut client_disconnect_rx) = tokio::sync::mpsc::channel::<ClientSessionDisconnectEvent>(32);

        let client_sessions_handlers_shared = client_sessions_handlers.clone();

        let notify_no_connection = Arc::new(tokio::sync::Notify::new());
        let notify_no_connection_shared = notify_no_connection.clone();

        let notify_any_connection = Arc::new(tokio::sync::Notify::new());
        let notify_any_connection_shared = notify_any_connection.clone();

        let connection_task_handler = tokio::spawn(async move {
            let mut new_client_session_id = 0;
            loop {
                tokio::select! {
                    _ = &mut shutdown_server_receiver => {
                        log::debug!("Received server shut down signal...");
                        break;
                    },
                    client_session_id = client_disconnect_rx.recv() => {
                        let Some(client_session_id) = client_session_id else {
                            log::warn!("Client disconnect channel closed");
                            continue;
                        };
                        log::debug!("Client session got disconnected {}", client_session_id.id);

                        let (client_session_handler, no_more_clients) = match client_sessions_handlers.lock() {
                            Ok(mut guard) => {
                                let removed_client = guard.remove(&client_session_id.id);
                                (removed_client, guard.is_empty())
                            },
                            Err(e) => {
                                log::error!("Client sessions lock poisoned: {e}");
                                (None, false)
                            }
                        };

                        if no_more_clients {
                            notify_no_connection_shared.notify_one();
                        }

                        match client_session_handler {
                            Some(client_session_handler) => {
                                if let Err(e) = client_session_handler.task_handler.await {
                                    log::error!("Client session {} did not close gracefully: {e}", client_session_id.id);
                                }
                            },
                            None => log::warn!("Attempt to remove not existing client session {}", client_session_id.id),
                        }
                    },
                    incoming_connection = listener.accept() => {
                        let connection = match incoming_connection {
                            Ok(connection) => connection,
                            Err(e) => {
                                log::warn!("Failed to accept connection: {e}");
                                continue;
                            }
                        };

                        let assigned_client_session_id = new_client_session_id;
                        new_client_session_id += 1;

                        let client_session = ClientSession::new(connection, assigned_client_session_id);
                        match client_session.run(simulation_shared_clients.clone(), frames.clone(), client_disconnect_tx.clone()) {
                            Ok(handler) => {
                                if let Ok(mut guard) = client_sessions_handlers.lock() {
                                    guard.insert(handler.id, handler);
                                    log::info!("Appending connection, count={}", guard.len());
                                }
                                notify_any_connection_shared.notify_one();
                            },
                            Err(e) => {
                                log::error!("Failed to run client session: {:?}", e);
                            },
                        }
                    },
                }
            }
        });

        let main_task_handler = tokio::spawn(async move {
            let mut interval = tokio::time::interval(SIMULATION_STEP);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = &mut shutdown_receiver => {
                        log::debug!("Received shut down signal...");

                        if shutdown_server_sender.send(()).is_err() {
                            log::error!("Could not emit signal to stop server!");
                        }

                        break;
                    },
                    _ = interval.tick() => {
                        if let Ok(mut simulation_lock) = simulation_shared.lock() {
                            simulation_lock.tick();
                        }
                    },
                }
            }
        });

        Ok(SimulationServerHandler {
            simulation,
            connection_task_handler,
            client_sessions_handlers: client_sessions_handlers_shared,
            main_task_handler,
            shutdown_sender,
            notify_no_connection,
            notify_any_connection
        })
    }
}

impl SimulationServerHandler {
    pub async fn shutdown(self) -> Result<(), SimulationServerError> {
        log::debug!("Gracefully shutting down server...");
        self.shutdown_sender.send(()).map_err(|_| SimulationServerError::ShutdownError)?;
        self.main_task_handler.await?;
        self.connection_task_handler.await?;
        log::debug!("Server shut down successfully!");
        Ok(())
    }

    pub async fn await_any_connection(&self) {
        self.notify_any_connection.notified().await
    }

    pub async fn await_all_disconnect(&self) {
        self.notify_no_connection.notified().await
    }

    pub fn connections_count(&self) -> usize {
        self.client_sessions_handlers
            .lock()
            .map(|guard| guard.len())
            .unwrap_or_default()
    }
}
