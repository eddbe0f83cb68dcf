use std::sync::{
    Arc,
    Mutex
};

use crate::requests::{
    SessionRequest,
    SessionResponse
};

use super::{
    client_session::{
        ClientSessionData,
        ClientSessionId,
        ClientSessionState
    },
    simulation::{
        SimulationState,
        SnapshotRead
    }
};

/// Serialized response, or `None` when the client already holds the latest frame
/// and has to wait for the next tick.
pub fn route_client_request(
    client_session_id: ClientSessionId,
    client_session_data: Arc<Mutex<ClientSessionData>>,
    request_str: &str,
    simulation: Arc<Mutex<SimulationState>>
) -> Option<String> {
    let response: SessionResponse = match serde_json::from_str::<SessionRequest>(request_str) {
        Ok(req) => match (client_session_data.lock(), simulation.lock()) {
            (Ok(mut session_data_guard), Ok(mut simulation_guard)) => {
                handle_request(client_session_id, req, &mut session_data_guard, &mut simulation_guard)?
            },
            (Err(e), _) => SessionResponse::BadRequest { err: e.to_string() },
            (_, Err(e)) => SessionResponse::BadRequest { err: e.to_string() },
        },
        Err(e) => SessionResponse::BadRequest { err: format!("request={request_str}, reason={e}") },
    };

    Some(serde_json::to_string(&response)
        .unwrap_or_else(|e| format!("{{\"type\":\"BadRequest\",\"err\":\"could not serialize response: {e}\"}}")))
}

fn handle_request(
    client_session_id: ClientSessionId,
    request: SessionRequest,
    session_data: &mut ClientSessionData,
    simulation: &mut SimulationState
) -> Option<SessionResponse> {
    let response = match request {
        SessionRequest::Ping { payload } => {
            SessionResponse::Ping { payload }
        },
        SessionRequest::Configure { settings } => {
            let scene = simulation.configure(&settings);
            session_data.state = ClientSessionState::Configured;
            session_data.last_frame_sent = None;
            log::debug!("Client {client_session_id} configured episode on '{}'", scene.map_name);
            SessionResponse::SceneDescription { scene }
        },
        SessionRequest::StartEpisode { player_start_index } => {
            match session_data.state {
                ClientSessionState::JustConnected => SessionResponse::BadState,
                ClientSessionState::Configured | ClientSessionState::EpisodeRunning { .. } => {
                    if player_start_index < simulation.start_spot_count() {
                        session_data.state = ClientSessionState::EpisodeRunning { player_start_index };
                        session_data.last_frame_sent = None;
                        log::info!("Client {client_session_id} started episode at position {player_start_index}");
                        SessionResponse::EpisodeReady { ready: true }
                    } else {
                        log::warn!(
                            "Client {client_session_id} requested start position {player_start_index}, only {} available",
                            simulation.start_spot_count()
                        );
                        SessionResponse::EpisodeReady { ready: false }
                    }
                },
            }
        },
        SessionRequest::ReadSnapshot => {
            match session_data.state {
                ClientSessionState::EpisodeRunning { .. } => match simulation.read_snapshot(session_data.last_frame_sent) {
                    SnapshotRead::Fresh(snapshot) => {
                        session_data.snapshots_sent += 1;
                        session_data.last_frame_sent = Some(snapshot.frame_number);
                        SessionResponse::Snapshot { snapshot }
                    },
                    SnapshotRead::Unchanged => return None,
                    SnapshotRead::NotConfigured => SessionResponse::BadState,
                },
                ClientSessionState::JustConnected | ClientSessionState::Configured => SessionResponse::BadState,
            }
        },
    };
    Some(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        game::scene::SceneLayout,
        session::SessionSettings
    };

    struct Fixture {
        session_data: Arc<Mutex<ClientSessionData>>,
        simulation: Arc<Mutex<SimulationState>>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                session_data: Arc::new(Mutex::new(ClientSessionData::default())),
                simulation: Arc::new(Mutex::new(SimulationState::new(SceneLayout::default()))),
            }
        }

        fn try_send(&self, request: SessionRequest) -> Option<SessionResponse> {
            let line = serde_json::to_string(&request).unwrap();
            route_client_request(0, self.session_data.clone(), &line, self.simulation.clone())
                .map(|response| serde_json::from_str(&response).unwrap())
        }

        fn send(&self, request: SessionRequest) -> SessionResponse {
            self.try_send(request).expect("request should be answered right away")
        }
    }

    fn configure_request() -> SessionRequest {
        SessionRequest::Configure {
            settings: SessionSettings {
                seed_vehicles: Some(1),
                seed_pedestrians: Some(2),
                ..Default::default()
            }
        }
    }

    #[test]
    fn test_ping_echoes_payload() {
        let fixture = Fixture::new();
        let response = fixture.send(SessionRequest::Ping { payload: Some("hello".to_string()) });
        assert_eq!(response, SessionResponse::Ping { payload: Some("hello".to_string()) });
    }

    #[test]
    fn test_malformed_request() {
        let fixture = Fixture::new();
        let response = route_client_request(0, fixture.session_data.clone(), "{\"type\":\"Jump\"}", fixture.simulation.clone()).unwrap();
        let response: SessionResponse = serde_json::from_str(&response).unwrap();
        assert!(matches!(response, SessionResponse::BadRequest { .. }));
    }

    #[test]
    fn test_requests_out_of_order_are_rejected() {
        let fixture = Fixture::new();
        assert_eq!(fixture.send(SessionRequest::ReadSnapshot), SessionResponse::BadState);
        assert_eq!(fixture.send(SessionRequest::StartEpisode { player_start_index: 0 }), SessionResponse::BadState);

        assert!(matches!(fixture.send(configure_request()), SessionResponse::SceneDescription { .. }));
        assert_eq!(fixture.send(SessionRequest::ReadSnapshot), SessionResponse::BadState);
    }

    #[test]
    fn test_full_session_sequence() {
        let fixture = Fixture::new();

        let scene = match fixture.send(configure_request()) {
            SessionResponse::SceneDescription { scene } => scene,
            other => panic!("unexpected response {other:?}"),
        };
        assert_eq!(scene.map_name, "Town01");
        assert_eq!(scene.player_start_spots.len(), 16);

        assert_eq!(
            fixture.send(SessionRequest::StartEpisode { player_start_index: 16 }),
            SessionResponse::EpisodeReady { ready: false }
        );
        assert_eq!(
            fixture.send(SessionRequest::StartEpisode { player_start_index: 7 }),
            SessionResponse::EpisodeReady { ready: true }
        );

        match fixture.send(SessionRequest::ReadSnapshot) {
            SessionResponse::Snapshot { snapshot } => {
                assert_eq!(snapshot.count_vehicles(), 3);
                assert_eq!(snapshot.count_pedestrians(), 40);
            },
            other => panic!("unexpected response {other:?}"),
        }

        let session_data = fixture.session_data.lock().unwrap();
        assert_eq!(session_data.player_start_index(), Some(7));
        assert_eq!(session_data.snapshots_sent, 1);
    }

    #[test]
    fn test_repeated_read_waits_for_next_tick() {
        let fixture = Fixture::new();
        fixture.send(configure_request());
        fixture.send(SessionRequest::StartEpisode { player_start_index: 0 });

        let first = match fixture.send(SessionRequest::ReadSnapshot) {
            SessionResponse::Snapshot { snapshot } => snapshot,
            other => panic!("unexpected response {other:?}"),
        };
        assert_eq!(fixture.try_send(SessionRequest::ReadSnapshot), None);

        fixture.simulation.lock().unwrap().tick();
        match fixture.send(SessionRequest::ReadSnapshot) {
            SessionResponse::Snapshot { snapshot } => assert_eq!(snapshot.frame_number, first.frame_number + 1),
            other => panic!("unexpected response {other:?}"),
        }
        assert_eq!(fixture.session_data.lock().unwrap().last_frame_sent, Some(first.frame_number + 1));
    }
}
