use serde::{
    Deserialize,
    Serialize
};

use crate::{
    game::snapshot::FrameSnapshot,
    session::{
        SceneDescription,
        SessionSettings
    }
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionRequest {
    Ping {
        payload: Option<String>
    },
    Configure {
        settings: SessionSettings
    },
    StartEpisode {
        player_start_index: usize
    },
    ReadSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionResponse {
    Ping {
        payload: Option<String>
    },
    SceneDescription {
        scene: SceneDescription
    },
    EpisodeReady {
        ready: bool
    },
    Snapshot {
        snapshot: FrameSnapshot
    },
    BadRequest {
        err: String
    },
    BadState,
}

#[test]
fn test_request_wire_format() {
    let line = serde_json::to_string(&SessionRequest::StartEpisode { player_start_index: 7 }).unwrap();
    assert_eq!(line, "{\"type\":\"StartEpisode\",\"player_start_index\":7}");

    let parsed: SessionRequest = serde_json::from_str("{\"type\":\"ReadSnapshot\"}").unwrap();
    assert_eq!(parsed, SessionRequest::ReadSnapshot);
}
