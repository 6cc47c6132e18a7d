use crate::types::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    CreateRoom {
        name: String,
        max_players: u32,
        game_mode: GameMode,
        difficulty: Difficulty,
        is_private: bool,
    },
    ListRooms,
    JoinRoom {
        room_id: RoomId,
        username: String,
    },
    JoinByCode {
        code: String,
        username: String,
    },
    LeaveRoom {
        player_id: PlayerId,
    },
    ReadyUp {
        player_id: PlayerId,
        is_ready: bool,
    },
    StartGame {
        room_id: RoomId,
    },
    PauseGame {
        room_id: RoomId,
    },
    ResumeGame {
        room_id: RoomId,
    },
    AdvanceRound {
        room_id: RoomId,
    },
    SubmitCode {
        player_id: PlayerId,
        task_id: TaskId,
        code: String,
        language: String,
    },
    SubmitAnswer {
        player_id: PlayerId,
        puzzle_id: PuzzleId,
        answer: String,
    },
    RequestHint {
        player_id: PlayerId,
        target_id: String,
    },
    FetchLeaderboard {
        room_id: RoomId,
    },
    FetchHistory {
        player_id: PlayerId,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        protocol: String,
        server_now: String,
        rooms: Vec<Room>,
    },
    RoomList {
        rooms: Vec<Room>,
    },
    RoomCreated {
        room: Room,
    },
    /// Direct reply to a successful join; carries the full roster
    RoomJoined {
        room: Room,
        player: Player,
        players: Vec<Player>,
    },
    PlayerJoined {
        room_id: RoomId,
        player: Player,
    },
    PlayerLeft {
        room_id: RoomId,
        player_id: PlayerId,
    },
    PlayerReady {
        room_id: RoomId,
        player_id: PlayerId,
        is_ready: bool,
    },
    PlayerPresence {
        room_id: RoomId,
        player_id: PlayerId,
        is_online: bool,
    },
    /// Roles are assigned by the time this goes out
    GameStarted {
        session: GameSession,
        players: Vec<Player>,
    },
    GamePaused {
        session: GameSession,
    },
    GameResumed {
        session: GameSession,
    },
    GameEnded {
        session: GameSession,
        leaderboard: Vec<LeaderboardEntry>,
    },
    RoundAdvanced {
        session: GameSession,
    },
    TimerUpdate {
        room_id: RoomId,
        time_remaining: u32,
    },
    ScoreUpdate {
        room_id: RoomId,
        player_id: PlayerId,
        score: u32,
    },
    LeaderboardUpdate {
        room_id: RoomId,
        entries: Vec<LeaderboardEntry>,
    },
    SubmissionResult {
        result: SubmissionResult,
    },
    Hint {
        player_id: PlayerId,
        target_id: String,
        hint: String,
        hints_used: u8,
    },
    History {
        player_id: PlayerId,
        records: Vec<GameRecord>,
    },
    Error {
        code: String,
        msg: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_wire_format() {
        let json = r#"{"t":"join_room","room_id":"r1","username":"CyberNinja"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        match msg {
            ClientMessage::JoinRoom { room_id, username } => {
                assert_eq!(room_id, "r1");
                assert_eq!(username, "CyberNinja");
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_server_message_tagging() {
        let msg = ServerMessage::TimerUpdate {
            room_id: "r1".to_string(),
            time_remaining: 899,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""t":"timer_update""#));
        assert!(json.contains(r#""time_remaining":899"#));
    }
}
