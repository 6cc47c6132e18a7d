//! WebSocket message dispatch
//!
//! Single entry point for client messages: each is routed to the matching
//! state operation, and failures come back as a typed `Error { code, msg }`
//! the client can both display and branch on.

use crate::error::GameError;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use crate::types::PlayerId;
use std::sync::Arc;

fn error_reply(err: GameError) -> Option<ServerMessage> {
    Some(ServerMessage::Error {
        code: err.code().to_string(),
        msg: err.to_string(),
    })
}

/// Handle a client message and return the direct response, if any.
///
/// `connected` tracks which player this connection speaks for, so presence
/// can be cleared when the socket goes away.
pub async fn handle_message(
    msg: ClientMessage,
    connected: &mut Option<PlayerId>,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    match msg {
        ClientMessage::CreateRoom {
            name,
            max_players,
            game_mode,
            difficulty,
            is_private,
        } => {
            match state
                .create_room(&name, max_players, game_mode, difficulty, is_private)
                .await
            {
                Ok(room) => Some(ServerMessage::RoomCreated { room }),
                Err(e) => error_reply(e),
            }
        }

        ClientMessage::ListRooms => Some(ServerMessage::RoomList {
            rooms: state.list_joinable_rooms().await,
        }),

        ClientMessage::JoinRoom { room_id, username } => {
            match state.join_room(&room_id, &username).await {
                Ok((room, player)) => {
                    *connected = Some(player.id.clone());
                    let players = state.room_players(&room.id).await;
                    Some(ServerMessage::RoomJoined {
                        room,
                        player,
                        players,
                    })
                }
                Err(e) => error_reply(e),
            }
        }

        ClientMessage::JoinByCode { code, username } => {
            match state.join_room_by_code(&code, &username).await {
                Ok((room, player)) => {
                    *connected = Some(player.id.clone());
                    let players = state.room_players(&room.id).await;
                    Some(ServerMessage::RoomJoined {
                        room,
                        player,
                        players,
                    })
                }
                Err(e) => error_reply(e),
            }
        }

        ClientMessage::LeaveRoom { player_id } => match state.leave_room(&player_id).await {
            Ok(_) => {
                if connected.as_deref() == Some(player_id.as_str()) {
                    *connected = None;
                }
                None
            }
            Err(e) => error_reply(e),
        },

        ClientMessage::ReadyUp {
            player_id,
            is_ready,
        } => match state.set_ready(&player_id, is_ready).await {
            Ok(_) => None,
            Err(e) => error_reply(e),
        },

        ClientMessage::StartGame { room_id } => match state.start_game(&room_id).await {
            Ok(_) => None,
            Err(e) => error_reply(e),
        },

        ClientMessage::PauseGame { room_id } => match state.pause_game(&room_id).await {
            Ok(_) => None,
            Err(e) => error_reply(e),
        },

        ClientMessage::ResumeGame { room_id } => match state.resume_game(&room_id).await {
            Ok(_) => None,
            Err(e) => error_reply(e),
        },

        ClientMessage::AdvanceRound { room_id } => match state.advance_round(&room_id).await {
            Ok(_) => None,
            Err(e) => error_reply(e),
        },

        ClientMessage::SubmitCode {
            player_id,
            task_id,
            code,
            language,
        } => match state.submit_code(&player_id, &task_id, code, language).await {
            Ok(result) => Some(ServerMessage::SubmissionResult { result }),
            Err(e) => error_reply(e),
        },

        ClientMessage::SubmitAnswer {
            player_id,
            puzzle_id,
            answer,
        } => match state
            .submit_puzzle_answer(&player_id, &puzzle_id, answer)
            .await
        {
            Ok(result) => Some(ServerMessage::SubmissionResult { result }),
            Err(e) => error_reply(e),
        },

        ClientMessage::RequestHint {
            player_id,
            target_id,
        } => match state.take_hint(&player_id, &target_id).await {
            Ok((hint, hints_used)) => Some(ServerMessage::Hint {
                player_id,
                target_id,
                hint,
                hints_used,
            }),
            Err(e) => error_reply(e),
        },

        ClientMessage::FetchLeaderboard { room_id } => match state.leaderboard(&room_id).await {
            Ok(entries) => Some(ServerMessage::LeaderboardUpdate { room_id, entries }),
            Err(e) => error_reply(e),
        },

        ClientMessage::FetchHistory { player_id } => {
            let records = state.player_history(&player_id).await;
            Some(ServerMessage::History { player_id, records })
        }
    }
}
