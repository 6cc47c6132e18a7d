use super::AppState;
use crate::error::{GameError, GameResult};
use crate::protocol::ServerMessage;
use crate::types::*;
use rand::Rng;
use std::collections::HashMap;

/// Safe character set for join codes (excludes 0/O, 1/I/L to avoid confusion)
const CODE_CHARS: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
const JOIN_CODE_LENGTH: usize = 6;

fn generate_join_code() -> String {
    let mut rng = rand::rng();
    (0..JOIN_CODE_LENGTH)
        .map(|_| CODE_CHARS[rng.random_range(0..CODE_CHARS.len())] as char)
        .collect()
}

/// Generate a code no existing room uses (collisions are near-impossible
/// with ~887M combinations, but check anyway)
fn unique_join_code(rooms: &HashMap<RoomId, Room>) -> String {
    loop {
        let code = generate_join_code();
        if !rooms
            .values()
            .any(|r| r.join_code.as_deref() == Some(code.as_str()))
        {
            return code;
        }
    }
}

impl AppState {
    /// Create a new room; private rooms get a unique join code
    pub async fn create_room(
        &self,
        name: &str,
        max_players: u32,
        game_mode: GameMode,
        difficulty: Difficulty,
        is_private: bool,
    ) -> GameResult<Room> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GameError::Validation(
                "room name cannot be empty".to_string(),
            ));
        }
        if max_players == 0 {
            return Err(GameError::Validation(
                "a room needs space for at least one player".to_string(),
            ));
        }

        let mut rooms = self.rooms.write().await;
        let join_code = is_private.then(|| unique_join_code(&rooms));

        let room = Room {
            id: ulid::Ulid::new().to_string(),
            name: name.to_string(),
            max_players,
            current_players: 0,
            status: RoomStatus::Waiting,
            game_mode,
            difficulty,
            join_code,
            created_at: chrono::Utc::now().to_rfc3339(),
        };

        rooms.insert(room.id.clone(), room.clone());
        drop(rooms);

        tracing::info!(room_id = %room.id, name = %room.name, "room created");
        self.broadcast_to_all(ServerMessage::RoomCreated { room: room.clone() });

        Ok(room)
    }

    /// Rooms currently accepting players, oldest first
    pub async fn list_joinable_rooms(&self) -> Vec<Room> {
        let rooms = self.rooms.read().await;
        let mut joinable: Vec<Room> = rooms.values().filter(|r| r.is_joinable()).cloned().collect();
        joinable.sort_by(|a, b| a.id.cmp(&b.id));
        joinable
    }

    pub async fn get_room(&self, room_id: &str) -> Option<Room> {
        self.rooms.read().await.get(room_id).cloned()
    }

    /// Join a room. The capacity check and the counter increment happen
    /// under one write lock, so concurrent joins can never overcommit.
    pub async fn join_room(&self, room_id: &str, username: &str) -> GameResult<(Room, Player)> {
        let username = username.trim();
        if username.is_empty() {
            return Err(GameError::Validation(
                "username cannot be empty".to_string(),
            ));
        }

        let room = {
            let mut rooms = self.rooms.write().await;
            let room = rooms
                .get_mut(room_id)
                .ok_or_else(|| GameError::NotFound("room".to_string()))?;

            if room.status != RoomStatus::Waiting {
                return Err(GameError::RoomNotJoinable);
            }
            if room.current_players >= room.max_players {
                return Err(GameError::RoomFull);
            }

            room.current_players += 1;
            room.clone()
        };

        let player = Player {
            id: ulid::Ulid::new().to_string(),
            username: username.to_string(),
            role: None,
            score: 0,
            is_online: true,
            is_ready: false,
            room_id: room.id.clone(),
            seat: self
                .next_seat
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst),
        };

        self.players
            .write()
            .await
            .insert(player.id.clone(), player.clone());

        tracing::info!(room_id = %room.id, player_id = %player.id, username = %player.username, "player joined");
        self.broadcast_to_all(ServerMessage::PlayerJoined {
            room_id: room.id.clone(),
            player: player.clone(),
        });

        Ok((room, player))
    }

    /// Case-insensitive join-code lookup against waiting rooms
    pub async fn join_room_by_code(
        &self,
        code: &str,
        username: &str,
    ) -> GameResult<(Room, Player)> {
        let code = code.trim();

        let room_id = {
            let rooms = self.rooms.read().await;
            rooms
                .values()
                .find(|r| {
                    r.status == RoomStatus::Waiting
                        && r.join_code
                            .as_deref()
                            .is_some_and(|c| c.eq_ignore_ascii_case(code))
                })
                .map(|r| r.id.clone())
                .ok_or(GameError::InvalidCode)?
        };

        self.join_room(&room_id, username).await
    }
}
