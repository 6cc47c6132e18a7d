use super::AppState;
use crate::error::{GameError, GameResult};
use crate::protocol::ServerMessage;
use crate::types::*;

impl AppState {
    pub async fn get_player(&self, player_id: &str) -> Option<Player> {
        self.players.read().await.get(player_id).cloned()
    }

    /// Room roster in join order
    pub async fn room_players(&self, room_id: &str) -> Vec<Player> {
        let players = self.players.read().await;
        let mut roster: Vec<Player> = players
            .values()
            .filter(|p| p.room_id == room_id)
            .cloned()
            .collect();
        roster.sort_by_key(|p| p.seat);
        roster
    }

    pub async fn set_ready(&self, player_id: &str, is_ready: bool) -> GameResult<Player> {
        let player = {
            let mut players = self.players.write().await;
            let player = players
                .get_mut(player_id)
                .ok_or_else(|| GameError::NotFound("player".to_string()))?;
            player.is_ready = is_ready;
            player.clone()
        };

        self.broadcast_to_all(ServerMessage::PlayerReady {
            room_id: player.room_id.clone(),
            player_id: player.id.clone(),
            is_ready,
        });

        Ok(player)
    }

    /// Presence flag for a connected/disconnected client
    pub async fn mark_player_online(&self, player_id: &str, is_online: bool) {
        let player = {
            let mut players = self.players.write().await;
            match players.get_mut(player_id) {
                Some(player) => {
                    player.is_online = is_online;
                    player.clone()
                }
                // Already removed (left the room); nothing to report
                None => return,
            }
        };

        self.broadcast_to_all(ServerMessage::PlayerPresence {
            room_id: player.room_id,
            player_id: player.id,
            is_online,
        });
    }

    /// Remove a player from their room. When the last player leaves, the
    /// room's session is torn down and its timer stops.
    pub async fn leave_room(&self, player_id: &str) -> GameResult<Player> {
        let player = {
            let mut players = self.players.write().await;
            players
                .remove(player_id)
                .ok_or_else(|| GameError::NotFound("player".to_string()))?
        };

        let room_emptied = {
            let mut rooms = self.rooms.write().await;
            match rooms.get_mut(&player.room_id) {
                Some(room) => {
                    room.current_players = room.current_players.saturating_sub(1);
                    let emptied = room.current_players == 0;
                    if emptied && room.status != RoomStatus::Waiting {
                        room.status = RoomStatus::Finished;
                    }
                    emptied
                }
                None => false,
            }
        };

        tracing::info!(room_id = %player.room_id, player_id = %player.id, "player left");
        self.broadcast_to_all(ServerMessage::PlayerLeft {
            room_id: player.room_id.clone(),
            player_id: player.id.clone(),
        });

        if room_emptied {
            self.close_session(&player.room_id).await;
        }

        Ok(player)
    }
}
