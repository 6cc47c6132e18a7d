use super::{AppState, SessionContext};
use crate::error::{GameError, GameResult};
use crate::protocol::ServerMessage;
use crate::types::*;

impl AppState {
    /// Start a room's game: waiting -> active.
    ///
    /// Roles are assigned exactly once here, alternating hacker/detective
    /// over the roster in join order, so every player holds one role for the
    /// whole session. The clock comes from the room's game mode.
    pub async fn start_game(&self, room_id: &str) -> GameResult<(GameSession, Vec<Player>)> {
        let room = {
            let mut rooms = self.rooms.write().await;
            let room = rooms
                .get_mut(room_id)
                .ok_or_else(|| GameError::NotFound("room".to_string()))?;

            match room.status {
                RoomStatus::Waiting | RoomStatus::Starting => {}
                from => {
                    return Err(GameError::InvalidTransition {
                        from,
                        action: "start the game",
                    })
                }
            }
            if room.current_players == 0 {
                return Err(GameError::Validation(
                    "cannot start a game with no players".to_string(),
                ));
            }

            room.status = RoomStatus::Active;
            room.clone()
        };

        let roster = {
            let mut players = self.players.write().await;
            let mut roster: Vec<&mut Player> = players
                .values_mut()
                .filter(|p| p.room_id == room.id)
                .collect();
            roster.sort_by_key(|p| p.seat);

            for (index, player) in roster.iter_mut().enumerate() {
                player.role = Some(if index % 2 == 0 {
                    Role::Hacker
                } else {
                    Role::Detective
                });
            }

            roster.into_iter().map(|p| p.clone()).collect::<Vec<Player>>()
        };

        let session = GameSession {
            room_id: room.id.clone(),
            status: RoomStatus::Active,
            time_remaining: room.game_mode.duration_secs(),
            current_round: 1,
            total_rounds: DEFAULT_TOTAL_ROUNDS,
            started_at: Some(chrono::Utc::now().to_rfc3339()),
        };

        self.sessions.write().await.insert(
            room.id.clone(),
            SessionContext::new(session.clone(), &roster),
        );

        tracing::info!(room_id = %room.id, mode = ?room.game_mode, "game started");
        self.broadcast_to_all(ServerMessage::GameStarted {
            session: session.clone(),
            players: roster.clone(),
        });

        Ok((session, roster))
    }

    pub async fn get_session(&self, room_id: &str) -> Option<GameSession> {
        self.sessions
            .read()
            .await
            .get(room_id)
            .map(|ctx| ctx.session.clone())
    }

    /// Advance a session's clock by exactly one second.
    ///
    /// Called once per second by the shared ticker. Anything but an active
    /// session is left untouched; there is never a catch-up jump. Returns
    /// the post-tick session, or None when no clock moved.
    pub async fn tick_session(&self, room_id: &str) -> Option<GameSession> {
        let (session, finished) = {
            let mut sessions = self.sessions.write().await;
            let ctx = sessions.get_mut(room_id)?;
            if ctx.closed || ctx.session.status != RoomStatus::Active {
                return None;
            }

            ctx.session.time_remaining = ctx.session.time_remaining.saturating_sub(1);
            let finished = ctx.session.time_remaining == 0;
            if finished {
                ctx.session.status = RoomStatus::Finished;
                ctx.closed = true;
            }
            (ctx.session.clone(), finished)
        };

        self.broadcast_to_all(ServerMessage::TimerUpdate {
            room_id: session.room_id.clone(),
            time_remaining: session.time_remaining,
        });

        if finished {
            tracing::info!(room_id = %session.room_id, "time expired, game over");
            self.finish_game(&session.room_id).await;
        }

        Some(session)
    }

    pub async fn pause_game(&self, room_id: &str) -> GameResult<GameSession> {
        let session = self
            .transition_session(room_id, RoomStatus::Active, RoomStatus::Paused, "pause the game")
            .await?;
        self.set_room_status(room_id, RoomStatus::Paused).await;
        self.broadcast_to_all(ServerMessage::GamePaused {
            session: session.clone(),
        });
        Ok(session)
    }

    pub async fn resume_game(&self, room_id: &str) -> GameResult<GameSession> {
        let session = self
            .transition_session(room_id, RoomStatus::Paused, RoomStatus::Active, "resume the game")
            .await?;
        self.set_room_status(room_id, RoomStatus::Active).await;
        self.broadcast_to_all(ServerMessage::GameResumed {
            session: session.clone(),
        });
        Ok(session)
    }

    /// Move to the next round; running past the last round ends the game
    pub async fn advance_round(&self, room_id: &str) -> GameResult<GameSession> {
        let (session, finished) = {
            let mut sessions = self.sessions.write().await;
            let ctx = sessions
                .get_mut(room_id)
                .ok_or_else(|| GameError::NotFound("session".to_string()))?;

            if ctx.session.status != RoomStatus::Active {
                return Err(GameError::InvalidTransition {
                    from: ctx.session.status,
                    action: "advance the round",
                });
            }

            ctx.session.current_round += 1;
            let finished = ctx.session.current_round > ctx.session.total_rounds;
            if finished {
                ctx.session.status = RoomStatus::Finished;
                ctx.closed = true;
            }
            (ctx.session.clone(), finished)
        };

        if finished {
            tracing::info!(room_id, "final round complete, game over");
            self.finish_game(room_id).await;
        } else {
            self.broadcast_to_all(ServerMessage::RoundAdvanced {
                session: session.clone(),
            });
        }

        Ok(session)
    }

    /// Shared pause/resume transition with the terminal-state check
    async fn transition_session(
        &self,
        room_id: &str,
        from: RoomStatus,
        to: RoomStatus,
        action: &'static str,
    ) -> GameResult<GameSession> {
        let mut sessions = self.sessions.write().await;
        let ctx = sessions
            .get_mut(room_id)
            .ok_or_else(|| GameError::NotFound("session".to_string()))?;

        if ctx.session.status != from {
            return Err(GameError::InvalidTransition {
                from: ctx.session.status,
                action,
            });
        }

        ctx.session.status = to;
        Ok(ctx.session.clone())
    }

    /// Stop a session's timer and reject everything after it. Safe to call
    /// for rooms that never started.
    pub async fn close_session(&self, room_id: &str) {
        let mut sessions = self.sessions.write().await;
        if let Some(ctx) = sessions.get_mut(room_id) {
            ctx.closed = true;
            ctx.session.status = RoomStatus::Finished;
            tracing::info!(room_id, "session closed");
        }
    }

    /// Finish bookkeeping once a session has been marked Finished: room
    /// status, win/loss profiles, and the final broadcast.
    async fn finish_game(&self, room_id: &str) {
        let (session, standings, top_score) = {
            let sessions = self.sessions.read().await;
            match sessions.get(room_id) {
                Some(ctx) => (
                    ctx.session.clone(),
                    ctx.leaderboard.snapshot(),
                    ctx.leaderboard.top_score(),
                ),
                None => return,
            }
        };

        self.set_room_status(room_id, RoomStatus::Finished).await;
        self.record_outcomes(&standings, top_score).await;

        self.broadcast_to_all(ServerMessage::GameEnded {
            session,
            leaderboard: standings,
        });
    }

    /// Update win/loss profiles from the final standings. Winners are the
    /// players sharing the top score, provided anyone scored at all.
    async fn record_outcomes(&self, standings: &[LeaderboardEntry], top_score: u32) {
        for entry in standings {
            let won = top_score > 0 && entry.score == top_score;

            let existing = self
                .catalog
                .profiles
                .fetch_all()
                .await
                .into_iter()
                .find(|p| p.username == entry.username);

            match existing {
                Some(mut profile) => {
                    profile.games_played += 1;
                    if won {
                        profile.total_wins += 1;
                    } else {
                        profile.total_losses += 1;
                    }
                    if let Err(e) = self.catalog.profiles.update(profile).await {
                        tracing::error!("failed to update profile: {e}");
                    }
                }
                None => {
                    self.catalog
                        .profiles
                        .create(PlayerProfile {
                            id: ulid::Ulid::new().to_string(),
                            username: entry.username.clone(),
                            total_wins: if won { 1 } else { 0 },
                            total_losses: if won { 0 } else { 1 },
                            games_played: 1,
                        })
                        .await;
                }
            }
        }
    }

    async fn set_room_status(&self, room_id: &str, status: RoomStatus) {
        let mut rooms = self.rooms.write().await;
        if let Some(room) = rooms.get_mut(room_id) {
            room.status = status;
        }
    }
}
