use super::AppState;
use crate::error::{GameError, GameResult};
use crate::grader::{AnswerSubmission, CodeSubmission};
use crate::protocol::ServerMessage;
use crate::types::*;

impl AppState {
    /// Grade a hacker's code submission and apply the score on success.
    ///
    /// The session is checked before grading and again when the points land,
    /// so a submission racing the end of the game is rejected rather than
    /// silently dropped.
    pub async fn submit_code(
        &self,
        player_id: &str,
        task_id: &str,
        code: String,
        language: String,
    ) -> GameResult<SubmissionResult> {
        let player = self
            .get_player(player_id)
            .await
            .ok_or_else(|| GameError::NotFound("player".to_string()))?;
        self.ensure_session_open(&player.room_id).await?;

        let task = self
            .catalog
            .tasks
            .fetch_by_id(task_id)
            .await
            .ok_or_else(|| GameError::NotFound("task".to_string()))?;

        let submission = CodeSubmission {
            id: ulid::Ulid::new().to_string(),
            player_id: player.id.clone(),
            code,
            language,
        };

        let result = self.grader.grade_code(&submission, &task).await?;
        tracing::info!(
            player_id = %player.id,
            task_id = %task.id,
            success = result.success,
            score = result.score,
            degraded = result.degraded,
            "code submission graded"
        );

        if result.success {
            self.award_points(&player, &task.id, task.points()).await?;
        }

        Ok(result)
    }

    /// Grade a detective's puzzle answer and apply the score on success
    pub async fn submit_puzzle_answer(
        &self,
        player_id: &str,
        puzzle_id: &str,
        answer: String,
    ) -> GameResult<SubmissionResult> {
        let player = self
            .get_player(player_id)
            .await
            .ok_or_else(|| GameError::NotFound("player".to_string()))?;
        self.ensure_session_open(&player.room_id).await?;

        let puzzle = self
            .catalog
            .puzzles
            .fetch_by_id(puzzle_id)
            .await
            .ok_or_else(|| GameError::NotFound("puzzle".to_string()))?;

        let submission = AnswerSubmission {
            id: ulid::Ulid::new().to_string(),
            player_id: player.id.clone(),
            answer,
        };

        let result = self.grader.grade_answer(&submission, &puzzle)?;
        tracing::info!(
            player_id = %player.id,
            puzzle_id = %puzzle.id,
            success = result.success,
            "puzzle answer graded"
        );

        if result.success {
            self.award_points(&player, &puzzle.id, puzzle.points()).await?;
        }

        Ok(result)
    }

    /// Hand out the next hint for a task or puzzle, at most two per target
    pub async fn take_hint(&self, player_id: &str, target_id: &str) -> GameResult<(String, u8)> {
        let player = self
            .get_player(player_id)
            .await
            .ok_or_else(|| GameError::NotFound("player".to_string()))?;
        self.ensure_session_open(&player.room_id).await?;

        let hints = match self.catalog.tasks.fetch_by_id(target_id).await {
            Some(task) => task.hints,
            None => self
                .catalog
                .puzzles
                .fetch_by_id(target_id)
                .await
                .ok_or_else(|| GameError::NotFound("task or puzzle".to_string()))?
                .hints,
        };

        let mut sessions = self.sessions.write().await;
        let ctx = sessions
            .get_mut(&player.room_id)
            .ok_or_else(|| GameError::NotFound("session".to_string()))?;

        let used = ctx
            .hints_used
            .entry((player.id.clone(), target_id.to_string()))
            .or_insert(0);

        if *used >= MAX_HINTS {
            return Err(GameError::Validation(
                "no hints left for this challenge".to_string(),
            ));
        }
        let Some(hint) = hints.get(*used as usize) else {
            return Err(GameError::Validation(
                "there are no more hints for this challenge".to_string(),
            ));
        };

        *used += 1;
        Ok((hint.clone(), *used))
    }

    /// Everything this player has solved, oldest first
    pub async fn player_history(&self, player_id: &str) -> Vec<GameRecord> {
        self.catalog
            .records
            .fetch_all()
            .await
            .into_iter()
            .filter(|r| r.player_id == player_id)
            .collect()
    }

    /// Current standings for a room's session
    pub async fn leaderboard(&self, room_id: &str) -> GameResult<Vec<LeaderboardEntry>> {
        let sessions = self.sessions.read().await;
        let ctx = sessions
            .get(room_id)
            .ok_or_else(|| GameError::NotFound("session".to_string()))?;
        Ok(ctx.leaderboard.snapshot())
    }

    /// Submissions are only accepted into a live, running session
    async fn ensure_session_open(&self, room_id: &str) -> GameResult<()> {
        let sessions = self.sessions.read().await;
        let ctx = sessions
            .get(room_id)
            .ok_or_else(|| GameError::NotFound("session".to_string()))?;

        if ctx.closed || ctx.session.status == RoomStatus::Finished {
            return Err(GameError::SessionClosed);
        }
        if ctx.session.status != RoomStatus::Active {
            return Err(GameError::InvalidTransition {
                from: ctx.session.status,
                action: "submit",
            });
        }
        Ok(())
    }

    /// Apply a score delta exactly once per (player, target) pair and push
    /// the updated standings out.
    async fn award_points(&self, player: &Player, target_id: &str, points: u32) -> GameResult<()> {
        let awarded = {
            let mut sessions = self.sessions.write().await;
            let ctx = sessions
                .get_mut(&player.room_id)
                .ok_or_else(|| GameError::NotFound("session".to_string()))?;

            if ctx.closed {
                return Err(GameError::SessionClosed);
            }

            let key = (player.id.clone(), target_id.to_string());
            if !ctx.completed.insert(key) {
                // Already solved this target; nothing more to score
                None
            } else {
                ctx.leaderboard.update(player, points, true);
                Some((ctx.leaderboard.snapshot(), ctx.session.clone()))
            }
        };

        let Some((standings, session)) = awarded else {
            return Ok(());
        };

        let new_score = {
            let mut players = self.players.write().await;
            match players.get_mut(&player.id) {
                Some(p) => {
                    p.score += points;
                    p.score
                }
                None => player.score + points,
            }
        };

        self.broadcast_to_all(ServerMessage::ScoreUpdate {
            room_id: player.room_id.clone(),
            player_id: player.id.clone(),
            score: new_score,
        });
        self.broadcast_to_all(ServerMessage::LeaderboardUpdate {
            room_id: player.room_id.clone(),
            entries: standings,
        });

        let duration_seconds = self
            .session_duration(&player.room_id, session.time_remaining)
            .await;

        self.catalog
            .records
            .create(GameRecord {
                id: ulid::Ulid::new().to_string(),
                session_id: player.room_id.clone(),
                player_id: player.id.clone(),
                started_at: session.started_at.clone(),
                ended_at: chrono::Utc::now().to_rfc3339(),
                duration_seconds,
                player_score: points,
                outcome: "solved".to_string(),
                target_id: target_id.to_string(),
            })
            .await;

        Ok(())
    }

    /// Seconds the session has been running, from the mode's full duration
    async fn session_duration(&self, room_id: &str, time_remaining: u32) -> u32 {
        match self.get_room(room_id).await {
            Some(room) => room.game_mode.duration_secs().saturating_sub(time_remaining),
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn started_game(state: &AppState) -> (RoomId, Vec<Player>) {
        let room = state
            .create_room("Arena", 4, GameMode::Blitz, Difficulty::Easy, false)
            .await
            .unwrap();
        state.join_room(&room.id, "alice").await.unwrap();
        state.join_room(&room.id, "bob").await.unwrap();
        let (_, players) = state.start_game(&room.id).await.unwrap();
        (room.id, players)
    }

    /// Code the mock judge can "solve" against the stock two-sum task
    fn two_sum_solution() -> String {
        [
            "map:nums = [2,7,11,15], target = 9=>[0,1]",
            "map:nums = [3,2,4], target = 6=>[1,2]",
            "map:nums = [3,3], target = 6=>[0,1]",
        ]
        .join("\n")
    }

    #[tokio::test]
    async fn test_submit_before_start_is_rejected() {
        let state = AppState::with_mock_judge().await;
        let room = state
            .create_room("Arena", 4, GameMode::Blitz, Difficulty::Easy, false)
            .await
            .unwrap();
        let (_, player) = state.join_room(&room.id, "alice").await.unwrap();

        let err = state
            .submit_code(&player.id, "two-sum", two_sum_solution(), "python".to_string())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_successful_submission_awards_points_once() {
        let state = AppState::with_mock_judge().await;
        let (room_id, players) = started_game(&state).await;
        let alice = &players[0];

        let result = state
            .submit_code(&alice.id, "two-sum", two_sum_solution(), "python".to_string())
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.score, 100);

        let standings = state.leaderboard(&room_id).await.unwrap();
        let entry = standings.iter().find(|e| e.player_id == alice.id).unwrap();
        assert_eq!(entry.score, 50); // two-sum is easy
        assert_eq!(entry.tasks_completed, 1);

        // Solving the same task again grades fine but scores nothing
        let result = state
            .submit_code(&alice.id, "two-sum", two_sum_solution(), "python".to_string())
            .await
            .unwrap();
        assert!(result.success);

        let standings = state.leaderboard(&room_id).await.unwrap();
        let entry = standings.iter().find(|e| e.player_id == alice.id).unwrap();
        assert_eq!(entry.score, 50);
        assert_eq!(entry.tasks_completed, 1);
    }

    #[tokio::test]
    async fn test_failed_submission_scores_nothing() {
        let state = AppState::with_mock_judge().await;
        let (room_id, players) = started_game(&state).await;
        let alice = &players[0];

        let result = state
            .submit_code(
                &alice.id,
                "two-sum",
                "def solution(): pass".to_string(),
                "python".to_string(),
            )
            .await
            .unwrap();
        assert!(!result.success);

        let standings = state.leaderboard(&room_id).await.unwrap();
        let entry = standings.iter().find(|e| e.player_id == alice.id).unwrap();
        assert_eq!(entry.score, 0);
        assert_eq!(entry.tasks_completed, 0);
    }

    #[tokio::test]
    async fn test_puzzle_answer_awards_puzzle_points() {
        let state = AppState::with_mock_judge().await;
        let (room_id, players) = started_game(&state).await;
        let bob = &players[1];

        let result = state
            .submit_puzzle_answer(&bob.id, "the-breach", "SQL Injection".to_string())
            .await
            .unwrap();
        assert!(result.success);

        let standings = state.leaderboard(&room_id).await.unwrap();
        let entry = standings.iter().find(|e| e.player_id == bob.id).unwrap();
        assert_eq!(entry.score, 100); // the-breach is medium
    }

    #[tokio::test]
    async fn test_submission_after_finish_is_session_closed() {
        let state = AppState::with_mock_judge().await;
        let (room_id, players) = started_game(&state).await;
        let alice = &players[0];

        {
            let mut sessions = state.sessions.write().await;
            sessions.get_mut(&room_id).unwrap().session.time_remaining = 1;
        }
        state.tick_session(&room_id).await;

        let err = state
            .submit_code(&alice.id, "two-sum", two_sum_solution(), "python".to_string())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "SESSION_CLOSED");
    }

    #[tokio::test]
    async fn test_submission_while_paused_is_rejected() {
        let state = AppState::with_mock_judge().await;
        let (room_id, players) = started_game(&state).await;
        state.pause_game(&room_id).await.unwrap();

        let err = state
            .submit_code(
                &players[0].id,
                "two-sum",
                two_sum_solution(),
                "python".to_string(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_TRANSITION");
    }

    #[tokio::test]
    async fn test_hint_limit() {
        let state = AppState::with_mock_judge().await;
        let (_room_id, players) = started_game(&state).await;
        let alice = &players[0];

        let (first, used) = state.take_hint(&alice.id, "two-sum").await.unwrap();
        assert_eq!(used, 1);
        let (second, used) = state.take_hint(&alice.id, "two-sum").await.unwrap();
        assert_eq!(used, 2);
        assert_ne!(first, second);

        let err = state.take_hint(&alice.id, "two-sum").await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION");
    }

    #[tokio::test]
    async fn test_hints_run_out_when_target_has_fewer() {
        let state = AppState::with_mock_judge().await;
        let (_room_id, players) = started_game(&state).await;
        let alice = &players[0];

        // binary-search ships a single hint
        state.take_hint(&alice.id, "binary-search").await.unwrap();
        let err = state
            .take_hint(&alice.id, "binary-search")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION");
    }

    #[tokio::test]
    async fn test_history_collects_solved_targets() {
        let state = AppState::with_mock_judge().await;
        let (_room_id, players) = started_game(&state).await;
        let alice = &players[0];
        let bob = &players[1];

        state
            .submit_code(&alice.id, "two-sum", two_sum_solution(), "python".to_string())
            .await
            .unwrap();
        state
            .submit_puzzle_answer(&bob.id, "the-breach", "sql injection".to_string())
            .await
            .unwrap();

        let history = state.player_history(&alice.id).await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].target_id, "two-sum");
        assert_eq!(history[0].player_score, 50);
        assert_eq!(history[0].outcome, "solved");

        assert_eq!(state.player_history(&bob.id).await.len(), 1);
    }
}
