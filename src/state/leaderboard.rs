use crate::types::*;

/// Cumulative standings for one game session.
///
/// Entries keep registration order, and `snapshot` sorts a copy with a
/// stable sort, so equal scores rank in the order players first appeared.
#[derive(Debug, Clone, Default)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add a player with a zero score if not already present
    pub fn register(&mut self, player: &Player) {
        if !self.entries.iter().any(|e| e.player_id == player.id) {
            self.entries.push(LeaderboardEntry {
                player_id: player.id.clone(),
                username: player.username.clone(),
                role: player.role,
                score: 0,
                tasks_completed: 0,
            });
        }
    }

    /// Apply a score delta atomically; registers the player on first sight
    pub fn update(&mut self, player: &Player, delta: u32, completed_target: bool) {
        self.register(player);
        if let Some(entry) = self.entries.iter_mut().find(|e| e.player_id == player.id) {
            entry.score += delta;
            entry.role = player.role;
            if completed_target {
                entry.tasks_completed += 1;
            }
        }
    }

    /// Ranked standings, best first. Pure: repeated calls with no update in
    /// between return identical output.
    pub fn snapshot(&self) -> Vec<LeaderboardEntry> {
        let mut ranked = self.entries.clone();
        ranked.sort_by(|a, b| b.score.cmp(&a.score));
        ranked
    }

    /// Highest score currently on the board
    pub fn top_score(&self) -> u32 {
        self.entries.iter().map(|e| e.score).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: &str, username: &str) -> Player {
        Player {
            id: id.to_string(),
            username: username.to_string(),
            role: Some(Role::Hacker),
            score: 0,
            is_online: true,
            is_ready: true,
            room_id: "r1".to_string(),
            seat: 1,
        }
    }

    #[test]
    fn test_snapshot_is_idempotent() {
        let mut board = Leaderboard::new();
        board.update(&player("a", "alice"), 100, true);
        board.update(&player("b", "bob"), 150, true);
        board.update(&player("c", "carol"), 100, true);

        let first = board.snapshot();
        let second = board.snapshot();
        assert_eq!(first, second);
    }

    #[test]
    fn test_descending_order_with_stable_ties() {
        let mut board = Leaderboard::new();
        board.update(&player("a", "alice"), 100, true);
        board.update(&player("b", "bob"), 150, true);
        board.update(&player("c", "carol"), 100, true);

        let ranked = board.snapshot();
        let ids: Vec<&str> = ranked.iter().map(|e| e.player_id.as_str()).collect();
        // bob leads; alice beats carol on the tie because she scored first
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_updates_accumulate() {
        let mut board = Leaderboard::new();
        let p = player("a", "alice");
        board.update(&p, 50, true);
        board.update(&p, 100, true);
        board.update(&p, 0, false);

        let ranked = board.snapshot();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].score, 150);
        assert_eq!(ranked[0].tasks_completed, 2);
    }

    #[test]
    fn test_register_keeps_zero_score_players_visible() {
        let mut board = Leaderboard::new();
        board.register(&player("a", "alice"));
        board.register(&player("a", "alice"));

        let ranked = board.snapshot();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].score, 0);
    }

    #[test]
    fn test_top_score() {
        let mut board = Leaderboard::new();
        assert_eq!(board.top_score(), 0);
        board.update(&player("a", "alice"), 120, true);
        assert_eq!(board.top_score(), 120);
    }
}
