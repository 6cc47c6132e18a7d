use serde::{Deserialize, Serialize};

/// Opaque ID types for type safety
pub type RoomId = String;
pub type PlayerId = String;
pub type TaskId = String;
pub type PuzzleId = String;
pub type SubmissionId = String;
pub type RecordId = String;

/// Rounds per session
pub const DEFAULT_TOTAL_ROUNDS: u32 = 3;

/// Hard ceiling on submitted code size
pub const MAX_CODE_CHARS: usize = 50_000;

/// Hints a player may take per task or puzzle
pub const MAX_HINTS: u8 = 2;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomStatus {
    Waiting,
    Starting,
    Active,
    Paused,
    Finished,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    Classic,
    Blitz,
    Tournament,
}

impl GameMode {
    /// Session length in seconds
    pub fn duration_secs(&self) -> u32 {
        match self {
            GameMode::Classic => 2700,
            GameMode::Blitz => 900,
            GameMode::Tournament => 3600,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn base_points(&self) -> u32 {
        match self {
            Difficulty::Easy => 50,
            Difficulty::Medium => 100,
            Difficulty::Hard => 150,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Hacker,
    Detective,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub username: String,
    /// None until roles are assigned at game start
    pub role: Option<Role>,
    pub score: u32,
    pub is_online: bool,
    pub is_ready: bool,
    pub room_id: RoomId,
    /// Monotonic join counter; rosters and role assignment order by it
    pub seat: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub max_players: u32,
    pub current_players: u32,
    pub status: RoomStatus,
    pub game_mode: GameMode,
    pub difficulty: Difficulty,
    /// Present iff the room is private; compared case-insensitively on join
    pub join_code: Option<String>,
    pub created_at: String,
}

impl Room {
    /// Rooms accept joins only while waiting and below capacity
    pub fn is_joinable(&self) -> bool {
        self.status == RoomStatus::Waiting && self.current_players < self.max_players
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestCase {
    pub input: String,
    pub expected_output: String,
}

/// A coding challenge for the hacker role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub prompt: String,
    pub boilerplate: Option<String>,
    pub difficulty: Difficulty,
    /// Leveled tasks score level * 20 instead of the difficulty table
    pub level: Option<u8>,
    pub hints: Vec<String>,
    pub test_cases: Vec<TestCase>,
    pub allowed_languages: Vec<String>,
}

impl Task {
    pub fn points(&self) -> u32 {
        match self.level {
            Some(level) => level as u32 * 20,
            None => self.difficulty.base_points(),
        }
    }
}

/// A logic puzzle for the detective role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Puzzle {
    pub id: PuzzleId,
    pub title: String,
    pub question: String,
    pub correct_answer: String,
    pub difficulty: Difficulty,
    pub hints: Vec<String>,
}

impl Puzzle {
    pub fn points(&self) -> u32 {
        self.difficulty.base_points()
    }
}

/// Live clock and round counters for one room's game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSession {
    pub room_id: RoomId,
    pub status: RoomStatus,
    /// Seconds left; decremented by exactly one per tick while active
    pub time_remaining: u32,
    pub current_round: u32,
    pub total_rounds: u32,
    pub started_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestCaseResult {
    pub passed: bool,
    pub input: String,
    pub expected_output: String,
    pub actual_output: String,
    pub execution_time_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub submission_id: SubmissionId,
    pub player_id: PlayerId,
    pub success: bool,
    /// 0..=100, percentage of passing test cases
    pub score: u32,
    pub message: String,
    pub output: Option<String>,
    pub compilation_error: Option<String>,
    pub runtime_error: Option<String>,
    /// True when the fallback grading path was used because the judge was down
    #[serde(default)]
    pub degraded: bool,
    pub test_results: Vec<TestCaseResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeaderboardEntry {
    pub player_id: PlayerId,
    pub username: String,
    pub role: Option<Role>,
    pub score: u32,
    pub tasks_completed: u32,
}

/// One solved task or puzzle, appended to the record store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRecord {
    pub id: RecordId,
    pub session_id: RoomId,
    pub player_id: PlayerId,
    pub started_at: Option<String>,
    pub ended_at: String,
    pub duration_seconds: u32,
    pub player_score: u32,
    pub outcome: String,
    pub target_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub id: RecordId,
    pub username: String,
    pub total_wins: u32,
    pub total_losses: u32,
    pub games_played: u32,
}

impl PlayerProfile {
    pub fn win_rate(&self) -> f64 {
        if self.games_played == 0 {
            0.0
        } else {
            self.total_wins as f64 / self.games_played as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_durations() {
        assert_eq!(GameMode::Classic.duration_secs(), 2700);
        assert_eq!(GameMode::Blitz.duration_secs(), 900);
        assert_eq!(GameMode::Tournament.duration_secs(), 3600);
    }

    #[test]
    fn test_task_points_prefer_level() {
        let mut task = Task {
            id: "t1".to_string(),
            title: "Two Sum".to_string(),
            prompt: String::new(),
            boilerplate: None,
            difficulty: Difficulty::Hard,
            level: Some(3),
            hints: Vec::new(),
            test_cases: Vec::new(),
            allowed_languages: Vec::new(),
        };
        assert_eq!(task.points(), 60);

        task.level = None;
        assert_eq!(task.points(), 150);
    }

    #[test]
    fn test_puzzle_points_by_difficulty() {
        let puzzle = Puzzle {
            id: "p1".to_string(),
            title: "The Breach".to_string(),
            question: String::new(),
            correct_answer: "sql injection".to_string(),
            difficulty: Difficulty::Easy,
            hints: Vec::new(),
        };
        assert_eq!(puzzle.points(), 50);
    }

    #[test]
    fn test_win_rate_handles_no_games() {
        let profile = PlayerProfile {
            id: "pr1".to_string(),
            username: "neo".to_string(),
            total_wins: 0,
            total_losses: 0,
            games_played: 0,
        };
        assert_eq!(profile.win_rate(), 0.0);
    }
}
