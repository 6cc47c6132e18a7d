mod leaderboard;
mod player;
mod room;
mod session;
mod submit;

pub use leaderboard::Leaderboard;

use crate::grader::Grader;
use crate::protocol::ServerMessage;
use crate::store::Catalog;
use crate::types::*;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

/// Everything scoped to one room's live game: the session clock plus the
/// standings and per-player bookkeeping accumulated during it.
pub struct SessionContext {
    pub session: GameSession,
    pub leaderboard: Leaderboard,
    /// (player, target) pairs already scored, so points are awarded once
    pub completed: HashSet<(PlayerId, String)>,
    /// Hints taken per (player, target)
    pub hints_used: HashMap<(PlayerId, String), u8>,
    /// Set on teardown; a closed session rejects all further submissions
    pub closed: bool,
}

impl SessionContext {
    pub fn new(session: GameSession, roster: &[Player]) -> Self {
        let mut leaderboard = Leaderboard::new();
        for player in roster {
            leaderboard.register(player);
        }
        Self {
            session,
            leaderboard,
            completed: HashSet::new(),
            hints_used: HashMap::new(),
            closed: false,
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub rooms: Arc<RwLock<HashMap<RoomId, Room>>>,
    pub players: Arc<RwLock<HashMap<PlayerId, Player>>>,
    pub sessions: Arc<RwLock<HashMap<RoomId, SessionContext>>>,
    pub catalog: Arc<Catalog>,
    pub grader: Arc<Grader>,
    /// Seat numbers handed out to joining players, strictly increasing
    pub next_seat: Arc<AtomicU64>,
    /// Broadcast channel for pushing state changes to connected clients
    pub broadcast: broadcast::Sender<ServerMessage>,
}

impl AppState {
    pub fn new(grader: Grader, catalog: Catalog) -> Self {
        let (tx, _rx) = broadcast::channel(256);
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            players: Arc::new(RwLock::new(HashMap::new())),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            catalog: Arc::new(catalog),
            grader: Arc::new(grader),
            next_seat: Arc::new(AtomicU64::new(1)),
            broadcast: tx,
        }
    }

    /// State wired to the deterministic mock judge and stock content
    pub async fn with_mock_judge() -> Self {
        use crate::judge::MockJudge;
        use std::time::Duration;

        Self::new(
            Grader::new(Box::new(MockJudge), Duration::from_secs(5)),
            Catalog::with_stock_content().await,
        )
    }

    /// Subscribe to state-change notifications. Dropping the receiver is the
    /// unsubscribe; no handler outlives its connection.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerMessage> {
        self.broadcast.subscribe()
    }

    /// Send errors only mean nobody is listening, which is fine
    pub fn broadcast_to_all(&self, msg: ServerMessage) {
        let _ = self.broadcast.send(msg);
    }
}
