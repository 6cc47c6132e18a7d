use crate::types::RoomStatus;

pub type GameResult<T> = Result<T, GameError>;

/// Errors surfaced to callers of the game core.
///
/// Every variant renders a message suitable for direct display and exposes a
/// stable machine-checkable code via [`GameError::code`]. Grading failures
/// (compile errors, wrong output) are not in this taxonomy on purpose: they
/// are expected outcomes and travel inside `SubmissionResult`.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("that room is already full")]
    RoomFull,

    #[error("that room is no longer accepting players")]
    RoomNotJoinable,

    #[error("no open room matches that join code")]
    InvalidCode,

    #[error("cannot {action} while the game is {from:?}")]
    InvalidTransition {
        from: RoomStatus,
        action: &'static str,
    },

    #[error("this game session has ended")]
    SessionClosed,
}

impl GameError {
    /// Stable code for programmatic handling, used in `ServerMessage::Error`
    pub fn code(&self) -> &'static str {
        match self {
            GameError::Validation(_) => "VALIDATION",
            GameError::NotFound(_) => "NOT_FOUND",
            GameError::RoomFull => "ROOM_FULL",
            GameError::RoomNotJoinable => "ROOM_NOT_JOINABLE",
            GameError::InvalidCode => "INVALID_CODE",
            GameError::InvalidTransition { .. } => "INVALID_TRANSITION",
            GameError::SessionClosed => "SESSION_CLOSED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(GameError::RoomFull.code(), "ROOM_FULL");
        assert_eq!(
            GameError::Validation("room name cannot be empty".to_string()).code(),
            "VALIDATION"
        );
        assert_eq!(
            GameError::InvalidTransition {
                from: RoomStatus::Finished,
                action: "pause the game",
            }
            .code(),
            "INVALID_TRANSITION"
        );
    }

    #[test]
    fn test_messages_are_displayable() {
        let err = GameError::InvalidTransition {
            from: RoomStatus::Finished,
            action: "resume the game",
        };
        assert_eq!(
            err.to_string(),
            "cannot resume the game while the game is Finished"
        );
        assert_eq!(
            GameError::NotFound("room".to_string()).to_string(),
            "room not found"
        );
    }
}
