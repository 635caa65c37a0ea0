//! Error types for move legality.

use thiserror::Error;

/// Reason a move was rejected. Rejections never mutate the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum IllegalMove {
    #[error("illegal move: point is occupied")]
    OccupiedPoint,

    #[error("illegal move: suicide")]
    Suicide,

    #[error("illegal move: retakes ko")]
    KoViolation,

    #[error("illegal move: repeats an earlier position (superko)")]
    SuperkoRepetition,

    #[error("illegal move: point is off the board")]
    OutOfBoard,

    #[error("illegal move: game record or string table is full")]
    CapacityExceeded,
}

/// Result type for move application.
pub type Result<T> = std::result::Result<T, IllegalMove>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_illegal_move_display() {
        assert!(IllegalMove::OccupiedPoint.to_string().contains("occupied"));
        assert!(IllegalMove::Suicide.to_string().contains("suicide"));
        assert!(IllegalMove::KoViolation.to_string().contains("ko"));
        assert!(IllegalMove::SuperkoRepetition.to_string().contains("superko"));
        assert!(IllegalMove::OutOfBoard.to_string().contains("off the board"));
        assert!(IllegalMove::CapacityExceeded.to_string().contains("full"));
    }
}
