use thiserror::Error;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Insufficient funds: {required} gold required, {available} available")]
    InsufficientFunds { required: u64, available: u64 },

    #[error("Insufficient quantity: {requested} requested, {owned} owned")]
    InsufficientQuantity { requested: u32, owned: u32 },

    #[error("Insufficient stat points: {requested} requested, {available} available")]
    InsufficientResource { requested: u32, available: u32 },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl GameError {
    /// Rule violations the caller is expected to report back to the player.
    /// Everything else is a collaborator fault.
    pub fn is_business(&self) -> bool {
        matches!(
            self,
            GameError::NotFound(_)
                | GameError::InsufficientFunds { .. }
                | GameError::InsufficientQuantity { .. }
                | GameError::InsufficientResource { .. }
                | GameError::InvalidOperation(_)
                | GameError::DuplicateEntry(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, GameError>;
