use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TradeError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Invalid symbol")]
    InvalidSymbol,

    #[error("Cash is not enough")]
    InsufficientFunds,

    #[error("not enough shares")]
    InsufficientShares,

    #[error("An error occurred: {0}")]
    Storage(#[from] sqlx::Error),
}

impl TradeError {
    pub fn invalid(msg: &str) -> Self {
        TradeError::InvalidInput(msg.to_string())
    }

    /// Status used by `/buy`.
    pub fn buy_status(&self) -> StatusCode {
        match self {
            TradeError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Status used by `/sell`.
    pub fn sell_status(&self) -> StatusCode {
        match self {
            TradeError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::FORBIDDEN,
        }
    }

    /// Status used by `/trade`.
    pub fn trade_status(&self) -> StatusCode {
        match self {
            TradeError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            TradeError::InsufficientFunds => StatusCode::BAD_REQUEST,
            _ => StatusCode::FORBIDDEN,
        }
    }
}

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("must provide username")]
    MissingUsername,
    #[error("must provide password")]
    MissingPassword,
    #[error("must confirm your password")]
    MissingConfirmation,
    #[error("password and confirmation are not the same")]
    Mismatch,
    #[error("password should be at least 8 characters")]
    TooShort,
    #[error("password should contain at least 1 number")]
    NoDigit,
    #[error("password should contain at least 1 special character")]
    NoSpecialChar,
    #[error("username already exists")]
    UsernameTaken,
    #[error("failed to hash password")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("An error occurred: {0}")]
    Storage(#[from] sqlx::Error),
}

impl RegisterError {
    pub fn status(&self) -> StatusCode {
        match self {
            RegisterError::NoDigit | RegisterError::NoSpecialChar => StatusCode::FORBIDDEN,
            RegisterError::Hash(_) | RegisterError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("must provide username")]
    MissingUsername,
    #[error("must provide password")]
    MissingPassword,
    #[error("invalid username and/or password")]
    InvalidCredentials,
    #[error("An error occurred: {0}")]
    Storage(#[from] sqlx::Error),
}

impl LoginError {
    pub fn status(&self) -> StatusCode {
        match self {
            LoginError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::FORBIDDEN,
        }
    }
}
