use nav_core::NavError;
use nav_route::RouteError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session configuration error: {0}")]
    Config(#[from] NavError),

    #[error("initial plan rejected: {0}")]
    Plan(#[from] RouteError),

    #[error("session has ended")]
    Closed,
}

pub type SessionResult<T> = Result<T, SessionError>;
