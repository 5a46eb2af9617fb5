use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session is not authenticated; {operation} requires login")]
    NotAuthenticated { operation: &'static str },
}

impl SessionError {
    #[must_use]
    pub fn not_authenticated(operation: &'static str) -> Self {
        Self::NotAuthenticated { operation }
    }
}
