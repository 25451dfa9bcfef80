use serde::Serialize;

/// App-wide error type. Every fallible function returns `Result<T, AppError>`.
/// Serializes cleanly for Tauri IPC so the frontend gets structured error messages.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The inference service answered with a non-success HTTP status.
    #[error("API Error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The inference service could not be reached at all (DNS, refused
    /// connection, timeout, undecodable body). No HTTP status exists.
    #[error("Network error: {0}")]
    Transport(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// HTTP-status-like code carried by remote failures; transport-level
    /// failures report the reserved sentinel `0`.
    pub fn remote_status(&self) -> Option<u16> {
        match self {
            AppError::Api { status, .. } => Some(*status),
            AppError::Transport(_) => Some(0),
            _ => None,
        }
    }
}

/// Tauri requires `Serialize` on command return errors.
/// We serialize as `{ error: "...", kind: "..." }` for frontend consumption,
/// plus a `status` field on remote-call failures.
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("AppError", 3)?;
        s.serialize_field("error", &self.to_string())?;
        s.serialize_field(
            "kind",
            match self {
                AppError::Api { .. } => "api",
                AppError::Transport(_) => "transport",
                AppError::Database(_) => "database",
                AppError::Pool(_) => "pool",
                AppError::Serde(_) => "serde",
                AppError::Io(_) => "io",
                AppError::NotFound(_) => "not_found",
                AppError::Internal(_) => "internal",
            },
        )?;
        if let Some(status) = self.remote_status() {
            s.serialize_field("status", &status)?;
        } else {
            s.skip_field("status")?;
        }
        s.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_formats_like_the_frontend_toast() {
        let err = AppError::Api {
            status: 503,
            message: "HTTP 503: Service Unavailable".into(),
        };
        assert_eq!(
            err.to_string(),
            "API Error (503): HTTP 503: Service Unavailable"
        );
        assert_eq!(err.remote_status(), Some(503));
    }

    #[test]
    fn test_transport_error_uses_zero_sentinel_status() {
        let err = AppError::Transport("connection refused".into());
        assert_eq!(err.remote_status(), Some(0));

        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "transport");
        assert_eq!(json["status"], 0);
    }

    #[test]
    fn test_local_errors_carry_no_remote_status() {
        let err = AppError::NotFound("chat abc".into());
        assert_eq!(err.remote_status(), None);

        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "not_found");
        assert!(json.get("status").is_none());
    }
}
