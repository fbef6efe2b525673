//! Error types shared across Photobooth crates.

/// Top-level error type for Photobooth operations.
///
/// Every variant is terminal for the action that produced it: the caller
/// reports it to the user and the user re-initiates the action.
#[derive(Debug, thiserror::Error)]
pub enum PhotoboothError {
    #[error("Camera API unsupported: {message}")]
    Unsupported { message: String },

    #[error("Insecure context: {message}")]
    InsecureContext { message: String },

    #[error("Camera unavailable: {message}")]
    CameraUnavailable { message: String },

    #[error("Playback error: {message}")]
    Playback { message: String },

    #[error("Capture error: {message}")]
    Capture { message: String },

    #[error("Export error: {message}")]
    Export { message: String },

    #[error("Invalid state: {message}")]
    InvalidState { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using PhotoboothError.
pub type PhotoboothResult<T> = Result<T, PhotoboothError>;

impl PhotoboothError {
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }

    pub fn insecure_context(msg: impl Into<String>) -> Self {
        Self::InsecureContext {
            message: msg.into(),
        }
    }

    pub fn camera_unavailable(msg: impl Into<String>) -> Self {
        Self::CameraUnavailable {
            message: msg.into(),
        }
    }

    pub fn playback(msg: impl Into<String>) -> Self {
        Self::Playback {
            message: msg.into(),
        }
    }

    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture {
            message: msg.into(),
        }
    }

    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export {
            message: msg.into(),
        }
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Text suitable for showing to the end user.
    ///
    /// Diagnostic detail stays in the logs; this is the short guidance the
    /// person in front of the camera needs to act on.
    pub fn user_message(&self) -> String {
        match self {
            Self::Unsupported { .. } => "Your browser doesn't support camera access. \
                 Please try a different browser like Chrome or Firefox."
                .to_string(),
            Self::InsecureContext { .. } => "Camera access requires a secure (HTTPS) connection \
                 on this browser. Please use a secure connection or try Chrome/Firefox on desktop."
                .to_string(),
            Self::CameraUnavailable { .. } => "Could not access your camera. Please make sure \
                 you've granted camera permissions in your browser settings."
                .to_string(),
            Self::Playback { .. } => {
                "Could not start video playback. Please check your camera permissions.".to_string()
            }
            Self::Capture { .. } => {
                "Failed to capture photo. The camera may not be fully initialized yet.".to_string()
            }
            Self::Export { message } => {
                format!("Failed to save the photo: {message}. Please try again.")
            }
            Self::InvalidState { message } => message.clone(),
            Self::Config { message } => format!("Configuration problem: {message}"),
            Self::Io(e) => format!("File system error: {e}"),
            Self::Json(e) => format!("Malformed data: {e}"),
            Self::Other(e) => format!("Unexpected error: {e}"),
        }
    }

    /// Whether this error came from camera acquisition or playback.
    pub fn is_camera_error(&self) -> bool {
        matches!(
            self,
            Self::Unsupported { .. }
                | Self::InsecureContext { .. }
                | Self::CameraUnavailable { .. }
                | Self::Playback { .. }
        )
    }
}
