use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrganizerError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stale reference: {kind} {id} is no longer in the collection")]
    StaleReference { kind: &'static str, id: i64 },

    #[error("Invalid drag identifier '{token}': {reason}")]
    InvalidDragRef { token: String, reason: String },

    #[error("Persistence call {call} failed{}: {message}", fmt_status(.status))]
    PersistenceFailure {
        call: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Inconsistent snapshot: {message}")]
    InconsistentSnapshot { message: String },

    #[error("Order-sync dispatcher is no longer running")]
    DispatcherClosed,

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

pub type Result<T> = std::result::Result<T, OrganizerError>;

fn fmt_status(status: &Option<u16>) -> String {
    status
        .map(|code| format!(" with status {}", code))
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Persistence,
    DragGesture,
    Data,
    Configuration,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl OrganizerError {
    pub fn persistence(call: impl Into<String>, status: Option<u16>, message: impl Into<String>) -> Self {
        Self::PersistenceFailure {
            call: call.into(),
            status,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Http(_) => ErrorCategory::Network,
            Self::PersistenceFailure { .. } => ErrorCategory::Persistence,
            Self::StaleReference { .. } | Self::InvalidDragRef { .. } => ErrorCategory::DragGesture,
            Self::Serialization(_) | Self::InconsistentSnapshot { .. } | Self::ValidationError { .. } => {
                ErrorCategory::Data
            }
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            Self::Io(_) | Self::DispatcherClosed => ErrorCategory::Internal,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 拖曳到已刪除的項目：本地當作 NoOp 處理
            Self::StaleReference { .. } => ErrorSeverity::Low,
            Self::Http(_) | Self::PersistenceFailure { .. } => ErrorSeverity::Medium,
            Self::InvalidDragRef { .. }
            | Self::ValidationError { .. }
            | Self::Serialization(_)
            | Self::InconsistentSnapshot { .. } => ErrorSeverity::High,
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::Io(_)
            | Self::DispatcherClosed => ErrorSeverity::Critical,
        }
    }

    /// 本地狀態是否已與後端分歧，需要重新抓取
    pub fn requires_refetch(&self) -> bool {
        matches!(self, Self::Http(_) | Self::PersistenceFailure { .. })
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check that the backend is running and reachable at the configured base URL",
            ErrorCategory::Persistence => "Reload the categories from the backend to resynchronize the local order",
            ErrorCategory::DragGesture => "Refresh the view; the dragged item may have been deleted",
            ErrorCategory::Data => "Verify the input values and the backend response format",
            ErrorCategory::Configuration => "Review the command line flags and the TOML configuration file",
            ErrorCategory::Internal => "Restart the organizer; if the problem persists, report it",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::Http(_) => "Could not reach the bookmark backend".to_string(),
            Self::PersistenceFailure { call, .. } => {
                format!("The new order could not be saved ({})", call)
            }
            Self::StaleReference { kind, id } => {
                format!("The {} {} no longer exists", kind, id)
            }
            Self::InvalidDragRef { token, .. } => format!("'{}' is not a category or site", token),
            Self::ValidationError { message } => message.clone(),
            Self::MissingConfigError { field } => format!("Missing setting: {}", field),
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid setting {}: {}", field, reason)
            }
            other => other.to_string(),
        }
    }
}
