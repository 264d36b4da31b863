use std::fmt;

// === StorageError ===

/// Errors raised by a key/value storage backend.
#[derive(Debug)]
pub enum StorageError {
    /// The backend is not available (private browsing, missing file permissions).
    Unavailable(String),
    /// The backend refused a write because it is full.
    QuotaExceeded(String),
    /// Database operation failed.
    DatabaseError(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Unavailable(msg) => write!(f, "Storage unavailable: {}", msg),
            StorageError::QuotaExceeded(msg) => write!(f, "Storage quota exceeded: {}", msg),
            StorageError::DatabaseError(msg) => write!(f, "Storage database error: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::DatabaseError(err.to_string())
    }
}

// === PreferenceError ===

/// Errors describing why a preference value was refused.
///
/// The store itself never returns these to UI code; they surface only through
/// the bridge, where a parent frame sent something unusable.
#[derive(Debug)]
pub enum PreferenceError {
    /// No preference with the given name exists.
    UnknownKey(String),
    /// The value does not fit the preference's domain.
    InvalidValue(String),
}

impl fmt::Display for PreferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreferenceError::UnknownKey(key) => write!(f, "Unknown preference: {}", key),
            PreferenceError::InvalidValue(msg) => write!(f, "Invalid preference value: {}", msg),
        }
    }
}

impl std::error::Error for PreferenceError {}

// === DomError ===

/// Errors related to the host document model.
#[derive(Debug)]
pub enum DomError {
    /// A selector could not be parsed.
    InvalidSelector(String),
    /// The node id does not refer to a live node.
    NodeNotFound(u32),
    /// The operation needs an element but got another node kind.
    NotAnElement(u32),
    /// The element already has a shadow root.
    ShadowRootExists(u32),
    /// Appending would create a cycle.
    HierarchyRequest(String),
    /// Fixture markup could not be parsed.
    ParseError(String),
}

impl fmt::Display for DomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomError::InvalidSelector(sel) => write!(f, "Invalid selector: {}", sel),
            DomError::NodeNotFound(id) => write!(f, "Node not found: {}", id),
            DomError::NotAnElement(id) => write!(f, "Node is not an element: {}", id),
            DomError::ShadowRootExists(id) => {
                write!(f, "Element already hosts a shadow root: {}", id)
            }
            DomError::HierarchyRequest(msg) => write!(f, "Hierarchy request error: {}", msg),
            DomError::ParseError(msg) => write!(f, "Markup parse error: {}", msg),
        }
    }
}

impl std::error::Error for DomError {}

// === ServiceError ===

/// Errors related to the remote feature services (dictionary, summary, pronunciation, ...).
#[derive(Debug)]
pub enum ServiceError {
    /// The HTTP client could not be constructed.
    ClientBuild(String),
    /// The request could not be sent or the body could not be read.
    NetworkError(String),
    /// The service answered with a non-2xx status.
    Status { status: u16, message: String },
    /// The response body did not match the expected schema.
    MalformedResponse(String),
    /// A newer request for the same feature superseded this one.
    Superseded,
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::ClientBuild(msg) => write!(f, "HTTP client build failed: {}", msg),
            ServiceError::NetworkError(msg) => write!(f, "Service network error: {}", msg),
            ServiceError::Status { status, message } => {
                write!(f, "Service returned {}: {}", status, message)
            }
            ServiceError::MalformedResponse(msg) => {
                write!(f, "Malformed service response: {}", msg)
            }
            ServiceError::Superseded => write!(f, "Response superseded by a newer request"),
        }
    }
}

impl std::error::Error for ServiceError {}

// === EmbedError ===

/// Errors related to mounting the widget and the cross-frame bridge.
#[derive(Debug)]
pub enum EmbedError {
    /// The widget has not been mounted yet.
    NotMounted,
    /// Mounting failed while building the host element.
    MountFailed(String),
    /// An inbound message was not shaped like `{ type, payload }`.
    MalformedMessage(String),
    /// A recognized message carried an unusable payload.
    InvalidPayload(String),
}

impl fmt::Display for EmbedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbedError::NotMounted => write!(f, "Accessibility bar is not mounted"),
            EmbedError::MountFailed(msg) => write!(f, "Mount failed: {}", msg),
            EmbedError::MalformedMessage(msg) => write!(f, "Malformed message: {}", msg),
            EmbedError::InvalidPayload(msg) => write!(f, "Invalid payload: {}", msg),
        }
    }
}

impl std::error::Error for EmbedError {}

impl From<DomError> for EmbedError {
    fn from(err: DomError) -> Self {
        EmbedError::MountFailed(err.to_string())
    }
}
