//! Team presence types.

/// Who is sending a presence heartbeat, without storing their raw IP.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientFingerprint {
    /// SHA-256 hex of the client IP.
    pub ip_hash: Option<String>,
    pub user_agent: Option<String>,
}
