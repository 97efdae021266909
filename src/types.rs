use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures_core::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use uuid::Uuid;

/// Stream of bytes for asset content
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Unique identifier for a stored asset
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetId(pub String);

impl AssetId {
    /// Generate a new random asset ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from existing string
    pub fn from_string(id: String) -> Self {
        Self(id)
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AssetId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role labels carried by an authenticated principal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Instructor,
    Member,
}

impl Role {
    /// Parse a role label. Tolerates case and an optional `ROLE_` prefix,
    /// since identity providers disagree on both.
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim();
        let label = label
            .strip_prefix("ROLE_")
            .or_else(|| label.strip_prefix("role_"))
            .unwrap_or(label);
        match label.to_ascii_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "instructor" | "teacher" => Some(Self::Instructor),
            "member" | "client" | "student" => Some(Self::Member),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Instructor => "instructor",
            Self::Member => "member",
        }
    }
}

/// The authenticated caller. Supplied per-request by the authentication
/// boundary; never persisted by this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub subject: String,
    pub roles: Vec<Role>,
}

impl Principal {
    pub fn new<S: Into<String>>(subject: S) -> Self {
        Self {
            subject: subject.into(),
            roles: Vec::new(),
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        if !self.roles.contains(&role) {
            self.roles.push(role);
        }
        self
    }

    /// Build from raw role labels, dropping anything unrecognized
    pub fn from_labels<S: Into<String>>(subject: S, labels: &[&str]) -> Self {
        let roles = labels.iter().filter_map(|l| Role::parse(l)).collect();
        Self {
            subject: subject.into(),
            roles,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    pub fn is_instructor(&self) -> bool {
        self.has_role(Role::Instructor)
    }
}

/// Lifecycle status of an asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetStatus {
    Uploaded,
    Processing,
    Ready,
    Failed,
}

impl AssetStatus {
    /// Whether the lifecycle may move from `self` to `to`.
    /// Uploaded → Processing → Ready; Failed reachable from any
    /// non-terminal state; Ready and Failed are terminal.
    pub fn can_transition(&self, to: AssetStatus) -> bool {
        match (self, to) {
            (Self::Uploaded, Self::Processing) => true,
            (Self::Processing, Self::Ready) => true,
            (Self::Uploaded | Self::Processing, Self::Failed) => true,
            _ => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uploaded => "uploaded",
            Self::Processing => "processing",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }
}

/// Metadata record for one stored binary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    /// Object-store key. Immutable once set.
    pub key: String,
    /// Non-authoritative display name; the only renameable field
    pub name: String,
    pub original_name: String,
    pub size_bytes: u64,
    pub content_type: Option<String>,
    pub owner: String,
    /// Id of the parent resource (e.g. a lesson); unidirectional, never a
    /// live back-pointer
    pub parent_id: Option<String>,
    pub status: AssetStatus,
    pub uploaded_at: DateTime<Utc>,
}

impl Asset {
    pub fn new<K, N, O>(key: K, name: N, size_bytes: u64, owner: O) -> Self
    where
        K: Into<String>,
        N: Into<String>,
        O: Into<String>,
    {
        let name = name.into();
        Self {
            id: AssetId::new(),
            key: key.into(),
            original_name: name.clone(),
            name,
            size_bytes,
            content_type: None,
            owner: owner.into(),
            parent_id: None,
            status: AssetStatus::Uploaded,
            uploaded_at: Utc::now(),
        }
    }

    pub fn with_content_type<S: Into<String>>(mut self, content_type: S) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_parent<S: Into<String>>(mut self, parent_id: S) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn is_owned_by(&self, subject: &str) -> bool {
        self.owner == subject
    }
}

/// Inclusive byte span of an object, valid only against a known total size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// Number of bytes covered (inclusive bounds)
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn is_valid(&self, total_size: u64) -> bool {
        self.start <= self.end && self.end < total_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parse_tolerates_case_and_prefix() {
        assert_eq!(Role::parse("ADMIN"), Some(Role::Admin));
        assert_eq!(Role::parse("ROLE_admin"), Some(Role::Admin));
        assert_eq!(Role::parse("teacher"), Some(Role::Instructor));
        assert_eq!(Role::parse("client"), Some(Role::Member));
        assert_eq!(Role::parse("superuser"), None);
    }

    #[test]
    fn status_machine_paths() {
        assert!(AssetStatus::Uploaded.can_transition(AssetStatus::Processing));
        assert!(AssetStatus::Processing.can_transition(AssetStatus::Ready));
        assert!(AssetStatus::Uploaded.can_transition(AssetStatus::Failed));
        assert!(AssetStatus::Processing.can_transition(AssetStatus::Failed));
        assert!(!AssetStatus::Uploaded.can_transition(AssetStatus::Ready));
        assert!(!AssetStatus::Ready.can_transition(AssetStatus::Processing));
        assert!(!AssetStatus::Failed.can_transition(AssetStatus::Uploaded));
    }

    #[test]
    fn byte_range_len_is_inclusive() {
        let range = ByteRange::new(200, 299);
        assert_eq!(range.len(), 100);
        assert!(range.is_valid(1000));
        assert!(!ByteRange::new(900, 1200).is_valid(1000));
        assert!(!ByteRange::new(10, 5).is_valid(1000));
    }
}
