/// Ordered suffix -> MIME table for documents. First match wins;
/// suffixes are tested case-insensitively against the lowercased name.
pub const DOCUMENT_TYPES: &[(&str, &str)] = &[
    (".pdf", "application/pdf"),
    (".doc", "application/msword"),
    (
        ".docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    (".xls", "application/vnd.ms-excel"),
    (
        ".xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    (".zip", "application/zip"),
    (".txt", "text/plain"),
    (".jpg", "image/jpeg"),
    (".jpeg", "image/jpeg"),
    (".png", "image/png"),
];

/// Fallback for unknown document extensions
pub const DOCUMENT_DEFAULT: &str = "application/octet-stream";

/// Ordered suffix -> MIME table for media streaming
pub const MEDIA_TYPES: &[(&str, &str)] = &[
    (".mp4", "video/mp4"),
    (".webm", "video/webm"),
    (".ogg", "video/ogg"),
];

/// Fallback for unknown media extensions
pub const MEDIA_DEFAULT: &str = "video/mp4";

/// Who may delete an asset. The stricter file-management paths allow only
/// admins; the simpler per-user paths also allow the owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePolicy {
    AdminOnly,
    OwnerOrAdmin,
}

/// Queue names for routed domain events
#[derive(Debug, Clone)]
pub struct EventRoutes {
    pub processing_queue: String,
    pub notification_queue: String,
}

impl Default for EventRoutes {
    fn default() -> Self {
        Self {
            processing_queue: "file.processing.queue".to_string(),
            notification_queue: "notification.queue".to_string(),
        }
    }
}

/// Configuration for asset operations
#[derive(Debug, Clone)]
pub struct AssetConfig {
    /// Bucket name passed to the object store
    pub bucket: String,

    /// Absolute max size allowed for a single asset (safety guard)
    pub max_asset_bytes: u64,

    /// Delete authorization policy
    pub delete_policy: DeletePolicy,

    /// If true, any instructor-role principal may read parent-attached
    /// assets, not just the parent's designated instructor
    pub instructors_view_parented: bool,

    /// Suffix -> MIME table used for document downloads
    pub document_types: &'static [(&'static str, &'static str)],

    /// Suffix -> MIME table used for media streaming
    pub media_types: &'static [(&'static str, &'static str)],

    /// Queue routing for emitted events
    pub routes: EventRoutes,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            bucket: "files".to_string(),
            max_asset_bytes: 5 * 1024 * 1024 * 1024, // 5GB
            delete_policy: DeletePolicy::AdminOnly,
            instructors_view_parented: true,
            document_types: DOCUMENT_TYPES,
            media_types: MEDIA_TYPES,
            routes: EventRoutes::default(),
        }
    }
}

impl AssetConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set bucket name
    pub fn with_bucket<S: Into<String>>(mut self, bucket: S) -> Self {
        self.bucket = bucket.into();
        self
    }

    /// Set max asset size
    pub fn with_max_asset_bytes(mut self, bytes: u64) -> Self {
        self.max_asset_bytes = bytes;
        self
    }

    /// Set delete authorization policy
    pub fn with_delete_policy(mut self, policy: DeletePolicy) -> Self {
        self.delete_policy = policy;
        self
    }

    /// Restrict parented reads to owner, designated instructor, and enrollees
    pub fn designated_instructor_only(mut self) -> Self {
        self.instructors_view_parented = false;
        self
    }

    /// Set queue routing
    pub fn with_routes(mut self, routes: EventRoutes) -> Self {
        self.routes = routes;
        self
    }
}
