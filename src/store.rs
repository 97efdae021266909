use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AssetResult;
use crate::types::ByteStream;

mod memory;

pub use memory::MemoryObjectStore;

/// Generate an object key as `<random-token>_<original-name>`. The random
/// token prevents collisions; the suffix keeps the key human-readable.
/// Callers must not assume the key is predictable from the name alone.
pub fn object_key(original_name: &str) -> String {
    format!("{}_{}", Uuid::new_v4().simple(), original_name)
}

/// Result of a successful put operation
#[derive(Debug, Clone)]
pub struct PutOutcome {
    /// Bytes actually written, verified against the declared size
    pub size_bytes: u64,
}

/// Metadata about a stored object, without its content
#[derive(Debug, Clone)]
pub struct ObjectHead {
    pub size_bytes: u64,
    pub content_type: Option<String>,
}

/// An opened object body
pub struct ObjectBody {
    pub stream: ByteStream,
    /// Length of this body: the full object size, or the range length for
    /// a bounded read
    pub size_bytes: u64,
    pub content_type: Option<String>,
}

impl std::fmt::Debug for ObjectBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectBody")
            .field("stream", &"<stream>")
            .field("size_bytes", &self.size_bytes)
            .field("content_type", &self.content_type)
            .finish()
    }
}

/// Uniform put/get/stat/delete over a named bucket, with partial-read
/// support. Backends are assumed to expose atomic single-object writes.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stream exactly `size` bytes under `key`. Fails with
    /// `StorageUnavailable` on any I/O or backend fault, including a body
    /// that yields a different byte count than declared; nothing is
    /// committed on failure.
    async fn put(
        &self,
        key: &str,
        content_type: Option<&str>,
        size: u64,
        body: ByteStream,
    ) -> AssetResult<PutOutcome>;

    /// Full-object read. `NotFound` if the key is absent.
    async fn get(&self, key: &str) -> AssetResult<ObjectBody>;

    /// Read `length` bytes starting at `offset`. The gateway re-verifies
    /// the bounds against `stat`, since a caller-declared size may be
    /// stale; `InvalidRange` on violation. Transfers only `length` bytes.
    async fn get_range(&self, key: &str, offset: u64, length: u64) -> AssetResult<ObjectBody>;

    /// Object metadata. `NotFound` if the key is absent.
    async fn stat(&self, key: &str) -> AssetResult<ObjectHead>;

    /// Idempotent delete: removing an already-absent key is not an error.
    async fn delete(&self, key: &str) -> AssetResult<()>;
}
