//! # coursefiles: range-aware asset storage for course platforms
//!
//! `coursefiles` lets authenticated principals upload binary assets
//! (documents, videos) to durable object storage and read them back later,
//! including partial byte-range reads suitable for video scrubbing. Three
//! pieces do the real work:
//!
//! - **Object store gateway**: uniform put/get/stat/delete over a named
//!   bucket with bounded partial reads ([`ObjectStore`]).
//! - **Range resolver**: pure negotiation between a client range header and
//!   the object's true size, producing a full / partial / not-satisfiable
//!   framing decision without ever reading the body ([`range`]).
//! - **Access decision engine**: one ordered rule table answering "can
//!   principal P perform action A on asset X" over role, ownership, and
//!   enrollment facts ([`access::authorize`]).
//!
//! An [`AssetService`] coordinates the three, with committed state changes
//! emitting fire-and-forget [`DomainEvent`]s that never gate the response.
//!
//! ## Quick start
//!
//! ```rust
//! use coursefiles::prelude::*;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> AssetResult<()> {
//! let config = AssetConfig::default();
//! let (sink, _events) = ChannelSink::bounded(64);
//! let service = AssetService::new(
//!     Arc::new(MemoryObjectStore::new(config.bucket.clone())),
//!     Arc::new(MemoryMetadataStore::new()),
//!     Arc::new(MemoryEnrollmentStore::new()),
//!     EventNotifier::new(sink, config.routes.clone()),
//!     config,
//! );
//!
//! let instructor = Principal::new("prof").with_role(Role::Instructor);
//! let body: ByteStream = Box::pin(futures::stream::once(async {
//!     Ok(bytes::Bytes::from_static(b"hello"))
//! }));
//! let asset = service
//!     .upload(&instructor, UploadRequest::new("hello.txt", 5), body)
//!     .await?;
//!
//! // Partial read: bytes 1..=3
//! let opened = service.open(&instructor, &asset.id, Some("bytes=1-3")).await?;
//! assert_eq!(opened.status(), 206);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │  Your transport  │  ← routing, auth token verification
//! ├──────────────────┤
//! │   AssetService   │  ← lifecycle coordination, access gating
//! ├──────────────────┤
//! │ ObjectStore /    │  ← storage + collaborator boundaries
//! │ MetadataStore /  │
//! │ EnrollmentStore  │
//! └──────────────────┘
//! ```
//!
//! Collaborators stay at their interface boundary: the identity provider
//! supplies a verified [`Principal`] per request, the metadata store is
//! plain keyed CRUD, and the event sink is best-effort delivery.

pub mod access;
mod config;
mod enrollment;
mod error;
mod events;
mod metadata;
pub mod range;
mod service;
pub mod store;
mod types;

pub use access::{authorize, AccessPolicy, Action, Decision, DenyReason, ParentFacts};
pub use config::{
    AssetConfig, DeletePolicy, EventRoutes, DOCUMENT_DEFAULT, DOCUMENT_TYPES, MEDIA_DEFAULT,
    MEDIA_TYPES,
};
pub use enrollment::{EnrollmentStore, MemoryEnrollmentStore};
pub use error::{AssetError, AssetResult};
pub use events::{ChannelSink, DomainEvent, EventKind, EventNotifier, EventSink};
pub use metadata::{MemoryMetadataStore, MetadataStore};
pub use range::{resolve, resolve_content_type, Framing, RangeSpec, ResolvedRange};
pub use service::{AssetService, OpenedAsset, UploadRequest};
pub use store::{object_key, MemoryObjectStore, ObjectBody, ObjectHead, ObjectStore, PutOutcome};
pub use types::{Asset, AssetId, AssetStatus, ByteRange, ByteStream, Principal, Role};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        AccessPolicy, Action, Asset, AssetConfig, AssetError, AssetId, AssetResult, AssetService,
        AssetStatus, ByteStream, ChannelSink, Decision, DenyReason, DomainEvent, EventKind,
        EventNotifier, EventSink, Framing, MemoryEnrollmentStore, MemoryMetadataStore,
        MemoryObjectStore, ObjectStore, Principal, Role, UploadRequest,
    };
}
