//! The asset lifecycle coordinator: orchestrates upload, read, and delete
//! across the object store, metadata store, access engine, range resolver,
//! and event notifier.

use std::sync::Arc;
use tracing::{error, info};

use crate::access::{self, AccessPolicy, Action, ParentFacts};
use crate::config::{AssetConfig, DOCUMENT_DEFAULT, MEDIA_DEFAULT};
use crate::enrollment::EnrollmentStore;
use crate::error::{AssetError, AssetResult};
use crate::events::{DomainEvent, EventKind, EventNotifier};
use crate::metadata::MetadataStore;
use crate::range::{self, Framing};
use crate::store::{self, ObjectStore};
use crate::types::{Asset, AssetId, AssetStatus, ByteStream, Principal};

/// Request to store a new asset
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file_name: String,
    pub content_type: Option<String>,
    pub size_bytes: u64,
    pub parent_id: Option<String>,
}

impl UploadRequest {
    pub fn new<S: Into<String>>(file_name: S, size_bytes: u64) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            size_bytes,
            parent_id: None,
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
}

/// Result of opening an asset for reading
pub struct OpenedAsset {
    pub asset: Asset,
    pub framing: Framing,
    pub content_type: String,
    /// Byte stream to forward to the caller; `None` for a not-satisfiable
    /// range, which carries headers only
    pub body: Option<ByteStream>,
}

impl std::fmt::Debug for OpenedAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenedAsset")
            .field("asset", &self.asset)
            .field("framing", &self.framing)
            .field("content_type", &self.content_type)
            .field("body", &self.body.as_ref().map(|_| "<stream>"))
            .finish()
    }
}

impl OpenedAsset {
    pub fn status(&self) -> u16 {
        self.framing.status()
    }

    pub fn headers(&self) -> Vec<(String, String)> {
        self.framing.headers(&self.content_type)
    }
}

/// Coordinates asset lifecycle operations. Embed this in whatever
/// transport surface fronts the service.
pub struct AssetService {
    objects: Arc<dyn ObjectStore>,
    metadata: Arc<dyn MetadataStore>,
    enrollment: Arc<dyn EnrollmentStore>,
    notifier: EventNotifier,
    policy: AccessPolicy,
    config: AssetConfig,
}

impl AssetService {
    pub fn new(
        objects: Arc<dyn ObjectStore>,
        metadata: Arc<dyn MetadataStore>,
        enrollment: Arc<dyn EnrollmentStore>,
        notifier: EventNotifier,
        config: AssetConfig,
    ) -> Self {
        Self {
            objects,
            metadata,
            enrollment,
            notifier,
            policy: AccessPolicy::from(&config),
            config,
        }
    }

    pub fn config(&self) -> &AssetConfig {
        &self.config
    }

    /// Store a new asset. The object write must succeed before any
    /// metadata is recorded: a failed put leaves no orphan record.
    pub async fn upload(
        &self,
        principal: &Principal,
        request: UploadRequest,
        body: ByteStream,
    ) -> AssetResult<Asset> {
        let key = store::object_key(&request.file_name);
        let mut asset = Asset::new(
            key.clone(),
            request.file_name,
            request.size_bytes,
            principal.subject.as_str(),
        );
        if let Some(ct) = &request.content_type {
            asset = asset.with_content_type(ct.clone());
        }
        if let Some(parent_id) = request.parent_id {
            asset = asset.with_parent(parent_id);
        }

        // Upload is gated on role only; ownership has no meaning for a
        // creation.
        self.check(access::authorize(
            principal,
            Action::Upload,
            &asset,
            None,
            &self.policy,
        ))?;

        if request.size_bytes > self.config.max_asset_bytes {
            return Err(AssetError::invalid(format!(
                "asset size {} exceeds maximum {}",
                request.size_bytes, self.config.max_asset_bytes
            )));
        }

        let outcome = self
            .objects
            .put(
                &key,
                request.content_type.as_deref(),
                request.size_bytes,
                body,
            )
            .await?;
        asset.size_bytes = outcome.size_bytes;

        // Record metadata immediately after the successful write. A failure
        // here leaves an orphaned object needing out-of-band reconciliation;
        // rolling back the put can itself fail, so we do not attempt it.
        let asset = match self.metadata.save(asset).await {
            Ok(asset) => asset,
            Err(e) => {
                error!(key = %key, error = %e, "metadata write failed after object store commit; orphaned object");
                return Err(e);
            }
        };

        info!(id = %asset.id, key = %key, owner = %asset.owner, "asset uploaded");
        self.notifier
            .notify(
                DomainEvent::new(EventKind::Upload, asset.id.as_str()).with_payload(
                    serde_json::json!({
                        "object_name": asset.key,
                        "owner": asset.owner,
                        "file_name": asset.name,
                    }),
                ),
            )
            .await;

        Ok(asset)
    }

    /// Open an asset for reading, honoring an optional byte-range header.
    /// A not-satisfiable range returns framing only and never touches the
    /// object body.
    pub async fn open(
        &self,
        principal: &Principal,
        id: &AssetId,
        range_header: Option<&str>,
    ) -> AssetResult<OpenedAsset> {
        let asset = self.metadata.find_by_id(id).await?;
        let facts = self.parent_facts(&asset).await?;
        self.check(access::authorize(
            principal,
            Action::Download,
            &asset,
            facts.as_ref(),
            &self.policy,
        ))?;

        // The object store is the authority on size; the recorded size may
        // be stale.
        let head = self.objects.stat(&asset.key).await?;
        let content_type = self.resolved_content_type(&asset, head.content_type.as_deref());

        let framing = range::resolve(range_header, head.size_bytes);
        let body = match &framing {
            Framing::Full { .. } => Some(self.objects.get(&asset.key).await?.stream),
            Framing::Partial(range) => Some(
                self.objects
                    .get_range(&asset.key, range.start, range.content_length())
                    .await?
                    .stream,
            ),
            Framing::NotSatisfiable { .. } => None,
        };

        Ok(OpenedAsset {
            asset,
            framing,
            content_type,
            body,
        })
    }

    /// Fetch an asset record without its content
    pub async fn get_meta(&self, principal: &Principal, id: &AssetId) -> AssetResult<Asset> {
        let asset = self.metadata.find_by_id(id).await?;
        let facts = self.parent_facts(&asset).await?;
        self.check(access::authorize(
            principal,
            Action::View,
            &asset,
            facts.as_ref(),
            &self.policy,
        ))?;
        Ok(asset)
    }

    /// The caller's own assets
    pub async fn list_own(&self, principal: &Principal) -> AssetResult<Vec<Asset>> {
        self.metadata.find_by_owner(&principal.subject).await
    }

    /// Assets attached to a parent resource, filtered to what the caller
    /// may view
    pub async fn list_by_parent(
        &self,
        principal: &Principal,
        parent_id: &str,
    ) -> AssetResult<Vec<Asset>> {
        let assets = self.metadata.find_by_parent(parent_id).await?;
        let facts = self.lookup_facts(parent_id).await?;
        Ok(assets
            .into_iter()
            .filter(|asset| {
                access::authorize(principal, Action::View, asset, Some(&facts), &self.policy)
                    .is_allow()
            })
            .collect())
    }

    /// Rename the display name. The object-store key never changes.
    pub async fn rename(
        &self,
        principal: &Principal,
        id: &AssetId,
        new_name: &str,
    ) -> AssetResult<Asset> {
        let mut asset = self.metadata.find_by_id(id).await?;
        if !principal.is_admin() && !asset.is_owned_by(&principal.subject) {
            return Err(AssetError::denied(
                crate::access::DenyReason::NotOwnerNotEnrolled,
            ));
        }
        asset.name = new_name.to_string();
        self.metadata.save(asset).await
    }

    /// Move the asset through its lifecycle. Only the processing pipeline
    /// identities (admin, instructor) may transition.
    pub async fn set_status(
        &self,
        principal: &Principal,
        id: &AssetId,
        to: AssetStatus,
    ) -> AssetResult<Asset> {
        if !principal.is_admin() && !principal.is_instructor() {
            return Err(AssetError::denied(
                crate::access::DenyReason::RoleInsufficient,
            ));
        }
        let mut asset = self.metadata.find_by_id(id).await?;
        let from = asset.status;
        if !from.can_transition(to) {
            return Err(AssetError::InvalidStatus { from, to });
        }
        asset.status = to;
        let asset = self.metadata.save(asset).await?;

        info!(id = %asset.id, from = from.as_str(), to = to.as_str(), "asset status changed");
        self.notifier
            .notify(
                DomainEvent::new(EventKind::StatusChanged, asset.id.as_str()).with_payload(
                    serde_json::json!({
                        "from": from.as_str(),
                        "to": to.as_str(),
                    }),
                ),
            )
            .await;

        Ok(asset)
    }

    /// Delete the object first, then the record. If the object delete
    /// fails, the record is retained so the blob pointer is not lost.
    pub async fn delete(&self, principal: &Principal, id: &AssetId) -> AssetResult<()> {
        let asset = self.metadata.find_by_id(id).await?;
        self.check(access::authorize(
            principal,
            Action::Delete,
            &asset,
            None,
            &self.policy,
        ))?;

        self.objects.delete(&asset.key).await?;
        self.metadata.delete_by_id(id).await?;

        info!(id = %asset.id, key = %asset.key, "asset deleted");
        self.notifier
            .notify(
                DomainEvent::new(EventKind::Delete, asset.id.as_str()).with_payload(
                    serde_json::json!({
                        "object_name": asset.key,
                        "owner": asset.owner,
                    }),
                ),
            )
            .await;

        Ok(())
    }

    /// Enroll the caller under a parent resource, granting indirect read
    /// access to its attached assets
    pub async fn enroll(&self, principal: &Principal, parent_id: &str) -> AssetResult<()> {
        self.enrollment.enroll(parent_id, &principal.subject).await?;

        info!(parent_id, subject = %principal.subject, "enrolled");
        self.notifier
            .notify(
                DomainEvent::new(EventKind::Enroll, parent_id).with_payload(serde_json::json!({
                    "subject": principal.subject,
                })),
            )
            .await;

        Ok(())
    }

    fn check(&self, decision: access::Decision) -> AssetResult<()> {
        match decision {
            access::Decision::Allow => Ok(()),
            access::Decision::Deny(reason) => Err(AssetError::denied(reason)),
        }
    }

    async fn parent_facts(&self, asset: &Asset) -> AssetResult<Option<ParentFacts>> {
        match &asset.parent_id {
            None => Ok(None),
            Some(parent_id) => Ok(Some(self.lookup_facts(parent_id).await?)),
        }
    }

    async fn lookup_facts(&self, parent_id: &str) -> AssetResult<ParentFacts> {
        let enrolled = self.enrollment.enrolled(parent_id).await?;
        let instructor_id = self.enrollment.instructor_of(parent_id).await?;
        Ok(ParentFacts {
            instructor_id,
            enrolled,
        })
    }

    /// Pick the content type: stored value wins; otherwise a suffix table
    /// lookup, with the media table for media names and the document
    /// table for everything else.
    fn resolved_content_type(&self, asset: &Asset, stored: Option<&str>) -> String {
        let stored = stored.or(asset.content_type.as_deref());
        let name = asset.original_name.to_lowercase();
        let is_media = self
            .config
            .media_types
            .iter()
            .any(|(suffix, _)| name.ends_with(suffix))
            || stored.map_or(false, |ct| ct.starts_with("video/"));

        if is_media {
            range::resolve_content_type(stored, &asset.original_name, self.config.media_types, MEDIA_DEFAULT)
        } else {
            range::resolve_content_type(
                stored,
                &asset.original_name,
                self.config.document_types,
                DOCUMENT_DEFAULT,
            )
        }
    }
}
