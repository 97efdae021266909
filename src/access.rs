//! Access decisions as one pure, ordered rule table. All facts are passed
//! in; the engine does no I/O and is unit-testable in isolation from any
//! transport or storage concern.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::{AssetConfig, DeletePolicy};
use crate::types::{Asset, Principal, Role};

/// What the principal is attempting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Upload,
    View,
    Download,
    Delete,
}

impl Action {
    fn is_read(&self) -> bool {
        matches!(self, Self::View | Self::Download)
    }
}

/// Machine-checkable reason attached to every denial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// Principal's roles do not permit the action at all
    RoleInsufficient,
    /// Principal is neither owner nor reachable through enrollment
    NotOwnerNotEnrolled,
    /// Asset references a parent resource but no relation facts were
    /// supplied for it
    NoSuchRelation,
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::RoleInsufficient => "role_insufficient",
            Self::NotOwnerNotEnrolled => "not_owner_not_enrolled",
            Self::NoSuchRelation => "no_such_relation",
        };
        write!(f, "{}", s)
    }
}

/// Outcome of an authorization check. Never a bare boolean: denials carry
/// their reason for observability and testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Facts about an asset's parent resource, looked up by the caller from
/// the enrollment collaborator
#[derive(Debug, Clone, Default)]
pub struct ParentFacts {
    /// The parent resource's designated instructor, if any
    pub instructor_id: Option<String>,
    /// Subjects granted indirect read access through enrollment
    pub enrolled: HashSet<String>,
}

impl ParentFacts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instructor<S: Into<String>>(mut self, subject: S) -> Self {
        self.instructor_id = Some(subject.into());
        self
    }

    pub fn with_enrolled<S: Into<String>>(mut self, subject: S) -> Self {
        self.enrolled.insert(subject.into());
        self
    }
}

/// The configurable policy axes of the rule table
#[derive(Debug, Clone, Copy)]
pub struct AccessPolicy {
    pub delete: DeletePolicy,
    /// Treat any instructor-role principal as allowed on parented reads
    pub instructors_view_parented: bool,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self {
            delete: DeletePolicy::AdminOnly,
            instructors_view_parented: true,
        }
    }
}

impl From<&AssetConfig> for AccessPolicy {
    fn from(config: &AssetConfig) -> Self {
        Self {
            delete: config.delete_policy,
            instructors_view_parented: config.instructors_view_parented,
        }
    }
}

/// Can `principal` perform `action` on `asset`? First matching rule wins;
/// the order is significant.
pub fn authorize(
    principal: &Principal,
    action: Action,
    asset: &Asset,
    parent: Option<&ParentFacts>,
    policy: &AccessPolicy,
) -> Decision {
    // Admins may do everything.
    if principal.is_admin() {
        return Decision::Allow;
    }

    match action {
        // Upload is a creation, not an access to existing state: ownership
        // is irrelevant, only the instructor role counts.
        Action::Upload => {
            if principal.is_instructor() {
                Decision::Allow
            } else {
                Decision::Deny(DenyReason::RoleInsufficient)
            }
        }

        a if a.is_read() => match &asset.parent_id {
            None => {
                if asset.is_owned_by(&principal.subject) {
                    Decision::Allow
                } else {
                    Decision::Deny(DenyReason::NotOwnerNotEnrolled)
                }
            }
            Some(_) => {
                let facts = match parent {
                    Some(facts) => facts,
                    None => return Decision::Deny(DenyReason::NoSuchRelation),
                };
                if asset.is_owned_by(&principal.subject) {
                    return Decision::Allow;
                }
                if facts.instructor_id.as_deref() == Some(principal.subject.as_str()) {
                    return Decision::Allow;
                }
                if policy.instructors_view_parented && principal.has_role(Role::Instructor) {
                    return Decision::Allow;
                }
                if facts.enrolled.contains(&principal.subject) {
                    return Decision::Allow;
                }
                Decision::Deny(DenyReason::NotOwnerNotEnrolled)
            }
        },

        Action::Delete => match policy.delete {
            DeletePolicy::AdminOnly => Decision::Deny(DenyReason::RoleInsufficient),
            DeletePolicy::OwnerOrAdmin => {
                if asset.is_owned_by(&principal.subject) {
                    Decision::Allow
                } else {
                    Decision::Deny(DenyReason::RoleInsufficient)
                }
            }
        },

        _ => Decision::Deny(DenyReason::NotOwnerNotEnrolled),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    fn admin() -> Principal {
        Principal::new("root").with_role(Role::Admin)
    }

    fn instructor(subject: &str) -> Principal {
        Principal::new(subject).with_role(Role::Instructor)
    }

    fn student(subject: &str) -> Principal {
        Principal::new(subject).with_role(Role::Member)
    }

    fn own_asset(owner: &str) -> Asset {
        Asset::new("key_notes.pdf", "notes.pdf", 10, owner)
    }

    fn lesson_asset(owner: &str) -> Asset {
        own_asset(owner).with_parent("lesson-1")
    }

    #[test]
    fn admin_is_allowed_everything() {
        let asset = lesson_asset("someone-else");
        let policy = AccessPolicy::default();
        for action in [Action::Upload, Action::View, Action::Download, Action::Delete] {
            assert_eq!(
                authorize(&admin(), action, &asset, None, &policy),
                Decision::Allow
            );
        }
    }

    #[test]
    fn upload_requires_instructor_role_regardless_of_ownership() {
        let asset = own_asset("alice");
        let policy = AccessPolicy::default();
        assert_eq!(
            authorize(&instructor("bob"), Action::Upload, &asset, None, &policy),
            Decision::Allow
        );
        assert_eq!(
            authorize(&student("alice"), Action::Upload, &asset, None, &policy),
            Decision::Deny(DenyReason::RoleInsufficient)
        );
    }

    #[test]
    fn parentless_reads_are_owner_only() {
        let asset = own_asset("alice");
        let policy = AccessPolicy::default();
        assert_eq!(
            authorize(&student("alice"), Action::Download, &asset, None, &policy),
            Decision::Allow
        );
        assert_eq!(
            authorize(&student("mallory"), Action::Download, &asset, None, &policy),
            Decision::Deny(DenyReason::NotOwnerNotEnrolled)
        );
    }

    #[test]
    fn parented_read_without_facts_is_no_such_relation() {
        let asset = lesson_asset("alice");
        let policy = AccessPolicy::default();
        assert_eq!(
            authorize(&student("carol"), Action::Download, &asset, None, &policy),
            Decision::Deny(DenyReason::NoSuchRelation)
        );
    }

    #[test]
    fn enrollment_grants_indirect_read() {
        let asset = lesson_asset("alice");
        let policy = AccessPolicy::default();
        let facts = ParentFacts::new().with_enrolled("carol");
        assert_eq!(
            authorize(&student("carol"), Action::Download, &asset, Some(&facts), &policy),
            Decision::Allow
        );
        assert_eq!(
            authorize(&student("dave"), Action::Download, &asset, Some(&facts), &policy),
            Decision::Deny(DenyReason::NotOwnerNotEnrolled)
        );
    }

    #[test]
    fn designated_instructor_reads_parented_assets() {
        let asset = lesson_asset("alice");
        let policy = AccessPolicy {
            instructors_view_parented: false,
            ..AccessPolicy::default()
        };
        let facts = ParentFacts::new().with_instructor("prof");
        assert_eq!(
            authorize(&student("prof"), Action::View, &asset, Some(&facts), &policy),
            Decision::Allow
        );
        // Unrelated instructor is denied once the broad axis is off
        assert_eq!(
            authorize(
                &instructor("other-prof"),
                Action::View,
                &asset,
                Some(&facts),
                &policy
            ),
            Decision::Deny(DenyReason::NotOwnerNotEnrolled)
        );
    }

    #[test]
    fn any_instructor_reads_parented_assets_when_axis_enabled() {
        let asset = lesson_asset("alice");
        let policy = AccessPolicy::default();
        let facts = ParentFacts::new();
        assert_eq!(
            authorize(
                &instructor("other-prof"),
                Action::View,
                &asset,
                Some(&facts),
                &policy
            ),
            Decision::Allow
        );
    }

    #[test]
    fn delete_policy_axis_flips_the_owner_branch() {
        let asset = own_asset("alice");

        let strict = AccessPolicy::default();
        assert_eq!(
            authorize(&student("alice"), Action::Delete, &asset, None, &strict),
            Decision::Deny(DenyReason::RoleInsufficient)
        );

        let relaxed = AccessPolicy {
            delete: DeletePolicy::OwnerOrAdmin,
            ..AccessPolicy::default()
        };
        assert_eq!(
            authorize(&student("alice"), Action::Delete, &asset, None, &relaxed),
            Decision::Allow
        );
        assert_eq!(
            authorize(&student("mallory"), Action::Delete, &asset, None, &relaxed),
            Decision::Deny(DenyReason::RoleInsufficient)
        );
    }

    #[test]
    fn authorize_is_pure_and_repeatable() {
        let asset = own_asset("alice");
        let policy = AccessPolicy::default();
        let p = admin();
        for _ in 0..3 {
            assert_eq!(
                authorize(&p, Action::Download, &asset, None, &policy),
                Decision::Allow
            );
        }
    }
}
