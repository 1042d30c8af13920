//! Per-action authentication policy.
//!
//! One explicit table from (resource, action) to a required-authentication
//! flag, resolved before any data access. Recipe reads are publicly
//! accessible; every other operation requires a valid token.

use crate::auth::AuthError;
use crate::models::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Tags,
    Ingredients,
    Recipes,
    Profile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    List,
    Retrieve,
    Create,
    Update,
    PartialUpdate,
    Destroy,
    UploadImage,
}

pub fn requires_auth(resource: Resource, action: Action) -> bool {
    !matches!(
        (resource, action),
        (Resource::Recipes, Action::List | Action::Retrieve)
    )
}

/// Resolve the caller for an operation. Protected actions without
/// credentials are rejected with a generic 401 before any query runs.
pub fn resolve_caller(
    resource: Resource,
    action: Action,
    caller: Option<User>,
) -> Result<Option<User>, AuthError> {
    if caller.is_none() && requires_auth(resource, action) {
        return Err(AuthError::MissingHeader);
    }
    Ok(caller)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipe_reads_are_public() {
        assert!(!requires_auth(Resource::Recipes, Action::List));
        assert!(!requires_auth(Resource::Recipes, Action::Retrieve));
    }

    #[test]
    fn test_recipe_writes_require_auth() {
        for action in [
            Action::Create,
            Action::Update,
            Action::PartialUpdate,
            Action::Destroy,
            Action::UploadImage,
        ] {
            assert!(requires_auth(Resource::Recipes, action));
        }
    }

    #[test]
    fn test_catalog_resources_always_require_auth() {
        for resource in [Resource::Tags, Resource::Ingredients, Resource::Profile] {
            for action in [Action::List, Action::Retrieve, Action::Create] {
                assert!(requires_auth(resource, action));
            }
        }
    }

    #[test]
    fn test_resolve_caller_rejects_anonymous_protected_action() {
        assert!(resolve_caller(Resource::Tags, Action::List, None).is_err());
    }

    #[test]
    fn test_resolve_caller_allows_anonymous_recipe_list() {
        let resolved = resolve_caller(Resource::Recipes, Action::List, None).unwrap();
        assert!(resolved.is_none());
    }
}
