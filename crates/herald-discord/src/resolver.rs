//! Recipient resolution — raw references to concrete Discord users.

use herald_core::error::DispatchError;
use herald_core::types::RecipientRef;
use tracing::{debug, warn};

use crate::transport::{RemoteUser, Transport, TransportFailure};

/// Resolve a classified reference to a user.
///
/// Identifiers go straight to the user endpoint; names are searched across
/// every community the bot participates in.
pub async fn resolve<T: Transport>(
    transport: &T,
    reference: &RecipientRef,
) -> Result<RemoteUser, DispatchError> {
    match reference {
        RecipientRef::Id(raw) => resolve_by_id(transport, raw).await,
        RecipientRef::Name(raw) => resolve_by_name(transport, raw).await,
    }
}

/// Direct lookup — one remote call, no search.
async fn resolve_by_id<T: Transport>(
    transport: &T,
    raw: &str,
) -> Result<RemoteUser, DispatchError> {
    let id: u64 = raw
        .parse()
        .map_err(|_| DispatchError::NotFound(raw.to_string()))?;

    match transport.fetch_user(id).await {
        Ok(user) => Ok(user),
        Err(TransportFailure::NotFound) => Err(DispatchError::NotFound(raw.to_string())),
        Err(TransportFailure::RateLimited) => Err(DispatchError::RateLimited),
        Err(other) => Err(DispatchError::Transport(other.to_string())),
    }
}

/// Case-insensitive exact username search across all communities.
///
/// Communities are scanned in ascending ID order so that a name present in
/// several of them always resolves to the same account. A community whose
/// member list is denied is skipped; if the search then ends without a match
/// it is reported as unavailable rather than not-found, because the denied
/// community may well contain the user.
async fn resolve_by_name<T: Transport>(
    transport: &T,
    raw: &str,
) -> Result<RemoteUser, DispatchError> {
    let needle = raw.to_lowercase();

    let mut communities = match transport.list_communities().await {
        Ok(communities) => communities,
        Err(TransportFailure::RateLimited) => return Err(DispatchError::RateLimited),
        Err(other) => return Err(DispatchError::Transport(other.to_string())),
    };
    communities.sort_by_key(|community| community.id);

    let mut search_incomplete = false;
    for community in &communities {
        let members = match transport.list_members(community.id).await {
            Ok(members) => members,
            Err(TransportFailure::MissingAccess(detail)) => {
                warn!(
                    community = %community.name,
                    detail = %detail,
                    "member list unavailable; skipping community"
                );
                search_incomplete = true;
                continue;
            }
            Err(TransportFailure::RateLimited) => return Err(DispatchError::RateLimited),
            Err(other) => return Err(DispatchError::Transport(other.to_string())),
        };

        if let Some(user) = members
            .into_iter()
            .find(|member| member.username.to_lowercase() == needle)
        {
            debug!(user_id = user.id, community = %community.name, "username resolved");
            return Ok(user);
        }
    }

    if search_incomplete {
        return Err(DispatchError::MemberSearchUnavailable);
    }
    Err(DispatchError::NotFound(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MockTransport;
    use crate::transport::{CommunityRef, RemoteUser};

    fn name_ref(name: &str) -> RecipientRef {
        RecipientRef::classify(name).unwrap()
    }

    #[tokio::test]
    async fn name_in_one_community_resolves() {
        let mut transport = MockTransport::default();
        transport.communities.push(CommunityRef {
            id: 10,
            name: "guild-a".into(),
        });
        transport.members.insert(
            10,
            vec![RemoteUser {
                id: 42,
                username: "Alice".into(),
            }],
        );

        let user = resolve(&transport, &name_ref("alice")).await.unwrap();
        assert_eq!(user.id, 42);
        assert_eq!(user.username, "Alice");
    }

    #[tokio::test]
    async fn name_absent_everywhere_is_not_found() {
        let mut transport = MockTransport::default();
        transport.communities.push(CommunityRef {
            id: 10,
            name: "guild-a".into(),
        });
        transport.members.insert(10, Vec::new());

        let err = resolve(&transport, &name_ref("ghost")).await.unwrap_err();
        assert!(matches!(err, DispatchError::NotFound(reference) if reference == "ghost"));
    }

    #[tokio::test]
    async fn duplicate_name_resolves_from_lowest_community_id() {
        let mut transport = MockTransport::default();
        // Listed out of order on purpose; the resolver must sort.
        transport.communities.push(CommunityRef {
            id: 20,
            name: "guild-b".into(),
        });
        transport.communities.push(CommunityRef {
            id: 10,
            name: "guild-a".into(),
        });
        transport.members.insert(
            20,
            vec![RemoteUser {
                id: 2,
                username: "alice".into(),
            }],
        );
        transport.members.insert(
            10,
            vec![RemoteUser {
                id: 1,
                username: "alice".into(),
            }],
        );

        let user = resolve(&transport, &name_ref("alice")).await.unwrap();
        assert_eq!(user.id, 1);
    }

    #[tokio::test]
    async fn denied_member_list_with_no_match_is_search_unavailable() {
        let mut transport = MockTransport::default();
        // No entry in `members` means the listing is denied.
        transport.communities.push(CommunityRef {
            id: 10,
            name: "locked".into(),
        });

        let err = resolve(&transport, &name_ref("alice")).await.unwrap_err();
        assert!(matches!(err, DispatchError::MemberSearchUnavailable));
    }

    #[tokio::test]
    async fn match_in_accessible_community_wins_over_denied_one() {
        let mut transport = MockTransport::default();
        transport.communities.push(CommunityRef {
            id: 10,
            name: "locked".into(),
        });
        transport.communities.push(CommunityRef {
            id: 20,
            name: "open".into(),
        });
        transport.members.insert(
            20,
            vec![RemoteUser {
                id: 7,
                username: "alice".into(),
            }],
        );

        let user = resolve(&transport, &name_ref("alice")).await.unwrap();
        assert_eq!(user.id, 7);
    }

    #[tokio::test]
    async fn id_reference_skips_the_search() {
        let mut transport = MockTransport::default();
        transport.users.insert(
            123456789012345678,
            RemoteUser {
                id: 123456789012345678,
                username: "alice".into(),
            },
        );

        let user = resolve(&transport, &name_ref("123456789012345678"))
            .await
            .unwrap();
        assert_eq!(user.username, "alice");
        // No community listing happened for an ID lookup.
        assert_eq!(transport.community_list_calls(), 0);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let transport = MockTransport::default();
        let err = resolve(&transport, &name_ref("123456789012345678"))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::NotFound(_)));
    }
}
