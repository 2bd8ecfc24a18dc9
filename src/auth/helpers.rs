use chrono::Utc;
use uuid::Uuid;

use super::{MintedCredential, split_credential, verify_credential};
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{Scheduler, SchedulerToken};

const MAX_RETRIES: u32 = 3;

#[derive(Debug)]
pub enum TokenValidationError {
    InvalidScheme,
    InvalidToken,
    InternalError,
}

/// Mints a credential for `scheduler_id` and returns the raw token, which
/// is never stored.
pub fn issue_scheduler_token(store: &dyn Store, scheduler_id: &str) -> Result<String> {
    for _ in 0..MAX_RETRIES {
        let minted = MintedCredential::mint()?;
        let token = SchedulerToken {
            id: Uuid::new_v4().to_string(),
            token_hash: minted.hash,
            token_lookup: minted.lookup,
            scheduler_id: scheduler_id.to_string(),
            created_at: Utc::now(),
            last_used_at: None,
        };

        match store.create_scheduler_token(&token) {
            Ok(()) => {
                tracing::info!(scheduler_id, "Issued scheduler credential");
                return Ok(minted.raw);
            }
            Err(Error::TokenLookupCollision) => continue,
            Err(e) => return Err(e),
        }
    }

    Err(Error::TokenLookupCollision)
}

/// Validates a raw token string against the store and returns the
/// scheduler it authenticates.
pub fn validate_token(
    store: &dyn Store,
    raw_token: &str,
) -> std::result::Result<Scheduler, TokenValidationError> {
    let parts = split_credential(raw_token).map_err(|_| TokenValidationError::InvalidToken)?;

    let token = store
        .get_scheduler_token_by_lookup(parts.lookup)
        .map_err(|_| TokenValidationError::InternalError)?
        .ok_or(TokenValidationError::InvalidToken)?;

    if !verify_credential(raw_token, &token.token_hash)
        .map_err(|_| TokenValidationError::InternalError)?
    {
        return Err(TokenValidationError::InvalidToken);
    }

    let scheduler = store
        .get_scheduler(&token.scheduler_id)
        .map_err(|_| TokenValidationError::InternalError)?
        .ok_or(TokenValidationError::InvalidToken)?;

    if let Err(e) = store.update_scheduler_token_last_used(&token.id) {
        tracing::warn!("Failed to update token last_used_at: {e}");
    }

    Ok(scheduler)
}

/// Extracts a bearer token from the Authorization header.
/// Returns None if no auth header is present.
pub fn extract_token_from_header(
    auth_header: Option<&str>,
) -> std::result::Result<Option<String>, TokenValidationError> {
    match auth_header {
        Some(header) => header
            .strip_prefix("Bearer ")
            .map(|token| Some(token.trim().to_string()))
            .ok_or(TokenValidationError::InvalidScheme),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;

    fn store_with_scheduler() -> SqliteStore {
        let store = SqliteStore::in_memory().unwrap();
        store.initialize().unwrap();
        store
            .create_scheduler(&Scheduler {
                id: "s1".to_string(),
                name: "Acme".to_string(),
                created_at: Utc::now(),
            })
            .unwrap();
        store
    }

    #[test]
    fn test_issued_token_validates() {
        let store = store_with_scheduler();
        let raw = issue_scheduler_token(&store, "s1").unwrap();

        let scheduler = validate_token(&store, &raw).unwrap();
        assert_eq!(scheduler.id, "s1");
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let store = store_with_scheduler();
        let raw = issue_scheduler_token(&store, "s1").unwrap();
        let tampered = format!("{}0", &raw[..raw.len() - 1]);
        let tampered = if tampered == raw {
            format!("{}1", &raw[..raw.len() - 1])
        } else {
            tampered
        };

        assert!(matches!(
            validate_token(&store, &tampered),
            Err(TokenValidationError::InvalidToken)
        ));
    }

    #[test]
    fn test_unreadable_stored_hash_is_internal_error() {
        let store = store_with_scheduler();
        let minted = MintedCredential::mint().unwrap();
        store
            .create_scheduler_token(&SchedulerToken {
                id: "t1".to_string(),
                token_hash: "not-a-phc-string".to_string(),
                token_lookup: minted.lookup.clone(),
                scheduler_id: "s1".to_string(),
                created_at: Utc::now(),
                last_used_at: None,
            })
            .unwrap();

        assert!(matches!(
            validate_token(&store, &minted.raw),
            Err(TokenValidationError::InternalError)
        ));
        assert!(matches!(
            validate_token(&store, "shiftpoll_nothex"),
            Err(TokenValidationError::InvalidToken)
        ));
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(
            extract_token_from_header(Some("Bearer abc")).unwrap(),
            Some("abc".to_string())
        );
        assert!(extract_token_from_header(None).unwrap().is_none());
        assert!(matches!(
            extract_token_from_header(Some("Basic abc")),
            Err(TokenValidationError::InvalidScheme)
        ));
    }
}
