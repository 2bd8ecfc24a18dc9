//! Scheduler API credentials of the form `shiftpoll_<lookup>_<secret>`.
//!
//! The lookup half is stored in clear so the row can be found without
//! hashing; the database only ever holds an Argon2id hash of the whole
//! credential.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::Rng;

use crate::error::{Error, Result};

const PREFIX: &str = "shiftpoll";
const LOOKUP_BYTES: usize = 4;
const SECRET_BYTES: usize = 12;

/// Argon2id, 64 MiB, one pass, four lanes, 32-byte output.
fn hasher() -> Result<Argon2<'static>> {
    let params = Params::new(64 * 1024, 1, 4, Some(32))
        .map_err(|e| Error::Config(format!("argon2 parameters rejected: {e}")))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

fn random_hex<const N: usize>() -> String {
    let mut bytes = [0u8; N];
    rand::thread_rng().fill(&mut bytes[..]);
    hex::encode(bytes)
}

/// A freshly minted credential. Only `lookup` and `hash` are persisted.
#[derive(Debug)]
pub struct MintedCredential {
    pub raw: String,
    pub lookup: String,
    pub hash: String,
}

impl MintedCredential {
    pub fn mint() -> Result<Self> {
        let lookup = random_hex::<LOOKUP_BYTES>();
        let raw = format!("{PREFIX}_{lookup}_{}", random_hex::<SECRET_BYTES>());

        let salt = SaltString::generate(&mut OsRng);
        let hash = hasher()?
            .hash_password(raw.as_bytes(), &salt)
            .map_err(|e| Error::Config(format!("failed to hash credential: {e}")))?
            .to_string();

        Ok(Self { raw, lookup, hash })
    }
}

/// The halves of a presented credential, borrowed from the raw string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialParts<'a> {
    pub lookup: &'a str,
    pub secret: &'a str,
}

/// Splits `raw` into its lookup and secret. Both halves must be lowercase
/// hex of the minted length.
pub fn split_credential(raw: &str) -> Result<CredentialParts<'_>> {
    let (lookup, secret) = raw
        .strip_prefix(PREFIX)
        .and_then(|rest| rest.strip_prefix('_'))
        .and_then(|rest| rest.split_once('_'))
        .ok_or(Error::InvalidTokenFormat)?;

    let hex_of = |s: &str, bytes: usize| {
        s.len() == bytes * 2 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    };
    if !hex_of(lookup, LOOKUP_BYTES) || !hex_of(secret, SECRET_BYTES) {
        return Err(Error::InvalidTokenFormat);
    }

    Ok(CredentialParts { lookup, secret })
}

/// True when `raw` hashes to `stored`. A stored value that is not a PHC
/// string is an error, not a mismatch.
pub fn verify_credential(raw: &str, stored: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored)
        .map_err(|e| Error::Config(format!("stored credential hash unreadable: {e}")))?;

    match hasher()?.verify_password(raw.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(Error::Config(format!("failed to verify credential: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minted_credential_splits_back() {
        let minted = MintedCredential::mint().unwrap();
        let parts = split_credential(&minted.raw).unwrap();

        assert_eq!(parts.lookup, minted.lookup);
        assert_eq!(parts.lookup.len(), 8);
        assert_eq!(parts.secret.len(), 24);
        assert!(!minted.hash.contains(parts.secret));
    }

    #[test]
    fn test_hash_records_pinned_parameters() {
        let minted = MintedCredential::mint().unwrap();
        assert!(
            minted.hash.starts_with("$argon2id$v=19$m=65536,t=1,p=4$"),
            "{}",
            minted.hash
        );
    }

    #[test]
    fn test_verify_distinguishes_mismatch_from_corruption() {
        let minted = MintedCredential::mint().unwrap();
        assert!(verify_credential(&minted.raw, &minted.hash).unwrap());

        let other = MintedCredential::mint().unwrap();
        assert!(!verify_credential(&other.raw, &minted.hash).unwrap());

        assert!(matches!(
            verify_credential(&minted.raw, "plaintext"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_split_rejects_malformed() {
        let good = "shiftpoll_0123abcd_0123456789abcdef01234567";
        assert_eq!(
            split_credential(good).unwrap(),
            CredentialParts {
                lookup: "0123abcd",
                secret: "0123456789abcdef01234567",
            }
        );

        for bad in [
            "cutover_0123abcd_0123456789abcdef01234567",
            "shiftpoll0123abcd_0123456789abcdef01234567",
            "shiftpoll_0123abcd",
            "shiftpoll_0123abc_0123456789abcdef01234567",
            "shiftpoll_0123abcd_0123456789abcdef0123456",
            "shiftpoll_0123ABCD_0123456789abcdef01234567",
            "shiftpoll_0123abcd_0123456789abcdef0123456z",
            "shiftpoll_0123abcd_0123456789abcdef_1234567",
        ] {
            assert!(
                matches!(split_credential(bad), Err(Error::InvalidTokenFormat)),
                "{bad}"
            );
        }
    }
}
