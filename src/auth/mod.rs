mod credential;
mod helpers;
mod middleware;

pub use helpers::issue_scheduler_token;
pub use middleware::{AuthError, RequireScheduler};
pub use credential::{CredentialParts, MintedCredential, split_credential, verify_credential};
