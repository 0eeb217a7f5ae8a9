//! Credential providers for the agents service.
//!
//! The core only needs a bearer token on demand; where it comes from is up to
//! the [`CredentialProvider`] in use.

pub mod credential;
pub mod token;

pub use credential::{
    AzureCliCredential, CachedCredential, ChainedCredential, CredentialProvider, EnvCredential,
    StaticCredential, DEFAULT_SCOPE, TOKEN_ENV_VAR,
};
pub use token::AccessToken;
