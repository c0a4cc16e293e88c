//! Authentication and authorization
//!
//! Credential extraction, identity-service verification and role checks.
//! All decisions are made per request; no identities or roles are cached.

pub mod credentials;
pub mod roles;
pub mod verify;

pub use credentials::Credential;
pub use roles::RoleChecker;
pub use verify::AuthVerifier;
