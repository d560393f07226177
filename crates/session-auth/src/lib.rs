//! Session authentication primitives
//!
//! Provides the bearer credential type, credential stores, and the client for
//! the remote `/api/auth/*` endpoints. The refresh coordination that ties
//! these together lives in `refresh-guard`; this crate has no policy of its
//! own and can be used and tested independently.
//!
//! Credential flow:
//! 1. `AuthApi::login()` / `AuthApi::register()` returns an access token
//! 2. The token is stored via `CredentialStore::set()`
//! 3. Outgoing requests read it back with `CredentialStore::get()`
//! 4. On expiry, `AuthApi::refresh()` trades the HTTP-only refresh cookie
//!    for a new access token, which replaces the stored one
//! 5. `AuthApi::logout()` revokes the cookie; `CredentialStore::clear()`
//!    drops the local token

pub mod api;
pub mod constants;
pub mod credentials;
pub mod error;

pub use api::{
    AuthApi, AuthClient, AuthResponse, ForgotPasswordPayload, LoginPayload, OkResponse,
    RegisterPayload, ResetPasswordPayload,
};
pub use constants::*;
pub use credentials::{Credential, CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use error::{Error, Result};
