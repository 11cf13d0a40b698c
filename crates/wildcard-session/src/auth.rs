//! The authentication seam.
//!
//! Wildcard never validates credentials itself. The embedder implements
//! [`Authenticator`] (JWT check, auth-service call, or a dev stub) and
//! the server invokes it once per handshake.

use wildcard_protocol::PlayerId;

use crate::SessionError;

/// Turns a handshake credential into a player identity.
///
/// `Send + Sync + 'static` because the server shares one instance across
/// all connection tasks for its whole lifetime.
///
/// ```rust
/// use wildcard_protocol::PlayerId;
/// use wildcard_session::{Authenticator, SessionError};
///
/// /// Development-only: the token is the player id in decimal.
/// struct DevAuth;
///
/// impl Authenticator for DevAuth {
///     async fn authenticate(
///         &self,
///         token: &str,
///     ) -> Result<PlayerId, SessionError> {
///         let id = token.parse().map_err(|_| {
///             SessionError::AuthFailed("token must be a number".into())
///         })?;
///         Ok(PlayerId(id))
///     }
/// }
/// ```
pub trait Authenticator: Send + Sync + 'static {
    /// Validates `token`. `Err(AuthFailed)` closes the connection before
    /// any session is created.
    fn authenticate(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<PlayerId, SessionError>> + Send;
}
