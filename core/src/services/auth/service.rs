//! Main authentication service implementation

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::entities::token::TokenPair;
use crate::errors::{AuthError, DomainError, TokenError};
use crate::repositories::IdentityDirectory;
use crate::services::token::TokenService;

use super::grant::TokenGrant;

/// Authentication service for the OAuth2 token endpoint and logout
pub struct AuthService {
    /// Token service for JWT management
    token_service: Arc<TokenService>,
    /// Directory used for credential checks and refresh lookups
    directory: Arc<dyn IdentityDirectory>,
}

impl AuthService {
    /// Create a new authentication service
    ///
    /// # Arguments
    ///
    /// * `token_service` - Service for JWT token management
    /// * `directory` - Identity directory
    pub fn new(token_service: Arc<TokenService>, directory: Arc<dyn IdentityDirectory>) -> Self {
        Self {
            token_service,
            directory,
        }
    }

    pub fn token_service(&self) -> &Arc<TokenService> {
        &self.token_service
    }

    /// Exchange a grant for a token pair
    ///
    /// # Returns
    ///
    /// * `Ok(TokenPair)` - Tokens issued
    /// * `Err(AuthError::InvalidCredentials)` - Password grant rejected
    /// * `Err(TokenError::InvalidRefreshToken)` - Refresh grant rejected, for
    ///   any reason
    /// * `Err(DomainError::Store)` - Backend failure
    pub async fn exchange(&self, grant: TokenGrant) -> Result<TokenPair, DomainError> {
        match grant {
            TokenGrant::Password { username, password } => {
                let Some(identity) = self.directory.authenticate(&username, &password).await? else {
                    debug!("Password grant rejected");
                    return Err(AuthError::InvalidCredentials.into());
                };

                let pair = self.token_service.issue(&identity).await?;
                info!(subject_id = %identity.subject_id, "Password grant succeeded");
                Ok(pair)
            }
            TokenGrant::RefreshToken { refresh_token } => self
                .token_service
                .refresh(&refresh_token, self.directory.as_ref())
                .await?
                .ok_or_else(|| TokenError::InvalidRefreshToken.into()),
        }
    }

    /// Revoke the caller's access token and, when supplied, a refresh token
    pub async fn logout(&self, access_token: &str, refresh_token: Option<&str>) -> Result<(), DomainError> {
        self.token_service.revoke(access_token).await?;

        if let Some(refresh_token) = refresh_token.filter(|t| !t.is_empty()) {
            self.token_service.revoke_refresh_token(refresh_token).await?;
        }

        Ok(())
    }
}
