//! Supplier identity resolution.

use marketplace::{MarketplaceClient, RemoteId, Transport};
use serde::Deserialize;

use crate::error::DomainError;

/// Who is bidding: the authenticated company and its supplier record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub company_id: RemoteId,
    pub supplier_id: RemoteId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthenticationCheck {
    #[serde(default)]
    is_authenticated: Option<bool>,
    #[serde(default)]
    user: Option<AuthenticatedUser>,
}

#[derive(Debug, Deserialize)]
struct AuthenticatedUser {
    #[serde(default)]
    company: Option<CompanyRef>,
}

#[derive(Debug, Deserialize)]
struct CompanyRef {
    #[serde(default)]
    id: Option<RemoteId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompanyRecord {
    #[serde(default)]
    supplier_id: Option<RemoteId>,
}

/// Turns a credential into a supplier id with two chained lookups.
pub struct IdentityResolver<'a, T: Transport> {
    client: &'a MarketplaceClient<T>,
}

impl<'a, T: Transport> IdentityResolver<'a, T> {
    pub fn new(client: &'a MarketplaceClient<T>) -> Self {
        Self { client }
    }

    /// Resolves the company and supplier ids behind the client's credential.
    ///
    /// Stops at the first failure; the company lookup is never issued for a
    /// credential the authentication check rejects.
    #[tracing::instrument(skip(self))]
    pub async fn resolve(&self) -> Result<Identity, DomainError> {
        let response = self.client.check_authentication().await?;
        let check: AuthenticationCheck = response.json()?;

        if !response.is_ok() || check.is_authenticated != Some(true) {
            return Err(DomainError::AuthFailure(format!(
                "status {}: {}",
                response.status,
                response.body_excerpt()
            )));
        }

        let company_id = check
            .user
            .and_then(|user| user.company)
            .and_then(|company| company.id)
            .filter(|id| !id.is_blank())
            .ok_or_else(|| {
                DomainError::AuthFailure("authenticated user has no company".to_string())
            })?;
        tracing::info!(%company_id, "company resolved");

        let response = self.client.company(&company_id).await?;
        let record: CompanyRecord = response.json()?;

        if !response.is_ok() {
            return Err(DomainError::IdentityNotFound(format!(
                "company {company_id} lookup returned status {}",
                response.status
            )));
        }

        let supplier_id = record
            .supplier_id
            .filter(|id| !id.is_blank())
            .ok_or_else(|| {
                DomainError::IdentityNotFound(format!("company {company_id} has no supplierId"))
            })?;
        tracing::info!(%supplier_id, "supplier resolved");

        Ok(Identity {
            company_id,
            supplier_id,
        })
    }
}
