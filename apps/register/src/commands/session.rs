//! # Session Commands
//!
//! Thin wrappers over [`SessionState`] so the presentation layer has one
//! place to call.

use bodega_core::{Operator, Role};
use tracing::debug;

use crate::error::ApiError;
use crate::state::SessionState;

pub async fn list_operators(session: &SessionState) -> Vec<Operator> {
    session.roster().await
}

pub async fn current_operator(session: &SessionState) -> Option<Operator> {
    session.current().await
}

pub async fn select_operator(session: &SessionState, operator_id: &str) -> Result<Operator, ApiError> {
    debug!(operator = %operator_id, "select_operator command");
    session.select(operator_id).await
}

/// Adds an operator to the roster. Admins only.
pub async fn add_operator(
    session: &SessionState,
    name: &str,
    role: Role,
) -> Result<Operator, ApiError> {
    session.require_elevated().await?;
    session.add_operator(name, role).await
}

pub async fn sign_out(session: &SessionState) {
    debug!("sign_out command");
    session.sign_out().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[tokio::test]
    async fn test_only_admins_grow_the_roster() {
        let session = SessionState::default();

        let added = add_operator(&session, "Vendedor 2", Role::User).await.unwrap();
        assert_eq!(list_operators(&session).await.len(), 3);

        select_operator(&session, &added.id).await.unwrap();
        let err = add_operator(&session, "Vendedor 3", Role::User).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        sign_out(&session).await;
        assert!(current_operator(&session).await.is_none());
    }
}
