//! # Session State
//!
//! The operator roster and who is at the register right now.
//!
//! Identity is a selection from the roster, not a login. The ledger only
//! ever sees the selected operator's id, which it copies into audit records
//! and transactions. Admins may also manage inventory and rates.

use std::sync::Arc;

use bodega_core::{validation, Operator, Role};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug)]
struct Session {
    roster: Vec<Operator>,
    current: Option<String>,
}

/// Shared handle to the operator roster and current selection.
#[derive(Debug, Clone)]
pub struct SessionState {
    inner: Arc<RwLock<Session>>,
}

impl SessionState {
    /// A session over `roster` with the first operator selected.
    pub fn new(roster: Vec<Operator>) -> Self {
        let current = roster.first().map(|op| op.id.clone());
        SessionState {
            inner: Arc::new(RwLock::new(Session { roster, current })),
        }
    }

    pub async fn roster(&self) -> Vec<Operator> {
        self.inner.read().await.roster.clone()
    }

    pub async fn current(&self) -> Option<Operator> {
        let session = self.inner.read().await;
        let id = session.current.as_deref()?;
        session.roster.iter().find(|op| op.id == id).cloned()
    }

    /// Makes `operator_id` the acting operator.
    pub async fn select(&self, operator_id: &str) -> Result<Operator, ApiError> {
        let mut session = self.inner.write().await;
        let operator = session
            .roster
            .iter()
            .find(|op| op.id == operator_id)
            .cloned()
            .ok_or_else(|| ApiError::not_found("Operator", operator_id))?;
        session.current = Some(operator.id.clone());
        info!(operator = %operator.name, "Operator selected");
        Ok(operator)
    }

    pub async fn sign_out(&self) {
        self.inner.write().await.current = None;
    }

    /// Adds an operator to the roster under a fresh id.
    pub async fn add_operator(&self, name: &str, role: Role) -> Result<Operator, ApiError> {
        validation::validate_item_name(name).map_err(|_| ApiError::validation("operator name is required"))?;
        let operator = Operator {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            role,
        };
        self.inner.write().await.roster.push(operator.clone());
        info!(operator = %operator.name, role = ?role, "Operator added");
        Ok(operator)
    }

    /// The acting operator, or `Forbidden` when nobody is selected.
    pub async fn require_current(&self) -> Result<Operator, ApiError> {
        self.current()
            .await
            .ok_or_else(|| ApiError::forbidden("No operator selected"))
    }

    /// The acting operator when it is an admin.
    pub async fn require_elevated(&self) -> Result<Operator, ApiError> {
        let operator = self.require_current().await?;
        if !operator.is_elevated() {
            return Err(ApiError::forbidden(format!(
                "{} may not perform this operation",
                operator.name
            )));
        }
        Ok(operator)
    }
}

impl Default for SessionState {
    /// One admin and one sales clerk, admin selected.
    fn default() -> Self {
        SessionState::new(vec![
            Operator {
                id: "1".to_string(),
                name: "Administrador Principal".to_string(),
                role: Role::Admin,
            },
            Operator {
                id: "2".to_string(),
                name: "Vendedor 1".to_string(),
                role: Role::User,
            },
        ])
    }
}
