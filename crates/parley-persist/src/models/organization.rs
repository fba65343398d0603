use chrono::{DateTime, Utc};
use parley_agent::AgentTuning;
use serde::{Deserialize, Serialize};

/// Tenant record
///
/// Read-only from this service's perspective; organization CRUD lives with an
/// external collaborator. The optional agent tuning feeds the gateway
/// registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentTuning>,
    pub created_at: DateTime<Utc>,
}
