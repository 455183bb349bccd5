use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Gözlemlenen dört kaynak kategorisi.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Nodes,
    Pods,
    Services,
    Deployments,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Nodes,
        ResourceKind::Pods,
        ResourceKind::Services,
        ResourceKind::Deployments,
    ];

    pub fn plural(&self) -> &'static str {
        match self {
            ResourceKind::Nodes => "nodes",
            ResourceKind::Pods => "pods",
            ResourceKind::Services => "services",
            ResourceKind::Deployments => "deployments",
        }
    }

    /// Node'lar cluster kapsamındadır, diğerleri namespace'lidir.
    pub fn namespaced(&self) -> bool {
        !matches!(self, ResourceKind::Nodes)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.plural())
    }
}

/// Bir kategorinin son sorgu sonucu: ya veri ya hata, ikisi aynı anda asla.
#[derive(Serialize, Clone, Debug)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FetchState {
    Ready { items: Vec<Value> },
    Failed { error: String },
}

#[derive(Serialize, Clone, Debug)]
pub struct ResourceSnapshot {
    pub kind: ResourceKind,
    #[serde(flatten)]
    pub state: FetchState,
}

impl ResourceSnapshot {
    pub fn ready(kind: ResourceKind, items: Vec<Value>) -> Self {
        Self { kind, state: FetchState::Ready { items } }
    }

    pub fn failed(kind: ResourceKind, error: impl Into<String>) -> Self {
        Self { kind, state: FetchState::Failed { error: error.into() } }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, FetchState::Ready { .. })
    }

    pub fn items(&self) -> &[Value] {
        match &self.state {
            FetchState::Ready { items } => items,
            FetchState::Failed { .. } => &[],
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            FetchState::Ready { .. } => None,
            FetchState::Failed { error } => Some(error),
        }
    }
}

/// Yayınlandıktan sonra değişmez; güncelleme her zaman yeni örnek yayınlar.
#[derive(Serialize, Clone, Debug)]
pub struct ClusterSnapshot {
    pub resources: BTreeMap<ResourceKind, ResourceSnapshot>,
    pub observed_at: DateTime<Utc>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct ActionRequest {
    #[serde(rename = "type", default)]
    pub resource_type: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub name: String,
}

/// API sınırından dönen kararlı hata kodları.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionCode {
    ValidationError,
    UnsupportedType,
    NotFound,
    CommandFailed,
    ParseError,
    Timeout,
}

#[derive(Serialize, Clone, Debug)]
pub struct ActionResult {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ActionCode>,
}

impl ActionResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self { ok: true, message: Some(message.into()), error: None, code: None }
    }

    pub fn failure(code: ActionCode, error: impl Into<String>) -> Self {
        Self { ok: false, message: None, error: Some(error.into()), code: Some(code) }
    }
}
