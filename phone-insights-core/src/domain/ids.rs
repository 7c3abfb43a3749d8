use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Newtype pattern for PredictionId
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct PredictionId(pub Uuid);

impl PredictionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PredictionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PredictionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for PredictionId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<PredictionId> for Uuid {
    fn from(id: PredictionId) -> Self {
        id.0
    }
}
