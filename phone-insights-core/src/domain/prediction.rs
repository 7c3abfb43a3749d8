use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{
    ids::PredictionId,
    input::PredictionInput,
    output::PredictionOutput,
    task::TaskType,
};

/// A completed prediction: the input, what the upstream answered, and for
/// which task. Built once per request and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    id: PredictionId,
    task: TaskType,
    input: PredictionInput,
    output: PredictionOutput,
    created_at: DateTime<Utc>,
}

impl Prediction {
    pub fn new(task: TaskType, input: PredictionInput, output: PredictionOutput) -> Self {
        Self {
            id: PredictionId::new(),
            task,
            input,
            output,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> PredictionId {
        self.id
    }

    pub fn task(&self) -> TaskType {
        self.task
    }

    pub fn input(&self) -> &PredictionInput {
        &self.input
    }

    pub fn output(&self) -> &PredictionOutput {
        &self.output
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
