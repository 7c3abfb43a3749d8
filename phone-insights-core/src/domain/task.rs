use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// The kind of prediction requested from the upstream service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Price,
    Ram,
    Battery,
    Brand,
    Advanced,
}

impl TaskType {
    pub const ALL: [TaskType; 5] = [
        TaskType::Price,
        TaskType::Ram,
        TaskType::Battery,
        TaskType::Brand,
        TaskType::Advanced,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Price => "price",
            TaskType::Ram => "ram",
            TaskType::Battery => "battery",
            TaskType::Brand => "brand",
            TaskType::Advanced => "advanced",
        }
    }

    /// Path of the upstream endpoint serving this task.
    pub fn upstream_path(&self) -> String {
        format!("/api/predict/{}", self.as_str())
    }

    /// Field name the upstream (and our routes) report the predicted value under.
    pub fn response_field(&self) -> &'static str {
        match self {
            TaskType::Advanced => "prediction",
            other => other.as_str(),
        }
    }

    /// Whether the predicted value is a number rather than a label.
    pub fn is_numeric(&self) -> bool {
        !matches!(self, TaskType::Brand)
    }

    /// Input fields the upstream model for this task consumes.
    pub fn expected_fields(&self) -> &'static [&'static str] {
        match self {
            TaskType::Price => &["ram", "battery", "screenSize", "weight", "year", "brand"],
            TaskType::Ram => &["battery", "screenSize", "weight", "year", "price", "brand"],
            TaskType::Battery => &["ram", "screenSize", "weight", "year", "price", "brand"],
            TaskType::Brand => &["ram", "battery", "screenSize", "weight", "year", "price"],
            TaskType::Advanced => &[
                "price",
                "ram",
                "battery",
                "storage",
                "screenSize",
                "camera",
                "weight",
                "year",
                "brand",
            ],
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskType::ALL
            .into_iter()
            .find(|task| task.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::Validation(format!("unknown task type '{}'", s)))
    }
}
