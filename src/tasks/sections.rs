//! Task 2: extraction of the seven key legislative categories.

use super::{Task, TaskOutcome};
use crate::error::TaskError;
use crate::pipeline::gateway::ModelGateway;
use crate::prompts::{key_sections_prompt, key_sections_schema};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Message stored in the failure shape of [`KeySectionsSlot`].
pub const SECTIONS_FAILURE: &str = "Could not extract key sections.";

/// The seven categories; each is free text or `"Not Found in Text"`.
///
/// Deserialization fails unless every field is present, so a partial set of
/// categories is never accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySections {
    pub definitions: String,
    pub obligations: String,
    pub responsibilities: String,
    pub eligibility: String,
    pub payments: String,
    pub penalties: String,
    pub record_keeping: String,
}

/// What the report stores under `task_2_key_sections`.
///
/// Serializes untagged: either the seven fields, or exactly one `"error"` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeySectionsSlot {
    Extracted(KeySections),
    Failed { error: String },
}

impl KeySectionsSlot {
    /// The failure shape used when the extraction task fails.
    pub fn failed() -> Self {
        KeySectionsSlot::Failed {
            error: SECTIONS_FAILURE.to_string(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, KeySectionsSlot::Failed { .. })
    }

    pub fn sections(&self) -> Option<&KeySections> {
        match self {
            KeySectionsSlot::Extracted(s) => Some(s),
            KeySectionsSlot::Failed { .. } => None,
        }
    }
}

/// Ask for the seven categories as one JSON object.
pub async fn extract_key_sections(
    gateway: &ModelGateway,
    text: &str,
    max_chars: usize,
) -> TaskOutcome<KeySections> {
    info!("Starting task: key section extraction");
    match gateway
        .request::<KeySections>(key_sections_prompt(text, max_chars), key_sections_schema())
        .await
    {
        Ok(reply) => TaskOutcome {
            task: Task::KeySections,
            result: Ok(reply.value),
            input_tokens: reply.input_tokens,
            output_tokens: reply.output_tokens,
        },
        Err(e) => TaskOutcome::failed(Task::KeySections, TaskError::gateway("key sections", e)),
    }
}
