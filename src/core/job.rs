use crate::errors::{Error, Result};
use crate::llm::{AdapterRequest, Attachments};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// What a dequeued job asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobAction {
    Run,
    Compare,
    Heartbeat,
}

/// One record as delivered by the intake queue
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub message_id: String,
    pub body: String,
}

impl RawRecord {
    pub fn new(message_id: &str, body: &str) -> Self {
        Self {
            message_id: message_id.to_string(),
            body: body.to_string(),
        }
    }
}

/// Job envelope as published by the chat front end
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobEnvelope {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_groups: Option<Vec<String>>,
    #[serde(default)]
    pub data: JobData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompts: Option<Map<String, Value>>,
    pub action: JobAction,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompts: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub videos: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_kwargs: Option<Map<String, Value>>,
}

impl JobEnvelope {
    /// Reads an envelope, unwrapping the notification wrapper when present
    ///
    /// # Errors
    /// * `MalformedEnvelope` when the body is not a valid envelope
    pub fn from_value(body: Value) -> Result<JobEnvelope> {
        match serde_json::from_value::<Notification>(body.clone()) {
            Ok(notification) => serde_json::from_str(&notification.message),
            Err(_) => serde_json::from_value(body),
        }
        .map_err(|e| Error::MalformedEnvelope(e.to_string()))
    }

    /// Returns the session id, generating and storing one when absent or empty
    pub fn ensure_session_id(&mut self) -> &str {
        let session_id = self.data.session_id.get_or_insert_with(String::new);
        if session_id.is_empty() {
            *session_id = uuid::Uuid::new_v4().to_string();
        }
        session_id.as_str()
    }
}

/// Notification wrapper some queues put around the envelope
#[derive(Deserialize)]
struct Notification {
    #[serde(rename = "Message")]
    message: String,
}

/// Prompt carried by a job
#[derive(Debug, Clone, PartialEq)]
pub enum PromptInput {
    Single(String),
    Many(Vec<String>),
    Empty,
}

/// Client addressed by notifications about a job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTarget {
    pub user_id: String,
    pub session_id: String,
}

/// A parsed unit of work; immutable once built
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: String,
    pub user_id: String,
    pub user_groups: BTreeSet<String>,
    pub session_id: String,
    pub action: JobAction,
    pub provider: Option<String>,
    pub model_id: Option<String>,
    /// Mode named by the envelope; resolved by the handler
    pub mode: Option<String>,
    pub prompt: PromptInput,
    pub model_kwargs: Map<String, Value>,
    pub workspace_id: Option<String>,
    pub attachments: Attachments,
    pub system_prompts: Map<String, Value>,
}

impl Job {
    /// Parses a queue record into a job
    ///
    /// The body is either the envelope itself or a `{"Message": "<envelope>"}` wrapper.
    ///
    /// # Errors
    /// * `MalformedEnvelope` when the body is not a valid envelope
    pub fn parse(record: &RawRecord) -> Result<Job> {
        let body: Value = serde_json::from_str(&record.body)
            .map_err(|e| Error::MalformedEnvelope(e.to_string()))?;

        Ok(Self::from_envelope(&record.message_id, JobEnvelope::from_value(body)?))
    }

    /// Builds a job from an envelope, generating a session id when none was given
    pub fn from_envelope(id: &str, mut envelope: JobEnvelope) -> Job {
        let session_id = envelope.ensure_session_id().to_string();
        let data = envelope.data;

        let prompt = match (data.prompts, data.text) {
            (Some(prompts), _) if envelope.action == JobAction::Compare => {
                PromptInput::Many(prompts)
            }
            (_, Some(text)) => PromptInput::Single(text),
            (Some(prompts), None) => PromptInput::Many(prompts),
            (None, None) => PromptInput::Empty,
        };

        Job {
            id: id.to_string(),
            user_id: envelope.user_id,
            user_groups: envelope.user_groups.unwrap_or_default().into_iter().collect(),
            session_id,
            action: envelope.action,
            provider: data.provider,
            model_id: data.model_name,
            mode: data.mode.filter(|m| !m.is_empty()),
            prompt,
            model_kwargs: data.model_kwargs.unwrap_or_default(),
            workspace_id: data.workspace_id,
            attachments: Attachments {
                images: data.images.unwrap_or_default(),
                documents: data.documents.unwrap_or_default(),
                videos: data.videos.unwrap_or_default(),
            },
            system_prompts: envelope.system_prompts.unwrap_or_default(),
        }
    }

    pub fn target(&self) -> SessionTarget {
        SessionTarget {
            user_id: self.user_id.clone(),
            session_id: self.session_id.clone(),
        }
    }

    pub fn user_groups(&self) -> Vec<String> {
        self.user_groups.iter().cloned().collect()
    }

    /// Adapter request for one prompt of this job
    pub fn adapter_request(&self, prompt: &str, attachments: Attachments) -> AdapterRequest {
        AdapterRequest {
            prompt: prompt.to_string(),
            workspace_id: self.workspace_id.clone(),
            user_groups: self.user_groups(),
            attachments,
            system_prompts: self.system_prompts.clone(),
        }
    }
}
