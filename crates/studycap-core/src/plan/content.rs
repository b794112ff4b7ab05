//! Content-source seam
//!
//! Task titles and descriptions come from an external collaborator (in
//! production a language model). The engine only decides distribution, so
//! the collaborator is injected behind [`ContentSource`].

use serde::{Deserialize, Deserializer, Serialize};

/// Failures of the content collaborator
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContentError {
    /// The response could not be decoded
    #[error("Malformed content response: {0}")]
    Malformed(String),
    /// The collaborator refused or failed
    #[error("Content source unavailable: {0}")]
    Unavailable(String),
}

/// Why content is being requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlanMode {
    /// A brand-new plan
    #[default]
    Generate,
    /// Regenerating the rest of a plan the learner is struggling with
    Replan,
}

/// What the content collaborator is asked for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRequest {
    /// Learner's goal
    pub goal: String,
    /// Days the proposals should span
    pub duration_days: u32,
    /// Topics to prioritize, most pressing first
    pub weak_topics: Vec<String>,
    /// Fresh plan or replan
    pub mode: PlanMode,
}

/// One task suggested by the content collaborator.
///
/// Field names follow the collaborator's wire format (`type`,
/// `timeMinutes`). Day and type are hints; the allocator decides both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskProposal {
    /// Suggested day (ordering hint only)
    #[serde(default, deserialize_with = "lenient_positive")]
    pub day: Option<u32>,
    /// Short title
    pub title: String,
    /// What to do
    #[serde(default)]
    pub description: String,
    /// Suggested type name
    #[serde(rename = "type", default)]
    pub task_type: Option<String>,
    /// Suggested minutes
    #[serde(default, deserialize_with = "lenient_positive")]
    pub time_minutes: Option<u32>,
    /// Topic covered
    #[serde(default)]
    pub topic: Option<String>,
}

impl TaskProposal {
    /// A proposal with just a title
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

/// Supplies task proposals for a plan
pub trait ContentSource {
    /// Propose tasks for `request`
    fn propose(&self, request: &ContentRequest) -> Result<Vec<TaskProposal>, ContentError>;
}

impl<F> ContentSource for F
where
    F: Fn(&ContentRequest) -> Result<Vec<TaskProposal>, ContentError>,
{
    fn propose(&self, request: &ContentRequest) -> Result<Vec<TaskProposal>, ContentError> {
        self(request)
    }
}

/// Returns the same proposals for every request
#[derive(Debug, Clone, Default)]
pub struct StaticContentSource {
    proposals: Vec<TaskProposal>,
}

impl StaticContentSource {
    /// Wrap a fixed list
    pub fn new(proposals: Vec<TaskProposal>) -> Self {
        Self { proposals }
    }

    /// Decode a collaborator response once and serve it
    pub fn from_response(text: &str) -> Result<Self, ContentError> {
        Ok(Self::new(parse_content_response(text)?))
    }
}

impl ContentSource for StaticContentSource {
    fn propose(&self, _request: &ContentRequest) -> Result<Vec<TaskProposal>, ContentError> {
        Ok(self.proposals.clone())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ContentResponse {
    Document { tasks: Vec<TaskProposal> },
    List(Vec<TaskProposal>),
}

/// Decode a collaborator response.
///
/// Accepts `{"tasks": [...]}` (other top-level keys such as `plan` are
/// ignored) or a bare task array, optionally wrapped in a markdown code
/// fence.
pub fn parse_content_response(text: &str) -> Result<Vec<TaskProposal>, ContentError> {
    let body = strip_code_fence(text).trim();
    if body.is_empty() {
        return Err(ContentError::Malformed("empty response".to_string()));
    }
    match serde_json::from_str::<ContentResponse>(body) {
        Ok(ContentResponse::Document { tasks }) | Ok(ContentResponse::List(tasks)) => Ok(tasks),
        Err(e) => Err(ContentError::Malformed(e.to_string())),
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(start) = text.find("```") else {
        return text;
    };
    let after = &text[start + 3..];
    // Skip an info string such as `json`
    let after = match after.find('\n') {
        Some(newline) if after[..newline].trim().chars().all(|c| c.is_ascii_alphanumeric()) => {
            &after[newline + 1..]
        }
        _ => after,
    };
    match after.find("```") {
        Some(end) => &after[..end],
        None => after,
    }
}

/// Positive integers pass through; zero, negatives, fractions round or drop
fn lenient_positive<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value.and_then(|v| {
        let rounded = v.round();
        (rounded >= 1.0 && rounded <= f64::from(u32::MAX)).then_some(rounded as u32)
    }))
}
