use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::{DebateError, Result};
use crate::schema::{Argument, Verdict};

/// Model requested when the caller does not name one.
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// Language of all natural-language output fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ru,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ru => "ru",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// The three debate roles, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Agent {
    /// Advocate for the decision.
    Pro,
    /// Advocate against the decision.
    Con,
    /// Arbiter weighing both sides.
    Judge,
}

impl Agent {
    pub const ALL: [Agent; 3] = [Agent::Pro, Agent::Con, Agent::Judge];

    pub fn as_str(self) -> &'static str {
        match self {
            Agent::Pro => "pro",
            Agent::Con => "con",
            Agent::Judge => "judge",
        }
    }
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input to a debate.
///
/// Deserializes from `{"decision": ..., "context": ..., "model": ..., "language": ...}`
/// with every field but `decision` optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateRequest {
    /// The decision under analysis.
    pub decision: String,

    /// Free-form context and constraints. Default: empty.
    #[serde(default)]
    pub context: String,

    /// Model tried first. Default: [`DEFAULT_MODEL`].
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default)]
    pub language: Language,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl DebateRequest {
    pub fn new(decision: impl Into<String>) -> Self {
        Self {
            decision: decision.into(),
            context: String::new(),
            model: default_model(),
            language: Language::En,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Reject a request no stage could act on.
    pub fn validate(&self) -> Result<()> {
        if self.decision.trim().is_empty() {
            return Err(DebateError::InvalidConfig("decision must not be blank".into()));
        }
        Ok(())
    }
}

/// Where a debate stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelinePhase {
    #[default]
    Start,
    ProCompleted,
    ConCompleted,
    JudgeCompleted,
}

impl PipelinePhase {
    /// The role that runs from this phase, or `None` once terminal.
    pub fn next_agent(self) -> Option<Agent> {
        match self {
            PipelinePhase::Start => Some(Agent::Pro),
            PipelinePhase::ProCompleted => Some(Agent::Con),
            PipelinePhase::ConCompleted => Some(Agent::Judge),
            PipelinePhase::JudgeCompleted => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == PipelinePhase::JudgeCompleted
    }
}

/// The validated product of one stage.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutput {
    Pro(Vec<Argument>),
    Con(Vec<Argument>),
    Judge(Verdict),
}

impl StageOutput {
    pub fn agent(&self) -> Agent {
        match self {
            StageOutput::Pro(_) => Agent::Pro,
            StageOutput::Con(_) => Agent::Con,
            StageOutput::Judge(_) => Agent::Judge,
        }
    }

    /// JSON form: the argument list for advocates, the verdict object for the judge.
    pub fn to_value(&self) -> Result<Value> {
        let value = match self {
            StageOutput::Pro(args) | StageOutput::Con(args) => serde_json::to_value(args)?,
            StageOutput::Judge(verdict) => serde_json::to_value(verdict)?,
        };
        Ok(value)
    }
}

/// State threaded through the three stages.
///
/// Each stage writes only its own field. A state in
/// [`PipelinePhase::JudgeCompleted`] always carries both argument lists and
/// the verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineState {
    pub decision: String,
    pub context: String,
    pub model: String,
    pub language: Language,
    #[serde(default)]
    pub pro_arguments: Vec<Argument>,
    #[serde(default)]
    pub con_arguments: Vec<Argument>,
    #[serde(default)]
    pub verdict: Option<Verdict>,
    #[serde(default)]
    pub phase: PipelinePhase,
}

impl PipelineState {
    /// Empty state at [`PipelinePhase::Start`].
    pub fn new(request: &DebateRequest) -> Self {
        Self {
            decision: request.decision.clone(),
            context: request.context.clone(),
            model: request.model.clone(),
            language: request.language,
            pro_arguments: Vec::new(),
            con_arguments: Vec::new(),
            verdict: None,
            phase: PipelinePhase::Start,
        }
    }

    /// Record a stage's output and advance the phase.
    ///
    /// Fails if the output is not from the role the current phase expects.
    pub fn apply(&mut self, output: StageOutput) -> Result<()> {
        let expected = self.phase.next_agent();
        if expected != Some(output.agent()) {
            return Err(DebateError::Other(format!(
                "{} output cannot be applied in phase {:?}",
                output.agent(),
                self.phase
            )));
        }
        match output {
            StageOutput::Pro(args) => {
                self.pro_arguments = args;
                self.phase = PipelinePhase::ProCompleted;
            }
            StageOutput::Con(args) => {
                self.con_arguments = args;
                self.phase = PipelinePhase::ConCompleted;
            }
            StageOutput::Judge(verdict) => {
                self.verdict = Some(verdict);
                self.phase = PipelinePhase::JudgeCompleted;
            }
        }
        Ok(())
    }
}
