//! Typed response contracts for the three debate roles.
//!
//! Each type plays two parts: its `schemars` schema is sent to the
//! generation service (after [`sanitize_schema`](crate::output_parser::sanitize_schema)),
//! and its serde shape plus [`Validate`] impl are the strict local check on
//! whatever comes back.

use std::fmt;

use schemars::gen::SchemaSettings;
use schemars::JsonSchema;
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{DebateError, Result};

/// Evidence prefixes that mark an argument as resting on an assumption.
pub const ASSUMPTION_MARKERS: [&str; 2] = ["assumption:", "допущение:"];

/// Tolerance used when comparing scorecard weights.
pub const WEIGHT_TOLERANCE: f64 = 1e-3;

/// Post-deserialization contract checks.
///
/// Bounds and cardinalities fail with [`DebateError::Validation`], which the
/// generation client retries. Cross-field rule violations fail with
/// [`DebateError::Consistency`], which it does not.
pub trait Validate {
    /// Check the value against its contract.
    fn validate(&self) -> Result<()>;
}

/// A single argument produced by an advocate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Argument {
    /// The point being made.
    pub claim: String,
    /// Why the claim holds.
    pub reasoning: String,
    /// A fact or observation, or text prefixed with `assumption:` when no
    /// hard data exists.
    pub evidence: String,
    /// What could go wrong with this line of argument.
    pub risk: String,
    /// How strongly the advocate believes the argument holds, in `[0, 1]`.
    #[schemars(range(min = 0.0, max = 1.0))]
    pub confidence: f64,
}

impl Argument {
    /// Whether the evidence is marked as an assumption rather than data.
    pub fn is_assumption(&self) -> bool {
        let evidence = self.evidence.trim_start().to_lowercase();
        ASSUMPTION_MARKERS.iter().any(|m| evidence.starts_with(m))
    }
}

impl Validate for Argument {
    fn validate(&self) -> Result<()> {
        check_range("confidence", self.confidence, 0.0, 1.0)
    }
}

/// One side of the debate: 3 to 8 arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DebatePosition {
    #[schemars(length(min = 3, max = 8))]
    pub arguments: Vec<Argument>,
}

impl DebatePosition {
    pub const MIN_ARGUMENTS: usize = 3;
    pub const MAX_ARGUMENTS: usize = 8;
}

impl Validate for DebatePosition {
    fn validate(&self) -> Result<()> {
        check_len(
            "arguments",
            self.arguments.len(),
            Self::MIN_ARGUMENTS,
            Self::MAX_ARGUMENTS,
        )?;
        for (i, argument) in self.arguments.iter().enumerate() {
            argument.validate().map_err(|e| prefix(&format!("arguments[{i}]"), e))?;
        }
        Ok(())
    }
}

/// The fixed rubric the arbiter scores against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, JsonSchema)]
pub enum Criterion {
    #[serde(rename = "Feasibility")]
    Feasibility,
    #[serde(rename = "Cost/Time")]
    CostTime,
    #[serde(rename = "Risk/Uncertainty")]
    RiskUncertainty,
    #[serde(rename = "Reversibility")]
    Reversibility,
    #[serde(rename = "Expected value")]
    ExpectedValue,
    #[serde(rename = "Evidence quality")]
    EvidenceQuality,
    #[serde(rename = "Alignment with constraints")]
    ConstraintAlignment,
}

impl Criterion {
    /// All criteria, in rubric order.
    pub const ALL: [Criterion; 7] = [
        Criterion::Feasibility,
        Criterion::CostTime,
        Criterion::RiskUncertainty,
        Criterion::Reversibility,
        Criterion::ExpectedValue,
        Criterion::EvidenceQuality,
        Criterion::ConstraintAlignment,
    ];

    /// Canonical label, as it must appear in the scorecard.
    pub fn label(self) -> &'static str {
        match self {
            Criterion::Feasibility => "Feasibility",
            Criterion::CostTime => "Cost/Time",
            Criterion::RiskUncertainty => "Risk/Uncertainty",
            Criterion::Reversibility => "Reversibility",
            Criterion::ExpectedValue => "Expected value",
            Criterion::EvidenceQuality => "Evidence quality",
            Criterion::ConstraintAlignment => "Alignment with constraints",
        }
    }

    /// Rubric weight. The seven weights sum to 1.0.
    pub fn weight(self) -> f64 {
        match self {
            Criterion::Feasibility => 0.18,
            Criterion::CostTime => 0.16,
            Criterion::RiskUncertainty => 0.16,
            Criterion::Reversibility => 0.10,
            Criterion::ExpectedValue => 0.18,
            Criterion::EvidenceQuality => 0.12,
            Criterion::ConstraintAlignment => 0.10,
        }
    }

    /// Look up a criterion by label, ignoring case and surrounding whitespace.
    pub fn from_label(label: &str) -> Option<Self> {
        let wanted = normalize_label(label);
        Self::ALL
            .into_iter()
            .find(|c| normalize_label(c.label()) == wanted)
    }
}

fn normalize_label(label: &str) -> String {
    label
        .split('/')
        .map(|part| part.trim().to_lowercase())
        .collect::<Vec<_>>()
        .join("/")
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Criterion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Criterion::from_label(&label)
            .ok_or_else(|| de::Error::custom(format!("unknown scorecard criterion {label:?}")))
    }
}

/// One scored rubric row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ScorecardRow {
    pub criterion: Criterion,
    /// Rubric weight in `(0, 1]`; must match [`Criterion::weight`].
    #[schemars(range(max = 1.0))]
    pub weight: f64,
    #[schemars(range(min = 0.0, max = 10.0))]
    pub pro_score: f64,
    #[schemars(range(min = 0.0, max = 10.0))]
    pub con_score: f64,
    pub rationale: String,
}

impl Validate for ScorecardRow {
    fn validate(&self) -> Result<()> {
        if !(self.weight > 0.0 && self.weight <= 1.0) {
            return Err(DebateError::Validation(format!(
                "weight: {} is outside (0, 1]",
                self.weight
            )));
        }
        check_range("pro_score", self.pro_score, 0.0, 10.0)?;
        check_range("con_score", self.con_score, 0.0, 10.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Go,
    NoGo,
    ConditionalGo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    Pro,
    Con,
    Tie,
}

/// The arbiter's weighted verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Verdict {
    pub decision: Decision,
    pub winner: Winner,
    #[schemars(range(min = 0.0, max = 1.0))]
    pub confidence: f64,
    pub summary: String,
    #[schemars(length(min = 7, max = 7))]
    pub scorecard: Vec<ScorecardRow>,
    #[schemars(length(min = 2, max = 8))]
    pub key_risks: Vec<String>,
    #[schemars(length(min = 1, max = 8))]
    pub assumptions_to_verify: Vec<String>,
    #[schemars(length(min = 2, max = 8))]
    pub next_48h_actions: Vec<String>,
    pub needs_more_info: bool,
    #[serde(default)]
    #[schemars(length(max = 5))]
    pub clarifying_questions: Vec<String>,
}

impl Verdict {
    /// Weighted `(pro, con)` totals over the scorecard.
    pub fn weighted_totals(&self) -> (f64, f64) {
        self.scorecard.iter().fold((0.0, 0.0), |(pro, con), row| {
            (pro + row.weight * row.pro_score, con + row.weight * row.con_score)
        })
    }

    fn validate_scorecard(&self) -> Result<()> {
        check_len("scorecard", self.scorecard.len(), 7, 7)?;
        let mut seen = Vec::with_capacity(Criterion::ALL.len());
        for (i, row) in self.scorecard.iter().enumerate() {
            row.validate().map_err(|e| prefix(&format!("scorecard[{i}]"), e))?;
            if seen.contains(&row.criterion) {
                return Err(DebateError::Validation(format!(
                    "scorecard[{i}]: criterion {:?} appears more than once",
                    row.criterion.label()
                )));
            }
            if (row.weight - row.criterion.weight()).abs() > WEIGHT_TOLERANCE {
                return Err(DebateError::Validation(format!(
                    "scorecard[{i}]: weight {} for {:?} must be {}",
                    row.weight,
                    row.criterion.label(),
                    row.criterion.weight()
                )));
            }
            seen.push(row.criterion);
        }
        Ok(())
    }
}

impl Validate for Verdict {
    fn validate(&self) -> Result<()> {
        check_range("confidence", self.confidence, 0.0, 1.0)?;
        self.validate_scorecard()?;
        check_len("key_risks", self.key_risks.len(), 2, 8)?;
        check_len("assumptions_to_verify", self.assumptions_to_verify.len(), 1, 8)?;
        check_len("next_48h_actions", self.next_48h_actions.len(), 2, 8)?;
        check_len("clarifying_questions", self.clarifying_questions.len(), 0, 5)?;

        match (self.needs_more_info, self.clarifying_questions.is_empty()) {
            (true, true) => Err(DebateError::Consistency(
                "clarifying_questions must be provided when needs_more_info=true".into(),
            )),
            (false, false) => Err(DebateError::Consistency(
                "clarifying_questions must be empty when needs_more_info=false".into(),
            )),
            _ => Ok(()),
        }
    }
}

/// Build the JSON schema sent to the service for `T`.
///
/// Sub-schemas are inlined so the result has no `$ref`s. The schema is not
/// yet sanitized.
pub fn response_schema<T: JsonSchema>() -> Result<Value> {
    let generator = SchemaSettings::draft07()
        .with(|s| {
            s.inline_subschemas = true;
        })
        .into_generator();
    let root = generator.into_root_schema_for::<T>();
    Ok(serde_json::to_value(root)?)
}

fn check_range(field: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(DebateError::Validation(format!(
            "{field}: {value} is outside [{min}, {max}]"
        )))
    }
}

fn check_len(field: &str, len: usize, min: usize, max: usize) -> Result<()> {
    if (min..=max).contains(&len) {
        Ok(())
    } else if min == max {
        Err(DebateError::Validation(format!(
            "{field}: expected exactly {min} items, got {len}"
        )))
    } else {
        Err(DebateError::Validation(format!(
            "{field}: expected {min}-{max} items, got {len}"
        )))
    }
}

fn prefix(path: &str, err: DebateError) -> DebateError {
    match err {
        DebateError::Validation(msg) => DebateError::Validation(format!("{path}.{msg}")),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn argument(confidence: f64) -> Value {
        json!({
            "claim": "c",
            "reasoning": "r",
            "evidence": "assumption: demand exists",
            "risk": "k",
            "confidence": confidence
        })
    }

    fn scorecard() -> Vec<Value> {
        Criterion::ALL
            .iter()
            .map(|c| {
                json!({
                    "criterion": c.label(),
                    "weight": c.weight(),
                    "pro_score": 7.0,
                    "con_score": 4.0,
                    "rationale": "because"
                })
            })
            .collect()
    }

    fn verdict_json() -> Value {
        json!({
            "decision": "conditional_go",
            "winner": "pro",
            "confidence": 0.66,
            "summary": "Close call.",
            "scorecard": scorecard(),
            "key_risks": ["cash", "hiring"],
            "assumptions_to_verify": ["demand"],
            "next_48h_actions": ["call customers", "draft budget"],
            "needs_more_info": false,
            "clarifying_questions": []
        })
    }

    fn parse_verdict(value: Value) -> Result<Verdict> {
        let verdict: Verdict = serde_json::from_value(value)?;
        verdict.validate()?;
        Ok(verdict)
    }

    #[test]
    fn test_rubric_weights_sum_to_one() {
        let total: f64 = Criterion::ALL.iter().map(|c| c.weight()).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_position_bounds() {
        for n in 0..=10 {
            let position: DebatePosition = serde_json::from_value(json!({
                "arguments": (0..n).map(|_| argument(0.5)).collect::<Vec<_>>()
            }))
            .unwrap();
            let ok = position.validate().is_ok();
            assert_eq!(ok, (3..=8).contains(&n), "n = {n}");
        }
    }

    #[test]
    fn test_position_confidence_out_of_range() {
        let position: DebatePosition = serde_json::from_value(json!({
            "arguments": [argument(0.5), argument(1.2), argument(0.1)]
        }))
        .unwrap();
        let err = position.validate().unwrap_err();
        assert!(matches!(err, DebateError::Validation(ref m) if m.starts_with("arguments[1].confidence")));
    }

    #[test]
    fn test_position_rejects_unknown_fields() {
        let result: std::result::Result<DebatePosition, _> = serde_json::from_value(json!({
            "arguments": [argument(0.5)],
            "extra": true
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_assumption_marker() {
        let mut arg: Argument = serde_json::from_value(argument(0.5)).unwrap();
        assert!(arg.is_assumption());
        arg.evidence = "Допущение: спрос есть".into();
        assert!(arg.is_assumption());
        arg.evidence = "Revenue grew 12% last year".into();
        assert!(!arg.is_assumption());
    }

    #[test]
    fn test_valid_verdict() {
        let verdict = parse_verdict(verdict_json()).unwrap();
        assert_eq!(verdict.scorecard.len(), 7);
        let total: f64 = verdict.scorecard.iter().map(|r| r.weight).sum();
        assert!((total - 1.0).abs() < 1e-9);
        let (pro, con) = verdict.weighted_totals();
        assert!((pro - 7.0).abs() < 1e-9);
        assert!((con - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_criterion_label_is_case_insensitive() {
        let mut value = verdict_json();
        value["scorecard"][1]["criterion"] = json!("cost / time");
        let verdict = parse_verdict(value).unwrap();
        assert_eq!(verdict.scorecard[1].criterion, Criterion::CostTime);
        let out = serde_json::to_value(&verdict).unwrap();
        assert_eq!(out["scorecard"][1]["criterion"], "Cost/Time");
    }

    #[test]
    fn test_unknown_criterion_rejected() {
        let mut value = verdict_json();
        value["scorecard"][0]["criterion"] = json!("Vibes");
        assert!(parse_verdict(value).is_err());
    }

    #[test]
    fn test_duplicate_criterion_rejected() {
        let mut value = verdict_json();
        value["scorecard"][6] = value["scorecard"][0].clone();
        let err = parse_verdict(value).unwrap_err();
        assert!(matches!(err, DebateError::Validation(ref m) if m.contains("more than once")));
    }

    #[test]
    fn test_wrong_weight_rejected() {
        let mut value = verdict_json();
        value["scorecard"][3]["weight"] = json!(0.3);
        assert!(matches!(
            parse_verdict(value).unwrap_err(),
            DebateError::Validation(_)
        ));
    }

    #[test]
    fn test_scorecard_must_have_seven_rows() {
        let mut value = verdict_json();
        value["scorecard"].as_array_mut().unwrap().pop();
        let err = parse_verdict(value).unwrap_err();
        assert!(matches!(err, DebateError::Validation(ref m) if m.contains("exactly 7")));
    }

    #[test]
    fn test_list_bounds() {
        let mut value = verdict_json();
        value["key_risks"] = json!(["only one"]);
        assert!(parse_verdict(value).is_err());

        let mut value = verdict_json();
        value["assumptions_to_verify"] = json!([]);
        assert!(parse_verdict(value).is_err());

        let mut value = verdict_json();
        value["needs_more_info"] = json!(true);
        value["clarifying_questions"] = json!(["a", "b", "c", "d", "e", "f"]);
        assert!(matches!(
            parse_verdict(value).unwrap_err(),
            DebateError::Validation(_)
        ));
    }

    #[test]
    fn test_needs_info_without_questions_is_inconsistent() {
        let mut value = verdict_json();
        value["needs_more_info"] = json!(true);
        let err = parse_verdict(value).unwrap_err();
        assert!(matches!(err, DebateError::Consistency(_)));
    }

    #[test]
    fn test_questions_without_needs_info_is_inconsistent() {
        let mut value = verdict_json();
        value["clarifying_questions"] = json!(["What is the budget?"]);
        let err = parse_verdict(value).unwrap_err();
        assert!(matches!(err, DebateError::Consistency(_)));
    }

    #[test]
    fn test_needs_info_with_questions_is_valid() {
        let mut value = verdict_json();
        value["needs_more_info"] = json!(true);
        value["clarifying_questions"] = json!(["What is the budget?"]);
        assert!(parse_verdict(value).is_ok());
    }

    #[test]
    fn test_missing_questions_default_to_empty() {
        let mut value = verdict_json();
        value.as_object_mut().unwrap().remove("clarifying_questions");
        assert!(parse_verdict(value).unwrap().clarifying_questions.is_empty());
    }

    #[test]
    fn test_response_schema_is_inlined_and_strict() {
        let schema = response_schema::<DebatePosition>().unwrap();
        let text = schema.to_string();
        assert!(!text.contains("$ref"));
        assert_eq!(schema["additionalProperties"], json!(false));
        assert_eq!(schema["properties"]["arguments"]["minItems"], json!(3));
        assert_eq!(schema["properties"]["arguments"]["maxItems"], json!(8));

        let verdict = response_schema::<Verdict>().unwrap();
        assert!(verdict.to_string().contains("Alignment with constraints"));
    }
}
