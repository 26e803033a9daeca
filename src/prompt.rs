//! Prompt construction for the three roles.
//!
//! System instructions describe the role and the output contract; user
//! prompts carry the decision, the context and (for the arbiter) both
//! argument lists as pretty-printed JSON. A language block is appended to
//! every system instruction.

use crate::error::Result;
use crate::schema::{Argument, Criterion, DebatePosition};
use crate::types::{Agent, Language};

const ADVOCATE_RULES: &str = "\
Rules:
- Every argument needs a concrete claim, short reasoning, evidence and an honest risk.
- When no hard data exists, write the evidence as \"assumption: <text>\".
- confidence is a number from 0 to 1: how likely the argument is to hold.
- Prefer specifics over generic statements.
- Reply with JSON that matches the DebatePosition schema and nothing else.
";

/// System instruction for `agent`, including the language block.
pub fn system_instruction(agent: Agent, language: Language) -> String {
    let base = match agent {
        Agent::Pro => advocate_instruction("IN FAVOR OF", "support"),
        Agent::Con => advocate_instruction("AGAINST", "oppose"),
        Agent::Judge => arbiter_instruction(),
    };
    format!("{}{}", base, language_requirements(language, agent == Agent::Judge))
}

fn advocate_instruction(side: &str, verb: &str) -> String {
    format!(
        "You are a rigorous advocate arguing {side} the decision below.\n\
         Produce {min} to {max} arguments that {verb} taking the action.\n{ADVOCATE_RULES}",
        min = DebatePosition::MIN_ARGUMENTS,
        max = DebatePosition::MAX_ARGUMENTS,
    )
}

fn arbiter_instruction() -> String {
    let rubric = Criterion::ALL
        .iter()
        .map(|c| format!("- {}: {:.2}", c.label(), c.weight()))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "You are a neutral senior decision analyst. You are given the arguments for and \
         against a decision and must return a structured verdict.\n\n\
         Scoring rubric (use exactly these criteria and weights, one scorecard row each):\n\
         {rubric}\n\n\
         Score every criterion from 0 to 10 for the PRO side and for the CON side.\n\
         The weighted totals pick the winner; the decision reflects the whole picture.\n\
         - decision: \"go\" when PRO clearly wins, \"no_go\" when CON clearly wins, \
         \"conditional_go\" when it is close or depends on conditions.\n\
         - summary: 3 to 6 sentences that pull the debate together.\n\
         - key_risks: 2 to 8 of the most important risks whatever the outcome.\n\
         - assumptions_to_verify: 1 to 8 assumptions that must be checked.\n\
         - next_48h_actions: 2 to 8 concrete actions for the next two days.\n\
         - needs_more_info: true only when critical data is missing; then list 1 to 5 \
         clarifying_questions, otherwise leave clarifying_questions empty.\n\
         - Reply with JSON that matches the Verdict schema and nothing else.\n"
    )
}

/// Language block appended to a system instruction.
pub fn language_requirements(language: Language, judge: bool) -> String {
    let mut out = String::from("\n\nLanguage requirements:\n");
    match (language, judge) {
        (Language::Ru, false) => {
            out.push_str("- Return claim, reasoning, evidence, and risk in Russian.\n");
            out.push_str(
                "- If data is missing, prefix evidence with \"допущение:\" (preferred) or \"assumption:\".\n",
            );
        }
        (Language::En, false) => {
            out.push_str(
                "- Return claim, reasoning, evidence, and risk in English. Use \"assumption:\" if data is missing.\n",
            );
        }
        (lang, true) => {
            let name = match lang {
                Language::En => "English",
                Language::Ru => "Russian",
            };
            out.push_str(&format!("- Return all natural-language fields in {name}.\n"));
            out.push_str(
                "- Keep enum values exactly as required by schema (go/no_go/conditional_go, pro/con/tie).\n",
            );
            out.push_str("- Keep rubric criterion names exactly as listed in the rubric.\n");
        }
    }
    out
}

/// User prompt shared by both advocates.
///
/// # Example
///
/// ```
/// use decision_debate::prompt::user_prompt;
/// use decision_debate::Language;
///
/// assert_eq!(
///     user_prompt("Launch product X", "", Language::En),
///     "Decision under consideration: Launch product X"
/// );
/// ```
pub fn user_prompt(decision: &str, context: &str, language: Language) -> String {
    let (decision_label, context_label) = match language {
        Language::En => ("Decision under consideration", "Additional context"),
        Language::Ru => ("Решение для анализа", "Дополнительный контекст и ограничения"),
    };
    let mut out = format!("{decision_label}: {decision}");
    if !context.is_empty() {
        out.push_str(&format!("\n{context_label}: {context}"));
    }
    out
}

/// User prompt for the arbiter, embedding both argument lists.
pub fn arbiter_prompt(
    decision: &str,
    context: &str,
    pro: &[Argument],
    con: &[Argument],
    language: Language,
) -> Result<String> {
    let (d, c, p, n) = match language {
        Language::En => ("Decision", "Context", "PRO arguments", "CON arguments"),
        Language::Ru => ("Решение", "Контекст", "Аргументы ЗА", "Аргументы ПРОТИВ"),
    };
    Ok(format!(
        "{d}: {decision}\n{c}: {context}\n\n{p}:\n{}\n\n{n}:\n{}",
        serde_json::to_string_pretty(pro)?,
        serde_json::to_string_pretty(con)?,
    ))
}
