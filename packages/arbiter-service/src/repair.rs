use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::DecisionResult;

/// Recommendation carried by a result whose model output could not be parsed.
pub const DEGRADED_RECOMMENDATION: &str = "Analysis Generated (Format Error)";
pub const DEGRADED_SHORT_REASON: &str =
	"The model response could not be parsed into the expected format. The full response is shown as the detailed reasoning.";

// Matches only a reply that is a single fenced block from start to end.
static FENCED_REPLY: LazyLock<Option<Regex>> = LazyLock::new(|| {
	Regex::new(r"(?s)\A```[A-Za-z0-9_+.\-]*[ \t]*\r?\n?(.*)\r?\n?[ \t]*```\z").ok()
});

/// Transformation applied to the raw text before the parse that succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairStage {
	Raw,
	FenceStripped,
	BraceExtracted,
	ControlEscaped,
}
impl RepairStage {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Raw => "raw",
			Self::FenceStripped => "fence_stripped",
			Self::BraceExtracted => "brace_extracted",
			Self::ControlEscaped => "control_escaped",
		}
	}

	fn next(self) -> Option<Self> {
		match self {
			Self::Raw => Some(Self::FenceStripped),
			Self::FenceStripped => Some(Self::BraceExtracted),
			Self::BraceExtracted => Some(Self::ControlEscaped),
			Self::ControlEscaped => None,
		}
	}

	fn apply(self, text: &str) -> String {
		match self {
			Self::Raw => text.trim().to_string(),
			Self::FenceStripped => strip_fences(text),
			Self::BraceExtracted => extract_braces(text),
			Self::ControlEscaped => escape_controls(text),
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum RepairOutcome {
	Parsed { stage: RepairStage, fields: Map<String, Value> },
	Failed { raw: String },
}
impl RepairOutcome {
	pub fn is_degraded(&self) -> bool {
		matches!(self, Self::Failed { .. })
	}

}

impl DecisionResult {
	/// Result for model output that could not be parsed. `raw` becomes the detailed reasoning
	/// byte for byte.
	pub fn degraded(raw: String) -> Self {
		Self {
			recommendation: DEGRADED_RECOMMENDATION.to_string(),
			short_reason: DEGRADED_SHORT_REASON.to_string(),
			detailed_reasoning: raw,
		}
	}
}

/// Recovers a JSON object from model output.
///
/// Stages run in order and each one transforms the previous stage's text, so a fenced reply with
/// surrounding prose and raw newlines in its strings is handled by the last stage. Never fails; an
/// unrecoverable reply becomes [`RepairOutcome::Failed`] carrying the untouched input.
pub fn repair(raw: &str) -> RepairOutcome {
	let mut stage = RepairStage::Raw;
	let mut text = raw.to_string();

	loop {
		text = stage.apply(&text);

		if let Some(fields) = parse_object(&text) {
			if stage != RepairStage::Raw {
				tracing::warn!(stage = stage.as_str(), raw = %raw, "Model output required repair.");
			}

			return RepairOutcome::Parsed { stage, fields };
		}

		match stage.next() {
			Some(next) => stage = next,
			None => break,
		}
	}

	tracing::warn!(raw = %raw, "Model output could not be repaired; returning degraded result.");

	RepairOutcome::Failed { raw: raw.to_string() }
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
	match serde_json::from_str::<Value>(text) {
		Ok(Value::Object(fields)) => Some(fields),
		_ => None,
	}
}

/// Unwraps a reply that opens with a fence. Fences further into the text are left alone.
fn strip_fences(text: &str) -> String {
	let trimmed = text.trim();
	let Some(rest) = trimmed.strip_prefix("```") else {
		return trimmed.to_string();
	};
	let fenced = FENCED_REPLY
		.as_ref()
		.and_then(|re| re.captures(trimmed))
		.and_then(|captures| captures.get(1));

	if let Some(body) = fenced {
		return body.as_str().trim().to_string();
	}

	// Unclosed fence: drop the opening line.
	match rest.split_once('\n') {
		Some((_, body)) => body.trim().to_string(),
		None => rest.trim().to_string(),
	}
}

fn extract_braces(text: &str) -> String {
	match (text.find('{'), text.rfind('}')) {
		(Some(start), Some(end)) if start < end => text[start..=end].to_string(),
		_ => text.to_string(),
	}
}

/// Escapes control characters that appear inside JSON string literals.
fn escape_controls(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	let mut in_string = false;
	let mut escaped = false;

	for ch in text.chars() {
		if !in_string {
			if ch == '"' {
				in_string = true;
			}

			out.push(ch);

			continue;
		}
		if escaped {
			escaped = false;

			out.push(ch);

			continue;
		}

		match ch {
			'\\' => {
				escaped = true;

				out.push(ch);
			},
			'"' => {
				in_string = false;

				out.push(ch);
			},
			'\n' => out.push_str("\\n"),
			'\r' => out.push_str("\\r"),
			'\t' => out.push_str("\\t"),
			ch if (ch as u32) < 0x20 => {
				out.push_str(&format!("\\u{:04x}", ch as u32));
			},
			ch => out.push(ch),
		}
	}

	out
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn parsed(outcome: RepairOutcome) -> (RepairStage, Value) {
		match outcome {
			RepairOutcome::Parsed { stage, fields } => (stage, Value::Object(fields)),
			RepairOutcome::Failed { raw } => panic!("Expected parsed output, got failure for {raw:?}."),
		}
	}

	#[test]
	fn clean_json_parses_without_repair() {
		let (stage, value) = parsed(repair(r#"  {"recommendation":"A"}  "#));

		assert_eq!(stage, RepairStage::Raw);
		assert_eq!(value, json!({ "recommendation": "A" }));
	}

	#[test]
	fn tagged_fence_is_stripped() {
		let (stage, value) = parsed(repair("```json\n{\"recommendation\":\"B\"}\n```"));

		assert_eq!(stage, RepairStage::FenceStripped);
		assert_eq!(value, json!({ "recommendation": "B" }));
	}

	#[test]
	fn unclosed_fence_is_stripped() {
		let (stage, value) = parsed(repair("```json\n{\"recommendation\":\"B\"}"));

		assert_eq!(stage, RepairStage::FenceStripped);
		assert_eq!(value, json!({ "recommendation": "B" }));
	}

	#[test]
	fn fence_after_leading_prose_is_not_unwrapped() {
		let raw = "Example format:\n```\nrecommendation\n```\nAnswer: {\"recommendation\":\"Stay\",\"short_reason\":\"Lower risk.\"}";

		assert_eq!(strip_fences(raw), raw);

		let (stage, value) = parsed(repair(raw));

		assert_eq!(stage, RepairStage::BraceExtracted);
		assert_eq!(value, json!({ "recommendation": "Stay", "short_reason": "Lower risk." }));
	}

	#[test]
	fn fenced_reply_keeps_inner_backticks() {
		let raw = "```json\n{\"detailed_reasoning\":\"Use ``` for code.\"}\n```";
		let (stage, value) = parsed(repair(raw));

		assert_eq!(stage, RepairStage::FenceStripped);
		assert_eq!(value, json!({ "detailed_reasoning": "Use ``` for code." }));
	}

	#[test]
	fn surrounding_prose_is_cut_at_braces() {
		let (stage, value) =
			parsed(repair("Here is my answer: {\"recommendation\":\"C\"} Hope it helps."));

		assert_eq!(stage, RepairStage::BraceExtracted);
		assert_eq!(value, json!({ "recommendation": "C" }));
	}

	#[test]
	fn fenced_object_with_literal_newline_parses_to_intended_structure() {
		let raw = "```json\n{\n  \"recommendation\": \"A\",\n  \"short_reason\": \"Fits the goal.\",\n  \"detailed_reasoning\": \"First line.\nSecond line.\"\n}\n```";
		let (stage, value) = parsed(repair(raw));

		assert_eq!(stage, RepairStage::ControlEscaped);
		assert_eq!(
			value,
			json!({
				"recommendation": "A",
				"short_reason": "Fits the goal.",
				"detailed_reasoning": "First line.\nSecond line.",
			})
		);
	}

	#[test]
	fn existing_escapes_are_preserved() {
		let raw = "{\"detailed_reasoning\": \"quote \\\" then\ttab\"}";
		let (_, value) = parsed(repair(raw));

		assert_eq!(value, json!({ "detailed_reasoning": "quote \" then\ttab" }));
	}

	#[test]
	fn other_control_characters_are_unicode_escaped() {
		assert_eq!(escape_controls("{\"a\":\"x\u{1}y\"}"), "{\"a\":\"x\\u0001y\"}");
	}

	#[test]
	fn non_object_json_is_not_accepted() {
		assert!(repair("[1, 2, 3]").is_degraded());
	}

	#[test]
	fn garbage_degrades_with_raw_text_preserved() {
		let raw = "  I would pick option B because it balances risk.\nNo JSON here.\n";
		let RepairOutcome::Failed { raw: kept } = repair(raw) else {
			panic!("Expected a failed repair.");
		};
		let result = DecisionResult::degraded(kept);

		assert_eq!(result.recommendation, DEGRADED_RECOMMENDATION);
		assert_eq!(result.short_reason, DEGRADED_SHORT_REASON);
		assert_eq!(result.detailed_reasoning, raw);
	}
}
