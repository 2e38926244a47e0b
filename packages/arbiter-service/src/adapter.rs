use serde_json::{Map, Value};

use crate::{DecisionResult, repair::DEGRADED_RECOMMENDATION};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanonicalField {
	Recommendation,
	ShortReason,
	DetailedReasoning,
}
impl CanonicalField {
	pub const ALL: [Self; 3] = [Self::Recommendation, Self::ShortReason, Self::DetailedReasoning];

	pub fn key(self) -> &'static str {
		match self {
			Self::Recommendation => "recommendation",
			Self::ShortReason => "short_reason",
			Self::DetailedReasoning => "detailed_reasoning",
		}
	}

	/// Accepted payload keys, highest precedence first. The canonical key always leads.
	pub fn aliases(self) -> &'static [&'static str] {
		match self {
			Self::Recommendation => &["recommendation", "selected_option", "selectedOption"],
			Self::ShortReason => &["short_reason", "shortReason", "rationale", "reasoning"],
			Self::DetailedReasoning => &["detailed_reasoning", "detailedReasoning", "rationale"],
		}
	}

	pub fn default_text(self) -> &'static str {
		match self {
			Self::Recommendation => "No recommendation provided.",
			Self::ShortReason => "No short reason provided.",
			Self::DetailedReasoning => "No detailed reasoning provided.",
		}
	}

	/// First alias carrying usable text, or the default.
	pub fn resolve(self, fields: &Map<String, Value>) -> String {
		self.aliases()
			.iter()
			.find_map(|alias| fields.get(*alias).and_then(value_text))
			.unwrap_or_else(|| self.default_text().to_string())
	}
}

/// Maps a parsed (or degraded) payload onto the three canonical fields. Never yields an empty field.
pub fn adapt(fields: &Map<String, Value>) -> DecisionResult {
	DecisionResult {
		recommendation: CanonicalField::Recommendation.resolve(fields),
		short_reason: CanonicalField::ShortReason.resolve(fields),
		detailed_reasoning: CanonicalField::DetailedReasoning.resolve(fields),
	}
}

/// Replaces a recommendation that loosely names one of `options` with that option's exact text.
///
/// Loose matching ignores surrounding whitespace and quotes, one trailing period, and letter case.
/// A recommendation matching nothing is kept as is.
pub fn align_recommendation(mut result: DecisionResult, options: &[String]) -> DecisionResult {
	if result.recommendation == DEGRADED_RECOMMENDATION {
		return result;
	}
	if options.iter().any(|option| option == &result.recommendation) {
		return result;
	}

	let wanted = match_key(&result.recommendation);

	match options.iter().find(|option| match_key(option) == wanted) {
		Some(option) => result.recommendation = option.clone(),
		None => {
			tracing::warn!(
				recommendation = %result.recommendation,
				options = ?options,
				"Recommendation does not match any option."
			);
		},
	}

	result
}

fn value_text(value: &Value) -> Option<String> {
	let text = match value {
		Value::Null => return None,
		Value::String(text) => text.trim().to_string(),
		Value::Bool(_) | Value::Number(_) => value.to_string(),
		Value::Array(items) =>
			items.iter().filter_map(value_text).collect::<Vec<_>>().join("\n"),
		Value::Object(_) => value.to_string(),
	};

	if text.is_empty() { None } else { Some(text) }
}

fn match_key(text: &str) -> String {
	let mut key = text.trim();

	for (open, close) in [('"', '"'), ('\'', '\''), ('`', '`'), ('\u{201c}', '\u{201d}')] {
		if let Some(inner) = key.strip_prefix(open).and_then(|rest| rest.strip_suffix(close)) {
			key = inner.trim();
		}
	}

	key.strip_suffix('.').unwrap_or(key).trim().to_lowercase()
}
