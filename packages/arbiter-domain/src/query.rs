use std::{collections::HashSet, fmt};

use unicode_normalization::UnicodeNormalization;

pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 20;
pub const MAX_PROBLEM_CHARS: usize = 4_000;
pub const MAX_OPTION_CHARS: usize = 200;

/// A decision problem after sanitization. Every downstream stage sees only this shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Query {
	pub problem: String,
	/// Non-empty, pairwise distinct, in submission order.
	pub options: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryRejectReason {
	EmptyProblem,
	ProblemTooLong { chars: usize },
	TooFewOptions { distinct: usize },
	TooManyOptions { count: usize },
	OptionTooLong { index: usize, chars: usize },
}
impl fmt::Display for QueryRejectReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::EmptyProblem => write!(f, "problem must be non-empty."),
			Self::ProblemTooLong { chars } => {
				write!(f, "problem must be at most {MAX_PROBLEM_CHARS} characters, got {chars}.")
			},
			Self::TooFewOptions { distinct } => write!(
				f,
				"options must contain at least {MIN_OPTIONS} distinct non-empty entries, got {distinct}."
			),
			Self::TooManyOptions { count } => {
				write!(f, "options must contain at most {MAX_OPTIONS} entries, got {count}.")
			},
			Self::OptionTooLong { index, chars } => write!(
				f,
				"options[{index}] must be at most {MAX_OPTION_CHARS} characters, got {chars}."
			),
		}
	}
}

/// Sanitizes a raw problem and option list.
///
/// The problem is NFKC-normalized, control characters are folded to spaces and whitespace runs
/// collapse to one space. Options only lose control and zero-width characters plus surrounding
/// whitespace, so an ordinary option label survives byte-for-byte. Blank options are dropped and
/// exact duplicates keep their first occurrence.
pub fn sanitize_query(problem: &str, options: &[String]) -> Result<Query, QueryRejectReason> {
	let problem = sanitize_problem(problem);

	if problem.is_empty() {
		return Err(QueryRejectReason::EmptyProblem);
	}

	let problem_chars = problem.chars().count();

	if problem_chars > MAX_PROBLEM_CHARS {
		return Err(QueryRejectReason::ProblemTooLong { chars: problem_chars });
	}

	let mut seen = HashSet::new();
	let mut kept = Vec::with_capacity(options.len());

	for raw in options {
		let option = sanitize_option(raw);

		if option.is_empty() || !seen.insert(option.clone()) {
			continue;
		}

		kept.push(option);
	}

	if kept.len() < MIN_OPTIONS {
		return Err(QueryRejectReason::TooFewOptions { distinct: kept.len() });
	}
	if kept.len() > MAX_OPTIONS {
		return Err(QueryRejectReason::TooManyOptions { count: kept.len() });
	}

	for (index, option) in kept.iter().enumerate() {
		let chars = option.chars().count();

		if chars > MAX_OPTION_CHARS {
			return Err(QueryRejectReason::OptionTooLong { index, chars });
		}
	}

	Ok(Query { problem, options: kept })
}

pub fn sanitize_problem(input: &str) -> String {
	let normalized: String = input.nfkc().collect();
	let mut out = String::with_capacity(normalized.len());
	let mut pending_space = false;

	for ch in normalized.chars() {
		if is_zero_width(ch) {
			continue;
		}
		if ch.is_control() || ch.is_whitespace() {
			pending_space = true;

			continue;
		}
		if pending_space && !out.is_empty() {
			out.push(' ');
		}

		pending_space = false;

		out.push(ch);
	}

	out
}

pub fn sanitize_option(input: &str) -> String {
	let stripped: String = input.chars().filter(|ch| !ch.is_control() && !is_zero_width(*ch)).collect();

	stripped.trim().to_string()
}

fn is_zero_width(ch: char) -> bool {
	matches!(
		ch,
		'\u{00AD}' // soft hyphen
			| '\u{200B}' // zero width space
			| '\u{200C}' // zero width non-joiner
			| '\u{200D}' // zero width joiner
			| '\u{2060}' // word joiner
			| '\u{FEFF}' // zero width no-break space
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn opts(values: &[&str]) -> Vec<String> {
		values.iter().map(|value| value.to_string()).collect()
	}

	#[test]
	fn problem_control_chars_fold_to_single_spaces() {
		assert_eq!(sanitize_problem("  Should I\n\tfire\u{0007}Sarah?  "), "Should I fire Sarah?");
	}

	#[test]
	fn problem_is_nfkc_normalized() {
		assert_eq!(sanitize_problem("Ｆｉｒｅ her"), "Fire her");
	}

	#[test]
	fn ordinary_options_survive_verbatim() {
		let query = sanitize_query("Pick one", &opts(&["Keep  her", "Let her go"]))
			.expect("query must be valid");

		assert_eq!(query.options, opts(&["Keep  her", "Let her go"]));
	}

	#[test]
	fn blank_and_duplicate_options_are_dropped() {
		let query = sanitize_query("Pick one", &opts(&["A", " ", "A", "\u{200B}", "B", " B "]))
			.expect("query must be valid");

		assert_eq!(query.options, opts(&["A", "B"]));
	}

	#[test]
	fn fewer_than_two_distinct_options_is_rejected() {
		let err = sanitize_query("Pick one", &opts(&["A", "A", ""])).expect_err("must reject");

		assert_eq!(err, QueryRejectReason::TooFewOptions { distinct: 1 });
	}

	#[test]
	fn empty_problem_is_rejected() {
		let err = sanitize_query("\n\t \u{0000}", &opts(&["A", "B"])).expect_err("must reject");

		assert_eq!(err, QueryRejectReason::EmptyProblem);
	}

	#[test]
	fn long_option_is_rejected_with_its_index() {
		let long = "x".repeat(MAX_OPTION_CHARS + 1);
		let err = sanitize_query("Pick one", &[String::from("A"), long]).expect_err("must reject");

		assert_eq!(err, QueryRejectReason::OptionTooLong { index: 1, chars: MAX_OPTION_CHARS + 1 });
	}
}
