use crate::RetrievedCandidate;

/// A line holding only `---` between passages. Each passage also opens with its rank as `[n]`, so a
/// `---` line inside a passage cannot be mistaken for a boundary.
pub const CONTEXT_SEPARATOR: &str = "\n---\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledContext {
	pub text: String,
	/// Passages included, counted from the most similar.
	pub used: usize,
	/// Passages dropped to honor the length cap.
	pub dropped: usize,
}

/// Joins numbered passages in retrieval order.
///
/// With `max_chars` set, trailing (least similar) passages are dropped until the joined text fits.
/// The first passage is always kept, even when it alone is longer than the cap.
pub fn assemble_context(
	candidates: &[RetrievedCandidate],
	max_chars: Option<usize>,
) -> AssembledContext {
	let separator_chars = CONTEXT_SEPARATOR.chars().count();
	let mut passages = candidates
		.iter()
		.enumerate()
		.map(|(index, candidate)| format!("[{}]\n{}", index + 1, candidate.content))
		.collect::<Vec<_>>();

	if let Some(max_chars) = max_chars {
		let mut total = passages.iter().map(|passage| passage.chars().count()).sum::<usize>()
			+ separator_chars * passages.len().saturating_sub(1);

		while passages.len() > 1 && total > max_chars {
			if let Some(last) = passages.pop() {
				total -= last.chars().count() + separator_chars;
			}
		}
	}

	let used = passages.len();

	AssembledContext {
		text: passages.join(CONTEXT_SEPARATOR),
		used,
		dropped: candidates.len() - used,
	}
}
