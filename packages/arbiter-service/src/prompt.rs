use arbiter_config::Prompt;
use arbiter_domain::Query;

/// Renders the generation prompt. The same inputs always yield the same text.
pub fn build_prompt(query: &Query, context: &str, cfg: &Prompt) -> String {
	let options = query
		.options
		.iter()
		.map(|option| format!("\"{option}\""))
		.collect::<Vec<_>>()
		.join(", ");
	let sentence_unit = if cfg.short_max_sentences == 1 { "sentence" } else { "sentences" };

	format!(
		"You are a decision advisor. Base your analysis only on the reference passages below. \
Do not rely on outside knowledge.\n\
Reference passages:\n{context}\n\n\
Problem:\n{problem}\n\n\
Options: {options}\n\n\
Instructions:\n\
- Select exactly one of the options and copy it verbatim into \"recommendation\".\n\
- Write \"short_reason\" in at most {short_max} {sentence_unit}.\n\
- Write \"detailed_reasoning\" in at least {min_words} words. Name the specific reasoning \
frameworks from the reference passages that support the choice.\n\
- Respond with a single JSON object with exactly three string fields: \"recommendation\", \
\"short_reason\", \"detailed_reasoning\".\n\
- Do not add prose before or after the object. Do not wrap it in markdown code fences. \
Do not put literal line breaks inside string values.",
		context = context,
		problem = query.problem,
		options = options,
		short_max = cfg.short_max_sentences,
		sentence_unit = sentence_unit,
		min_words = cfg.detailed_min_words,
	)
}
