use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use arbiter_config::{Config, Error};

const SAMPLE_CONFIG_TEMPLATE_TOML: &str = include_str!("fixtures/sample_config.template.toml");

fn sample_toml_with(section: &[&str], key: &str, value: Value) -> String {
	let mut root: Value =
		toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.");
	let mut table = root.as_table_mut().expect("Template config must be a table.");

	for name in section {
		table = table
			.get_mut(*name)
			.and_then(Value::as_table_mut)
			.unwrap_or_else(|| panic!("Template config must include [{name}]."));
	}

	table.insert(key.to_string(), value);

	toml::to_string(&root).expect("Failed to render template config.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("arbiter_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn load_payload(payload: String) -> arbiter_config::Result<Config> {
	let path = write_temp_config(payload);
	let result = arbiter_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	result
}

fn base_config() -> Config {
	toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse test config.")
}

fn expect_validation(result: arbiter_config::Result<Config>, needle: &str) {
	let err = result.expect_err("Expected validation error.");

	assert!(matches!(err, Error::Validation { .. }), "Unexpected error kind: {err:?}");
	assert!(err.to_string().contains(needle), "Unexpected error message: {err}");
}

#[test]
fn sample_config_loads_and_normalizes_blank_token() {
	let cfg = load_payload(SAMPLE_CONFIG_TEMPLATE_TOML.to_string()).expect("Sample must load.");

	assert_eq!(cfg.storage.postgres.vector_dim, 768);
	assert_eq!(cfg.retrieval.match_count, 5);
	assert!(cfg.security.api_auth_token.is_none());
}

#[test]
fn embedding_dimensions_must_match_vector_dim() {
	let payload =
		sample_toml_with(&["providers", "embedding"], "dimensions", Value::Integer(384));

	expect_validation(
		load_payload(payload),
		"providers.embedding.dimensions must match storage.postgres.vector_dim.",
	);
}

#[test]
fn match_threshold_must_be_a_cosine_similarity() {
	let payload = sample_toml_with(&["retrieval"], "match_threshold", Value::Float(1.5));

	expect_validation(load_payload(payload), "retrieval.match_threshold must be in the range");
}

#[test]
fn match_count_must_be_positive() {
	let payload = sample_toml_with(&["retrieval"], "match_count", Value::Integer(0));

	expect_validation(load_payload(payload), "retrieval.match_count must be greater than zero.");
}

#[test]
fn table_name_must_be_identifier() {
	let payload = sample_toml_with(
		&["storage", "postgres"],
		"table",
		Value::String("chunks; DROP TABLE users".to_string()),
	);

	expect_validation(load_payload(payload), "storage.postgres.table must be a plain SQL identifier");
}

#[test]
fn provider_api_key_must_be_present() {
	let payload =
		sample_toml_with(&["providers", "generation"], "api_key", Value::String("  ".to_string()));

	expect_validation(load_payload(payload), "Provider generation api_key must be non-empty.");
}

#[test]
fn missing_file_is_read_error() {
	let err = arbiter_config::load(&PathBuf::from("/nonexistent/arbiter.toml"))
		.expect_err("Expected read error.");

	assert!(matches!(err, Error::ReadConfig { .. }));
}

#[test]
fn prompt_section_defaults_when_absent() {
	let mut root: Value =
		toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.");

	root.as_table_mut().expect("Template config must be a table.").remove("prompt");

	let cfg: Config =
		toml::from_str(&toml::to_string(&root).expect("Failed to render config."))
			.expect("Config without [prompt] must parse.");

	assert_eq!(cfg.prompt.detailed_min_words, 150);
	assert_eq!(cfg.prompt.short_max_sentences, 2);
}

#[test]
fn temperature_out_of_range_is_rejected() {
	let mut cfg = base_config();

	cfg.providers.generation.temperature = 3.0;

	let err = arbiter_config::validate(&cfg).expect_err("Expected temperature error.");

	assert!(err.to_string().contains("providers.generation.temperature"));
}

#[test]
fn zero_context_cap_is_rejected() {
	let mut cfg = base_config();

	cfg.retrieval.max_context_chars = Some(0);

	assert!(arbiter_config::validate(&cfg).is_err());

	cfg.retrieval.max_context_chars = None;

	assert!(arbiter_config::validate(&cfg).is_ok());
}
