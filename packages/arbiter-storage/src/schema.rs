pub fn render_schema(table: &str, vector_dim: u32) -> String {
	include_str!("../../../sql/init.sql")
		.replace("<TABLE>", table)
		.replace("<VECTOR_DIM>", &vector_dim.to_string())
}

/// Splits rendered schema SQL into executable statements, dropping comment-only fragments.
pub fn statements(sql: &str) -> Vec<String> {
	sql.split(';')
		.map(|statement| {
			statement
				.lines()
				.filter(|line| !line.trim_start().starts_with("--"))
				.collect::<Vec<_>>()
				.join("\n")
		})
		.map(|statement| statement.trim().to_string())
		.filter(|statement| !statement.is_empty())
		.collect()
}
