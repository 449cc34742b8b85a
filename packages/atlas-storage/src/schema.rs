pub fn render_schema() -> String {
	expand_includes(include_str!("../../../sql/init.sql"))
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"00_extensions.sql" => out.push_str(include_str!("../../../sql/00_extensions.sql")),
				"tables/001_places.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_places.sql")),
				_ => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn includes_are_expanded() {
		let sql = render_schema();

		assert!(!sql.contains("\\ir "));
		assert!(sql.contains("CREATE EXTENSION IF NOT EXISTS postgis"));
		assert!(sql.contains("CREATE TABLE IF NOT EXISTS places"));
	}

	#[test]
	fn unknown_includes_are_left_in_place() {
		assert_eq!(expand_includes("\\ir missing.sql"), "\\ir missing.sql\n");
	}
}
