use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryGroup {
	Cultural,
	Nature,
	Urban,
	Other,
}
impl CategoryGroup {
	pub const ALL: [Self; 4] = [Self::Cultural, Self::Nature, Self::Urban, Self::Other];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Cultural => "cultural",
			Self::Nature => "nature",
			Self::Urban => "urban",
			Self::Other => "other",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|group| group.as_str() == raw)
	}
}

/// Category to group mapping. Categories missing from the table belong to
/// [`CategoryGroup::Other`].
pub const CATEGORY_GROUPS: &[(&str, CategoryGroup)] = &[
	("museum", CategoryGroup::Cultural),
	("theater", CategoryGroup::Cultural),
	("basilica", CategoryGroup::Cultural),
	("park", CategoryGroup::Nature),
	("viewpoint", CategoryGroup::Nature),
	("plaza", CategoryGroup::Urban),
	("market", CategoryGroup::Urban),
];

/// The table as two parallel arrays, in table order, for binding into SQL.
pub fn table_columns() -> (Vec<String>, Vec<String>) {
	CATEGORY_GROUPS
		.iter()
		.map(|(category, group)| (category.to_string(), group.as_str().to_string()))
		.unzip()
}
