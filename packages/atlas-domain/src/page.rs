use serde::Serialize;

/// A 1-based page window. Both fields are always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
	pub page: u32,
	pub limit: u32,
}
impl Page {
	/// Clamps raw request values: `page` to at least 1 and `limit` to `1..=max_limit`.
	pub fn clamped(page: Option<i64>, limit: Option<i64>, default_limit: u32, max_limit: u32) -> Self {
		let max_limit = max_limit.max(1);
		let limit = limit.unwrap_or(i64::from(default_limit)).clamp(1, i64::from(max_limit));
		let page = page.unwrap_or(1).clamp(1, i64::from(u32::MAX));

		Self { page: page as u32, limit: limit as u32 }
	}

	pub fn offset(&self) -> i64 {
		(i64::from(self.page) - 1) * i64::from(self.limit)
	}

	/// Number of pages needed for `total` rows; zero rows need zero pages.
	pub fn pages(&self, total: i64) -> i64 {
		if total <= 0 {
			return 0;
		}

		let limit = i64::from(self.limit);

		(total + limit - 1) / limit
	}
}
