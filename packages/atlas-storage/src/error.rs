#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
}
impl Error {
	/// Pool exhaustion and shutdown are transient; callers may retry later.
	pub fn is_unavailable(&self) -> bool {
		matches!(self, Self::Sqlx(sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed))
	}
}
