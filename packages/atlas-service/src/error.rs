pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Storage unavailable: {message}")]
	Unavailable { message: String },
}
impl From<atlas_storage::Error> for Error {
	fn from(err: atlas_storage::Error) -> Self {
		if err.is_unavailable() {
			return Self::Unavailable { message: err.to_string() };
		}

		match err {
			atlas_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			atlas_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
		}
	}
}

impl From<atlas_domain::Error> for Error {
	fn from(err: atlas_domain::Error) -> Self {
		Self::InvalidRequest { message: err.to_string() }
	}
}
