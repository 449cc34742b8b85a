pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
	#[error("{field} must be a finite number in the range {min}-{max}.")]
	OutOfRange { field: &'static str, min: f64, max: f64 },
	#[error("{field} must be a finite number greater than zero.")]
	NotPositive { field: &'static str },
}
