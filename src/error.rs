use thiserror::Error;

use crate::erased::SharedKey;

/// Errors reported when reading a component's shared values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SharedError {
	/// The value stored under `key` is not of the requested type.
	///
	/// This means two call sites derived the same key for different values.
	#[error("shared value `{key}` holds a `{found}`, but a `{expected}` was requested")]
	TypeMismatch {
		key: SharedKey,
		expected: &'static str,
		found: &'static str,
	},
}

pub type Result<T, E = SharedError> = std::result::Result<T, E>;
