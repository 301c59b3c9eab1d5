use thiserror::Error;

pub type Result<T, E = VertexBufferError> = std::result::Result<T, E>;

/// Errors raised by [`VertexStorageBuffer`](crate::VertexStorageBuffer) and
/// layout validation. All of them are caller errors and none is transient.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VertexBufferError {
  #[error("invalid argument: {0}")]
  InvalidArgument(String),

  #[error("record type `{found}` does not match vertex layout `{expected}`")]
  TypeMismatch {
    expected: &'static str,
    found: &'static str,
  },

  #[error("{what} is {value}, expected 1..={max}")]
  OutOfRange {
    what: &'static str,
    value: usize,
    max: usize,
  },

  #[error("vertex buffer `{0}` was used after release")]
  UseAfterRelease(String),

  #[error("invalid vertex layout `{record}`: {reason}")]
  InvalidLayout {
    record: &'static str,
    reason: String,
  },

  #[error(transparent)]
  Backend(#[from] BackendError),
}

/// Errors reported by a [`GraphicsBackend`](crate::GraphicsBackend).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
  #[error("no suitable graphics adapter found")]
  AdapterNotFound,

  #[error("failed to create device: {0}")]
  DeviceCreationFailed(String),

  #[error("buffer `{0}` has no storage allocated")]
  NotAllocated(String),

  #[error("unknown buffer handle {0}")]
  UnknownHandle(u64),

  #[error("range {offset}..{end} exceeds buffer size {size}", end = .offset + .len)]
  OutOfBounds { offset: u64, len: u64, size: u64 },

  #[error("range {offset}..{end} is not aligned to {alignment} bytes", end = .offset + .len)]
  Misaligned {
    offset: u64,
    len: u64,
    alignment: u64,
  },

  #[error("failed to map buffer for reading: {0}")]
  MapFailed(String),
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_error_display() {
    let err = VertexBufferError::OutOfRange {
      what: "count",
      value: 5,
      max: 4,
    };
    assert_eq!(err.to_string(), "count is 5, expected 1..=4");

    let err = BackendError::OutOfBounds {
      offset: 16,
      len: 32,
      size: 24,
    };
    assert_eq!(err.to_string(), "range 16..48 exceeds buffer size 24");
  }

  #[test]
  fn test_backend_error_converts() {
    let err: VertexBufferError = BackendError::UnknownHandle(7).into();
    assert_eq!(err, VertexBufferError::Backend(BackendError::UnknownHandle(7)));
    assert_eq!(err.to_string(), "unknown buffer handle 7");
  }
}
