use thiserror::Error as ThisError;

use crate::packed::IntFormat;

/// Error type returned by fallible operations across the crate.
#[derive(Debug, ThisError)]
pub enum Error {
    /// A null argument where one is forbidden, an out-of-range numeric
    /// argument, an invalid label, or an invalid format for a buffer to
    /// column conversion.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Human readable description of what was wrong with the argument.
        message: String,
    },

    /// Attempt to mutate a buffer after it has already been frozen into a
    /// column.
    #[error("Buffer has already been frozen into a column and can no longer be written to.")]
    BufferFrozen,

    /// A categorical buffer received more distinct values than its format
    /// can index.
    #[error(
        "Dictionary overflow: {format:?} buffer can hold at most {max_value} distinct values \
        (including the null entry at index 0)."
    )]
    DictionaryOverflow {
        /// The categorical buffer's packed index format.
        format: IntFormat,
        /// The maximum number of distinct values that format can index.
        max_value: u32,
    },

    /// A capability required for the requested operation is missing, e.g.
    /// sorting a non-sortable column, or persisting a non-persistable
    /// column.
    #[error("Unsupported operation: {message}")]
    UnsupportedOperation {
        /// Human readable description of the missing capability.
        message: String,
    },

    /// A reader's `set_position` was called with `p < -1`, or a negative
    /// size was supplied somewhere a non-negative one is required.
    #[error("Out of range: {message}")]
    OutOfRange {
        /// Human readable description of the out-of-range value.
        message: String,
    },

    /// The parallel executor observed `!context.is_active()` or a peer
    /// worker's failure and aborted cooperatively.
    #[error("Task aborted{}", format_task_aborted_source(.source))]
    TaskAborted {
        /// The failure that caused the abort, if this worker is the one
        /// that originally observed it (as opposed to merely reacting to
        /// the sentinel being flipped by a peer).
        source: Option<Box<Error>>,
    },

    /// Persistence read-back detected a wrong magic, version, or a
    /// truncated payload.
    #[error("Invalid file format: {message}")]
    InvalidFormat {
        /// Human readable description of the mismatch.
        message: String,
    },

    /// An I/O error encountered while reading or writing a table file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_task_aborted_source(source: &Option<Box<Error>>) -> String {
    match source {
        Some(inner) => format!(": {inner}"),
        None => String::new(),
    }
}

impl Error {
    /// Shorthand for [`Error::InvalidArgument`].
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument {
            message: message.into(),
        }
    }

    /// Shorthand for [`Error::UnsupportedOperation`].
    pub fn unsupported_operation(message: impl Into<String>) -> Self {
        Error::UnsupportedOperation {
            message: message.into(),
        }
    }

    /// Shorthand for [`Error::OutOfRange`].
    pub fn out_of_range(message: impl Into<String>) -> Self {
        Error::OutOfRange {
            message: message.into(),
        }
    }

    /// Shorthand for [`Error::InvalidFormat`].
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Error::InvalidFormat {
            message: message.into(),
        }
    }

    /// `true` if this is a [`Error::TaskAborted`] variant.
    pub fn is_task_aborted(&self) -> bool {
        matches!(self, Error::TaskAborted { .. })
    }
}

/// Convenience wrapper so call sites reporting a dictionary overflow do not
/// need to spell out both fields every time.
pub(crate) fn dictionary_overflow(format: IntFormat) -> Error {
    Error::DictionaryOverflow {
        format,
        max_value: format.max_value(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_aborted_without_source_formats_without_trailing_colon() {
        let err = Error::TaskAborted { source: None };
        assert_eq!(err.to_string(), "Task aborted");
    }

    #[test]
    fn task_aborted_with_source_includes_inner_message() {
        let inner = Error::BufferFrozen;
        let err = Error::TaskAborted {
            source: Some(Box::new(inner)),
        };
        assert!(err.to_string().contains("Buffer has already been frozen"));
    }

    #[test]
    fn dictionary_overflow_helper_fills_max_value() {
        let err = dictionary_overflow(IntFormat::U2);
        match err {
            Error::DictionaryOverflow { format, max_value } => {
                assert_eq!(format, IntFormat::U2);
                assert_eq!(max_value, 3);
            }
            _ => panic!("wrong variant"),
        }
    }
}
