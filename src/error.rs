use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! out_of_bounds_error {
    () => {
        crate::Error::OutOfBounds {
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Errors fall into three groups that map onto the per-container outcomes of
/// [`crate::embed::WriteOutcome`]:
///
/// # Error Categories
///
/// ## Corrupt Wire Data
/// - [`Error::Malformed`] - The wire tuple could not be decoded
/// - [`Error::OutOfBounds`] - A read ran past the end of an encoded payload
///
/// ## Container Errors
/// - [`Error::HolderMismatch`] - The `kotlin.Metadata` holder does not carry the expected field names
/// - [`Error::ConstantPoolOverflow`] - The constant pool ran out of 16-bit indices
/// - [`Error::ConstantTooLong`] - A string does not fit a single `CONSTANT_Utf8` entry
/// - [`Error::InvalidConstantIndex`] - An index does not point at a constant of the expected kind
///
/// ## Model Errors
/// - [`Error::ModelInvariant`] - The node model violates an invariant the writer relies on
/// - [`Error::RecursionLimit`] - A recursive node nests deeper than the configured limit
///
/// # Examples
///
/// ```rust
/// use kmetadata::{Error, wire::{reader::decode, MetadataHeader}};
///
/// let header = MetadataHeader::default();
/// match decode(&header) {
///     Ok(metadata) => println!("decoded {:?}", metadata.kind()),
///     Err(Error::Malformed { message, .. }) => eprintln!("corrupt metadata: {message}"),
///     Err(e) => eprintln!("other error: {e}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The encoded metadata is damaged and could not be decoded.
    ///
    /// The error includes the source location where the malformation was detected
    /// for debugging purposes.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while decoding a payload.
    #[error("Out of Bound read would have occurred! - {file}:{line}")]
    OutOfBounds {
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// The metadata holder annotation does not have the expected shape.
    ///
    /// Usually caused by an earlier transformation that renamed the members of
    /// `kotlin.Metadata`. The associated string names the offending element.
    #[error("Invalid Kotlin metadata field names - {0}")]
    HolderMismatch(String),

    /// The node model violates an invariant of the writer.
    ///
    /// This points at a bug in whatever produced the model and is fatal for the
    /// container being written.
    #[error("Kotlin metadata model invariant violated - {0}")]
    ModelInvariant(String),

    /// Recursion limit reached.
    ///
    /// Recursive nodes (types, effect expressions) are bounded to keep the writer
    /// from overflowing the stack on degenerate input.
    #[error("Reach the maximum recursion level allowed - {0}")]
    RecursionLimit(usize),

    /// The constant pool cannot hold more entries.
    #[error("The constant pool exceeds 65535 entries")]
    ConstantPoolOverflow,

    /// A string is longer than a `CONSTANT_Utf8` entry can hold.
    ///
    /// The associated value is the length of the string in class file UTF-8 bytes.
    #[error("String of {0} bytes exceeds the 65535 byte limit of a UTF-8 constant")]
    ConstantTooLong(usize),

    /// A constant pool index does not point at a constant of the expected kind.
    #[error("Invalid constant pool index - {0}")]
    InvalidConstantIndex(u16),

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),
}
