//! Class name forms.
//!
//! Class files name nested classes with `$` as the nesting separator
//! (`com/example/Outer$Inner`), while Kotlin metadata uses `.`
//! (`com/example/Outer.Inner`). Package segments are separated by `/` in both forms.
//!
//! The writer substitutes the separator for the container's own name, sealed
//! subclass names, nested class names and every class reference inside a type. The
//! inverse mapping is exposed for callers that need to go back to class file names.

/// A mapping applied to class names.
///
/// Implemented for plain closures, so any `Fn(&str) -> String` can be passed where a
/// name function is expected.
pub trait NameFunction {
    /// Maps a single class name
    fn transform(&self, name: &str) -> String;
}

impl<F> NameFunction for F
where
    F: Fn(&str) -> String,
{
    fn transform(&self, name: &str) -> String {
        self(name)
    }
}

/// Name function that leaves every name unchanged
pub struct Identity;

impl NameFunction for Identity {
    fn transform(&self, name: &str) -> String {
        name.to_string()
    }
}

/// Name function mapping class file names to metadata names
pub struct ToMetadataName;

impl NameFunction for ToMetadataName {
    fn transform(&self, name: &str) -> String {
        to_metadata_name(name)
    }
}

/// Name function mapping metadata names to class file names
pub struct ToContainerName;

impl NameFunction for ToContainerName {
    fn transform(&self, name: &str) -> String {
        to_container_name(name)
    }
}

/// The class file nesting separator
pub const CONTAINER_NESTING_SEPARATOR: char = '$';
/// The metadata nesting separator
pub const METADATA_NESTING_SEPARATOR: char = '.';

/// Converts a class file name into its metadata form (`$` becomes `.`).
///
/// # Examples
///
/// ```rust
/// use kmetadata::model::names::to_metadata_name;
///
/// assert_eq!(to_metadata_name("com/example/Outer$Inner"), "com/example/Outer.Inner");
/// ```
#[must_use]
pub fn to_metadata_name(name: &str) -> String {
    name.replace(CONTAINER_NESTING_SEPARATOR, ".")
}

/// Converts a metadata name back into its class file form (`.` becomes `$`).
#[must_use]
pub fn to_container_name(name: &str) -> String {
    name.replace(METADATA_NESTING_SEPARATOR, "$")
}
