//! Diagnostics collection for metadata writing.
//!
//! This module provides types for collecting and reporting diagnostic messages
//! while Kotlin metadata is written back into class files. A batch of containers is
//! never aborted because one of them could not be written: the failing container is
//! skipped, left untouched, and exactly one diagnostic naming it is recorded here.
//!
//! # Architecture
//!
//! The diagnostics sink is shared across the writing pipeline:
//! - **Round-trip guard**: reports freshly written metadata that fails to decode
//! - **Holder validation**: reports `kotlin.Metadata` holders with unexpected field names
//! - **Writer core**: reports node models that violate writer invariants
//!
//! The [`Diagnostics`] container uses `boxcar::Vec` for thread-safe, lock-free
//! append operations, so containers processed in parallel can report into the same
//! sink without synchronization overhead.
//!
//! # Key Components
//!
//! - [`Diagnostics`] - Thread-safe container for diagnostic entries
//! - [`Diagnostic`] - Individual diagnostic entry with severity and context
//! - [`DiagnosticSeverity`] - Severity level (Info, Warning, Error)
//! - [`DiagnosticCategory`] - Category of the diagnostic source
//!
//! # Usage Examples
//!
//! ```rust
//! use kmetadata::diagnostics::{Diagnostics, DiagnosticCategory};
//! use std::sync::Arc;
//!
//! let diagnostics = Arc::new(Diagnostics::new());
//!
//! diagnostics.warning_for(
//!     DiagnosticCategory::Holder,
//!     "com/example/Renamed",
//!     "unknown holder element 'a'",
//! );
//!
//! for entry in diagnostics.by_container("com/example/Renamed") {
//!     println!("{entry}");
//! }
//! assert_eq!(diagnostics.warning_count(), 1);
//! ```
//!
//! # Thread Safety
//!
//! All types in this module are [`Send`] and [`Sync`]. Multiple threads can safely
//! add diagnostics simultaneously without coordination.

use std::fmt::{self, Write};

/// Severity level of a diagnostic entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticSeverity {
    /// Informational message, not indicating a problem.
    Info,

    /// A container was skipped, its original metadata is untouched.
    Warning,

    /// A container was skipped because its node model is broken.
    ///
    /// This points at a bug in whatever produced the model.
    Error,
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticSeverity::Info => write!(f, "INFO"),
            DiagnosticSeverity::Warning => write!(f, "WARN"),
            DiagnosticSeverity::Error => write!(f, "ERROR"),
        }
    }
}

/// Category indicating the source or type of diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    /// The freshly written metadata could not be decoded again.
    Metadata,

    /// The `kotlin.Metadata` holder is missing or has an unexpected shape.
    ///
    /// Examples: renamed element names, duplicate elements, scalar where an array is expected.
    Holder,

    /// The constant pool could not take the new entries.
    ConstantPool,

    /// The node model violates an invariant of the writer.
    ///
    /// Examples: duplicate type parameter ids, types nested deeper than allowed.
    Model,

    /// Issues not fitting other categories.
    General,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticCategory::Metadata => write!(f, "Metadata"),
            DiagnosticCategory::Holder => write!(f, "Holder"),
            DiagnosticCategory::ConstantPool => write!(f, "ConstantPool"),
            DiagnosticCategory::Model => write!(f, "Model"),
            DiagnosticCategory::General => write!(f, "General"),
        }
    }
}

/// A single diagnostic entry with context information.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Severity level of this diagnostic.
    pub severity: DiagnosticSeverity,

    /// Category indicating the source of this diagnostic.
    pub category: DiagnosticCategory,

    /// Human-readable description of the issue.
    pub message: String,

    /// Internal name of the class the diagnostic is about, if any.
    pub container: Option<String>,
}

impl Diagnostic {
    /// Creates a new diagnostic entry.
    ///
    /// # Arguments
    ///
    /// * `severity` - Severity level of the diagnostic
    /// * `category` - Category of the diagnostic source
    /// * `message` - Human-readable description
    pub fn new(
        severity: DiagnosticSeverity,
        category: DiagnosticCategory,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            message: message.into(),
            container: None,
        }
    }

    /// Adds the name of the affected container.
    #[must_use]
    pub fn with_container(mut self, container: impl Into<String>) -> Self {
        self.container = Some(container.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: ", self.severity, self.category)?;

        if let Some(container) = &self.container {
            write!(f, "{container}: ")?;
        }

        write!(f, "{}", self.message)
    }
}

/// Thread-safe container for collecting diagnostic entries.
///
/// Uses `boxcar::Vec` internally for lock-free concurrent append operations.
///
/// # Example
///
/// ```rust
/// use kmetadata::diagnostics::{Diagnostics, DiagnosticCategory};
/// use std::sync::Arc;
///
/// let diagnostics = Arc::new(Diagnostics::new());
///
/// let diag_clone = Arc::clone(&diagnostics);
/// std::thread::spawn(move || {
///     diag_clone.warning(DiagnosticCategory::Holder, "Renamed holder element");
/// })
/// .join()
/// .unwrap();
///
/// diagnostics.error(DiagnosticCategory::Model, "Duplicate type parameter id");
/// assert_eq!(diagnostics.count(), 2);
/// ```
#[derive(Debug)]
pub struct Diagnostics {
    entries: boxcar::Vec<Diagnostic>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl Diagnostics {
    /// Creates a new empty diagnostics container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: boxcar::Vec::new(),
        }
    }

    /// Adds an informational diagnostic.
    pub fn info(&self, category: DiagnosticCategory, message: impl Into<String>) {
        self.push(Diagnostic::new(DiagnosticSeverity::Info, category, message));
    }

    /// Adds a warning diagnostic.
    pub fn warning(&self, category: DiagnosticCategory, message: impl Into<String>) {
        self.push(Diagnostic::new(
            DiagnosticSeverity::Warning,
            category,
            message,
        ));
    }

    /// Adds an error diagnostic.
    pub fn error(&self, category: DiagnosticCategory, message: impl Into<String>) {
        self.push(Diagnostic::new(
            DiagnosticSeverity::Error,
            category,
            message,
        ));
    }

    /// Adds a warning diagnostic about a specific container.
    ///
    /// # Arguments
    ///
    /// * `category` - Category of the diagnostic
    /// * `container` - Internal name of the affected class
    /// * `message` - Description of the issue
    pub fn warning_for(
        &self,
        category: DiagnosticCategory,
        container: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.push(
            Diagnostic::new(DiagnosticSeverity::Warning, category, message)
                .with_container(container),
        );
    }

    /// Adds an error diagnostic about a specific container.
    pub fn error_for(
        &self,
        category: DiagnosticCategory,
        container: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.push(
            Diagnostic::new(DiagnosticSeverity::Error, category, message)
                .with_container(container),
        );
    }

    /// Adds a diagnostic entry directly.
    pub fn push(&self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    /// Returns true if any diagnostics have been collected.
    pub fn has_any(&self) -> bool {
        self.entries.count() > 0
    }

    /// Returns true if any error-level diagnostics have been collected.
    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|(_, d)| d.severity == DiagnosticSeverity::Error)
    }

    /// Returns true if any warning-level diagnostics have been collected.
    pub fn has_warnings(&self) -> bool {
        self.entries
            .iter()
            .any(|(_, d)| d.severity == DiagnosticSeverity::Warning)
    }

    /// Returns the total number of diagnostics.
    pub fn count(&self) -> usize {
        self.entries.count()
    }

    /// Returns the number of error-level diagnostics.
    pub fn error_count(&self) -> usize {
        self.count_severity(DiagnosticSeverity::Error)
    }

    /// Returns the number of warning-level diagnostics.
    pub fn warning_count(&self) -> usize {
        self.count_severity(DiagnosticSeverity::Warning)
    }

    /// Returns the number of info-level diagnostics.
    pub fn info_count(&self) -> usize {
        self.count_severity(DiagnosticSeverity::Info)
    }

    fn count_severity(&self, severity: DiagnosticSeverity) -> usize {
        self.entries
            .iter()
            .filter(|(_, d)| d.severity == severity)
            .count()
    }

    /// Returns an iterator over all diagnostics.
    ///
    /// Note: Uses boxcar's iterator which yields `(index, &Diagnostic)` tuples.
    /// The index is dropped here.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().map(|(_, d)| d)
    }

    /// Returns all errors as a vector.
    pub fn errors(&self) -> Vec<&Diagnostic> {
        self.iter()
            .filter(|d| d.severity == DiagnosticSeverity::Error)
            .collect()
    }

    /// Returns all warnings as a vector.
    pub fn warnings(&self) -> Vec<&Diagnostic> {
        self.iter()
            .filter(|d| d.severity == DiagnosticSeverity::Warning)
            .collect()
    }

    /// Returns diagnostics filtered by category.
    pub fn by_category(&self, category: DiagnosticCategory) -> Vec<&Diagnostic> {
        self.iter().filter(|d| d.category == category).collect()
    }

    /// Returns diagnostics reported for the named container.
    pub fn by_container(&self, container: &str) -> Vec<&Diagnostic> {
        self.iter()
            .filter(|d| d.container.as_deref() == Some(container))
            .collect()
    }

    /// Formats a summary of all diagnostics for display.
    pub fn summary(&self) -> String {
        let mut output = String::new();

        let error_count = self.error_count();
        let warning_count = self.warning_count();
        let info_count = self.info_count();

        let _ = writeln!(
            output,
            "Diagnostics: {} error(s), {} warning(s), {} info(s)",
            error_count, warning_count, info_count
        );

        if error_count > 0 {
            output.push_str("\nErrors:\n");
            for diag in self.errors() {
                let _ = writeln!(output, "  {diag}");
            }
        }

        if warning_count > 0 {
            output.push_str("\nWarnings:\n");
            for diag in self.warnings() {
                let _ = writeln!(output, "  {diag}");
            }
        }

        output
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_diagnostic_creation() {
        let diag = Diagnostic::new(
            DiagnosticSeverity::Warning,
            DiagnosticCategory::Holder,
            "Test message",
        );

        assert_eq!(diag.severity, DiagnosticSeverity::Warning);
        assert_eq!(diag.category, DiagnosticCategory::Holder);
        assert_eq!(diag.message, "Test message");
        assert!(diag.container.is_none());
    }

    #[test]
    fn test_diagnostics_container() {
        let diagnostics = Diagnostics::new();

        diagnostics.info(DiagnosticCategory::General, "Info message");
        diagnostics.warning(DiagnosticCategory::Metadata, "Warning message");
        diagnostics.error(DiagnosticCategory::Model, "Error message");

        assert_eq!(diagnostics.count(), 3);
        assert_eq!(diagnostics.error_count(), 1);
        assert_eq!(diagnostics.warning_count(), 1);
        assert_eq!(diagnostics.info_count(), 1);
        assert!(diagnostics.has_errors());
        assert!(diagnostics.has_warnings());
        assert!(diagnostics.has_any());
    }

    #[test]
    fn test_diagnostics_thread_safety() {
        let diagnostics = Arc::new(Diagnostics::new());
        let mut handles = vec![];

        for i in 0..10 {
            let diag_clone = Arc::clone(&diagnostics);
            handles.push(thread::spawn(move || {
                diag_clone.warning_for(
                    DiagnosticCategory::Holder,
                    format!("com/example/C{i}"),
                    "skipped",
                );
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(diagnostics.count(), 10);
        assert_eq!(diagnostics.by_container("com/example/C3").len(), 1);
    }

    #[test]
    fn test_diagnostics_by_category() {
        let diagnostics = Diagnostics::new();

        diagnostics.error(DiagnosticCategory::Model, "Model error 1");
        diagnostics.error(DiagnosticCategory::Model, "Model error 2");
        diagnostics.warning(DiagnosticCategory::Holder, "Holder warning");

        assert_eq!(diagnostics.by_category(DiagnosticCategory::Model).len(), 2);
        assert_eq!(diagnostics.by_category(DiagnosticCategory::Holder).len(), 1);
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::new(
            DiagnosticSeverity::Warning,
            DiagnosticCategory::Metadata,
            "round-trip decode failed",
        )
        .with_container("com/example/Foo");

        let display = format!("{}", diag);
        assert_eq!(
            display,
            "[WARN] Metadata: com/example/Foo: round-trip decode failed"
        );
    }
}
