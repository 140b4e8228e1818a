//! The class file side of metadata embedding.
//!
//! A deliberately small model of a JVM class file: enough to locate the
//! `kotlin.Metadata` annotation, allocate constants for its new values and compact the
//! constant pool afterwards. Parsing and serializing class files is left to the
//! caller.
//!
//! # Key Components
//!
//! - [`ConstantPool`] - Indexed constants, growing by fresh allocation
//! - [`Annotation`] / [`ElementValue`] - Runtime visible annotations
//! - [`ProgramClass`] - A class with its pool and attributes
//! - [`shrinker::compact`] - Removal of unreferenced constants
//! - [`ClassVisitor`] - Hook run on a class after a successful rewrite

pub mod annotation;
pub mod class;
pub mod constant_pool;
pub mod shrinker;

pub use annotation::{Annotation, ElementValue, ElementValuePair};
pub use class::{AnnotationLocation, Attribute, ClassVisitor, ProgramClass};
pub use constant_pool::{modified_utf8_len, Constant, ConstantPool, MAX_UTF8_LENGTH};
