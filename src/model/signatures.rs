//! JVM member signatures.
//!
//! A signature identifies a method or field of the class file that backs a Kotlin
//! declaration. It is a plain `(name, descriptor)` pair with value semantics.
//!
//! The string forms follow the usual JVM conventions: a method signature is the name
//! directly followed by the descriptor (`getX()I`), a field signature separates the two
//! with a colon (`x:I`).

use std::fmt;

use crate::Result;

/// Signature of a JVM method.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodSignature {
    /// Method name, e.g. `getX`
    pub name: String,
    /// Method descriptor, e.g. `()I`
    pub descriptor: String,
}

impl MethodSignature {
    /// Creates a new method signature
    pub fn new(name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        MethodSignature {
            name: name.into(),
            descriptor: descriptor.into(),
        }
    }

    /// Parses the `name(descriptor)` string form.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if the string contains no parameter list.
    pub fn parse(value: &str) -> Result<Self> {
        match value.find('(') {
            Some(split) if split > 0 => Ok(MethodSignature::new(&value[..split], &value[split..])),
            _ => Err(malformed_error!("Invalid method signature - {}", value)),
        }
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.descriptor)
    }
}

/// Signature of a JVM field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldSignature {
    /// Field name
    pub name: String,
    /// Field descriptor, e.g. `Ljava/lang/String;`
    pub descriptor: String,
}

impl FieldSignature {
    /// Creates a new field signature
    pub fn new(name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        FieldSignature {
            name: name.into(),
            descriptor: descriptor.into(),
        }
    }

    /// Parses the `name:descriptor` string form.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if the string contains no separator.
    pub fn parse(value: &str) -> Result<Self> {
        match value.split_once(':') {
            Some((name, descriptor)) if !name.is_empty() => {
                Ok(FieldSignature::new(name, descriptor))
            }
            _ => Err(malformed_error!("Invalid field signature - {}", value)),
        }
    }
}

impl fmt::Display for FieldSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn method_signature_string_form() {
        let sig = MethodSignature::new("getX", "()I");
        assert_eq!(sig.to_string(), "getX()I");
        assert_eq!(MethodSignature::parse("getX()I").unwrap(), sig);
        assert!(MethodSignature::parse("getX").is_err());
        assert!(MethodSignature::parse("()V").is_err());
    }

    #[test]
    fn field_signature_string_form() {
        let sig = FieldSignature::new("x", "Ljava/lang/String;");
        assert_eq!(sig.to_string(), "x:Ljava/lang/String;");
        assert_eq!(FieldSignature::parse("x:Ljava/lang/String;").unwrap(), sig);
        assert!(FieldSignature::parse("x").is_err());
    }

    #[test]
    fn signatures_compare_by_value() {
        let mut set = HashSet::new();
        set.insert(MethodSignature::new("f", "()V"));
        assert!(set.contains(&MethodSignature::new("f", "()V")));
        assert!(!set.contains(&MethodSignature::new("f", "(I)V")));
    }
}
