//! Flag sets for Kotlin declarations.
//!
//! Every declaration in the node model carries a flag set that the wire format stores
//! as a single packed integer. This module defines the enums and `bitflags` types that
//! make up those flag sets, together with the projections between the packed integer
//! and the structured representation.
//!
//! # Bit Layout
//!
//! All declaration flag words share a common prefix:
//!
//! | Bits  | Meaning                                   |
//! |-------|-------------------------------------------|
//! | 0     | has annotations                           |
//! | 1..=3 | [`Visibility`]                            |
//! | 4..=5 | [`Modality`] (where applicable)           |
//! | 6..   | declaration kind, then per-kind attributes |
//!
//! Types, type parameters, value parameters and effect expressions have their own
//! short flag words without the common prefix.
//!
//! # Key Types
//! - [`Visibility`], [`Modality`], [`ClassKind`], [`MemberKind`]: enumerated flag fields
//! - [`ClassFlags`], [`FunctionFlags`], [`PropertyFlags`], [`AccessorFlags`],
//!   [`ConstructorFlags`], [`TypeAliasFlags`]: declaration flag sets
//! - [`TypeFlags`], [`TypeParameterFlags`], [`ValueParameterFlags`],
//!   [`EffectExpressionFlags`], [`PropertyJvmFlags`]: small flag sets

use bitflags::bitflags;
use strum::{EnumIter, FromRepr};

/// Bit signalling that the declaration carries annotations
pub const HAS_ANNOTATIONS: u32 = 0x0001;
/// Shift of the [`Visibility`] field
pub const VISIBILITY_SHIFT: u32 = 1;
/// Bitmask for [`Visibility`] extraction (after shifting)
pub const VISIBILITY_MASK: u32 = 0x0007;
/// Shift of the [`Modality`] field
pub const MODALITY_SHIFT: u32 = 4;
/// Bitmask for [`Modality`] extraction (after shifting)
pub const MODALITY_MASK: u32 = 0x0003;
/// Shift of the declaration kind field ([`ClassKind`] or [`MemberKind`])
pub const KIND_SHIFT: u32 = 6;
/// Bitmask for [`ClassKind`] extraction (after shifting)
pub const CLASS_KIND_MASK: u32 = 0x0007;
/// Bitmask for [`MemberKind`] extraction (after shifting)
pub const MEMBER_KIND_MASK: u32 = 0x0003;

/// Visibility of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, EnumIter, FromRepr)]
#[repr(u8)]
pub enum Visibility {
    /// Visible everywhere in the same module
    Internal = 0,
    /// Visible inside the containing file or class only
    Private = 1,
    /// Visible in the class and its subclasses
    Protected = 2,
    /// Visible everywhere
    #[default]
    Public = 3,
    /// Visible only on the same instance of the declaring class
    PrivateToThis = 4,
    /// Declared inside a code block, not visible from outside
    Local = 5,
}

/// Modality of a class or member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, EnumIter, FromRepr)]
#[repr(u8)]
pub enum Modality {
    /// Cannot be overridden or subclassed
    #[default]
    Final = 0,
    /// Can be overridden or subclassed
    Open = 1,
    /// Has no implementation
    Abstract = 2,
    /// Has a closed set of subclasses
    Sealed = 3,
}

/// Kind of a class declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, EnumIter, FromRepr)]
#[repr(u8)]
pub enum ClassKind {
    /// A plain class
    #[default]
    Class = 0,
    /// An interface
    Interface = 1,
    /// An enum class
    EnumClass = 2,
    /// An enum entry with its own body
    EnumEntry = 3,
    /// An annotation class
    AnnotationClass = 4,
    /// An `object` declaration
    Object = 5,
    /// A companion object
    CompanionObject = 6,
}

/// Kind of a callable member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, EnumIter, FromRepr)]
#[repr(u8)]
pub enum MemberKind {
    /// Declared in source
    #[default]
    Declaration = 0,
    /// Inherited without being overridden
    FakeOverride = 1,
    /// Generated by interface delegation
    Delegation = 2,
    /// Synthesized by the compiler
    Synthesized = 3,
}

fn pack_common(has_annotations: bool, visibility: Visibility) -> u32 {
    let mut flags = u32::from(visibility as u8) << VISIBILITY_SHIFT;
    if has_annotations {
        flags |= HAS_ANNOTATIONS;
    }
    flags
}

fn unpack_visibility(flags: u32) -> Visibility {
    Visibility::from_repr(((flags >> VISIBILITY_SHIFT) & VISIBILITY_MASK) as u8).unwrap_or_default()
}

fn unpack_modality(flags: u32) -> Modality {
    Modality::from_repr(((flags >> MODALITY_SHIFT) & MODALITY_MASK) as u8).unwrap_or_default()
}

fn unpack_member_kind(flags: u32) -> MemberKind {
    MemberKind::from_repr(((flags >> KIND_SHIFT) & MEMBER_KIND_MASK) as u8).unwrap_or_default()
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// Class specific attributes
    pub struct ClassAttributes: u32 {
        /// Inner class, holds a reference to the outer instance
        const INNER = 1 << 9;
        /// Data class
        const DATA = 1 << 10;
        /// External class
        const EXTERNAL = 1 << 11;
        /// Expected (multiplatform) class
        const EXPECT = 1 << 12;
        /// Value (inline) class
        const VALUE = 1 << 13;
        /// Functional interface
        const FUN = 1 << 14;
        /// Enum class exposing the `entries` property
        const HAS_ENUM_ENTRIES = 1 << 15;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// Function specific attributes
    pub struct FunctionAttributes: u32 {
        /// `operator` function
        const OPERATOR = 1 << 8;
        /// `infix` function
        const INFIX = 1 << 9;
        /// `inline` function
        const INLINE = 1 << 10;
        /// `tailrec` function
        const TAILREC = 1 << 11;
        /// `external` function
        const EXTERNAL = 1 << 12;
        /// `suspend` function
        const SUSPEND = 1 << 13;
        /// `expect` function
        const EXPECT = 1 << 14;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// Property specific attributes
    pub struct PropertyAttributes: u32 {
        /// `var` property
        const VAR = 1 << 8;
        /// Property has a getter
        const HAS_GETTER = 1 << 9;
        /// Property has a setter
        const HAS_SETTER = 1 << 10;
        /// `const` property
        const CONST = 1 << 11;
        /// `lateinit` property
        const LATEINIT = 1 << 12;
        /// Property has a compile time constant initializer
        const HAS_CONSTANT = 1 << 13;
        /// `external` property
        const EXTERNAL = 1 << 14;
        /// Delegated property
        const DELEGATED = 1 << 15;
        /// `expect` property
        const EXPECT = 1 << 16;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// Property accessor specific attributes
    pub struct AccessorAttributes: u32 {
        /// Accessor has a body or annotations
        const NOT_DEFAULT = 1 << 6;
        /// `external` accessor
        const EXTERNAL = 1 << 7;
        /// `inline` accessor
        const INLINE = 1 << 8;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// Constructor specific attributes
    pub struct ConstructorAttributes: u32 {
        /// Secondary constructor
        const SECONDARY = 1 << 4;
        /// Parameter names are not stable across overrides
        const NON_STABLE_PARAMETER_NAMES = 1 << 5;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// Flags of a type usage
    pub struct TypeFlags: u32 {
        /// Nullable type (`T?`)
        const NULLABLE = 1 << 0;
        /// Suspend function type
        const SUSPEND = 1 << 1;
        /// Definitely non-null type (`T & Any`)
        const DEFINITELY_NON_NULL = 1 << 2;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// Flags of a type parameter
    pub struct TypeParameterFlags: u32 {
        /// `reified` type parameter
        const REIFIED = 1 << 0;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// Flags of an effect expression
    pub struct EffectExpressionFlags: u32 {
        /// Expression is negated
        const NEGATED = 1 << 0;
        /// Expression checks the parameter against `null`
        const NULL_CHECK_PREDICATE = 1 << 1;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// JVM specific property flags, stored in the property extension block
    pub struct PropertyJvmFlags: u32 {
        /// Backing field was moved out of an interface companion object
        const MOVED_FROM_INTERFACE_COMPANION = 1 << 0;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// Value parameter flags as stored on the wire
    pub struct ValueParameterAttributes: u32 {
        /// Parameter has annotations
        const HAS_ANNOTATIONS = 1 << 0;
        /// Parameter declares a default value
        const DECLARES_DEFAULT_VALUE = 1 << 1;
        /// `crossinline` lambda parameter
        const CROSSINLINE = 1 << 2;
        /// `noinline` lambda parameter
        const NOINLINE = 1 << 3;
    }
}

/// Flag set of a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ClassFlags {
    /// Class carries annotations
    pub has_annotations: bool,
    /// Visibility of the class
    pub visibility: Visibility,
    /// Modality of the class
    pub modality: Modality,
    /// Kind of the class
    pub kind: ClassKind,
    /// Remaining class attributes
    pub attributes: ClassAttributes,
}

impl ClassFlags {
    /// Packs the flag set into its wire representation
    #[must_use]
    pub fn as_int(&self) -> u32 {
        pack_common(self.has_annotations, self.visibility)
            | u32::from(self.modality as u8) << MODALITY_SHIFT
            | u32::from(self.kind as u8) << KIND_SHIFT
            | self.attributes.bits()
    }

    /// Unpacks a flag set from its wire representation
    #[must_use]
    pub fn from_int(flags: u32) -> Self {
        ClassFlags {
            has_annotations: flags & HAS_ANNOTATIONS != 0,
            visibility: unpack_visibility(flags),
            modality: unpack_modality(flags),
            kind: ClassKind::from_repr(((flags >> KIND_SHIFT) & CLASS_KIND_MASK) as u8)
                .unwrap_or_default(),
            attributes: ClassAttributes::from_bits_truncate(flags),
        }
    }
}

/// Flag set of a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FunctionFlags {
    /// Function carries annotations
    pub has_annotations: bool,
    /// Visibility of the function
    pub visibility: Visibility,
    /// Modality of the function
    pub modality: Modality,
    /// How the function came to be
    pub member_kind: MemberKind,
    /// Remaining function attributes
    pub attributes: FunctionAttributes,
}

impl FunctionFlags {
    /// Packs the flag set into its wire representation
    #[must_use]
    pub fn as_int(&self) -> u32 {
        pack_common(self.has_annotations, self.visibility)
            | u32::from(self.modality as u8) << MODALITY_SHIFT
            | u32::from(self.member_kind as u8) << KIND_SHIFT
            | self.attributes.bits()
    }

    /// Unpacks a flag set from its wire representation
    #[must_use]
    pub fn from_int(flags: u32) -> Self {
        FunctionFlags {
            has_annotations: flags & HAS_ANNOTATIONS != 0,
            visibility: unpack_visibility(flags),
            modality: unpack_modality(flags),
            member_kind: unpack_member_kind(flags),
            attributes: FunctionAttributes::from_bits_truncate(flags),
        }
    }
}

/// Flag set of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PropertyFlags {
    /// Property carries annotations
    pub has_annotations: bool,
    /// Visibility of the property
    pub visibility: Visibility,
    /// Modality of the property
    pub modality: Modality,
    /// How the property came to be
    pub member_kind: MemberKind,
    /// Remaining property attributes
    pub attributes: PropertyAttributes,
}

impl PropertyFlags {
    /// Packs the flag set into its wire representation
    #[must_use]
    pub fn as_int(&self) -> u32 {
        pack_common(self.has_annotations, self.visibility)
            | u32::from(self.modality as u8) << MODALITY_SHIFT
            | u32::from(self.member_kind as u8) << KIND_SHIFT
            | self.attributes.bits()
    }

    /// Unpacks a flag set from its wire representation
    #[must_use]
    pub fn from_int(flags: u32) -> Self {
        PropertyFlags {
            has_annotations: flags & HAS_ANNOTATIONS != 0,
            visibility: unpack_visibility(flags),
            modality: unpack_modality(flags),
            member_kind: unpack_member_kind(flags),
            attributes: PropertyAttributes::from_bits_truncate(flags),
        }
    }
}

/// Flag set of a property getter or setter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AccessorFlags {
    /// Accessor carries annotations
    pub has_annotations: bool,
    /// Visibility of the accessor
    pub visibility: Visibility,
    /// Modality of the accessor
    pub modality: Modality,
    /// Remaining accessor attributes
    pub attributes: AccessorAttributes,
}

impl AccessorFlags {
    /// Packs the flag set into its wire representation
    #[must_use]
    pub fn as_int(&self) -> u32 {
        pack_common(self.has_annotations, self.visibility)
            | u32::from(self.modality as u8) << MODALITY_SHIFT
            | self.attributes.bits()
    }

    /// Unpacks a flag set from its wire representation
    #[must_use]
    pub fn from_int(flags: u32) -> Self {
        AccessorFlags {
            has_annotations: flags & HAS_ANNOTATIONS != 0,
            visibility: unpack_visibility(flags),
            modality: unpack_modality(flags),
            attributes: AccessorAttributes::from_bits_truncate(flags),
        }
    }
}

/// Flag set of a constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ConstructorFlags {
    /// Constructor carries annotations
    pub has_annotations: bool,
    /// Visibility of the constructor
    pub visibility: Visibility,
    /// Remaining constructor attributes
    pub attributes: ConstructorAttributes,
}

impl ConstructorFlags {
    /// Packs the flag set into its wire representation
    #[must_use]
    pub fn as_int(&self) -> u32 {
        pack_common(self.has_annotations, self.visibility) | self.attributes.bits()
    }

    /// Unpacks a flag set from its wire representation
    #[must_use]
    pub fn from_int(flags: u32) -> Self {
        ConstructorFlags {
            has_annotations: flags & HAS_ANNOTATIONS != 0,
            visibility: unpack_visibility(flags),
            attributes: ConstructorAttributes::from_bits_truncate(flags),
        }
    }
}

/// Flag set of a type alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TypeAliasFlags {
    /// Alias carries annotations
    pub has_annotations: bool,
    /// Visibility of the alias
    pub visibility: Visibility,
}

impl TypeAliasFlags {
    /// Packs the flag set into its wire representation
    #[must_use]
    pub fn as_int(&self) -> u32 {
        pack_common(self.has_annotations, self.visibility)
    }

    /// Unpacks a flag set from its wire representation
    #[must_use]
    pub fn from_int(flags: u32) -> Self {
        TypeAliasFlags {
            has_annotations: flags & HAS_ANNOTATIONS != 0,
            visibility: unpack_visibility(flags),
        }
    }
}

/// Flag set of a value parameter.
///
/// `is_vararg` is not part of the packed integer: the wire format expresses it by
/// writing the parameter type into the vararg-element slot instead of the
/// declared-type slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ValueParameterFlags {
    /// Packed attributes
    pub attributes: ValueParameterAttributes,
    /// Parameter is a `vararg`
    pub is_vararg: bool,
}

impl ValueParameterFlags {
    /// Packs the flag set into its wire representation
    #[must_use]
    pub fn as_int(&self) -> u32 {
        self.attributes.bits()
    }

    /// Unpacks a flag set from its wire representation
    #[must_use]
    pub fn from_int(flags: u32, is_vararg: bool) -> Self {
        ValueParameterFlags {
            attributes: ValueParameterAttributes::from_bits_truncate(flags),
            is_vararg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn class_flags_roundtrip_every_kind() {
        for kind in ClassKind::iter() {
            for visibility in Visibility::iter() {
                let flags = ClassFlags {
                    has_annotations: true,
                    visibility,
                    modality: Modality::Sealed,
                    kind,
                    attributes: ClassAttributes::DATA | ClassAttributes::FUN,
                };
                assert_eq!(ClassFlags::from_int(flags.as_int()), flags);
            }
        }
    }

    #[test]
    fn public_final_function() {
        let flags = FunctionFlags {
            visibility: Visibility::Public,
            ..Default::default()
        };
        // public = 3 << 1
        assert_eq!(flags.as_int(), 0b110);
        assert_eq!(FunctionFlags::from_int(0b110), flags);
    }

    #[test]
    fn property_attributes_do_not_overlap_kind() {
        let flags = PropertyFlags {
            member_kind: MemberKind::Synthesized,
            attributes: PropertyAttributes::VAR | PropertyAttributes::EXPECT,
            ..Default::default()
        };
        let decoded = PropertyFlags::from_int(flags.as_int());
        assert_eq!(decoded.member_kind, MemberKind::Synthesized);
        assert!(decoded.attributes.contains(PropertyAttributes::VAR));
        assert!(decoded.attributes.contains(PropertyAttributes::EXPECT));
    }

    #[test]
    fn unknown_visibility_falls_back_to_default() {
        let flags = TypeAliasFlags::from_int(7 << VISIBILITY_SHIFT);
        assert_eq!(flags.visibility, Visibility::Public);
    }

    #[test]
    fn vararg_is_not_packed() {
        let flags = ValueParameterFlags {
            attributes: ValueParameterAttributes::NOINLINE,
            is_vararg: true,
        };
        assert_eq!(flags.as_int(), ValueParameterAttributes::NOINLINE.bits());
    }
}
