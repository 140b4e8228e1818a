//! Callable declarations: functions, properties, constructors and type aliases.

use crate::model::{
    annotation::Annotation,
    contract::Contract,
    flags::{
        AccessorFlags, ConstructorFlags, FunctionFlags, PropertyFlags, PropertyJvmFlags,
        TypeAliasFlags, ValueParameterFlags,
    },
    names::NameFunction,
    signatures::{FieldSignature, MethodSignature},
    types::{KotlinType, TypeParameter},
    version::VersionRequirement,
};

/// A value parameter of a function, constructor or property setter.
///
/// A parameter carries a single type. For a `vararg` parameter that type is the
/// element type, written into the vararg-element slot; otherwise it is the declared
/// type.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueParameter {
    /// Parameter flags, including the vararg marker
    pub flags: ValueParameterFlags,
    /// Parameter name
    pub name: String,
    /// Declared type, or the element type of a vararg parameter
    pub ty: KotlinType,
}

impl ValueParameter {
    /// Creates a regular parameter
    pub fn new(name: impl Into<String>, ty: KotlinType) -> Self {
        ValueParameter {
            flags: ValueParameterFlags::default(),
            name: name.into(),
            ty,
        }
    }

    /// Creates a vararg parameter with the given element type
    pub fn vararg(name: impl Into<String>, element_type: KotlinType) -> Self {
        ValueParameter {
            flags: ValueParameterFlags {
                is_vararg: true,
                ..Default::default()
            },
            name: name.into(),
            ty: element_type,
        }
    }
}

/// A function declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    /// Function flags
    pub flags: FunctionFlags,
    /// Function name
    pub name: String,
    /// Type parameters, in declaration order
    pub type_parameters: Vec<TypeParameter>,
    /// Receiver type of an extension function
    pub receiver_type: Option<KotlinType>,
    /// Value parameters, in declaration order
    pub value_parameters: Vec<ValueParameter>,
    /// Return type
    pub return_type: KotlinType,
    /// Version requirement, if any
    pub version_requirement: Option<VersionRequirement>,
    /// Contract, if any
    pub contract: Option<Contract>,
    /// The JVM method backing the function
    pub signature: Option<MethodSignature>,
    /// Name of the class a lambda was compiled from
    pub lambda_class_origin_name: Option<String>,
}

impl Function {
    /// Creates a public final function without parameters
    pub fn new(name: impl Into<String>, return_type: KotlinType) -> Self {
        Function {
            flags: FunctionFlags::default(),
            name: name.into(),
            type_parameters: Vec::new(),
            receiver_type: None,
            value_parameters: Vec::new(),
            return_type,
            version_requirement: None,
            contract: None,
            signature: None,
            lambda_class_origin_name: None,
        }
    }

    /// Applies `f` to every class reference in the function
    pub fn map_class_names(&mut self, f: &dyn NameFunction) {
        for type_parameter in &mut self.type_parameters {
            type_parameter.map_class_names(f);
        }
        if let Some(receiver) = &mut self.receiver_type {
            receiver.map_class_names(f);
        }
        for parameter in &mut self.value_parameters {
            parameter.ty.map_class_names(f);
        }
        self.return_type.map_class_names(f);
        if let Some(contract) = &mut self.contract {
            contract.map_class_names(f);
        }
    }
}

/// A property declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Property flags
    pub flags: PropertyFlags,
    /// Property name
    pub name: String,
    /// Type parameters, in declaration order
    pub type_parameters: Vec<TypeParameter>,
    /// Receiver type of an extension property
    pub receiver_type: Option<KotlinType>,
    /// Declared type
    pub return_type: KotlinType,
    /// Parameter of the setter, if the setter declares one explicitly
    pub setter_parameter: Option<ValueParameter>,
    /// Getter flags
    pub getter_flags: AccessorFlags,
    /// Setter flags
    pub setter_flags: AccessorFlags,
    /// Version requirement, if any
    pub version_requirement: Option<VersionRequirement>,
    /// JVM specific property flags
    pub jvm_flags: PropertyJvmFlags,
    /// Backing field
    pub field_signature: Option<FieldSignature>,
    /// JVM getter method
    pub getter_signature: Option<MethodSignature>,
    /// JVM setter method
    pub setter_signature: Option<MethodSignature>,
    /// Synthetic method holding the annotations of the property
    pub synthetic_method_for_annotations: Option<MethodSignature>,
    /// Synthetic method returning the delegate of a delegated property
    pub synthetic_method_for_delegate: Option<MethodSignature>,
}

impl Property {
    /// Creates a public final `val` without accessors or signatures
    pub fn new(name: impl Into<String>, return_type: KotlinType) -> Self {
        Property {
            flags: PropertyFlags::default(),
            name: name.into(),
            type_parameters: Vec::new(),
            receiver_type: None,
            return_type,
            setter_parameter: None,
            getter_flags: AccessorFlags::default(),
            setter_flags: AccessorFlags::default(),
            version_requirement: None,
            jvm_flags: PropertyJvmFlags::empty(),
            field_signature: None,
            getter_signature: None,
            setter_signature: None,
            synthetic_method_for_annotations: None,
            synthetic_method_for_delegate: None,
        }
    }

    /// Applies `f` to every class reference in the property
    pub fn map_class_names(&mut self, f: &dyn NameFunction) {
        for type_parameter in &mut self.type_parameters {
            type_parameter.map_class_names(f);
        }
        if let Some(receiver) = &mut self.receiver_type {
            receiver.map_class_names(f);
        }
        self.return_type.map_class_names(f);
        if let Some(parameter) = &mut self.setter_parameter {
            parameter.ty.map_class_names(f);
        }
    }
}

/// A constructor declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Constructor {
    /// Constructor flags
    pub flags: ConstructorFlags,
    /// Value parameters, in declaration order
    pub value_parameters: Vec<ValueParameter>,
    /// Version requirement, if any
    pub version_requirement: Option<VersionRequirement>,
    /// The JVM `<init>` method, absent for some synthetic constructors
    pub signature: Option<MethodSignature>,
}

impl Constructor {
    /// Creates a public primary constructor without parameters
    #[must_use]
    pub fn new() -> Self {
        Constructor {
            flags: ConstructorFlags::default(),
            value_parameters: Vec::new(),
            version_requirement: None,
            signature: None,
        }
    }

    /// Applies `f` to every class reference in the constructor
    pub fn map_class_names(&mut self, f: &dyn NameFunction) {
        for parameter in &mut self.value_parameters {
            parameter.ty.map_class_names(f);
        }
    }
}

impl Default for Constructor {
    fn default() -> Self {
        Self::new()
    }
}

/// A type alias declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeAlias {
    /// Alias flags
    pub flags: TypeAliasFlags,
    /// Alias name
    pub name: String,
    /// Type parameters, in declaration order
    pub type_parameters: Vec<TypeParameter>,
    /// The type as written on the right hand side
    pub underlying_type: KotlinType,
    /// The fully expanded type
    pub expanded_type: KotlinType,
    /// Annotations on the alias
    pub annotations: Vec<Annotation>,
    /// Version requirement, if any
    pub version_requirement: Option<VersionRequirement>,
}

impl TypeAlias {
    /// Creates an alias whose underlying and expanded type are the same
    pub fn new(name: impl Into<String>, ty: KotlinType) -> Self {
        TypeAlias {
            flags: TypeAliasFlags::default(),
            name: name.into(),
            type_parameters: Vec::new(),
            underlying_type: ty.clone(),
            expanded_type: ty,
            annotations: Vec::new(),
            version_requirement: None,
        }
    }

    /// Applies `f` to every class reference in the alias
    pub fn map_class_names(&mut self, f: &dyn NameFunction) {
        for type_parameter in &mut self.type_parameters {
            type_parameter.map_class_names(f);
        }
        self.underlying_type.map_class_names(f);
        self.expanded_type.map_class_names(f);
    }
}

/// The declarations shared by classes, file facades and multi-file parts.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeclarationContainer {
    /// Functions, in declaration order
    pub functions: Vec<Function>,
    /// Properties, in declaration order
    pub properties: Vec<Property>,
    /// Type aliases, in declaration order
    pub type_aliases: Vec<TypeAlias>,
    /// Local delegated properties, stored in the container's extension block
    pub local_delegated_properties: Vec<Property>,
}

impl DeclarationContainer {
    /// Applies `f` to every class reference in the container
    pub fn map_class_names(&mut self, f: &dyn NameFunction) {
        for function in &mut self.functions {
            function.map_class_names(f);
        }
        for property in self
            .properties
            .iter_mut()
            .chain(&mut self.local_delegated_properties)
        {
            property.map_class_names(f);
        }
        for alias in &mut self.type_aliases {
            alias.map_class_names(f);
        }
    }
}
