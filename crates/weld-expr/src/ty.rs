//! Semantic type descriptors for binding expressions.
//!
//! A [`TypeDesc`] is what the type model hands back for a resolved name: a
//! fully-qualified type name plus a coarse classification (primitive,
//! reference, or the type of the `null` literal). Operator typing only needs
//! that classification and the numeric promotion order defined here.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Fully-qualified name of the host string type.
pub const STRING_TYPE: &str = "java.lang.String";

/// Fully-qualified name of the host root object type.
pub const OBJECT_TYPE: &str = "java.lang.Object";

/// A primitive host type.
///
/// Variants are declared in widening order for the numeric ones, so the
/// derived `Ord` can be used for binary numeric promotion.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
}

impl Primitive {
    /// Look a primitive up by its keyword (`int`, `boolean`, ...).
    pub fn from_keyword(name: &str) -> Option<Primitive> {
        let prim = match name {
            "boolean" => Primitive::Boolean,
            "byte" => Primitive::Byte,
            "short" => Primitive::Short,
            "char" => Primitive::Char,
            "int" => Primitive::Int,
            "long" => Primitive::Long,
            "float" => Primitive::Float,
            "double" => Primitive::Double,
            _ => return None,
        };
        Some(prim)
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Byte => "byte",
            Primitive::Short => "short",
            Primitive::Char => "char",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
        }
    }

    pub fn is_numeric(self) -> bool {
        self != Primitive::Boolean
    }

    pub fn is_integral(self) -> bool {
        matches!(
            self,
            Primitive::Byte | Primitive::Short | Primitive::Char | Primitive::Int | Primitive::Long
        )
    }
}

/// Classification of a [`TypeDesc`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Primitive(Primitive),
    Reference,
    /// The type of the `null` literal; assignable to any reference type.
    Null,
}

/// A resolved type, as supplied by the type model.
///
/// Identity is the fully-qualified name; two descriptors with the same name
/// denote the same type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeDesc {
    pub name: String,
    pub kind: TypeKind,
}

impl TypeDesc {
    pub fn primitive(prim: Primitive) -> TypeDesc {
        TypeDesc {
            name: prim.keyword().to_string(),
            kind: TypeKind::Primitive(prim),
        }
    }

    /// A reference (class) type with the given fully-qualified name.
    pub fn reference(name: impl Into<String>) -> TypeDesc {
        TypeDesc {
            name: name.into(),
            kind: TypeKind::Reference,
        }
    }

    pub fn boolean() -> TypeDesc {
        TypeDesc::primitive(Primitive::Boolean)
    }

    pub fn int() -> TypeDesc {
        TypeDesc::primitive(Primitive::Int)
    }

    pub fn long() -> TypeDesc {
        TypeDesc::primitive(Primitive::Long)
    }

    pub fn float() -> TypeDesc {
        TypeDesc::primitive(Primitive::Float)
    }

    pub fn double() -> TypeDesc {
        TypeDesc::primitive(Primitive::Double)
    }

    pub fn char() -> TypeDesc {
        TypeDesc::primitive(Primitive::Char)
    }

    pub fn string() -> TypeDesc {
        TypeDesc::reference(STRING_TYPE)
    }

    pub fn object() -> TypeDesc {
        TypeDesc::reference(OBJECT_TYPE)
    }

    pub fn null() -> TypeDesc {
        TypeDesc {
            name: "null".to_string(),
            kind: TypeKind::Null,
        }
    }

    pub fn as_primitive(&self) -> Option<Primitive> {
        match self.kind {
            TypeKind::Primitive(p) => Some(p),
            _ => None,
        }
    }

    pub fn is_boolean(&self) -> bool {
        self.as_primitive() == Some(Primitive::Boolean)
    }

    pub fn is_numeric(&self) -> bool {
        self.as_primitive().is_some_and(Primitive::is_numeric)
    }

    pub fn is_integral(&self) -> bool {
        self.as_primitive().is_some_and(Primitive::is_integral)
    }

    pub fn is_string(&self) -> bool {
        self.kind == TypeKind::Reference && self.name == STRING_TYPE
    }

    pub fn is_null(&self) -> bool {
        self.kind == TypeKind::Null
    }

    pub fn is_reference(&self) -> bool {
        self.kind == TypeKind::Reference
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Unary numeric promotion: anything narrower than `int` becomes `int`.
///
/// Returns `None` for non-numeric types.
pub fn unary_promotion(ty: &TypeDesc) -> Option<TypeDesc> {
    let prim = ty.as_primitive().filter(|p| p.is_numeric())?;
    Some(TypeDesc::primitive(prim.max(Primitive::Int)))
}

/// Binary numeric promotion: the wider of both operands, at least `int`.
pub fn binary_promotion(lhs: &TypeDesc, rhs: &TypeDesc) -> Option<TypeDesc> {
    let l = lhs.as_primitive().filter(|p| p.is_numeric())?;
    let r = rhs.as_primitive().filter(|p| p.is_numeric())?;
    Some(TypeDesc::primitive(l.max(r).max(Primitive::Int)))
}
