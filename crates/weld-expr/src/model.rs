//! The type model: how names become [`TypeDesc`]s.
//!
//! The engine consumes the [`TypeModel`] trait only. [`TypeCatalog`] is an
//! in-memory implementation backed by declared classes, used by the driver
//! and by tests; a reflective model can be plugged in instead.

use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::ty::{Primitive, TypeDesc, TypeKind, OBJECT_TYPE};

/// Error returned when a type name cannot be resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeNotFound {
    pub name: String,
}

impl fmt::Display for TypeNotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot find type `{}`", self.name)
    }
}

impl std::error::Error for TypeNotFound {}

/// The pluggable type model queried during resolution.
///
/// Lookups are synchronous, in-memory queries. Implementations must be
/// deterministic: the engine memoizes every answer per node.
pub trait TypeModel {
    /// Resolve a (possibly aliased, possibly dotted) type name.
    fn find_type(&self, name: &str, imports: &ImportTable) -> Result<TypeDesc, TypeNotFound>;

    /// The type of field `field` on `owner`, if it exists.
    fn field_type(&self, owner: &TypeDesc, field: &str) -> Option<TypeDesc>;

    /// The return type of `owner.method(args)`, if a matching method exists.
    fn method_return_type(
        &self,
        owner: &TypeDesc,
        method: &str,
        args: &[TypeDesc],
    ) -> Option<TypeDesc>;
}

impl<M: TypeModel + ?Sized> TypeModel for &M {
    fn find_type(&self, name: &str, imports: &ImportTable) -> Result<TypeDesc, TypeNotFound> {
        (**self).find_type(name, imports)
    }

    fn field_type(&self, owner: &TypeDesc, field: &str) -> Option<TypeDesc> {
        (**self).field_type(owner, field)
    }

    fn method_return_type(
        &self,
        owner: &TypeDesc,
        method: &str,
        args: &[TypeDesc],
    ) -> Option<TypeDesc> {
        (**self).method_return_type(owner, method, args)
    }
}

// ── Imports ────────────────────────────────────────────────────────────

/// Alias → fully-qualified name table of one compilation unit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImportTable {
    aliases: FxHashMap<String, String>,
}

impl ImportTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Import `qualified` under an explicit alias.
    pub fn insert(&mut self, alias: impl Into<String>, qualified: impl Into<String>) {
        self.aliases.insert(alias.into(), qualified.into());
    }

    /// Import `qualified` under its simple name (`a.b.View` → `View`).
    pub fn import(&mut self, qualified: &str) {
        let simple = qualified.rsplit('.').next().unwrap_or(qualified);
        self.insert(simple, qualified);
    }

    /// Add every entry of `other` whose alias is not already present.
    pub fn merge_missing(&mut self, other: &ImportTable) {
        for (alias, qualified) in &other.aliases {
            self.aliases
                .entry(alias.clone())
                .or_insert_with(|| qualified.clone());
        }
    }

    pub fn get(&self, alias: &str) -> Option<&str> {
        self.aliases.get(alias).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Expand a leading alias: `View.OnClick` → `android.view.View.OnClick`.
    ///
    /// Returns `None` when the first segment is not an alias.
    pub fn qualify(&self, name: &str) -> Option<String> {
        let (head, rest) = match name.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (name, None),
        };
        let qualified = self.aliases.get(head)?;
        Some(match rest {
            Some(rest) => format!("{}.{}", qualified, rest),
            None => qualified.clone(),
        })
    }
}

// ── In-memory catalog ──────────────────────────────────────────────────

/// A method signature in a [`ClassInfo`]. Types are stored by name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodInfo {
    pub name: String,
    #[serde(default)]
    pub params: Vec<String>,
    pub returns: String,
}

/// Members of one class. Types are stored by name and resolved lazily.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassInfo {
    #[serde(default)]
    pub superclass: Option<String>,
    #[serde(default)]
    pub fields: FxHashMap<String, String>,
    #[serde(default)]
    pub methods: Vec<MethodInfo>,
}

impl ClassInfo {
    pub fn field(&mut self, name: &str, ty: &str) -> &mut Self {
        self.fields.insert(name.to_string(), ty.to_string());
        self
    }

    pub fn method(&mut self, name: &str, params: &[&str], returns: &str) -> &mut Self {
        self.methods.push(MethodInfo {
            name: name.to_string(),
            params: params.iter().map(|p| p.to_string()).collect(),
            returns: returns.to_string(),
        });
        self
    }

    pub fn extends(&mut self, superclass: &str) -> &mut Self {
        self.superclass = Some(superclass.to_string());
        self
    }
}

/// An in-memory [`TypeModel`] over a fixed set of classes.
///
/// Name lookup order: primitive keyword, import alias expansion, exact
/// class name, then `default_package.name` for simple names.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TypeCatalog {
    #[serde(default)]
    pub default_package: Option<String>,
    #[serde(default)]
    pub classes: FxHashMap<String, ClassInfo>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_package(mut self, package: &str) -> Self {
        self.default_package = Some(package.to_string());
        self
    }

    /// Register a class (or return the existing entry) by fully-qualified name.
    pub fn add_class(&mut self, name: &str) -> &mut ClassInfo {
        self.classes.entry(name.to_string()).or_default()
    }

    /// Resolve a name without any imports in scope.
    fn lookup(&self, name: &str) -> Option<TypeDesc> {
        if let Some(prim) = Primitive::from_keyword(name) {
            return Some(TypeDesc::primitive(prim));
        }
        if self.classes.contains_key(name) {
            return Some(TypeDesc::reference(name));
        }
        if !name.contains('.') {
            if let Some(package) = &self.default_package {
                let qualified = format!("{}.{}", package, name);
                if self.classes.contains_key(&qualified) {
                    return Some(TypeDesc::reference(qualified));
                }
            }
        }
        None
    }

    /// Walk `owner` and its superclasses, ending at the root object type.
    fn ancestry<'a>(&'a self, owner: &'a str) -> Vec<&'a ClassInfo> {
        let mut chain = Vec::new();
        let mut seen = FxHashSet::default();
        let mut current = Some(owner);
        while let Some(name) = current {
            if !seen.insert(name) {
                break;
            }
            let Some(info) = self.classes.get(name) else {
                break;
            };
            chain.push(info);
            current = match info.superclass.as_deref() {
                Some(sup) => Some(sup),
                None if name != OBJECT_TYPE => Some(OBJECT_TYPE),
                None => None,
            };
        }
        chain
    }

    fn accepts(&self, param: &str, arg: &TypeDesc) -> bool {
        let Some(param_ty) = self.lookup(param) else {
            return false;
        };
        if param_ty == *arg {
            return true;
        }
        match (param_ty.kind, arg.kind) {
            (TypeKind::Reference, TypeKind::Null) => true,
            (TypeKind::Reference, TypeKind::Reference) => {
                param_ty.name == OBJECT_TYPE || self.is_subclass(&arg.name, &param_ty.name)
            }
            // char widens to int and up, but nothing widens to char.
            (TypeKind::Primitive(Primitive::Char), TypeKind::Primitive(_)) => false,
            (TypeKind::Primitive(p), TypeKind::Primitive(Primitive::Char)) => p > Primitive::Char,
            (TypeKind::Primitive(p), TypeKind::Primitive(a)) => {
                p.is_numeric() && a.is_numeric() && a <= p
            }
            _ => false,
        }
    }

    fn is_subclass(&self, class: &str, ancestor: &str) -> bool {
        let mut seen = FxHashSet::default();
        let mut current = Some(class);
        while let Some(name) = current {
            if name == ancestor {
                return true;
            }
            if !seen.insert(name) {
                return false;
            }
            current = self
                .classes
                .get(name)
                .and_then(|info| info.superclass.as_deref());
        }
        false
    }
}

impl TypeModel for TypeCatalog {
    fn find_type(&self, name: &str, imports: &ImportTable) -> Result<TypeDesc, TypeNotFound> {
        if let Some(qualified) = imports.qualify(name) {
            if let Some(ty) = self.lookup(&qualified) {
                return Ok(ty);
            }
        }
        self.lookup(name).ok_or_else(|| TypeNotFound {
            name: name.to_string(),
        })
    }

    fn field_type(&self, owner: &TypeDesc, field: &str) -> Option<TypeDesc> {
        self.ancestry(&owner.name)
            .into_iter()
            .find_map(|info| info.fields.get(field))
            .and_then(|ty| self.lookup(ty))
    }

    fn method_return_type(
        &self,
        owner: &TypeDesc,
        method: &str,
        args: &[TypeDesc],
    ) -> Option<TypeDesc> {
        self.ancestry(&owner.name)
            .into_iter()
            .flat_map(|info| info.methods.iter())
            .find(|m| {
                m.name == method
                    && m.params.len() == args.len()
                    && m.params.iter().zip(args).all(|(p, a)| self.accepts(p, a))
            })
            .and_then(|m| self.lookup(&m.returns))
    }
}
