//! Source declarations consumed by the binder
//!
//! The parser is an external collaborator; it hands over one
//! [`CompilationUnitDecl`] per unit with expression bodies already reduced
//! to what binding resolution needs (for callin methods, the control-flow
//! skeleton of base calls). All types deserialize from JSON.

use roleweave_descriptor::{BaseType, CallinKind, CalloutKind, Modifier, Modifiers};
use roleweave_diagnostics::Span;
use serde::{Deserialize, Serialize};

/// One compilation unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilationUnitDecl {
    /// File name including extension (`Tm.rw`)
    pub file_name: String,
    /// Declared package, empty for the default package
    #[serde(default)]
    pub package: String,
    /// For role files: qualified name of the owning team
    #[serde(default)]
    pub team_package: Option<String>,
    /// Imports in declaration order, base imports included
    #[serde(default)]
    pub imports: Vec<ImportDecl>,
    /// Top-level types in declaration order
    #[serde(default)]
    pub types: Vec<TypeDecl>,
    /// Source text, used only for rendering diagnostics
    #[serde(default)]
    pub source: Option<String>,
}

impl CompilationUnitDecl {
    /// File name without extension
    pub fn file_stem(&self) -> &str {
        match self.file_name.rfind('.') {
            Some(i) => &self.file_name[..i],
            None => &self.file_name,
        }
    }

    /// Package the unit's types live in: the team package for role files
    pub fn effective_package(&self) -> &str {
        self.team_package.as_deref().unwrap_or(&self.package)
    }
}

/// An import declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportDecl {
    /// Dotted name without the trailing `.*`
    pub name: String,
    /// `import p.*`
    #[serde(default)]
    pub on_demand: bool,
    /// `import static`
    #[serde(default)]
    pub is_static: bool,
    /// `import base`
    #[serde(default)]
    pub is_base: bool,
    /// Source range
    #[serde(default)]
    pub span: Span,
}

/// Kind of a declared type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    /// Class (teams and roles are classes)
    #[default]
    Class,
    /// Interface
    Interface,
    /// Enum
    Enum,
}

/// A type declaration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TypeDecl {
    /// Simple name
    pub name: String,
    /// Kind
    #[serde(default)]
    pub kind: TypeKind,
    /// Modifier keywords
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    /// Type parameters
    #[serde(default)]
    pub type_params: Vec<TypeParamDecl>,
    /// `extends` clause of a class
    #[serde(default)]
    pub superclass: Option<TypeSpec>,
    /// `implements` clause, or `extends` of an interface
    #[serde(default)]
    pub interfaces: Vec<TypeSpec>,
    /// `playedBy` clause of a role
    #[serde(default)]
    pub played_by: Option<TypeSpec>,
    /// Fields
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
    /// Methods and constructors (`<init>`)
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
    /// Member types
    #[serde(default)]
    pub member_types: Vec<TypeDecl>,
    /// Callin bindings of a role
    #[serde(default)]
    pub callins: Vec<CallinDecl>,
    /// Callout bindings of a role
    #[serde(default)]
    pub callouts: Vec<CalloutDecl>,
    /// Precedence declarations of a team or role
    #[serde(default)]
    pub precedences: Vec<PrecedenceDecl>,
    /// Source range of the name
    #[serde(default)]
    pub span: Span,
}

impl TypeDecl {
    /// Empty class declaration
    pub fn class(name: impl Into<String>) -> Self {
        TypeDecl {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Modifier bits including those implied by the kind
    pub fn modifier_bits(&self) -> Modifiers {
        let mut bits = Modifiers::from_keywords(&self.modifiers);
        match self.kind {
            TypeKind::Interface => bits |= Modifiers::INTERFACE | Modifiers::ABSTRACT,
            TypeKind::Enum => bits |= Modifiers::ENUM,
            TypeKind::Class => {}
        }
        bits
    }
}

/// A type parameter declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeParamDecl {
    /// Variable name
    pub name: String,
    /// Bounds, class bound first
    #[serde(default)]
    pub bounds: Vec<TypeSpec>,
}

/// A field declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDecl {
    /// Field name
    pub name: String,
    /// Modifier keywords
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    /// Declared type
    pub ty: TypeSpec,
    /// Source range
    #[serde(default)]
    pub span: Span,
}

/// A method parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDecl {
    /// Parameter name
    pub name: String,
    /// Declared type
    pub ty: TypeSpec,
}

/// A method or constructor declaration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MethodDecl {
    /// Method name, `<init>` for constructors
    pub name: String,
    /// Modifier keywords
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    /// Type parameters
    #[serde(default)]
    pub type_params: Vec<TypeParamDecl>,
    /// Parameters
    #[serde(default)]
    pub params: Vec<ParamDecl>,
    /// Return type, `None` for `void`
    #[serde(default)]
    pub return_type: Option<TypeSpec>,
    /// Thrown types
    #[serde(default)]
    pub exceptions: Vec<TypeSpec>,
    /// Base-call skeleton of the body (callin methods)
    #[serde(default)]
    pub body_flow: Option<FlowNode>,
    /// Source range of the name
    #[serde(default)]
    pub span: Span,
}

/// A reference to a type as written in source
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeSpec {
    /// `int`, `boolean`, ... (`void` only as a return type)
    Primitive(String),
    /// A possibly qualified name with per-segment type arguments
    Named(Vec<NameSegment>),
    /// A reference that may only denote a type variable
    Variable(String),
    /// Array of the component type
    Array(Box<TypeSpec>),
    /// Role type anchored to a value: `Role<@anchor.path>`
    Anchored {
        /// Simple name of the role
        role: String,
        /// Dotted field path of the anchor
        anchor: String,
    },
}

impl TypeSpec {
    /// Named type without type arguments; `a.b.C` is split on dots
    pub fn named(name: &str) -> TypeSpec {
        TypeSpec::Named(
            name.split('.')
                .map(|segment| NameSegment {
                    name: segment.to_string(),
                    args: Vec::new(),
                })
                .collect(),
        )
    }

    /// Named type with type arguments on the last segment
    pub fn generic(name: &str, args: Vec<TypeArgSpec>) -> TypeSpec {
        let mut spec = TypeSpec::named(name);
        if let TypeSpec::Named(segments) = &mut spec {
            if let Some(last) = segments.last_mut() {
                last.args = args;
            }
        }
        spec
    }

    /// Primitive type by keyword
    pub fn primitive(keyword: &str) -> TypeSpec {
        TypeSpec::Primitive(keyword.to_string())
    }

    /// Array of this type
    pub fn array(self) -> TypeSpec {
        TypeSpec::Array(Box::new(self))
    }

    /// Anchored role type
    pub fn anchored(role: &str, anchor: &str) -> TypeSpec {
        TypeSpec::Anchored {
            role: role.to_string(),
            anchor: anchor.to_string(),
        }
    }

    /// Primitive keyword parsed, if this is a primitive
    pub fn base_type(&self) -> Option<BaseType> {
        match self {
            TypeSpec::Primitive(keyword) => BaseType::from_keyword(keyword),
            _ => None,
        }
    }

    /// Dotted rendering without type arguments
    pub fn display_name(&self) -> String {
        match self {
            TypeSpec::Primitive(keyword) => keyword.clone(),
            TypeSpec::Named(segments) => segments
                .iter()
                .map(|s| s.name.as_str())
                .collect::<Vec<_>>()
                .join("."),
            TypeSpec::Variable(name) => name.clone(),
            TypeSpec::Array(component) => format!("{}[]", component.display_name()),
            TypeSpec::Anchored { role, anchor } => format!("{}<@{}>", role, anchor),
        }
    }
}

/// One segment of a named type reference
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NameSegment {
    /// Identifier
    pub name: String,
    /// Type arguments applied at this segment
    #[serde(default)]
    pub args: Vec<TypeArgSpec>,
}

/// A type argument as written in source
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeArgSpec {
    /// A concrete type
    Type(TypeSpec),
    /// `?`
    Wildcard,
    /// `? extends T`
    Extends(TypeSpec),
    /// `? super T`
    Super(TypeSpec),
}

/// A method designator in a binding declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSpec {
    /// Method (or, for callout-to-field, field) name
    pub name: String,
    /// Parameter types; `None` designates by name only
    #[serde(default)]
    pub params: Option<Vec<TypeSpec>>,
    /// Return type, used by short callouts
    #[serde(default)]
    pub return_type: Option<TypeSpec>,
}

impl MethodSpec {
    /// Designate by name only
    pub fn by_name(name: &str) -> Self {
        MethodSpec {
            name: name.to_string(),
            params: None,
            return_type: None,
        }
    }

    /// Designate by name and parameter types
    pub fn with_params(name: &str, params: Vec<TypeSpec>) -> Self {
        MethodSpec {
            name: name.to_string(),
            params: Some(params),
            return_type: None,
        }
    }
}

/// Explicit parameter mapping: role parameter `role` corresponds to base
/// parameter `base`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamMapping {
    /// Role-side parameter index
    pub role: usize,
    /// Base-side parameter index
    pub base: usize,
}

/// `roleMethod <- before|after|replace baseMethod, ...`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallinDecl {
    /// Binding label referenced by precedence declarations
    #[serde(default)]
    pub label: Option<String>,
    /// Role method
    pub role_method: MethodSpec,
    /// Binding kind
    pub kind: CallinKind,
    /// Base methods
    pub base_methods: Vec<MethodSpec>,
    /// Explicit parameter mappings
    #[serde(default)]
    pub param_mappings: Vec<ParamMapping>,
    /// Source range
    #[serde(default)]
    pub span: Span,
}

/// `roleMethod -> baseMethod` or `roleMethod -> get|set baseField`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalloutDecl {
    /// Role method
    pub role_method: MethodSpec,
    /// Binding kind
    pub kind: CalloutKind,
    /// Base method or field
    pub base: MethodSpec,
    /// `=>`: the callout overrides an inherited role method
    #[serde(default)]
    pub is_override: bool,
    /// Explicit parameter mappings
    #[serde(default)]
    pub param_mappings: Vec<ParamMapping>,
    /// Source range
    #[serde(default)]
    pub span: Span,
}

/// `precedence [after] a, b, c;`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrecedenceDecl {
    /// Applies to after-callins and is read in reverse
    #[serde(default)]
    pub after: bool,
    /// Callin labels (`label` or `Role.label`) or role names, highest first
    pub elements: Vec<String>,
    /// Source range
    #[serde(default)]
    pub span: Span,
}

/// Control-flow skeleton of a callin method body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowNode {
    /// Statements executed in order
    Seq(Vec<FlowNode>),
    /// A `base.m(...)` call
    BaseCall,
    /// Alternatives, exactly one of which runs (`if` without `else` lists
    /// an empty sequence as the second alternative)
    Branch(Vec<FlowNode>),
    /// A body that runs zero or more times
    Loop(Box<FlowNode>),
    /// `return`
    Return,
    /// `throw`
    Throw,
    /// `break` out of the innermost loop
    Break,
    /// `continue` with the next round of the innermost loop
    Continue,
    /// `try { body } catch ... { catches } finally { finally }`
    Try {
        /// Protected body
        body: Box<FlowNode>,
        /// Catch handlers, in declaration order
        #[serde(default)]
        catches: Vec<FlowNode>,
        /// Finally block
        #[serde(default)]
        finally: Option<Box<FlowNode>>,
    },
    /// Any statement without base calls
    Stmt,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_stem_and_package() {
        let unit = CompilationUnitDecl {
            file_name: "R.rw".to_string(),
            package: "p".to_string(),
            team_package: Some("p.Tm".to_string()),
            imports: Vec::new(),
            types: Vec::new(),
            source: None,
        };
        assert_eq!(unit.file_stem(), "R");
        assert_eq!(unit.effective_package(), "p.Tm");
    }

    #[test]
    fn test_type_spec_helpers() {
        let spec = TypeSpec::generic("core.util.List", vec![TypeArgSpec::Wildcard]);
        assert_eq!(spec.display_name(), "core.util.List");
        let TypeSpec::Named(segments) = &spec else {
            panic!("expected named spec");
        };
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[2].args, vec![TypeArgSpec::Wildcard]);
        assert_eq!(TypeSpec::primitive("int").base_type(), Some(BaseType::Int));
        assert_eq!(TypeSpec::anchored("R", "t").display_name(), "R<@t>");
    }

    #[test]
    fn test_interface_modifiers() {
        let decl = TypeDecl {
            kind: TypeKind::Interface,
            ..TypeDecl::class("I")
        };
        assert!(decl.modifier_bits().is_interface());
    }

    #[test]
    fn test_deserialize_unit_json() {
        let unit: CompilationUnitDecl = serde_json::from_str(
            r#"{
                "file_name": "Tm.rw",
                "package": "p",
                "imports": [{"name": "q.Base", "is_base": true}],
                "types": [{
                    "name": "Tm",
                    "modifiers": ["public", "team"],
                    "member_types": [{
                        "name": "R",
                        "played_by": {"named": [{"name": "Base"}]},
                        "callins": [{
                            "role_method": {"name": "log"},
                            "kind": "before",
                            "base_methods": [{"name": "run"}]
                        }]
                    }]
                }]
            }"#,
        )
        .unwrap();
        assert!(unit.imports[0].is_base);
        let team = &unit.types[0];
        assert!(team.modifier_bits().is_team());
        assert_eq!(team.member_types[0].callins[0].kind, CallinKind::Before);
    }

    #[test]
    fn test_deserialize_flow() {
        let flow: FlowNode = serde_json::from_str(
            r#"{"seq": ["stmt", {"branch": ["base_call", {"seq": []}]}, "return"]}"#,
        )
        .unwrap();
        assert_eq!(
            flow,
            FlowNode::Seq(vec![
                FlowNode::Stmt,
                FlowNode::Branch(vec![FlowNode::BaseCall, FlowNode::Seq(vec![])]),
                FlowNode::Return,
            ])
        );
    }
}
