//! Generic signature grammar
//!
//! Field types, class headers and method headers in descriptors are written
//! in a compact grammar:
//!
//! ```text
//! TypeSig      := BaseType | 'L' ClassTypeSig | 'T' Ident ';' | '[' TypeSig
//! BaseType     := 'B' | 'C' | 'D' | 'F' | 'I' | 'J' | 'S' | 'Z' | 'V'
//! ClassTypeSig := Path TypeArgs? ('.' Ident TypeArgs?)* ';'
//! TypeArgs     := '<' ('*' | '+' TypeSig | '-' TypeSig | TypeSig)+ '>'
//! Formals      := '<' (Ident ':' TypeSig? (':' TypeSig)*)+ '>'
//! ClassSig     := Formals? ClassTypeSig ClassTypeSig*
//! MethodSig    := Formals? '(' TypeSig* ')' TypeSig ('^' TypeSig)*
//! ```
//!
//! Packages in `Path` are separated by `/`; parsed names use `.` for
//! packages and `$` between an enclosing type and its member type.

use std::fmt;

use thiserror::Error;

/// Error in a signature string
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("malformed signature '{signature}' at offset {offset}: {message}")]
pub struct SignatureError {
    /// The full signature text
    pub signature: String,
    /// Byte offset of the failure
    pub offset: usize,
    /// What was expected
    pub message: &'static str,
}

/// Primitive types and `void`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    /// `B`
    Byte,
    /// `C`
    Char,
    /// `D`
    Double,
    /// `F`
    Float,
    /// `I`
    Int,
    /// `J`
    Long,
    /// `S`
    Short,
    /// `Z`
    Boolean,
    /// `V`
    Void,
}

impl BaseType {
    fn from_char(c: u8) -> Option<BaseType> {
        Some(match c {
            b'B' => BaseType::Byte,
            b'C' => BaseType::Char,
            b'D' => BaseType::Double,
            b'F' => BaseType::Float,
            b'I' => BaseType::Int,
            b'J' => BaseType::Long,
            b'S' => BaseType::Short,
            b'Z' => BaseType::Boolean,
            b'V' => BaseType::Void,
            _ => return None,
        })
    }

    /// Descriptor character
    pub fn code(self) -> char {
        match self {
            BaseType::Byte => 'B',
            BaseType::Char => 'C',
            BaseType::Double => 'D',
            BaseType::Float => 'F',
            BaseType::Int => 'I',
            BaseType::Long => 'J',
            BaseType::Short => 'S',
            BaseType::Boolean => 'Z',
            BaseType::Void => 'V',
        }
    }

    /// Source keyword
    pub fn keyword(self) -> &'static str {
        match self {
            BaseType::Byte => "byte",
            BaseType::Char => "char",
            BaseType::Double => "double",
            BaseType::Float => "float",
            BaseType::Int => "int",
            BaseType::Long => "long",
            BaseType::Short => "short",
            BaseType::Boolean => "boolean",
            BaseType::Void => "void",
        }
    }

    /// Parse a source keyword
    pub fn from_keyword(keyword: &str) -> Option<BaseType> {
        Some(match keyword {
            "byte" => BaseType::Byte,
            "char" => BaseType::Char,
            "double" => BaseType::Double,
            "float" => BaseType::Float,
            "int" => BaseType::Int,
            "long" => BaseType::Long,
            "short" => BaseType::Short,
            "boolean" => BaseType::Boolean,
            "void" => BaseType::Void,
            _ => return None,
        })
    }
}

/// A type in signature form
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeSig {
    /// Primitive or void
    Base(BaseType),
    /// Class type, possibly parameterized
    Class(ClassTypeSig),
    /// Type variable reference
    Var(String),
    /// Array of the component type
    Array(Box<TypeSig>),
}

/// One segment of a class type: the outermost carries the package
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassSegment {
    /// Qualified name for the first segment, simple name afterwards
    pub name: String,
    /// Type arguments applied to this segment
    pub args: Vec<TypeArgSig>,
}

/// A class type with per-segment type arguments
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassTypeSig {
    /// Outermost segment first
    pub segments: Vec<ClassSegment>,
}

impl ClassTypeSig {
    /// Non-generic class type from a qualified name
    pub fn simple(qualified: &str) -> Self {
        ClassTypeSig {
            segments: vec![ClassSegment {
                name: qualified.to_string(),
                args: Vec::new(),
            }],
        }
    }

    /// Qualified name, member types joined with `$`
    pub fn qualified_name(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join("$")
    }

    /// Type arguments of the innermost segment
    pub fn args(&self) -> &[TypeArgSig] {
        self.segments.last().map(|s| s.args.as_slice()).unwrap_or(&[])
    }
}

/// A type argument
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeArgSig {
    /// `*`
    Any,
    /// `+T`
    Extends(TypeSig),
    /// `-T`
    Super(TypeSig),
    /// Exact argument
    Exact(TypeSig),
}

/// A formal type parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FormalTypeParam {
    /// Parameter name
    pub name: String,
    /// Class bound (may be absent when only interface bounds exist)
    pub class_bound: Option<TypeSig>,
    /// Interface bounds
    pub interface_bounds: Vec<TypeSig>,
}

impl FormalTypeParam {
    /// All bounds in declaration order
    pub fn bounds(&self) -> impl Iterator<Item = &TypeSig> {
        self.class_bound.iter().chain(self.interface_bounds.iter())
    }
}

/// Header signature of a generic class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSignature {
    /// Formal type parameters
    pub type_params: Vec<FormalTypeParam>,
    /// Superclass
    pub superclass: ClassTypeSig,
    /// Super-interfaces
    pub interfaces: Vec<ClassTypeSig>,
}

/// Signature of a method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    /// Formal type parameters
    pub type_params: Vec<FormalTypeParam>,
    /// Parameter types
    pub params: Vec<TypeSig>,
    /// Return type
    pub ret: TypeSig,
    /// Thrown types
    pub throws: Vec<TypeSig>,
}

/// Parse a field or standalone type signature
pub fn parse_type(signature: &str) -> Result<TypeSig, SignatureError> {
    let mut parser = Parser::new(signature);
    let ty = parser.type_sig()?;
    parser.finish()?;
    Ok(ty)
}

/// Parse a class header signature
pub fn parse_class(signature: &str) -> Result<ClassSignature, SignatureError> {
    let mut parser = Parser::new(signature);
    let type_params = parser.formals()?;
    parser.expect(b'L', "class type")?;
    let superclass = parser.class_type()?;
    let mut interfaces = Vec::new();
    while parser.peek().is_some() {
        parser.expect(b'L', "interface type")?;
        interfaces.push(parser.class_type()?);
    }
    Ok(ClassSignature {
        type_params,
        superclass,
        interfaces,
    })
}

/// Parse a method signature
pub fn parse_method(signature: &str) -> Result<MethodSignature, SignatureError> {
    let mut parser = Parser::new(signature);
    let type_params = parser.formals()?;
    parser.expect(b'(', "'('")?;
    let mut params = Vec::new();
    while parser.peek() != Some(b')') {
        if parser.peek().is_none() {
            return Err(parser.error("')'"));
        }
        params.push(parser.type_sig()?);
    }
    parser.bump();
    let ret = parser.type_sig()?;
    let mut throws = Vec::new();
    while parser.peek() == Some(b'^') {
        parser.bump();
        throws.push(parser.type_sig()?);
    }
    parser.finish()?;
    Ok(MethodSignature {
        type_params,
        params,
        ret,
        throws,
    })
}

struct Parser<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Parser {
            text,
            bytes: text.as_bytes(),
            pos: 0,
        }
    }

    fn error(&self, message: &'static str) -> SignatureError {
        SignatureError {
            signature: self.text.to_string(),
            offset: self.pos,
            message,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn expect(&mut self, c: u8, message: &'static str) -> Result<(), SignatureError> {
        if self.peek() == Some(c) {
            self.bump();
            Ok(())
        } else {
            Err(self.error(message))
        }
    }

    fn finish(&self) -> Result<(), SignatureError> {
        if self.pos == self.bytes.len() {
            Ok(())
        } else {
            Err(self.error("end of signature"))
        }
    }

    fn ident(&mut self, stops: &[u8]) -> Result<&'a str, SignatureError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if stops.contains(&c) {
                break;
            }
            self.bump();
        }
        if self.pos == start {
            return Err(self.error("identifier"));
        }
        Ok(&self.text[start..self.pos])
    }

    fn type_sig(&mut self) -> Result<TypeSig, SignatureError> {
        let c = self.peek().ok_or_else(|| self.error("type"))?;
        if let Some(base) = BaseType::from_char(c) {
            self.bump();
            return Ok(TypeSig::Base(base));
        }
        match c {
            b'L' => {
                self.bump();
                Ok(TypeSig::Class(self.class_type()?))
            }
            b'T' => {
                self.bump();
                let name = self.ident(b";")?;
                self.expect(b';', "';'")?;
                Ok(TypeSig::Var(name.to_string()))
            }
            b'[' => {
                self.bump();
                Ok(TypeSig::Array(Box::new(self.type_sig()?)))
            }
            _ => Err(self.error("type")),
        }
    }

    /// Called after the leading `L`
    fn class_type(&mut self) -> Result<ClassTypeSig, SignatureError> {
        let path = self.ident(b"<.;")?;
        let mut segments = vec![ClassSegment {
            name: path.replace('/', "."),
            args: self.type_args()?,
        }];
        while self.peek() == Some(b'.') {
            self.bump();
            let name = self.ident(b"<.;")?;
            segments.push(ClassSegment {
                name: name.to_string(),
                args: self.type_args()?,
            });
        }
        self.expect(b';', "';'")?;
        Ok(ClassTypeSig { segments })
    }

    fn type_args(&mut self) -> Result<Vec<TypeArgSig>, SignatureError> {
        if self.peek() != Some(b'<') {
            return Ok(Vec::new());
        }
        self.bump();
        let mut args = Vec::new();
        loop {
            match self.peek() {
                Some(b'>') => {
                    self.bump();
                    break;
                }
                Some(b'*') => {
                    self.bump();
                    args.push(TypeArgSig::Any);
                }
                Some(b'+') => {
                    self.bump();
                    args.push(TypeArgSig::Extends(self.type_sig()?));
                }
                Some(b'-') => {
                    self.bump();
                    args.push(TypeArgSig::Super(self.type_sig()?));
                }
                Some(_) => args.push(TypeArgSig::Exact(self.type_sig()?)),
                None => return Err(self.error("'>'")),
            }
        }
        if args.is_empty() {
            return Err(self.error("type argument"));
        }
        Ok(args)
    }

    fn formals(&mut self) -> Result<Vec<FormalTypeParam>, SignatureError> {
        if self.peek() != Some(b'<') {
            return Ok(Vec::new());
        }
        self.bump();
        let mut params = Vec::new();
        while self.peek() != Some(b'>') {
            let name = self.ident(b":>")?.to_string();
            self.expect(b':', "':'")?;
            let class_bound = match self.peek() {
                Some(b':') | Some(b'>') => None,
                _ => Some(self.type_sig()?),
            };
            let mut interface_bounds = Vec::new();
            while self.peek() == Some(b':') {
                self.bump();
                interface_bounds.push(self.type_sig()?);
            }
            params.push(FormalTypeParam {
                name,
                class_bound,
                interface_bounds,
            });
            if self.peek().is_none() {
                return Err(self.error("'>'"));
            }
        }
        self.bump();
        if params.is_empty() {
            return Err(self.error("type parameter"));
        }
        Ok(params)
    }
}

// ── Writing ──────────────────────────────────────────────────────────────

impl fmt::Display for TypeSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSig::Base(base) => write!(f, "{}", base.code()),
            TypeSig::Class(class) => write!(f, "{}", class),
            TypeSig::Var(name) => write!(f, "T{};", name),
            TypeSig::Array(component) => write!(f, "[{}", component),
        }
    }
}

impl fmt::Display for ClassTypeSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("L")?;
        for (i, segment) in self.segments.iter().enumerate() {
            if i == 0 {
                f.write_str(&segment.name.replace('.', "/"))?;
            } else {
                write!(f, ".{}", segment.name)?;
            }
            if !segment.args.is_empty() {
                f.write_str("<")?;
                for arg in &segment.args {
                    write!(f, "{}", arg)?;
                }
                f.write_str(">")?;
            }
        }
        f.write_str(";")
    }
}

impl fmt::Display for TypeArgSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeArgSig::Any => f.write_str("*"),
            TypeArgSig::Extends(ty) => write!(f, "+{}", ty),
            TypeArgSig::Super(ty) => write!(f, "-{}", ty),
            TypeArgSig::Exact(ty) => write!(f, "{}", ty),
        }
    }
}

fn write_formals(f: &mut fmt::Formatter<'_>, params: &[FormalTypeParam]) -> fmt::Result {
    if params.is_empty() {
        return Ok(());
    }
    f.write_str("<")?;
    for param in params {
        write!(f, "{}:", param.name)?;
        if let Some(bound) = &param.class_bound {
            write!(f, "{}", bound)?;
        }
        for bound in &param.interface_bounds {
            write!(f, ":{}", bound)?;
        }
    }
    f.write_str(">")
}

impl fmt::Display for ClassSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_formals(f, &self.type_params)?;
        write!(f, "{}", self.superclass)?;
        for interface in &self.interfaces {
            write!(f, "{}", interface)?;
        }
        Ok(())
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_formals(f, &self.type_params)?;
        f.write_str("(")?;
        for param in &self.params {
            write!(f, "{}", param)?;
        }
        write!(f, "){}", self.ret)?;
        for thrown in &self.throws {
            write!(f, "^{}", thrown)?;
        }
        Ok(())
    }
}
