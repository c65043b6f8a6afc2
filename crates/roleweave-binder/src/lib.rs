//! Roleweave binder
//!
//! Resolves the types, members and role/team relations of a compilation
//! session on demand. Source declarations and binary descriptors are turned
//! into bindings the first time they are asked for; every component of a
//! binding (supertypes, members, base class, method mappings) is resolved
//! lazily and memoized in the session's [`LookupEnvironment`].
//!
//! # Usage
//!
//! ```ignore
//! use roleweave_binder::{BinderOptions, InMemoryProvider, Session};
//!
//! let options = BinderOptions::default();
//! let provider = InMemoryProvider::with_core(&options.well_known);
//! let mut session = Session::new(Box::new(provider), options)?;
//! session.add_units(units)?;
//! session.resolve()?;
//! for problem in session.into_problems() {
//!     println!("{}", problem);
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod binding;
pub mod compatibility;
pub mod config;
pub mod copy_inheritance;
pub mod decl;
pub mod dependent;
pub mod environment;
pub mod error;
pub mod generics;
pub mod ids;
pub mod lazy;
pub mod mapping;
pub mod names;
pub mod provider;
pub mod references;
pub mod resolve;
pub mod scope;
pub mod session;
pub mod types;

pub use binding::{
    BindingOrigin, FieldBinding, MethodBinding, MethodOrigin, Signature, SignatureView,
    TypeBinding,
};
pub use config::{BinderOptions, WeavingScheme, WellKnownNames};
pub use decl::CompilationUnitDecl;
pub use environment::{LookupEnvironment, WellKnown};
pub use error::{Component, SessionAbort, ViewError};
pub use generics::Substitution;
pub use ids::{BindingId, FieldId, MappingId, MethodId, TypeId, TypeVarId, UnitId};
pub use lazy::{Lazy, ResolutionState};
pub use mapping::precedence::{JoinPoint, PrecedenceTable};
pub use mapping::{MappingKind, MethodMapping};
pub use provider::{InMemoryProvider, LayeredProvider, TypeProvider};
pub use session::Session;
pub use types::{ProblemReason, Type};
