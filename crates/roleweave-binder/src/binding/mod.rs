//! Binding records stored in the environment arenas

pub mod field;
pub mod method;
pub mod type_binding;
pub mod type_var;

pub use field::{FieldBinding, FieldOrigin};
pub use method::{
    needs_synthetic_enclosing_team_instance, MethodBinding, MethodOrigin, Signature,
    SignatureView,
};
pub use type_binding::{BindingOrigin, RoleModel, Supertypes, TeamModel, TypeBinding};
pub use type_var::{TypeVarBinding, TypeVarOwner};
