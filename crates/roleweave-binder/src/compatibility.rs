//! Lifting and lowering aware compatibility
//!
//! Values cross the role/base boundary of a method mapping implicitly: a
//! base object is lifted to its role where a role is expected, a role is
//! lowered to its base object where the base is expected. Mapping checks
//! use these relations instead of plain compatibility.

use crate::environment::LookupEnvironment;
use crate::error::SessionAbort;
use crate::ids::TypeId;
use crate::types::Type;

impl LookupEnvironment {
    /// Whether a value of `from` may flow to `to`, lifting a base object to
    /// a role bound to its class
    pub fn can_lift(&mut self, from: TypeId, to: TypeId) -> Result<bool, SessionAbort> {
        if self.is_compatible(from, to)? {
            return Ok(true);
        }
        if let (Type::Array(f), Type::Array(t)) = (self.ty(from).clone(), self.ty(to).clone()) {
            return self.can_lift(f, t);
        }
        match self.role_base(to)? {
            Some(base) => self.is_compatible(from, base),
            None => Ok(false),
        }
    }

    /// Whether a value of `from` may flow to `to`, lowering a role to its
    /// base object
    pub fn can_lower(&mut self, from: TypeId, to: TypeId) -> Result<bool, SessionAbort> {
        if self.is_compatible(from, to)? {
            return Ok(true);
        }
        if let (Type::Array(f), Type::Array(t)) = (self.ty(from).clone(), self.ty(to).clone()) {
            return self.can_lower(f, t);
        }
        match self.role_base(from)? {
            Some(base) => self.is_compatible(base, to),
            None => Ok(false),
        }
    }

    fn role_base(&mut self, ty: TypeId) -> Result<Option<TypeId>, SessionAbort> {
        match self.binding_of_type(ty) {
            Some(b) if self.binding(b).is_role() => self.base_class_of(ty),
            _ => Ok(None),
        }
    }
}
