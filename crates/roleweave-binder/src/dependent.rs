//! Anchored role types
//!
//! A field typed `R<@t>` holds an `R` role of the very team instance stored
//! in the final field `t`. The anchor path is resolved the first time the
//! field type is asked for: the first segment is a field visible from the
//! declaring type (its own or one of an enclosing type), every further
//! segment a field of the previous segment's type. Each segment must be
//! final, the last one must be a team, and `R` must be a role of that team.

use roleweave_diagnostics::id::{
    ANCHOR_CYCLE, ANCHOR_NOT_A_TEAM, ANCHOR_NOT_FINAL, ROLE_NOT_IN_ANCHOR_TEAM, UNRESOLVED_ANCHOR,
};
use tracing::trace;

use crate::binding::field::PendingAnchor;
use crate::environment::LookupEnvironment;
use crate::error::SessionAbort;
use crate::ids::{BindingId, FieldId, TypeId};
use crate::types::{ProblemReason, Type};

impl LookupEnvironment {
    /// Type of a field, resolving a pending anchor on first request
    pub fn field_type(&mut self, field: FieldId) -> Result<TypeId, SessionAbort> {
        let Some(pending) = self.field(field).pending_anchor.clone() else {
            return Ok(self.field(field).ty);
        };
        let declaring = self.field(field).declaring;
        let span = self.field(field).span;
        if !self.anchors_in_progress.insert(field) {
            let args = [self.binding(declaring).name.clone(), self.field(field).name.clone()];
            self.report_for(declaring, ANCHOR_CYCLE, span, args);
            return Ok(self.problem_type(&pending.path.join("."), ProblemReason::InvalidAnchor));
        }
        trace!(field = %self.field(field).name, anchor = %pending.path.join("."), "resolving anchor");
        let resolved = self.resolve_anchor(field, declaring, &pending);
        self.anchors_in_progress.remove(&field);
        let ty = resolved?;
        let slot = self.field_mut(field);
        slot.ty = ty;
        slot.pending_anchor = None;
        Ok(ty)
    }

    fn resolve_anchor(
        &mut self,
        field: FieldId,
        declaring: BindingId,
        pending: &PendingAnchor,
    ) -> Result<TypeId, SessionAbort> {
        let span = self.field(field).span;
        let path_text = pending.path.join(".");
        let mut anchor = Vec::with_capacity(pending.path.len());
        let mut owner_type: Option<TypeId> = None;
        for segment in &pending.path {
            let found = match owner_type {
                None => self.find_field_in_scope(declaring, segment)?,
                Some(ty) => match self.binding_of_type(ty) {
                    Some(owner) => self.find_field(owner, segment)?,
                    None => None,
                },
            };
            let Some(segment_field) = found.filter(|f| *f != field) else {
                let args = [path_text.clone(), self.field(field).name.clone()];
                self.report_for(declaring, UNRESOLVED_ANCHOR, span, args);
                return Ok(self.problem_type(&path_text, ProblemReason::InvalidAnchor));
            };
            if !self.field(segment_field).is_final() {
                let args = [self.field(segment_field).name.clone(), path_text.clone()];
                self.report_for(declaring, ANCHOR_NOT_FINAL, span, args);
                return Ok(self.problem_type(&path_text, ProblemReason::InvalidAnchor));
            }
            owner_type = Some(self.field_type(segment_field)?);
            anchor.push(segment_field);
        }

        let anchor_type = match owner_type {
            Some(ty) => ty,
            None => {
                let args = [path_text.clone(), self.field(field).name.clone()];
                self.report_for(declaring, UNRESOLVED_ANCHOR, span, args);
                return Ok(self.problem_type(&path_text, ProblemReason::InvalidAnchor));
            }
        };
        if self.is_problem_type(anchor_type) {
            return Ok(self.problem_type(&path_text, ProblemReason::InvalidAnchor));
        }
        let team = match self.binding_of_type(anchor_type) {
            Some(team) if self.binding(team).is_team() => team,
            _ => {
                let args = [path_text.clone(), self.type_name(anchor_type)];
                self.report_for(declaring, ANCHOR_NOT_A_TEAM, span, args);
                return Ok(self.problem_type(&path_text, ProblemReason::InvalidAnchor));
            }
        };

        let Some(role) = self.find_member_type(team, &pending.role)? else {
            let args = [pending.role.clone(), self.binding(team).name.clone()];
            self.report_for(declaring, ROLE_NOT_IN_ANCHOR_TEAM, span, args);
            return Ok(self.problem_type(&pending.role, ProblemReason::InvalidAnchor));
        };
        if !self.binding(role).is_role() {
            let args = [pending.role.clone(), self.binding(team).name.clone()];
            self.report_for(declaring, ROLE_NOT_IN_ANCHOR_TEAM, span, args);
            return Ok(self.problem_type(&pending.role, ProblemReason::InvalidAnchor));
        }
        let role = self.binding(role).declared_type;
        Ok(self.intern(Type::Anchored { role, anchor }))
    }

    /// Field named `name` of `from` or of one of its enclosing types
    fn find_field_in_scope(&mut self, from: BindingId, name: &str) -> Result<Option<FieldId>, SessionAbort> {
        for owner in self.enclosing_chain(from) {
            if let Some(found) = self.find_field(owner, name)? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use roleweave_descriptor::Modifier;
    use roleweave_diagnostics::id::{
        ANCHOR_CYCLE, ANCHOR_NOT_A_TEAM, ANCHOR_NOT_FINAL, ROLE_NOT_IN_ANCHOR_TEAM,
        UNRESOLVED_ANCHOR,
    };
    use roleweave_diagnostics::Span;

    use crate::config::BinderOptions;
    use crate::decl::{CompilationUnitDecl, FieldDecl, TypeDecl, TypeSpec};
    use crate::environment::LookupEnvironment;
    use crate::provider::InMemoryProvider;
    use crate::types::Type;

    fn env_with(user_fields: Vec<FieldDecl>) -> LookupEnvironment {
        let options = BinderOptions::default();
        let provider = InMemoryProvider::with_core(&options.well_known);
        let mut env = LookupEnvironment::new(Box::new(provider), options).unwrap();
        let mut team = TypeDecl::class("Bank");
        team.modifiers.push(Modifier::Team);
        team.member_types.push(TypeDecl::class("R"));
        let mut user = TypeDecl::class("User");
        user.fields = user_fields;
        env.build_unit(CompilationUnitDecl {
            file_name: "Bank.rw".to_string(),
            package: "p".to_string(),
            team_package: None,
            imports: Vec::new(),
            types: vec![team, user],
            source: None,
        })
        .unwrap();
        env
    }

    fn field(name: &str, ty: TypeSpec, is_final: bool) -> FieldDecl {
        FieldDecl {
            name: name.to_string(),
            modifiers: if is_final { vec![Modifier::Final] } else { Vec::new() },
            ty,
            span: Span::none(),
        }
    }

    #[test]
    fn test_anchor_resolves_to_final_team_field() {
        let mut env = env_with(vec![
            field("bank", TypeSpec::named("Bank"), true),
            field("role", TypeSpec::anchored("R", "bank"), false),
        ]);
        let user = env.lookup_binding("p.User").unwrap();
        let r = env.lookup_binding("p.Bank$R").unwrap();
        let fields = env.fields(user).unwrap();
        let ty = env.field(fields[1]).ty();
        match env.ty(ty) {
            Type::Anchored { role, anchor } => {
                assert_eq!(env.ty(*role), &Type::Declared(r));
                assert_eq!(anchor, &vec![fields[0]]);
            }
            other => panic!("expected anchored type, got {:?}", other),
        }
        assert_eq!(env.type_name(ty), "p.Bank$R<@bank>");
    }

    #[test]
    fn test_anchor_errors() {
        let mut env = env_with(vec![
            field("loose", TypeSpec::named("Bank"), false),
            field("plain", TypeSpec::named("User"), true),
            field("bank", TypeSpec::named("Bank"), true),
            field("a", TypeSpec::anchored("R", "loose"), false),
            field("b", TypeSpec::anchored("R", "plain"), false),
            field("c", TypeSpec::anchored("Missing", "bank"), false),
            field("d", TypeSpec::anchored("R", "nowhere"), false),
        ]);
        let user = env.lookup_binding("p.User").unwrap();
        env.fields(user).unwrap();
        assert!(env.diagnostics().has(ANCHOR_NOT_FINAL));
        assert!(env.diagnostics().has(ANCHOR_NOT_A_TEAM));
        assert!(env.diagnostics().has(ROLE_NOT_IN_ANCHOR_TEAM));
        assert!(env.diagnostics().has(UNRESOLVED_ANCHOR));
    }

    #[test]
    fn test_anchor_cycle_is_reported() {
        let mut env = env_with(vec![
            field("x", TypeSpec::anchored("R", "y"), true),
            field("y", TypeSpec::anchored("R", "x"), true),
        ]);
        let user = env.lookup_binding("p.User").unwrap();
        env.fields(user).unwrap();
        assert!(env.diagnostics().has(ANCHOR_CYCLE));
    }
}
