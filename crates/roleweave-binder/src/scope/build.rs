//! Creating source bindings for a unit

use std::rc::Rc;

use roleweave_diagnostics::id::{
    DUPLICATE_TYPES, PUBLIC_CLASS_MUST_MATCH_FILE_NAME, ROLE_FILE_MUST_DECLARE_ROLE,
    ROLE_FILE_TEAM_NOT_FOUND, TYPE_COLLIDES_WITH_PACKAGE,
};
use roleweave_diagnostics::Span;
use tracing::debug;

use crate::binding::BindingOrigin;
use crate::decl::{CompilationUnitDecl, TypeDecl};
use crate::environment::LookupEnvironment;
use crate::error::SessionAbort;
use crate::ids::{BindingId, UnitId};
use crate::lazy::Lazy;
use crate::names;
use crate::references::ReferenceIndex;
use crate::scope::UnitScope;

impl LookupEnvironment {
    /// Register a unit and create bindings for every type it declares,
    /// members included
    ///
    /// Role files must be built after the unit declaring their team.
    pub fn build_unit(&mut self, decl: CompilationUnitDecl) -> Result<UnitId, SessionAbort> {
        let unit = UnitId::from_index(self.units.len());
        let decl = Rc::new(decl);
        debug!(file = %decl.file_name, "building type bindings");
        self.units.push(UnitScope {
            id: unit,
            decl: decl.clone(),
            types: Vec::new(),
            imports: Lazy::Unresolved,
            base_imports_verified: false,
            references: ReferenceIndex::new(),
            has_team: false,
        });
        self.unit_packages
            .entry(decl.effective_package().to_string())
            .or_default()
            .push(unit);

        let types = match decl.team_package.as_deref() {
            Some(team_name) => self.build_role_file(unit, &decl, team_name)?,
            None => self.build_regular_unit(unit, &decl),
        };
        let has_team = decl.team_package.is_some()
            || types.iter().any(|t| self.binding(*t).is_team());
        let scope = &mut self.units[unit.index()];
        scope.types = types;
        scope.has_team = has_team;
        Ok(unit)
    }

    fn build_regular_unit(&mut self, unit: UnitId, decl: &CompilationUnitDecl) -> Vec<BindingId> {
        let stem = decl.file_stem().to_string();
        let mut types = Vec::with_capacity(decl.types.len());
        for type_decl in &decl.types {
            if type_decl.modifier_bits().is_public() && type_decl.name != stem {
                self.report_in_unit(
                    unit,
                    PUBLIC_CLASS_MUST_MATCH_FILE_NAME,
                    type_decl.span,
                    [type_decl.name.clone(), decl.file_name.clone()],
                );
            }
            let qualified = names::qualify(&decl.package, &type_decl.name);
            if self.is_source_type(&qualified) {
                self.report_in_unit(unit, DUPLICATE_TYPES, type_decl.span, [qualified]);
                continue;
            }
            let id = self.create_source_binding(
                Rc::new(type_decl.clone()),
                unit,
                None,
                qualified,
                decl.package.clone(),
            );
            types.push(id);
        }
        types
    }

    fn build_role_file(
        &mut self,
        unit: UnitId,
        decl: &CompilationUnitDecl,
        team_name: &str,
    ) -> Result<Vec<BindingId>, SessionAbort> {
        let team = match self.get_type(team_name)? {
            Some(team) if self.binding(team).is_team() => team,
            _ => {
                self.report_in_unit(
                    unit,
                    ROLE_FILE_TEAM_NOT_FOUND,
                    Span::none(),
                    [team_name.to_string(), decl.file_name.clone()],
                );
                return Ok(Vec::new());
            }
        };
        let stem = decl.file_stem();
        if !decl.types.iter().any(|t| t.name == stem) {
            self.report_in_unit(
                unit,
                ROLE_FILE_MUST_DECLARE_ROLE,
                Span::none(),
                [decl.file_name.clone(), stem.to_string()],
            );
        }

        let team_qualified = self.binding(team).name.clone();
        let package = self.binding(team).package.clone();
        let mut roles = Vec::with_capacity(decl.types.len());
        for type_decl in &decl.types {
            let qualified = format!("{}${}", team_qualified, type_decl.name);
            let declared_inline = self
                .binding(team)
                .source_decl()
                .map(|team_decl| team_decl.member_types.iter().any(|m| m.name == type_decl.name))
                .unwrap_or(false);
            if declared_inline || self.is_source_type(&qualified) {
                self.report_in_unit(unit, DUPLICATE_TYPES, type_decl.span, [qualified]);
                continue;
            }
            let role = self.create_source_binding(
                Rc::new(type_decl.clone()),
                unit,
                Some(team),
                qualified,
                package.clone(),
            );
            roles.push(role);
        }
        if let Some(model) = self.binding_mut(team).team.as_mut() {
            model.role_files.push(unit);
            model.role_file_roles.extend(roles.iter().copied());
        }
        Ok(roles)
    }

    fn is_source_type(&self, qualified: &str) -> bool {
        self.by_name
            .get(qualified)
            .map(|id| self.binding(*id).unit().is_some())
            .unwrap_or(false)
    }

    pub(crate) fn create_source_binding(
        &mut self,
        decl: Rc<TypeDecl>,
        unit: UnitId,
        enclosing: Option<BindingId>,
        qualified: String,
        package: String,
    ) -> BindingId {
        let id = self.next_binding_id();
        let binding = self.new_type_binding(
            id,
            qualified.clone(),
            package.clone(),
            decl.modifier_bits(),
            BindingOrigin::Source {
                decl: decl.clone(),
                unit,
            },
            enclosing,
            decl.span,
        );
        self.missing.remove(&qualified);
        self.by_name.insert(qualified.clone(), id);
        self.push_binding(binding);
        self.attach_team_role_models(id);

        let mut seen: Vec<&str> = Vec::with_capacity(decl.member_types.len());
        for member in &decl.member_types {
            if seen.contains(&member.name.as_str()) {
                let name = format!("{}${}", qualified, member.name);
                self.report_in_unit(unit, DUPLICATE_TYPES, member.span, [name]);
                continue;
            }
            seen.push(&member.name);
            self.create_source_binding(
                Rc::new(member.clone()),
                unit,
                Some(id),
                format!("{}${}", qualified, member.name),
                package.clone(),
            );
        }
        id
    }

    /// Units whose types live in `package` or one of its subpackages
    fn units_in_package(&self, package: &str) -> Vec<UnitId> {
        let nested = format!("{}.", package);
        self.unit_packages
            .iter()
            .filter(|(name, _)| name.as_str() == package || name.starts_with(&nested))
            .flat_map(|(_, units)| units.iter().copied())
            .collect()
    }

    /// Report top-level source types whose qualified name is also a
    /// package, except a team whose only "package" is its role files
    pub fn check_package_collisions(&mut self) {
        let mut top_level: Vec<BindingId> = self
            .units
            .iter()
            .filter(|unit| !unit.is_role_file())
            .flat_map(|unit| unit.types.iter().copied())
            .collect();
        top_level.sort();
        for id in top_level {
            let name = self.binding(id).name.clone();
            let mut units = self.units_in_package(&name);
            let binary_package = self.provider.package_exists(&name);
            if units.is_empty() && !binary_package {
                continue;
            }
            units.sort();
            let team_package_only = self.binding(id).is_team()
                && !binary_package
                && units
                    .iter()
                    .all(|u| self.unit(*u).decl.team_package.as_deref() == Some(name.as_str()));
            if team_package_only {
                continue;
            }
            let span = self.binding(id).span;
            self.report_for(id, TYPE_COLLIDES_WITH_PACKAGE, span, [name]);
        }
    }
}
