//! Integration tests for the resolution guarantees of a binding session
//!
//! Units are written as the JSON declaration trees the parser hands over.

use std::rc::Rc;

use roleweave_binder::config::WeavingScheme;
use roleweave_binder::decl::CompilationUnitDecl;
use roleweave_binder::{
    BinderOptions, InMemoryProvider, ResolutionState, Session, ViewError, WellKnown,
};
use roleweave_descriptor::{Modifiers, TypeDescriptor};
use roleweave_diagnostics::id::{
    IMPORT_NOT_VISIBLE, INCOMPATIBLE_PRECEDENCE, TYPE_COLLIDES_WITH_PACKAGE,
};

fn session_with(options: BinderOptions, extra: Vec<TypeDescriptor>) -> Session {
    let mut provider = InMemoryProvider::with_core(&options.well_known);
    for descriptor in extra {
        provider.insert(descriptor);
    }
    Session::new(Box::new(provider), options).unwrap()
}

fn session() -> Session {
    session_with(BinderOptions::default(), Vec::new())
}

fn units(json: &str) -> Vec<CompilationUnitDecl> {
    serde_json::from_str(json).unwrap()
}

const ACCOUNT: &str = r#"{
    "file_name": "Account.rw",
    "package": "p",
    "types": [{
        "name": "Account",
        "modifiers": ["public"],
        "fields": [{"name": "balance", "ty": {"primitive": "int"}}],
        "methods": [
            {"name": "pay", "modifiers": ["public"],
             "params": [{"name": "amount", "ty": {"primitive": "int"}}]},
            {"name": "total", "modifiers": ["public"], "return_type": {"primitive": "int"}}
        ]
    }]
}"#;

#[test]
fn test_components_resolve_once() {
    let mut session = session();
    session.add_units(units(&format!("[{}]", ACCOUNT))).unwrap();
    let env = session.env_mut();
    let account = env.lookup_binding("p.Account").unwrap();
    assert!(env.resolution_state(account).contains(ResolutionState::METHODS));

    let first = env.methods(account).unwrap();
    assert!(!env.resolution_state(account).contains(ResolutionState::METHODS));
    let second = env.methods(account).unwrap();
    assert!(Rc::ptr_eq(&first, &second));
    assert_eq!(first.len(), 2);

    let fields = env.fields(account).unwrap();
    assert!(Rc::ptr_eq(&fields, &env.fields(account).unwrap()));
    assert!(!env.resolution_state(account).contains(ResolutionState::FIELDS));

    let superclass = env.superclass(account).unwrap();
    assert_eq!(superclass, env.superclass(account).unwrap());
    assert_eq!(superclass, Some(env.well_known_type(WellKnown::Object).unwrap()));

    let before = env.diagnostics().problems().len();
    env.resolve_all_components(account).unwrap();
    assert!(env.resolution_state(account).is_empty());
    assert_eq!(env.diagnostics().problems().len(), before);
}

#[test]
fn test_instantiation_erases_to_its_generic() {
    let mut session = session();
    session
        .add_units(units(
            r#"[{
                "file_name": "Box.rw",
                "package": "p",
                "types": [
                    {"name": "Box", "modifiers": ["public"],
                     "type_params": [{"name": "T"}],
                     "fields": [{"name": "item", "ty": {"variable": "T"}}]},
                    {"name": "Holder",
                     "fields": [{"name": "box", "ty": {"named": [
                        {"name": "Box", "args": [{"type": {"named": [{"name": "String"}]}}]}
                     ]}}]}
                ]
            }]"#,
        ))
        .unwrap();
    session.resolve().unwrap();
    let env = session.env_mut();
    let generic = env.lookup_binding("p.Box").unwrap();
    let holder = env.lookup_binding("p.Holder").unwrap();
    let field = env.fields(holder).unwrap()[0];
    let parameterized = env.field_type(field).unwrap();

    assert_eq!(env.erasure(parameterized).unwrap(), env.binding(generic).declared_type());
    let string = env.well_known_type(WellKnown::String).unwrap();
    assert_eq!(env.instantiate(generic, vec![string], None), parameterized);
    assert!(!env.diagnostics().has_errors(), "{:?}", env.diagnostics().problems());
}

const CALLIN_TEAM: &str = r#"[{
    "file_name": "Tm.rw",
    "package": "p",
    "types": [{
        "name": "Tm",
        "modifiers": ["public", "team"],
        "member_types": [{
            "name": "R",
            "methods": [
                {"name": "wrap", "modifiers": ["callin"],
                 "params": [{"name": "x", "ty": {"primitive": "int"}}]},
                {"name": "plain",
                 "params": [{"name": "x", "ty": {"primitive": "int"}}]},
                {"name": "helper", "modifiers": ["static"]}
            ]
        }],
        "methods": [{"name": "util", "modifiers": ["static"]}]
    }]
}]"#;

#[test]
fn test_source_view_restores_enhanced_parameters() {
    let mut session = session();
    session.add_units(units(CALLIN_TEAM)).unwrap();
    let env = session.env_mut();
    let role = env.lookup_binding("p.Tm$R").unwrap();
    let wrap = env.find_methods(role, "wrap").unwrap()[0];

    let enhanced = env.method(wrap).parameters();
    assert_eq!(enhanced.len(), 5);

    env.enter_source_view(wrap).unwrap();
    assert_eq!(env.method(wrap).parameters().len(), 1);
    env.exit_source_view(wrap).unwrap();
    assert!(Rc::ptr_eq(&enhanced, &env.method(wrap).parameters()));
    assert_eq!(env.method(wrap).view_depth(), 0);

    env.enter_source_view(wrap).unwrap();
    env.enter_source_view(wrap).unwrap();
    env.exit_source_view(wrap).unwrap();
    assert!(env.method(wrap).in_source_view());
    assert_eq!(env.method(wrap).parameters().len(), 1);
    env.exit_source_view(wrap).unwrap();
    assert!(Rc::ptr_eq(&enhanced, &env.method(wrap).parameters()));

    assert!(matches!(env.exit_source_view(wrap), Err(ViewError::NotInSourceView(_))));
    let plain = env.find_methods(role, "plain").unwrap()[0];
    assert!(matches!(env.enter_source_view(plain), Err(ViewError::NotEnhanceable(_))));
}

#[test]
fn test_weaving_scheme_fixes_enhancing_arguments() {
    for (scheme, expected) in [(WeavingScheme::Static, 7), (WeavingScheme::None, 1)] {
        let mut session = session_with(BinderOptions::with_scheme(scheme), Vec::new());
        session.add_units(units(CALLIN_TEAM)).unwrap();
        let env = session.env_mut();
        let role = env.lookup_binding("p.Tm$R").unwrap();
        let wrap = env.find_methods(role, "wrap").unwrap()[0];
        assert_eq!(env.method(wrap).parameters().len(), expected, "{:?}", scheme);
        assert_eq!(env.method(wrap).has_views(), expected > 1);
    }
}

#[test]
fn test_synthetic_team_argument_follows_static_modifier() {
    let mut session = session();
    session.add_units(units(CALLIN_TEAM)).unwrap();
    let env = session.env_mut();
    let role = env.lookup_binding("p.Tm$R").unwrap();
    let team = env.lookup_binding("p.Tm").unwrap();
    let helper = env.find_methods(role, "helper").unwrap()[0];
    let plain = env.find_methods(role, "plain").unwrap()[0];
    let util = env.find_methods(team, "util").unwrap()[0];
    assert!(env.needs_synthetic_enclosing_team_instance(helper));
    assert!(!env.needs_synthetic_enclosing_team_instance(plain));
    assert!(!env.needs_synthetic_enclosing_team_instance(util));

    for modifiers in [Modifiers::NONE, Modifiers::STATIC, Modifiers::PUBLIC | Modifiers::STATIC] {
        assert_eq!(
            roleweave_binder::binding::needs_synthetic_enclosing_team_instance(modifiers, true, "helper"),
            modifiers.is_static()
        );
    }
    let getter = roleweave_binder::names::getter_name("balance");
    assert!(!roleweave_binder::binding::needs_synthetic_enclosing_team_instance(
        Modifiers::STATIC,
        true,
        &getter
    ));
}

#[test]
fn test_disagreeing_precedence_is_reported() {
    let mut session = session();
    session
        .add_units(units(
            r#"[{
                "file_name": "Bank.rw",
                "package": "p",
                "types": [
                    {"name": "Account",
                     "methods": [{"name": "pay", "modifiers": ["public"],
                                  "params": [{"name": "amount", "ty": {"primitive": "int"}}]}]},
                    {"name": "Bank", "modifiers": ["public", "team"],
                     "precedences": [{"elements": ["A.a", "B.b"]}],
                     "member_types": [
                        {"name": "A", "played_by": {"named": [{"name": "Account"}]},
                         "methods": [{"name": "log", "params": [{"name": "x", "ty": {"primitive": "int"}}]}],
                         "callins": [{"label": "a", "role_method": {"name": "log"}, "kind": "before",
                                      "base_methods": [{"name": "pay"}]}]},
                        {"name": "B", "played_by": {"named": [{"name": "Account"}]},
                         "methods": [{"name": "log", "params": [{"name": "x", "ty": {"primitive": "int"}}]}],
                         "callins": [{"label": "b", "role_method": {"name": "log"}, "kind": "before",
                                      "base_methods": [{"name": "pay"}]}],
                         "precedences": [{"elements": ["b", "A.a"]}]}
                     ]}
                ]
            }]"#,
        ))
        .unwrap();
    session.resolve().unwrap();
    let env = session.env_mut();
    let diags = env.diagnostics();
    assert_eq!(diags.with_id(INCOMPATIBLE_PRECEDENCE).count(), 1, "{:?}", diags.problems());

    let bank = env.lookup_binding("p.Bank").unwrap();
    let table = env.precedence(bank).unwrap();
    assert_eq!(table.join_points().len(), 1);
    assert_eq!(table.join_points()[0].order().len(), 2);
}

#[test]
fn test_team_package_is_not_a_collision() {
    let mut session = session();
    session
        .add_units(units(
            r#"[
                {"file_name": "Teller.rw", "package": "p", "team_package": "p.Tm",
                 "types": [{"name": "Teller"}]},
                {"file_name": "Tm.rw", "package": "p",
                 "types": [{"name": "Tm", "modifiers": ["public", "team"]}]},
                {"file_name": "Util.rw", "package": "p",
                 "types": [{"name": "Util", "modifiers": ["public"]}]},
                {"file_name": "Helper.rw", "package": "p.Util",
                 "types": [{"name": "Helper"}]}
            ]"#,
        ))
        .unwrap();
    session.resolve().unwrap();
    let collisions: Vec<_> = session
        .env()
        .diagnostics()
        .with_id(TYPE_COLLIDES_WITH_PACKAGE)
        .collect();
    assert_eq!(collisions.len(), 1);
    assert_eq!(collisions[0].arguments, vec!["p.Util".to_string()]);
    assert!(session.env().lookup_binding("p.Tm$Teller").is_some());
}

fn hidden_descriptors() -> Vec<TypeDescriptor> {
    let mut hidden = TypeDescriptor::new("q.Hidden");
    hidden.modifiers = Modifiers::NONE;
    vec![hidden, TypeDescriptor::new("q.Other")]
}

fn base_import_unit(played_by: Option<&str>) -> Vec<CompilationUnitDecl> {
    let played_by = played_by
        .map(|name| format!(r#", "played_by": {{"named": [{{"name": "{}"}}]}}"#, name))
        .unwrap_or_default();
    units(&format!(
        r#"[{{
            "file_name": "Tm.rw",
            "package": "p",
            "imports": [{{"name": "q.Hidden", "is_base": true}}, {{"name": "q.Other"}}],
            "types": [{{
                "name": "Tm",
                "modifiers": ["public", "team"],
                "member_types": [{{"name": "R"{}}}]
            }}]
        }}]"#,
        played_by
    ))
}

#[test]
fn test_base_import_needs_a_binding_role() {
    let mut bound = session_with(BinderOptions::default(), hidden_descriptors());
    bound.add_units(base_import_unit(Some("Hidden"))).unwrap();
    bound.resolve().unwrap();
    assert!(!bound.env().diagnostics().has(IMPORT_NOT_VISIBLE), "{:?}", bound.env().diagnostics().problems());

    let mut unbound = session_with(BinderOptions::default(), hidden_descriptors());
    unbound.add_units(base_import_unit(None)).unwrap();
    unbound.resolve().unwrap();
    assert_eq!(unbound.env().diagnostics().with_id(IMPORT_NOT_VISIBLE).count(), 1);

    let mut elsewhere = session_with(BinderOptions::default(), hidden_descriptors());
    elsewhere.add_units(base_import_unit(Some("Other"))).unwrap();
    elsewhere.resolve().unwrap();
    assert_eq!(elsewhere.env().diagnostics().with_id(IMPORT_NOT_VISIBLE).count(), 1);
}
