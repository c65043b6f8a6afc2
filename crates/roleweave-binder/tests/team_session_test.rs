//! Integration tests for whole-session resolution of teams and roles
//!
//! A bank team adapts an account class; a sub-team inherits its role, and a
//! compiled team contributes a role read only from its descriptor.

use roleweave_binder::decl::CompilationUnitDecl;
use roleweave_binder::{BinderOptions, InMemoryProvider, MappingKind, Session};
use roleweave_descriptor::{
    BaseMethodRef, CallinKind, CallinRecord, ExtensionBlock, MethodDescriptor, Modifiers,
    TeamRoleAttributes, TypeDescriptor, EXT_ROLE, EXT_TEAM,
};
use roleweave_diagnostics::id::{
    CALLOUT_SIGNATURE_CYCLE, POTENTIALLY_MISSING_BASE_CALL, PRECEDENCE_REQUIRED,
};

const BANK: &str = r#"[
    {"file_name": "Account.rw", "package": "p",
     "types": [{
        "name": "Account",
        "fields": [{"name": "id", "modifiers": ["public", "final"], "ty": {"primitive": "int"}}],
        "methods": [
            {"name": "pay", "modifiers": ["public"],
             "params": [{"name": "amount", "ty": {"primitive": "int"}}]},
            {"name": "balance", "modifiers": ["public"], "return_type": {"primitive": "int"}}
        ]
     }]},
    {"file_name": "Bank.rw", "package": "p",
     "types": [{
        "name": "Bank",
        "modifiers": ["public", "team"],
        "member_types": [{
            "name": "Teller",
            "played_by": {"named": [{"name": "Account"}]},
            "methods": [
                {"name": "log", "params": [{"name": "amount", "ty": {"primitive": "int"}}]},
                {"name": "guard", "modifiers": ["callin"],
                 "params": [{"name": "amount", "ty": {"primitive": "int"}}],
                 "body_flow": {"branch": ["base_call", {"seq": []}]}},
                {"name": "total", "modifiers": ["abstract"], "return_type": {"primitive": "int"}}
            ],
            "callins": [
                {"label": "logging", "role_method": {"name": "log"}, "kind": "before",
                 "base_methods": [{"name": "pay"}]},
                {"label": "guarding", "role_method": {"name": "guard"}, "kind": "replace",
                 "base_methods": [{"name": "pay"}]}
            ],
            "callouts": [
                {"role_method": {"name": "total"}, "kind": "method", "base": {"name": "balance"}}
            ]
        }]
     }]},
    {"file_name": "SubBank.rw", "package": "p",
     "types": [{
        "name": "SubBank",
        "modifiers": ["public", "team"],
        "superclass": {"named": [{"name": "Bank"}]},
        "member_types": [{"name": "Teller"}]
     }]}
]"#;

fn session_with(extra: Vec<TypeDescriptor>) -> Session {
    let options = BinderOptions::default();
    let mut provider = InMemoryProvider::with_core(&options.well_known);
    for descriptor in extra {
        provider.insert(descriptor);
    }
    Session::new(Box::new(provider), options).unwrap()
}

fn units(json: &str) -> Vec<CompilationUnitDecl> {
    serde_json::from_str(json).unwrap()
}

#[test]
fn test_bank_mappings_resolve() {
    let mut session = session_with(Vec::new());
    session.add_units(units(BANK)).unwrap();
    session.resolve().unwrap();
    let env = session.env_mut();
    let teller = env.lookup_binding("p.Bank$Teller").unwrap();
    let account = env.lookup_binding("p.Account").unwrap();

    let mappings = env.mappings(teller).unwrap();
    assert_eq!(mappings.len(), 3);
    assert_eq!(env.callins(teller).unwrap().len(), 2);
    for id in mappings.iter() {
        assert!(env.mapping(*id).is_complete(), "{}", env.mapping_display(*id));
    }

    let pay = env.find_methods(account, "pay").unwrap()[0];
    let balance = env.find_methods(account, "balance").unwrap()[0];
    let guarding = env.mapping(mappings[1]);
    assert_eq!(guarding.label(), Some("guarding"));
    assert_eq!(guarding.kind(), MappingKind::Callin(CallinKind::Replace));
    assert!(guarding.surrogate().is_some());
    assert_eq!(guarding.base_methods(), &[pay]);
    assert_eq!(env.mapping_display(mappings[1]), "Teller.guarding");
    assert_eq!(env.mapping(mappings[2]).base_methods(), &[balance]);
}

#[test]
fn test_conditional_base_call_is_flagged() {
    let mut session = session_with(Vec::new());
    session.add_units(units(BANK)).unwrap();
    session.resolve().unwrap();
    let diags = session.env().diagnostics();
    let missing: Vec<_> = diags.with_id(POTENTIALLY_MISSING_BASE_CALL).collect();
    assert_eq!(missing.len(), 1, "{:?}", diags.problems());
    assert!(missing[0].arguments[0].contains("guard"));
    assert!(!diags.has(PRECEDENCE_REQUIRED));
}

#[test]
fn test_sub_team_inherits_role_members_and_callins() {
    let mut session = session_with(Vec::new());
    session.add_units(units(BANK)).unwrap();
    session.resolve().unwrap();
    let env = session.env_mut();
    let teller = env.lookup_binding("p.Bank$Teller").unwrap();
    let sub_teller = env.lookup_binding("p.SubBank$Teller").unwrap();
    assert_eq!(&env.tsuper_roles(sub_teller).unwrap()[..], &[teller]);

    let original = env.find_methods(teller, "guard").unwrap()[0];
    let copy = env.find_methods(sub_teller, "guard").unwrap()[0];
    assert_ne!(copy, original);
    assert_eq!(env.copy_inheritance_origin(copy), original);

    let account = env.lookup_binding("p.Account").unwrap();
    let base = env.base_class(sub_teller).unwrap();
    assert_eq!(base.and_then(|b| env.binding_of_type(b)), Some(account));

    let sub_bank = env.lookup_binding("p.SubBank").unwrap();
    let table = env.precedence(sub_bank).unwrap();
    let ordered: usize = table.join_points().iter().map(|jp| jp.order().len()).sum();
    assert_eq!(ordered, 2);
}

fn audit_descriptors() -> Vec<TypeDescriptor> {
    let mut ledger = TypeDescriptor::new("lib.Ledger");
    ledger.superclass = Some("core.Object".to_string());
    ledger.methods.push(MethodDescriptor {
        name: "post".to_string(),
        modifiers: Modifiers::PUBLIC,
        signature: "(I)V".to_string(),
    });

    let mut audit = TypeDescriptor::new("lib.Audit");
    audit.modifiers = Modifiers::PUBLIC | Modifiers::TEAM;
    audit.superclass = Some("core.Team".to_string());
    audit.member_types.push("lib.Audit$Watcher".to_string());
    audit.extension = ExtensionBlock::V1(TeamRoleAttributes {
        flags: EXT_TEAM,
        ..TeamRoleAttributes::default()
    });

    let mut watcher = TypeDescriptor::new("lib.Audit$Watcher");
    watcher.modifiers = Modifiers::PUBLIC | Modifiers::ROLE;
    watcher.superclass = Some("core.Object".to_string());
    watcher.enclosing = Some("lib.Audit".to_string());
    watcher.methods.push(MethodDescriptor {
        name: "watch".to_string(),
        modifiers: Modifiers::PUBLIC,
        signature: "(I)V".to_string(),
    });
    watcher.extension = ExtensionBlock::V1(TeamRoleAttributes {
        flags: EXT_ROLE,
        base_class: Some("lib.Ledger".to_string()),
        callins: vec![CallinRecord {
            label: "w".to_string(),
            role_method: "watch".to_string(),
            role_signature: "(I)V".to_string(),
            kind: CallinKind::Before,
            base_methods: vec![BaseMethodRef {
                name: "post".to_string(),
                signature: "(I)V".to_string(),
            }],
        }],
        ..TeamRoleAttributes::default()
    });
    vec![ledger, audit, watcher]
}

#[test]
fn test_compiled_role_mappings_come_from_its_descriptor() {
    let mut session = session_with(audit_descriptors());
    let env = session.env_mut();
    let watcher = env.get_type("lib.Audit$Watcher").unwrap().unwrap();
    assert!(env.binding(watcher).is_role());

    let ledger = env.get_type("lib.Ledger").unwrap().unwrap();
    let base = env.base_class(watcher).unwrap();
    assert_eq!(base.and_then(|b| env.binding_of_type(b)), Some(ledger));

    let post = env.find_methods(ledger, "post").unwrap()[0];
    let mappings = env.mappings(watcher).unwrap();
    assert_eq!(mappings.len(), 1);
    let mapping = env.mapping(mappings[0]);
    assert!(mapping.is_complete());
    assert_eq!(mapping.label(), Some("w"));
    assert_eq!(mapping.kind(), MappingKind::Callin(CallinKind::Before));
    assert_eq!(mapping.base_methods(), &[post]);
    assert!(env.diagnostics().problems().is_empty(), "{:?}", env.diagnostics().problems());
}

/// Two roles played by each other, each with a callout that takes its
/// signature from the other role
const CROSSED: &str = r#"[
    {"file_name": "T1.rw", "package": "p",
     "types": [{
        "name": "T1",
        "modifiers": ["public", "team"],
        "member_types": [{
            "name": "R1",
            "played_by": {"named": [{"name": "T2"}, {"name": "R2"}]},
            "callouts": [
                {"role_method": {"name": "foo"}, "kind": "method", "base": {"name": "bar"}}
            ]
        }]
     }]},
    {"file_name": "T2.rw", "package": "p",
     "types": [{
        "name": "T2",
        "modifiers": ["public", "team"],
        "member_types": [{
            "name": "R2",
            "played_by": {"named": [{"name": "T1"}, {"name": "R1"}]},
            "methods": [
                {"name": "bar", "modifiers": ["public"],
                 "params": [{"name": "amount", "ty": {"primitive": "int"}}]}
            ],
            "callouts": [
                {"role_method": {"name": "baz"}, "kind": "method", "base": {"name": "foo"}}
            ]
        }]
     }]}
]"#;

#[test]
fn test_crossed_short_callouts_report_a_cycle() {
    let mut session = session_with(Vec::new());
    session.add_units(units(CROSSED)).unwrap();
    session.resolve().unwrap();
    let diags = session.env().diagnostics();
    assert_eq!(diags.with_id(CALLOUT_SIGNATURE_CYCLE).count(), 1, "{:?}", diags.problems());

    let env = session.env_mut();
    let r1 = env.lookup_binding("p.T1$R1").unwrap();
    let r2 = env.lookup_binding("p.T2$R2").unwrap();
    assert!(env.methods(r1).is_ok());
    // the callout closing the loop gets no role method
    assert!(env.find_methods(r2, "baz").unwrap().is_empty());
}
