use structura_model::{Acl, AclGrants, AllowAll, PermissionChecker};
use structura_types::AclId;

// ── Built-in checkers ────────────────────────────────────────────

struct DenyAll;
impl PermissionChecker for DenyAll {
    fn may_create(&self, _acl: AclId) -> bool {
        false
    }
}

#[test]
fn implementors_decide_for_themselves() {
    assert!(!DenyAll.may_create(AclId::new(1)));
    assert!(AllowAll.may_create(AclId::new(1)));
}

#[test]
fn allow_all_allows_everything() {
    for raw in 0..10 {
        assert!(AllowAll.may_create(AclId::new(raw)));
    }
}

// ── AclGrants ────────────────────────────────────────────────────

#[test]
fn grants_only_listed_acls() {
    let grants: AclGrants = [AclId::new(1), AclId::new(3)].into_iter().collect();
    assert!(grants.may_create(AclId::new(1)));
    assert!(!grants.may_create(AclId::new(2)));
    assert!(grants.may_create(AclId::new(3)));
}

#[test]
fn grant_and_revoke() {
    let mut grants = AclGrants::new();
    assert!(!grants.may_create(AclId::new(5)));

    grants.grant_create(AclId::new(5));
    assert!(grants.may_create(AclId::new(5)));

    grants.revoke_create(AclId::new(5));
    assert!(!grants.may_create(AclId::new(5)));
    assert!(grants.granted().is_empty());
}

// ── Custom checkers ──────────────────────────────────────────────

struct EvenOnly;
impl PermissionChecker for EvenOnly {
    fn may_create(&self, acl: AclId) -> bool {
        acl.get() % 2 == 0
    }
}

#[test]
fn custom_checker() {
    assert!(EvenOnly.may_create(AclId::new(2)));
    assert!(!EvenOnly.may_create(AclId::new(3)));
}

// ── Trait object safety ──────────────────────────────────────────

#[test]
fn checker_works_as_trait_object() {
    let checkers: Vec<Box<dyn PermissionChecker>> = vec![
        Box::new(AllowAll),
        Box::new(EvenOnly),
        Box::new(AclGrants::from_iter([AclId::new(4)])),
    ];
    for c in &checkers {
        assert!(c.may_create(AclId::new(4)));
    }
}

#[test]
fn acl_name_is_normalized() {
    let acl = Acl::new(AclId::new(1), " structure ");
    assert_eq!(acl.name, "STRUCTURE");
}
