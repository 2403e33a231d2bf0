//! Integration tests for group membership and admin reassignment

mod support;

use std::sync::Arc;

use mawid_core::{Actor, CreateGroup, GroupService};
use mawid_domain::{MawidError, Role};
use support::{make_group, make_user, FixedClock, InMemoryStore};

fn service(store: &Arc<InMemoryStore>, clock: &Arc<FixedClock>) -> GroupService {
    GroupService::new(store.clone(), store.clone(), clock.clone())
}

fn setup() -> (Arc<InMemoryStore>, Arc<FixedClock>) {
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(FixedClock::at("2025-03-01", "12:00"));
    (store, clock)
}

#[tokio::test]
async fn create_always_includes_admin_in_members() {
    let (store, clock) = setup();
    store.seed_user(make_user("admin-1", Role::Admin));
    store.seed_user(make_user("user-2", Role::User));
    let service = service(&store, &clock);

    let group = service
        .create(CreateGroup {
            name: "Reading club".into(),
            description: None,
            admin_id: "admin-1".into(),
            members: vec!["user-2".into(), "user-2".into()],
        })
        .await
        .unwrap();

    assert!(group.is_member("admin-1"));
    assert_eq!(group.members.len(), 2);

    // Member records gained the group
    assert_eq!(store.user("user-2").unwrap().group_ids, vec![group.id.clone()]);
    assert_eq!(store.user("admin-1").unwrap().group_ids, vec![group.id]);
}

#[tokio::test]
async fn add_members_ignores_existing_and_errors_when_nothing_new() {
    let (store, clock) = setup();
    store.seed_group(make_group("grp-1", "admin-1", &["admin-1", "user-2"]));
    store.seed_user(make_user("user-2", Role::User));
    store.seed_user(make_user("user-3", Role::User));
    let service = service(&store, &clock);
    let actor = Actor::new("admin-1", Role::User);

    let group = service
        .add_members(&actor, "grp-1", &["user-2".into(), "user-3".into()])
        .await
        .unwrap();
    assert_eq!(group.members.len(), 3);
    assert_eq!(store.user("user-3").unwrap().group_ids, vec!["grp-1".to_string()]);

    // Everyone already present: conflict
    let err = service
        .add_members(&actor, "grp-1", &["user-2".into(), "user-3".into()])
        .await
        .unwrap_err();
    assert!(matches!(err, MawidError::Conflict(_)));
}

#[tokio::test]
async fn member_mutations_respect_the_three_way_admin_policy() {
    let (store, clock) = setup();
    store.seed_group(make_group("grp-1", "admin-1", &["admin-1", "user-2"]));
    store.seed_user(make_user("user-3", Role::User));
    let service = service(&store, &clock);

    // A plain member may not add
    let err = service
        .add_members(&Actor::new("user-2", Role::User), "grp-1", &["user-3".into()])
        .await
        .unwrap_err();
    assert!(matches!(err, MawidError::Forbidden(_)));

    // A global admin who is not the group admin may
    service
        .add_members(&Actor::new("outsider", Role::Admin), "grp-1", &["user-3".into()])
        .await
        .unwrap();
}

#[tokio::test]
async fn remove_members_errors_when_none_are_members() {
    let (store, clock) = setup();
    store.seed_group(make_group("grp-1", "admin-1", &["admin-1", "user-2"]));
    store.seed_user(make_user("user-2", Role::User));
    let service = service(&store, &clock);
    let actor = Actor::new("admin-1", Role::User);

    let err =
        service.remove_members(&actor, "grp-1", &["user-9".into()]).await.unwrap_err();
    assert!(matches!(err, MawidError::Conflict(_)));

    let group = service.remove_members(&actor, "grp-1", &["user-2".into()]).await.unwrap();
    assert!(!group.is_member("user-2"));
}

#[tokio::test]
async fn reassign_admin_permission_is_strict() {
    let (store, clock) = setup();
    store.seed_group(make_group("grp-1", "admin-1", &["admin-1", "user-2"]));
    store.seed_user(make_user("admin-1", Role::Admin));
    store.seed_user(make_user("user-2", Role::User));
    let service = service(&store, &clock);

    // A global admin who is not the current admin may NOT reassign
    let err = service
        .reassign_admin(&Actor::new("outsider", Role::Admin), "grp-1", "user-2")
        .await
        .unwrap_err();
    assert!(matches!(err, MawidError::Forbidden(_)));

    // The current admin may
    service
        .reassign_admin(&Actor::new("admin-1", Role::User), "grp-1", "user-2")
        .await
        .unwrap();
    assert_eq!(store.group("grp-1").unwrap().admin_id, "user-2");
}

#[tokio::test]
async fn reassign_admin_requires_membership() {
    let (store, clock) = setup();
    store.seed_group(make_group("grp-1", "admin-1", &["admin-1", "user-2"]));
    store.seed_user(make_user("user-9", Role::User));
    let service = service(&store, &clock);

    let err = service
        .reassign_admin(&Actor::new("admin-1", Role::User), "grp-1", "user-9")
        .await
        .unwrap_err();
    assert!(matches!(err, MawidError::Validation(_)));
}

#[tokio::test]
async fn reassignment_promotes_incoming_and_demotes_outgoing_admin() {
    let (store, clock) = setup();
    store.seed_group(make_group("grp-1", "admin-1", &["admin-1", "user-2"]));
    store.seed_user(make_user("admin-1", Role::Admin));
    store.seed_user(make_user("user-2", Role::User));
    let service = service(&store, &clock);

    service
        .reassign_admin(&Actor::new("admin-1", Role::Admin), "grp-1", "user-2")
        .await
        .unwrap();

    // Incoming admin promoted and attached to the group
    let incoming = store.user("user-2").unwrap();
    assert_eq!(incoming.role, Role::Admin);
    assert!(incoming.group_ids.contains(&"grp-1".to_string()));

    // Outgoing admin administers nothing else: demoted to plain user
    assert_eq!(store.user("admin-1").unwrap().role, Role::User);
}

#[tokio::test]
async fn outgoing_admin_keeps_role_while_administering_another_group() {
    let (store, clock) = setup();
    store.seed_group(make_group("grp-1", "admin-1", &["admin-1", "user-2"]));
    store.seed_group(make_group("grp-2", "admin-1", &["admin-1"]));
    store.seed_user(make_user("admin-1", Role::Admin));
    store.seed_user(make_user("user-2", Role::User));
    let service = service(&store, &clock);

    service
        .reassign_admin(&Actor::new("admin-1", Role::Admin), "grp-1", "user-2")
        .await
        .unwrap();

    assert_eq!(store.user("admin-1").unwrap().role, Role::Admin);
}

#[tokio::test]
async fn self_reassignment_does_not_demote() {
    let (store, clock) = setup();
    store.seed_group(make_group("grp-1", "admin-1", &["admin-1"]));
    store.seed_user(make_user("admin-1", Role::Admin));
    let service = service(&store, &clock);

    service
        .reassign_admin(&Actor::new("admin-1", Role::Admin), "grp-1", "admin-1")
        .await
        .unwrap();

    assert_eq!(store.user("admin-1").unwrap().role, Role::Admin);
    assert_eq!(store.group("grp-1").unwrap().admin_id, "admin-1");
}

#[tokio::test]
async fn delete_detaches_group_from_member_records() {
    let (store, clock) = setup();
    store.seed_group(make_group("grp-1", "admin-1", &["admin-1", "user-2"]));
    let mut member = make_user("user-2", Role::User);
    member.group_ids = vec!["grp-1".into()];
    store.seed_user(member);
    let service = service(&store, &clock);

    service.delete("grp-1").await.unwrap();

    assert!(store.group("grp-1").is_none());
    assert!(store.user("user-2").unwrap().group_ids.is_empty());
}
