//! End-to-End Test Suite: Access Control Workflows
//!
//! Drives the resolver the way an application would: configuration loaded
//! from disk, roles seeded into a grant source, checks for users and roles,
//! and grant changes followed by invalidation.

use std::io::Write;
use std::sync::Arc;

use tempfile::Builder;
use warden_acl::{
    AclConfig, Grant, GrantChange, InMemoryGrantSource, MemoryCacheStore, MergePolicy,
    PermissionRecord, PermissionResolver, Role, RoleId, Target, UserId,
};

const ADMIN: RoleId = RoleId(1);
const EDITOR: RoleId = RoleId(2);
const VIEWER: RoleId = RoleId(3);

const ALICE: UserId = UserId(10);
const BOB: UserId = UserId(11);

type Resolver = PermissionResolver<InMemoryGrantSource, MemoryCacheStore>;

fn load_config(contents: &str) -> AclConfig {
    let mut file = Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("Failed to create config file");
    file.write_all(contents.as_bytes())
        .expect("Failed to write config file");
    AclConfig::load(Some(file.path())).expect("Failed to load config")
}

/// Seed a small publishing site: admins manage everything, editors manage
/// posts, viewers only read.
fn publishing_site(config: AclConfig) -> (Arc<InMemoryGrantSource>, Arc<MemoryCacheStore>, Resolver) {
    let source = Arc::new(InMemoryGrantSource::new());
    source.insert_role(Role::new(ADMIN, "Administrator", "admin"));
    source.insert_role(Role::new(EDITOR, "Editor", "editor").with_description("Manages posts"));
    source.insert_role(Role::new(VIEWER, "Viewer", "viewer"));

    source.sync_grants(
        ADMIN,
        vec![
            Grant::global(PermissionRecord::flag("post", true)),
            Grant::global(PermissionRecord::flag("user", true)),
        ],
    );
    source.sync_grants(
        EDITOR,
        vec![Grant::global(PermissionRecord::actions(
            "post",
            [("create", true), ("view", true), ("update", true), ("delete", false)],
        ))],
    );
    source.sync_grants(
        VIEWER,
        vec![Grant::global(PermissionRecord::actions("post", [("view", true)]))],
    );

    let cache = Arc::new(MemoryCacheStore::new());
    let resolver = PermissionResolver::new(source.clone(), cache.clone(), config)
        .expect("Failed to create resolver");
    (source, cache, resolver)
}

#[test]
fn test_configured_site_workflow() {
    let config = load_config(
        r#"
cache_minutes = 5
cache_prefix = "site.acl"
extra_merge = "prefer_persisted"
"#,
    );
    assert_eq!(config.cache_minutes, 5);

    let (source, cache, resolver) = publishing_site(config);
    source.assign_role(ALICE, EDITOR, None);
    source.assign_role(BOB, VIEWER, None);

    // Editors write, viewers read
    assert!(resolver.can(ALICE, "post.create&post.update", None, None).unwrap());
    assert!(!resolver.can(ALICE, "post.delete", None, None).unwrap());
    assert!(resolver.can(BOB, "post.view", None, None).unwrap());
    assert!(!resolver.can(BOB, "post.create|post.update", None, None).unwrap());
    assert!(cache.contains("site.acl:user:10"));
    assert!(cache.contains("site.acl:user:11"));

    // Bob is promoted
    let change = source.assign_role(BOB, ADMIN, None);
    assert_eq!(change, GrantChange::UserGrants(BOB));
    resolver.apply_change(&change).unwrap();
    assert!(!cache.contains("site.acl:user:11"));
    assert!(resolver.can(BOB, "post.delete&user.create", None, None).unwrap());
    assert!(resolver.has_role(BOB, "admin|editor", None).unwrap());

    // Editors lose post.update; Alice sees it once the change is applied
    let change = source.revoke(EDITOR, "post", None);
    source.grant_records(
        EDITOR,
        vec![PermissionRecord::actions("post", [("create", true), ("view", true)])],
    );
    resolver.apply_change(&change).unwrap();
    assert!(!resolver.can(ALICE, "post.update", None, None).unwrap());
    assert!(resolver.can(ALICE, "post.create", None, None).unwrap());
}

#[test]
fn test_scoped_editor_workflow() {
    let (source, _, resolver) = publishing_site(AclConfig::default());
    let own_article = Target::new("article", 7);
    let other_article = Target::new("article", 8);

    // Alice edits only her own article, Bob may publish any article
    source.assign_role(ALICE, EDITOR, Some(own_article.clone()));
    source.grant_to_user(BOB, Grant::global(PermissionRecord::actions("post", [("publish", true)])));
    source.assign_role(BOB, VIEWER, None);

    let alice = resolver.principal(ALICE);
    assert!(alice.able("post.update", Some(&own_article), None, None).unwrap());
    assert!(!alice.able("post.update", Some(&other_article), None, None).unwrap());
    assert!(!alice.can("post.update", None, None).unwrap());
    assert!(alice.able("create.view", Some(&own_article), None, None).unwrap());

    let bob = resolver.principal(BOB);
    assert!(bob.able("post.publish", Some(&other_article), None, None).unwrap());
    assert!(bob.can(["post.view", "post.publish"], Some("and"), None).unwrap());

    let permissions = alice.permissions().unwrap();
    assert!(permissions.allows("post.update:article:7"));
    assert!(!permissions.contains_key("post.update"));
}

#[test]
fn test_request_scoped_extra_permissions() {
    let (source, _, resolver) =
        publishing_site(AclConfig::default().with_extra_merge(MergePolicy::PreferExtra));
    source.assign_role(ALICE, VIEWER, None);

    // A feature flag grants preview access for this request only
    let preview = [PermissionRecord::actions("post", [("preview", true)])];
    assert!(resolver.can(ALICE, "post.preview", None, Some(&preview)).unwrap());
    assert!(!resolver.can(ALICE, "post.preview", None, None).unwrap());

    // Extras override persisted values under PreferExtra
    let suspended = [PermissionRecord::actions("post", [("view", false)])];
    assert!(!resolver.can(ALICE, "post.view", None, Some(&suspended)).unwrap());
    assert!(resolver.can(ALICE, "post.view", None, None).unwrap());
}

#[test]
fn test_memoization_disabled_by_config() {
    let config = load_config("cache_minutes = 0\n");
    let (source, cache, resolver) = publishing_site(config);
    source.assign_role(ALICE, VIEWER, None);

    assert!(!resolver.can(ALICE, "post.create", None, None).unwrap());
    source.assign_role(ALICE, EDITOR, None);
    assert!(resolver.can(ALICE, "post.create", None, None).unwrap());
    assert!(cache.is_empty());
}
