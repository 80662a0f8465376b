//! 存储层测试
//!
//! LinkStore 索引一致性、UserDirectory 会话管理、短码生成账本。

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use chrono::{Duration, Utc};
use uuid::Uuid;

use quotalink::errors::QuotalinkError;
use quotalink::services::{CodeStrategy, ShortCodeGenerator};
use quotalink::storage::link_store::Claim;
use quotalink::storage::{Link, LinkStore, UserDirectory};

fn link(owner: Uuid, code: &str) -> Link {
    Link::builder(owner, "https://example.com", code)
        .build()
        .unwrap()
}

// =============================================================================
// LinkStore
// =============================================================================

#[test]
fn test_indexes_stay_in_step() {
    let store = LinkStore::new();
    let owner = Uuid::new_v4();
    let a = link(owner, "code001");
    let b = link(owner, "code002");
    store.put(a.clone()).unwrap();
    store.put(b.clone()).unwrap();

    assert_eq!(store.count(), 2);
    assert_eq!(store.find_by_code("code001").unwrap().id(), a.id());
    assert_eq!(store.get(b.id()).unwrap().code(), "code002");
    assert_eq!(store.find_by_owner(owner).len(), 2);

    store.remove(a.id()).unwrap();
    assert!(store.get(a.id()).is_none());
    assert!(!store.contains_code("code001"));
    assert_eq!(store.find_by_owner(owner).len(), 1);

    store.remove(b.id()).unwrap();
    assert!(store.find_by_owner(owner).is_empty());
    assert!(store.remove(b.id()).is_none());
}

#[test]
fn test_put_refuses_foreign_code_holder() {
    let store = LinkStore::new();
    store.put(link(Uuid::new_v4(), "taken01")).unwrap();

    let err = store.put(link(Uuid::new_v4(), "taken01")).unwrap_err();
    assert!(matches!(err, QuotalinkError::AlreadyExists(_)));
    assert_eq!(store.count(), 1);
}

#[test]
fn test_claim_keeps_or_replaces_holder() {
    let store = LinkStore::new();
    let owner = Uuid::new_v4();
    let first = link(owner, "same001");
    store.put(first.clone()).unwrap();

    match store.claim_code(link(owner, "same001"), |_| true) {
        Claim::Kept(kept) => assert_eq!(kept.id(), first.id()),
        other => panic!("unexpected claim: {:?}", other),
    }
    assert_eq!(store.count(), 1);

    let second = link(owner, "same001");
    match store.claim_code(second.clone(), |_| false) {
        Claim::Inserted { link, replaced } => {
            assert_eq!(link.id(), second.id());
            assert_eq!(replaced.unwrap().id(), first.id());
        }
        other => panic!("unexpected claim: {:?}", other),
    }
    assert_eq!(store.count(), 1);
    assert!(store.get(first.id()).is_none());
    assert_eq!(store.find_by_owner(owner).len(), 1);
}

#[test]
fn test_update_by_code_is_atomic_per_call() {
    let store = Arc::new(LinkStore::new());
    let owner = Uuid::new_v4();
    store
        .put(
            Link::builder(owner, "https://example.com", "busy001")
                .max_clicks(10_000)
                .build()
                .unwrap(),
        )
        .unwrap();

    thread::scope(|s| {
        for _ in 0..4 {
            let store = store.clone();
            s.spawn(move || {
                for _ in 0..250 {
                    store
                        .update_by_code("busy001", |l| l.record_click())
                        .unwrap()
                        .unwrap();
                }
            });
        }
    });

    assert_eq!(store.find_by_code("busy001").unwrap().current_clicks(), 1000);
    assert!(store.update_by_code("missing", |l| l.record_click()).is_none());
}

// =============================================================================
// UserDirectory
// =============================================================================

#[test]
fn test_user_registration() {
    let users = UserDirectory::new(24);
    let created = users.create_user(None).unwrap();
    assert!(users.exists(created.id()));
    assert!(matches!(
        users.create_user(Some(created.id())),
        Err(QuotalinkError::AlreadyExists(_))
    ));

    let explicit = Uuid::new_v4();
    assert_eq!(users.get_or_create(Some(explicit)).id(), explicit);
    assert_eq!(users.get_or_create(Some(explicit)).id(), explicit);
    assert_eq!(users.count(), 2);
}

#[test]
fn test_user_email_updates() {
    let users = UserDirectory::new(24);
    let id = users.get_or_create(None).id();

    let user = users.set_email(id, "owner@example.com").unwrap();
    assert_eq!(user.notification_email(), Some("owner@example.com"));
    assert!(matches!(
        users.set_email(id, "nope"),
        Err(QuotalinkError::InvalidEmail(_))
    ));
    assert_eq!(
        users.find(id).unwrap().notification_email(),
        Some("owner@example.com")
    );
    assert!(matches!(
        users.set_email(Uuid::new_v4(), "owner@example.com"),
        Err(QuotalinkError::NotFound(_))
    ));
}

#[test]
fn test_idle_users_are_pruned() {
    let users = UserDirectory::new(2);
    let idle = users.get_or_create(None).id();
    let active = users.get_or_create(None).id();
    users.set_last_activity(idle, Utc::now() - Duration::hours(5));

    assert_eq!(users.cleanup_inactive(Utc::now()), 1);
    assert!(!users.exists(idle));
    assert!(users.exists(active));
}

#[test]
fn test_concurrent_link_attach() {
    let users = Arc::new(UserDirectory::new(24));
    let id = users.get_or_create(None).id();

    let link_ids: Vec<Uuid> = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let users = users.clone();
                s.spawn(move || {
                    let link_id = Uuid::new_v4();
                    users.attach_link(id, link_id);
                    users.touch(id);
                    link_id
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let user = users.find(id).unwrap();
    assert_eq!(user.link_ids().len(), 8);
    assert!(link_ids.iter().all(|l| user.owns_link(*l)));
}

// =============================================================================
// ShortCodeGenerator
// =============================================================================

#[test]
fn test_concurrent_generation_for_one_pair() {
    let generator = Arc::new(ShortCodeGenerator::new(CodeStrategy::Random, 7));
    let owner = Uuid::new_v4();

    let codes: HashSet<String> = thread::scope(|s| {
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let generator = generator.clone();
                s.spawn(move || generator.generate("https://example.com", owner).unwrap())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(codes.len(), 1);
    assert_eq!(generator.issued_count(), 1);
}

#[test]
fn test_every_strategy_is_stable_per_pair() {
    for strategy in [CodeStrategy::Random, CodeStrategy::Base62, CodeStrategy::Hash] {
        let generator = ShortCodeGenerator::new(strategy, 8);
        let owner = Uuid::new_v4();
        let first = generator.generate("https://example.com/a", owner).unwrap();
        let again = generator.generate("https://example.com/a", owner).unwrap();
        let other = generator.generate("https://example.com/b", owner).unwrap();

        assert_eq!(first, again, "{}", strategy);
        assert_ne!(first, other, "{}", strategy);
        assert_eq!(first.len(), 8);
        assert!(generator.is_issued(&first));
    }
}
