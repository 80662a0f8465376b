//! 并发行为测试
//!
//! 多线程同时解析、创建、改配额时计数和索引必须保持一致。

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use uuid::Uuid;

use quotalink::services::{
    CodeStrategy, CreateLinkRequest, LinkRegistry, NoopNotifier, RegistrySettings,
    ShortCodeGenerator,
};
use quotalink::storage::{LinkStore, UserDirectory};

fn registry() -> (Arc<LinkStore>, Arc<LinkRegistry>) {
    let store = Arc::new(LinkStore::new());
    let registry = Arc::new(LinkRegistry::new(
        store.clone(),
        Arc::new(ShortCodeGenerator::new(CodeStrategy::Base62, 7)),
        Arc::new(UserDirectory::new(168)),
        Arc::new(NoopNotifier),
        RegistrySettings::default(),
    ));
    (store, registry)
}

// =============================================================================
// 解析计数
// =============================================================================

#[test]
fn test_concurrent_resolves_lose_no_clicks() {
    let (store, registry) = registry();
    let link = registry
        .create_link(
            Uuid::new_v4(),
            CreateLinkRequest::new("https://example.com").with_max_clicks(1000),
        )
        .unwrap()
        .link;

    thread::scope(|s| {
        for _ in 0..8 {
            let registry = registry.clone();
            let code = link.code().to_string();
            s.spawn(move || {
                for _ in 0..100 {
                    registry.resolve(&code).unwrap();
                }
            });
        }
    });

    let stored = store.find_by_code(link.code()).unwrap();
    assert_eq!(stored.current_clicks(), 800);
    assert!(stored.is_active());
}

#[test]
fn test_quota_never_overshoots_under_contention() {
    let (store, registry) = registry();
    let link = registry
        .create_link(
            Uuid::new_v4(),
            CreateLinkRequest::new("https://example.com").with_max_clicks(50),
        )
        .unwrap()
        .link;
    let successes = AtomicUsize::new(0);

    thread::scope(|s| {
        for _ in 0..8 {
            let registry = registry.clone();
            let code = link.code().to_string();
            let successes = &successes;
            s.spawn(move || {
                for _ in 0..25 {
                    if registry.resolve(&code).is_ok() {
                        successes.fetch_add(1, Ordering::Relaxed);
                    }
                }
            });
        }
    });

    assert_eq!(successes.load(Ordering::Relaxed), 50);
    let stored = store.find_by_code(link.code()).unwrap();
    assert_eq!(stored.current_clicks(), 50);
    assert!(!stored.can_be_accessed());
}

// =============================================================================
// 创建
// =============================================================================

#[test]
fn test_concurrent_creates_for_same_pair_share_one_link() {
    let (store, registry) = registry();
    let owner = Uuid::new_v4();

    let codes: Vec<String> = thread::scope(|s| {
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = registry.clone();
                s.spawn(move || {
                    registry
                        .create_link(owner, CreateLinkRequest::new("https://example.com/shared"))
                        .unwrap()
                        .link
                        .code()
                        .to_string()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(codes.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(store.count(), 1);
    assert_eq!(registry.list_owned(owner).len(), 1);
}

#[test]
fn test_concurrent_creates_for_distinct_pairs() {
    let (store, registry) = registry();

    thread::scope(|s| {
        for t in 0..8 {
            let registry = registry.clone();
            s.spawn(move || {
                let owner = Uuid::new_v4();
                for i in 0..20 {
                    let url = format!("https://example.com/{}/{}", t, i);
                    registry
                        .create_link(owner, CreateLinkRequest::new(&url))
                        .unwrap();
                }
            });
        }
    });

    assert_eq!(store.count(), 160);
    let mut codes: Vec<String> = store.all().iter().map(|l| l.code().to_string()).collect();
    codes.sort();
    codes.dedup();
    assert_eq!(codes.len(), 160);
}

// =============================================================================
// 修改与解析交错
// =============================================================================

#[test]
fn test_quota_updates_interleaved_with_resolves() {
    let (store, registry) = registry();
    let owner = Uuid::new_v4();
    let link = registry
        .create_link(
            owner,
            CreateLinkRequest::new("https://example.com").with_max_clicks(10),
        )
        .unwrap()
        .link;
    let code = link.code().to_string();

    thread::scope(|s| {
        let resolver = registry.clone();
        let resolver_code = code.clone();
        s.spawn(move || {
            for _ in 0..200 {
                let _ = resolver.resolve(&resolver_code);
            }
        });

        let editor = registry.clone();
        let editor_code = code.clone();
        s.spawn(move || {
            for quota in (20..=500).step_by(20) {
                // 配额可能已低于点击数，失败时保持原值
                let _ = editor.update_quota(&editor_code, owner, quota);
            }
        });
    });

    let stored = store.find_by_code(&code).unwrap();
    assert!(stored.current_clicks() <= stored.max_clicks());
    assert_eq!(store.find_by_owner(owner).len(), 1);
}
