/*
    integration.rs - Repository and store behaviour end to end

    Exercises the registry the way a request handler would: create,
    search, link, delete, and the stream contract under cancellation
    and time budgets.
*/

use reguser_core::config::StoreConfig;
use reguser_core::model::{Group, GroupId, User, UserId, DEFAULT_PERMISSIONS};
use reguser_core::repos::Registry;
use reguser_core::store::{ErrorKind, GroupStore, MemStore, UserStore};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn names(users: &[User]) -> Vec<String> {
    let mut names: Vec<String> = users.iter().map(|u| u.name.clone()).collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_search_alice_and_bob() {
    let registry = Registry::default();
    let token = CancellationToken::new();

    registry.users.create(&token, User::new("alice", "a")).await.unwrap();
    registry.users.create(&token, User::new("bob", "b")).await.unwrap();

    let found = registry.users.search(&token, "ali").await.unwrap().collect_all().await;
    assert_eq!(names(&found), vec!["alice"]);
    assert_eq!(found[0].permissions, DEFAULT_PERMISSIONS);

    let found = registry.users.search(&token, "o").await.unwrap().collect_all().await;
    assert_eq!(names(&found), vec!["bob"]);

    let found = registry.users.search(&token, "").await.unwrap().collect_all().await;
    assert_eq!(names(&found), vec!["alice", "bob"]);

    let found = registry.users.search(&token, "Alice").await.unwrap().collect_all().await;
    assert!(found.is_empty());
}

#[tokio::test]
async fn test_link_then_unlink() {
    let registry = Registry::default();
    let token = CancellationToken::new();

    let u = registry.users.create(&token, User::new("alice", "")).await.unwrap();
    let g = registry.groups.create(&token, Group::new("admins")).await.unwrap();

    registry.membership.add_user_to_group(&token, u.id, g.id).await.unwrap();

    let groups = registry.membership.groups_of_user(&token, u.id).await.unwrap().collect_all().await;
    assert_eq!(groups, vec![g.clone()]);
    let users = registry.membership.users_of_group(&token, g.id).await.unwrap().collect_all().await;
    assert_eq!(users.iter().map(|u| u.id).collect::<Vec<_>>(), vec![u.id]);

    registry.membership.remove_user_from_group(&token, u.id, g.id).await.unwrap();
    // unlinking twice is fine
    registry.membership.remove_user_from_group(&token, u.id, g.id).await.unwrap();

    assert!(registry.membership.groups_of_user(&token, u.id).await.unwrap().collect_all().await.is_empty());
    assert!(registry.membership.users_of_group(&token, g.id).await.unwrap().collect_all().await.is_empty());
}

#[tokio::test]
async fn test_delete_asymmetry_between_layers() {
    let registry = Registry::default();
    let token = CancellationToken::new();

    let u = registry.users.create(&token, User::new("carol", "")).await.unwrap();
    registry.users.delete(&token, u.id).await.unwrap();

    // the store shrugs, the repository reports the miss
    registry.store().delete_user(&token, u.id).await.unwrap();
    registry.store().delete_group(&token, GroupId::generate()).await.unwrap();

    let err = registry.users.delete(&token, u.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = registry.groups.delete(&token, GroupId::generate()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_deleting_either_side_removes_membership() {
    let registry = Registry::default();
    let token = CancellationToken::new();

    let u = registry.users.create(&token, User::new("dave", "")).await.unwrap();
    let keep = registry.groups.create(&token, Group::new("keep")).await.unwrap();
    let gone = registry.groups.create(&token, Group::new("gone")).await.unwrap();
    registry.membership.add_user_to_group(&token, u.id, keep.id).await.unwrap();
    registry.membership.add_user_to_group(&token, u.id, gone.id).await.unwrap();

    registry.groups.delete(&token, gone.id).await.unwrap();
    let groups = registry.membership.groups_of_user(&token, u.id).await.unwrap().collect_all().await;
    assert_eq!(groups, vec![keep.clone()]);

    registry.users.delete(&token, u.id).await.unwrap();
    assert!(registry.membership.users_of_group(&token, keep.id).await.unwrap().collect_all().await.is_empty());
    assert_eq!(registry.store().stats().unwrap().memberships, 0);
}

#[tokio::test]
async fn test_pre_cancelled_search_terminates() {
    let registry = Registry::default();
    let live = CancellationToken::new();
    for i in 0..50 {
        registry.users.create(&live, User::new(format!("user-{}", i), "")).await.unwrap();
    }

    let cancelled = CancellationToken::new();
    cancelled.cancel();

    let outcome = tokio::time::timeout(Duration::from_secs(1), async {
        match registry.users.search(&cancelled, "user").await {
            Ok(stream) => stream.collect_all().await,
            Err(err) => {
                assert_eq!(err.kind(), ErrorKind::Cancelled);
                Vec::new()
            }
        }
    })
    .await
    .expect("cancelled search must terminate");
    assert!(outcome.is_empty());
}

#[tokio::test]
async fn test_cancel_mid_stream_frees_the_store() {
    let registry = Registry::new(StoreConfig {
        stream_buffer: 1,
        ..StoreConfig::default()
    });
    let token = CancellationToken::new();
    for i in 0..500 {
        registry.users.create(&token, User::new(format!("user-{}", i), "")).await.unwrap();
    }

    let request = token.child_token();
    let mut stream = registry.users.search(&request, "user").await.unwrap();
    assert!(stream.recv().await.is_some());
    request.cancel();

    let rest = tokio::time::timeout(Duration::from_secs(1), stream.collect_all())
        .await
        .expect("stream closes after cancellation");
    assert!(rest.len() < 499);

    // everything else keeps working
    let u = registry.users.create(&token, User::new("after", "")).await.unwrap();
    assert_eq!(registry.users.read(&token, u.id).await.unwrap().name, "after");
}

#[tokio::test(start_paused = true)]
async fn test_budget_closes_stream_with_partial_result() {
    let store = Arc::new(MemStore::with_config(StoreConfig {
        search_timeout: Duration::from_secs(2),
        stream_buffer: 3,
    }));
    let token = CancellationToken::new();
    for i in 0..20 {
        let user = User {
            id: UserId::generate(),
            name: format!("user-{}", i),
            data: String::new(),
            permissions: 0,
        };
        store.create_user(&token, user).await.unwrap();
    }

    let stream = store.search_users(&token, "user").await.unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;

    let partial = stream.collect_all().await;
    assert_eq!(partial.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_budget_applies_through_repository() {
    let registry = Registry::new(StoreConfig {
        search_timeout: Duration::from_millis(500),
        stream_buffer: 2,
    });
    let token = CancellationToken::new();
    for i in 0..300 {
        registry.groups.create(&token, Group::new(format!("g{}", i))).await.unwrap();
    }

    let stream = registry.groups.search(&token, "g").await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;

    let partial = stream.collect_all().await;
    assert!(!partial.is_empty());
    assert!(partial.len() < 300);
}

#[tokio::test]
async fn test_store_reads_entities_created_out_of_band() {
    let store = Arc::new(MemStore::new());
    let registry = Registry::with_store(store.clone());
    let token = CancellationToken::new();

    let g = Group {
        id: GroupId::generate(),
        name: "direct".to_string(),
    };
    store.create_group(&token, g.clone()).await.unwrap();

    assert_eq!(registry.groups.read(&token, g.id).await.unwrap(), g);
}
