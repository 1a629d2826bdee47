use tracksync::models::{Mode, TrackedItem};
use tracksync::repo::{inmem::InMemRepo, RepoError};
// Bring trait method namespaces into scope so calls on InMemRepo resolve.
use tracksync::repo::{TrackedRepo, UserRepo};

fn repo() -> InMemRepo {
    InMemRepo::new()
}

fn item(id: &str, updated_at: i64) -> TrackedItem {
    TrackedItem { id: id.into(), icon_link: None, updated_at }
}

#[tokio::test]
async fn create_and_lookup_users() {
    let r = repo();

    let u = r.create_user("  Alice@Example.COM ", "Alice", "$argon2id$x").await.unwrap();
    assert_eq!(u.email, "alice@example.com");
    assert_eq!(u.name, "Alice");
    assert!(u.avatar_url.is_none());
    assert!(uuid::Uuid::parse_str(&u.id).is_ok());

    let by_email = r.find_user_by_email("ALICE@example.com").await.unwrap();
    assert_eq!(by_email.id, u.id);
    let by_id = r.find_user_by_id(&u.id).await.unwrap();
    assert_eq!(by_id.email, "alice@example.com");

    assert!(matches!(r.find_user_by_email("bob@example.com").await, Err(RepoError::NotFound)));
    assert!(matches!(r.find_user_by_id("no-such-id").await, Err(RepoError::NotFound)));
}

#[tokio::test]
async fn duplicate_normalized_email_conflicts() {
    let r = repo();
    r.create_user("a@x.com", "A", "h").await.unwrap();
    let err = r.create_user(" A@X.com", "Other", "h2").await.unwrap_err();
    assert!(matches!(err, RepoError::Conflict));
    // the original row is untouched
    assert_eq!(r.find_user_by_email("a@x.com").await.unwrap().name, "A");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registration_same_email_exactly_one_wins() {
    let r = repo();
    let mut handles = Vec::new();
    for i in 0..8 {
        let r = r.clone();
        handles.push(tokio::spawn(async move {
            r.create_user("race@x.com", &format!("racer-{i}"), "h").await
        }));
    }
    let mut ok = 0;
    let mut conflicts = 0;
    for h in handles {
        match h.await.unwrap() {
            Ok(_) => ok += 1,
            Err(RepoError::Conflict) => conflicts += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(ok, 1);
    assert_eq!(conflicts, 7);
}

#[tokio::test]
async fn absent_collection_reads_empty() {
    let r = repo();
    let u = r.create_user("a@x.com", "A", "h").await.unwrap();
    assert!(r.get_tracked(&u.id, Mode::Pvp).await.unwrap().is_empty());
    assert!(r.get_tracked("unknown-user", Mode::Pve).await.unwrap().is_empty());
    assert!(r.last_modified(&u.id, Mode::Pvp).is_none());
}

#[tokio::test]
async fn put_replaces_whole_collection() {
    let r = repo();
    let u = r.create_user("a@x.com", "A", "h").await.unwrap();

    let a = vec![item("a1", 1), item("a2", 2), item("shared", 3)];
    let echoed = r.put_tracked(&u.id, Mode::Pve, a.clone()).await.unwrap();
    assert_eq!(echoed, a);
    let first_write = r.last_modified(&u.id, Mode::Pve).expect("stamped");

    let b = vec![TrackedItem { id: "b1".into(), icon_link: Some("https://icons/b1.png".into()), updated_at: 10 }];
    r.put_tracked(&u.id, Mode::Pve, b.clone()).await.unwrap();
    assert_eq!(r.get_tracked(&u.id, Mode::Pve).await.unwrap(), b);
    assert!(r.last_modified(&u.id, Mode::Pve).unwrap() >= first_write);

    r.put_tracked(&u.id, Mode::Pve, Vec::new()).await.unwrap();
    assert!(r.get_tracked(&u.id, Mode::Pve).await.unwrap().is_empty());
}

#[tokio::test]
async fn modes_and_users_are_isolated() {
    let r = repo();
    let u = r.create_user("a@x.com", "A", "h").await.unwrap();
    let v = r.create_user("b@x.com", "B", "h").await.unwrap();

    r.put_tracked(&u.id, Mode::Pvp, vec![item("x", 1)]).await.unwrap();
    assert!(r.get_tracked(&u.id, Mode::Pve).await.unwrap().is_empty());
    assert!(r.get_tracked(&v.id, Mode::Pvp).await.unwrap().is_empty());

    r.put_tracked(&u.id, Mode::Pve, vec![item("y", 2)]).await.unwrap();
    assert_eq!(r.get_tracked(&u.id, Mode::Pvp).await.unwrap(), vec![item("x", 1)]);
    assert_eq!(r.get_tracked(&u.id, Mode::Pve).await.unwrap(), vec![item("y", 2)]);
}

#[tokio::test]
async fn structurally_invalid_items_are_refused() {
    let r = repo();
    let u = r.create_user("a@x.com", "A", "h").await.unwrap();
    r.put_tracked(&u.id, Mode::Pvp, vec![item("keep", 1)]).await.unwrap();

    for bad in [vec![item("", 1)], vec![item("neg", -1)], vec![item("d", 1), item("d", 2)]] {
        let err = r.put_tracked(&u.id, Mode::Pvp, bad).await.unwrap_err();
        assert!(matches!(err, RepoError::Invalid(_)));
    }
    // nothing was overwritten
    assert_eq!(r.get_tracked(&u.id, Mode::Pvp).await.unwrap(), vec![item("keep", 1)]);
}

#[tokio::test]
async fn put_for_unknown_user_is_not_found() {
    let r = repo();
    let err = r.put_tracked("ghost", Mode::Pvp, vec![item("x", 1)]).await.unwrap_err();
    assert!(matches!(err, RepoError::NotFound));
}
