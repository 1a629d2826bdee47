//! Runs against a real Postgres when `DATABASE_URL` is set; skipped otherwise.

use sqlx::postgres::PgPoolOptions;
use tracksync::models::{Mode, TrackedItem};
use tracksync::repo::pg::PgRepo;
use tracksync::repo::{RepoError, TrackedRepo, UserRepo};

async fn repo() -> Option<PgRepo> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let pool = PgPoolOptions::new()
        .max_connections(4)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(&url)
        .await
        .ok()?;
    sqlx::migrate!("./migrations").run(&pool).await.ok()?;
    Some(PgRepo::new(pool))
}

fn unique_email(tag: &str) -> String {
    format!("{tag}-{}@Example.com", uuid::Uuid::new_v4())
}

fn item(id: &str, updated_at: i64) -> TrackedItem {
    TrackedItem { id: id.into(), icon_link: None, updated_at }
}

#[tokio::test]
async fn pg_user_uniqueness_and_lookup() {
    let Some(r) = repo().await else { eprintln!("skip: no DATABASE_URL"); return; };
    let email = unique_email("uniq");

    let u = r.create_user(&email, "U", "h").await.unwrap();
    assert_eq!(u.email, email.to_lowercase());
    assert!(matches!(r.create_user(&email.to_uppercase(), "U2", "h").await, Err(RepoError::Conflict)));
    assert_eq!(r.find_user_by_email(&email).await.unwrap().id, u.id);
    assert_eq!(r.find_user_by_id(&u.id).await.unwrap().email, u.email);
    assert!(matches!(r.find_user_by_id("not-a-uuid").await, Err(RepoError::NotFound)));
    assert!(matches!(
        r.find_user_by_id(&uuid::Uuid::new_v4().to_string()).await,
        Err(RepoError::NotFound)
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn pg_concurrent_registration_exactly_one_wins() {
    let Some(r) = repo().await else { eprintln!("skip: no DATABASE_URL"); return; };
    let email = unique_email("race");
    let (a, b) = tokio::join!(r.create_user(&email, "A", "h"), r.create_user(&email, "B", "h"));
    let oks = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(oks, 1);
    assert!(matches!(a.err().or(b.err()), Some(RepoError::Conflict)));
}

#[tokio::test]
async fn pg_upsert_replaces_and_isolates_modes() {
    let Some(r) = repo().await else { eprintln!("skip: no DATABASE_URL"); return; };
    let u = r.create_user(&unique_email("tracked"), "T", "h").await.unwrap();

    assert!(r.get_tracked(&u.id, Mode::Pve).await.unwrap().is_empty());

    let a = vec![item("a1", 1), item("a2", 2)];
    assert_eq!(r.put_tracked(&u.id, Mode::Pve, a.clone()).await.unwrap(), a);
    let b = vec![TrackedItem { id: "b1".into(), icon_link: Some("icon".into()), updated_at: 9 }];
    r.put_tracked(&u.id, Mode::Pve, b.clone()).await.unwrap();
    assert_eq!(r.get_tracked(&u.id, Mode::Pve).await.unwrap(), b);
    assert!(r.get_tracked(&u.id, Mode::Pvp).await.unwrap().is_empty());

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tracked_items WHERE user_id = $1::uuid")
        .bind(&u.id)
        .fetch_one(r.pool())
        .await
        .unwrap();
    assert_eq!(rows, 1);
}

#[tokio::test]
async fn pg_put_for_unknown_user_is_not_found() {
    let Some(r) = repo().await else { eprintln!("skip: no DATABASE_URL"); return; };
    let ghost = uuid::Uuid::new_v4().to_string();
    assert!(matches!(r.put_tracked(&ghost, Mode::Pvp, vec![item("x", 1)]).await, Err(RepoError::NotFound)));
    assert!(r.get_tracked("not-a-uuid", Mode::Pvp).await.unwrap().is_empty());
}
