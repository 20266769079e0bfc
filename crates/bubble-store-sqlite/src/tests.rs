//! Integration tests for `SqliteStore` against an in-memory database.

use std::collections::BTreeSet;

use bubble_core::{
  ledger::LatestRecordedWindow,
  status::Status,
  store::{BubbleStore, StoreError as _},
  user::{NewUser, User, UserQuery},
};
use chrono::NaiveDate;
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn user(s: &SqliteStore, given: &str, family: &str) -> User {
  let email = format!("{}@itest.com", given.to_lowercase());
  s.create_user(NewUser::new(given, family, email)).await.unwrap()
}

fn date(s: &str) -> NaiveDate { s.parse().unwrap() }

fn core(err: &Error) -> &bubble_core::Error {
  err.domain().expect("domain error")
}

// ─── Directory ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_user() {
  let s = store().await;

  let ruby = user(&s, "Ruby", "Rose").await;
  assert_eq!(ruby.status, Status::Baseline);
  assert!(ruby.first_connections.is_empty());
  assert!(ruby.temporary_connections.is_empty());

  let fetched = s.get_user(ruby.user_id).await.unwrap().unwrap();
  assert_eq!(fetched.user_id, ruby.user_id);
  assert_eq!(fetched.given_name, "Ruby");
  assert_eq!(fetched.email, "ruby@itest.com");
  assert_eq!(fetched.status, Status::Baseline);
}

#[tokio::test]
async fn get_user_missing_returns_none() {
  let s = store().await;
  assert!(s.get_user(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_email_is_rejected_without_side_effects() {
  let s = store().await;
  let ruby = s
    .create_user(NewUser::new("Ruby", "Rose", "redlikeroses@gmail.com"))
    .await
    .unwrap();

  let err = s
    .create_user(NewUser::new("Summer", "Rose", "redlikeroses@gmail.com"))
    .await
    .unwrap_err();
  assert!(matches!(
    core(&err),
    bubble_core::Error::DuplicateIdentity(email) if email == "redlikeroses@gmail.com"
  ));

  let all = s.find_users(&UserQuery::default()).await.unwrap();
  assert_eq!(all.len(), 1);
  assert_eq!(all[0], ruby);
}

#[tokio::test]
async fn find_users_by_each_field() {
  let s = store().await;
  let ruby = user(&s, "Ruby", "Rose").await;
  user(&s, "Yang", "Xiao Long").await;

  let queries = [
    UserQuery { given_name: Some("Ruby".into()), ..Default::default() },
    UserQuery { family_name: Some("Rose".into()), ..Default::default() },
    UserQuery::by_email("ruby@itest.com"),
    UserQuery { user_id: Some(ruby.user_id), ..Default::default() },
  ];
  for q in &queries {
    let found = s.find_users(q).await.unwrap();
    assert_eq!(found.len(), 1, "{q:?}");
    assert_eq!(found[0].user_id, ruby.user_id);
  }

  let none = s.find_users(&UserQuery::by_email("nobody@itest.com")).await.unwrap();
  assert!(none.is_empty());
}

#[tokio::test]
async fn find_users_combines_fields() {
  let s = store().await;
  user(&s, "Ruby", "Rose").await;
  s.create_user(NewUser::new("Summer", "Rose", "summer@itest.com"))
    .await
    .unwrap();

  let both = s
    .find_users(&UserQuery { family_name: Some("Rose".into()), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(both.len(), 2);

  let one = s
    .find_users(&UserQuery {
      given_name: Some("Summer".into()),
      family_name: Some("Rose".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(one.len(), 1);
  assert_eq!(one[0].given_name, "Summer");
}

// ─── Connection graph ────────────────────────────────────────────────────────

#[tokio::test]
async fn first_connection_is_symmetric() {
  let s = store().await;
  let jacob = user(&s, "Jacob", "Two-Two").await;
  let taker = user(&s, "The", "Undertaker").await;

  let (a, b) = s
    .add_first_connection(jacob.user_id, taker.user_id)
    .await
    .unwrap();
  assert_eq!(a.user_id, jacob.user_id);
  assert_eq!(b.user_id, taker.user_id);
  assert_eq!(a.first_connections, vec![taker.user_id]);
  assert_eq!(b.first_connections, vec![jacob.user_id]);

  let stored = s.get_user(taker.user_id).await.unwrap().unwrap();
  assert_eq!(stored.first_connections, vec![jacob.user_id]);
}

#[tokio::test]
async fn duplicate_connection_rejected_in_either_order() {
  let s = store().await;
  let a = user(&s, "Jacob", "Two-Two").await;
  let b = user(&s, "The", "Undertaker").await;

  s.add_first_connection(a.user_id, b.user_id).await.unwrap();

  let err = s.add_first_connection(a.user_id, b.user_id).await.unwrap_err();
  assert!(matches!(core(&err), bubble_core::Error::AlreadyConnected(..)));

  let err = s.add_first_connection(b.user_id, a.user_id).await.unwrap_err();
  assert!(matches!(core(&err), bubble_core::Error::AlreadyConnected(..)));

  let stored = s.get_user(a.user_id).await.unwrap().unwrap();
  assert_eq!(stored.first_connections.len(), 1);
}

#[tokio::test]
async fn concurrent_connections_yield_one_success() {
  let s = store().await;
  let a = user(&s, "Jacob", "Two-Two").await;
  let b = user(&s, "The", "Undertaker").await;

  let (r1, r2) = tokio::join!(
    s.add_first_connection(a.user_id, b.user_id),
    s.add_first_connection(b.user_id, a.user_id),
  );
  let results = [r1, r2];
  assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
  let err = results.into_iter().find_map(Result::err).unwrap();
  assert!(matches!(core(&err), bubble_core::Error::AlreadyConnected(..)));
}

#[tokio::test]
async fn connecting_unknown_or_self_fails() {
  let s = store().await;
  let a = user(&s, "Ruby", "Rose").await;
  let ghost = Uuid::new_v4();

  let err = s.add_first_connection(a.user_id, ghost).await.unwrap_err();
  assert!(matches!(core(&err), bubble_core::Error::NotFound(id) if *id == ghost));

  let err = s.add_first_connection(a.user_id, a.user_id).await.unwrap_err();
  assert!(matches!(core(&err), bubble_core::Error::SelfConnection(_)));

  // No half-written edge survives the failed attempt.
  let stored = s.get_user(a.user_id).await.unwrap().unwrap();
  assert!(stored.first_connections.is_empty());
}

#[tokio::test]
async fn connections_by_degree() {
  let s = store().await;
  let ruby = user(&s, "Ruby", "Rose").await;
  let yang = user(&s, "Yang", "Xiao Long").await;
  let jacob = user(&s, "Jacob", "Two-Two").await;
  let taker = user(&s, "The", "Undertaker").await;
  let builder = user(&s, "Builder", "Bob").await;

  for (a, b) in [(&ruby, &yang), (&ruby, &jacob), (&taker, &builder), (&jacob, &taker)] {
    s.add_first_connection(a.user_id, b.user_id).await.unwrap();
  }

  let c = s.get_connections(taker.user_id).await.unwrap();
  assert_eq!(c.first, BTreeSet::from([jacob.user_id, builder.user_id]));
  assert_eq!(c.second, BTreeSet::from([ruby.user_id]));
  assert_eq!(c.third, BTreeSet::from([yang.user_id]));
}

#[tokio::test]
async fn get_connections_unknown_user_fails() {
  let s = store().await;
  let err = s.get_connections(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(core(&err), bubble_core::Error::NotFound(_)));
}

// ─── Exposure ledger ─────────────────────────────────────────────────────────

#[tokio::test]
async fn temporary_connection_admission_and_pruning() {
  let s = store().await;
  let ruby = user(&s, "Ruby", "Rose").await;
  let yang = user(&s, "Yang", "Xiao Long").await;
  let jacob = user(&s, "Jacob", "Two-Two").await;

  s.add_temporary_connection(ruby.user_id, yang.user_id, date("2020-11-01"))
    .await
    .unwrap();

  let (a, b) = s
    .add_temporary_connection(ruby.user_id, yang.user_id, date("2020-11-15"))
    .await
    .unwrap();
  assert_eq!(a.user_id, ruby.user_id);
  assert_eq!(b.user_id, yang.user_id);
  assert_eq!(b.temporary_connections.len(), 2);
  assert!(b.temporary_connections.iter().all(|tc| tc.peer_id == ruby.user_id));

  let err = s
    .add_temporary_connection(ruby.user_id, yang.user_id, date("2020-11-15"))
    .await
    .unwrap_err();
  assert!(matches!(core(&err), bubble_core::Error::DuplicateContact { .. }));

  s.add_temporary_connection(ruby.user_id, yang.user_id, date("2020-11-16"))
    .await
    .unwrap();
  s.add_temporary_connection(ruby.user_id, jacob.user_id, date("2020-11-15"))
    .await
    .unwrap();

  let err = s
    .add_temporary_connection(ruby.user_id, jacob.user_id, date("2020-10-23"))
    .await
    .unwrap_err();
  assert!(matches!(core(&err), bubble_core::Error::InvalidDate(_)));

  let current = s.get_temporary_connections(ruby.user_id).await.unwrap();
  assert_eq!(current.len(), 3);
  assert!(current.iter().all(|tc| tc.date != date("2020-11-01")));
  assert_eq!(current[2].peer_id, jacob.user_id);

  // The stale entry is filtered on read, not deleted.
  let stored = s.get_user(ruby.user_id).await.unwrap().unwrap();
  assert_eq!(stored.temporary_connections.len(), 4);

  assert_eq!(s.get_temporary_connections(ruby.user_id).await.unwrap(), current);
}

#[tokio::test]
async fn peer_window_also_applies() {
  let s = store().await;
  let ruby = user(&s, "Ruby", "Rose").await;
  let yang = user(&s, "Yang", "Xiao Long").await;
  let jacob = user(&s, "Jacob", "Two-Two").await;

  // Yang's ledger is anchored far later than Ruby's.
  s.add_temporary_connection(yang.user_id, jacob.user_id, date("2020-12-31"))
    .await
    .unwrap();

  let err = s
    .add_temporary_connection(ruby.user_id, yang.user_id, date("2020-11-01"))
    .await
    .unwrap_err();
  assert!(matches!(core(&err), bubble_core::Error::InvalidDate(_)));

  let stored = s.get_user(ruby.user_id).await.unwrap().unwrap();
  assert!(stored.temporary_connections.is_empty());
}

#[tokio::test]
async fn custom_window_width() {
  let s = store().await.with_window(LatestRecordedWindow::new(2));
  let ruby = user(&s, "Ruby", "Rose").await;
  let yang = user(&s, "Yang", "Xiao Long").await;

  s.add_temporary_connection(ruby.user_id, yang.user_id, date("2020-11-10"))
    .await
    .unwrap();
  let err = s
    .add_temporary_connection(ruby.user_id, yang.user_id, date("2020-11-07"))
    .await
    .unwrap_err();
  assert!(matches!(core(&err), bubble_core::Error::InvalidDate(_)));
  s.add_temporary_connection(ruby.user_id, yang.user_id, date("2020-11-08"))
    .await
    .unwrap();
}

#[tokio::test]
async fn temporary_connection_unknown_or_self_fails() {
  let s = store().await;
  let ruby = user(&s, "Ruby", "Rose").await;

  let err = s
    .add_temporary_connection(ruby.user_id, Uuid::new_v4(), date("2020-11-01"))
    .await
    .unwrap_err();
  assert!(matches!(core(&err), bubble_core::Error::NotFound(_)));

  let err = s
    .add_temporary_connection(ruby.user_id, ruby.user_id, date("2020-11-01"))
    .await
    .unwrap_err();
  assert!(matches!(core(&err), bubble_core::Error::SelfConnection(_)));

  let err = s.get_temporary_connections(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(core(&err), bubble_core::Error::NotFound(_)));
}

// ─── Status ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn status_propagates_to_first_degree_only() {
  let s = store().await;
  let ruby = user(&s, "Ruby", "Rose").await;
  let yang = user(&s, "Yang", "Xiao Long").await;
  let jacob = user(&s, "Jacob", "Two-Two").await;
  let taker = user(&s, "The", "Undertaker").await;
  let builder = user(&s, "Builder", "Bob").await;

  for (a, b) in [(&ruby, &yang), (&ruby, &jacob), (&taker, &builder), (&taker, &jacob)] {
    s.add_first_connection(a.user_id, b.user_id).await.unwrap();
  }

  let update = s.set_status(builder.user_id, true).await.unwrap();
  assert_eq!(update.user_id, builder.user_id);
  assert_eq!(update.status, Status::Positive);

  let poll = s.poll_status(taker.user_id).await.unwrap();
  assert!(poll.changed);
  assert_eq!(poll.status, Status::Exposed);

  let poll = s.poll_status(yang.user_id).await.unwrap();
  assert!(!poll.changed);
  assert_eq!(poll.status, Status::Baseline);

  // Polling never persists the derived status.
  let stored = s.get_user(taker.user_id).await.unwrap().unwrap();
  assert_eq!(stored.status, Status::Baseline);

  let update = s.set_status(builder.user_id, false).await.unwrap();
  assert_eq!(update.status, Status::Recovered);

  let poll = s.poll_status(taker.user_id).await.unwrap();
  assert!(!poll.changed);
  assert_eq!(poll.status, Status::Baseline);
}

#[tokio::test]
async fn fresh_user_poll_is_unchanged() {
  let s = store().await;
  let ruby = user(&s, "Ruby", "Rose").await;
  let poll = s.poll_status(ruby.user_id).await.unwrap();
  assert_eq!(poll.user_id, ruby.user_id);
  assert!(!poll.changed);
  assert_eq!(poll.status, Status::Baseline);
}

#[tokio::test]
async fn status_unknown_user_fails() {
  let s = store().await;
  let err = s.set_status(Uuid::new_v4(), true).await.unwrap_err();
  assert!(matches!(core(&err), bubble_core::Error::NotFound(_)));

  let err = s.poll_status(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(core(&err), bubble_core::Error::NotFound(_)));
}

#[tokio::test]
async fn corrupt_stored_status_is_a_storage_fault() {
  let s = store().await;
  let ruby = user(&s, "Ruby", "Rose").await;

  let id = ruby.user_id.to_string();
  s.connection()
    .call(move |conn| {
      conn.execute(
        "UPDATE users SET status = 3 WHERE user_id = ?1",
        rusqlite::params![id],
      )?;
      Ok(())
    })
    .await
    .unwrap();

  let err = s.poll_status(ruby.user_id).await.unwrap_err();
  assert!(matches!(err, Error::InvalidColumn(_)));
  assert!(err.domain().is_none());
}

#[tokio::test]
async fn positive_user_is_exposed_by_positive_neighbour() {
  let s = store().await;
  let ruby = user(&s, "Ruby", "Rose").await;
  let yang = user(&s, "Yang", "Xiao Long").await;
  s.add_first_connection(ruby.user_id, yang.user_id).await.unwrap();

  s.set_status(ruby.user_id, true).await.unwrap();
  let poll = s.poll_status(ruby.user_id).await.unwrap();
  assert!(!poll.changed);
  assert_eq!(poll.status, Status::Positive);

  s.set_status(yang.user_id, true).await.unwrap();
  let poll = s.poll_status(ruby.user_id).await.unwrap();
  assert!(poll.changed);
  assert_eq!(poll.status, Status::Exposed);

  let stored = s.get_user(ruby.user_id).await.unwrap().unwrap();
  assert_eq!(stored.status, Status::Positive);
}
