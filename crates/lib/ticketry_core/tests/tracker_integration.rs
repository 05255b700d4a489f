//! Store-backed integration tests for the tracker domain.
//!
//! Each test provisions an ephemeral PostgreSQL instance via `DbManager`,
//! runs the embedded migrations, and exercises the authorization and
//! default-value rules against the real store.

use std::time::Duration;

use sqlx::PgPool;
use uuid::Uuid;

use ticketry_core::auth::queries;
use ticketry_core::db::DbManager;
use ticketry_core::tracker::notifications::{self, NotificationDetail};
use ticketry_core::tracker::tickets::{self, NewTicket};
use ticketry_core::tracker::{TrackerError, comments, projects};

async fn test_db() -> (DbManager, PgPool) {
    let mut db = DbManager::ephemeral().await.expect("ephemeral DbManager");
    db.setup().await.expect("db setup");
    db.start().await.expect("db start");

    let pool = PgPool::connect(&db.connection_url())
        .await
        .expect("connect to ephemeral PG");
    ticketry_core::migrate::migrate(&pool).await.expect("migrate");

    (db, pool)
}

async fn user(pool: &PgPool, name: &str, email: &str) -> Uuid {
    queries::create_user(pool, name, email, "not-a-real-hash")
        .await
        .expect("create user")
}

fn new_ticket(project_id: Uuid, title: &str) -> NewTicket {
    NewTicket {
        project_id,
        title: title.into(),
        description: None,
        priority: None,
        status: None,
        assignee_id: None,
        due_date: None,
    }
}

/// Notification writes happen on a spawned task; poll until they land.
async fn wait_for_notifications(
    pool: &PgPool,
    recipient: &Uuid,
    expected: usize,
) -> Vec<NotificationDetail> {
    for _ in 0..50 {
        let (found, _) = notifications::list_for_user(pool, recipient, 100)
            .await
            .expect("list notifications");
        if found.len() >= expected {
            return found;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("expected {expected} notifications for {recipient}, none arrived in time");
}

#[tokio::test]
async fn project_listing_tracks_ownership_and_membership() {
    let (mut db, pool) = test_db().await;

    let owner = user(&pool, "Owner", "owner@example.com").await;
    let member = user(&pool, "Member", "member@example.com").await;
    let outsider = user(&pool, "Outsider", "outsider@example.com").await;

    let project = projects::create(&pool, &owner, "Apollo", None)
        .await
        .expect("create project");
    projects::add_member(&pool, &project.project.id, &owner, &member)
        .await
        .expect("add member");

    let owned = projects::list_for_user(&pool, &owner).await.expect("list");
    assert!(owned.iter().any(|p| p.project.id == project.project.id));

    let joined = projects::list_for_user(&pool, &member).await.expect("list");
    assert!(joined.iter().any(|p| p.project.id == project.project.id));

    let other = projects::list_for_user(&pool, &outsider).await.expect("list");
    assert!(other.is_empty());

    db.stop().await.expect("db stop");
}

#[tokio::test]
async fn owner_cannot_be_removed_and_member_set_is_stable() {
    let (mut db, pool) = test_db().await;

    let owner = user(&pool, "Owner", "owner@example.com").await;
    let member = user(&pool, "Member", "member@example.com").await;

    let project = projects::create(&pool, &owner, "Apollo", None)
        .await
        .expect("create project");
    let id = project.project.id;
    projects::add_member(&pool, &id, &owner, &member)
        .await
        .expect("add member");

    // Removing the owner is a validation error and mutates nothing.
    let err = projects::remove_member(&pool, &id, &owner, &owner)
        .await
        .expect_err("owner removal must fail");
    assert!(matches!(err, TrackerError::Validation(_)));

    // Re-adding an existing member is rejected without mutating the set.
    let err = projects::add_member(&pool, &id, &owner, &member)
        .await
        .expect_err("duplicate add must fail");
    assert!(matches!(err, TrackerError::Validation(_)));

    let detail = projects::get(&pool, &id, &owner).await.expect("get");
    assert_eq!(detail.owner.id, owner);
    let member_ids: Vec<Uuid> = detail.members.iter().map(|m| m.id).collect();
    assert_eq!(member_ids, vec![owner, member]);

    db.stop().await.expect("db stop");
}

#[tokio::test]
async fn new_ticket_defaults_to_todo_medium() {
    let (mut db, pool) = test_db().await;

    let owner = user(&pool, "Owner", "owner@example.com").await;
    let project = projects::create(&pool, &owner, "Apollo", None)
        .await
        .expect("create project");

    let ticket = tickets::create(&pool, &owner, new_ticket(project.project.id, "Fix login"))
        .await
        .expect("create ticket");
    assert_eq!(ticket.status, "Todo");
    assert_eq!(ticket.priority, "Medium");

    // An out-of-set status is rejected and the stored ticket is unchanged.
    let err = tickets::update_status(&pool, &ticket.id, "Archived")
        .await
        .expect_err("unknown status must fail");
    assert!(matches!(err, TrackerError::Validation(_)));

    let unchanged = tickets::list_for_project(&pool, &project.project.id)
        .await
        .expect("list tickets");
    assert_eq!(unchanged[0].status, "Todo");

    db.stop().await.expect("db stop");
}

#[tokio::test]
async fn comment_mutation_is_author_only() {
    let (mut db, pool) = test_db().await;

    let author = user(&pool, "Author", "author@example.com").await;
    let other = user(&pool, "Other", "other@example.com").await;

    let project = projects::create(&pool, &author, "Apollo", None)
        .await
        .expect("create project");
    let ticket = tickets::create(&pool, &author, new_ticket(project.project.id, "Fix login"))
        .await
        .expect("create ticket");
    let comment = comments::create(&pool, &author, &ticket.id, "first pass")
        .await
        .expect("create comment");

    let err = comments::update(&pool, &comment.id, &other, "vandalized")
        .await
        .expect_err("non-author edit must fail");
    assert!(matches!(err, TrackerError::Forbidden(_)));

    let err = comments::delete(&pool, &comment.id, &other)
        .await
        .expect_err("non-author delete must fail");
    assert!(matches!(err, TrackerError::Forbidden(_)));

    let listed = comments::list_for_ticket(&pool, &ticket.id)
        .await
        .expect("list comments");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].text, "first pass");

    db.stop().await.expect("db stop");
}

#[tokio::test]
async fn comment_fanout_notifies_assignee_and_creator() {
    let (mut db, pool) = test_db().await;

    let creator = user(&pool, "Creator", "creator@example.com").await;
    let assignee = user(&pool, "Assignee", "assignee@example.com").await;
    let commenter = user(&pool, "Commenter", "commenter@example.com").await;

    let project = projects::create(&pool, &creator, "Apollo", None)
        .await
        .expect("create project");
    let id = project.project.id;
    projects::add_member(&pool, &id, &creator, &assignee)
        .await
        .expect("add assignee");
    projects::add_member(&pool, &id, &creator, &commenter)
        .await
        .expect("add commenter");

    let mut spec = new_ticket(id, "Fix login");
    spec.assignee_id = Some(assignee);
    let ticket = tickets::create(&pool, &creator, spec).await.expect("create ticket");

    comments::create(&pool, &commenter, &ticket.id, "looking into it")
        .await
        .expect("create comment");

    // Exactly one ticket_comment notification each for assignee and creator.
    let to_assignee = wait_for_notifications(&pool, &assignee, 2).await;
    let comment_notes: Vec<_> = to_assignee
        .iter()
        .filter(|n| n.kind == "ticket_comment")
        .collect();
    assert_eq!(comment_notes.len(), 1);
    assert_eq!(comment_notes[0].created_by, commenter);

    let to_creator = wait_for_notifications(&pool, &creator, 1).await;
    assert_eq!(to_creator.len(), 1);
    assert_eq!(to_creator[0].kind, "ticket_comment");
    assert_eq!(
        to_creator[0].message,
        "New comment on your ticket: Fix login"
    );

    // The commenter never notifies themselves.
    let (to_commenter, _) = notifications::list_for_user(&pool, &commenter, 100)
        .await
        .expect("list");
    assert!(to_commenter.iter().all(|n| n.kind != "ticket_comment"));

    // A negative limit is treated as "no results", not a query error.
    let (empty, unread) = notifications::list_for_user(&pool, &creator, -5)
        .await
        .expect("negative limit");
    assert!(empty.is_empty());
    assert_eq!(unread, 1);

    db.stop().await.expect("db stop");
}

#[tokio::test]
async fn membership_gates_ticket_creation() {
    let (mut db, pool) = test_db().await;

    let u1 = user(&pool, "U1", "u1@example.com").await;
    let u2 = user(&pool, "U2", "u2@example.com").await;

    let project = projects::create(&pool, &u1, "Apollo", None)
        .await
        .expect("create project");
    let id = project.project.id;

    tickets::create(&pool, &u1, new_ticket(id, "First"))
        .await
        .expect("owner creates ticket");

    // Not yet a member: forbidden.
    let err = tickets::create(&pool, &u2, new_ticket(id, "Second"))
        .await
        .expect_err("outsider must be rejected");
    assert!(matches!(err, TrackerError::Forbidden(_)));

    // After being added, the same call succeeds.
    projects::add_member(&pool, &id, &u1, &u2)
        .await
        .expect("add member");
    let ticket = tickets::create(&pool, &u2, new_ticket(id, "Second"))
        .await
        .expect("member creates ticket");
    assert_eq!(ticket.created_by, u2);

    db.stop().await.expect("db stop");
}

#[tokio::test]
async fn status_update_has_no_ownership_check() {
    let (mut db, pool) = test_db().await;

    let u1 = user(&pool, "U1", "u1@example.com").await;
    let u2 = user(&pool, "U2", "u2@example.com").await;
    let _u3 = user(&pool, "U3", "u3@example.com").await;

    let project = projects::create(&pool, &u1, "Apollo", None)
        .await
        .expect("create project");
    projects::add_member(&pool, &project.project.id, &u1, &u2)
        .await
        .expect("add member");

    let mut spec = new_ticket(project.project.id, "Fix login");
    spec.assignee_id = Some(u2);
    let ticket = tickets::create(&pool, &u1, spec).await.expect("create ticket");

    // Any authenticated user may move the ticket; u3 is neither owner,
    // member, creator nor assignee.
    let updated = tickets::update_status(&pool, &ticket.id, "Done")
        .await
        .expect("status update");
    assert_eq!(updated.status, "Done");

    db.stop().await.expect("db stop");
}
