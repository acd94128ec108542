use std::sync::Arc;
use std::sync::Mutex;
use studytrack_core::db::open_db_in_memory;
use studytrack_core::{
    CollabError, CollaborationService, CollaborationStatus, CollaboratorRole,
    CreateProjectRequest, InvitationNotice, LogMailer, Mailer, MailerError, Project,
    ProjectService, SqliteUserRepository, User, UserRepository,
};

#[test]
fn invite_creates_pending_row_and_notifies_mailer() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = create_user(&conn, "owner@uni.edu");
    let invitee = create_user(&conn, "guest@uni.edu");
    let project = create_project(&mut conn, &owner, "group assignment");

    let mailer = Arc::new(RecordingMailer::default());
    let collab = {
        let mut service = CollaborationService::new(&mut conn, mailer.clone());
        service
            .invite(
                project.id,
                owner.id,
                "guest@uni.edu",
                CollaboratorRole::Collaborator,
            )
            .unwrap()
    };

    assert_eq!(collab.project_id, project.id);
    assert_eq!(collab.user_id, invitee.id);
    assert_eq!(collab.status, CollaborationStatus::Pending);
    assert_eq!(collab.accepted_at, None);

    let sent = mailer.sent.lock().unwrap();
    assert_eq!(sent.as_slice(), ["guest@uni.edu"]);
}

#[test]
fn invite_matches_email_case_insensitively() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = create_user(&conn, "owner@uni.edu");
    let invitee = create_user(&conn, "guest@uni.edu");
    let project = create_project(&mut conn, &owner, "p");

    let mut service = CollaborationService::new(&mut conn, Arc::new(LogMailer));
    let collab = service
        .invite(
            project.id,
            owner.id,
            "GUEST@UNI.EDU",
            CollaboratorRole::Viewer,
        )
        .unwrap();
    assert_eq!(collab.user_id, invitee.id);
}

#[test]
fn only_the_owner_may_invite() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = create_user(&conn, "owner@uni.edu");
    let guest = create_user(&conn, "guest@uni.edu");
    let other = create_user(&conn, "other@uni.edu");
    let project = create_project(&mut conn, &owner, "p");

    let mut service = CollaborationService::new(&mut conn, Arc::new(LogMailer));
    let err = service
        .invite(
            project.id,
            guest.id,
            other.email.as_str(),
            CollaboratorRole::Viewer,
        )
        .unwrap_err();
    assert!(matches!(err, CollabError::NotAuthorized { .. }));
}

#[test]
fn inviting_unknown_email_fails_with_user_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = create_user(&conn, "owner@uni.edu");
    let project = create_project(&mut conn, &owner, "p");

    let mut service = CollaborationService::new(&mut conn, Arc::new(LogMailer));
    let err = service
        .invite(
            project.id,
            owner.id,
            "nobody@uni.edu",
            CollaboratorRole::Viewer,
        )
        .unwrap_err();
    assert!(matches!(err, CollabError::UserNotFound(email) if email == "nobody@uni.edu"));
}

#[test]
fn inviting_the_owner_by_email_is_rejected() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = create_user(&conn, "owner@uni.edu");
    let project = create_project(&mut conn, &owner, "p");

    let mut service = CollaborationService::new(&mut conn, Arc::new(LogMailer));
    let err = service
        .invite(
            project.id,
            owner.id,
            "owner@uni.edu",
            CollaboratorRole::Collaborator,
        )
        .unwrap_err();
    assert!(matches!(err, CollabError::AlreadyCollaborator { .. }));
}

#[test]
fn second_invite_for_same_user_fails_and_leaves_one_row() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = create_user(&conn, "owner@uni.edu");
    let _guest = create_user(&conn, "guest@uni.edu");
    let project = create_project(&mut conn, &owner, "p");

    {
        let mut service = CollaborationService::new(&mut conn, Arc::new(LogMailer));
        service
            .invite(
                project.id,
                owner.id,
                "guest@uni.edu",
                CollaboratorRole::Viewer,
            )
            .unwrap();
        let err = service
            .invite(
                project.id,
                owner.id,
                "guest@uni.edu",
                CollaboratorRole::Collaborator,
            )
            .unwrap_err();
        assert!(matches!(err, CollabError::AlreadyCollaborator { .. }));
    }

    let rows: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM project_collaborators WHERE project_id = ?1;",
            [project.id],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn declined_user_cannot_be_reinvited() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = create_user(&conn, "owner@uni.edu");
    let guest = create_user(&conn, "guest@uni.edu");
    let project = create_project(&mut conn, &owner, "p");

    let mut service = CollaborationService::new(&mut conn, Arc::new(LogMailer));
    let collab = service
        .invite(
            project.id,
            owner.id,
            "guest@uni.edu",
            CollaboratorRole::Viewer,
        )
        .unwrap();
    service.decline(collab.id, guest.id).unwrap();

    let err = service
        .invite(
            project.id,
            owner.id,
            "guest@uni.edu",
            CollaboratorRole::Viewer,
        )
        .unwrap_err();
    assert!(matches!(err, CollabError::AlreadyCollaborator { .. }));
}

#[test]
fn only_the_invited_user_may_accept_or_decline() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = create_user(&conn, "owner@uni.edu");
    let _guest = create_user(&conn, "guest@uni.edu");
    let impostor = create_user(&conn, "impostor@uni.edu");
    let project = create_project(&mut conn, &owner, "p");

    let collab = {
        let mut service = CollaborationService::new(&mut conn, Arc::new(LogMailer));
        let collab = service
            .invite(
                project.id,
                owner.id,
                "guest@uni.edu",
                CollaboratorRole::Viewer,
            )
            .unwrap();

        let err = service.accept(collab.id, impostor.id).unwrap_err();
        assert!(matches!(err, CollabError::NotAuthorized { .. }));
        let err = service.decline(collab.id, owner.id).unwrap_err();
        assert!(matches!(err, CollabError::NotAuthorized { .. }));
        collab
    };

    let status: String = conn
        .query_row(
            "SELECT status FROM project_collaborators WHERE id = ?1;",
            [collab.id],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(status, "pending");
}

#[test]
fn accept_stamps_time_and_is_terminal() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = create_user(&conn, "owner@uni.edu");
    let guest = create_user(&conn, "guest@uni.edu");
    let project = create_project(&mut conn, &owner, "p");

    let mut service = CollaborationService::new(&mut conn, Arc::new(LogMailer));
    let collab = service
        .invite(
            project.id,
            owner.id,
            "guest@uni.edu",
            CollaboratorRole::Collaborator,
        )
        .unwrap();

    let accepted = service.accept(collab.id, guest.id).unwrap();
    assert_eq!(accepted.status, CollaborationStatus::Accepted);
    assert!(accepted.accepted_at.is_some());

    let err = service.accept(collab.id, guest.id).unwrap_err();
    assert!(
        matches!(err, CollabError::InvalidState { status, .. } if status == CollaborationStatus::Accepted)
    );

    let err = service.decline(collab.id, guest.id).unwrap_err();
    assert!(matches!(err, CollabError::InvalidState { .. }));
}

#[test]
fn mailer_failure_does_not_fail_the_invite() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = create_user(&conn, "owner@uni.edu");
    let _guest = create_user(&conn, "guest@uni.edu");
    let project = create_project(&mut conn, &owner, "p");

    let mut service = CollaborationService::new(&mut conn, Arc::new(FailingMailer));
    let collab = service
        .invite(
            project.id,
            owner.id,
            "guest@uni.edu",
            CollaboratorRole::Viewer,
        )
        .unwrap();
    assert_eq!(collab.status, CollaborationStatus::Pending);
}

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<String>>,
}

impl Mailer for RecordingMailer {
    fn send_invitation(&self, notice: &InvitationNotice<'_>) -> Result<(), MailerError> {
        self.sent
            .lock()
            .unwrap()
            .push(notice.invitee_email.to_string());
        Ok(())
    }
}

struct FailingMailer;

impl Mailer for FailingMailer {
    fn send_invitation(&self, _notice: &InvitationNotice<'_>) -> Result<(), MailerError> {
        Err(MailerError::Delivery("smtp unavailable".to_string()))
    }
}

fn create_user(conn: &rusqlite::Connection, email: &str) -> User {
    let repo = SqliteUserRepository::new(conn);
    repo.create_user(email, None, None).unwrap()
}

fn create_project(conn: &mut rusqlite::Connection, owner: &User, title: &str) -> Project {
    let mut service = ProjectService::new(conn);
    service
        .create_project(
            owner.id,
            &CreateProjectRequest {
                title,
                description: None,
                course: None,
                deadline: None,
            },
        )
        .unwrap()
}
