use std::sync::Arc;
use studytrack_core::db::open_db_in_memory;
use studytrack_core::{
    search_accessible, CollaborationService, CollaboratorRole, ContentService,
    CreateProjectRequest, LogMailer, NewTaskRequest, Project, ProjectService, SearchEntity,
    SearchQuery, SqliteUserRepository, TaskPriority, User, UserRepository,
};

#[test]
fn owner_finds_projects_tasks_and_notes() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = create_user(&conn, "owner@uni.edu");
    let project = create_project(&mut conn, &owner, "Quantum computing essay");

    {
        let mut content = ContentService::new(&mut conn);
        content
            .add_task(
                project.id,
                owner.id,
                &NewTaskRequest {
                    title: "survey quantum gates",
                    description: None,
                    priority: TaskPriority::Medium,
                    due_date: None,
                },
            )
            .unwrap();
        content
            .add_note(project.id, owner.id, "quantum supremacy papers to read")
            .unwrap();
    }

    let hits = search_accessible(&conn, owner.id, &SearchQuery::new("quantum")).unwrap();
    assert_eq!(hits.len(), 3);
    assert!(hits.iter().any(|hit| hit.entity == SearchEntity::Project));
    assert!(hits.iter().any(|hit| hit.entity == SearchEntity::Task));
    assert!(hits.iter().any(|hit| hit.entity == SearchEntity::Note));
    assert!(hits.iter().all(|hit| hit.project_id == project.id));
}

#[test]
fn entity_filter_narrows_hits() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = create_user(&conn, "owner@uni.edu");
    let project = create_project(&mut conn, &owner, "Compilers notes");

    {
        let mut content = ContentService::new(&mut conn);
        content
            .add_note(project.id, owner.id, "compilers midterm revision")
            .unwrap();
    }

    let query = SearchQuery {
        entity: Some(SearchEntity::Note),
        ..SearchQuery::new("compilers")
    };
    let hits = search_accessible(&conn, owner.id, &query).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].entity, SearchEntity::Note);
}

#[test]
fn accepted_collaborator_sees_shared_hits_and_stranger_sees_none() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = create_user(&conn, "owner@uni.edu");
    let viewer = create_user(&conn, "viewer@uni.edu");
    let stranger = create_user(&conn, "stranger@uni.edu");
    let project = create_project(&mut conn, &owner, "Distributed systems project");

    {
        let mut collab = CollaborationService::new(&mut conn, Arc::new(LogMailer));
        let invitation = collab
            .invite(
                project.id,
                owner.id,
                "viewer@uni.edu",
                CollaboratorRole::Viewer,
            )
            .unwrap();
        collab.accept(invitation.id, viewer.id).unwrap();
    }

    let shared = search_accessible(&conn, viewer.id, &SearchQuery::new("distributed")).unwrap();
    assert_eq!(shared.len(), 1);
    assert_eq!(shared[0].project_id, project.id);

    let hidden = search_accessible(&conn, stranger.id, &SearchQuery::new("distributed")).unwrap();
    assert!(hidden.is_empty());
}

#[test]
fn pending_invitation_grants_no_search_visibility() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = create_user(&conn, "owner@uni.edu");
    let invitee = create_user(&conn, "invitee@uni.edu");
    let project = create_project(&mut conn, &owner, "Databases coursework");

    {
        let mut collab = CollaborationService::new(&mut conn, Arc::new(LogMailer));
        collab
            .invite(
                project.id,
                owner.id,
                "invitee@uni.edu",
                CollaboratorRole::Collaborator,
            )
            .unwrap();
    }

    let hits = search_accessible(&conn, invitee.id, &SearchQuery::new("databases")).unwrap();
    assert!(hits.is_empty());
}

#[test]
fn deleted_content_disappears_from_the_index() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = create_user(&conn, "owner@uni.edu");
    let project = create_project(&mut conn, &owner, "Networking homework");

    {
        let mut service = ProjectService::new(&mut conn);
        service.delete_project(project.id, owner.id).unwrap();
    }

    let hits = search_accessible(&conn, owner.id, &SearchQuery::new("networking")).unwrap();
    assert!(hits.is_empty());
}

#[test]
fn blank_queries_and_zero_limits_return_empty() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = create_user(&conn, "owner@uni.edu");
    create_project(&mut conn, &owner, "Anything");

    assert!(search_accessible(&conn, owner.id, &SearchQuery::new("   "))
        .unwrap()
        .is_empty());

    let query = SearchQuery {
        limit: 0,
        ..SearchQuery::new("anything")
    };
    assert!(search_accessible(&conn, owner.id, &query).unwrap().is_empty());
}

#[test]
fn quoted_terms_do_not_break_the_match_expression() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = create_user(&conn, "owner@uni.edu");
    create_project(&mut conn, &owner, "plain title");

    let hits = search_accessible(&conn, owner.id, &SearchQuery::new("\"plain\" title")).unwrap();
    assert_eq!(hits.len(), 1);
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
