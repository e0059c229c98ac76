use orgnocal::api::create_router;
use orgnocal::client::{ClientError, OrgnocalClient};
use orgnocal::db::{Database, TaskFilter};
use orgnocal::models::*;
use orgnocal::tree_render::render_hierarchy;

/// Serve a fresh in-memory store on an ephemeral port.
async fn spawn_server() -> OrgnocalClient {
    let db = Database::open_memory().expect("Failed to create database");
    db.migrate().expect("Failed to migrate");
    let app = create_router(db);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("No local address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    OrgnocalClient::new(format!("http://{addr}"), None)
}

async fn create_project(client: &OrgnocalClient, name: &str) -> Project {
    client
        .create_project(&CreateProjectInput {
            name: name.to_string(),
            ..Default::default()
        })
        .await
        .expect("Failed to create project")
}

async fn create_layer(client: &OrgnocalClient, project: &Project, name: &str) -> TaskLayer {
    client
        .create_layer(&CreateLayerInput {
            name: name.to_string(),
            project_id: project.id,
        })
        .await
        .expect("Failed to create layer")
}

async fn create_task(
    client: &OrgnocalClient,
    project: &Project,
    title: &str,
    parent: Option<DbId>,
    layer: Option<DbId>,
) -> Task {
    client
        .create_task(&CreateTaskInput {
            title: title.to_string(),
            project_id: project.id,
            parent_task_id: parent,
            task_layer_id: layer,
            ..Default::default()
        })
        .await
        .expect("Failed to create task")
}

#[tokio::test]
async fn health_reports_ok() {
    let client = spawn_server().await;

    let body = client.health().await.unwrap();

    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn cached_project_list_is_refreshed_after_create() {
    let client = spawn_server().await;

    assert!(client.list_projects().await.unwrap().is_empty());
    assert!(client.cache().contains("/projects"));

    create_project(&client, "Alpha").await;

    assert!(!client.cache().contains("/projects"));
    let projects = client.list_projects().await.unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].name, "Alpha");
}

#[tokio::test]
async fn updating_one_project_keeps_other_details_cached() {
    let client = spawn_server().await;
    let alpha = create_project(&client, "Alpha").await;
    let beta = create_project(&client, "Beta").await;
    client.get_project(alpha.id).await.unwrap();
    client.get_project(beta.id).await.unwrap();

    client
        .update_project(
            alpha.id,
            &UpdateProjectInput {
                name: Some("Alpha 2".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(!client.cache().contains(&format!("/projects/{}", alpha.id)));
    assert!(client.cache().contains(&format!("/projects/{}", beta.id)));
    let detail = client.get_project(alpha.id).await.unwrap();
    assert_eq!(detail.project.name, "Alpha 2");
}

#[tokio::test]
async fn moving_a_task_invalidates_layer_listings() {
    let client = spawn_server().await;
    let project = create_project(&client, "P").await;
    let first = create_layer(&client, &project, "First").await;
    let second = create_layer(&client, &project, "Second").await;
    let task = create_task(&client, &project, "Task", None, Some(first.id)).await;

    let before = client.list_layers(project.id, None).await.unwrap();
    assert_eq!(before[0].tasks.len(), 1);

    client
        .assign_task_to_layer(
            task.id,
            &AssignLayerInput {
                task_layer_id: Some(second.id),
                parent_task_id: None,
            },
        )
        .await
        .unwrap();

    let after = client.list_layers(project.id, None).await.unwrap();
    assert!(after[0].tasks.is_empty());
    assert_eq!(after[1].tasks[0].task.id, task.id);
}

#[tokio::test]
async fn moves_refresh_old_and_new_parent_details() {
    let client = spawn_server().await;
    let project = create_project(&client, "P").await;
    let first = create_layer(&client, &project, "First").await;
    create_layer(&client, &project, "Second").await;
    let old_parent = create_task(&client, &project, "Old", None, Some(first.id)).await;
    let new_parent = create_task(&client, &project, "New", None, Some(first.id)).await;
    let task = create_task(&client, &project, "Task", Some(old_parent.id), None).await;

    assert_eq!(client.get_task(old_parent.id).await.unwrap().nested_tasks.len(), 1);
    assert!(client.get_task(new_parent.id).await.unwrap().nested_tasks.is_empty());

    client
        .drop_task_onto_task(task.id, new_parent.id)
        .await
        .unwrap();

    assert!(client.get_task(old_parent.id).await.unwrap().nested_tasks.is_empty());
    let detail = client.get_task(new_parent.id).await.unwrap();
    assert_eq!(detail.nested_tasks[0].task.id, task.id);
}

#[tokio::test]
async fn rejected_moves_surface_the_reason() {
    let client = spawn_server().await;
    let project = create_project(&client, "P").await;
    let layer = create_layer(&client, &project, "Backlog").await;
    let parent = create_task(&client, &project, "Parent", None, Some(layer.id)).await;
    create_task(&client, &project, "Child", Some(parent.id), None).await;

    let err = client
        .assign_task_to_layer(parent.id, &AssignLayerInput::default())
        .await
        .unwrap_err();
    match err {
        ClientError::Rejected { reason, .. } => assert_eq!(reason, "has_nested_tasks"),
        other => panic!("expected a rejection, got {other:?}"),
    }

    let err = client.delete_layer(layer.id).await.unwrap_err();
    assert!(matches!(err, ClientError::Rejected { ref reason, .. } if reason == "layer_not_empty"));
}

#[tokio::test]
async fn missing_task_is_not_found() {
    let client = spawn_server().await;

    let err = client.get_task(404).await.unwrap_err();

    assert!(matches!(err, ClientError::NotFound(_)));
}

#[tokio::test]
async fn comment_soft_delete_refreshes_task_detail() {
    let client = spawn_server().await;
    let project = create_project(&client, "P").await;
    let user = client
        .create_user(&CreateUserInput {
            username: "ann".to_string(),
            email: "ann@example.com".to_string(),
            external_id: None,
        })
        .await
        .unwrap();
    let task = create_task(&client, &project, "T", None, None).await;
    let comment = client
        .create_comment(&CreateCommentInput {
            task_id: task.id,
            user_id: user.user_id,
            text: "hello".to_string(),
            posted_date: None,
        })
        .await
        .unwrap();

    let detail = client.get_task(task.id).await.unwrap();
    assert!(matches!(detail.comments[0], CommentView::Visible { .. }));

    client
        .soft_delete_comment(
            comment.id,
            &SoftDeleteCommentInput {
                deleted_at: Some(chrono::Utc::now()),
                deleted_by_user_id: Some(user.user_id),
            },
        )
        .await
        .unwrap();

    let detail = client.get_task(task.id).await.unwrap();
    assert!(matches!(detail.comments[0], CommentView::Deleted { .. }));
}

#[tokio::test]
async fn renders_the_project_tree() {
    let client = spawn_server().await;
    let project = create_project(&client, "P").await;
    let backlog = create_layer(&client, &project, "Backlog").await;
    let root = create_task(&client, &project, "Root", None, Some(backlog.id)).await;
    client
        .update_task_status(root.id, TaskStatus::InProgress)
        .await
        .unwrap();
    create_task(&client, &project, "Child", Some(root.id), None).await;
    create_task(&client, &project, "Loose", None, None).await;

    let layers = client.list_layers(project.id, None).await.unwrap();
    let filter = TaskFilter {
        project_id: Some(project.id),
        ..Default::default()
    };
    let unlayered: Vec<_> = client
        .list_tasks(&filter, None)
        .await
        .unwrap()
        .tasks
        .into_iter()
        .filter(|node| node.task.task_layer_id.is_none() && node.task.parent_task_id.is_none())
        .collect();

    let output = render_hierarchy(&layers, &unlayered);
    assert_eq!(
        output,
        "Backlog\n└── ◐ Root\n    └── • Child\n(no layer)\n└── • Loose\n"
    );
}

#[tokio::test]
async fn search_is_not_cached() {
    let client = spawn_server().await;
    create_project(&client, "Searchable").await;

    let results = client.search("search").await.unwrap();

    assert_eq!(results.projects.len(), 1);
    assert!(client.cache().is_empty());
}
