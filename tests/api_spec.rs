use axum::http::StatusCode;
use axum_test::TestServer;
use orgnocal::api::create_router;
use orgnocal::db::Database;
use orgnocal::models::*;
use serde_json::{json, Value};

fn setup() -> TestServer {
    let db = Database::open_memory().expect("Failed to create database");
    db.migrate().expect("Failed to migrate");
    let app = create_router(db);
    TestServer::new(app).expect("Failed to create test server")
}

async fn create_test_project(server: &TestServer) -> Project {
    server
        .post("/projects")
        .json(&json!({ "project": { "name": "Test Project" }, "views": ["board"] }))
        .await
        .json::<Project>()
}

async fn create_layer(server: &TestServer, project: &Project, name: &str) -> TaskLayer {
    server
        .post("/layers")
        .json(&CreateLayerInput {
            name: name.to_string(),
            project_id: project.id,
        })
        .await
        .json::<TaskLayer>()
}

async fn create_task(
    server: &TestServer,
    project: &Project,
    title: &str,
    parent: Option<DbId>,
    layer: Option<DbId>,
) -> Task {
    server
        .post("/tasks")
        .json(&CreateTaskInput {
            title: title.to_string(),
            project_id: project.id,
            parent_task_id: parent,
            task_layer_id: layer,
            ..Default::default()
        })
        .await
        .json::<Task>()
}

mod basics {
    use super::*;

    #[tokio::test]
    async fn root_banner_and_health() {
        let server = setup();

        let response = server.get("/").await;
        response.assert_status_ok();
        assert_eq!(response.text(), "This is the orgnocal API");

        let health = server.get("/health").await.json::<Value>();
        assert_eq!(health["status"], "ok");
    }

    #[tokio::test]
    async fn unknown_project_is_404_with_message() {
        let server = setup();

        let response = server.get("/projects/404").await;

        response.assert_status_not_found();
        let body = response.json::<Value>();
        assert!(body["message"].as_str().unwrap().contains("404"));
    }
}

mod projects {
    use super::*;

    #[tokio::test]
    async fn create_returns_201_and_detail_lists_views() {
        let server = setup();

        let response = server
            .post("/projects")
            .json(&json!({
                "project": { "name": "Website", "description": "Public site" },
                "views": ["board", "gantt"]
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let project = response.json::<Project>();

        let detail = server
            .get(&format!("/projects/{}", project.id))
            .await
            .json::<Value>();
        assert_eq!(detail["name"], "Website");
        assert_eq!(detail["projectViews"][0]["viewType"], "board");
        assert_eq!(detail["projectViews"][1]["name"], "Gantt");
        assert_eq!(detail["taskLayers"], json!([]));
    }

    #[tokio::test]
    async fn blank_name_is_400() {
        let server = setup();

        let response = server
            .post("/projects")
            .json(&json!({ "project": { "name": "  " } }))
            .await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn patch_updates_fields() {
        let server = setup();
        let project = create_test_project(&server).await;

        let updated = server
            .patch(&format!("/projects/{}", project.id))
            .json(&json!({ "name": "Renamed", "archived": true }))
            .await
            .json::<Project>();

        assert_eq!(updated.name, "Renamed");
        assert!(updated.archived);
    }

    #[tokio::test]
    async fn delete_is_204_then_404() {
        let server = setup();
        let project = create_test_project(&server).await;

        server
            .delete(&format!("/projects/{}", project.id))
            .await
            .assert_status(StatusCode::NO_CONTENT);
        server
            .delete(&format!("/projects/{}", project.id))
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn reorder_layers_rewrites_display_order() {
        let server = setup();
        let project = create_test_project(&server).await;
        let a = create_layer(&server, &project, "A").await;
        let b = create_layer(&server, &project, "B").await;

        let layers = server
            .patch(&format!("/projects/{}/layers", project.id))
            .json(&json!({ "layerIds": [b.id, a.id] }))
            .await
            .json::<Vec<TaskLayer>>();
        assert_eq!(layers[0].id, b.id);
        assert_eq!(layers[1].id, a.id);

        let response = server
            .patch(&format!("/projects/{}/layers", project.id))
            .json(&json!({ "layerIds": [a.id] }))
            .await;
        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(response.json::<Value>()["reason"], "reorder_mismatch");
    }
}

mod layers {
    use super::*;

    #[tokio::test]
    async fn sixth_layer_is_409() {
        let server = setup();
        let project = create_test_project(&server).await;
        for i in 0..5 {
            create_layer(&server, &project, &format!("L{i}")).await;
        }

        let response = server
            .post("/layers")
            .json(&CreateLayerInput {
                name: "L5".to_string(),
                project_id: project.id,
            })
            .await;

        response.assert_status(StatusCode::CONFLICT);
        let body = response.json::<Value>();
        assert_eq!(body["reason"], "layer_limit_reached");
        assert!(body["message"].as_str().unwrap().contains('5'));
    }

    #[tokio::test]
    async fn delete_returns_the_deleted_layer() {
        let server = setup();
        let project = create_test_project(&server).await;
        let layer = create_layer(&server, &project, "Empty").await;

        let deleted = server
            .delete(&format!("/layers/{}", layer.id))
            .await
            .json::<TaskLayer>();

        assert_eq!(deleted.project_id, project.id);
        server
            .delete(&format!("/layers/{}", layer.id))
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn list_respects_depth() {
        let server = setup();
        let project = create_test_project(&server).await;
        let layer = create_layer(&server, &project, "Top").await;
        let root = create_task(&server, &project, "Root", None, Some(layer.id)).await;
        create_task(&server, &project, "Child", Some(root.id), None).await;

        let shallow = server
            .get(&format!("/layers?projectId={}&depth=0", project.id))
            .await
            .json::<Value>();
        assert_eq!(shallow[0]["tasks"][0]["nestedTasks"], json!([]));
        assert_eq!(shallow[0]["truncated"], true);

        let deep = server
            .get(&format!("/layers?projectId={}", project.id))
            .await
            .json::<Value>();
        assert_eq!(deep[0]["tasks"][0]["nestedTasks"][0]["title"], "Child");
    }

    #[tokio::test]
    async fn layout_reports_column_geometry() {
        let server = setup();
        let project = create_test_project(&server).await;
        let layer = create_layer(&server, &project, "L").await;
        let wide = create_task(&server, &project, "Wide", None, Some(layer.id)).await;
        for i in 0..3 {
            create_task(&server, &project, &format!("W{i}"), Some(wide.id), None).await;
        }
        let narrow = create_task(&server, &project, "Narrow", None, Some(layer.id)).await;
        create_task(&server, &project, "N", Some(narrow.id), None).await;

        let layout = server
            .get(&format!("/layers/layout?projectId={}", project.id))
            .await
            .json::<Value>();

        assert_eq!(layout[0]["topTaskId"], wide.id);
        assert!(layout[0]["maxItemsPerLayer"].as_u64().unwrap() >= 3);
        assert!(layout[1]["columnOffset"].as_u64().unwrap() >= 3);
    }
}

mod tasks {
    use super::*;

    #[tokio::test]
    async fn backlog_scenario() {
        let server = setup();
        let project = create_test_project(&server).await;
        let backlog = create_layer(&server, &project, "Backlog").await;
        let t1 = create_task(&server, &project, "T1", None, None).await;

        let t1 = server
            .patch(&format!("/tasks/{}/layer", t1.id))
            .json(&json!({ "taskLayerId": backlog.id, "parentTaskId": null }))
            .await
            .json::<Task>();
        assert_eq!(t1.task_layer_id, Some(backlog.id));

        let t2 = create_task(&server, &project, "T2", Some(t1.id), None).await;
        assert_eq!(t2.parent_task_id, Some(t1.id));

        let response = server
            .patch(&format!("/tasks/{}/layer", t1.id))
            .json(&json!({ "taskLayerId": null, "parentTaskId": null }))
            .await;
        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(response.json::<Value>()["reason"], "has_nested_tasks");

        let response = server.delete(&format!("/layers/{}", backlog.id)).await;
        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(response.json::<Value>()["reason"], "layer_not_empty");
    }

    #[tokio::test]
    async fn list_returns_forest_filtered_by_project() {
        let server = setup();
        let project = create_test_project(&server).await;
        let other = create_test_project(&server).await;
        let root = create_task(&server, &project, "Root", None, None).await;
        create_task(&server, &project, "Child", Some(root.id), None).await;
        create_task(&server, &other, "Elsewhere", None, None).await;

        let forest = server
            .get(&format!("/tasks?projectId={}&query=root", project.id))
            .await
            .json::<TaskForest>();

        assert_eq!(forest.tasks.len(), 1);
        assert_eq!(forest.tasks[0].nested_tasks[0].task.title, "Child");
        assert!(!forest.truncated);
    }

    #[tokio::test]
    async fn detail_includes_nested_tasks_and_comments() {
        let server = setup();
        let project = create_test_project(&server).await;
        let user = server
            .post("/users")
            .json(&json!({ "username": "ann", "email": "ann@example.com" }))
            .await
            .json::<User>();
        let task = create_task(&server, &project, "Parent", None, None).await;
        create_task(&server, &project, "Child", Some(task.id), None).await;
        server
            .post("/comments")
            .json(&json!({ "taskId": task.id, "userId": user.user_id, "text": "first" }))
            .await
            .assert_status(StatusCode::CREATED);

        let detail = server
            .get(&format!("/tasks/{}", task.id))
            .await
            .json::<Value>();

        assert_eq!(detail["nestedTasks"][0]["title"], "Child");
        assert_eq!(detail["comments"][0]["state"], "visible");
        assert_eq!(detail["comments"][0]["username"], "ann");
    }

    #[tokio::test]
    async fn reparent_into_own_subtree_is_409() {
        let server = setup();
        let project = create_test_project(&server).await;
        let a = create_task(&server, &project, "A", None, None).await;
        let b = create_task(&server, &project, "B", Some(a.id), None).await;

        let response = server
            .put(&format!("/tasks/{}/parent", a.id))
            .json(&json!({ "parentTaskId": b.id }))
            .await;

        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(response.json::<Value>()["reason"], "parent_cycle");
    }

    #[tokio::test]
    async fn task_with_nested_tasks_cannot_change_parent() {
        let server = setup();
        let project = create_test_project(&server).await;
        let a = create_task(&server, &project, "A", None, None).await;
        let b = create_task(&server, &project, "B", None, None).await;
        let d = create_task(&server, &project, "D", None, None).await;
        create_task(&server, &project, "C", Some(b.id), None).await;

        let response = server
            .put(&format!("/tasks/{}/parent", b.id))
            .json(&json!({ "parentTaskId": a.id }))
            .await;
        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(response.json::<Value>()["reason"], "has_nested_tasks");

        let response = server
            .patch(&format!("/tasks/{}", b.id))
            .json(&json!({ "parentTaskId": d.id }))
            .await;
        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(response.json::<Value>()["reason"], "has_nested_tasks");

        let unchanged = server
            .get(&format!("/tasks/{}", b.id))
            .await
            .json::<Value>();
        assert_eq!(unchanged["parentTaskId"], Value::Null);
    }

    #[tokio::test]
    async fn patch_nulls_keep_values_and_put_parent_detaches() {
        let server = setup();
        let project = create_test_project(&server).await;
        let parent = create_task(&server, &project, "Parent", None, None).await;
        let task = server
            .post("/tasks")
            .json(&json!({
                "title": "T",
                "projectId": project.id,
                "parentTaskId": parent.id,
                "description": "keep me"
            }))
            .await
            .json::<Task>();

        let patched = server
            .patch(&format!("/tasks/{}", task.id))
            .json(&json!({ "description": null, "parentTaskId": null, "title": "T2" }))
            .await
            .json::<Task>();
        assert_eq!(patched.title, "T2");
        assert_eq!(patched.description.as_deref(), Some("keep me"));
        assert_eq!(patched.parent_task_id, Some(parent.id));

        let detached = server
            .put(&format!("/tasks/{}/parent", task.id))
            .json(&json!({ "parentTaskId": null }))
            .await
            .json::<Task>();
        assert_eq!(detached.parent_task_id, None);
    }

    #[tokio::test]
    async fn drop_onto_task_moves_below_its_layer() {
        let server = setup();
        let project = create_test_project(&server).await;
        let first = create_layer(&server, &project, "First").await;
        let second = create_layer(&server, &project, "Second").await;
        let target = create_task(&server, &project, "Target", None, Some(first.id)).await;
        let task = create_task(&server, &project, "Task", None, None).await;

        let dropped = server
            .post(&format!("/tasks/{}/drop", task.id))
            .json(&json!({ "targetTaskId": target.id }))
            .await
            .json::<Task>();

        assert_eq!(dropped.parent_task_id, Some(target.id));
        assert_eq!(dropped.task_layer_id, Some(second.id));
    }

    #[tokio::test]
    async fn status_patch_and_missing_task() {
        let server = setup();
        let project = create_test_project(&server).await;
        let task = create_task(&server, &project, "T", None, None).await;

        let updated = server
            .patch(&format!("/tasks/{}/status", task.id))
            .json(&json!({ "status": "Completed" }))
            .await
            .json::<Task>();
        assert_eq!(updated.status, Some(TaskStatus::Completed));

        server
            .patch("/tasks/999/status")
            .json(&json!({ "status": "Completed" }))
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn cross_project_parent_is_409() {
        let server = setup();
        let home = create_test_project(&server).await;
        let away = create_test_project(&server).await;
        let foreign = create_task(&server, &away, "Foreign", None, None).await;

        let response = server
            .post("/tasks")
            .json(&json!({ "title": "T", "projectId": home.id, "parentTaskId": foreign.id }))
            .await;

        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(response.json::<Value>()["reason"], "cross_project");
    }
}

mod comments {
    use super::*;

    #[tokio::test]
    async fn soft_delete_round_trip() {
        let server = setup();
        let project = create_test_project(&server).await;
        let user = server
            .post("/users")
            .json(&json!({ "username": "ann", "email": "ann@example.com" }))
            .await
            .json::<User>();
        let task = create_task(&server, &project, "T", None, None).await;
        let comment = server
            .post("/comments")
            .json(&json!({ "taskId": task.id, "userId": user.user_id, "text": "secret" }))
            .await
            .json::<Comment>();

        server
            .patch(&format!("/comments/{}/soft-delete", comment.id))
            .json(&json!({ "deletedAt": "2026-01-01T00:00:00Z", "deletedByUserId": user.user_id }))
            .await
            .assert_status_ok();
        let detail = server.get(&format!("/tasks/{}", task.id)).await.json::<Value>();
        assert_eq!(detail["comments"][0]["state"], "deleted");
        assert!(detail["comments"][0].get("text").is_none());

        server
            .patch(&format!("/comments/{}/soft-delete", comment.id))
            .json(&json!({ "deletedAt": null, "deletedByUserId": null }))
            .await
            .assert_status_ok();
        let detail = server.get(&format!("/tasks/{}", task.id)).await.json::<Value>();
        assert_eq!(detail["comments"][0]["text"], "secret");
    }
}

mod search {
    use super::*;

    #[tokio::test]
    async fn finds_tasks_and_projects() {
        let server = setup();
        let project = create_test_project(&server).await;
        create_task(&server, &project, "Project kickoff", None, None).await;

        let results = server
            .get("/search")
            .add_query_param("query", "project")
            .await
            .json::<SearchResults>();

        assert_eq!(results.projects.len(), 1);
        assert_eq!(results.tasks.len(), 1);
    }

    #[tokio::test]
    async fn empty_query_returns_empty_lists() {
        let server = setup();
        create_test_project(&server).await;

        let results = server.get("/search").await.json::<SearchResults>();

        assert!(results.is_empty());
    }
}

// ============================================================
// Security - API Key Authentication
// ============================================================

mod security_auth {
    use super::*;
    use orgnocal::api::create_router_with_config;
    use orgnocal::api::middleware::SecurityConfig;
    use orgnocal::config::AppConfig;

    fn setup_with(security: SecurityConfig) -> TestServer {
        let db = Database::open_memory().expect("Failed to create database");
        db.migrate().expect("Failed to migrate");
        let config = AppConfig {
            security,
            ..Default::default()
        };
        let app = create_router_with_config(db, config);
        TestServer::new(app).expect("Failed to create test server")
    }

    #[tokio::test]
    async fn health_endpoint_is_accessible_without_auth() {
        let server = setup_with(SecurityConfig::with_api_key("test-secret-key"));

        server.get("/health").await.assert_status_ok();
    }

    #[tokio::test]
    async fn protected_endpoint_requires_auth() {
        let server = setup_with(SecurityConfig::with_api_key("test-secret-key"));

        let response = server.get("/projects").await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn protected_endpoint_accepts_valid_bearer_token() {
        let server = setup_with(SecurityConfig::with_api_key("test-secret-key"));

        let response = server
            .get("/projects")
            .add_header("Authorization", "Bearer test-secret-key")
            .await;

        response.assert_status_ok();
    }

    #[tokio::test]
    async fn protected_endpoint_rejects_wrong_or_malformed_token() {
        let server = setup_with(SecurityConfig::with_api_key("test-secret-key"));

        server
            .get("/projects")
            .add_header("Authorization", "Bearer wrong-key")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        server
            .get("/projects")
            .add_header("Authorization", "Basic dXNlcjpwYXNz")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn rate_limit_rejects_excess_requests() {
        let server = setup_with(SecurityConfig::with_rate_limit(2));

        server.get("/projects").await.assert_status_ok();
        server.get("/projects").await.assert_status_ok();
        server
            .get("/projects")
            .await
            .assert_status(StatusCode::TOO_MANY_REQUESTS);
    }
}
