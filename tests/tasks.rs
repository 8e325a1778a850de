mod common;

use actix_web::middleware::Logger;
use actix_web::{test, web, App};
use serde_json::json;

use common::{cleanup_user, init_env, lazy_pool, live_pool, register_and_login_user};
use taskline::auth::AuthMiddleware;
use taskline::config::UploadConfig;
use taskline::models::Task;
use taskline::routes;

fn test_upload_config() -> UploadConfig {
    UploadConfig {
        upload_dir: std::env::temp_dir()
            .join("taskline-test-uploads")
            .to_string_lossy()
            .into_owned(),
        max_upload_bytes: 1024 * 1024,
    }
}

macro_rules! test_app {
    ($pool:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($pool.clone()))
                .app_data(web::Data::new(test_upload_config()))
                .wrap(Logger::default())
                .service(routes::health::health)
                .service(
                    web::scope("/api")
                        .wrap(AuthMiddleware)
                        .configure(routes::config),
                ),
        )
        .await
    };
}

#[actix_rt::test]
async fn test_create_task_requires_title() {
    init_env();
    let pool = lazy_pool();
    let app = test_app!(pool);

    let token = taskline::auth::generate_access_token(1).unwrap();

    // Empty title fails validation before any query runs
    let req = test::TestRequest::post()
        .uri("/api/tasks")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({ "title": "" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    // Missing title is rejected at deserialization
    let req = test::TestRequest::post()
        .uri("/api/tasks")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({ "completed": true }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_client_error());
}

// Requires a running Postgres with DATABASE_URL set and migrations applied.
#[ignore]
#[actix_rt::test]
async fn test_task_crud_flow() {
    init_env();
    let pool = live_pool().await;
    cleanup_user(&pool, "task_crud@example.com").await;

    let app = test_app!(pool);

    let user = register_and_login_user(&app, "task_crud@example.com", "task_crud", "Password123!")
        .await
        .unwrap();
    let auth = ("Authorization", format!("Bearer {}", user.token));

    // Create
    let req = test::TestRequest::post()
        .uri("/api/tasks")
        .insert_header(auth.clone())
        .set_json(json!({ "title": "Write the report" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let created: Task = test::read_body_json(resp).await;
    assert_eq!(created.title, "Write the report");
    assert!(!created.completed);
    assert_eq!(created.user_id, user.id);

    // List contains it
    let req = test::TestRequest::get()
        .uri("/api/tasks")
        .insert_header(auth.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let tasks: Vec<Task> = test::read_body_json(resp).await;
    assert!(tasks.iter().any(|t| t.id == created.id));

    // Partial update: flip the flag, keep the title
    let req = test::TestRequest::put()
        .uri(&format!("/api/tasks/{}", created.id))
        .insert_header(auth.clone())
        .set_json(json!({ "completed": true }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let updated: Task = test::read_body_json(resp).await;
    assert!(updated.completed);
    assert_eq!(updated.title, "Write the report");
    assert!(updated.updated_at >= created.updated_at);

    // Delete
    let req = test::TestRequest::delete()
        .uri(&format!("/api/tasks/{}", created.id))
        .insert_header(auth.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 204);

    // Gone
    let req = test::TestRequest::get()
        .uri(&format!("/api/tasks/{}", created.id))
        .insert_header(auth.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    cleanup_user(&pool, "task_crud@example.com").await;
}

// Requires a running Postgres with DATABASE_URL set and migrations applied.
#[ignore]
#[actix_rt::test]
async fn test_tasks_are_tenant_isolated() {
    init_env();
    let pool = live_pool().await;
    cleanup_user(&pool, "owner@example.com").await;
    cleanup_user(&pool, "intruder@example.com").await;

    let app = test_app!(pool);

    let owner = register_and_login_user(&app, "owner@example.com", "task_owner", "Password123!")
        .await
        .unwrap();
    let intruder =
        register_and_login_user(&app, "intruder@example.com", "task_intruder", "Password123!")
            .await
            .unwrap();

    // Owner creates a task
    let req = test::TestRequest::post()
        .uri("/api/tasks")
        .insert_header(("Authorization", format!("Bearer {}", owner.token)))
        .set_json(json!({ "title": "Private task" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let task: Task = test::read_body_json(resp).await;

    let intruder_auth = ("Authorization", format!("Bearer {}", intruder.token));

    // The other tenant cannot read it
    let req = test::TestRequest::get()
        .uri(&format!("/api/tasks/{}", task.id))
        .insert_header(intruder_auth.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    // Nor update it
    let req = test::TestRequest::put()
        .uri(&format!("/api/tasks/{}", task.id))
        .insert_header(intruder_auth.clone())
        .set_json(json!({ "title": "Hijacked" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    // Nor delete it
    let req = test::TestRequest::delete()
        .uri(&format!("/api/tasks/{}", task.id))
        .insert_header(intruder_auth.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    // And it does not appear in their listing
    let req = test::TestRequest::get()
        .uri("/api/tasks")
        .insert_header(intruder_auth)
        .to_request();
    let resp = test::call_service(&app, req).await;
    let tasks: Vec<Task> = test::read_body_json(resp).await;
    assert!(tasks.iter().all(|t| t.id != task.id));

    // The owner still sees it untouched
    let req = test::TestRequest::get()
        .uri(&format!("/api/tasks/{}", task.id))
        .insert_header(("Authorization", format!("Bearer {}", owner.token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let unchanged: Task = test::read_body_json(resp).await;
    assert_eq!(unchanged.title, "Private task");

    cleanup_user(&pool, "owner@example.com").await;
    cleanup_user(&pool, "intruder@example.com").await;
}
