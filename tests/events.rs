mod common;

use actix_web::middleware::Logger;
use actix_web::{test, web, App};
use serde_json::json;

use common::{cleanup_user, init_env, lazy_pool, live_pool, register_and_login_user};
use taskline::auth::AuthMiddleware;
use taskline::config::UploadConfig;
use taskline::models::Event;
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
async fn test_timeline_rejects_bad_dates() {
    init_env();
    let pool = lazy_pool();
    let app = test_app!(pool);

    let token = taskline::auth::generate_access_token(1).unwrap();
    let auth = ("Authorization", format!("Bearer {}", token));

    // Malformed date
    let req = test::TestRequest::get()
        .uri("/api/events/timeline?date=15-06-2025")
        .insert_header(auth.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Invalid date format, expected YYYY-MM-DD");

    // Missing date parameter
    let req = test::TestRequest::get()
        .uri("/api/events/timeline")
        .insert_header(auth)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_rt::test]
async fn test_create_event_rejects_bad_payloads() {
    init_env();
    let pool = lazy_pool();
    let app = test_app!(pool);

    let token = taskline::auth::generate_access_token(1).unwrap();
    let auth = ("Authorization", format!("Bearer {}", token));

    // Empty title
    let req = test::TestRequest::post()
        .uri("/api/events")
        .insert_header(auth.clone())
        .set_json(json!({ "title": "", "event_date": "2025-06-15" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    // Bad date format is rejected at deserialization
    let req = test::TestRequest::post()
        .uri("/api/events")
        .insert_header(auth)
        .set_json(json!({ "title": "Conference", "event_date": "June 15th" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_client_error());
}

// Requires a running Postgres with DATABASE_URL set and migrations applied.
#[ignore]
#[actix_rt::test]
async fn test_event_crud_and_timeline_window() {
    init_env();
    let pool = live_pool().await;
    cleanup_user(&pool, "events@example.com").await;

    let app = test_app!(pool);

    let user = register_and_login_user(&app, "events@example.com", "event_user", "Password123!")
        .await
        .unwrap();
    let auth = ("Authorization", format!("Bearer {}", user.token));

    // Events around a 2025-06-15 pivot: inside both edges, inside middle,
    // and one day outside either edge.
    let dates = [
        ("At window start", "2025-06-08"),
        ("Midweek meeting", "2025-06-12"),
        ("At window end", "2025-06-22"),
        ("Too early", "2025-06-07"),
        ("Too late", "2025-06-23"),
    ];
    for (title, date) in dates {
        let req = test::TestRequest::post()
            .uri("/api/events")
            .insert_header(auth.clone())
            .set_json(json!({ "title": title, "event_date": date }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201, "failed to create {}", title);
    }

    // Timeline query around the pivot
    let req = test::TestRequest::get()
        .uri("/api/events/timeline?date=2025-06-15")
        .insert_header(auth.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let events: Vec<Event> = test::read_body_json(resp).await;

    let titles: Vec<&str> = events.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(
        titles,
        vec!["At window start", "Midweek meeting", "At window end"],
        "timeline must contain only in-window events, date ascending"
    );

    // Dates come back ordered ascending
    let mut sorted = events.iter().map(|e| e.event_date).collect::<Vec<_>>();
    sorted.sort();
    assert_eq!(
        sorted,
        events.iter().map(|e| e.event_date).collect::<Vec<_>>()
    );

    // Partial update moves one event out of the window
    let midweek = events.iter().find(|e| e.title == "Midweek meeting").unwrap();
    let req = test::TestRequest::put()
        .uri(&format!("/api/events/{}", midweek.id))
        .insert_header(auth.clone())
        .set_json(json!({ "event_date": "2025-07-01" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let moved: Event = test::read_body_json(resp).await;
    assert_eq!(moved.title, "Midweek meeting"); // title untouched by the merge

    let req = test::TestRequest::get()
        .uri("/api/events/timeline?date=2025-06-15")
        .insert_header(auth.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    let events: Vec<Event> = test::read_body_json(resp).await;
    assert!(events.iter().all(|e| e.title != "Midweek meeting"));

    // Delete one and confirm it is gone
    let req = test::TestRequest::delete()
        .uri(&format!("/api/events/{}", moved.id))
        .insert_header(auth.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 204);

    let req = test::TestRequest::get()
        .uri(&format!("/api/events/{}", moved.id))
        .insert_header(auth)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    cleanup_user(&pool, "events@example.com").await;
}

// Requires a running Postgres with DATABASE_URL set and migrations applied.
#[ignore]
#[actix_rt::test]
async fn test_events_are_tenant_isolated() {
    init_env();
    let pool = live_pool().await;
    cleanup_user(&pool, "event_owner@example.com").await;
    cleanup_user(&pool, "event_intruder@example.com").await;

    let app = test_app!(pool);

    let owner = register_and_login_user(
        &app,
        "event_owner@example.com",
        "event_owner",
        "Password123!",
    )
    .await
    .unwrap();
    let intruder = register_and_login_user(
        &app,
        "event_intruder@example.com",
        "event_intruder",
        "Password123!",
    )
    .await
    .unwrap();

    let req = test::TestRequest::post()
        .uri("/api/events")
        .insert_header(("Authorization", format!("Bearer {}", owner.token)))
        .set_json(json!({ "title": "Private event", "event_date": "2025-06-15" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let event: Event = test::read_body_json(resp).await;

    let intruder_auth = ("Authorization", format!("Bearer {}", intruder.token));

    let req = test::TestRequest::get()
        .uri(&format!("/api/events/{}", event.id))
        .insert_header(intruder_auth.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/events/{}", event.id))
        .insert_header(intruder_auth.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    // The intruder's timeline never shows it
    let req = test::TestRequest::get()
        .uri("/api/events/timeline?date=2025-06-15")
        .insert_header(intruder_auth)
        .to_request();
    let resp = test::call_service(&app, req).await;
    let events: Vec<Event> = test::read_body_json(resp).await;
    assert!(events.iter().all(|e| e.id != event.id));

    cleanup_user(&pool, "event_owner@example.com").await;
    cleanup_user(&pool, "event_intruder@example.com").await;
}
