#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::http::{Method, Request, StatusCode};
    use axum::body::Body;
    use axum::{routing, Router};
    use serde_json::{json, Value};

    use crate::routes::with_layers;
    use crate::tests::{call, get, post_form, post_json, send, setup_test_app, setup_with, test_config, BASE};

    fn url(path: &str) -> String {
        format!("{}{}", BASE, path)
    }

    #[tokio::test]
    async fn test_category_scenario() {
        let t = setup_test_app().await;

        let (status, body) = send(&t.app, post_json(&url("/categories"), json!({ "name": "Science" }))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, json!({ "id": 1 }));

        let (status, body) = send(&t.app, get(&url("/categories/1"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "id": 1, "name": "Science" }));

        let (status, body) = send(&t.app, get(&url("/categories"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([[1, { "name": "Science" }]]));
    }

    #[tokio::test]
    async fn test_category_ids_are_assigned_by_store() {
        let t = setup_test_app().await;

        let (_, first) = send(&t.app, post_json(&url("/categories"), json!({ "name": "History" }))).await;
        let (_, second) = send(&t.app, post_form(&url("/categories"), "name=Art")).await;
        assert_eq!(first["id"], 1);
        assert_eq!(second["id"], 2);

        let (_, body) = send(&t.app, get(&url("/categories/2"))).await;
        assert_eq!(body, json!({ "id": 2, "name": "Art" }));
    }

    #[tokio::test]
    async fn test_category_without_name_is_rejected() {
        let t = setup_test_app().await;

        let (status, body) = send(&t.app, post_json(&url("/categories"), json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["details"]["field"], "name");

        // empty body without content type behaves the same
        let req = Request::builder().method("POST").uri(url("/categories")).body(Body::empty()).unwrap();
        let (status, body) = send(&t.app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["details"]["field"], "name");

        let (_, list) = send(&t.app, get(&url("/categories"))).await;
        assert_eq!(list, json!([]));
        assert_eq!(t.state.metrics.get_snapshot().validation_failures, 2);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let t = setup_test_app().await;

        let req = Request::builder()
            .method("POST")
            .uri(url("/categories"))
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(&t.app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");

        let (_, list) = send(&t.app, get(&url("/categories"))).await;
        assert_eq!(list, json!([]));
    }

    #[tokio::test]
    async fn test_oversized_body_is_payload_too_large() {
        let t = setup_test_app().await;

        let name = "x".repeat(2 * 1024 * 1024);
        let (status, body) = send(&t.app, post_json(&url("/categories"), json!({ "name": name }))).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["error"]["code"], "PAYLOAD_TOO_LARGE");

        let form = format!("name={}", "y".repeat(2 * 1024 * 1024));
        let (status, _) = send(&t.app, post_form(&url("/categories"), &form)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);

        let (_, list) = send(&t.app, get(&url("/categories"))).await;
        assert_eq!(list, json!([]));
        assert_eq!(t.state.metrics.get_snapshot().validation_failures, 2);
    }

    #[tokio::test]
    async fn test_quiz_level_out_of_integer_range_is_rejected() {
        let t = setup_test_app().await;

        let req = Request::builder()
            .method("POST")
            .uri(url("/quizes"))
            .header("content-type", "application/json")
            .body(Body::from(r#"{"title":"t","level":1e20,"category_id":1}"#))
            .unwrap();
        let (status, body) = send(&t.app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["details"]["field"], "level");

        let (_, list) = send(&t.app, get(&url("/quizes"))).await;
        assert_eq!(list, json!([]));
    }

    #[tokio::test]
    async fn test_quiz_create_and_list() {
        let t = setup_test_app().await;
        send(&t.app, post_json(&url("/categories"), json!({ "name": "Science" }))).await;

        let (_, before) = send(&t.app, get(&url("/quizes"))).await;
        assert_eq!(before.as_array().unwrap().len(), 0);

        let (status, created) = send(
            &t.app,
            post_json(&url("/quizes"), json!({ "title": "Physics 101", "level": 2, "category_id": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_i64().unwrap();

        let (_, after) = send(&t.app, get(&url("/quizes"))).await;
        let entries: Vec<&Value> = after.as_array().unwrap().iter().filter(|e| e[0] == id).collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0][1], json!({ "title": "Physics 101", "level": 2, "category_id": 1 }));

        let (_, single) = send(&t.app, get(&url(&format!("/quizes/{}", id)))).await;
        assert_eq!(single, json!({ "id": id, "title": "Physics 101", "level": 2, "category_id": 1 }));
    }

    #[tokio::test]
    async fn test_quiz_form_coerces_integers() {
        let t = setup_test_app().await;

        let (status, created) =
            send(&t.app, post_form(&url("/quizes"), "title=Algebra&level=3&category_id=7")).await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, single) = send(&t.app, get(&url(&format!("/quizes/{}", created["id"])))).await;
        assert_eq!(single["level"], 3);
        assert_eq!(single["category_id"], 7);
    }

    #[tokio::test]
    async fn test_quiz_with_dangling_category_is_accepted() {
        let t = setup_test_app().await;

        let (status, created) = send(
            &t.app,
            post_json(&url("/quizes"), json!({ "title": "Orphan", "level": 1, "category_id": 99 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, single) = send(&t.app, get(&url(&format!("/quizes/{}", created["id"])))).await;
        assert_eq!(single["category_id"], 99);
    }

    #[tokio::test]
    async fn test_quiz_with_wrong_typed_level_is_rejected() {
        let t = setup_test_app().await;

        let (status, body) = send(
            &t.app,
            post_json(&url("/quizes"), json!({ "title": "Bad", "level": "hard", "category_id": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["details"]["field"], "level");

        let (status, body) =
            send(&t.app, post_json(&url("/quizes"), json!({ "title": "Bad", "level": 1 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["details"]["field"], "category_id");

        let (_, list) = send(&t.app, get(&url("/quizes"))).await;
        assert_eq!(list, json!([]));
    }

    #[tokio::test]
    async fn test_question_with_options() {
        let t = setup_test_app().await;

        let (status, created) = send(
            &t.app,
            post_json(
                &url("/questions"),
                json!({ "text": "Pick C", "score": 5, "options": ["A", "B"], "answer": "C", "quiz_id": 1 }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_i64().unwrap();

        let (status, q) = send(&t.app, get(&url(&format!("/questions/{}", id)))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(q["id"], id);
        assert_eq!(q["content"], "Pick C");
        assert_eq!(q["score"], 5);
        assert_eq!(q["quiz_id"], 1);

        let options = q["options"].as_object().unwrap();
        assert_eq!(options.len(), 3);
        let correct: Vec<&Value> = options.values().filter(|o| o["is_correct"] == 1).collect();
        assert_eq!(correct.len(), 1);
        assert_eq!(correct[0]["content"], "C");

        let mut distractors: Vec<&str> = options
            .values()
            .filter(|o| o["is_correct"] == 0)
            .map(|o| o["content"].as_str().unwrap())
            .collect();
        distractors.sort();
        assert_eq!(distractors, vec!["A", "B"]);

        // option objects never carry their own id or question_id
        for opt in options.values() {
            assert_eq!(opt.as_object().unwrap().len(), 2);
        }
        for key in options.keys() {
            assert!(key.parse::<i64>().is_ok());
        }

        let snapshot = t.state.metrics.get_snapshot();
        assert_eq!(snapshot.questions_created, 1);
        assert_eq!(snapshot.options_created, 3);
    }

    #[tokio::test]
    async fn test_question_form_with_repeated_options() {
        let t = setup_test_app().await;

        let (status, created) = send(
            &t.app,
            post_form(&url("/questions"), "text=2%2B2&score=1&options=3&options=5&options=22&answer=4&quiz_id=2"),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, q) = send(&t.app, get(&url(&format!("/questions/{}", created["id"])))).await;
        assert_eq!(q["content"], "2+2");
        assert_eq!(q["options"].as_object().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_question_list_excludes_options() {
        let t = setup_test_app().await;
        send(
            &t.app,
            post_json(
                &url("/questions"),
                json!({ "text": "Q1", "score": 2, "options": ["x"], "answer": "y", "quiz_id": 4 }),
            ),
        )
        .await;

        let (_, list) = send(&t.app, get(&url("/questions"))).await;
        assert_eq!(list, json!([[1, { "content": "Q1", "score": 2, "quiz_id": 4 }]]));
    }

    #[tokio::test]
    async fn test_question_validation_happens_before_store_access() {
        let t = setup_test_app().await;

        let (status, body) = send(
            &t.app,
            post_json(
                &url("/questions"),
                json!({ "text": "Q", "score": 1, "options": [], "answer": "a", "quiz_id": 1 }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["details"]["field"], "options");

        let (status, body) = send(
            &t.app,
            post_json(&url("/questions"), json!({ "text": "Q", "score": 1, "options": ["a"], "quiz_id": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["details"]["field"], "answer");

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM options").fetch_one(&t.state.db).await.unwrap();
        assert_eq!(count, 0);
        let (_, list) = send(&t.app, get(&url("/questions"))).await;
        assert_eq!(list, json!([]));
    }

    #[tokio::test]
    async fn test_question_creation_is_atomic() {
        let t = setup_test_app().await;
        sqlx::query(
            "CREATE TRIGGER reject_boom BEFORE INSERT ON options WHEN NEW.content = 'boom'
             BEGIN SELECT RAISE(ABORT, 'rejected option'); END",
        )
        .execute(&t.state.db)
        .await
        .unwrap();

        let (status, body) = send(
            &t.app,
            post_json(
                &url("/questions"),
                json!({ "text": "Q", "score": 1, "options": ["fine", "boom"], "answer": "a", "quiz_id": 1 }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "DATABASE_ERROR");

        let questions: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM questions").fetch_one(&t.state.db).await.unwrap();
        let options: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM options").fetch_one(&t.state.db).await.unwrap();
        assert_eq!(questions, 0);
        assert_eq!(options, 0);
        assert_eq!(t.state.metrics.get_snapshot().storage_errors, 1);
    }

    #[tokio::test]
    async fn test_missing_items_return_empty_object() {
        let t = setup_test_app().await;

        for path in ["/categories/42", "/quizes/42", "/questions/42", "/categories/abc", "/questions/x1"] {
            let (status, body) = send(&t.app, get(&url(path))).await;
            assert_eq!(status, StatusCode::OK, "{}", path);
            assert_eq!(body, json!({}), "{}", path);
        }
    }

    #[tokio::test]
    async fn test_missing_items_strict_not_found() {
        let t = setup_with(|cfg| cfg.api.strict_not_found = true).await;

        for path in ["/categories/42", "/quizes/42", "/questions/42", "/quizes/abc"] {
            let (status, body) = send(&t.app, get(&url(path))).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{}", path);
            assert_eq!(body["error"]["code"], "NOT_FOUND");
        }

        send(&t.app, post_json(&url("/categories"), json!({ "name": "Found" }))).await;
        let (status, body) = send(&t.app, get(&url("/categories/1"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Found");
    }

    #[tokio::test]
    async fn test_updates_are_not_supported() {
        let t = setup_test_app().await;
        send(&t.app, post_json(&url("/categories"), json!({ "name": "Keep" }))).await;

        let req = Request::builder()
            .method(Method::PUT)
            .uri(url("/categories/1"))
            .header("content-type", "application/json")
            .body(Body::from(r#"{"name":"Changed"}"#))
            .unwrap();
        let res = call(&t.app, req).await;
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);

        let (_, body) = send(&t.app, get(&url("/categories/1"))).await;
        assert_eq!(body["name"], "Keep");
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let t = setup_test_app().await;

        let (status, body) = send(&t.app, get("/quizapp/api/2.0/categories")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], 404);
    }

    #[tokio::test]
    async fn test_custom_base_path() {
        let t = setup_with(|cfg| cfg.api.base_path = "/api".to_string()).await;

        let (status, _) = send(&t.app, post_json("/api/categories", json!({ "name": "Moved" }))).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = send(&t.app, get(&url("/categories"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_security_headers_present() {
        let t = setup_test_app().await;

        let res = call(&t.app, get(&url("/categories"))).await;
        assert_eq!(res.status(), StatusCode::OK);
        let headers = res.headers();
        assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
        assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
        assert_eq!(headers.get("referrer-policy").unwrap(), "no-referrer");
        assert_eq!(headers.get("cache-control").unwrap(), "no-store");
        assert!(headers.get("strict-transport-security").is_none());
    }

    #[tokio::test]
    async fn test_hsts_header_when_enabled() {
        let t = setup_with(|cfg| {
            cfg.security = Some(crate::config::SecurityConfig { enable_hsts: Some(true), hsts_max_age: Some(600) })
        })
        .await;

        let res = call(&t.app, get("/healthz")).await;
        assert_eq!(res.headers().get("strict-transport-security").unwrap(), "max-age=600");
    }

    #[tokio::test]
    async fn test_slow_request_times_out() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut cfg = test_config(&dir);
        cfg.server.request_timeout_secs = 1;

        let slow = Router::new().route(
            "/slow",
            routing::get(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                "done"
            }),
        );
        let app = with_layers(slow, Arc::new(cfg));

        let res = call(&app, get("/slow")).await;
        assert_eq!(res.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(res.headers().get("x-content-type-options").unwrap(), "nosniff");
    }
}
