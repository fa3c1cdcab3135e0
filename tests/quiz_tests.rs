// tests/quiz_tests.rs

use quizmaker::{config::Config, routes, state::AppState};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

async fn spawn_app() -> Option<(String, PgPool)> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping integration test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: database_url.clone(),
        jwt_secret: "quiz_test_secret".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
    };

    let state = AppState {
        pool: pool.clone(),
        config,
    };
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Some((address, pool))
}

/// Registers a fresh user and returns a bearer token.
async fn register_and_login(client: &reqwest::Client, address: &str) -> String {
    let email = format!("u_{}@example.com", &uuid::Uuid::new_v4().to_string()[..8]);
    let password = "password123";

    client
        .post(&format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "name": "Quiz Author",
            "email": email,
            "password": password
        }))
        .send()
        .await
        .expect("Register failed");

    let login: serde_json::Value = client
        .post(&format!("{}/api/auth/login", address))
        .json(&serde_json::json!({
            "email": email,
            "password": password
        }))
        .send()
        .await
        .expect("Login failed")
        .json()
        .await
        .expect("Failed to parse login json");

    login["token"].as_str().expect("Token not found").to_string()
}

/// Seeds a genre directly through the pool and returns its id.
async fn seed_genre(pool: &PgPool) -> i64 {
    let name = format!("Genre {}", &uuid::Uuid::new_v4().to_string()[..8]);
    sqlx::query_scalar("INSERT INTO genres (name) VALUES ($1) RETURNING id")
        .bind(name)
        .fetch_one(pool)
        .await
        .expect("Failed to seed genre")
}

/// The three-item quiz from the grading scenario: a free-text item, a
/// single-choice item, and a multi-choice item.
fn scenario_items() -> serde_json::Value {
    serde_json::json!([
        {
            "question_number": 1,
            "format": 1,
            "question": "What is the capital of France?",
            "answer": "Paris"
        },
        {
            "question_number": 2,
            "format": 2,
            "question": "Pick the right one.",
            "choice1": "A",
            "choice2": "B",
            "answer": "2"
        },
        {
            "question_number": 3,
            "format": 3,
            "question": "Pick all that apply.",
            "choice1": "X",
            "choice2": "Y",
            "choice3": "Z",
            "answer": "1,3"
        }
    ])
}

async fn create_quiz(
    client: &reqwest::Client,
    address: &str,
    token: &str,
    genre_id: i64,
    title: &str,
    items: serde_json::Value,
) -> i64 {
    let response = client
        .post(&format!("{}/api/quizzes", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "title": title,
            "description": "Integration test quiz",
            "genre_id": genre_id,
            "items": items
        }))
        .send()
        .await
        .expect("Create quiz failed");

    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    body["id"].as_i64().expect("Quiz id not found")
}

#[tokio::test]
async fn quiz_lifecycle_with_server_side_grading() {
    // Arrange
    let Some((address, pool)) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let token = register_and_login(&client, &address).await;
    let genre_id = seed_genre(&pool).await;

    // 1. Create the quiz
    let quiz_id = create_quiz(&client, &address, &token, genre_id, "Capitals", scenario_items()).await;

    // 2. Fetch it: three items, ordered, with canonical answers hidden
    let quiz: serde_json::Value = client
        .get(&format!("{}/api/quizzes/{}", address, quiz_id))
        .send()
        .await
        .expect("Get quiz failed")
        .json()
        .await
        .unwrap();

    let items = quiz["items"].as_array().expect("Items missing");
    assert_eq!(items.len(), 3);
    assert_eq!(quiz["item_count"].as_i64(), Some(3));
    for (i, item) in items.iter().enumerate() {
        assert_eq!(item["question_number"].as_i64(), Some(i as i64 + 1));
        assert!(item.get("answer").is_none(), "answer must be hidden");
    }

    // 3. Submit answers: case-mismatched free text, correct single choice,
    //    correct but reordered multi choice
    let mut submitted = serde_json::Map::new();
    for (item, answer) in items.iter().zip(["paris", "2", "3,1"]) {
        submitted.insert(
            item["id"].as_i64().unwrap().to_string(),
            serde_json::Value::String(answer.to_string()),
        );
    }
    let answers = serde_json::json!({ "answers": submitted });

    let response = client
        .post(&format!("{}/api/quizzes/{}/answers", address, quiz_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&answers)
        .send()
        .await
        .expect("Submit answers failed");

    assert_eq!(response.status().as_u16(), 201);
    let grade: serde_json::Value = response.json().await.unwrap();

    assert_eq!(grade["correct_count"].as_i64(), Some(2));
    assert_eq!(grade["item_count"].as_i64(), Some(3));
    let passes: Vec<bool> = grade["answers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["pass"].as_bool().unwrap())
        .collect();
    assert_eq!(passes, vec![false, true, true]);

    // 4. The grade detail shows the canonical answers for result rendering
    let grade_id = grade["id"].as_i64().unwrap();
    let detail: serde_json::Value = client
        .get(&format!(
            "{}/api/quizzes/{}/grades/{}",
            address, quiz_id, grade_id
        ))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Get grade failed")
        .json()
        .await
        .unwrap();

    assert_eq!(detail["correct_count"].as_i64(), Some(2));
    let records = detail["answers"].as_array().unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["correct_answer"].as_str(), Some("Paris"));
    assert_eq!(records[0]["answer"].as_str(), Some("paris"));

    // 5. Grade history lists exactly this attempt
    let history: serde_json::Value = client
        .get(&format!("{}/api/quizzes/{}/grades", address, quiz_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("List grades failed")
        .json()
        .await
        .unwrap();

    assert_eq!(history.as_array().unwrap().len(), 1);

    // 6. Profile counts the authored quiz and the attempt
    let profile: serde_json::Value = client
        .get(&format!("{}/api/profile", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Get profile failed")
        .json()
        .await
        .unwrap();

    assert_eq!(profile["quiz_count"].as_i64(), Some(1));
    assert_eq!(profile["grade_count"].as_i64(), Some(1));
}

#[tokio::test]
async fn edit_replaces_all_items_and_rolls_back_on_failure() {
    // Arrange
    let Some((address, pool)) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let token = register_and_login(&client, &address).await;
    let genre_id = seed_genre(&pool).await;

    let quiz_id = create_quiz(
        &client,
        &address,
        &token,
        genre_id,
        "Before edit",
        serde_json::json!([
            { "question_number": 1, "format": 1, "question": "Old one", "answer": "a" },
            { "question_number": 2, "format": 1, "question": "Old two", "answer": "b" }
        ]),
    )
    .await;

    // Act 1: a valid edit replaces the whole item list
    let response = client
        .put(&format!("{}/api/quizzes/{}", address, quiz_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "title": "After edit",
            "description": "Edited",
            "genre_id": genre_id,
            "items": scenario_items()
        }))
        .send()
        .await
        .expect("Edit failed");

    assert_eq!(response.status().as_u16(), 200);

    let quiz: serde_json::Value = client
        .get(&format!("{}/api/quizzes/{}", address, quiz_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(quiz["title"].as_str(), Some("After edit"));
    assert_eq!(quiz["items"].as_array().unwrap().len(), 3);

    // Act 2: an edit whose item insert violates the unique question-number
    // index fails inside the transaction...
    let response = client
        .put(&format!("{}/api/quizzes/{}", address, quiz_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "title": "Should not stick",
            "description": "Edited again",
            "genre_id": genre_id,
            "items": [
                { "question_number": 1, "format": 1, "question": "Dup one", "answer": "a" },
                { "question_number": 1, "format": 1, "question": "Dup two", "answer": "b" }
            ]
        }))
        .send()
        .await
        .expect("Edit request failed");

    assert_eq!(response.status().as_u16(), 409);

    // ...and rolls the whole edit back: metadata and items are untouched
    let quiz: serde_json::Value = client
        .get(&format!("{}/api/quizzes/{}", address, quiz_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(quiz["title"].as_str(), Some("After edit"));
    assert_eq!(quiz["items"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn modification_by_another_user_is_rejected() {
    // Arrange
    let Some((address, pool)) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let author_token = register_and_login(&client, &address).await;
    let intruder_token = register_and_login(&client, &address).await;
    let genre_id = seed_genre(&pool).await;

    let quiz_id = create_quiz(
        &client,
        &address,
        &author_token,
        genre_id,
        "Owned",
        scenario_items(),
    )
    .await;

    // Act
    let response = client
        .delete(&format!("{}/api/quizzes/{}", address, quiz_id))
        .header("Authorization", format!("Bearer {}", intruder_token))
        .send()
        .await
        .expect("Delete request failed");

    // Assert
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn invalid_items_report_every_failing_field() {
    // Arrange
    let Some((address, pool)) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let token = register_and_login(&client, &address).await;
    let genre_id = seed_genre(&pool).await;

    // Act: two broken items, a free-text one without an answer and a
    // single-choice one with a single choice
    let response = client
        .post(&format!("{}/api/quizzes", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "title": "Broken",
            "description": "Broken quiz",
            "genre_id": genre_id,
            "items": [
                { "question_number": 1, "format": 1, "question": "Q1", "answer": "" },
                { "question_number": 2, "format": 2, "question": "Q2", "choice1": "only", "answer": "1" }
            ]
        }))
        .send()
        .await
        .expect("Create request failed");

    // Assert
    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    let items_errors = &body["details"]["items"];
    assert!(items_errors.get("0").is_some(), "first item must be reported");
    assert!(items_errors.get("1").is_some(), "second item must be reported");
}

#[tokio::test]
async fn quizzes_filter_by_genre() {
    // Arrange
    let Some((address, pool)) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let token = register_and_login(&client, &address).await;
    let genre_a = seed_genre(&pool).await;
    let genre_b = seed_genre(&pool).await;

    let quiz_a = create_quiz(&client, &address, &token, genre_a, "In A", scenario_items()).await;
    let _quiz_b = create_quiz(&client, &address, &token, genre_b, "In B", scenario_items()).await;

    // Act
    let listed: serde_json::Value = client
        .get(&format!("{}/api/quizzes?genre_id={}", address, genre_a))
        .send()
        .await
        .expect("List failed")
        .json()
        .await
        .unwrap();

    // Assert
    let listed = listed.as_array().unwrap();
    assert!(listed.iter().all(|q| q["genre_id"].as_i64() == Some(genre_a)));
    assert!(listed.iter().any(|q| q["id"].as_i64() == Some(quiz_a)));
}

#[tokio::test]
async fn delete_removes_the_quiz() {
    // Arrange
    let Some((address, pool)) = spawn_app().await else { return };
    let client = reqwest::Client::new();
    let token = register_and_login(&client, &address).await;
    let genre_id = seed_genre(&pool).await;
    let quiz_id = create_quiz(&client, &address, &token, genre_id, "Doomed", scenario_items()).await;

    // Act
    let response = client
        .delete(&format!("{}/api/quizzes/{}", address, quiz_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Delete failed");

    // Assert
    assert_eq!(response.status().as_u16(), 204);

    let response = client
        .get(&format!("{}/api/quizzes/{}", address, quiz_id))
        .send()
        .await
        .expect("Get failed");
    assert_eq!(response.status().as_u16(), 404);
}
