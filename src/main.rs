pub mod collate;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod repository;
pub mod routes;

use std::{path::Path, sync::Arc};

use anyhow::Result;
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use config::Config;
use db::Db;
use models::{Post, PostFields, Record, Todo, TodoFields};
use repository::{DiskRepository, ListQuery, MemoryRepository};
use routes::{shared, Shared};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// === App State ===
#[derive(Clone)]
struct AppState {
    todos: Shared<Todo>,
    posts: Shared<Post>,
}
impl AppState {
    fn in_memory() -> Self {
        Self {
            todos: shared(MemoryRepository::<Todo>::new()),
            posts: shared(MemoryRepository::<Post>::new()),
        }
    }

    // both collections live in one sled database
    fn open(path: &Path) -> Result<Self> {
        let db = Arc::new(Db::open(path)?);
        Ok(Self {
            todos: shared(DiskRepository::<Todo>::new(db.clone())),
            posts: shared(DiskRepository::<Post>::new(db)),
        })
    }

    /// Fills collections that are still empty with sample records.
    async fn seed(&self) -> Result<()> {
        let todos = ["Släng sopor", "Chilla", "Jobba", "Festa"].map(|content| TodoFields {
            content: Some(content.to_string()),
            done: None,
        });
        let posts = [
            ("First Post", "This is the content of the first post", "Alice"),
            ("Second Post", "Here comes the content for the second post", "Bob"),
            ("Third Post", "Content of the third post goes here", "David"),
            ("Another Post", "Some content by Charlie", "Charlie"),
            ("A New Post", "A new content piece for testing", "Bob"),
        ]
        .map(|(title, content, author)| PostFields {
            title: Some(title.to_string()),
            content: Some(content.to_string()),
            author: Some(author.to_string()),
        });
        seed_collection(&self.todos, todos).await?;
        seed_collection(&self.posts, posts).await?;
        Ok(())
    }
}

async fn seed_collection<T: Record>(
    repo: &Shared<T>,
    records: impl IntoIterator<Item = T::Fields>,
) -> Result<()> {
    let mut repo = repo.write().await;
    if !repo.list(&ListQuery::default())?.is_empty() {
        return Ok(());
    }
    for fields in records {
        repo.create(fields)?;
    }
    tracing::debug!("seeded {}", T::COLLECTION);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load();

    // initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let state = match &config.db_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "using sled storage");
            AppState::open(path)?
        }
        None => AppState::in_memory(),
    };
    if config.seed {
        state.seed().await?;
    }

    let addr = config.addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server is running");
    axum::serve(listener, app(state)).await?;
    Ok(())
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/todos", routes::routes(state.todos))
        .nest("/posts", routes::routes(state.posts))
        .layer(middleware::from_fn(cors))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// allow any origin; preflight requests stop here
async fn cors(request: Request, next: Next) -> Response {
    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET,POST,PATCH,DELETE,OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    response
}

// Tests
#[cfg(test)]
mod tests {
    use axum::body::{self, Body};
    use serde_json::{json, Value};
    use tower::ServiceExt; // for `oneshot`

    use super::*;
    use crate::repository::{Repository, StoreError, StoreResult};

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = axum::http::Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn seeded() -> Router {
        let state = AppState::in_memory();
        state.seed().await.unwrap();
        app(state)
    }

    #[tokio::test]
    async fn test_todo_lifecycle() {
        let app = app(AppState::in_memory());

        let (status, json) = send(&app, "POST", "/todos", Some(json!({"content": "Buy milk"}))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["message"], "New Todo created!");
        assert_eq!(json["data"]["done"], false);
        let id = json["data"]["id"].as_u64().unwrap();

        let (status, json) = send(&app, "GET", &format!("/todos/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({"todo": {"id": id, "content": "Buy milk", "done": false}}));

        let (status, json) = send(&app, "DELETE", &format!("/todos/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Todo deleted!");

        let (status, json) = send(&app, "GET", &format!("/todos/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "Todo not found");
    }

    #[tokio::test]
    async fn test_created_ids_increase() {
        let app = seeded().await;
        let (_, list) = send(&app, "GET", "/todos", None).await;
        let max = list
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|t| t["id"].as_u64())
            .max()
            .unwrap();
        let (_, json) = send(&app, "POST", "/todos", Some(json!({"content": ""}))).await;
        assert!(json["data"]["id"].as_u64().unwrap() > max);
    }

    #[tokio::test]
    async fn test_create_todo_requires_content() {
        let app = app(AppState::in_memory());
        let (status, json) = send(&app, "POST", "/todos", Some(json!({"done": true}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Content is required");

        let (_, list) = send(&app, "GET", "/todos", None).await;
        assert_eq!(list, json!([]));
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let app = app(AppState::in_memory());
        let (status, json) = send(&app, "POST", "/todos", Some(json!({"content": 5}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn test_patch_todo() {
        let app = seeded().await;
        let (status, json) = send(&app, "PATCH", "/todos/1", Some(json!({"content": "Städa"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Content and Done are required");

        let body = json!({"content": "Städa", "done": true});
        let (status, json) = send(&app, "PATCH", "/todos/1", Some(body.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Todo updated");
        assert_eq!(json["data"], json!({"id": 1, "content": "Städa", "done": true}));

        let (status, _) = send(&app, "PATCH", "/todos/999", Some(body.clone())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, "PATCH", "/todos/abc", Some(body)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, "PATCH", "/todos/abc", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_todos_search_and_sort() {
        let app = seeded().await;
        let (status, json) = send(&app, "GET", "/todos?sort=asc", None).await;
        assert_eq!(status, StatusCode::OK);
        let contents: Vec<&str> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["content"].as_str().unwrap())
            .collect();
        assert_eq!(contents, ["Chilla", "Festa", "Jobba", "Släng sopor"]);

        let (_, json) = send(&app, "GET", "/todos?search=ba", None).await;
        assert_eq!(json, json!([{"id": 3, "content": "Jobba", "done": false}]));
        let (_, json) = send(&app, "GET", "/todos?search=JOBBA", None).await;
        assert_eq!(json, json!([]));

        // sorting a view leaves stored order alone
        let (_, json) = send(&app, "GET", "/todos", None).await;
        assert_eq!(json[0]["content"], "Släng sopor");
    }

    #[tokio::test]
    async fn test_list_posts_by_author() {
        let app = seeded().await;
        let (status, json) = send(&app, "GET", "/posts?search=bob&sort=desc", None).await;
        assert_eq!(status, StatusCode::OK);
        let titles: Vec<&str> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, ["Second Post", "A New Post"]);
    }

    #[tokio::test]
    async fn test_post_crud() {
        let app = seeded().await;
        let (status, json) = send(&app, "GET", "/posts/2", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["post"]["author"], "Bob");

        let (status, json) = send(
            &app,
            "POST",
            "/posts",
            Some(json!({"title": "Hej", "content": "", "author": "Eve"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Title, content, and author are required");

        let (status, json) = send(
            &app,
            "POST",
            "/posts",
            Some(json!({"title": "Hej", "content": "Hallå", "author": "Eve"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["message"], "New Post created!");
        let id = json["data"]["id"].as_u64().unwrap();

        let (status, json) = send(
            &app,
            "PATCH",
            &format!("/posts/{}", id),
            Some(json!({"title": "Hej då", "content": "", "author": "Eve"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Post updated");
        assert_eq!(json["data"]["title"], "Hej då");

        let (status, json) = send(&app, "PATCH", "/posts/1", Some(json!({"title": "x"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Title, Content and Author are required");

        let (status, json) = send(&app, "DELETE", &format!("/posts/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Post deleted!");

        let (status, json) = send(&app, "DELETE", &format!("/posts/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "Post not found");
    }

    #[tokio::test]
    async fn test_ids_read_leading_number() {
        let app = seeded().await;
        let (status, json) = send(&app, "GET", "/todos/2abc", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["todo"]["content"], "Chilla");

        let (status, json) = send(&app, "GET", "/posts/1.5", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["post"]["title"], "First Post");

        let body = json!({"content": "Städa", "done": true});
        let (status, json) = send(&app, "PATCH", "/todos/3x", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["id"], 3);

        let (status, _) = send(&app, "DELETE", "/todos/x3", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_repeated_query_keys_still_filter() {
        let app = seeded().await;
        let (status, json) = send(&app, "GET", "/posts?search=bob&search=alice", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!([]));

        // a repeated sort is not a sort request
        let (_, json) = send(&app, "GET", "/todos?sort=asc&sort=asc", None).await;
        assert_eq!(json[0]["content"], "Släng sopor");
    }

    struct Broken;

    impl Repository<Todo> for Broken {
        fn list(&self, _: &ListQuery) -> StoreResult<Vec<Todo>> {
            Err(StoreError::Backend(anyhow::anyhow!("disk on fire")))
        }
        fn get(&self, _: u64) -> StoreResult<Todo> {
            Err(StoreError::Backend(anyhow::anyhow!("disk on fire")))
        }
        fn create(&mut self, _: TodoFields) -> StoreResult<Todo> {
            Err(StoreError::Backend(anyhow::anyhow!("disk on fire")))
        }
        fn update(&mut self, _: u64, _: TodoFields) -> StoreResult<Todo> {
            Err(StoreError::Backend(anyhow::anyhow!("disk on fire")))
        }
        fn delete(&mut self, _: u64) -> StoreResult<()> {
            Err(StoreError::Backend(anyhow::anyhow!("disk on fire")))
        }
    }

    #[tokio::test]
    async fn test_store_failures_return_generic_500() {
        let app = app(AppState {
            todos: shared(Broken),
            posts: shared(MemoryRepository::<Post>::new()),
        });
        let patch = json!({"content": "x", "done": false});
        let cases = [
            ("GET", "/todos", None, "Failed to retrieve todos"),
            ("GET", "/todos/1", None, "Failed to retrieve todo"),
            ("POST", "/todos", Some(json!({"content": "x"})), "Failed to create todo"),
            ("PATCH", "/todos/1", Some(patch), "Failed to update todo"),
            ("DELETE", "/todos/1", None, "Failed to delete todo"),
        ];
        for (method, uri, body, message) in cases {
            let (status, json) = send(&app, method, uri, body).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{} {}", method, uri);
            assert_eq!(json, json!({"error": message}));
            assert!(!json.to_string().contains("disk on fire"));
        }

        // the other collection is unaffected
        let (status, _) = send(&app, "GET", "/posts", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_cors_and_health() {
        let app = app(AppState::in_memory());
        let request = axum::http::Request::builder()
            .method("OPTIONS")
            .uri("/todos")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");

        let (status, json) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_sled_state_seeds_once() -> Result<()> {
        let (path, db) = db::driver::tests::setup()?;
        drop(db);
        {
            let state = AppState::open(Path::new(&path))?;
            state.seed().await?;
            state.seed().await?;
            let app = app(state);
            let (_, json) = send(&app, "GET", "/posts", None).await;
            assert_eq!(json.as_array().map(Vec::len), Some(5));
        }
        std::fs::remove_dir_all(path)?;
        Ok(())
    }
}
