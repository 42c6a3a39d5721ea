use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::AppError;
use crate::models::Record;
use crate::repository::{ListQuery, Repository};

/// A collection shared between request handlers.
pub type Shared<T> = Arc<RwLock<Box<dyn Repository<T>>>>;

pub fn shared<T: Record>(repo: impl Repository<T> + 'static) -> Shared<T> {
    Arc::new(RwLock::new(Box::new(repo)))
}

/// CRUD routes for one resource, meant to be nested under `/<collection>`.
pub fn routes<T: Record>(repo: Shared<T>) -> Router {
    Router::new()
        .route("/", get(list::<T>).post(create::<T>))
        .route(
            "/:id",
            get(fetch::<T>).patch(update::<T>).delete(remove::<T>),
        )
        .with_state(repo)
}

#[derive(Debug, Serialize)]
struct Saved<T> {
    message: String,
    data: T,
}

#[derive(Debug, Serialize)]
struct Message {
    message: String,
}

/// Reads the leading decimal number of a path id, so `2abc` and `1.5`
/// address records 2 and 1. Ids without one can't exist.
fn leading_id(raw: &str) -> Option<u64> {
    let rest = raw.trim_start();
    let rest = rest.strip_prefix('+').unwrap_or(rest);
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    rest[..end].parse().ok()
}

fn parse_id<T: Record>(raw: &str) -> Result<u64, AppError> {
    leading_id(raw).ok_or(AppError::NotFound(T::NAME))
}

fn body<F>(payload: Result<Json<F>, JsonRejection>) -> Result<F, AppError> {
    match payload {
        Ok(Json(fields)) => Ok(fields),
        Err(rejection) => Err(AppError::Validation(rejection.body_text())),
    }
}

// === Routes ===
async fn list<T: Record>(
    State(repo): State<Shared<T>>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<Vec<T>>, AppError> {
    let query = match query {
        Ok(Query(pairs)) => ListQuery::from_pairs(pairs),
        Err(rejection) => {
            tracing::debug!(%rejection, "ignoring undecodable list query");
            ListQuery::default()
        }
    };
    let repo = repo.read().await;
    let records = repo
        .list(&query)
        .map_err(|e| AppError::from_store::<T>(e, format!("Failed to retrieve {}", T::COLLECTION)))?;
    Ok(Json(records))
}

async fn fetch<T: Record>(
    State(repo): State<Shared<T>>,
    Path(id): Path<String>,
) -> Result<Json<HashMap<&'static str, T>>, AppError> {
    let id = parse_id::<T>(&id)?;
    let repo = repo.read().await;
    let record = repo
        .get(id)
        .map_err(|e| AppError::from_store::<T>(e, format!("Failed to retrieve {}", T::KEY)))?;
    Ok(Json(HashMap::from([(T::KEY, record)])))
}

async fn create<T: Record>(
    State(repo): State<Shared<T>>,
    payload: Result<Json<T::Fields>, JsonRejection>,
) -> Result<(StatusCode, Json<Saved<T>>), AppError> {
    let fields = body(payload)?;
    let mut repo = repo.write().await;
    let record = repo
        .create(fields)
        .map_err(|e| AppError::from_store::<T>(e, format!("Failed to create {}", T::KEY)))?;
    tracing::info!(id = record.id(), "created {}", T::KEY);
    Ok((
        StatusCode::CREATED,
        Json(Saved {
            message: format!("New {} created!", T::NAME),
            data: record,
        }),
    ))
}

async fn update<T: Record>(
    State(repo): State<Shared<T>>,
    Path(id): Path<String>,
    payload: Result<Json<T::Fields>, JsonRejection>,
) -> Result<Json<Saved<T>>, AppError> {
    let fields = body(payload)?;
    let Some(id) = leading_id(&id) else {
        // body problems are reported before unknown ids
        T::changes(fields).map_err(|e| AppError::Validation(e.0.to_string()))?;
        return Err(AppError::NotFound(T::NAME));
    };
    let mut repo = repo.write().await;
    let record = repo
        .update(id, fields)
        .map_err(|e| AppError::from_store::<T>(e, format!("Failed to update {}", T::KEY)))?;
    tracing::info!(id, "updated {}", T::KEY);
    Ok(Json(Saved {
        message: format!("{} updated", T::NAME),
        data: record,
    }))
}

async fn remove<T: Record>(
    State(repo): State<Shared<T>>,
    Path(id): Path<String>,
) -> Result<Json<Message>, AppError> {
    let id = parse_id::<T>(&id)?;
    let mut repo = repo.write().await;
    repo.delete(id)
        .map_err(|e| AppError::from_store::<T>(e, format!("Failed to delete {}", T::KEY)))?;
    tracing::info!(id, "deleted {}", T::KEY);
    Ok(Json(Message {
        message: format!("{} deleted!", T::NAME),
    }))
}
