use super::{Entry, FromValidate, HttpError, Json, SharedState};
use crate::error::from_guard;
use crate::web::EntryState;

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;
use tracing::info;
use ulid::Ulid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
struct RawEntryBody {
    #[validate(required, length(min = 3, max = 255))]
    table_name: Option<String>,
    #[validate(required, url)]
    url: Option<String>,
}

#[derive(Debug)]
struct EntryBody {
    table_name: String,
    url: String,
}

impl FromValidate for EntryBody {
    type Validatable = RawEntryBody;

    fn from(b: RawEntryBody) -> EntryBody {
        EntryBody {
            table_name: b.table_name.unwrap_or_default(),
            url: b.url.unwrap_or_default(),
        }
    }
}

async fn index(State(state): State<SharedState>) -> Result<impl IntoResponse, HttpError> {
    let mut state = state.lock().map_err(from_guard)?;
    Ok(axum::response::Json(state.entry_states()))
}

async fn show(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let mut state = state.lock().map_err(from_guard)?;

    state
        .iter_mut()
        .find(|(entry_id, _)| entry_id.as_str() == id.as_str())
        .map(|(_, entry)| {
            entry.check();
            axum::response::Json(EntryState::from(&*entry))
        })
        .ok_or(HttpError::NotFound(format!("Entry id: {id}")))
}

async fn register(
    State(state): State<SharedState>,
    Json(body): Json<EntryBody>,
) -> Result<impl IntoResponse, HttpError> {
    let EntryBody { table_name, url } = body;

    let context = {
        let state = state.lock().map_err(from_guard)?;
        state.context()
    };
    let watch = context.start(&table_name, &url).await?;

    let id = Ulid::new().to_string();
    info!("Register entry {id}: {table_name} -> {url}");

    let mut entry = Entry::new(table_name, url);
    entry.start(watch);

    let mut state = state.lock().map_err(from_guard)?;
    state.insert(&id, entry);

    Ok(id)
}

async fn deregister(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let mut state = state.lock().map_err(from_guard)?;

    state
        .remove(&id)
        .ok_or(HttpError::NotFound(format!("Entry id: {id}")))
        .map(|_| {
            info!("Deregister entry {id}");
            id
        })
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/:id", get(show))
        .route("/:id", delete(deregister))
        .route("/", get(index))
        .route("/", post(register))
        .with_state(state)
}
