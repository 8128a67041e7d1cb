use axum::{
    extract::{rejection::FormRejection, Path},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use catalog_dal::Resource as _;
use http::StatusCode;
use serde_json::json;
use tracing::debug;

use crate::{
    error::ApiResult,
    form::GenreInput,
    service::{
        genre::{GenreDeletion, GenreSubmission, GenreUpdate, GenreUsage},
        GenreService,
    },
    state::AppState,
    view::{linked, Linked, View},
};

crate::service_from_request!(GenreService);

pub const GENRES_URL: &str = "/genres/";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/genres", get(list))
        .route(GENRES_URL, get(list))
        .route("/genres/create", get(create_form).post(create))
        .route("/genres/genre/{id}", get(detail))
        .route("/genres/genre/{id}/update", get(update_form).post(update))
        .route("/genres/genre/{id}/delete", get(delete_form).post(delete))
}

pub async fn list(service: GenreService) -> ApiResult<impl IntoResponse> {
    let genres = service.list().await?;
    Ok(View::new(
        "genre_list",
        "Genres catalog",
        json!({ "genre_list": linked(genres) }),
    ))
}

pub async fn detail(Path(id): Path<i64>, service: GenreService) -> ApiResult<impl IntoResponse> {
    let genre = service.get(id).await?;
    Ok(View::new(
        "genre_detail",
        genre.name.clone(),
        json!({ "genre": Linked::from(genre) }),
    ))
}

pub async fn create_form() -> impl IntoResponse {
    View::new(
        "genre_form",
        "Create Genre",
        json!({ "genre": null, "errors": [] }),
    )
}

pub async fn create(
    service: GenreService,
    form: Result<Form<GenreInput>, FormRejection>,
) -> ApiResult<Response> {
    let Form(input) = form?;
    let response = match service.create(input).await? {
        GenreSubmission::Created(genre) | GenreSubmission::Existing(genre) => {
            Redirect::to(&genre.url()).into_response()
        }
        GenreSubmission::Rejected { draft, errors } => View::new(
            "genre_form",
            "Create Genre",
            json!({ "genre": draft, "errors": errors }),
        )
        .with_status(StatusCode::UNPROCESSABLE_ENTITY)
        .into_response(),
    };
    Ok(response)
}

pub async fn update_form(
    Path(id): Path<i64>,
    service: GenreService,
) -> ApiResult<impl IntoResponse> {
    let genre = service.get(id).await?;
    Ok(View::new(
        "genre_form",
        "Update Genre",
        json!({ "genre": genre, "errors": [] }),
    ))
}

pub async fn update(
    Path(id): Path<i64>,
    service: GenreService,
    form: Result<Form<GenreInput>, FormRejection>,
) -> ApiResult<Response> {
    let Form(input) = form?;
    let response = match service.update(id, input).await? {
        GenreUpdate::Saved(genre) => Redirect::to(&genre.url()).into_response(),
        GenreUpdate::Rejected { draft, errors } => View::new(
            "genre_form",
            "Update Genre",
            json!({
                "genre": { "id": id, "name": draft.name, "description": draft.description },
                "errors": errors
            }),
        )
        .with_status(StatusCode::UNPROCESSABLE_ENTITY)
        .into_response(),
    };
    Ok(response)
}

fn delete_view(usage: GenreUsage) -> View<serde_json::Value> {
    View::new(
        "genre_delete",
        format!("Delete Genre: {}", usage.genre.name),
        json!({ "genre": Linked::from(usage.genre), "games": linked(usage.games) }),
    )
}

pub async fn delete_form(Path(id): Path<i64>, service: GenreService) -> ApiResult<Response> {
    match service.prepare_delete(id).await {
        Ok(usage) => Ok(delete_view(usage).into_response()),
        Err(e) if e.is_not_found() => Ok(Redirect::to(GENRES_URL).into_response()),
        Err(e) => Err(e),
    }
}

pub async fn delete(Path(id): Path<i64>, service: GenreService) -> ApiResult<Response> {
    match service.confirm_delete(id).await {
        Ok(GenreDeletion::Deleted) => {
            debug!("Deleted genre {id}");
            Ok(Redirect::to(GENRES_URL).into_response())
        }
        Ok(GenreDeletion::Blocked { genre, games }) => {
            Ok(delete_view(GenreUsage { genre, games }).into_response())
        }
        Err(e) if e.is_not_found() => Ok(Redirect::to(GENRES_URL).into_response()),
        Err(e) => Err(e),
    }
}
