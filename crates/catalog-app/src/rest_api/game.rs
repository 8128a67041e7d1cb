use axum::{
    extract::{FromRequest, Multipart, Path, Request},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use catalog_dal::Resource as _;
use http::{header::CONTENT_TYPE, StatusCode};
use serde_json::json;
use tracing::debug;

use crate::{
    error::{ApiError, ApiResult},
    form::{CoverUpload, GameForm},
    service::{game::GameSubmission, GameService},
    state::AppState,
    view::{linked, Linked, View},
};

crate::service_from_request!(GameService);

pub const CATALOG_URL: &str = "/catalog/";
const COVER_FIELD: &str = "game_cover";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/catalog", get(list))
        .route(CATALOG_URL, get(list))
        .route("/catalog/create", get(create_form).post(create))
        .route("/catalog/game/{id}", get(detail))
        .route("/catalog/game/{id}/update", get(update_form).post(update))
        .route("/catalog/game/{id}/delete", get(delete_form).post(delete))
}

/// Game form is accepted either as multipart (with optional cover image) or url encoded
impl FromRequest<AppState> for GameForm {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));
        let mut form = GameForm::default();

        if is_multipart {
            let mut multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
            while let Some(field) = multipart.next_field().await? {
                let Some(name) = field.name().map(str::to_string) else {
                    continue;
                };
                if name == COVER_FIELD {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let data = field.bytes().await?;
                    // browsers send empty part if no file was chosen
                    if !file_name.is_empty() && !data.is_empty() {
                        debug!("Received cover {file_name} of {} bytes", data.len());
                        form.cover = Some(CoverUpload { file_name, data });
                    }
                } else {
                    let value = field.text().await?;
                    form.set_field(&name, value);
                }
            }
        } else {
            let Form(fields) = Form::<Vec<(String, String)>>::from_request(req, state).await?;
            for (name, value) in fields {
                form.set_field(&name, value);
            }
        }
        Ok(form)
    }
}

pub async fn list(service: GameService) -> ApiResult<impl IntoResponse> {
    let games = service.list().await?;
    Ok(View::new(
        "game_list",
        "Games catalog",
        json!({ "game_list": linked(games) }),
    ))
}

pub async fn detail(Path(id): Path<i64>, service: GameService) -> ApiResult<impl IntoResponse> {
    let game = service.get(id).await?;
    Ok(View::new(
        "game_detail",
        game.name.clone(),
        json!({ "game": Linked::from(game) }),
    ))
}

pub async fn create_form(service: GameService) -> ApiResult<impl IntoResponse> {
    let form = service.form(None).await?;
    Ok(View::new(
        "game_form",
        "Add a game",
        json!({ "game": null, "genres": form.genres, "errors": [] }),
    ))
}

fn submission_response(outcome: GameSubmission, title: &'static str) -> Response {
    match outcome {
        GameSubmission::Saved(game) => Redirect::to(&game.url()).into_response(),
        GameSubmission::Rejected { form, errors } => View::new(
            "game_form",
            title,
            json!({ "game": form.game, "genres": form.genres, "errors": errors }),
        )
        .with_status(StatusCode::UNPROCESSABLE_ENTITY)
        .into_response(),
    }
}

pub async fn create(service: GameService, form: GameForm) -> ApiResult<Response> {
    let outcome = service.create(form).await?;
    Ok(submission_response(outcome, "Create game"))
}

pub async fn update_form(
    Path(id): Path<i64>,
    service: GameService,
) -> ApiResult<impl IntoResponse> {
    let form = service.form(Some(id)).await?;
    Ok(View::new(
        "game_form",
        "Update game",
        json!({ "game": form.game, "genres": form.genres, "errors": [] }),
    ))
}

pub async fn update(
    Path(id): Path<i64>,
    service: GameService,
    form: GameForm,
) -> ApiResult<Response> {
    let outcome = service.update(id, form).await?;
    Ok(submission_response(outcome, "Update game"))
}

pub async fn delete_form(Path(id): Path<i64>, service: GameService) -> ApiResult<Response> {
    match service.prepare_delete(id).await {
        Ok(game) => Ok(View::new(
            "game_delete",
            format!("Delete game: {}", game.name),
            json!({ "game": Linked::from(game) }),
        )
        .into_response()),
        Err(e) if e.is_not_found() => Ok(Redirect::to(CATALOG_URL).into_response()),
        Err(e) => Err(e),
    }
}

pub async fn delete(Path(id): Path<i64>, service: GameService) -> ApiResult<Response> {
    match service.delete(id).await {
        Ok(()) => debug!("Deleted game {id}"),
        Err(e) if e.is_not_found() => debug!("Game {id} was already gone"),
        Err(e) => return Err(e),
    }
    Ok(Redirect::to(CATALOG_URL).into_response())
}
