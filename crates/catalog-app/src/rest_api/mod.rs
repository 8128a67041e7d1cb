use axum::Router;

use crate::state::AppState;

pub mod game;
pub mod genre;
pub mod images;

/// All catalog routes, paths are absolute
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(genre::router())
        .merge(game::router())
        .merge(images::router())
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use http::{header, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt as _;

    use super::*;
    use crate::{service::tests::test_pool, state::AppConfig};

    struct TestApp {
        router: Router,
        images: tempfile::TempDir,
        _db: tempfile::TempDir,
    }

    async fn app() -> TestApp {
        let (pool, db) = test_pool().await;
        let images = tempfile::tempdir().unwrap();
        let config = AppConfig {
            images_dir: images.path().to_path_buf(),
            upload_limit_mb: 1,
        };
        let state = AppState::new(config, pool);
        TestApp {
            router: router().with_state(state),
            images,
            _db: db,
        }
    }

    async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Option<String>, Value) {
        let response = app.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|l| l.to_str().unwrap().to_string());
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or(Value::Null)
        };
        (status, location, value)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn post_form(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_genre_routes() {
        let app = app().await;
        let (status, location, _) =
            send(&app, post_form("/genres/create", "name=Action&description=desc")).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        let genre_url = location.unwrap();
        assert!(genre_url.starts_with("/genres/genre/"));

        let (status, location, _) =
            send(&app, post_form("/genres/create", "name=Action&description=other")).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location.as_ref(), Some(&genre_url));

        let (status, _, view) = send(&app, get(&genre_url)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["view"], "genre_detail");
        assert_eq!(view["title"], "Action");
        assert_eq!(view["data"]["genre"]["url"], genre_url.as_str());

        let (status, _, view) = send(&app, post_form("/genres/create", "name=&description=d")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(view["view"], "genre_form");
        assert_eq!(view["data"]["errors"][0]["field"], "name");
        assert_eq!(view["data"]["errors"][0]["message"], "Genre name required");

        let (status, _, view) = send(&app, get("/genres/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["title"], "Genres catalog");
        assert_eq!(view["data"]["genre_list"].as_array().unwrap().len(), 1);

        let (status, _, view) = send(&app, get("/genres/genre/999")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(view["view"], "error");

        let (status, location, _) = send(&app, get("/genres/genre/999/delete")).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location.as_deref(), Some("/genres/"));
    }

    #[tokio::test]
    async fn test_game_multipart_create() {
        let app = app().await;
        let (_, location, _) =
            send(&app, post_form("/genres/create", "name=Action&description=desc")).await;
        let genre_id = location.unwrap().rsplit('/').next().unwrap().to_string();

        let boundary = "XxXboundaryXxX";
        let mut body = String::new();
        for (name, value) in [
            ("name", "Doom"),
            ("description", "Demons"),
            ("genre", genre_id.as_str()),
            ("price", "11.99"),
            ("stock", "11"),
        ] {
            body.push_str(&format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            ));
        }
        body.push_str(&format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"game_cover\"; filename=\"doom.png\"\r\nContent-Type: image/png\r\n\r\nPNGDATA\r\n--{boundary}--\r\n"
        ));
        let request = Request::post("/catalog/create")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();
        let (status, location, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        let game_url = location.unwrap();

        let (status, _, view) = send(&app, get(&game_url)).await;
        assert_eq!(status, StatusCode::OK);
        let game = &view["data"]["game"];
        assert_eq!(game["name"], "Doom");
        assert_eq!(game["number_in_stock"], 11);
        assert_eq!(game["img_name"], "doom.png");
        assert_eq!(game["genres"][0]["name"], "Action");
        assert!(app.images.path().join("doom.png").exists());

        let response = app.router.clone().oneshot(get("/images/doom.png")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        let data = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&data[..], b"PNGDATA");

        let (status, _, _) = send(&app, get("/images/missing.png")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_game_form_rejected() {
        let app = app().await;
        let (status, _, view) = send(
            &app,
            post_form("/catalog/create", "name=&description=d&price=1&stock=1"),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(view["title"], "Create game");
        assert_eq!(view["data"]["errors"][0]["message"], "Name must not be empty.");
        assert_eq!(view["data"]["game"]["description"], "d");

        let (_, _, view) = send(&app, get("/catalog/")).await;
        assert!(view["data"]["game_list"].as_array().unwrap().is_empty());

        let (status, location, _) = send(&app, post_form("/catalog/game/5/delete", "")).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location.as_deref(), Some("/catalog/"));
    }
}
