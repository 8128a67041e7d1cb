use axum::{
    response::{IntoResponse, Response},
    Json,
};
use catalog_dal::{genre::Genre, Resource};
use http::StatusCode;
use serde::Serialize;

/// Named view with data for rendering, rendering itself is up to the client
#[derive(Debug, Serialize)]
pub struct View<T> {
    pub view: &'static str,
    pub title: String,
    pub data: T,
    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> View<T> {
    pub fn new(view: &'static str, title: impl Into<String>, data: T) -> Self {
        View {
            view,
            title: title.into(),
            data,
            status: StatusCode::OK,
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

impl<T: Serialize> IntoResponse for View<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Record together with its canonical url
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Linked<T> {
    #[serde(flatten)]
    pub record: T,
    pub url: String,
}

impl<T: Resource> From<T> for Linked<T> {
    fn from(record: T) -> Self {
        let url = record.url();
        Linked { record, url }
    }
}

pub fn linked<T: Resource>(records: Vec<T>) -> Vec<Linked<T>> {
    records.into_iter().map(Linked::from).collect()
}

/// Genre offered on game form, `checked` if selected for the game
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GenreChoice {
    pub genre: Genre,
    pub checked: bool,
}

impl GenreChoice {
    pub fn for_selection(genres: Vec<Genre>, selected: &[String]) -> Vec<GenreChoice> {
        genres
            .into_iter()
            .map(|genre| {
                let id = genre.id.to_string();
                let checked = selected.iter().any(|s| *s == id);
                GenreChoice { genre, checked }
            })
            .collect()
    }
}

/// Game as submitted on form, values are kept as entered (after sanitization)
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct GameDraft {
    pub id: Option<i64>,
    pub name: String,
    pub description: String,
    pub genre: Vec<String>,
    pub price: String,
    pub number_in_stock: String,
    pub img_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GameFormView {
    pub game: GameDraft,
    pub genres: Vec<GenreChoice>,
}
