use bytes::Bytes;
use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::validate::{parse_price, parse_stock, required, sanitize, FormFields};

/// Inbound `genre` field, which can be missing, sent once or repeated
#[derive(Debug, Clone, Default, PartialEq)]
pub enum GenreSelection {
    #[default]
    Absent,
    Single(String),
    Many(Vec<String>),
}

impl GenreSelection {
    /// Adds next occurrence of the field
    pub fn push(self, value: impl Into<String>) -> Self {
        let value = value.into();
        match self {
            GenreSelection::Absent => GenreSelection::Single(value),
            GenreSelection::Single(first) => GenreSelection::Many(vec![first, value]),
            GenreSelection::Many(mut values) => {
                values.push(value);
                GenreSelection::Many(values)
            }
        }
    }

    pub fn into_list(self) -> Vec<String> {
        match self {
            GenreSelection::Absent => vec![],
            GenreSelection::Single(value) => vec![value],
            GenreSelection::Many(values) => values,
        }
    }
}

impl From<Vec<String>> for GenreSelection {
    fn from(values: Vec<String>) -> Self {
        values
            .into_iter()
            .fold(GenreSelection::Absent, GenreSelection::push)
    }
}

fn genre_name_required(value: &str, _ctx: &()) -> garde::Result {
    required(value, "Genre name required")
}

fn genre_description_required(value: &str, _ctx: &()) -> garde::Result {
    required(value, "Genre description required")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, PartialEq)]
#[serde(default)]
pub struct GenreInput {
    #[garde(custom(genre_name_required), length(chars, max = 100))]
    pub name: String,
    #[garde(custom(genre_description_required))]
    pub description: String,
}

impl FormFields for GenreInput {
    const FIELDS: &'static [&'static str] = &["name", "description"];
}

impl GenreInput {
    pub fn sanitized(self) -> Self {
        GenreInput {
            name: sanitize(&self.name),
            description: sanitize(&self.description),
        }
    }
}

impl From<GenreInput> for catalog_dal::genre::CreateGenre {
    fn from(input: GenreInput) -> Self {
        catalog_dal::genre::CreateGenre {
            name: input.name,
            description: input.description,
        }
    }
}

/// Uploaded cover image
#[derive(Debug, Clone)]
pub struct CoverUpload {
    pub file_name: String,
    pub data: Bytes,
}

/// Game form as received, before normalization and validation
#[derive(Debug, Clone, Default)]
pub struct GameForm {
    pub name: String,
    pub description: String,
    pub genre: GenreSelection,
    pub price: String,
    pub stock: String,
    pub cover: Option<CoverUpload>,
}

impl GameForm {
    /// Sets text field by its form name, unknown fields are ignored
    pub fn set_field(&mut self, name: &str, value: String) {
        match name {
            "name" => self.name = value,
            "description" => self.description = value,
            "genre" => self.genre = std::mem::take(&mut self.genre).push(value),
            "price" => self.price = value,
            "stock" => self.stock = value,
            _ => (),
        }
    }

    /// Splits form to sanitized input for validation and optional cover upload
    pub fn into_input(self) -> (GameInput, Option<CoverUpload>) {
        let input = GameInput {
            name: sanitize(&self.name),
            description: sanitize(&self.description),
            genre: self
                .genre
                .into_list()
                .iter()
                .map(|g| sanitize(g))
                .collect(),
            price: sanitize(&self.price),
            stock: sanitize(&self.stock),
        };
        (input, self.cover)
    }
}

fn name_required(value: &str, _ctx: &()) -> garde::Result {
    required(value, "Name must not be empty.")
}

fn description_required(value: &str, _ctx: &()) -> garde::Result {
    required(value, "Description must not be empty.")
}

fn valid_genres(values: &[String], _ctx: &()) -> garde::Result {
    if values.iter().all(|v| v.parse::<i64>().is_ok()) {
        Ok(())
    } else {
        Err(garde::Error::new("Invalid genre reference."))
    }
}

fn valid_price(value: &str, _ctx: &()) -> garde::Result {
    required(value, "Price must not be empty.")?;
    parse_price(value)
        .map(|_| ())
        .ok_or_else(|| garde::Error::new("Price must be a non-negative number."))
}

fn valid_stock(value: &str, _ctx: &()) -> garde::Result {
    required(value, "Stock must not be empty.")?;
    parse_stock(value)
        .map(|_| ())
        .ok_or_else(|| garde::Error::new("Stock must be a non-negative whole number."))
}

/// Normalized game form fields
#[derive(Debug, Clone, Default, Validate, PartialEq)]
pub struct GameInput {
    #[garde(custom(name_required), length(chars, max = 100))]
    pub name: String,
    #[garde(custom(description_required))]
    pub description: String,
    #[garde(custom(valid_genres))]
    pub genre: Vec<String>,
    #[garde(custom(valid_price))]
    pub price: String,
    #[garde(custom(valid_stock))]
    pub stock: String,
}

impl FormFields for GameInput {
    const FIELDS: &'static [&'static str] = &["name", "description", "genre", "price", "stock"];
}

impl GameInput {
    /// Distinct genre ids in order of selection, invalid values are skipped
    pub fn genre_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = Vec::with_capacity(self.genre.len());
        for id in self.genre.iter().filter_map(|g| g.parse::<i64>().ok()) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }

    pub fn price(&self) -> Option<f64> {
        parse_price(&self.price)
    }

    pub fn number_in_stock(&self) -> Option<i64> {
        parse_stock(&self.stock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::{field_errors, FieldError};

    #[test]
    fn test_genre_selection() {
        assert_eq!(GenreSelection::Absent.into_list(), Vec::<String>::new());
        assert_eq!(GenreSelection::Single("1".into()).into_list(), vec!["1"]);
        let selection = GenreSelection::Absent.push("1").push("2").push("3");
        assert_eq!(
            selection,
            GenreSelection::Many(vec!["1".into(), "2".into(), "3".into()])
        );
        assert_eq!(
            GenreSelection::from(vec!["4".to_string()]),
            GenreSelection::Single("4".into())
        );
        assert_eq!(GenreSelection::from(vec![]), GenreSelection::Absent);
    }

    #[test]
    fn test_genre_input() {
        let input = GenreInput {
            name: "  ".into(),
            description: "".into(),
        }
        .sanitized();
        let errors = field_errors::<GenreInput>(&input.validate().unwrap_err());
        assert_eq!(
            errors,
            vec![
                FieldError::new("name", "Genre name required"),
                FieldError::new("description", "Genre description required")
            ]
        );

        let input = GenreInput {
            name: " Action ".into(),
            description: "Hit & run".into(),
        }
        .sanitized();
        assert!(input.validate().is_ok());
        assert_eq!(input.name, "Action");
        assert_eq!(input.description, "Hit &amp; run");
    }

    #[test]
    fn test_name_length_counts_characters() {
        let input = GenreInput {
            name: "é".repeat(100),
            description: "accents".into(),
        };
        assert!(input.validate().is_ok());

        let input = GenreInput {
            name: "é".repeat(101),
            description: "accents".into(),
        };
        let errors = field_errors::<GenreInput>(&input.validate().unwrap_err());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "name");
    }

    #[test]
    fn test_game_form_fields() {
        let mut form = GameForm::default();
        form.set_field("name", " Doom ".into());
        form.set_field("genre", "2".into());
        form.set_field("genre", "1".into());
        form.set_field("genre", "2".into());
        form.set_field("unknown", "x".into());
        let (input, cover) = form.into_input();
        assert!(cover.is_none());
        assert_eq!(input.name, "Doom");
        assert_eq!(input.genre, vec!["2", "1", "2"]);
        assert_eq!(input.genre_ids(), vec![2, 1]);
    }

    #[test]
    fn test_game_input_errors() {
        let (input, _) = GameForm {
            genre: GenreSelection::Single("abc".into()),
            price: "free".into(),
            ..Default::default()
        }
        .into_input();
        let errors = field_errors::<GameInput>(&input.validate().unwrap_err());
        let fields = errors.iter().map(|e| e.field.as_str()).collect::<Vec<_>>();
        assert_eq!(fields, vec!["name", "description", "genre", "price", "stock"]);
        assert_eq!(errors[0].message, "Name must not be empty.");
        assert_eq!(errors[3].message, "Price must be a non-negative number.");
        assert_eq!(errors[4].message, "Stock must not be empty.");
    }

    #[test]
    fn test_absent_genre_is_valid() {
        let (input, _) = GameForm {
            name: "X".into(),
            description: "Y".into(),
            price: "9.99".into(),
            stock: "3".into(),
            ..Default::default()
        }
        .into_input();
        assert!(input.validate().is_ok());
        assert!(input.genre.is_empty());
        assert_eq!(input.price(), Some(9.99));
        assert_eq!(input.number_in_stock(), Some(3));
    }
}
