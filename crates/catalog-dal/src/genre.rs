use crate::{ChosenDB, Error, ListingParams, Resource, error::Result};
use futures::{StreamExt as _, TryStreamExt as _};
use garde::Validate;
use serde::{Deserialize, Serialize};
use sqlx::Pool;
use tracing::debug;

const VALID_ORDER_FIELDS: &[&str] = &["id", "name"];

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct CreateGenre {
    #[garde(length(chars, min = 1, max = 100))]
    pub name: String,
    #[garde(length(min = 1))]
    pub description: String,
}

pub type UpdateGenre = CreateGenre;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, sqlx::FromRow)]
pub struct Genre {
    pub id: i64,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, sqlx::FromRow)]
pub struct GenreShort {
    pub id: i64,
    pub name: String,
}

impl Resource for Genre {
    fn url(&self) -> String {
        genre_url(self.id)
    }
}

impl Resource for GenreShort {
    fn url(&self) -> String {
        genre_url(self.id)
    }
}

pub fn genre_url(id: i64) -> String {
    format!("/genres/genre/{id}")
}

pub type GenreRepository = GenreRepositoryImpl<Pool<ChosenDB>>;

pub struct GenreRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> GenreRepositoryImpl<E>
where
    for<'a> &'a E: sqlx::Executor<'c, Database = ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub async fn create(&self, payload: CreateGenre) -> Result<Genre> {
        payload.validate()?;
        let result = sqlx::query("INSERT INTO genre (name, description) VALUES (?, ?)")
            .bind(&payload.name)
            .bind(&payload.description)
            .execute(&self.executor)
            .await
            .map_err(Error::constraint("Genre"))?;

        let id = result.last_insert_rowid();
        debug!("Created genre {id}");
        self.get(id).await
    }

    pub async fn update(&self, id: i64, payload: UpdateGenre) -> Result<Genre> {
        payload.validate()?;
        let result = sqlx::query("UPDATE genre SET name = ?, description = ? WHERE id = ?")
            .bind(&payload.name)
            .bind(&payload.description)
            .bind(id)
            .execute(&self.executor)
            .await
            .map_err(Error::constraint("Genre"))?;

        if result.rows_affected() == 0 {
            Err(Error::RecordNotFound("Genre".to_string()))
        } else {
            self.get(id).await
        }
    }

    pub async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT count(*) FROM genre")
            .fetch_one(&self.executor)
            .await?;
        Ok(count as u64)
    }

    /// All genres sorted by name
    pub async fn list_all(&self) -> Result<Vec<GenreShort>> {
        self.list(ListingParams::by_name()).await
    }

    pub async fn list(&self, params: ListingParams) -> Result<Vec<GenreShort>> {
        let order = params.ordering(VALID_ORDER_FIELDS)?;
        let records = sqlx::query_as::<_, GenreShort>(&format!(
            "SELECT id, name FROM genre {order} LIMIT ? OFFSET ?"
        ))
        .bind(params.limit)
        .bind(params.offset)
        .fetch(&self.executor)
        .take(crate::MAX_LIMIT)
        .try_collect::<Vec<_>>()
        .await?;
        Ok(records)
    }

    /// Full records of all genres sorted by name, as offered on game forms
    pub async fn list_full(&self) -> Result<Vec<Genre>> {
        let records = sqlx::query_as::<_, Genre>(
            "SELECT id, name, description FROM genre ORDER BY name LIMIT ?",
        )
        .bind(crate::MAX_LIMIT as i64)
        .fetch_all(&self.executor)
        .await?;
        Ok(records)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let res = sqlx::query("DELETE FROM genre WHERE id = ?")
            .bind(id)
            .execute(&self.executor)
            .await
            .map_err(Error::constraint("Genre"))?;

        if res.rows_affected() == 0 {
            Err(Error::RecordNotFound("Genre".to_string()))
        } else {
            Ok(())
        }
    }

    pub async fn get(&self, id: i64) -> Result<Genre> {
        sqlx::query_as::<_, Genre>("SELECT id, name, description FROM genre WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.executor)
            .await?
            .ok_or_else(|| Error::RecordNotFound("Genre".to_string()))
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<Genre>> {
        let record =
            sqlx::query_as::<_, Genre>("SELECT id, name, description FROM genre WHERE name = ?")
                .bind(name)
                .fetch_optional(&self.executor)
                .await?;
        Ok(record)
    }

    /// Returns those of given ids, which exist
    pub async fn existing_ids(&self, ids: &[i64]) -> Result<Vec<i64>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let mut query = sqlx::QueryBuilder::<ChosenDB>::new("SELECT id FROM genre WHERE id IN (");
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");
        let found = query
            .build_query_scalar::<i64>()
            .fetch_all(&self.executor)
            .await?;
        Ok(found)
    }
}
