use std::collections::HashMap;

use crate::{
    ChosenDB, Error, ListingParams, Resource,
    error::{Result, is_foreign_key_violation},
    genre::{Genre, GenreShort},
};
use futures::{StreamExt as _, TryStreamExt as _};
use garde::Validate;
use serde::{Deserialize, Serialize};
use sqlx::{Acquire, Executor, Pool, SqliteConnection};
use tracing::debug;

const VALID_ORDER_FIELDS: &[&str] = &["id", "name", "price", "number_in_stock"];

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct CreateGame {
    #[garde(length(chars, min = 1, max = 100))]
    pub name: String,
    #[garde(length(min = 1))]
    pub description: String,
    #[garde(skip)]
    pub genres: Vec<i64>,
    #[garde(range(min = 0.0))]
    pub price: f64,
    #[garde(range(min = 0))]
    pub number_in_stock: i64,
    #[garde(inner(length(min = 1, max = 255)))]
    pub img_name: Option<String>,
}

/// For update `img_name: None` keeps stored cover image
pub type UpdateGame = CreateGame;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, sqlx::FromRow)]
pub struct Game {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub number_in_stock: i64,
    pub img_name: Option<String>,
    #[sqlx(skip)]
    pub genres: Vec<Genre>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, sqlx::FromRow)]
pub struct GameShort {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub number_in_stock: i64,
    pub img_name: Option<String>,
    #[sqlx(skip)]
    pub genres: Vec<GenreShort>,
}

impl Resource for Game {
    fn url(&self) -> String {
        game_url(self.id)
    }
}

impl Resource for GameShort {
    fn url(&self) -> String {
        game_url(self.id)
    }
}

pub fn game_url(id: i64) -> String {
    format!("/catalog/game/{id}")
}

async fn link_genres(game_id: i64, genres: &[i64], conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query("DELETE FROM game_genre WHERE game_id = ?")
        .bind(game_id)
        .execute(&mut *conn)
        .await?;
    for genre_id in genres {
        sqlx::query("INSERT OR IGNORE INTO game_genre (game_id, genre_id) VALUES (?, ?)")
            .bind(game_id)
            .bind(genre_id)
            .execute(&mut *conn)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if is_foreign_key_violation(&**db) => {
                    debug!("Game {game_id} references missing genre {genre_id}");
                    Error::InvalidReference("Genre".to_string())
                }
                e => e.into(),
            })?;
    }
    Ok(())
}

pub type GameRepository = GameRepositoryImpl<Pool<ChosenDB>>;

pub struct GameRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> GameRepositoryImpl<E>
where
    for<'a> &'a E: Executor<'c, Database = ChosenDB> + Acquire<'c, Database = ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    /// Game row and its genre links are written together or not at all
    pub async fn create(&self, payload: CreateGame) -> Result<Game> {
        payload.validate()?;
        let mut transaction = self.executor.begin().await?;
        let result = sqlx::query(
            "INSERT INTO game (name, description, price, number_in_stock, img_name) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&payload.name)
        .bind(&payload.description)
        .bind(payload.price)
        .bind(payload.number_in_stock)
        .bind(&payload.img_name)
        .execute(&mut *transaction)
        .await?;

        let id = result.last_insert_rowid();
        link_genres(id, &payload.genres, &mut transaction).await?;
        transaction.commit().await?;
        debug!("Created game {id}");
        self.get(id).await
    }

    pub async fn update(&self, id: i64, payload: UpdateGame) -> Result<Game> {
        payload.validate()?;
        let mut transaction = self.executor.begin().await?;
        let result = sqlx::query(
            "UPDATE game SET name = ?, description = ?, price = ?, number_in_stock = ?,
            img_name = COALESCE(?, img_name) WHERE id = ?",
        )
        .bind(&payload.name)
        .bind(&payload.description)
        .bind(payload.price)
        .bind(payload.number_in_stock)
        .bind(&payload.img_name)
        .bind(id)
        .execute(&mut *transaction)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::RecordNotFound("Game".to_string()));
        }
        link_genres(id, &payload.genres, &mut transaction).await?;
        transaction.commit().await?;
        self.get(id).await
    }

    pub async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT count(*) FROM game")
            .fetch_one(&self.executor)
            .await?;
        Ok(count as u64)
    }

    /// All games sorted by name, genres resolved
    pub async fn list_all(&self) -> Result<Vec<GameShort>> {
        self.list(ListingParams::by_name()).await
    }

    pub async fn list(&self, params: ListingParams) -> Result<Vec<GameShort>> {
        let order = params.ordering(VALID_ORDER_FIELDS)?;
        let mut records = sqlx::query_as::<_, GameShort>(&format!(
            "SELECT id, name, price, number_in_stock, img_name FROM game {order} LIMIT ? OFFSET ?"
        ))
        .bind(params.limit)
        .bind(params.offset)
        .fetch(&self.executor)
        .take(crate::MAX_LIMIT)
        .try_collect::<Vec<_>>()
        .await?;
        self.resolve_genres(&mut records).await?;
        Ok(records)
    }

    /// Games referencing given genre, sorted by name
    pub async fn list_by_genre(&self, genre_id: i64) -> Result<Vec<GameShort>> {
        let mut records = sqlx::query_as::<_, GameShort>(
            "SELECT g.id, g.name, g.price, g.number_in_stock, g.img_name FROM game g
            JOIN game_genre gg ON gg.game_id = g.id
            WHERE gg.genre_id = ?
            ORDER BY g.name",
        )
        .bind(genre_id)
        .fetch(&self.executor)
        .take(crate::MAX_LIMIT)
        .try_collect::<Vec<_>>()
        .await?;
        self.resolve_genres(&mut records).await?;
        Ok(records)
    }

    async fn resolve_genres(&self, games: &mut [GameShort]) -> Result<()> {
        if games.is_empty() {
            return Ok(());
        }
        let mut links: HashMap<i64, Vec<GenreShort>> = HashMap::new();
        let mut rows = sqlx::query_as::<_, (i64, i64, String)>(
            "SELECT gg.game_id, g.id, g.name FROM game_genre gg
            JOIN genre g ON g.id = gg.genre_id
            ORDER BY g.name",
        )
        .fetch(&self.executor);
        while let Some((game_id, id, name)) = rows.try_next().await? {
            links
                .entry(game_id)
                .or_default()
                .push(GenreShort { id, name });
        }
        for game in games.iter_mut() {
            game.genres = links.remove(&game.id).unwrap_or_default();
        }
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let res = sqlx::query("DELETE FROM game WHERE id = ?")
            .bind(id)
            .execute(&self.executor)
            .await?;

        if res.rows_affected() == 0 {
            Err(Error::RecordNotFound("Game".to_string()))
        } else {
            Ok(())
        }
    }

    /// Game with genres resolved to full records
    pub async fn get(&self, id: i64) -> Result<Game> {
        let mut game = sqlx::query_as::<_, Game>(
            "SELECT id, name, description, price, number_in_stock, img_name FROM game WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.executor)
        .await?
        .ok_or_else(|| Error::RecordNotFound("Game".to_string()))?;

        game.genres = sqlx::query_as::<_, Genre>(
            "SELECT g.id, g.name, g.description FROM genre g
            JOIN game_genre gg ON gg.genre_id = g.id
            WHERE gg.game_id = ?
            ORDER BY g.name",
        )
        .bind(id)
        .fetch_all(&self.executor)
        .await?;
        Ok(game)
    }
}
