use catalog_dal::{
    game::{GameRepository, GameShort},
    genre::{Genre, GenreRepository, GenreShort},
    Error, Pool,
};
use garde::Validate as _;
use serde::Serialize;
use tracing::debug;

use crate::{
    error::ApiResult,
    form::GenreInput,
    validate::{field_errors, FieldError},
};

const NAME_TAKEN: &str = "Genre with this name already exists";

#[derive(Debug)]
pub enum GenreSubmission {
    Created(Genre),
    /// Genre with same name was already there, nothing was created
    Existing(Genre),
    Rejected {
        draft: GenreInput,
        errors: Vec<FieldError>,
    },
}

#[derive(Debug)]
pub enum GenreUpdate {
    Saved(Genre),
    Rejected {
        draft: GenreInput,
        errors: Vec<FieldError>,
    },
}

#[derive(Debug)]
pub enum GenreDeletion {
    Deleted,
    Blocked { genre: Genre, games: Vec<GameShort> },
}

/// Genre with all games referencing it
#[derive(Debug, Serialize)]
pub struct GenreUsage {
    pub genre: Genre,
    pub games: Vec<GameShort>,
}

pub struct GenreService {
    genres: GenreRepository,
    games: GameRepository,
}

impl GenreService {
    pub fn new(pool: Pool) -> Self {
        GenreService {
            genres: GenreRepository::new(pool.clone()),
            games: GameRepository::new(pool),
        }
    }

    /// Sorted by name
    pub async fn list(&self) -> ApiResult<Vec<GenreShort>> {
        Ok(self.genres.list_all().await?)
    }

    pub async fn get(&self, id: i64) -> ApiResult<Genre> {
        Ok(self.genres.get(id).await?)
    }

    /// Creates genre unless one with the same name exists already
    pub async fn create(&self, input: GenreInput) -> ApiResult<GenreSubmission> {
        let draft = input.sanitized();
        if let Err(report) = draft.validate() {
            return Ok(GenreSubmission::Rejected {
                errors: field_errors::<GenreInput>(&report),
                draft,
            });
        }

        if let Some(existing) = self.genres.find_by_name(&draft.name).await? {
            debug!("Genre {} already exists as {}", draft.name, existing.id);
            return Ok(GenreSubmission::Existing(existing));
        }

        match self.genres.create(draft.clone().into()).await {
            Ok(genre) => Ok(GenreSubmission::Created(genre)),
            Err(Error::AlreadyExists(_)) => {
                // concurrent create with same name won
                let existing = self
                    .genres
                    .find_by_name(&draft.name)
                    .await?
                    .ok_or_else(|| Error::RecordNotFound("Genre".to_string()))?;
                Ok(GenreSubmission::Existing(existing))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn update(&self, id: i64, input: GenreInput) -> ApiResult<GenreUpdate> {
        let draft = input.sanitized();
        if let Err(report) = draft.validate() {
            return Ok(GenreUpdate::Rejected {
                errors: field_errors::<GenreInput>(&report),
                draft,
            });
        }

        let name_taken = self
            .genres
            .find_by_name(&draft.name)
            .await?
            .is_some_and(|other| other.id != id);
        if name_taken {
            return Ok(GenreUpdate::Rejected {
                draft,
                errors: vec![FieldError::new("name", NAME_TAKEN)],
            });
        }

        match self.genres.update(id, draft.clone().into()).await {
            Ok(genre) => Ok(GenreUpdate::Saved(genre)),
            Err(Error::AlreadyExists(_)) => Ok(GenreUpdate::Rejected {
                draft,
                errors: vec![FieldError::new("name", NAME_TAKEN)],
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Genre with games, which would block its deletion
    pub async fn prepare_delete(&self, id: i64) -> ApiResult<GenreUsage> {
        let genre = self.genres.get(id).await?;
        let games = self.games.list_by_genre(id).await?;
        Ok(GenreUsage { genre, games })
    }

    /// Deletes genre only if no game references it
    pub async fn confirm_delete(&self, id: i64) -> ApiResult<GenreDeletion> {
        let GenreUsage { genre, games } = self.prepare_delete(id).await?;
        if !games.is_empty() {
            debug!("Genre {id} is used by {} games", games.len());
            return Ok(GenreDeletion::Blocked { genre, games });
        }

        match self.genres.delete(id).await {
            Ok(()) => Ok(GenreDeletion::Deleted),
            Err(Error::StillReferenced(_)) => {
                // game was linked after the check
                let games = self.games.list_by_genre(id).await?;
                Ok(GenreDeletion::Blocked { genre, games })
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::tests::test_pool;
    use catalog_dal::game::CreateGame;

    fn input(name: &str, description: &str) -> GenreInput {
        GenreInput {
            name: name.to_string(),
            description: description.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (pool, _tmp) = test_pool().await;
        let service = GenreService::new(pool);
        let genre = match service.create(input("Action", "desc")).await.unwrap() {
            GenreSubmission::Created(genre) => genre,
            other => panic!("Unexpected outcome {other:?}"),
        };
        let loaded = service.get(genre.id).await.unwrap();
        assert_eq!(loaded.name, "Action");
        assert_eq!(loaded.description, "desc");
    }

    #[tokio::test]
    async fn test_create_same_name_twice() {
        let (pool, _tmp) = test_pool().await;
        let service = GenreService::new(pool);
        let first = match service.create(input("Action", "first")).await.unwrap() {
            GenreSubmission::Created(genre) => genre,
            other => panic!("Unexpected outcome {other:?}"),
        };
        match service.create(input(" Action ", "second")).await.unwrap() {
            GenreSubmission::Existing(genre) => {
                assert_eq!(genre.id, first.id);
                assert_eq!(genre.description, "first");
            }
            other => panic!("Unexpected outcome {other:?}"),
        }
        assert_eq!(service.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_rejected() {
        let (pool, _tmp) = test_pool().await;
        let service = GenreService::new(pool);
        match service.create(input("  ", "<i>desc</i>")).await.unwrap() {
            GenreSubmission::Rejected { draft, errors } => {
                assert_eq!(draft.description, "&lt;i&gt;desc&lt;&#x2F;i&gt;");
                assert_eq!(errors, vec![FieldError::new("name", "Genre name required")]);
            }
            other => panic!("Unexpected outcome {other:?}"),
        }
        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_multibyte_name() {
        let (pool, _tmp) = test_pool().await;
        let service = GenreService::new(pool);
        let name = "é".repeat(60);
        match service.create(input(&name, "accents")).await.unwrap() {
            GenreSubmission::Created(genre) => {
                assert_eq!(genre.name, name);
                assert_eq!(service.get(genre.id).await.unwrap().name, name);
            }
            other => panic!("Unexpected outcome {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_update() {
        let (pool, _tmp) = test_pool().await;
        let service = GenreService::new(pool);
        let GenreSubmission::Created(action) = service.create(input("Action", "a")).await.unwrap()
        else {
            panic!("Genre not created")
        };
        let GenreSubmission::Created(rpg) = service.create(input("RPG", "r")).await.unwrap() else {
            panic!("Genre not created")
        };

        match service
            .update(rpg.id, input("Role playing", "rr"))
            .await
            .unwrap()
        {
            GenreUpdate::Saved(genre) => {
                assert_eq!(genre.id, rpg.id);
                assert_eq!(genre.name, "Role playing");
            }
            other => panic!("Unexpected outcome {other:?}"),
        }

        match service.update(rpg.id, input("Action", "rr")).await.unwrap() {
            GenreUpdate::Rejected { errors, .. } => {
                assert_eq!(errors, vec![FieldError::new("name", NAME_TAKEN)])
            }
            other => panic!("Unexpected outcome {other:?}"),
        }

        // keeping own name is fine
        assert!(matches!(
            service.update(action.id, input("Action", "new")).await,
            Ok(GenreUpdate::Saved(_))
        ));

        let res = service.update(999, input("Other", "o")).await;
        assert!(matches!(res, Err(e) if e.is_not_found()));
    }

    #[tokio::test]
    async fn test_delete_blocked_then_allowed() {
        let (pool, _tmp) = test_pool().await;
        let service = GenreService::new(pool.clone());
        let games = GameRepository::new(pool);
        let GenreSubmission::Created(genre) = service.create(input("Action", "desc")).await.unwrap()
        else {
            panic!("Genre not created")
        };
        let game = games
            .create(CreateGame {
                name: "G1".into(),
                description: "d".into(),
                genres: vec![genre.id],
                price: 5.0,
                number_in_stock: 2,
                img_name: None,
            })
            .await
            .unwrap();

        let usage = service.prepare_delete(genre.id).await.unwrap();
        assert_eq!(usage.games.len(), 1);

        match service.confirm_delete(genre.id).await.unwrap() {
            GenreDeletion::Blocked { genre: g, games } => {
                assert_eq!(g.id, genre.id);
                assert_eq!(games.len(), 1);
                assert_eq!(games[0].name, "G1");
            }
            other => panic!("Unexpected outcome {other:?}"),
        }
        assert!(service.get(genre.id).await.is_ok());

        games.delete(game.id).await.unwrap();
        assert!(matches!(
            service.confirm_delete(genre.id).await,
            Ok(GenreDeletion::Deleted)
        ));
        let res = service.get(genre.id).await;
        assert!(matches!(res, Err(e) if e.is_not_found()));

        let res = service.confirm_delete(genre.id).await;
        assert!(matches!(res, Err(e) if e.is_not_found()));
    }
}
