use catalog_dal::{
    game::{CreateGame, Game, GameRepository, GameShort},
    genre::GenreRepository,
    Error, Pool,
};
use bytes::Bytes;
use catalog_store::{file_store::FileStore, Store as _, ValidPath};
use garde::Validate as _;
use tracing::debug;

use crate::{
    error::{ApiError, ApiResult},
    form::{CoverUpload, GameForm, GameInput},
    validate::{field_errors, FieldError},
    view::{GameDraft, GameFormView, GenreChoice},
};

const MISSING_GENRE: &str = "Selected genre does not exist.";
const INVALID_COVER: &str = "Invalid cover image file name.";

#[derive(Debug)]
pub enum GameSubmission {
    Saved(Game),
    Rejected {
        form: GameFormView,
        errors: Vec<FieldError>,
    },
}

pub struct GameService {
    games: GameRepository,
    genres: GenreRepository,
    store: FileStore,
}

impl GameService {
    pub fn new(pool: Pool, store: FileStore) -> Self {
        GameService {
            games: GameRepository::new(pool.clone()),
            genres: GenreRepository::new(pool),
            store,
        }
    }

    /// Sorted by name, with genres
    pub async fn list(&self) -> ApiResult<Vec<GameShort>> {
        Ok(self.games.list_all().await?)
    }

    pub async fn get(&self, id: i64) -> ApiResult<Game> {
        Ok(self.games.get(id).await?)
    }

    /// Empty form for new game or form prefilled with existing game
    pub async fn form(&self, id: Option<i64>) -> ApiResult<GameFormView> {
        let draft = match id {
            Some(id) => {
                let game = self.games.get(id).await?;
                GameDraft {
                    id: Some(game.id),
                    genre: game.genres.iter().map(|g| g.id.to_string()).collect(),
                    name: game.name,
                    description: game.description,
                    price: game.price.to_string(),
                    number_in_stock: game.number_in_stock.to_string(),
                    img_name: game.img_name,
                }
            }
            None => GameDraft::default(),
        };
        self.form_view(draft).await
    }

    async fn form_view(&self, game: GameDraft) -> ApiResult<GameFormView> {
        let genres = self.genres.list_full().await?;
        let genres = GenreChoice::for_selection(genres, &game.genre);
        Ok(GameFormView { game, genres })
    }

    pub async fn create(&self, form: GameForm) -> ApiResult<GameSubmission> {
        self.submit(None, form).await
    }

    /// Replaces game fields, stored cover is kept if no new one is uploaded
    pub async fn update(&self, id: i64, form: GameForm) -> ApiResult<GameSubmission> {
        self.submit(Some(id), form).await
    }

    async fn submit(&self, id: Option<i64>, form: GameForm) -> ApiResult<GameSubmission> {
        let stored_cover = match id {
            Some(id) => self.games.get(id).await?.img_name,
            None => None,
        };
        let (input, cover) = form.into_input();
        let mut errors = match input.validate() {
            Ok(()) => vec![],
            Err(report) => field_errors::<GameInput>(&report),
        };

        let cover = match cover {
            Some(CoverUpload { file_name, data }) => match ValidPath::file_name(&file_name) {
                Ok(path) => Some((path, data)),
                Err(_) => {
                    errors.push(FieldError::new("game_cover", INVALID_COVER));
                    None
                }
            },
            None => None,
        };

        let genre_ids = input.genre_ids();
        let existing = self.genres.existing_ids(&genre_ids).await?;
        if existing.len() < genre_ids.len() {
            debug!("Some of genres {genre_ids:?} do not exist");
            errors.push(FieldError::new("genre", MISSING_GENRE));
        }

        let img_name = cover
            .as_ref()
            .map(|(path, _)| path.as_ref().to_string())
            .or(stored_cover);
        let draft = GameDraft {
            id,
            name: input.name.clone(),
            description: input.description.clone(),
            genre: input.genre.clone(),
            price: input.price.clone(),
            number_in_stock: input.stock.clone(),
            img_name,
        };

        if !errors.is_empty() {
            return self.rejected(draft, errors).await;
        }

        let payload = to_payload(&input, genre_ids, cover.as_ref().map(|(p, _)| p))?;
        match self.persist(id, payload, cover).await? {
            Some(game) => Ok(GameSubmission::Saved(game)),
            None => {
                // genre was deleted meanwhile
                self.rejected(draft, vec![FieldError::new("genre", MISSING_GENRE)])
                    .await
            }
        }
    }

    /// Writes game record, cover is stored only when record was saved.
    /// Returns `None` if some genre reference is not valid anymore.
    async fn persist(
        &self,
        id: Option<i64>,
        payload: CreateGame,
        cover: Option<(ValidPath, Bytes)>,
    ) -> ApiResult<Option<Game>> {
        let result = match id {
            Some(id) => self.games.update(id, payload).await,
            None => self.games.create(payload).await,
        };
        let game = match result {
            Ok(game) => game,
            Err(Error::InvalidReference(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if let Some((path, data)) = cover {
            let info = self.store.store_data(&path, &data).await?;
            debug!(
                "Stored cover {} of {} bytes, hash {}",
                info.final_path.as_ref(),
                info.size,
                info.hash
            );
        }
        Ok(Some(game))
    }

    async fn rejected(
        &self,
        draft: GameDraft,
        errors: Vec<FieldError>,
    ) -> ApiResult<GameSubmission> {
        let form = self.form_view(draft).await?;
        Ok(GameSubmission::Rejected { form, errors })
    }

    pub async fn prepare_delete(&self, id: i64) -> ApiResult<Game> {
        self.get(id).await
    }

    pub async fn delete(&self, id: i64) -> ApiResult<()> {
        Ok(self.games.delete(id).await?)
    }
}

fn to_payload(
    input: &GameInput,
    genres: Vec<i64>,
    cover: Option<&ValidPath>,
) -> ApiResult<CreateGame> {
    let price = input
        .price()
        .ok_or_else(|| ApiError::UnprocessableRequest("Invalid price".into()))?;
    let number_in_stock = input
        .number_in_stock()
        .ok_or_else(|| ApiError::UnprocessableRequest("Invalid stock".into()))?;
    Ok(CreateGame {
        name: input.name.clone(),
        description: input.description.clone(),
        genres,
        price,
        number_in_stock,
        img_name: cover.map(|p| p.as_ref().to_string()),
    })
}
