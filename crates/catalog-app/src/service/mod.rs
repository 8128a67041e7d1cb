//! Resource services, each is constructed from shared state with its repositories

pub mod game;
pub mod genre;

pub use game::GameService;
pub use genre::GenreService;

use crate::state::AppState;

impl From<&AppState> for GenreService {
    fn from(state: &AppState) -> Self {
        GenreService::new(state.pool().clone())
    }
}

impl From<&AppState> for GameService {
    fn from(state: &AppState) -> Self {
        GameService::new(state.pool().clone(), state.store().clone())
    }
}
