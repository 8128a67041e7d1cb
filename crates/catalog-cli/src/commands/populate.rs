use std::collections::HashSet;

use catalog_dal::{
    game::{CreateGame, GameRepository},
    genre::{CreateGenre, GenreRepository},
    Pool,
};
use catalog_types::config::BackendConfig;
use clap::Parser;
use tracing::{debug, info};

use crate::commands::{open_database, Executor};

#[derive(Parser, Debug)]
pub struct PopulateCmd {
    #[command(flatten)]
    backend: BackendConfig,
}

struct SampleGenre {
    name: &'static str,
    description: &'static str,
}

struct SampleGame {
    name: &'static str,
    description: &'static str,
    /// index into GENRES
    genre: usize,
    price: f64,
    number_in_stock: i64,
}

const GENRES: &[SampleGenre] = &[
    SampleGenre {
        name: "Action-adventure",
        description: "An action adventure game can be defined as a game with a mix of elements from an action game and an adventure game, especially crucial elements like puzzles. The story is heavily reliant upon the player character's movement, which triggers story events and thus affects the flow of the game.",
    },
    SampleGenre {
        name: "First Person Shooter",
        description: "First-person shooter (FPS) is a sub-genre of shooter video games centered on gun and other weapon-based combat in a first-person perspective, with the player experiencing the action through the eyes of the protagonist and controlling the player character in a three-dimensional space.",
    },
    SampleGenre {
        name: "Action role-playing",
        description: "Action role-playing video games (abbreviated action RPG or ARPG) are a subgenre of role-playing video games. The games emphasize real-time combat (where the player has direct control over characters) over turn-based or menu-based combat.",
    },
];

const GAMES: &[SampleGame] = &[
    SampleGame {
        name: "God of War",
        description: "In God of War, players control Kratos, a Spartan warrior who is sent by the Greek gods to kill Ares, the god of war. As the story progresses, Kratos is revealed to be Ares' former servant, who had been tricked into killing his own family and is haunted by terrible nightmares.",
        genre: 0,
        price: 14.99,
        number_in_stock: 10,
    },
    SampleGame {
        name: "The Last of Us",
        description: "Set in the post-apocalyptic United States, the game tells the story of survivors Joel and Ellie as they work together to survive their westward journey across what remains of the country to find a possible cure for the modern fungal plague that has nearly decimated the entire human race.",
        genre: 0,
        price: 9.99,
        number_in_stock: 5,
    },
    SampleGame {
        name: "Red Dead Redemption II",
        description: "Set in a fictional recreation of the American Old West in 1899, Red Dead Redemption 2 focuses on the life of Arthur Morgan and his position in the notorious Van der Linde gang. The game follows the gang's decline as they are pursued by lawmen, fellow gangs and Pinkerton agents. The narrative revolves around the characters of Dutch van der Linde, John Marston and Micah Bell in addition to Morgan.",
        genre: 0,
        price: 19.99,
        number_in_stock: 2,
    },
    SampleGame {
        name: "Doom (2016)",
        description: "The game features the Doom Slayer, an ancient warrior awakened during a demonic invasion on Mars in 2148 after the Union Aerospace Corporation scientist Dr. Olivia Pierce allows forces of Hell to invade.",
        genre: 1,
        price: 11.99,
        number_in_stock: 11,
    },
    SampleGame {
        name: "Bloodborne",
        description: "Bloodborne follows the player's character, a Hunter, through the decrepit Gothic, Victorian-era-inspired city of Yharnam, whose inhabitants are afflicted with a blood-borne disease. Attempting to find the source of the plague, the player's character unravels the city's mysteries while fighting beasts and cosmic beings.",
        genre: 2,
        price: 9.99,
        number_in_stock: 15,
    },
    SampleGame {
        name: "Horizon Zero Dawn",
        description: "The plot follows Aloy, a young hunter in a world overrun by machines, who sets out to uncover her past. The player can explore the open world to discover locations and take on side quests.",
        genre: 2,
        price: 13.99,
        number_in_stock: 7,
    },
];

#[derive(Debug, Default, PartialEq)]
pub struct PopulateSummary {
    pub genres_created: usize,
    pub games_created: usize,
}

/// Creates sample records, which are not present yet (matched by name)
pub async fn populate(pool: Pool) -> catalog_dal::error::Result<PopulateSummary> {
    let genres = GenreRepository::new(pool.clone());
    let games = GameRepository::new(pool);
    let mut summary = PopulateSummary::default();

    let mut genre_ids = Vec::with_capacity(GENRES.len());
    for sample in GENRES {
        let genre = match genres.find_by_name(sample.name).await? {
            Some(genre) => genre,
            None => {
                summary.genres_created += 1;
                genres
                    .create(CreateGenre {
                        name: sample.name.to_string(),
                        description: sample.description.to_string(),
                    })
                    .await?
            }
        };
        debug!("Genre {} has id {}", genre.name, genre.id);
        genre_ids.push(genre.id);
    }

    let existing: HashSet<String> = games
        .list_all()
        .await?
        .into_iter()
        .map(|g| g.name)
        .collect();
    for sample in GAMES.iter().filter(|g| !existing.contains(g.name)) {
        let game = games
            .create(CreateGame {
                name: sample.name.to_string(),
                description: sample.description.to_string(),
                genres: vec![genre_ids[sample.genre]],
                price: sample.price,
                number_in_stock: sample.number_in_stock,
                img_name: None,
            })
            .await?;
        debug!("Created game {} with id {}", game.name, game.id);
        summary.games_created += 1;
    }
    Ok(summary)
}

impl Executor for PopulateCmd {
    async fn run(self) -> anyhow::Result<()> {
        let pool = open_database(&self.backend).await?;
        let summary = populate(pool.clone()).await?;
        pool.close().await;
        info!(
            "Created {} genres and {} games",
            summary.genres_created, summary.games_created
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_populate_twice() {
        let tmp = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", tmp.path().join("catalog.db").display());
        let pool = catalog_dal::new_pool(&url).await.unwrap();
        catalog_dal::migrate(&pool).await.unwrap();

        let summary = populate(pool.clone()).await.unwrap();
        assert_eq!(
            summary,
            PopulateSummary {
                genres_created: 3,
                games_created: 6
            }
        );

        let again = populate(pool.clone()).await.unwrap();
        assert_eq!(again, PopulateSummary::default());

        let games = GameRepository::new(pool.clone()).list_all().await.unwrap();
        assert_eq!(games.len(), 6);
        assert_eq!(games[0].name, "Bloodborne");
        assert_eq!(games[0].genres[0].name, "Action role-playing");

        let shooter = GenreRepository::new(pool.clone())
            .find_by_name("First Person Shooter")
            .await
            .unwrap()
            .unwrap();
        let shooters = GameRepository::new(pool).list_by_genre(shooter.id).await.unwrap();
        assert_eq!(shooters.len(), 1);
        assert_eq!(shooters[0].name, "Doom (2016)");
    }
}
