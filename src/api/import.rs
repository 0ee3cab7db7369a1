//! CSV import for bulk-adding games.
//!
//! Expected header: `title,owner,min_players,max_players` plus the optional
//! columns `description`, `tags` (semicolon-separated), `image_url`,
//! `bgg_link`, `bgg_rating`. Rows that fail to parse or validate are skipped
//! and reported; the rest are imported.

use serde::Deserialize;

use crate::domain::NewGame;

/// One raw CSV row before validation.
#[derive(Debug, Deserialize)]
struct CsvRow {
    title: String,
    owner: String,
    min_players: i32,
    max_players: i32,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    tags: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    bgg_link: Option<String>,
    #[serde(default)]
    bgg_rating: Option<f64>,
}

impl CsvRow {
    fn into_new_game(self) -> NewGame {
        let tags = self.tags.filter(|t| !t.trim().is_empty()).map(|t| {
            t.split(';')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
        });

        NewGame {
            title: self.title,
            owner: self.owner,
            min_players: self.min_players,
            max_players: self.max_players,
            description: self.description.filter(|s| !s.trim().is_empty()),
            tags,
            image_url: self.image_url.filter(|s| !s.trim().is_empty()),
            bgg_link: self.bgg_link.filter(|s| !s.trim().is_empty()),
            bgg_rating: self.bgg_rating,
        }
    }
}

/// Parse CSV bytes into validated games plus per-row error messages.
///
/// Row numbers in the error messages are 1-based data rows (the header is
/// row 0).
pub fn parse_games_csv(data: &[u8]) -> (Vec<NewGame>, Vec<String>) {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data);

    let mut games = Vec::new();
    let mut errors = Vec::new();

    for (index, record) in reader.deserialize::<CsvRow>().enumerate() {
        let row = index + 1;
        match record {
            Ok(raw) => {
                let game = raw.into_new_game();
                match game.validate() {
                    Ok(()) => games.push(game),
                    Err(reason) => errors.push(format!("row {row}: {reason}")),
                }
            }
            Err(e) => errors.push(format!("row {row}: {e}")),
        }
    }

    (games, errors)
}
