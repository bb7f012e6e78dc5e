mod reader;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::ConfigError;

pub use reader::{read_rows, read_rows_from};

pub const GAME_FIELD: &str = "Game";
pub const PRIZE_NAME_FIELD: &str = "Prize Name";
pub const COST_FIELD: &str = "Cost USD";
pub const WEIGHT_FIELD: &str = "Weight (g)";
pub const NOTES_FIELD: &str = "Notes";

const GAME_SEPARATOR: &str = ": ";
const GAME_PREFIX: &str = "GAME ";

/// One tabular input row: field name to raw string value.
pub type Row = IndexMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrizeRecord {
    pub name: String,
    pub cost: Option<String>,
    pub weight: Option<String>,
    pub notes: Option<String>,
}

/// Game name to its prizes, both in source row order.
///
/// Keys are the extracted game names verbatim. "Labubu" and "labubu" are two
/// different games.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    games: IndexMap<String, Vec<PrizeRecord>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a Row>,
    {
        let mut catalog = Self::new();
        for row in rows {
            let game_name = extract_game_name(field(row, GAME_FIELD));
            let prize_name = field(row, PRIZE_NAME_FIELD).trim();
            if game_name.is_empty() || prize_name.is_empty() {
                continue;
            }
            catalog.push(
                game_name,
                PrizeRecord {
                    name: prize_name.to_string(),
                    cost: optional_field(row, COST_FIELD),
                    weight: optional_field(row, WEIGHT_FIELD),
                    notes: optional_field(row, NOTES_FIELD),
                },
            );
        }
        catalog
    }

    fn push(&mut self, game_name: String, prize: PrizeRecord) {
        self.games.entry(game_name).or_default().push(prize);
    }

    /// Adds a game directly, for one-off runs that do not come from rows.
    /// A game may be inserted with no prizes; its banner then falls back to
    /// generic wording.
    pub fn insert_game(&mut self, game_name: impl Into<String>, prizes: Vec<PrizeRecord>) {
        self.games.entry(game_name.into()).or_default().extend(prizes);
    }

    pub fn get(&self, game_name: &str) -> Option<&[PrizeRecord]> {
        self.games.get(game_name).map(Vec::as_slice)
    }

    pub fn games(&self) -> impl Iterator<Item = (&str, &[PrizeRecord])> {
        self.games
            .iter()
            .map(|(name, prizes)| (name.as_str(), prizes.as_slice()))
    }

    pub fn game_names(&self) -> Vec<String> {
        self.games.keys().cloned().collect()
    }

    pub fn game_count(&self) -> usize {
        self.games.len()
    }

    pub fn prize_count(&self) -> usize {
        self.games.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    /// Keeps games whose name contains `filter`, ignoring case. An empty
    /// result is a configuration error rather than an empty success.
    pub fn filtered(&self, filter: &str) -> Result<Self, ConfigError> {
        let needle = filter.to_lowercase();
        let games: IndexMap<String, Vec<PrizeRecord>> = self
            .games
            .iter()
            .filter(|(name, _)| name.to_lowercase().contains(&needle))
            .map(|(name, prizes)| (name.clone(), prizes.clone()))
            .collect();
        if games.is_empty() {
            return Err(ConfigError::NoMatchingGames(filter.to_string()));
        }
        Ok(Self { games })
    }
}

/// "GAME 1: Labubu" and "GAME Labubu" both yield "Labubu".
pub fn extract_game_name(raw: &str) -> String {
    if let Some((_, rest)) = raw.split_once(GAME_SEPARATOR) {
        return rest.trim().to_string();
    }
    raw.strip_prefix(GAME_PREFIX).unwrap_or(raw).trim().to_string()
}

fn field<'a>(row: &'a Row, key: &str) -> &'a str {
    row.get(key).map(String::as_str).unwrap_or_default()
}

fn optional_field(row: &Row, key: &str) -> Option<String> {
    let value = field(row, key).trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{extract_game_name, Catalog, Row};
    use crate::error::ConfigError;

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    fn names(catalog: &Catalog, game: &str) -> Vec<String> {
        catalog
            .get(game)
            .unwrap_or_default()
            .iter()
            .map(|prize| prize.name.clone())
            .collect()
    }

    #[test]
    fn extract_game_name_handles_both_conventions() {
        assert_eq!(extract_game_name("GAME 1: Labubu"), "Labubu");
        assert_eq!(extract_game_name("GAME Labubu"), "Labubu");
        assert_eq!(extract_game_name("GAME 2: Sonny Angel: Hippers "), "Sonny Angel: Hippers");
        assert_eq!(extract_game_name("  Smiski  "), "Smiski");
        assert_eq!(extract_game_name("GAME 3: "), "");
        assert_eq!(extract_game_name(""), "");
    }

    #[test]
    fn both_game_conventions_share_one_key_in_row_order() {
        let rows = vec![
            row(&[("Game", "GAME 1: Labubu"), ("Prize Name", "Mini")]),
            row(&[("Game", "GAME Labubu"), ("Prize Name", "Mega")]),
        ];
        let catalog = Catalog::build(&rows);
        assert_eq!(catalog.game_names(), vec!["Labubu"]);
        assert_eq!(names(&catalog, "Labubu"), vec!["Mini", "Mega"]);
    }

    #[test]
    fn rows_without_game_or_prize_are_dropped() {
        let rows = vec![
            row(&[("Game", "GAME 1: Labubu"), ("Prize Name", "")]),
            row(&[("Game", "GAME 1: Labubu"), ("Prize Name", "   ")]),
            row(&[("Game", "GAME 2: "), ("Prize Name", "Orphan")]),
            row(&[("Prize Name", "No Game Column")]),
            row(&[("Game", "GAME 3: Smiski")]),
        ];
        let catalog = Catalog::build(&rows);
        assert!(catalog.is_empty());
        assert_eq!(catalog.prize_count(), 0);
    }

    #[test]
    fn optional_fields_are_trimmed_and_empty_becomes_none() {
        let rows = vec![row(&[
            ("Game", "GAME 1: Tech"),
            ("Prize Name", " AirPods Max "),
            ("Cost USD", " 549 "),
            ("Weight (g)", ""),
            ("Notes", "Space gray"),
        ])];
        let catalog = Catalog::build(&rows);
        let prize = &catalog.get("Tech").unwrap_or_default()[0];
        assert_eq!(prize.name, "AirPods Max");
        assert_eq!(prize.cost.as_deref(), Some("549"));
        assert_eq!(prize.weight, None);
        assert_eq!(prize.notes.as_deref(), Some("Space gray"));
    }

    #[test]
    fn game_keys_are_case_sensitive() {
        let rows = vec![
            row(&[("Game", "GAME Labubu"), ("Prize Name", "A")]),
            row(&[("Game", "GAME labubu"), ("Prize Name", "B")]),
        ];
        let catalog = Catalog::build(&rows);
        assert_eq!(catalog.game_names(), vec!["Labubu", "labubu"]);
    }

    #[test]
    fn games_keep_first_appearance_order() {
        let rows = vec![
            row(&[("Game", "GAME 2: Smiski"), ("Prize Name", "Bath")]),
            row(&[("Game", "GAME 1: Labubu"), ("Prize Name", "Mini")]),
            row(&[("Game", "GAME 2: Smiski"), ("Prize Name", "Work")]),
        ];
        let catalog = Catalog::build(&rows);
        assert_eq!(catalog.game_names(), vec!["Smiski", "Labubu"]);
        assert_eq!(names(&catalog, "Smiski"), vec!["Bath", "Work"]);
        assert_eq!(catalog.prize_count(), 3);
    }

    #[test]
    fn filtered_uses_case_insensitive_substring() -> anyhow::Result<()> {
        let rows = vec![
            row(&[("Game", "GAME 1: Labubu Classics"), ("Prize Name", "Mini")]),
            row(&[("Game", "GAME 2: Smiski"), ("Prize Name", "Bath")]),
        ];
        let catalog = Catalog::build(&rows);
        let filtered = catalog.filtered("LABUBU")?;
        assert_eq!(filtered.game_names(), vec!["Labubu Classics"]);

        let err = catalog.filtered("pokemon").err();
        assert!(matches!(err, Some(ConfigError::NoMatchingGames(ref f)) if f == "pokemon"));
        Ok(())
    }

    #[test]
    fn insert_game_allows_prizeless_games() {
        let mut catalog = Catalog::new();
        catalog.insert_game("Mystery Box", Vec::new());
        assert_eq!(catalog.game_names(), vec!["Mystery Box"]);
        assert_eq!(catalog.prize_count(), 0);
        assert!(!catalog.is_empty());
    }
}
