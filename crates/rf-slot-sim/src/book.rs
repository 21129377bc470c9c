//! Books: the published record of each simulation
//!
//! One JSON object per line. Amounts are hundredths of the bet, the same
//! unit the event log uses.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use rf_slot_math::{Event, RoundState, to_cents};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: u64,
    pub criteria: String,
    pub payout_multiplier: u64,
    pub base_game_wins: u64,
    pub free_game_wins: u64,
    pub events: Vec<Event>,
}

impl Book {
    pub fn from_round(state: &RoundState) -> Self {
        Self {
            id: state.sim_index,
            criteria: state.criteria.clone(),
            payout_multiplier: to_cents(state.final_win),
            base_game_wins: to_cents(state.wins.base_game_wins),
            free_game_wins: to_cents(state.wins.free_game_wins),
            events: state.events.events().to_vec(),
        }
    }
}

pub fn write_books<'a>(path: impl AsRef<Path>, books: impl IntoIterator<Item = &'a Book>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| SimError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    for book in books {
        serde_json::to_writer(&mut writer, book).map_err(|e| SimError::io(path, e.into()))?;
        writer.write_all(b"\n").map_err(|e| SimError::io(path, e))?;
    }
    writer.flush().map_err(|e| SimError::io(path, e))
}

pub fn read_books(path: impl AsRef<Path>) -> Result<Vec<Book>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| SimError::io(path, e))?;
    let mut books = Vec::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| SimError::io(path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        let book = serde_json::from_str(&line).map_err(|source| SimError::Json {
            path: path.to_path_buf(),
            line: i + 1,
            source,
        })?;
        books.push(book);
    }
    Ok(books)
}
