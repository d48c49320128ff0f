//! Shared test fixtures for the viewer integration tests.
//!
//! Provides `setup_sample_catalog()` which writes a small card sheet and
//! image-link index as CSV files into a temp directory and loads them, plus
//! helpers for building records in memory.

#![allow(dead_code)]

use eras_viewer::models::Tokens;
use eras_viewer::{Catalog, CardRecord};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// The card sheet, with the Spanish headers the source spreadsheet uses.
///
/// Id 3 is an empty slot. Id 2 has no strength, id 4 no level or strength.
pub const CARDS_CSV: &str = "\
id,nombre,era,subera,numero,clase,tipos,categoria,nivel,fuerza,coste,coste especial
1,Guardián del Bosque,1,0,1,B,Criatura-Elfo,Unidad,1,3,2,
2,Druida Errante,1,0,2,B-D,Criatura-Mago,Unidad,2,,3,1
3,Nac,1,0,3,B,,,,,,
4,Caos Primigenio,1,0,1,D,Hechizo,Acción,,,4,2
5,Sombra Voraz,1,1,1,P,Criatura-Espectro,Unidad,3,5,5,
6,Campeón de Hierro,2,0,1,G,Criatura-Guerrero,Unidad,4,9,6,3
7,Lanza Rota,2,0,2,G,Equipo,,,1,1,
";

/// Image links. Id 4 has a blank url, id 5 is listed twice, id 99 is not a card.
pub const LINKS_CSV: &str = "\
id,url
1,https://img.example/E1/B01.png
2,https://img.example/E1/B02.png
4,
5,https://img.example/E1_1/P01.png
5,https://img.example/E1_1/P01-dup.png
99,https://img.example/orphan.png
";

/// Temp directory holding the fixture files.
pub struct Fixture {
    pub dir: TempDir,
    pub cards: PathBuf,
    pub links: PathBuf,
}

impl Fixture {
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

/// Write the sample sheets into a fresh temp directory.
///
/// The caller must keep the returned `Fixture` alive while the files are used.
pub fn write_fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let cards = dir.path().join("BDD.csv");
    let links = dir.path().join("uploaded_image_links.csv");
    fs::write(&cards, CARDS_CSV).unwrap();
    fs::write(&links, LINKS_CSV).unwrap();
    Fixture { dir, cards, links }
}

/// Load the sample catalog with its image links.
pub fn setup_sample_catalog() -> (Catalog, Fixture) {
    let fixture = write_fixture();
    let catalog = Catalog::load(&fixture.cards, Some(&fixture.links)).unwrap();
    (catalog, fixture)
}

/// Write arbitrary CSV text into a temp file and return its path.
pub fn write_csv(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

/// Write CSV text out as a single-sheet `.xlsx` workbook and return its path.
///
/// Converts through DuckDB's `excel` extension, the same one the connection
/// reads workbooks with.
pub fn write_xlsx(dir: &TempDir, name: &str, csv: &str) -> PathBuf {
    let source = write_csv(dir, &format!("{}.source.csv", name), csv);
    let path = dir.path().join(name);
    let conn = duckdb::Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!(
        "INSTALL excel; LOAD excel; \
         COPY (SELECT * FROM read_csv_auto('{}', header=true)) TO '{}' (FORMAT xlsx, HEADER true);",
        source.to_string_lossy().replace('\\', "/"),
        path.to_string_lossy().replace('\\', "/"),
    ))
    .unwrap();
    path
}

/// In-memory record with a class and strength.
pub fn record(id: i64, era: i64, subera: i64, class: &str, strength: Option<i64>) -> CardRecord {
    let mut card = CardRecord::new(id, format!("Card {}", id), era, subera);
    card.class = Tokens::parse(class);
    card.strength = strength;
    card
}
