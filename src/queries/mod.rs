//! Query modules over the in-memory catalog.
//!
//! Each module provides a query struct that borrows from a
//! [`Catalog`](crate::catalog::Catalog) (and a [`Deck`](crate::models::Deck)
//! where copy counts matter). Queries are side-effect free.

pub mod cards;
pub mod decks;

pub use cards::CardQuery;
pub use decks::{DeckLine, DeckQuery};
