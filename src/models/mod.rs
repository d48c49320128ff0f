pub mod card;
pub mod criteria;
pub mod deck;

pub use card::*;
pub use criteria::*;
pub use deck::*;
