pub mod difficulty;
pub mod lexicon;
pub mod room;
pub mod scoring;

// Re-export main components
pub use room::*;
pub use scoring::*;
