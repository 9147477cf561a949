pub mod inspect;
pub mod run;

// Re-export command functions for convenience
pub use inspect::{check, extract, validate};
pub use run::run;
