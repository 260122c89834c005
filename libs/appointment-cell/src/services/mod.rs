pub mod appointment;
pub mod documents;

pub use appointment::*;
pub use documents::*;
