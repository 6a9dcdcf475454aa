pub mod animals;
pub mod http;
pub mod store;
pub mod terminal;

pub use animals::InMemoryAnimalSource;
pub use http::{HttpAnimalSource, HttpAuthApi};
pub use store::{FileStore, MemoryStore};
pub use terminal::{RouteStack, TerminalPresenter};
