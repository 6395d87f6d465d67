pub mod name_parser;
pub mod store;
pub mod types;

pub use name_parser::{NameParser, NamingMode};
pub use store::{StoreError, StoreMeta};
pub use types::{Catalog, CatalogEntry, Identity};
