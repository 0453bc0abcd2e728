//! Listing persistence: identifier guard, column evolution, row writer.

pub mod ident;
pub mod schema;
pub mod writer;

pub use ident::Ident;
pub use schema::{IMAGE_URL_COLUMN, create_listing_table, ensure_columns, table_columns};
pub use writer::{Attributes, ListingPage, get_listing, insert_listing, list_listings};
