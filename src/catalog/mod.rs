//! Static section/category reference data and the category → table routing.

pub mod registry;

pub use registry::{
    Category, Section, categories, categories_in, category, category_for_table, resolve_table,
    sections,
};
