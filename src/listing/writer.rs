use crate::error::GalleryError;
use crate::listing::ident::Ident;
use crate::listing::schema::{IMAGE_URL_COLUMN, table_columns};
use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, SqlitePool, TypeInfo, ValueRef};

/// Form fields with this prefix carry listing attributes.
pub const ATTRIBUTE_PREFIX: &str = "attr_";

/// Listing attributes in submission order. A repeated name keeps its first
/// position and takes the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<(Ident, String)>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: Ident, value: String) {
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    /// Collect `attr_*` fields, stripping the prefix and validating the rest.
    pub fn from_prefixed_fields<I, K, V>(fields: I) -> Result<Self, GalleryError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut attrs = Self::new();
        for (key, value) in fields {
            if let Some(name) = key.as_ref().strip_prefix(ATTRIBUTE_PREFIX) {
                attrs.insert(Ident::parse_attribute(name)?, value.into());
            }
        }
        Ok(attrs)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn names(&self) -> Vec<Ident> {
        self.0.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Ident, &str)> {
        self.0.iter().map(|(n, v)| (n, v.as_str()))
    }
}

impl FromIterator<(Ident, String)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (Ident, String)>>(iter: T) -> Self {
        let mut attrs = Self::new();
        for (name, value) in iter {
            attrs.insert(name, value);
        }
        attrs
    }
}

/// Insert one listing row and return its id.
///
/// The table and column names are pre-validated identifiers; every value
/// goes through a bind parameter.
pub async fn insert_listing(
    pool: &SqlitePool,
    table: &Ident,
    attributes: &Attributes,
    image_url: Option<&str>,
) -> Result<i64, GalleryError> {
    if attributes.is_empty() {
        return Err(GalleryError::NoAttributes);
    }

    let mut columns: Vec<String> = attributes.iter().map(|(n, _)| n.to_string()).collect();
    let mut placeholders = vec!["?"; attributes.len()];
    if image_url.is_some() {
        columns.push(format!("\"{IMAGE_URL_COLUMN}\""));
        placeholders.push("?");
    }

    let sql = format!(
        "INSERT INTO {table} ({}) VALUES ({})",
        columns.join(", "),
        placeholders.join(", ")
    );

    let mut query = sqlx::query(&sql);
    for (_, value) in attributes.iter() {
        query = query.bind(value);
    }
    if let Some(url) = image_url {
        query = query.bind(url);
    }
    let result = query.execute(pool).await?;
    Ok(result.last_insert_rowid())
}

#[derive(Debug, Clone, Serialize)]
pub struct ListingPage {
    pub table: String,
    pub columns: Vec<String>,
    pub items: Vec<Map<String, Value>>,
}

/// Every row of a listing table, newest first.
pub async fn list_listings(pool: &SqlitePool, table: &Ident) -> Result<ListingPage, GalleryError> {
    let mut conn = pool.acquire().await?;
    let columns = table_columns(&mut conn, table).await?;
    if columns.is_empty() {
        return Err(GalleryError::TableNotFound(table.as_str().to_string()));
    }
    let sql = format!("SELECT * FROM {table} ORDER BY id DESC");
    let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;
    let items = rows.iter().map(row_to_json).collect::<Result<_, _>>()?;
    Ok(ListingPage {
        table: table.as_str().to_string(),
        columns,
        items,
    })
}

pub async fn get_listing(
    pool: &SqlitePool,
    table: &Ident,
    id: i64,
) -> Result<Option<Map<String, Value>>, GalleryError> {
    let sql = format!("SELECT * FROM {table} WHERE id = ?");
    let row = sqlx::query(&sql).bind(id).fetch_optional(pool).await?;
    row.as_ref().map(row_to_json).transpose()
}

/// Listing columns are dynamically typed, so decode by the stored value type.
fn row_to_json(row: &SqliteRow) -> Result<Map<String, Value>, GalleryError> {
    let mut out = Map::new();
    for column in row.columns() {
        let idx = column.ordinal();
        let raw = row.try_get_raw(idx)?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            let kind = raw.type_info().name().to_string();
            match kind.as_str() {
                "INTEGER" => Value::from(row.try_get::<i64, _>(idx)?),
                "REAL" => Value::from(row.try_get::<f64, _>(idx)?),
                "BLOB" => Value::Null,
                _ => Value::from(row.try_get::<String, _>(idx)?),
            }
        };
        out.insert(column.name().to_string(), value);
    }
    Ok(out)
}
