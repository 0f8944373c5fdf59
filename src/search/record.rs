//! Records the search engine can look into

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Anything exposing a fixed list of searchable text fields
///
/// Absent or empty fields are simply left out of the returned list.
pub trait Searchable {
    fn searchable_fields(&self) -> Vec<&str>;
}

impl Searchable for String {
    fn searchable_fields(&self) -> Vec<&str> {
        if self.is_empty() {
            Vec::new()
        } else {
            vec![self.as_str()]
        }
    }
}

/// A package as stored by the front end
///
/// Field names accept both the English keys and the Spanish keys the web
/// application stores.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PackageRecord {
    #[serde(alias = "codigo")]
    pub code: Option<String>,
    #[serde(alias = "destinatario")]
    pub recipient: Option<String>,
    #[serde(alias = "dni")]
    pub national_id: Option<String>,
    #[serde(alias = "ciudad")]
    pub city: Option<String>,
    #[serde(alias = "direccion")]
    pub address: Option<String>,
    #[serde(alias = "contenido")]
    pub content: Option<String>,
    #[serde(alias = "estado")]
    pub status: Option<String>,
    #[serde(alias = "usuario")]
    pub username: Option<String>,
}

impl Searchable for PackageRecord {
    fn searchable_fields(&self) -> Vec<&str> {
        [
            &self.code,
            &self.recipient,
            &self.national_id,
            &self.city,
            &self.address,
            &self.content,
            &self.status,
            &self.username,
        ]
        .into_iter()
        .filter_map(|field| field.as_deref())
        .filter(|field| !field.is_empty())
        .collect()
    }
}
