use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::specs::{ProductSpecs, Specs};
use crate::types::identifiers::ProductId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    Car,
    House,
}

#[derive(Debug, Error)]
#[error("Unknown product type: {0}")]
pub struct UnknownKind(pub String);

impl ProductKind {
    pub const ALL: [ProductKind; 2] = [ProductKind::Car, ProductKind::House];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductKind::Car => "car",
            ProductKind::House => "house",
        }
    }
}

impl FromStr for ProductKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "car" => Ok(ProductKind::Car),
            "house" => Ok(ProductKind::House),
            other => Err(UnknownKind(other.to_string())),
        }
    }
}

impl fmt::Display for ProductKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A catalog listing as persisted.
///
/// `id`, `created_at` and `updated_at` belong to the store. Callers construct
/// [`NewProduct`] and [`ProductPatch`] instead.
///
/// Only `title` is written. Reading accepts `title`, `name`, or both.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    #[serde(rename = "type")]
    pub kind: ProductKind,
    pub title: String,
    pub price: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub specs: Specs,
    #[serde(default)]
    pub features: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub(crate) fn create(id: ProductId, data: NewProduct, now: DateTime<Utc>) -> Self {
        Product {
            id,
            kind: data.kind,
            title: data.title,
            price: data.price,
            description: data.description,
            image: data.image,
            specs: data.specs,
            features: data.features,
            created_at: now,
            updated_at: now,
        }
    }

    /// Shallow merge: each field present in `patch` replaces the stored one
    /// wholesale (specs and features are not merged key by key).
    pub(crate) fn apply(&mut self, patch: ProductPatch, now: DateTime<Utc>) {
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(image) = patch.image {
            self.image = image;
        }
        if let Some(specs) = patch.specs {
            self.specs = specs;
        }
        if let Some(features) = patch.features {
            self.features = features;
        }
        // A wall clock that stepped backwards must not break updated >= created.
        self.updated_at = now.max(self.created_at);
    }

    pub fn typed_specs(&self) -> ProductSpecs {
        self.specs.typed(self.kind)
    }
}

/// Caller-supplied fields for a new listing.
///
/// Deserializing ignores `id`, `createdAt` and `updatedAt` if the input
/// carries them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    #[serde(rename = "type")]
    pub kind: ProductKind,
    pub title: String,
    pub price: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub specs: Specs,
    #[serde(default)]
    pub features: Vec<String>,
}

impl NewProduct {
    pub fn new(kind: ProductKind, title: impl Into<String>, price: f64) -> Self {
        NewProduct {
            kind,
            title: title.into(),
            price,
            description: String::new(),
            image: String::new(),
            specs: Specs::new(),
            features: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn image(mut self, url: impl Into<String>) -> Self {
        self.image = url.into();
        self
    }

    pub fn specs(mut self, specs: impl Into<Specs>) -> Self {
        self.specs = specs.into();
        self
    }

    pub fn feature(mut self, feature: impl Into<String>) -> Self {
        self.features.push(feature.into());
        self
    }
}

/// Partial update. Absent fields keep their stored value.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ProductKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specs: Option<Specs>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
}

impl ProductPatch {
    pub fn price(price: f64) -> Self {
        ProductPatch {
            price: Some(price),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == ProductPatch::default()
    }
}

/// `title` wins unless it is empty, then `name`.
fn pick_title(title: Option<String>, name: Option<String>) -> Option<String> {
    match (title, name) {
        (Some(title), _) if !title.is_empty() => Some(title),
        (_, Some(name)) if !name.is_empty() => Some(name),
        (title, name) => title.or(name),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductFields {
    id: ProductId,
    #[serde(rename = "type")]
    kind: ProductKind,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    name: Option<String>,
    price: f64,
    #[serde(default)]
    description: String,
    #[serde(default)]
    image: String,
    #[serde(default)]
    specs: Specs,
    #[serde(default)]
    features: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'de> Deserialize<'de> for Product {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let f = ProductFields::deserialize(deserializer)?;
        let title = pick_title(f.title, f.name)
            .ok_or_else(|| <D::Error as de::Error>::missing_field("title"))?;
        Ok(Product {
            id: f.id,
            kind: f.kind,
            title,
            price: f.price,
            description: f.description,
            image: f.image,
            specs: f.specs,
            features: f.features,
            created_at: f.created_at,
            updated_at: f.updated_at,
        })
    }
}

#[derive(Deserialize)]
struct NewProductFields {
    #[serde(rename = "type")]
    kind: ProductKind,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    name: Option<String>,
    price: f64,
    #[serde(default)]
    description: String,
    #[serde(default)]
    image: String,
    #[serde(default)]
    specs: Specs,
    #[serde(default)]
    features: Vec<String>,
}

impl<'de> Deserialize<'de> for NewProduct {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let f = NewProductFields::deserialize(deserializer)?;
        let title = pick_title(f.title, f.name)
            .ok_or_else(|| <D::Error as de::Error>::missing_field("title"))?;
        Ok(NewProduct {
            kind: f.kind,
            title,
            price: f.price,
            description: f.description,
            image: f.image,
            specs: f.specs,
            features: f.features,
        })
    }
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct PatchFields {
    #[serde(rename = "type")]
    kind: Option<ProductKind>,
    title: Option<String>,
    name: Option<String>,
    price: Option<f64>,
    description: Option<String>,
    image: Option<String>,
    specs: Option<Specs>,
    features: Option<Vec<String>>,
}

impl<'de> Deserialize<'de> for ProductPatch {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let f = PatchFields::deserialize(deserializer)?;
        Ok(ProductPatch {
            kind: f.kind,
            title: pick_title(f.title, f.name),
            price: f.price,
            description: f.description,
            image: f.image,
            specs: f.specs,
            features: f.features,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_falls_back_to_name() {
        let t = |s: &str| Some(s.to_string());
        assert_eq!(pick_title(t("A"), t("B")), t("A"));
        assert_eq!(pick_title(t(""), t("B")), t("B"));
        assert_eq!(pick_title(None, t("B")), t("B"));
        assert_eq!(pick_title(t(""), None), t(""));
        assert_eq!(pick_title(None, None), None);
    }
}
