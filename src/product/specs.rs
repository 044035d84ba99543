use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::product::ProductKind;

pub const RANGE: &str = "range";
pub const ACCELERATION: &str = "acceleration";
pub const TOP_SPEED: &str = "topSpeed";
pub const BEDROOMS: &str = "bedrooms";
pub const BATHROOMS: &str = "bathrooms";
pub const SQFT: &str = "sqft";

/// Free-form specification table as persisted.
///
/// Keys are not checked against the product type; unknown keys round-trip.
/// Use [`Specs::typed`] for the per-type view.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Specs {
    inner: BTreeMap<String, String>,
}

impl Specs {
    pub fn new() -> Self {
        Specs {
            inner: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.inner.iter()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Blank values read as absent, matching how listing forms submit
    /// every field regardless of type.
    fn field(&self, key: &str) -> Option<String> {
        self.get(key)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// Interpret the table according to `kind`.
    pub fn typed(&self, kind: ProductKind) -> ProductSpecs {
        match kind {
            ProductKind::Car => ProductSpecs::Car(CarSpecs {
                range: self.field(RANGE),
                acceleration: self.field(ACCELERATION),
                top_speed: self.field(TOP_SPEED),
            }),
            ProductKind::House => ProductSpecs::Home(HomeSpecs {
                bedrooms: self.field(BEDROOMS),
                bathrooms: self.field(BATHROOMS),
                sqft: self.field(SQFT),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CarSpecs {
    pub range: Option<String>,
    pub acceleration: Option<String>,
    pub top_speed: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HomeSpecs {
    pub bedrooms: Option<String>,
    pub bathrooms: Option<String>,
    pub sqft: Option<String>,
}

/// Specification table narrowed to the fields meaningful for one product type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductSpecs {
    Car(CarSpecs),
    Home(HomeSpecs),
}

impl ProductSpecs {
    pub fn kind(&self) -> ProductKind {
        match self {
            ProductSpecs::Car(_) => ProductKind::Car,
            ProductSpecs::Home(_) => ProductKind::House,
        }
    }
}

fn put(specs: &mut Specs, key: &str, value: Option<String>) {
    if let Some(v) = value {
        specs.insert(key, v);
    }
}

impl From<ProductSpecs> for Specs {
    fn from(typed: ProductSpecs) -> Self {
        let mut specs = Specs::new();
        match typed {
            ProductSpecs::Car(car) => {
                put(&mut specs, RANGE, car.range);
                put(&mut specs, ACCELERATION, car.acceleration);
                put(&mut specs, TOP_SPEED, car.top_speed);
            }
            ProductSpecs::Home(home) => {
                put(&mut specs, BEDROOMS, home.bedrooms);
                put(&mut specs, BATHROOMS, home.bathrooms);
                put(&mut specs, SQFT, home.sqft);
            }
        }
        specs
    }
}
