use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;

use crate::envelope::present;
use crate::plants::repo_types::{NewPlant, PlantChanges};

/// Body of `POST /plants`.
#[derive(Debug, Default, Deserialize)]
pub struct CreatePlantRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<Decimal>,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub in_stock: Option<bool>,
}

impl CreatePlantRequest {
    /// `None` when a required field is missing. Empty strings and a zero price
    /// count as missing.
    pub fn into_new_plant(self) -> Option<NewPlant> {
        Some(NewPlant {
            name: self.name.filter(|v| !v.is_empty())?,
            category: self.category.filter(|v| !v.is_empty())?,
            price: self.price.filter(|p| !p.is_zero())?,
            image_url: self.image_url.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            in_stock: self.in_stock.unwrap_or(true),
        })
    }
}

/// Body of `PUT /plants`. Fields are kept as raw JSON so that a wrongly typed
/// value can still be answered with 404 when the id matches nothing.
/// Nullable columns distinguish "absent" (`None`) from "set to null"
/// (`Some(None)`); for the others a null is the same as absent.
#[derive(Debug, Default, Deserialize)]
pub struct UpdatePlantRequest {
    pub id: Option<Value>,
    pub name: Option<Value>,
    pub category: Option<Value>,
    pub price: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub image_url: Option<Option<Value>>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<Value>>,
    pub in_stock: Option<Value>,
}

/// Target of an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlantId {
    /// Absent, null, zero, empty string or `false`.
    Missing,
    Known(i64),
    /// Supplied, but no row can ever carry it (out of range, fractional, non-numeric).
    Unmatchable,
}

impl PlantId {
    fn from_json(raw: Option<Value>) -> Self {
        match raw {
            None | Some(Value::Null) | Some(Value::Bool(false)) => PlantId::Missing,
            Some(Value::Number(n)) => {
                if let Some(id) = n.as_i64() {
                    return if id == 0 { PlantId::Missing } else { PlantId::Known(id) };
                }
                match n.as_f64() {
                    Some(f) if f == 0.0 => PlantId::Missing,
                    Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                        PlantId::Known(f as i64)
                    }
                    _ => PlantId::Unmatchable,
                }
            }
            Some(Value::String(s)) if s.is_empty() => PlantId::Missing,
            Some(Value::String(s)) => s
                .trim()
                .parse()
                .map(PlantId::Known)
                .unwrap_or(PlantId::Unmatchable),
            Some(Value::Array(a)) if a.is_empty() => PlantId::Missing,
            Some(Value::Object(o)) if o.is_empty() => PlantId::Missing,
            Some(_) => PlantId::Unmatchable,
        }
    }
}

/// Parsed update: where it goes, what it sets, and which fields had a type
/// their column cannot hold.
#[derive(Debug)]
pub struct PlantUpdate {
    pub id: PlantId,
    pub changes: PlantChanges,
    pub invalid: Vec<&'static str>,
}

impl UpdatePlantRequest {
    pub fn into_parts(self) -> PlantUpdate {
        let mut invalid = Vec::new();
        let changes = PlantChanges {
            name: coerce("name", self.name, &mut invalid),
            category: coerce("category", self.category, &mut invalid),
            price: coerce("price", self.price, &mut invalid),
            image_url: self
                .image_url
                .map(|v| coerce("image_url", v, &mut invalid)),
            description: self
                .description
                .map(|v| coerce("description", v, &mut invalid)),
            in_stock: coerce("in_stock", self.in_stock, &mut invalid),
        };
        PlantUpdate {
            id: PlantId::from_json(self.id),
            changes,
            invalid,
        }
    }
}

fn coerce<T: DeserializeOwned>(
    field: &'static str,
    raw: Option<Value>,
    invalid: &mut Vec<&'static str>,
) -> Option<T> {
    let raw = raw?;
    match serde_json::from_value(raw) {
        Ok(v) => Some(v),
        Err(_) => {
            invalid.push(field);
            None
        }
    }
}
