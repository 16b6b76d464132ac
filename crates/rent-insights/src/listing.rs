//! Typed view of the rental listing schema.
//!
//! The pipeline itself works on any numeric CSV; this module names the
//! columns of the Brazilian rental dataset and converts rows into
//! [`Listing`] values when the schema is present.

use crate::error::{AnalysisError, Result};
use crate::utils::{numeric_values, string_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

pub mod columns {
    pub const CITY: &str = "city";
    pub const AREA: &str = "area";
    pub const ROOMS: &str = "rooms";
    pub const BATHROOM: &str = "bathroom";
    pub const PARKING_SPACES: &str = "parking spaces";
    pub const FLOOR: &str = "floor";
    pub const ANIMAL: &str = "animal";
    pub const FURNITURE: &str = "furniture";
    pub const HOA: &str = "hoa (R$)";
    pub const RENT_AMOUNT: &str = "rent amount (R$)";
    pub const PROPERTY_TAX: &str = "property tax (R$)";
    pub const FIRE_INSURANCE: &str = "fire insurance (R$)";
    pub const TOTAL: &str = "total (R$)";
}

/// Columns a dataset must carry to be read as listings.
pub const REQUIRED_COLUMNS: [&str; 11] = [
    columns::CITY,
    columns::AREA,
    columns::ROOMS,
    columns::BATHROOM,
    columns::PARKING_SPACES,
    columns::ANIMAL,
    columns::FURNITURE,
    columns::RENT_AMOUNT,
    columns::PROPERTY_TAX,
    columns::FIRE_INSURANCE,
    columns::TOTAL,
];

/// Monetary columns that add up to the total rent.
pub fn monetary_part_columns(df: &DataFrame) -> Vec<String> {
    [
        columns::HOA,
        columns::RENT_AMOUNT,
        columns::PROPERTY_TAX,
        columns::FIRE_INSURANCE,
    ]
    .iter()
    .filter(|c| df.column(c).is_ok())
    .map(|c| c.to_string())
    .collect()
}

/// Whether pets are allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimalPolicy {
    Accepts,
    Refuses,
    Other(String),
}

impl AnimalPolicy {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "acept" | "accept" => AnimalPolicy::Accepts,
            "not acept" | "not accept" => AnimalPolicy::Refuses,
            other => AnimalPolicy::Other(other.to_string()),
        }
    }
}

/// Whether the property is rented furnished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Furnishing {
    Furnished,
    Unfurnished,
    Other(String),
}

impl Furnishing {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "furnished" => Furnishing::Furnished,
            "not furnished" => Furnishing::Unfurnished,
            other => Furnishing::Other(other.to_string()),
        }
    }
}

/// One rental listing. Missing cells are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub city: Option<String>,
    pub area: Option<f64>,
    pub rooms: Option<i64>,
    pub bathrooms: Option<i64>,
    pub parking_spaces: Option<i64>,
    pub floor: Option<String>,
    pub animal: Option<AnimalPolicy>,
    pub furniture: Option<Furnishing>,
    pub hoa: Option<f64>,
    pub rent_amount: Option<f64>,
    pub property_tax: Option<f64>,
    pub fire_insurance: Option<f64>,
    pub total: Option<f64>,
}

impl Listing {
    /// Sum of the monetary components that are present.
    pub fn components_sum(&self) -> f64 {
        [self.hoa, self.rent_amount, self.property_tax, self.fire_insurance]
            .iter()
            .flatten()
            .sum()
    }
}

/// Fail with the first required listing column the frame lacks.
pub fn validate_listing_schema(df: &DataFrame) -> Result<()> {
    match REQUIRED_COLUMNS.iter().find(|c| df.column(c).is_err()) {
        Some(missing) => Err(AnalysisError::InvalidArgument(format!(
            "dataset is missing listing column '{}'",
            missing
        ))),
        None => Ok(()),
    }
}

/// Convert every row into a [`Listing`].
pub fn listings(df: &DataFrame) -> Result<Vec<Listing>> {
    validate_listing_schema(df)?;

    let optional_numeric = |name: &str| -> Result<Vec<Option<f64>>> {
        if df.column(name).is_ok() {
            numeric_values(df, name)
        } else {
            Ok(vec![None; df.height()])
        }
    };
    let optional_string = |name: &str| -> Result<Vec<Option<String>>> {
        if df.column(name).is_ok() {
            string_values(df, name)
        } else {
            Ok(vec![None; df.height()])
        }
    };
    let as_count = |v: Option<f64>| v.map(|x| x.round() as i64);

    let city = string_values(df, columns::CITY)?;
    let area = numeric_values(df, columns::AREA)?;
    let rooms = numeric_values(df, columns::ROOMS)?;
    let bathroom = numeric_values(df, columns::BATHROOM)?;
    let parking = numeric_values(df, columns::PARKING_SPACES)?;
    let floor = optional_string(columns::FLOOR)?;
    let animal = string_values(df, columns::ANIMAL)?;
    let furniture = string_values(df, columns::FURNITURE)?;
    let hoa = optional_numeric(columns::HOA)?;
    let rent = numeric_values(df, columns::RENT_AMOUNT)?;
    let tax = numeric_values(df, columns::PROPERTY_TAX)?;
    let insurance = numeric_values(df, columns::FIRE_INSURANCE)?;
    let total = numeric_values(df, columns::TOTAL)?;

    let rows = (0..df.height())
        .map(|i| Listing {
            city: city[i].clone(),
            area: area[i],
            rooms: as_count(rooms[i]),
            bathrooms: as_count(bathroom[i]),
            parking_spaces: as_count(parking[i]),
            floor: floor[i].clone(),
            animal: animal[i].as_deref().map(AnimalPolicy::parse),
            furniture: furniture[i].as_deref().map(Furnishing::parse),
            hoa: hoa[i],
            rent_amount: rent[i],
            property_tax: tax[i],
            fire_insurance: insurance[i],
            total: total[i],
        })
        .collect();

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        df![
            "city" => ["São Paulo", "Porto Alegre"],
            "area" => [70i64, 80],
            "rooms" => [2i64, 1],
            "bathroom" => [1i64, 1],
            "parking spaces" => [1i64, 1],
            "floor" => ["7", "-"],
            "animal" => ["acept", "not acept"],
            "furniture" => ["furnished", "not furnished"],
            "hoa (R$)" => [2065i64, 1000],
            "rent amount (R$)" => [3300i64, 2800],
            "property tax (R$)" => [211i64, 0],
            "fire insurance (R$)" => [42i64, 41],
            "total (R$)" => [5618i64, 3841],
        ]
        .unwrap()
    }

    #[test]
    fn test_listings_typed_rows() {
        let rows = listings(&sample()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].city.as_deref(), Some("São Paulo"));
        assert_eq!(rows[0].rooms, Some(2));
        assert_eq!(rows[0].animal, Some(AnimalPolicy::Accepts));
        assert_eq!(rows[1].animal, Some(AnimalPolicy::Refuses));
        assert_eq!(rows[1].furniture, Some(Furnishing::Unfurnished));
        assert_eq!(rows[1].floor.as_deref(), Some("-"));
        assert_eq!(rows[0].components_sum(), 5618.0);
    }

    #[test]
    fn test_listings_without_optional_columns() {
        let df = sample().drop("floor").unwrap().drop("hoa (R$)").unwrap();
        let rows = listings(&df).unwrap();
        assert_eq!(rows[0].floor, None);
        assert_eq!(rows[0].hoa, None);
    }

    #[test]
    fn test_validate_listing_schema_names_missing_column() {
        let df = sample().drop("total (R$)").unwrap();
        let err = validate_listing_schema(&df).unwrap_err();
        assert!(err.to_string().contains("total (R$)"));
    }

    #[test]
    fn test_monetary_part_columns() {
        let df = sample().drop("hoa (R$)").unwrap();
        assert_eq!(
            monetary_part_columns(&df),
            vec!["rent amount (R$)", "property tax (R$)", "fire insurance (R$)"]
        );
    }

    #[test]
    fn test_parse_categoricals() {
        assert_eq!(AnimalPolicy::parse("acept"), AnimalPolicy::Accepts);
        assert_eq!(
            Furnishing::parse("semi"),
            Furnishing::Other("semi".to_string())
        );
    }
}
