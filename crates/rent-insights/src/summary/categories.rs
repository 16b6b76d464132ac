//! Per-category aggregations.
//!
//! Groups keep the order in which their value first appears in the input,
//! and all sorts are stable, so ties never reorder.

use crate::error::Result;
use crate::types::{CategoryCount, CategoryMean};
use crate::utils::{numeric_values, string_values};
use polars::prelude::*;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Row count per value of `column`, ascending by count.
///
/// Missing values are skipped.
pub fn listings_per_city(df: &DataFrame, column: &str) -> Result<Vec<CategoryCount>> {
    let mut counts: Vec<CategoryCount> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for value in string_values(df, column)?.into_iter().flatten() {
        match index.get(&value) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(value.clone(), counts.len());
                counts.push(CategoryCount { value, count: 1 });
            }
        }
    }

    counts.sort_by_key(|c| c.count);
    Ok(counts)
}

/// Mean of `value_column` per value of `category_column`, ascending by mean.
///
/// Rows missing either field are excluded.
pub fn mean_by_category(
    df: &DataFrame,
    category_column: &str,
    value_column: &str,
) -> Result<Vec<CategoryMean>> {
    let categories = string_values(df, category_column)?;
    let values = numeric_values(df, value_column)?;

    // (category, sum, count) in first-appearance order
    let mut groups: Vec<(String, f64, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (category, value) in categories.into_iter().zip(values) {
        let (Some(category), Some(value)) = (category, value) else {
            continue;
        };
        match index.get(&category) {
            Some(&i) => {
                groups[i].1 += value;
                groups[i].2 += 1;
            }
            None => {
                index.insert(category.clone(), groups.len());
                groups.push((category, value, 1));
            }
        }
    }

    let mut means: Vec<CategoryMean> = groups
        .into_iter()
        .map(|(value, sum, count)| CategoryMean {
            value,
            mean: sum / count as f64,
            count,
        })
        .collect();

    means.sort_by(|a, b| a.mean.partial_cmp(&b.mean).unwrap_or(Ordering::Equal));
    Ok(means)
}

/// Distinct non-missing values of a column, sorted lexicographically.
pub fn sorted_categories(df: &DataFrame, column: &str) -> Result<Vec<String>> {
    let mut values: Vec<String> = string_values(df, column)?.into_iter().flatten().collect();
    values.sort();
    values.dedup();
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn listings() -> DataFrame {
        df![
            "city" => [
                Some("São Paulo"), Some("Porto Alegre"), Some("São Paulo"),
                Some("Campinas"), None, Some("Porto Alegre"), Some("São Paulo"),
                Some("Belo Horizonte"),
            ],
            "total (R$)" => [
                Some(5618.0), Some(2000.0), Some(4000.0),
                Some(1500.0), Some(9000.0), None, Some(6000.0),
                Some(3000.0),
            ],
        ]
        .unwrap()
    }

    #[test]
    fn test_listings_per_city_ascending_with_stable_ties() {
        let counts = listings_per_city(&listings(), "city").unwrap();

        let summary: Vec<(&str, usize)> =
            counts.iter().map(|c| (c.value.as_str(), c.count)).collect();
        assert_eq!(
            summary,
            vec![
                ("Campinas", 1),
                ("Belo Horizonte", 1),
                ("Porto Alegre", 2),
                ("São Paulo", 3),
            ]
        );
    }

    #[test]
    fn test_mean_by_category_excludes_missing() {
        let means = mean_by_category(&listings(), "city", "total (R$)").unwrap();

        let summary: Vec<(&str, f64, usize)> = means
            .iter()
            .map(|m| (m.value.as_str(), m.mean, m.count))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Campinas", 1500.0, 1),
                ("Porto Alegre", 2000.0, 1),
                ("Belo Horizonte", 3000.0, 1),
                ("São Paulo", 5206.0, 3),
            ]
        );
    }

    #[test]
    fn test_mean_by_category_empty_frame() {
        let df = listings().head(Some(0));
        assert!(mean_by_category(&df, "city", "total (R$)").unwrap().is_empty());
    }

    #[test]
    fn test_sorted_categories() {
        let cities = sorted_categories(&listings(), "city").unwrap();
        assert_eq!(
            cities,
            vec!["Belo Horizonte", "Campinas", "Porto Alegre", "São Paulo"]
        );
    }
}
