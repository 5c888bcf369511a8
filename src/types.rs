use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
    pub factories: BTreeMap<i64, Factory>,
    pub countries: BTreeMap<i64, Country>,
    pub children: Vec<ChildRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Factory {
    pub country: i64,
    pub stock: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Country {
    #[serde(rename = "maxExport")]
    pub max_export: i64,
    #[serde(rename = "minDistribution")]
    pub min_distribution: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChildRequest {
    /// Declared id, carried through as read. Children are addressed by their
    /// 1-based position in the request list everywhere else.
    pub id: i64,
    pub country: i64,
    pub factories: Vec<i64>,
}

/// Result of an optimal solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    /// Number of children that received a toy.
    pub satisfied: usize,
    /// Child index (1-based, in request order) → factory it was served from.
    pub assignments: BTreeMap<usize, i64>,
}

impl Problem {
    /// Check the semantic rules that every problem must satisfy before a model is built.
    ///
    /// The text parser already applies these record by record; this covers problems
    /// built by hand or deserialized from YAML.
    pub fn validate(&self) -> Result<(), Error> {
        non_empty("factory", self.factories.len())?;
        non_empty("country", self.countries.len())?;
        non_empty("child", self.children.len())?;

        for factory in self.factories.values() {
            factory.validate()?;
        }
        for country in self.countries.values() {
            country.validate()?;
        }
        for (index, child) in (1..).zip(&self.children) {
            child.validate(index, &self.factories, &self.countries)?;
        }
        Ok(())
    }
}

fn non_empty(what: &'static str, count: usize) -> Result<(), Error> {
    if count == 0 {
        return Err(Error::NonPositiveCount { what, value: 0 });
    }
    Ok(())
}

fn non_negative(what: &'static str, value: i64) -> Result<(), Error> {
    if value < 0 {
        return Err(Error::NegativeQuantity { what, value });
    }
    Ok(())
}

impl Factory {
    pub fn validate(&self) -> Result<(), Error> {
        non_negative("stock", self.stock)
    }
}

impl Country {
    pub fn validate(&self) -> Result<(), Error> {
        non_negative("max export", self.max_export)?;
        non_negative("min distribution", self.min_distribution)
    }
}

impl ChildRequest {
    /// Validate the request of the child at `index` against the tables read so far.
    pub fn validate(
        &self,
        index: usize,
        factories: &BTreeMap<i64, Factory>,
        countries: &BTreeMap<i64, Country>,
    ) -> Result<(), Error> {
        if self.factories.is_empty() {
            return Err(Error::EmptyRequest(index));
        }

        let mut seen = BTreeSet::new();
        for &factory in &self.factories {
            if !factories.contains_key(&factory) {
                return Err(Error::UnknownFactory {
                    child: index,
                    factory,
                });
            }
            if !seen.insert(factory) {
                return Err(Error::DuplicateRequest {
                    child: index,
                    factory,
                });
            }
        }

        // Distribution is tracked per declared country
        if !countries.contains_key(&self.country) {
            return Err(Error::UnknownCountry(self.country));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables() -> (BTreeMap<i64, Factory>, BTreeMap<i64, Country>) {
        let factories = BTreeMap::from([(1, Factory { country: 1, stock: 2 })]);
        let countries = BTreeMap::from([(
            1,
            Country {
                max_export: 0,
                min_distribution: 0,
            },
        )]);
        (factories, countries)
    }

    #[test]
    fn negative_stock_is_rejected() {
        let factory = Factory {
            country: 1,
            stock: -1,
        };
        assert!(matches!(
            factory.validate(),
            Err(Error::NegativeQuantity { what: "stock", .. })
        ));
    }

    #[test]
    fn negative_country_quantities_are_rejected() {
        let export = Country {
            max_export: -3,
            min_distribution: 0,
        };
        let distribution = Country {
            max_export: 0,
            min_distribution: -1,
        };
        assert!(export.validate().is_err());
        assert!(distribution.validate().is_err());
    }

    #[test]
    fn child_request_checks() {
        let (factories, countries) = tables();
        let child = |country, requested: Vec<i64>| ChildRequest {
            id: 7,
            country,
            factories: requested,
        };

        assert!(child(1, vec![1]).validate(1, &factories, &countries).is_ok());
        assert!(matches!(
            child(1, vec![]).validate(1, &factories, &countries),
            Err(Error::EmptyRequest(1))
        ));
        assert!(matches!(
            child(1, vec![2]).validate(3, &factories, &countries),
            Err(Error::UnknownFactory {
                child: 3,
                factory: 2
            })
        ));
        assert!(matches!(
            child(1, vec![1, 1]).validate(1, &factories, &countries),
            Err(Error::DuplicateRequest { .. })
        ));
        assert!(matches!(
            child(9, vec![1]).validate(1, &factories, &countries),
            Err(Error::UnknownCountry(9))
        ));
    }

    #[test]
    fn empty_tables_are_rejected() {
        let (factories, countries) = tables();
        let problem = Problem {
            factories,
            countries,
            children: vec![],
        };
        assert!(matches!(
            problem.validate(),
            Err(Error::NonPositiveCount { what: "child", .. })
        ));
    }

    #[test]
    fn yaml_problems_use_camel_case_keys() {
        let yaml = "
factories:
  1: { country: 1, stock: 5 }
countries:
  1: { maxExport: 100, minDistribution: 0 }
children:
  - { id: 1, country: 1, factories: [1] }
";
        let problem: Problem = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(problem.countries[&1].max_export, 100);
        assert!(problem.validate().is_ok());

        let written = serde_yaml::to_string(&problem).unwrap();
        assert!(written.contains("minDistribution"));
    }
}
