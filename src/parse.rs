//! Reader for the whitespace-delimited text format.
//!
//! ```text
//! n m t
//! f_id c_id stock                        (n lines)
//! c_id max_export min_dist               (m lines)
//! child_id country_id f_id [f_id ...]    (t lines)
//! ```
//!
//! Every record is one line. The first problem found anywhere aborts the parse.

use std::collections::BTreeMap;
use std::str::Lines;

use log::trace;

use crate::{ChildRequest, Country, Error, Factory, Problem};

pub fn parse(input: &str) -> Result<Problem, Error> {
    let mut records = Records::new(input);

    let [n, m, t] = records.fixed::<3>("header")?;
    let n = positive_count("factory", n)?;
    let m = positive_count("country", m)?;
    let t = positive_count("child", t)?;

    let mut factories = BTreeMap::new();
    for _ in 0..n {
        let [id, country, stock] = records.fixed::<3>("factory")?;
        let factory = Factory { country, stock };
        factory.validate()?;
        factories.insert(id, factory);
    }

    let mut countries = BTreeMap::new();
    for _ in 0..m {
        let [id, max_export, min_distribution] = records.fixed::<3>("country")?;
        let country = Country {
            max_export,
            min_distribution,
        };
        country.validate()?;
        countries.insert(id, country);
    }

    let mut children = Vec::with_capacity(t);
    for index in 1..=t {
        let fields = records.record("child")?;
        let [id, country, requested @ ..] = fields.as_slice() else {
            return Err(records.malformed("child record needs an id and a country"));
        };
        if requested.is_empty() {
            return Err(records.malformed("child record requests no factories"));
        }

        let child = ChildRequest {
            id: *id,
            country: *country,
            factories: requested.to_vec(),
        };
        child.validate(index, &factories, &countries)?;
        children.push(child);
    }

    trace!(
        "parsed {} factories, {} countries, {} children",
        factories.len(),
        countries.len(),
        children.len()
    );

    Ok(Problem {
        factories,
        countries,
        children,
    })
}

fn positive_count(what: &'static str, value: i64) -> Result<usize, Error> {
    match usize::try_from(value) {
        Ok(count) if count > 0 => Ok(count),
        _ => Err(Error::NonPositiveCount { what, value }),
    }
}

/// Line cursor that turns each line into a record of integers.
struct Records<'a> {
    lines: Lines<'a>,
    line: usize,
}

impl<'a> Records<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            lines: input.lines(),
            line: 0,
        }
    }

    fn record(&mut self, what: &str) -> Result<Vec<i64>, Error> {
        self.line += 1;
        let Some(line) = self.lines.next() else {
            return Err(self.malformed(format!("missing {what} record")));
        };

        line.split_whitespace()
            .map(|token| {
                token.parse::<i64>().map_err(|_| {
                    self.malformed(format!("invalid integer {token:?} in {what} record"))
                })
            })
            .collect()
    }

    fn fixed<const N: usize>(&mut self, what: &str) -> Result<[i64; N], Error> {
        let fields = self.record(what)?;
        let found = fields.len();
        fields.try_into().map_err(|_| {
            self.malformed(format!("{what} record needs {} fields, found {found}", N))
        })
    }

    fn malformed(&self, reason: impl Into<String>) -> Error {
        Error::Malformed {
            line: self.line,
            reason: reason.into(),
        }
    }
}
