//! Decoding of interleaved group results
//!
//! The groups API hands back a flat `name, value, name, value, ...`
//! array. This module splits it into ordered pairs and indexes the pairs
//! by cluster name so series can be joined on name rather than position.

use crate::error::{ReportError, ReportResult};
use std::collections::HashMap;

/// One decoded (cluster name, raw value) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValuePair {
    pub name: String,
    pub value: String,
}

/// A decoded metric series, ordered as delivered and indexed by name
#[derive(Debug, Clone)]
pub struct MetricSeries {
    attribute: String,
    pairs: Vec<ValuePair>,
    index: HashMap<String, usize>,
}

impl MetricSeries {
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Cluster names in delivery order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|p| p.name.as_str())
    }

    /// Raw value reported for a cluster
    pub fn get(&self, name: &str) -> Option<&str> {
        self.index.get(name).map(|&i| self.pairs[i].value.as_str())
    }

    /// Numeric value for a cluster, failing if absent or not a number
    pub fn number(&self, name: &str) -> ReportResult<f64> {
        let raw = self.get(name).ok_or_else(|| ReportError::MissingSample {
            cluster: name.to_string(),
            attribute: self.attribute.clone(),
        })?;
        parse_number(&self.attribute, raw)
    }
}

/// Split a flat interleaved array into ordered pairs
pub fn decode_pairs(attribute: &str, raw: &[String]) -> ReportResult<Vec<ValuePair>> {
    if raw.len() % 2 != 0 {
        return Err(ReportError::malformed(
            attribute,
            format!("odd number of elements ({})", raw.len()),
        ));
    }

    Ok(raw
        .chunks_exact(2)
        .map(|chunk| ValuePair {
            name: chunk[0].clone(),
            value: chunk[1].clone(),
        })
        .collect())
}

/// Decode a flat interleaved array into a name-indexed series
pub fn decode_series(attribute: &str, raw: &[String]) -> ReportResult<MetricSeries> {
    let pairs = decode_pairs(attribute, raw)?;

    let mut index = HashMap::with_capacity(pairs.len());
    for (i, pair) in pairs.iter().enumerate() {
        if index.insert(pair.name.clone(), i).is_some() {
            return Err(ReportError::malformed(
                attribute,
                format!("cluster {:?} appears more than once", pair.name),
            ));
        }
    }

    Ok(MetricSeries {
        attribute: attribute.to_string(),
        pairs,
        index,
    })
}

/// Parse a raw metric value as a finite number
pub fn parse_number(field: &str, raw: &str) -> ReportResult<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ReportError::ValueFormat {
            field: field.to_string(),
            value: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_decode_even_length_preserves_order() {
        let pairs = decode_pairs("cpu", &raw(&["alpha", "1", "beta", "2", "gamma", "3"])).unwrap();

        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[0].name, "alpha");
        assert_eq!(pairs[0].value, "1");
        assert_eq!(pairs[2].name, "gamma");
        assert_eq!(pairs[2].value, "3");
    }

    #[test]
    fn test_decode_empty_array() {
        assert!(decode_pairs("cpu", &[]).unwrap().is_empty());
    }

    #[test]
    fn test_decode_odd_length_is_malformed() {
        let err = decode_pairs("cpu", &raw(&["alpha", "1", "beta"])).unwrap_err();
        assert!(matches!(err, ReportError::MalformedSeries { .. }));
    }

    #[test]
    fn test_series_lookup_by_name() {
        let series = decode_series("iops", &raw(&["alpha", "120", "beta", "4500.5"])).unwrap();

        assert_eq!(series.attribute(), "iops");
        assert_eq!(series.get("beta"), Some("4500.5"));
        assert_eq!(series.number("alpha").unwrap(), 120.0);
        assert_eq!(series.names().collect::<Vec<_>>(), vec!["alpha", "beta"]);
    }

    #[test]
    fn test_series_missing_name() {
        let series = decode_series("iops", &raw(&["alpha", "120"])).unwrap();
        let err = series.number("beta").unwrap_err();
        assert!(matches!(err, ReportError::MissingSample { .. }));
    }

    #[test]
    fn test_series_duplicate_name_is_malformed() {
        let err = decode_series("iops", &raw(&["alpha", "1", "alpha", "2"])).unwrap_err();
        assert!(matches!(err, ReportError::MalformedSeries { .. }));
    }

    #[test]
    fn test_parse_number_rejects_garbage() {
        assert_eq!(parse_number("cpu", " 453000 ").unwrap(), 453000.0);
        assert!(matches!(
            parse_number("cpu", "n/a"),
            Err(ReportError::ValueFormat { .. })
        ));
        assert!(matches!(
            parse_number("cpu", ""),
            Err(ReportError::ValueFormat { .. })
        ));
        assert!(matches!(
            parse_number("cpu", "NaN"),
            Err(ReportError::ValueFormat { .. })
        ));
    }
}
