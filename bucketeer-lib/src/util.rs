use std::{collections::HashSet, hash::Hash, str::FromStr};

use bigdecimal::{BigDecimal, RoundingMode, Signed};
use chrono::{NaiveDate, TimeZone};
use serde::{de::Error as _, Deserialize, Deserializer, Serializer};
use serde_with::{DeserializeAs, SerializeAs};


/// Items that occur more than once
pub fn duplicates<T, I>(items: I) -> HashSet<T>
where
    T: Eq + Hash,
    I: IntoIterator<Item = T>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter_map(|item| {
            if seen.contains(&item) {
                Some(item)
            } else {
                seen.insert(item);
                None
            }
        })
        .collect()
}

/// `serde_with` adapter reading a decimal from a string, integer or float
///
/// Floats go through their shortest round trip text, so a configured `100.3`
/// is exactly 100.3 and not its nearest binary value. Serializes as a string.
pub struct ExactDecimal;

#[derive(Deserialize)]
#[serde(untagged)]
enum DecimalRepr {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl<'de> DeserializeAs<'de, BigDecimal> for ExactDecimal {
    fn deserialize_as<D: Deserializer<'de>>(deserializer: D) -> Result<BigDecimal, D::Error> {
        let text = match DecimalRepr::deserialize(deserializer)? {
            DecimalRepr::Integer(i) => return Ok(BigDecimal::from(i)),
            DecimalRepr::Float(f) => f.to_string(),
            DecimalRepr::Text(s) => s,
        };
        BigDecimal::from_str(text.trim())
            .map_err(|e| D::Error::custom(format!("invalid decimal {text:?}: {e}")))
    }
}

impl SerializeAs<BigDecimal> for ExactDecimal {
    fn serialize_as<S: Serializer>(source: &BigDecimal, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(source)
    }
}

/// Parse a calendar date, `YYYY-MM-DD` or anything `dateparser` understands
///
/// Timestamps are converted to the day they fall on in `tz`.
pub fn parse_date_in<Tz: TimeZone>(input: &str, tz: &Tz) -> Option<NaiveDate> {
    let input = input.trim();
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Some(date);
    }
    dateparser::parse_with_timezone(input, tz)
        .ok()
        .map(|parsed| parsed.with_timezone(tz).date_naive())
}

/// Format an amount for display: two decimals, thousands separators, currency code
pub fn format_amount(amount: &BigDecimal, currency: Option<&str>) -> String {
    let rounded = amount.with_scale_round(2, RoundingMode::HalfUp);
    let (digits, scale) = rounded.abs().as_bigint_and_exponent();
    let digits = format!("{:0>3}", digits.to_string());
    let (integer, fractional) = digits.split_at(digits.len() - scale as usize);

    let grouped = integer
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or_default())
        .collect::<Vec<_>>()
        .join(",");
    let sign = if rounded.is_negative() { "-" } else { "" };
    match currency {
        Some(currency) => format!("{sign}{grouped}.{fractional} {currency}"),
        None => format!("{sign}{grouped}.{fractional}"),
    }
}
