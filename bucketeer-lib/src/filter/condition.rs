use std::sync::OnceLock;

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, TimeZone};
use regex::{Regex, RegexBuilder};

use super::{extract, Field, FieldValue, FilterCondition, Operator};
use crate::transaction::Transaction;

/// Evaluate a single condition, any failure is a non-match
pub(super) fn evaluate<Tz: TimeZone>(
    transaction: &Transaction,
    condition: &FilterCondition,
    tz: &Tz,
) -> bool {
    if condition.field == Field::Unknown {
        return false;
    }
    let result = match extract(transaction, condition.field, tz) {
        Some(FieldValue::Text(value)) => matches_text(&value, condition),
        Some(FieldValue::Number(value)) => matches_number(value, condition),
        Some(FieldValue::Date(value)) => matches_date(value, condition, tz),
        // A missing value only equals an explicit null. `notEqualTo` is false
        // here, two nulls are not unequal.
        None => Some(condition.operator == Operator::EqualTo && condition.value.is_none()),
    };
    result.unwrap_or(false)
}

fn matches_text(value: &str, condition: &FilterCondition) -> Option<bool> {
    let target = condition.value.as_ref()?.as_text();
    if condition.operator == Operator::Regex {
        return condition.regex.is_match(&condition.id, &target, value);
    }

    let value = value.to_lowercase();
    let target = target.to_lowercase();
    let result = match condition.operator {
        Operator::ExactMatch => value == target,
        Operator::Contains => value.contains(&target),
        Operator::DoesNotContain => !value.contains(&target),
        Operator::StartsWith => value.starts_with(&target),
        Operator::EndsWith => value.ends_with(&target),
        _ => return None,
    };
    Some(result)
}

fn matches_number(value: BigDecimal, condition: &FilterCondition) -> Option<bool> {
    let value = if condition.use_absolute_amount {
        value.abs()
    } else {
        value
    };
    let target = condition.value.as_ref()?.as_number()?;
    let result = match condition.operator {
        Operator::EqualTo => value == target,
        Operator::NotEqualTo => value != target,
        Operator::GreaterThan => value > target,
        Operator::LessThan => value < target,
        Operator::GreaterThanOrEqualTo => value >= target,
        Operator::LessThanOrEqualTo => value <= target,
        Operator::Between => {
            let upper = condition.value2.as_ref()?.as_number()?;
            target <= value && value <= upper
        }
        _ => return None,
    };
    Some(result)
}

fn matches_date<Tz: TimeZone>(
    value: NaiveDate,
    condition: &FilterCondition,
    tz: &Tz,
) -> Option<bool> {
    let target = condition.value.as_ref()?.as_date_in(tz)?;
    let result = match condition.operator {
        Operator::OnDate => value == target,
        Operator::BeforeDate => value < target,
        Operator::AfterDate => value > target,
        Operator::BetweenDates => {
            let upper = condition.value2.as_ref()?.as_date_in(tz)?;
            target <= value && value <= upper
        }
        _ => return None,
    };
    Some(result)
}

/// Case-insensitive regex of a condition, compiled on first use
///
/// Never part of equality. A pattern that no longer matches the cached one
/// is compiled again without replacing the cache.
#[derive(Debug, Clone, Default)]
pub(super) struct RegexCache(OnceLock<CompiledPattern>);

#[derive(Debug, Clone)]
struct CompiledPattern {
    pattern: String,
    /// `None` if the pattern does not compile
    regex: Option<Regex>,
}

impl CompiledPattern {
    fn new(condition_id: &str, pattern: &str) -> Self {
        let regex = match RegexBuilder::new(pattern).case_insensitive(true).build() {
            Ok(regex) => Some(regex),
            Err(e) => {
                log::warn!("condition {condition_id} has an invalid regex {pattern:?}: {e}");
                None
            }
        };
        Self {
            pattern: pattern.to_string(),
            regex,
        }
    }

    fn is_match(&self, value: &str) -> Option<bool> {
        self.regex.as_ref().map(|regex| regex.is_match(value))
    }
}

impl RegexCache {
    fn is_match(&self, condition_id: &str, pattern: &str, value: &str) -> Option<bool> {
        let compiled = self
            .0
            .get_or_init(|| CompiledPattern::new(condition_id, pattern));
        if compiled.pattern == pattern {
            compiled.is_match(value)
        } else {
            CompiledPattern::new(condition_id, pattern).is_match(value)
        }
    }

    /// Pattern compiled so far, `None` before the first evaluation
    #[cfg(test)]
    pub(super) fn cached_pattern(&self) -> Option<(&str, bool)> {
        self.0
            .get()
            .map(|compiled| (compiled.pattern.as_str(), compiled.regex.is_some()))
    }
}

impl PartialEq for RegexCache {
    fn eq(&self, _: &Self) -> bool {
        true
    }
}
