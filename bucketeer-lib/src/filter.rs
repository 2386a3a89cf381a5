use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{Local, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::{transaction::Transaction, util};

pub use value::*;

mod condition;
mod group;
mod value;


/// Transaction field a condition tests
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
    Serialize,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum Field {
    PayeeName,
    DescriptionText,
    OrgName,
    AccountName,
    AmountTransacted,
    BalanceBefore,
    BalanceAfter,
    /// 0 (Sunday) to 6 (Saturday)
    DayOfWeek,
    /// 1 based, see [`week_of_month`]
    WeekOfMonth,
    /// 0 (January) to 11 (December)
    MonthOfYear,
    /// "HH:MM", 24 hour clock
    TransactionTime,
    PostedDate,
    /// Any identifier this version does not know, never matches
    #[serde(other)]
    #[strum(serialize = "unknown")]
    Unknown,
}

/// Comparison applied between a field value and the condition value(s)
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
    Serialize,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum Operator {
    // string
    ExactMatch,
    Contains,
    DoesNotContain,
    StartsWith,
    EndsWith,
    Regex,
    // numeric
    EqualTo,
    NotEqualTo,
    GreaterThan,
    LessThan,
    GreaterThanOrEqualTo,
    LessThanOrEqualTo,
    Between,
    // date
    OnDate,
    BeforeDate,
    AfterDate,
    BetweenDates,
    /// Any identifier this version does not know, never matches
    #[serde(other)]
    #[strum(serialize = "unknown")]
    Unknown,
}

/// How a group combines its conditions and sub-groups
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Display, Serialize)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
}

/// Raw value configured on a condition
///
/// Kept untyped until evaluation so that a value which does not fit its
/// operator only fails that one condition.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl FilterValue {
    /// Text interpretation
    ///
    /// Floats keep a fractional part, so `1.0` stays `"1.0"`. Trailing zeros
    /// beyond that are not kept: `1.50` reads back as `"1.5"`. Quote the value
    /// in the config to compare an exact lexeme.
    pub fn as_text(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Integer(i) => i.to_string(),
            Self::Float(f) => format!("{f:?}"),
            Self::Text(s) => s.clone(),
        }
    }

    /// Numeric interpretation, `None` if the value is not a number
    pub fn as_number(&self) -> Option<BigDecimal> {
        match self {
            Self::Bool(_) => None,
            Self::Integer(i) => Some(BigDecimal::from(*i)),
            // Shortest round trip representation, so 9.99 stays 9.99
            Self::Float(f) if f.is_finite() => BigDecimal::from_str(&f.to_string()).ok(),
            Self::Float(_) => None,
            Self::Text(s) => BigDecimal::from_str(s.trim()).ok(),
        }
    }

    /// Calendar date interpretation in the given time zone
    pub fn as_date_in<Tz: TimeZone>(&self, tz: &Tz) -> Option<NaiveDate> {
        match self {
            Self::Text(s) => util::parse_date_in(s, tz),
            _ => None,
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i32> for FilterValue {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// A single leaf predicate
///
/// A regex pattern is compiled on first evaluation and reused after that.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FilterCondition {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub field: Field,
    pub operator: Operator,
    /// Primary comparison value, `None` when explicitly null
    #[serde(default)]
    pub value: Option<FilterValue>,
    /// Upper bound for the between operators
    #[serde(default)]
    pub value2: Option<FilterValue>,
    /// Compare `abs(value)` for numeric operators
    #[serde(default)]
    pub use_absolute_amount: bool,
    #[serde(skip)]
    regex: condition::RegexCache,
}

impl FilterCondition {
    pub fn new(
        id: impl Into<String>,
        field: Field,
        operator: Operator,
        value: impl Into<FilterValue>,
    ) -> Self {
        Self {
            id: id.into(),
            name: None,
            field,
            operator,
            value: Some(value.into()),
            value2: None,
            use_absolute_amount: false,
            regex: Default::default(),
        }
    }

    pub fn with_value2(mut self, value2: impl Into<FilterValue>) -> Self {
        self.value2 = Some(value2.into());
        self
    }

    pub fn with_absolute_amount(mut self) -> Self {
        self.use_absolute_amount = true;
        self
    }

    /// Check if a transaction matches, using the local time zone for date parts
    pub fn matches(&self, transaction: &Transaction) -> bool {
        self.matches_in(transaction, &Local)
    }

    /// Check if a transaction matches, deriving date parts in `tz`
    pub fn matches_in<Tz: TimeZone>(&self, transaction: &Transaction, tz: &Tz) -> bool {
        condition::evaluate(transaction, self, tz)
    }
}

/// Node of a boolean expression tree
///
/// Conditions and sub-groups are combined with the same operator, as one set.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FilterGroup {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub operator: LogicalOperator,
    #[serde(default)]
    pub conditions: Vec<FilterCondition>,
    #[serde(default)]
    pub sub_groups: Vec<FilterGroup>,
}

impl FilterGroup {
    pub fn new(id: impl Into<String>, operator: LogicalOperator) -> Self {
        Self {
            id: id.into(),
            operator,
            ..Default::default()
        }
    }

    pub fn with_condition(mut self, condition: FilterCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_sub_group(mut self, group: FilterGroup) -> Self {
        self.sub_groups.push(group);
        self
    }

    /// Check if a transaction matches, using the local time zone for date parts
    pub fn matches(&self, transaction: &Transaction) -> bool {
        self.matches_in(transaction, &Local)
    }

    /// Check if a transaction matches, deriving date parts in `tz`
    pub fn matches_in<Tz: TimeZone>(&self, transaction: &Transaction, tz: &Tz) -> bool {
        group::evaluate(transaction, self, tz)
    }
}

/// Evaluate one condition against a transaction in the local time zone
pub fn evaluate_condition(transaction: &Transaction, condition: &FilterCondition) -> bool {
    condition.matches(transaction)
}

/// Evaluate a filter group tree against a transaction in the local time zone
pub fn evaluate_filter_group(transaction: &Transaction, group: &FilterGroup) -> bool {
    group.matches(transaction)
}
