use bigdecimal::BigDecimal;
use chrono::{Datelike, NaiveDate, TimeZone, Timelike};

use super::Field;
use crate::transaction::Transaction;

/// Typed value extracted from a transaction field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(BigDecimal),
    Date(NaiveDate),
}

/// Extract the value of `field` from a transaction, deriving date parts in `tz`
///
/// Returns `None` for absent optional fields, unknown fields, and posted
/// times that do not map to a local time.
pub fn extract<Tz: TimeZone>(
    transaction: &Transaction,
    field: Field,
    tz: &Tz,
) -> Option<FieldValue> {
    let value = match field {
        Field::PayeeName => FieldValue::Text(transaction.payee.clone()?),
        Field::DescriptionText => FieldValue::Text(transaction.description.clone()),
        Field::OrgName => FieldValue::Text(transaction.org_name.clone()),
        Field::AccountName => FieldValue::Text(transaction.account_name.clone()),
        Field::AmountTransacted => FieldValue::Number(transaction.amount.clone()),
        Field::BalanceBefore => FieldValue::Number(transaction.balance_before.clone()?),
        Field::BalanceAfter => FieldValue::Number(transaction.balance_after.clone()?),
        Field::DayOfWeek => {
            let date = transaction.posted_date_in(tz)?;
            FieldValue::Number(date.weekday().num_days_from_sunday().into())
        }
        Field::WeekOfMonth => {
            let date = transaction.posted_date_in(tz)?;
            FieldValue::Number(week_of_month(date).into())
        }
        Field::MonthOfYear => {
            let date = transaction.posted_date_in(tz)?;
            FieldValue::Number(date.month0().into())
        }
        Field::TransactionTime => {
            let posted = transaction.posted_in(tz)?;
            FieldValue::Text(format!("{:02}:{:02}", posted.hour(), posted.minute()))
        }
        Field::PostedDate => FieldValue::Date(transaction.posted_date_in(tz)?),
        Field::Unknown => return None,
    };
    Some(value)
}

/// Week of the month containing `date`, starting at 1
///
/// `ceil((day_of_month + weekday_of_first) / 7)` with the weekday counted from
/// Sunday = 0. Weeks run Sunday to Saturday, so the first week may be short.
pub fn week_of_month(date: NaiveDate) -> u32 {
    let first_weekday = date
        .with_day(1)
        .map(|first| first.weekday().num_days_from_sunday())
        .unwrap_or_default();
    (date.day() + first_weekday).div_ceil(7)
}
