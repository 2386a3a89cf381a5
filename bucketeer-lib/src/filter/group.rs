use chrono::TimeZone;

use super::{FilterGroup, LogicalOperator};
use crate::transaction::Transaction;

/// Evaluate a group and, unless short circuited, its sub-groups
///
/// An empty list is vacuously true under AND and false under OR, so a group
/// with nothing in it matches everything under AND and nothing under OR.
pub(super) fn evaluate<Tz: TimeZone>(
    transaction: &Transaction,
    group: &FilterGroup,
    tz: &Tz,
) -> bool {
    let mut conditions = group
        .conditions
        .iter()
        .map(|condition| condition.matches_in(transaction, tz));
    let conditions_result = match group.operator {
        LogicalOperator::And => conditions.all(|matched| matched),
        LogicalOperator::Or => conditions.any(|matched| matched),
    };

    if group.sub_groups.is_empty() {
        return conditions_result;
    }

    let mut sub_groups = group
        .sub_groups
        .iter()
        .map(|sub_group| evaluate(transaction, sub_group, tz));
    match group.operator {
        LogicalOperator::And => conditions_result && sub_groups.all(|matched| matched),
        LogicalOperator::Or => conditions_result || sub_groups.any(|matched| matched),
    }
}
