use std::collections::BTreeMap;

use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};
use serde_with::{formats::PreferMany, serde_as, OneOrMany};

use super::Goal;
use crate::{
    rule::RuleLookup,
    transaction::{CategorizedTransaction, Transaction},
};

/// Reference from a bucket to a global rule
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RuleAssociation {
    pub rule_id: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl RuleAssociation {
    pub fn active(rule_id: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.into(),
            is_active: true,
        }
    }

    pub fn inactive(rule_id: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.into(),
            is_active: false,
        }
    }
}

/// Budget category transactions are classified into
#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Bucket {
    pub id: String,
    pub name: String,
    /// Lower priorities are tried first
    pub priority: i64,
    /// Rules tried in order, one or many
    #[serde_as(as = "OneOrMany<_, PreferMany>")]
    #[serde(default)]
    pub rules: Vec<RuleAssociation>,
    #[serde(default)]
    pub goal: Option<Goal>,
}

impl Bucket {
    pub fn new(id: impl Into<String>, name: impl Into<String>, priority: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            priority,
            rules: Vec::new(),
            goal: None,
        }
    }

    pub fn with_rule(mut self, association: RuleAssociation) -> Self {
        self.rules.push(association);
        self
    }

    pub fn with_goal(mut self, goal: Goal) -> Self {
        self.goal = Some(goal);
        self
    }

    /// Whether any active rule of this bucket matches, first match wins
    fn matches<L, Tz>(&self, transaction: &Transaction, rules: &L, tz: &Tz) -> bool
    where
        L: RuleLookup + ?Sized,
        Tz: TimeZone,
    {
        self.rules
            .iter()
            .filter(|association| association.is_active)
            .filter_map(|association| rules.rule(&association.rule_id))
            .any(|rule| rule.matches_in(transaction, tz))
    }
}

/// Buckets sorted by ascending priority, ties keep configuration order
pub(crate) fn ordered_by_priority(buckets: &[Bucket]) -> Vec<&Bucket> {
    let mut ordered = buckets.iter().collect::<Vec<_>>();
    ordered.sort_by_key(|bucket| bucket.priority);
    ordered
}

/// Result of one classification pass
///
/// Every input transaction is in exactly one of `by_bucket` or
/// `uncategorized`, in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Classification<'a> {
    /// Transactions per bucket id, every configured bucket has an entry
    pub by_bucket: BTreeMap<String, Vec<&'a Transaction>>,
    pub uncategorized: Vec<&'a Transaction>,
}

impl<'a> Classification<'a> {
    /// Transactions classified into a bucket, empty for unknown ids
    pub fn bucket(&self, bucket_id: &str) -> &[&'a Transaction] {
        self.by_bucket
            .get(bucket_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn categorized_count(&self) -> usize {
        self.by_bucket.values().map(Vec::len).sum()
    }
}

/// Single pass, first match wins classifier
///
/// Buckets are tried by priority and within a bucket rules are tried in their
/// stored order. Inactive associations and unresolvable rule ids are skipped.
pub struct Classifier<'b, L: ?Sized, Tz> {
    buckets: Vec<&'b Bucket>,
    rules: &'b L,
    tz: Tz,
}

impl<'b, L: RuleLookup + ?Sized> Classifier<'b, L, Local> {
    pub fn local(buckets: &'b [Bucket], rules: &'b L) -> Self {
        Self::new(buckets, rules, Local)
    }
}

impl<'b, L, Tz> Classifier<'b, L, Tz>
where
    L: RuleLookup + ?Sized,
    Tz: TimeZone,
{
    pub fn new(buckets: &'b [Bucket], rules: &'b L, tz: Tz) -> Self {
        for bucket in buckets {
            for association in bucket.rules.iter().filter(|a| a.is_active) {
                if rules.rule(&association.rule_id).is_none() {
                    log::warn!(
                        "bucket {} references unknown rule {}, skipping it",
                        bucket.id,
                        association.rule_id
                    );
                }
            }
        }
        Self {
            buckets: ordered_by_priority(buckets),
            rules,
            tz,
        }
    }

    /// Buckets in the order they are tried
    pub fn buckets(&self) -> &[&'b Bucket] {
        &self.buckets
    }

    /// Bucket a transaction belongs to, `None` if uncategorized
    pub fn bucket_for(&self, transaction: &Transaction) -> Option<&'b Bucket> {
        self.buckets
            .iter()
            .find(|bucket| bucket.matches(transaction, self.rules, &self.tz))
            .copied()
    }

    /// Partition transactions into buckets and uncategorized
    pub fn classify<'a>(&self, transactions: &'a [Transaction]) -> Classification<'a> {
        let mut classification = Classification {
            by_bucket: self
                .buckets
                .iter()
                .map(|bucket| (bucket.id.clone(), Vec::new()))
                .collect(),
            uncategorized: Vec::new(),
        };
        for transaction in transactions {
            match self.bucket_for(transaction) {
                Some(bucket) => classification
                    .by_bucket
                    .entry(bucket.id.clone())
                    .or_default()
                    .push(transaction),
                None => {
                    log::debug!("no bucket matched transaction {}", transaction.id);
                    classification.uncategorized.push(transaction);
                }
            }
        }
        classification
    }

    /// Tag every transaction with its bucket, keeping input order
    pub fn categorize(&self, transactions: &[Transaction]) -> Vec<CategorizedTransaction> {
        transactions
            .iter()
            .map(|transaction| {
                let bucket = self.bucket_for(transaction);
                CategorizedTransaction {
                    transaction: transaction.clone(),
                    bucket_id: bucket.map(|b| b.id.clone()),
                    bucket_name: bucket.map(|b| b.name.clone()),
                }
            })
            .collect()
    }
}

/// Classify transactions in the local time zone
pub fn classify_transactions<'a, L>(
    transactions: &'a [Transaction],
    buckets: &[Bucket],
    rules: &L,
) -> Classification<'a>
where
    L: RuleLookup + ?Sized,
{
    Classifier::local(buckets, rules).classify(transactions)
}
