use std::{
    collections::HashSet,
    fs::File,
    io::{BufReader, Cursor, Read},
    path::Path,
};

use chrono::{DateTime, Local, TimeZone};
use displaydoc::Display;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    rule::{self, Rule},
    transaction::{CategorizedTransaction, Transaction},
    util,
};

pub use bucket::*;
pub use goal::*;

use bucket::ordered_by_priority;

mod bucket;
mod goal;


#[derive(Error, Debug, Display)]
pub enum Error {
    /// io: {0}
    Io(#[from] std::io::Error),
    /// serde_yaml: {0}
    SerdeYaml(#[from] serde_yaml::Error),
    /// duplicate rule ids: {0:?}
    DuplicateRuleIds(HashSet<String>),
    /// duplicate bucket ids: {0:?}
    DuplicateBucketIds(HashSet<String>),
}

/// Budget configuration
///
/// Rules are global and referenced by id from any number of buckets.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Budget {
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub buckets: Vec<Bucket>,
}

/// Goal progress of a single bucket
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketGoalProgress {
    pub bucket_id: String,
    pub bucket_name: String,
    pub status: GoalStatus,
}

impl Budget {
    /// Create a new budget from a yaml file
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Self::from_reader(File::open(path)?)
    }

    /// Create a new budget from a yaml buffer
    pub fn from_yaml_buffer<B: AsRef<[u8]>>(buffer: B) -> Result<Self, Error> {
        Self::from_reader(Cursor::new(buffer))
    }

    /// Create a new budget from a reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, Error> {
        let reader = BufReader::new(reader);
        let budget = serde_yaml::from_reader::<_, Self>(reader)?;
        budget.validate()?;
        Ok(budget)
    }

    /// Validate ids:
    /// * no duplicate rule ids
    /// * no duplicate bucket ids
    ///
    /// Buckets referencing unknown rules are allowed, classification skips
    /// those references.
    pub fn validate(&self) -> Result<(), Error> {
        let duplicates = util::duplicates(self.rules.iter().map(|r| r.id.as_str()));
        if !duplicates.is_empty() {
            return Err(Error::DuplicateRuleIds(
                duplicates.into_iter().map(|id| id.into()).collect(),
            ));
        }
        let duplicates = util::duplicates(self.buckets.iter().map(|b| b.id.as_str()));
        if !duplicates.is_empty() {
            return Err(Error::DuplicateBucketIds(
                duplicates.into_iter().map(|id| id.into()).collect(),
            ));
        }
        Ok(())
    }

    /// Classify transactions using the local time zone
    pub fn classify<'a>(&self, transactions: &'a [Transaction]) -> Classification<'a> {
        self.classify_in(transactions, &Local)
    }

    /// Classify transactions deriving date parts in `tz`
    pub fn classify_in<'a, Tz: TimeZone>(
        &self,
        transactions: &'a [Transaction],
        tz: &Tz,
    ) -> Classification<'a> {
        let rules = rule::index_rules(&self.rules);
        Classifier::new(&self.buckets, &rules, tz.clone()).classify(transactions)
    }

    /// Tag every transaction with its bucket, keeping input order
    pub fn categorize_in<Tz: TimeZone>(
        &self,
        transactions: &[Transaction],
        tz: &Tz,
    ) -> Vec<CategorizedTransaction> {
        let rules = rule::index_rules(&self.rules);
        Classifier::new(&self.buckets, &rules, tz.clone()).categorize(transactions)
    }

    /// Goal progress for every bucket with a goal, in priority order
    pub fn goal_progress<Tz: TimeZone>(
        &self,
        classification: &Classification<'_>,
        now: &DateTime<Tz>,
    ) -> Vec<BucketGoalProgress> {
        ordered_by_priority(&self.buckets)
            .into_iter()
            .filter_map(|bucket| {
                let goal = bucket.goal.as_ref()?;
                let transactions = classification.bucket(&bucket.id).iter().copied();
                Some(BucketGoalProgress {
                    bucket_id: bucket.id.clone(),
                    bucket_name: bucket.name.clone(),
                    status: compute_goal_progress(goal, transactions, now),
                })
            })
            .collect()
    }
}
