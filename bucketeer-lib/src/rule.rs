use std::collections::{BTreeMap, HashMap};

use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};

use crate::{filter::FilterGroup, transaction::Transaction};

/// Named, reusable predicate shared between buckets
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Rule {
    pub id: String,
    pub name: String,
    /// Top level group, a rule without one never matches
    #[serde(default)]
    pub filter_group: Option<FilterGroup>,
}

impl Rule {
    pub fn new(id: impl Into<String>, name: impl Into<String>, filter_group: FilterGroup) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            filter_group: Some(filter_group),
        }
    }

    /// Check if a transaction matches, using the local time zone for date parts
    pub fn matches(&self, transaction: &Transaction) -> bool {
        self.matches_in(transaction, &Local)
    }

    /// Check if a transaction matches, deriving date parts in `tz`
    pub fn matches_in<Tz: TimeZone>(&self, transaction: &Transaction, tz: &Tz) -> bool {
        match &self.filter_group {
            Some(group) => group.matches_in(transaction, tz),
            None => {
                log::warn!("rule {} has no filter group", self.id);
                false
            }
        }
    }
}

/// Resolve rules by id
pub trait RuleLookup {
    fn rule(&self, id: &str) -> Option<&Rule>;
}

impl RuleLookup for HashMap<String, Rule> {
    fn rule(&self, id: &str) -> Option<&Rule> {
        self.get(id)
    }
}

impl RuleLookup for BTreeMap<String, Rule> {
    fn rule(&self, id: &str) -> Option<&Rule> {
        self.get(id)
    }
}

impl RuleLookup for [Rule] {
    fn rule(&self, id: &str) -> Option<&Rule> {
        self.iter().find(|rule| rule.id == id)
    }
}

impl RuleLookup for Vec<Rule> {
    fn rule(&self, id: &str) -> Option<&Rule> {
        self.as_slice().rule(id)
    }
}

/// Index rules by id, later duplicates replace earlier ones
pub fn index_rules<'a, I>(rules: I) -> HashMap<String, Rule>
where
    I: IntoIterator<Item = &'a Rule>,
{
    rules
        .into_iter()
        .map(|rule| (rule.id.clone(), rule.clone()))
        .collect()
}
