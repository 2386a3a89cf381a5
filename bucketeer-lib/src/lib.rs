//! Rule based transaction classification
//!
//! Transactions are matched against reusable [`rule::Rule`]s, each a tree of
//! [`filter::FilterGroup`]s, and assigned to the highest priority
//! [`budget::Bucket`] with a matching active rule. Buckets may carry a
//! [`budget::Goal`] whose progress is computed over the bucket's transactions.

pub mod budget;
pub mod filter;
pub mod rule;
pub mod transaction;
pub mod util;

#[cfg(test)]
mod tests;
