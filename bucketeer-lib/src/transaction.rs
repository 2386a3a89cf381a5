use std::{
    fs::File,
    io::{Cursor, Read},
    path::Path,
};

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, TimeZone};
use displaydoc::Display;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use thiserror::Error;

pub use account_set::*;

mod account_set;

#[derive(Error, Debug, Display)]
pub enum Error {
    /// io: {0}
    Io(#[from] std::io::Error),
    /// csv: {0}
    Csv(#[from] csv::Error),
    /// json: {0}
    Json(#[from] serde_json::Error),
}

/// Transaction as produced by the import layer
///
/// Amounts are read from their decimal text so they stay exact.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Transaction {
    /// Transaction identifier
    pub id: String,
    /// Posted time in seconds since the epoch
    pub posted: i64,
    /// Signed amount of the transaction
    #[serde_as(as = "DisplayFromStr")]
    pub amount: BigDecimal,
    /// Description of the transaction
    pub description: String,
    /// Payee of the transaction, when the institution reports one
    #[serde(default)]
    pub payee: Option<String>,
    /// Name of the organization holding the account
    pub org_name: String,
    /// Account the transaction applied to
    pub account_name: String,
    /// Currency code of the account
    pub currency: String,
    /// Account balance before the transaction
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub balance_before: Option<BigDecimal>,
    /// Account balance after the transaction
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub balance_after: Option<BigDecimal>,
}

impl Transaction {
    /// Create a new list of transactions from a csv file
    pub fn from_csv_file<P: AsRef<Path>>(path: P) -> Result<Vec<Self>, Error> {
        Self::from_reader(File::open(path)?)
    }

    /// Create a new list of transactions from a csv buffer
    pub fn from_csv_buffer<B: AsRef<[u8]>>(buffer: B) -> Result<Vec<Self>, Error> {
        Self::from_reader(Cursor::new(buffer))
    }

    fn from_reader<R: Read>(reader: R) -> Result<Vec<Self>, Error> {
        let mut reader = csv::Reader::from_reader(reader);
        Ok(reader.deserialize().collect::<Result<_, _>>()?)
    }

    /// Posted time in the given time zone, `None` if the timestamp is out of range
    pub fn posted_in<Tz: TimeZone>(&self, tz: &Tz) -> Option<DateTime<Tz>> {
        tz.timestamp_opt(self.posted, 0).single()
    }

    /// Calendar day the transaction was posted on in the given time zone
    pub fn posted_date_in<Tz: TimeZone>(&self, tz: &Tz) -> Option<NaiveDate> {
        self.posted_in(tz).map(|posted| posted.date_naive())
    }
}

/// Transaction together with the bucket it was classified into
///
/// Derived on every classification pass and never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorizedTransaction {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub bucket_id: Option<String>,
    pub bucket_name: Option<String>,
}

impl CategorizedTransaction {
    pub fn is_categorized(&self) -> bool {
        self.bucket_id.is_some()
    }
}
