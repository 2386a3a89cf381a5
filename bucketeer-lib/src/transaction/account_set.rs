use std::{
    fs::File,
    io::{BufReader, Cursor, Read},
    path::Path,
};

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use super::{Error, Transaction};
use crate::util::ExactDecimal;

/// Account set payload returned by the aggregation service
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountSet {
    #[serde(default)]
    pub errors: Vec<String>,
    pub accounts: Vec<Account>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Organization {
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[serde_as]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub currency: String,
    /// Current balance, the balance after the most recent transaction
    #[serde_as(as = "Option<ExactDecimal>")]
    #[serde(default)]
    pub balance: Option<BigDecimal>,
    pub org: Organization,
    #[serde(default)]
    pub transactions: Vec<AccountTransaction>,
}

#[serde_as]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountTransaction {
    pub id: String,
    pub posted: i64,
    #[serde_as(as = "ExactDecimal")]
    pub amount: BigDecimal,
    pub description: String,
    #[serde(default)]
    pub payee: Option<String>,
}

impl AccountSet {
    /// Read an account set from a json file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Self::from_reader(File::open(path)?)
    }

    /// Read an account set from a json buffer
    pub fn from_json_buffer<B: AsRef<[u8]>>(buffer: B) -> Result<Self, Error> {
        Self::from_reader(Cursor::new(buffer))
    }

    fn from_reader<R: Read>(reader: R) -> Result<Self, Error> {
        Ok(serde_json::from_reader(BufReader::new(reader))?)
    }

    /// Flatten every account into a single list of transactions, newest first
    pub fn transactions(&self) -> Vec<Transaction> {
        for error in &self.errors {
            log::warn!("account set reported an error: {error}");
        }
        let mut transactions = self
            .accounts
            .iter()
            .flat_map(Account::transactions)
            .collect::<Vec<_>>();
        // Stable, so ties keep account order
        transactions.sort_by(|a, b| b.posted.cmp(&a.posted));
        transactions
    }
}

impl Account {
    /// Denormalize this account's transactions, computing running balances
    ///
    /// Balances are walked backwards from the current balance: the newest
    /// transaction ends at `balance`, and each older transaction ends where the
    /// next newer one began.
    pub fn transactions(&self) -> Vec<Transaction> {
        let org_name = self
            .org
            .name
            .clone()
            .or_else(|| self.org.domain.clone())
            .unwrap_or_default();

        let mut newest_first = self.transactions.iter().collect::<Vec<_>>();
        newest_first.sort_by(|a, b| b.posted.cmp(&a.posted));

        let mut balance_after = self.balance.clone();
        newest_first
            .into_iter()
            .map(|transaction| {
                let balance_before = balance_after
                    .as_ref()
                    .map(|after| after - &transaction.amount);
                let flattened = Transaction {
                    id: transaction.id.clone(),
                    posted: transaction.posted,
                    amount: transaction.amount.clone(),
                    description: transaction.description.clone(),
                    payee: transaction.payee.clone(),
                    org_name: org_name.clone(),
                    account_name: self.name.clone(),
                    currency: self.currency.clone(),
                    balance_before: balance_before.clone(),
                    balance_after: balance_after.take(),
                };
                balance_after = balance_before;
                flattened
            })
            .collect()
    }
}
