use std::str::FromStr;

use anyhow::Result;
use bigdecimal::BigDecimal;
use chrono::{DateTime, TimeZone, Utc};
use test_case::test_case;

use crate::{
    budget::{Budget, Error, GoalStatus},
    transaction::{AccountSet, Transaction},
};

pub(crate) fn amount(value: &str) -> BigDecimal {
    BigDecimal::from_str(value).unwrap()
}

pub(crate) fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0).unwrap()
}

/// Checking account transaction posted at `posted`
pub(crate) fn transaction(
    id: &str,
    posted: DateTime<Utc>,
    value: &str,
    description: &str,
    payee: Option<&str>,
) -> Transaction {
    Transaction {
        id: id.to_string(),
        posted: posted.timestamp(),
        amount: amount(value),
        description: description.to_string(),
        payee: payee.map(str::to_string),
        org_name: "First Bank".to_string(),
        account_name: "Checking".to_string(),
        currency: "USD".to_string(),
        balance_before: None,
        balance_after: None,
    }
}

fn ids(transactions: &[&Transaction]) -> Vec<String> {
    transactions.iter().map(|t| t.id.clone()).collect()
}

#[test_case("tests/budget_empty.yaml", "tests/transactions_empty.csv", &[], &[]; "empty")]
#[test_case(
    "tests/budget_empty.yaml",
    "tests/transactions_simple.csv",
    &[],
    &["t1", "t2", "t3", "t4", "t5", "t6"];
    "no buckets"
)]
#[test_case(
    "tests/budget_simple.yaml",
    "tests/transactions_simple.csv",
    &[("food", "t1 t4"), ("shopping", "t2 t6"), ("savings", "t3")],
    &["t5"];
    "simple"
)]
fn test_classify(
    budget: &str,
    transactions: &str,
    expected_buckets: &[(&str, &str)],
    expected_uncategorized: &[&str],
) -> Result<()> {
    let budget = Budget::from_yaml_file(budget)?;
    let transactions = Transaction::from_csv_file(transactions)?;
    let classification = budget.classify_in(&transactions, &Utc);

    assert_eq!(classification.by_bucket.len(), expected_buckets.len());
    for (bucket_id, expected) in expected_buckets {
        let expected = expected.split_whitespace().collect::<Vec<_>>();
        assert_eq!(ids(classification.bucket(bucket_id)), expected, "{bucket_id}");
    }
    assert_eq!(ids(&classification.uncategorized), expected_uncategorized);
    assert_eq!(
        classification.categorized_count() + classification.uncategorized.len(),
        transactions.len()
    );
    Ok(())
}

#[test]
fn test_categorize_keeps_input_order() -> Result<()> {
    let budget = Budget::from_yaml_file("tests/budget_simple.yaml")?;
    let transactions = Transaction::from_csv_file("tests/transactions_simple.csv")?;
    let categorized = budget.categorize_in(&transactions, &Utc);

    let buckets = categorized
        .iter()
        .map(|t| t.bucket_name.as_deref())
        .collect::<Vec<_>>();
    assert_eq!(
        buckets,
        [
            Some("Food"),
            Some("Shopping"),
            Some("Savings"),
            Some("Food"),
            None,
            Some("Shopping"),
        ]
    );
    assert!(!categorized[4].is_categorized());
    assert_eq!(categorized[0].transaction, transactions[0]);
    Ok(())
}

#[test]
fn test_goal_progress_from_config() -> Result<()> {
    let budget = Budget::from_yaml_file("tests/budget_simple.yaml")?;
    let transactions = Transaction::from_csv_file("tests/transactions_simple.csv")?;
    let classification = budget.classify_in(&transactions, &Utc);
    let report = budget.goal_progress(&classification, &utc(2024, 3, 20, 12, 0));

    let buckets = report.iter().map(|r| r.bucket_id.as_str()).collect::<Vec<_>>();
    assert_eq!(buckets, ["food", "savings"]);

    let food = report[0].status.progress().unwrap();
    assert_eq!(food.current_sum, amount("-66.20"));
    assert_eq!(food.relevant_amount, amount("66.20"));
    assert_eq!(food.remaining, amount("333.80"));
    assert_eq!(food.progress_percentage, amount("16.55"));
    assert!(food.is_met_or_on_track);

    let savings = report[1].status.progress().unwrap();
    assert_eq!(savings.relevant_amount, amount("2500"));
    assert_eq!(savings.remaining, amount("2500"));
    assert_eq!(savings.progress_percentage, amount("50"));
    assert!(!savings.is_met_or_on_track);
    Ok(())
}

#[test]
fn test_goal_progress_outside_window() -> Result<()> {
    let budget = Budget::from_yaml_file("tests/budget_simple.yaml")?;
    let transactions = Transaction::from_csv_file("tests/transactions_simple.csv")?;
    let classification = budget.classify_in(&transactions, &Utc);
    let report = budget.goal_progress(&classification, &utc(2024, 7, 1, 0, 0));

    let GoalStatus::Progress(food) = &report[0].status else {
        panic!("food goal should be configured");
    };
    assert_eq!(food.transaction_count, 0);
    assert_eq!(food.relevant_amount, amount("0"));
    // the fixed range still covers March
    let savings = report[1].status.progress().unwrap();
    assert_eq!(savings.transaction_count, 1);
    Ok(())
}

#[test]
fn test_duplicate_rule_ids() {
    let result = Budget::from_yaml_file("tests/budget_duplicate_rules.yaml");
    match result {
        Err(Error::DuplicateRuleIds(ids)) => {
            assert_eq!(ids.into_iter().collect::<Vec<_>>(), ["amazon"])
        }
        other => panic!("expected duplicate rule ids, got {other:?}"),
    }
}

#[test]
fn test_duplicate_bucket_ids() {
    let yaml = r#"
buckets:
  - { id: food, name: Food, priority: 1 }
  - { id: food, name: Groceries, priority: 2 }
"#;
    assert!(matches!(
        Budget::from_yaml_buffer(yaml),
        Err(Error::DuplicateBucketIds(_))
    ));
}

#[test]
fn test_unknown_config_keys_rejected() {
    let yaml = r#"
buckets:
  - { id: food, name: Food, priority: 1, colour: green }
"#;
    assert!(matches!(
        Budget::from_yaml_buffer(yaml),
        Err(Error::SerdeYaml(_))
    ));
}

#[test]
fn test_account_set_flatten() -> Result<()> {
    let account_set = AccountSet::from_json_file("tests/account_set.json")?;
    let transactions = account_set.transactions();

    let order = transactions.iter().map(|t| t.id.as_str()).collect::<Vec<_>>();
    assert_eq!(order, ["a2", "a3", "b1", "a1"]);

    let balances = transactions
        .iter()
        .map(|t| (t.balance_before.clone(), t.balance_after.clone()))
        .collect::<Vec<_>>();
    assert_eq!(
        balances,
        [
            (Some(amount("50")), Some(amount("100"))),
            (Some(amount("55")), Some(amount("50"))),
            (None, None),
            (Some(amount("75")), Some(amount("55"))),
        ]
    );

    assert_eq!(transactions[2].org_name, "card.example");
    assert_eq!(transactions[2].account_name, "Card");
    assert_eq!(transactions[1].payee.as_deref(), Some("Amazon"));
    assert_eq!(transactions[0].org_name, "First Bank");
    Ok(())
}

#[test]
fn test_account_set_classify() -> Result<()> {
    let budget = Budget::from_yaml_file("tests/budget_simple.yaml")?;
    let transactions = AccountSet::from_json_file("tests/account_set.json")?.transactions();
    let classification = budget.classify_in(&transactions, &Utc);
    assert_eq!(ids(classification.bucket("food")), ["a1"]);
    assert_eq!(ids(classification.bucket("shopping")), ["a3"]);
    assert_eq!(ids(&classification.uncategorized), ["a2", "b1"]);
    Ok(())
}

#[test]
fn test_account_set_numeric_amounts_are_exact() -> Result<()> {
    let json = r#"{
  "accounts": [
    {
      "id": "acct-1",
      "name": "Checking",
      "currency": "USD",
      "balance": 100.3,
      "org": { "name": "First Bank" },
      "transactions": [
        { "id": "n1", "posted": 1710082800, "amount": -0.1, "description": "Fee" },
        { "id": "n2", "posted": 1710169200, "amount": 19, "description": "Refund" }
      ]
    }
  ]
}"#;
    let transactions = AccountSet::from_json_buffer(json)?.transactions();
    let amounts = transactions
        .iter()
        .map(|t| (t.id.as_str(), t.amount.clone()))
        .collect::<Vec<_>>();
    assert_eq!(amounts, [("n2", amount("19")), ("n1", amount("-0.1"))]);
    assert_eq!(transactions[0].balance_after, Some(amount("100.3")));
    assert_eq!(transactions[1].balance_after, Some(amount("81.3")));
    assert_eq!(transactions[1].balance_before, Some(amount("81.4")));
    Ok(())
}

#[test]
fn test_account_set_rejects_non_numeric_amount() {
    let json = r#"{"accounts":[{"id":"a","name":"A","currency":"USD","org":{},
        "transactions":[{"id":"x","posted":0,"amount":"twelve","description":"?"}]}]}"#;
    assert!(AccountSet::from_json_buffer(json).is_err());
}
