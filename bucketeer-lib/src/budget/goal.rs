use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Datelike, Days, Months, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use strum::Display;

use crate::{transaction::Transaction, util};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Display, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalType {
    /// Net inflow should reach the target
    Savings,
    /// Net outflow should stay within the target
    SpendingLimit,
}

/// Time window a goal is measured over
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "period_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalPeriod {
    CurrentMonth,
    /// The last `rolling_days` days, today included
    RollingDays {
        #[serde(default)]
        rolling_days: Option<i64>,
    },
    /// Calendar dates, both days included
    FixedDateRange {
        #[serde(default)]
        start_date: Option<String>,
        #[serde(default)]
        end_date: Option<String>,
    },
    CurrentYear,
    AllTime,
}

/// Savings or spending target attached to a bucket
#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Goal {
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub goal_type: GoalType,
    #[serde_as(as = "Option<util::ExactDecimal>")]
    #[serde(default)]
    pub target_amount: Option<BigDecimal>,
    #[serde(flatten)]
    pub period: GoalPeriod,
}

fn default_active() -> bool {
    true
}

impl Goal {
    pub fn new(goal_type: GoalType, target_amount: BigDecimal, period: GoalPeriod) -> Self {
        Self {
            is_active: true,
            goal_type,
            target_amount: Some(target_amount),
            period,
        }
    }

    pub fn savings(target_amount: BigDecimal, period: GoalPeriod) -> Self {
        Self::new(GoalType::Savings, target_amount, period)
    }

    pub fn spending_limit(target_amount: BigDecimal, period: GoalPeriod) -> Self {
        Self::new(GoalType::SpendingLimit, target_amount, period)
    }
}

/// Inclusive range of calendar days, an open side is unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn unbounded() -> Self {
        Self {
            start: None,
            end: None,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |start| start <= date) && self.end.map_or(true, |end| date <= end)
    }
}

impl GoalPeriod {
    /// Resolve the window relative to `now`, `None` if the period is misconfigured
    pub fn window<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<DateWindow> {
        let today = now.date_naive();
        let window = match self {
            Self::CurrentMonth => {
                let first = today.with_day(1)?;
                let last = first.checked_add_months(Months::new(1))?.pred_opt()?;
                DateWindow::new(first, last)
            }
            Self::RollingDays { rolling_days } => {
                let days = rolling_days.filter(|days| *days > 0)?;
                let start = today.checked_sub_days(Days::new(days as u64 - 1))?;
                DateWindow::new(start, today)
            }
            Self::FixedDateRange {
                start_date,
                end_date,
            } => {
                let tz = now.timezone();
                let start = util::parse_date_in(start_date.as_deref()?, &tz)?;
                let end = util::parse_date_in(end_date.as_deref()?, &tz)?;
                DateWindow::new(start, end)
            }
            Self::CurrentYear => DateWindow::new(
                NaiveDate::from_ymd_opt(today.year(), 1, 1)?,
                NaiveDate::from_ymd_opt(today.year(), 12, 31)?,
            ),
            Self::AllTime => DateWindow::unbounded(),
        };
        Some(window)
    }
}

/// Progress of an active goal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalProgress {
    pub goal_type: GoalType,
    pub target_amount: BigDecimal,
    /// Resolved window, `None` when the period is misconfigured
    pub window: Option<DateWindow>,
    /// Transactions that fell inside the window
    pub transaction_count: usize,
    /// Signed sum of amounts inside the window
    pub current_sum: BigDecimal,
    /// Amount counted towards the goal
    pub relevant_amount: BigDecimal,
    pub remaining: BigDecimal,
    pub is_met_or_on_track: bool,
    /// Percent of the target, rounded to two decimals
    pub progress_percentage: BigDecimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum GoalStatus {
    /// Goal inactive or without a target
    NotConfigured,
    Progress(GoalProgress),
}

impl GoalStatus {
    pub fn progress(&self) -> Option<&GoalProgress> {
        match self {
            Self::NotConfigured => None,
            Self::Progress(progress) => Some(progress),
        }
    }
}

/// Compute progress of a goal from the transactions classified into its bucket
///
/// Never fails: a misconfigured period yields zero progress that is not on
/// track.
pub fn compute_goal_progress<'a, I, Tz>(
    goal: &Goal,
    transactions: I,
    now: &DateTime<Tz>,
) -> GoalStatus
where
    I: IntoIterator<Item = &'a Transaction>,
    Tz: TimeZone,
{
    let target_amount = match (&goal.target_amount, goal.is_active) {
        (Some(target_amount), true) => target_amount.clone(),
        _ => return GoalStatus::NotConfigured,
    };

    let Some(window) = goal.period.window(now) else {
        log::warn!("goal period {:?} is misconfigured", goal.period);
        return GoalStatus::Progress(GoalProgress {
            goal_type: goal.goal_type,
            remaining: target_amount.clone(),
            target_amount,
            window: None,
            transaction_count: 0,
            current_sum: BigDecimal::zero(),
            relevant_amount: BigDecimal::zero(),
            is_met_or_on_track: false,
            progress_percentage: BigDecimal::zero(),
        });
    };

    let tz = now.timezone();
    let mut transaction_count = 0;
    let mut current_sum = BigDecimal::zero();
    for transaction in transactions {
        if transaction
            .posted_date_in(&tz)
            .is_some_and(|date| window.contains(date))
        {
            transaction_count += 1;
            current_sum += &transaction.amount;
        }
    }

    let relevant_amount = match goal.goal_type {
        GoalType::Savings => current_sum.clone(),
        GoalType::SpendingLimit => (-&current_sum).max(BigDecimal::zero()),
    };
    let remaining = (&target_amount - &relevant_amount).max(BigDecimal::zero());
    let is_met_or_on_track = match goal.goal_type {
        GoalType::Savings => relevant_amount >= target_amount,
        GoalType::SpendingLimit => relevant_amount <= target_amount,
    };
    let progress_percentage = if target_amount > BigDecimal::zero() {
        (&relevant_amount * BigDecimal::from(100) / &target_amount).round(2)
    } else if is_met_or_on_track {
        BigDecimal::from(100)
    } else {
        BigDecimal::zero()
    };

    GoalStatus::Progress(GoalProgress {
        goal_type: goal.goal_type,
        target_amount,
        window: Some(window),
        transaction_count,
        current_sum,
        relevant_amount,
        remaining,
        is_met_or_on_track,
        progress_percentage,
    })
}
