//! Date-interval feature calculators
//!
//! Each calculator measures the days between two milestones of a contract
//! and flags contracts whose interval is unusually short compared to other
//! contracts of the same subject category.
//!
//! # Algorithm
//!
//! 1. Per base row, `days = end - start` (null if either date is missing)
//! 2. Per contract, the minimum over its rows (consortium members share
//!    dates, so this collapses the duplicates) and the first row's subject
//!    category
//! 3. Per subject category, the configured quantile of the non-null values
//! 4. `flag = days < threshold`; 0 when the interval is null, and null when
//!    the category has no threshold (no or too few observations)
//!
//! Every calculator also emits the raw day count.

use crate::core::dates::{days_between, min_days};
use crate::features::{any_flag, tabulate, FeatureContext};
use crate::models::contract::BaseRow;
use crate::models::feature::{flag_value, FeatureTable};
use crate::models::keys::ContractKey;
use crate::scoring::indicator::Indicator;
use crate::stats::{SegmentedThreshold, ThresholdDirection};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Thresholding parameters of the date-interval calculators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntervalConfig {
    /// Quantile below which an interval is flagged
    pub quantile: f64,

    /// Non-null intervals a category needs before it gets a threshold
    pub min_observations: usize,
}

impl Default for IntervalConfig {
    fn default() -> Self {
        Self {
            quantile: 0.1,
            min_observations: 1,
        }
    }
}

/// Per-contract interval and category
#[derive(Debug, Clone, PartialEq)]
struct ContractInterval {
    days: Option<i64>,
    category: String,
}

fn contract_intervals<F>(
    ctx: &FeatureContext<'_>,
    dates: F,
) -> BTreeMap<ContractKey, ContractInterval>
where
    F: Fn(&BaseRow) -> (Option<NaiveDate>, Option<NaiveDate>),
{
    let mut intervals: BTreeMap<ContractKey, ContractInterval> = BTreeMap::new();
    for row in ctx.base.rows() {
        let (start, end) = dates(row);
        let days = days_between(start, end);
        let entry = intervals
            .entry(row.contract_key())
            .or_insert_with(|| ContractInterval {
                days: None,
                category: row.subject_category.clone(),
            });
        entry.days = min_days(entry.days, days);
    }
    intervals
}

fn short_interval_table<F>(
    ctx: &FeatureContext<'_>,
    indicator: Indicator,
    days_column: &str,
    dates: F,
) -> FeatureTable<ContractKey>
where
    F: Fn(&BaseRow) -> (Option<NaiveDate>, Option<NaiveDate>),
{
    let config = &ctx.config.intervals;
    let intervals = contract_intervals(ctx, dates);

    let thresholds = SegmentedThreshold::fit(
        intervals
            .values()
            .map(|i| (i.category.clone(), i.days.map(|d| d as f64))),
        config.quantile,
        config.min_observations,
    );
    for category in thresholds.undefined_segments() {
        tracing::debug!(
            indicator = indicator.name(),
            category = %category,
            "no interval threshold for category; flags left null"
        );
    }

    tabulate(
        indicator.name(),
        &[indicator.name(), days_column],
        &ctx.populations.contracts,
        |key| match intervals.get(key) {
            Some(interval) => {
                let days = interval.days.map(|d| d as f64);
                let flag = match days {
                    Some(_) => thresholds.flag(&interval.category, days, ThresholdDirection::Below),
                    None => thresholds.threshold(&interval.category).map(|_| false),
                };
                vec![flag_value(flag), days]
            }
            None => vec![None, None],
        },
    )
}

/// Clarification meeting held unusually soon after publication
pub fn short_meeting_after_publication(ctx: &FeatureContext<'_>) -> FeatureTable<ContractKey> {
    short_interval_table(
        ctx,
        Indicator::ShortMeetingAfterPublication,
        "days_publication_to_meeting",
        |row| {
            (
                row.record.publication_date,
                row.record.clarification_meeting_date,
            )
        },
    )
}

/// Contract signed unusually soon after the clarification meeting
pub fn short_contract_after_meeting(ctx: &FeatureContext<'_>) -> FeatureTable<ContractKey> {
    short_interval_table(
        ctx,
        Indicator::ShortContractAfterMeeting,
        "days_meeting_to_contract",
        |row| (row.record.clarification_meeting_date, row.record.contract_date),
    )
}

/// Unusually short delivery period
pub fn short_delivery_period(ctx: &FeatureContext<'_>) -> FeatureTable<ContractKey> {
    short_interval_table(
        ctx,
        Indicator::ShortDeliveryPeriod,
        "delivery_days",
        |row| (row.record.delivery_start_date, row.record.delivery_end_date),
    )
}

/// Contract reported amendments (any of its rows)
pub fn had_amendments(ctx: &FeatureContext<'_>) -> FeatureTable<ContractKey> {
    let mut answers: BTreeMap<ContractKey, Vec<Option<bool>>> = BTreeMap::new();
    for row in ctx.base.rows() {
        answers
            .entry(row.contract_key())
            .or_default()
            .push(row.amendments_flag());
    }

    let name = Indicator::HadAmendments.name();
    tabulate(name, &[name], &ctx.populations.contracts, |key| {
        let flag = answers
            .get(key)
            .and_then(|flags| any_flag(flags.iter().copied()));
        vec![flag_value(flag)]
    })
}
