//! Calendar-month usage windows and the usage summary built on top of them.

use chrono::{DateTime, Datelike, NaiveDate, Offset, TimeDelta, TimeZone, Utc};
use common::error::Res;
use db::{models::user::User, store::EmailStore};
use uuid::Uuid;

use crate::{
    dtos::sub::{Capabilities, MonthlyUsageSnapshot, PlanSummary, PlanUsageSummary, UsageBreakdown},
    models::{
        plan::PlanDefinition,
        usage::{MonthlyUsage, UsageWindow},
    },
};

/// Window from the first instant of `now`'s month to the first instant of
/// the next month, both taken in `now`'s timezone.
pub fn current_month_window<Tz: TimeZone>(now: &DateTime<Tz>) -> UsageWindow {
    let local = now.naive_local();
    let (year, month) = (local.year(), local.month());
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };

    UsageWindow {
        start: month_start(now, year, month),
        end: month_start(now, next_year, next_month),
    }
}

fn month_start<Tz: TimeZone>(now: &DateTime<Tz>, year: i32, month: u32) -> DateTime<Utc> {
    let midnight = NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .expect("first day of month is a valid date");

    match now.timezone().from_local_datetime(&midnight).earliest() {
        Some(start) => start.with_timezone(&Utc),
        // Midnight skipped by a DST change: shift by the current offset instead.
        None => {
            let offset = i64::from(now.offset().fix().local_minus_utc());
            Utc.from_utc_datetime(&(midnight - TimeDelta::seconds(offset)))
        }
    }
}

pub async fn count_usage_in_window(
    store: &dyn EmailStore,
    user_id: Uuid,
    window: &UsageWindow,
) -> Res<i64> {
    store
        .count_by_user_in_window(user_id, window.start, window.end)
        .await
}

/// Generations by the user in the month containing `now`.
pub async fn monthly_email_usage(
    store: &dyn EmailStore,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Res<MonthlyUsage> {
    let window = current_month_window(&now);
    let used = count_usage_in_window(store, user_id, &window).await?;
    Ok(MonthlyUsage {
        used,
        window_start: window.start,
        window_end: window.end,
    })
}

/// Composes the user-facing usage report.
///
/// `precomputed` is used verbatim when given, so a caller that has just
/// created an email can report it without re-reading the count.
pub async fn build_usage_summary(
    store: &dyn EmailStore,
    user: &User,
    plan: &PlanDefinition,
    now: DateTime<Utc>,
    precomputed: Option<MonthlyUsage>,
) -> Res<PlanUsageSummary> {
    let usage = match precomputed {
        Some(usage) => usage,
        None => monthly_email_usage(store, user.id, now).await?,
    };

    Ok(PlanUsageSummary {
        plan: PlanSummary {
            id: plan.id.clone(),
            name: plan.name.clone(),
            requires_payment: plan.requires_payment(),
            description: plan.description.clone(),
        },
        usage: UsageBreakdown {
            monthly_email_generations: MonthlyUsageSnapshot {
                used: usage.used,
                window_start: usage.window_start,
                window_end: usage.window_end,
                limit: plan.limits.monthly_email_generations,
            },
        },
        capabilities: Capabilities {
            max_regenerations_per_email: plan.limits.max_regenerations_per_email,
        },
    })
}
