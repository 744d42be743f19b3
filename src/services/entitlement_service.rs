//! Premium entitlement evaluation
//!
//! Pure functions over stored account fields; no I/O. The handlers feed
//! these from the account row and combine the results into responses.

use time::{
    format_description::FormatItem, macros::format_description, Date, Duration, OffsetDateTime,
};

use crate::models::{
    common::SubscriptionStatus,
    entitlement::{AccessDenialReason, AnalysisAccess, FreeTrialStatus},
};

/// Length of the free trial that starts on registration day.
pub const FREE_TRIAL_DAYS: i64 = 7;

const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Whether the account currently counts as premium.
///
/// Clauses are OR'd; evaluation order mirrors the client rule, with the
/// trial window checked first and inclusive of day 7.
pub fn is_premium_user(
    subscription_status: SubscriptionStatus,
    usage_days: i64,
    b2b2c_org_id: Option<&str>,
    gift_code_active: bool,
) -> bool {
    // Free trial window
    if usage_days <= FREE_TRIAL_DAYS {
        return true;
    }

    // Paid subscription
    if subscription_status == SubscriptionStatus::Active {
        return true;
    }

    // B2B2C organization membership
    if b2b2c_org_id.is_some_and(|id| !id.is_empty()) {
        return true;
    }

    // Gift code
    if gift_code_active {
        return true;
    }

    false
}

/// Elapsed calendar days since registration, for the `usage_days` input
/// of [`is_premium_user`]. `None` when the date is absent or malformed.
pub fn usage_days_at(registration_date: Option<&str>, now: OffsetDateTime) -> Option<i64> {
    let registered = registration_date.and_then(parse_registration_date)?;
    Some((now.date() - registered).whole_days())
}

pub fn usage_days(registration_date: Option<&str>) -> Option<i64> {
    usage_days_at(registration_date, OffsetDateTime::now_utc())
}

/// Recompute the trial window from the stored registration date.
///
/// Fails soft: absent or unparseable dates yield an inactive status,
/// never an error.
pub fn check_free_trial_status(registration_date: Option<&str>) -> FreeTrialStatus {
    check_free_trial_status_at(registration_date, OffsetDateTime::now_utc())
}

pub fn check_free_trial_status_at(
    registration_date: Option<&str>,
    now: OffsetDateTime,
) -> FreeTrialStatus {
    let Some(registered) = registration_date.and_then(parse_registration_date) else {
        return FreeTrialStatus::inactive();
    };

    let trial_end = registered.midnight().assume_utc() + Duration::days(FREE_TRIAL_DAYS);
    let is_active = now < trial_end;
    let days_remaining = if is_active {
        // Ceiling of the remaining time in days
        (trial_end - now).whole_days() as i32 + 1
    } else {
        0
    };

    FreeTrialStatus {
        is_active,
        days_remaining,
        is_in_trial: is_active,
    }
}

/// Gate for the AI analysis feature.
///
/// Premium and in-trial users are gated only by their credit balance.
/// A lapsed free user is always denied, even with credits left over from
/// an earlier purchase.
pub fn can_access_analysis(
    total_credits: i32,
    is_premium: bool,
    is_trial_active: bool,
) -> AnalysisAccess {
    if is_premium || is_trial_active {
        return if total_credits > 0 {
            AnalysisAccess::allowed()
        } else {
            AnalysisAccess::denied(AccessDenialReason::InsufficientCredits)
        };
    }

    AnalysisAccess::denied(AccessDenialReason::MustSubscribe)
}

fn parse_registration_date(raw: &str) -> Option<Date> {
    Date::parse(raw.trim(), DATE_FORMAT).ok()
}
