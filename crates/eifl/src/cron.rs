//! Five-field classic cron (`minute hour day-of-month month day-of-week`),
//! UTC only. No seconds field, no `@yearly`-style aliases, no step ranges
//! beyond `*/N` — this grammar stays deliberately small, matching the
//! scope of everything else schedule-related in this crate.

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use eifl_types::{EiflError, Result};

/// Scan bound so a field set that can never match (an impossible
/// day-of-month/month combination, for instance) fails closed instead of
/// looping forever.
const MAX_SCAN: Duration = Duration::days(4 * 366);

#[derive(Debug, Clone, PartialEq, Eq)]
struct FieldSet(Vec<u32>);

impl FieldSet {
    fn parse(field: &str, min: u32, max: u32) -> Result<Self> {
        let mut values = Vec::new();
        for part in field.split(',') {
            values.extend(Self::parse_part(part, min, max, field)?);
        }
        values.sort_unstable();
        values.dedup();
        if values.is_empty() {
            return Err(invalid(field, "field matches no values"));
        }
        Ok(Self(values))
    }

    fn parse_part(part: &str, min: u32, max: u32, whole: &str) -> Result<Vec<u32>> {
        if let Some(step_expr) = part.strip_prefix('*') {
            return if step_expr.is_empty() {
                Ok((min..=max).collect())
            } else if let Some(step) = step_expr.strip_prefix('/') {
                let step: u32 = step.parse().map_err(|_| invalid(whole, "invalid step"))?;
                if step == 0 {
                    return Err(invalid(whole, "step cannot be zero"));
                }
                Ok((min..=max).step_by(step as usize).collect())
            } else {
                Err(invalid(whole, "malformed `*` field"))
            };
        }

        if let Some((lo, hi)) = part.split_once('-') {
            let lo: u32 = lo.parse().map_err(|_| invalid(whole, "invalid range start"))?;
            let hi: u32 = hi.parse().map_err(|_| invalid(whole, "invalid range end"))?;
            if lo > hi || lo < min || hi > max {
                return Err(invalid(whole, "range out of bounds"));
            }
            return Ok((lo..=hi).collect());
        }

        let n: u32 = part.parse().map_err(|_| invalid(whole, "invalid value"))?;
        if n < min || n > max {
            return Err(invalid(whole, "value out of bounds"));
        }
        Ok(vec![n])
    }

    fn contains(&self, value: u32) -> bool {
        self.0.contains(&value)
    }

    /// True when the field is unrestricted (`*`), i.e. spans its full
    /// range — used for the day-of-month/day-of-week OR-quirk below.
    fn is_wildcard(&self, min: u32, max: u32) -> bool {
        self.0.len() as u32 == max - min + 1
    }
}

fn invalid(expr: &str, reason: &str) -> EiflError {
    EiflError::InvalidCron {
        expr: expr.to_string(),
        reason: reason.to_string(),
    }
}

/// A parsed five-field cron expression.
#[derive(Debug, Clone)]
pub struct CronSchedule {
    expr: String,
    minute: FieldSet,
    hour: FieldSet,
    day_of_month: FieldSet,
    month: FieldSet,
    day_of_week: FieldSet,
}

impl CronSchedule {
    pub fn parse(expr: &str) -> Result<Self> {
        let fields: Vec<&str> = expr.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(invalid(expr, "expected 5 whitespace-separated fields"));
        }
        Ok(Self {
            expr: expr.to_string(),
            minute: FieldSet::parse(fields[0], 0, 59)?,
            hour: FieldSet::parse(fields[1], 0, 23)?,
            day_of_month: FieldSet::parse(fields[2], 1, 31)?,
            month: FieldSet::parse(fields[3], 1, 12)?,
            day_of_week: FieldSet::parse(fields[4], 0, 6)?,
        })
    }

    fn matches(&self, candidate: &DateTime<Utc>) -> bool {
        if !self.minute.contains(candidate.minute())
            || !self.hour.contains(candidate.hour())
            || !self.month.contains(candidate.month())
        {
            return false;
        }

        let dom_matches = self.day_of_month.contains(candidate.day());
        // chrono's Weekday::num_days_from_sunday gives 0=Sunday, matching
        // classic cron's day-of-week numbering.
        let dow_matches = self.day_of_week.contains(candidate.weekday().num_days_from_sunday());

        let dom_wild = self.day_of_month.is_wildcard(1, 31);
        let dow_wild = self.day_of_week.is_wildcard(0, 6);

        match (dom_wild, dow_wild) {
            (true, true) => true,
            (false, true) => dom_matches,
            (true, false) => dow_matches,
            // Classic cron quirk: when both fields are restricted, a date
            // matches if *either* restriction is satisfied.
            (false, false) => dom_matches || dow_matches,
        }
    }

    /// The next UTC instant strictly after `reference` at which this
    /// expression fires, scanning minute by minute.
    pub fn next_after(&self, reference: DateTime<Utc>) -> Result<DateTime<Utc>> {
        let start = reference
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(reference)
            + Duration::minutes(1);

        let mut candidate = start;
        let deadline = start + MAX_SCAN;
        while candidate < deadline {
            if self.matches(&candidate) {
                return Ok(candidate);
            }
            candidate += Duration::minutes(1);
        }
        Err(invalid(&self.expr, "no matching instant within the scan horizon"))
    }
}

/// Convenience wrapper used by the scheduler: parse and evaluate in one
/// call, since callers never reuse a parsed schedule across ticks.
pub fn next_after(expr: &str, reference: DateTime<Utc>) -> Result<DateTime<Utc>> {
    CronSchedule::parse(expr)?.next_after(reference)
}
