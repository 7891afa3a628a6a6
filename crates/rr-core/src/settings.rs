//! # Engine Settings
//!
//! Tunables for scoring, the voting window, and the group cache.
//! Defaults reproduce the reference deployment: one week to vote,
//! 432 points per vote (a day's worth of seconds divided by 200 votes),
//! 60 second group cache, 25 items per page.

use std::time::Duration;

use serde::Deserialize;

use crate::error::{AppError, Result};

pub const ONE_WEEK_IN_SECONDS: u64 = 7 * 24 * 3600;
pub const VOTE_SCORE: f64 = 432.0;
pub const ITEMS_PER_PAGE: usize = 25;
pub const GROUP_CACHE_TTL_SECONDS: u64 = 60;
/// Extra lifetime of a vote record past the voting window. The record must
/// outlive the window so it can never be recreated empty while votes are open.
pub const VOTE_RECORD_SLACK_SECONDS: u64 = 24 * 3600;

// Windows and TTLs are added to `i64` timestamps.
const MAX_DURATION_SECS: u64 = i64::MAX as u64;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Score added per accepted vote.
    pub vote_weight: f64,
    /// Score added to the creation timestamp at submission.
    pub base_weight: f64,
    pub voting_window_secs: u64,
    pub group_cache_ttl_secs: u64,
    pub page_size: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            vote_weight: VOTE_SCORE,
            base_weight: VOTE_SCORE,
            voting_window_secs: ONE_WEEK_IN_SECONDS,
            group_cache_ttl_secs: GROUP_CACHE_TTL_SECONDS,
            page_size: ITEMS_PER_PAGE,
        }
    }
}

impl EngineSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.vote_weight.is_finite() && self.vote_weight > 0.0) {
            return Err(AppError::validation("vote_weight must be a positive number"));
        }
        if !(self.base_weight.is_finite() && self.base_weight >= 0.0) {
            return Err(AppError::validation("base_weight must be a non-negative number"));
        }
        if !(1..=MAX_DURATION_SECS).contains(&self.voting_window_secs) {
            return Err(AppError::validation("voting_window_secs is out of range"));
        }
        if !(1..=MAX_DURATION_SECS).contains(&self.group_cache_ttl_secs) {
            return Err(AppError::validation("group_cache_ttl_secs is out of range"));
        }
        if self.page_size == 0 {
            return Err(AppError::validation("page_size must be greater than zero"));
        }
        Ok(())
    }

    pub fn voting_window(&self) -> Duration {
        Duration::from_secs(self.voting_window_secs)
    }

    /// Lifetime of a vote record: the voting window plus slack.
    pub fn vote_record_ttl(&self) -> Duration {
        Duration::from_secs(self.voting_window_secs.saturating_add(VOTE_RECORD_SLACK_SECONDS))
    }

    /// The voting window as a signed offset from timestamps.
    pub fn voting_window_offset(&self) -> i64 {
        i64::try_from(self.voting_window_secs).unwrap_or(i64::MAX)
    }

    pub fn group_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.group_cache_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = EngineSettings::default();
        settings.validate().unwrap();
        assert_eq!(settings.voting_window_secs, 604_800);
        assert_eq!(settings.vote_weight, 432.0);
    }

    #[test]
    fn partial_input_keeps_defaults() {
        let settings: EngineSettings = serde_json::from_str(r#"{"page_size": 10}"#).unwrap();
        assert_eq!(settings.page_size, 10);
        assert_eq!(settings.group_cache_ttl_secs, 60);
    }

    #[test]
    fn rejects_zero_page_size_and_negative_weight() {
        let zero_page = EngineSettings { page_size: 0, ..Default::default() };
        assert!(matches!(zero_page.validate(), Err(AppError::Validation(_))));

        let negative = EngineSettings { vote_weight: -1.0, ..Default::default() };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn rejects_windows_that_do_not_fit_a_timestamp() {
        let huge_window = EngineSettings { voting_window_secs: 1 << 63, ..Default::default() };
        assert!(matches!(huge_window.validate(), Err(AppError::Validation(_))));

        let huge_ttl = EngineSettings { group_cache_ttl_secs: u64::MAX, ..Default::default() };
        assert!(matches!(huge_ttl.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn vote_record_outlives_the_window() {
        let settings = EngineSettings::default();
        assert!(settings.vote_record_ttl() > settings.voting_window());
        assert_eq!(settings.vote_record_ttl().as_secs(), 604_800 + 86_400);
    }
}
