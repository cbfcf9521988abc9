//! Report lifecycle rules.
//!
//! A report starts `Pending` and moves exactly once, to `Resolved` or
//! `Dismissed`. Terminal states accept no further transitions. Resolving
//! does not touch the reported content; it only closes the report.

use serde::{Deserialize, Serialize};

pub const REASON_MIN_LEN: usize = 5;
pub const REASON_MAX_LEN: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Resolved,
    Dismissed,
}

impl ReportStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(ReportStatus::Pending),
            "resolved" => Some(ReportStatus::Resolved),
            "dismissed" => Some(ReportStatus::Dismissed),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Resolved => "resolved",
            ReportStatus::Dismissed => "dismissed",
        }
    }

    pub fn is_terminal(self) -> bool {
        self != ReportStatus::Pending
    }
}

/// Admin action on a pending report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportAction {
    Resolve,
    Dismiss,
}

impl ReportAction {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "resolve" => Some(ReportAction::Resolve),
            "dismiss" => Some(ReportAction::Dismiss),
            _ => None,
        }
    }

    pub fn target_status(self) -> ReportStatus {
        match self {
            ReportAction::Resolve => ReportStatus::Resolved,
            ReportAction::Dismiss => ReportStatus::Dismissed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetType {
    Photo,
    Comment,
}

impl TargetType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "photo" => Some(TargetType::Photo),
            "comment" => Some(TargetType::Comment),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TargetType::Photo => "photo",
            TargetType::Comment => "comment",
        }
    }
}

/// Trim and length-check a report reason. Returns the stored form.
pub fn validate_reason(raw: &str) -> Result<String, String> {
    let reason = raw.trim();
    if reason.chars().count() < REASON_MIN_LEN {
        return Err(format!(
            "Reason must be at least {} characters",
            REASON_MIN_LEN
        ));
    }
    if reason.chars().count() > REASON_MAX_LEN {
        return Err(format!(
            "Reason must be at most {} characters",
            REASON_MAX_LEN
        ));
    }
    Ok(reason.to_string())
}
