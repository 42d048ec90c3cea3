use serde::Serialize;
use strum::{AsRefStr, Display, EnumString};

/// Kinds of rows written to `app_events`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum EventType {
    View,
    Submit,
    Share,
    Error,
    AffiliateClick,
}

impl EventType {
    /// Daily counter bumped alongside the event, if any
    pub fn stat(&self) -> Option<StatType> {
        match self {
            Self::View => Some(StatType::Views),
            Self::Submit => Some(StatType::Submits),
            Self::Share => Some(StatType::Shares),
            Self::AffiliateClick => Some(StatType::AffiliateClicks),
            Self::Error => None,
        }
    }

    /// Events a client may report through the public events endpoint
    pub fn is_client_reportable(&self) -> bool {
        matches!(self, Self::Share | Self::AffiliateClick)
    }
}

/// Counter columns of `app_stats_daily`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum StatType {
    Views,
    Submits,
    Shares,
    AffiliateClicks,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyStats {
    pub app_id: String,
    pub date: String,
    pub views: i64,
    pub submits: i64,
    pub shares: i64,
    pub affiliate_clicks: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatTotals {
    pub views: i64,
    pub submits: i64,
    pub shares: i64,
    pub affiliate_clicks: i64,
    pub results: i64,
}

impl StatTotals {
    pub fn from_days(days: &[DailyStats], results: i64) -> Self {
        days.iter().fold(
            Self {
                results,
                ..Self::default()
            },
            |acc, day| Self {
                views: acc.views + day.views,
                submits: acc.submits + day.submits,
                shares: acc.shares + day.shares,
                affiliate_clicks: acc.affiliate_clicks + day.affiliate_clicks,
                results: acc.results,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_event_type_names() {
        assert_eq!(EventType::AffiliateClick.as_ref(), "affiliate_click");
        assert_eq!(EventType::from_str("share").unwrap(), EventType::Share);
        assert!(EventType::from_str("click").is_err());
        assert_eq!(StatType::AffiliateClicks.as_ref(), "affiliate_clicks");
        assert_eq!(EventType::Error.stat(), None);
    }
}
