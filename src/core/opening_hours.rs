use crate::domain::model::ScheduleEntry;
use chrono::{NaiveTime, Timelike};
use std::fmt;
use thiserror::Error;

/// 從午夜起算的分鐘數 (0..1440)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub fn from_time(time: &NaiveTime) -> Self {
        Self((time.hour() * 60 + time.minute()) as u16)
    }

    pub fn minutes(&self) -> u16 {
        self.0
    }

    pub fn hour(&self) -> u16 {
        self.0 / 60
    }

    pub fn minute(&self) -> u16 {
        self.0 % 60
    }

    /// 12 小時制顯示，例如 "8:00 AM"
    pub fn to_12_hour(&self) -> String {
        let (hour, suffix) = match self.hour() {
            0 => (12, "AM"),
            h @ 1..=11 => (h, "AM"),
            12 => (12, "PM"),
            h => (h - 12, "PM"),
        };
        format!("{}:{:02} {}", hour, self.minute(), suffix)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeParseError {
    #[error("time value is empty")]
    Empty,

    #[error("unrecognized time format: '{0}'")]
    UnrecognizedFormat(String),
}

const TWENTY_FOUR_HOUR_FORMATS: [&str; 2] = ["%H:%M:%S", "%H:%M"];
const TWELVE_HOUR_FORMATS: [&str; 2] = ["%I:%M %p", "%I:%M%p"];

/// 嚴格解析營業時間字串。
///
/// 接受 24 小時制 `HH:mm` / `HH:mm:ss` 以及 12 小時制 `h:mm AM`（AM/PM 前的空白可省略）。
/// 其他格式一律回傳錯誤，不做猜測。
pub fn parse_time_of_day(raw: &str) -> Result<TimeOfDay, TimeParseError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(TimeParseError::Empty);
    }

    let has_meridiem = {
        let upper = value.to_ascii_uppercase();
        upper.ends_with("AM") || upper.ends_with("PM")
    };
    let formats: &[&str] = if has_meridiem {
        &TWELVE_HOUR_FORMATS
    } else {
        &TWENTY_FOUR_HOUR_FORMATS
    };

    formats
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(value, fmt).ok())
        .map(|time| TimeOfDay::from_time(&time))
        .ok_or_else(|| TimeParseError::UnrecognizedFormat(value.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClosedReason {
    NoScheduleForToday,
    MarkedClosed,
    MissingTimes,
    UnparsableTime(TimeParseError),
    OutsideHours,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenVerdict {
    Open,
    Closed(ClosedReason),
}

impl OpenVerdict {
    pub fn is_open(&self) -> bool {
        matches!(self, OpenVerdict::Open)
    }
}

/// 依今天那一列營業時間判斷是否營業中。
///
/// 時間無法解析時視為「未營業」而不是錯誤，讀取路徑永遠有結果。
pub fn evaluate(row: Option<&ScheduleEntry>, now: TimeOfDay) -> OpenVerdict {
    let Some(row) = row else {
        return OpenVerdict::Closed(ClosedReason::NoScheduleForToday);
    };
    if row.is_closed {
        return OpenVerdict::Closed(ClosedReason::MarkedClosed);
    }

    let (Some(open_raw), Some(close_raw)) = (row.open_time.as_deref(), row.close_time.as_deref())
    else {
        return OpenVerdict::Closed(ClosedReason::MissingTimes);
    };

    let (open, close) = match (parse_time_of_day(open_raw), parse_time_of_day(close_raw)) {
        (Ok(open), Ok(close)) => (open, close),
        (Err(e), _) | (_, Err(e)) => {
            tracing::debug!(
                "Treating {:?} as closed: open='{}', close='{}' ({})",
                row.day,
                open_raw,
                close_raw,
                e
            );
            return OpenVerdict::Closed(ClosedReason::UnparsableTime(e));
        }
    };

    let open_now = if close < open {
        // 跨夜營業，例如 22:00 - 02:00
        now >= open || now <= close
    } else {
        open <= now && now <= close
    };

    if open_now {
        OpenVerdict::Open
    } else {
        OpenVerdict::Closed(ClosedReason::OutsideHours)
    }
}

pub fn is_open_now(row: Option<&ScheduleEntry>, now: TimeOfDay) -> bool {
    evaluate(row, now).is_open()
}
