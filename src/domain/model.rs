use chrono::{DateTime, Utc};

/// API 回傳的原始 JSON，不做任何 schema 假設
pub type Payload = serde_json::Value;

/// 一次執行的 UTC 時間戳，用來命名檔案與物件 key。
///
/// Only meant to be human-traceable; two runs within the same second get the
/// same names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStamp(DateTime<Utc>);

impl RunStamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn at(time: DateTime<Utc>) -> Self {
        Self(time)
    }

    /// `api_YYYYMMDDHHMMSS.json`, the display name stored next to warehouse rows.
    pub fn file_name(&self) -> String {
        format!("api_{}.json", self.0.format("%Y%m%d%H%M%S"))
    }

    /// `YYYY/MM/DD/HHMMSS`, the date-partitioned part of an object key.
    pub fn object_path(&self) -> String {
        self.0.format("%Y/%m/%d/%H%M%S").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_file_name_uses_compact_timestamp() {
        let stamp = RunStamp::at(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap());
        assert_eq!(stamp.file_name(), "api_20240101120000.json");
    }

    #[test]
    fn test_object_path_is_zero_padded() {
        let stamp = RunStamp::at(Utc.with_ymd_and_hms(2025, 3, 7, 4, 5, 9).unwrap());
        assert_eq!(stamp.object_path(), "2025/03/07/040509");
    }

    #[test]
    fn test_stamps_order_with_time() {
        let earlier = RunStamp::at(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let later = RunStamp::at(Utc.with_ymd_and_hms(2024, 1, 1, 23, 59, 59).unwrap());
        assert!(earlier.file_name() < later.file_name());
        assert!(earlier.object_path() < later.object_path());
    }
}
