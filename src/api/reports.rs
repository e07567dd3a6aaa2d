//! Aggregate Report Endpoints
//!
//! Daily summaries and the raw weighing log. The backend does all the
//! aggregation; these calls only shape the query string.

use chrono::NaiveDate;
use serde::Deserialize;

use super::dto::Page;
use super::{ApiClient, ApiResult};

/// Aggregated daily figures for one scale
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyReport {
    pub report_date: NaiveDate,
    pub scale_id: i64,
    pub scale_name: String,
    pub location_name: String,
    pub total_weighings: u64,
    pub total_weight: f64,
    pub average_weight: f64,
    pub min_weight: f64,
    pub max_weight: f64,
}

/// A single recorded weighing
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeighingLog {
    pub id: i64,
    pub scale_id: i64,
    pub scale_name: String,
    pub location_name: String,
    pub weight: f64,
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Filter for report queries; unset fields are omitted
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub scale_id: Option<i64>,
    pub location_id: Option<i64>,
}

impl ReportFilter {
    fn to_query(&self) -> String {
        let mut params = Vec::new();
        if let Some(start) = self.start_date {
            params.push(format!("startDate={}", start));
        }
        if let Some(end) = self.end_date {
            params.push(format!("endDate={}", end));
        }
        if let Some(id) = self.scale_id {
            params.push(format!("scaleId={}", id));
        }
        if let Some(id) = self.location_id {
            params.push(format!("locationId={}", id));
        }
        params.join("&")
    }
}

/// Aggregate report operations
pub struct ReportsApi<'a> {
    pub(super) client: &'a ApiClient,
}

impl ReportsApi<'_> {
    pub async fn daily(&self, filter: &ReportFilter) -> ApiResult<Vec<DailyReport>> {
        let query = filter.to_query();
        let path = if query.is_empty() {
            "/reports/daily".to_string()
        } else {
            format!("/reports/daily?{}", query)
        };
        self.client.get(&path).await
    }

    pub async fn weighings(
        &self,
        filter: &ReportFilter,
        page: u32,
        size: u32,
    ) -> ApiResult<Page<WeighingLog>> {
        let mut query = format!("page={}&size={}", page, size);
        let filter_query = filter.to_query();
        if !filter_query.is_empty() {
            query.push('&');
            query.push_str(&filter_query);
        }
        self.client
            .get(&format!("/reports/weighings?{}", query))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_query_string() {
        let filter = ReportFilter {
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            end_date: NaiveDate::from_ymd_opt(2024, 3, 31),
            scale_id: Some(7),
            location_id: None,
        };
        assert_eq!(
            filter.to_query(),
            "startDate=2024-03-01&endDate=2024-03-31&scaleId=7"
        );
    }

    #[test]
    fn test_empty_filter() {
        assert_eq!(ReportFilter::default().to_query(), "");
    }
}
