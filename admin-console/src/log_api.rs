use chrono::NaiveDate;
use common_http_errors::ApiResult;

use crate::client::{ApiClient, ApiRequest};
use crate::models::{EmailAnalytics, EmailLog, LogFilter, Page};

const LOGS_PATH: &str = "/logs/emails/";
const ANALYTICS_PATH: &str = "/logs/emails/analytics/";

#[derive(Clone)]
pub struct LogsApi {
    client: ApiClient,
}

impl LogsApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, filter: &LogFilter) -> ApiResult<Page<EmailLog>> {
        let request = ApiRequest::get(LOGS_PATH)
            .query_opt("status", filter.status.as_deref().filter(|s| !s.is_empty()))
            .query_opt("batch", filter.batch)
            .query_opt("date_from", filter.date_from.map(format_date))
            .query_opt("date_to", filter.date_to.map(format_date))
            .query_opt("page", filter.page);
        self.client.execute(request).await
    }

    pub async fn analytics(
        &self,
        date_from: Option<NaiveDate>,
        date_to: Option<NaiveDate>,
    ) -> ApiResult<EmailAnalytics> {
        let request = ApiRequest::get(ANALYTICS_PATH)
            .query_opt("date_from", date_from.map(format_date))
            .query_opt("date_to", date_to.map(format_date));
        self.client.execute(request).await
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
