// src/services/course_sheet.rs

// Proxy para a planilha de cursos no Google Sheets (API v4, somente leitura).

use reqwest::Client;
use serde::Deserialize;

use crate::common::error::AppError;

pub const SHEETS_API_URL: &str = "https://sheets.googleapis.com";
pub const DEFAULT_SHEET_ID: &str = "1vNmBjrX9VDO3v-xXxHqrxCqAX_HsO2rxQom_pKa9EqQ";
pub const DEFAULT_SHEET_NAME: &str = "cursos";

#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub sheet_id: String,
    pub sheet_name: String,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            api_url: SHEETS_API_URL.to_string(),
            api_key: None,
            sheet_id: DEFAULT_SHEET_ID.to_string(),
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Clone)]
pub struct CourseSheetService {
    client: Client,
    config: SheetsConfig,
}

impl CourseSheetService {
    pub fn new(client: Client, config: SheetsConfig) -> Self {
        Self { client, config }
    }

    fn values_url(&self) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}",
            self.config.api_url.trim_end_matches('/'),
            self.config.sheet_id,
            self.config.sheet_name
        )
    }

    /// Linhas da planilha como vieram (a primeira costuma ser o cabeçalho).
    pub async fn fetch_rows(&self) -> Result<Vec<Vec<String>>, AppError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(AppError::MissingConfig("GOOGLE_SHEETS_API_KEY"))?;

        let response = self
            .client
            .get(self.values_url())
            .query(&[("key", api_key)])
            .send()
            .await
            .map_err(|e| AppError::CourseSheet(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::CourseSheet(format!("Google Sheets respondeu {}", status.as_u16())));
        }

        let range: ValueRange = response
            .json()
            .await
            .map_err(|e| AppError::CourseSheet(e.to_string()))?;

        Ok(range.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_points_at_the_configured_sheet() {
        let service = CourseSheetService::new(Client::new(), SheetsConfig::default());
        assert_eq!(
            service.values_url(),
            "https://sheets.googleapis.com/v4/spreadsheets/1vNmBjrX9VDO3v-xXxHqrxCqAX_HsO2rxQom_pKa9EqQ/values/cursos"
        );
    }

    #[test]
    fn empty_ranges_have_no_values() {
        let range: ValueRange = serde_json::from_str(r#"{"range":"cursos!A1:Z1000"}"#).unwrap();
        assert!(range.values.is_empty());
    }

    #[tokio::test]
    async fn missing_key_is_reported() {
        let service = CourseSheetService::new(Client::new(), SheetsConfig::default());
        let err = service.fetch_rows().await.unwrap_err();
        assert!(matches!(err, AppError::MissingConfig("GOOGLE_SHEETS_API_KEY")));
    }
}
