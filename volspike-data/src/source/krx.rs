use super::MarketDataSource;
use crate::{
    error::DataError,
    instrument::Ticker,
    market::Market,
    schema,
    session::SessionDate,
    snapshot::{RawRow, RawSnapshot},
};
use async_trait::async_trait;
use fnv::FnvHashMap;
use parking_lot::RwLock;
use reqwest::header::{REFERER, USER_AGENT};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// KRX data portal base url.
///
/// See: <http://data.krx.co.kr/contents/MDC/MAIN/main/index.cmd>
pub const BASE_URL_KRX: &str = "http://data.krx.co.kr";

/// Path of the generic JSON data endpoint every KRX statistics screen posts to.
pub const PATH_JSON_DATA: &str = "/comm/bldAttendant/getJsonData.cmd";

/// Referer the data portal expects on API requests.
pub const REFERER_KRX: &str = "http://data.krx.co.kr/contents/MDC/MDI/mdiLoader";

/// "All listed instruments - daily prices" statistics screen (volume & market cap per ticker).
pub const BLD_DAILY_BY_TICKER: &str = "dbms/MDC/STAT/standard/MDCSTAT01501";

/// Listed instrument finder (short code -> name).
pub const BLD_FINDER: &str = "dbms/comm/finder/finder_stkisu";

/// Per request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT_KRX: &str = "Mozilla/5.0 (compatible; volspike/0.1)";

/// Raw daily statistics response.
///
/// ### Raw Payload Example
/// ```json
/// {
///     "OutBlock_1": [
///         {
///             "ISU_SRT_CD": "005930",
///             "ISU_ABBRV": "삼성전자",
///             "MKT_NM": "KOSPI",
///             "TDD_CLSPRC": "78,000",
///             "ACC_TRDVOL": "12,345,678",
///             "MKTCAP": "465,634,212,000,000"
///         }
///     ],
///     "CURRENT_DATETIME": "2024.05.10 PM 06:00:00"
/// }
/// ```
#[derive(Debug, Deserialize)]
struct KrxDailyResponse {
    #[serde(rename = "OutBlock_1", default)]
    rows: Vec<RawRow>,
}

/// Raw finder response.
#[derive(Debug, Deserialize)]
struct KrxFinderResponse {
    #[serde(default)]
    block1: Vec<KrxFinderItem>,
}

#[derive(Debug, Deserialize)]
struct KrxFinderItem {
    short_code: String,
    #[serde(rename = "codeName")]
    code_name: String,
}

/// HTTP client for the KRX data portal.
///
/// Names seen in daily rows are cached so that resolving display names for a report rarely
/// needs extra requests.
#[derive(Debug)]
pub struct KrxClient {
    http: reqwest::Client,
    endpoint: Url,
    names: RwLock<FnvHashMap<Ticker, String>>,
}

impl KrxClient {
    /// Construct a client against `base_url` (eg/ [`BASE_URL_KRX`]).
    pub fn new(base_url: &str) -> Result<Self, DataError> {
        let endpoint = Url::parse(base_url)?.join(PATH_JSON_DATA)?;
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            endpoint,
            names: RwLock::new(FnvHashMap::default()),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn post_form<T>(&self, form: &[(&str, &str)]) -> Result<T, DataError>
    where
        T: DeserializeOwned,
    {
        let response = self
            .http
            .post(self.endpoint.clone())
            .header(REFERER, REFERER_KRX)
            .header(USER_AGENT, USER_AGENT_KRX)
            .form(form)
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(DataError::from)
    }

    /// Remember every (ticker, name) pair present in `rows`.
    fn cache_names(&self, rows: &[RawRow]) {
        let mut names = self.names.write();
        for row in rows {
            let ticker = schema::TICKER
                .keys()
                .find_map(|key| row.get(key))
                .and_then(Value::as_str);
            let name = schema::NAME
                .keys()
                .find_map(|key| row.get(key))
                .and_then(Value::as_str);

            if let (Some(ticker), Some(name)) = (ticker, name) {
                let name = name.trim();
                if !ticker.trim().is_empty() && !name.is_empty() {
                    names.insert(Ticker::new(ticker), name.to_string());
                }
            }
        }
    }

    fn cached_name(&self, ticker: &Ticker) -> Option<String> {
        self.names.read().get(ticker).cloned()
    }
}

#[async_trait]
impl MarketDataSource for KrxClient {
    async fn daily_snapshot(
        &self,
        session: SessionDate,
        market: Market,
    ) -> Result<RawSnapshot, DataError> {
        let trade_date = session.yyyymmdd();
        let response = self
            .post_form::<KrxDailyResponse>(&[
                ("bld", BLD_DAILY_BY_TICKER),
                ("mktId", market.krx_id()),
                ("trdDd", trade_date.as_str()),
                ("share", "1"),
                ("money", "1"),
                ("csvxls_isNo", "false"),
            ])
            .await?;

        debug!(%session, %market, rows = response.rows.len(), "fetched KRX daily rows");

        self.cache_names(&response.rows);
        Ok(RawSnapshot::new(response.rows))
    }

    async fn instrument_name(&self, ticker: &Ticker) -> Result<String, DataError> {
        if let Some(name) = self.cached_name(ticker) {
            return Ok(name);
        }

        let response = self
            .post_form::<KrxFinderResponse>(&[
                ("bld", BLD_FINDER),
                ("mktsel", "ALL"),
                ("typeNo", "0"),
                ("searchText", ticker.as_str()),
            ])
            .await?;

        let name = response
            .block1
            .into_iter()
            .find(|item| item.short_code.trim() == ticker.as_str())
            .map(|item| item.code_name.trim().to_string())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| DataError::NameUnavailable(ticker.clone()))?;

        self.names.write().insert(ticker.clone(), name.clone());
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_krx_client_endpoint() {
        let client = KrxClient::new(BASE_URL_KRX).unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            "http://data.krx.co.kr/comm/bldAttendant/getJsonData.cmd"
        );

        assert!(matches!(
            KrxClient::new("not a url"),
            Err(DataError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_de_krx_daily_response() {
        let input = json!({
            "OutBlock_1": [
                { "ISU_SRT_CD": "005930", "ISU_ABBRV": "삼성전자", "ACC_TRDVOL": "12,345,678" },
                { "ISU_SRT_CD": "000660", "ISU_ABBRV": "SK하이닉스", "ACC_TRDVOL": "3,210" }
            ],
            "CURRENT_DATETIME": "2024.05.10 PM 06:00:00"
        });

        let response = serde_json::from_value::<KrxDailyResponse>(input).unwrap();
        assert_eq!(response.rows.len(), 2);

        // Holiday responses carry no OutBlock_1 at all
        let holiday = serde_json::from_value::<KrxDailyResponse>(json!({})).unwrap();
        assert!(holiday.rows.is_empty());
    }

    #[tokio::test]
    async fn test_krx_client_names_cached_from_rows() {
        let client = KrxClient::new(BASE_URL_KRX).unwrap();
        let rows = serde_json::from_value::<KrxDailyResponse>(json!({
            "OutBlock_1": [
                { "ISU_SRT_CD": "005930", "ISU_ABBRV": " 삼성전자 " },
                { "ISU_SRT_CD": "000000", "ISU_ABBRV": "" }
            ]
        }))
        .unwrap()
        .rows;

        client.cache_names(&rows);

        assert_eq!(
            client.instrument_name(&Ticker::new("005930")).await.unwrap(),
            "삼성전자"
        );
        assert!(client.cached_name(&Ticker::new("000000")).is_none());
    }
}
