use crate::config::Config;
use crate::error::AppError;
use crate::region;
use governor::{
    clock::{Clock, DefaultClock},
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use serde::de::DeserializeOwned;
use std::num::NonZeroU32;
use std::thread;
use std::time::Duration;

use super::models::*;

const DDRAGON_VERSIONS_URL: &str = "https://ddragon.leagueoflegends.com/api/versions.json";

const MAX_RETRIES: u32 = 3;
const BACKOFF_START: Duration = Duration::from_secs(1);
const BACKOFF_CAP: Duration = Duration::from_secs(10);

pub struct RiotApiClient {
    agent: ureq::Agent,
    api_key: String,
    platform_base: String,
    regional_base: String,
    ddragon_versions_url: String,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    #[cfg(test)]
    slept: std::cell::RefCell<Vec<Duration>>,
}

impl RiotApiClient {
    /// Builds a client for the given platform. The regional host is always
    /// derived from the platform through the region table, so the two can
    /// never point at different shards.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let regional = region::resolve(&config.platform)?;
        Ok(Self::with_hosts(
            config.api_key.clone(),
            format!("https://{}.api.riotgames.com", config.platform),
            format!("https://{}.api.riotgames.com", regional.as_str()),
            DDRAGON_VERSIONS_URL.to_string(),
            config.timeout,
        ))
    }

    fn with_hosts(
        api_key: String,
        platform_base: String,
        regional_base: String,
        ddragon_versions_url: String,
        timeout: Duration,
    ) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        // 20 requests per second client-side quota, on top of the reactive
        // 429 handling
        let rate_limiter =
            RateLimiter::direct(Quota::per_second(NonZeroU32::new(20).unwrap()));
        RiotApiClient {
            agent,
            api_key,
            platform_base,
            regional_base,
            ddragon_versions_url,
            rate_limiter,
            #[cfg(test)]
            slept: std::cell::RefCell::new(Vec::new()),
        }
    }

    #[cfg(test)]
    pub(crate) fn for_tests(platform_base: String, regional_base: String) -> Self {
        Self::with_hosts(
            "TEST_KEY".to_string(),
            platform_base,
            regional_base.clone(),
            format!("{regional_base}/api/versions.json"),
            Duration::from_secs(2),
        )
    }

    fn wait_for_slot(&self) {
        let clock = DefaultClock::default();
        while let Err(not_until) = self.rate_limiter.check() {
            thread::sleep(not_until.wait_time_from(clock.now()));
        }
    }

    fn pause(&self, duration: Duration) {
        #[cfg(test)]
        {
            self.slept.borrow_mut().push(duration);
        }
        #[cfg(not(test))]
        thread::sleep(duration);
    }

    /// Issues one authenticated GET, retrying on 429 and classifying every
    /// other status.
    ///
    /// Rate limited responses honor a numeric `Retry-After` header; without
    /// one the wait doubles per retry from 1s, capped at 10s. After
    /// `MAX_RETRIES` reissues the call fails with `RateLimitExceeded`.
    fn execute(&self, url: &str, query: &[(&str, String)]) -> Result<String, AppError> {
        self.wait_for_slot();

        let mut attempt: u32 = 0;
        let mut backoff = BACKOFF_START;

        loop {
            let mut request = self
                .agent
                .get(url)
                .set("X-Riot-Token", &self.api_key);
            for (key, value) in query {
                request = request.query(key, value);
            }

            match request.call() {
                Ok(response) => {
                    return response
                        .into_string()
                        .map_err(|e| AppError::Http(e.to_string()));
                }
                Err(ureq::Error::Status(429, response)) => {
                    if attempt >= MAX_RETRIES {
                        return Err(AppError::RateLimitExceeded);
                    }
                    let wait = response
                        .header("Retry-After")
                        .and_then(|v| v.trim().parse::<u64>().ok())
                        .map(Duration::from_secs)
                        .unwrap_or(backoff);
                    self.pause(wait);
                    attempt += 1;
                    backoff = (backoff * 2).min(BACKOFF_CAP);
                }
                Err(ureq::Error::Status(401 | 403, response)) => {
                    let body = response.into_string().unwrap_or_default();
                    return Err(AppError::Unauthorized(body.trim().to_string()));
                }
                Err(ureq::Error::Status(404, _)) => {
                    return Err(AppError::NotFound);
                }
                Err(ureq::Error::Status(status, response)) => {
                    let body = response.into_string().unwrap_or_default();
                    return Err(AppError::UpstreamError { status, body });
                }
                Err(e) => {
                    return Err(AppError::Http(e.to_string()));
                }
            }
        }
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, AppError> {
        let body = self.execute(url, query)?;
        serde_json::from_str(&body).map_err(|e| AppError::Json(e.to_string()))
    }

    // Account-V1
    pub fn get_account_by_riot_id(
        &self,
        game_name: &str,
        tag_line: &str,
    ) -> Result<AccountDto, AppError> {
        let url = format!(
            "{}/riot/account/v1/accounts/by-riot-id/{}/{}",
            self.regional_base,
            urlencoding::encode(game_name),
            urlencoding::encode(tag_line)
        );
        self.get_json(&url, &[])
    }

    // Summoner-V4, legacy lookup by exact name
    pub fn get_summoner_by_name(&self, name: &str) -> Result<SummonerDto, AppError> {
        let url = format!(
            "{}/lol/summoner/v4/summoners/by-name/{}",
            self.platform_base,
            urlencoding::encode(name)
        );
        self.get_json(&url, &[])
    }

    pub fn get_summoner_by_puuid(&self, puuid: &str) -> Result<SummonerDto, AppError> {
        let url = format!(
            "{}/lol/summoner/v4/summoners/by-puuid/{}",
            self.platform_base,
            urlencoding::encode(puuid)
        );
        self.get_json(&url, &[])
    }

    // Match-V5
    pub fn get_match_ids_by_puuid(
        &self,
        puuid: &str,
        start: usize,
        count: usize,
        start_time: Option<i64>,
        end_time: Option<i64>,
    ) -> Result<Vec<String>, AppError> {
        let url = format!(
            "{}/lol/match/v5/matches/by-puuid/{}/ids",
            self.regional_base,
            urlencoding::encode(puuid)
        );
        let mut query: Vec<(&str, String)> = vec![
            ("start", start.to_string()),
            ("count", count.to_string()),
        ];
        if let Some(ts) = start_time {
            query.push(("startTime", ts.to_string()));
        }
        if let Some(ts) = end_time {
            query.push(("endTime", ts.to_string()));
        }

        let body = self.execute(&url, &query)?;
        let value: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| AppError::Json(e.to_string()))?;
        if !value.is_array() {
            return Err(AppError::UnexpectedResponseShape(
                "match id listing is not a sequence".to_string(),
            ));
        }
        serde_json::from_value(value).map_err(|e| AppError::Json(e.to_string()))
    }

    pub fn get_match(&self, match_id: &str) -> Result<MatchDto, AppError> {
        let url = format!(
            "{}/lol/match/v5/matches/{}",
            self.regional_base,
            urlencoding::encode(match_id)
        );
        self.get_json(&url, &[])
    }

    // Data Dragon: unauthenticated, fixed host, newest version first
    pub fn get_ddragon_versions(&self) -> Result<Vec<String>, AppError> {
        let body = match self.agent.get(&self.ddragon_versions_url).call() {
            Ok(response) => response
                .into_string()
                .map_err(|e| AppError::Http(e.to_string()))?,
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                return Err(AppError::UpstreamError { status, body });
            }
            Err(e) => return Err(AppError::Http(e.to_string())),
        };

        let value: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| AppError::Json(e.to_string()))?;
        if !value.is_array() {
            return Err(AppError::UnexpectedResponseShape(
                "Data Dragon versions response is not a sequence".to_string(),
            ));
        }
        let versions: Vec<String> =
            serde_json::from_value(value).map_err(|e| AppError::Json(e.to_string()))?;
        if versions.is_empty() {
            return Err(AppError::UnexpectedResponseShape(
                "Data Dragon versions response is empty".to_string(),
            ));
        }
        Ok(versions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn test_client(server: &MockServer) -> RiotApiClient {
        RiotApiClient::with_hosts(
            "TEST_KEY".to_string(),
            server.base_url(),
            server.base_url(),
            format!("{}/api/versions.json", server.base_url()),
            Duration::from_secs(2),
        )
    }

    #[test]
    fn success_decodes_payload_and_sends_api_key() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/riot/account/v1/accounts/by-riot-id/Deshu/LAS")
                .header("X-Riot-Token", "TEST_KEY");
            then.status(200).json_body(json!({
                "puuid": "abc-123",
                "gameName": "Deshu",
                "tagLine": "LAS"
            }));
        });

        let client = test_client(&server);
        let account = client.get_account_by_riot_id("Deshu", "LAS").unwrap();

        mock.assert();
        assert_eq!(account.puuid, "abc-123");
        assert_eq!(account.game_name.as_deref(), Some("Deshu"));
        assert!(client.slept.borrow().is_empty());
    }

    #[test]
    fn rate_limit_honors_numeric_retry_after() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/lol/match/v5/matches/LA2_1");
            then.status(429).header("Retry-After", "2");
        });

        let client = test_client(&server);
        let err = client.get_match("LA2_1").unwrap_err();

        assert!(matches!(err, AppError::RateLimitExceeded));
        // 1 initial attempt + 3 retries
        assert_eq!(mock.hits(), 4);
        assert_eq!(
            *client.slept.borrow(),
            vec![
                Duration::from_secs(2),
                Duration::from_secs(2),
                Duration::from_secs(2)
            ]
        );
    }

    // httpmock cannot vary a response across hits, so the retry-then-success
    // path gets a tiny hand-rolled server
    #[test]
    fn recovers_after_single_rate_limited_response() {
        use std::io::{Read, Write};
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = std::thread::spawn(move || {
            let body = "[\"LA2_9\"]";
            let responses = [
                "HTTP/1.1 429 Too Many Requests\r\nRetry-After: 2\r\n\
                 Content-Length: 0\r\nConnection: close\r\n\r\n"
                    .to_string(),
                format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                ),
            ];
            for response in responses {
                let (mut stream, _) = listener.accept().unwrap();
                let mut request = Vec::new();
                let mut buf = [0u8; 512];
                loop {
                    let n = stream.read(&mut buf).unwrap();
                    request.extend_from_slice(&buf[..n]);
                    if n == 0 || request.windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }
                stream.write_all(response.as_bytes()).unwrap();
            }
        });

        let base = format!("http://{addr}");
        let client = RiotApiClient::with_hosts(
            "TEST_KEY".to_string(),
            base.clone(),
            base.clone(),
            format!("{base}/api/versions.json"),
            Duration::from_secs(2),
        );

        let ids = client
            .get_match_ids_by_puuid("abc-123", 0, 10, None, None)
            .unwrap();

        handle.join().unwrap();
        assert_eq!(ids, vec!["LA2_9"]);
        assert_eq!(*client.slept.borrow(), vec![Duration::from_secs(2)]);
    }

    #[test]
    fn rate_limit_backs_off_exponentially_without_retry_after() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/lol/match/v5/matches/LA2_2");
            then.status(429);
        });

        let client = test_client(&server);
        let err = client.get_match("LA2_2").unwrap_err();

        assert!(matches!(err, AppError::RateLimitExceeded));
        assert_eq!(mock.hits(), 4);
        assert_eq!(
            *client.slept.borrow(),
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4)
            ]
        );
    }

    #[test]
    fn non_numeric_retry_after_falls_back_to_backoff() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/lol/match/v5/matches/LA2_3");
            then.status(429).header("Retry-After", "soon");
        });

        let client = test_client(&server);
        let err = client.get_match("LA2_3").unwrap_err();

        assert!(matches!(err, AppError::RateLimitExceeded));
        assert_eq!(
            *client.slept.borrow(),
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4)
            ]
        );
    }

    #[test]
    fn unauthorized_carries_response_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path_contains("/lol/summoner/v4/summoners/by-puuid/");
            then.status(401).body("{\"status\": \"Invalid API key\"}");
        });

        let client = test_client(&server);
        let err = client.get_summoner_by_puuid("abc-123").unwrap_err();

        match err {
            AppError::Unauthorized(body) => assert!(body.contains("Invalid API key")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn forbidden_maps_to_unauthorized() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path_contains("by-riot-id");
            then.status(403).body("Forbidden");
        });

        let client = test_client(&server);
        let err = client.get_account_by_riot_id("a", "b").unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn missing_resource_maps_to_not_found() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path_contains("by-name");
            then.status(404).body("not found");
        });

        let client = test_client(&server);
        let err = client.get_summoner_by_name("ghost").unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }

    #[test]
    fn other_statuses_map_to_upstream_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path_contains("matches");
            then.status(503).body("service busy");
        });

        let client = test_client(&server);
        let err = client.get_match("LA2_4").unwrap_err();

        match err {
            AppError::UpstreamError { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "service busy");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn match_ids_rejects_non_sequence_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path_contains("/ids");
            then.status(200).json_body(json!({"error": "unexpected"}));
        });

        let client = test_client(&server);
        let err = client
            .get_match_ids_by_puuid("abc-123", 0, 10, None, None)
            .unwrap_err();
        assert!(matches!(err, AppError::UnexpectedResponseShape(_)));
    }

    #[test]
    fn match_ids_sends_pagination_window() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/lol/match/v5/matches/by-puuid/abc-123/ids")
                .query_param("start", "100")
                .query_param("count", "100")
                .query_param("startTime", "1700000000")
                .query_param("endTime", "1700600000");
            then.status(200).json_body(json!(["LA2_10", "LA2_11"]));
        });

        let client = test_client(&server);
        let ids = client
            .get_match_ids_by_puuid("abc-123", 100, 100, Some(1700000000), Some(1700600000))
            .unwrap();

        mock.assert();
        assert_eq!(ids, vec!["LA2_10", "LA2_11"]);
    }

    #[test]
    fn ddragon_versions_newest_first() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/versions.json");
            then.status(200).json_body(json!(["15.1.1", "15.0.1"]));
        });

        let client = test_client(&server);
        let versions = client.get_ddragon_versions().unwrap();
        assert_eq!(versions[0], "15.1.1");
    }

    #[test]
    fn ddragon_versions_rejects_empty_list() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/versions.json");
            then.status(200).json_body(json!([]));
        });

        let client = test_client(&server);
        let err = client.get_ddragon_versions().unwrap_err();
        assert!(matches!(err, AppError::UnexpectedResponseShape(_)));
    }

    #[test]
    fn ddragon_versions_rejects_non_sequence() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/versions.json");
            then.status(200).json_body(json!({"latest": "15.1.1"}));
        });

        let client = test_client(&server);
        let err = client.get_ddragon_versions().unwrap_err();
        assert!(matches!(err, AppError::UnexpectedResponseShape(_)));
    }
}
