use std::time::Instant;

use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::backend::cache::{CacheTag, QueryCache, QueryKey};
use crate::backend::payloads::{
    AuthResponse, CancelPayload, Credentials, DriverProfilePayload, DriverStatsPayload,
    DriverStatusPayload, Envelope, ErrorBody, LocationPayload, RatePayload, RegisterPayload,
    RideRequestPayload, StatusPayload,
};
use crate::error::{AppError, AppResult};
use crate::models::driver::{DriverAvailability, DriverProfile};
use crate::models::geo::Coordinates;
use crate::models::ride::{Ride, RideStatus};
use crate::models::user::User;
use crate::observability::metrics::Metrics;

const RIDE_WRITE_TAGS: &[CacheTag] = &[CacheTag::Ride, CacheTag::Driver];

/// Typed client for the ride-booking backend.
///
/// Reads go through the [`QueryCache`]; writes invalidate by tag. There is no
/// retry and no backoff: a failed call is reported once to the caller.
pub struct BackendClient {
    http: reqwest::Client,
    base_url: Url,
    token: RwLock<Option<String>>,
    cache: QueryCache,
    metrics: Metrics,
}

impl BackendClient {
    pub fn new(base_url: &str, metrics: Metrics) -> AppResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|err| AppError::Internal(format!("invalid API_BASE_URL {base_url}: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Internal(format!(
                "API_BASE_URL cannot be a base: {base_url}"
            )));
        }

        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            token: RwLock::new(None),
            cache: QueryCache::new(metrics.clone()),
            metrics,
        })
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub async fn has_token(&self) -> bool {
        self.token.read().await.is_some()
    }

    fn url(&self, segments: &[&str]) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Internal("backend url cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn dispatch(
        &self,
        endpoint: &'static str,
        method: Method,
        segments: &[&str],
        body: Option<Value>,
    ) -> AppResult<Vec<u8>> {
        let url = self.url(segments)?;
        let mut request = self.http.request(method.clone(), url);
        if let Some(token) = self.token.read().await.as_deref() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let start = Instant::now();
        let result = request.send().await;
        self.metrics
            .upstream_latency_seconds
            .with_label_values(&[endpoint])
            .observe(start.elapsed().as_secs_f64());

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                self.record(endpoint, "transport_error");
                warn!(endpoint, error = %err, "backend request failed");
                return Err(AppError::from(err));
            }
        };

        let status = response.status();
        let bytes = response.bytes().await.map_err(|err| {
            self.record(endpoint, "transport_error");
            AppError::from(err)
        })?;

        if status == StatusCode::UNAUTHORIZED {
            self.record(endpoint, "unauthorized");
            return Err(AppError::Unauthorized);
        }

        if !status.is_success() {
            self.record(endpoint, "rejected");
            let message = serde_json::from_slice::<ErrorBody>(&bytes)
                .unwrap_or_default()
                .into_message(status.canonical_reason().unwrap_or("request failed"));
            warn!(endpoint, %method, status = status.as_u16(), %message, "backend rejected request");
            if status == StatusCode::NOT_FOUND {
                return Err(AppError::NotFound(message));
            }
            return Err(AppError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        self.record(endpoint, "ok");
        debug!(endpoint, %method, status = status.as_u16(), "backend request completed");
        Ok(bytes.to_vec())
    }

    fn record(&self, endpoint: &'static str, outcome: &str) {
        self.metrics
            .upstream_requests_total
            .with_label_values(&[endpoint, outcome])
            .inc();
    }

    /// Sends a request and decodes the enveloped payload into `T`.
    async fn call<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        method: Method,
        segments: &[&str],
        body: Option<Value>,
    ) -> AppResult<T> {
        let bytes = self.dispatch(endpoint, method, segments, body).await?;

        let envelope: Envelope<T> =
            serde_json::from_slice(&bytes).map_err(|err| AppError::Decode {
                endpoint: endpoint.to_string(),
                reason: err.to_string(),
            })?;

        if envelope.success == Some(false) {
            return Err(AppError::Rejected {
                status: StatusCode::OK.as_u16(),
                message: envelope
                    .message
                    .unwrap_or_else(|| "request was not successful".to_string()),
            });
        }

        Ok(envelope.data)
    }

    /// Sends a request whose response body carries nothing we need.
    async fn call_ack(
        &self,
        endpoint: &'static str,
        method: Method,
        segments: &[&str],
        body: Option<Value>,
    ) -> AppResult<()> {
        self.dispatch(endpoint, method, segments, body).await?;
        Ok(())
    }

    async fn query<T>(&self, key: QueryKey, tags: &[CacheTag], segments: &[&str]) -> AppResult<T>
    where
        T: DeserializeOwned + Serialize,
    {
        if let Some(hit) = self.cache.get::<T>(&key) {
            debug!(endpoint = key.endpoint, "query cache hit");
            return Ok(hit);
        }

        let generation = self.cache.generation();
        let value: T = self.call(key.endpoint, Method::GET, segments, None).await?;
        self.cache.insert_if_current(key, tags, &value, generation);
        Ok(value)
    }

    async fn mutate<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        method: Method,
        segments: &[&str],
        body: Option<Value>,
        invalidates: &[CacheTag],
    ) -> AppResult<T> {
        let value = self.call(endpoint, method, segments, body).await?;
        self.cache.invalidate(invalidates);
        Ok(value)
    }

    // auth

    pub async fn login(&self, credentials: &Credentials) -> AppResult<AuthResponse> {
        let auth: AuthResponse = self
            .call("auth.login", Method::POST, &["auth", "login"], Some(to_body(credentials)?))
            .await?;
        self.start_session(&auth).await;
        Ok(auth)
    }

    pub async fn register(&self, payload: &RegisterPayload) -> AppResult<AuthResponse> {
        let auth: AuthResponse = self
            .call("auth.register", Method::POST, &["auth", "register"], Some(to_body(payload)?))
            .await?;
        self.start_session(&auth).await;
        Ok(auth)
    }

    async fn start_session(&self, auth: &AuthResponse) {
        *self.token.write().await = Some(auth.token.clone());
        self.cache.clear();
        self.cache.insert_if_current(
            QueryKey::new("auth.me"),
            &[CacheTag::Auth],
            &auth.user,
            self.cache.generation(),
        );
        info!(user_id = %auth.user.id, role = %auth.user.role, "signed in");
    }

    /// Tells the backend to end the session, then forgets the token and every
    /// cached entity whether or not the backend answered.
    pub async fn logout(&self) -> AppResult<()> {
        let result = self
            .call_ack("auth.logout", Method::POST, &["auth", "logout"], None)
            .await;

        *self.token.write().await = None;
        self.cache.clear();
        info!("signed out");

        result
    }

    pub async fn me(&self) -> AppResult<User> {
        self.query(QueryKey::new("auth.me"), &[CacheTag::Auth], &["auth", "me"])
            .await
    }

    // users

    pub async fn list_users(&self) -> AppResult<Vec<User>> {
        self.query(QueryKey::new("users.list"), &[CacheTag::User], &["users"])
            .await
    }

    pub async fn get_user(&self, id: &str) -> AppResult<User> {
        self.query(QueryKey::with_arg("users.get", id), &[CacheTag::User], &["users", id])
            .await
    }

    // drivers

    pub async fn driver_profile(&self) -> AppResult<DriverProfile> {
        self.query(
            QueryKey::new("drivers.profile"),
            &[CacheTag::Driver],
            &["drivers", "profile"],
        )
        .await
    }

    pub async fn create_driver_profile(
        &self,
        payload: &DriverProfilePayload,
    ) -> AppResult<DriverProfile> {
        self.mutate(
            "drivers.create_profile",
            Method::POST,
            &["drivers", "profile"],
            Some(to_body(payload)?),
            &[CacheTag::Driver],
        )
        .await
    }

    pub async fn set_driver_status(
        &self,
        status: DriverAvailability,
        location: Option<Coordinates>,
    ) -> AppResult<DriverProfile> {
        let payload = DriverStatusPayload { status, location };
        self.mutate(
            "drivers.status",
            Method::PATCH,
            &["drivers", "status"],
            Some(to_body(&payload)?),
            &[CacheTag::Driver],
        )
        .await
    }

    /// Location pings are frequent, so they leave cached driver lists alone.
    pub async fn update_driver_location(&self, location: Coordinates) -> AppResult<()> {
        let payload = LocationPayload { location };
        self.call_ack(
            "drivers.location",
            Method::PATCH,
            &["drivers", "location"],
            Some(to_body(&payload)?),
        )
        .await
    }

    pub async fn online_drivers(&self) -> AppResult<Vec<DriverProfile>> {
        self.query(
            QueryKey::new("drivers.online"),
            &[CacheTag::Driver],
            &["drivers", "online"],
        )
        .await
    }

    pub async fn list_drivers(&self) -> AppResult<Vec<DriverProfile>> {
        self.query(QueryKey::new("drivers.list"), &[CacheTag::Driver], &["drivers"])
            .await
    }

    pub async fn update_driver_stats(
        &self,
        id: &str,
        payload: &DriverStatsPayload,
    ) -> AppResult<DriverProfile> {
        self.mutate(
            "drivers.stats",
            Method::PATCH,
            &["drivers", id, "stats"],
            Some(to_body(payload)?),
            &[CacheTag::Driver],
        )
        .await
    }

    pub async fn delete_driver(&self, id: &str) -> AppResult<()> {
        self.call_ack("drivers.delete", Method::DELETE, &["drivers", id], None)
            .await?;
        self.cache.invalidate(&[CacheTag::Driver, CacheTag::User]);
        Ok(())
    }

    // rides

    pub async fn request_ride(&self, payload: &RideRequestPayload) -> AppResult<Ride> {
        self.mutate(
            "rides.request",
            Method::POST,
            &["rides", "request"],
            Some(to_body(payload)?),
            &[CacheTag::Ride],
        )
        .await
    }

    pub async fn cancel_ride(&self, id: &str, payload: &CancelPayload) -> AppResult<Ride> {
        self.mutate(
            "rides.cancel",
            Method::PATCH,
            &["rides", id, "cancel"],
            Some(to_body(payload)?),
            RIDE_WRITE_TAGS,
        )
        .await
    }

    pub async fn rate_ride(&self, id: &str, payload: &RatePayload) -> AppResult<Ride> {
        self.mutate(
            "rides.rate",
            Method::PATCH,
            &["rides", id, "rate"],
            Some(to_body(payload)?),
            RIDE_WRITE_TAGS,
        )
        .await
    }

    /// Claims a requested ride for the signed-in driver.
    pub async fn accept_ride(&self, id: &str) -> AppResult<Ride> {
        self.mutate(
            "rides.accept",
            Method::PATCH,
            &["rides", id, "accept"],
            None,
            RIDE_WRITE_TAGS,
        )
        .await
    }

    /// Generic status update. Whether the move is legal is decided by the
    /// backend.
    pub async fn update_ride_status(&self, id: &str, status: RideStatus) -> AppResult<Ride> {
        let payload = StatusPayload { status };
        self.mutate(
            "rides.status",
            Method::PATCH,
            &["rides", id, "status"],
            Some(to_body(&payload)?),
            RIDE_WRITE_TAGS,
        )
        .await
    }

    pub async fn available_rides(&self) -> AppResult<Vec<Ride>> {
        self.query(
            QueryKey::new("rides.available"),
            &[CacheTag::Ride],
            &["rides", "available"],
        )
        .await
    }

    pub async fn ride_history(&self) -> AppResult<Vec<Ride>> {
        self.query(
            QueryKey::new("rides.history"),
            &[CacheTag::Ride],
            &["rides", "history"],
        )
        .await
    }

    pub async fn all_rides(&self) -> AppResult<Vec<Ride>> {
        self.query(QueryKey::new("rides.all"), &[CacheTag::Ride], &["rides"])
            .await
    }

    pub async fn get_ride(&self, id: &str) -> AppResult<Ride> {
        self.query(QueryKey::with_arg("rides.get", id), &[CacheTag::Ride], &["rides", id])
            .await
    }
}

fn to_body<T: Serialize>(payload: &T) -> AppResult<Value> {
    serde_json::to_value(payload)
        .map_err(|err| AppError::Internal(format!("failed to encode request body: {err}")))
}

#[cfg(test)]
mod tests {
    use super::BackendClient;
    use crate::observability::metrics::Metrics;

    #[test]
    fn url_appends_segments_after_base_path() {
        let client = BackendClient::new("http://localhost:5000/api/", Metrics::new()).unwrap();
        let url = client.url(&["rides", "abc 1", "accept"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/rides/abc%201/accept");
    }

    #[test]
    fn url_without_base_path() {
        let client = BackendClient::new("http://localhost:5000", Metrics::new()).unwrap();
        let url = client.url(&["auth", "me"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/auth/me");
    }

    #[test]
    fn rejects_non_base_url() {
        assert!(BackendClient::new("mailto:ops@example.com", Metrics::new()).is_err());
    }
}
