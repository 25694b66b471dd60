//! HTTP implementation of [`AdminApi`] against the admin REST endpoints.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use shared::{
    domain::{Calendar, CalendarId, Device, DeviceId, DeviceOptions, PlanId, User},
    error::{ApiError, ApiException, ErrorCode},
};

use crate::{AdminApi, ApiResult};

pub struct HttpAdminApi {
    http: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct ConnectDeviceRequest<'a> {
    connection_code: &'a str,
}

#[derive(Debug, Serialize)]
struct SetSubscriptionPlanRequest<'a> {
    plan_id: &'a PlanId,
}

impl HttpAdminApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

fn transport_error(err: reqwest::Error) -> ApiException {
    ApiException::new(ErrorCode::Internal, err.to_string())
}

/// Maps a non-success response onto [`ApiException`], preferring the
/// server's own error body message when it parses.
async fn into_api_result(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let code = match status {
        StatusCode::NOT_FOUND => ErrorCode::NotFound,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ErrorCode::Unauthorized,
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ErrorCode::Validation,
        _ => ErrorCode::Internal,
    };

    let message = match response.json::<ApiError>().await {
        Ok(body) => body.message,
        Err(_) => format!("request failed with status {status}"),
    };

    Err(ApiException::new(code, message))
}

#[async_trait]
impl AdminApi for HttpAdminApi {
    async fn get_calendars(&self) -> ApiResult<HashMap<CalendarId, Calendar>> {
        let response = self
            .http
            .get(self.url("/calendars"))
            .send()
            .await
            .map_err(transport_error)?;
        into_api_result(response)
            .await?
            .json()
            .await
            .map_err(transport_error)
    }

    async fn get_connected_devices(&self) -> ApiResult<Vec<Device>> {
        let response = self
            .http
            .get(self.url("/devices"))
            .send()
            .await
            .map_err(transport_error)?;
        into_api_result(response)
            .await?
            .json()
            .await
            .map_err(transport_error)
    }

    async fn get_user_details(&self) -> ApiResult<User> {
        let response = self
            .http
            .get(self.url("/user"))
            .send()
            .await
            .map_err(transport_error)?;
        into_api_result(response)
            .await?
            .json()
            .await
            .map_err(transport_error)
    }

    async fn connect_device(&self, connection_code: &str) -> ApiResult<Device> {
        let response = self
            .http
            .post(self.url("/device"))
            .json(&ConnectDeviceRequest { connection_code })
            .send()
            .await
            .map_err(transport_error)?;
        into_api_result(response)
            .await?
            .json()
            .await
            .map_err(transport_error)
    }

    async fn set_device_options(
        &self,
        device_id: &DeviceId,
        options: &DeviceOptions,
    ) -> ApiResult<()> {
        let response = self
            .http
            .put(self.url(&format!("/device/{device_id}")))
            .json(options)
            .send()
            .await
            .map_err(transport_error)?;
        into_api_result(response).await?;
        Ok(())
    }

    async fn disconnect_device(&self, device_id: &DeviceId) -> ApiResult<()> {
        let response = self
            .http
            .delete(self.url(&format!("/device/{device_id}")))
            .send()
            .await
            .map_err(transport_error)?;
        into_api_result(response).await?;
        Ok(())
    }

    async fn set_subscription_plan(&self, plan_id: &PlanId) -> ApiResult<()> {
        let response = self
            .http
            .put(self.url("/subscription/plan"))
            .json(&SetSubscriptionPlanRequest { plan_id })
            .send()
            .await
            .map_err(transport_error)?;
        into_api_result(response).await?;
        Ok(())
    }

    async fn cancel_subscription(&self) -> ApiResult<()> {
        let response = self
            .http
            .delete(self.url("/subscription"))
            .send()
            .await
            .map_err(transport_error)?;
        into_api_result(response).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod tests;
