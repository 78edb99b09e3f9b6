use chrono::NaiveDate;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

use crate::access::RoleTemplates;
use crate::api::types::{
    AppointmentRow, CalendarResponse, Created, CustomerRow, ErrorBody, ListQuery, LoginResponse,
    MeResponse, Page, UserRecord, UsersResponse,
};
use crate::forms::{
    AppointmentUpdate, Credentials, NewAppointment, NewCustomer, StateChange, UserForm,
    ValidationError,
};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Session expired or invalid")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        match reqwest::Client::builder().timeout(timeout).build() {
            Ok(client) => self.client = client,
            Err(e) => tracing::warn!("Keeping default HTTP client, timeout not applied: {}", e),
        }
        self
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn check(response: Response, what: &str) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .unwrap_or_default()
            .into_message()
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string());

        match status {
            StatusCode::UNAUTHORIZED => {
                tracing::warn!("{} rejected: not authenticated", what);
                Err(ApiError::Unauthorized)
            }
            StatusCode::FORBIDDEN => {
                tracing::warn!("{} forbidden: {}", what, message);
                Err(ApiError::Forbidden(message))
            }
            StatusCode::NOT_FOUND => {
                tracing::error!("{} not found", what);
                Err(ApiError::NotFound(what.to_string()))
            }
            _ => {
                tracing::error!("{} failed. Status: {}, Message: {}", what, status, message);
                Err(ApiError::Server {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    async fn read_json<T: DeserializeOwned>(response: Response, what: &str) -> Result<T, ApiError> {
        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| ApiError::ParseError(format!("{}: {}", what, e)))
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
        what: &str,
    ) -> Result<T, ApiError> {
        tracing::debug!("{} {}", method, path);
        let response = self.request(method, path).json(body).send().await?;
        let response = Self::check(response, what).await?;
        Self::read_json(response, what).await
    }

    async fn send_empty(&self, method: reqwest::Method, path: &str, what: &str) -> Result<(), ApiError> {
        tracing::debug!("{} {}", method, path);
        let response = self.request(method, path).send().await?;
        Self::check(response, what).await?;
        Ok(())
    }

    // Auth

    pub async fn login(&mut self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        credentials.validate()?;
        tracing::info!("Signing in as {}", credentials.email);

        let response = self
            .client
            .post(self.url("/auth/login"))
            .json(credentials)
            .send()
            .await?;

        // A failed login answers 401 with a human message; surface it instead
        // of the generic session-expired error.
        if response.status() == StatusCode::UNAUTHORIZED {
            let message = response
                .json::<ErrorBody>()
                .await
                .unwrap_or_default()
                .into_message()
                .unwrap_or_else(|| "Email hoặc mật khẩu không đúng".to_string());
            return Err(ApiError::Forbidden(message));
        }

        let response = Self::check(response, "Login").await?;
        let login: LoginResponse = Self::read_json(response, "Login").await?;
        self.token = Some(login.token.clone());
        tracing::info!("Signed in as {} ({})", login.user.email, login.user.role);
        Ok(login)
    }

    pub async fn logout(&mut self) -> Result<(), ApiError> {
        let result = self.send_empty(reqwest::Method::POST, "/auth/logout", "Logout").await;
        self.token = None;
        result
    }

    /// Re-reads the current user. This is the only way a live session picks
    /// up permission changes.
    pub async fn me(&self) -> Result<UserRecord, ApiError> {
        let response = self.request(reqwest::Method::GET, "/auth/me").send().await?;
        let response = Self::check(response, "Session check").await?;
        let me: MeResponse = Self::read_json(response, "Session check").await?;
        Ok(me.user)
    }

    // Appointments

    pub async fn calendar_day(
        &self,
        date: NaiveDate,
        company: Option<&str>,
    ) -> Result<CalendarResponse, ApiError> {
        let date_param = date.format("%Y-%m-%d").to_string();
        let mut params = vec![("date", date_param)];
        if let Some(company) = company.filter(|c| !c.is_empty()) {
            params.push(("company", company.to_string()));
        }

        tracing::info!("Fetching calendar for {}", date);
        let response = self
            .request(reqwest::Method::GET, "/appointments/calendar")
            .query(&params)
            .send()
            .await?;
        let response = Self::check(response, "Calendar").await?;
        let calendar: CalendarResponse = Self::read_json(response, "Calendar").await?;
        tracing::info!(
            "Fetched {} appointments for {} doctors",
            calendar.appointments.len(),
            calendar.doctors.len()
        );
        Ok(calendar)
    }

    pub async fn list_appointments(&self, query: &ListQuery) -> Result<Page<AppointmentRow>, ApiError> {
        let response = self
            .request(reqwest::Method::GET, "/appointments")
            .query(&query.to_params("state"))
            .send()
            .await?;
        let response = Self::check(response, "Appointments").await?;
        Self::read_json(response, "Appointments").await
    }

    pub async fn create_appointment(&self, appointment: &NewAppointment) -> Result<Created, ApiError> {
        appointment.validate()?;
        tracing::info!("Creating appointment for partner {}", appointment.partner_id);
        self.send_json(reqwest::Method::POST, "/appointments", appointment, "Create appointment")
            .await
    }

    pub async fn update_appointment(&self, id: &str, update: &AppointmentUpdate) -> Result<(), ApiError> {
        update.validate()?;
        let path = format!("/appointments/{}", urlencoding::encode(id));
        let _: serde_json::Value = self
            .send_json(reqwest::Method::PUT, &path, update, "Update appointment")
            .await?;
        tracing::info!("Appointment {} updated", id);
        Ok(())
    }

    pub async fn set_appointment_state(&self, id: &str, change: &StateChange) -> Result<(), ApiError> {
        change.validate()?;
        let path = format!("/appointments/{}/state", urlencoding::encode(id));
        let _: serde_json::Value = self
            .send_json(reqwest::Method::PUT, &path, change, "Change appointment state")
            .await?;
        tracing::info!("Appointment {} moved to {}", id, change.state);
        Ok(())
    }

    pub async fn delete_appointment(&self, id: &str) -> Result<(), ApiError> {
        let path = format!("/appointments/{}", urlencoding::encode(id));
        self.send_empty(reqwest::Method::DELETE, &path, "Delete appointment").await
    }

    // Customers

    pub async fn list_customers(&self, query: &ListQuery) -> Result<Page<CustomerRow>, ApiError> {
        let response = self
            .request(reqwest::Method::GET, "/customers")
            .query(&query.to_params("status"))
            .send()
            .await?;
        let response = Self::check(response, "Customers").await?;
        Self::read_json(response, "Customers").await
    }

    pub async fn create_customer(&self, customer: &NewCustomer) -> Result<Created, ApiError> {
        customer.validate()?;
        self.send_json(reqwest::Method::POST, "/customers", customer, "Create customer")
            .await
    }

    pub async fn delete_customer(&self, id: &str) -> Result<(), ApiError> {
        let path = format!("/customers/{}", urlencoding::encode(id));
        self.send_empty(reqwest::Method::DELETE, &path, "Delete customer").await
    }

    // Users (admin only on the backend)

    pub async fn list_users(&self) -> Result<Vec<UserRecord>, ApiError> {
        let response = self.request(reqwest::Method::GET, "/users").send().await?;
        let response = Self::check(response, "Users").await?;
        let users: UsersResponse = Self::read_json(response, "Users").await?;
        Ok(users.users)
    }

    pub async fn create_user(&self, form: &UserForm) -> Result<Created, ApiError> {
        form.validate(true)?;
        self.send_json(reqwest::Method::POST, "/users", form, "Create user").await
    }

    pub async fn update_user(&self, id: &str, form: &UserForm) -> Result<(), ApiError> {
        form.validate(false)?;
        let path = format!("/users/{}", urlencoding::encode(id));
        let _: serde_json::Value = self
            .send_json(reqwest::Method::PUT, &path, form, "Update user")
            .await?;
        Ok(())
    }

    pub async fn set_user_active(&self, id: &str, active: bool) -> Result<(), ApiError> {
        let path = format!("/users/{}", urlencoding::encode(id));
        let body = serde_json::json!({ "active": active });
        let _: serde_json::Value = self
            .send_json(reqwest::Method::PUT, &path, &body, "Toggle user")
            .await?;
        Ok(())
    }

    pub async fn delete_user(&self, id: &str) -> Result<(), ApiError> {
        let path = format!("/users/{}", urlencoding::encode(id));
        self.send_empty(reqwest::Method::DELETE, &path, "Delete user").await
    }

    /// Rewrites the permission map of every viewer on the backend. Sessions
    /// already signed in keep their old map until they re-check.
    pub async fn save_role_permissions(&self, templates: &RoleTemplates) -> Result<(), ApiError> {
        let body = serde_json::json!({ "viewer": templates.viewer_wire_keys() });
        let _: serde_json::Value = self
            .send_json(reqwest::Method::PUT, "/users/role-permissions", &body, "Save role permissions")
            .await?;
        tracing::info!("Viewer template saved: {:?}", templates.viewer);
        Ok(())
    }
}
