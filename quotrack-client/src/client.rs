use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::{
    EventRow, NewEventPayload, NewNotePayload, NewTaskPayload, NewVendorQuotePayload,
    QuoteDetail, QuotePayload, QuoteRow, ReorderPayload, TaskUpdate, ToggleResponse, VendorRow,
    VendorQuoteUpdate,
};
use crate::{ClientConfig, QuotrackUrl};

#[derive(Error, Debug)]
pub enum ApiFetchError {
    #[error("NotFound")]
    NotFound,
    #[error("ResponseError: {0}")]
    ResponseError(String),
    #[error("ParsingError: {0}")]
    ParsingError(String),
    #[error("Other: {0}")]
    Other(String),
}

/// Successful create responses carry the server-assigned id.
#[derive(Debug, Deserialize)]
struct CreatedResponse {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

pub struct QuotrackClient {
    client: Client,
    base_url: QuotrackUrl,
}

impl QuotrackClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiFetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiFetchError::Other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: QuotrackUrl::new(config.api_url.clone()),
        })
    }

    fn api(&self, path: &str) -> QuotrackUrl {
        self.base_url.append_path("/api").append_path(path)
    }

    async fn check(&self, request: RequestBuilder, call_name: &str) -> Result<Response, ApiFetchError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiFetchError::ResponseError(format!("{} failed: {}", call_name, e)))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(ApiFetchError::NotFound),
            status if !status.is_success() => {
                // The backend reports failures as {"error": "..."}.
                let detail = response
                    .json::<ErrorBody>()
                    .await
                    .map(|body| body.error)
                    .unwrap_or_else(|_| status.to_string());
                tracing::warn!("{} returned {}", call_name, detail);
                Err(ApiFetchError::ResponseError(format!(
                    "{} returned {}",
                    call_name, detail
                )))
            }
            _ => Ok(response),
        }
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        call_name: &str,
    ) -> Result<T, ApiFetchError> {
        let response = self.check(request, call_name).await?;
        response.json::<T>().await.map_err(|e| {
            ApiFetchError::ParsingError(format!("Failed to parse {} response: {}", call_name, e))
        })
    }

    async fn send_without_body(
        &self,
        request: RequestBuilder,
        call_name: &str,
    ) -> Result<(), ApiFetchError> {
        let response = self.check(request, call_name).await?;
        let _ = response.bytes().await;
        Ok(())
    }

    // ========================================================================
    // Quotes
    // ========================================================================

    pub async fn fetch_quotes(
        &self,
        search: Option<&str>,
        include_hidden: bool,
    ) -> Result<Vec<QuoteRow>, ApiFetchError> {
        let mut url = self.api("/quotes");
        if let Some(search) = search.filter(|s| !s.is_empty()) {
            url = url.with_param("search", search);
        }
        if include_hidden {
            url = url.with_param("include_hidden", "true");
        }
        self.fetch(self.client.get(url.as_ref()), "GET /quotes").await
    }

    pub async fn fetch_quote(&self, quote_id: i64) -> Result<QuoteDetail, ApiFetchError> {
        let url = self.api(&format!("/quotes/{}", quote_id));
        self.fetch(self.client.get(url.as_ref()), "GET /quotes/:id")
            .await
    }

    pub async fn create_quote(&self, payload: &QuotePayload) -> Result<i64, ApiFetchError> {
        let url = self.api("/quotes");
        let created: CreatedResponse = self
            .fetch(self.client.post(url.as_ref()).json(payload), "POST /quotes")
            .await?;
        Ok(created.id)
    }

    pub async fn update_quote(
        &self,
        quote_id: i64,
        payload: &QuotePayload,
    ) -> Result<(), ApiFetchError> {
        let url = self.api(&format!("/quotes/{}", quote_id));
        self.send_without_body(self.client.put(url.as_ref()).json(payload), "PUT /quotes/:id")
            .await
    }

    pub async fn delete_quote(&self, quote_id: i64) -> Result<(), ApiFetchError> {
        let url = self.api(&format!("/quotes/{}", quote_id));
        self.send_without_body(self.client.delete(url.as_ref()), "DELETE /quotes/:id")
            .await
    }

    // ========================================================================
    // Tasks
    // ========================================================================

    pub async fn update_task(&self, task_id: i64, update: &TaskUpdate) -> Result<(), ApiFetchError> {
        let url = self.api(&format!("/tasks/{}", task_id));
        self.send_without_body(self.client.put(url.as_ref()).json(update), "PUT /tasks/:id")
            .await
    }

    /// Flip a task's done flag server-side; returns the new value.
    pub async fn toggle_task(&self, task_id: i64) -> Result<bool, ApiFetchError> {
        let url = self.api(&format!("/tasks/{}/toggle", task_id));
        let response: ToggleResponse = self
            .fetch(self.client.post(url.as_ref()), "POST /tasks/:id/toggle")
            .await?;
        Ok(response.done)
    }

    pub async fn create_task(
        &self,
        quote_id: i64,
        payload: &NewTaskPayload,
    ) -> Result<i64, ApiFetchError> {
        let url = self.api(&format!("/quotes/{}/tasks", quote_id));
        let created: CreatedResponse = self
            .fetch(
                self.client.post(url.as_ref()).json(payload),
                "POST /quotes/:id/tasks",
            )
            .await?;
        Ok(created.id)
    }

    pub async fn delete_task(&self, task_id: i64) -> Result<(), ApiFetchError> {
        let url = self.api(&format!("/tasks/{}", task_id));
        self.send_without_body(self.client.delete(url.as_ref()), "DELETE /tasks/:id")
            .await
    }

    /// Persist a full task ordering for a quote. All-or-nothing server-side.
    pub async fn reorder_tasks(
        &self,
        quote_id: i64,
        ordered_ids: Vec<i64>,
    ) -> Result<(), ApiFetchError> {
        let url = self.api(&format!("/quotes/{}/tasks/reorder", quote_id));
        self.send_without_body(
            self.client
                .put(url.as_ref())
                .json(&ReorderPayload { ordered_ids }),
            "PUT /quotes/:id/tasks/reorder",
        )
        .await
    }

    // ========================================================================
    // Vendor quotes
    // ========================================================================

    pub async fn update_vendor_quote(
        &self,
        vendor_quote_id: i64,
        update: &VendorQuoteUpdate,
    ) -> Result<(), ApiFetchError> {
        let url = self.api(&format!("/vendor-quotes/{}", vendor_quote_id));
        self.send_without_body(
            self.client.put(url.as_ref()).json(update),
            "PUT /vendor-quotes/:id",
        )
        .await
    }

    pub async fn create_vendor_quote(
        &self,
        quote_id: i64,
        payload: &NewVendorQuotePayload,
    ) -> Result<i64, ApiFetchError> {
        let url = self.api(&format!("/quotes/{}/vendor-quotes", quote_id));
        let created: CreatedResponse = self
            .fetch(
                self.client.post(url.as_ref()).json(payload),
                "POST /quotes/:id/vendor-quotes",
            )
            .await?;
        Ok(created.id)
    }

    pub async fn delete_vendor_quote(&self, vendor_quote_id: i64) -> Result<(), ApiFetchError> {
        let url = self.api(&format!("/vendor-quotes/{}", vendor_quote_id));
        self.send_without_body(self.client.delete(url.as_ref()), "DELETE /vendor-quotes/:id")
            .await
    }

    // ========================================================================
    // Notes and events
    // ========================================================================

    pub async fn create_note(&self, payload: &NewNotePayload) -> Result<i64, ApiFetchError> {
        let url = self.api("/notes");
        let created: CreatedResponse = self
            .fetch(self.client.post(url.as_ref()).json(payload), "POST /notes")
            .await?;
        Ok(created.id)
    }

    pub async fn delete_note(&self, note_id: i64) -> Result<(), ApiFetchError> {
        let url = self.api(&format!("/notes/{}", note_id));
        self.send_without_body(self.client.delete(url.as_ref()), "DELETE /notes/:id")
            .await
    }

    pub async fn fetch_events(&self, quote_id: i64) -> Result<Vec<EventRow>, ApiFetchError> {
        let url = self.api(&format!("/events/quote/{}", quote_id));
        self.fetch(self.client.get(url.as_ref()), "GET /events/quote/:id")
            .await
    }

    pub async fn create_event(&self, payload: &NewEventPayload) -> Result<i64, ApiFetchError> {
        let url = self.api("/events");
        let created: CreatedResponse = self
            .fetch(self.client.post(url.as_ref()).json(payload), "POST /events")
            .await?;
        Ok(created.id)
    }

    pub async fn delete_event(&self, event_id: i64) -> Result<(), ApiFetchError> {
        let url = self.api(&format!("/events/{}", event_id));
        self.send_without_body(self.client.delete(url.as_ref()), "DELETE /events/:id")
            .await
    }

    // ========================================================================
    // Vendors
    // ========================================================================

    pub async fn fetch_vendors(&self) -> Result<Vec<VendorRow>, ApiFetchError> {
        let url = self.api("/vendors");
        self.fetch(self.client.get(url.as_ref()), "GET /vendors").await
    }
}
