use std::sync::Arc;
use reqwest::Client;
use tracing::{info, warn};
use url::Url;

use crate::config::Config;
use crate::document::{Document, SubmitResponse};
use crate::error::Result;
use crate::http::pool::create_http_client;
use crate::limiter::{GatedInvoker, QuotaGate};

const SIGNATURE_HEADER: &str = "Signature";

/// Client for the registry's document endpoint. Every submission holds a
/// permit from the shared gate for the whole request/response exchange.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    client: Client,
    api_url: Url,
    invoker: GatedInvoker,
}

impl RegistryClient {
    pub fn new(config: &Config, gate: Arc<QuotaGate>) -> Result<Self> {
        let api_url = config.api_url()?;
        let client = create_http_client(config)?;

        Ok(Self {
            client,
            api_url,
            invoker: GatedInvoker::new(gate),
        })
    }

    pub fn gate(&self) -> &Arc<QuotaGate> {
        self.invoker.gate()
    }

    /// Submit one document. Waits for quota first; a non-2xx reply is
    /// returned as a response, transport and encoding failures as errors.
    pub async fn create_document(
        &self,
        document: &Document,
        signature: &str,
    ) -> Result<SubmitResponse> {
        self.invoker
            .invoke(|| self.send_document(document, signature))
            .await
    }

    async fn send_document(&self, document: &Document, signature: &str) -> Result<SubmitResponse> {
        let response = self
            .client
            .post(self.api_url.clone())
            .header(SIGNATURE_HEADER, signature)
            .json(document)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            info!("Document {} accepted: status {}", document.doc_id, status.as_u16());
        } else {
            warn!("Document {} rejected: status {}", document.doc_id, status.as_u16());
        }
        info!("Response body: {}", body);

        Ok(SubmitResponse {
            status: status.as_u16(),
            body,
        })
    }
}
