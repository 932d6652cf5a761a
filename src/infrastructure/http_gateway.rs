use crate::domain::order::{Amount, PayerIdentity};
use crate::domain::ports::{PaymentGateway, PaymentInstruction, SettlementState};
use crate::error::{CheckoutError, GatewayError};
use async_trait::async_trait;
use reqwest::Url;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

/// Gateway backed by the storefront's PIX proxy over HTTP.
///
/// `POST {base}/pix` creates an intent, `GET {base}/pix/status/{id}` reads
/// its status. The proxy forwards the processor's own payloads.
pub struct HttpPixGateway {
    http: reqwest::Client,
    base_url: Url,
}

#[derive(Debug, Serialize)]
struct CreatePixRequest<'a> {
    valor: Amount,
    email: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreatePixResponse {
    id: ProcessorId,
    point_of_interaction: PointOfInteraction,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProcessorId {
    Number(u64),
    Text(String),
}

impl ProcessorId {
    fn into_string(self) -> String {
        match self {
            ProcessorId::Number(n) => n.to_string(),
            ProcessorId::Text(s) => s,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PointOfInteraction {
    transaction_data: TransactionData,
}

#[derive(Debug, Deserialize)]
struct TransactionData {
    qr_code: String,
    #[serde(default)]
    qr_code_base64: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
}

impl HttpPixGateway {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, CheckoutError> {
        let base_url = base_url.into();
        let base_url = Url::parse(&base_url).map_err(|e| {
            CheckoutError::ValidationError(format!("invalid gateway URL '{base_url}': {e}"))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(CheckoutError::ValidationError(format!(
                "gateway URL '{base_url}' cannot carry a path"
            )));
        }
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url })
    }

    /// Appends `segments` to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn read_body(resp: reqwest::Response, context: &str) -> Result<String, GatewayError> {
        let status = resp.status();
        let body = resp.text().await?;
        if status.is_success() {
            return Ok(body);
        }

        error!(
            status = %status,
            response_body = %body,
            context = %context,
            "pix proxy request failed"
        );
        Err(GatewayError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

/// Extracts the settlement instruction from a create-intent response body.
fn decode_instruction(body: &str) -> Result<PaymentInstruction, GatewayError> {
    let parsed: CreatePixResponse =
        serde_json::from_str(body).map_err(|e| GatewayError::Decode(e.to_string()))?;
    let data = parsed.point_of_interaction.transaction_data;
    if data.qr_code.is_empty() {
        return Err(GatewayError::Decode("empty qr_code".to_string()));
    }
    Ok(PaymentInstruction {
        payment_code: data.qr_code,
        visual_code: data.qr_code_base64.unwrap_or_default(),
        external_payment_id: parsed.id.into_string(),
    })
}

/// Only `approved` counts as settled; every other status is outstanding.
fn decode_settlement(body: &str) -> Result<SettlementState, GatewayError> {
    let parsed: StatusResponse =
        serde_json::from_str(body).map_err(|e| GatewayError::Decode(e.to_string()))?;
    Ok(if parsed.status == "approved" {
        SettlementState::Settled
    } else {
        SettlementState::Outstanding
    })
}

#[async_trait]
impl PaymentGateway for HttpPixGateway {
    async fn create_intent(
        &self,
        amount: Amount,
        payer: &PayerIdentity,
    ) -> Result<PaymentInstruction, GatewayError> {
        let request = CreatePixRequest {
            valor: amount,
            email: payer.email(),
        };
        let resp = self
            .http
            .post(self.endpoint(&["pix"]))
            .header(CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .await?;
        let body = Self::read_body(resp, "create pix").await?;
        let instruction = decode_instruction(&body)?;
        debug!(external_payment_id = %instruction.external_payment_id, "pix intent created");
        Ok(instruction)
    }

    async fn query_status(
        &self,
        external_payment_id: &str,
    ) -> Result<SettlementState, GatewayError> {
        let resp = self
            .http
            .get(self.endpoint(&["pix", "status", external_payment_id]))
            .send()
            .await?;
        let body = Self::read_body(resp, "pix status").await?;
        decode_settlement(&body)
    }
}
