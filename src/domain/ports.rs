use super::order::{Amount, PayerIdentity};
use crate::error::GatewayError;
use async_trait::async_trait;
use std::sync::Arc;

/// Settlement instruction issued by the processor for a new payment intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentInstruction {
    /// PIX "copia e cola" text the payer pastes into their bank app.
    pub payment_code: String,
    /// Base64 PNG of the QR code. Decorative; may be empty.
    pub visual_code: String,
    pub external_payment_id: String,
}

/// Coarse settlement state reported by the processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementState {
    Settled,
    Outstanding,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_intent(
        &self,
        amount: Amount,
        payer: &PayerIdentity,
    ) -> Result<PaymentInstruction, GatewayError>;

    async fn query_status(
        &self,
        external_payment_id: &str,
    ) -> Result<SettlementState, GatewayError>;
}

pub type GatewayRef = Arc<dyn PaymentGateway>;
