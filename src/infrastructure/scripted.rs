use crate::domain::order::{Amount, PayerIdentity};
use crate::domain::ports::{PaymentGateway, PaymentInstruction, SettlementState};
use crate::error::GatewayError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

/// An in-process gateway that replays scripted processor responses.
///
/// Each call pops the next scripted response for its operation. An exhausted
/// script answers with `GatewayError::Script`, unless the gateway was built
/// with [`ScriptedGateway::offline`], in which case it keeps issuing fresh
/// codes and reports every query as settled.
#[derive(Default)]
pub struct ScriptedGateway {
    intents: Mutex<VecDeque<Result<PaymentInstruction, GatewayError>>>,
    statuses: Mutex<VecDeque<Result<SettlementState, GatewayError>>>,
    latency: Duration,
    endless: bool,
    create_calls: AtomicUsize,
    query_calls: AtomicUsize,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gateway for running the checkout without a processor: the first query
    /// reports the payment as outstanding, later ones as settled.
    pub fn offline() -> Self {
        Self {
            endless: true,
            ..Self::default()
        }
        .with_status(SettlementState::Outstanding)
    }

    pub fn with_intent(mut self, instruction: PaymentInstruction) -> Self {
        self.intents.get_mut().push_back(Ok(instruction));
        self
    }

    pub fn with_intent_error(mut self, error: GatewayError) -> Self {
        self.intents.get_mut().push_back(Err(error));
        self
    }

    pub fn with_status(mut self, state: SettlementState) -> Self {
        self.statuses.get_mut().push_back(Ok(state));
        self
    }

    pub fn with_status_error(mut self, error: GatewayError) -> Self {
        self.statuses.get_mut().push_back(Err(error));
        self
    }

    /// Delays every response, simulating a slow processor.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    async fn delay(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn create_intent(
        &self,
        amount: Amount,
        _payer: &PayerIdentity,
    ) -> Result<PaymentInstruction, GatewayError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        match self.intents.lock().await.pop_front() {
            Some(response) => response,
            None if self.endless => {
                let id = Uuid::new_v4().simple().to_string();
                Ok(PaymentInstruction {
                    payment_code: format!("PIX-OFFLINE-{id}-{amount}"),
                    visual_code: String::new(),
                    external_payment_id: id,
                })
            }
            None => Err(GatewayError::Script("create_intent")),
        }
    }

    async fn query_status(
        &self,
        _external_payment_id: &str,
    ) -> Result<SettlementState, GatewayError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        match self.statuses.lock().await.pop_front() {
            Some(response) => response,
            None if self.endless => Ok(SettlementState::Settled),
            None => Err(GatewayError::Script("query_status")),
        }
    }
}
