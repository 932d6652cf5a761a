use crate::domain::effects::{LateSettlement, Notice, RenderState};
use crate::domain::order::{Amount, OrderContext, PayerIdentity};
use crate::domain::ports::{GatewayRef, PaymentInstruction, SettlementState};
use crate::domain::session::{PaymentSession, SessionStatus, VALIDITY_WINDOW_SECS};
use crate::error::{CheckoutError, GatewayError, Result};
use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Requests the state machine hands back to whoever drives it.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    StartClock { seconds: u32 },
    StopClock,
    /// Payment settled; move on to order confirmation. Emitted once per session.
    Proceed,
    Notify(Notice),
    LateSettlement(LateSettlement),
}

/// A pending `create_intent` call for one generation of the session.
pub struct GenerationCall {
    generation: u64,
    gateway: GatewayRef,
    amount: Amount,
    payer: PayerIdentity,
}

impl GenerationCall {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub async fn send(self) -> GenerationReply {
        let result = self.gateway.create_intent(self.amount, &self.payer).await;
        GenerationReply {
            generation: self.generation,
            result,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationReply {
    pub generation: u64,
    pub result: std::result::Result<PaymentInstruction, GatewayError>,
}

/// A pending `query_status` call for one generation of the session.
///
/// Carries the identity of the code it asks about, so a settlement that only
/// lands after the payer moved on to a new code can still be reported.
pub struct ConfirmationCall {
    generation: u64,
    gateway: GatewayRef,
    session_id: Uuid,
    order_id: String,
    external_payment_id: String,
}

impl ConfirmationCall {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub async fn send(self) -> ConfirmationReply {
        let result = self.gateway.query_status(&self.external_payment_id).await;
        ConfirmationReply {
            generation: self.generation,
            session_id: self.session_id,
            order_id: self.order_id,
            external_payment_id: self.external_payment_id,
            result,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfirmationReply {
    pub generation: u64,
    pub session_id: Uuid,
    pub order_id: String,
    pub external_payment_id: String,
    pub result: std::result::Result<SettlementState, GatewayError>,
}

impl ConfirmationReply {
    fn is_settled(&self) -> bool {
        matches!(self.result, Ok(SettlementState::Settled))
    }

    fn late_settlement(self) -> LateSettlement {
        LateSettlement {
            session_id: self.session_id,
            order_id: self.order_id,
            external_payment_id: self.external_payment_id,
        }
    }
}

/// Drives a payment session through `Generating -> Pending -> Paid | Expired`
/// and `Generating -> Failed`.
///
/// Gateway calls are built here but awaited by the caller, so ticks can be
/// applied while a call is outstanding. Every reply is tagged with the
/// generation that issued it; replies for an older generation, or for a session
/// that has since left the state that asked, are dropped. The one exception is
/// a settlement for a code whose window closed: it is always surfaced as
/// [`Output::LateSettlement`], even after a restart, unless the machine was
/// cancelled.
pub struct PaymentStateMachine {
    gateway: GatewayRef,
    session: Option<PaymentSession>,
    generation: u64,
    confirmation_in_flight: bool,
    proceeded: bool,
    cancelled: bool,
}

impl PaymentStateMachine {
    pub fn new(gateway: GatewayRef) -> Self {
        Self {
            gateway,
            session: None,
            generation: 0,
            confirmation_in_flight: false,
            proceeded: false,
            cancelled: false,
        }
    }

    pub fn session(&self) -> Option<&PaymentSession> {
        self.session.as_ref()
    }

    pub fn status(&self) -> Option<SessionStatus> {
        self.session.as_ref().map(PaymentSession::status)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_confirming(&self) -> bool {
        self.confirmation_in_flight
    }

    /// Opens a fresh session and returns the intent call to run for it.
    ///
    /// Replaces any previous session; replies still in flight for it become
    /// stale. Refused while a code is live (`Pending`) or after payment.
    pub fn start(&mut self, order: &OrderContext, payer: &PayerIdentity) -> Result<GenerationCall> {
        if self.cancelled {
            return Err(CheckoutError::Cancelled);
        }
        if let Some(status) = self.status()
            && matches!(status, SessionStatus::Pending | SessionStatus::Paid)
        {
            return Err(CheckoutError::InvalidTransition {
                operation: "start a new payment",
                status,
            });
        }
        order.validate()?;

        self.generation += 1;
        self.confirmation_in_flight = false;
        self.proceeded = false;
        let session = PaymentSession::new(order);
        info!(
            session_id = %session.session_id(),
            order_id = %order.order_id,
            generation = self.generation,
            amount = %order.total,
            "Generating payment code"
        );
        self.session = Some(session);

        Ok(GenerationCall {
            generation: self.generation,
            gateway: self.gateway.clone(),
            amount: order.total,
            payer: payer.clone(),
        })
    }

    pub fn on_generated(&mut self, reply: GenerationReply) -> Vec<Output> {
        if self.cancelled
            || reply.generation != self.generation
            || self.status() != Some(SessionStatus::Generating)
        {
            self.discard_stale("create_intent", reply.generation);
            return Vec::new();
        }
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };

        match reply.result {
            Ok(instruction) => {
                let external_payment_id = instruction.external_payment_id.clone();
                if let Err(e) = session.issue(instruction, Utc::now()) {
                    warn!(error = %e, "Could not record payment code");
                    return Vec::new();
                }
                info!(
                    session_id = %session.session_id(),
                    external_payment_id = %external_payment_id,
                    "Payment code issued"
                );
                vec![Output::StartClock {
                    seconds: VALIDITY_WINDOW_SECS,
                }]
            }
            Err(e) => {
                warn!(session_id = %session.session_id(), error = %e, "Payment code generation failed");
                if let Err(e) = session.fail(e.to_string()) {
                    warn!(error = %e, "Could not record generation failure");
                    return Vec::new();
                }
                vec![Output::Notify(Notice::error(
                    "Pix error",
                    "Could not generate the Pix payment",
                ))]
            }
        }
    }

    /// One elapsed second.
    pub fn tick(&mut self) -> Vec<Output> {
        match self.session.as_ref() {
            Some(s) if s.status() == SessionStatus::Pending => {
                let next = s.remaining_seconds().saturating_sub(1);
                self.advance_to(next)
            }
            _ => Vec::new(),
        }
    }

    /// Catches the countdown up to the clock's remaining time.
    ///
    /// Ignored outside `Pending` and when `remaining` is not below the current
    /// countdown.
    pub fn advance_to(&mut self, remaining: u32) -> Vec<Output> {
        if self.cancelled {
            return Vec::new();
        }
        let Some(session) = self
            .session
            .as_mut()
            .filter(|s| s.status() == SessionStatus::Pending)
        else {
            return Vec::new();
        };

        match session.count_down_to(remaining) {
            Ok(true) => {
                info!(session_id = %session.session_id(), "Payment window expired");
                vec![
                    Output::StopClock,
                    Output::Notify(Notice::info(
                        "Pix expired",
                        "The payment window has closed",
                    )),
                ]
            }
            Ok(false) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Countdown rejected");
                Vec::new()
            }
        }
    }

    /// Builds the status query for the live payment code.
    pub fn request_confirmation(&mut self) -> Result<ConfirmationCall> {
        if self.cancelled {
            return Err(CheckoutError::Cancelled);
        }
        let session = self.session.as_ref().ok_or(CheckoutError::NoSession)?;
        if session.status() != SessionStatus::Pending {
            return Err(CheckoutError::InvalidTransition {
                operation: "confirm payment",
                status: session.status(),
            });
        }
        if self.confirmation_in_flight {
            return Err(CheckoutError::ConfirmationInFlight);
        }
        let external_payment_id = session
            .external_payment_id()
            .ok_or(CheckoutError::InvalidTransition {
                operation: "confirm payment",
                status: session.status(),
            })?
            .to_string();

        debug!(
            session_id = %session.session_id(),
            external_payment_id = %external_payment_id,
            "Querying settlement status"
        );
        self.confirmation_in_flight = true;
        Ok(ConfirmationCall {
            generation: self.generation,
            gateway: self.gateway.clone(),
            session_id: session.session_id(),
            order_id: session.order_id().to_string(),
            external_payment_id,
        })
    }

    pub fn on_confirmation(&mut self, reply: ConfirmationReply) -> Vec<Output> {
        if self.cancelled {
            self.discard_stale("query_status", reply.generation);
            return Vec::new();
        }
        if reply.generation != self.generation {
            // Only Pending codes are queried and a restart needs the code
            // closed first, so a superseded settlement paid an expired code.
            if reply.is_settled() {
                return vec![Self::report_late(reply)];
            }
            self.discard_stale("query_status", reply.generation);
            return Vec::new();
        }
        self.confirmation_in_flight = false;
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };

        match (session.status(), &reply.result) {
            (SessionStatus::Pending, Ok(SettlementState::Settled)) => {
                if let Err(e) = session.settle() {
                    warn!(error = %e, "Could not record settlement");
                    return Vec::new();
                }
                info!(session_id = %session.session_id(), order_id = %session.order_id(), "Payment settled");
                let mut outputs = vec![
                    Output::StopClock,
                    Output::Notify(Notice::success("Payment approved", "Pix confirmed")),
                ];
                if !self.proceeded {
                    self.proceeded = true;
                    outputs.push(Output::Proceed);
                }
                outputs
            }
            (SessionStatus::Pending, Ok(SettlementState::Outstanding)) => {
                debug!(session_id = %session.session_id(), "Payment still outstanding");
                vec![Output::Notify(Notice::info(
                    "Still pending",
                    "Payment not confirmed yet",
                ))]
            }
            (SessionStatus::Pending, Err(e)) => {
                warn!(session_id = %session.session_id(), error = %e, "Settlement query failed");
                vec![Output::Notify(Notice::error(
                    "Error",
                    "Could not check the payment status",
                ))]
            }
            (SessionStatus::Expired, Ok(SettlementState::Settled)) => {
                vec![Self::report_late(reply)]
            }
            (status, _) => {
                debug!(%status, "Discarding confirmation for a closed session");
                Vec::new()
            }
        }
    }

    /// Abandons the session; anything still in flight becomes stale and the
    /// machine accepts no further ticks, queries or restarts.
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.confirmation_in_flight = false;
        self.cancelled = true;
        if let Some(session) = &self.session {
            info!(session_id = %session.session_id(), status = %session.status(), "Payment session cancelled");
        }
    }

    /// Code text for the clipboard; only offered while the code is live.
    pub fn copy_code(&self) -> Result<&str> {
        let session = self.session.as_ref().ok_or(CheckoutError::NoSession)?;
        match (session.status(), session.payment_code()) {
            (SessionStatus::Pending, Some(code)) => Ok(code),
            (status, _) => Err(CheckoutError::InvalidTransition {
                operation: "copy the payment code",
                status,
            }),
        }
    }

    pub fn render(&self) -> Option<RenderState> {
        self.session
            .as_ref()
            .map(|s| RenderState::of(s, self.confirmation_in_flight))
    }

    fn report_late(reply: ConfirmationReply) -> Output {
        let notice = reply.late_settlement();
        warn!(
            session_id = %notice.session_id,
            order_id = %notice.order_id,
            external_payment_id = %notice.external_payment_id,
            "Settlement reported after the payment window closed"
        );
        Output::LateSettlement(notice)
    }

    fn discard_stale(&self, call: &'static str, generation: u64) {
        debug!(
            call,
            reply_generation = generation,
            current_generation = self.generation,
            "Discarding stale gateway reply"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::scripted::ScriptedGateway;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn order() -> OrderContext {
        OrderContext::new("A1", Amount::new(dec!(150.00)).unwrap(), vec![])
    }

    fn payer() -> PayerIdentity {
        PayerIdentity::new("buyer@example.com").unwrap()
    }

    fn instruction(id: &str) -> PaymentInstruction {
        PaymentInstruction {
            payment_code: format!("pix-code-{id}"),
            visual_code: "iVBORw0KGgo=".to_string(),
            external_payment_id: id.to_string(),
        }
    }

    async fn pending_machine(gateway: ScriptedGateway) -> PaymentStateMachine {
        let mut machine = PaymentStateMachine::new(Arc::new(gateway));
        let call = machine.start(&order(), &payer()).unwrap();
        let outputs = machine.on_generated(call.send().await);
        assert_eq!(outputs, vec![Output::StartClock { seconds: 600 }]);
        machine
    }

    #[tokio::test]
    async fn test_start_reaches_pending() {
        let machine = pending_machine(ScriptedGateway::new().with_intent(instruction("1"))).await;
        let session = machine.session().unwrap();
        assert_eq!(session.status(), SessionStatus::Pending);
        assert_eq!(session.remaining_seconds(), 600);
        assert_eq!(session.external_payment_id(), Some("1"));
    }

    #[tokio::test]
    async fn test_generation_failure_then_clean_retry() {
        let gateway = ScriptedGateway::new()
            .with_intent_error(GatewayError::Transport("connection refused".to_string()))
            .with_intent(instruction("2"));
        let mut machine = PaymentStateMachine::new(Arc::new(gateway));

        let call = machine.start(&order(), &payer()).unwrap();
        let outputs = machine.on_generated(call.send().await);
        assert!(matches!(outputs.as_slice(), [Output::Notify(n)] if n.kind == crate::domain::effects::NoticeKind::Error));
        assert_eq!(machine.status(), Some(SessionStatus::Failed));

        let call = machine.start(&order(), &payer()).unwrap();
        let session = machine.session().unwrap();
        assert_eq!(session.status(), SessionStatus::Generating);
        assert!(session.payment_code().is_none());
        assert!(session.failure().is_none());

        machine.on_generated(call.send().await);
        assert_eq!(machine.status(), Some(SessionStatus::Pending));
        assert_eq!(machine.session().unwrap().payment_code(), Some("pix-code-2"));
    }

    #[tokio::test]
    async fn test_exactly_600_ticks_to_expiry() {
        let mut machine = pending_machine(ScriptedGateway::new().with_intent(instruction("1"))).await;

        for _ in 0..599 {
            assert!(machine.tick().is_empty());
        }
        assert_eq!(machine.session().unwrap().remaining_seconds(), 1);
        assert_eq!(machine.status(), Some(SessionStatus::Pending));

        let outputs = machine.tick();
        assert_eq!(outputs[0], Output::StopClock);
        assert_eq!(machine.status(), Some(SessionStatus::Expired));
        assert_eq!(machine.session().unwrap().remaining_seconds(), 0);

        assert!(machine.tick().is_empty());
        assert_eq!(machine.session().unwrap().remaining_seconds(), 0);
    }

    #[tokio::test]
    async fn test_settled_proceeds_once() {
        let gateway = ScriptedGateway::new()
            .with_intent(instruction("1"))
            .with_status(SettlementState::Settled)
            .with_status(SettlementState::Settled);
        let mut machine = pending_machine(gateway).await;
        for _ in 0..59 {
            machine.tick();
        }
        assert_eq!(machine.session().unwrap().remaining_seconds(), 541);

        let call = machine.request_confirmation().unwrap();
        let outputs = machine.on_confirmation(call.send().await);
        assert_eq!(outputs.iter().filter(|o| **o == Output::Proceed).count(), 1);
        assert_eq!(machine.status(), Some(SessionStatus::Paid));

        assert!(matches!(
            machine.request_confirmation(),
            Err(CheckoutError::InvalidTransition {
                status: SessionStatus::Paid,
                ..
            })
        ));
        assert!(machine.tick().is_empty());
        assert_eq!(machine.session().unwrap().remaining_seconds(), 541);
    }

    #[tokio::test]
    async fn test_outstanding_and_query_error_keep_pending() {
        let gateway = ScriptedGateway::new()
            .with_intent(instruction("1"))
            .with_status(SettlementState::Outstanding)
            .with_status_error(GatewayError::Rejected {
                status: 502,
                body: "bad gateway".to_string(),
            });
        let mut machine = pending_machine(gateway).await;

        let call = machine.request_confirmation().unwrap();
        let outputs = machine.on_confirmation(call.send().await);
        assert!(matches!(outputs.as_slice(), [Output::Notify(n)] if n.kind == crate::domain::effects::NoticeKind::Info));
        assert_eq!(machine.status(), Some(SessionStatus::Pending));

        let call = machine.request_confirmation().unwrap();
        let outputs = machine.on_confirmation(call.send().await);
        assert!(matches!(outputs.as_slice(), [Output::Notify(n)] if n.kind == crate::domain::effects::NoticeKind::Error));
        assert_eq!(machine.status(), Some(SessionStatus::Pending));
        assert!(!machine.is_confirming());
    }

    #[tokio::test]
    async fn test_single_confirmation_in_flight() {
        let gateway = ScriptedGateway::new()
            .with_intent(instruction("1"))
            .with_status(SettlementState::Outstanding);
        let mut machine = pending_machine(gateway).await;

        let call = machine.request_confirmation().unwrap();
        assert!(machine.is_confirming());
        assert!(matches!(
            machine.request_confirmation(),
            Err(CheckoutError::ConfirmationInFlight)
        ));
        machine.on_confirmation(call.send().await);
        assert!(!machine.is_confirming());
    }

    #[tokio::test]
    async fn test_confirmation_after_expiry_is_discarded() {
        let gateway = ScriptedGateway::new()
            .with_intent(instruction("1"))
            .with_status(SettlementState::Outstanding);
        let mut machine = pending_machine(gateway).await;

        let call = machine.request_confirmation().unwrap();
        machine.advance_to(0);
        assert_eq!(machine.status(), Some(SessionStatus::Expired));

        let outputs = machine.on_confirmation(call.send().await);
        assert!(outputs.is_empty());
        assert_eq!(machine.status(), Some(SessionStatus::Expired));
    }

    #[tokio::test]
    async fn test_late_settlement_does_not_resurrect() {
        let gateway = ScriptedGateway::new()
            .with_intent(instruction("77"))
            .with_status(SettlementState::Settled);
        let mut machine = pending_machine(gateway).await;

        let call = machine.request_confirmation().unwrap();
        machine.advance_to(0);
        let outputs = machine.on_confirmation(call.send().await);

        assert_eq!(machine.status(), Some(SessionStatus::Expired));
        assert!(!outputs.contains(&Output::Proceed));
        assert!(matches!(
            outputs.as_slice(),
            [Output::LateSettlement(late)] if late.external_payment_id == "77" && late.order_id == "A1"
        ));
    }

    #[tokio::test]
    async fn test_reply_for_superseded_generation_is_stale() {
        let gateway = ScriptedGateway::new()
            .with_intent(instruction("old"))
            .with_intent(instruction("new"));
        let mut machine = PaymentStateMachine::new(Arc::new(gateway));

        let first = machine.start(&order(), &payer()).unwrap();
        let second = machine.start(&order(), &payer()).unwrap();
        assert_eq!(second.generation(), first.generation() + 1);

        let first_reply = first.send().await;
        assert!(machine.on_generated(first_reply).is_empty());
        assert_eq!(machine.status(), Some(SessionStatus::Generating));

        machine.on_generated(second.send().await);
        assert_eq!(machine.session().unwrap().external_payment_id(), Some("new"));
    }

    #[tokio::test]
    async fn test_settlement_of_old_code_reported_after_restart() {
        let gateway = ScriptedGateway::new()
            .with_intent(instruction("old"))
            .with_intent(instruction("new"))
            .with_status(SettlementState::Settled);
        let mut machine = pending_machine(gateway).await;
        let old_session = machine.session().unwrap().session_id();

        let call = machine.request_confirmation().unwrap();
        machine.advance_to(0);
        let restart = machine.start(&order(), &payer()).unwrap();
        machine.on_generated(restart.send().await);
        assert_eq!(machine.status(), Some(SessionStatus::Pending));

        let outputs = machine.on_confirmation(call.send().await);
        match outputs.as_slice() {
            [Output::LateSettlement(late)] => {
                assert_eq!(late.external_payment_id, "old");
                assert_eq!(late.session_id, old_session);
                assert_eq!(late.order_id, "A1");
            }
            other => panic!("unexpected outputs {other:?}"),
        }
        assert_eq!(machine.status(), Some(SessionStatus::Pending));
        assert_eq!(machine.session().unwrap().external_payment_id(), Some("new"));
        assert!(machine.request_confirmation().is_ok());
    }

    #[tokio::test]
    async fn test_outstanding_reply_of_old_code_is_dropped_after_restart() {
        let gateway = ScriptedGateway::new()
            .with_intent(instruction("old"))
            .with_intent(instruction("new"))
            .with_status(SettlementState::Outstanding);
        let mut machine = pending_machine(gateway).await;

        let call = machine.request_confirmation().unwrap();
        machine.advance_to(0);
        machine.start(&order(), &payer()).unwrap();
        assert!(machine.on_confirmation(call.send().await).is_empty());
    }

    #[tokio::test]
    async fn test_cancel_makes_in_flight_replies_stale() {
        let gateway = ScriptedGateway::new()
            .with_intent(instruction("1"))
            .with_status(SettlementState::Settled);
        let mut machine = pending_machine(gateway).await;

        let call = machine.request_confirmation().unwrap();
        machine.cancel();
        assert!(machine.on_confirmation(call.send().await).is_empty());
        assert_eq!(machine.status(), Some(SessionStatus::Pending));
    }

    #[tokio::test]
    async fn test_cancelled_machine_is_inert() {
        let mut machine = pending_machine(ScriptedGateway::new().with_intent(instruction("1"))).await;
        machine.cancel();

        assert!(machine.tick().is_empty());
        assert!(machine.advance_to(0).is_empty());
        assert_eq!(machine.session().unwrap().remaining_seconds(), 600);
        assert!(matches!(
            machine.request_confirmation(),
            Err(CheckoutError::Cancelled)
        ));
        assert!(matches!(
            machine.start(&order(), &payer()),
            Err(CheckoutError::Cancelled)
        ));
        assert!(!machine.is_confirming());
    }

    #[tokio::test]
    async fn test_generating_accepts_only_the_generation_reply() {
        let gateway = ScriptedGateway::new().with_intent(instruction("1"));
        let mut machine = PaymentStateMachine::new(Arc::new(gateway));
        let call = machine.start(&order(), &payer()).unwrap();

        assert!(machine.tick().is_empty());
        assert!(machine.advance_to(0).is_empty());
        assert!(matches!(
            machine.request_confirmation(),
            Err(CheckoutError::InvalidTransition {
                status: SessionStatus::Generating,
                ..
            })
        ));
        assert!(matches!(
            machine.copy_code(),
            Err(CheckoutError::InvalidTransition {
                status: SessionStatus::Generating,
                ..
            })
        ));
        assert_eq!(machine.status(), Some(SessionStatus::Generating));
        assert!(!machine.is_confirming());

        machine.on_generated(call.send().await);
        assert_eq!(machine.status(), Some(SessionStatus::Pending));
        assert_eq!(machine.session().unwrap().remaining_seconds(), 600);
    }

    #[tokio::test]
    async fn test_failed_session_ignores_ticks() {
        let gateway = ScriptedGateway::new()
            .with_intent_error(GatewayError::Transport("connection refused".to_string()));
        let mut machine = PaymentStateMachine::new(Arc::new(gateway));
        let call = machine.start(&order(), &payer()).unwrap();
        machine.on_generated(call.send().await);
        assert_eq!(machine.status(), Some(SessionStatus::Failed));

        assert!(machine.tick().is_empty());
        assert!(machine.advance_to(0).is_empty());
        assert_eq!(machine.status(), Some(SessionStatus::Failed));
        assert!(machine.request_confirmation().is_err());
    }

    #[tokio::test]
    async fn test_start_refused_while_code_is_live() {
        let mut machine = pending_machine(ScriptedGateway::new().with_intent(instruction("1"))).await;
        assert!(matches!(
            machine.start(&order(), &payer()),
            Err(CheckoutError::InvalidTransition {
                status: SessionStatus::Pending,
                ..
            })
        ));
        assert_eq!(machine.generation(), 1);
    }

    #[tokio::test]
    async fn test_copy_code_only_while_pending() {
        let mut machine = pending_machine(ScriptedGateway::new().with_intent(instruction("1"))).await;
        assert_eq!(machine.copy_code().unwrap(), "pix-code-1");
        assert_eq!(machine.status(), Some(SessionStatus::Pending));

        machine.advance_to(0);
        assert!(machine.copy_code().is_err());
    }

    #[test]
    fn test_tick_without_session_is_ignored() {
        let mut machine = PaymentStateMachine::new(Arc::new(ScriptedGateway::new()));
        assert!(machine.tick().is_empty());
        assert!(matches!(
            machine.request_confirmation(),
            Err(CheckoutError::NoSession)
        ));
        assert!(machine.render().is_none());
    }
}
