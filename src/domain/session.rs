use super::order::{Amount, OrderContext};
use super::ports::PaymentInstruction;
use crate::error::CheckoutError;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Fixed validity window of an issued payment code, in seconds.
pub const VALIDITY_WINDOW_SECS: u32 = 600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Generating,
    Pending,
    Paid,
    Expired,
    Failed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Generating => "generating",
            SessionStatus::Pending => "pending",
            SessionStatus::Paid => "paid",
            SessionStatus::Expired => "expired",
            SessionStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionStatus::Paid | SessionStatus::Expired | SessionStatus::Failed
        )
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single attempt at collecting payment for an order.
///
/// The entity enforces its own invariants: the instruction fields are present
/// exactly when the status is `Pending`, `Paid` or `Expired`, the countdown only
/// moves while `Pending`, and a terminal session rejects every mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentSession {
    session_id: Uuid,
    order_id: String,
    amount: Amount,
    instruction: Option<PaymentInstruction>,
    status: SessionStatus,
    remaining_seconds: u32,
    created_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    failure: Option<String>,
}

impl PaymentSession {
    /// Opens a session for the order in the `Generating` state.
    pub fn new(order: &OrderContext) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            order_id: order.order_id.clone(),
            amount: order.total,
            instruction: None,
            status: SessionStatus::Generating,
            remaining_seconds: VALIDITY_WINDOW_SECS,
            created_at: Utc::now(),
            expires_at: None,
            failure: None,
        }
    }

    /// Records the processor's instruction and opens the validity window.
    pub fn issue(
        &mut self,
        instruction: PaymentInstruction,
        now: DateTime<Utc>,
    ) -> Result<(), CheckoutError> {
        self.require(SessionStatus::Generating, "issue a payment code")?;
        self.instruction = Some(instruction);
        self.remaining_seconds = VALIDITY_WINDOW_SECS;
        self.expires_at = Some(now + Duration::seconds(i64::from(VALIDITY_WINDOW_SECS)));
        self.status = SessionStatus::Pending;
        Ok(())
    }

    /// Marks code generation as failed.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), CheckoutError> {
        self.require(SessionStatus::Generating, "fail generation")?;
        self.failure = Some(reason.into());
        self.status = SessionStatus::Failed;
        Ok(())
    }

    /// Moves the countdown down to `remaining` and expires the session at zero.
    ///
    /// Never moves the countdown up. Returns `true` when this call expired
    /// the session.
    pub fn count_down_to(&mut self, remaining: u32) -> Result<bool, CheckoutError> {
        self.require(SessionStatus::Pending, "count down")?;
        if remaining >= self.remaining_seconds {
            return Ok(false);
        }
        self.remaining_seconds = remaining;
        if remaining == 0 {
            self.status = SessionStatus::Expired;
            return Ok(true);
        }
        Ok(false)
    }

    /// Marks the session as paid.
    pub fn settle(&mut self) -> Result<(), CheckoutError> {
        self.require(SessionStatus::Pending, "settle")?;
        self.status = SessionStatus::Paid;
        Ok(())
    }

    fn require(
        &self,
        expected: SessionStatus,
        operation: &'static str,
    ) -> Result<(), CheckoutError> {
        if self.status == expected {
            Ok(())
        } else {
            Err(CheckoutError::InvalidTransition {
                operation,
                status: self.status,
            })
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn payment_code(&self) -> Option<&str> {
        self.instruction.as_ref().map(|i| i.payment_code.as_str())
    }

    pub fn visual_code(&self) -> Option<&str> {
        self.instruction.as_ref().map(|i| i.visual_code.as_str())
    }

    pub fn external_payment_id(&self) -> Option<&str> {
        self.instruction
            .as_ref()
            .map(|i| i.external_payment_id.as_str())
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Share of the validity window left, from 0 to 100.
    pub fn progress_percent(&self) -> f64 {
        f64::from(self.remaining_seconds) / f64::from(VALIDITY_WINDOW_SECS) * 100.0
    }

    pub fn countdown_label(&self) -> String {
        format_countdown(self.remaining_seconds)
    }
}

/// Formats seconds as `mm:ss`.
pub fn format_countdown(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
