//! Outbound requests from the payment step to the presentation layer.

use super::order::OrderContext;
use super::session::{PaymentSession, SessionStatus};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

/// A toast-style notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn info(title: &str, message: &str) -> Self {
        Self::new(NoticeKind::Info, title, message)
    }

    pub fn success(title: &str, message: &str) -> Self {
        Self::new(NoticeKind::Success, title, message)
    }

    pub fn error(title: &str, message: &str) -> Self {
        Self::new(NoticeKind::Error, title, message)
    }

    fn new(kind: NoticeKind, title: &str, message: &str) -> Self {
        Self {
            kind,
            title: title.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    SignIn,
    Home,
    OrderConfirmation,
}

impl Destination {
    /// Storefront route for the destination.
    pub fn path(&self) -> &'static str {
        match self {
            Destination::SignIn => "/auth",
            Destination::Home => "/",
            Destination::OrderConfirmation => "/checkout/sucesso",
        }
    }
}

/// Everything the payment screen needs to draw the current session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderState {
    pub session_id: Uuid,
    pub order_id: String,
    pub status: SessionStatus,
    pub remaining_seconds: u32,
    pub countdown: String,
    pub progress_percent: f64,
    pub payment_code: Option<String>,
    pub visual_code: Option<String>,
    pub failure: Option<String>,
    /// A status query is outstanding; the confirm action should be disabled.
    pub confirming: bool,
}

impl RenderState {
    pub fn of(session: &PaymentSession, confirming: bool) -> Self {
        Self {
            session_id: session.session_id(),
            order_id: session.order_id().to_string(),
            status: session.status(),
            remaining_seconds: session.remaining_seconds(),
            countdown: session.countdown_label(),
            progress_percent: session.progress_percent(),
            payment_code: session.payment_code().map(str::to_string),
            visual_code: session.visual_code().map(str::to_string),
            failure: session.failure().map(str::to_string),
            confirming,
        }
    }

    pub fn can_confirm(&self) -> bool {
        self.status == SessionStatus::Pending && !self.confirming
    }
}

/// Settlement reported for a session whose window had already closed.
///
/// The payment step takes no decision on it; reconciling the order is up to
/// the order-context collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LateSettlement {
    pub session_id: Uuid,
    pub order_id: String,
    pub external_payment_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    Render(RenderState),
    Notify(Notice),
    Navigate {
        destination: Destination,
        payload: Option<OrderContext>,
    },
    CopyToClipboard {
        code: String,
    },
    LateSettlement(LateSettlement),
}
