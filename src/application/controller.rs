use crate::application::state_machine::{
    ConfirmationReply, GenerationReply, Output, PaymentStateMachine,
};
use crate::config::CheckoutConfig;
use crate::domain::effects::{Destination, Effect, Notice, RenderState};
use crate::domain::order::{OrderContext, PayerIdentity};
use crate::domain::ports::GatewayRef;
use crate::domain::session::SessionStatus;
use crate::error::{CheckoutError, Result};
use crate::infrastructure::countdown::Countdown;
use std::future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

/// Actions the payer can take on the payment screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserIntent {
    /// "I already paid".
    ConfirmPayment,
    CopyCode,
    /// Generate a new code after expiry or a failed generation.
    Restart,
    /// Leave the payment step without paying.
    Abandon,
}

/// How a controller run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Payment settled and the payer was sent to order confirmation.
    Paid,
    Abandoned,
    /// The intent channel closed; the screen went away.
    ///
    /// Also the outcome when the screen goes away during the post-payment
    /// redirect delay: the session is `Paid` but no navigation is emitted.
    Unmounted,
}

enum Reply {
    Generated(GenerationReply),
    Confirmed(ConfirmationReply),
}

/// Owns one payment session for the lifetime of the payment screen.
///
/// All events (clock ticks, gateway replies, user intents and the redirect
/// timer) are handled one at a time on the task running [`SessionController::run`].
/// Gateway calls run on their own tasks and report back through a channel, so
/// a tick can close the window while a query is still outstanding.
pub struct SessionController {
    machine: PaymentStateMachine,
    order: OrderContext,
    payer: PayerIdentity,
    effects: mpsc::UnboundedSender<Effect>,
    replies_tx: mpsc::UnboundedSender<Reply>,
    replies_rx: mpsc::UnboundedReceiver<Reply>,
    countdown: Option<Countdown>,
    calls: Vec<JoinHandle<()>>,
    redirect_at: Option<Instant>,
    redirect_delay: Duration,
    last_render: Option<RenderState>,
}

impl SessionController {
    /// Reads the payer and order handed to the payment step.
    ///
    /// Without a signed-in payer the screen sends the visitor to sign in;
    /// without an order it sends them home. No session is created in either
    /// case.
    pub fn mount(
        payer: Option<PayerIdentity>,
        order: Option<OrderContext>,
        gateway: GatewayRef,
        effects: mpsc::UnboundedSender<Effect>,
        config: &CheckoutConfig,
    ) -> Result<Self> {
        let Some(payer) = payer else {
            if effects.send(navigate(Destination::SignIn, None)).is_err() {
                debug!("Effect receiver dropped");
            }
            return Err(CheckoutError::MissingIdentity);
        };
        let Some(order) = order else {
            if effects.send(navigate(Destination::Home, None)).is_err() {
                debug!("Effect receiver dropped");
            }
            return Err(CheckoutError::MissingOrder);
        };
        order.validate()?;

        info!(order_id = %order.order_id, total = %order.total, "Payment step mounted");
        let (replies_tx, replies_rx) = mpsc::unbounded_channel();
        Ok(Self {
            machine: PaymentStateMachine::new(gateway),
            order,
            payer,
            effects,
            replies_tx,
            replies_rx,
            countdown: None,
            calls: Vec::new(),
            redirect_at: None,
            redirect_delay: config.redirect_delay,
            last_render: None,
        })
    }

    pub fn render(&self) -> Option<RenderState> {
        self.machine.render()
    }

    /// Generates the payment code and processes events until the session
    /// ends in payment, abandonment or unmount.
    pub async fn run(mut self, mut intents: mpsc::Receiver<UserIntent>) -> Result<Outcome> {
        self.start()?;

        loop {
            tokio::select! {
                biased;

                remaining = next_tick(&mut self.countdown) => match remaining {
                    Some(remaining) => {
                        let outputs = self.machine.advance_to(remaining);
                        self.apply(outputs);
                    }
                    None => self.countdown = None,
                },
                Some(reply) = self.replies_rx.recv() => {
                    let outputs = match reply {
                        Reply::Generated(reply) => self.machine.on_generated(reply),
                        Reply::Confirmed(reply) => self.machine.on_confirmation(reply),
                    };
                    self.apply(outputs);
                }
                _ = sleep_until(self.redirect_at) => {
                    self.redirect_at = None;
                    self.emit(navigate(Destination::OrderConfirmation, Some(self.order.clone())));
                    info!(order_id = %self.order.order_id, "Redirected to order confirmation");
                    return Ok(Outcome::Paid);
                }
                intent = intents.recv() => match intent {
                    Some(intent) => {
                        if let Some(outcome) = self.handle(intent)? {
                            return Ok(outcome);
                        }
                    }
                    None => {
                        self.unmount();
                        return Ok(Outcome::Unmounted);
                    }
                },
            }
        }
    }

    fn start(&mut self) -> Result<()> {
        let call = self.machine.start(&self.order, &self.payer)?;
        let tx = self.replies_tx.clone();
        self.track(tokio::spawn(async move {
            let _ = tx.send(Reply::Generated(call.send().await));
        }));
        self.publish_render();
        Ok(())
    }

    fn handle(&mut self, intent: UserIntent) -> Result<Option<Outcome>> {
        if self.redirect_at.is_some() {
            debug!(?intent, "Ignoring intent while redirecting");
            return Ok(None);
        }

        match intent {
            UserIntent::ConfirmPayment => match self.machine.request_confirmation() {
                Ok(call) => {
                    let tx = self.replies_tx.clone();
                    self.track(tokio::spawn(async move {
                        let _ = tx.send(Reply::Confirmed(call.send().await));
                    }));
                    self.publish_render();
                }
                Err(e) => debug!(error = %e, "Confirmation request ignored"),
            },
            UserIntent::CopyCode => match self.machine.copy_code() {
                Ok(code) => {
                    let code = code.to_string();
                    self.emit(Effect::CopyToClipboard { code });
                    self.emit(Effect::Notify(Notice::success(
                        "Code copied",
                        "Paste it in your bank app",
                    )));
                }
                Err(e) => debug!(error = %e, "Copy request ignored"),
            },
            UserIntent::Restart => match self.machine.status() {
                Some(SessionStatus::Expired | SessionStatus::Failed) => self.start()?,
                status => debug!(?status, "Restart ignored"),
            },
            UserIntent::Abandon => {
                self.unmount();
                self.emit(navigate(Destination::Home, None));
                return Ok(Some(Outcome::Abandoned));
            }
        }
        Ok(None)
    }

    fn apply(&mut self, outputs: Vec<Output>) {
        for output in outputs {
            match output {
                Output::StartClock { seconds } => self.countdown = Some(Countdown::start(seconds)),
                Output::StopClock => self.countdown = None,
                Output::Proceed => self.redirect_at = Some(Instant::now() + self.redirect_delay),
                Output::Notify(notice) => self.emit(Effect::Notify(notice)),
                Output::LateSettlement(late) => self.emit(Effect::LateSettlement(late)),
            }
        }
        self.publish_render();
    }

    /// Emits a render effect when the visible state changed.
    fn publish_render(&mut self) {
        let render = self.machine.render();
        if render.is_some() && render != self.last_render {
            self.last_render = render.clone();
            if let Some(render) = render {
                self.emit(Effect::Render(render));
            }
        }
    }

    fn unmount(&mut self) {
        self.machine.cancel();
        self.countdown = None;
        self.redirect_at = None;
        for call in self.calls.drain(..) {
            call.abort();
        }
    }

    fn track(&mut self, call: JoinHandle<()>) {
        self.calls.retain(|c| !c.is_finished());
        self.calls.push(call);
    }

    fn emit(&self, effect: Effect) {
        if self.effects.send(effect).is_err() {
            debug!("Effect receiver dropped");
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        for call in &self.calls {
            call.abort();
        }
    }
}

fn navigate(destination: Destination, payload: Option<OrderContext>) -> Effect {
    Effect::Navigate {
        destination,
        payload,
    }
}

async fn next_tick(countdown: &mut Option<Countdown>) -> Option<u32> {
    match countdown {
        Some(countdown) => countdown.next().await,
        None => future::pending().await,
    }
}

async fn sleep_until(at: Option<Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(at).await,
        None => future::pending().await,
    }
}
