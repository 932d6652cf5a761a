#![allow(dead_code)]

use pix_checkout::application::controller::{Outcome, SessionController, UserIntent};
use pix_checkout::config::CheckoutConfig;
use pix_checkout::domain::effects::{Effect, RenderState};
use pix_checkout::domain::order::{Amount, LineItem, OrderContext, PayerIdentity};
use pix_checkout::domain::ports::PaymentInstruction;
use pix_checkout::error::Result;
use pix_checkout::infrastructure::scripted::ScriptedGateway;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub fn order() -> OrderContext {
    OrderContext::new(
        "A1",
        Amount::new(dec!(150.00)).unwrap(),
        vec![LineItem {
            product_ref: "sku-42".to_string(),
            quantity: 2,
            unit_price: dec!(75.00),
        }],
    )
}

pub fn payer() -> PayerIdentity {
    PayerIdentity::new("buyer@example.com").unwrap()
}

pub fn instruction(id: &str) -> PaymentInstruction {
    PaymentInstruction {
        payment_code: format!("00020126pix-{id}"),
        visual_code: "iVBORw0KGgo=".to_string(),
        external_payment_id: id.to_string(),
    }
}

/// A running controller plus both ends of its channels.
pub struct Harness {
    pub intents: mpsc::Sender<UserIntent>,
    pub effects: mpsc::UnboundedReceiver<Effect>,
    pub run: JoinHandle<Result<Outcome>>,
}

pub fn launch(gateway: Arc<ScriptedGateway>) -> Harness {
    let (effects_tx, effects) = mpsc::unbounded_channel();
    let controller = SessionController::mount(
        Some(payer()),
        Some(order()),
        gateway,
        effects_tx,
        &CheckoutConfig::default(),
    )
    .expect("mount failed");
    let (intents, intents_rx) = mpsc::channel(8);
    let run = tokio::spawn(controller.run(intents_rx));
    Harness {
        intents,
        effects,
        run,
    }
}

impl Harness {
    pub async fn send(&self, intent: UserIntent) {
        self.intents.send(intent).await.expect("controller stopped");
    }

    /// Collects effects until one satisfies `stop`, returning all of them.
    pub async fn effects_until(&mut self, stop: impl Fn(&Effect) -> bool) -> Vec<Effect> {
        let mut seen = Vec::new();
        loop {
            let effect = self.effects.recv().await.expect("effects closed");
            let done = stop(&effect);
            seen.push(effect);
            if done {
                return seen;
            }
        }
    }

    pub async fn render_where(&mut self, pred: impl Fn(&RenderState) -> bool) -> RenderState {
        let effects = self
            .effects_until(|e| matches!(e, Effect::Render(r) if pred(r)))
            .await;
        match effects.last() {
            Some(Effect::Render(r)) => r.clone(),
            _ => unreachable!(),
        }
    }

    /// Waits for the run to end and returns its outcome with every effect
    /// still queued.
    pub async fn finish(mut self) -> (Outcome, Vec<Effect>) {
        let outcome = self.run.await.expect("run panicked").expect("run failed");
        let mut rest = Vec::new();
        while let Some(effect) = self.effects.recv().await {
            rest.push(effect);
        }
        (outcome, rest)
    }
}

pub fn renders(effects: &[Effect]) -> Vec<&RenderState> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::Render(r) => Some(r),
            _ => None,
        })
        .collect()
}
