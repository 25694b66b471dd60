use async_trait::async_trait;
use shared::domain::PlanId;

/// Parameters for a checkout overlay takeover. A new purchase carries a
/// `product`; a subscription update carries an `override_url` provided by the
/// billing provider instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub product: Option<PlanId>,
    pub override_url: Option<String>,
    pub locale: String,
    pub passthrough: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutOutcome {
    Closed,
    Succeeded,
}

/// Externally hosted checkout widget. The hosted UI signals completion
/// through close/success callbacks that fire at most once each; an
/// implementation resolves them into the single returned outcome.
#[async_trait]
pub trait CheckoutWidget: Send + Sync {
    async fn open(&self, request: CheckoutRequest) -> CheckoutOutcome;
}
