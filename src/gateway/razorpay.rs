use hmac::{Hmac, Mac};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::{error, instrument};

use crate::config::RazorpayConfig;
use crate::errors::ServiceError;

type HmacSha256 = Hmac<Sha256>;

/// Remote payment-intent record created on the gateway. Returned to the
/// storefront verbatim so it can render the payment UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayOrder {
    /// Opaque gateway order id (e.g. "order_EKwxwAgItmmXdp")
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
    pub status: String,
}

#[derive(Serialize)]
struct CreateOrderBody<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

/// Razorpay API client. Credentials are injected at construction; nothing in
/// here reads the environment, so tests can point `api_base` at a mock
/// server and use throwaway keys.
#[derive(Clone)]
pub struct RazorpayGateway {
    config: RazorpayConfig,
    http: reqwest::Client,
}

impl RazorpayGateway {
    pub fn new(config: RazorpayConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Public key id the storefront needs to open the gateway's checkout UI.
    pub fn key_id(&self) -> &str {
        &self.config.key_id
    }

    /// Creates a remote payment-intent for `amount`, denominated in paise as
    /// the gateway requires. `receipt` carries our internal order id.
    #[instrument(skip(self), fields(receipt = %receipt))]
    pub async fn create_order(
        &self,
        receipt: &str,
        amount: Decimal,
    ) -> Result<GatewayOrder, ServiceError> {
        let body = CreateOrderBody {
            amount: amount_to_paise(amount)?,
            currency: "INR",
            receipt,
        };

        let response = self
            .http
            .post(format!("{}/v1/orders", self.config.api_base))
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("Gateway order creation request failed: {}", e);
                ServiceError::ExternalServiceError(format!("gateway unreachable: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            error!(%status, "Gateway order creation rejected: {}", text);
            return Err(ServiceError::ExternalServiceError(format!(
                "gateway returned {}",
                status
            )));
        }

        response.json::<GatewayOrder>().await.map_err(|e| {
            error!("Gateway order response could not be parsed: {}", e);
            ServiceError::ExternalServiceError("invalid gateway response".to_string())
        })
    }

    /// Verifies a completion callback: recomputes
    /// HMAC-SHA256(key_secret, "gateway_order_id|gateway_payment_id") and
    /// compares it to the supplied signature in constant time. Must pass
    /// before any other callback field is trusted.
    pub fn verify_signature(
        &self,
        gateway_order_id: &str,
        gateway_payment_id: &str,
        signature: &str,
    ) -> bool {
        let payload = format!("{}|{}", gateway_order_id, gateway_payment_id);
        let mut mac = HmacSha256::new_from_slice(self.config.key_secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(payload.as_bytes());
        let expected = hex::encode(mac.finalize().into_bytes());
        constant_time_eq(&expected, signature)
    }
}

/// Converts a decimal rupee amount to integral paise.
fn amount_to_paise(amount: Decimal) -> Result<i64, ServiceError> {
    (amount * Decimal::ONE_HUNDRED)
        .round()
        .to_i64()
        .ok_or_else(|| ServiceError::ValidationError("Amount out of range".to_string()))
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut res = 0u8;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        res |= x ^ y;
    }
    res == 0
}
