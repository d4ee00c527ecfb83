use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::config::{resolve_env, PaymentConfig};
use crate::error::Error;

type HmacSha256 = Hmac<Sha256>;

const RAZORPAY_BASE: &str = "https://api.razorpay.com/v1";
const CASHFREE_BASE: &str = "https://api.cashfree.com/pg";
const CASHFREE_API_VERSION: &str = "2023-08-01";

/// Supported UPI payment providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpiProvider {
    Razorpay,
    Cashfree,
}

impl UpiProvider {
    fn parse(s: &str) -> Result<Self, Error> {
        match s {
            "razorpay" => Ok(UpiProvider::Razorpay),
            "cashfree" => Ok(UpiProvider::Cashfree),
            other => Err(Error::Gateway(format!("unsupported payment provider: {other}"))),
        }
    }
}

/// Customer details attached to an order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Order details from the merchant side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderDetails {
    pub id: String,
    pub description: String,
    /// GST category ("food", "electronics", "services", ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// A created payment order, ready to hand to the customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentOrder {
    pub provider: UpiProvider,
    pub order_id: String,
    pub amount: f64,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gst: Option<GstBreakdown>,
    /// `upi://pay?...` intent string for QR rendering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qr_data: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/// Provider callback data for payment verification.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentCallback {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}

/// Result of verifying and fetching a payment.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentVerification {
    pub verified: bool,
    pub payment_id: String,
    pub order_id: String,
    pub amount: f64,
    pub currency: String,
    pub payment_status: String,
    pub method: String,
}

/// GST split for an inclusive-tax amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GstBreakdown {
    pub rate_percent: u32,
    pub gst_paise: i64,
    pub base_paise: i64,
    pub total_paise: i64,
}

/// GST rate table by order category. Unknown categories use the standard
/// services rate.
pub fn gst_rate(category: &str) -> u32 {
    match category {
        "food" => 5,
        "clothing" => 12,
        "electronics" => 18,
        "services" => 18,
        _ => 18,
    }
}

/// Split an inclusive amount into base + GST for a category.
pub fn calculate_gst(total_paise: i64, category: &str) -> GstBreakdown {
    let rate = gst_rate(category);
    // Inclusive formula: gst = total * rate / (100 + rate).
    let gst_paise = (total_paise * i64::from(rate)) / i64::from(100 + rate);
    GstBreakdown {
        rate_percent: rate,
        gst_paise,
        base_paise: total_paise - gst_paise,
        total_paise,
    }
}

/// Convert a rupee amount to paise, rejecting non-positive amounts.
fn to_paise(amount_rupees: f64) -> Result<i64, Error> {
    if !amount_rupees.is_finite() || amount_rupees <= 0.0 {
        return Err(Error::Gateway(format!(
            "invalid payment amount: {amount_rupees}"
        )));
    }
    Ok((amount_rupees * 100.0).round() as i64)
}

/// Thin wrapper over the provider REST APIs for UPI payments. The request
/// and signing formats are dictated by the providers.
pub struct UpiGateway {
    client: Client,
    provider: UpiProvider,
    key_id: String,
    key_secret: String,
    webhook_secret: String,
    merchant_vpa: Option<String>,
    base_url: String,
}

impl UpiGateway {
    /// Build from config, resolving credentials from the named env vars.
    pub fn new(config: &PaymentConfig) -> Result<Self, Error> {
        let provider = UpiProvider::parse(&config.provider)?;
        let key_id = resolve_env(&config.key_id_env)?;
        let key_secret = resolve_env(&config.key_secret_env)?;
        // A missing webhook secret disables webhook verification only.
        let webhook_secret = resolve_env(&config.webhook_secret_env).unwrap_or_default();
        Ok(Self::from_credentials(
            provider,
            key_id,
            key_secret,
            webhook_secret,
            config.merchant_vpa.clone(),
            config.api_base.clone(),
        ))
    }

    pub fn from_credentials(
        provider: UpiProvider,
        key_id: impl Into<String>,
        key_secret: impl Into<String>,
        webhook_secret: impl Into<String>,
        merchant_vpa: Option<String>,
        api_base: Option<String>,
    ) -> Self {
        let base_url = api_base.unwrap_or_else(|| {
            match provider {
                UpiProvider::Razorpay => RAZORPAY_BASE,
                UpiProvider::Cashfree => CASHFREE_BASE,
            }
            .to_string()
        });
        Self {
            client: Client::new(),
            provider,
            key_id: key_id.into(),
            key_secret: key_secret.into(),
            webhook_secret: webhook_secret.into(),
            merchant_vpa,
            base_url,
        }
    }

    /// Create a payment order. Amount is in rupees; providers take paise
    /// (Razorpay) or decimal rupees (Cashfree).
    pub async fn create_order(
        &self,
        amount_rupees: f64,
        customer: &CustomerDetails,
        order: &OrderDetails,
    ) -> Result<PaymentOrder, Error> {
        let amount_paise = to_paise(amount_rupees)?;
        let order_id = generate_order_id(&order.id);
        let gst = order
            .category
            .as_deref()
            .map(|category| calculate_gst(amount_paise, category));

        let provider_order_id = match self.provider {
            UpiProvider::Razorpay => {
                self.create_razorpay_order(amount_paise, customer, order, &order_id, gst.as_ref())
                    .await?
            }
            UpiProvider::Cashfree => {
                self.create_cashfree_order(amount_rupees, customer, &order_id)
                    .await?
            }
        };

        let qr_data = self
            .merchant_vpa
            .as_deref()
            .map(|vpa| upi_qr_data(vpa, &customer.name, amount_rupees, &provider_order_id));

        Ok(PaymentOrder {
            provider: self.provider,
            order_id: provider_order_id,
            amount: amount_rupees,
            currency: "INR".into(),
            gst,
            qr_data,
            // Provider payment links expire after 15 minutes.
            expires_at: Utc::now() + Duration::minutes(15),
        })
    }

    async fn create_razorpay_order(
        &self,
        amount_paise: i64,
        customer: &CustomerDetails,
        order: &OrderDetails,
        receipt: &str,
        gst: Option<&GstBreakdown>,
    ) -> Result<String, Error> {
        let payload = serde_json::json!({
            "amount": amount_paise,
            "currency": "INR",
            "receipt": receipt,
            "notes": {
                "customer_name": customer.name,
                "order_description": order.description,
                "gst_paise": gst.map(|g| g.gst_paise).unwrap_or(0),
            },
        });

        let response = self
            .client
            .post(format!("{}/orders", self.base_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        #[derive(Deserialize)]
        struct RazorpayOrder {
            id: String,
        }
        let parsed: RazorpayOrder = response.json().await?;
        Ok(parsed.id)
    }

    async fn create_cashfree_order(
        &self,
        amount_rupees: f64,
        customer: &CustomerDetails,
        order_id: &str,
    ) -> Result<String, Error> {
        let payload = serde_json::json!({
            "order_id": order_id,
            "order_amount": amount_rupees,
            "order_currency": "INR",
            "customer_details": {
                "customer_id": customer.phone,
                "customer_name": customer.name,
                "customer_email": customer.email,
                "customer_phone": customer.phone,
            },
        });

        let response = self
            .client
            .post(format!("{}/orders", self.base_url))
            .header("x-client-id", &self.key_id)
            .header("x-client-secret", &self.key_secret)
            .header("x-api-version", CASHFREE_API_VERSION)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        #[derive(Deserialize)]
        struct CashfreeOrder {
            order_id: String,
        }
        let parsed: CashfreeOrder = response.json().await?;
        Ok(parsed.order_id)
    }

    /// Verify a Razorpay payment callback: HMAC-SHA256 over
    /// `"{order_id}|{payment_id}"` with the key secret, hex-encoded,
    /// compared in constant time.
    pub fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        verify_hex_hmac(
            self.key_secret.as_bytes(),
            format!("{order_id}|{payment_id}").as_bytes(),
            signature,
        )
    }

    /// Verify a callback and fetch the payment details from the provider.
    pub async fn verify_payment(
        &self,
        callback: &PaymentCallback,
    ) -> Result<PaymentVerification, Error> {
        if self.provider != UpiProvider::Razorpay {
            return Err(Error::Gateway(
                "payment verification is webhook-based for this provider".into(),
            ));
        }
        if !self.verify_signature(&callback.order_id, &callback.payment_id, &callback.signature) {
            return Err(Error::Gateway("invalid payment signature".into()));
        }

        let response = self
            .client
            .get(format!("{}/payments/{}", self.base_url, callback.payment_id))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        let payment: serde_json::Value = response.json().await?;
        Ok(PaymentVerification {
            verified: true,
            payment_id: callback.payment_id.clone(),
            order_id: callback.order_id.clone(),
            amount: payment["amount"].as_i64().unwrap_or(0) as f64 / 100.0,
            currency: payment["currency"].as_str().unwrap_or("INR").to_string(),
            payment_status: payment["status"].as_str().unwrap_or_default().to_string(),
            method: payment["method"].as_str().unwrap_or_default().to_string(),
        })
    }

    /// Create a refund for a captured payment. `amount_rupees` of `None`
    /// refunds the full amount.
    pub async fn create_refund(
        &self,
        payment_id: &str,
        amount_rupees: Option<f64>,
        reason: &str,
    ) -> Result<serde_json::Value, Error> {
        let mut payload = serde_json::json!({
            "notes": { "reason": reason },
        });
        if let Some(amount) = amount_rupees {
            payload["amount"] = serde_json::Value::from(to_paise(amount)?);
        }

        let response = self
            .client
            .post(format!("{}/payments/{payment_id}/refund", self.base_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }

    /// Fetch the payments recorded against an order.
    pub async fn payment_status(&self, order_id: &str) -> Result<serde_json::Value, Error> {
        let response = self
            .client
            .get(format!("{}/orders/{order_id}/payments", self.base_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }

    /// Verify a webhook body signature (HMAC-SHA256 over the raw body).
    pub fn verify_webhook(&self, body: &[u8], signature: &str) -> bool {
        if self.webhook_secret.is_empty() {
            return false;
        }
        verify_hex_hmac(self.webhook_secret.as_bytes(), body, signature)
    }
}

/// Generate a merchant order id: stable prefix, caller base, random suffix.
fn generate_order_id(base: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    if base.is_empty() {
        format!("order_{}", &suffix[..12])
    } else {
        format!("order_{base}_{}", &suffix[..8])
    }
}

/// Build a `upi://pay` intent string for QR rendering.
fn upi_qr_data(vpa: &str, payee_name: &str, amount_rupees: f64, order_id: &str) -> String {
    let name = payee_name.replace(' ', "%20");
    format!("upi://pay?pa={vpa}&pn={name}&am={amount_rupees:.2}&tr={order_id}&cu=INR")
}

/// Compute HMAC-SHA256 and compare against a hex signature in constant time.
fn verify_hex_hmac(secret: &[u8], payload: &[u8], signature: &str) -> bool {
    if signature.len() != 64 || !signature.chars().all(|c| c.is_ascii_hexdigit()) {
        return false;
    }
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(payload);
    let expected = hex::encode(mac.finalize().into_bytes());
    expected.as_bytes().ct_eq(signature.as_bytes()).into()
}
