use crate::config::ClientConfig;
use crate::domain::payment::{ClientSecret, PaymentElement, ProcessorConfig, ProcessorIntent};
use crate::domain::ports::PaymentProcessor;
use crate::error::{BookingError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeError,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

/// Payment processor backed by Stripe's public REST API.
///
/// Only the publishable key and the intent's client secret are used, which
/// is exactly what a browser client is allowed to hold.
#[derive(Clone)]
pub struct StripeProcessor {
    http: reqwest::Client,
    publishable_key: String,
    api_base: String,
}

impl StripeProcessor {
    /// Requests time out after `config.timeout`, like the marketplace API.
    pub fn new(processor: ProcessorConfig, config: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BookingError::Config(format!("could not build HTTP client: {e}")))?;
        Ok(Self::with_client(http, processor, config))
    }

    pub fn with_client(
        http: reqwest::Client,
        processor: ProcessorConfig,
        config: &ClientConfig,
    ) -> Self {
        Self {
            http,
            publishable_key: processor.publishable_key,
            api_base: config.stripe_api_base.clone(),
        }
    }
}

#[async_trait]
impl PaymentProcessor for StripeProcessor {
    fn mount(&self, client_secret: &ClientSecret) -> Result<PaymentElement> {
        if !client_secret.expose().contains("_secret_") {
            return Err(BookingError::Processor(
                "Invalid client secret returned for this payment.".into(),
            ));
        }
        Ok(PaymentElement::new(client_secret.clone()))
    }

    async fn confirm(&self, element: &PaymentElement, return_url: &str) -> Result<ProcessorIntent> {
        let payment_method = element
            .payment_method
            .as_deref()
            .ok_or_else(|| BookingError::Processor("Your payment details are incomplete.".into()))?;

        let url = format!(
            "{}/payment_intents/{}/confirm",
            self.api_base,
            element.client_secret.intent_id()
        );
        let form = [
            ("client_secret", element.client_secret.expose()),
            ("return_url", return_url),
            ("payment_method", payment_method),
        ];

        let response = self
            .http
            .post(url)
            .basic_auth(&self.publishable_key, None::<&str>)
            .form(&form)
            .send()
            .await
            .map_err(|e| BookingError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| BookingError::Network(e.to_string()))?;
        debug!(%status, "stripe confirm response");

        if status.is_success() {
            return serde_json::from_slice(&body).map_err(|e| {
                BookingError::Processor(format!("Unexpected response from payment processor: {e}"))
            });
        }

        let message = serde_json::from_slice::<StripeErrorBody>(&body)
            .ok()
            .and_then(|b| b.error.message.or(b.error.code))
            .unwrap_or_else(|| format!("Payment failed ({status})"));
        Err(BookingError::Processor(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processor() -> StripeProcessor {
        StripeProcessor::new(
            ProcessorConfig {
                publishable_key: "pk_test_1".into(),
            },
            &ClientConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_mount_rejects_malformed_secret() {
        assert!(processor().mount(&ClientSecret::new("garbage")).is_err());
        let element = processor()
            .mount(&ClientSecret::new("pi_1_secret_2"))
            .unwrap();
        assert!(element.payment_method.is_none());
    }

    #[tokio::test]
    async fn test_confirm_requires_payment_details() {
        let element = PaymentElement::new(ClientSecret::new("pi_1_secret_2"));
        let err = processor()
            .confirm(&element, "http://localhost/")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            BookingError::Processor("Your payment details are incomplete.".into())
        );
    }
}
