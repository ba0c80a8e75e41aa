//! Backend cart API client.
//!
//! One endpoint: `POST {base}/update_item/` with the mutation payload and
//! the anti-forgery token header. The backend owns all business logic; this
//! client only ships actions and decodes the returned summary.

use manipi_core::{ProductId, VariantId};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

use crate::action::{ActionKind, CartAction};
use crate::error::CartError;

/// Header the backend expects the anti-forgery token in.
const CSRF_HEADER: &str = "X-CSRFToken";

/// Path of the cart mutation endpoint, relative to the API base.
const UPDATE_ITEM_PATH: &str = "update_item/";

/// Wire payload for `POST /update_item/`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateItemRequest<'a> {
    product_id: &'a ProductId,
    action: ActionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    variant_id: Option<&'a VariantId>,
}

/// Cart summary returned by a successful mutation.
///
/// `cartItems` is always present; the rest depends on what the mutation did
/// (a deletion response has no per-product `quantity`, for example).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    /// Human-readable outcome, e.g. `"Item updated successfully"`.
    pub message: Option<String>,
    /// Quantity of the mutated line after the update.
    pub quantity: Option<u32>,
    /// Total item count across the order.
    pub cart_items: u32,
    /// Order total in the store currency.
    pub cart_total: Option<Decimal>,
}

/// Client for the backend cart API.
pub struct CartApiClient {
    client: reqwest::Client,
    endpoint: Url,
    csrf_token: Option<SecretString>,
}

impl CartApiClient {
    /// Create a client for the given API base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot carry the endpoint path
    /// (e.g. a `mailto:` URL).
    pub fn new(base: &Url, csrf_token: Option<SecretString>) -> Result<Self, url::ParseError> {
        let endpoint = base.join(UPDATE_ITEM_PATH)?;
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
            csrf_token,
        })
    }

    /// Send one cart mutation and decode the updated summary.
    ///
    /// # Errors
    ///
    /// Returns an error on connection failure, a non-2xx status, or a body
    /// that is not a cart summary (including a JSON `error` field, which the
    /// backend uses for application-level rejections).
    #[instrument(skip(self), fields(product_id = %action.product_id(), action = %action.kind()))]
    pub async fn update_item(&self, action: &CartAction) -> Result<CartSummary, CartError> {
        let payload = UpdateItemRequest {
            product_id: action.product_id(),
            action: action.kind(),
            variant_id: action.variant_id(),
        };

        let mut request = self.client.post(self.endpoint.clone()).json(&payload);
        if let Some(token) = &self.csrf_token {
            request = request.header(CSRF_HEADER, token.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();

        // Read the body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(200).collect::<String>(),
                "cart API returned non-success status"
            );
            return Err(CartError::Backend {
                status: status.as_u16(),
                message: extract_error_message(&body)
                    .unwrap_or_else(|| format!("HTTP {status}")),
            });
        }

        // The backend reports application-level rejections as an `error`
        // field inside a 2xx body as well.
        if let Some(message) = extract_error_message(&body) {
            return Err(CartError::Backend {
                status: status.as_u16(),
                message,
            });
        }

        match serde_json::from_str(&body) {
            Ok(summary) => Ok(summary),
            Err(error) => {
                tracing::error!(
                    %error,
                    body = %body.chars().take(200).collect::<String>(),
                    "failed to parse cart summary"
                );
                Err(CartError::UnexpectedResponse(error))
            }
        }
    }
}

impl std::fmt::Debug for CartApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartApiClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("csrf_token", &self.csrf_token.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

/// Pull the `error` field out of a response body, if it is JSON with one.
fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
}
