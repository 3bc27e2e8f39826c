//! Steadfast courier client.
//!
//! One `POST {base_url}/create_order` per submitted order, authenticated with
//! the static `Api-Key` / `Secret-Key` header pair.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Number, Value};

use crate::config::{CourierConfig, Secret};
use crate::domain::errors::ProviderError;
use crate::domain::order::NewOrder;
use crate::domain::ports::{CourierDispatch, ProviderResult};

const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Serialize)]
struct CreateOrderPayload<'a> {
    invoice: &'a str,
    recipient_name: &'a str,
    recipient_phone: &'a str,
    recipient_address: &'a str,
    cod_amount: Number,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    item_description: Option<&'a str>,
    delivery_type: i16,
}

impl<'a> CreateOrderPayload<'a> {
    fn from_order(order: &'a NewOrder) -> Result<Self, ProviderError> {
        let cod_amount = Number::from_str(&order.cod_amount.to_string()).map_err(|e| {
            ProviderError::Transport(format!(
                "cod amount {} cannot be encoded: {}",
                order.cod_amount, e
            ))
        })?;
        Ok(CreateOrderPayload {
            invoice: &order.invoice,
            recipient_name: &order.recipient_name,
            recipient_phone: &order.recipient_phone,
            recipient_address: &order.recipient_address,
            cod_amount,
            note: order.note.as_deref(),
            item_description: order.item_description.as_deref(),
            delivery_type: order.delivery_type.code(),
        })
    }
}

pub struct SteadfastClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Secret,
    secret_key: Secret,
}

impl SteadfastClient {
    /// Build a client whose every request is bounded by `config.timeout`.
    pub fn new(config: &CourierConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        Ok(SteadfastClient {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            secret_key: config.secret_key.clone(),
        })
    }
}

impl fmt::Debug for SteadfastClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SteadfastClient")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key)
            .field("secret_key", &self.secret_key)
            .finish()
    }
}

fn transport_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout(err.to_string())
    } else {
        ProviderError::Transport(err.to_string())
    }
}

#[async_trait]
impl CourierDispatch for SteadfastClient {
    async fn submit(&self, order: &NewOrder) -> Result<ProviderResult, ProviderError> {
        let payload = CreateOrderPayload::from_order(order)?;
        log::info!("submitting order {} to courier", order.invoice);

        let response = self
            .http
            .post(format!("{}/create_order", self.base_url))
            .header("Api-Key", self.api_key.expose())
            .header("Secret-Key", self.secret_key.expose())
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        match serde_json::from_str::<Value>(&body) {
            Ok(value) => {
                log::debug!("courier answered order {} with {}", order.invoice, status);
                Ok(ProviderResult::from_body(value))
            }
            Err(_) if !status.is_success() => Err(ProviderError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY).collect(),
            }),
            Err(e) => Err(ProviderError::MalformedResponse(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::time::Duration;

    use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
    use bigdecimal::BigDecimal;
    use serde_json::json;

    use super::*;
    use crate::domain::order::DeliveryType;

    fn header(req: &HttpRequest, name: &str) -> String {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    async fn accepted(req: HttpRequest, body: web::Json<Value>) -> HttpResponse {
        HttpResponse::Ok().json(json!({
            "status": 200,
            "message": "Consignment has been created successfully.",
            "consignment": {"consignment_id": 1424107, "tracking_code": "15BAEB8A"},
            "echo": {
                "api_key": header(&req, "Api-Key"),
                "secret_key": header(&req, "Secret-Key"),
                "payload": body.into_inner(),
            }
        }))
    }

    async fn declined() -> HttpResponse {
        HttpResponse::UnprocessableEntity()
            .json(json!({"status": "failed", "message": "invalid address"}))
    }

    async fn bad_gateway() -> HttpResponse {
        HttpResponse::BadGateway().body("<html>502 Bad Gateway</html>")
    }

    async fn garbage() -> HttpResponse {
        HttpResponse::Ok().body("consignment created")
    }

    async fn slow() -> HttpResponse {
        actix_web::rt::time::sleep(Duration::from_secs(3)).await;
        HttpResponse::Ok().json(json!({"consignment": "late"}))
    }

    async fn spawn_courier() -> String {
        let server = HttpServer::new(|| {
            App::new()
                .route("/ok/create_order", web::post().to(accepted))
                .route("/declined/create_order", web::post().to(declined))
                .route("/down/create_order", web::post().to(bad_gateway))
                .route("/garbage/create_order", web::post().to(garbage))
                .route("/slow/create_order", web::post().to(slow))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .expect("bind stub courier");
        let addr = server.addrs()[0];
        actix_web::rt::spawn(server.run());
        format!("http://{addr}")
    }

    fn client(base_url: String) -> SteadfastClient {
        SteadfastClient::new(&CourierConfig {
            base_url,
            api_key: Secret::new("test-api-key"),
            secret_key: Secret::new("test-secret-key"),
            timeout: Duration::from_millis(500),
        })
        .expect("client")
    }

    fn order() -> NewOrder {
        NewOrder {
            invoice: "INV-1".into(),
            user_id: "u1".into(),
            recipient_name: "Jane".into(),
            recipient_phone: "555".into(),
            recipient_address: "1 Main St".into(),
            cod_amount: BigDecimal::from_str("42.5").unwrap(),
            note: Some("Leave at the door".into()),
            item_description: None,
            delivery_type: DeliveryType::Home,
        }
    }

    #[actix_web::test]
    async fn accepted_order_carries_consignment_and_credentials() {
        let base = spawn_courier().await;
        let result = client(format!("{base}/ok/")).submit(&order()).await.unwrap();

        assert!(result.is_accepted());
        let echo = &result.body["echo"];
        assert_eq!(echo["api_key"], "test-api-key");
        assert_eq!(echo["secret_key"], "test-secret-key");
        assert_eq!(
            echo["payload"],
            json!({
                "invoice": "INV-1",
                "recipient_name": "Jane",
                "recipient_phone": "555",
                "recipient_address": "1 Main St",
                "cod_amount": 42.5,
                "note": "Leave at the door",
                "delivery_type": 0
            })
        );
    }

    #[actix_web::test]
    async fn json_rejection_is_a_result_not_an_error() {
        let base = spawn_courier().await;
        let result = client(format!("{base}/declined"))
            .submit(&order())
            .await
            .unwrap();

        assert!(!result.is_accepted());
        assert_eq!(result.body["message"], "invalid address");
    }

    #[actix_web::test]
    async fn non_json_error_status_is_a_provider_error() {
        let base = spawn_courier().await;
        let err = client(format!("{base}/down"))
            .submit(&order())
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Status { status: 502, .. }));
    }

    #[actix_web::test]
    async fn non_json_success_is_malformed() {
        let base = spawn_courier().await;
        let err = client(format!("{base}/garbage"))
            .submit(&order())
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::MalformedResponse(_)));
    }

    #[actix_web::test]
    async fn slow_courier_times_out() {
        let base = spawn_courier().await;
        let err = client(format!("{base}/slow"))
            .submit(&order())
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Timeout(_)), "{err:?}");
    }

    #[actix_web::test]
    async fn unreachable_courier_is_a_transport_error() {
        let err = client("http://127.0.0.1:1".to_string())
            .submit(&order())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ProviderError::Transport(_) | ProviderError::Timeout(_)
        ));
    }

    #[test]
    fn debug_output_hides_credentials() {
        let printed = format!("{:?}", client("http://localhost".to_string()));
        assert!(!printed.contains("test-api-key"));
        assert!(!printed.contains("test-secret-key"));
    }
}
