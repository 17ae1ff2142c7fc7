//! SMS gateway client with timeout and error classification.
//!
//! # Responsibilities
//! - Build and sign the `SendSms` request from config + message
//! - Issue exactly one HTTP call under the per-call timeout
//! - Decode the reply and classify failures as retryable or terminal
//!
//! The client never retries; callers decide from the error class.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use secrecy::ExposeSecret;
use url::Url;

use crate::channel::sms::reply::GatewayReply;
use crate::channel::sms::signer::{self, RequestStamp};
use crate::channel::types::{ChannelError, SendOutcome};
use crate::channel::Channel;
use crate::config::SmsConfig;
use crate::message::Message;
use crate::observability::metrics;

const ACTION: &str = "SendSms";
const API_VERSION: &str = "2017-05-25";
const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const SIGNATURE_VERSION: &str = "1.0";

/// A fully signed gateway request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    url: Url,
    signature: String,
}

impl SignedRequest {
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

/// SMS channel backed by the gateway's HTTP API.
///
/// Holds no per-call state; one instance is shared by every request.
#[derive(Clone)]
pub struct SmsClient {
    config: SmsConfig,
    endpoint: Url,
    http: reqwest::Client,
    call_timeout: Duration,
}

impl SmsClient {
    /// Create a client. Fails if the gateway URL does not parse or the HTTP
    /// client cannot be built.
    pub fn new(config: SmsConfig, call_timeout: Duration) -> Result<Self, ChannelError> {
        let endpoint = Url::parse(&config.gateway_url).map_err(|e| {
            ChannelError::InvalidRequest(format!(
                "invalid gateway URL '{}': {}",
                config.gateway_url, e
            ))
        })?;

        let http = reqwest::Client::builder()
            .timeout(call_timeout)
            .build()
            .map_err(|e| ChannelError::InvalidRequest(format!("HTTP client: {}", e)))?;

        tracing::info!(
            gateway_url = %endpoint,
            region_id = %config.region_id,
            call_timeout_secs = call_timeout.as_secs(),
            "SMS client initialized"
        );

        Ok(Self {
            config,
            endpoint,
            http,
            call_timeout,
        })
    }

    /// Build the signed request URL for a message.
    ///
    /// Identical config, message and stamp always give an identical request.
    pub fn signed_request(
        &self,
        message: &Message,
        stamp: &RequestStamp,
    ) -> Result<SignedRequest, ChannelError> {
        let template_param = serde_json::to_string(message.params())
            .map_err(|e| ChannelError::InvalidRequest(format!("template params: {}", e)))?;

        let mut params: BTreeMap<&str, String> = BTreeMap::new();
        params.insert("AccessKeyId", self.config.access_key_id.clone());
        params.insert("Action", ACTION.to_string());
        params.insert("Format", "JSON".to_string());
        params.insert("PhoneNumbers", message.recipient().to_string());
        params.insert("RegionId", self.config.region_id.clone());
        params.insert("SignName", self.config.sign_name.clone());
        params.insert("SignatureMethod", SIGNATURE_METHOD.to_string());
        params.insert("SignatureNonce", stamp.nonce.clone());
        params.insert("SignatureVersion", SIGNATURE_VERSION.to_string());
        params.insert("TemplateCode", message.template_code().to_string());
        params.insert("Timestamp", stamp.formatted_timestamp());
        params.insert("Version", API_VERSION.to_string());
        if !message.params().is_empty() {
            params.insert("TemplateParam", template_param);
        }
        if let Some(out_id) = message.request_id() {
            params.insert("OutId", out_id.to_string());
        }

        let canonical = signer::canonical_query(&params);
        let signature = signer::sign(
            self.config.access_secret.expose_secret(),
            &signer::string_to_sign("GET", &canonical),
        )
        .map_err(|e| ChannelError::InvalidRequest(format!("signing: {}", e)))?;

        let mut url = self.endpoint.clone();
        url.set_query(Some(&format!(
            "Signature={}&{}",
            signer::percent_encode(&signature),
            canonical
        )));

        Ok(SignedRequest { url, signature })
    }

    fn classify_transport(&self, err: reqwest::Error) -> ChannelError {
        if err.is_timeout() {
            ChannelError::Timeout(self.call_timeout)
        } else if err.is_builder() {
            ChannelError::InvalidRequest(err.to_string())
        } else {
            ChannelError::Transport(err.to_string())
        }
    }

    async fn dispatch(&self, message: &Message) -> SendOutcome {
        let request = self.signed_request(message, &RequestStamp::now())?;

        let response = self
            .http
            .get(request.url().clone())
            .send()
            .await
            .map_err(|e| self.classify_transport(e))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.classify_transport(e))?;

        GatewayReply::decode(status, &body).into_outcome()
    }
}

#[async_trait]
impl Channel for SmsClient {
    fn name(&self) -> &'static str {
        "sms"
    }

    async fn send(&self, message: &Message) -> SendOutcome {
        let start_time = Instant::now();
        let outcome = self.dispatch(message).await;

        match &outcome {
            Ok(receipt) => tracing::info!(
                recipient = %mask_recipient(message.recipient()),
                template_code = %message.template_code(),
                request_id = ?message.request_id(),
                message_id = ?receipt.message_id,
                "SMS accepted by gateway"
            ),
            Err(e) => tracing::warn!(
                recipient = %mask_recipient(message.recipient()),
                template_code = %message.template_code(),
                request_id = ?message.request_id(),
                class = %e.class(),
                error = %e,
                "SMS send failed"
            ),
        }
        metrics::record_send(self.name(), &outcome, start_time);

        outcome
    }
}

impl std::fmt::Debug for SmsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmsClient")
            .field("gateway_url", &self.config.gateway_url)
            .field("access_key_id", &self.config.access_key_id)
            .field("region_id", &self.config.region_id)
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}

/// Keep the last four digits of a phone number for logs.
pub fn mask_recipient(recipient: &str) -> String {
    let total = recipient.chars().count();
    let hidden = total - total.min(4);
    let shown: String = recipient.chars().skip(hidden).collect();
    format!("{}{}", "*".repeat(hidden), shown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::types::ErrorClass;
    use crate::message::{validate, RawSendRequest, TemplateCatalog};
    use chrono::TimeZone;
    use chrono::Utc;
    use secrecy::SecretString;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(gateway_url: &str) -> SmsConfig {
        SmsConfig {
            access_key_id: "testId".into(),
            access_secret: SecretString::new("testSecret".into()),
            gateway_url: gateway_url.into(),
            sign_name: "Acme".into(),
            region_id: "cn-hangzhou".into(),
        }
    }

    fn message(request_id: Option<&str>) -> Message {
        let raw = RawSendRequest {
            recipient: Some("13423234442".into()),
            template_code: Some("test".into()),
            params: [("a".to_string(), "te".to_string())].into_iter().collect(),
            request_id: request_id.map(str::to_string),
        };
        validate(&raw, &TemplateCatalog::default()).unwrap()
    }

    fn fixed_stamp() -> RequestStamp {
        RequestStamp {
            timestamp: Utc.with_ymd_and_hms(2019, 1, 7, 14, 33, 0).unwrap(),
            nonce: "45e25e9b-0a6f-4070-8c85-2956eda1b466".into(),
        }
    }

    fn client(gateway_url: &str) -> SmsClient {
        SmsClient::new(test_config(gateway_url), Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn rejects_invalid_gateway_url() {
        let err = SmsClient::new(test_config("::not a url::"), Duration::from_secs(1)).unwrap_err();
        assert_eq!(err.class(), ErrorClass::Terminal);
    }

    #[test]
    fn signing_is_deterministic() {
        let client = client("https://dysmsapi.aliyuncs.com/");
        let msg = message(Some("123"));
        let first = client.signed_request(&msg, &fixed_stamp()).unwrap();
        let second = client.signed_request(&msg, &fixed_stamp()).unwrap();
        assert_eq!(first.as_str().as_bytes(), second.as_str().as_bytes());

        let mut other_stamp = fixed_stamp();
        other_stamp.nonce = "different".into();
        let third = client.signed_request(&msg, &other_stamp).unwrap();
        assert_ne!(first.signature(), third.signature());
    }

    #[test]
    fn signed_request_carries_gateway_parameters() {
        let client = client("https://dysmsapi.aliyuncs.com/");
        let request = client.signed_request(&message(Some("123")), &fixed_stamp()).unwrap();
        let query: BTreeMap<String, String> = request.url().query_pairs().into_owned().collect();

        assert_eq!(query["Action"], "SendSms");
        assert_eq!(query["AccessKeyId"], "testId");
        assert_eq!(query["PhoneNumbers"], "13423234442");
        assert_eq!(query["TemplateCode"], "test");
        assert_eq!(query["TemplateParam"], r#"{"a":"te"}"#);
        assert_eq!(query["Timestamp"], "2019-01-07T14:33:00Z");
        assert_eq!(query["OutId"], "123");
        assert_eq!(query["Signature"], request.signature());
        assert!(request.as_str().starts_with("https://dysmsapi.aliyuncs.com/?Signature="));
        assert!(!request.as_str().contains("testSecret"));
    }

    #[test]
    fn signature_covers_canonical_query() {
        let client = client("https://dysmsapi.aliyuncs.com/");
        let request = client.signed_request(&message(None), &fixed_stamp()).unwrap();
        let canonical = request
            .as_str()
            .split_once('&')
            .map(|(_, rest)| rest.to_string())
            .unwrap();
        let expected = signer::sign("testSecret", &signer::string_to_sign("GET", &canonical)).unwrap();
        assert_eq!(request.signature(), expected);
        assert!(!canonical.contains("OutId"));
    }

    #[test]
    fn masks_recipient() {
        assert_eq!(mask_recipient("13423234442"), "*******4442");
        assert_eq!(mask_recipient("123"), "123");
        assert_eq!(mask_recipient("短信号码测试"), "**号码测试");
        assert_eq!(mask_recipient(""), "");
    }

    #[test]
    fn debug_hides_secret() {
        let debug = format!("{:?}", client("https://dysmsapi.aliyuncs.com/"));
        assert!(debug.contains("testId"));
        assert!(!debug.contains("testSecret"));
    }

    #[tokio::test]
    async fn send_returns_receipt_on_success() {
        let gateway = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("Action", "SendSms"))
            .and(query_param("PhoneNumbers", "13423234442"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Code": "OK",
                "Message": "OK",
                "BizId": "biz-1",
                "RequestId": "req-1"
            })))
            .expect(1)
            .mount(&gateway)
            .await;

        let receipt = client(&gateway.uri()).send(&message(None)).await.unwrap();
        assert_eq!(receipt.message_id.as_deref(), Some("biz-1"));
        assert_eq!(receipt.gateway_request_id.as_deref(), Some("req-1"));
    }

    #[tokio::test]
    async fn send_classifies_gateway_rejection() {
        let gateway = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "Code": "isv.MOBILE_NUMBER_ILLEGAL",
                "Message": "invalid mobile number"
            })))
            .expect(1)
            .mount(&gateway)
            .await;

        let err = client(&gateway.uri()).send(&message(None)).await.unwrap_err();
        assert_eq!(err.class(), ErrorClass::Terminal);
        assert_eq!(err.code(), Some("isv.MOBILE_NUMBER_ILLEGAL"));
    }

    #[tokio::test]
    async fn send_times_out_as_retryable() {
        let gateway = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&gateway)
            .await;

        let client = SmsClient::new(test_config(&gateway.uri()), Duration::from_millis(200)).unwrap();
        let err = client.send(&message(None)).await.unwrap_err();
        assert_eq!(err, ChannelError::Timeout(Duration::from_millis(200)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn unreachable_gateway_is_retryable() {
        let err = client("http://127.0.0.1:1/").send(&message(None)).await.unwrap_err();
        assert!(matches!(err, ChannelError::Transport(_)));
        assert_eq!(err.class(), ErrorClass::Retryable);
    }

    #[tokio::test]
    async fn makes_exactly_one_call_on_failure() {
        let gateway = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
            .expect(1)
            .mount(&gateway)
            .await;

        let err = client(&gateway.uri()).send(&message(None)).await.unwrap_err();
        assert!(err.is_retryable());
        // MockServer verifies `expect(1)` on drop.
    }
}
