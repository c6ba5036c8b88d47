//! Custody API Signer
//!
//! Adapter for a raw-payload signing API that holds the user's key. Every
//! request is authenticated with an `X-Stamp` header: a P-256 signature over
//! the exact request body, made with the API credential.

use super::{SignRequest, TransactionSigner};
use crate::error::{StxError, StxResult};
use crate::signing::SignatureComponents;
use crate::utils::logging::{redact_address, redact_hash};
use crate::utils::network_config::{join_path, validate_endpoint};
use crate::utils::{body_excerpt, build_client};
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;
use zeroize::Zeroizing;

const SIGN_RAW_PAYLOAD_PATH: &str = "/public/v1/submit/sign_raw_payload";
const ACTIVITY_TYPE: &str = "ACTIVITY_TYPE_SIGN_RAW_PAYLOAD_V2";
const STAMP_SCHEME: &str = "SIGNATURE_SCHEME_TK_API_P256";
const PAYLOAD_ENCODING_HEX: &str = "PAYLOAD_ENCODING_HEXADECIMAL";
const HASH_FUNCTION_NO_OP: &str = "HASH_FUNCTION_NO_OP";
const EXCERPT_CHARS: usize = 200;

/// Credentials and endpoint of the custody API
#[derive(Debug)]
pub struct CustodyConfig {
    pub api_base_url: Url,
    pub organization_id: String,
    /// Compressed P-256 public key of the API credential, hex
    pub api_public_key: String,
    /// P-256 private key of the API credential, hex
    pub api_private_key: SecretString,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl CustodyConfig {
    pub fn new(
        api_base_url: &str,
        organization_id: impl Into<String>,
        api_public_key: impl Into<String>,
        api_private_key: SecretString,
    ) -> StxResult<Self> {
        Ok(Self {
            api_base_url: validate_endpoint(api_base_url)?,
            organization_id: organization_id.into(),
            api_public_key: api_public_key.into(),
            api_private_key,
            request_timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
        })
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignRawPayloadBody<'a> {
    #[serde(rename = "type")]
    activity_type: &'static str,
    timestamp_ms: String,
    organization_id: &'a str,
    parameters: SignRawPayloadParameters<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignRawPayloadParameters<'a> {
    sign_with: &'a str,
    payload: &'a str,
    encoding: &'static str,
    hash_function: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiStamp<'a> {
    public_key: &'a str,
    scheme: &'static str,
    signature: String,
}

#[derive(Debug, Deserialize)]
struct ActivityResponse {
    activity: Activity,
}

#[derive(Debug, Deserialize)]
struct Activity {
    #[serde(default)]
    id: Option<String>,
    status: String,
    #[serde(default)]
    result: Option<ActivityResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActivityResult {
    sign_raw_payload_result: Option<SignatureComponents>,
}

/// Signs digests through the custody API
pub struct CustodySigner {
    client: Client,
    endpoint: Url,
    organization_id: String,
    public_key_hex: String,
    signing_key: SigningKey,
}

impl CustodySigner {
    /// Parse the credential and check it against the configured public key
    pub fn new(config: CustodyConfig) -> StxResult<Self> {
        let key_bytes = Zeroizing::new(
            hex::decode(config.api_private_key.expose_secret().trim())
                .map_err(|_| StxError::config("API private key is not hex"))?,
        );
        let signing_key = SigningKey::from_slice(&key_bytes)
            .map_err(|_| StxError::config("API private key is not a P-256 scalar"))?;

        let public_key_hex = hex::encode(
            signing_key
                .verifying_key()
                .to_encoded_point(true)
                .as_bytes(),
        );
        if !public_key_hex.eq_ignore_ascii_case(config.api_public_key.trim()) {
            return Err(StxError::config(
                "API public key does not match the API private key",
            ));
        }

        Ok(Self {
            client: build_client(
                config.request_timeout,
                config.connect_timeout,
                concat!("stx-custody/", env!("CARGO_PKG_VERSION")),
            )?,
            endpoint: join_path(&config.api_base_url, SIGN_RAW_PAYLOAD_PATH)?,
            organization_id: config.organization_id,
            public_key_hex,
            signing_key,
        })
    }

    /// `X-Stamp` value for `body`
    fn stamp(&self, body: &str) -> StxResult<String> {
        let signature: Signature = self.signing_key.sign(body.as_bytes());
        let stamp = ApiStamp {
            public_key: &self.public_key_hex,
            scheme: STAMP_SCHEME,
            signature: hex::encode(signature.to_der().as_bytes()),
        };
        let json = serde_json::to_string(&stamp)
            .map_err(|e| StxError::codec(format!("Stamp encoding: {}", e)))?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    fn request_body(&self, request: &SignRequest) -> StxResult<String> {
        let body = SignRawPayloadBody {
            activity_type: ACTIVITY_TYPE,
            timestamp_ms: chrono::Utc::now().timestamp_millis().to_string(),
            organization_id: &self.organization_id,
            parameters: SignRawPayloadParameters {
                sign_with: &request.account,
                payload: &request.digest_hex,
                encoding: PAYLOAD_ENCODING_HEX,
                hash_function: HASH_FUNCTION_NO_OP,
            },
        };
        serde_json::to_string(&body).map_err(|e| StxError::codec(format!("Request encoding: {}", e)))
    }
}

impl fmt::Debug for CustodySigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustodySigner")
            .field("endpoint", &self.endpoint.as_str())
            .field("organization_id", &self.organization_id)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TransactionSigner for CustodySigner {
    async fn sign(&self, request: &SignRequest) -> StxResult<SignatureComponents> {
        let body = self.request_body(request)?;
        let stamp = self.stamp(&body)?;

        tracing::debug!(
            account = %redact_address(&request.account),
            digest = %redact_hash(&request.digest_hex),
            "requesting custody signature"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header("X-Stamp", stamp)
            .body(body)
            .send()
            .await
            .map_err(|e| StxError::SignerUnavailable(describe_send_error(&e)))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| StxError::SignerUnavailable(format!("Response body unreadable: {}", e)))?;

        let result = interpret_sign_response(status, &text);
        if let Err(e) = &result {
            tracing::warn!(status, error = %e, "custody signing failed");
        }
        result
    }
}

fn describe_send_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "Custody API timed out".to_string()
    } else if e.is_connect() {
        format!("Cannot reach custody API: {}", e)
    } else {
        e.to_string()
    }
}

/// Classify a custody API response to a sign request
pub fn interpret_sign_response(status: u16, body: &str) -> StxResult<SignatureComponents> {
    if status >= 500 {
        return Err(StxError::SignerUnavailable(format!(
            "HTTP {}: {}",
            status,
            body_excerpt(body, EXCERPT_CHARS)
        )));
    }
    if status >= 400 {
        return Err(StxError::SignerRejected(format!(
            "HTTP {}: {}",
            status,
            body_excerpt(body, EXCERPT_CHARS)
        )));
    }
    if !(200..300).contains(&status) {
        return Err(StxError::SignerMalformedResponse(format!(
            "Unexpected HTTP status {}",
            status
        )));
    }

    let parsed: ActivityResponse = serde_json::from_str(body).map_err(|e| {
        StxError::SignerMalformedResponse(format!("Undecodable activity: {}", e))
    })?;
    let activity = parsed.activity;
    let id = activity.id.unwrap_or_default();

    match activity.status.as_str() {
        "ACTIVITY_STATUS_COMPLETED" => activity
            .result
            .and_then(|r| r.sign_raw_payload_result)
            .ok_or_else(|| {
                StxError::SignerMalformedResponse(format!(
                    "Activity {} completed without a signature",
                    id
                ))
            }),
        "ACTIVITY_STATUS_REJECTED" | "ACTIVITY_STATUS_FAILED" | "ACTIVITY_STATUS_CONSENSUS_NEEDED" => {
            Err(StxError::SignerRejected(format!(
                "Activity {} ended with {}",
                id, activity.status
            )))
        }
        "ACTIVITY_STATUS_CREATED" | "ACTIVITY_STATUS_PENDING" => Err(StxError::SignerUnavailable(
            format!("Activity {} is still {}", id, activity.status),
        )),
        other => Err(StxError::SignerMalformedResponse(format!(
            "Unknown activity status {}",
            other
        ))),
    }
}
