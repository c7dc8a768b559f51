//! Provider REST client

use std::time::Duration;

use serde::Deserialize;

use supplier_voice_config::TelephonyConfig;

use crate::TelephonyError;

/// Result of a successful dial request
#[derive(Debug, Clone)]
pub struct DialOutcome {
    /// Call identifier assigned by the provider
    pub call_sid: String,
    /// Initial provider status (e.g. "queued")
    pub status: String,
}

#[derive(Deserialize)]
struct CallResource {
    sid: String,
    status: String,
}

/// REST client for the telephony provider
#[derive(Clone)]
pub struct TelephonyClient {
    http: reqwest::Client,
    config: TelephonyConfig,
}

impl TelephonyClient {
    pub fn new(config: TelephonyConfig) -> Result<Self, TelephonyError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    fn check_configured(&self) -> Result<(), TelephonyError> {
        if self.config.account_sid.is_empty() || self.config.auth_token.is_empty() {
            return Err(TelephonyError::NotConfigured(
                "telephony.account_sid / telephony.auth_token".to_string(),
            ));
        }
        if self.config.from_number.is_empty() {
            return Err(TelephonyError::NotConfigured(
                "telephony.from_number".to_string(),
            ));
        }
        Ok(())
    }

    fn calls_url(&self, suffix: &str) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Calls{}",
            self.config.base_url, self.config.account_sid, suffix
        )
    }

    fn classify(status: u16, body: String) -> TelephonyError {
        if (400..500).contains(&status) {
            TelephonyError::Rejected { status, body }
        } else {
            TelephonyError::Unavailable { status, body }
        }
    }

    /// Place an outbound call executing `twiml`, reporting status changes
    /// to `status_callback`
    pub async fn create_call(
        &self,
        to: &str,
        twiml: &str,
        status_callback: &str,
    ) -> Result<DialOutcome, TelephonyError> {
        self.check_configured()?;

        let params = [
            ("To", to),
            ("From", self.config.from_number.as_str()),
            ("Twiml", twiml),
            ("StatusCallback", status_callback),
            ("StatusCallbackMethod", "POST"),
            ("StatusCallbackEvent", "initiated ringing answered completed"),
        ];

        let response = self
            .http
            .post(self.calls_url(".json"))
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify(status.as_u16(), body));
        }

        let call: CallResource = response.json().await?;
        tracing::info!(call_sid = %call.sid, to = %to, "Dialed outbound call");

        Ok(DialOutcome {
            call_sid: call.sid,
            status: call.status,
        })
    }

    /// Replace the TwiML running on a live call
    pub async fn redirect_call(&self, call_sid: &str, twiml: &str) -> Result<(), TelephonyError> {
        self.check_configured()?;

        let params = [("Twiml", twiml)];
        let response = self
            .http
            .post(self.calls_url(&format!("/{}.json", call_sid)))
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify(status.as_u16(), body));
        }

        tracing::debug!(call_sid = %call_sid, "Redirected live call");
        Ok(())
    }

    /// Download a recorded supplier utterance as WAV bytes
    pub async fn fetch_recording(&self, recording_url: &str) -> Result<Vec<u8>, TelephonyError> {
        self.check_configured()?;

        let response = self
            .http
            .get(format!("{}.wav", recording_url))
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify(status.as_u16(), body));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_client() {
        let client = TelephonyClient::new(TelephonyConfig::default()).unwrap();
        assert!(matches!(
            client.check_configured(),
            Err(TelephonyError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_error_classification() {
        assert!(matches!(
            TelephonyClient::classify(400, String::new()),
            TelephonyError::Rejected { .. }
        ));
        assert!(matches!(
            TelephonyClient::classify(503, String::new()),
            TelephonyError::Unavailable { .. }
        ));
    }
}
