use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Path of the sample document relative to the base URL.
pub const SAMPLE_DOCUMENT_PATH: &str = "/sample-json.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub first_name: String,
    pub last_name: String,
    pub address: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street_address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid base url: {0}")]
    BaseUrl(#[from] url::ParseError),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid document: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Read-only client for the sample person document.
#[derive(Debug, Clone)]
pub struct PersonClient {
    client: Client,
    base_url: Url,
}

impl PersonClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, Url::parse(base_url)?))
    }

    pub fn with_client(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetch and decode the sample document.
    pub async fn get(&self) -> Result<Person, ClientError> {
        let mut url = self.base_url.clone();
        url.set_path(SAMPLE_DOCUMENT_PATH);

        let resp = self.client.get(url).send().await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_sample_document() {
        let person: Person = serde_json::from_str(
            r#"{
                "firstName": "John",
                "lastName": "Doe",
                "age": 26,
                "address": {
                    "streetAddress": "naist street",
                    "city": "Nara",
                    "state": "Nara",
                    "postalCode": "630-0192"
                },
                "phoneNumbers": []
            }"#,
        )
        .unwrap();

        assert_eq!(person.first_name, "John");
        assert_eq!(person.address.postal_code, "630-0192");
    }

    #[test]
    fn rejects_bad_base_url() {
        let err = PersonClient::new("not a url", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, ClientError::BaseUrl(_)));
    }
}
