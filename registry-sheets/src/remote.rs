//! Remote persistence collaborator: one read endpoint, two write actions.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use registry_core::{DispositionUpdate, Patient, RegistryError};

/// The spreadsheet web app, or any store that speaks its contract.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Raw `{status, data}` read response.
    async fn fetch_all(&self) -> Result<Value, RegistryError>;

    /// Full upsert of one patient.
    async fn save(&self, patient: &Patient) -> Result<(), RegistryError>;

    /// Partial update of the final disposition fields.
    async fn patch(&self, id: &str, updates: &DispositionUpdate) -> Result<(), RegistryError>;
}

#[derive(Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
enum WriteAction<'a> {
    Save {
        patient: &'a Patient,
    },
    Patch {
        id: &'a str,
        updates: &'a DispositionUpdate,
    },
}

/// Body of a `save` request.
pub fn save_payload(patient: &Patient) -> Result<Value, RegistryError> {
    serde_json::to_value(WriteAction::Save { patient })
        .map_err(|err| RegistryError::Parse(err.to_string()))
}

/// Body of a `patch` request.
pub fn patch_payload(id: &str, updates: &DispositionUpdate) -> Result<Value, RegistryError> {
    serde_json::to_value(WriteAction::Patch { id, updates })
        .map_err(|err| RegistryError::Parse(err.to_string()))
}

#[cfg(feature = "http")]
pub use http::HttpRemoteStore;

#[cfg(feature = "http")]
mod http {
    use async_trait::async_trait;
    use reqwest::{header::CONTENT_TYPE, Client};
    use serde_json::Value;

    use registry_core::{DispositionUpdate, Patient, RegistryError};

    use super::{patch_payload, save_payload, RemoteStore};

    /// HTTP client for the deployed web app URL.
    #[derive(Clone)]
    pub struct HttpRemoteStore {
        client: Client,
        url: String,
    }

    impl HttpRemoteStore {
        pub fn new(url: impl Into<String>) -> Self {
            Self {
                client: Client::new(),
                url: url.into(),
            }
        }

        pub fn url(&self) -> &str {
            &self.url
        }

        // Plain-text body keeps the web app free of CORS preflight.
        async fn post(&self, body: Value) -> Result<(), RegistryError> {
            self.client
                .post(&self.url)
                .header(CONTENT_TYPE, "text/plain;charset=utf-8")
                .body(body.to_string())
                .send()
                .await
                .and_then(|response| response.error_for_status())
                .map_err(transport_error)?;
            Ok(())
        }
    }

    #[async_trait]
    impl RemoteStore for HttpRemoteStore {
        async fn fetch_all(&self) -> Result<Value, RegistryError> {
            let response = self
                .client
                .get(&self.url)
                .send()
                .await
                .and_then(|response| response.error_for_status())
                .map_err(transport_error)?;

            response
                .json::<Value>()
                .await
                .map_err(|err| RegistryError::Parse(err.to_string()))
        }

        async fn save(&self, patient: &Patient) -> Result<(), RegistryError> {
            self.post(save_payload(patient)?).await
        }

        async fn patch(&self, id: &str, updates: &DispositionUpdate) -> Result<(), RegistryError> {
            self.post(patch_payload(id, updates)?).await
        }
    }

    fn transport_error(err: reqwest::Error) -> RegistryError {
        RegistryError::Transport(err.to_string())
    }
}
