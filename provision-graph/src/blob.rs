//! HTTP blob service backend for the cursor store.
//!
//! Objects live at `{account}/{container}/{key}`. Authorization is a SAS
//! query string appended to every request; no shared-key signing.

use std::fmt;

use provision_sync::{BlobStore, RemoteError, StoreError};

use crate::error::map_ureq_error;

/// Service API version sent with every request.
pub const STORAGE_API_VERSION: &str = "2021-08-06";

#[derive(Clone)]
pub struct HttpBlobStore {
    agent: ureq::Agent,
    account_url: String,
    container: String,
    sas: Option<String>,
}

impl fmt::Debug for HttpBlobStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpBlobStore")
            .field("account_url", &self.account_url)
            .field("container", &self.container)
            .field("sas", &self.sas.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl HttpBlobStore {
    pub fn new(agent: ureq::Agent, account_url: &str, container: &str, sas: Option<String>) -> Self {
        Self {
            agent,
            account_url: account_url.trim_end_matches('/').to_owned(),
            container: container.trim_matches('/').to_owned(),
            sas: sas.map(|s| s.trim_start_matches('?').to_owned()),
        }
    }

    fn blob_url(&self, key: &str) -> String {
        let base = format!("{}/{}/{}", self.account_url, self.container, key);
        match &self.sas {
            Some(sas) => format!("{base}?{sas}"),
            None => base,
        }
    }

    fn container_url(&self) -> String {
        let base = format!("{}/{}?restype=container", self.account_url, self.container);
        match &self.sas {
            Some(sas) => format!("{base}&{sas}"),
            None => base,
        }
    }

    fn request(&self, method: &str, url: &str) -> ureq::Request {
        self.agent
            .request(method, url)
            .set("x-ms-version", STORAGE_API_VERSION)
    }
}

fn remote(err: ureq::Error) -> StoreError {
    StoreError::Remote(map_ureq_error(err))
}

impl BlobStore for HttpBlobStore {
    fn ensure_container(&self) -> Result<(), StoreError> {
        match self.request("PUT", &self.container_url()).call() {
            Ok(_) => Ok(()),
            // ContainerAlreadyExists
            Err(ureq::Error::Status(409, _)) => Ok(()),
            Err(err) => Err(remote(err)),
        }
    }

    fn exists(&self, key: &str) -> Result<bool, StoreError> {
        match self.request("HEAD", &self.blob_url(key)).call() {
            Ok(_) => Ok(true),
            Err(ureq::Error::Status(404, _)) => Ok(false),
            Err(err) => Err(remote(err)),
        }
    }

    fn read_text(&self, key: &str) -> Result<String, StoreError> {
        let response = self.request("GET", &self.blob_url(key)).call().map_err(remote)?;
        response
            .into_string()
            .map_err(|e| StoreError::Remote(RemoteError::decode(format!("blob body: {e}"))))
    }

    fn write_text(&self, key: &str, text: &str) -> Result<(), StoreError> {
        self.request("PUT", &self.blob_url(key))
            .set("x-ms-blob-type", "BlockBlob")
            .set("Content-Type", "application/json; charset=utf-8")
            .send_string(text)
            .map_err(remote)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        match self.request("DELETE", &self.blob_url(key)).call() {
            Ok(_) => Ok(true),
            Err(ureq::Error::Status(404, _)) => Ok(false),
            Err(err) => Err(remote(err)),
        }
    }
}
