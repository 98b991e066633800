//! Compile service HTTP client.
//!
//! Async HTTP client using `reqwest`. Every call runs its steps in order
//! (read inputs, POST, read response, write output) and nothing is retried.

use std::path::{Path, PathBuf};

use enginedock_file_ops::{resolve_path, resolve_sibling};
use enginedock_protocol::{FIELD_JAR, FIELD_POJO, PING_PATH, RemoteOperation};
use reqwest::StatusCode;
use reqwest::multipart::Form;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::CompileError;
use crate::package::{file_part, output_file_name};

/// Client for one compile service instance.
pub struct CompileClient {
    http: reqwest::Client,
    address: String,
}

impl CompileClient {
    /// Creates a client for the service at `address` (`host:port`).
    pub fn new(address: impl Into<String>) -> Result<Self, CompileError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            address: address.into(),
        })
    }

    /// The `host:port` this client talks to.
    pub fn address(&self) -> &str {
        &self.address
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}/{}", self.address, path.trim_start_matches('/'))
    }

    /// Checks that the service answers at all.
    ///
    /// Only transport failures count; an error status is still an answer.
    pub async fn ping(&self) -> Result<(), CompileError> {
        let resp = self.http.get(self.url(PING_PATH)).send().await?;
        if !resp.status().is_success() {
            warn!(status = %resp.status(), "compile service ping returned an error status");
        }
        Ok(())
    }

    /// Uploads a POJO and its JAR to `url` as `pojo` and `jar` file fields.
    ///
    /// Returns the response only if the service answered `200 OK`; any other
    /// status becomes [`CompileError::Remote`] carrying the response body.
    pub async fn upload_java_files(
        &self,
        url: &str,
        pojo_path: &Path,
        jar_path: &Path,
    ) -> Result<reqwest::Response, CompileError> {
        let pojo_path = resolve(pojo_path)?;
        let jar_path = resolve(jar_path)?;

        let form = Form::new()
            .part(FIELD_POJO, file_part(&pojo_path).await?)
            .part(FIELD_JAR, file_part(&jar_path).await?);

        debug!(
            url,
            pojo = %pojo_path.display(),
            jar = %jar_path.display(),
            "uploading java files"
        );

        let resp = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(CompileError::Upload)?;

        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp.text().await.map_err(CompileError::ReadResponse)?;
            return Err(CompileError::Remote {
                status: status.to_string(),
                body,
            });
        }

        Ok(resp)
    }

    /// Runs `operation` on the POJO at `model_path` with the JAR at
    /// `jar_path` and stores the result next to the POJO.
    ///
    /// Returns the canonical path of the written `.jar`/`.war`.
    pub async fn compile_pojo(
        &self,
        model_path: &Path,
        jar_path: &Path,
        operation: RemoteOperation,
    ) -> Result<PathBuf, CompileError> {
        let out_name = output_file_name(model_path, operation)?;
        let out_path =
            resolve_sibling(model_path, &out_name).map_err(|source| CompileError::ResolvePath {
                path: model_path.to_path_buf(),
                source,
            })?;

        let mut resp = self
            .upload_java_files(&self.url(operation.path()), model_path, jar_path)
            .await?;

        let mut dst = tokio::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&out_path)
            .await
            .map_err(|source| CompileError::CreateOutput {
                path: out_path.clone(),
                source,
            })?;

        let copy_failed = |reason: String| CompileError::CopyOutput {
            path: out_path.clone(),
            reason,
        };

        let mut written: u64 = 0;
        while let Some(chunk) = resp.chunk().await.map_err(|e| copy_failed(e.to_string()))? {
            dst.write_all(&chunk)
                .await
                .map_err(|e| copy_failed(e.to_string()))?;
            written += chunk.len() as u64;
        }
        dst.flush().await.map_err(|e| copy_failed(e.to_string()))?;

        info!(
            operation = %operation,
            path = %out_path.display(),
            bytes = written,
            "compiled artifact saved"
        );
        Ok(out_path)
    }

    /// Like [`compile_pojo`](Self::compile_pojo) with the operation given by
    /// its servlet name (`compile` or `makewar`).
    ///
    /// Unknown names fail before anything is read or sent.
    pub async fn compile_pojo_with(
        &self,
        model_path: &Path,
        jar_path: &Path,
        servlet: &str,
    ) -> Result<PathBuf, CompileError> {
        let operation: RemoteOperation = servlet.parse()?;
        self.compile_pojo(model_path, jar_path, operation).await
    }
}

fn resolve(path: &Path) -> Result<PathBuf, CompileError> {
    resolve_path(path).map_err(|source| CompileError::ResolvePath {
        path: path.to_path_buf(),
        source,
    })
}
