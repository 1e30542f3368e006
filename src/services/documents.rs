// SPDX-License-Identifier: MIT

//! Document service: list, upload, and manage indexed documents.

use crate::error::ApiError;
use crate::models::DocumentRecord;
use crate::transport::Connection;
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde_json::Value;

/// Client for the document backend.
#[derive(Clone)]
pub struct DocumentService {
    conn: Connection,
}

impl DocumentService {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// List all documents for the current tenant.
    ///
    /// Accepts both a bare array and a `{"results": [...]}` page envelope;
    /// anything else is treated as an empty list, matching the backends'
    /// looser moments.
    pub async fn list(&self) -> Result<Vec<DocumentRecord>, ApiError> {
        let raw: Value = self.conn.get_json("/doc/documents/").await?;

        let items = match raw {
            Value::Array(items) => items,
            Value::Object(mut obj) => match obj.remove("results") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };

        items
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<DocumentRecord>, _>>()
            .map_err(|err| ApiError::Internal(anyhow::anyhow!("Document parse error: {}", err)))
    }

    /// Upload a document as multipart form data.
    ///
    /// The form is rebuilt from the byte buffer on each attempt so the
    /// refresh-and-replay cycle can reissue the upload.
    pub async fn upload(
        &self,
        file_name: &str,
        content_type: Option<&str>,
        bytes: Vec<u8>,
        title: Option<&str>,
    ) -> Result<DocumentRecord, ApiError> {
        let file_name = file_name.to_string();
        let content_type = content_type.map(str::to_string);
        let title = title.map(str::to_string);

        let response = self
            .conn
            .execute(move |http, base| {
                let mut part = Part::bytes(bytes.clone()).file_name(file_name.clone());
                if let Some(ct) = &content_type {
                    if let Ok(typed) = Part::bytes(bytes.clone())
                        .file_name(file_name.clone())
                        .mime_str(ct)
                    {
                        part = typed;
                    }
                }

                let mut form = Form::new().part("file", part);
                if let Some(title) = &title {
                    form = form.text("title", title.clone());
                }

                http.post(format!("{}/doc/documents/", base)).multipart(form)
            })
            .await?;

        Connection::parse_json(response).await
    }

    pub async fn get(&self, id: &str) -> Result<DocumentRecord, ApiError> {
        self.conn.get_json(&format!("/doc/documents/{}/", id)).await
    }

    pub async fn update(&self, id: &str, payload: Value) -> Result<DocumentRecord, ApiError> {
        self.conn
            .request_json(Method::PUT, &format!("/doc/documents/{}/", id), Some(payload))
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.conn
            .request_empty(Method::DELETE, &format!("/doc/documents/{}/", id), None)
            .await
    }
}
