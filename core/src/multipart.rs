//! `multipart/form-data` bodies for upload bindings.
//!
//! Parts are collected as owned data and encoded in one go by ureq's form
//! writer, which also picks the boundary. Field names and file names are
//! escaped the way browsers do (`"`, CR and LF percent-encoded) before they
//! reach the `Content-Disposition` header.

use std::io::Read;

use ureq::unversioned::multipart::{Form, Part};

use crate::error::ApiError;

#[derive(Debug, Clone)]
struct FormPart {
    name: String,
    filename: Option<String>,
    content_type: Option<String>,
    data: Vec<u8>,
}

/// An encoded form: the `Content-Type` header value and the body bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedForm {
    pub content_type: String,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct Multipart {
    parts: Vec<FormPart>,
}

impl Multipart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(FormPart {
            name: name.into(),
            filename: None,
            content_type: None,
            data: value.into().into_bytes(),
        });
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        self.parts.push(FormPart {
            name: name.into(),
            filename: Some(filename.into()),
            content_type: Some(content_type.into()),
            data,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Encode every part. Fails on an unparseable part content type.
    pub fn encode(&self) -> Result<EncodedForm, ApiError> {
        let names: Vec<String> = self.parts.iter().map(|p| escape_param(&p.name)).collect();
        let mut form = Form::new();
        for (part, name) in self.parts.iter().zip(&names) {
            let mut encoded = Part::bytes(&part.data);
            if let Some(filename) = &part.filename {
                encoded = encoded.file_name(&escape_param(filename));
            }
            if let Some(content_type) = &part.content_type {
                encoded = encoded
                    .mime_str(content_type)
                    .map_err(|e| ApiError::Serialization(e.to_string()))?;
            }
            form = form.part(name, encoded);
        }

        let content_type = format!("multipart/form-data; boundary={}", form.boundary());
        let mut body = Vec::new();
        form.read_to_end(&mut body)
            .map_err(|e| ApiError::Serialization(format!("multipart encoding failed: {e}")))?;
        Ok(EncodedForm { content_type, body })
    }
}

/// Percent-encode the characters that would end a quoted header parameter
/// or the header line itself.
fn escape_param(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => out.push_str("%22"),
            '\r' => out.push_str("%0D"),
            '\n' => out.push_str("%0A"),
            c => out.push(c),
        }
    }
    out
}
