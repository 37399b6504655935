//! Preview mode: a request-scoped content ref carried in a cookie

use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};

use crate::error::Result;
use crate::prismic::{ContentApi, QueryOptions};
use crate::templates::post_path;

/// Cookie holding the preview ref
pub const PREVIEW_COOKIE: &str = "spacetraveling.preview";

/// Preview state of a single request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewContext {
    reference: Option<String>,
}

impl PreviewContext {
    pub fn new(reference: impl Into<String>) -> Self {
        let reference = reference.into();
        Self {
            reference: Some(reference).filter(|r| !r.is_empty()),
        }
    }

    /// Read the preview ref from a `Cookie` request header
    pub fn from_cookie_header(header: &str) -> Self {
        let reference = header
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == PREVIEW_COOKIE)
            .and_then(|(_, value)| percent_decode_str(value).decode_utf8().ok())
            .map(|value| value.into_owned());

        reference.map(Self::new).unwrap_or_default()
    }

    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.reference.is_some()
    }

    /// `Set-Cookie` value entering preview mode with `reference`
    pub fn set_cookie(reference: &str) -> String {
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            PREVIEW_COOKIE,
            utf8_percent_encode(reference, NON_ALPHANUMERIC)
        )
    }

    /// `Set-Cookie` value leaving preview mode
    pub fn clear_cookie() -> String {
        format!("{PREVIEW_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
    }
}

/// Page to open when previewing `document_id`: its post page, or the home
/// page when no document is given or it has no uid.
pub async fn resolve_path(
    api: &dyn ContentApi,
    doc_type: &str,
    document_id: Option<&str>,
    reference: &str,
) -> Result<String> {
    let Some(document_id) = document_id.filter(|id| !id.is_empty()) else {
        return Ok("/".to_string());
    };

    let options = QueryOptions::new().reference(Some(reference));
    let document = api.get_by_id(document_id, &options).await?;

    Ok(match document.uid {
        Some(uid) if document.doc_type == doc_type && !uid.is_empty() => post_path(&uid),
        _ => "/".to_string(),
    })
}
