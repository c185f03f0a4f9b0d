use super::test_helpers::*;
use super::*;
use crate::error::{Error, FetchError, TaskError};
use crate::types::{
    AssetKind, DownloadKind, MarkdownKind, Outcome, ProcessRequest, Stage, Status,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod submit;

/// A request for `url` with every option left out
pub(crate) fn request(url: impl Into<String>) -> ProcessRequest {
    ProcessRequest {
        url: url.into(),
        user_id: None,
        llm: None,
        chapters: None,
        voice: None,
        word_count: None,
    }
}
