use std::{collections::HashMap, path::Path, str::FromStr};

use futures::{future, stream};
use hyper::body::Bytes;
use mime::Mime;
use multer::{Constraints, Multipart as RawMultipart, SizeLimit};
use thiserror::Error;

/// Ceiling applied to one whole multipart body. Intentionally generous; the
/// transport's own read limits are expected to kick in long before this one.
const SIZE_CEILING: u64 = 10 * 1024 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum MultipartError {
    #[error("multer: {0}")]
    Multer(#[from] multer::Error),
    #[error("missing boundary")]
    MissingBoundary,
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Handle over one uploaded file of a parsed multipart body.
///
/// The payload is reference counted; cloning a handle does not copy the file
/// bytes.
#[derive(Clone, Debug)]
pub struct UploadedFile {
    name: String,
    file_name: Option<String>,
    content_type: Mime,
    data: Bytes,
}

impl UploadedFile {
    pub(crate) fn new(name: String, file_name: Option<String>, content_type: Mime, data: Bytes) -> Self {
        UploadedFile {
            name,
            file_name,
            content_type,
            data,
        }
    }

    /// The `name` param of the part's `Content-Disposition` header
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The optional `filename` param of the part's `Content-Disposition`
    /// header
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// The part's `Content-Type` Mime, defaulted to
    /// `application/octet-stream` when the part declared none
    pub fn content_type(&self) -> &Mime {
        &self.content_type
    }

    /// The file content
    pub fn bytes(&self) -> &Bytes {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Saves the file content on disk, returning the number of bytes written
    pub async fn save<P: AsRef<Path>>(&self, path: P) -> Result<usize, MultipartError> {
        tokio::fs::write(path, &self.data).await.map_err(MultipartError::Io)?;
        Ok(self.data.len())
    }
}

/// Every scalar value and uploaded file of one parsed `multipart/form-data`
/// body, keyed by part name. Values and files registered under the same name
/// keep their arrival order.
#[derive(Debug, Default)]
pub struct FormData {
    values: HashMap<String, Vec<String>>,
    files: HashMap<String, Vec<UploadedFile>>,
}

impl FormData {
    /// Parses a full multipart body. `content_type` is the request's
    /// `Content-Type` header value, which carries the boundary param.
    pub async fn parse(content_type: &str, body: Bytes) -> Result<FormData, MultipartError> {
        let boundary = Mime::from_str(content_type)
            .ok()
            .filter(|mime| mime.type_() == mime::MULTIPART && mime.subtype() == mime::FORM_DATA)
            .as_ref()
            .and_then(|mime| mime.get_param(mime::BOUNDARY))
            .map(|name| name.to_string())
            .ok_or(MultipartError::MissingBoundary)?;

        let constraints = Constraints::new().size_limit(SizeLimit::new().whole_stream(SIZE_CEILING));
        let stream = stream::once(future::ready(Ok::<_, std::convert::Infallible>(body)));
        let mut raw = RawMultipart::with_constraints(stream, boundary, constraints);

        let mut form = FormData::default();
        while let Some(field) = raw.next_field().await? {
            let name = field.name().unwrap_or_default().to_owned();
            if field.file_name().is_some() {
                let file_name = field.file_name().map(ToOwned::to_owned);
                let content_type = field.content_type().cloned().unwrap_or(mime::APPLICATION_OCTET_STREAM);
                let data = field.bytes().await?;
                form.files
                    .entry(name.clone())
                    .or_default()
                    .push(UploadedFile::new(name, file_name, content_type, data));
            } else {
                let value = field.text().await?;
                form.values.entry(name).or_default().push(value);
            }
        }

        Ok(form)
    }

    /// The first scalar value registered under `name`
    pub fn value(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(|values| values.first()).map(String::as_str)
    }

    /// Every scalar value registered under `name`, in arrival order
    pub fn values(&self, name: &str) -> &[String] {
        self.values.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Every uploaded file registered under `name`, in arrival order
    pub fn files(&self, name: &str) -> &[UploadedFile] {
        self.files.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    #[cfg(test)]
    pub(crate) fn push_value(&mut self, name: &str, value: &str) {
        self.values.entry(name.to_owned()).or_default().push(value.to_owned());
    }

    #[cfg(test)]
    pub(crate) fn push_file(&mut self, file: UploadedFile) {
        self.files.entry(file.name.clone()).or_default().push(file);
    }
}

#[cfg(test)]
mod t {
    use super::*;

    const BOUNDARY: &str = "f9a5d9e7b9d3e7a1";

    fn body() -> String {
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nhello\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nworld\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"attachment\"; filename=\"notes.txt\"\r\nContent-Type: text/plain\r\n\r\nsome notes\r\n\
             --{b}--\r\n",
            b = BOUNDARY
        )
    }

    fn content_type() -> String {
        format!("multipart/form-data; boundary={}", BOUNDARY)
    }

    #[tokio::test]
    async fn parses_values_and_files() {
        let form = FormData::parse(&content_type(), Bytes::from(body())).await.expect("parse");

        assert_eq!(form.value("title"), Some("hello"));
        assert_eq!(form.values("title").to_vec(), vec!["hello".to_owned(), "world".to_owned()]);

        let files = form.files("attachment");
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name(), "attachment");
        assert_eq!(files[0].file_name(), Some("notes.txt"));
        assert_eq!(files[0].content_type(), &mime::TEXT_PLAIN);
        assert_eq!(files[0].bytes().as_ref(), b"some notes");
    }

    #[tokio::test]
    async fn absent_names_yield_empty_slices() {
        let form = FormData::parse(&content_type(), Bytes::from(body())).await.expect("parse");

        assert_eq!(form.value("nope"), None);
        assert!(form.values("nope").is_empty());
        assert!(form.files("nope").is_empty());
    }

    #[tokio::test]
    async fn missing_boundary_is_rejected() {
        let res = FormData::parse("multipart/form-data", Bytes::from_static(b"--x--")).await;
        assert!(matches!(res, Err(MultipartError::MissingBoundary)));
    }

    #[tokio::test]
    async fn truncated_body_is_rejected() {
        let truncated = format!("--{}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nhel", BOUNDARY);
        let res = FormData::parse(&content_type(), Bytes::from(truncated)).await;
        assert!(matches!(res, Err(MultipartError::Multer(_))));
    }
}
