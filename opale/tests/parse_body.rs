use http::header;
use opale::prelude::*;
use serde_derive::{Deserialize, Serialize};

const BOUNDARY: &str = "opale-test-boundary";

#[derive(Debug, Default, PartialEq, Serialize, Deserialize, FromForm)]
struct Triple {
    #[serde(rename = "key1")]
    #[form("key1")]
    text: String,
    #[serde(rename = "key2")]
    #[form("key2")]
    number: i64,
    #[serde(rename = "key3")]
    #[form("key3")]
    ratio: f64,
}

#[derive(Debug, Default, Deserialize, FromForm)]
struct Submission {
    #[form("name")]
    name: String,
    #[form("count")]
    count: i32,
    #[form("rate")]
    rate: f64,
    #[serde(skip)]
    #[form("payload")]
    payload: Vec<UploadedFile>,
    comment: String,
}

fn request(content_type: Option<&str>, body: &'static str) -> http::Request<hyper::Body> {
    let mut builder = http::Request::builder().method("POST").uri("http://localhost/submit");
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    builder.body(hyper::Body::from(body)).expect("valid request")
}

fn text_part(name: &str, value: &str) -> String {
    format!("--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n", BOUNDARY, name, value)
}

fn file_part(name: &str, file_name: &str, contents: &str) -> String {
    format!(
        "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: text/plain\r\n\r\n{}\r\n",
        BOUNDARY, name, file_name, contents
    )
}

fn multipart_request(parts: &[String]) -> http::Request<hyper::Body> {
    let body = format!("{}--{}--\r\n", parts.concat(), BOUNDARY);
    http::Request::builder()
        .method("POST")
        .uri("http://localhost/submit")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY))
        .body(hyper::Body::from(body))
        .expect("valid request")
}

#[tokio::test]
async fn json_body_populates_the_record() {
    let req = request(Some("application/json"), r#"{"key1":"Value1","key2":10,"key3":12.12}"#);
    let mut ctx = Context::new(req, None);

    let mut triple = Triple::default();
    ctx.parse_body(&mut triple).await.expect("valid json body");

    assert_eq!(
        triple,
        Triple {
            text: "Value1".to_owned(),
            number: 10,
            ratio: 12.12,
        }
    );
}

#[tokio::test]
async fn json_content_type_with_charset_still_matches() {
    let req = request(Some("application/json; charset=utf-8"), r#"{"key1":"a","key2":1,"key3":0.5}"#);
    let mut ctx = Context::new(req, None);

    let mut triple = Triple::default();
    ctx.parse_body(&mut triple).await.expect("prefix match selects json");
    assert_eq!(triple.number, 1);
}

#[tokio::test]
async fn malformed_json_is_a_decode_failure() {
    let req = request(Some("application/json"), r#"{"key1":"#);
    let mut ctx = Context::new(req, None);

    let mut triple = Triple::default();
    let err = ctx.parse_body(&mut triple).await.expect_err("truncated json");
    assert!(matches!(err, OpaleError::Json(_)));
}

#[tokio::test]
async fn xml_body_populates_the_record() {
    let req = request(
        Some("application/xml"),
        "<Triple><key1>Value1</key1><key2>10</key2><key3>12.12</key3></Triple>",
    );
    let mut ctx = Context::new(req, None);

    let mut triple = Triple::default();
    ctx.parse_body(&mut triple).await.expect("valid xml body");

    assert_eq!(triple.text, "Value1");
    assert_eq!(triple.number, 10);
    assert_eq!(triple.ratio, 12.12);
}

#[tokio::test]
async fn text_xml_selects_the_xml_decoder() {
    let req = request(Some("text/xml"), "<Triple><key1>x</key1><key2>2</key2><key3>3.5</key3></Triple>");
    let mut ctx = Context::new(req, None);

    let mut triple = Triple::default();
    ctx.parse_body(&mut triple).await.expect("valid xml body");
    assert_eq!(triple.number, 2);
}

#[tokio::test]
async fn unsupported_content_type_leaves_the_record_untouched() {
    let req = request(Some("text/plain"), "key1=nope");
    let mut ctx = Context::new(req, None);

    let mut triple = Triple {
        text: "sentinel".to_owned(),
        number: 7,
        ratio: 1.5,
    };
    let err = ctx.parse_body(&mut triple).await.expect_err("no decoder for text/plain");

    assert!(matches!(err, OpaleError::UnsupportedContentType(ct) if ct == "text/plain"));
    assert_eq!(triple.text, "sentinel");
    assert_eq!(triple.number, 7);
    assert_eq!(triple.ratio, 1.5);
}

#[tokio::test]
async fn missing_content_type_is_unsupported() {
    let req = request(None, "{}");
    let mut ctx = Context::new(req, None);

    let mut triple = Triple::default();
    let err = ctx.parse_body(&mut triple).await.expect_err("no content type declared");
    assert!(matches!(err, OpaleError::UnsupportedContentType(ct) if ct.is_empty()));
}

#[tokio::test]
async fn multipart_populates_tagged_fields_in_order() {
    let req = multipart_request(&[
        text_part("name", "Value1"),
        text_part("count", "10"),
        text_part("rate", "32.12"),
        file_part("payload", "notes.txt", "hello upload"),
    ]);
    let mut ctx = Context::new(req, None);

    let mut submission = Submission {
        comment: "untouched".to_owned(),
        ..Submission::default()
    };
    ctx.parse_body(&mut submission).await.expect("valid multipart body");

    assert_eq!(submission.name, "Value1");
    assert_eq!(submission.count, 10);
    assert_eq!(submission.rate, 32.12);
    assert_eq!(submission.payload.len(), 1);
    assert_eq!(submission.payload[0].file_name(), Some("notes.txt"));
    assert_eq!(submission.payload[0].bytes().as_ref(), b"hello upload");
    // no form tag on `comment`: the decoder must not touch it
    assert_eq!(submission.comment, "untouched");
}

#[tokio::test]
async fn multipart_malformed_number_zero_fills_by_default() {
    let req = multipart_request(&[text_part("name", "x"), text_part("count", "abc"), text_part("rate", "nope")]);
    let mut ctx = Context::new(req, None);

    let mut submission = Submission {
        count: 55,
        rate: 5.5,
        ..Submission::default()
    };
    ctx.parse_body(&mut submission).await.expect("zero fill swallows the parse failure");

    assert_eq!(submission.count, 0);
    assert_eq!(submission.rate, 0.0);
}

#[tokio::test]
async fn multipart_malformed_number_errors_under_strict_policy() {
    let req = multipart_request(&[text_part("name", "x"), text_part("count", "abc")]);
    let mut ctx = Context::new(req, None);
    ctx.set_numeric_policy(NumericPolicy::Strict);

    let mut submission = Submission::default();
    let err = ctx.parse_body(&mut submission).await.expect_err("strict policy surfaces the failure");

    match err {
        OpaleError::FormField(e) => {
            assert_eq!(e.field(), "count");
            assert_eq!(e.value(), "abc");
        }
        other => panic!("expected a form field error, got {:?}", other),
    }
}

#[tokio::test]
async fn multipart_absent_file_tag_binds_an_empty_list() {
    let req = multipart_request(&[text_part("name", "x")]);
    let mut ctx = Context::new(req, None);

    let mut submission = Submission::default();
    ctx.parse_body(&mut submission).await.expect("valid multipart body");

    assert!(submission.payload.is_empty());
}

#[tokio::test]
async fn multipart_file_binding_ignores_scalar_values_under_the_same_tag() {
    let req = multipart_request(&[text_part("payload", "scalar-noise"), file_part("payload", "a.bin", "binary")]);
    let mut ctx = Context::new(req, None);

    let mut submission = Submission::default();
    ctx.parse_body(&mut submission).await.expect("valid multipart body");

    assert_eq!(submission.payload.len(), 1);
    assert_eq!(submission.payload[0].file_name(), Some("a.bin"));
}

#[tokio::test]
async fn multipart_without_boundary_fails_before_population() {
    let req = request(Some("multipart/form-data"), "--x--");
    let mut ctx = Context::new(req, None);

    let mut submission = Submission::default();
    let err = ctx.parse_body(&mut submission).await.expect_err("boundary is mandatory");
    assert!(matches!(err, OpaleError::Multipart(_)));
}

#[tokio::test]
async fn multipart_garbage_body_fails_before_population() {
    let req = request(
        Some("multipart/form-data; boundary=opale-test-boundary"),
        "this is not a multipart payload",
    );
    let mut ctx = Context::new(req, None);

    let mut submission = Submission::default();
    let err = ctx.parse_body(&mut submission).await.expect_err("malformed body");
    assert!(matches!(err, OpaleError::Multipart(_)));
}

#[tokio::test]
async fn json_round_trips_through_writer_and_decoder() {
    let give = Triple {
        text: "roundtrip".to_owned(),
        number: -3,
        ratio: 0.25,
    };

    let mut ctx = Context::new(request(None, ""), None);
    ctx.json(&give).expect("serializable");
    let mut res = ctx.into_response().expect("response builds");
    let encoded = res.body_mut().take().await.expect("body loads");

    let req = http::Request::builder()
        .method("POST")
        .uri("http://localhost/submit")
        .header(header::CONTENT_TYPE, "application/json")
        .body(hyper::Body::from(encoded))
        .expect("valid request");
    let mut ctx = Context::new(req, None);

    let mut decoded = Triple::default();
    ctx.parse_body(&mut decoded).await.expect("round trip decodes");
    assert_eq!(decoded, give);
}

#[tokio::test]
async fn uploaded_files_save_to_disk() {
    let req = multipart_request(&[file_part("payload", "saved.txt", "persist me")]);
    let mut ctx = Context::new(req, None);

    let mut submission = Submission::default();
    ctx.parse_body(&mut submission).await.expect("valid multipart body");

    let path = std::env::temp_dir().join(format!("opale-upload-{}.txt", std::process::id()));
    let written = submission.payload[0].save(&path).await.expect("file saves");
    assert_eq!(written, "persist me".len());

    let read_back = tokio::fs::read(&path).await.expect("file readable");
    assert_eq!(read_back, b"persist me");

    tokio::fs::remove_file(&path).await.expect("cleanup");
}
