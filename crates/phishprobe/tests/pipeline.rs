//! End-to-end pipeline properties against local servers only.

use phishprobe::acquisition::http_client::DEFAULT_USER_AGENT;
use phishprobe::acquisition::HttpClient;
use phishprobe::pipeline::SourceStatus;
use phishprobe::schema::{validate, Feature, FeatureValue, CATALOG};
use phishprobe::sources::{DomainSource, StaticContentSource, TlsSource};
use phishprobe::Pipeline;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

const SAMPLE: &str = "https://example.com/path/page?id=1234&param=test#section";

const PAGE: &str = r#"<html><head><title>Pay here</title>
<link rel="icon" href="/f.ico"></head>
<body><a href="/home">home</a><a href="https://other.example/">x</a>
<p>Enter your credit card</p></body></html>"#;

fn client() -> HttpClient {
    HttpClient::new(DEFAULT_USER_AGENT).unwrap()
}

/// Sources that never leave the machine for a URL on 127.0.0.1.
fn offline_pipeline() -> Pipeline {
    let tls = TlsSource::new(Duration::from_secs(2)).unwrap().with_port(1);
    Pipeline::new(Duration::from_secs(20))
        .with_source(Arc::new(DomainSource::new(
            Duration::from_secs(2),
            Duration::from_secs(2),
        )))
        .with_source(Arc::new(StaticContentSource::new(
            client(),
            Duration::from_secs(2),
        )))
        .with_source(Arc::new(tls))
        .with_disabled(phishprobe::schema::Source::DynamicContent, "test")
}

#[tokio::test]
async fn test_record_is_complete() {
    let report = Pipeline::new(Duration::from_secs(5)).scan(SAMPLE).await.unwrap();
    for spec in CATALOG {
        // `get` panics on a missing key
        let _ = report.record.get(spec.feature);
    }
    assert_eq!(report.record.to_flat_map().len(), CATALOG.len());
}

#[tokio::test]
async fn test_sample_url_flags() {
    let report = Pipeline::new(Duration::from_secs(5)).scan(SAMPLE).await.unwrap();
    let r = &report.record;
    assert_eq!(r.get(Feature::HavingPath), &FeatureValue::Int(1));
    assert_eq!(r.get(Feature::HavingQuery), &FeatureValue::Int(1));
    assert_eq!(r.get(Feature::HavingFragment), &FeatureValue::Int(1));
    assert_eq!(r.get(Feature::HavingAnchor), &FeatureValue::Int(1));
    assert_eq!(r.get(Feature::QuesMarkCntInUrl), &FeatureValue::Int(1));
    assert_eq!(r.get(Feature::AmpCharCntInUrl), &FeatureValue::Int(1));
    assert_eq!(r.get(Feature::NumberOfHashtags), &FeatureValue::Int(1));
    assert_eq!(r.get(Feature::LengthOfUrl), &FeatureValue::Int(SAMPLE.len() as i64));
}

#[tokio::test]
async fn test_unreachable_url_degrades() {
    let report = offline_pipeline()
        .scan("http://127.0.0.1:1/login")
        .await
        .unwrap();
    let r = &report.record;

    assert_eq!(r.get(Feature::IsUnreachable), &FeatureValue::Int(1));
    assert_eq!(r.get(Feature::HasSsl), &FeatureValue::Int(0));
    assert_eq!(r.get(Feature::LineOfCode), &FeatureValue::Int(0));
    assert_eq!(r.get(Feature::CntExternalRef), &FeatureValue::Int(0));
    assert_eq!(r.get(Feature::IsDomainIp), &FeatureValue::Int(1));
    assert!(r.number(Feature::ShannonEntropy) > 0.0);

    let tls = report
        .diagnostics
        .sources
        .iter()
        .find(|s| s.source == "ssl_hosting")
        .unwrap();
    assert_eq!(tls.status, SourceStatus::Failed);
    assert!(tls.reason.is_some());

    let dynamic = report
        .diagnostics
        .sources
        .iter()
        .find(|s| s.source == "dynamic_content")
        .unwrap();
    assert_eq!(dynamic.status, SourceStatus::Disabled);
}

#[tokio::test]
async fn test_reachable_page_populates_content() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
        .mount(&server)
        .await;

    let url = format!("{}/checkout", server.uri());
    let report = offline_pipeline().scan(&url).await.unwrap();
    let r = &report.record;
    assert_eq!(r.get(Feature::IsUnreachable), &FeatureValue::Int(0));
    assert_eq!(r.get(Feature::HasTitle), &FeatureValue::Int(1));
    assert_eq!(r.get(Feature::HasFavicon), &FeatureValue::Int(1));
    assert_eq!(r.get(Feature::CntSelfHRef), &FeatureValue::Int(1));
    assert_eq!(r.get(Feature::CntExternalRef), &FeatureValue::Int(1));
    assert_eq!(r.get(Feature::HasPaymentKey), &FeatureValue::Int(1));
    assert!(r.was_produced(Feature::LineOfCode));
}

#[tokio::test]
async fn test_validation_reports_dynamic_keys() {
    let report = offline_pipeline()
        .scan("http://127.0.0.1:1/")
        .await
        .unwrap();
    let validation = validate(&report.record, Feature::required());
    assert!(!validation.is_valid);
    assert!(validation.missing.contains(&"IsResponsive"));
    assert!(validation.missing.contains(&"HasSSL"));
    assert!(!validation.missing.contains(&"LengthOfURL"));
    assert_eq!(report.diagnostics.validation, validation);
}

#[tokio::test]
async fn test_pure_features_are_idempotent() {
    let pipeline = Pipeline::new(Duration::from_secs(5));
    let first = pipeline.scan(SAMPLE).await.unwrap();
    let second = pipeline.scan(SAMPLE).await.unwrap();
    assert_eq!(first.record, second.record);
}

#[tokio::test]
async fn test_malformed_input_still_yields_record() {
    let report = Pipeline::new(Duration::from_secs(5))
        .scan("not a url at all")
        .await
        .unwrap();
    assert_eq!(report.record.get(Feature::Tld), &FeatureValue::Text(String::new()));
    assert_eq!(report.record.get(Feature::LengthOfUrl), &FeatureValue::Int(16));
}
