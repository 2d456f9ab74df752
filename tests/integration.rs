//! Integration tests for contact2html.
//!
//! Everything here runs offline: HTML output needs no browser, and the PDF /
//! PNG paths go through an in-process fake `RenderBackend`. The tests that
//! drive a real headless browser are gated behind the `E2E_ENABLED`
//! environment variable.
//!
//! Run the browser tests with:
//!   E2E_ENABLED=1 cargo test --test integration -- --nocapture

use async_trait::async_trait;
use contact2html::pipeline::input::fetch_records;
use contact2html::{
    generate_from_input, generate_selected, generate_stream, resolve_records, BackendError,
    BatchRunner, ExportFormat, GenerationConfig, GenerationProgressCallback, HeadlessBrowser,
    ProfileError, RawRecord, RecordError, RecordOutcome, RenderBackend, StatusLevel, Viewport,
};
use futures::StreamExt;
use image::{DynamicImage, Rgba, RgbaImage};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn demo_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demo")
}

fn raw(value: serde_json::Value) -> RawRecord {
    value.as_object().cloned().unwrap()
}

fn full_record() -> RawRecord {
    raw(json!({
        "Full Name": "Jane Doe",
        "Person Title": "CEO",
        "Person Contact Email": "jane@acme.io",
        "Company Name": "Acme",
        "Company Partners": "Globex; Initech",
    }))
}

fn person_only(name: &str) -> RawRecord {
    raw(json!({ "name": name, "title": "Engineer", "email": "someone@example.com" }))
}

fn html_config(dir: &Path) -> GenerationConfig {
    GenerationConfig::builder()
        .output_dir(dir)
        .web_fonts(false)
        .build()
        .unwrap()
}

fn backend_config(dir: &Path, format: ExportFormat, backend: Arc<dyn RenderBackend>) -> GenerationConfig {
    GenerationConfig::builder()
        .output_dir(dir)
        .format(format)
        .backend(backend)
        .inter_record_delay_ms(0)
        .page_width_px(320)
        .device_scale(1)
        .build()
        .unwrap()
}

/// Route library logs to the test harness; `RUST_LOG` selects the level.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn page_sections(html: &str) -> usize {
    html.matches("<section class=\"page ").count()
}

/// Skip this test unless E2E_ENABLED is set and a browser can be found.
macro_rules! e2e_skip_unless_ready {
    () => {{
        init_tracing();
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run browser tests");
            return;
        }
        if !headless_locate::is_browser_available() {
            println!("SKIP — no Chromium / Chrome found");
            println!("       Set CONTACT2HTML_BROWSER=/path/to/browser");
            return;
        }
    }};
}

// ── Fake rendering backend ───────────────────────────────────────────────────

#[derive(Clone, Copy)]
enum Behaviour {
    Succeed,
    Unavailable,
    RenderError,
    /// The first call never returns; later calls succeed.
    HangFirst,
}

struct FakeBackend {
    behaviour: Behaviour,
    delay: Duration,
    calls: AtomicUsize,
}

impl FakeBackend {
    fn new(behaviour: Behaviour) -> Arc<Self> {
        Self::slow(behaviour, Duration::ZERO)
    }

    fn slow(behaviour: Behaviour, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            delay,
            calls: AtomicUsize::new(0),
        })
    }

    async fn enter(&self) -> Result<(), BackendError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match self.behaviour {
            Behaviour::Succeed => Ok(()),
            Behaviour::Unavailable => Err(BackendError::Unavailable("browser went away".into())),
            Behaviour::RenderError => Err(BackendError::RenderFailed("page crashed".into())),
            Behaviour::HangFirst if call == 0 => std::future::pending().await,
            Behaviour::HangFirst => Ok(()),
        }
    }
}

#[async_trait]
impl RenderBackend for FakeBackend {
    fn name(&self) -> &str {
        "fake"
    }

    /// One sheet of white pixels with a dark band at the top.
    async fn rasterize(&self, html: &str, viewport: Viewport) -> Result<DynamicImage, BackendError> {
        self.enter().await?;
        assert!(html.contains("<section class=\"page "));
        let width = viewport.width * viewport.scale;
        let height = viewport.sheet_height_px();
        let mut img = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
        for y in 0..10 {
            for x in 0..width {
                img.put_pixel(x, y, Rgba([40, 40, 120, 255]));
            }
        }
        Ok(DynamicImage::ImageRgba8(img))
    }

    async fn print_pdf(&self, html: &str, _viewport: Viewport, output: &Path) -> Result<(), BackendError> {
        self.enter().await?;
        let body = format!("%PDF-1.4\n% fake, {} pages\n", page_sections(html));
        tokio::fs::write(output, body)
            .await
            .map_err(|e| BackendError::ExportFailed(e.to_string()))
    }
}

// ── Recording progress callback ──────────────────────────────────────────────

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
    last_percent: Mutex<f32>,
}

impl GenerationProgressCallback for Recorder {
    fn on_batch_start(&self, total: usize) {
        self.events.lock().unwrap().push(format!("start {total}"));
    }
    fn on_record_complete(&self, index: usize, _total: usize, _filename: &str) {
        self.events.lock().unwrap().push(format!("ok {index}"));
    }
    fn on_record_skipped(&self, index: usize, _total: usize, _reason: &str) {
        self.events.lock().unwrap().push(format!("skip {index}"));
    }
    fn on_record_error(&self, index: usize, _total: usize, _error: &str) {
        self.events.lock().unwrap().push(format!("error {index}"));
    }
    fn on_progress(&self, percent: f32) {
        *self.last_percent.lock().unwrap() = percent;
    }
    fn on_batch_complete(&self, total: usize, successful: usize, failed: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("done {total} {successful} {failed}"));
    }
}

/// Answers one request with `status_line` and a JSON body.
async fn json_server(status_line: &'static str, body: String) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = vec![0u8; 4096];
        let _ = socket.read(&mut buf).await.unwrap();
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
    });
    format!("http://{addr}/contacts")
}

// ── HTML batches ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn jane_doe_gets_three_pages() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let config = html_config(dir.path());

    let summary = BatchRunner::new(vec![full_record()], config).run().await.unwrap();
    assert_eq!((summary.successful, summary.failed), (1, 0));

    let doc = &summary.documents[0];
    assert_eq!(doc.page_count, 3);
    assert!(doc.filename.starts_with("jane_doe_profile_"), "got {}", doc.filename);
    assert!(doc.filename.ends_with(".html"));

    let html = std::fs::read_to_string(&doc.paths[0]).unwrap();
    assert_eq!(page_sections(&html), 3);
    assert!(html.contains("mailto:jane@acme.io"));
    assert!(html.contains("Globex"));
    assert!(html.contains("Initech"));
    assert!(html.contains("Jane Doe • Company Profile • Page 3 of 3"));
}

#[tokio::test]
async fn person_without_company_gets_two_pages() {
    let dir = tempfile::tempdir().unwrap();
    let summary = BatchRunner::new(vec![person_only("Bob Stone")], html_config(dir.path()))
        .run()
        .await
        .unwrap();

    let doc = &summary.documents[0];
    assert_eq!(doc.page_count, 2);
    let html = std::fs::read_to_string(&doc.paths[0]).unwrap();
    assert_eq!(page_sections(&html), 2);
    assert!(!html.contains("Company Profile"));
}

#[tokio::test]
async fn nameless_records_are_skipped_and_counted() {
    let dir = tempfile::tempdir().unwrap();
    let recorder = Arc::new(Recorder::default());
    let config = GenerationConfig::builder()
        .output_dir(dir.path())
        .progress_callback(recorder.clone() as Arc<dyn GenerationProgressCallback>)
        .build()
        .unwrap();

    let records = vec![
        person_only("Ana Lima"),
        raw(json!({ "name": "N/A", "title": "Ghost" })),
        person_only("Carl Berg"),
        raw(json!({ "company": "Nameless Inc" })),
        person_only("Dora Holm"),
    ];
    let summary = BatchRunner::new(records, config).run().await.unwrap();

    assert_eq!(summary.total, 5);
    assert_eq!(summary.processed, 5);
    assert_eq!(summary.successful, 3);
    assert_eq!(summary.failed, 2);
    assert_eq!(
        summary.errors,
        vec!["Contact 2: No name provided", "Contact 4: No name provided"]
    );

    let status = summary.status();
    assert_eq!(status.level, StatusLevel::Warning);
    assert_eq!(status.message, "Generation complete! Successful: 3/5, Failed: 2");

    let written = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(written, 3);

    let events = recorder.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec!["start 5", "ok 1", "skip 2", "ok 3", "skip 4", "ok 5", "done 5 3 2"]
    );
    assert_eq!(*recorder.last_percent.lock().unwrap(), 100.0);
}

#[tokio::test]
async fn same_name_twice_writes_two_files() {
    let dir = tempfile::tempdir().unwrap();
    let summary = BatchRunner::new(
        vec![person_only("Twin"), person_only("Twin")],
        html_config(dir.path()),
    )
    .run()
    .await
    .unwrap();

    assert_eq!(summary.successful, 2);
    let a = &summary.documents[0].paths[0];
    let b = &summary.documents[1].paths[0];
    assert_ne!(a, b);
    assert!(a.exists() && b.exists());
}

#[tokio::test]
async fn empty_batch_is_no_records() {
    let dir = tempfile::tempdir().unwrap();
    let result = BatchRunner::new(Vec::new(), html_config(dir.path())).run().await;
    assert!(matches!(result, Err(ProfileError::NoRecords { .. })));
}

// ── Selection ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn select_one_generates_only_that_record() {
    let dir = tempfile::tempdir().unwrap();
    let records = vec![person_only("First"), full_record(), person_only("Third")];

    let outcome = generate_selected(&records, 2, &html_config(dir.path()))
        .await
        .unwrap();
    match outcome {
        RecordOutcome::Success { index, document } => {
            assert_eq!(index, 2);
            assert_eq!(document.name, "Jane Doe");
            assert_eq!(document.page_count, 3);
        }
        other => panic!("expected success, got {other:?}"),
    }
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);

    assert!(matches!(
        generate_selected(&records, 4, &html_config(dir.path())).await,
        Err(ProfileError::RecordIndexOutOfRange { index: 4, total: 3 })
    ));
    assert!(matches!(
        generate_selected(&records, 0, &html_config(dir.path())).await,
        Err(ProfileError::RecordIndexOutOfRange { index: 0, .. })
    ));
}

#[tokio::test]
async fn select_nameless_record_is_skip() {
    let dir = tempfile::tempdir().unwrap();
    let records = vec![person_only("First"), raw(json!({ "title": "No name" }))];
    let outcome = generate_selected(&records, 2, &html_config(dir.path()))
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        RecordOutcome::Skip {
            index: 2,
            error: RecordError::MissingName { index: 2 }
        }
    ));
}

// ── PDF / PNG through a fake backend ─────────────────────────────────────────

#[tokio::test]
async fn pdf_batch_uses_backend_once_per_named_record() {
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeBackend::new(Behaviour::Succeed);
    let config = backend_config(dir.path(), ExportFormat::Pdf, fake.clone());

    let records = vec![full_record(), raw(json!({ "title": "nobody" })), person_only("Bob")];
    let summary = BatchRunner::new(records, config).run().await.unwrap();

    assert_eq!((summary.successful, summary.failed), (2, 1));
    assert_eq!(fake.calls.load(Ordering::SeqCst), 2);

    let jane = &summary.documents[0];
    assert!(jane.filename.ends_with(".pdf"));
    let body = std::fs::read_to_string(&jane.paths[0]).unwrap();
    assert!(body.starts_with("%PDF-1.4"));
    assert!(body.contains("3 pages"));

    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|x| x == "tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn png_writes_one_sheet_per_page() {
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeBackend::new(Behaviour::Succeed);
    let config = backend_config(dir.path(), ExportFormat::Png, fake.clone());

    let summary = BatchRunner::new(vec![full_record()], config).run().await.unwrap();
    let doc = &summary.documents[0];
    assert_eq!(doc.page_count, 3);
    assert_eq!(doc.paths.len(), 3);
    assert_eq!(fake.calls.load(Ordering::SeqCst), 3);

    for (i, path) in doc.paths.iter().enumerate() {
        let file = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(file.ends_with(&format!("_page_{:02}.png", i + 1)), "got {file}");
        let img = image::open(path).unwrap();
        assert_eq!(img.width(), 320);
        assert_eq!(img.height(), 453);
    }
    assert_eq!(doc.filename, doc.paths[0].file_name().unwrap().to_string_lossy());
}

#[tokio::test]
async fn render_error_fails_record_but_batch_continues() {
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeBackend::new(Behaviour::RenderError);
    let config = backend_config(dir.path(), ExportFormat::Pdf, fake.clone());

    let summary = BatchRunner::new(vec![person_only("A"), person_only("B")], config)
        .run()
        .await
        .unwrap();
    assert_eq!((summary.successful, summary.failed), (0, 2));
    assert_eq!(fake.calls.load(Ordering::SeqCst), 2);
    assert!(summary.errors[0].contains("page crashed"), "got {:?}", summary.errors);
    assert_eq!(summary.status().level, StatusLevel::Warning);
}

#[tokio::test]
async fn hung_backend_times_out_record_but_batch_continues() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeBackend::new(Behaviour::HangFirst);
    let config = GenerationConfig::builder()
        .output_dir(dir.path())
        .format(ExportFormat::Pdf)
        .backend(fake.clone())
        .inter_record_delay_ms(0)
        .render_timeout_secs(1)
        .build()
        .unwrap();

    let started = std::time::Instant::now();
    let summary = BatchRunner::new(vec![person_only("A"), person_only("B")], config)
        .run()
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!((summary.successful, summary.failed), (1, 1));
    assert_eq!(fake.calls.load(Ordering::SeqCst), 2);
    assert_eq!(summary.errors.len(), 1);
    assert!(summary.errors[0].contains("timed out"), "got {:?}", summary.errors);

    let written: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(written.len(), 1, "got {written:?}");
    assert!(written[0].starts_with("b_profile_") && written[0].ends_with(".pdf"));
}

#[tokio::test]
async fn unavailable_backend_aborts_batch() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeBackend::new(Behaviour::Unavailable);
    let config = backend_config(dir.path(), ExportFormat::Png, fake.clone());

    let result = BatchRunner::new(
        vec![raw(json!({ "title": "nobody" })), person_only("A"), person_only("B")],
        config,
    )
    .run()
    .await;

    match result {
        Err(ProfileError::BatchAborted { processed, total, reason }) => {
            assert_eq!(processed, 2);
            assert_eq!(total, 3);
            assert!(reason.contains("browser went away"), "got {reason}");
        }
        other => panic!("expected BatchAborted, got {other:?}"),
    }
    assert_eq!(fake.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn stream_stops_after_unavailable_backend() {
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeBackend::new(Behaviour::Unavailable);
    let config = backend_config(dir.path(), ExportFormat::Pdf, fake);

    let outcomes: Vec<RecordOutcome> = generate_stream(
        vec![person_only("A"), person_only("B"), person_only("C")],
        &config,
    )
    .await
    .unwrap()
    .collect()
    .await;

    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].error().is_some_and(|e| e.is_batch_fatal()));
}

#[tokio::test]
async fn second_run_while_running_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeBackend::slow(Behaviour::Succeed, Duration::from_millis(300));
    let config = backend_config(dir.path(), ExportFormat::Pdf, fake);
    let runner = Arc::new(BatchRunner::new(vec![person_only("Slow")], config));

    let first = {
        let runner = Arc::clone(&runner);
        tokio::spawn(async move { runner.run().await })
    };
    while !runner.is_running() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert!(matches!(runner.run().await, Err(ProfileError::BatchInProgress)));
    assert!(matches!(runner.run_selected(1).await, Err(ProfileError::BatchInProgress)));

    let summary = first.await.unwrap().unwrap();
    assert_eq!(summary.successful, 1);
    assert!(!runner.is_running());

    // The flag is cleared, so the runner can be reused.
    let again = runner.run().await.unwrap();
    assert_eq!(again.successful, 1);
}

// ── Input acquisition ────────────────────────────────────────────────────────

#[tokio::test]
async fn endpoint_records_are_unwrapped_and_generated() {
    let body = json!({
        "contacts": [
            { "fullName": "Remote One", "companyName": "Far Away Ltd" },
            { "fullName": "Remote Two" }
        ]
    })
    .to_string();
    let url = json_server("200 OK", body).await;

    let dir = tempfile::tempdir().unwrap();
    let summary = generate_from_input(&url, &html_config(dir.path())).await.unwrap();
    assert_eq!(summary.total, 2);
    assert_eq!(summary.successful, 2);
    assert_eq!(summary.documents[0].page_count, 3);
    assert_eq!(summary.documents[1].page_count, 2);
}

#[tokio::test]
async fn endpoint_error_status_is_reported() {
    let url = json_server("503 Service Unavailable", "{}".to_string()).await;
    assert!(matches!(
        fetch_records(&url, 5).await,
        Err(ProfileError::HttpStatus { status: 503, .. })
    ));
}

#[tokio::test]
async fn endpoint_unexpected_shape_is_reported() {
    let url = json_server("200 OK", json!({ "total": 0 }).to_string()).await;
    assert!(matches!(
        resolve_records(&url, 5).await,
        Err(ProfileError::UnexpectedShape { .. })
    ));
}

#[tokio::test]
async fn demo_files_load() {
    let json = resolve_records(demo_dir().join("demo-data.json").to_str().unwrap(), 5)
        .await
        .unwrap();
    assert!(json.len() >= 3);

    let csv = resolve_records(demo_dir().join("contacts.csv").to_str().unwrap(), 5)
        .await
        .unwrap();
    assert!(csv.len() >= 3);

    let dir = tempfile::tempdir().unwrap();
    let summary = BatchRunner::new(csv.records, html_config(dir.path()))
        .run()
        .await
        .unwrap();
    assert_eq!(summary.processed, summary.total);
    assert!(summary.successful >= 2);
}

// ── Real browser ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_pdf_from_demo_data() {
    e2e_skip_unless_ready!();

    let dir = tempfile::tempdir().unwrap();
    let config = GenerationConfig::builder()
        .output_dir(dir.path())
        .format(ExportFormat::Pdf)
        .inter_record_delay_ms(100)
        .build()
        .unwrap();

    let input = demo_dir().join("demo-data.json");
    let summary = generate_from_input(input.to_str().unwrap(), &config)
        .await
        .expect("PDF batch failed");
    println!("{}", summary.status().message);

    assert!(summary.successful > 0);
    for doc in &summary.documents {
        let bytes = std::fs::read(&doc.paths[0]).unwrap();
        assert!(bytes.starts_with(b"%PDF"), "{} is not a PDF", doc.filename);
    }
}

#[tokio::test]
async fn e2e_png_pages_are_a4_sized() {
    e2e_skip_unless_ready!();

    let dir = tempfile::tempdir().unwrap();
    let config = GenerationConfig::builder()
        .output_dir(dir.path())
        .format(ExportFormat::Png)
        .device_scale(1)
        .build()
        .unwrap();
    let backend: Arc<dyn RenderBackend> = Arc::new(HeadlessBrowser::from_config(&config).unwrap());
    let config = GenerationConfig { backend: Some(backend), ..config };

    let summary = BatchRunner::new(vec![full_record()], config).run().await.unwrap();
    let doc = &summary.documents[0];
    assert!(doc.paths.len() >= 3, "got {} PNGs", doc.paths.len());
    for path in &doc.paths {
        let img = image::open(path).unwrap();
        assert_eq!((img.width(), img.height()), (794, 1123));
    }
}
