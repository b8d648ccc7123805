use bench_stubs::config::Variant;
use bench_stubs::error::Result;
use bench_stubs::output::{OutputWriter, SharedOutput};
use bench_stubs::server::{StubHandler, serve};
use bench_stubs::shutdown::ShutdownSignal;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_test::assert_ok;

struct Running {
    addr: SocketAddr,
    stop: oneshot::Sender<()>,
    task: JoinHandle<Result<ShutdownSignal>>,
    output: SharedOutput,
    path: PathBuf,
    _dir: tempfile::TempDir,
}

impl Running {
    async fn start(variant: Variant) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let output = Arc::new(OutputWriter::for_variant(&path, variant).await.unwrap());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, stopped) = oneshot::channel::<()>();

        let handler = StubHandler::new(variant, output.clone());
        let task = tokio::spawn(serve(listener, handler, async move {
            let _ = stopped.await;
            Ok(ShutdownSignal::Interrupt)
        }));

        Self {
            addr,
            stop,
            task,
            output,
            path,
            _dir: dir,
        }
    }

    async fn send(&self, raw: &str) -> String {
        let mut stream = TcpStream::connect(self.addr).await.unwrap();
        stream.write_all(raw.as_bytes()).await.unwrap();
        let mut buf = Vec::new();
        // a rejected request may end in a reset instead of a clean close
        let _ = stream.read_to_end(&mut buf).await;
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Stops the server, closes the output and returns what was written.
    async fn shutdown(self) -> String {
        self.stop.send(()).unwrap();
        let signal = assert_ok!(self.task.await.unwrap());
        assert_eq!(signal, ShutdownSignal::Interrupt);

        assert_ok!(self.output.close().await);
        std::fs::read_to_string(&self.path).unwrap()
    }
}

fn upstream_request() -> &'static str {
    "GET /any/path HTTP/1.1\r\n\
     Host: localhost\r\n\
     X-Trace: abc\r\n\
     X-Trace: de\r\n\
     Connection: close\r\n\
     \r\n"
}

#[tokio::test]
async fn agent_writes_content_length_verbatim() {
    let server = Running::start(Variant::Agent).await;

    let body = "x".repeat(42);
    let request = format!(
        "GET / HTTP/1.1\r\nHost: localhost\r\nContent-Length: 42\r\nConnection: close\r\n\r\n{}",
        body
    );
    let response = server.send(&request).await;
    assert!(response.starts_with("HTTP/1.1 200 OK"), "{}", response);
    assert!(response.ends_with("{}"), "{}", response);

    assert_eq!(server.shutdown().await, "42\n");
}

#[tokio::test]
async fn agent_without_content_length_writes_zero() {
    let server = Running::start(Variant::AgentHeaders).await;

    let response = server
        .send("POST /v0.4/traces HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await;
    assert!(response.starts_with("HTTP/1.1 200 OK"), "{}", response);

    assert_eq!(server.shutdown().await, "0\n");
}

#[tokio::test]
async fn conflicting_content_length_never_reaches_the_output() {
    let server = Running::start(Variant::Agent).await;

    let response = server
        .send("GET / HTTP/1.1\r\nHost: localhost\r\nContent-Length: 1\r\nContent-Length: 2\r\nConnection: close\r\n\r\n")
        .await;
    assert!(!response.starts_with("HTTP/1.1 200"), "{}", response);

    assert_eq!(server.shutdown().await, "");
}

#[tokio::test]
async fn upstream_writes_header_byte_total() {
    let server = Running::start(Variant::Upstream).await;

    let response = server.send(upstream_request()).await;
    assert!(response.starts_with("HTTP/1.1 200 OK"), "{}", response);
    assert!(response.ends_with("\r\n\r\n"), "{}", response);

    // x-trace + abc + de, connection + close; host is not counted
    let expected = (7 + 3 + 2) + (10 + 5);
    assert_eq!(server.shutdown().await, format!("{}\n", expected));
}

#[tokio::test]
async fn upstream_host_only_request_counts_remaining_headers() {
    let server = Running::start(Variant::Upstream).await;

    server
        .send("GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await;

    assert_eq!(server.shutdown().await, "15\n");
}

#[tokio::test]
async fn every_request_gets_a_line() {
    let server = Running::start(Variant::Upstream).await;

    for _ in 0..3 {
        server.send(upstream_request()).await;
    }

    assert_eq!(server.shutdown().await.lines().count(), 3);
}

#[tokio::test]
async fn throttled_upstream_keeps_one_line_per_second() {
    let server = Running::start(Variant::UpstreamThrottled).await;

    server.send(upstream_request()).await;
    server.send(upstream_request()).await;
    tokio::time::sleep(Duration::from_millis(1100)).await;
    server.send(upstream_request()).await;

    let written = server.shutdown().await;
    assert_eq!(written, "27\n27\n");
}
