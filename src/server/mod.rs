use crate::config::Variant;
use crate::error::{FixtureError, Result};
use crate::measure::Extractor;
use crate::output::SharedOutput;
use crate::shutdown::ShutdownSignal;
use http::{HeaderMap, Request, Response, StatusCode};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Measures a request, records it, and produces the fixed reply.
#[derive(Clone)]
pub struct StubHandler {
    extractor: Extractor,
    body: Bytes,
    output: SharedOutput,
}

impl StubHandler {
    pub fn new(variant: Variant, output: SharedOutput) -> Self {
        Self {
            extractor: variant.extractor(),
            body: Bytes::from_static(variant.response_body()),
            output,
        }
    }

    /// Errors from here are fatal for the whole process.
    pub async fn handle(&self, headers: &HeaderMap) -> Result<Response<Full<Bytes>>> {
        let measurement = self.extractor.measure(headers)?;
        self.output.record(&measurement).await?;
        Ok(Response::new(Full::new(self.body.clone())))
    }
}

pub struct StubServer {
    listen_addr: SocketAddr,
    handler: StubHandler,
}

impl StubServer {
    pub fn new(listen_addr: SocketAddr, handler: StubHandler) -> Self {
        Self {
            listen_addr,
            handler,
        }
    }

    pub async fn run<F>(&self, shutdown: F) -> Result<ShutdownSignal>
    where
        F: Future<Output = Result<ShutdownSignal>>,
    {
        let listener = TcpListener::bind(self.listen_addr)
            .await
            .map_err(|source| FixtureError::Bind {
                addr: self.listen_addr,
                source,
            })?;
        info!("Listening on {}", self.listen_addr);

        serve(listener, self.handler.clone(), shutdown).await
    }
}

/// Serves `listener` until `shutdown` resolves or a handler hits a fatal
/// error. In-flight connections are not drained.
pub async fn serve<F>(
    listener: TcpListener,
    handler: StubHandler,
    shutdown: F,
) -> Result<ShutdownSignal>
where
    F: Future<Output = Result<ShutdownSignal>>,
{
    let (fatal_tx, mut fatal_rx) = mpsc::unbounded_channel::<FixtureError>();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            signal = &mut shutdown => return signal,
            Some(err) = fatal_rx.recv() => {
                error!("Fatal error while handling request: {}", err);
                return Err(err);
            }
            accepted = listener.accept() => match accepted {
                Ok((socket, client_addr)) => {
                    debug!("New connection from {}", client_addr);
                    let handler = handler.clone();
                    let fatal_tx = fatal_tx.clone();

                    tokio::spawn(async move {
                        let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                            let handler = handler.clone();
                            let fatal_tx = fatal_tx.clone();
                            async move {
                                match handler.handle(req.headers()).await {
                                    Ok(response) => Ok::<_, Infallible>(response),
                                    Err(err) => {
                                        let _ = fatal_tx.send(err);
                                        Ok(failure_response())
                                    }
                                }
                            }
                        });

                        if let Err(e) = http1::Builder::new()
                            .serve_connection(TokioIo::new(socket), service)
                            .await
                        {
                            if e.is_incomplete_message() {
                                debug!("Connection from {} closed early: {}", client_addr, e);
                            } else {
                                warn!("Error serving connection from {}: {}", client_addr, e);
                            }
                        }
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }
}

fn failure_response() -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}
