use std::{
    net::{TcpListener, TcpStream},
    sync::{Arc, Mutex, mpsc},
    time::Duration,
};

use super::http::{write_backpressure_response, write_response};
use super::request::read_http_request;
use super::{
    HttpResponse, SOCKET_TIMEOUT_SECS, ServiceRuntime, SharedRuntime, config, handle_request,
};

pub fn serve_http(runtime: ServiceRuntime, bind_addr: &str) -> std::io::Result<()> {
    serve_http_with_workers(runtime, bind_addr, 4)
}

pub fn serve_http_with_workers(
    runtime: ServiceRuntime,
    bind_addr: &str,
    worker_count: usize,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(bind_addr)?;
    let worker_count = worker_count.max(1);
    let queue_capacity = resolve_http_queue_capacity(worker_count);
    let runtime = Arc::new(Mutex::new(runtime));
    let (tx, rx) = mpsc::sync_channel::<TcpStream>(queue_capacity);
    let rx = Arc::new(Mutex::new(rx));

    std::thread::scope(|scope| {
        for _ in 0..worker_count {
            let runtime = Arc::clone(&runtime);
            let rx = Arc::clone(&rx);
            scope.spawn(move || {
                loop {
                    let stream = {
                        let guard = match rx.lock() {
                            Ok(guard) => guard,
                            Err(_) => break,
                        };
                        match guard.recv() {
                            Ok(stream) => stream,
                            Err(_) => break,
                        }
                    };
                    if let Err(err) = handle_connection(&runtime, stream) {
                        eprintln!("callback transport error: {err}");
                    }
                }
            });
        }

        for stream in listener.incoming() {
            match stream {
                Ok(stream) => match tx.try_send(stream) {
                    Ok(()) => {}
                    Err(mpsc::TrySendError::Full(stream)) => {
                        if let Err(err) = write_backpressure_response(stream, SOCKET_TIMEOUT_SECS)
                        {
                            eprintln!("callback transport backpressure response failed: {err}");
                        }
                    }
                    Err(mpsc::TrySendError::Disconnected(_)) => {
                        eprintln!("callback transport worker queue closed");
                        break;
                    }
                },
                Err(err) => eprintln!("callback transport accept error: {err}"),
            }
        }
        drop(tx);
    });

    Ok(())
}

fn resolve_http_queue_capacity(worker_count: usize) -> usize {
    config::parse_env_usize("LEADS_CALLBACK_HTTP_QUEUE_CAPACITY")
        .filter(|capacity| *capacity > 0)
        .unwrap_or_else(|| (worker_count * 4).clamp(16, 1024))
}

fn handle_connection(runtime: &SharedRuntime, mut stream: TcpStream) -> std::io::Result<()> {
    stream.set_read_timeout(Some(Duration::from_secs(SOCKET_TIMEOUT_SECS)))?;
    stream.set_write_timeout(Some(Duration::from_secs(SOCKET_TIMEOUT_SECS)))?;

    let request = match read_http_request(&mut stream) {
        Ok(Some(request)) => request,
        Ok(None) => return Ok(()),
        Err(err) => return write_response(&mut stream, HttpResponse::bad_request(&err)),
    };

    let response = handle_request(runtime, &request);
    write_response(&mut stream, response)
}
