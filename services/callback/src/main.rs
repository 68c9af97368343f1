use callback::transport::{ServiceConfig, ServiceRuntime, TransportRuntime, serve_http_with_workers};

fn main() {
    let config = ServiceConfig::from_env();
    let bind_addr = config.bind_addr.clone();

    println!("callback transport listening on http://{bind_addr}");
    println!("callback transport workers: {}", config.http_workers);
    println!(
        "callback transport runtime: {}",
        config.transport_runtime.as_str()
    );
    println!("callback store: {}", config.store_path.display());
    println!("callback log dir: {}", config.log_dir.display());
    match config.outbox_dir.as_deref() {
        Some(outbox_dir) => println!("callback notification outbox: {}", outbox_dir.display()),
        None => println!("callback notifications disabled (set LEADS_CALLBACK_OUTBOX_DIR)"),
    }
    println!("callback submit endpoint: http://{bind_addr}/callback");
    println!("callback list endpoint: http://{bind_addr}/callback?action=list");
    println!("callback diagnostics endpoint: http://{bind_addr}/diagnostics");
    println!("callback health endpoint: http://{bind_addr}/health");
    println!("callback metrics endpoint: http://{bind_addr}/metrics");

    let runtime = ServiceRuntime::new(&config);
    match config.transport_runtime {
        TransportRuntime::Std => {
            if let Err(err) = serve_http_with_workers(runtime, &bind_addr, config.http_workers) {
                eprintln!("callback transport failed: {err}");
                std::process::exit(1);
            }
        }
        TransportRuntime::Axum => {
            #[cfg(feature = "async-transport")]
            {
                if let Err(err) = callback::transport_axum::serve_http_with_axum(
                    runtime,
                    &bind_addr,
                    config.http_workers,
                ) {
                    eprintln!("callback transport failed: {err}");
                    std::process::exit(1);
                }
            }
            #[cfg(not(feature = "async-transport"))]
            {
                eprintln!(
                    "callback transport runtime 'axum' requires build feature 'async-transport'"
                );
                std::process::exit(2);
            }
        }
    }
}
