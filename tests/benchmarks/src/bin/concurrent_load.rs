use std::{
    io::{Read, Write},
    net::{TcpStream, ToSocketAddrs},
    sync::mpsc,
    time::{Duration, Instant},
};

#[derive(Debug, Clone)]
struct Config {
    addr: String,
    path: String,
    workers: usize,
    requests_per_worker: usize,
    warmup_requests: usize,
    timeout_ms: u64,
    json_body: bool,
}

#[derive(Debug, Default)]
struct WorkerStats {
    accepted: usize,
    failed: usize,
    latencies_ms: Vec<f64>,
    sample_errors: Vec<String>,
}

fn main() {
    let config = match parse_args(std::env::args().skip(1)) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("{message}");
            std::process::exit(2);
        }
    };

    if let Err(err) = run(config) {
        eprintln!("concurrent-load failed: {err}");
        std::process::exit(1);
    }
}

fn run(config: Config) -> Result<(), String> {
    for warmup_idx in 0..config.warmup_requests {
        let _ = submit_once(&config, 0, warmup_idx)?;
    }

    let total_requests = config.workers * config.requests_per_worker;
    let started_at = Instant::now();
    let (tx, rx) = mpsc::channel::<WorkerStats>();

    std::thread::scope(|scope| {
        for worker_idx in 1..=config.workers {
            let tx = tx.clone();
            let config = config.clone();
            scope.spawn(move || {
                let mut stats = WorkerStats::default();
                for request_idx in 0..config.requests_per_worker {
                    let request_started = Instant::now();
                    match submit_once(&config, worker_idx, request_idx) {
                        Ok(200) => {
                            stats.accepted += 1;
                            stats
                                .latencies_ms
                                .push(request_started.elapsed().as_secs_f64() * 1000.0);
                        }
                        Ok(status) => {
                            stats.failed += 1;
                            if stats.sample_errors.len() < 4 {
                                stats
                                    .sample_errors
                                    .push(format!("unexpected HTTP status code: {status}"));
                            }
                        }
                        Err(err) => {
                            stats.failed += 1;
                            if stats.sample_errors.len() < 4 {
                                stats.sample_errors.push(err);
                            }
                        }
                    }
                }
                let _ = tx.send(stats);
            });
        }
    });
    drop(tx);

    let elapsed_seconds = started_at.elapsed().as_secs_f64();
    let mut accepted = 0usize;
    let mut failed = 0usize;
    let mut latencies_ms = Vec::with_capacity(total_requests);
    let mut errors = Vec::new();
    for stats in rx {
        accepted += stats.accepted;
        failed += stats.failed;
        latencies_ms.extend(stats.latencies_ms);
        for err in stats.sample_errors {
            if errors.len() >= 10 {
                break;
            }
            errors.push(err);
        }
    }

    if accepted == 0 {
        return Err("no accepted submissions".to_string());
    }

    latencies_ms.sort_by(|a, b| a.total_cmp(b));
    println!("Callback submission load");
    println!("addr: {}", config.addr);
    println!("path: {}", config.path);
    println!(
        "body: {}",
        if config.json_body { "json" } else { "form" }
    );
    println!("workers: {}", config.workers);
    println!("requests_per_worker: {}", config.requests_per_worker);
    println!("total_requests: {total_requests}");
    println!("accepted_submissions: {accepted}");
    println!("failed_submissions: {failed}");
    println!("elapsed_seconds: {elapsed_seconds:.4}");
    println!(
        "throughput_rps: {:.2}",
        accepted as f64 / elapsed_seconds.max(0.0001)
    );
    println!(
        "latency_avg_ms: {:.4}",
        latencies_ms.iter().sum::<f64>() / latencies_ms.len() as f64
    );
    println!("latency_p50_ms: {:.4}", percentile(&latencies_ms, 0.50));
    println!("latency_p95_ms: {:.4}", percentile(&latencies_ms, 0.95));
    println!("latency_p99_ms: {:.4}", percentile(&latencies_ms, 0.99));

    if failed > 0 {
        for err in errors {
            println!("error_sample: {err}");
        }
        return Err(format!("{failed} submissions failed"));
    }
    Ok(())
}

fn submit_once(config: &Config, worker_idx: usize, request_idx: usize) -> Result<u16, String> {
    let socket_addr = config
        .addr
        .to_socket_addrs()
        .map_err(|e| format!("unable to resolve addr '{}': {e}", config.addr))?
        .next()
        .ok_or_else(|| format!("unable to resolve addr '{}'", config.addr))?;

    let timeout = Duration::from_millis(config.timeout_ms);
    let mut stream = TcpStream::connect_timeout(&socket_addr, timeout)
        .map_err(|e| format!("connect failed: {e}"))?;
    stream
        .set_read_timeout(Some(timeout))
        .map_err(|e| format!("set_read_timeout failed: {e}"))?;
    stream
        .set_write_timeout(Some(timeout))
        .map_err(|e| format!("set_write_timeout failed: {e}"))?;

    let (content_type, body) = if config.json_body {
        (
            "application/json",
            format!(
                "{{\"fullName\":\"Load Worker {worker_idx}\",\"mobileNumber\":\"9876543210\",\
                 \"email\":\"load.w{worker_idx}.r{request_idx}@example.com\",\
                 \"requirement\":\"load probe\"}}"
            ),
        )
    } else {
        (
            "application/x-www-form-urlencoded",
            format!(
                "fullName=Load+Worker+{worker_idx}&mobileNumber=9876543210\
                 &email=load.w{worker_idx}.r{request_idx}%40example.com&requirement=load+probe"
            ),
        )
    };
    let request = format!(
        "POST {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\nAccept: application/json\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\n\r\n{body}",
        config.path,
        config.addr,
        body.len()
    );
    stream
        .write_all(request.as_bytes())
        .map_err(|e| format!("write failed: {e}"))?;

    let mut response = Vec::new();
    stream
        .read_to_end(&mut response)
        .map_err(|e| format!("read failed: {e}"))?;
    parse_status_code(&response)
}

fn parse_status_code(response: &[u8]) -> Result<u16, String> {
    let line_end = response
        .windows(2)
        .position(|window| window == b"\r\n")
        .ok_or_else(|| "invalid HTTP response: missing status line terminator".to_string())?;
    let status_line = std::str::from_utf8(&response[..line_end])
        .map_err(|_| "invalid HTTP response: status line not UTF-8".to_string())?;
    status_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| "invalid HTTP response: missing status code".to_string())?
        .parse::<u16>()
        .map_err(|_| "invalid HTTP response: status code parse failed".to_string())
}

fn percentile(sorted: &[f64], quantile: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = (((sorted.len() - 1) as f64) * quantile).round() as usize;
    sorted[idx]
}

fn parse_args<I>(args: I) -> Result<Config, String>
where
    I: Iterator<Item = String>,
{
    let mut config = Config {
        addr: "127.0.0.1:8082".to_string(),
        path: "/callback".to_string(),
        workers: 16,
        requests_per_worker: 50,
        warmup_requests: 5,
        timeout_ms: 5_000,
        json_body: false,
    };

    let mut args = args.peekable();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--addr" => {
                config.addr = args
                    .next()
                    .ok_or_else(|| "Missing value for --addr".to_string())?;
            }
            "--path" => {
                config.path = args
                    .next()
                    .ok_or_else(|| "Missing value for --path".to_string())?;
            }
            "--workers" => {
                config.workers = parse_usize_arg(&mut args, "--workers")?;
            }
            "--requests-per-worker" => {
                config.requests_per_worker = parse_usize_arg(&mut args, "--requests-per-worker")?;
            }
            "--warmup-requests" => {
                let raw = args
                    .next()
                    .ok_or_else(|| "Missing value for --warmup-requests".to_string())?;
                config.warmup_requests = raw
                    .parse::<usize>()
                    .map_err(|_| format!("Invalid value for --warmup-requests: {raw}"))?;
            }
            "--timeout-ms" => {
                let raw = args
                    .next()
                    .ok_or_else(|| "Missing value for --timeout-ms".to_string())?;
                config.timeout_ms = raw
                    .parse::<u64>()
                    .ok()
                    .filter(|value| *value > 0)
                    .ok_or_else(|| format!("Invalid value for --timeout-ms: {raw}"))?;
            }
            "--json" => {
                config.json_body = true;
            }
            "--help" | "-h" => return Err(usage_text().to_string()),
            _ => return Err(format!("Unknown argument '{arg}'.\n\n{}", usage_text())),
        }
    }

    if !config.path.starts_with('/') {
        return Err("--path must start with '/'".to_string());
    }
    if config.workers == 0 {
        return Err("--workers must be > 0".to_string());
    }
    if config.requests_per_worker == 0 {
        return Err("--requests-per-worker must be > 0".to_string());
    }
    Ok(config)
}

fn parse_usize_arg<I>(args: &mut I, flag: &str) -> Result<usize, String>
where
    I: Iterator<Item = String>,
{
    let raw = args
        .next()
        .ok_or_else(|| format!("Missing value for {flag}"))?;
    let value = raw
        .parse::<usize>()
        .map_err(|_| format!("Invalid value for {flag}: {raw}"))?;
    if value == 0 {
        return Err(format!("{flag} must be > 0"));
    }
    Ok(value)
}

fn usage_text() -> &'static str {
    "Usage: cargo run -p benchmark-smoke --bin concurrent_load -- [--addr HOST:PORT] [--path /callback] [--workers N] [--requests-per-worker N] [--warmup-requests N] [--timeout-ms N] [--json]"
}
