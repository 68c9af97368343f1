use std::{
    path::PathBuf,
    time::{Instant, SystemTime, UNIX_EPOCH},
};

use callback::build_record;
use schema::ValidSubmission;
use store::CallbackStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BenchmarkProfile {
    Smoke,
    Standard,
    Large,
}

impl BenchmarkProfile {
    fn from_arg(raw: &str) -> Option<Self> {
        match raw {
            "smoke" => Some(Self::Smoke),
            "standard" | "default" => Some(Self::Standard),
            "large" => Some(Self::Large),
            _ => None,
        }
    }

    fn sequential_appends(self) -> usize {
        match self {
            Self::Smoke => 200,
            Self::Standard => 1_000,
            Self::Large => 5_000,
        }
    }

    fn concurrent_writers(self) -> usize {
        match self {
            Self::Smoke => 4,
            Self::Standard => 8,
            Self::Large => 8,
        }
    }

    fn appends_per_writer(self) -> usize {
        match self {
            Self::Smoke => 10,
            Self::Standard => 25,
            Self::Large => 50,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Smoke => "smoke",
            Self::Standard => "standard",
            Self::Large => "large",
        }
    }
}

fn main() {
    let profile = match parse_profile(std::env::args().skip(1)) {
        Ok(profile) => profile,
        Err(message) => {
            eprintln!("{message}");
            std::process::exit(2);
        }
    };

    if let Err(err) = run(profile) {
        eprintln!("store benchmark failed: {err}");
        std::process::exit(1);
    }
}

fn parse_profile<I>(mut args: I) -> Result<BenchmarkProfile, String>
where
    I: Iterator<Item = String>,
{
    match args.next().as_deref() {
        None => Ok(BenchmarkProfile::Smoke),
        Some("--help") | Some("-h") => Err(usage_text().to_string()),
        Some(raw) => BenchmarkProfile::from_arg(raw)
            .ok_or_else(|| format!("Unknown profile '{raw}'.\n\n{}", usage_text())),
    }
}

fn usage_text() -> &'static str {
    "Usage: cargo run -p benchmark-smoke -- [smoke|standard|large]"
}

fn run(profile: BenchmarkProfile) -> Result<(), String> {
    let store_path = benchmark_store_path();
    let store = CallbackStore::open(&store_path);

    // Phase 1: sequential appends, per-append latency.
    let sequential = profile.sequential_appends();
    let mut latencies_ms = Vec::with_capacity(sequential);
    let sequential_started = Instant::now();
    for idx in 0..sequential {
        let record = build_record(&sample_submission(0, idx));
        let append_started = Instant::now();
        store
            .append(record)
            .map_err(|err| format!("sequential append {idx} failed: {err:?}"))?;
        latencies_ms.push(append_started.elapsed().as_secs_f64() * 1000.0);
    }
    let sequential_elapsed = sequential_started.elapsed().as_secs_f64();

    // Phase 2: contended appends across writer threads.
    let writers = profile.concurrent_writers();
    let per_writer = profile.appends_per_writer();
    let concurrent_started = Instant::now();
    let failures = std::thread::scope(|scope| {
        let mut handles = Vec::with_capacity(writers);
        for writer_idx in 1..=writers {
            let store = CallbackStore::open(&store_path);
            handles.push(scope.spawn(move || {
                let mut failed = 0usize;
                for request_idx in 0..per_writer {
                    let record = build_record(&sample_submission(writer_idx, request_idx));
                    if store.append(record).is_err() {
                        failed += 1;
                    }
                }
                failed
            }));
        }
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap_or(per_writer))
            .sum::<usize>()
    });
    let concurrent_elapsed = concurrent_started.elapsed().as_secs_f64();

    // Phase 3: full read-back.
    let read_started = Instant::now();
    let snapshot = store
        .read_all()
        .map_err(|err| format!("read-back failed: {err:?}"))?;
    let read_ms = read_started.elapsed().as_secs_f64() * 1000.0;

    let expected = sequential + writers * per_writer;
    let concurrent_total = writers * per_writer;

    latencies_ms.sort_by(|a, b| a.total_cmp(b));
    println!("Callback store benchmark");
    println!("profile: {}", profile.as_str());
    println!("store: {}", store_path.display());
    println!("sequential_appends: {sequential}");
    println!("sequential_elapsed_seconds: {sequential_elapsed:.4}");
    println!(
        "sequential_throughput_aps: {:.2}",
        sequential as f64 / sequential_elapsed.max(0.0001)
    );
    println!(
        "append_latency_avg_ms: {:.4}",
        latencies_ms.iter().sum::<f64>() / latencies_ms.len().max(1) as f64
    );
    println!("append_latency_p50_ms: {:.4}", percentile(&latencies_ms, 0.50));
    println!("append_latency_p95_ms: {:.4}", percentile(&latencies_ms, 0.95));
    println!("append_latency_p99_ms: {:.4}", percentile(&latencies_ms, 0.99));
    println!("concurrent_writers: {writers}");
    println!("concurrent_appends: {concurrent_total}");
    println!("concurrent_elapsed_seconds: {concurrent_elapsed:.4}");
    println!(
        "concurrent_throughput_aps: {:.2}",
        concurrent_total as f64 / concurrent_elapsed.max(0.0001)
    );
    println!("concurrent_failed_appends: {failures}");
    println!("read_all_ms: {read_ms:.4}");
    println!("records_persisted: {}", snapshot.records.len());

    let _ = std::fs::remove_file(store.path());
    let _ = std::fs::remove_file(store.lock_path());

    if failures > 0 {
        return Err(format!("{failures} concurrent appends failed"));
    }
    if snapshot.records.len() != expected {
        return Err(format!(
            "record count mismatch: expected {expected}, found {}",
            snapshot.records.len()
        ));
    }
    Ok(())
}

fn sample_submission(writer_idx: usize, request_idx: usize) -> ValidSubmission {
    ValidSubmission {
        full_name: format!("Load Worker {writer_idx}"),
        mobile_number: "9876543210".to_string(),
        email: format!("load.w{writer_idx}.r{request_idx}@example.com"),
        business_name: "Benchmark Traders".to_string(),
        requirement: "throughput probe".to_string(),
        message: String::new(),
    }
}

fn percentile(sorted: &[f64], quantile: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = (((sorted.len() - 1) as f64) * quantile).round() as usize;
    sorted[idx]
}

fn benchmark_store_path() -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();
    std::env::temp_dir().join(format!(
        "callback-bench-{}-{nanos}.json",
        std::process::id()
    ))
}
