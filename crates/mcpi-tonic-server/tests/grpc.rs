use core::time::Duration;
use mcpi_tonic_core::{
    client::RemoteWorker,
    mcpi::{Error, Sampler, Solver, SolverState, WorkerError, WorkerHandle},
};
use mcpi_tonic_server::server::{
    config::ServerConfig, serve_with_incoming, service::handler::PiWorkerService,
};
use std::path::PathBuf;
use tempfile::TempDir;
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};
use tokio_stream::wrappers::TcpListenerStream;

/// A `pi-worker` running on an ephemeral port inside the test runtime.
struct TestWorker {
    url: String,
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<anyhow::Result<()>>,
}

impl TestWorker {
    async fn spawn(config: ServerConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let (stop, stopped) = oneshot::channel::<()>();

        let service = PiWorkerService::new(config);
        let handle = tokio::spawn(serve_with_incoming(
            service,
            TcpListenerStream::new(listener),
            async {
                let _ = stopped.await;
            },
        ));

        Self {
            url,
            stop: Some(stop),
            handle,
        }
    }

    fn handle(&self) -> RemoteWorker {
        RemoteWorker::connect_lazy(&self.url, Some(Duration::from_secs(5))).unwrap()
    }

    async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        self.handle.await.unwrap().unwrap();
    }
}

fn config(num_workers: usize, seed: u64) -> ServerConfig {
    ServerConfig {
        num_workers,
        seed: Some(seed),
        shutdown_timeout: Duration::from_millis(500),
        ..ServerConfig::default()
    }
}

struct Fixture {
    _dir: TempDir,
    input: PathBuf,
    output: PathBuf,
}

fn fixture(input: &str) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let input_path = dir.path().join("input.txt");
    std::fs::write(&input_path, input).unwrap();
    Fixture {
        output: dir.path().join("output.txt"),
        input: input_path,
        _dir: dir,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn distributed_run_over_grpc_writes_a_report() {
    let workers = [
        TestWorker::spawn(config(2, 1)).await,
        TestWorker::spawn(config(2, 2)).await,
        TestWorker::spawn(config(2, 3)).await,
    ];
    let f = fixture("300000\n");

    let handles: Vec<_> = workers.iter().map(TestWorker::handle).collect();
    let mut solver = Solver::distributed(handles, &f.input, &f.output);
    let report = solver.solve().await.unwrap();

    assert_eq!(solver.state(), SolverState::Done);
    assert_eq!(report.total_iterations, 300_000);
    assert_eq!(report.worker_count, Some(3));
    assert!((report.pi_estimate.value() - core::f64::consts::PI).abs() < 0.05);

    let written = std::fs::read_to_string(&f.output).unwrap();
    let lines: Vec<_> = written.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].ends_with(" seconds using 3 workers"));
    assert_eq!(lines[1], "Total iterations: 300000");
    assert_eq!(lines[2], format!("Estimated Pi: {:.10}", report.pi_estimate));

    for worker in workers {
        worker.stop().await;
    }
}

#[tokio::test]
async fn remote_chunk_matches_local_draws_for_the_same_seed() {
    let worker = TestWorker::spawn(config(1, 77)).await;

    let hits = worker.handle().invoke(50_000).await.unwrap();

    assert_eq!(hits, Sampler::stream(77, 0).sample(50_000));
    worker.stop().await;
}

#[tokio::test]
async fn workers_with_adjacent_seeds_answer_differently() {
    let one = TestWorker::spawn(config(2, 1)).await;
    let two = TestWorker::spawn(config(2, 2)).await;
    let (h1, h2) = (one.handle(), two.handle());

    // Round-robin over two threads: odd calls land on thread 1 of the first
    // worker, even calls on thread 0 of the second.
    let mut shifted = Vec::new();
    let mut next = Vec::new();
    for _ in 0..2 {
        h1.invoke(0).await.unwrap();
        shifted.push(h1.invoke(200_000).await.unwrap());
        next.push(h2.invoke(200_000).await.unwrap());
        h2.invoke(0).await.unwrap();
    }

    assert_ne!(shifted, next, "two workers drew the same streams");
    one.stop().await;
    two.stop().await;
}

#[tokio::test]
async fn oversized_chunk_is_a_remote_failure() {
    let worker = TestWorker::spawn(ServerConfig {
        max_allowed_iterations: 100,
        ..config(1, 0)
    })
    .await;
    let f = fixture("101");

    let mut solver = Solver::distributed(vec![worker.handle()], &f.input, &f.output);
    let err = solver.solve().await.unwrap_err();

    match err {
        Error::WorkerFailure {
            worker_index: 0,
            cause: WorkerError::Remote { message },
        } => assert!(message.starts_with("InvalidArgument"), "{message}"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!f.output.exists());
    worker.stop().await;
}

#[tokio::test]
async fn unreachable_worker_fails_the_run() {
    let live = TestWorker::spawn(config(1, 5)).await;
    let dead_port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    let dead = RemoteWorker::connect_lazy(
        format!("http://127.0.0.1:{dead_port}"),
        Some(Duration::from_secs(1)),
    )
    .unwrap();
    let f = fixture("1000");

    let mut solver = Solver::distributed(vec![live.handle(), dead], &f.input, &f.output);

    assert!(matches!(
        solver.solve().await,
        Err(Error::WorkerFailure {
            worker_index: 1,
            cause: WorkerError::Transport { .. }
        })
    ));
    assert_eq!(solver.state(), SolverState::Failed);
    assert!(!f.output.exists());
    live.stop().await;
}

#[tokio::test]
async fn stopped_worker_stops_answering() {
    let worker = TestWorker::spawn(config(1, 9)).await;
    let handle = worker.handle();

    assert!(handle.invoke(10).await.is_ok());
    worker.stop().await;

    assert!(handle.invoke(10).await.is_err());
}
