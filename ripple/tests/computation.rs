//! End-to-end tests driving workers through their event loops.

use std::sync::Arc;
use std::time::{Duration, Instant};

use ripple::coordination::aggregate_request;
use ripple::{
    execute, execute_with_mapper, Config, Coordinator, CoordinatorMessage, Edge, MessageBus,
    Signal, Signals, Vertex, WorkerMapper, WorkerMessage, WorkerRequest, WorkerStatus,
};

const LONG: Duration = Duration::from_secs(10);

/// A vertex that sums collected payloads and announces its state once per
/// change, recording everything it saw.
struct Relay {
    id: u32,
    state: i64,
    announced: bool,
    signaled: usize,
    log: Vec<i64>,
    edges: Vec<Edge<u32>>,
}

impl Relay {
    fn new(id: u32, state: i64) -> Self {
        Relay { id, state, announced: false, signaled: 0, log: Vec::new(), edges: Vec::new() }
    }
}

impl Vertex for Relay {
    type Id = u32;
    type Payload = i64;

    fn id(&self) -> u32 {
        self.id
    }

    fn score_signal(&self) -> f64 {
        if self.announced {
            0.0
        } else {
            1.0
        }
    }

    fn score_collect(&self, uncollected: &[Signal<u32, i64>]) -> f64 {
        uncollected.len() as f64
    }

    fn signal(&mut self, bus: &mut dyn MessageBus<Self>) {
        for edge in &self.edges {
            bus.send_signal(Signal::new(self.id, edge.target, self.state));
        }
        self.announced = true;
        self.signaled += 1;
    }

    fn collect(&mut self, uncollected: Signals<u32, i64>, _bus: &mut dyn MessageBus<Self>) {
        for signal in uncollected {
            self.state += signal.payload;
            self.log.push(signal.payload);
        }
        self.announced = false;
    }

    fn add_outgoing_edge(&mut self, edge: Edge<u32>) -> bool {
        if self.edges.contains(&edge) {
            false
        } else {
            self.edges.push(edge);
            true
        }
    }

    fn remove_outgoing_edge(&mut self, edge: &Edge<u32>) -> bool {
        let before = self.edges.len();
        self.edges.retain(|e| e != edge);
        self.edges.len() < before
    }

    fn remove_all_outgoing_edges(&mut self) -> usize {
        let removed = self.edges.len();
        self.edges.clear();
        removed
    }

    fn outgoing_edge_count(&self) -> usize {
        self.edges.len()
    }
}

fn await_status(
    coordinator: &Coordinator<Relay>,
    predicate: impl Fn(&WorkerStatus) -> bool,
) -> Vec<WorkerStatus> {
    let deadline = Instant::now() + LONG;
    let mut seen = Vec::new();
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match coordinator.recv_timeout(remaining) {
            Some(CoordinatorMessage::Status(status)) => {
                seen.push(status);
                if predicate(&status) {
                    return seen;
                }
            }
            Some(CoordinatorMessage::Statistics(_)) => {}
            None => panic!("timed out waiting for status; saw {:?}", seen),
        }
    }
}

fn shard_state(coordinator: &Coordinator<Relay>, worker: usize) -> Vec<(u32, i64, usize, Vec<i64>)> {
    let (fold, results) = aggregate_request(
        Vec::new(),
        |vertex: &Relay| vec![(vertex.id, vertex.state, vertex.signaled, vertex.log.clone())],
        |mut a: Vec<(u32, i64, usize, Vec<i64>)>, b| {
            a.extend(b);
            a
        },
    );
    assert!(coordinator.send(worker, WorkerRequest::Aggregate(Box::new(fold))));
    let mut shard = results.poll(LONG).expect("aggregation reply");
    shard.sort_by_key(|entry| entry.0);
    shard
}

#[test]
fn collect_then_signal_loop_converges() {
    let (guards, coordinator) =
        execute::<Relay, _, _>(Config::with_workers(1), |worker| worker.run()).unwrap();

    coordinator.send(0, WorkerRequest::AddVertex(Relay::new(1, 0)));
    let inject = coordinator.worker_mailbox(0).unwrap();
    for payload in [10, 20, 30] {
        inject.send(WorkerMessage::Signal(Signal::new(9, 1, payload)));
    }
    coordinator.send(0, WorkerRequest::Start);

    await_status(&coordinator, |status| status.is_idle && !status.is_paused);

    let shard = shard_state(&coordinator, 0);
    assert_eq!(shard, vec![(1, 60, 1, vec![10, 20, 30])]);

    coordinator.send(0, WorkerRequest::Shutdown);
    for result in guards.join() {
        result.unwrap();
    }
}

#[test]
fn pause_is_idempotent_and_statuses_mark_transitions() {
    let (guards, coordinator) =
        execute::<Relay, _, _>(Config::with_workers(1), |worker| worker.run()).unwrap();

    coordinator.send(0, WorkerRequest::Start);
    let mut statuses = await_status(&coordinator, |status| !status.is_paused);
    coordinator.send(0, WorkerRequest::Pause);
    coordinator.send(0, WorkerRequest::Pause);
    statuses.extend(await_status(&coordinator, |status| status.is_paused));

    // allow any trailing idle transition to arrive, then go quiet
    while let Some(message) = coordinator.recv_timeout(Duration::from_millis(200)) {
        if let CoordinatorMessage::Status(status) = message {
            statuses.push(status);
        }
    }

    // never two identical consecutive statuses
    for pair in statuses.windows(2) {
        assert!(
            pair[0].is_idle != pair[1].is_idle || pair[0].is_paused != pair[1].is_paused,
            "duplicate status emitted: {:?}",
            pair
        );
    }
    // the double pause produced exactly one paused transition
    let pauses = statuses
        .windows(2)
        .filter(|pair| !pair[0].is_paused && pair[1].is_paused)
        .count();
    assert_eq!(pauses, 1);

    coordinator.send(0, WorkerRequest::Shutdown);
    for result in guards.join() {
        result.unwrap();
    }
}

#[test]
fn shutdown_from_idle_reports_a_final_idle_status() {
    let (guards, coordinator) =
        execute::<Relay, _, _>(Config::with_workers(1), |worker| worker.run()).unwrap();

    // converged and paused from the start; the worker goes idle on its own
    await_status(&coordinator, |status| status.is_idle && status.is_paused);
    coordinator.send(0, WorkerRequest::Shutdown);
    for result in guards.join() {
        result.unwrap();
    }

    // no un-idle transition follows the shutdown
    assert!(coordinator.drain().is_empty());
}

#[test]
fn statistics_arrive_on_request() {
    let (guards, coordinator) =
        execute::<Relay, _, _>(Config::with_workers(1), |worker| worker.run()).unwrap();

    coordinator.send(0, WorkerRequest::AddVertex(Relay::new(1, 0)));
    coordinator.send(0, WorkerRequest::AddVertex(Relay::new(2, 0)));
    coordinator.send(0, WorkerRequest::AddEdge(Edge::plain(1, 2)));
    coordinator.send(0, WorkerRequest::ReportStatistics);

    let deadline = Instant::now() + LONG;
    let statistics = loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match coordinator.recv_timeout(remaining) {
            Some(CoordinatorMessage::Statistics(statistics)) => break statistics,
            Some(CoordinatorMessage::Status(_)) => {}
            None => panic!("timed out waiting for statistics"),
        }
    };

    assert_eq!(statistics.worker_id, 0);
    assert_eq!(statistics.vertex_count, 2);
    assert_eq!(statistics.outgoing_edge_count, 1);
    assert_eq!(statistics.counters.vertices_added, 2);
    assert_eq!(statistics.counters.outgoing_edges_added, 1);
    assert_eq!(statistics.messages_received, 4);

    coordinator.send(0, WorkerRequest::Shutdown);
    for result in guards.join() {
        result.unwrap();
    }
}

/// Places even ids on worker 0 and odd ids on worker 1.
struct ParityMapper;

impl WorkerMapper<u32> for ParityMapper {
    fn worker_for(&self, id: &u32) -> usize {
        (*id % 2) as usize
    }
}

#[test]
fn signals_cross_worker_boundaries() {
    let (guards, coordinator) = execute_with_mapper::<Relay, _, _>(
        Config::with_workers(2),
        Arc::new(ParityMapper),
        |worker| worker.run(),
    )
    .unwrap();

    coordinator.send(0, WorkerRequest::AddVertex(Relay::new(2, 5)));
    coordinator.send(1, WorkerRequest::AddVertex(Relay::new(1, 0)));
    coordinator.send(0, WorkerRequest::AddEdge(Edge::plain(2, 1)));
    coordinator.broadcast(|_| WorkerRequest::Start);

    // worker 1 has collected once the signal from worker 0 crossed over
    let deadline = Instant::now() + LONG;
    loop {
        let shard = shard_state(&coordinator, 1);
        if shard == vec![(1, 5, 1, vec![5])] {
            break;
        }
        assert!(Instant::now() < deadline, "worker 1 never saw the signal: {:?}", shard);
        std::thread::sleep(Duration::from_millis(10));
    }

    coordinator.broadcast(|_| WorkerRequest::Shutdown);
    for result in guards.join() {
        result.unwrap();
    }
}
