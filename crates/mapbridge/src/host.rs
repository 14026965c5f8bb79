//! # Host Loop
//!
//! Three threads, two channels:
//!
//! ```text
//! reader thread ── tokio mpsc ──► runtime thread ── crossbeam bounded ──► writer thread
//!  (BufRead)        (lines)        (current_thread,     (Outbound)           (Write)
//!                                   one task per request)
//! ```
//!
//! Every request runs as its own task, in arrival order, so a subscription
//! waiting for a map does not hold up the request that creates it.
//!
//! ## Shutdown
//!
//! End of input drains the loop: ordinary requests are awaited, the bridge
//! is closed (which cancels subscriptions still waiting for their map and
//! flushes queued events), then the writer is joined and handed back.

use std::io::{BufRead, Write};
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender};
use mapbridge_core::{
    envelope, host_callback, Bridge, BridgeError, CallbackError, HostCallback, RecordingSurface,
    Reply, SurfaceEvent,
};
use mapbridge_shared::{EntityKind, MapId};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::HostConfig;
use crate::error::{HostError, HostResult};
use crate::protocol::{HostOp, Outbound, Push, Request, Response};

type HostBridge = Bridge<RecordingSurface>;

/// Serves requests from `input` until it ends, writing replies and events to
/// `output`. Returns `output` once everything has been flushed.
pub fn run_host<R, W>(config: &HostConfig, input: R, output: W) -> HostResult<W>
where
    R: BufRead + Send + 'static,
    W: Write + Send + 'static,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    let (outbound_tx, outbound_rx) = bounded(config.outbound_buffer);
    let writer = thread::Builder::new()
        .name("mapbridge-writer".into())
        .spawn(move || write_loop(&outbound_rx, output))?;

    let (line_tx, line_rx) = mpsc::unbounded_channel();
    let reader = thread::Builder::new()
        .name("mapbridge-reader".into())
        .spawn(move || read_loop(input, &line_tx))?;

    let bridge = Bridge::with_config(RecordingSurface::new(), config.bridge.clone());
    info!(
        namespace = %config.bridge.namespace,
        outbound_buffer = config.outbound_buffer,
        "Host started"
    );

    runtime.block_on(serve(bridge.clone(), line_rx, outbound_tx));
    drop(runtime);

    let stats = bridge.stats().snapshot();
    info!(
        commands_ok = stats.commands_ok,
        commands_failed = stats.commands_failed,
        events_forwarded = stats.events_forwarded,
        callback_failures = stats.callback_failures,
        "Host stopped"
    );

    reader
        .join()
        .map_err(|_| HostError::ThreadPanicked("reader"))??;
    writer
        .join()
        .map_err(|_| HostError::ThreadPanicked("writer"))?
}

fn read_loop<R: BufRead>(input: R, lines: &mpsc::UnboundedSender<String>) -> HostResult<()> {
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        if lines.send(line).is_err() {
            break;
        }
    }
    debug!("Input closed");
    Ok(())
}

fn write_loop<W: Write>(outbound: &Receiver<Outbound>, mut output: W) -> HostResult<W> {
    for message in outbound {
        match message.to_line() {
            Ok(line) => {
                writeln!(output, "{line}")?;
                output.flush()?;
            }
            Err(e) => warn!(error = %e, "Dropping unserializable message"),
        }
    }
    Ok(output)
}

async fn serve(
    bridge: HostBridge,
    mut lines: mpsc::UnboundedReceiver<String>,
    outbound: Sender<Outbound>,
) {
    let mut requests: Vec<JoinHandle<()>> = Vec::new();
    let mut subscriptions: Vec<JoinHandle<()>> = Vec::new();

    while let Some(line) = lines.recv().await {
        let (id, op) = match Request::parse(&line) {
            Ok(request) => (Some(request.id), HostOp::parse(&request.op, request.params)),
            Err((id, e)) => (id, Err(HostError::from(e))),
        };
        let waits = matches!(op, Ok(HostOp::Subscribe { .. }));
        let task = tokio::spawn(handle(bridge.clone(), outbound.clone(), id, op));

        if waits {
            subscriptions.retain(|task| !task.is_finished());
            subscriptions.push(task);
        } else {
            requests.retain(|task| !task.is_finished());
            requests.push(task);
        }
    }

    join_all(requests).await;
    // Let subscriptions woken by the last map creations register first.
    tokio::task::yield_now().await;
    bridge.close().await;
    join_all(subscriptions).await;
}

async fn join_all(tasks: Vec<JoinHandle<()>>) {
    for task in tasks {
        if let Err(e) = task.await {
            warn!(error = %e, "Request task failed");
        }
    }
}

async fn handle(
    bridge: HostBridge,
    outbound: Sender<Outbound>,
    id: Option<u64>,
    op: HostResult<HostOp>,
) {
    let reply_to = outbound.clone();
    envelope(
        async move { op },
        |op| perform(&bridge, &outbound, op),
        move |result| {
            queue_reply(&reply_to, id, result);
        },
    )
    .await;
}

async fn perform(bridge: &HostBridge, outbound: &Sender<Outbound>, op: HostOp) -> HostResult<()> {
    match op {
        HostOp::Bridge(command) => bridge.dispatch(command).await?,
        HostOp::Subscribe { map_id, kind } => {
            let callback = forward_to(outbound.clone(), map_id);
            bridge.subscribe(map_id, kind, callback).await?;
        }
        HostOp::RegisterElement { element_id } => {
            debug!(%element_id, "Element registered");
            bridge.with_surface(|surface| surface.insert_element(element_id));
        }
        HostOp::SimulateClick { map_id, coordinate } => {
            let event = SurfaceEvent::Click {
                latlng: coordinate,
                container_point: [0.0, 0.0],
            };
            fire(bridge, map_id, event, "simulating click")?;
        }
        HostOp::SimulateMove {
            map_id,
            center,
            zoom,
        } => {
            let event = SurfaceEvent::MoveEnd { center, zoom };
            fire(bridge, map_id, event, "simulating move")?;
        }
    }
    Ok(())
}

fn fire(bridge: &HostBridge, map_id: MapId, event: SurfaceEvent, action: &str) -> HostResult<()> {
    let handle = bridge
        .map_handle(map_id)
        .ok_or_else(|| BridgeError::not_found(EntityKind::Map, map_id.get(), action))?;
    let delivered = bridge.with_surface(|surface| surface.fire(handle, event));
    debug!(%map_id, delivered, "Simulated event fired");
    Ok(())
}

/// Hands a reply to the writer without blocking the runtime thread. A full
/// or closed queue drops the reply. Returns whether it was queued.
fn queue_reply(outbound: &Sender<Outbound>, id: Option<u64>, result: Reply) -> bool {
    match outbound.try_send(Outbound::Response(Response { id, result })) {
        Ok(()) => true,
        Err(e) => {
            warn!(?id, error = %e, "Reply dropped");
            false
        }
    }
}

/// Callback pushing every payload from `map_id` to the writer. A full
/// queue is a callback failure; the bridge logs and counts it.
fn forward_to(outbound: Sender<Outbound>, map_id: MapId) -> HostCallback {
    host_callback(move |payload| {
        let queued = outbound
            .try_send(Outbound::Push(Push::new(map_id, payload)))
            .map_err(|e| CallbackError::new(format!("push from {map_id} not queued: {e}")));
        async move { queued }
    })
}
