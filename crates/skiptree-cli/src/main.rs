// crates/skiptree-cli/src/main.rs

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

use std::io::{self, BufRead, Write};
use std::net::{SocketAddr, TcpListener};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Sender, SyncSender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use skiptree_core::{Component, Cpe, NameID, NodeConfig, NodeRef, NumericID, PartitionID, Range, SpacePart, Value};
use skiptree_dispatch::{AppEvent, Dispatcher, EgressManager, LocalNode};
use skiptree_routing::Envelope;

/// Operator-facing process arguments: `<local_ip> <local_port> <name_id>
/// <numeric_id>` for interactive mode; append `<bootstrap_ip>
/// <bootstrap_port> <batch_file>` for batch join+query mode (§6).
#[derive(Parser, Debug)]
#[command(
    name = "skiptree-cli",
    about = "Run a skiptree overlay peer",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    /// IP address this peer listens on.
    local_ip: String,
    /// TCP port this peer listens on.
    local_port: u16,
    /// This peer's `NameID` (any string; lexicographically ordered).
    name_id: String,
    /// This peer's `NumericID`, as hex digits or an arbitrary seed string.
    numeric_id: String,

    /// Bootstrap peer's IP, for batch mode.
    bootstrap_ip: Option<String>,
    /// Bootstrap peer's port, for batch mode.
    bootstrap_port: Option<u16>,
    /// Path to a file of CLI commands to replay, for batch mode.
    batch_file: Option<PathBuf>,

    /// Bound on each half-ring's size (0 = unbounded).
    #[arg(long, default_value_t = 16)]
    half_ring_bound: usize,
    /// Default TTL stamped on newly originated envelopes.
    #[arg(long, default_value_t = 16)]
    default_ttl: u8,
    /// Heartbeat sweep period, in seconds.
    #[arg(long, default_value_t = 600)]
    heartbeat_period_secs: u64,
    /// Idle egress-channel timeout, in seconds.
    #[arg(long, default_value_t = 3240)]
    idle_channel_timeout_secs: u64,
    /// Maximum accepted netstring frame length, in bytes.
    #[arg(long, default_value_t = 16 * 1024 * 1024)]
    max_frame_bytes: usize,
    /// Wall-clock deadline for a single join attempt, in seconds.
    #[arg(long, default_value_t = 30)]
    join_timeout_secs: u64,
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer().with_target(false).with_level(true).compact();

    let _ = tracing_subscriber::registry().with(filter).with(fmt_layer).try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = NodeConfig {
        half_ring_bound: cli.half_ring_bound,
        default_ttl: cli.default_ttl,
        heartbeat_period: Duration::from_secs(cli.heartbeat_period_secs),
        idle_channel_timeout: Duration::from_secs(cli.idle_channel_timeout_secs),
        max_frame_bytes: cli.max_frame_bytes,
        join_timeout: Duration::from_secs(cli.join_timeout_secs),
    };
    let self_ref = build_self_ref(&cli.local_ip, cli.local_port, &cli.name_id, &cli.numeric_id)?;
    let bind_addr = self_ref.address;

    let (ingress_tx, ingress_rx) = mpsc::channel::<IngressMsg>();
    let (env_tx, env_rx) = mpsc::channel::<Envelope>();
    let (fail_tx, fail_rx) = mpsc::channel::<NodeRef>();

    spawn_forwarder(env_rx, ingress_tx.clone(), IngressMsg::Envelope);
    spawn_forwarder(fail_rx, ingress_tx.clone(), IngressMsg::PeerFailed);

    let listener =
        TcpListener::bind(bind_addr).with_context(|| format!("binding listener on {bind_addr}"))?;
    {
        let max_frame_bytes = config.max_frame_bytes;
        thread::spawn(move || skiptree_net::run_listener(listener, max_frame_bytes, env_tx));
    }

    let egress = Arc::new(EgressManager::new(skiptree_net::tcp_connector()));
    spawn_idle_cleaner(Arc::clone(&egress), config.idle_channel_timeout);
    spawn_heartbeat(ingress_tx.clone(), config.heartbeat_period);

    let rng = StdRng::from_os_rng();
    let node = LocalNode::new(self_ref, config);
    let dispatcher = Dispatcher::new(node, rng);
    {
        let egress = Arc::clone(&egress);
        thread::spawn(move || run_actor(dispatcher, &ingress_rx, &egress, &fail_tx));
    }

    match (cli.bootstrap_ip, cli.bootstrap_port, cli.batch_file) {
        (Some(ip), Some(port), Some(path)) => run_batch(&ingress_tx, &ip, port, &path),
        (None, None, None) => run_interactive(&ingress_tx),
        _ => bail!("batch mode needs all three of <bootstrap_ip> <bootstrap_port> <batch_file>"),
    }
}

fn build_self_ref(ip: &str, port: u16, name_id: &str, numeric_id: &str) -> Result<NodeRef> {
    let address: SocketAddr = format!("{ip}:{port}")
        .parse()
        .with_context(|| format!("parsing local address {ip}:{port}"))?;
    Ok(NodeRef::new(
        NameID::new(name_id),
        parse_numeric_id(numeric_id),
        PartitionID::from_raw(0.5),
        address,
        Cpe::new(),
    ))
}

/// Accept either hex digits (`NumericID::fmt` round-trips this way) or an
/// arbitrary string hashed into a `NumericID`, so operators can pass either
/// a reproducible literal or a memorable name.
fn parse_numeric_id(s: &str) -> NumericID {
    let trimmed = s.strip_prefix("0x").unwrap_or(s);
    if !trimmed.is_empty() && trimmed.len() <= 32 && trimmed.bytes().all(|b| b.is_ascii_hexdigit()) {
        if let Ok(bits) = u128::from_str_radix(trimmed, 16) {
            return NumericID::from_bits(bits);
        }
    }
    NumericID::from_seed(s.as_bytes())
}

fn placeholder_node_ref(address: SocketAddr) -> NodeRef {
    NodeRef::new(
        NameID::new(address.to_string()),
        NumericID::from_seed(address.to_string().as_bytes()),
        PartitionID::from_raw(0.5),
        address,
        Cpe::new(),
    )
}

/// Drains `rx` forever, wrapping each item with `wrap` and forwarding it
/// onto `ingress_tx`; exits once either end closes.
fn spawn_forwarder<T: Send + 'static>(
    rx: mpsc::Receiver<T>,
    ingress_tx: Sender<IngressMsg>,
    wrap: impl Fn(T) -> IngressMsg + Send + 'static,
) {
    thread::spawn(move || {
        for item in rx {
            if ingress_tx.send(wrap(item)).is_err() {
                return;
            }
        }
    });
}

fn spawn_idle_cleaner(egress: Arc<EgressManager<std::net::TcpStream>>, idle_timeout: Duration) {
    thread::spawn(move || loop {
        thread::sleep(Duration::from_secs(60));
        egress.close_idle(idle_timeout);
    });
}

fn spawn_heartbeat(ingress_tx: Sender<IngressMsg>, period: Duration) {
    thread::spawn(move || loop {
        thread::sleep(period);
        if ingress_tx.send(IngressMsg::HeartbeatTick).is_err() {
            return;
        }
    });
}

/// Messages the single ingress dispatcher thread processes strictly
/// sequentially (§5): network arrivals, the heartbeat tick, egress
/// failures routed back for `node_fail`, and operator commands.
enum IngressMsg {
    Envelope(Envelope),
    HeartbeatTick,
    PeerFailed(NodeRef),
    Command(Cmd, SyncSender<String>),
}

fn run_actor(
    mut dispatcher: Dispatcher<StdRng>,
    ingress_rx: &mpsc::Receiver<IngressMsg>,
    egress: &Arc<EgressManager<std::net::TcpStream>>,
    fail_tx: &Sender<NodeRef>,
) {
    while let Ok(msg) = ingress_rx.recv() {
        let outbound = match msg {
            IngressMsg::Envelope(envelope) => dispatcher.dispatch(envelope),
            IngressMsg::HeartbeatTick => dispatcher.heartbeat_tick(),
            IngressMsg::PeerFailed(peer) => {
                dispatcher.node_fail(&peer);
                Vec::new()
            }
            IngressMsg::Command(cmd, resp) => {
                let (outbound, ack) = execute_command(&mut dispatcher, cmd);
                let _ = resp.send(ack);
                outbound
            }
        };
        skiptree_net::deliver(egress, outbound, fail_tx);
        for event in dispatcher.take_events() {
            println!("{}", format_event(&event));
        }
    }
}

static NEXT_NONCE: AtomicU64 = AtomicU64::new(1);

fn execute_command(d: &mut Dispatcher<StdRng>, cmd: Cmd) -> (Vec<(NodeRef, Envelope)>, String) {
    match cmd {
        Cmd::Node => (Vec::new(), d.node.self_ref.to_string()),
        Cmd::Cpe => (Vec::new(), format_cpe(&d.node.self_ref.cpe)),
        Cmd::AddLocal { key, data } => {
            let n = d.add_local(key, data);
            (Vec::new(), format!("stored locally as item {n}"))
        }
        Cmd::Insert { key, data } => {
            let outbound = d.insert_routed(key, data);
            let hops = outbound.len();
            (outbound, format!("insert routed ({hops} hop(s) in flight)"))
        }
        Cmd::Find { query } => {
            let nonce = NEXT_NONCE.fetch_add(1, Ordering::Relaxed);
            let outbound = d.lookup(query, nonce);
            (outbound, format!("lookup routed (nonce {nonce})"))
        }
        Cmd::Ping { target } => {
            let outbound = d.ping_numeric(target);
            (outbound, format!("identity ping routed towards {target}"))
        }
        Cmd::Join { addr } => {
            let seed = placeholder_node_ref(addr);
            let outbound = d.start_join(seed);
            (outbound, format!("join request sent to {addr}"))
        }
        Cmd::Leave => match d.leave() {
            Ok(outbound) => (outbound, "leave announced to ring neighbours".to_string()),
            Err(e) => (Vec::new(), format!("leave refused: {e}")),
        },
        Cmd::Dump => (Vec::new(), format_store(d)),
        Cmd::Help => (Vec::new(), HELP_TEXT.to_string()),
    }
}

fn format_cpe(cpe: &Cpe) -> String {
    if cpe.is_empty() {
        return "(skip-tree join not yet complete)".to_string();
    }
    cpe.nodes()
        .iter()
        .map(|n| format!("{} {} {}", n.direction, n.dimension, n.value))
        .collect::<Vec<_>>()
        .join(" / ")
}

fn format_store(d: &Dispatcher<StdRng>) -> String {
    if d.node.store.is_empty() {
        return "(store is empty)".to_string();
    }
    d.node
        .store
        .items()
        .iter()
        .enumerate()
        .map(|(id, item)| format!("{id}: {:?} -> {} byte(s)", item.space_part, item.data.len()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_event(event: &AppEvent) -> String {
    match event {
        AppEvent::LookupReply(reply) => match &reply.error {
            Some(reason) => format!("EVENT lookup nonce={} failed: {reason}", reply.nonce),
            None => format!(
                "EVENT lookup nonce={} matched {} item(s) via {} hop(s)",
                reply.nonce,
                reply.data.len(),
                reply.trace.len()
            ),
        },
        AppEvent::IdentityReply(reply) => format!("EVENT identity reply from {}", reply.node),
        AppEvent::JoinCompleted => "EVENT skip-tree join completed".to_string(),
        AppEvent::JoinFailed(reason) => format!("EVENT join failed: {reason}"),
        AppEvent::LeaveAcknowledged(node) => format!("EVENT leave acknowledged by {node}"),
        AppEvent::LeaveCompleted => "EVENT left the overlay".to_string(),
        AppEvent::PeerFailed(node) => format!("EVENT peer unreachable, dropped: {node}"),
    }
}

const HELP_TEXT: &str = "\
commands:
  node                         show this peer's identifiers and address
  cpe                          show this peer's CPE path
  add <spec> <data...>         store (key, data) locally, unrouted
  insert <spec> <data...>      route (key, data) for insertion
  find <spec>                  route a forking lookup over a range
  ping <numeric_id>            send an identity request towards a numeric id
  join <host> <port>           start a skip-tree join against host:port
  leave                        announce departure (refused if store nonempty)
  dump                         list locally stored items
  help                         show this text

<spec> is a comma-separated list of dim=value or dim=lo..hi, e.g. x=1,y=2..5";

/// A parsed operator command line (§6 CLI command set).
enum Cmd {
    Node,
    Cpe,
    AddLocal { key: SpacePart, data: Vec<u8> },
    Insert { key: SpacePart, data: Vec<u8> },
    Find { query: SpacePart },
    Ping { target: NumericID },
    Join { addr: SocketAddr },
    Leave,
    Dump,
    Help,
}

fn parse_command(line: &str) -> Result<Cmd> {
    let mut tokens = line.split_whitespace();
    let verb = tokens.next().context("empty command")?;
    match verb {
        "node" => Ok(Cmd::Node),
        "cpe" => Ok(Cmd::Cpe),
        "dump" => Ok(Cmd::Dump),
        "leave" => Ok(Cmd::Leave),
        "help" => Ok(Cmd::Help),
        "add" | "insert" => {
            let spec = tokens.next().context("missing <spec> argument")?;
            let key = parse_space_part(spec)?;
            let data: Vec<u8> = tokens.collect::<Vec<_>>().join(" ").into_bytes();
            if data.is_empty() {
                bail!("missing data argument");
            }
            Ok(if verb == "add" {
                Cmd::AddLocal { key, data }
            } else {
                Cmd::Insert { key, data }
            })
        }
        "find" => {
            let spec = tokens.next().context("missing <spec> argument")?;
            Ok(Cmd::Find {
                query: parse_space_part(spec)?,
            })
        }
        "ping" => {
            let target = tokens.next().context("missing <numeric_id> argument")?;
            Ok(Cmd::Ping {
                target: parse_numeric_id(target),
            })
        }
        "join" => {
            let host = tokens.next().context("missing <host> argument")?;
            let port: u16 = tokens
                .next()
                .context("missing <port> argument")?
                .parse()
                .context("parsing <port>")?;
            let addr = format!("{host}:{port}")
                .parse()
                .with_context(|| format!("parsing join address {host}:{port}"))?;
            Ok(Cmd::Join { addr })
        }
        other => bail!("unknown command {other:?}; type `help` for the command list"),
    }
}

/// Parse a comma-separated `dim=value` / `dim=lo..hi` specification into a
/// `SpacePart`.
fn parse_space_part(spec: &str) -> Result<SpacePart> {
    let mut part = SpacePart::new();
    for entry in spec.split(',') {
        let (dim, value) = entry.split_once('=').with_context(|| format!("expected dim=value, got {entry:?}"))?;
        let dimension = skiptree_core::Dimension::new(dim);
        if let Some((lo, hi)) = value.split_once("..") {
            let range = Range::closed(parse_value(lo), parse_value(hi));
            part.set_component(Component::range(dimension, range));
        } else {
            part.set_component(Component::point(dimension, parse_value(value)));
        }
    }
    Ok(part)
}

fn parse_value(s: &str) -> Value {
    if let Ok(i) = s.parse::<i64>() {
        Value::int(i)
    } else if let Ok(f) = s.parse::<f64>() {
        Value::float(f)
    } else {
        Value::text(s)
    }
}

/// Submit `cmd` to the actor thread and block for its immediate
/// acknowledgement (routed replies, if any, arrive later as `EVENT` lines
/// printed by the actor itself).
fn submit_command(ingress_tx: &Sender<IngressMsg>, cmd: Cmd) -> Result<String> {
    let (resp_tx, resp_rx) = mpsc::sync_channel(1);
    ingress_tx
        .send(IngressMsg::Command(cmd, resp_tx))
        .context("actor thread is gone")?;
    resp_rx.recv().context("actor thread dropped its response")
}

/// Read commands from stdin until EOF (exit code 0) or a fatal error
/// (non-zero), one stable command per line (§6).
fn run_interactive(ingress_tx: &Sender<IngressMsg>) -> Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_command(line) {
            Ok(cmd) => {
                let ack = submit_command(ingress_tx, cmd)?;
                let mut out = stdout.lock();
                writeln!(out, "{ack}")?;
            }
            Err(e) => {
                let mut out = stdout.lock();
                writeln!(out, "error: {e}")?;
            }
        }
    }
    Ok(())
}

/// Batch join+query mode: join against `bootstrap`, replay every line of
/// `batch_file` as a command, then fall through to interactive mode so
/// the peer keeps serving the overlay and EOF semantics stay uniform.
fn run_batch(ingress_tx: &Sender<IngressMsg>, bootstrap_ip: &str, bootstrap_port: u16, batch_file: &PathBuf) -> Result<()> {
    let addr: SocketAddr = format!("{bootstrap_ip}:{bootstrap_port}")
        .parse()
        .with_context(|| format!("parsing bootstrap address {bootstrap_ip}:{bootstrap_port}"))?;
    let ack = submit_command(ingress_tx, Cmd::Join { addr })?;
    println!("{ack}");

    let file = std::fs::File::open(batch_file)
        .with_context(|| format!("opening batch file {}", batch_file.display()))?;
    for line in io::BufReader::new(file).lines() {
        let line = line.context("reading batch file")?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match parse_command(line) {
            Ok(cmd) => {
                let ack = submit_command(ingress_tx, cmd)?;
                println!("{ack}");
            }
            Err(e) => println!("error: {e}"),
        }
    }

    run_interactive(ingress_tx)
}
