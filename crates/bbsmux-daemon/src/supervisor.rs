// SPDX-License-Identifier: MIT

//! The Supervisor, per spec §4.8: the single task that owns [`NodeTable`]
//! and runs the main tick loop described there — listener readiness,
//! child exits, retry timers, TUI refresh, resize, operator keys, and
//! config-editor handoff.
//!
//! Grounded in `oj-daemon`'s `lifecycle`/`listener` split: a plain struct
//! owning everything the loop touches, driven by one `tokio::select!`
//! rather than spawned-task-per-connection (the teacher's listener does
//! spawn a task per client, but its clients only ever exchange a few
//! protocol messages over a Unix socket; our "clients" are long-lived
//! telnet sessions whose I/O is a wholly separate OS process — the
//! Bridge — so nothing about a connection needs its own tokio task here).

use crate::bridge;
use crate::callers;
use crate::config::Config;
use crate::config_editor::{self, ConfigEditorHandoff};
use crate::error::DaemonError;
use crate::listener::{self, Listener};
use crate::paths::{self, NodePaths};
use crate::pty_drainer;
use crate::reaper::{self, ReapOutcome};
use crate::snoop::{self, SnoopCommand};
use crate::tui::{self, BbsIdentity, DashboardView};
use crate::userinfo;
use bbsmux_core::clock::SystemClock;
use bbsmux_core::crash_signature::DEFAULT_MARKERS;
use bbsmux_core::node::NodeStatus;
use bbsmux_core::popup::PopupAlert;
use bbsmux_core::table::NodeTable;
use crossterm::event::{Event as CEvent, EventStream, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use futures_util::StreamExt;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::collections::HashMap;
use std::io::{self, Stdout};
use std::net::SocketAddr;
use std::os::fd::AsRawFd;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::signal::unix::{signal, SignalKind};
use tokio::time;

/// Tick cadence, per spec §4.8 ("≈100 ms") and §6's `REFRESH_MS`.
const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Grace period between SIGTERM and SIGKILL on operator kill, per
/// spec §4.1 ("bounded grace (≈100 ms)").
const KILL_GRACE: Duration = Duration::from_millis(100);

/// What to do with a dispatched operator key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ControlFlow {
    Continue,
    Quit,
}

/// Which of three mutually-exclusive activities the supervisor is
/// currently in, beyond ordinary node supervision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    /// Controlling-terminal handoff in progress (spec §4.9).
    ConfigEditor,
    /// Operator attached to a node's PTY (spec §4.10).
    Snoop(u8),
}

pub struct Supervisor {
    config: Config,
    table: NodeTable,
    popups: bbsmux_core::popup::PopupStore,
    /// PTY master ends, keyed by node. A node has an entry here for
    /// exactly as long as it has a live `worker_pid` (§3 invariant 1 in
    /// reverse: no entry ⟺ `pty_master == None` on the `NodeState`).
    ptys: HashMap<u8, std::fs::File>,
    current_exe: std::path::PathBuf,
    mode: Mode,
    config_editor: Option<ConfigEditorHandoff>,
    config_editor_pid: Option<u32>,
    config_editor_exited: bool,
    selected_node: u8,
    /// BBS identity shown in the sidebar. Not specified anywhere the
    /// supervisor is meant to parse (spec §1 puts the engine's own file
    /// formats out of scope beyond the sidebar feeds already named in
    /// §6); a real deployment would source this from the engine's own
    /// config file, which is exactly the kind of "engine internals" §1
    /// excludes — recorded as a placeholder in DESIGN.md.
    identity: BbsIdentity,
    /// Whether `lastus.bbs`'s 21-byte alias field (offset 72) is
    /// meaningful, per spec §6. Same caveat as `identity`: the switch
    /// lives in the engine's own config, which is out of scope here.
    alias_mode: bool,
}

impl Supervisor {
    pub fn new(config: Config) -> io::Result<Self> {
        let run_dir = config.base_dir.join("run");
        std::fs::create_dir_all(&run_dir)?;
        let table = NodeTable::new(config.node_count, &run_dir);
        let current_exe = std::env::current_exe()?;

        Ok(Self {
            config,
            table,
            popups: bbsmux_core::popup::PopupStore::new(),
            ptys: HashMap::new(),
            current_exe,
            mode: Mode::Normal,
            config_editor: None,
            config_editor_pid: None,
            config_editor_exited: false,
            selected_node: 1,
            identity: BbsIdentity { name: "Maximus BBS".to_string(), sysop: "sysop".to_string() },
            alias_mode: false,
        })
    }

    /// Run until an operator quits (interactive mode) or the process is
    /// killed (headless mode never returns on its own).
    pub async fn run(self) -> io::Result<()> {
        if self.config.headless {
            self.run_headless().await
        } else {
            self.run_interactive().await
        }
    }

    async fn run_headless(mut self) -> io::Result<()> {
        let listener = Listener::bind(self.config.port).await.map_err(io::Error::other)?;
        let mut sigchld = signal(SignalKind::child())?;
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut ticker = time::interval(TICK_INTERVAL);

        self.spawn_all_nodes();

        loop {
            tokio::select! {
                _ = ticker.tick() => self.on_tick(Instant::now()),
                _ = sigchld.recv() => self.on_reap(Instant::now()),
                _ = sigterm.recv() => break,
                accepted = listener.accept() => self.dispatch_accept(accepted).await,
            }
        }

        self.shutdown();
        Ok(())
    }

    async fn run_interactive(mut self) -> io::Result<()> {
        let listener = Listener::bind(self.config.port).await.map_err(io::Error::other)?;
        let mut sigchld = signal(SignalKind::child())?;
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut ticker = time::interval(TICK_INTERVAL);
        let mut events = EventStream::new();

        if let Some(size) = self.config.initial_size {
            request_terminal_resize(size);
        }
        let mut terminal = init_terminal()?;

        self.spawn_all_nodes();

        let outcome: io::Result<()> = loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let now = Instant::now();
                    self.on_tick(now);
                    if let Err(e) = self.render(&mut terminal, now) {
                        break Err(e);
                    }
                }
                _ = sigchld.recv() => self.on_reap(Instant::now()),
                _ = sigterm.recv() => break Ok(()),
                accepted = listener.accept() => self.dispatch_accept(accepted).await,
                maybe_event = events.next() => {
                    match maybe_event {
                        Some(Ok(CEvent::Key(key))) if key.kind == KeyEventKind::Press => {
                            if self.dispatch_key(key) == ControlFlow::Quit {
                                break Ok(());
                            }
                        }
                        Some(Ok(_)) => {}
                        Some(Err(error)) => tracing::warn!(%error, "operator input stream error"),
                        None => break Ok(()),
                    }
                }
            }
        };

        self.shutdown();
        restore_terminal(&mut terminal)?;
        outcome
    }

    fn spawn_all_nodes(&mut self) {
        let now = Instant::now();
        for node_num in 1..=self.table.len() as u8 {
            self.try_spawn(node_num, now);
        }
    }

    async fn dispatch_accept(&mut self, accepted: io::Result<(TcpStream, SocketAddr)>) {
        match accepted {
            Ok((stream, addr)) => self.on_accept(stream, addr, Instant::now()).await,
            Err(error) => tracing::warn!(%error, "listener accept failed"),
        }
    }

    /// One supervisor tick, steps 6-8 of spec §4.8 (step 1/2/3/5/9 are
    /// handled directly in the `select!` arms above; step 4, config-editor
    /// return, is folded in here too since it's also tick-gated).
    fn on_tick(&mut self, now: Instant) {
        self.poll_nodes(now);
        // Belt-and-braces reap (module doc on `reaper::reap_all`): a
        // SIGCHLD can coalesce several exits, so re-check every tick too.
        self.on_reap(now);
        self.process_exit_pending(now);
        self.respawn_due(now);
        self.popups.tick(now);

        if self.config_editor_exited && self.mode == Mode::ConfigEditor {
            if let Err(error) = self.finish_config_editor() {
                tracing::warn!(%error, "failed to restore tty after config editor handoff");
            }
        }

        if let Mode::Snoop(node_num) = self.mode {
            self.snoop_tick(node_num);
        }
    }

    fn poll_nodes(&mut self, now: Instant) {
        let node_nums: Vec<u8> = self.table.iter().map(|n| n.node_num).collect();
        for node_num in node_nums {
            if let Some(master) = self.ptys.get_mut(&node_num) {
                if let Ok(node) = self.table.get_mut(node_num) {
                    pty_drainer::drain(master, &mut node.pty_ring);
                }
            }

            let Ok(node) = self.table.get_mut(node_num) else { continue };
            match node.status {
                NodeStatus::Starting => {
                    if node.uds_path.exists() {
                        let _ = node.uds_appeared();
                    } else if node.worker_pid.is_some_and(|pid| !pid_alive(pid)) {
                        let _ = node.demote_to_inactive();
                        self.ptys.remove(&node_num);
                    }
                }
                NodeStatus::Connected => {
                    let lastus = NodePaths::new(&self.config.base_dir, node_num).lastus;
                    if let Ok(Some(user)) = userinfo::read_current_user(&lastus, self.alias_mode) {
                        node.username = Some(user.alias.unwrap_or(user.name));
                    }
                }
                _ => {}
            }
        }
    }

    fn on_reap(&mut self, now: Instant) {
        let clock = SystemClock;
        let outcomes = reaper::reap_all(&mut self.table, self.config_editor_pid, DEFAULT_MARKERS, &clock);
        for outcome in outcomes {
            match outcome {
                ReapOutcome::ConfigEditorExited => self.config_editor_exited = true,
                ReapOutcome::WorkerExited { node, signature: Some(signature) } => {
                    let alert = PopupAlert {
                        signature: signature.clone(),
                        title: format!("Node {node:02} failed"),
                        body: signature,
                    };
                    self.popups.post(alert, now);
                }
                ReapOutcome::WorkerExited { .. } | ReapOutcome::BridgeExited { .. } => {}
                ReapOutcome::Unrecognized { pid } => tracing::debug!(pid, "reaped an unrecognized child"),
            }
        }
    }

    /// Step 7: close PTY/unlink rendezvous for every node whose reaper
    /// flagged an exit this tick.
    fn process_exit_pending(&mut self, now: Instant) {
        let _ = now;
        let node_nums: Vec<u8> = self.table.iter().map(|n| n.node_num).collect();
        for node_num in node_nums {
            let Ok(node) = self.table.get_mut(node_num) else { continue };
            if !node.exit_pending {
                continue;
            }
            let was_stopping = node.status == NodeStatus::Stopping;
            node.consume_exit_pending();

            self.ptys.remove(&node_num);
            let node_paths = NodePaths::new(&self.config.base_dir, node_num);
            if let Err(error) = paths::clear_stale(&node_paths) {
                tracing::warn!(node = node_num, %error, "failed to unlink rendezvous files");
            }

            if was_stopping {
                if let Ok(node) = self.table.get_mut(node_num) {
                    let _ = node.stopped_cleanly();
                }
            }
        }
    }

    /// Step 8: respawn every `INACTIVE` node, and every `FAILED` node
    /// whose back-off has elapsed.
    fn respawn_due(&mut self, now: Instant) {
        let due: Vec<u8> = self
            .table
            .iter()
            .filter(|n| n.status == NodeStatus::Inactive || n.retry_due(now))
            .map(|n| n.node_num)
            .collect();
        for node_num in due {
            self.try_spawn(node_num, now);
        }
    }

    fn try_spawn(&mut self, node_num: u8, now: Instant) {
        match crate::spawner::spawn_node(node_num, &self.config.base_dir, &self.config.engine_path, &self.config.config_path) {
            Ok(worker) => {
                let master_fd = worker.master.as_raw_fd();
                self.ptys.insert(node_num, worker.master);
                if let Ok(node) = self.table.get_mut(node_num) {
                    node.spawn_started(worker.pid, master_fd, now);
                }
                tracing::info!(node = node_num, pid = worker.pid, "spawned engine worker");
            }
            Err(error) => {
                let error = DaemonError::SpawnFailed { node: node_num, source: error };
                tracing::warn!(node = node_num, %error, "failed to spawn engine worker, node stays INACTIVE");
            }
        }
    }

    async fn on_accept(&mut self, stream: TcpStream, addr: SocketAddr, now: Instant) {
        let Some(node_num) = self.table.first_free(|p| p.exists()) else {
            listener::refuse(stream).await;
            return;
        };

        let node_paths = NodePaths::new(&self.config.base_dir, node_num);
        match bridge::spawn_bridge(&self.current_exe, node_num, &node_paths.uds, &node_paths.termcap, stream) {
            Ok(pid) => {
                if let Ok(node) = self.table.get_mut(node_num) {
                    let _ = node.admitted(pid, format!("Connected from {addr}"), now);
                }
            }
            Err(error) => {
                let error = DaemonError::BridgeSpawnFailed { node: node_num, source: error };
                tracing::warn!(node = node_num, %error, "failed to spawn bridge for admitted caller");
            }
        }
    }

    fn dispatch_key(&mut self, key: KeyEvent) -> ControlFlow {
        if let Mode::Snoop(node_num) = self.mode {
            self.snoop_key(node_num, key);
            return ControlFlow::Continue;
        }
        if self.mode == Mode::ConfigEditor {
            // Step 4 of spec §4.9: the supervisor reads no operator keys
            // while the editor owns the tty.
            return ControlFlow::Continue;
        }
        if self.popups.current().is_some() {
            self.popups.dismiss();
            return ControlFlow::Continue;
        }

        match key.code {
            KeyCode::Char('q' | 'Q') => ControlFlow::Quit,
            KeyCode::Char('k' | 'K') => {
                self.kill_node(self.selected_node);
                ControlFlow::Continue
            }
            KeyCode::Char('r' | 'R') => {
                self.restart_node(self.selected_node);
                ControlFlow::Continue
            }
            KeyCode::Char('s' | 'S') => {
                self.start_snoop(self.selected_node);
                ControlFlow::Continue
            }
            KeyCode::Char('c' | 'C') => {
                self.start_config_editor();
                ControlFlow::Continue
            }
            KeyCode::Tab => {
                self.select_next_node();
                ControlFlow::Continue
            }
            KeyCode::Char(c) if c.is_ascii_digit() && c != '0' => {
                if let Some(n) = c.to_digit(10) {
                    if (n as usize) <= self.table.len() {
                        self.selected_node = n as u8;
                    }
                }
                ControlFlow::Continue
            }
            _ => ControlFlow::Continue,
        }
    }

    fn select_next_node(&mut self) {
        let len = self.table.len() as u8;
        self.selected_node = if self.selected_node >= len { 1 } else { self.selected_node + 1 };
    }

    /// `any-active -> STOPPING`, per spec §4.1: SIGTERM now, SIGKILL after
    /// a bounded grace. A node with nothing live is left alone — "kill on
    /// an already-inactive node is a no-op with no user-visible error"
    /// (spec §7) falls out of `operator_kill` only transitioning active
    /// states and there being no pid to signal.
    fn kill_node(&mut self, node_num: u8) {
        let Ok(node) = self.table.get_mut(node_num) else { return };
        let worker_pid = node.worker_pid;
        let bridge_pid = node.bridge_pid;
        node.operator_kill();
        if let Some(pid) = bridge_pid {
            terminate_with_grace(pid);
        }
        if let Some(pid) = worker_pid {
            terminate_with_grace(pid);
        }
    }

    /// `FAILED -> STARTING` (or `INACTIVE -> STARTING` if not currently
    /// failed): reset back-off bookkeeping so the node respawns on the
    /// very next tick, per spec §4.1's "on manual restart, `retry_count`
    /// is reset first".
    fn restart_node(&mut self, node_num: u8) {
        if let Ok(node) = self.table.get_mut(node_num) {
            node.manual_restart();
        }
    }

    fn start_snoop(&mut self, node_num: u8) {
        if self.mode != Mode::Normal {
            return;
        }
        if let Ok(node) = self.table.get(node_num) {
            if node.status == NodeStatus::Connected {
                self.mode = Mode::Snoop(node_num);
            }
        }
    }

    fn snoop_tick(&mut self, node_num: u8) {
        let Some(master) = self.ptys.get_mut(&node_num) else {
            self.mode = Mode::Normal;
            return;
        };
        let mut stdout = io::stdout();
        match snoop::drain_to_stdout(master, &mut stdout) {
            Ok(_) => {}
            Err(error) => tracing::warn!(node = node_num, %error, "snoop drain failed"),
        }
    }

    fn snoop_key(&mut self, node_num: u8, key: KeyEvent) {
        match snoop::handle_key(&key) {
            SnoopCommand::Detach => self.mode = Mode::Normal,
            SnoopCommand::ResetEngine => self.write_to_pty(node_num, snoop::ENGINE_RESET_SEQUENCE),
            SnoopCommand::Forward(bytes) => self.write_to_pty(node_num, &bytes),
        }
    }

    fn write_to_pty(&mut self, node_num: u8, bytes: &[u8]) {
        use std::io::Write;
        if let Some(master) = self.ptys.get_mut(&node_num) {
            let _ = master.write_all(bytes);
        }
    }

    fn start_config_editor(&mut self) {
        if self.mode != Mode::Normal {
            return;
        }
        match config_editor::launch(&self.config.config_editor_path, &self.config.base_dir, &self.config.config_path) {
            Ok(handoff) => {
                self.config_editor_pid = Some(handoff.pid);
                self.config_editor = Some(handoff);
                self.config_editor_exited = false;
                self.mode = Mode::ConfigEditor;
            }
            Err(error) => tracing::warn!(%error, "failed to launch config editor"),
        }
    }

    fn finish_config_editor(&mut self) -> io::Result<()> {
        if let Some(handoff) = self.config_editor.take() {
            config_editor::restore(handoff)?;
        }
        self.config_editor_pid = None;
        self.config_editor_exited = false;
        self.mode = Mode::Normal;
        Ok(())
    }

    fn render(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>, now: Instant) -> io::Result<()> {
        if matches!(self.mode, Mode::Snoop(_)) {
            return Ok(());
        }

        let callers = callers::read_recent(&paths::callers_log(&self.config.base_dir), 10).unwrap_or_default();
        let bbstat_path = NodePaths::new(&self.config.base_dir, 1).bbstat;
        let stats = userinfo::read_bbs_stats(&bbstat_path).unwrap_or_default();
        let current_user = self.table.get(self.selected_node).ok().and_then(|node| {
            if matches!(node.status, NodeStatus::Wfc | NodeStatus::Connected) {
                let lastus = NodePaths::new(&self.config.base_dir, self.selected_node).lastus;
                userinfo::read_current_user(&lastus, self.alias_mode).ok().flatten()
            } else {
                None
            }
        });

        let view = DashboardView {
            identity: &self.identity,
            stats: &stats,
            current_user: current_user.as_ref(),
            callers: &callers,
            popup: self.popups.current(),
            selected_node: self.selected_node,
            config_mode: self.mode == Mode::ConfigEditor,
        };

        terminal.draw(|frame| tui::draw(frame, &self.table, &view, now))?;
        Ok(())
    }

    /// Cancellation, per spec §5: close the listener (dropped with
    /// `self`), best-effort SIGKILL every live child, close PTYs, unlink
    /// rendezvous. No grace period on shutdown.
    fn shutdown(&mut self) {
        let node_nums: Vec<u8> = self.table.iter().map(|n| n.node_num).collect();
        for node_num in node_nums {
            if let Ok(node) = self.table.get_mut(node_num) {
                if let Some(pid) = node.bridge_pid.take() {
                    let _ = kill(Pid::from_raw(pid as i32), Signal::SIGKILL);
                }
                if let Some(pid) = node.worker_pid.take() {
                    let _ = kill(Pid::from_raw(pid as i32), Signal::SIGKILL);
                }
            }
            self.ptys.remove(&node_num);
            let node_paths = NodePaths::new(&self.config.base_dir, node_num);
            let _ = paths::clear_stale(&node_paths);
        }
    }
}

fn pid_alive(pid: u32) -> bool {
    kill(Pid::from_raw(pid as i32), None).is_ok()
}

fn terminate_with_grace(pid: u32) {
    let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
    tokio::spawn(async move {
        time::sleep(KILL_GRACE).await;
        let _ = kill(Pid::from_raw(pid as i32), Signal::SIGKILL);
    });
}

/// Spec §6's `-s CxR`: ask the real terminal to resize itself via the
/// xterm `CSI 8 ; rows ; cols t` window-manipulation sequence, before the
/// TUI claims the alternate screen. Best-effort: a terminal that doesn't
/// understand the sequence just ignores it.
fn request_terminal_resize(size: crate::cli::SizeRequest) {
    use std::io::Write;
    let sequence = format!("\x1b[8;{};{}t", size.rows, size.cols);
    let mut stdout = io::stdout();
    let _ = stdout.write_all(sequence.as_bytes());
    let _ = stdout.flush();
}

fn init_terminal() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
