//! Scripted collaborators for unit tests: engine, engine factory, tool
//! transport and memory store opener.

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::engine::{
    ChatMetrics, ChatResponse, EngineConfig, EngineError, EngineFactory, InferenceEngine,
    TokenUsage,
};
use crate::lock_or_recover;
use crate::mcp_client::{
    McpError, ToolDescriptor, ToolServerConfig, ToolServerPool, ToolServerSummary, ToolTransport,
    ToolTransportFactory, TransportDescriptor,
};
use crate::memory::{
    ContextDatabaseHandle, ContextStoreOpener, MemoryError, SqliteStoreOpener,
};

// ─── Gate ────────────────────────────────────────────────────────────────────

/// One-shot rendezvous: the engine parks inside a call until the test
/// releases it.
#[derive(Default)]
pub(crate) struct Gate {
    state: Mutex<(bool, bool)>,
    cv: Condvar,
}

impl Gate {
    fn enter_and_wait(&self) {
        let mut state = lock_or_recover(&self.state);
        state.0 = true;
        self.cv.notify_all();
        while !state.1 {
            state = self.cv.wait(state).unwrap();
        }
    }

    pub(crate) fn wait_entered(&self) {
        let mut state = lock_or_recover(&self.state);
        while !state.0 {
            state = self.cv.wait(state).unwrap();
        }
    }

    pub(crate) fn release(&self) {
        lock_or_recover(&self.state).1 = true;
        self.cv.notify_all();
    }
}

// ─── FakeEngine ──────────────────────────────────────────────────────────────

/// Echoes the prompt back, word by word.
pub(crate) struct FakeEngine {
    pub(crate) config: EngineConfig,
    history: Mutex<Vec<String>>,
    database: Mutex<Option<ContextDatabaseHandle>>,
    pool: ToolServerPool,
    in_flight: AtomicUsize,
    pub(crate) max_in_flight: AtomicUsize,
    fail_chat: AtomicBool,
    panic_in_stream: AtomicBool,
    chat_delay_ms: AtomicU64,
    gate: Mutex<Option<Arc<Gate>>>,
}

impl FakeEngine {
    fn new(config: EngineConfig, transports: Arc<FakeTransportFactory>) -> Self {
        Self {
            config,
            history: Mutex::new(Vec::new()),
            database: Mutex::new(None),
            pool: ToolServerPool::new(transports),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            fail_chat: AtomicBool::new(false),
            panic_in_stream: AtomicBool::new(false),
            chat_delay_ms: AtomicU64::new(0),
            gate: Mutex::new(None),
        }
    }

    pub(crate) fn fail_chat(&self, fail: bool) {
        self.fail_chat.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn panic_in_stream(&self, panic: bool) {
        self.panic_in_stream.store(panic, Ordering::SeqCst);
    }

    pub(crate) fn set_chat_delay_ms(&self, ms: u64) {
        self.chat_delay_ms.store(ms, Ordering::SeqCst);
    }

    pub(crate) fn set_gate(&self, gate: Arc<Gate>) {
        *lock_or_recover(&self.gate) = Some(gate);
    }

    pub(crate) fn history_len(&self) -> usize {
        lock_or_recover(&self.history).len()
    }

    pub(crate) fn history(&self) -> Vec<String> {
        lock_or_recover(&self.history).clone()
    }

    pub(crate) fn database(&self) -> Option<ContextDatabaseHandle> {
        lock_or_recover(&self.database).clone()
    }

    pub(crate) fn has_database(&self) -> bool {
        self.database().is_some()
    }

    fn run_turn(
        &self,
        message: &str,
        on_token: &mut dyn FnMut(&str),
    ) -> Result<ChatResponse, EngineError> {
        let started = Instant::now();
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let gate = lock_or_recover(&self.gate).take();
        if let Some(gate) = gate {
            gate.enter_and_wait();
        }
        let delay = self.chat_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            std::thread::sleep(Duration::from_millis(delay));
        }

        let result = if self.fail_chat.load(Ordering::SeqCst) {
            Err(EngineError::GenerationFailed {
                reason: "scripted failure".into(),
            })
        } else {
            let text = format!("echo: {message}");
            for (i, word) in text.split(' ').enumerate() {
                if i == 0 {
                    on_token(word);
                } else {
                    on_token(&format!(" {word}"));
                }
            }
            lock_or_recover(&self.history).push(message.to_string());
            if let Some(db) = self.database() {
                let _ = db.remember("user", message);
            }
            let prompt = message.split_whitespace().count() as u32;
            let completion = text.split_whitespace().count() as u32;
            Ok(ChatResponse {
                text,
                usage: TokenUsage::new(prompt, completion),
                metrics: ChatMetrics {
                    latency_ms: started.elapsed().as_millis() as u64,
                    time_to_first_token_ms: 0,
                    tokens_per_second: 0.0,
                },
            })
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

impl InferenceEngine for FakeEngine {
    fn chat(&self, message: &str) -> Result<ChatResponse, EngineError> {
        self.run_turn(message, &mut |_| {})
    }

    fn chat_stream(
        &self,
        message: &str,
        on_token: &mut dyn FnMut(&str),
    ) -> Result<ChatResponse, EngineError> {
        if self.panic_in_stream.load(Ordering::SeqCst) {
            on_token("partial");
            panic!("scripted engine panic");
        }
        self.run_turn(message, on_token)
    }

    fn clear_history(&self) {
        lock_or_recover(&self.history).clear();
    }

    fn set_context_database(&self, database: Option<ContextDatabaseHandle>) {
        *lock_or_recover(&self.database) = database;
    }

    fn add_tool_server(&self, config: ToolServerConfig) -> Result<(), EngineError> {
        self.pool.add(config)?;
        Ok(())
    }

    fn remove_tool_server(&self, server_id: &str) -> Result<(), EngineError> {
        self.pool.remove(server_id)?;
        Ok(())
    }

    fn get_tool_server(&self, server_id: &str) -> Option<ToolServerSummary> {
        self.pool.summary(server_id)
    }

    fn discover_tools(&self, server_id: &str) -> Result<Vec<ToolDescriptor>, EngineError> {
        Ok(self.pool.discover(server_id)?)
    }
}

// ─── FakeFactory ─────────────────────────────────────────────────────────────

pub(crate) struct FakeFactory {
    fail_next: AtomicBool,
    transports: Arc<FakeTransportFactory>,
    created: Mutex<Vec<Arc<FakeEngine>>>,
}

impl Default for FakeFactory {
    fn default() -> Self {
        Self {
            fail_next: AtomicBool::new(false),
            transports: Arc::new(FakeTransportFactory::new(&["read_file", "write_file"])),
            created: Mutex::new(Vec::new()),
        }
    }
}

impl FakeFactory {
    /// Make the next `create` call fail.
    pub(crate) fn fail_next(&self, fail: bool) {
        self.fail_next.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn transports(&self) -> &FakeTransportFactory {
        &self.transports
    }

    pub(crate) fn last_engine(&self) -> Option<Arc<FakeEngine>> {
        lock_or_recover(&self.created).last().cloned()
    }

    pub(crate) fn last_config(&self) -> Option<EngineConfig> {
        self.last_engine().map(|engine| engine.config.clone())
    }
}

impl EngineFactory for FakeFactory {
    fn create(&self, config: &EngineConfig) -> Result<Arc<dyn InferenceEngine>, EngineError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(EngineError::LoadFailed {
                model_path: config.model_path.display().to_string(),
                reason: "scripted load failure".into(),
            });
        }
        let engine = Arc::new(FakeEngine::new(config.clone(), self.transports.clone()));
        lock_or_recover(&self.created).push(engine.clone());
        Ok(engine)
    }
}

// ─── FakeTransport ───────────────────────────────────────────────────────────

#[derive(Default)]
struct TransportScript {
    tools: Mutex<Vec<String>>,
    failing_commands: Mutex<HashSet<String>>,
    fail_discovery: AtomicBool,
    discoveries_left: Mutex<Option<usize>>,
    live: AtomicUsize,
}

pub(crate) struct FakeTransportFactory {
    script: Arc<TransportScript>,
}

impl FakeTransportFactory {
    pub(crate) fn new(tools: &[&str]) -> Self {
        let factory = Self {
            script: Arc::new(TransportScript::default()),
        };
        factory.set_tools(tools);
        factory
    }

    pub(crate) fn set_tools(&self, tools: &[&str]) {
        *lock_or_recover(&self.script.tools) = tools.iter().map(|t| t.to_string()).collect();
    }

    /// Connecting with this command (or endpoint) fails.
    pub(crate) fn fail_command(&self, command: &str) {
        lock_or_recover(&self.script.failing_commands).insert(command.to_string());
    }

    pub(crate) fn clear_failures(&self) {
        lock_or_recover(&self.script.failing_commands).clear();
    }

    pub(crate) fn set_discovery_failure(&self, fail: bool) {
        self.script.fail_discovery.store(fail, Ordering::SeqCst);
    }

    /// Let the next `n` discoveries succeed and fail every one after.
    pub(crate) fn limit_discoveries(&self, n: usize) {
        *lock_or_recover(&self.script.discoveries_left) = Some(n);
    }

    pub(crate) fn live_connections(&self) -> usize {
        self.script.live.load(Ordering::SeqCst)
    }
}

impl ToolTransportFactory for FakeTransportFactory {
    fn create(&self, config: &ToolServerConfig) -> Result<Box<dyn ToolTransport>, McpError> {
        let target = match &config.transport {
            TransportDescriptor::Stdio { command, .. } => command.clone(),
            TransportDescriptor::HttpStream { endpoint } => endpoint.clone(),
        };
        Ok(Box::new(FakeTransport {
            server_id: config.server_id.clone(),
            target,
            connected: false,
            script: self.script.clone(),
        }))
    }
}

struct FakeTransport {
    server_id: String,
    target: String,
    connected: bool,
    script: Arc<TransportScript>,
}

impl ToolTransport for FakeTransport {
    fn connect(&mut self) -> Result<(), McpError> {
        if lock_or_recover(&self.script.failing_commands).contains(&self.target) {
            return Err(McpError::ConnectFailed {
                server: self.server_id.clone(),
                reason: format!("cannot launch '{}'", self.target),
            });
        }
        if !self.connected {
            self.connected = true;
            self.script.live.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), McpError> {
        if self.connected {
            self.connected = false;
            self.script.live.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn discover_tools(&mut self) -> Result<Vec<ToolDescriptor>, McpError> {
        let exhausted = match lock_or_recover(&self.script.discoveries_left).as_mut() {
            Some(0) => true,
            Some(left) => {
                *left -= 1;
                false
            }
            None => false,
        };
        if exhausted || self.script.fail_discovery.load(Ordering::SeqCst) {
            return Err(McpError::DiscoveryFailed {
                server: self.server_id.clone(),
                reason: "scripted discovery failure".into(),
            });
        }
        Ok(lock_or_recover(&self.script.tools)
            .iter()
            .map(|name| ToolDescriptor {
                name: name.clone(),
                description: format!("{name} tool"),
                input_schema: serde_json::json!({ "type": "object" }),
            })
            .collect())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

// ─── ScriptedOpener ──────────────────────────────────────────────────────────

/// SQLite opener that can be told to refuse.
#[derive(Default)]
pub(crate) struct ScriptedOpener {
    pub(crate) fail: AtomicBool,
}

impl ContextStoreOpener for ScriptedOpener {
    fn open(&self, path: &Path) -> Result<ContextDatabaseHandle, MemoryError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(MemoryError::IoError {
                path: path.display().to_string(),
                reason: "scripted open failure".into(),
            });
        }
        SqliteStoreOpener.open(path)
    }
}

// ─── Runtime fixture ─────────────────────────────────────────────────────────

/// A runtime over fakes with one model file (`tiny`) on disk.
pub(crate) struct TestRuntime {
    pub(crate) dir: tempfile::TempDir,
    pub(crate) runtime: Arc<crate::Runtime>,
    pub(crate) factory: Arc<FakeFactory>,
    pub(crate) opener: Arc<ScriptedOpener>,
    pub(crate) model_path: std::path::PathBuf,
}

pub(crate) fn test_runtime() -> TestRuntime {
    let dir = tempfile::tempdir().expect("tempdir");
    let model_path = dir.path().join("tiny.gguf");
    std::fs::write(&model_path, b"GGUF").expect("write model");

    let factory = Arc::new(FakeFactory::default());
    let opener = Arc::new(ScriptedOpener::default());
    let settings = crate::RuntimeSettings {
        memory_db_path: dir.path().join("memory.db"),
        ..crate::RuntimeSettings::default()
    };
    let runtime = Arc::new(crate::Runtime::new(settings, factory.clone(), opener.clone()));
    TestRuntime {
        dir,
        runtime,
        factory,
        opener,
        model_path,
    }
}
