//! Test-only fakes for the agent, model, and search seams, plus a loopback HTTP stub.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::{Result, anyhow};
use tempfile::TempDir;

use crate::core::types::{AgentInput, AgentOutput};
use crate::io::agent::AgentRunner;
use crate::io::llm::ChatModel;
use crate::io::search::SearchTool;
use crate::io::store::ContextStore;

/// Agent runner that replays a fixed queue of outputs or failures.
pub struct ScriptedAgent {
    replies: RefCell<VecDeque<Result<String, String>>>,
    inputs: RefCell<Vec<String>>,
}

impl ScriptedAgent {
    /// `Ok(text)` is returned as output; `Err(msg)` becomes an agent error.
    pub fn new(replies: Vec<Result<String, String>>) -> Self {
        Self {
            replies: RefCell::new(replies.into()),
            inputs: RefCell::new(Vec::new()),
        }
    }

    pub fn outputs(outputs: Vec<String>) -> Self {
        Self::new(outputs.into_iter().map(Ok).collect())
    }

    pub fn failures(messages: Vec<&str>) -> Self {
        Self::new(messages.into_iter().map(|m| Err(m.to_string())).collect())
    }

    /// Every `input` the agent was called with, in order.
    pub fn inputs(&self) -> Vec<String> {
        self.inputs.borrow().clone()
    }

    pub fn assert_drained(&self) -> Result<()> {
        let left = self.replies.borrow().len();
        if left > 0 {
            return Err(anyhow!("{left} scripted agent replies were not consumed"));
        }
        Ok(())
    }
}

impl AgentRunner for ScriptedAgent {
    fn run(&self, input: &AgentInput) -> Result<AgentOutput> {
        self.inputs.borrow_mut().push(input.input.clone());
        match self.replies.borrow_mut().pop_front() {
            Some(Ok(output)) => Ok(AgentOutput::new(output)),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("no scripted agent reply left")),
        }
    }
}

/// Chat model that replays canned replies and records prompts.
pub struct ScriptedChat {
    replies: RefCell<VecDeque<String>>,
    prompts: RefCell<Vec<String>>,
    stops: RefCell<Vec<String>>,
}

impl ScriptedChat {
    pub fn new(replies: Vec<&str>) -> Self {
        Self {
            replies: RefCell::new(replies.into_iter().map(str::to_string).collect()),
            prompts: RefCell::new(Vec::new()),
            stops: RefCell::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }

    /// Stop sequences from every call, flattened in call order.
    pub fn stops(&self) -> Vec<String> {
        self.stops.borrow().clone()
    }

    pub fn assert_drained(&self) -> Result<()> {
        let left = self.replies.borrow().len();
        if left > 0 {
            return Err(anyhow!("{left} scripted chat replies were not consumed"));
        }
        Ok(())
    }
}

impl ChatModel for ScriptedChat {
    fn complete(&self, prompt: &str, stop: &[&str]) -> Result<String> {
        self.prompts.borrow_mut().push(prompt.to_string());
        self.stops
            .borrow_mut()
            .extend(stop.iter().map(|s| s.to_string()));
        self.replies
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow!("no scripted chat reply left"))
    }
}

/// Search tool that always returns the same observation or the same failure.
pub struct ScriptedSearch {
    result: Result<String, String>,
    queries: RefCell<Vec<String>>,
}

impl ScriptedSearch {
    pub fn new(result: &str) -> Self {
        Self {
            result: Ok(result.to_string()),
            queries: RefCell::new(Vec::new()),
        }
    }

    /// Every call fails with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
            queries: RefCell::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.borrow().clone()
    }
}

impl SearchTool for ScriptedSearch {
    fn search(&self, query: &str) -> Result<String> {
        self.queries.borrow_mut().push(query.to_string());
        self.result.clone().map_err(|message| anyhow!(message))
    }
}

/// A plan document inside a throwaway directory.
pub struct TempPlan {
    dir: TempDir,
    pub store: ContextStore,
}

impl TempPlan {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let store = ContextStore::new(dir.path().join("micro_saas_plan.md"));
        Ok(Self { dir, store })
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Current file contents.
    pub fn read(&self) -> Result<String> {
        Ok(fs::read_to_string(self.store.path())?)
    }
}

/// Deterministic sentinel-free chunk comfortably above the length threshold.
pub fn long_chunk(label: &str) -> String {
    format!("## {label}\n{label} section: detailed notes drawn from repeated customer interviews.")
}

/// Answer the first request on a loopback port with `status_line` and `body`.
///
/// Returns the base URL (`http://127.0.0.1:<port>`).
pub fn serve_once(status_line: &str, body: &str) -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    let response = format!(
        "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let _ = read_request(&mut stream);
            let _ = stream.write_all(response.as_bytes());
        }
    });
    Ok(format!("http://{addr}"))
}

/// Accept the first connection and hold it open for `hold` without answering.
pub fn serve_silence(hold: Duration) -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let _ = read_request(&mut stream);
            thread::sleep(hold);
        }
    });
    Ok(format!("http://{addr}"))
}

/// Read one request: headers, then `Content-Length` bytes of body.
fn read_request(stream: &mut TcpStream) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let headers = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
        let body_len = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if buf.len() >= end + 4 + body_len {
            return Ok(());
        }
    }
}
