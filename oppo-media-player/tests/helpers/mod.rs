//! A fake Oppo player speaking the telnet command protocol on localhost

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Device-side state the fake player keeps between connections
#[derive(Debug, Clone)]
pub struct DeviceState {
    pub powered: bool,
    pub volume: u8,
    pub muted: bool,
    pub transport: &'static str,
    pub commands: Vec<String>,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            powered: false,
            volume: 20,
            muted: false,
            transport: "STOP",
            commands: Vec::new(),
        }
    }
}

pub struct FakeOppo {
    pub port: u16,
    pub state: Arc<Mutex<DeviceState>>,
    task: JoinHandle<()>,
}

impl FakeOppo {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let state = Arc::new(Mutex::new(DeviceState::default()));

        let shared = Arc::clone(&state);
        let task = tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                tokio::spawn(handle_connection(socket, Arc::clone(&shared)));
            }
        });

        Self { port, state, task }
    }

    pub fn snapshot(&self) -> DeviceState {
        self.state.lock().unwrap().clone()
    }

    pub fn set_transport(&self, transport: &'static str) {
        self.state.lock().unwrap().transport = transport;
    }

    pub fn commands(&self) -> Vec<String> {
        self.snapshot().commands
    }

    /// Wait until the device has handled `count` commands.
    ///
    /// Fire-and-forget commands return before the device has processed them.
    pub async fn wait_for_commands(&self, count: usize) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while self.state.lock().unwrap().commands.len() < count {
            assert!(
                tokio::time::Instant::now() < deadline,
                "device handled {:?}, expected {} commands",
                self.commands(),
                count
            );
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

impl Drop for FakeOppo {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn handle_connection(mut socket: TcpStream, state: Arc<Mutex<DeviceState>>) {
    let mut command = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        match socket.read(&mut byte).await {
            Ok(1) if byte[0] == b'\r' => break,
            Ok(1) => command.push(byte[0]),
            _ => return,
        }
    }

    let command = String::from_utf8_lossy(&command).to_string();
    let reply = respond(&command, &mut state.lock().unwrap());

    // Clients that don't expect a response may already be gone
    let _ = socket.write_all(format!("{}\r\n", reply).as_bytes()).await;
}

fn respond(command: &str, state: &mut DeviceState) -> String {
    state.commands.push(command.to_string());

    let mut parts = command.split_whitespace();
    let code = parts.next().unwrap_or_default();

    match code {
        "#QPW" => format!("@OK {}", if state.powered { "ON" } else { "OFF" }),
        "#PON" => {
            state.powered = true;
            "@OK ON".to_string()
        }
        "#POF" => {
            state.powered = false;
            state.transport = "STOP";
            "@OK OFF".to_string()
        }
        "#VOL" => format!("@OK {}", state.volume),
        "#SVL" => match parts.next().and_then(|v| v.parse::<u8>().ok()) {
            Some(level) if level <= 100 => {
                state.volume = level;
                format!("@OK {}", level)
            }
            _ => "@ER PARAMETER".to_string(),
        },
        "#MUT" => {
            state.muted = !state.muted;
            format!("@OK {}", if state.muted { "MUTE" } else { "UNMUTE" })
        }
        "#PLA" => {
            state.transport = "PLAY";
            "@OK PLAY".to_string()
        }
        "#PAU" => {
            state.transport = "PAUSE";
            "@OK PAUSE".to_string()
        }
        "#STP" => {
            state.transport = "STOP";
            "@OK STOP".to_string()
        }
        "#QPL" if !state.powered => "@OK OFF".to_string(),
        "#QPL" => format!("@OK {}", state.transport),
        "#NXT" | "#PRE" => "@OK".to_string(),
        _ => "@ER INVALID".to_string(),
    }
}
