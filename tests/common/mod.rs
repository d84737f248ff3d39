#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt, DuplexStream};
use vaheat::adapters::LineTransport;
use vaheat::core::discovery::{VAHEAT_PID, VAHEAT_VID};
use vaheat::core::Connector;
use vaheat::{DeviceSettings, PortInfo, Result, Vaheat, VaheatError};

pub const SERIAL_NUMBER: &str = "VH-0001";

/// 模擬 VAHEAT 韌體的回應
#[derive(Clone)]
pub struct FakeDevice {
    pub alarm: Arc<Mutex<String>>,
    pub received: Arc<Mutex<Vec<Value>>>,
    pub released: Arc<AtomicBool>,
    pub silent: Arc<AtomicBool>,
}

impl FakeDevice {
    pub fn new() -> Self {
        Self {
            alarm: Arc::new(Mutex::new("NO_ALARM".to_string())),
            received: Arc::new(Mutex::new(Vec::new())),
            released: Arc::new(AtomicBool::new(false)),
            silent: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set_alarm(&self, alarm: &str) {
        *self.alarm.lock().unwrap() = alarm.to_string();
    }

    /// Stops answering; requests are still recorded.
    pub fn set_silent(&self, silent: bool) {
        self.silent.store(silent, Ordering::SeqCst);
    }

    pub fn received(&self) -> Vec<Value> {
        self.received.lock().unwrap().clone()
    }

    pub fn received_commands(&self) -> Vec<String> {
        self.received()
            .iter()
            .filter_map(|value| value.as_object()?.keys().next().cloned())
            .collect()
    }

    pub async fn wait_released(&self) -> bool {
        for _ in 0..100 {
            if self.released.load(Ordering::SeqCst) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    fn reply(&self, request: &Value) -> String {
        let Some((command, data)) = request.as_object().and_then(|map| map.iter().next()) else {
            return json!({"error": "bad request"}).to_string();
        };

        match command.as_str() {
            "get_info" => json!({
                "success": true,
                "data": {"serial_number": SERIAL_NUMBER, "firmware": "1.4.2", "model": "VAHEAT"}
            })
            .to_string(),
            "get_status" => json!({
                "success": true,
                "data": {
                    "alarm": *self.alarm.lock().unwrap(),
                    "mode": "auto",
                    "onoff": false,
                    "temperature": 24.8
                }
            })
            .to_string(),
            "get_settings" => json!({
                "success": true,
                "data": {"brightness": 7, "haptic_strength": 3, "pid": {"p": 150, "i": 70, "d": 0}}
            })
            .to_string(),
            // 韌體在這兩個指令少了逗號
            "get_streaming" => [
                "{",
                "  \"success\": true",
                "  \"data\": {",
                "    \"mode\": \"off\"",
                "    \"rate\": 10.7",
                "    \"temperature\": true",
                "  }",
                "}",
            ]
            .join("\r\n"),
            "get_profile" if data.get("step").is_some() => [
                "{",
                "  \"success\": true",
                "  \"data\": {",
                "    \"duration\": 60.0",
                "    \"rate\": 1.5",
                "    \"setpoint\": 80.0",
                "  }",
                "}",
            ]
            .join("\r\n"),
            "get_profile" => json!({
                "success": true,
                "data": {"profile_number": data["profile_number"], "name": "ramp", "steps": 2}
            })
            .to_string(),
            "set_settings" if data.get("brightness").and_then(Value::as_i64) > Some(10) => {
                json!({"success": false, "error": "brightness out of range"}).to_string()
            }
            "start_heating" | "stop_heating" | "set_mode" | "set_settings" | "set_streaming"
            | "set_profile" | "do_reset" | "set_keylock" => json!({"success": true}).to_string(),
            _ => json!({"error": "unknown command"}).to_string(),
        }
    }

    async fn serve(self, mut stream: DuplexStream) {
        let mut buffer: Vec<u8> = Vec::new();
        let mut chunk = [0u8; 512];
        loop {
            let n = match stream.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(n) => n,
            };
            buffer.extend_from_slice(&chunk[..n]);

            loop {
                let mut values =
                    serde_json::Deserializer::from_slice(&buffer).into_iter::<Value>();
                let Some(Ok(request)) = values.next() else {
                    break;
                };
                let consumed = values.byte_offset();
                buffer.drain(..consumed);

                self.received.lock().unwrap().push(request.clone());
                if self.silent.load(Ordering::SeqCst) {
                    continue;
                }
                let reply = format!("{}\r\n", self.reply(&request));
                if stream.write_all(reply.as_bytes()).await.is_err() {
                    break;
                }
            }
        }
        self.released.store(true, Ordering::SeqCst);
    }
}

/// Connector whose ports are in-memory pipes to a [`FakeDevice`].
pub struct FakeConnector {
    pub device: FakeDevice,
    pub ports: Vec<PortInfo>,
    pub opened: Arc<Mutex<Vec<String>>>,
    pub failing_opens: Arc<AtomicU32>,
}

impl FakeConnector {
    pub fn new(device: FakeDevice) -> Self {
        Self {
            device,
            ports: vec![
                PortInfo::usb("/dev/ttyUSB0", 0x0403, 0x6001),
                PortInfo::usb("/dev/ttyACM0", VAHEAT_VID, VAHEAT_PID),
            ],
            opened: Arc::new(Mutex::new(Vec::new())),
            failing_opens: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn with_ports(mut self, ports: Vec<PortInfo>) -> Self {
        self.ports = ports;
        self
    }

    pub fn fail_next_opens(self, count: u32) -> Self {
        self.failing_opens.store(count, Ordering::SeqCst);
        self
    }
}

#[async_trait]
impl Connector for FakeConnector {
    type Transport = LineTransport<DuplexStream>;

    fn list_ports(&self) -> Result<Vec<PortInfo>> {
        Ok(self.ports.clone())
    }

    async fn open(&self, port: &str, settings: &DeviceSettings) -> Result<Self::Transport> {
        let remaining = self.failing_opens.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_opens.store(remaining - 1, Ordering::SeqCst);
            return Err(VaheatError::PortOpen {
                port: port.to_string(),
                reason: "Device or resource busy".to_string(),
            });
        }

        self.opened.lock().unwrap().push(port.to_string());
        let (client, device_side) = duplex(4096);
        tokio::spawn(self.device.clone().serve(device_side));
        Ok(LineTransport::new(client, settings.timeout))
    }
}

pub fn fast_settings() -> DeviceSettings {
    DeviceSettings {
        timeout: Duration::from_millis(40),
        retry_delay: Duration::from_millis(5),
        ..DeviceSettings::default()
    }
}

pub fn fake_vaheat() -> (Vaheat<FakeConnector>, FakeDevice) {
    let device = FakeDevice::new();
    let vaheat = Vaheat::new(FakeConnector::new(device.clone()), fast_settings());
    (vaheat, device)
}
