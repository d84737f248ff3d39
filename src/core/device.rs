use crate::core::command::ApiCommand;
use crate::core::discovery;
use crate::core::response::{add_missing_commas, ensure_success, into_data, parse_response};
use crate::domain::model::{
    DeviceSettings, HeatingMode, ModeRequest, Params, ProfileQuery, StreamingMode,
};
use crate::domain::ports::{Connector, Transport};
use crate::utils::error::{Result, VaheatError};
use serde_json::{json, Value};
use std::fmt;

pub const NO_ALARM: &str = "NO_ALARM";

/// Client for one VAHEAT over a [`Connector`].
///
/// Every call is a single write followed by reading the reply; nothing runs
/// in the background. Dropping the client (or [`Vaheat::disconnect`])
/// releases the port.
pub struct Vaheat<C: Connector> {
    connector: C,
    settings: DeviceSettings,
    transport: Option<C::Transport>,
    info: Option<Value>,
    read_raw: String,
    write_raw: String,
    last_error: String,
}

impl<C: Connector> Vaheat<C> {
    pub fn new(connector: C, settings: DeviceSettings) -> Self {
        Self {
            connector,
            settings,
            transport: None,
            info: None,
            read_raw: String::new(),
            write_raw: String::new(),
            last_error: String::new(),
        }
    }

    pub fn settings(&self) -> &DeviceSettings {
        &self.settings
    }

    pub fn port(&self) -> Option<&str> {
        self.settings.port.as_deref()
    }

    pub fn baud_rate(&self) -> u32 {
        self.settings.baud_rate
    }

    /// Changes the port used by the next [`Vaheat::connect`].
    pub fn set_port(&mut self, port: impl Into<String>) {
        self.settings.port = Some(port.into());
    }

    /// Changes the baud rate used by the next [`Vaheat::connect`].
    pub fn set_baud_rate(&mut self, baud_rate: u32) {
        self.settings.baud_rate = baud_rate;
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    /// Device info cached by the last successful `get_info`.
    pub fn info(&self) -> Option<&Value> {
        self.info.as_ref()
    }

    pub fn serial_number(&self) -> Option<&str> {
        self.info.as_ref()?.get("serial_number")?.as_str()
    }

    pub fn last_read_raw(&self) -> &str {
        &self.read_raw
    }

    pub fn last_written_raw(&self) -> &str {
        &self.write_raw
    }

    /// Last reply the device rejected, as text.
    pub fn last_error(&self) -> &str {
        &self.last_error
    }

    /// Names of the connected VAHEAT ports.
    pub fn find_ports(&self) -> Result<Vec<String>> {
        Ok(discovery::find_vaheat_ports(&self.connector.list_ports()?))
    }

    /// Opens the port (auto-detecting one if none is configured) and reads
    /// the device info.
    pub async fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            self.disconnect().await?;
        }

        let port = match self.settings.port.clone() {
            Some(port) => port,
            None => {
                let port = discovery::select_port(&self.connector.list_ports()?)?;
                self.settings.port = Some(port.clone());
                port
            }
        };

        let transport = self.open_with_retry(&port).await?;
        self.transport = Some(transport);

        // 沒有回應 get_info 就不算連線成功
        if let Err(e) = self.get_info().await {
            tracing::error!("No device info from {}: {}", port, e);
            if let Some(mut transport) = self.transport.take() {
                if let Err(close_error) = transport.close().await {
                    tracing::warn!("Closing {} failed: {}", port, close_error);
                }
            }
            self.info = None;
            return Err(e);
        }

        tracing::info!("Connected to {}", port);
        Ok(())
    }

    async fn open_with_retry(&self, port: &str) -> Result<C::Transport> {
        let attempts = self.settings.open_retries + 1;
        let mut attempt = 1;
        loop {
            match self.connector.open(port, &self.settings).await {
                Ok(transport) => return Ok(transport),
                Err(e) if attempt < attempts => {
                    tracing::warn!(
                        "Opening {} failed (attempt {}/{}): {}",
                        port,
                        attempt,
                        attempts,
                        e
                    );
                    tokio::time::sleep(self.settings.retry_delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!("Error opening serial port {}: {}", port, e);
                    return Err(match e {
                        e @ VaheatError::PortOpen { .. } => e,
                        other => VaheatError::PortOpen {
                            port: port.to_string(),
                            reason: other.to_string(),
                        },
                    });
                }
            }
        }
    }

    /// Closes the port. Calling it while disconnected does nothing.
    pub async fn disconnect(&mut self) -> Result<()> {
        if let Some(mut transport) = self.transport.take() {
            transport.close().await?;
            tracing::info!("Disconnected from {}", self.port().unwrap_or("?"));
        }
        Ok(())
    }

    fn transport(&mut self) -> Result<&mut C::Transport> {
        self.transport.as_mut().ok_or(VaheatError::NotConnected)
    }

    /// Writes raw text to the device.
    pub async fn write_raw(&mut self, data: &str) -> Result<()> {
        if data.is_empty() {
            return Err(VaheatError::missing_parameter("data"));
        }
        self.transport()?.write(data).await?;
        self.write_raw = data.to_string();
        tracing::debug!("Wrote: {}", data);
        Ok(())
    }

    /// Reads a single line, or an empty string on timeout.
    pub async fn read_line(&mut self) -> Result<String> {
        let line = self.transport()?.read_line().await?.unwrap_or_default();
        let line = line.trim_end().to_string();
        self.read_raw = line.clone();
        Ok(line)
    }

    /// Reads lines until the device goes quiet for one read timeout.
    pub async fn read_all_lines(&mut self) -> Result<String> {
        let transport = self.transport()?;
        let mut lines = String::new();
        while let Some(line) = transport.read_line().await? {
            lines.push_str(&line);
            lines.push('\n');
        }
        let lines = lines.trim_end().to_string();
        tracing::debug!("Read: {}", lines);
        self.read_raw = lines.clone();
        Ok(lines)
    }

    async fn send(&mut self, command: ApiCommand, data: Option<Value>) -> Result<()> {
        let encoded = command.encode(data)?;
        self.write_raw(&encoded).await
    }

    /// Records rejected replies so the prompt can show them with `error`.
    fn track<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(VaheatError::DeviceRejected { response }) = &result {
            tracing::error!("{}", response);
            self.last_error = response.clone();
        }
        result
    }

    async fn request(&mut self, command: ApiCommand, data: Option<Value>) -> Result<Value> {
        self.send(command, data).await?;
        let raw = self.read_all_lines().await?;
        parse_response(&raw)
    }

    async fn query(&mut self, command: ApiCommand) -> Result<Value> {
        self.send(command, None).await?;
        let raw = self.read_all_lines().await?;
        let result = parse_response(&raw).and_then(|response| into_data(response, &raw));
        self.track(result)
    }

    async fn execute(&mut self, command: ApiCommand, data: Option<Value>) -> Result<()> {
        let result = self
            .request(command, data)
            .await
            .and_then(|response| ensure_success(&response));
        self.track(result)
    }

    /// Information about the device; cached for [`Vaheat::info`].
    pub async fn get_info(&mut self) -> Result<Value> {
        let info = self.query(ApiCommand::GetInfo).await?;
        self.info = Some(info.clone());
        Ok(info)
    }

    pub async fn get_status(&mut self) -> Result<Value> {
        self.query(ApiCommand::GetStatus).await
    }

    pub async fn get_settings(&mut self) -> Result<Value> {
        self.query(ApiCommand::GetSettings).await
    }

    /// Streaming settings. The firmware answers this one without commas
    /// between members, so the reply is repaired before parsing.
    pub async fn get_streaming(&mut self) -> Result<Value> {
        self.send(ApiCommand::GetStreaming, None).await?;
        let raw = self.read_all_lines().await?;
        let repaired = add_missing_commas(&raw);
        let result = parse_response(&repaired).and_then(|response| into_data(response, &raw));
        let mut data = self.track(result)?;

        // rate 以整數回傳 (小數部分捨去)
        if let Some(rate) = data.get_mut("rate") {
            if let Some(number) = rate.as_f64() {
                *rate = json!(number.trunc() as i64);
            }
        }
        Ok(data)
    }

    /// A stored profile, or one of its steps.
    pub async fn get_profile(&mut self, query: ProfileQuery) -> Result<Value> {
        self.send(ApiCommand::GetProfile, Some(serde_json::to_value(query)?))
            .await?;
        let raw = self.read_all_lines().await?;
        let text = if query.step.is_some() {
            add_missing_commas(&raw)
        } else {
            raw.clone()
        };
        let result = parse_response(&text).and_then(|response| into_data(response, &raw));
        self.track(result)
    }

    /// Current alarm condition, `NO_ALARM` when healthy.
    pub async fn get_alarm(&mut self) -> Result<String> {
        let status = self.get_status().await?;
        status
            .get("alarm")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| VaheatError::malformed("status has no 'alarm' member", status.to_string()))
    }

    async fn ensure_no_alarm(&mut self) -> Result<()> {
        let alarm = self.get_alarm().await?;
        if alarm != NO_ALARM {
            tracing::error!("ALARM status: {}. Check hardware.", alarm);
            return Err(VaheatError::AlarmActive { alarm });
        }
        Ok(())
    }

    /// Switches mode and starts heating. Mode defaults to `auto`.
    pub async fn start_heating(&mut self, params: &Params) -> Result<()> {
        if params.is_empty() {
            return Err(VaheatError::missing_parameter("mode"));
        }
        let request = ModeRequest::from_params(params, Some(HeatingMode::Auto))?;
        self.ensure_no_alarm().await?;

        self.execute(ApiCommand::StartHeating, Some(serde_json::to_value(&request)?))
            .await?;
        tracing::info!("Heating started by {} mode.", request.mode);
        Ok(())
    }

    pub async fn stop_heating(&mut self) -> Result<()> {
        self.execute(ApiCommand::StopHeating, None).await?;
        tracing::info!("Heating stopped.");
        Ok(())
    }

    /// Changes the operating mode without starting the heater. `mode` is required.
    pub async fn set_mode(&mut self, params: &Params) -> Result<()> {
        let request = ModeRequest::from_params(params, None)?;
        self.execute(ApiCommand::SetMode, Some(serde_json::to_value(&request)?))
            .await
    }

    /// Starts streaming with the stored streaming settings.
    pub async fn start_streaming(&mut self, mode: StreamingMode) -> Result<()> {
        if mode == StreamingMode::Off {
            return Err(VaheatError::invalid_parameter(
                "mode",
                "off",
                "Only once or continuous starts streaming",
            ));
        }
        self.ensure_no_alarm().await?;
        let mut params = Params::new();
        params.insert("mode".to_string(), serde_json::to_value(mode)?);
        self.set_streaming(&params).await
    }

    pub async fn stop_streaming(&mut self) -> Result<()> {
        let mut params = Params::new();
        params.insert("mode".to_string(), serde_json::to_value(StreamingMode::Off)?);
        self.set_streaming(&params).await
    }

    /// Changes the streaming settings. Streamed data may follow the reply, so
    /// only one line is read here.
    pub async fn set_streaming(&mut self, params: &Params) -> Result<()> {
        if params.is_empty() {
            return Err(VaheatError::missing_parameter("mode"));
        }
        self.send(ApiCommand::SetStreaming, Some(Value::Object(params.clone())))
            .await?;
        let raw = self.read_line().await?;
        let result = parse_response(&raw).and_then(|response| ensure_success(&response));
        self.track(result)
    }

    pub async fn set_settings(&mut self, params: &Params) -> Result<()> {
        if params.is_empty() {
            return Err(VaheatError::missing_parameter("settings"));
        }
        self.execute(ApiCommand::SetSettings, Some(Value::Object(params.clone())))
            .await
    }

    pub async fn set_profile(&mut self, profile: &Params) -> Result<()> {
        if profile.is_empty() {
            return Err(VaheatError::missing_parameter("profile_number"));
        }
        self.execute(ApiCommand::SetProfile, Some(Value::Object(profile.clone())))
            .await
    }

    /// Resets parts of the device. `{"all": true}` wins over everything else.
    pub async fn do_reset(&mut self, params: &Params) -> Result<()> {
        if params.is_empty() {
            return Err(VaheatError::missing_parameter("all"));
        }
        let data = if params.get("all") == Some(&Value::Bool(true)) {
            json!({"all": true})
        } else {
            Value::Object(params.clone())
        };
        self.execute(ApiCommand::DoReset, Some(data)).await
    }

    pub async fn set_keylock(&mut self, locked: bool) -> Result<()> {
        self.execute(ApiCommand::SetKeylock, Some(Value::Bool(locked)))
            .await?;
        if locked {
            tracing::info!("Device is key-locked.");
        } else {
            tracing::info!("Device is key-unlocked.");
        }
        Ok(())
    }
}

impl<C: Connector> fmt::Display for Vaheat<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.is_connected() {
            "connected"
        } else {
            "not connected"
        };
        write!(f, "VAHEAT ({}, {})", self.port().unwrap_or("no port"), state)
    }
}
