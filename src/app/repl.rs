use crate::app::commands::{normalize_json_input, CliCommand};
use crate::core::command::ApiCommand;
use crate::core::device::Vaheat;
use crate::core::{Connector, Params};
use crate::domain::model::{ProfileQuery, StreamingMode};
use crate::utils::error::{Result, VaheatError};
use crate::utils::validation::{validate_baud_rate, SUPPORTED_BAUD_RATES};
use serde_json::Value;
use std::future::Future;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

const PROMPT_MARK: char = '\u{2668}';

/// What a prompt command produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Json(Value),
    Text(String),
    Done,
    Nothing,
    Exit,
}

/// Read-eval-print loop over one device.
pub struct Repl<C: Connector, R, W> {
    device: Vaheat<C>,
    input: R,
    output: W,
    show_raw: bool,
}

impl<C, R, W> Repl<C, R, W>
where
    C: Connector,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(device: Vaheat<C>, input: R, output: W, show_raw: bool) -> Self {
        Self {
            device,
            input,
            output,
            show_raw,
        }
    }

    pub fn device(&self) -> &Vaheat<C> {
        &self.device
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn show_raw(&self) -> bool {
        self.show_raw
    }

    /// `♨ >` while disconnected, `♨ [serial]>` or `♨ [serial:input]>` once connected.
    pub fn prompt(&self, input_type: Option<&str>) -> String {
        if !self.device.is_connected() {
            return format!("{} >", PROMPT_MARK);
        }
        let name = self
            .device
            .serial_number()
            .or_else(|| self.device.port())
            .unwrap_or("VAHEAT");
        match input_type {
            Some(input_type) => format!("{} [{}:{}]>", PROMPT_MARK, name, input_type),
            None => format!("{} [{}]>", PROMPT_MARK, name),
        }
    }

    /// Prints the banner and the detected devices. Returns how many were found.
    pub fn announce_devices(&mut self) -> Result<usize> {
        writeln!(self.output, "[[VAHEAT CLI]]\n-------------------")?;
        let ports = match self.device.find_ports() {
            Ok(ports) => ports,
            Err(e) => {
                tracing::warn!("Port enumeration failed: {}", e);
                Vec::new()
            }
        };
        if ports.is_empty() {
            writeln!(self.output, "VAHEAT device was not found.")?;
        } else {
            writeln!(
                self.output,
                "Available connected VAHEAT at {} port.",
                ports.join(",")
            )?;
        }
        Ok(ports.len())
    }

    async fn read_input(&mut self, input_type: Option<&str>) -> Result<Option<String>> {
        let prompt = self.prompt(input_type);
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Asks for a JSON object. An empty line cancels.
    async fn read_params(&mut self, command: ApiCommand) -> Result<Option<Params>> {
        if let Some(hint) = command.parameter_hint() {
            writeln!(self.output, "{}", hint)?;
        }
        let Some(line) = self.read_input(Some("JSON")).await? else {
            return Ok(None);
        };
        if line.is_empty() {
            return Ok(None);
        }

        let normalized = normalize_json_input(&line);
        match serde_json::from_str::<Value>(&normalized) {
            Ok(Value::Object(params)) => Ok(Some(params)),
            Ok(other) => Err(VaheatError::invalid_parameter(
                "parameters",
                other,
                "Expected a JSON object",
            )),
            Err(e) => Err(VaheatError::invalid_parameter(
                "parameters",
                line,
                format!("Invalid JSON: {}", e),
            )),
        }
    }

    /// Runs until `exit` or end of input.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            let Some(line) = self.read_input(None).await? else {
                return Ok(());
            };
            if line.is_empty() {
                continue;
            }

            let Ok(command) = line.parse::<CliCommand>() else {
                writeln!(self.output, "Unknown command.")?;
                continue;
            };

            match self.dispatch(command).await {
                Ok(Outcome::Exit) => return Ok(()),
                Ok(outcome) => self.print_outcome(outcome)?,
                Err(e) => self.print_error(&e)?,
            }

            if self.show_raw {
                self.print_raw()?;
            }
        }
    }

    /// Runs until `exit`, end of input, or until `interrupt` completes (Ctrl-C
    /// in the binary), then disconnects and says goodbye. The interrupted
    /// read is dropped, not awaited.
    pub async fn run_until<F>(&mut self, interrupt: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let result = tokio::select! {
            result = self.run() => result,
            _ = interrupt => {
                tracing::debug!("Interrupted");
                writeln!(self.output)?;
                Ok(())
            }
        };

        if let Err(e) = &result {
            tracing::error!("❌ {}", e);
        }
        self.shutdown().await?;
        result
    }

    /// Disconnects and says goodbye.
    pub async fn shutdown(&mut self) -> Result<()> {
        if self.device.is_connected() {
            self.device.disconnect().await?;
            writeln!(self.output, "Device disconnected.")?;
        }
        writeln!(self.output, "Exiting program. Bye!")?;
        self.output.flush()?;
        Ok(())
    }

    pub async fn dispatch(&mut self, command: CliCommand) -> Result<Outcome> {
        tracing::debug!("Command: {}", command.name());
        match command {
            CliCommand::Connect => {
                self.device.connect().await?;
                Ok(Outcome::Text(self.device.to_string()))
            }
            CliCommand::Disconnect => {
                self.device.disconnect().await?;
                Ok(Outcome::Text(self.device.to_string()))
            }
            CliCommand::Port => self.change_port().await,
            CliCommand::BaudRate => self.change_baud_rate().await,
            CliCommand::GetInfo => Ok(Outcome::Json(self.device.get_info().await?)),
            CliCommand::GetStatus => Ok(Outcome::Json(self.device.get_status().await?)),
            CliCommand::GetSettings => Ok(Outcome::Json(self.device.get_settings().await?)),
            CliCommand::GetStreaming => Ok(Outcome::Json(self.device.get_streaming().await?)),
            CliCommand::GetProfile => self.get_profile().await,
            CliCommand::StopHeating => {
                self.device.stop_heating().await?;
                Ok(Outcome::Done)
            }
            CliCommand::StartStreaming => {
                let Some(mode) = self.read_input(Some("once or continuous (str)")).await? else {
                    return Ok(Outcome::Nothing);
                };
                match mode.parse::<StreamingMode>()? {
                    StreamingMode::Off => Err(VaheatError::invalid_parameter(
                        "mode",
                        mode,
                        "Use stop_streaming to stop",
                    )),
                    streaming => {
                        self.device.start_streaming(streaming).await?;
                        Ok(Outcome::Done)
                    }
                }
            }
            CliCommand::StopStreaming => {
                self.device.stop_streaming().await?;
                Ok(Outcome::Done)
            }
            CliCommand::SetKeylock => {
                let Some(answer) = self.read_input(Some("(bool)")).await? else {
                    return Ok(Outcome::Nothing);
                };
                let locked = match answer.to_lowercase().as_str() {
                    "true" => true,
                    "false" => false,
                    _ => {
                        return Err(VaheatError::invalid_parameter(
                            "keylock",
                            answer,
                            "Enter true or false",
                        ))
                    }
                };
                self.device.set_keylock(locked).await?;
                Ok(Outcome::Done)
            }
            CliCommand::DoReset => {
                writeln!(
                    self.output,
                    "Reset erases current parameters. Get & write down those parameters."
                )?;
                write!(self.output, "Are you sure to proceed reset ? (Y/[N])")?;
                self.output.flush()?;
                let mut answer = String::new();
                self.input.read_line(&mut answer).await?;
                if !answer.trim().eq_ignore_ascii_case("y") {
                    return Ok(Outcome::Nothing);
                }
                self.with_params(command).await
            }
            CliCommand::StartHeating
            | CliCommand::SetSettings
            | CliCommand::SetStreaming
            | CliCommand::SetMode
            | CliCommand::SetProfile => self.with_params(command).await,
            CliCommand::Raw => {
                self.show_raw = !self.show_raw;
                let state = if self.show_raw { "ON" } else { "OFF" };
                Ok(Outcome::Text(format!("Show raw mode: {}", state)))
            }
            CliCommand::Error => {
                let last_error = self.device.last_error();
                if last_error.is_empty() {
                    Ok(Outcome::Nothing)
                } else {
                    Ok(Outcome::Text(last_error.to_string()))
                }
            }
            CliCommand::Read => Ok(Outcome::Text(self.device.read_line().await?)),
            CliCommand::ReadAll => Ok(Outcome::Text(self.device.read_all_lines().await?)),
            CliCommand::Write => {
                write!(self.output, "Enter JSON str to write: ")?;
                self.output.flush()?;
                let mut data = String::new();
                self.input.read_line(&mut data).await?;
                self.device.write_raw(data.trim_end_matches(['\r', '\n'])).await?;
                Ok(Outcome::Done)
            }
            CliCommand::Help => {
                let lines: Vec<String> = CliCommand::all()
                    .map(|(_, name, description)| format!("  {:<16} {}", name, description))
                    .collect();
                Ok(Outcome::Text(lines.join("\n")))
            }
            CliCommand::Exit => Ok(Outcome::Exit),
        }
    }

    async fn with_params(&mut self, command: CliCommand) -> Result<Outcome> {
        let Some(api) = command.api_command() else {
            return Ok(Outcome::Nothing);
        };
        let Some(params) = self.read_params(api).await? else {
            return Ok(Outcome::Nothing);
        };

        match api {
            ApiCommand::StartHeating => self.device.start_heating(&params).await?,
            ApiCommand::SetSettings => self.device.set_settings(&params).await?,
            ApiCommand::SetStreaming => self.device.set_streaming(&params).await?,
            ApiCommand::SetMode => self.device.set_mode(&params).await?,
            ApiCommand::SetProfile => self.device.set_profile(&params).await?,
            ApiCommand::DoReset => self.device.do_reset(&params).await?,
            _ => return Ok(Outcome::Nothing),
        }
        Ok(Outcome::Done)
    }

    async fn get_profile(&mut self) -> Result<Outcome> {
        write!(self.output, "Enter profile_number (1-9): ")?;
        self.output.flush()?;
        let mut number = String::new();
        self.input.read_line(&mut number).await?;
        let number = number.trim();
        let profile_number: u8 = number.parse().map_err(|_| {
            VaheatError::invalid_parameter("profile_number", number, "Enter a number 1-9")
        })?;

        write!(self.output, "Step (1-20 or empty for all steps): ")?;
        self.output.flush()?;
        let mut step = String::new();
        self.input.read_line(&mut step).await?;
        let step = step.trim();
        let step = if step.is_empty() {
            None
        } else {
            Some(step.parse::<u8>().map_err(|_| {
                VaheatError::invalid_parameter("step", step, "Enter a number 1-20")
            })?)
        };

        let query = ProfileQuery::new(profile_number, step)?;
        Ok(Outcome::Json(self.device.get_profile(query).await?))
    }

    async fn change_port(&mut self) -> Result<Outcome> {
        writeln!(
            self.output,
            "Current port is {}",
            self.device.port().unwrap_or("None")
        )?;
        writeln!(self.output, "Enter port name to change.")?;
        let Some(port) = self.read_input(Some("port name")).await? else {
            return Ok(Outcome::Nothing);
        };
        if port.is_empty() || Some(port.as_str()) == self.device.port() {
            return Ok(Outcome::Nothing);
        }

        self.device.disconnect().await?;
        self.device.set_port(port);
        self.device.connect().await?;
        Ok(Outcome::Text(self.device.to_string()))
    }

    async fn change_baud_rate(&mut self) -> Result<Outcome> {
        writeln!(
            self.output,
            "Current baud_rate is {}",
            self.device.baud_rate()
        )?;
        let rates: Vec<String> = SUPPORTED_BAUD_RATES.iter().map(u32::to_string).collect();
        let hint = rates.join(", ");
        let Some(answer) = self.read_input(Some(&hint)).await? else {
            return Ok(Outcome::Nothing);
        };
        if answer.is_empty() {
            return Ok(Outcome::Nothing);
        }

        let baud_rate: u32 = answer.parse().map_err(|_| {
            VaheatError::invalid_parameter("baud_rate", &answer, "Enter a number")
        })?;
        validate_baud_rate("baud_rate", baud_rate)?;
        if baud_rate == self.device.baud_rate() {
            return Ok(Outcome::Nothing);
        }

        self.device.disconnect().await?;
        self.device.set_baud_rate(baud_rate);
        self.device.connect().await?;
        Ok(Outcome::Text(self.device.to_string()))
    }

    fn print_outcome(&mut self, outcome: Outcome) -> Result<()> {
        match outcome {
            Outcome::Json(value) => {
                writeln!(self.output, "{}", serde_json::to_string_pretty(&value)?)?
            }
            Outcome::Text(text) if !text.is_empty() => writeln!(self.output, "{}", text)?,
            Outcome::Done => writeln!(self.output, "OK")?,
            Outcome::Text(_) | Outcome::Nothing | Outcome::Exit => {}
        }
        Ok(())
    }

    fn print_error(&mut self, error: &VaheatError) -> Result<()> {
        tracing::debug!(
            "Command failed: {} (Category: {:?}, Severity: {:?})",
            error,
            error.category(),
            error.severity()
        );
        writeln!(self.output, "❌ {}", error.user_friendly_message())?;
        Ok(())
    }

    fn print_raw(&mut self) -> Result<()> {
        let read_raw = self.device.last_read_raw().to_string();
        let write_raw = self.device.last_written_raw().to_string();
        if !read_raw.is_empty() {
            writeln!(self.output, "--- READ RAW ---\n{}", read_raw)?;
        }
        if !write_raw.is_empty() {
            writeln!(self.output, "--- WROTE RAW ---\n{}", write_raw)?;
        }
        Ok(())
    }
}
