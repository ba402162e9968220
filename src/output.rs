//! MIDI port hosts for the engine
//!
//! [`PortOutput`] sends translated messages to a midir output port;
//! [`connect_input`] feeds a midir input port into an [`EngineHandle`].
//! [`ConsoleOutput`] prints messages instead, for dry runs.

use anyhow::{anyhow, Context, Result};
use colored::*;
use midir::{Ignore, MidiInput, MidiInputConnection, MidiInputPort, MidiOutput, MidiOutputConnection, MidiOutputPort};
use tracing::{debug, info, warn};

use crate::engine::{EngineHandle, EngineHost};
use crate::midi::{format_hex, MidiMessage};

const CLIENT_NAME: &str = "FreeKeys";

/// Controller numbers sent by `midi_reset`
const ALL_SOUND_OFF: u8 = 120;
const RESET_ALL_CONTROLLERS: u8 = 121;
const ALL_NOTES_OFF: u8 = 123;

/// Information about a MIDI port
#[derive(Debug, Clone)]
pub struct PortInfo {
    pub index: usize,
    pub name: String,
    pub is_virtual: bool,
}

fn is_virtual(name: &str) -> bool {
    name.contains("Virtual") || name.contains("loopMIDI") || name.contains("IAC")
}

/// Discover input ports
pub fn discover_input_ports() -> Result<Vec<PortInfo>> {
    let midi_in = MidiInput::new(CLIENT_NAME).context("Failed to create MIDI input")?;
    let mut ports = Vec::new();
    for (index, port) in midi_in.ports().iter().enumerate() {
        if let Ok(name) = midi_in.port_name(port) {
            ports.push(PortInfo { index, is_virtual: is_virtual(&name), name });
        }
    }
    Ok(ports)
}

/// Discover output ports
pub fn discover_output_ports() -> Result<Vec<PortInfo>> {
    let midi_out = MidiOutput::new(CLIENT_NAME).context("Failed to create MIDI output")?;
    let mut ports = Vec::new();
    for (index, port) in midi_out.ports().iter().enumerate() {
        if let Ok(name) = midi_out.port_name(port) {
            ports.push(PortInfo { index, is_virtual: is_virtual(&name), name });
        }
    }
    Ok(ports)
}

/// Print all ports to stdout
pub fn print_ports() -> Result<()> {
    let inputs = discover_input_ports()?;
    let outputs = discover_output_ports()?;

    println!("{}", "MIDI inputs:".bold());
    if inputs.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for port in &inputs {
        let tag = if port.is_virtual { " [virtual]".dimmed().to_string() } else { String::new() };
        println!("  {:>2}: {}{}", port.index, port.name.green(), tag);
    }

    println!("{}", "MIDI outputs:".bold());
    if outputs.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for port in &outputs {
        let tag = if port.is_virtual { " [virtual]".dimmed().to_string() } else { String::new() };
        println!("  {:>2}: {}{}", port.index, port.name.cyan(), tag);
    }
    Ok(())
}

/// Case-insensitive substring match on the port name
fn matches_pattern(name: &str, pattern: &str) -> bool {
    name.to_lowercase().contains(&pattern.to_lowercase())
}

fn find_output_port(midi_out: &MidiOutput, pattern: &str) -> Option<(MidiOutputPort, String)> {
    midi_out.ports().into_iter().find_map(|port| {
        let name = midi_out.port_name(&port).ok()?;
        matches_pattern(&name, pattern).then_some((port, name))
    })
}

fn find_input_port(midi_in: &MidiInput, pattern: &str) -> Option<(MidiInputPort, String)> {
    midi_in.ports().into_iter().find_map(|port| {
        let name = midi_in.port_name(&port).ok()?;
        matches_pattern(&name, pattern).then_some((port, name))
    })
}

/// Engine host writing to a MIDI output port
pub struct PortOutput {
    connection: MidiOutputConnection,
    name: String,
}

impl PortOutput {
    /// Open the first output port whose name contains `pattern`
    pub fn connect(pattern: &str) -> Result<Self> {
        let midi_out = MidiOutput::new(CLIENT_NAME).context("Failed to create MIDI output")?;
        let (port, name) = find_output_port(&midi_out, pattern)
            .ok_or_else(|| anyhow!("Output port '{}' not found", pattern))?;
        let connection = midi_out
            .connect(&port, "freekeys-out")
            .map_err(|e| anyhow!("Failed to open output port '{}': {}", name, e))?;

        info!("MIDI output opened: '{}'", name);
        Ok(Self { connection, name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn send_bytes(&mut self, bytes: &[u8]) {
        if let Err(e) = self.connection.send(bytes) {
            warn!("MIDI send to '{}' failed: {}", self.name, e);
        }
    }
}

impl EngineHost for PortOutput {
    fn midi_output(&mut self, message: &MidiMessage) {
        let bytes = message.encode();
        debug!("MIDI OUT -> {} ({})", format_hex(&bytes), message);
        self.send_bytes(&bytes);
    }

    fn midi_reset(&mut self) {
        for channel in 0..16u8 {
            for cc in [ALL_NOTES_OFF, ALL_SOUND_OFF, RESET_ALL_CONTROLLERS] {
                let message = MidiMessage::ControlChange { channel, cc, value: 0 };
                self.send_bytes(&message.encode());
            }
        }
    }
}

/// Engine host printing every message, used when no port is given
#[derive(Debug, Default)]
pub struct ConsoleOutput {
    sent: usize,
}

impl ConsoleOutput {
    pub fn sent(&self) -> usize {
        self.sent
    }
}

impl EngineHost for ConsoleOutput {
    fn midi_output(&mut self, message: &MidiMessage) {
        self.sent += 1;
        println!("{} {:<10} {}", "OUT".red(), format_hex(&message.encode()), message);
    }

    fn midi_reset(&mut self) {
        println!("{}", "-- reset --".dimmed());
    }
}

/// Feed the first input port whose name contains `pattern` into `engine`
///
/// The returned connection must be kept alive; dropping it closes the port.
pub fn connect_input<H>(pattern: &str, engine: EngineHandle<H>) -> Result<MidiInputConnection<()>>
where
    H: EngineHost + 'static,
{
    let mut midi_in = MidiInput::new(CLIENT_NAME).context("Failed to create MIDI input")?;
    midi_in.ignore(Ignore::All);

    let (port, name) = find_input_port(&midi_in, pattern)
        .ok_or_else(|| anyhow!("Input port '{}' not found", pattern))?;

    let connection = midi_in
        .connect(
            &port,
            "freekeys-in",
            move |_timestamp, data, _| {
                debug!("MIDI IN <- {}", format_hex(data));
                engine.lock().midi_input(data);
            },
            (),
        )
        .map_err(|e| anyhow!("Failed to open input port '{}': {}", name, e))?;

    info!("MIDI input opened: '{}'", name);
    Ok(connection)
}
