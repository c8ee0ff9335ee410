use gameboy_core::emulator::events::{EmulationControlEvent, EmulationEvent};
use gameboy_core::emulator::{load_gameboy, GameboyEmulator};
use gameboy_core::EmulatorConfig;
use log::*;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::thread;

use clap::Parser;

/// Runs a Game Boy cartridge without video or sound, printing serial output
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to .gb rom file
    #[arg(short = 'r', long = "rom", required = true)]
    rom_path: PathBuf,

    /// 256 byte boot rom to run before the cartridge
    #[arg(long = "boot-rom")]
    boot_rom_path: Option<PathBuf>,

    /// Save file for battery-backed cartridge ram [default: rom path with .sav extension]
    #[arg(long = "save")]
    save_path: Option<PathBuf>,

    /// Debug mode: start paused and read debugger commands from stdin
    #[arg(short, long, default_value_t = false)]
    debug: bool,

    /// Run as fast as possible instead of at 59.7 frames per second
    #[arg(long, default_value_t = false)]
    unthrottled: bool,

    /// Pause before executing the instruction at this address (hex), may be repeated
    #[arg(long = "break", value_parser = parse_hex)]
    breakpoints: Vec<u16>,
}

fn parse_hex(value: &str) -> Result<u16, String> {
    let digits = value.trim_start_matches("0x").trim_start_matches('$');
    u16::from_str_radix(digits, 16).map_err(|e| format!("{value} is not a hex address: {e}"))
}

impl From<Args> for EmulatorConfig {
    fn from(args: Args) -> Self {
        EmulatorConfig {
            rom_path: args.rom_path,
            boot_rom_path: args.boot_rom_path,
            save_path: args.save_path,
            start_paused: args.debug,
            throttled: !args.unthrottled,
            breakpoints: args.breakpoints,
        }
    }
}

fn main() -> Result<(), String> {
    env_logger::init();

    let args = Args::parse();
    let debug = args.debug;
    let config = EmulatorConfig::from(args);

    let gameboy = load_gameboy(&config).map_err(|e| e.to_string())?;
    let (join_handle, control_event_sender, event_receiver) =
        GameboyEmulator::gameboy_thread(gameboy, &config);

    if debug {
        let sender = control_event_sender.clone();
        thread::spawn(move || read_debugger_commands(sender));
        print_help();
    }

    let mut stdout = io::stdout();
    while let Ok(event) = event_receiver.recv() {
        match event {
            EmulationEvent::SerialData(byte) => {
                print!("{}", byte as char);
                let _ = stdout.flush();
            }
            EmulationEvent::Trace(debug_info) => println!("{debug_info}"),
            EmulationEvent::BreakpointHit(debug_info) => println!("breakpoint: {debug_info}"),
            EmulationEvent::Dump { info, vram, oam } => {
                println!("{info}");
                println!("vram: {} bytes, oam:", vram.len());
                for row in oam.chunks(16) {
                    let row: Vec<String> = row.iter().map(|b| format!("{b:02x}")).collect();
                    println!("  {}", row.join(" "));
                }
            }
            EmulationEvent::Stopped { error } => {
                if let Some(error) = error {
                    error!("{error}");
                }
                break;
            }
            event => debug!("{:?}", event),
        }
    }
    drop(control_event_sender);

    join_handle
        .join()
        .map_err(|_| "panic during execution".to_string())?
        .map_err(|e| e.to_string())
}

fn print_help() {
    println!("commands: c(ontinue) s(tep) p(ause) d(ump) b <pc> rb <pc> q(uit)");
}

fn read_debugger_commands(sender: Sender<EmulationControlEvent>) {
    for line in io::stdin().lock().lines() {
        let Ok(line) = line else { break };
        let mut words = line.split_whitespace();
        let event = match (words.next(), words.next().map(parse_hex)) {
            (Some("c"), _) => EmulationControlEvent::Resume,
            (Some("s"), _) => EmulationControlEvent::Step,
            (Some("p"), _) => EmulationControlEvent::Pause,
            (Some("d"), _) => EmulationControlEvent::Dump,
            (Some("b"), Some(Ok(pc))) => EmulationControlEvent::AddBreakpoint(pc),
            (Some("rb"), Some(Ok(pc))) => EmulationControlEvent::RemoveBreakpoint(pc),
            (Some("q"), _) => EmulationControlEvent::Quit,
            (None, _) => continue,
            _ => {
                eprintln!("Unable to parse command {line:?}");
                print_help();
                continue;
            }
        };
        if sender.send(event).is_err() {
            break;
        }
    }
}
