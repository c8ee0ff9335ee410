pub mod events;

use crate::cartridge::Cartridge;
use crate::component::{ElapsedTime, CLOCKS_PER_M_CYCLE};
use crate::config::EmulatorConfig;
use crate::error::Result;
use crate::gameboy::GameBoy;
use crate::ppu::{DOTS_PER_LINE, LINES_PER_FRAME};
use log::{debug, error, info, trace};
use std::collections::BTreeSet;
use std::fs;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use self::events::{EmulationControlEvent, EmulationEvent};

/// M-cycles in one frame: 154 lines of 456 clocks.
pub const CYCLES_PER_FRAME: u64 =
    (DOTS_PER_LINE as u64 * LINES_PER_FRAME as u64) / CLOCKS_PER_M_CYCLE as u64;
pub const FRAMES_PER_SECOND: f64 = 59.7;

/// Run state of the loop, owned by the emulator and changed only through control events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionContext {
    pub running: bool,
    pub paused: bool,
    pub single_step_requested: bool,
    pub dump_requested: bool,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self {
            running: true,
            paused: false,
            single_step_requested: false,
            dump_requested: false,
        }
    }
}

/// Builds the machine a config describes: cartridge, save file and optional boot ROM.
pub fn load_gameboy(config: &EmulatorConfig) -> Result<GameBoy> {
    let bytes = fs::read(&config.rom_path)?;
    let cartridge = Cartridge::from_data_with_save_file(&bytes, &config.save_path())?;

    match &config.boot_rom_path {
        Some(path) => {
            let boot_rom = fs::read(path)?;
            info!("Running boot rom {}", path.display());
            GameBoy::with_boot_rom(Some(cartridge), &boot_rom)
        }
        None => Ok(GameBoy::new(Some(cartridge))),
    }
}

/// Manages GameBoy CPU exectution, adding breakpoint functionality.
pub struct GameboyEmulator {
    context: ExecutionContext,
    breakpoints: BTreeSet<u16>,
    /// Breakpoint the loop last stopped at, so resuming runs past it.
    stopped_at: Option<u16>,
    throttled: bool,
    frame_cycles: u64,
    frame_start: Instant,
}

impl GameboyEmulator {
    pub fn new(config: &EmulatorConfig) -> Self {
        Self {
            context: ExecutionContext {
                paused: config.start_paused,
                ..ExecutionContext::default()
            },
            breakpoints: config.breakpoints.iter().copied().collect(),
            stopped_at: None,
            throttled: config.throttled,
            frame_cycles: 0,
            frame_start: Instant::now(),
        }
    }

    pub fn context(&self) -> ExecutionContext {
        self.context
    }

    /// Runs `gameboy` on its own thread. The returned sender controls it and the receiver
    /// carries everything it reports.
    pub fn gameboy_thread(
        gameboy: GameBoy,
        config: &EmulatorConfig,
    ) -> (
        JoinHandle<Result<()>>,
        Sender<EmulationControlEvent>,
        Receiver<EmulationEvent>,
    ) {
        let (event_sender, event_receiver) = mpsc::channel();
        let (control_event_sender, control_event_receiver) = mpsc::channel();
        let mut emulator = GameboyEmulator::new(config);

        let join_handle = thread::spawn(move || -> Result<()> {
            let mut gameboy = gameboy;
            emulator.run(&mut gameboy, &control_event_receiver, &event_sender)
        });

        (join_handle, control_event_sender, event_receiver)
    }

    /// The step loop. Returns when a quit request arrives, the control channel closes while
    /// paused, or the machine fails. Cartridge RAM is flushed on the way out.
    pub fn run(
        &mut self,
        gameboy: &mut GameBoy,
        control: &Receiver<EmulationControlEvent>,
        events: &Sender<EmulationEvent>,
    ) -> Result<()> {
        let result = self.run_loop(gameboy, control, events);
        let flushed = gameboy.flush();
        if let (Err(_), Err(e)) = (&result, &flushed) {
            error!("Failed to save cartridge ram: {e}");
        }
        let result = result.and(flushed);

        if let Err(e) = &result {
            error!("Emulation stopped: {e}");
        }
        Self::emit(
            events,
            EmulationEvent::Stopped {
                error: result.as_ref().err().map(|e| e.to_string()),
            },
        );
        result
    }

    fn run_loop(
        &mut self,
        gameboy: &mut GameBoy,
        control: &Receiver<EmulationControlEvent>,
        events: &Sender<EmulationEvent>,
    ) -> Result<()> {
        loop {
            loop {
                match control.try_recv() {
                    Ok(event) => self.apply(event, gameboy, events),
                    Err(TryRecvError::Empty) => break,
                    // nobody can pause us any more, keep running
                    Err(TryRecvError::Disconnected) => break,
                }
            }

            if self.context.dump_requested {
                self.dump(gameboy, events);
            }
            if !self.context.running {
                info!("Quitting");
                return Ok(());
            }

            if self.context.paused && !self.context.single_step_requested {
                match control.recv() {
                    Ok(event) => self.apply(event, gameboy, events),
                    Err(_) => self.context.running = false,
                }
                continue;
            }

            let pc = gameboy.get_pc();
            if self.stopped_at != Some(pc) && self.breakpoints.contains(&pc) {
                info!("Breakpoint hit at {pc:#06x}");
                self.stopped_at = Some(pc);
                self.context.paused = true;
                self.context.single_step_requested = false;
                Self::emit(events, EmulationEvent::BreakpointHit(gameboy.debug_info()));
                continue;
            }

            let elapsed_cycles = gameboy.tick()?;
            self.stopped_at = None;

            if self.context.single_step_requested {
                self.context.single_step_requested = false;
                Self::emit(events, EmulationEvent::Trace(gameboy.debug_info()));
            }

            for byte in gameboy.take_serial_output() {
                Self::emit(events, EmulationEvent::SerialData(byte));
            }

            self.pace(elapsed_cycles);
        }
    }

    fn apply(
        &mut self,
        event: EmulationControlEvent,
        gameboy: &mut GameBoy,
        events: &Sender<EmulationEvent>,
    ) {
        debug!("Control event {event:?}");
        match event {
            EmulationControlEvent::Pause => {
                if !self.context.paused {
                    self.context.paused = true;
                    Self::emit(events, EmulationEvent::Paused);
                }
            }
            EmulationControlEvent::Resume => {
                if self.context.paused {
                    self.context.paused = false;
                    self.frame_start = Instant::now();
                    self.frame_cycles = 0;
                    Self::emit(events, EmulationEvent::Resumed);
                }
            }
            EmulationControlEvent::Step => {
                self.context.paused = true;
                self.context.single_step_requested = true;
            }
            EmulationControlEvent::Dump => self.context.dump_requested = true,
            EmulationControlEvent::AddBreakpoint(pc) => {
                self.breakpoints.insert(pc);
            }
            EmulationControlEvent::RemoveBreakpoint(pc) => {
                self.breakpoints.remove(&pc);
            }
            EmulationControlEvent::Press(input) => gameboy.press(input),
            EmulationControlEvent::Release(input) => gameboy.release(input),
            EmulationControlEvent::Quit => self.context.running = false,
        }
    }

    fn dump(&mut self, gameboy: &mut GameBoy, events: &Sender<EmulationEvent>) {
        self.context.dump_requested = false;
        let info = gameboy.debug_info();
        let ppu = gameboy.memory_bus().ppu();
        Self::emit(
            events,
            EmulationEvent::Dump {
                info,
                vram: ppu.vram().to_vec(),
                oam: ppu.oam().to_vec(),
            },
        );
    }

    /// Sleeps off whatever is left of the frame once a frame's worth of cycles has run.
    fn pace(&mut self, elapsed_cycles: ElapsedTime) {
        if !self.throttled {
            return;
        }

        self.frame_cycles += u64::from(elapsed_cycles);
        if self.frame_cycles < CYCLES_PER_FRAME {
            return;
        }
        self.frame_cycles -= CYCLES_PER_FRAME;

        let frame_length = Duration::from_secs_f64(1.0 / FRAMES_PER_SECOND);
        let duration = self.frame_start.elapsed();
        if duration > frame_length {
            debug!("Time elapsed this frame is: {:?} > {:?}", duration, frame_length);
        } else {
            thread::sleep(frame_length - duration);
        }
        self.frame_start = Instant::now();
    }

    fn emit(events: &Sender<EmulationEvent>, event: EmulationEvent) {
        if events.send(event).is_err() {
            trace!("No one is listening for emulation events");
        }
    }
}
