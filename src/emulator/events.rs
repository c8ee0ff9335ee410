use crate::gameboy::GameboyDebugInfo;
use crate::joypad::JoypadInput;

/// Events created by the emulator and broadcasted across a channel
#[derive(Debug, Clone)]
pub enum EmulationEvent {
    SerialData(u8),
    /// State after a single step.
    Trace(GameboyDebugInfo),
    Dump {
        info: GameboyDebugInfo,
        vram: Vec<u8>,
        oam: Vec<u8>,
    },
    /// Execution paused before the instruction at a breakpoint.
    BreakpointHit(GameboyDebugInfo),
    Paused,
    Resumed,
    /// The loop has exited. Carries the error that stopped it, if any.
    Stopped { error: Option<String> },
}

/// Events sent to the emulator to control its status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmulationControlEvent {
    Pause,
    Resume,
    /// Run one instruction, then stay paused.
    Step,
    Dump,
    AddBreakpoint(u16),
    RemoveBreakpoint(u16),
    Press(JoypadInput),
    Release(JoypadInput),
    Quit,
}
