// Analysis grid
pub const DEFAULT_SAMPLE_RATE: u32 = 22050;
pub const DEFAULT_HOP_LENGTH: u32 = 512;

// Piano range: one semitone bin per key, A0..C8
pub const N_PITCH_BINS: usize = 88;
pub const MIDI_OFFSET: u8 = 21;
pub const MAX_MIDI_PITCH: u8 = 127;

// Note events
pub const MIN_VELOCITY: u8 = 1;
pub const MAX_VELOCITY: u8 = 127;
pub const DEFAULT_VELOCITY: u8 = 64;
pub const DEFAULT_CONFIDENCE: f32 = 0.5;

// Agreement
pub const TIME_EPSILON_S: f64 = 1e-9;
pub const ONSET_ROUNDING_S: f64 = 0.01;

// MIDI Conversion
pub const TICKS_PER_BEAT: u16 = 480;
pub const DEFAULT_BPM: u32 = 120;
