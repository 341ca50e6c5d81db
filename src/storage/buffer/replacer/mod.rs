pub mod clock;

pub use clock::ClockReplacer;
