pub mod loader;
pub mod types;

pub use loader::{load_bars, load_signals, LoaderError};
pub use types::{Greeks, OptionType, PriceBar, Signal};
