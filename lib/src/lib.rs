#![no_std]

pub mod clock;
pub mod klog;
pub mod testing;

#[doc(hidden)]
pub use paste;

pub use klog::{KlogLevel, klog_get_level, klog_set_level, klog_set_sink};
