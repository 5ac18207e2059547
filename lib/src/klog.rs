//! Structured logging for the stack.
//!
//! Every log line funnels through a single **sink** function pointer.  A
//! freestanding library has no console of its own, so until the embedder
//! installs a sink every line is discarded.  The sink receives the level
//! together with the pre-formatted arguments of one line, which lets it
//! prefix, colour, or route per level without a second gate of its own.
//!
//! The sink is responsible for:
//!
//! 1. Writing the formatted text **atomically** (no interleaving between
//!    concurrent emitters).
//! 2. Appending a trailing newline after the text.
//!
//! # Installation
//!
//! ```ignore
//! fn console_sink(level: KlogLevel, args: core::fmt::Arguments<'_>) { /* … */ }
//!
//! // In the embedder's console init:
//! ember_lib::klog::klog_set_sink(console_sink);
//! ```

use core::fmt;
use core::sync::atomic::{AtomicPtr, AtomicU8, Ordering};

// ---------------------------------------------------------------------------
// Log levels
// ---------------------------------------------------------------------------

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KlogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl KlogLevel {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => KlogLevel::Error,
            1 => KlogLevel::Warn,
            2 => KlogLevel::Info,
            3 => KlogLevel::Debug,
            _ => KlogLevel::Trace,
        }
    }
}

/// Most verbose level currently emitted; lines above it are dropped at the
/// call site.
static THRESHOLD: AtomicU8 = AtomicU8::new(KlogLevel::Info as u8);

// ---------------------------------------------------------------------------
// Sink
// ---------------------------------------------------------------------------

/// Signature of a klog sink: one gated line, with its level.
pub type KlogSink = fn(KlogLevel, fmt::Arguments<'_>);

/// Stored as a raw pointer; `null` means "no sink yet — discard".
static SINK: AtomicPtr<()> = AtomicPtr::new(core::ptr::null_mut());

/// Install the output sink, replacing any previous one.  Typically called
/// once by the embedder's console or serial driver during initialisation.
pub fn klog_set_sink(sink: KlogSink) {
    SINK.store(sink as *mut (), Ordering::Release);
}

pub fn klog_set_level(level: KlogLevel) {
    THRESHOLD.store(level as u8, Ordering::Relaxed);
}

pub fn klog_get_level() -> KlogLevel {
    KlogLevel::from_u8(THRESHOLD.load(Ordering::Relaxed))
}

/// Gate one line on the current threshold and hand it to the sink, if any.
///
/// The sink appends the trailing newline — callers should **not** include
/// one in their format string.
pub fn emit(level: KlogLevel, args: fmt::Arguments<'_>) {
    if level as u8 > THRESHOLD.load(Ordering::Relaxed) {
        return;
    }
    let ptr = SINK.load(Ordering::Acquire);
    if ptr.is_null() {
        return;
    }
    // SAFETY: `klog_set_sink` only stores valid `KlogSink` fn pointers,
    // which are the same size as `*mut ()` on all supported targets.
    let sink: KlogSink = unsafe { core::mem::transmute(ptr) };
    sink(level, args);
}

// ---------------------------------------------------------------------------
// Macros
// ---------------------------------------------------------------------------

#[macro_export]
macro_rules! klog_error {
    ($($arg:tt)*) => {
        $crate::klog::emit($crate::klog::KlogLevel::Error, ::core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! klog_warn {
    ($($arg:tt)*) => {
        $crate::klog::emit($crate::klog::KlogLevel::Warn, ::core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! klog_info {
    ($($arg:tt)*) => {
        $crate::klog::emit($crate::klog::KlogLevel::Info, ::core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! klog_debug {
    ($($arg:tt)*) => {
        $crate::klog::emit($crate::klog::KlogLevel::Debug, ::core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! klog_trace {
    ($($arg:tt)*) => {
        $crate::klog::emit($crate::klog::KlogLevel::Trace, ::core::format_args!($($arg)*))
    };
}
