//! Suite registry and runner glue.
//!
//! The network crate's in-tree suites register themselves as
//! [`TestSuiteDesc`] statics; an embedder (or a bare-metal harness binary)
//! collects them here and drives a full run:
//!
//! ```ignore
//! ember_tests::tests_register_system_suites();
//! let mut summary = TestRunSummary::default();
//! let rc = ember_tests::tests_run_all(&TestConfig::default(), &mut summary);
//! ```

#![no_std]

use core::ffi::{CStr, c_char};

use ember_lib::klog_info;
use ember_lib::testing::{
    HARNESS_MAX_SUITES, TestConfig, TestRunSummary, TestSuiteDesc, TestSuiteResult, Verbosity,
};
use spin::Mutex;

pub const TESTS_MAX_SUITES: usize = HARNESS_MAX_SUITES;

struct Registry {
    suites: [Option<&'static TestSuiteDesc>; TESTS_MAX_SUITES],
    count: usize,
}

static REGISTRY: Mutex<Registry> = Mutex::new(Registry {
    suites: [None; TESTS_MAX_SUITES],
    count: 0,
});

/// Forget every registered suite.
pub fn tests_reset_registry() {
    let mut registry = REGISTRY.lock();
    registry.suites = [None; TESTS_MAX_SUITES];
    registry.count = 0;
}

/// Register one suite.  Returns `0` on success, `-1` if the descriptor has no
/// runner or the registry is full.
pub fn tests_register_suite(desc: &'static TestSuiteDesc) -> i32 {
    if desc.run.is_none() {
        return -1;
    }
    let mut registry = REGISTRY.lock();
    if registry.count >= TESTS_MAX_SUITES {
        return -1;
    }
    let slot = registry.count;
    registry.suites[slot] = Some(desc);
    registry.count += 1;
    0
}

/// Register the network crate's built-in suites.
pub fn tests_register_system_suites() {
    let suites: [&'static TestSuiteDesc; 5] = [
        &ember_net::types_tests::TYPES_SUITE_DESC,
        &ember_net::packetbuf_tests::PACKETBUF_SUITE_DESC,
        &ember_net::arp_tests::ARP_SUITE_DESC,
        &ember_net::cache_tests::CACHE_SUITE_DESC,
        &ember_net::ipv4_tests::IPV4_SUITE_DESC,
    ];
    for desc in suites {
        let _ = tests_register_suite(desc);
    }
}

/// Run every registered suite, filling `summary`.
///
/// Returns `0` when everything passed, `-1` otherwise.
pub fn tests_run_all(config: &TestConfig, summary: &mut TestRunSummary) -> i32 {
    *summary = TestRunSummary::default();

    if !config.enabled {
        klog_info!("TESTS: harness disabled");
        return 0;
    }

    // Copy the descriptors out so no suite runs under the registry lock.
    let (suites, count) = {
        let registry = REGISTRY.lock();
        (registry.suites, registry.count)
    };

    for desc in suites.iter().take(count).flatten() {
        let Some(run) = desc.run else {
            continue;
        };
        let mut result = TestSuiteResult::new(desc.name);
        let rc = run(core::ptr::null(), &mut result);

        if summary.suite_count < TESTS_MAX_SUITES {
            summary.suites[summary.suite_count] = result;
            summary.suite_count += 1;
        }
        summary.add_suite_result(&result);

        if config.verbosity != Verbosity::Quiet {
            klog_info!(
                "TESTS: {} — {}/{} passed ({} ms){}",
                suite_name(desc.name),
                result.passed,
                result.total,
                result.elapsed_ms,
                if rc == 0 { "" } else { " [FAILED]" },
            );
        }
    }

    klog_info!(
        "TESTS: total {}/{} passed across {} suites",
        summary.passed,
        summary.total_tests,
        summary.suite_count,
    );

    if summary.all_passed() { 0 } else { -1 }
}

fn suite_name(ptr: *const c_char) -> &'static str {
    if ptr.is_null() {
        return "?";
    }
    // SAFETY: suite names come from `define_test_suite!`, which embeds a
    // NUL-terminated static string.
    unsafe { CStr::from_ptr(ptr) }.to_str().unwrap_or("?")
}

#[cfg(test)]
mod host_runner {
    use super::*;

    fn run_suite(desc: &'static TestSuiteDesc) {
        let run = desc.run.expect("suite descriptor has a runner");
        let mut result = TestSuiteResult::new(desc.name);
        let rc = run(core::ptr::null(), &mut result);
        assert_eq!(
            rc,
            0,
            "{} — {}/{} passed",
            suite_name(desc.name),
            result.passed,
            result.total
        );
    }

    #[test]
    fn types_suite() {
        run_suite(&ember_net::types_tests::TYPES_SUITE_DESC);
    }

    #[test]
    fn packetbuf_suite() {
        run_suite(&ember_net::packetbuf_tests::PACKETBUF_SUITE_DESC);
    }

    #[test]
    fn arp_suite() {
        run_suite(&ember_net::arp_tests::ARP_SUITE_DESC);
    }

    #[test]
    fn cache_suite() {
        run_suite(&ember_net::cache_tests::CACHE_SUITE_DESC);
    }

    #[test]
    fn ipv4_suite() {
        run_suite(&ember_net::ipv4_tests::IPV4_SUITE_DESC);
    }

    #[test]
    fn registry_runs_all_suites() {
        tests_reset_registry();
        tests_register_system_suites();
        let mut summary = TestRunSummary::default();
        let rc = tests_run_all(&TestConfig::default(), &mut summary);
        assert_eq!(
            rc,
            0,
            "{}/{} tests passed across {} suites",
            summary.passed,
            summary.total_tests,
            summary.suite_count
        );
    }
}
