// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Global defaults - Single Source of Truth
//!
//! Every default depth, bound and timeout used by the entity factories lives
//! here. **NEVER hardcode them elsewhere!**
//!
//! # Exemple
//!
//! ```ignore
//! use dcps_core::config::*;
//!
//! let depth = DEFAULT_HISTORY_DEPTH; // 100
//! let qos = QoS::reliable().keep_all().max_samples(KEEP_ALL_MAX_SAMPLES);
//! ```

use std::time::Duration;

// =======================================================================
// Reader-side bounds
// =======================================================================

/// Default KEEP_LAST depth of a reader's pending queue.
pub const DEFAULT_HISTORY_DEPTH: u32 = 100;

/// Pending-queue bound applied to KEEP_ALL readers when no explicit
/// `max_samples` resource limit is configured.
pub const KEEP_ALL_MAX_SAMPLES: usize = 1024;

// =======================================================================
// Writer-side bounds
// =======================================================================

/// Default depth of the asynchronous send queue of a DataWriter.
pub const DEFAULT_SEND_QUEUE_DEPTH: usize = 256;

/// How long an asynchronous `write()` may block on a full send queue
/// before failing with `QueueOverflow` (DDS default: 100 ms).
pub const DEFAULT_MAX_BLOCKING_TIME: Duration = Duration::from_millis(100);

/// Name prefix for per-writer delivery threads.
pub const DELIVERY_THREAD_PREFIX: &str = "dcps-delivery";

// =======================================================================
// Content filters
// =======================================================================

/// Deepest filter expression accepted, counting parentheses, NOT and each
/// AND/OR link. Evaluation recurses once per level.
pub const MAX_FILTER_DEPTH: usize = 256;

// =======================================================================
// Instance keys
// =======================================================================

/// FNV-1a 64-bit offset basis (instance handle hashing).
pub const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;

/// FNV-1a 64-bit prime (instance handle hashing).
pub const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_bounded() {
        assert!(DEFAULT_HISTORY_DEPTH > 0);
        assert!(KEEP_ALL_MAX_SAMPLES >= DEFAULT_HISTORY_DEPTH as usize);
        assert!(DEFAULT_SEND_QUEUE_DEPTH > 0);
        assert!(DEFAULT_MAX_BLOCKING_TIME > Duration::ZERO);
    }
}
