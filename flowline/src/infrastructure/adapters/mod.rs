// /////////////////////////////////////////////////////////////////////////////
// Flowline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Adapter stages wrapping external resources behind abstract ports.

pub mod queue;
pub mod sources;

pub use queue::{queue_pull, queue_push};
pub use sources::{byte_source, message_source, records, ByteSource, MessageSource};
