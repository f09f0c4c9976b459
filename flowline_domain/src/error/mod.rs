// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Error types for the stream pipeline domain.

pub mod stream_error;

pub use stream_error::StreamError;
