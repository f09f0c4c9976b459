// /////////////////////////////////////////////////////////////////////////////
// Flowline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The stage prelude: the built-in vocabulary for composing lines.

pub mod core;
pub mod distribute;
pub mod tuple;

pub use self::core::{
    barrier, collect, consume, filter, flatten, for_m, forever, identity_lazy, identity_strict,
    pipe, pipe_, printer, printer_, repeat, take,
};
pub use distribute::{enumerate, roundrobin, scatter};
pub use tuple::{dimap, first, parmap, second, split, unsplit};
