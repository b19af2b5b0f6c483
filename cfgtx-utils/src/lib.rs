//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Utilities shared by configuration handlers: index/name allocation tables
//! and conversions between model values and backend encodings.

pub mod mac_addr;
pub mod naming;
pub mod translate;
