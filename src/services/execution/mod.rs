// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

pub mod allowance;
pub mod engine;
pub mod network;
pub mod receipt;

pub use engine::{ClientContext, ExecutionEngine, ExecutionMode, ExecutionReceipt, Preview};
