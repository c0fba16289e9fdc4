// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

//! Move a wallet's native, ERC-20 and ERC-721 holdings to a new account in one bundle:
//! atomically through a batch executor where one is deployed, one transfer at a time elsewhere.

pub mod app;
pub mod common;
pub mod domain;
pub mod infrastructure;
pub mod services;

pub use infrastructure::data;
pub use infrastructure::network;
pub use services::execution::{ExecutionEngine, ExecutionReceipt};
