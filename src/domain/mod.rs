// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

pub mod amount;
pub mod asset;
pub mod bundle;
pub mod constants;
pub mod error;
