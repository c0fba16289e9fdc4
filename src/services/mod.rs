// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

pub mod capability;
pub mod classifier;
pub mod compiler;
pub mod estimator;
pub mod execution;
pub mod inventory;
