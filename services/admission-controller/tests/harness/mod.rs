// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Test harness for flood simulation against the admission controller.

pub mod attacks;
pub mod generators;
pub mod metrics;
