// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

pub mod endpoint_pool;
pub mod felt;
pub mod influence;
pub mod invoke;
pub mod price_feed;
pub mod provider;
pub mod rate_limiter;
