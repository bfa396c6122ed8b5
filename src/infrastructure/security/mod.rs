// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

pub mod session_key;
pub mod vault;

pub use session_key::{SessionKey, SessionKeyPair, SessionSignature};
pub use vault::{KdfParams, SealedRecord, Vault};
