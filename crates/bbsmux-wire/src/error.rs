// SPDX-License-Identifier: MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("i/o error during negotiation: {0}")]
    Io(#[from] std::io::Error),
}
