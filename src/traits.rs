/*!
 * Copyright (c) 2026 Ming Lyu, aka mingcheng
 *
 * This source code is licensed under the MIT License,
 * which is located in the LICENSE file in the source tree's root directory.
 *
 * File: traits.rs
 * Author: mingcheng <mingcheng@apache.org>
 * File Created: 2026-10-19 10:02:11
 *
 * Modified By: mingcheng <mingcheng@apache.org>
 * Last Modified: 2026-10-19 10:02:11
 */

use async_trait::async_trait;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Spam,
    NotSpam,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Spam => write!(f, "spam"),
            Verdict::NotSpam => write!(f, "not spam"),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailbox: Send {
    /// Lists every UID in the selected folder, ascending
    async fn search_all(&mut self) -> anyhow::Result<Vec<u32>>;

    /// Fetches the raw message without setting \Seen. `None` when the server returned no body.
    async fn fetch_raw(&mut self, uid: u32) -> anyhow::Result<Option<Vec<u8>>>;

    async fn logout(&mut self) -> anyhow::Result<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpamClassifier: Send + Sync {
    /// Submits a raw RFC 5322 message and returns the verdict
    async fn classify(&self, raw: &[u8]) -> anyhow::Result<Verdict>;
}
