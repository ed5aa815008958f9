use crate::message::subject_of;
use crate::traits::{Mailbox, SpamClassifier, Verdict};
use anyhow::Context;
use log::{info, warn};
use std::io::Write;

/// Per-run counters, logged once the scan finishes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanSummary {
    pub scanned: usize,
    pub spam: usize,
    pub not_spam: usize,
    pub failed: usize,
}

/// Keeps the trailing `limit` UIDs, or all of them when there are fewer.
pub fn select_recent(uids: &[u32], limit: usize) -> &[u32] {
    &uids[uids.len().saturating_sub(limit)..]
}

async fn logout(mailbox: &mut dyn Mailbox) {
    if let Err(e) = mailbox.logout().await {
        warn!("{:#}", e);
    }
}

/// Classifies the most recent `limit` messages and writes one line per UID to `out`.
///
/// Only a failed search aborts the run; fetch and classifier failures are
/// reported against their UID and the loop moves on. The mailbox is logged out
/// on every path that returns after the search was attempted.
pub async fn scan_mailbox<W: Write>(
    mailbox: &mut dyn Mailbox,
    classifier: &dyn SpamClassifier,
    limit: usize,
    out: &mut W,
) -> anyhow::Result<ScanSummary> {
    let uids = match mailbox.search_all().await {
        Ok(uids) => uids,
        Err(e) => {
            logout(mailbox).await;
            return Err(e).context("IMAP search error");
        }
    };

    let recent = select_recent(&uids, limit);
    info!("Scanning {} of {} messages", recent.len(), uids.len());

    let result = classify_each(mailbox, classifier, recent, out).await;
    logout(mailbox).await;
    let summary = result?;

    info!(
        "Scanned {} messages: {} spam, {} not spam, {} failed",
        summary.scanned, summary.spam, summary.not_spam, summary.failed
    );
    Ok(summary)
}

async fn classify_each<W: Write>(
    mailbox: &mut dyn Mailbox,
    classifier: &dyn SpamClassifier,
    uids: &[u32],
    out: &mut W,
) -> anyhow::Result<ScanSummary> {
    let mut summary = ScanSummary::default();

    for &uid in uids {
        summary.scanned += 1;

        let raw = match mailbox.fetch_raw(uid).await {
            Ok(Some(raw)) if !raw.is_empty() => raw,
            Ok(_) => {
                writeln!(out, "UID {}: no data", uid)?;
                summary.failed += 1;
                continue;
            }
            Err(e) => {
                writeln!(out, "UID {}: fetch failed: {:#}", uid, e)?;
                summary.failed += 1;
                continue;
            }
        };

        let verdict = match classifier.classify(&raw).await {
            Ok(verdict) => verdict,
            Err(e) => {
                writeln!(out, "UID {}: classifier failed: {:#}", uid, e)?;
                summary.failed += 1;
                continue;
            }
        };

        match verdict {
            Verdict::Spam => summary.spam += 1,
            Verdict::NotSpam => summary.not_spam += 1,
        }

        writeln!(out, "UID {}: {} — {}", uid, verdict, subject_of(&raw))?;
    }

    Ok(summary)
}

#[cfg(test)]
#[path = "./scanner_tests.rs"]
mod scanner_tests;
