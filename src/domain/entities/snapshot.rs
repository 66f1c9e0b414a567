//! Scan snapshot entity
//!
//! Read-only projection of the scan engine's state at query time. This is
//! also the reply body of `TOGGLE_SCANNING` and `GET_RESULTS`.

use super::finding::{QrFinding, TextFinding};
use serde::{Deserialize, Serialize};

/// Point-in-time view of scan results
///
/// Findings are listed in the order they were recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSnapshot {
    /// Decoded QR payloads
    pub qr_findings: Vec<QrFinding>,
    /// Ciphertext-looking text blocks
    pub text_findings: Vec<TextFinding>,
    /// Images scheduled for decoding since the last reset
    pub images_examined: usize,
    /// Leaf text elements visited since the last reset
    pub text_nodes_examined: usize,
    /// Whether the initial sweep is still settling
    pub scan_in_flight: bool,
}

impl ScanSnapshot {
    /// Returns the count shown on the toolbar badge
    pub fn total_findings(&self) -> usize {
        self.qr_findings.len() + self.text_findings.len()
    }

    /// Returns whether nothing was found and nothing examined
    pub fn is_empty(&self) -> bool {
        self.total_findings() == 0 && self.images_examined == 0 && self.text_nodes_examined == 0
    }

    /// Returns a one-line summary string
    pub fn summary(&self) -> String {
        format!(
            "{} QR / {} text findings ({} images, {} text nodes examined){}",
            self.qr_findings.len(),
            self.text_findings.len(),
            self.images_examined,
            self.text_nodes_examined,
            if self.scan_in_flight { ", scanning" } else { "" }
        )
    }
}
