//! Operator-facing output on stdout.

use std::io::{self, Write};
use std::path::Path;

use alloy::primitives::B256;

use crate::storage::UploadOutcome;

/// Print the base-URI banner for an uploaded placeholder.
pub fn write_base_uri<W: Write>(
    out: &mut W,
    outcome: &UploadOutcome,
    gateway_url: &str,
) -> io::Result<()> {
    let root = outcome.root;
    if outcome.already_stored {
        writeln!(out, "File already stored on 0G Storage.")?;
    } else {
        writeln!(out, "File uploaded successfully to 0G Storage!")?;
    }
    writeln!(out)?;
    writeln!(out, "Root hash:")?;
    writeln!(out, "{}", root)?;
    writeln!(out)?;
    writeln!(out, "Gateway: {}", gateway_link(gateway_url, root))?;
    if let Some(seq) = outcome.tx_seq {
        writeln!(out, "Flow tx seq: {}", seq)?;
    }
    writeln!(out)?;
    writeln!(out, "Use this root hash with setBaseURI in your NFT contract.")?;
    writeln!(out, "Add a trailing '/' to the base URI if it is missing.")?;
    Ok(())
}

/// Print only the root, optionally followed by the file it belongs to.
pub fn write_root<W: Write>(out: &mut W, root: B256, file: Option<&Path>) -> io::Result<()> {
    match file {
        Some(path) => writeln!(out, "{}\t{}", root, path.display()),
        None => writeln!(out, "{}", root),
    }
}

pub fn gateway_link(gateway_url: &str, root: B256) -> String {
    format!("{}/file?root={}", gateway_url.trim_end_matches('/'), root)
}
