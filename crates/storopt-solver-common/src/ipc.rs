//! JSON serialization for solver communication.
//!
//! A problem is written to the solver's stdin as one JSON document and the
//! solution is read back from its stdout the same way. Both documents carry
//! `protocol_version`, which is checked before the rest is decoded so that a
//! stale plugin fails with [`SolverError::ProtocolMismatch`] rather than a
//! confusing field error.

use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{SolverError, SolverResult};
use crate::problem::StorageProblem;
use crate::solution::StorageSolution;
use crate::PROTOCOL_VERSION;

#[derive(Deserialize)]
struct Envelope {
    protocol_version: i32,
}

pub fn write_problem<W: Write>(problem: &StorageProblem, writer: W) -> SolverResult<()> {
    write_document(problem, writer)
}

pub fn read_problem<R: Read>(reader: R) -> SolverResult<StorageProblem> {
    read_document(reader)
}

pub fn write_solution<W: Write>(solution: &StorageSolution, writer: W) -> SolverResult<()> {
    write_document(solution, writer)
}

pub fn read_solution<R: Read>(reader: R) -> SolverResult<StorageSolution> {
    read_document(reader)
}

fn write_document<T: Serialize, W: Write>(value: &T, mut writer: W) -> SolverResult<()> {
    serde_json::to_writer(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

fn read_document<T: DeserializeOwned, R: Read>(mut reader: R) -> SolverResult<T> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| SolverError::Ipc(format!("Failed to read document: {}", e)))?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(SolverError::Ipc("Empty document".to_string()));
    }

    let envelope: Envelope = serde_json::from_slice(&bytes)?;
    if envelope.protocol_version != PROTOCOL_VERSION {
        return Err(SolverError::ProtocolMismatch {
            expected: PROTOCOL_VERSION,
            found: envelope.protocol_version,
        });
    }

    Ok(serde_json::from_slice(&bytes)?)
}
