//! Newline-delimited JSON request loop.
//!
//! # Responsibility
//! - Read one `{"tool": ..., "arguments": ...}` object per input line.
//! - Write exactly one response object per non-blank input line.
//!
//! # Invariants
//! - A malformed line yields an error response; the loop keeps running.
//! - An optional request `id` is echoed back unchanged.
//! - Output is flushed after every response.

use crate::handlers::{dispatch, ToolResponse};
use log::{info, warn};
use notebase_core::NoteStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{self, BufRead, Write};

#[derive(Debug, Deserialize)]
struct ToolCall {
    #[serde(default)]
    id: Option<Value>,
    tool: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Serialize)]
struct Reply {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<Value>,
    #[serde(flatten)]
    response: ToolResponse,
}

/// Serves tool calls from `reader` until end of input.
///
/// # Errors
/// Returns an error only when reading input or writing output fails.
pub fn serve<R: BufRead, W: Write>(store: &NoteStore, reader: R, mut writer: W) -> io::Result<()> {
    info!("event=server_loop module=server status=start");
    let mut handled = 0_u64;

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let reply = match serde_json::from_str::<ToolCall>(&line) {
            Ok(call) => Reply {
                id: call.id,
                response: dispatch(store, &call.tool, call.arguments),
            },
            Err(err) => {
                warn!("event=server_request module=server status=error error_code=malformed");
                Reply {
                    id: None,
                    response: ToolResponse::failure(format!("malformed request: {err}")),
                }
            }
        };

        serde_json::to_writer(&mut writer, &reply)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        handled += 1;
    }

    info!("event=server_loop module=server status=ok handled={handled}");
    Ok(())
}
