//! Line-delimited request loop: one JSON request per input line, one JSON
//! report per output line.

use crate::models::dispatcher::PredictionDispatcher;
use crate::types::inputs::PredictionRequest;
use crate::types::report::PredictionReport;
use std::io::{self, BufRead, Write};
use tracing::warn;

/// Answer every request line read from `reader` with a report line on `writer`.
///
/// A line that is not UTF-8 or not a valid request is answered with a
/// malformed-request report and the loop moves on. Only I/O errors on either
/// side end it. Returns the number of reports written.
pub fn serve_lines<R, W>(dispatcher: &PredictionDispatcher<'_>, mut reader: R, mut writer: W) -> io::Result<usize>
where
    R: BufRead,
    W: Write,
{
    let mut buf = Vec::new();
    let mut written = 0;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }

        let Some(report) = handle_line(dispatcher, &buf) else {
            continue;
        };

        serde_json::to_writer(&mut writer, &report)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        written += 1;
    }

    Ok(written)
}

/// Report for one raw input line; blank lines get none
pub fn handle_line(dispatcher: &PredictionDispatcher<'_>, raw: &[u8]) -> Option<PredictionReport> {
    let line = match std::str::from_utf8(raw) {
        Ok(line) => line.trim(),
        Err(e) => {
            warn!(error = %e, "Request line is not valid UTF-8");
            return Some(PredictionReport::malformed_request(e));
        }
    };

    if line.is_empty() {
        return None;
    }

    let report = match serde_json::from_str::<PredictionRequest>(line) {
        Ok(request) => dispatcher.report(&request),
        Err(e) => {
            warn!(error = %e, "Failed to deserialize prediction request");
            PredictionReport::malformed_request(e)
        }
    };

    Some(report)
}
