//! Terminal step that writes a response onto its transport

use std::io::{self, Write};

use super::Response;

/// Emits a response exactly once: status line, headers in insertion order, body
pub trait ResponseSender {
    fn send(&mut self, response: Response) -> io::Result<()>;
}

/// Writes responses as raw HTTP/1.1 onto any `io::Write` (stdout for one-shot requests)
#[derive(Debug)]
pub struct WriterSender<W: Write> {
    writer: W,
}

impl<W: Write> WriterSender<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ResponseSender for WriterSender<W> {
    fn send(&mut self, response: Response) -> io::Result<()> {
        write!(
            self.writer,
            "HTTP/1.1 {} {}\r\n",
            response.status_code, response.reason_phrase
        )?;
        for (name, value) in &response.headers {
            write!(self.writer, "{}: {}\r\n", name, value)?;
        }
        self.writer.write_all(b"\r\n")?;
        self.writer.write_all(response.body.as_bytes())?;
        self.writer.flush()
    }
}
